use std::time::Duration;

use k8s_openapi::api::core::v1::Namespace;
use ns_label_controller_core::{decide, ExclusionSet, InspectionResult, LabelPolicy};
use tokio::time;

use crate::{inspect, ClientError, ClusterClient};

/// Reconciliation failures. All of them are retryable; retry scheduling
/// belongs to the controller machinery driving [`Reconciler::reconcile`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to fetch namespace {namespace}: {source}")]
    Fetch {
        namespace: String,
        #[source]
        source: ClientError,
    },

    #[error("inspection of namespace {namespace} failed: no resource collection could be listed")]
    Inspection { namespace: String },

    #[error("update of namespace {namespace} conflicted after one retry")]
    Conflict { namespace: String },

    #[error("failed to update namespace {namespace}: {source}")]
    Patch {
        namespace: String,
        #[source]
        source: ClientError,
    },

    #[error("update of namespace {namespace} timed out after {timeout:?}")]
    PatchTimeout {
        namespace: String,
        timeout: Duration,
    },
}

/// What a successful reconciliation did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The namespace was missing, excluded, or already converged.
    Unchanged,
    /// The namespace's labels were rewritten.
    Patched,
}

/// Drives fetch, filter, inspect, decide, and patch for single namespaces.
///
/// Holds no per-namespace state, so invocations for the same namespace may
/// safely overlap: the only mutation is the final conflict-checked write.
pub struct Reconciler<C> {
    client: C,
    exclusions: ExclusionSet,
    policy: LabelPolicy,
    patch_timeout: Duration,
}

impl<C: ClusterClient> Reconciler<C> {
    pub fn new(
        client: C,
        exclusions: ExclusionSet,
        policy: LabelPolicy,
        patch_timeout: Duration,
    ) -> Self {
        Self {
            client,
            exclusions,
            policy,
            patch_timeout,
        }
    }

    /// Runs one complete reconciliation for the named namespace.
    pub async fn reconcile(&self, name: &str) -> Result<Outcome, Error> {
        let Some(namespace) = self
            .client
            .get_namespace(name)
            .await
            .map_err(|source| Error::Fetch {
                namespace: name.to_string(),
                source,
            })?
        else {
            tracing::debug!(namespace = %name, "namespace is gone; nothing to reconcile");
            return Ok(Outcome::Unchanged);
        };

        if self.exclusions.is_excluded(name) {
            tracing::debug!(namespace = %name, "namespace is excluded");
            return Ok(Outcome::Unchanged);
        }

        let inspection = inspect(&self.client, name).await;
        if inspection.is_total_failure() {
            return Err(Error::Inspection {
                namespace: name.to_string(),
            });
        }

        // A failed lookup reports its signal as false; retracting on that
        // blind spot could remove a label that is still warranted.
        let policy = if inspection.failures.is_empty() {
            self.policy
        } else {
            LabelPolicy::Preserve
        };

        self.converge(name, namespace, inspection.result, policy)
            .await
    }

    /// Applies the decision, retrying the fetch-decide-patch cycle once on a
    /// stale-version conflict.
    async fn converge(
        &self,
        name: &str,
        mut namespace: Namespace,
        result: InspectionResult,
        policy: LabelPolicy,
    ) -> Result<Outcome, Error> {
        let mut retried = false;
        loop {
            let current = namespace.metadata.labels.clone().unwrap_or_default();
            let desired = decide(&current, result, policy);
            if desired == current {
                tracing::debug!(namespace = %name, "labels already converged");
                return Ok(Outcome::Unchanged);
            }
            namespace.metadata.labels = Some(desired);

            let write = self.client.replace_namespace(&namespace);
            match time::timeout(self.patch_timeout, write).await {
                Err(_) => {
                    return Err(Error::PatchTimeout {
                        namespace: name.to_string(),
                        timeout: self.patch_timeout,
                    })
                }
                Ok(Ok(())) => {
                    tracing::info!(namespace = %name, "updated namespace labels");
                    return Ok(Outcome::Patched);
                }
                Ok(Err(ClientError::Conflict)) if !retried => {
                    retried = true;
                    tracing::debug!(namespace = %name, "stale resource version; re-fetching");
                    match self
                        .client
                        .get_namespace(name)
                        .await
                        .map_err(|source| Error::Fetch {
                            namespace: name.to_string(),
                            source,
                        })? {
                        Some(fresh) => namespace = fresh,
                        // Deleted between the conflict and the re-fetch.
                        None => return Ok(Outcome::Unchanged),
                    }
                }
                Ok(Err(ClientError::Conflict)) => {
                    return Err(Error::Conflict {
                        namespace: name.to_string(),
                    })
                }
                Ok(Err(source)) => {
                    return Err(Error::Patch {
                        namespace: name.to_string(),
                        source,
                    })
                }
            }
        }
    }
}
