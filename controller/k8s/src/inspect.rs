use futures::future;
use kube::api::ResourceExt;
use ns_label_controller_core::InspectionResult;

use crate::{ClientError, ClusterClient};

/// Ingresses carrying this annotation with a non-empty value are backed by
/// an AWS ALB.
pub const INGRESS_LB_ANNOTATION: &str = "alb.ingress.kubernetes.io/load-balancer-name";

/// Services carrying this annotation with a non-empty value are fronted by
/// an AWS cloud load balancer.
pub const SERVICE_LB_ANNOTATION: &str = "service.beta.kubernetes.io/aws-load-balancer-name";

/// The resource collections the inspector consults.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Ingress,
    Service,
    PeerAuthentication,
}

impl ResourceKind {
    pub const ALL: [Self; 3] = [Self::Ingress, Self::Service, Self::PeerAuthentication];
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ingress => "Ingress".fmt(f),
            Self::Service => "Service".fmt(f),
            Self::PeerAuthentication => "PeerAuthentication".fmt(f),
        }
    }
}

/// A single collection listing that failed. The other signals are
/// unaffected, since each drives an unrelated label.
#[derive(Debug, thiserror::Error)]
#[error("failed to list {kind}: {source}")]
pub struct LookupError {
    pub kind: ResourceKind,
    #[source]
    pub source: ClientError,
}

/// Signals gathered from one namespace, along with the collections that
/// could not be listed.
#[derive(Debug, Default)]
pub struct Inspection {
    pub result: InspectionResult,
    pub failures: Vec<LookupError>,
}

impl Inspection {
    /// True when no signal could be obtained at all.
    pub fn is_total_failure(&self) -> bool {
        self.failures.len() == ResourceKind::ALL.len()
    }
}

/// Gathers presence signals for a namespace.
///
/// All three lookups are always attempted, concurrently; a failure in one
/// collection is recorded and logged but never masks the signals obtainable
/// from the others.
pub async fn inspect<C: ClusterClient + ?Sized>(client: &C, namespace: &str) -> Inspection {
    let (ingresses, services, peer_authentications) = future::join3(
        client.list_ingresses(namespace),
        client.list_services(namespace),
        client.list_peer_authentications(namespace),
    )
    .await;

    let mut result = InspectionResult::default();
    let mut failures = Vec::new();

    match ingresses {
        Ok(items) => {
            result.has_load_balanced_ingress = items
                .iter()
                .any(|ingress| has_lb_annotation(ingress, INGRESS_LB_ANNOTATION, namespace));
        }
        Err(source) => failures.push(LookupError {
            kind: ResourceKind::Ingress,
            source,
        }),
    }

    match services {
        Ok(items) => {
            result.has_load_balanced_service = items
                .iter()
                .any(|service| has_lb_annotation(service, SERVICE_LB_ANNOTATION, namespace));
        }
        Err(source) => failures.push(LookupError {
            kind: ResourceKind::Service,
            source,
        }),
    }

    match peer_authentications {
        Ok(items) => {
            if !items.is_empty() {
                tracing::debug!(
                    %namespace,
                    count = items.len(),
                    "namespace holds PeerAuthentication policies"
                );
            }
            result.has_peer_authentication = !items.is_empty();
        }
        Err(source) => failures.push(LookupError {
            kind: ResourceKind::PeerAuthentication,
            source,
        }),
    }

    for failure in &failures {
        tracing::warn!(%namespace, error = %failure, "resource lookup failed");
    }

    Inspection { result, failures }
}

fn has_lb_annotation<K: ResourceExt>(resource: &K, key: &str, namespace: &str) -> bool {
    match resource.annotations().get(key) {
        Some(value) if !value.is_empty() => {
            tracing::debug!(
                %namespace,
                name = %resource.name_any(),
                %key,
                %value,
                "matched load-balancer annotation"
            );
            true
        }
        _ => false,
    }
}
