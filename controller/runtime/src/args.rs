use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::Parser;
use futures::StreamExt;
use kube::{
    api::{Api, ResourceExt},
    runtime::{controller::Action, watcher, Controller},
};
use ns_label_controller_core::{ExclusionSet, LabelPolicy};
use ns_label_controller_k8s::{KubeClusterClient, Namespace, Outcome, Reconciler};
use tracing::{info_span, instrument, Instrument};

use crate::metrics::ReconcilerMetrics;

#[derive(Debug, Parser)]
#[clap(
    name = "ns-label-controller",
    about = "Labels namespaces by the load-balancer and mesh resources they contain"
)]
pub struct Args {
    #[clap(
        long,
        env = "NS_LABEL_CONTROLLER_LOG",
        default_value = "ns_label_controller=info,warn"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Namespaces that are never labeled, comma-separated.
    #[clap(long, default_value = "kube-system,istio-system")]
    ignore_namespaces: ExclusionSet,

    /// Remove managed labels when their backing resources disappear. Without
    /// this flag, stale labels are left in place.
    #[clap(long)]
    retract_labels: bool,

    /// Bound on a single namespace write.
    #[clap(long, default_value = "5000")]
    patch_timeout_ms: u64,

    /// How often converged namespaces are revisited.
    #[clap(long, default_value = "300")]
    resync_interval_secs: u64,

    /// Delay before a failed namespace is retried.
    #[clap(long, default_value = "30")]
    retry_delay_secs: u64,
}

struct Ctx {
    reconciler: Reconciler<KubeClusterClient>,
    metrics: ReconcilerMetrics,
    resync: Duration,
    retry: Duration,
}

impl Args {
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            ignore_namespaces,
            retract_labels,
            patch_timeout_ms,
            resync_interval_secs,
            retry_delay_secs,
        } = self;

        let mut prom = prometheus_client::registry::Registry::default();
        let metrics =
            ReconcilerMetrics::register(prom.sub_registry_with_prefix("namespace_reconciler"));
        let runtime_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(runtime_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let policy = if retract_labels {
            LabelPolicy::Retract
        } else {
            LabelPolicy::Preserve
        };
        let reconciler = Reconciler::new(
            KubeClusterClient::new(runtime.client()),
            ignore_namespaces,
            policy,
            Duration::from_millis(patch_timeout_ms),
        );

        let ctx = Arc::new(Ctx {
            reconciler,
            metrics,
            resync: Duration::from_secs(resync_interval_secs),
            retry: Duration::from_secs(retry_delay_secs),
        });

        let namespaces = Api::<Namespace>::all(runtime.client());
        let controller = Controller::new(namespaces, watcher::Config::default())
            .shutdown_on_signal()
            .run(reconcile, error_policy, ctx)
            .for_each(|reconciliation| async move {
                match reconciliation {
                    Ok((namespace, _)) => {
                        tracing::debug!(namespace = %namespace.name, "reconciled");
                    }
                    Err(error) => {
                        tracing::warn!(%error, "reconciliation error");
                    }
                }
            });
        tokio::spawn(controller.instrument(info_span!("namespaces")));

        // Blocks until shutdown is signaled.
        if runtime.run().await.is_err() {
            bail!("aborted");
        }
        Ok(())
    }
}

#[instrument(skip_all, fields(namespace = %namespace.name_any()))]
async fn reconcile(
    namespace: Arc<Namespace>,
    ctx: Arc<Ctx>,
) -> Result<Action, ns_label_controller_k8s::Error> {
    let outcome = ctx.reconciler.reconcile(&namespace.name_any()).await?;
    ctx.metrics.reconciles.inc();
    if outcome == Outcome::Patched {
        ctx.metrics.patches.inc();
    }
    Ok(Action::requeue(ctx.resync))
}

fn error_policy(
    namespace: Arc<Namespace>,
    error: &ns_label_controller_k8s::Error,
    ctx: Arc<Ctx>,
) -> Action {
    ctx.metrics.failures.inc();
    tracing::warn!(namespace = %namespace.name_any(), %error, "reconciliation failed");
    Action::requeue(ctx.retry)
}
