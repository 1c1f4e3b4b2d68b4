use prometheus_client::{metrics::counter::Counter, registry::Registry};

/// Reconciliation counters exposed on the admin server's metrics endpoint.
#[derive(Clone, Debug)]
pub(crate) struct ReconcilerMetrics {
    pub reconciles: Counter,
    pub patches: Counter,
    pub failures: Counter,
}

impl ReconcilerMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let reconciles = Counter::default();
        reg.register(
            "reconciles",
            "Namespace reconciliations that completed",
            reconciles.clone(),
        );

        let patches = Counter::default();
        reg.register("patches", "Namespace label writes issued", patches.clone());

        let failures = Counter::default();
        reg.register(
            "failures",
            "Namespace reconciliations that failed and will be retried",
            failures.clone(),
        );

        Self {
            reconciles,
            patches,
            failures,
        }
    }
}
