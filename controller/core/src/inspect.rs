/// Presence signals gathered from the resources of a single namespace.
///
/// Computed fresh on every reconciliation and never cached, so decisions
/// always reflect current cluster state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InspectionResult {
    /// At least one Ingress carries the recognized load-balancer annotation.
    pub has_load_balanced_ingress: bool,

    /// At least one Service carries the recognized load-balancer annotation.
    pub has_load_balanced_service: bool,

    /// The namespace holds at least one PeerAuthentication policy.
    pub has_peer_authentication: bool,
}

impl InspectionResult {
    /// True when either load-balancer signal is present.
    pub fn has_load_balancer(&self) -> bool {
        self.has_load_balanced_ingress || self.has_load_balanced_service
    }
}
