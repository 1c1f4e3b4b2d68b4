use crate::{InspectionResult, Labels};

/// Label consumed by AWS load-balancer controllers to gate pod readiness
/// until target-group registration completes.
pub const POD_READINESS_GATE_LABEL: &str = "elbv2.k8s.aws/pod-readiness-gate-inject";

/// Label consumed by the istio sidecar injector.
pub const MESH_INJECTION_LABEL: &str = "istio-injection";

/// The value both owned labels are set to when their signal is present.
pub const ENABLED_VALUE: &str = "enabled";

/// What happens to an owned label once its driving signal disappears.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Owned labels are only ever added: a label set while a signal was
    /// present survives the signal's disappearance.
    #[default]
    Preserve,

    /// Owned labels are removed when their driving signal is absent.
    Retract,
}

/// Maps inspection signals onto the desired label set.
///
/// Pure and total. Only the two owned keys are ever added, overwritten, or
/// (under [`LabelPolicy::Retract`]) removed; every other label is carried
/// over from `current` untouched. The caller is responsible for diffing the
/// result against `current` before writing.
pub fn decide(current: &Labels, result: InspectionResult, policy: LabelPolicy) -> Labels {
    let mut desired = current.clone();

    if result.has_load_balancer() {
        desired.insert(
            POD_READINESS_GATE_LABEL.to_string(),
            ENABLED_VALUE.to_string(),
        );
    } else if policy == LabelPolicy::Retract {
        desired.remove(POD_READINESS_GATE_LABEL);
    }

    if result.has_peer_authentication {
        desired.insert(MESH_INJECTION_LABEL.to_string(), ENABLED_VALUE.to_string());
    } else if policy == LabelPolicy::Retract {
        desired.remove(MESH_INJECTION_LABEL);
    }

    desired
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    fn all_signal_combinations() -> impl Iterator<Item = InspectionResult> {
        (0..8u8).map(|bits| InspectionResult {
            has_load_balanced_ingress: bits & 1 != 0,
            has_load_balanced_service: bits & 2 != 0,
            has_peer_authentication: bits & 4 != 0,
        })
    }

    #[test]
    fn ingress_signal_sets_readiness_gate() {
        let result = InspectionResult {
            has_load_balanced_ingress: true,
            ..Default::default()
        };
        let desired = decide(&Labels::default(), result, LabelPolicy::Preserve);
        assert_eq!(
            desired,
            btreemap! { POD_READINESS_GATE_LABEL.to_string() => ENABLED_VALUE.to_string() },
        );
    }

    #[test]
    fn service_signal_sets_readiness_gate() {
        let result = InspectionResult {
            has_load_balanced_service: true,
            ..Default::default()
        };
        let desired = decide(&Labels::default(), result, LabelPolicy::Preserve);
        assert_eq!(
            desired.get(POD_READINESS_GATE_LABEL).map(String::as_str),
            Some(ENABLED_VALUE),
        );
        assert!(!desired.contains_key(MESH_INJECTION_LABEL));
    }

    #[test]
    fn peer_authentication_signal_sets_mesh_injection() {
        let result = InspectionResult {
            has_peer_authentication: true,
            ..Default::default()
        };
        let desired = decide(&Labels::default(), result, LabelPolicy::Preserve);
        assert_eq!(
            desired,
            btreemap! { MESH_INJECTION_LABEL.to_string() => ENABLED_VALUE.to_string() },
        );
    }

    #[test]
    fn no_signals_is_identity() {
        let current = btreemap! {
            "team".to_string() => "payments".to_string(),
        };
        let desired = decide(&current, InspectionResult::default(), LabelPolicy::Preserve);
        assert_eq!(desired, current);
    }

    #[test]
    fn decision_is_idempotent_for_all_signals() {
        for policy in [LabelPolicy::Preserve, LabelPolicy::Retract] {
            for result in all_signal_combinations() {
                let current = btreemap! {
                    "team".to_string() => "payments".to_string(),
                    POD_READINESS_GATE_LABEL.to_string() => ENABLED_VALUE.to_string(),
                };
                let once = decide(&current, result, policy);
                let twice = decide(&once, result, policy);
                assert_eq!(once, twice, "decide must converge ({result:?}, {policy:?})");
            }
        }
    }

    #[test]
    fn unowned_labels_are_never_touched() {
        for policy in [LabelPolicy::Preserve, LabelPolicy::Retract] {
            for result in all_signal_combinations() {
                let current = btreemap! {
                    "team".to_string() => "payments".to_string(),
                    "env".to_string() => "prod".to_string(),
                };
                let desired = decide(&current, result, policy);
                assert_eq!(desired.get("team"), current.get("team"));
                assert_eq!(desired.get("env"), current.get("env"));
            }
        }
    }

    #[test]
    fn preserve_keeps_labels_after_signal_disappears() {
        let current = btreemap! {
            POD_READINESS_GATE_LABEL.to_string() => ENABLED_VALUE.to_string(),
            MESH_INJECTION_LABEL.to_string() => ENABLED_VALUE.to_string(),
        };
        let desired = decide(&current, InspectionResult::default(), LabelPolicy::Preserve);
        assert_eq!(desired, current);
    }

    #[test]
    fn retract_removes_only_owned_labels() {
        let current = btreemap! {
            POD_READINESS_GATE_LABEL.to_string() => ENABLED_VALUE.to_string(),
            MESH_INJECTION_LABEL.to_string() => ENABLED_VALUE.to_string(),
            "team".to_string() => "payments".to_string(),
        };
        let desired = decide(&current, InspectionResult::default(), LabelPolicy::Retract);
        assert_eq!(
            desired,
            btreemap! { "team".to_string() => "payments".to_string() },
        );
    }

    #[test]
    fn retract_keeps_labels_whose_signal_is_still_present() {
        let current = btreemap! {
            POD_READINESS_GATE_LABEL.to_string() => ENABLED_VALUE.to_string(),
        };
        let result = InspectionResult {
            has_load_balanced_service: true,
            ..Default::default()
        };
        let desired = decide(&current, result, LabelPolicy::Retract);
        assert_eq!(desired, current);
    }

    #[test]
    fn overwrites_foreign_values_on_owned_keys() {
        let current = btreemap! {
            MESH_INJECTION_LABEL.to_string() => "disabled".to_string(),
        };
        let result = InspectionResult {
            has_peer_authentication: true,
            ..Default::default()
        };
        let desired = decide(&current, result, LabelPolicy::Preserve);
        assert_eq!(
            desired.get(MESH_INJECTION_LABEL).map(String::as_str),
            Some(ENABLED_VALUE),
        );
    }
}
