#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod decision;
mod filter;
mod inspect;

pub use self::{
    decision::{
        decide, LabelPolicy, ENABLED_VALUE, MESH_INJECTION_LABEL, POD_READINESS_GATE_LABEL,
    },
    filter::ExclusionSet,
    inspect::InspectionResult,
};

/// Namespace labels as stored in the cluster: keys unique, values opaque.
pub type Labels = std::collections::BTreeMap<String, String>;
