#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use ns_label_controller_core as core;
pub use ns_label_controller_k8s as k8s;

mod args;
mod metrics;

pub use self::args::Args;
