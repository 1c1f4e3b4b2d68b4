#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod client;
mod inspect;
mod peer_authentication;
mod reconciler;


pub use self::{
    client::{ClientError, ClusterClient, KubeClusterClient},
    inspect::{
        inspect, Inspection, LookupError, ResourceKind, INGRESS_LB_ANNOTATION,
        SERVICE_LB_ANNOTATION,
    },
    peer_authentication::{
        MutualTls, MutualTlsMode, PeerAuthentication, PeerAuthenticationSpec, WorkloadSelector,
    },
    reconciler::{Error, Outcome, Reconciler},
};
pub use k8s_openapi::api::{
    core::v1::{Namespace, Service},
    networking::v1::Ingress,
};
pub use kube::api::ResourceExt;
