use async_trait::async_trait;
use k8s_openapi::api::{
    core::v1::{Namespace, Service},
    networking::v1::Ingress,
};
use kube::{
    api::{Api, ListParams, PostParams},
    Client,
};

use crate::PeerAuthentication;

/// Transport-level failure modes the reconciler distinguishes.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An optimistic-concurrency collision: the written object carried a
    /// stale resourceVersion.
    #[error("stale resource version")]
    Conflict,

    #[error(transparent)]
    Api(#[from] anyhow::Error),
}

/// The cluster-state capabilities the reconciler needs.
///
/// Kept behind a trait so tests can substitute fixed in-memory collections;
/// nothing above this boundary assumes a particular transport.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Reads a namespace by name. `Ok(None)` means the namespace does not
    /// exist (deleted, or never created).
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, ClientError>;

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, ClientError>;

    async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClientError>;

    async fn list_peer_authentications(
        &self,
        namespace: &str,
    ) -> Result<Vec<PeerAuthentication>, ClientError>;

    /// Replaces a namespace whole, failing with [`ClientError::Conflict`]
    /// when the carried resourceVersion is stale.
    async fn replace_namespace(&self, namespace: &Namespace) -> Result<(), ClientError>;
}

#[async_trait]
impl<C: ClusterClient + ?Sized> ClusterClient for std::sync::Arc<C> {
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, ClientError> {
        (**self).get_namespace(name).await
    }

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, ClientError> {
        (**self).list_ingresses(namespace).await
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClientError> {
        (**self).list_services(namespace).await
    }

    async fn list_peer_authentications(
        &self,
        namespace: &str,
    ) -> Result<Vec<PeerAuthentication>, ClientError> {
        (**self).list_peer_authentications(namespace).await
    }

    async fn replace_namespace(&self, namespace: &Namespace) -> Result<(), ClientError> {
        (**self).replace_namespace(namespace).await
    }
}

/// [`ClusterClient`] backed by a real API server connection.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, ClientError> {
        self.namespaces()
            .get_opt(name)
            .await
            .map_err(|e| ClientError::Api(e.into()))
    }

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, ClientError> {
        let api = Api::<Ingress>::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ClientError::Api(e.into()))?;
        Ok(list.items)
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClientError> {
        let api = Api::<Service>::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ClientError::Api(e.into()))?;
        Ok(list.items)
    }

    async fn list_peer_authentications(
        &self,
        namespace: &str,
    ) -> Result<Vec<PeerAuthentication>, ClientError> {
        let api = Api::<PeerAuthentication>::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ClientError::Api(e.into()))?;
        Ok(list.items)
    }

    async fn replace_namespace(&self, namespace: &Namespace) -> Result<(), ClientError> {
        let name = namespace.metadata.name.as_deref().unwrap_or_default();
        match self
            .namespaces()
            .replace(name, &PostParams::default(), namespace)
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Err(ClientError::Conflict),
            Err(e) => Err(ClientError::Api(e.into())),
        }
    }
}
