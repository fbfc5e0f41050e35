use crate::{
    core::{ResourceStore, Route, RouteKind},
    k8s::{
        GRPCRoute, Gateway, HTTPRoute, Namespace, ReferenceGrant, Resource, Service,
        TargetGroupConfiguration, TCPRoute, TLSRoute, UDPRoute,
    },
};
use anyhow::{Context, Result};
use k8s_openapi::{apimachinery::pkg::apis::meta::v1::APIResourceList, NamespaceResourceScope};
use kube::{
    api::{Api, ListParams},
    Client,
};
use serde::de::DeserializeOwned;
use std::fmt;

/// Reads resources directly from the Kubernetes API.
#[derive(Clone)]
pub struct ClusterStore {
    client: Client,
}

// === impl ClusterStore ===

impl ClusterStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get<T>(&self, namespace: &str, name: &str) -> Result<Option<T>>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
        T: Clone + DeserializeOwned + fmt::Debug,
    {
        Api::<T>::namespaced(self.client.clone(), namespace)
            .get_opt(name)
            .await
            .with_context(|| format!("failed to get {} {namespace}/{name}", T::kind(&())))
    }

    async fn list<T>(&self, api: Api<T>) -> Result<Vec<T>>
    where
        T: Resource<DynamicType = ()> + Clone + DeserializeOwned + fmt::Debug,
    {
        let list = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list {}", T::plural(&())))?;
        Ok(list.items)
    }

    /// Lists a route kind in all namespaces. Kinds whose CRD is not
    /// installed have no routes.
    async fn list_routes_of<T>(&self) -> Result<Vec<Route>>
    where
        T: Resource<DynamicType = ()> + Clone + DeserializeOwned + fmt::Debug,
        Route: From<T>,
    {
        if !self.api_resource_exists::<T>().await? {
            tracing::warn!(
                "{}.{} resource kind not found, skipping",
                T::plural(&()),
                T::group(&())
            );
            return Ok(vec![]);
        }
        let routes = self.list(Api::<T>::all(self.client.clone())).await?;
        Ok(routes.into_iter().map(Route::from).collect())
    }

    async fn api_resource_exists<T>(&self) -> Result<bool>
    where
        T: Resource<DynamicType = ()>,
    {
        let resources = self
            .client
            .list_api_group_resources(&T::api_version(&()))
            .await;
        serves_kind::<T>(resources)
            .with_context(|| format!("failed to discover {}", T::api_version(&())))
    }
}

/// Interprets an API group discovery response. A group the server does not
/// know (404) means the CRD is not installed; any other error is returned.
fn serves_kind<T>(resources: Result<APIResourceList, kube::Error>) -> Result<bool, kube::Error>
where
    T: Resource<DynamicType = ()>,
{
    match resources {
        Ok(list) => Ok(list.resources.iter().any(|r| r.kind == T::kind(&()))),
        Err(kube::Error::Api(response)) if response.code == 404 => Ok(false),
        Err(error) => Err(error),
    }
}

impl fmt::Debug for ClusterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterStore").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ResourceStore for ClusterStore {
    async fn get_gateway(&self, namespace: &str, name: &str) -> Result<Option<Gateway>> {
        self.get(namespace, name).await
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        self.get(namespace, name).await
    }

    async fn list_routes(&self, kind: RouteKind) -> Result<Vec<Route>> {
        match kind {
            RouteKind::Http => self.list_routes_of::<HTTPRoute>().await,
            RouteKind::Grpc => self.list_routes_of::<GRPCRoute>().await,
            RouteKind::Tcp => self.list_routes_of::<TCPRoute>().await,
            RouteKind::Tls => self.list_routes_of::<TLSRoute>().await,
            RouteKind::Udp => self.list_routes_of::<UDPRoute>().await,
        }
    }

    async fn list_reference_grants(&self, namespace: &str) -> Result<Vec<ReferenceGrant>> {
        self.list(Api::namespaced(self.client.clone(), namespace))
            .await
    }

    async fn list_target_group_configurations(
        &self,
        namespace: &str,
    ) -> Result<Vec<TargetGroupConfiguration>> {
        self.list(Api::namespaced(self.client.clone(), namespace))
            .await
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        self.list(Api::all(self.client.clone())).await
    }
}
