use crate::routes::{Route, RouteKind};
use anyhow::Result;
use lb_gateway_controller_k8s_api::{
    Gateway, Namespace, ReferenceGrant, Service, TargetGroupConfiguration,
};

/// Models read access to the cluster's resources.
///
/// `get_*` methods return `Ok(None)` when the resource does not exist; any
/// other failure is an error the caller may retry. Implementations must not
/// hold state that outlives a single call.
#[async_trait::async_trait]
pub trait ResourceStore {
    async fn get_gateway(&self, namespace: &str, name: &str) -> Result<Option<Gateway>>;

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>>;

    /// Lists routes of the given kind in all namespaces.
    async fn list_routes(&self, kind: RouteKind) -> Result<Vec<Route>>;

    async fn list_reference_grants(&self, namespace: &str) -> Result<Vec<ReferenceGrant>>;

    async fn list_target_group_configurations(
        &self,
        namespace: &str,
    ) -> Result<Vec<TargetGroupConfiguration>>;

    async fn list_namespaces(&self) -> Result<Vec<Namespace>>;
}
