use anyhow::Result;
use lb_gateway_controller_core::{ResourceStore, Route, RouteKind};
use lb_gateway_controller_k8s_api::{
    Gateway, Namespace, ReferenceGrant, ResourceExt, Service, TargetGroupConfiguration,
};

/// A `ResourceStore` over a fixed set of resources.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    gateways: Vec<Gateway>,
    services: Vec<Service>,
    routes: Vec<Route>,
    reference_grants: Vec<ReferenceGrant>,
    target_group_configurations: Vec<TargetGroupConfiguration>,
    namespaces: Vec<Namespace>,
}

impl MemoryStore {
    pub fn with_gateway(mut self, gateway: Gateway) -> Self {
        self.gateways.push(gateway);
        self
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_route(mut self, route: impl Into<Route>) -> Self {
        self.routes.push(route.into());
        self
    }

    pub fn with_reference_grant(mut self, grant: ReferenceGrant) -> Self {
        self.reference_grants.push(grant);
        self
    }

    pub fn with_target_group_configuration(mut self, tgc: TargetGroupConfiguration) -> Self {
        self.target_group_configurations.push(tgc);
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespaces.push(namespace);
        self
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
            + self.services.len()
            + self.routes.len()
            + self.reference_grants.len()
            + self.target_group_configurations.len()
            + self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn in_namespace<T: ResourceExt>(resource: &T, namespace: &str) -> bool {
    resource.namespace().as_deref() == Some(namespace)
}

fn named<T: ResourceExt>(resource: &T, namespace: &str, name: &str) -> bool {
    in_namespace(resource, namespace) && resource.name_any() == name
}

#[async_trait::async_trait]
impl ResourceStore for MemoryStore {
    async fn get_gateway(&self, namespace: &str, name: &str) -> Result<Option<Gateway>> {
        Ok(self
            .gateways
            .iter()
            .find(|gw| named(*gw, namespace, name))
            .cloned())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        Ok(self
            .services
            .iter()
            .find(|svc| named(*svc, namespace, name))
            .cloned())
    }

    async fn list_routes(&self, kind: RouteKind) -> Result<Vec<Route>> {
        Ok(self
            .routes
            .iter()
            .filter(|route| route.kind() == kind)
            .cloned()
            .collect())
    }

    async fn list_reference_grants(&self, namespace: &str) -> Result<Vec<ReferenceGrant>> {
        Ok(self
            .reference_grants
            .iter()
            .filter(|grant| in_namespace(*grant, namespace))
            .cloned()
            .collect())
    }

    async fn list_target_group_configurations(
        &self,
        namespace: &str,
    ) -> Result<Vec<TargetGroupConfiguration>> {
        Ok(self
            .target_group_configurations
            .iter()
            .filter(|tgc| in_namespace(*tgc, namespace))
            .cloned()
            .collect())
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        Ok(self.namespaces.clone())
    }
}
