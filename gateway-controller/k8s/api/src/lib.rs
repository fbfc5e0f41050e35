#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod labels;
pub mod routes;
pub mod target_group_configuration;

pub use self::{
    gateways::Gateway,
    grpcroutes::GRPCRoute,
    httproutes::HTTPRoute,
    labels::{Labels, Selector},
    referencegrants::ReferenceGrant,
    routes::{gateway_addresses, BackendRef, ParentReference},
    target_group_configuration::TargetGroupConfiguration,
    tcproutes::TCPRoute,
    tlsroutes::TLSRoute,
    udproutes::UDPRoute,
};
pub use gateway_api::apis::{
    experimental::{tcproutes, tlsroutes, udproutes},
    standard::{gateways, grpcroutes, httproutes, referencegrants},
};
pub use k8s_openapi::{
    api::core::v1::{Namespace, Service, ServicePort, ServiceSpec},
    apimachinery::pkg::apis::meta::v1::Time,
};
pub use kube::{api::ObjectMeta, Resource, ResourceExt};

/// The API group shared by all Gateway API resources.
pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";

/// The API group of the load balancer controller's own resources.
pub const LB_API_GROUP: &str = "gateway.k8s.aws";

/// Checks whether a `group`/`kind` pair references the given resource type.
///
/// The core API group may be spelled as an empty string, as `core`, or
/// omitted altogether.
pub fn targets_kind<T>(group: Option<&str>, kind: &str) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();

    let mut t_group = &*T::group(&dt);
    if t_group.is_empty() {
        t_group = "core";
    }

    let group = match group {
        Some("") | None => "core",
        Some(group) => group,
    };

    group.eq_ignore_ascii_case(t_group) && kind.eq_ignore_ascii_case(&T::kind(&dt))
}
