//! Parent and backend references shared by all route kinds.
//!
//! The generated Gateway API bindings give every route kind its own copy of
//! these structures; routes are normalized into the types defined here before
//! attachment and backend resolution.

use crate::{
    gateways::Gateway, grpcroutes, httproutes, tcproutes, tlsroutes, udproutes, GATEWAY_API_GROUP,
};

/// ParentReference identifies an API object (usually a Gateway) that a route
/// wants to be attached to.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ParentReference {
    /// Defaults to `gateway.networking.k8s.io` when unspecified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Defaults to `Gateway` when unspecified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// When unspecified, this refers to the local namespace of the route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    pub name: String,

    /// For Gateways this is a listener name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

/// BackendRef defines how a route should forward a request to a backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRef {
    /// The empty string (or an unset value) refers to the core API group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Defaults to `Service`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub name: String,

    /// Defaults to the route's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Required when the referent is a Kubernetes Service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    /// Defaults to 1; a weight of 0 disables the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

/// Returns the non-empty addresses a Gateway's status reports.
pub fn gateway_addresses(gateway: &Gateway) -> impl Iterator<Item = &str> {
    gateway
        .status
        .iter()
        .flat_map(|status| status.addresses.iter().flatten())
        .map(|address| address.value.as_str())
        .filter(|value| !value.is_empty())
}

// === impl ParentReference ===

impl ParentReference {
    /// Returns true if the reference points at a Gateway, applying the
    /// default group and kind.
    pub fn targets_gateway(&self) -> bool {
        let group = self.group.as_deref().unwrap_or(GATEWAY_API_GROUP);
        let kind = self.kind.as_deref().unwrap_or("Gateway");
        group == GATEWAY_API_GROUP && kind == "Gateway"
    }
}

macro_rules! parent_ref_from {
    ($($generated:ty),+ $(,)?) => {$(
        impl From<&$generated> for ParentReference {
            fn from(pr: &$generated) -> Self {
                Self {
                    group: pr.group.clone(),
                    kind: pr.kind.clone(),
                    namespace: pr.namespace.clone(),
                    name: pr.name.clone(),
                    section_name: pr.section_name.clone(),
                    port: pr.port,
                }
            }
        }
    )+};
}

parent_ref_from!(
    httproutes::HTTPRouteParentRefs,
    grpcroutes::GRPCRouteParentRefs,
    tcproutes::TCPRouteParentRefs,
    tlsroutes::TLSRouteParentRefs,
    udproutes::UDPRouteParentRefs,
);

// === impl BackendRef ===

impl BackendRef {
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("Service")
    }
}

macro_rules! backend_ref_from {
    ($($generated:ty),+ $(,)?) => {$(
        impl From<&$generated> for BackendRef {
            fn from(br: &$generated) -> Self {
                Self {
                    group: br.group.clone(),
                    kind: br.kind.clone(),
                    name: br.name.clone(),
                    namespace: br.namespace.clone(),
                    port: br.port,
                    weight: br.weight,
                }
            }
        }
    )+};
}

backend_ref_from!(
    httproutes::HTTPRouteRulesBackendRefs,
    grpcroutes::GRPCRouteRulesBackendRefs,
    tcproutes::TCPRouteRulesBackendRefs,
    tlsroutes::TLSRouteRulesBackendRefs,
    udproutes::UDPRouteRulesBackendRefs,
);
