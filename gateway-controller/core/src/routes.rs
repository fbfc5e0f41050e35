use chrono::{offset::Utc, DateTime};
use lb_gateway_controller_k8s_api::{
    self as k8s, ObjectMeta, ParentReference, Resource, Time, GRPCRoute, HTTPRoute, TCPRoute,
    TLSRoute, UDPRoute,
};
use std::{borrow::Cow, fmt};

/// The closed set of route kinds the controller compiles.
///
/// The variant order is the order in which route groups are emitted.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum RouteKind {
    #[serde(rename = "HTTPRoute")]
    Http,
    #[serde(rename = "GRPCRoute")]
    Grpc,
    #[serde(rename = "TCPRoute")]
    Tcp,
    #[serde(rename = "TLSRoute")]
    Tls,
    #[serde(rename = "UDPRoute")]
    Udp,
}

/// Uniquely identifies a route across all kinds: kind + namespace + name.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct RouteId {
    pub kind: RouteKind,
    pub namespace: String,
    pub name: String,
}

/// A route resource of any supported kind.
#[derive(Clone, Debug)]
pub enum Route {
    Http(HTTPRoute),
    Grpc(GRPCRoute),
    Tcp(TCPRoute),
    Tls(TLSRoute),
    Udp(UDPRoute),
}

// === impl RouteKind ===

impl RouteKind {
    pub const ALL: [RouteKind; 5] = [Self::Http, Self::Grpc, Self::Tcp, Self::Tls, Self::Udp];

    pub fn kind_name(&self) -> Cow<'static, str> {
        match self {
            Self::Http => HTTPRoute::kind(&()),
            Self::Grpc => GRPCRoute::kind(&()),
            Self::Tcp => TCPRoute::kind(&()),
            Self::Tls => TLSRoute::kind(&()),
            Self::Udp => UDPRoute::kind(&()),
        }
    }

    /// Resolves a `group`/`kind` pair, as found in a listener's allowed
    /// kinds, into a route kind. The group defaults to the Gateway API group.
    pub fn from_group_kind(group: Option<&str>, kind: &str) -> Option<Self> {
        let group = group.unwrap_or(k8s::GATEWAY_API_GROUP);
        if group != k8s::GATEWAY_API_GROUP {
            return None;
        }
        Self::ALL.into_iter().find(|k| k.kind_name() == kind)
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind_name())
    }
}

// === impl RouteId ===

impl RouteId {
    /// The `namespace/name` form used for ordering and messages.
    pub fn namespaced_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

// === impl Route ===

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Self::Http(_) => RouteKind::Http,
            Self::Grpc(_) => RouteKind::Grpc,
            Self::Tcp(_) => RouteKind::Tcp,
            Self::Tls(_) => RouteKind::Tls,
            Self::Udp(_) => RouteKind::Udp,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            Self::Http(route) => &route.metadata,
            Self::Grpc(route) => &route.metadata,
            Self::Tcp(route) => &route.metadata,
            Self::Tls(route) => &route.metadata,
            Self::Udp(route) => &route.metadata,
        }
    }

    pub fn id(&self) -> RouteId {
        RouteId {
            kind: self.kind(),
            namespace: self.namespace().to_string(),
            name: self.name().to_string(),
        }
    }

    /// Routes are namespaced resources; a route without a namespace is
    /// treated as belonging to the empty namespace.
    pub fn namespace(&self) -> &str {
        self.meta().namespace.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    pub fn creation_timestamp(&self) -> Option<DateTime<Utc>> {
        self.meta().creation_timestamp.as_ref().map(|Time(t)| *t)
    }

    pub fn hostnames(&self) -> &[String] {
        match self {
            Self::Http(route) => route.spec.hostnames.as_deref().unwrap_or_default(),
            Self::Grpc(route) => route.spec.hostnames.as_deref().unwrap_or_default(),
            Self::Tls(route) => route.spec.hostnames.as_deref().unwrap_or_default(),
            Self::Tcp(_) | Self::Udp(_) => &[],
        }
    }

    /// The route's parent references, normalized across kinds.
    pub fn parent_refs(&self) -> Vec<ParentReference> {
        fn normalize<'p, P>(refs: &'p Option<Vec<P>>) -> Vec<ParentReference>
        where
            ParentReference: From<&'p P>,
        {
            refs.iter().flatten().map(ParentReference::from).collect()
        }

        match self {
            Self::Http(route) => normalize(&route.spec.parent_refs),
            Self::Grpc(route) => normalize(&route.spec.parent_refs),
            Self::Tcp(route) => normalize(&route.spec.parent_refs),
            Self::Tls(route) => normalize(&route.spec.parent_refs),
            Self::Udp(route) => normalize(&route.spec.parent_refs),
        }
    }
}

impl From<HTTPRoute> for Route {
    fn from(route: HTTPRoute) -> Self {
        Self::Http(route)
    }
}

impl From<GRPCRoute> for Route {
    fn from(route: GRPCRoute) -> Self {
        Self::Grpc(route)
    }
}

impl From<TCPRoute> for Route {
    fn from(route: TCPRoute) -> Self {
        Self::Tcp(route)
    }
}

impl From<TLSRoute> for Route {
    fn from(route: TLSRoute) -> Self {
        Self::Tls(route)
    }
}

impl From<UDPRoute> for Route {
    fn from(route: UDPRoute) -> Self {
        Self::Udp(route)
    }
}
