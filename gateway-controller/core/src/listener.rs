use crate::routes::RouteKind;
use lb_gateway_controller_k8s_api::Selector;
use std::{collections::BTreeSet, fmt, str::FromStr};

/// Selects which load balancer flavor a Gateway is compiled for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerClass {
    /// Application load balancers terminate HTTP, HTTPS and gRPC.
    Alb,
    /// Network load balancers forward TCP, UDP and TLS.
    Nlb,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Https,
    Grpc,
    Tcp,
    Udp,
    Tls,
}

/// A validated, flattened Gateway listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listener {
    pub name: String,
    pub port: u16,
    pub protocol: Protocol,
    pub hostname: Option<String>,
    pub supported_kinds: BTreeSet<RouteKind>,
    pub namespaces: NamespacePolicy,
}

/// Which namespaces may attach routes to a listener.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NamespacePolicy {
    All,
    #[default]
    Same,
    Selector(Selector),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid controller class: {0} (expected alb or nlb)")]
pub struct InvalidControllerClass(String);

// === impl ControllerClass ===

impl ControllerClass {
    pub fn supports_protocol(&self, protocol: Protocol) -> bool {
        match self {
            Self::Alb => matches!(protocol, Protocol::Http | Protocol::Https | Protocol::Grpc),
            Self::Nlb => matches!(protocol, Protocol::Tcp | Protocol::Udp | Protocol::Tls),
        }
    }

    pub fn supports_kind(&self, kind: RouteKind) -> bool {
        match self {
            Self::Alb => matches!(kind, RouteKind::Http | RouteKind::Grpc),
            Self::Nlb => matches!(kind, RouteKind::Tcp | RouteKind::Udp | RouteKind::Tls),
        }
    }
}

impl FromStr for ControllerClass {
    type Err = InvalidControllerClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("alb") {
            return Ok(Self::Alb);
        }
        if s.eq_ignore_ascii_case("nlb") {
            return Ok(Self::Nlb);
        }
        Err(InvalidControllerClass(s.to_string()))
    }
}

impl fmt::Display for ControllerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alb => f.write_str("alb"),
            Self::Nlb => f.write_str("nlb"),
        }
    }
}

// === impl Protocol ===

impl Protocol {
    /// Parses a listener protocol name. Protocol names are case-sensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HTTP" => Some(Self::Http),
            "HTTPS" => Some(Self::Https),
            "GRPC" => Some(Self::Grpc),
            "TCP" => Some(Self::Tcp),
            "UDP" => Some(Self::Udp),
            "TLS" => Some(Self::Tls),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
            Self::Grpc => "GRPC",
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Tls => "TLS",
        }
    }

    /// The route kinds a listener accepts when it does not list any.
    pub fn default_kinds(&self) -> BTreeSet<RouteKind> {
        match self {
            Self::Http => [RouteKind::Http].into_iter().collect(),
            Self::Https => [RouteKind::Http, RouteKind::Grpc].into_iter().collect(),
            Self::Grpc => [RouteKind::Grpc].into_iter().collect(),
            Self::Tcp => [RouteKind::Tcp].into_iter().collect(),
            Self::Udp => [RouteKind::Udp].into_iter().collect(),
            Self::Tls => [RouteKind::Tls, RouteKind::Tcp].into_iter().collect(),
        }
    }

    /// Two listeners with different protocols may only share a port when one
    /// is TCP and the other UDP.
    pub fn may_share_port(&self, other: Protocol) -> bool {
        *self == other
            || matches!(
                (self, other),
                (Self::Tcp, Protocol::Udp) | (Self::Udp, Protocol::Tcp)
            )
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl Listener ===

impl Listener {
    pub fn accepts_kind(&self, kind: RouteKind) -> bool {
        self.supported_kinds.contains(&kind)
    }
}
