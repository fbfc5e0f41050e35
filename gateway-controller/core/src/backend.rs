use lb_gateway_controller_k8s_api::{
    Gateway, ResourceExt, Service, ServicePort, TargetGroupConfiguration,
};

/// A resolved forwarding target for a route rule.
///
/// Backends are computed on every rule materialization and never mutated
/// afterwards.
#[derive(Clone, Debug)]
pub struct Backend {
    pub target: BackendTarget,

    /// Relative share of traffic; never zero.
    pub weight: u32,

    pub target_group_configuration: Option<TargetGroupConfiguration>,
}

#[derive(Clone, Debug)]
pub enum BackendTarget {
    Service {
        service: Service,
        port: ServicePort,
    },

    /// Another Gateway's provisioned load balancer.
    Gateway {
        gateway: Gateway,
        port: u16,
        address: String,
    },
}

/// The outcome of a lookup that must not reveal whether a resource exists.
///
/// A reference that is not permitted is indistinguishable from one whose
/// target is absent. Infrastructure failures are reported separately as
/// errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    NotAuthorizedOrAbsent,
}

// === impl Backend ===

impl Backend {
    pub fn namespace(&self) -> String {
        match &self.target {
            BackendTarget::Service { service, .. } => service.namespace().unwrap_or_default(),
            BackendTarget::Gateway { gateway, .. } => gateway.namespace().unwrap_or_default(),
        }
    }

    pub fn name(&self) -> String {
        match &self.target {
            BackendTarget::Service { service, .. } => service.name_any(),
            BackendTarget::Gateway { gateway, .. } => gateway.name_any(),
        }
    }

    pub fn port(&self) -> u16 {
        match &self.target {
            BackendTarget::Service { port, .. } => u16::try_from(port.port).unwrap_or_default(),
            BackendTarget::Gateway { port, .. } => *port,
        }
    }

    pub fn kind(&self) -> &'static str {
        match &self.target {
            BackendTarget::Service { .. } => "Service",
            BackendTarget::Gateway { .. } => "Gateway",
        }
    }
}

// === impl Resolution ===

impl<T> Resolution<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::NotAuthorizedOrAbsent => None,
        }
    }
}
