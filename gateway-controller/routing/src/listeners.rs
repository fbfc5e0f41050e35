use ahash::AHashMap as HashMap;
use lb_gateway_controller_core::{
    ControllerClass, Listener, NamespacePolicy, Protocol, Reason, RouteKind,
};
use lb_gateway_controller_k8s_api::{
    gateways::{GatewayListeners, GatewayListenersAllowedRoutesNamespacesFrom as FromNamespaces},
    Gateway, Selector,
};
use std::collections::BTreeSet;

/// The outcome of validating every listener on a Gateway.
#[derive(Clone, Debug, Default)]
pub struct ValidatedListeners {
    /// Listeners that passed validation, in declaration order.
    pub listeners: Vec<Listener>,

    /// One status per declared listener, in declaration order.
    pub statuses: Vec<ListenerStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerStatus {
    pub name: String,
    pub port: i32,
    pub protocol: String,
    pub supported_kinds: Vec<RouteKind>,
    pub attached_routes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<Invalid>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Invalid {
    pub reason: Reason,
    pub message: String,
}

/// Validates a Gateway's listeners for the given controller class.
///
/// Every listener is evaluated. For a single listener the route kind check
/// runs first, then port, protocol and finally conflicts with the listeners
/// that were declared, and accepted, before it.
pub fn validate(gateway: &Gateway, class: ControllerClass) -> ValidatedListeners {
    let mut validated = ValidatedListeners::default();
    let mut protocols_by_port = HashMap::<u16, Protocol>::new();
    let mut hostnames_by_port = HashMap::<u16, BTreeSet<String>>::new();

    for spec in &gateway.spec.listeners {
        let protocol = Protocol::parse(&spec.protocol);
        let hostname = spec.hostname.clone().filter(|h| !h.is_empty());
        let kinds = supported_kinds(spec, protocol, class);

        let mut status = ListenerStatus {
            name: spec.name.clone(),
            port: spec.port,
            protocol: spec.protocol.clone(),
            supported_kinds: kinds.valid.iter().copied().collect(),
            attached_routes: 0,
            invalid: None,
        };

        let checked = check(
            spec,
            protocol,
            hostname.as_deref(),
            &kinds,
            class,
            &protocols_by_port,
            &hostnames_by_port,
        );
        match checked {
            Ok((port, protocol)) => {
                protocols_by_port.entry(port).or_insert(protocol);
                if let Some(hostname) = hostname.clone() {
                    hostnames_by_port.entry(port).or_default().insert(hostname);
                }
                validated.listeners.push(Listener {
                    name: spec.name.clone(),
                    port,
                    protocol,
                    hostname,
                    supported_kinds: kinds.valid,
                    namespaces: namespace_policy(spec),
                });
            }
            Err(invalid) => {
                tracing::debug!(
                    listener = %spec.name,
                    port = spec.port,
                    reason = %invalid.reason,
                    "Listener is invalid"
                );
                status.invalid = Some(invalid);
            }
        }

        validated.statuses.push(status);
    }

    validated
}

struct Kinds {
    valid: BTreeSet<RouteKind>,
    rejected: Vec<String>,
}

fn supported_kinds(
    spec: &GatewayListeners,
    protocol: Option<Protocol>,
    class: ControllerClass,
) -> Kinds {
    let explicit = spec
        .allowed_routes
        .as_ref()
        .and_then(|ar| ar.kinds.as_ref())
        .filter(|kinds| !kinds.is_empty());

    let Some(explicit) = explicit else {
        let valid = protocol
            .map(|p| p.default_kinds())
            .unwrap_or_default()
            .into_iter()
            .filter(|k| class.supports_kind(*k))
            .collect();
        return Kinds {
            valid,
            rejected: vec![],
        };
    };

    let mut kinds = Kinds {
        valid: BTreeSet::new(),
        rejected: vec![],
    };
    for gk in explicit {
        match RouteKind::from_group_kind(gk.group.as_deref(), &gk.kind) {
            Some(kind) if class.supports_kind(kind) => {
                kinds.valid.insert(kind);
            }
            _ => kinds.rejected.push(gk.kind.clone()),
        }
    }
    kinds
}

fn check(
    spec: &GatewayListeners,
    protocol: Option<Protocol>,
    hostname: Option<&str>,
    kinds: &Kinds,
    class: ControllerClass,
    protocols_by_port: &HashMap<u16, Protocol>,
    hostnames_by_port: &HashMap<u16, BTreeSet<String>>,
) -> Result<(u16, Protocol), Invalid> {
    if !kinds.rejected.is_empty() {
        return Err(Invalid {
            reason: Reason::InvalidRouteKinds,
            message: format!(
                "route kinds not supported by the {class} controller: {}",
                kinds.rejected.join(", ")
            ),
        });
    }

    let port = u16::try_from(spec.port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| Invalid {
            reason: Reason::PortUnavailable,
            message: format!("port {} is outside of the range 1-65535", spec.port),
        })?;

    let protocol = protocol
        .filter(|p| class.supports_protocol(*p))
        .ok_or_else(|| Invalid {
            reason: Reason::UnsupportedProtocol,
            message: format!(
                "protocol {} is not supported by the {class} controller",
                spec.protocol
            ),
        })?;

    if let Some(existing) = protocols_by_port.get(&port) {
        if !existing.may_share_port(protocol) {
            return Err(Invalid {
                reason: Reason::ProtocolConflict,
                message: format!("port {port} is already used by a {existing} listener"),
            });
        }
    }

    if let Some(hostname) = hostname {
        if hostnames_by_port
            .get(&port)
            .is_some_and(|hostnames| hostnames.contains(hostname))
        {
            return Err(Invalid {
                reason: Reason::HostnameConflict,
                message: format!(
                    "hostname {hostname} is already used by a listener on port {port}"
                ),
            });
        }
    }

    Ok((port, protocol))
}

/// Listeners default to routes from their own namespace. A selector that is
/// missing or cannot be evaluated also falls back to the same namespace.
fn namespace_policy(spec: &GatewayListeners) -> NamespacePolicy {
    let Some(namespaces) = spec.allowed_routes.as_ref().and_then(|ar| ar.namespaces.as_ref())
    else {
        return NamespacePolicy::Same;
    };

    match namespaces.from.as_ref() {
        Some(FromNamespaces::All) => NamespacePolicy::All,
        Some(FromNamespaces::Same) | None => NamespacePolicy::Same,
        Some(FromNamespaces::Selector) => match namespaces.selector.as_ref().map(Selector::try_from) {
            Some(Ok(selector)) => NamespacePolicy::Selector(selector),
            Some(Err(error)) => {
                tracing::warn!(
                    listener = %spec.name,
                    %error,
                    "Invalid namespace selector; allowing the same namespace"
                );
                NamespacePolicy::Same
            }
            None => {
                tracing::debug!(
                    listener = %spec.name,
                    "Namespace selector missing; allowing the same namespace"
                );
                NamespacePolicy::Same
            }
        },
    }
}

// === impl ValidatedListeners ===

impl ValidatedListeners {
    pub fn has_errors(&self) -> bool {
        self.statuses.iter().any(|s| s.invalid.is_some())
    }

    /// Every route kind that at least one valid listener accepts.
    pub fn accepted_kinds(&self) -> BTreeSet<RouteKind> {
        self.listeners
            .iter()
            .flat_map(|l| l.supported_kinds.iter().copied())
            .collect()
    }

    pub(crate) fn set_attached_routes(&mut self, name: &str, count: usize) {
        if let Some(status) = self.statuses.iter_mut().find(|s| s.name == name) {
            status.attached_routes = count;
        }
    }
}
