use crate::hostname;
use ahash::AHashMap as HashMap;
use anyhow::Result;
use lb_gateway_controller_core::{
    Listener, NamespacePolicy, Reason, ResourceStore, Route, RouteId,
};
use lb_gateway_controller_k8s_api::{Gateway, Labels, ParentReference, ResourceExt};
use std::collections::{BTreeMap, BTreeSet};

/// The result of matching a pool of routes against a Gateway's listeners.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attachments {
    /// Routes attached to each listener port, ordered by route identity.
    pub routes_by_port: BTreeMap<u16, Vec<RouteId>>,

    /// The hostnames each route is served on at each port, accumulated
    /// across every listener on that port the route attached to.
    pub compatible_hostnames_by_port: BTreeMap<u16, BTreeMap<RouteId, Vec<String>>>,

    /// The parent references through which each route attached.
    pub matched_parent_refs: BTreeMap<RouteId, Vec<ParentReference>>,

    /// Parent references that did not produce an attachment.
    pub failures: Vec<RouteFailure>,

    /// The routes attached to each listener, by listener name.
    pub routes_by_listener: BTreeMap<String, BTreeSet<RouteId>>,
}

/// A route that could not be attached or compiled, with the reason to publish
/// on its status.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteFailure {
    pub route: RouteId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<ParentReference>,
    pub reason: Reason,
    pub message: String,
}

/// Namespace labels, loaded once per pass when a listener selects
/// namespaces by label.
#[derive(Clone, Debug, Default)]
pub struct NamespaceLabels(HashMap<String, Labels>);

struct Rejection {
    reason: Reason,
    message: String,
}

/// Attaches routes to the listeners of `gateway`.
///
/// Routes that do not reference the Gateway at all are ignored. For each
/// parent reference that targets the Gateway, every listener selected by the
/// reference's section name and port is checked. A reference that selects no
/// listener fails with `NoMatchingParent`; a reference whose listeners all
/// reject the route fails with the first listener's rejection reason.
pub fn attach(
    gateway: &Gateway,
    listeners: &[Listener],
    routes: &[Route],
    namespaces: &NamespaceLabels,
) -> Attachments {
    let gateway_ns = gateway.namespace().unwrap_or_default();
    let gateway_name = gateway.name_any();

    let mut attachments = Attachments::default();
    for route in routes {
        let id = route.id();
        let parent_refs = route
            .parent_refs()
            .into_iter()
            .filter(|pr| targets(pr, route, &gateway_ns, &gateway_name));

        for parent_ref in parent_refs {
            let mut selected = false;
            let mut attached = false;
            let mut rejection = None;

            for listener in listeners {
                if !selects(&parent_ref, listener) {
                    continue;
                }
                selected = true;

                match accepts(listener, route, &gateway_ns, namespaces) {
                    Ok(hostnames) => {
                        attached = true;
                        attachments.insert(listener, &id, hostnames);
                    }
                    Err(r) => {
                        tracing::debug!(
                            route = %id,
                            listener = %listener.name,
                            reason = %r.reason,
                            "Listener rejected route"
                        );
                        rejection.get_or_insert(r);
                    }
                }
            }

            if attached {
                attachments
                    .matched_parent_refs
                    .entry(id.clone())
                    .or_default()
                    .push(parent_ref);
                continue;
            }

            let Rejection { reason, message } = match rejection {
                Some(rejection) => rejection,
                None if !selected => Rejection {
                    reason: Reason::NoMatchingParent,
                    message: no_matching_parent_message(&parent_ref),
                },
                None => continue,
            };
            attachments.failures.push(RouteFailure {
                route: id.clone(),
                parent_ref: Some(parent_ref),
                reason,
                message,
            });
        }
    }

    attachments.normalize();
    attachments
}

/// Returns true if the parent reference names this Gateway, defaulting its
/// namespace to the route's.
fn targets(parent_ref: &ParentReference, route: &Route, ns: &str, name: &str) -> bool {
    parent_ref.targets_gateway()
        && parent_ref.name == name
        && parent_ref.namespace.as_deref().unwrap_or(route.namespace()) == ns
}

fn selects(parent_ref: &ParentReference, listener: &Listener) -> bool {
    if let Some(section) = &parent_ref.section_name {
        if *section != listener.name {
            return false;
        }
    }
    if let Some(port) = parent_ref.port {
        if port != i32::from(listener.port) {
            return false;
        }
    }
    true
}

/// Checks a listener's namespace policy, then its route kinds, then hostname
/// compatibility. The first failed check is the rejection.
fn accepts(
    listener: &Listener,
    route: &Route,
    gateway_ns: &str,
    namespaces: &NamespaceLabels,
) -> Result<Vec<String>, Rejection> {
    let allowed = match &listener.namespaces {
        NamespacePolicy::All => true,
        NamespacePolicy::Same => route.namespace() == gateway_ns,
        NamespacePolicy::Selector(selector) => namespaces
            .labels(route.namespace())
            .is_some_and(|labels| selector.matches(labels)),
    };
    if !allowed {
        return Err(Rejection {
            reason: Reason::NotAllowedByListeners,
            message: format!(
                "listener {} does not allow routes from namespace {}",
                listener.name,
                route.namespace()
            ),
        });
    }

    if !listener.accepts_kind(route.kind()) {
        return Err(Rejection {
            reason: Reason::NotAllowedByListeners,
            message: format!(
                "listener {} does not allow {} routes",
                listener.name,
                route.kind()
            ),
        });
    }

    hostname::compatible(listener.hostname.as_deref(), route.hostnames()).ok_or_else(|| {
        Rejection {
            reason: Reason::NoMatchingListenerHostname,
            message: format!(
                "no route hostname is compatible with listener {} hostname {}",
                listener.name,
                listener.hostname.as_deref().unwrap_or_default()
            ),
        }
    })
}

fn no_matching_parent_message(parent_ref: &ParentReference) -> String {
    match (&parent_ref.section_name, parent_ref.port) {
        (Some(section), Some(port)) => {
            format!("no listener named {section} on port {port}")
        }
        (Some(section), None) => format!("no listener named {section}"),
        (None, Some(port)) => format!("no listener on port {port}"),
        (None, None) => "gateway has no valid listeners".to_string(),
    }
}

// === impl Attachments ===

impl Attachments {
    fn insert(&mut self, listener: &Listener, id: &RouteId, hostnames: Vec<String>) {
        self.routes_by_port
            .entry(listener.port)
            .or_default()
            .push(id.clone());
        self.compatible_hostnames_by_port
            .entry(listener.port)
            .or_default()
            .entry(id.clone())
            .or_default()
            .extend(hostnames);
        self.routes_by_listener
            .entry(listener.name.clone())
            .or_default()
            .insert(id.clone());
    }

    fn normalize(&mut self) {
        for routes in self.routes_by_port.values_mut() {
            routes.sort();
            routes.dedup();
        }
        for hostnames in self
            .compatible_hostnames_by_port
            .values_mut()
            .flat_map(|by_route| by_route.values_mut())
        {
            hostnames.sort();
            hostnames.dedup();
        }
        for parent_refs in self.matched_parent_refs.values_mut() {
            parent_refs.dedup();
        }
        // Failures keep their per-route declaration order.
        self.failures.sort_by(|a, b| a.route.cmp(&b.route));
    }

    /// Returns the hostnames recorded for a route at a port, if any.
    pub fn compatible_hostnames(&self, port: u16, id: &RouteId) -> Option<&[String]> {
        self.compatible_hostnames_by_port
            .get(&port)?
            .get(id)
            .map(Vec::as_slice)
            .filter(|hostnames| !hostnames.is_empty())
    }

    /// Every route attached on any port.
    pub fn attached_routes(&self) -> BTreeSet<&RouteId> {
        self.routes_by_port.values().flatten().collect()
    }

    /// Detaches a route from every port, e.g. when its rules cannot be
    /// compiled.
    pub(crate) fn detach(&mut self, id: &RouteId) {
        for routes in self.routes_by_port.values_mut() {
            routes.retain(|r| r != id);
        }
        self.routes_by_port.retain(|_, routes| !routes.is_empty());
        for by_route in self.compatible_hostnames_by_port.values_mut() {
            by_route.remove(id);
        }
        self.compatible_hostnames_by_port
            .retain(|_, by_route| !by_route.is_empty());
    }
}

// === impl NamespaceLabels ===

impl NamespaceLabels {
    /// Loads namespace labels from the store only if a listener selects
    /// namespaces by label.
    pub async fn load<S>(store: &S, listeners: &[Listener]) -> Result<Self>
    where
        S: ResourceStore + ?Sized,
    {
        let selects = listeners
            .iter()
            .any(|l| matches!(l.namespaces, NamespacePolicy::Selector(_)));
        if !selects {
            return Ok(Self::default());
        }

        let namespaces = store.list_namespaces().await?;
        Ok(namespaces
            .into_iter()
            .map(|ns| {
                let name = ns.name_any();
                let labels = Labels::from(ns.metadata.labels);
                (name, labels)
            })
            .collect())
    }

    pub fn labels(&self, namespace: &str) -> Option<&Labels> {
        self.0.get(namespace)
    }
}

impl FromIterator<(String, Labels)> for NamespaceLabels {
    fn from_iter<T: IntoIterator<Item = (String, Labels)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
