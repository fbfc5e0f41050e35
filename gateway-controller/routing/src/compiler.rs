use crate::{
    attachment, classify, listeners, loader, precedence, Attachments, LoadError, LoadedRoute,
    NamespaceLabels, RouteFailure, RulePrecedence, TargetGroupDemand, ValidatedListeners,
};
use anyhow::{anyhow, Result};
use lb_gateway_controller_core::{ControllerClass, Listener, ResourceStore, RouteId};
use lb_gateway_controller_k8s_api::Gateway;
use std::collections::{BTreeMap, BTreeSet};

/// The result of compiling a single Gateway.
#[derive(Debug)]
pub struct Compiled {
    pub gateway: Gateway,
    pub class: ControllerClass,
    pub listeners: ValidatedListeners,
    pub attachments: Attachments,

    /// Every attached route that loaded successfully. A route attached on
    /// several ports is loaded once.
    pub routes: BTreeMap<RouteId, LoadedRoute>,

    /// Attachment failures and routes that could not be compiled.
    pub failures: Vec<RouteFailure>,

    /// Routes that could not be loaded due to store failures. These should
    /// be retried.
    pub errors: Vec<(RouteId, anyhow::Error)>,
}

/// Compiles the Gateway `namespace/name` against the routes in `store`.
///
/// Fails only if the Gateway cannot be read or the routes cannot be listed.
/// Failures of individual routes are reported in the result.
pub async fn compile<S>(
    store: &S,
    namespace: &str,
    name: &str,
    class: ControllerClass,
) -> Result<Compiled>
where
    S: ResourceStore + ?Sized,
{
    let gateway = store
        .get_gateway(namespace, name)
        .await?
        .ok_or_else(|| anyhow!("gateway {namespace}/{name} not found"))?;

    let mut listeners = listeners::validate(&gateway, class);
    if listeners.has_errors() {
        tracing::info!(%namespace, %name, "Gateway has invalid listeners");
    }

    let namespaces = NamespaceLabels::load(store, &listeners.listeners).await?;

    let mut routes = Vec::new();
    for kind in listeners.accepted_kinds() {
        routes.extend(store.list_routes(kind).await?);
    }

    let mut attachments = attachment::attach(&gateway, &listeners.listeners, &routes, &namespaces);
    for (listener, ids) in &attachments.routes_by_listener {
        listeners.set_attached_routes(listener, ids.len());
    }

    let attached = attachments
        .attached_routes()
        .into_iter()
        .cloned()
        .collect::<BTreeSet<_>>();
    let mut failures = attachments.failures.clone();
    let mut loaded = BTreeMap::new();
    let mut errors = Vec::new();
    for route in routes.into_iter().filter(|r| attached.contains(&r.id())) {
        let id = route.id();
        match loader::load(store, route).await {
            Ok(route) => {
                loaded.insert(id, route);
            }
            Err(LoadError::Invalid { reason, message }) => {
                tracing::info!(route = %id, %reason, %message, "Route cannot be compiled");
                attachments.detach(&id);
                failures.push(RouteFailure {
                    route: id,
                    parent_ref: None,
                    reason,
                    message,
                });
            }
            Err(LoadError::Infrastructure(error)) => {
                tracing::warn!(route = %id, %error, "Failed to load route");
                attachments.detach(&id);
                errors.push((id, error));
            }
        }
    }
    failures.sort_by(|a, b| a.route.cmp(&b.route));

    tracing::info!(
        %namespace,
        %name,
        listeners = listeners.listeners.len(),
        routes = loaded.len(),
        failures = failures.len(),
        errors = errors.len(),
        "Compiled gateway"
    );

    Ok(Compiled {
        gateway,
        class,
        listeners,
        attachments,
        routes: loaded,
        failures,
        errors,
    })
}

// === impl Compiled ===

impl Compiled {
    /// Ports with at least one attached route, in ascending order.
    pub fn ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.attachments.routes_by_port.keys().copied()
    }

    pub fn listeners_on(&self, port: u16) -> impl Iterator<Item = &Listener> + '_ {
        self.listeners.listeners.iter().filter(move |l| l.port == port)
    }

    pub fn routes_on(&self, port: u16) -> impl Iterator<Item = &LoadedRoute> + '_ {
        self.attachments
            .routes_by_port
            .get(&port)
            .into_iter()
            .flatten()
            .filter_map(|id| self.routes.get(id))
    }

    /// The ordered rule table for a port.
    pub fn rule_table(&self, port: u16) -> Vec<RulePrecedence<'_>> {
        precedence::sort(self.routes_on(port), Some((&self.attachments, port)))
    }

    pub fn demand(&self, port: u16) -> TargetGroupDemand {
        classify::demand(self.routes_on(port))
    }
}
