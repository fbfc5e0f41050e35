use crate::{backend, transform, LoadError, Transform};
use lb_gateway_controller_core::{Backend, Reason, ResourceStore, Route, RouteId};
use lb_gateway_controller_k8s_api::{
    grpcroutes::GRPCRouteRules,
    httproutes::{HTTPRouteRules, HTTPRouteRulesFilters, HTTPRouteRulesFiltersType},
    BackendRef,
};

/// A route with its rules materialized.
#[derive(Clone, Debug)]
pub struct LoadedRoute {
    pub route: Route,
    pub rules: Vec<LoadedRule>,
}

#[derive(Clone, Debug)]
pub struct LoadedRule {
    pub raw: RawRule,

    /// Resolved backends in declaration order. References that resolved to
    /// nothing are omitted.
    pub backends: Vec<Backend>,

    /// Request transforms, one list per match. A rule without matches has a
    /// single list.
    pub transforms: Vec<Vec<Transform>>,
}

/// A rule's kind-specific match and filter configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum RawRule {
    Http(HTTPRouteRules),
    Grpc(GRPCRouteRules),
    /// TCP, TLS and UDP rules, which only carry backends.
    L4(Vec<BackendRef>),
}

/// Materializes every rule of `route`, resolving backends in declaration
/// order.
pub async fn load<S>(store: &S, route: Route) -> Result<LoadedRoute, LoadError>
where
    S: ResourceStore + ?Sized,
{
    let id = route.id();
    let mut rules = Vec::new();
    for raw in raw_rules(&route) {
        rules.push(load_rule(store, &id, raw).await?);
    }
    tracing::trace!(route = %id, rules = rules.len(), "Loaded route");
    Ok(LoadedRoute { route, rules })
}

async fn load_rule<S>(store: &S, id: &RouteId, raw: RawRule) -> Result<LoadedRule, LoadError>
where
    S: ResourceStore + ?Sized,
{
    let mut backends = Vec::new();
    for backend_ref in raw.backend_refs() {
        if let Some(backend) = backend::resolve(store, id, &backend_ref).await? {
            backends.push(backend);
        }
    }

    let transforms = match &raw {
        RawRule::Http(rule) => http_transforms(rule)?,
        RawRule::Grpc(_) | RawRule::L4(_) => vec![vec![]; raw.match_count().max(1)],
    };

    Ok(LoadedRule {
        raw,
        backends,
        transforms,
    })
}

fn http_transforms(rule: &HTTPRouteRules) -> Result<Vec<Vec<Transform>>, LoadError> {
    let rewrites = rule
        .filters
        .iter()
        .flatten()
        .filter(|filter| matches!(filter.r#type, HTTPRouteRulesFiltersType::UrlRewrite))
        .map(|filter| {
            filter.url_rewrite.as_ref().ok_or_else(|| {
                LoadError::invalid(
                    Reason::UnsupportedValue,
                    "URLRewrite filter requires urlRewrite",
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let paths = match rule.matches.as_deref() {
        None | Some([]) => vec![None],
        Some(matches) => matches.iter().map(|m| m.path.as_ref()).collect(),
    };

    paths
        .into_iter()
        .map(|path| -> Result<Vec<Transform>, LoadError> {
            let mut transforms = Vec::new();
            for rewrite in &rewrites {
                transforms.extend(transform::url_rewrite(rewrite, path)?);
            }
            Ok(transforms)
        })
        .collect()
}

pub(crate) fn raw_rules(route: &Route) -> Vec<RawRule> {
    match route {
        Route::Http(route) => route
            .spec
            .rules
            .iter()
            .flatten()
            .cloned()
            .map(RawRule::Http)
            .collect(),
        Route::Grpc(route) => route
            .spec
            .rules
            .iter()
            .flatten()
            .cloned()
            .map(RawRule::Grpc)
            .collect(),
        Route::Tcp(route) => route
            .spec
            .rules
            .iter()
            .map(|rule| RawRule::l4(&rule.backend_refs))
            .collect(),
        Route::Tls(route) => route
            .spec
            .rules
            .iter()
            .map(|rule| RawRule::l4(&rule.backend_refs))
            .collect(),
        Route::Udp(route) => route
            .spec
            .rules
            .iter()
            .map(|rule| RawRule::l4(&rule.backend_refs))
            .collect(),
    }
}

// === impl LoadedRoute ===

impl LoadedRoute {
    pub fn id(&self) -> RouteId {
        self.route.id()
    }
}

// === impl RawRule ===

impl RawRule {
    fn l4<'b, B>(backend_refs: &'b Option<Vec<B>>) -> Self
    where
        BackendRef: From<&'b B>,
    {
        Self::L4(backend_refs.iter().flatten().map(BackendRef::from).collect())
    }

    /// The rule's backend references, normalized across kinds.
    pub fn backend_refs(&self) -> Vec<BackendRef> {
        match self {
            Self::Http(rule) => rule
                .backend_refs
                .iter()
                .flatten()
                .map(BackendRef::from)
                .collect(),
            Self::Grpc(rule) => rule
                .backend_refs
                .iter()
                .flatten()
                .map(BackendRef::from)
                .collect(),
            Self::L4(backend_refs) => backend_refs.clone(),
        }
    }

    pub fn match_count(&self) -> usize {
        match self {
            Self::Http(rule) => rule.matches.as_ref().map_or(0, Vec::len),
            Self::Grpc(rule) => rule.matches.as_ref().map_or(0, Vec::len),
            Self::L4(_) => 0,
        }
    }

    /// Returns true if the rule carries a redirect filter, however it is
    /// configured.
    pub fn has_redirect_filter(&self) -> bool {
        match self {
            Self::Http(rule) => rule.filters.iter().flatten().any(is_redirect),
            Self::Grpc(_) | Self::L4(_) => false,
        }
    }
}

/// A redirect filter counts even when its configuration is empty.
fn is_redirect(filter: &HTTPRouteRulesFilters) -> bool {
    matches!(filter.r#type, HTTPRouteRulesFiltersType::RequestRedirect)
}
