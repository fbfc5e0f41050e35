//! Orders rule matches into a load balancer rule table.
//!
//! Each (rule, match) pair yields one [`RulePrecedence`]. Route kinds are
//! sorted as independent groups which are concatenated in kind order, so all
//! HTTP entries precede all gRPC entries.

use crate::{hostname, Attachments, LoadedRoute, LoadedRule, RawRule, Transform};
use chrono::{offset::Utc, DateTime};
use lb_gateway_controller_core::{RouteId, RouteKind};
use lb_gateway_controller_k8s_api::{
    grpcroutes::{GRPCRouteRulesMatches, GRPCRouteRulesMatchesMethodType as MethodType},
    httproutes::{HTTPRouteRulesMatches, HTTPRouteRulesMatchesPathType as PathType},
};
use std::cmp::Ordering;

/// The match index of the single entry emitted for a rule without matches.
pub const NO_MATCH_INDEX: usize = usize::MAX;

#[derive(Clone, Debug)]
pub struct RulePrecedence<'r> {
    pub route: &'r LoadedRoute,
    pub rule: &'r LoadedRule,
    pub id: RouteId,
    pub rule_index: usize,
    pub match_index: usize,
    pub hostnames: Vec<String>,
    pub specificity: Specificity,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub namespaced_name: String,
}

/// Kind-specific match factors, compared field by field.
///
/// Match types rank exact above prefix above regular expression. A path or
/// method without a type ranks below all of them, alongside a match that
/// omits the path or method entirely.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Specificity {
    Http {
        path_type: u8,
        path_len: usize,
        has_method: bool,
        headers: usize,
        query_params: usize,
    },
    Grpc {
        method_type: u8,
        service_len: usize,
        method_len: usize,
        headers: usize,
    },
    /// TCP, TLS and UDP rules carry no match criteria.
    Layer4,
}

/// Builds and orders the precedence records for `routes` as served on
/// `port`.
///
/// Hostnames are taken from the attachment results for the port, falling
/// back to the route's declared hostnames.
pub fn sort<'r>(
    routes: impl IntoIterator<Item = &'r LoadedRoute>,
    attachments: Option<(&Attachments, u16)>,
) -> Vec<RulePrecedence<'r>> {
    let mut records = Vec::new();
    for route in routes {
        let id = route.id();
        let hostnames = attachments
            .and_then(|(a, port)| a.compatible_hostnames(port, &id))
            .unwrap_or(route.route.hostnames())
            .to_vec();
        records.extend(records_for(route, id, hostnames));
    }

    records.sort_by(|a, b| {
        a.id.kind
            .cmp(&b.id.kind)
            .then_with(|| compare(a, b))
    });
    records
}

fn records_for(
    route: &LoadedRoute,
    id: RouteId,
    hostnames: Vec<String>,
) -> Vec<RulePrecedence<'_>> {
    let creation_timestamp = route.route.creation_timestamp();
    let namespaced_name = id.namespaced_name();

    let mut records = Vec::new();
    for (rule_index, rule) in route.rules.iter().enumerate() {
        let specificities = match &rule.raw {
            RawRule::Http(raw) => match raw.matches.as_deref() {
                None | Some([]) => vec![(NO_MATCH_INDEX, Specificity::http_default())],
                Some(matches) => matches
                    .iter()
                    .map(Specificity::http)
                    .enumerate()
                    .collect(),
            },
            RawRule::Grpc(raw) => match raw.matches.as_deref() {
                None | Some([]) => vec![(NO_MATCH_INDEX, Specificity::grpc_default())],
                Some(matches) => matches
                    .iter()
                    .map(Specificity::grpc)
                    .enumerate()
                    .collect(),
            },
            RawRule::L4(_) => vec![(NO_MATCH_INDEX, Specificity::Layer4)],
        };

        for (match_index, specificity) in specificities {
            records.push(RulePrecedence {
                route,
                rule,
                id: id.clone(),
                rule_index,
                match_index,
                hostnames: hostnames.clone(),
                specificity,
                creation_timestamp,
                namespaced_name: namespaced_name.clone(),
            });
        }
    }
    records
}

/// Compares two records of the same route kind; `Less` means `a` is matched
/// first.
pub fn compare(a: &RulePrecedence<'_>, b: &RulePrecedence<'_>) -> Ordering {
    hostname::cmp_lists(&a.hostnames, &b.hostnames)
        .then_with(|| a.specificity.compare(&b.specificity))
        .then_with(|| cmp_timestamps(a.creation_timestamp, b.creation_timestamp))
        .then_with(|| a.namespaced_name.cmp(&b.namespaced_name))
        .then_with(|| a.rule_index.cmp(&b.rule_index))
        .then_with(|| a.match_index.cmp(&b.match_index))
}

/// Earlier routes win. Routes without a timestamp sort after those with one.
fn cmp_timestamps(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// === impl RulePrecedence ===

impl<'r> RulePrecedence<'r> {
    pub fn kind(&self) -> RouteKind {
        self.id.kind
    }

    /// The request transforms for this entry's match.
    pub fn transforms(&self) -> &'r [Transform] {
        let rule: &'r LoadedRule = self.rule;
        let index = if self.match_index == NO_MATCH_INDEX {
            0
        } else {
            self.match_index
        };
        rule.transforms
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn http_match(&self) -> Option<&'r HTTPRouteRulesMatches> {
        let rule: &'r LoadedRule = self.rule;
        match &rule.raw {
            RawRule::Http(rule) => rule.matches.as_ref()?.get(self.match_index),
            _ => None,
        }
    }

    pub fn grpc_match(&self) -> Option<&'r GRPCRouteRulesMatches> {
        let rule: &'r LoadedRule = self.rule;
        match &rule.raw {
            RawRule::Grpc(rule) => rule.matches.as_ref()?.get(self.match_index),
            _ => None,
        }
    }
}

// === impl Specificity ===

impl Specificity {
    fn http(m: &HTTPRouteRulesMatches) -> Self {
        let (path_type, path_len) = match &m.path {
            None => (0, 0),
            Some(path) => {
                let rank = match path.r#type {
                    Some(PathType::Exact) => 3,
                    Some(PathType::PathPrefix) => 2,
                    Some(PathType::RegularExpression) => 1,
                    None => 0,
                };
                (rank, path.value.as_deref().map_or(0, str::len))
            }
        };
        Self::Http {
            path_type,
            path_len,
            has_method: m.method.is_some(),
            headers: m.headers.as_ref().map_or(0, Vec::len),
            query_params: m.query_params.as_ref().map_or(0, Vec::len),
        }
    }

    fn http_default() -> Self {
        Self::Http {
            path_type: 0,
            path_len: 0,
            has_method: false,
            headers: 0,
            query_params: 0,
        }
    }

    fn grpc(m: &GRPCRouteRulesMatches) -> Self {
        let (method_type, service_len, method_len) = match &m.method {
            None => (0, 0, 0),
            Some(method) => {
                let rank = match method.r#type {
                    Some(MethodType::Exact) => 3,
                    Some(MethodType::RegularExpression) => 1,
                    None => 0,
                };
                (
                    rank,
                    method.service.as_deref().map_or(0, str::len),
                    method.method.as_deref().map_or(0, str::len),
                )
            }
        };
        Self::Grpc {
            method_type,
            service_len,
            method_len,
            headers: m.headers.as_ref().map_or(0, Vec::len),
        }
    }

    fn grpc_default() -> Self {
        Self::Grpc {
            method_type: 0,
            service_len: 0,
            method_len: 0,
            headers: 0,
        }
    }

    /// Larger factors are more specific and sort first.
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Self::Http {
                    path_type: at,
                    path_len: al,
                    has_method: am,
                    headers: ah,
                    query_params: aq,
                },
                Self::Http {
                    path_type: bt,
                    path_len: bl,
                    has_method: bm,
                    headers: bh,
                    query_params: bq,
                },
            ) => bt
                .cmp(at)
                .then_with(|| bl.cmp(al))
                .then_with(|| bm.cmp(am))
                .then_with(|| bh.cmp(ah))
                .then_with(|| bq.cmp(aq)),
            (
                Self::Grpc {
                    method_type: at,
                    service_len: asl,
                    method_len: aml,
                    headers: ah,
                },
                Self::Grpc {
                    method_type: bt,
                    service_len: bsl,
                    method_len: bml,
                    headers: bh,
                },
            ) => bt
                .cmp(at)
                .then_with(|| bsl.cmp(asl))
                .then_with(|| bml.cmp(aml))
                .then_with(|| bh.cmp(ah)),
            _ => Ordering::Equal,
        }
    }
}
