//! The JSON report of a compiled Gateway.

use crate::{
    core::{Backend, BackendTarget, ControllerClass, RouteId},
    k8s::{grpcroutes::GRPCRouteRulesMatches, httproutes::HTTPRouteRulesMatches, ResourceExt},
    routing::{
        classify, precedence::NO_MATCH_INDEX, Compiled, ListenerStatus, RouteFailure,
        RuleClass, RulePrecedence, TargetGroupDemand, Transform,
    },
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'c> {
    pub gateway: String,
    pub controller_class: ControllerClass,
    pub listeners: &'c [ListenerStatus],
    pub ports: Vec<PortReport<'c>>,
    pub failures: Vec<FailureReport<'c>>,
    pub errors: Vec<RouteError<'c>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortReport<'c> {
    pub port: u16,
    pub demand: TargetGroupDemand,
    pub rules: Vec<RuleReport<'c>>,
}

/// One entry of a port's rule table, in evaluation order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleReport<'c> {
    /// Starts at 1.
    pub priority: usize,
    pub route: RouteId,
    pub rule_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_index: Option<usize>,
    pub class: RuleClass,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_match: Option<&'c HTTPRouteRulesMatches>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_match: Option<&'c GRPCRouteRulesMatches>,
    pub backends: Vec<BackendReport<'c>>,
    pub transforms: &'c [Transform],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendReport<'c> {
    pub kind: &'static str,
    pub namespace: String,
    pub name: String,
    pub port: u16,
    pub weight: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<&'c str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_group_configuration: Option<String>,
}

/// A route failure, with the status condition it is reported under.
#[derive(Debug, Serialize)]
pub struct FailureReport<'c> {
    pub condition: &'static str,
    #[serde(flatten)]
    pub failure: &'c RouteFailure,
}

#[derive(Debug, Serialize)]
pub struct RouteError<'c> {
    pub route: &'c RouteId,
    pub error: String,
}

// === impl Report ===

impl<'c> Report<'c> {
    pub fn new(compiled: &'c Compiled) -> Self {
        let ports = compiled
            .ports()
            .map(|port| PortReport {
                port,
                demand: compiled.demand(port),
                rules: compiled
                    .rule_table(port)
                    .into_iter()
                    .enumerate()
                    .map(|(i, entry)| RuleReport::new(i + 1, entry))
                    .collect(),
            })
            .collect();

        let errors = compiled
            .errors
            .iter()
            .map(|(route, error)| RouteError {
                route,
                error: format!("{error:#}"),
            })
            .collect();

        Self {
            gateway: format!(
                "{}/{}",
                compiled.gateway.namespace().unwrap_or_default(),
                compiled.gateway.name_any()
            ),
            controller_class: compiled.class,
            listeners: &compiled.listeners.statuses,
            ports,
            failures: compiled
                .failures
                .iter()
                .map(|failure| FailureReport {
                    condition: failure.reason.condition_type(),
                    failure,
                })
                .collect(),
            errors,
        }
    }
}

// === impl RuleReport ===

impl<'c> RuleReport<'c> {
    fn new(priority: usize, entry: RulePrecedence<'c>) -> Self {
        let rule = entry.rule;
        Self {
            priority,
            route: entry.id.clone(),
            rule_index: entry.rule_index,
            match_index: Some(entry.match_index).filter(|i| *i != NO_MATCH_INDEX),
            class: classify::classify(rule),
            http_match: entry.http_match(),
            grpc_match: entry.grpc_match(),
            backends: rule.backends.iter().map(BackendReport::from).collect(),
            transforms: entry.transforms(),
            hostnames: entry.hostnames,
        }
    }
}

impl<'c> From<&'c Backend> for BackendReport<'c> {
    fn from(backend: &'c Backend) -> Self {
        let address = match &backend.target {
            BackendTarget::Gateway { address, .. } => Some(address.as_str()),
            BackendTarget::Service { .. } => None,
        };
        Self {
            kind: backend.kind(),
            namespace: backend.namespace(),
            name: backend.name(),
            port: backend.port(),
            weight: backend.weight,
            address,
            target_group_configuration: backend
                .target_group_configuration
                .as_ref()
                .map(|tgc| tgc.name_any()),
        }
    }
}
