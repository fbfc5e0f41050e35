use crate::{LoadedRoute, LoadedRule};
use lb_gateway_controller_core::Backend;

/// How a rule forwards traffic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleClass {
    /// Only responds with a redirect; no target groups are needed.
    RedirectOnly,
    /// Forwards to its backends.
    Forwarding,
    /// Carries a redirect filter but also has backends, so it is treated as
    /// forwarding for accounting purposes.
    Mixed,
}

/// The target groups required to serve a set of rules.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroupDemand {
    pub forwarding_rules: usize,
    pub redirect_only_rules: usize,
    pub target_groups: usize,
}

pub fn has_redirect_filter(rule: &LoadedRule) -> bool {
    rule.raw.has_redirect_filter()
}

/// A rule is redirect-only when it has a redirect filter and no backends.
/// Any backend makes the rule forwarding, whatever filters it carries.
pub fn is_redirect_only(rule: &LoadedRule) -> bool {
    has_redirect_filter(rule) && rule.backends.is_empty()
}

pub fn classify(rule: &LoadedRule) -> RuleClass {
    match (has_redirect_filter(rule), rule.backends.is_empty()) {
        (true, true) => RuleClass::RedirectOnly,
        (true, false) => RuleClass::Mixed,
        (false, _) => RuleClass::Forwarding,
    }
}

/// Sizes target group creation for a set of routes: one target group per
/// backend of each rule that is not redirect-only.
pub fn demand<'r>(routes: impl IntoIterator<Item = &'r LoadedRoute>) -> TargetGroupDemand {
    let mut demand = TargetGroupDemand::default();
    for rule in routes.into_iter().flat_map(|r| r.rules.iter()) {
        if is_redirect_only(rule) {
            demand.redirect_only_rules += 1;
        } else {
            demand.forwarding_rules += 1;
            demand.target_groups += rule.backends.len();
        }
    }
    demand
}

/// Backends whose target groups may need to be cleaned up. Redirect-only
/// rules never had target groups and are skipped.
pub fn forwarding_backends<'r>(
    routes: impl IntoIterator<Item = &'r LoadedRoute>,
) -> impl Iterator<Item = &'r Backend> {
    routes
        .into_iter()
        .flat_map(|r| r.rules.iter())
        .filter(|rule| !is_redirect_only(rule))
        .flat_map(|rule| rule.backends.iter())
}
