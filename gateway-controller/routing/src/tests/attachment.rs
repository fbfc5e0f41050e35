use super::*;
use crate::{
    attachment::{attach, NamespaceLabels},
    listeners::validate,
    Attachments,
};
use lb_gateway_controller_core::{ControllerClass, Reason, Route, RouteId};
use lb_gateway_controller_k8s_api::Labels;
use maplit::btreemap;
use pretty_assertions::assert_eq;

fn run(gateway: &Gateway, routes: &[Route], namespaces: &NamespaceLabels) -> Attachments {
    let validated = validate(gateway, ControllerClass::Alb);
    attach(gateway, &validated.listeners, routes, namespaces)
}

fn simple_route(ns: &str, name: &str, parent_refs: Vec<ParentReference>, hostnames: &[&str]) -> Route {
    mk_http_route(
        ns,
        name,
        parent_refs,
        hostnames,
        vec![http_rule(
            vec![path_match(HTTPRouteRulesMatchesPathType::PathPrefix, "/")],
            vec![backend_ref("web", 8080)],
        )],
    )
    .into()
}

fn id(ns: &str, name: &str) -> RouteId {
    RouteId {
        kind: lb_gateway_controller_core::RouteKind::Http,
        namespace: ns.to_string(),
        name: name.to_string(),
    }
}

#[test]
fn generic_parent_ref_attaches_if_any_listener_accepts() {
    init_tracing();
    let gateway = mk_gateway(vec![
        mk_listener("same-ns", 80, "HTTP"),
        with_namespaces(mk_listener("any-ns", 8080, "HTTP"), FromNamespaces::All, None),
    ]);
    let routes = vec![simple_route("apps", "web", vec![parent()], &[])];

    let attachments = run(&gateway, &routes, &Default::default());
    assert_eq!(attachments.failures, vec![]);
    assert_eq!(
        attachments.routes_by_port,
        btreemap! { 8080 => vec![id("apps", "web")] }
    );
    assert_eq!(
        attachments.matched_parent_refs,
        btreemap! { id("apps", "web") => vec![parent()] }
    );
}

#[test]
fn parent_ref_naming_no_listener() {
    let gateway = mk_gateway(vec![mk_listener("http", 80, "HTTP")]);
    let routes = vec![simple_route("gw-ns", "web", vec![parent_section("https")], &[])];

    let attachments = run(&gateway, &routes, &Default::default());
    assert!(attachments.routes_by_port.is_empty());
    assert_eq!(attachments.failures.len(), 1);
    assert_eq!(attachments.failures[0].reason, Reason::NoMatchingParent);
    assert_eq!(
        attachments.failures[0].parent_ref,
        Some(parent_section("https"))
    );
}

#[test]
fn parent_ref_port_must_match() {
    let gateway = mk_gateway(vec![mk_listener("http", 80, "HTTP")]);
    let on_80 = ParentReference {
        port: Some(80),
        ..parent()
    };
    let on_81 = ParentReference {
        port: Some(81),
        ..parent()
    };
    let routes = vec![
        simple_route("gw-ns", "a", vec![on_80], &[]),
        simple_route("gw-ns", "b", vec![on_81], &[]),
    ];

    let attachments = run(&gateway, &routes, &Default::default());
    assert_eq!(
        attachments.routes_by_port,
        btreemap! { 80 => vec![id("gw-ns", "a")] }
    );
    assert_eq!(attachments.failures.len(), 1);
    assert_eq!(attachments.failures[0].route, id("gw-ns", "b"));
    assert_eq!(attachments.failures[0].reason, Reason::NoMatchingParent);
}

#[test]
fn rejected_by_named_listener_is_not_a_missing_parent() {
    let gateway = mk_gateway(vec![mk_listener("http", 80, "HTTP")]);
    let routes = vec![simple_route("apps", "web", vec![parent_section("http")], &[])];

    let attachments = run(&gateway, &routes, &Default::default());
    assert_eq!(attachments.failures.len(), 1);
    assert_eq!(
        attachments.failures[0].reason,
        Reason::NotAllowedByListeners
    );
}

#[test]
fn route_kind_must_be_allowed() {
    let gateway = mk_gateway(vec![mk_listener("http", 80, "HTTP")]);
    let routes: Vec<Route> = vec![mk_grpc_route("gw-ns", "rpc", vec![]).into()];

    let attachments = run(&gateway, &routes, &Default::default());
    assert!(attachments.routes_by_port.is_empty());
    assert_eq!(
        attachments
            .failures
            .iter()
            .map(|f| f.reason)
            .collect::<Vec<_>>(),
        vec![Reason::NotAllowedByListeners]
    );
}

#[test]
fn hostnames_must_intersect() {
    let gateway = mk_gateway(vec![with_hostname(
        mk_listener("http", 80, "HTTP"),
        "*.example.com",
    )]);
    let routes = vec![
        simple_route("gw-ns", "match", vec![parent()], &["api.example.com", "api.example.org"]),
        simple_route("gw-ns", "mismatch", vec![parent()], &["api.example.org"]),
        simple_route("gw-ns", "any", vec![parent()], &[]),
    ];

    let attachments = run(&gateway, &routes, &Default::default());
    assert_eq!(
        attachments.routes_by_port,
        btreemap! { 80 => vec![id("gw-ns", "any"), id("gw-ns", "match")] }
    );
    assert_eq!(
        attachments.compatible_hostnames_by_port[&80],
        btreemap! {
            id("gw-ns", "any") => vec!["*.example.com".to_string()],
            id("gw-ns", "match") => vec!["api.example.com".to_string()],
        }
    );
    assert_eq!(attachments.failures.len(), 1);
    assert_eq!(attachments.failures[0].route, id("gw-ns", "mismatch"));
    assert_eq!(
        attachments.failures[0].reason,
        Reason::NoMatchingListenerHostname
    );
}

#[test]
fn hostnames_accumulate_across_listeners_on_a_port() {
    let gateway = mk_gateway(vec![
        with_hostname(mk_listener("a", 80, "HTTP"), "a.example.com"),
        with_hostname(mk_listener("b", 80, "HTTP"), "b.example.com"),
    ]);
    let routes = vec![simple_route(
        "gw-ns",
        "web",
        vec![parent()],
        &["b.example.com", "a.example.com", "c.example.com"],
    )];

    let attachments = run(&gateway, &routes, &Default::default());
    assert_eq!(
        attachments.routes_by_port,
        btreemap! { 80 => vec![id("gw-ns", "web")] }
    );
    assert_eq!(
        attachments.compatible_hostnames(80, &id("gw-ns", "web")),
        Some(&["a.example.com".to_string(), "b.example.com".to_string()][..])
    );
    assert_eq!(
        attachments.routes_by_listener.keys().collect::<Vec<_>>(),
        vec!["a", "b"]
    );
}

#[test]
fn routes_for_other_gateways_are_ignored() {
    let gateway = mk_gateway(vec![mk_listener("http", 80, "HTTP")]);
    let other = ParentReference {
        name: "other".to_string(),
        ..parent()
    };
    // Without an explicit namespace the reference defaults to the route's
    // namespace, which is not the gateway's.
    let implicit_ns = ParentReference {
        namespace: None,
        ..parent()
    };
    let service = ParentReference {
        group: Some("".to_string()),
        kind: Some("Service".to_string()),
        ..parent()
    };
    let routes = vec![
        simple_route("apps", "a", vec![other], &[]),
        simple_route("apps", "b", vec![implicit_ns], &[]),
        simple_route("apps", "c", vec![service], &[]),
    ];

    let attachments = run(&gateway, &routes, &Default::default());
    assert_eq!(attachments, Attachments::default());
}

#[test]
fn namespace_selector() {
    let selector = k8s::Selector::from_iter(Some(("gateway-access", "true")));
    let gateway = mk_gateway(vec![with_namespaces(
        mk_listener("http", 80, "HTTP"),
        FromNamespaces::Selector,
        Some(selector),
    )]);
    let namespaces = NamespaceLabels::from_iter([
        (
            "allowed".to_string(),
            Labels::from_iter(Some(("gateway-access", "true"))),
        ),
        ("denied".to_string(), Labels::default()),
    ]);
    let routes = vec![
        simple_route("allowed", "a", vec![parent()], &[]),
        simple_route("denied", "b", vec![parent()], &[]),
        simple_route("unknown", "c", vec![parent()], &[]),
    ];

    let attachments = run(&gateway, &routes, &namespaces);
    assert_eq!(
        attachments.routes_by_port,
        btreemap! { 80 => vec![id("allowed", "a")] }
    );
    assert_eq!(
        attachments
            .failures
            .iter()
            .map(|f| (f.route.name.as_str(), f.reason))
            .collect::<Vec<_>>(),
        vec![
            ("b", Reason::NotAllowedByListeners),
            ("c", Reason::NotAllowedByListeners),
        ]
    );
}

#[test]
fn specific_refs_are_reported_independently() {
    let gateway = mk_gateway(vec![
        mk_listener("http", 80, "HTTP"),
        with_hostname(mk_listener("internal", 8080, "HTTP"), "internal.example.com"),
    ]);
    let routes = vec![simple_route(
        "gw-ns",
        "web",
        vec![parent_section("http"), parent_section("internal")],
        &["api.example.com"],
    )];

    let attachments = run(&gateway, &routes, &Default::default());
    assert_eq!(
        attachments.matched_parent_refs[&id("gw-ns", "web")],
        vec![parent_section("http")]
    );
    assert_eq!(attachments.failures.len(), 1);
    assert_eq!(
        attachments.failures[0].parent_ref,
        Some(parent_section("internal"))
    );
    assert_eq!(
        attachments.failures[0].reason,
        Reason::NoMatchingListenerHostname
    );
}

#[test]
fn attachment_is_deterministic() {
    let gateway = mk_gateway(vec![
        mk_listener("a", 80, "HTTP"),
        with_hostname(mk_listener("b", 80, "HTTP"), "*.example.com"),
        mk_listener("c", 8080, "HTTP"),
    ]);
    let mut routes = vec![
        simple_route("gw-ns", "z", vec![parent()], &["z.example.com"]),
        simple_route("gw-ns", "y", vec![parent_section("c")], &[]),
        simple_route("gw-ns", "x", vec![parent_section("missing")], &[]),
        simple_route("gw-ns", "w", vec![parent(), parent_section("b")], &[]),
    ];

    let first = run(&gateway, &routes, &Default::default());
    let second = run(&gateway, &routes, &Default::default());
    assert_eq!(first, second);

    routes.reverse();
    let reversed = run(&gateway, &routes, &Default::default());
    assert_eq!(first.routes_by_port, reversed.routes_by_port);
    assert_eq!(
        first.compatible_hostnames_by_port,
        reversed.compatible_hostnames_by_port
    );
    assert_eq!(first.failures, reversed.failures);
}

#[test]
fn namespace_rejection_precedes_kind_and_hostname() {
    let gateway = mk_gateway(vec![with_hostname(
        mk_listener("http", 80, "HTTP"),
        "*.example.com",
    )]);
    let mut rpc = mk_grpc_route("apps", "rpc", vec![]);
    rpc.spec.hostnames = Some(vec!["api.other.org".to_string()]);
    let routes: Vec<Route> = vec![rpc.into()];

    let attachments = run(&gateway, &routes, &Default::default());
    assert_eq!(attachments.failures.len(), 1);
    assert_eq!(
        attachments.failures[0].reason,
        Reason::NotAllowedByListeners
    );
    assert_eq!(
        attachments.failures[0].message,
        "listener http does not allow routes from namespace apps"
    );
}

#[test]
fn kind_rejection_precedes_hostname() {
    let gateway = mk_gateway(vec![with_hostname(
        mk_listener("http", 80, "HTTP"),
        "*.example.com",
    )]);
    let mut rpc = mk_grpc_route("gw-ns", "rpc", vec![]);
    rpc.spec.hostnames = Some(vec!["api.other.org".to_string()]);
    let routes: Vec<Route> = vec![rpc.into()];

    let attachments = run(&gateway, &routes, &Default::default());
    assert_eq!(attachments.failures.len(), 1);
    assert_eq!(
        attachments.failures[0].reason,
        Reason::NotAllowedByListeners
    );
    assert_eq!(
        attachments.failures[0].message,
        "listener http does not allow GRPCRoute routes"
    );
}
