use super::*;
use crate::listeners::validate;
use lb_gateway_controller_core::{ControllerClass, NamespacePolicy, Reason, RouteKind};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn reasons(gateway: &Gateway, class: ControllerClass) -> Vec<(String, Option<Reason>)> {
    validate(gateway, class)
        .statuses
        .into_iter()
        .map(|s| (s.name, s.invalid.map(|i| i.reason)))
        .collect()
}

#[test]
fn http_and_https_conflict_on_alb() {
    let gateway = mk_gateway(vec![
        mk_listener("http", 80, "HTTP"),
        mk_listener("https", 80, "HTTPS"),
    ]);
    let validated = validate(&gateway, ControllerClass::Alb);
    assert!(validated.has_errors());
    assert_eq!(
        reasons(&gateway, ControllerClass::Alb),
        vec![
            ("http".to_string(), None),
            ("https".to_string(), Some(Reason::ProtocolConflict)),
        ]
    );
    assert_eq!(validated.listeners.len(), 1);
}

#[test]
fn tcp_and_udp_share_port_on_nlb() {
    let gateway = mk_gateway(vec![
        mk_listener("tcp", 80, "TCP"),
        mk_listener("udp", 80, "UDP"),
    ]);
    let validated = validate(&gateway, ControllerClass::Nlb);
    assert!(!validated.has_errors());
    assert_eq!(validated.listeners.len(), 2);
}

#[rstest]
#[case::zero(0)]
#[case::negative(-1)]
#[case::too_large(65536)]
fn port_out_of_range(#[case] port: i32) {
    let gateway = mk_gateway(vec![mk_listener("http", port, "HTTP")]);
    assert_eq!(
        reasons(&gateway, ControllerClass::Alb),
        vec![("http".to_string(), Some(Reason::PortUnavailable))]
    );
}

#[rstest]
#[case::alb_tcp(ControllerClass::Alb, "TCP")]
#[case::alb_tls(ControllerClass::Alb, "TLS")]
#[case::nlb_http(ControllerClass::Nlb, "HTTP")]
#[case::nlb_grpc(ControllerClass::Nlb, "GRPC")]
#[case::unknown(ControllerClass::Alb, "SCTP")]
#[case::lowercase(ControllerClass::Alb, "http")]
fn unsupported_protocol(#[case] class: ControllerClass, #[case] protocol: &str) {
    let gateway = mk_gateway(vec![mk_listener("l", 8080, protocol)]);
    assert_eq!(
        reasons(&gateway, class),
        vec![("l".to_string(), Some(Reason::UnsupportedProtocol))]
    );
}

#[test]
fn invalid_kinds_take_precedence() {
    // The port and protocol are also invalid, but the kind check runs first.
    let gateway = mk_gateway(vec![with_kinds(mk_listener("l", 0, "TCP"), &["TCPRoute"])]);
    let validated = validate(&gateway, ControllerClass::Alb);
    let invalid = validated.statuses[0].invalid.as_ref().expect("must be invalid");
    assert_eq!(invalid.reason, Reason::InvalidRouteKinds);
    assert!(invalid.message.contains("TCPRoute"), "{}", invalid.message);
}

#[test]
fn explicit_kinds() {
    let gateway = mk_gateway(vec![
        with_kinds(mk_listener("grpc-only", 443, "HTTPS"), &["GRPCRoute"]),
        with_kinds(mk_listener("unknown", 8443, "HTTPS"), &["FooRoute"]),
    ]);
    let validated = validate(&gateway, ControllerClass::Alb);
    assert_eq!(validated.statuses[0].supported_kinds, vec![RouteKind::Grpc]);
    assert_eq!(validated.statuses[0].invalid, None);
    assert_eq!(
        validated.statuses[1].invalid.as_ref().map(|i| i.reason),
        Some(Reason::InvalidRouteKinds)
    );
}

#[rstest]
#[case::http(ControllerClass::Alb, "HTTP", vec![RouteKind::Http])]
#[case::https(ControllerClass::Alb, "HTTPS", vec![RouteKind::Http, RouteKind::Grpc])]
#[case::grpc(ControllerClass::Alb, "GRPC", vec![RouteKind::Grpc])]
#[case::tcp(ControllerClass::Nlb, "TCP", vec![RouteKind::Tcp])]
#[case::udp(ControllerClass::Nlb, "UDP", vec![RouteKind::Udp])]
#[case::tls(ControllerClass::Nlb, "TLS", vec![RouteKind::Tcp, RouteKind::Tls])]
fn default_kinds(
    #[case] class: ControllerClass,
    #[case] protocol: &str,
    #[case] expected: Vec<RouteKind>,
) {
    let gateway = mk_gateway(vec![mk_listener("l", 1234, protocol)]);
    let validated = validate(&gateway, class);
    assert_eq!(validated.statuses[0].supported_kinds, expected);
    assert_eq!(
        validated.listeners[0]
            .supported_kinds
            .iter()
            .copied()
            .collect::<Vec<_>>(),
        expected
    );
}

#[test]
fn identical_hostnames_conflict() {
    let gateway = mk_gateway(vec![
        with_hostname(mk_listener("a", 80, "HTTP"), "a.example.com"),
        with_hostname(mk_listener("b", 80, "HTTP"), "b.example.com"),
        with_hostname(mk_listener("c", 80, "HTTP"), "a.example.com"),
        mk_listener("d", 80, "HTTP"),
        mk_listener("e", 80, "HTTP"),
        with_hostname(mk_listener("f", 8080, "HTTP"), "a.example.com"),
    ]);
    assert_eq!(
        reasons(&gateway, ControllerClass::Alb),
        vec![
            ("a".to_string(), None),
            ("b".to_string(), None),
            ("c".to_string(), Some(Reason::HostnameConflict)),
            ("d".to_string(), None),
            ("e".to_string(), None),
            ("f".to_string(), None),
        ]
    );
}

#[test]
fn every_listener_is_evaluated() {
    let gateway = mk_gateway(vec![
        mk_listener("bad-port", 0, "HTTP"),
        mk_listener("bad-protocol", 80, "UDP"),
        mk_listener("good", 80, "HTTP"),
        mk_listener("conflict", 80, "GRPC"),
    ]);
    assert_eq!(
        reasons(&gateway, ControllerClass::Alb),
        vec![
            ("bad-port".to_string(), Some(Reason::PortUnavailable)),
            ("bad-protocol".to_string(), Some(Reason::UnsupportedProtocol)),
            ("good".to_string(), None),
            ("conflict".to_string(), Some(Reason::ProtocolConflict)),
        ]
    );
}

#[test]
fn invalid_listeners_do_not_claim_ports() {
    let gateway = mk_gateway(vec![
        with_kinds(mk_listener("invalid", 80, "HTTP"), &["UDPRoute"]),
        mk_listener("https", 80, "HTTPS"),
    ]);
    assert_eq!(
        reasons(&gateway, ControllerClass::Alb),
        vec![
            ("invalid".to_string(), Some(Reason::InvalidRouteKinds)),
            ("https".to_string(), None),
        ]
    );
}

#[test]
fn namespace_policies() {
    let selector = k8s::Selector::from_iter(Some(("team", "web")));
    let gateway = mk_gateway(vec![
        mk_listener("default", 80, "HTTP"),
        with_namespaces(mk_listener("all", 81, "HTTP"), FromNamespaces::All, None),
        with_namespaces(
            mk_listener("selector", 82, "HTTP"),
            FromNamespaces::Selector,
            Some(selector.clone()),
        ),
        with_namespaces(
            mk_listener("no-selector", 83, "HTTP"),
            FromNamespaces::Selector,
            None,
        ),
    ]);
    let validated = validate(&gateway, ControllerClass::Alb);
    assert_eq!(
        validated
            .listeners
            .into_iter()
            .map(|l| l.namespaces)
            .collect::<Vec<_>>(),
        vec![
            NamespacePolicy::Same,
            NamespacePolicy::All,
            NamespacePolicy::Selector(selector),
            NamespacePolicy::Same,
        ]
    );
}

#[test]
fn accepted_kinds_only_include_valid_listeners() {
    let gateway = mk_gateway(vec![
        mk_listener("http", 80, "HTTP"),
        mk_listener("conflict", 80, "HTTPS"),
    ]);
    let validated = validate(&gateway, ControllerClass::Alb);
    assert_eq!(
        validated.accepted_kinds().into_iter().collect::<Vec<_>>(),
        vec![RouteKind::Http]
    );
}

#[test]
fn unknown_selector_operator_falls_back_to_same_namespace() {
    init_tracing();
    let mut listener = with_namespaces(
        mk_listener("selector", 80, "HTTP"),
        FromNamespaces::Selector,
        None,
    );
    if let Some(namespaces) = listener
        .allowed_routes
        .as_mut()
        .and_then(|allowed| allowed.namespaces.as_mut())
    {
        namespaces.selector = Some(reshape(serde_json::json!({
            "matchExpressions": [{ "key": "team", "operator": "Near", "values": ["web"] }],
        })));
    }
    let validated = validate(&mk_gateway(vec![listener]), ControllerClass::Alb);
    assert_eq!(
        validated
            .listeners
            .into_iter()
            .map(|l| l.namespaces)
            .collect::<Vec<_>>(),
        vec![NamespacePolicy::Same]
    );
}
