//! End-to-end resolve-file tests over real files.

use neva::hir::check_integrity;
use neva::syntax::{EntityKind, TypeExpr};
use neva::{ResolveFileResponce, ResolverConfig};

use crate::helpers::source_fixtures::*;
use crate::helpers::workspace_helpers::*;

// =============================================================================
// PORT INDEX
// =============================================================================

#[test]
fn test_scenario_node_ports() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", SCENARIO);

    let outcome = fs_service(ResolverConfig::default())
        .resolve(&ws.request("app/main.neva"))
        .unwrap();
    assert!(!outcome.is_partial(), "{:?}", outcome.diagnostics);

    let node = &outcome.response.extra.nodes_ports["compA"]["node1"];
    let inports: Vec<_> = node.io.inports.keys().map(|k| k.as_str()).collect();
    let outports: Vec<_> = node.io.outports.keys().map(|k| k.as_str()).collect();
    assert_eq!(inports, vec!["in"]);
    assert_eq!(outports, vec!["out"]);
    assert!(check_integrity(&outcome.response.file, &outcome.response.extra.nodes_ports).is_ok());
}

#[test]
fn test_full_program_resolves_cleanly() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", FULL_PROGRAM);

    let outcome = fs_service(ResolverConfig::default())
        .resolve(&ws.request("app/main.neva"))
        .unwrap();
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);

    let file = &outcome.response.file;
    assert_eq!(file.imports["str"].package, "lib/strings");
    assert_eq!(file.entities["greeting"].kind(), EntityKind::Const);
    assert!(file.entities["Printer"].is_public);

    let main = &outcome.response.extra.nodes_ports["Main"];
    let nodes: Vec<_> = main.keys().map(|k| k.as_str()).collect();
    assert_eq!(nodes, vec!["printer", "reader", "handler", "handler/log"]);
    assert_eq!(main["printer"].io.inports["data"].type_expr, TypeExpr::named("str"));
    assert_eq!(main["handler/log"].io.outports["sig"].type_expr, TypeExpr::named("int"));
    assert_eq!(main["reader"].io.outports["data"].type_expr, TypeExpr::named("int"));
}

#[test]
fn test_empty_interface_is_indexed() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", EMPTY_PORTS);

    let outcome = fs_service(ResolverConfig::default())
        .resolve(&ws.request("app/main.neva"))
        .unwrap();
    let ports = &outcome.response.extra.nodes_ports;
    assert!(ports["Main"]["quiet"].is_empty());
    assert!(ports["Silent"].is_empty());
}

#[test]
fn test_duplicate_port_is_partial() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", DUPLICATE_PORT);

    let outcome = fs_service(ResolverConfig::default())
        .resolve(&ws.request("app/main.neva"))
        .unwrap();
    assert!(outcome.is_partial());

    let main = &outcome.response.extra.nodes_ports["Main"];
    assert!(!main.contains_key("d"));
    assert!(main.contains_key("ok"));
    assert!(
        outcome
            .errors()
            .any(|d| d.node.as_deref() == Some("d") && d.port.as_deref() == Some("a"))
    );
}

// =============================================================================
// WIRE FORMAT AND DETERMINISM
// =============================================================================

#[test]
fn test_resolution_is_deterministic() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", FULL_PROGRAM);
    let service = fs_service(ResolverConfig::default());
    let request = ws.request("app/main.neva");

    let first = service.resolve(&request).unwrap();
    service.clear_cache();
    let second = service.resolve(&request).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.response).unwrap(),
        serde_json::to_string(&second.response).unwrap()
    );
}

#[test]
fn test_response_round_trips_byte_for_byte() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", FULL_PROGRAM);
    let outcome = fs_service(ResolverConfig::default())
        .resolve(&ws.request("app/main.neva"))
        .unwrap();

    let json = serde_json::to_string(&outcome.response).unwrap();
    let back: ResolveFileResponce = serde_json::from_str(&json).unwrap();
    assert_eq!(back, outcome.response);
    assert_eq!(serde_json::to_string(&back).unwrap(), json);
}

#[test]
fn test_wire_field_names() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", SCENARIO);
    let outcome = fs_service(ResolverConfig::default())
        .resolve(&ws.request("app/main.neva"))
        .unwrap();

    let json = serde_json::to_value(&outcome.response).unwrap();
    let node = &json["extra"]["nodesPorts"]["compA"]["node1"];
    assert!(node["io"]["in"]["in"].is_object());
    assert!(node["io"]["out"]["out"].is_object());
    assert_eq!(json["file"]["entities"]["compA"]["kind"], "component");
    assert_eq!(json["file"]["entities"]["compA"]["meta"]["start"]["line"], 3);
}
