//! Request-level failures and the node error policy.

use neva::hir::codes;
use neva::{
    DocumentId, ErrorKind, NodeErrorPolicy, Position, ResolveError, ResolveFileRequest,
    ResolverConfig, Uri,
};
use rstest::rstest;

use crate::helpers::source_fixtures::*;
use crate::helpers::workspace_helpers::*;

// =============================================================================
// DOCUMENT ERRORS
// =============================================================================

#[test]
fn test_missing_document_is_not_found() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", SCENARIO);

    let error = fs_service(ResolverConfig::default())
        .resolve(&ws.request("app/missing.neva"))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn test_document_outside_workspace_is_not_found() {
    let ws = TestWorkspace::new();
    let other = TestWorkspace::new();
    let path = other.write("main.neva", SCENARIO);

    let request = request_for(ws.root(), &path);
    let error = fs_service(ResolverConfig::default())
        .resolve(&request)
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn test_escaping_with_parent_segments_is_not_found() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", SCENARIO);

    let sneaky = ws.root().join("app/../../main.neva");
    let error = fs_service(ResolverConfig::default())
        .resolve(&request_for(ws.root(), &sneaky))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn test_unreadable_document_is_access_denied() {
    let ws = TestWorkspace::new();
    ws.mkdir("app/looks_like_a_file.neva");

    let error = fs_service(ResolverConfig::default())
        .resolve(&ws.request("app/looks_like_a_file.neva"))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AccessDenied);
}

#[rstest]
#[case("", "/ws/main.neva")]
#[case("/ws", "")]
#[case("/ws", "/ws")]
fn test_malformed_requests_are_not_found(#[case] workspace: &str, #[case] document: &str) {
    let (service, _) = memory_service(SCENARIO, ResolverConfig::default());
    let request = ResolveFileRequest::new(
        Uri::from_path(workspace),
        DocumentId::new(Uri::from_path(document), ""),
    );
    let error = service.resolve(&request).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

// =============================================================================
// PARSE ERRORS
// =============================================================================

#[test]
fn test_broken_boundary_is_whole_file_parse_error() {
    let (service, request) = memory_service(BROKEN_BOUNDARY, ResolverConfig::default());
    let error = service.resolve(&request).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Parse);
    assert_eq!(error.position(), Some(Position::new(1, 0)));
    let report = error.report();
    assert_eq!(report.position, Some(Position::new(1, 0)));
}

#[test]
fn test_syntax_error_inside_node_is_node_scoped() {
    let source = "component P(x int) ()\ncomponent Main() () {\n nodes {\n  good P\n  bad P<\n }\n}\n";
    let (service, request) = memory_service(source, ResolverConfig::default());
    let outcome = service.resolve(&request).unwrap();

    assert!(outcome.is_partial());
    let main = &outcome.response.extra.nodes_ports["Main"];
    assert!(main.contains_key("good"));
    assert!(!main.contains_key("bad"));
    let syntax = outcome
        .errors()
        .find(|d| d.code == codes::SYNTAX_ERROR)
        .unwrap();
    assert_eq!(syntax.node.as_deref(), Some("bad"));
}

#[test]
fn test_redeclared_entity_does_not_taint_the_first() {
    let source = "component A(x int) ()\ncomponent A(y int, y int) ()\ncomponent M() () { nodes { n A } }\n";
    let (service, request) = memory_service(source, ResolverConfig::default());
    let outcome = service.resolve(&request).unwrap();

    let n = &outcome.response.extra.nodes_ports["M"]["n"];
    assert!(n.io.inports.contains_key("x"));
    assert!(
        outcome
            .diagnostics
            .iter()
            .all(|d| d.node.as_deref() != Some("n"))
    );
}

// =============================================================================
// NODE ERROR POLICY
// =============================================================================

#[test]
fn test_fail_policy_turns_duplicate_port_into_error() {
    let config = ResolverConfig::default().with_node_errors(NodeErrorPolicy::Fail);
    let (service, request) = memory_service(DUPLICATE_PORT, config);

    match service.resolve(&request).unwrap_err() {
        ResolveError::DuplicatePort { name, position, .. } => {
            assert_eq!(name, "a");
            assert_eq!(position.line, 1);
        }
        other => panic!("expected DuplicatePort, got {other:?}"),
    }
}

#[test]
fn test_fail_policy_reports_first_node_error() {
    let source = "component Main() () {\n nodes {\n  a Missing\n  b AlsoMissing\n }\n}\n";
    let config = ResolverConfig::default().with_node_errors(NodeErrorPolicy::Fail);
    let (service, request) = memory_service(source, config);

    match service.resolve(&request).unwrap_err() {
        ResolveError::NodeError { code, node, position, .. } => {
            assert_eq!(code, codes::UNRESOLVED_ENTITY);
            assert_eq!(node.as_deref(), Some("a"));
            assert_eq!(position, Position::new(2, 2));
        }
        other => panic!("expected NodeError, got {other:?}"),
    }
}

#[test]
fn test_fail_policy_ignores_warnings() {
    let source = "component Main(start any) () {\n net { :nope -> :start }\n}\n";
    let config = ResolverConfig::default().with_node_errors(NodeErrorPolicy::Fail);
    let (service, request) = memory_service(source, config);

    let outcome = service.resolve(&request).unwrap();
    assert!(!outcome.is_partial());
    assert!(
        outcome
            .diagnostics
            .iter()
            .all(|d| d.code == codes::UNKNOWN_NETWORK_REF)
    );
}
