//! Network consistency warnings through the service.

use neva::hir::codes;
use neva::{ResolverConfig, Severity};

use crate::helpers::source_fixtures::SCENARIO;
use crate::helpers::workspace_helpers::memory_service;

const BAD_NET: &str = r#"
component Echo(in any) (out any)

component Main(start any) (stop any) {
    nodes { e Echo }
    net {
        :start -> e:nope
        ghost:out -> :stop
        e:out -> :stop
    }
}
"#;

#[test]
fn test_unknown_endpoints_are_warnings() {
    let (service, request) = memory_service(BAD_NET, ResolverConfig::default());
    let outcome = service.resolve(&request).unwrap();

    assert!(!outcome.is_partial());
    assert_eq!(outcome.diagnostics.len(), 2);
    for diagnostic in &outcome.diagnostics {
        assert_eq!(diagnostic.code, codes::UNKNOWN_NETWORK_REF);
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.component.as_deref(), Some("Main"));
    }
    assert_eq!(outcome.diagnostics[0].span.start.line, 6);
    assert_eq!(outcome.diagnostics[1].span.start.line, 7);
}

#[test]
fn test_network_check_can_be_disabled() {
    let config = ResolverConfig::default().with_check_network(false);
    let (service, request) = memory_service(BAD_NET, config);
    let outcome = service.resolve(&request).unwrap();
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_consistent_network_is_clean() {
    let (service, request) = memory_service(SCENARIO, ResolverConfig::default());
    let outcome = service.resolve(&request).unwrap();
    assert!(outcome.diagnostics.is_empty());
}
