//! Cross-file entity lookup through a real workspace.

use neva::hir::codes;
use neva::syntax::TypeExpr;
use neva::{ResolveOutcome, ResolverConfig};

use crate::helpers::workspace_helpers::*;

const MAIN: &str = r#"
import { lib  io  other/deep as deep }

component Main() () {
    nodes {
        sibling Sibling
        pub_node lib.Public
        hidden lib.Hidden
        printer io.Println<str>
        del Del
        missing deep.Nothing
        ghost nope.Thing
    }
}
"#;

fn workspace() -> TestWorkspace {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", MAIN);
    ws.write("app/sibling.neva", "component Sibling(x int) (y int)");
    ws.write("lib/lib.neva", "pub component Public(a str) ()\ncomponent Hidden() ()");
    ws.write("other/deep/deep.neva", "pub component Something() ()");
    ws.write("std/io/io.neva", "pub component Println<T>(data T) (sig T)");
    ws.write("std/builtin/builtin.neva", "pub component Del(data any) ()");
    ws
}

fn resolve(ws: &TestWorkspace) -> ResolveOutcome {
    let config = ResolverConfig::default().with_stdlib_root(ws.root().join("std"));
    fs_service(config)
        .resolve(&ws.request("app/main.neva"))
        .unwrap()
}

#[test]
fn test_nodes_resolve_across_files() {
    let ws = workspace();
    let outcome = resolve(&ws);
    let main = &outcome.response.extra.nodes_ports["Main"];

    assert!(main["sibling"].io.outports.contains_key("y"));
    assert!(main["pub_node"].io.inports.contains_key("a"));
    assert_eq!(main["printer"].io.inports["data"].type_expr, TypeExpr::named("str"));
    assert!(main["del"].io.inports.contains_key("data"));
}

#[test]
fn test_lookup_failures_are_reported_per_node() {
    let ws = workspace();
    let outcome = resolve(&ws);
    let main = &outcome.response.extra.nodes_ports["Main"];

    for failed in ["hidden", "missing", "ghost"] {
        assert!(!main.contains_key(failed), "{failed} should not be indexed");
    }
    let code_of = |node: &str| {
        outcome
            .errors()
            .find(|d| d.node.as_deref() == Some(node))
            .map(|d| d.code.clone())
    };
    assert_eq!(code_of("hidden").as_deref(), Some(codes::PRIVATE_ENTITY));
    assert_eq!(code_of("missing").as_deref(), Some(codes::UNRESOLVED_ENTITY));
    assert_eq!(code_of("ghost").as_deref(), Some(codes::UNKNOWN_IMPORT));
}

#[test]
fn test_builtin_needs_stdlib_root() {
    let ws = workspace();
    let outcome = fs_service(ResolverConfig::default())
        .resolve(&ws.request("app/main.neva"))
        .unwrap();
    let main = &outcome.response.extra.nodes_ports["Main"];
    assert!(!main.contains_key("del"));
    assert!(!main.contains_key("printer"));
    assert!(main.contains_key("sibling"));
}

#[test]
fn test_broken_sibling_does_not_break_resolution() {
    let ws = workspace();
    ws.write("app/zz_broken.neva", "@@@ not neva");
    let outcome = resolve(&ws);
    assert!(outcome.response.extra.nodes_ports["Main"].contains_key("sibling"));
}

#[test]
fn test_sibling_edits_are_seen() {
    let ws = workspace();
    let service = fs_service(ResolverConfig::default().with_stdlib_root(ws.root().join("std")));
    let request = ws.request("app/main.neva");

    service.resolve(&request).unwrap();
    ws.write("app/sibling.neva", "component Sibling(z int) ()");
    let outcome = service.resolve(&request).unwrap();
    let sibling = &outcome.response.extra.nodes_ports["Main"]["sibling"];
    assert!(sibling.io.inports.contains_key("z"));
    assert!(sibling.io.outports.is_empty());
}
