use super::*;
use crate::parser::parse;

fn source(text: &str) -> SourceFile {
    let parsed = parse(text);
    assert!(parsed.ok(), "errors: {:?}", parsed.errors);
    SourceFile::cast(parsed.syntax()).unwrap()
}

fn first_component(root: &SourceFile) -> ComponentDef {
    root.declarations()
        .find_map(|d| match d {
            Declaration::Component(c) => Some(c),
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_ast_imports() {
    let root = source("import { io\n lib/strings as str }");
    let decls: Vec<_> = root.declarations().collect();
    assert_eq!(decls.len(), 1);

    let Declaration::Imports(block) = &decls[0] else {
        panic!("expected import block");
    };
    let imports: Vec<_> = block.imports().collect();
    assert_eq!(imports.len(), 2);
    assert_eq!(imports[0].path().unwrap().text(), "io");
    assert!(imports[0].alias().is_none());
    assert_eq!(imports[1].path().unwrap().text(), "lib/strings");
    assert_eq!(imports[1].path().unwrap().last_segment(), "strings");
    assert_eq!(imports[1].alias().unwrap().text(), "str");
}

#[test]
fn test_ast_component_signature() {
    let root = source("pub component Printer<T>([data] T, sig any) (res T)");
    let comp = first_component(&root);

    assert!(comp.is_public());
    assert_eq!(comp.name().unwrap().text(), "Printer");
    let params: Vec<_> = comp.type_params().unwrap().params().collect();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name().unwrap().text(), "T");

    let inports: Vec<_> = comp.in_ports().unwrap().ports().collect();
    assert_eq!(inports.len(), 2);
    assert!(inports[0].is_array());
    assert_eq!(inports[0].name().unwrap().text(), "data");
    assert!(!inports[1].is_array());

    let outports: Vec<_> = comp.out_ports().unwrap().ports().collect();
    assert_eq!(outports[0].name().unwrap().text(), "res");
    assert!(comp.body().is_none());
}

#[test]
fn test_ast_directive_args() {
    let root = source("#extern(int int_add, float float_add)\ncomponent Add() ()");
    let comp = first_component(&root);
    let directive = comp.directives().next().unwrap();
    assert_eq!(directive.name().unwrap().text(), "extern");
    assert_eq!(directive.args(), vec!["int int_add", "float float_add"]);
}

#[test]
fn test_ast_nodes_and_deps() {
    let root = source(
        "component Main() () {\n nodes {\n  p io.Printer<int>\n  h Handler { log Logger }\n }\n}",
    );
    let comp = first_component(&root);
    let body = comp.body().unwrap();
    let nodes: Vec<_> = body.nodes().collect();
    assert_eq!(nodes.len(), 2);

    let eref = nodes[0].entity_ref().unwrap();
    assert_eq!(eref.pkg().as_deref(), Some("io"));
    assert_eq!(eref.name().as_deref(), Some("Printer"));
    assert_eq!(nodes[0].type_args().unwrap().args().count(), 1);

    let deps: Vec<_> = nodes[1].deps().unwrap().nodes().collect();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].name().unwrap().text(), "log");
    assert_eq!(deps[0].entity_ref().unwrap().pkg(), None);
}

#[test]
fn test_ast_connections() {
    let root = source(
        "component Main() () {\n net {\n  :start -> p:data[2]\n  $greet -> [p:a, q:b]\n }\n}",
    );
    let comp = first_component(&root);
    let conns: Vec<_> = comp.body().unwrap().connections().collect();
    assert_eq!(conns.len(), 2);

    let sender = conns[0].sender().unwrap().port_addr().unwrap();
    assert_eq!(sender.node(), None);
    assert_eq!(sender.port().as_deref(), Some("start"));
    let receiver = conns[0].receiver().unwrap().port_addrs().next().unwrap();
    assert_eq!(receiver.node().as_deref(), Some("p"));
    assert_eq!(receiver.index().map(|t| t.text().to_string()).as_deref(), Some("2"));

    let const_ref = conns[1].sender().unwrap().const_ref().unwrap();
    assert_eq!(const_ref.entity_ref().unwrap().name().as_deref(), Some("greet"));
    assert_eq!(conns[1].receiver().unwrap().port_addrs().count(), 2);
}

#[test]
fn test_ast_type_expressions() {
    let root = source("type Num int | float\ntype User struct { name str, age int }");
    let types: Vec<_> = root
        .declarations()
        .filter_map(|d| match d {
            Declaration::Type(t) => Some(t),
            _ => None,
        })
        .collect();

    let Some(TypeExpr::Union(union)) = types[0].body() else {
        panic!("expected union");
    };
    assert_eq!(union.members().count(), 2);

    let Some(TypeExpr::Struct(st)) = types[1].body() else {
        panic!("expected struct");
    };
    let names: Vec<_> = st.fields().map(|f| f.name().unwrap().text()).collect();
    assert_eq!(names, vec!["name", "age"]);
}

#[test]
fn test_ast_const_value() {
    let root = source("const x int = -42");
    let Some(Declaration::Const(c)) = root.declarations().next() else {
        panic!("expected const");
    };
    let value = c.value().unwrap();
    assert!(value.is_negative());
    assert_eq!(value.literal().unwrap().text(), "42");
}

#[test]
fn test_trimmed_range_excludes_trivia() {
    let text = "component A() ()   \n\n";
    let root = source(text);
    let comp = first_component(&root);
    assert_eq!(u32::from(comp.range().end()), "component A() ()".len() as u32);
}

#[test]
fn test_unquote() {
    assert_eq!(unquote("'hi'"), "hi");
    assert_eq!(unquote("\"a\\nb\""), "a\nb");
    assert_eq!(unquote("plain"), "plain");
}
