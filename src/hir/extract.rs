//! Interface extraction: the port set of every node of every component.
//!
//! Each node (including dependency nodes, recursively) is resolved through
//! the [`Scope`] independently. A node that cannot be resolved gets a
//! node-scoped diagnostic and is left out; the rest carry on.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use super::diagnostics::{Diagnostic, DiagnosticCollector, codes};
use super::scope::{ResolvedEntity, Scope, ScopeError};
use crate::base::Span;
use crate::base::constants::NODE_PATH_SEPARATOR;
use crate::syntax::{Interface, LoweredFile, Node, Port, TypeExpr, TypeInst, TypeParam};

/// A successfully extracted node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInterface {
    /// Node path (`parent/child`) inside its component.
    pub path: SmolStr,
    pub interface: Interface,
}

/// Extracted nodes per component, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub components: IndexMap<SmolStr, Vec<NodeInterface>>,
}

impl Extraction {
    pub fn node(&self, component: &str, path: &str) -> Option<&Interface> {
        self.components
            .get(component)?
            .iter()
            .find(|n| n.path == path)
            .map(|n| &n.interface)
    }
}

/// Why one node has no interface.
#[derive(Debug)]
enum NodeFailure {
    Scope(ScopeError),
    NotAnInterface(ResolvedEntity),
    DuplicatePort(SmolStr),
    TypeArgsMismatch { expected: usize, found: usize },
}

/// Extract interfaces for all nodes of `lowered`.
///
/// Returns `None` when the scope's cancellation token fires; the token is
/// checked between components.
pub fn extract(
    scope: &mut Scope<'_, '_>,
    lowered: &LoweredFile,
    diagnostics: &mut DiagnosticCollector,
) -> Option<Extraction> {
    let mut extraction = Extraction::default();

    for (name, component) in lowered.file.components() {
        if scope.is_cancelled() {
            debug!(component = %name, "extraction cancelled");
            return None;
        }
        let mut nodes = Vec::new();
        let mut walker = NodeWalker {
            scope: &mut *scope,
            lowered,
            component: name,
            diagnostics: &mut *diagnostics,
            out: &mut nodes,
        };
        walker.walk(&component.nodes, "");
        trace!(component = %name, nodes = nodes.len(), "extracted component");
        extraction.components.insert(name.clone(), nodes);
    }

    Some(extraction)
}

struct NodeWalker<'s, 'w, 'a, 'o> {
    scope: &'s mut Scope<'w, 'a>,
    lowered: &'o LoweredFile,
    component: &'o SmolStr,
    diagnostics: &'o mut DiagnosticCollector,
    out: &'o mut Vec<NodeInterface>,
}

impl NodeWalker<'_, '_, '_, '_> {
    fn walk(&mut self, nodes: &IndexMap<SmolStr, Node>, prefix: &str) {
        for (name, node) in nodes {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}{NODE_PATH_SEPARATOR}{name}")
            };

            // Syntax errors inside the node were reported while lowering.
            if !self.lowered.is_broken(self.component, &path) {
                match self.node_interface(node) {
                    Ok(interface) => self.out.push(NodeInterface {
                        path: SmolStr::new(&path),
                        interface,
                    }),
                    Err(failure) => self.report(&path, node, failure),
                }
            }

            self.walk(&node.deps, &path);
        }
    }

    fn node_interface(&mut self, node: &Node) -> Result<Interface, NodeFailure> {
        let resolved = self
            .scope
            .resolve(&node.entity_ref)
            .map_err(NodeFailure::Scope)?;
        let Some(interface) = resolved.entity.interface() else {
            return Err(NodeFailure::NotAnInterface(resolved));
        };
        if let Some(port) = resolved.duplicate_port() {
            return Err(NodeFailure::DuplicatePort(port.clone()));
        }
        if node.type_args.is_empty() {
            return Ok(interface.clone());
        }
        if node.type_args.len() != interface.type_params.len() {
            return Err(NodeFailure::TypeArgsMismatch {
                expected: interface.type_params.len(),
                found: node.type_args.len(),
            });
        }
        Ok(instantiate(interface, &node.type_args))
    }

    fn report(&mut self, path: &str, node: &Node, failure: NodeFailure) {
        let span = Span::new(node.meta.start, node.meta.stop);
        let reference = &node.entity_ref;
        let diagnostic = match failure {
            NodeFailure::Scope(error @ ScopeError::UnknownImport(_)) => Diagnostic::error(
                codes::UNKNOWN_IMPORT,
                span,
                format!("node '{path}': {error}"),
            ),
            NodeFailure::Scope(error @ ScopeError::Unresolved(_)) => Diagnostic::error(
                codes::UNRESOLVED_ENTITY,
                span,
                format!("node '{path}': {error}"),
            ),
            NodeFailure::Scope(error @ ScopeError::Private(_)) => Diagnostic::error(
                codes::PRIVATE_ENTITY,
                span,
                format!("node '{path}': {error}"),
            ),
            NodeFailure::NotAnInterface(resolved) => Diagnostic::error(
                codes::NOT_AN_INTERFACE,
                span,
                format!(
                    "node '{path}': '{reference}' is a {}, not a component or interface",
                    resolved.entity.kind()
                ),
            ),
            NodeFailure::DuplicatePort(port) => Diagnostic::error(
                codes::DUPLICATE_PORT,
                span,
                format!("node '{path}': '{reference}' declares port '{port}' more than once"),
            )
            .with_port(port),
            NodeFailure::TypeArgsMismatch { expected, found } => Diagnostic::error(
                codes::TYPE_ARGS_MISMATCH,
                span,
                format!(
                    "node '{path}': '{reference}' takes {expected} type argument(s), {found} given"
                ),
            ),
        };
        self.diagnostics
            .add(diagnostic.with_component(self.component.clone()).with_node(path));
    }
}

/// Substitute type parameters with the node's type arguments in every port.
///
/// The instantiated interface has no type parameters left.
pub fn instantiate(interface: &Interface, args: &[TypeExpr]) -> Interface {
    let bindings: Vec<(&SmolStr, &TypeExpr)> = interface
        .type_params
        .iter()
        .map(|TypeParam { name, .. }| name)
        .zip(args)
        .collect();
    let substitute_port = |port: &Port| Port {
        type_expr: substitute(&port.type_expr, &bindings),
        ..port.clone()
    };

    let mut out = Interface::default();
    out.io.inports = interface
        .io
        .inports
        .iter()
        .map(|(name, port)| (name.clone(), substitute_port(port)))
        .collect();
    out.io.outports = interface
        .io
        .outports
        .iter()
        .map(|(name, port)| (name.clone(), substitute_port(port)))
        .collect();
    out
}

fn substitute(expr: &TypeExpr, bindings: &[(&SmolStr, &TypeExpr)]) -> TypeExpr {
    match expr {
        TypeExpr::Inst(inst) => {
            if inst.entity_ref.is_local() && inst.args.is_empty() {
                if let Some((_, arg)) = bindings
                    .iter()
                    .find(|(param, _)| **param == inst.entity_ref.name)
                {
                    return (*arg).clone();
                }
            }
            TypeExpr::Inst(TypeInst {
                entity_ref: inst.entity_ref.clone(),
                args: inst.args.iter().map(|a| substitute(a, bindings)).collect(),
            })
        }
        TypeExpr::Union(members) => {
            TypeExpr::Union(members.iter().map(|m| substitute(m, bindings)).collect())
        }
        TypeExpr::Struct(fields) => TypeExpr::Struct(
            fields
                .iter()
                .map(|(name, ty)| (name.clone(), substitute(ty, bindings)))
                .collect(),
        ),
    }
}
