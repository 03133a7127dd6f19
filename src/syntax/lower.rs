//! Lowering from the typed AST into the serializable [`File`] model.
//!
//! Besides building the model, lowering records every declaration-level
//! problem it sees: duplicate entities, nodes and ports, and syntax errors
//! attributed to the declaration (and node) they occur in.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::model::*;
use crate::base::constants::NODE_PATH_SEPARATOR;
use crate::base::{LineIndex, Position, Span};
use crate::parser::{
    self, AstNode, Declaration, Parse, SourceFile, SyntaxKind, SyntaxNode, TextRange, TextSize,
    ast,
};

/// What went wrong in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    Syntax,
    DuplicatePort,
    DuplicateNode,
    DuplicateEntity,
}

/// A problem found while lowering, scoped to an entity and optionally a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub kind: IssueKind,
    pub entity: Option<SmolStr>,
    /// Node path (`parent/child`) inside `entity`.
    pub node: Option<String>,
    /// Offending port name, for duplicate ports.
    pub port: Option<SmolStr>,
    pub span: Span,
    pub message: String,
}

/// A syntax error no declaration can own. The whole file is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalSyntax {
    pub position: Position,
    pub detail: String,
}

/// Lowered form of one file, with everything later passes need to know
/// about its declarations.
#[derive(Debug, Clone, Default)]
pub struct LoweredFile {
    pub file: File,
    pub issues: Vec<SyntaxIssue>,
    /// Port names declared more than once, per entity.
    pub duplicate_ports: FxHashMap<SmolStr, Vec<SmolStr>>,
    /// `(component, node path)` pairs whose declaration holds a syntax error.
    pub broken_nodes: FxHashSet<(SmolStr, String)>,
}

impl LoweredFile {
    pub fn is_broken(&self, component: &str, node_path: &str) -> bool {
        self.broken_nodes
            .contains(&(SmolStr::new(component), node_path.to_string()))
    }

    /// First port of `entity` declared twice, if any.
    pub fn duplicate_port(&self, entity: &str) -> Option<&SmolStr> {
        self.duplicate_ports.get(entity).and_then(|ports| ports.first())
    }
}

/// Parse and lower a source text.
pub fn lower(text: &str) -> Result<LoweredFile, FatalSyntax> {
    lower_parse(text, &parser::parse(text))
}

/// Parse and lower with cancellation support.
/// Returns `None` if the cancellation token is signalled while parsing.
pub fn lower_with_cancel(
    text: &str,
    cancel: &CancellationToken,
) -> Option<Result<LoweredFile, FatalSyntax>> {
    let parse = parser::parse_with_cancel(text, cancel)?;
    Some(lower_parse(text, &parse))
}

/// Lower an existing parse of `text`.
pub fn lower_parse(text: &str, parse: &Parse) -> Result<LoweredFile, FatalSyntax> {
    let index = LineIndex::new(text);
    let root = parse.syntax();
    let Some(source) = SourceFile::cast(root) else {
        return Err(FatalSyntax {
            position: Position::default(),
            detail: "not a source file".to_string(),
        });
    };

    let mut lowerer = Lowerer {
        index: &index,
        out: LoweredFile::default(),
        pending_duplicates: Vec::new(),
    };
    lowerer.attribute_errors(&source, parse)?;
    lowerer.lower_source(&source);

    let mut out = lowerer.out;
    out.issues
        .sort_by_key(|issue| (issue.span.start, issue.span.end));
    trace!(
        entities = out.file.entities.len(),
        issues = out.issues.len(),
        "lowered file"
    );
    Ok(out)
}

struct Lowerer<'a> {
    index: &'a LineIndex,
    out: LoweredFile,
    /// Duplicate ports of the entity being lowered, committed on insert.
    pending_duplicates: Vec<SmolStr>,
}

/// Whether an error at `offset` belongs to the element spanning `range`.
///
/// A skipped token belongs to the element around it. A missing token also
/// belongs to the element ending where it was expected.
fn owns(range: TextRange, offset: TextSize, skipped: bool) -> bool {
    range.contains(offset) || (!skipped && range.end() == offset)
}

/// `parent/child` path of a NODE, or `None` if any enclosing node is unnamed.
fn node_path(node: &SyntaxNode) -> Option<String> {
    let mut names = Vec::new();
    for ancestor in node.ancestors().filter(|n| n.kind() == SyntaxKind::NODE) {
        let name = ast::Node::cast(ancestor)?.name()?.text();
        names.push(name);
    }
    names.reverse();
    Some(names.join(&NODE_PATH_SEPARATOR.to_string()))
}

impl Lowerer<'_> {
    fn span(&self, range: TextRange) -> Span {
        self.index.span(range)
    }

    fn meta_of(&self, node: &impl AstNode) -> Meta {
        let span = self.span(node.range());
        Meta::new(span.start, span.end)
    }

    fn issue(
        &mut self,
        kind: IssueKind,
        entity: Option<&SmolStr>,
        node: Option<String>,
        range: TextRange,
        message: String,
    ) -> &mut SyntaxIssue {
        let span = self.span(range);
        let issues = &mut self.out.issues;
        issues.push(SyntaxIssue {
            kind,
            entity: entity.cloned(),
            node,
            port: None,
            span,
            message,
        });
        let last = issues.len() - 1;
        &mut issues[last]
    }

    // =========================================================================
    // Syntax error attribution
    // =========================================================================

    fn attribute_errors(&mut self, source: &SourceFile, parse: &Parse) -> Result<(), FatalSyntax> {
        let declarations: Vec<_> = source.declarations().collect();
        // Errors that consumed tokens start an ERROR node at their offset.
        let skipped_at: FxHashSet<TextSize> = source
            .syntax()
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::ERROR)
            .map(|n| n.text_range().start())
            .collect();

        for error in &parse.errors {
            let offset = error.range.start();
            let skipped = skipped_at.contains(&offset);
            let owner = declarations
                .iter()
                .find(|decl| owns(decl.syntax().text_range(), offset, skipped));

            let Some(decl) = owner else {
                return Err(self.fatal(offset, &error.message));
            };

            if let Declaration::Imports(_) = decl {
                self.issue(IssueKind::Syntax, None, None, error.range, error.message.clone());
                continue;
            }

            let Some(name) = decl.name().map(|n| SmolStr::new(n.text())) else {
                return Err(self.fatal(offset, &error.message));
            };

            // Deepest named node containing the error, if any.
            let node = decl
                .syntax()
                .descendants()
                .filter(|n| n.kind() == SyntaxKind::NODE && owns(n.text_range(), offset, skipped))
                .last()
                .and_then(|n| node_path(&n));

            if let Some(path) = &node {
                self.out.broken_nodes.insert((name.clone(), path.clone()));
            }
            let message = match &node {
                Some(path) => format!("syntax error in node '{path}': {}", error.message),
                None => format!("syntax error in '{name}': {}", error.message),
            };
            self.issue(IssueKind::Syntax, Some(&name), node, error.range, message);
        }
        Ok(())
    }

    fn fatal(&self, offset: TextSize, message: &str) -> FatalSyntax {
        FatalSyntax {
            position: self.index.position(offset),
            detail: message.to_string(),
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn lower_source(&mut self, source: &SourceFile) {
        for decl in source.declarations() {
            match decl {
                Declaration::Imports(block) => self.lower_imports(&block),
                Declaration::Type(def) => self.lower_type_def(&def),
                Declaration::Const(def) => self.lower_const_def(&def),
                Declaration::Interface(def) => self.lower_interface_def(&def),
                Declaration::Component(def) => self.lower_component_def(&def),
            }
        }
    }

    fn lower_imports(&mut self, block: &ast::ImportBlock) {
        for import in block.imports() {
            let Some(path) = import.path() else { continue };
            let alias = import
                .alias()
                .map(|a| a.text())
                .unwrap_or_else(|| path.last_segment());
            if alias.is_empty() {
                continue;
            }
            let alias = SmolStr::new(alias);
            if self.out.file.imports.contains_key(&alias) {
                self.issue(
                    IssueKind::DuplicateEntity,
                    None,
                    None,
                    import.range(),
                    format!("import alias '{alias}' is already in use"),
                );
                continue;
            }
            let meta = self.meta_of(&import);
            self.out.file.imports.insert(
                alias,
                Import {
                    package: path.text(),
                    meta,
                },
            );
        }
    }

    fn insert_entity(&mut self, name: SmolStr, range: TextRange, entity: Entity) {
        let duplicates = std::mem::take(&mut self.pending_duplicates);
        if self.out.file.entities.contains_key(&name) {
            self.issue(
                IssueKind::DuplicateEntity,
                Some(&name),
                None,
                range,
                format!("entity '{name}' is declared more than once"),
            );
            return;
        }
        if !duplicates.is_empty() {
            self.out.duplicate_ports.insert(name.clone(), duplicates);
        }
        self.out.file.entities.insert(name, entity);
    }

    fn lower_type_def(&mut self, def: &ast::TypeDef) {
        let Some(name) = def.name() else { return };
        let params = self.type_params(def.type_params());
        let body = def.body().map(|b| self.type_expr(&b));
        let entity = Entity {
            is_public: def.is_public(),
            def: EntityDef::Type(TypeDef { params, body }),
            meta: self.meta_of(def),
        };
        self.insert_entity(SmolStr::new(name.text()), def.range(), entity);
    }

    fn lower_const_def(&mut self, def: &ast::ConstDef) {
        let Some(name) = def.name() else { return };
        let name = SmolStr::new(name.text());
        let type_expr = def
            .type_expr()
            .map(|t| self.type_expr(&t))
            .unwrap_or_else(|| TypeExpr::named(""));
        let value = def.value().and_then(|v| self.const_value(&name, &v));
        let entity = Entity {
            is_public: def.is_public(),
            def: EntityDef::Const(Const { type_expr, value }),
            meta: self.meta_of(def),
        };
        self.insert_entity(name, def.range(), entity);
    }

    fn const_value(&mut self, entity: &SmolStr, value: &ast::ConstValue) -> Option<ConstValue> {
        if let Some(entity_ref) = value.entity_ref() {
            return Some(ConstValue::Ref(self.entity_ref(&entity_ref)));
        }
        let token = value.literal()?;
        let sign = if value.is_negative() { "-" } else { "" };
        let literal = match token.kind() {
            SyntaxKind::TRUE_KW => Some(ConstValue::Bool(true)),
            SyntaxKind::FALSE_KW => Some(ConstValue::Bool(false)),
            SyntaxKind::STRING => Some(ConstValue::Str(ast::unquote(token.text()))),
            SyntaxKind::INTEGER => format!("{sign}{}", token.text())
                .parse()
                .ok()
                .map(ConstValue::Int),
            SyntaxKind::FLOAT => format!("{sign}{}", token.text())
                .parse()
                .ok()
                .map(ConstValue::Float),
            _ => None,
        };
        if literal.is_none() {
            self.issue(
                IssueKind::Syntax,
                Some(entity),
                None,
                value.range(),
                format!("invalid literal '{sign}{}'", token.text()),
            );
        }
        literal
    }

    fn lower_interface_def(&mut self, def: &ast::InterfaceDef) {
        let Some(name) = def.name() else { return };
        let name = SmolStr::new(name.text());
        let interface = self.interface(&name, def.type_params(), def.in_ports(), def.out_ports());
        let entity = Entity {
            is_public: def.is_public(),
            def: EntityDef::Interface(interface),
            meta: self.meta_of(def),
        };
        self.insert_entity(name, def.range(), entity);
    }

    fn lower_component_def(&mut self, def: &ast::ComponentDef) {
        let Some(name) = def.name() else { return };
        let name = SmolStr::new(name.text());
        let interface = self.interface(&name, def.type_params(), def.in_ports(), def.out_ports());
        let directives = self.directives(def.directives());

        let mut nodes = IndexMap::new();
        let mut net = Vec::new();
        if let Some(body) = def.body() {
            nodes = self.nodes(&name, "", body.nodes());
            net = body
                .connections()
                .map(|c| self.connection(&name, &c))
                .collect();
        }

        let entity = Entity {
            is_public: def.is_public(),
            def: EntityDef::Component(Component {
                interface,
                directives,
                nodes,
                net,
            }),
            meta: self.meta_of(def),
        };
        self.insert_entity(name, def.range(), entity);
    }

    // =========================================================================
    // Interfaces and types
    // =========================================================================

    fn interface(
        &mut self,
        entity: &SmolStr,
        params: Option<ast::TypeParams>,
        inports: Option<ast::InPorts>,
        outports: Option<ast::OutPorts>,
    ) -> Interface {
        let type_params = self.type_params(params);
        let inports = inports
            .map(|list| self.ports(entity, "inports", list.ports()))
            .unwrap_or_default();
        let outports = outports
            .map(|list| self.ports(entity, "outports", list.ports()))
            .unwrap_or_default();
        Interface {
            type_params,
            io: Io { inports, outports },
        }
    }

    fn ports(
        &mut self,
        entity: &SmolStr,
        direction: &str,
        ports: impl Iterator<Item = ast::Port>,
    ) -> IndexMap<SmolStr, Port> {
        let mut out = IndexMap::new();
        for port in ports {
            let Some(name) = port.name() else { continue };
            let name = SmolStr::new(name.text());
            if out.contains_key(&name) {
                self.pending_duplicates.push(name.clone());
                self.issue(
                    IssueKind::DuplicatePort,
                    Some(entity),
                    None,
                    port.range(),
                    format!("port '{name}' is declared twice in the {direction} of '{entity}'"),
                )
                .port = Some(name.clone());
                continue;
            }
            let type_expr = port
                .type_expr()
                .map(|t| self.type_expr(&t))
                .unwrap_or_else(|| TypeExpr::named(""));
            out.insert(
                name,
                Port {
                    type_expr,
                    is_array: port.is_array(),
                    meta: self.meta_of(&port),
                },
            );
        }
        out
    }

    fn type_params(&self, params: Option<ast::TypeParams>) -> Vec<TypeParam> {
        let Some(params) = params else {
            return Vec::new();
        };
        params
            .params()
            .filter_map(|param| {
                let name = param.name()?;
                Some(TypeParam {
                    name: SmolStr::new(name.text()),
                    constr: param.constraint().map(|c| self.type_expr(&c)),
                })
            })
            .collect()
    }

    fn type_expr(&self, expr: &ast::TypeExpr) -> TypeExpr {
        match expr {
            ast::TypeExpr::Inst(inst) => TypeExpr::Inst(TypeInst {
                entity_ref: inst
                    .entity_ref()
                    .map(|r| self.entity_ref(&r))
                    .unwrap_or_default(),
                args: inst
                    .type_args()
                    .map(|args| args.args().map(|a| self.type_expr(&a)).collect())
                    .unwrap_or_default(),
            }),
            ast::TypeExpr::Union(union) => {
                TypeExpr::Union(union.members().map(|m| self.type_expr(&m)).collect())
            }
            ast::TypeExpr::Struct(st) => TypeExpr::Struct(
                st.fields()
                    .filter_map(|field| {
                        let name = SmolStr::new(field.name()?.text());
                        let ty = field.type_expr().map(|t| self.type_expr(&t))?;
                        Some((name, ty))
                    })
                    .collect(),
            ),
        }
    }

    fn entity_ref(&self, entity_ref: &ast::EntityRef) -> EntityRef {
        EntityRef {
            pkg: entity_ref.pkg().map(SmolStr::new).unwrap_or_default(),
            name: entity_ref.name().map(SmolStr::new).unwrap_or_default(),
        }
    }

    fn directives(&self, directives: impl Iterator<Item = ast::Directive>) -> Vec<Directive> {
        directives
            .filter_map(|d| {
                Some(Directive {
                    name: SmolStr::new(d.name()?.text()),
                    args: d.args(),
                })
            })
            .collect()
    }

    // =========================================================================
    // Nodes and network
    // =========================================================================

    fn nodes(
        &mut self,
        component: &SmolStr,
        prefix: &str,
        nodes: impl Iterator<Item = ast::Node>,
    ) -> IndexMap<SmolStr, Node> {
        let mut out = IndexMap::new();
        for node in nodes {
            let Some(name) = node.name() else { continue };
            let name = SmolStr::new(name.text());
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}{NODE_PATH_SEPARATOR}{name}")
            };

            if out.contains_key(&name) {
                self.issue(
                    IssueKind::DuplicateNode,
                    Some(component),
                    Some(path.clone()),
                    node.range(),
                    format!("node '{path}' is declared more than once in '{component}'"),
                );
                continue;
            }

            let deps = match node.deps() {
                Some(deps) => self.nodes(component, &path, deps.nodes()),
                None => IndexMap::new(),
            };
            let lowered = Node {
                directives: self.directives(node.directives()),
                entity_ref: node
                    .entity_ref()
                    .map(|r| self.entity_ref(&r))
                    .unwrap_or_default(),
                type_args: node
                    .type_args()
                    .map(|args| args.args().map(|a| self.type_expr(&a)).collect())
                    .unwrap_or_default(),
                deps,
                meta: self.meta_of(&node),
            };
            out.insert(name, lowered);
        }
        out
    }

    fn connection(&mut self, component: &SmolStr, conn: &ast::Connection) -> Connection {
        let sender = match conn.sender() {
            Some(sender) => match (sender.const_ref(), sender.port_addr()) {
                (Some(const_ref), _) => Sender::Const(
                    const_ref
                        .entity_ref()
                        .map(|r| self.entity_ref(&r))
                        .unwrap_or_default(),
                ),
                (None, Some(addr)) => Sender::PortAddr(self.port_addr(component, &addr)),
                (None, None) => Sender::PortAddr(PortAddr::default()),
            },
            None => Sender::PortAddr(PortAddr::default()),
        };

        let receiver = match conn.receiver() {
            Some(receiver) => match receiver.connection() {
                Some(chained) => Receiver::Chain(Box::new(self.connection(component, &chained))),
                None => Receiver::Ports(
                    receiver
                        .port_addrs()
                        .map(|addr| self.port_addr(component, &addr))
                        .collect(),
                ),
            },
            None => Receiver::Ports(Vec::new()),
        };

        Connection {
            sender,
            receiver,
            meta: self.meta_of(conn),
        }
    }

    fn port_addr(&mut self, component: &SmolStr, addr: &ast::PortAddr) -> PortAddr {
        let idx = addr.index().and_then(|token| match token.text().parse::<u8>() {
            Ok(idx) => Some(idx),
            Err(_) => {
                self.issue(
                    IssueKind::Syntax,
                    Some(component),
                    None,
                    token.text_range(),
                    format!("array index {} out of range", token.text()),
                );
                None
            }
        });
        PortAddr {
            node: addr.node().map(SmolStr::new).unwrap_or_default(),
            port: addr.port().map(SmolStr::new).unwrap_or_default(),
            idx,
            meta: self.meta_of(addr),
        }
    }
}
