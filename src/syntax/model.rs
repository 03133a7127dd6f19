//! Serializable source model of one Neva file.
//!
//! This is the `file` half of the resolve-file response. Every dynamic map is
//! an [`IndexMap`] so that serialization follows declaration order and stays
//! byte-identical between runs.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::base::Position;

/// Source location of a declaration (0-indexed line/column).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meta {
    pub start: Position,
    pub stop: Position,
}

impl Meta {
    pub fn new(start: Position, stop: Position) -> Self {
        Self { start, stop }
    }
}

/// A parsed file: imports and entities keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub imports: IndexMap<SmolStr, Import>,
    pub entities: IndexMap<SmolStr, Entity>,
}

impl File {
    /// Iterate over the component entities of the file.
    pub fn components(&self) -> impl Iterator<Item = (&SmolStr, &Component)> {
        self.entities.iter().filter_map(|(name, entity)| match &entity.def {
            EntityDef::Component(component) => Some((name, component)),
            _ => None,
        })
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        match &self.entities.get(name)?.def {
            EntityDef::Component(component) => Some(component),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    /// Package path as written (`lib/strings`).
    pub package: String,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub is_public: bool,
    #[serde(flatten)]
    pub def: EntityDef,
    pub meta: Meta,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self.def {
            EntityDef::Component(_) => EntityKind::Component,
            EntityDef::Interface(_) => EntityKind::Interface,
            EntityDef::Type(_) => EntityKind::Type,
            EntityDef::Const(_) => EntityKind::Const,
        }
    }

    /// The port interface of components and interfaces.
    pub fn interface(&self) -> Option<&Interface> {
        match &self.def {
            EntityDef::Component(component) => Some(&component.interface),
            EntityDef::Interface(interface) => Some(interface),
            _ => None,
        }
    }
}

/// Entity payload, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntityDef {
    Component(Component),
    Interface(Interface),
    Type(TypeDef),
    Const(Const),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Component,
    Interface,
    Type,
    Const,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Component => "component",
            EntityKind::Interface => "interface",
            EntityKind::Type => "type",
            EntityKind::Const => "const",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub interface: Interface,
    pub directives: Vec<Directive>,
    pub nodes: IndexMap<SmolStr, Node>,
    pub net: Vec<Connection>,
}

/// Port set of a component or interface, with its type parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    pub type_params: Vec<TypeParam>,
    pub io: Io,
}

impl Interface {
    pub fn is_empty(&self) -> bool {
        self.io.inports.is_empty() && self.io.outports.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Io {
    #[serde(rename = "in")]
    pub inports: IndexMap<SmolStr, Port>,
    #[serde(rename = "out")]
    pub outports: IndexMap<SmolStr, Port>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeParam {
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constr: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub type_expr: TypeExpr,
    pub is_array: bool,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeExpr {
    Inst(TypeInst),
    Union(Vec<TypeExpr>),
    Struct(IndexMap<SmolStr, TypeExpr>),
}

impl TypeExpr {
    /// A plain reference to a local type without arguments.
    pub fn named(name: impl Into<SmolStr>) -> Self {
        TypeExpr::Inst(TypeInst {
            entity_ref: EntityRef::local(name),
            args: Vec::new(),
        })
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Inst(inst) => {
                write!(f, "{}", inst.entity_ref)?;
                if !inst.args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in inst.args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeExpr::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            TypeExpr::Struct(fields) => {
                f.write_str("struct {")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {name} {ty}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInst {
    #[serde(rename = "ref")]
    pub entity_ref: EntityRef,
    pub args: Vec<TypeExpr>,
}

/// Reference to an entity, optionally qualified by an import alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Import alias; empty for references into the current package.
    pub pkg: SmolStr,
    pub name: SmolStr,
}

impl EntityRef {
    pub fn local(name: impl Into<SmolStr>) -> Self {
        Self {
            pkg: SmolStr::default(),
            name: name.into(),
        }
    }

    pub fn qualified(pkg: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            pkg: pkg.into(),
            name: name.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.pkg.is_empty()
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pkg.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.pkg, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub name: SmolStr,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    pub params: Vec<TypeParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Const {
    pub type_expr: TypeExpr,
    /// `None` when the value could not be parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConstValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ref(EntityRef),
}

/// A node of a component: an instance of another component or interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub directives: Vec<Directive>,
    pub entity_ref: EntityRef,
    pub type_args: Vec<TypeExpr>,
    /// Dependency-injected nodes, resolved independently of their parent.
    pub deps: IndexMap<SmolStr, Node>,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub sender: Sender,
    pub receiver: Receiver,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sender {
    PortAddr(PortAddr),
    Const(EntityRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Receiver {
    Ports(Vec<PortAddr>),
    Chain(Box<Connection>),
}

/// Address of a port inside a component's network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAddr {
    /// Node name; empty for the component's own ports.
    pub node: SmolStr,
    pub port: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<u8>,
    pub meta: Meta,
}

impl fmt::Display for PortAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.port)?;
        if let Some(idx) = self.idx {
            write!(f, "[{idx}]")?;
        }
        Ok(())
    }
}
