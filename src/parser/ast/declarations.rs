//! Top-level declarations: imports, types, constants, interfaces and components.

use super::*;

ast_node!(SourceFile, SOURCE_FILE);
ast_node!(Name, NAME);
ast_node!(Directive, DIRECTIVE);
ast_node!(ImportBlock, IMPORT_BLOCK);
ast_node!(Import, IMPORT);
ast_node!(ImportPath, IMPORT_PATH);
ast_node!(TypeDef, TYPE_DEF);
ast_node!(ConstDef, CONST_DEF);
ast_node!(ConstValue, CONST_VALUE);
ast_node!(InterfaceDef, INTERFACE_DEF);
ast_node!(ComponentDef, COMPONENT_DEF);

/// Any top-level item of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Declaration {
    Imports(ImportBlock),
    Type(TypeDef),
    Const(ConstDef),
    Interface(InterfaceDef),
    Component(ComponentDef),
}

impl AstNode for Declaration {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::IMPORT_BLOCK
                | SyntaxKind::TYPE_DEF
                | SyntaxKind::CONST_DEF
                | SyntaxKind::INTERFACE_DEF
                | SyntaxKind::COMPONENT_DEF
        )
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::IMPORT_BLOCK => Some(Self::Imports(ImportBlock(node))),
            SyntaxKind::TYPE_DEF => Some(Self::Type(TypeDef(node))),
            SyntaxKind::CONST_DEF => Some(Self::Const(ConstDef(node))),
            SyntaxKind::INTERFACE_DEF => Some(Self::Interface(InterfaceDef(node))),
            SyntaxKind::COMPONENT_DEF => Some(Self::Component(ComponentDef(node))),
            _ => None,
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::Imports(n) => n.syntax(),
            Self::Type(n) => n.syntax(),
            Self::Const(n) => n.syntax(),
            Self::Interface(n) => n.syntax(),
            Self::Component(n) => n.syntax(),
        }
    }
}

impl Declaration {
    /// Name of the declared entity; import blocks have none.
    pub fn name(&self) -> Option<Name> {
        match self {
            Self::Imports(_) => None,
            Self::Type(n) => n.name(),
            Self::Const(n) => n.name(),
            Self::Interface(n) => n.name(),
            Self::Component(n) => n.name(),
        }
    }
}

impl SourceFile {
    children_method!(declarations, Declaration);
}

impl Name {
    pub fn text(&self) -> String {
        self.0
            .first_token()
            .map(|t| t.text().to_string())
            .unwrap_or_default()
    }
}

impl Directive {
    first_child_method!(name, Name);

    /// Arguments between the parentheses, split on commas.
    ///
    /// Tokens of one argument are joined with a single space, so
    /// `#extern(int int_add, float float_add)` yields
    /// `["int int_add", "float float_add"]`.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut inside = false;
        for token in significant_tokens(&self.0) {
            match token.kind() {
                SyntaxKind::L_PAREN => inside = true,
                SyntaxKind::R_PAREN => break,
                SyntaxKind::COMMA if inside => {
                    if !current.is_empty() {
                        args.push(current.join(" "));
                        current.clear();
                    }
                }
                SyntaxKind::STRING if inside => current.push(unquote(token.text())),
                _ if inside => current.push(token.text().to_string()),
                _ => {}
            }
        }
        if !current.is_empty() {
            args.push(current.join(" "));
        }
        args
    }
}

impl ImportBlock {
    children_method!(imports, Import);
}

impl Import {
    first_child_method!(path, ImportPath);
    first_child_method!(alias, Name);
}

impl ImportPath {
    /// The path as written, without trivia (`lib/strings`).
    pub fn text(&self) -> String {
        significant_tokens(&self.0)
            .map(|t| t.text().to_string())
            .collect()
    }

    /// Default alias: the last `/`-separated segment.
    pub fn last_segment(&self) -> String {
        let text = self.text();
        text.rsplit('/').next().unwrap_or_default().to_string()
    }
}

impl TypeDef {
    first_child_method!(name, Name);
    first_child_method!(type_params, TypeParams);
    first_child_method!(body, TypeExpr);
    children_method!(directives, Directive);
    has_token_method!(is_public, PUB_KW, "pub type Foo int");
}

impl ConstDef {
    first_child_method!(name, Name);
    first_child_method!(type_expr, TypeExpr);
    first_child_method!(value, ConstValue);
    children_method!(directives, Directive);
    has_token_method!(is_public, PUB_KW, "pub const x int = 1");
}

impl ConstValue {
    first_child_method!(entity_ref, EntityRef);
    has_token_method!(is_negative, MINUS, "-1");

    /// The literal token (number, string or boolean keyword), if any.
    pub fn literal(&self) -> Option<SyntaxToken> {
        significant_tokens(&self.0).find(|t| {
            matches!(
                t.kind(),
                SyntaxKind::INTEGER
                    | SyntaxKind::FLOAT
                    | SyntaxKind::STRING
                    | SyntaxKind::TRUE_KW
                    | SyntaxKind::FALSE_KW
            )
        })
    }
}

impl InterfaceDef {
    first_child_method!(name, Name);
    first_child_method!(type_params, TypeParams);
    first_child_method!(in_ports, InPorts);
    first_child_method!(out_ports, OutPorts);
    children_method!(directives, Directive);
    has_token_method!(is_public, PUB_KW, "pub interface IFoo() ()");
}

impl ComponentDef {
    first_child_method!(name, Name);
    first_child_method!(type_params, TypeParams);
    first_child_method!(in_ports, InPorts);
    first_child_method!(out_ports, OutPorts);
    first_child_method!(body, ComponentBody);
    children_method!(directives, Directive);
    has_token_method!(is_public, PUB_KW, "pub component Foo() ()");
}
