//! Type expressions, entity references and port lists.

use super::*;

ast_node!(TypeParams, TYPE_PARAMS);
ast_node!(TypeParam, TYPE_PARAM);
ast_node!(TypeArgs, TYPE_ARGS);
ast_node!(TypeInst, TYPE_INST);
ast_node!(UnionType, UNION_TYPE);
ast_node!(StructType, STRUCT_TYPE);
ast_node!(StructField, STRUCT_FIELD);
ast_node!(EntityRef, ENTITY_REF);
ast_node!(InPorts, IN_PORTS);
ast_node!(OutPorts, OUT_PORTS);
ast_node!(Port, PORT);

/// A type expression in any of its syntactic forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Inst(TypeInst),
    Union(UnionType),
    Struct(StructType),
}

impl AstNode for TypeExpr {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::TYPE_INST | SyntaxKind::UNION_TYPE | SyntaxKind::STRUCT_TYPE
        )
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::TYPE_INST => Some(Self::Inst(TypeInst(node))),
            SyntaxKind::UNION_TYPE => Some(Self::Union(UnionType(node))),
            SyntaxKind::STRUCT_TYPE => Some(Self::Struct(StructType(node))),
            _ => None,
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::Inst(n) => n.syntax(),
            Self::Union(n) => n.syntax(),
            Self::Struct(n) => n.syntax(),
        }
    }
}

impl TypeParams {
    children_method!(params, TypeParam);
}

impl TypeParam {
    first_child_method!(name, Name);
    first_child_method!(constraint, TypeExpr);
}

impl TypeArgs {
    children_method!(args, TypeExpr);
}

impl TypeInst {
    first_child_method!(entity_ref, EntityRef);
    first_child_method!(type_args, TypeArgs);
}

impl UnionType {
    children_method!(members, TypeExpr);
}

impl StructType {
    children_method!(fields, StructField);
}

impl StructField {
    first_child_method!(name, Name);
    first_child_method!(type_expr, TypeExpr);
}

impl EntityRef {
    fn idents(&self) -> Vec<SyntaxToken> {
        significant_tokens(&self.0)
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect()
    }

    /// Package alias for qualified references (`io` in `io.Reader`).
    pub fn pkg(&self) -> Option<String> {
        if has_token(&self.0, SyntaxKind::DOT) {
            self.idents().first().map(|t| t.text().to_string())
        } else {
            None
        }
    }

    /// Entity name (`Reader` in `io.Reader`).
    pub fn name(&self) -> Option<String> {
        let idents = self.idents();
        if has_token(&self.0, SyntaxKind::DOT) {
            idents.get(1).map(|t| t.text().to_string())
        } else {
            idents.first().map(|t| t.text().to_string())
        }
    }
}

impl InPorts {
    children_method!(ports, Port);
}

impl OutPorts {
    children_method!(ports, Port);
}

impl Port {
    first_child_method!(name, Name);
    first_child_method!(type_expr, TypeExpr);
    has_token_method!(is_array, L_BRACKET, "[data] int");
}
