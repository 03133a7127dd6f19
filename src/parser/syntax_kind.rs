//! Syntax kinds for the Rowan-based CST
//!
//! This enum defines all possible node and token kinds in the syntax tree
//! of a Neva source file.

/// All syntax kinds (tokens and nodes) of Neva
///
/// Tokens are leaf nodes (identifiers, keywords, punctuation).
/// Nodes are composite (entities, port lists, nodes, connections).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA (whitespace and comments - preserved but not semantically meaningful)
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENT,   // identifier
    INTEGER, // 42
    FLOAT,   // 3.14
    STRING,  // 'hello' or "hello"

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_BRACE,   // {
    R_BRACE,   // }
    L_BRACKET, // [
    R_BRACKET, // ]
    L_PAREN,   // (
    R_PAREN,   // )
    LT,        // <
    GT,        // >
    COMMA,     // ,
    COLON,     // :
    DOT,       // .
    SLASH,     // /
    PIPE,      // |
    ARROW,     // ->
    DOLLAR,    // $
    HASH,      // #
    EQ,        // =
    MINUS,     // -

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    IMPORT_KW,
    AS_KW,
    PUB_KW,
    TYPE_KW,
    CONST_KW,
    INTERFACE_KW,
    COMPONENT_KW,
    NODES_KW,
    NET_KW,
    STRUCT_KW,
    TRUE_KW,
    FALSE_KW,

    // =========================================================================
    // NODES
    // =========================================================================
    SOURCE_FILE,
    NAME,
    DIRECTIVE,
    IMPORT_BLOCK,
    IMPORT,
    IMPORT_PATH,
    TYPE_DEF,
    CONST_DEF,
    CONST_VALUE,
    INTERFACE_DEF,
    COMPONENT_DEF,
    TYPE_PARAMS,
    TYPE_PARAM,
    TYPE_ARGS,
    TYPE_INST,
    UNION_TYPE,
    STRUCT_TYPE,
    STRUCT_FIELD,
    ENTITY_REF,
    IN_PORTS,
    OUT_PORTS,
    PORT,
    COMPONENT_BODY,
    NODES_BLOCK,
    NODE,
    NODE_DEPS,
    NET_BLOCK,
    CONNECTION,
    SENDER,
    RECEIVER,
    PORT_ADDR,
    CONST_REF,

    // Special
    ERROR,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    /// Check if this is a trivia token (whitespace or comment)
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::LINE_COMMENT | Self::BLOCK_COMMENT)
    }

    /// Check if this is a keyword
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::IMPORT_KW as u16) && (self as u16) <= (Self::FALSE_KW as u16)
    }

    /// Check if this is a punctuation token
    pub fn is_punct(self) -> bool {
        (self as u16) >= (Self::L_BRACE as u16) && (self as u16) <= (Self::MINUS as u16)
    }

    /// Check if this is a literal
    pub fn is_literal(self) -> bool {
        matches!(self, Self::IDENT | Self::INTEGER | Self::FLOAT | Self::STRING)
    }

    /// Tokens that may start a top-level declaration.
    ///
    /// The parser uses these as recovery points so that one malformed
    /// declaration never swallows the next one.
    pub fn starts_declaration(self) -> bool {
        matches!(
            self,
            Self::IMPORT_KW
                | Self::PUB_KW
                | Self::TYPE_KW
                | Self::CONST_KW
                | Self::INTERFACE_KW
                | Self::COMPONENT_KW
                | Self::HASH
        )
    }

    /// Human readable name used in "expected ..." messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::IDENT => "identifier",
            Self::INTEGER => "integer",
            Self::FLOAT => "float",
            Self::STRING => "string",
            Self::L_BRACE => "'{'",
            Self::R_BRACE => "'}'",
            Self::L_BRACKET => "'['",
            Self::R_BRACKET => "']'",
            Self::L_PAREN => "'('",
            Self::R_PAREN => "')'",
            Self::LT => "'<'",
            Self::GT => "'>'",
            Self::COMMA => "','",
            Self::COLON => "':'",
            Self::DOT => "'.'",
            Self::SLASH => "'/'",
            Self::PIPE => "'|'",
            Self::ARROW => "'->'",
            Self::DOLLAR => "'$'",
            Self::HASH => "'#'",
            Self::EQ => "'='",
            Self::MINUS => "'-'",
            Self::IMPORT_KW => "'import'",
            Self::AS_KW => "'as'",
            Self::PUB_KW => "'pub'",
            Self::TYPE_KW => "'type'",
            Self::CONST_KW => "'const'",
            Self::INTERFACE_KW => "'interface'",
            Self::COMPONENT_KW => "'component'",
            Self::NODES_KW => "'nodes'",
            Self::NET_KW => "'net'",
            Self::STRUCT_KW => "'struct'",
            Self::TRUE_KW => "'true'",
            Self::FALSE_KW => "'false'",
            _ => "token",
        }
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        assert!(raw.0 < SyntaxKind::__LAST as u16);
        // Safety: we control all syntax kinds and check bounds above
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NevaLanguage {}

impl rowan::Language for NevaLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<NevaLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<NevaLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<NevaLanguage>;
