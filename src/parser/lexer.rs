//! Logos-based lexer for Neva
//!
//! Fast tokenization using the logos crate. Every byte of the input ends up
//! in exactly one token so the CST stays lossless.

use super::syntax_kind::SyntaxKind;
use logos::Logos;
use rowan::TextSize;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    Float,

    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    String,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("->")]
    Arrow,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("/")]
    Slash,
    #[token("|")]
    Pipe,
    #[token("$")]
    Dollar,
    #[token("#")]
    Hash,
    #[token("=")]
    Eq,
    #[token("-")]
    Minus,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("import")]
    Import,
    #[token("as")]
    As,
    #[token("pub")]
    Pub,
    #[token("type")]
    Type,
    #[token("const")]
    Const,
    #[token("interface")]
    Interface,
    #[token("component")]
    Component,
    #[token("nodes")]
    Nodes,
    #[token("net")]
    Net,
    #[token("struct")]
    Struct,
    #[token("true")]
    True,
    #[token("false")]
    False,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => SyntaxKind::WHITESPACE,
            LogosToken::LineComment => SyntaxKind::LINE_COMMENT,
            LogosToken::BlockComment => SyntaxKind::BLOCK_COMMENT,
            LogosToken::Ident => SyntaxKind::IDENT,
            LogosToken::Integer => SyntaxKind::INTEGER,
            LogosToken::Float => SyntaxKind::FLOAT,
            LogosToken::String => SyntaxKind::STRING,
            LogosToken::Arrow => SyntaxKind::ARROW,
            LogosToken::LBrace => SyntaxKind::L_BRACE,
            LogosToken::RBrace => SyntaxKind::R_BRACE,
            LogosToken::LBracket => SyntaxKind::L_BRACKET,
            LogosToken::RBracket => SyntaxKind::R_BRACKET,
            LogosToken::LParen => SyntaxKind::L_PAREN,
            LogosToken::RParen => SyntaxKind::R_PAREN,
            LogosToken::Lt => SyntaxKind::LT,
            LogosToken::Gt => SyntaxKind::GT,
            LogosToken::Comma => SyntaxKind::COMMA,
            LogosToken::Colon => SyntaxKind::COLON,
            LogosToken::Dot => SyntaxKind::DOT,
            LogosToken::Slash => SyntaxKind::SLASH,
            LogosToken::Pipe => SyntaxKind::PIPE,
            LogosToken::Dollar => SyntaxKind::DOLLAR,
            LogosToken::Hash => SyntaxKind::HASH,
            LogosToken::Eq => SyntaxKind::EQ,
            LogosToken::Minus => SyntaxKind::MINUS,
            LogosToken::Import => SyntaxKind::IMPORT_KW,
            LogosToken::As => SyntaxKind::AS_KW,
            LogosToken::Pub => SyntaxKind::PUB_KW,
            LogosToken::Type => SyntaxKind::TYPE_KW,
            LogosToken::Const => SyntaxKind::CONST_KW,
            LogosToken::Interface => SyntaxKind::INTERFACE_KW,
            LogosToken::Component => SyntaxKind::COMPONENT_KW,
            LogosToken::Nodes => SyntaxKind::NODES_KW,
            LogosToken::Net => SyntaxKind::NET_KW,
            LogosToken::Struct => SyntaxKind::STRUCT_KW,
            LogosToken::True => SyntaxKind::TRUE_KW,
            LogosToken::False => SyntaxKind::FALSE_KW,
        }
    }
}
