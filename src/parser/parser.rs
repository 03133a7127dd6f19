//! Recursive descent parser for Neva
//!
//! Builds a rowan GreenNode tree from tokens.
//! Supports error recovery and produces a lossless CST.

use super::lexer::{Lexer, Token};
use super::syntax_kind::SyntaxKind;
use rowan::{GreenNode, GreenNodeBuilder, TextRange, TextSize};
use tokio_util::sync::CancellationToken;

/// Parse result containing the green tree and any errors
#[derive(Debug, Clone)]
pub struct Parse {
    pub green: GreenNode,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Get the root syntax node
    pub fn syntax(&self) -> super::SyntaxNode {
        super::SyntaxNode::new_root(self.green.clone())
    }

    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse Neva source code into a CST
pub fn parse(input: &str) -> Parse {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens, None);
    parser.parse_source_file();
    parser.finish()
}

/// Parse with cancellation support.
/// Returns `None` if the cancellation token is signalled. The token is
/// checked before every top-level declaration.
pub fn parse_with_cancel(input: &str, cancel: &CancellationToken) -> Option<Parse> {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens, Some(cancel));
    parser.parse_source_file();
    if parser.cancelled {
        return None;
    }
    Some(parser.finish())
}

/// Deepest nesting of dependency nodes, chained connections or type
/// expressions. Anything below it is skipped as a syntax error.
pub const MAX_NESTING: usize = 256;

const OPENERS: [SyntaxKind; 4] = [
    SyntaxKind::L_BRACE,
    SyntaxKind::L_BRACKET,
    SyntaxKind::L_PAREN,
    SyntaxKind::LT,
];
const CLOSERS: [SyntaxKind; 4] = [
    SyntaxKind::R_BRACE,
    SyntaxKind::R_BRACKET,
    SyntaxKind::R_PAREN,
    SyntaxKind::GT,
];

/// The parser state
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    cancel: Option<&'a CancellationToken>,
    cancelled: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>], cancel: Option<&'a CancellationToken>) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            cancel,
            cancelled: false,
            depth: 0,
        }
    }

    fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> SyntaxKind {
        self.current().map(|t| t.kind).unwrap_or(SyntaxKind::ERROR)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        !self.at_eof() && self.current_kind() == kind
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        !self.at_eof() && kinds.contains(&self.current_kind())
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Look ahead, skipping trivia. Returns `ERROR` past the end.
    fn nth(&self, n: usize) -> SyntaxKind {
        let mut idx = self.pos;
        let mut count = 0;
        while idx < self.tokens.len() {
            if !self.tokens[idx].kind.is_trivia() {
                if count == n {
                    return self.tokens[idx].kind;
                }
                count += 1;
            }
            idx += 1;
        }
        SyntaxKind::ERROR
    }

    /// Next significant token kind without consuming trivia.
    fn peek(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn at_body_terminator(&self) -> bool {
        self.at(SyntaxKind::R_BRACE)
            || (self.current_kind().starts_declaration() && !self.at(SyntaxKind::HASH))
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) {
        if let Some(token) = self.current() {
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    fn bump_any(&mut self) {
        self.bump();
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {}", kind.describe()));
            false
        }
    }

    fn skip_trivia(&mut self) {
        while self.current().map(|t| t.kind.is_trivia()).unwrap_or(false) {
            self.bump();
        }
    }

    /// Skip trivia and an optional separating comma.
    fn skip_separator(&mut self) {
        self.skip_trivia();
        if self.eat(SyntaxKind::COMMA) {
            self.skip_trivia();
        }
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn current_range(&self) -> TextRange {
        match self.current() {
            Some(t) => TextRange::at(t.offset, TextSize::of(t.text)),
            None => {
                let end = self
                    .tokens
                    .last()
                    .map(|t| t.offset + TextSize::of(t.text))
                    .unwrap_or_else(|| TextSize::new(0));
                TextRange::empty(end)
            }
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        self.errors.push(SyntaxError::new(message, range));
    }

    fn error_recover(&mut self, message: impl Into<String>, recovery: &[SyntaxKind]) {
        self.error(message);
        self.builder.start_node(SyntaxKind::ERROR.into());
        // Always consume at least one token to make progress
        let mut consumed = false;
        while !self.at_eof() && !self.at_any(recovery) {
            self.bump_any();
            consumed = true;
        }
        if !consumed && !self.at_eof() {
            self.bump_any();
        }
        self.builder.finish_node();
    }

    /// Wrap a single unexpected token in an ERROR node.
    fn error_skip_token(&mut self, message: impl Into<String>) {
        self.error(message);
        self.start_node(SyntaxKind::ERROR);
        self.bump_any();
        self.finish_node();
    }

    /// Enter one nesting level. Past [`MAX_NESTING`] the rest of the group
    /// becomes an ERROR node and `false` is returned.
    fn enter(&mut self) -> bool {
        if self.depth >= MAX_NESTING {
            self.error(format!("nesting deeper than {MAX_NESTING} levels"));
            self.skip_group();
            return false;
        }
        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Consume tokens up to the closer of the enclosing group, keeping
    /// delimiters balanced.
    fn skip_group(&mut self) {
        self.start_node(SyntaxKind::ERROR);
        let mut open = 0usize;
        while !self.at_eof() {
            if self.at_any(&OPENERS) {
                open += 1;
            } else if self.at_any(&CLOSERS) {
                if open == 0 {
                    break;
                }
                open -= 1;
            }
            self.bump_any();
        }
        self.finish_node();
    }

    fn is_cancelled(&mut self) -> bool {
        if self.cancel.is_some_and(|c| c.is_cancelled()) {
            self.cancelled = true;
        }
        self.cancelled
    }

    // =========================================================================
    // Node building helpers
    // =========================================================================

    fn start_node(&mut self, kind: SyntaxKind) {
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    // =========================================================================
    // Grammar rules
    // =========================================================================

    /// SourceFile = Declaration*
    fn parse_source_file(&mut self) {
        self.start_node(SyntaxKind::SOURCE_FILE);

        while !self.at_eof() {
            if self.is_cancelled() {
                break;
            }
            let pos_before = self.pos;
            self.skip_trivia();
            if self.at_eof() {
                break;
            }
            self.parse_declaration();
            // Safety: if we didn't make progress, force-skip a token
            if self.pos == pos_before && !self.at_eof() {
                self.error(format!("stuck on token: {:?}", self.current_kind()));
                self.bump_any();
            }
        }

        self.finish_node();
    }

    /// Kind of the declaration starting at the current token, looking past
    /// directives and `pub`.
    fn declaration_kind(&self) -> Option<SyntaxKind> {
        let mut n = 0;
        loop {
            match self.nth(n) {
                SyntaxKind::HASH => {
                    // '#' name ( '(' ... ')' )?
                    n += 2;
                    if self.nth(n) == SyntaxKind::L_PAREN {
                        while !matches!(self.nth(n), SyntaxKind::R_PAREN | SyntaxKind::ERROR) {
                            n += 1;
                        }
                        n += 1;
                    }
                }
                SyntaxKind::PUB_KW => n += 1,
                SyntaxKind::TYPE_KW => return Some(SyntaxKind::TYPE_DEF),
                SyntaxKind::CONST_KW => return Some(SyntaxKind::CONST_DEF),
                SyntaxKind::INTERFACE_KW => return Some(SyntaxKind::INTERFACE_DEF),
                SyntaxKind::COMPONENT_KW => return Some(SyntaxKind::COMPONENT_DEF),
                _ => return None,
            }
        }
    }

    /// Declaration = ImportBlock | Directive* 'pub'? (TypeDef | ConstDef | InterfaceDef | ComponentDef)
    fn parse_declaration(&mut self) {
        if self.at(SyntaxKind::IMPORT_KW) {
            self.parse_import_block();
            return;
        }

        let Some(kind) = self.declaration_kind() else {
            self.error_recover(
                format!("unexpected {} at top level", self.current_kind().describe()),
                &[
                    SyntaxKind::IMPORT_KW,
                    SyntaxKind::PUB_KW,
                    SyntaxKind::TYPE_KW,
                    SyntaxKind::CONST_KW,
                    SyntaxKind::INTERFACE_KW,
                    SyntaxKind::COMPONENT_KW,
                    SyntaxKind::HASH,
                ],
            );
            return;
        };

        self.start_node(kind);
        self.parse_directives();
        if self.eat(SyntaxKind::PUB_KW) {
            self.skip_trivia();
        }
        match kind {
            SyntaxKind::TYPE_DEF => self.parse_type_def(),
            SyntaxKind::CONST_DEF => self.parse_const_def(),
            SyntaxKind::INTERFACE_DEF => self.parse_interface_def(),
            _ => self.parse_component_def(),
        }
        self.finish_node();
    }

    /// Directive = '#' Name ( '(' args ')' )?
    fn parse_directives(&mut self) {
        while self.at(SyntaxKind::HASH) {
            self.start_node(SyntaxKind::DIRECTIVE);
            self.bump();
            self.parse_name();
            if self.peek() == SyntaxKind::L_PAREN {
                self.skip_trivia();
                self.bump();
                while !self.at_eof() && !self.at(SyntaxKind::R_PAREN) {
                    if self.at(SyntaxKind::L_BRACE) || self.at(SyntaxKind::R_BRACE) {
                        break;
                    }
                    self.bump_any();
                }
                self.expect(SyntaxKind::R_PAREN);
            }
            self.finish_node();
            self.skip_trivia();
        }
    }

    /// Name = IDENT
    fn parse_name(&mut self) {
        self.skip_trivia();
        if self.at(SyntaxKind::IDENT) {
            self.start_node(SyntaxKind::NAME);
            self.bump();
            self.finish_node();
        } else {
            self.error("expected identifier");
        }
    }

    /// ImportBlock = 'import' '{' Import* '}'
    fn parse_import_block(&mut self) {
        self.start_node(SyntaxKind::IMPORT_BLOCK);
        self.expect(SyntaxKind::IMPORT_KW);
        self.skip_trivia();
        if self.expect(SyntaxKind::L_BRACE) {
            self.skip_trivia();
            while !self.at_eof() && !self.at_body_terminator() {
                if self.at(SyntaxKind::IDENT) {
                    self.parse_import();
                } else {
                    self.error_skip_token(format!(
                        "expected import path, found {}",
                        self.current_kind().describe()
                    ));
                }
                self.skip_separator();
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// Import = ImportPath ('as' Name)?
    /// ImportPath = Segment ('/' Segment)*, Segment = IDENT ('.' IDENT)*
    fn parse_import(&mut self) {
        self.start_node(SyntaxKind::IMPORT);
        self.start_node(SyntaxKind::IMPORT_PATH);
        self.bump();
        while matches!(self.current_kind(), SyntaxKind::SLASH | SyntaxKind::DOT)
            && !self.at_eof()
        {
            self.bump();
            if !self.eat(SyntaxKind::IDENT) {
                self.error("expected path segment");
                break;
            }
        }
        self.finish_node();
        if self.peek() == SyntaxKind::AS_KW {
            self.skip_trivia();
            self.bump();
            self.parse_name();
        }
        self.finish_node();
    }

    /// TypeDef = 'type' Name TypeParams? TypeExpr?
    fn parse_type_def(&mut self) {
        self.expect(SyntaxKind::TYPE_KW);
        self.parse_name();
        if self.peek() == SyntaxKind::LT {
            self.skip_trivia();
            self.parse_type_params();
        }
        if matches!(self.peek(), SyntaxKind::IDENT | SyntaxKind::STRUCT_KW) {
            self.skip_trivia();
            self.parse_type_expr();
        }
    }

    /// ConstDef = 'const' Name TypeExpr '=' ConstValue
    fn parse_const_def(&mut self) {
        self.expect(SyntaxKind::CONST_KW);
        self.parse_name();
        self.skip_trivia();
        self.parse_type_expr();
        self.skip_trivia();
        if self.expect(SyntaxKind::EQ) {
            self.skip_trivia();
            self.parse_const_value();
        }
    }

    /// ConstValue = '-'? (INTEGER | FLOAT) | STRING | 'true' | 'false' | EntityRef
    fn parse_const_value(&mut self) {
        self.start_node(SyntaxKind::CONST_VALUE);
        match self.current_kind() {
            SyntaxKind::MINUS => {
                self.bump();
                if !self.eat(SyntaxKind::INTEGER) && !self.eat(SyntaxKind::FLOAT) {
                    self.error("expected number after '-'");
                }
            }
            SyntaxKind::INTEGER
            | SyntaxKind::FLOAT
            | SyntaxKind::STRING
            | SyntaxKind::TRUE_KW
            | SyntaxKind::FALSE_KW => self.bump(),
            SyntaxKind::IDENT => self.parse_entity_ref(),
            _ => self.error("expected constant value"),
        }
        self.finish_node();
    }

    /// InterfaceDef = 'interface' Name TypeParams? InPorts OutPorts
    fn parse_interface_def(&mut self) {
        self.expect(SyntaxKind::INTERFACE_KW);
        self.parse_signature();
    }

    /// ComponentDef = 'component' Name TypeParams? InPorts OutPorts ComponentBody?
    fn parse_component_def(&mut self) {
        self.expect(SyntaxKind::COMPONENT_KW);
        self.parse_signature();
        if self.peek() == SyntaxKind::L_BRACE {
            self.skip_trivia();
            self.parse_component_body();
        }
    }

    fn parse_signature(&mut self) {
        self.parse_name();
        if self.peek() == SyntaxKind::LT {
            self.skip_trivia();
            self.parse_type_params();
        }
        self.skip_trivia();
        self.parse_port_list(SyntaxKind::IN_PORTS);
        self.skip_trivia();
        self.parse_port_list(SyntaxKind::OUT_PORTS);
    }

    /// TypeParams = '<' TypeParam (',' TypeParam)* '>'
    fn parse_type_params(&mut self) {
        self.start_node(SyntaxKind::TYPE_PARAMS);
        self.expect(SyntaxKind::LT);
        self.skip_trivia();
        while !self.at_eof() && !self.at(SyntaxKind::GT) && !self.at_body_terminator() {
            if !self.at(SyntaxKind::IDENT) {
                self.error_skip_token("expected type parameter");
                self.skip_separator();
                continue;
            }
            self.start_node(SyntaxKind::TYPE_PARAM);
            self.parse_name();
            if matches!(self.peek(), SyntaxKind::IDENT | SyntaxKind::STRUCT_KW) {
                self.skip_trivia();
                self.parse_type_expr();
            }
            self.finish_node();
            self.skip_separator();
        }
        self.expect(SyntaxKind::GT);
        self.finish_node();
    }

    /// TypeArgs = '<' TypeExpr (',' TypeExpr)* '>'
    fn parse_type_args(&mut self) {
        self.start_node(SyntaxKind::TYPE_ARGS);
        self.expect(SyntaxKind::LT);
        self.skip_trivia();
        while !self.at_eof() && !self.at(SyntaxKind::GT) && !self.at_body_terminator() {
            let pos_before = self.pos;
            self.parse_type_expr();
            self.skip_separator();
            if self.pos == pos_before {
                self.error_skip_token("expected type argument");
            }
        }
        self.expect(SyntaxKind::GT);
        self.finish_node();
    }

    /// TypeExpr = PrimaryType ('|' PrimaryType)*
    fn parse_type_expr(&mut self) {
        if !self.enter() {
            return;
        }
        let checkpoint = self.builder.checkpoint();
        self.parse_primary_type();
        if self.peek() == SyntaxKind::PIPE {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::UNION_TYPE.into());
            while self.peek() == SyntaxKind::PIPE {
                self.skip_trivia();
                self.bump();
                self.skip_trivia();
                self.parse_primary_type();
            }
            self.finish_node();
        }
        self.leave();
    }

    /// PrimaryType = StructType | EntityRef TypeArgs?
    fn parse_primary_type(&mut self) {
        match self.current_kind() {
            SyntaxKind::STRUCT_KW if !self.at_eof() => self.parse_struct_type(),
            SyntaxKind::IDENT if !self.at_eof() => {
                self.start_node(SyntaxKind::TYPE_INST);
                self.parse_entity_ref();
                if self.peek() == SyntaxKind::LT {
                    self.skip_trivia();
                    self.parse_type_args();
                }
                self.finish_node();
            }
            _ => self.error("expected type expression"),
        }
    }

    /// StructType = 'struct' '{' StructField* '}'
    fn parse_struct_type(&mut self) {
        self.start_node(SyntaxKind::STRUCT_TYPE);
        self.expect(SyntaxKind::STRUCT_KW);
        self.skip_trivia();
        if self.expect(SyntaxKind::L_BRACE) {
            self.skip_trivia();
            while !self.at_eof() && !self.at_body_terminator() {
                if self.at(SyntaxKind::IDENT) {
                    self.start_node(SyntaxKind::STRUCT_FIELD);
                    self.parse_name();
                    self.skip_trivia();
                    self.parse_type_expr();
                    self.finish_node();
                } else {
                    self.error_skip_token("expected struct field");
                }
                self.skip_separator();
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// EntityRef = IDENT ('.' IDENT)?
    fn parse_entity_ref(&mut self) {
        self.start_node(SyntaxKind::ENTITY_REF);
        self.expect(SyntaxKind::IDENT);
        if self.at(SyntaxKind::DOT) {
            self.bump();
            self.expect(SyntaxKind::IDENT);
        }
        self.finish_node();
    }

    /// InPorts | OutPorts = '(' Port* ')'
    fn parse_port_list(&mut self, kind: SyntaxKind) {
        self.start_node(kind);
        if self.expect(SyntaxKind::L_PAREN) {
            self.skip_trivia();
            while !self.at_eof() && !self.at(SyntaxKind::R_PAREN) && !self.at_body_terminator() {
                if self.at(SyntaxKind::IDENT) || self.at(SyntaxKind::L_BRACKET) {
                    self.parse_port();
                } else {
                    self.error_skip_token(format!(
                        "expected port, found {}",
                        self.current_kind().describe()
                    ));
                }
                self.skip_separator();
            }
            self.expect(SyntaxKind::R_PAREN);
        }
        self.finish_node();
    }

    /// Port = ('[' Name ']' | Name) TypeExpr
    fn parse_port(&mut self) {
        self.start_node(SyntaxKind::PORT);
        if self.eat(SyntaxKind::L_BRACKET) {
            self.parse_name();
            self.skip_trivia();
            self.expect(SyntaxKind::R_BRACKET);
        } else {
            self.parse_name();
        }
        self.skip_trivia();
        self.parse_type_expr();
        self.finish_node();
    }

    /// ComponentBody = '{' (NodesBlock | NetBlock)* '}'
    fn parse_component_body(&mut self) {
        self.start_node(SyntaxKind::COMPONENT_BODY);
        self.expect(SyntaxKind::L_BRACE);
        self.skip_trivia();
        while !self.at_eof() && !self.at_body_terminator() {
            match self.current_kind() {
                SyntaxKind::NODES_KW => self.parse_nodes_block(),
                SyntaxKind::NET_KW => self.parse_net_block(),
                _ => self.error_recover(
                    format!(
                        "expected 'nodes' or 'net', found {}",
                        self.current_kind().describe()
                    ),
                    &[SyntaxKind::NODES_KW, SyntaxKind::NET_KW, SyntaxKind::R_BRACE],
                ),
            }
            self.skip_trivia();
        }
        self.expect(SyntaxKind::R_BRACE);
        self.finish_node();
    }

    /// NodesBlock = 'nodes' '{' Node* '}'
    fn parse_nodes_block(&mut self) {
        self.start_node(SyntaxKind::NODES_BLOCK);
        self.expect(SyntaxKind::NODES_KW);
        self.skip_trivia();
        if self.expect(SyntaxKind::L_BRACE) {
            self.parse_node_list();
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    fn parse_node_list(&mut self) {
        self.skip_trivia();
        while !self.at_eof() && !self.at_body_terminator() {
            if self.at(SyntaxKind::IDENT) || self.at(SyntaxKind::HASH) {
                self.parse_node();
            } else {
                self.error_skip_token(format!(
                    "expected node declaration, found {}",
                    self.current_kind().describe()
                ));
            }
            self.skip_separator();
        }
    }

    /// Node = Directive* Name EntityRef TypeArgs? NodeDeps?
    fn parse_node(&mut self) {
        self.start_node(SyntaxKind::NODE);
        self.parse_directives();
        self.parse_name();
        self.skip_trivia();
        if self.at(SyntaxKind::IDENT) {
            self.parse_entity_ref();
            if self.peek() == SyntaxKind::LT {
                self.skip_trivia();
                self.parse_type_args();
            }
            if self.peek() == SyntaxKind::L_BRACE {
                self.skip_trivia();
                self.start_node(SyntaxKind::NODE_DEPS);
                self.bump();
                if self.enter() {
                    self.parse_node_list();
                    self.leave();
                }
                self.expect(SyntaxKind::R_BRACE);
                self.finish_node();
            }
        } else {
            self.error("expected node entity reference");
        }
        self.finish_node();
    }

    /// NetBlock = 'net' '{' Connection* '}'
    fn parse_net_block(&mut self) {
        self.start_node(SyntaxKind::NET_BLOCK);
        self.expect(SyntaxKind::NET_KW);
        self.skip_trivia();
        if self.expect(SyntaxKind::L_BRACE) {
            self.skip_trivia();
            while !self.at_eof() && !self.at_body_terminator() {
                if self.at_any(&[SyntaxKind::IDENT, SyntaxKind::COLON, SyntaxKind::DOLLAR]) {
                    self.parse_connection();
                } else {
                    self.error_skip_token(format!(
                        "expected connection, found {}",
                        self.current_kind().describe()
                    ));
                }
                self.skip_separator();
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// Connection = Sender '->' Receiver
    fn parse_connection(&mut self) {
        self.start_node(SyntaxKind::CONNECTION);
        self.start_node(SyntaxKind::SENDER);
        if self.at(SyntaxKind::DOLLAR) {
            self.start_node(SyntaxKind::CONST_REF);
            self.bump();
            self.parse_entity_ref();
            self.finish_node();
        } else {
            self.parse_port_addr();
        }
        self.finish_node();
        self.skip_trivia();
        if self.expect(SyntaxKind::ARROW) {
            self.skip_trivia();
            self.parse_receiver();
        }
        self.finish_node();
    }

    /// Receiver = '[' PortAddr (',' PortAddr)* ']' | Connection | PortAddr
    fn parse_receiver(&mut self) {
        self.start_node(SyntaxKind::RECEIVER);
        if self.eat(SyntaxKind::L_BRACKET) {
            self.skip_trivia();
            while !self.at_eof() && !self.at(SyntaxKind::R_BRACKET) && !self.at_body_terminator()
            {
                let pos_before = self.pos;
                self.parse_port_addr();
                self.skip_separator();
                if self.pos == pos_before {
                    self.error_skip_token("expected port address");
                }
            }
            self.expect(SyntaxKind::R_BRACKET);
        } else if self.port_addr_len().is_some_and(|len| self.nth(len) == SyntaxKind::ARROW) {
            if self.enter() {
                self.parse_connection();
                self.leave();
            }
        } else {
            self.parse_port_addr();
        }
        self.finish_node();
    }

    /// Number of significant tokens of the port address at the cursor.
    fn port_addr_len(&self) -> Option<usize> {
        let mut n = 0;
        if self.nth(n) == SyntaxKind::IDENT {
            n += 1;
        }
        if self.nth(n) != SyntaxKind::COLON || self.nth(n + 1) != SyntaxKind::IDENT {
            return None;
        }
        n += 2;
        if self.nth(n) == SyntaxKind::L_BRACKET
            && self.nth(n + 1) == SyntaxKind::INTEGER
            && self.nth(n + 2) == SyntaxKind::R_BRACKET
        {
            n += 3;
        }
        Some(n)
    }

    /// PortAddr = IDENT? ':' IDENT ('[' INTEGER ']')?
    fn parse_port_addr(&mut self) {
        self.start_node(SyntaxKind::PORT_ADDR);
        self.eat(SyntaxKind::IDENT);
        if self.expect(SyntaxKind::COLON) {
            self.expect(SyntaxKind::IDENT);
            if self.at(SyntaxKind::L_BRACKET) {
                self.bump();
                self.expect(SyntaxKind::INTEGER);
                self.expect(SyntaxKind::R_BRACKET);
            }
        }
        self.finish_node();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of(parse: &Parse, kind: SyntaxKind) -> usize {
        parse
            .syntax()
            .descendants()
            .filter(|n| n.kind() == kind)
            .count()
    }

    #[test]
    fn test_parse_empty() {
        let parse = parse("");
        assert!(parse.ok());
        assert_eq!(parse.syntax().kind(), SyntaxKind::SOURCE_FILE);
    }

    #[test]
    fn test_parse_is_lossless() {
        let source = "component Main(start any) (stop any) {\n  nodes { p Printer }\n}\n";
        let parse = parse(source);
        assert_eq!(parse.syntax().text().to_string(), source);
    }

    #[test]
    fn test_parse_imports() {
        let parse = parse("import { io\n lib/strings as str, github.com/x/y }");
        assert!(parse.ok(), "errors: {:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::IMPORT), 3);
    }

    #[test]
    fn test_parse_type_defs() {
        let parse = parse(
            "type int\ntype Num int | float\npub type Pair<T> struct { first T, second T }",
        );
        assert!(parse.ok(), "errors: {:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::TYPE_DEF), 3);
        assert_eq!(kinds_of(&parse, SyntaxKind::UNION_TYPE), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::STRUCT_FIELD), 2);
    }

    #[test]
    fn test_parse_consts() {
        let parse = parse("const a int = -1\nconst b str = 'x'\nconst c bool = true\nconst d int = a");
        assert!(parse.ok(), "errors: {:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::CONST_VALUE), 4);
    }

    #[test]
    fn test_parse_interface() {
        let parse = parse("pub interface IReader<T>(sig any) (data T, err error)");
        assert!(parse.ok(), "errors: {:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::PORT), 3);
    }

    #[test]
    fn test_parse_bodyless_component_with_directive() {
        let parse = parse("#extern(print)\npub component Printer<T>([data] T) (sig T)");
        assert!(parse.ok(), "errors: {:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::DIRECTIVE), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::COMPONENT_BODY), 0);
    }

    #[test]
    fn test_parse_component_with_nodes_and_net() {
        let source = r#"
            component Main(start any) (stop any) {
                nodes {
                    printer Printer<str>
                    #bind(greeting)
                    handler Handler { log io.Printer<int> }
                }
                net {
                    :start -> printer:data
                    $greeting -> [printer:data, handler:in]
                    printer:sig -> handler:in -> :stop
                    handler:out[0] -> :stop
                }
            }
        "#;
        let parse = parse(source);
        assert!(parse.ok(), "errors: {:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::NODE), 3);
        assert_eq!(kinds_of(&parse, SyntaxKind::NODE_DEPS), 1);
        // the chained connection nests a second CONNECTION
        assert_eq!(kinds_of(&parse, SyntaxKind::CONNECTION), 5);
    }

    #[test]
    fn test_missing_brace_does_not_swallow_next_component() {
        let source = "component A() () {\n nodes { x X }\n\ncomponent B() ()";
        let parse = parse(source);
        assert!(!parse.ok());
        assert_eq!(kinds_of(&parse, SyntaxKind::COMPONENT_DEF), 2);
    }

    #[test]
    fn test_top_level_garbage_is_error() {
        let parse = parse("42 component A() ()");
        assert_eq!(parse.errors.len(), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::COMPONENT_DEF), 1);
    }

    #[test]
    fn test_error_at_eof_points_to_end() {
        let source = "component A() (";
        let parse = parse(source);
        assert!(!parse.ok());
        let last = parse.errors.last().map(|e| e.range);
        assert_eq!(last, Some(TextRange::empty(TextSize::of(source))));
    }

    fn nested_nodes(depth: usize) -> String {
        let mut source = String::from("component M() () { nodes { ");
        for level in 0..depth {
            source.push_str(&format!("n{level} X {{ "));
        }
        source.push_str("leaf X");
        for _ in 0..depth {
            source.push_str(" }");
        }
        source.push_str(" } }");
        source
    }

    #[test]
    fn test_nesting_at_limit_parses() {
        let parse = parse(&nested_nodes(MAX_NESTING));
        assert!(parse.ok(), "errors: {:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::NODE), MAX_NESTING + 1);
    }

    #[test]
    fn test_deep_nesting_is_cut_off() {
        let source = nested_nodes(20_000);
        let parse = parse(&source);
        assert_eq!(parse.errors.len(), 1);
        assert!(parse.errors[0].message.contains("nesting"));
        // the node whose deps go over the limit is kept, its deps are not
        assert_eq!(kinds_of(&parse, SyntaxKind::NODE), MAX_NESTING + 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::COMPONENT_DEF), 1);
        assert_eq!(parse.syntax().text().to_string(), source);
    }

    #[test]
    fn test_long_connection_chain_is_cut_off() {
        let mut source = String::from("component M() () { net { :a");
        for i in 0..5_000 {
            source.push_str(&format!(" -> n{i}:x"));
        }
        source.push_str(" } }");
        let parse = parse(&source);
        assert_eq!(parse.errors.len(), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::COMPONENT_DEF), 1);
    }

    #[test]
    fn test_parse_with_cancel() {
        let cancel = CancellationToken::new();
        assert!(parse_with_cancel("component A() ()", &cancel).is_some());
        cancel.cancel();
        assert!(parse_with_cancel("component A() ()", &cancel).is_none());
    }
}
