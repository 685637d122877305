//! Parser for ECMAScript source code
//!
//! Uses recursive descent with precedence climbing for binary operators.
//! Grammar parameters ([In], [Yield], [Await], strictness, ...) travel as a
//! [`Context`] value argument; cover grammar bookkeeping travels as a
//! `&mut CoverGrammar`. The implementation is split by concern:
//!
//! - `parse_stmt`: statements, declarations, directive prologues
//! - `parse_for`: the `for` / `for-in` / `for-of` head
//! - `parse_expr`: expressions
//! - `parse_pattern`: binding patterns and expression-to-pattern conversion
//! - `parse_function`: functions, arrows, parameters
//! - `parse_class`: class bodies and private names
//! - `parse_module`: `import` / `export`

mod context;
mod parse_class;
mod parse_expr;
mod parse_for;
mod parse_function;
mod parse_module;
mod parse_pattern;
mod parse_stmt;
mod scope;

use log::debug;
use rustc_hash::FxHashSet;

use crate::ast::*;
use crate::error::{ErrorLocation, ParseError};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::options::Options;

pub(crate) use context::{Context, StatementContext};
use parse_class::PrivateNameScope;
use scope::ScopeStack;

/// Start of a node under construction
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    offset: usize,
    position: Position,
}

impl Mark {
    /// Mark the start of an already built node
    fn of(span: &Span) -> Self {
        Mark {
            offset: span.start,
            position: span.loc.map(|loc| loc.start).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelKind {
    Loop,
    Other,
}

#[derive(Debug, Clone)]
struct Label {
    name: String,
    kind: LabelKind,
    /// Offset of the labelled statement's body
    statement_start: usize,
}

/// Parser for ECMAScript source code
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    source: &'a str,
    options: Options,
    current: Token,
    previous: Token,
    scopes: ScopeStack,
    labels: Vec<Label>,
    private_names: Vec<PrivateNameScope>,
    exported_names: FxHashSet<String>,
    /// Start of the expression that may turn out to be arrow parameters
    potential_arrow_at: Option<usize>,
    /// First `yield` expression in the current parameter window
    yield_pos: Option<usize>,
    /// First `await` expression in the current parameter window
    await_pos: Option<usize>,
    /// First `await` used as an identifier in the current parameter window
    await_ident_pos: Option<usize>,
    /// Start of the left side of a `for await (` head
    for_await_init_at: Option<usize>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, options: Options) -> Self {
        let html_comments = !options.module && options.web_compat();
        Self {
            lexer: Lexer::new(source).with_html_comments(html_comments),
            source,
            options,
            current: empty_token(),
            previous: empty_token(),
            scopes: ScopeStack::new(options.module, options.web_compat()),
            labels: Vec::new(),
            private_names: Vec::new(),
            exported_names: FxHashSet::default(),
            potential_arrow_at: None,
            yield_pos: None,
            await_pos: None,
            await_ident_pos: None,
            for_await_init_at: None,
        }
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let source_type = if self.options.module {
            SourceType::Module
        } else {
            SourceType::Script
        };
        debug!("parsing {:?} ({} bytes)", source_type, self.source.len());

        self.current = self.lexer.next_token()?;

        let mut ctx = Context::empty();
        if self.options.module {
            ctx |= Context::MODULE | Context::STRICT | Context::AWAIT;
        }
        if self.options.implied_strict {
            ctx |= Context::STRICT;
        }
        if self.options.global_return && !self.options.module {
            ctx |= Context::RETURN;
        }
        if !ctx.is_strict() && self.has_use_strict_directive() {
            ctx |= Context::STRICT;
        }

        let body = self.parse_directives_and_statements(ctx, true)?;

        if let Some((name, offset)) = self.scopes.first_undefined_export() {
            let message = format!("Export '{}' is not defined", name);
            return Err(self.early_error_at(offset, message));
        }

        let end = self.current.loc.end;
        let span = self.make_span(0, Position { line: 1, column: 0 }, self.source.len(), end);
        debug!("parsed {} top-level statements", body.len());

        Ok(Program {
            body,
            source_type,
            span,
        })
    }

    // ============ TOKEN CURSOR ============

    fn advance(&mut self) -> Result<(), ParseError> {
        let next = self.lexer.next_token()?;
        self.previous = std::mem::replace(&mut self.current, next);
        Ok(())
    }

    fn require_token(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.unexpected_token())
        }
    }

    fn match_token(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn check_identifier(&self) -> bool {
        matches!(self.current.kind, TokenKind::Identifier(_))
    }

    /// An unescaped contextual keyword such as `of`, `async` or `let`
    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(s) if s == keyword) && !self.current.escaped
    }

    fn match_keyword(&mut self, keyword: &str) -> Result<bool, ParseError> {
        if self.check_keyword(keyword) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// The token after the current one, without consuming anything
    fn peek(&mut self) -> Result<Token, ParseError> {
        let checkpoint = self.lexer.checkpoint();
        let next = self.lexer.next_token();
        self.lexer.restore(checkpoint);
        next
    }

    /// ASI is possible before the current token
    fn can_insert_semicolon(&self) -> bool {
        self.is_at_end() || self.check(&TokenKind::RBrace) || self.current.newline_before
    }

    fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        if self.match_token(&TokenKind::Semicolon)? {
            return Ok(());
        }
        if self.can_insert_semicolon() {
            return Ok(());
        }
        Err(self.unexpected_token())
    }

    /// Reinterpret the current `/` or `/=` as a regular expression literal
    fn rescan_regexp(&mut self) -> Result<(), ParseError> {
        log::trace!("rescan '/' at {} as regexp", self.current.start);
        self.current = self.lexer.rescan_as_regexp(&self.current)?;
        Ok(())
    }

    /// Reinterpret the current `}` as the continuation of a template
    fn rescan_template_continuation(&mut self) -> Result<(), ParseError> {
        log::trace!("rescan '}}' at {} as template continuation", self.current.start);
        self.current = self.lexer.rescan_template_continuation(&self.current)?;
        Ok(())
    }

    // ============ SPANS ============

    fn mark(&self) -> Mark {
        Mark {
            offset: self.current.start,
            position: self.current.loc.start,
        }
    }

    fn make_span(&self, start: usize, start_pos: Position, end: usize, end_pos: Position) -> Span {
        Span {
            start,
            end,
            range: self.options.ranges.then_some([start, end]),
            loc: self.options.loc.then_some(SourceLocation {
                start: start_pos,
                end: end_pos,
            }),
        }
    }

    /// Span from `start` to the end of the last consumed token
    fn span_from(&self, start: Mark) -> Span {
        self.make_span(
            start.offset,
            start.position,
            self.previous.end,
            self.previous.loc.end,
        )
    }

    fn token_span(&self, token: &Token) -> Span {
        self.make_span(token.start, token.loc.start, token.end, token.loc.end)
    }

    // ============ ERRORS ============

    /// Line and UTF-16 column of a byte offset
    fn location_at(&self, offset: usize) -> ErrorLocation {
        let mut line = 1;
        let mut column = 0;
        let mut chars = self.source.char_indices().peekable();
        while let Some((pos, ch)) = chars.next() {
            if pos >= offset {
                break;
            }
            match ch {
                '\n' | '\u{2028}' | '\u{2029}' => {
                    line += 1;
                    column = 0;
                }
                '\r' => {
                    if !matches!(chars.peek(), Some((_, '\n'))) {
                        line += 1;
                        column = 0;
                    }
                }
                _ => column += ch.len_utf16() as u32,
            }
        }
        ErrorLocation {
            offset,
            line,
            column,
        }
    }

    fn token_location(token: &Token) -> ErrorLocation {
        ErrorLocation {
            offset: token.start,
            line: token.loc.start.line,
            column: token.loc.start.column,
        }
    }

    /// Syntax error at the current token
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(message, Self::token_location(&self.current))
    }

    fn syntax_error_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::syntax(message, self.location_at(offset))
    }

    fn early_error_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::early(message, self.location_at(offset))
    }

    fn unexpected_token(&self) -> ParseError {
        if self.is_at_end() {
            self.error("Unexpected end of input")
        } else {
            self.error(format!("Unexpected token '{}'", self.current.kind.describe()))
        }
    }

    // ============ IDENTIFIERS ============

    /// Validate `name` used as an identifier reference or binding in `ctx`
    fn check_identifier_name(
        &mut self,
        ctx: Context,
        name: &str,
        offset: usize,
        is_binding: bool,
    ) -> Result<(), ParseError> {
        if ctx.has_yield() && name == "yield" {
            return Err(self.early_error_at(
                offset,
                "Cannot use 'yield' as identifier inside a generator",
            ));
        }
        if name == "await" {
            if ctx.has_await() || ctx.is_module() {
                return Err(self.early_error_at(offset, await_identifier_message(ctx)));
            }
            if ctx.contains(Context::STATIC_BLOCK) {
                return Err(self.early_error_at(
                    offset,
                    "Cannot use 'await' as identifier in class static initialization block",
                ));
            }
            self.await_ident_pos.get_or_insert(offset);
        }
        if name == "arguments" && ctx.intersects(Context::CLASS_FIELD | Context::STATIC_BLOCK) {
            return Err(self.early_error_at(
                offset,
                "Cannot use 'arguments' in class field initializer",
            ));
        }
        if crate::lexer::is_reserved_word(name) {
            return Err(self.syntax_error_at(
                offset,
                format!("Keyword '{}' must not contain escaped characters", name),
            ));
        }
        if ctx.is_strict() {
            if is_strict_reserved_word(name) {
                return Err(self.early_error_at(
                    offset,
                    format!("Unexpected strict mode reserved word '{}'", name),
                ));
            }
            if is_binding && (name == "eval" || name == "arguments") {
                return Err(self.early_error_at(
                    offset,
                    format!("Binding '{}' in strict mode", name),
                ));
            }
        }
        Ok(())
    }

    /// Parse an identifier reference
    fn parse_identifier(&mut self, ctx: Context) -> Result<Identifier, ParseError> {
        let TokenKind::Identifier(name) = &self.current.kind else {
            return Err(self.unexpected_token());
        };
        let name = name.clone();
        self.check_identifier_name(ctx, &name, self.current.start, false)?;
        let span = self.token_span(&self.current);
        self.advance()?;
        Ok(Identifier { name, span })
    }

    /// Parse a binding identifier; the caller declares it in scope
    fn parse_binding_identifier(&mut self, ctx: Context) -> Result<Identifier, ParseError> {
        let TokenKind::Identifier(name) = &self.current.kind else {
            if let Some(word) = self.current.kind.keyword_str() {
                return Err(self.error(format!("Unexpected keyword '{}'", word)));
            }
            return Err(self.unexpected_token());
        };
        let name = name.clone();
        self.check_identifier_name(ctx, &name, self.current.start, true)?;
        let span = self.token_span(&self.current);
        self.advance()?;
        Ok(Identifier { name, span })
    }

    /// Parse an IdentifierName: identifiers and reserved words alike
    fn parse_identifier_name(&mut self) -> Result<Identifier, ParseError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.clone(),
            kind => match kind.keyword_str() {
                Some(word) => word.to_string(),
                None => return Err(self.unexpected_token()),
            },
        };
        let span = self.token_span(&self.current);
        self.advance()?;
        Ok(Identifier { name, span })
    }

    // ============ LITERALS ============

    /// Build a literal from the current token and consume it
    fn parse_literal(&mut self, ctx: Context) -> Result<Literal, ParseError> {
        let token = self.current.clone();
        if token.legacy_octal && ctx.is_strict() {
            let message = match token.kind {
                TokenKind::String(_) => "Octal escape sequences are not allowed in strict mode",
                _ => "Octal literals are not allowed in strict mode",
            };
            return Err(self.early_error_at(token.start, message));
        }
        let span = self.token_span(&token);
        let raw = self.options.raw.then(|| token.text(self.source).to_string());
        let value = match token.kind {
            TokenKind::Number(n) => LiteralValue::Number(n),
            TokenKind::String(s) => LiteralValue::String(s),
            TokenKind::BigInt(digits) => LiteralValue::BigInt(digits),
            TokenKind::RegExp { pattern, flags } => LiteralValue::RegExp { pattern, flags },
            TokenKind::True => LiteralValue::Boolean(true),
            TokenKind::False => LiteralValue::Boolean(false),
            TokenKind::Null => LiteralValue::Null,
            _ => return Err(self.unexpected_token()),
        };
        self.advance()?;
        Ok(Literal { value, raw, span })
    }

    fn parse_string_literal(&mut self, ctx: Context) -> Result<Literal, ParseError> {
        if !matches!(self.current.kind, TokenKind::String(_)) {
            return Err(self.unexpected_token());
        }
        self.parse_literal(ctx)
    }
}

/// Words reserved only in strict mode code
/// Message for `await` used as an identifier where it is reserved
pub(crate) fn await_identifier_message(ctx: Context) -> &'static str {
    if ctx.is_module() {
        "Cannot use 'await' as identifier in module code"
    } else {
        "Cannot use 'await' as identifier inside an async function"
    }
}

fn is_strict_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "implements"
            | "interface"
            | "let"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "static"
            | "yield"
    )
}

fn empty_token() -> Token {
    Token {
        kind: TokenKind::Eof,
        start: 0,
        end: 0,
        loc: SourceLocation {
            start: Position { line: 1, column: 0 },
            end: Position { line: 1, column: 0 },
        },
        newline_before: false,
        escaped: false,
        legacy_octal: false,
    }
}
