//! Functions, arrow functions, methods and their parameter lists

use rustc_hash::FxHashSet;

use super::parse_expr::continues_expression;
use super::scope::{BindingKind, ScopeFlags};
use super::{is_strict_reserved_word, Context, Mark, Parser};
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    /// `function` (already consumed) in statement position.
    ///
    /// `hanging` functions (the body of an `if` or a label under Annex B)
    /// bind no name in the enclosing scope.
    pub(crate) fn parse_function_declaration(
        &mut self,
        ctx: Context,
        start: Mark,
        is_async: bool,
        hanging: bool,
        id_optional: bool,
    ) -> Result<FunctionDeclaration, ParseError> {
        let is_generator = self.match_token(&TokenKind::Star)?;

        let id = if id_optional && !self.check_identifier() {
            None
        } else {
            Some(self.parse_binding_identifier(ctx)?)
        };
        if let (Some(id), false) = (&id, hanging) {
            let kind = self.function_binding_kind(ctx, is_async, is_generator);
            self.declare_name(ctx, id, kind)?;
        }

        let inner = ctx.enter_function(is_async, is_generator);
        let function = self.parse_function_rest(inner, start, id, is_async, is_generator, false)?;
        Ok(FunctionDeclaration { function })
    }

    fn function_binding_kind(&self, ctx: Context, is_async: bool, is_generator: bool) -> BindingKind {
        let as_var = self.scopes.treat_functions_as_var();
        if ctx.is_strict() || is_async || is_generator {
            if as_var {
                BindingKind::Var
            } else {
                BindingKind::Lexical
            }
        } else if self.options.web_compat() || as_var {
            BindingKind::Function
        } else {
            BindingKind::Lexical
        }
    }

    /// `function` (already consumed) in expression position. The name is
    /// bound only inside the function, so it is validated with the
    /// function's own yield/await parameters.
    pub(crate) fn parse_function_expression(
        &mut self,
        ctx: Context,
        start: Mark,
        is_async: bool,
    ) -> Result<FunctionExpression, ParseError> {
        let is_generator = self.match_token(&TokenKind::Star)?;
        let inner = ctx.enter_function(is_async, is_generator);
        let id = if self.check_identifier() {
            Some(self.parse_binding_identifier(inner)?)
        } else {
            None
        };
        let function = self.parse_function_rest(inner, start, id, is_async, is_generator, false)?;
        Ok(FunctionExpression { function })
    }

    /// Object or class method starting at its parameter list
    pub(crate) fn parse_method(
        &mut self,
        ctx: Context,
        is_async: bool,
        is_generator: bool,
        allow_super_call: bool,
    ) -> Result<FunctionExpression, ParseError> {
        let start = self.mark();
        let inner = (ctx.enter_function(is_async, is_generator) | Context::SUPER_PROPERTY)
            .and(Context::SUPER_CALL, allow_super_call);
        let function = self.parse_function_rest(inner, start, None, is_async, is_generator, true)?;
        Ok(FunctionExpression { function })
    }

    /// Parameters and body, in a fresh function scope
    fn parse_function_rest(
        &mut self,
        inner: Context,
        start: Mark,
        id: Option<Identifier>,
        is_async: bool,
        is_generator: bool,
        is_method: bool,
    ) -> Result<Function, ParseError> {
        let saved_positions = (
            self.yield_pos.take(),
            self.await_pos.take(),
            self.await_ident_pos.take(),
        );
        let saved_labels = std::mem::take(&mut self.labels);
        self.scopes.enter(ScopeFlags::FUNCTION);

        self.require_token(&TokenKind::LParen)?;
        let params = self.parse_formal_parameters(inner)?;
        self.check_yield_await_in_params()?;
        let body = self.parse_function_body(inner, start.offset, &params, id.as_ref(), is_method)?;

        self.scopes.exit();
        self.labels = saved_labels;
        (self.yield_pos, self.await_pos, self.await_ident_pos) = saved_positions;

        Ok(Function {
            id,
            params,
            body,
            generator: is_generator,
            is_async,
            span: self.span_from(start),
        })
    }

    /// FormalParameters after `(`, through the closing `)`
    fn parse_formal_parameters(&mut self, ctx: Context) -> Result<Vec<Pattern>, ParseError> {
        let mut params = Vec::new();
        while !self.match_token(&TokenKind::RParen)? {
            if self.check(&TokenKind::DotDotDot) {
                params.push(self.parse_binding_rest(ctx)?);
                if self.check(&TokenKind::Comma) {
                    return Err(self.error("Comma is not permitted after the rest element"));
                }
                self.require_token(&TokenKind::RParen)?;
                break;
            }
            params.push(self.parse_binding_element(ctx)?);
            if !self.check(&TokenKind::RParen) {
                self.require_token(&TokenKind::Comma)?;
            }
        }
        Ok(params)
    }

    /// `{ directives statements }` of a function or arrow.
    ///
    /// A "use strict" directive makes the parameters strict too, so they
    /// are validated here rather than as they are parsed.
    fn parse_function_body(
        &mut self,
        inner: Context,
        function_start: usize,
        params: &[Pattern],
        id: Option<&Identifier>,
        no_duplicates: bool,
    ) -> Result<BlockStatement, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::LBrace)?;

        let simple = params.iter().all(|p| matches!(p, Pattern::Identifier(_)));
        let mut ctx = inner;
        if !ctx.is_strict() && self.has_use_strict_directive() {
            if !simple {
                return Err(self.early_error_at(
                    function_start,
                    "Illegal 'use strict' directive in function with non-simple parameter list",
                ));
            }
            ctx |= Context::STRICT;
        }

        let allow_duplicates = !ctx.is_strict() && !no_duplicates && simple;
        self.check_params(ctx, params, allow_duplicates)?;
        if let (Some(id), true) = (id, ctx.is_strict()) {
            self.check_strict_binding(id)?;
        }

        let body = self.parse_directives_and_statements(ctx, false)?;
        self.require_token(&TokenKind::RBrace)?;
        Ok(BlockStatement {
            body,
            span: self.span_from(start),
        })
    }

    /// Validate and declare every parameter name in the function scope
    fn check_params(&mut self, ctx: Context, params: &[Pattern], allow_duplicates: bool) -> Result<(), ParseError> {
        let mut seen = FxHashSet::default();
        for param in params {
            for id in param.bound_names() {
                if ctx.is_strict() {
                    self.check_strict_binding(id)?;
                }
                if !seen.insert(id.name.as_str()) && !allow_duplicates {
                    return Err(self.early_error_at(id.span.start, "Argument name clash"));
                }
                self.declare_name(ctx, id, BindingKind::Var)?;
            }
        }
        Ok(())
    }

    fn check_strict_binding(&self, id: &Identifier) -> Result<(), ParseError> {
        let name = id.name.as_str();
        if is_strict_reserved_word(name) || name == "eval" || name == "arguments" {
            return Err(self.early_error_at(
                id.span.start,
                format!("Binding '{}' in strict mode", name),
            ));
        }
        Ok(())
    }

    /// `yield` and `await` expressions may not appear in parameter defaults
    pub(crate) fn check_yield_await_in_params(&self) -> Result<(), ParseError> {
        if let Some(yield_at) = self.yield_pos {
            if self.await_pos.map_or(true, |await_at| yield_at < await_at) {
                return Err(self.early_error_at(yield_at, "Yield expression cannot be a default value"));
            }
        }
        if let Some(await_at) = self.await_pos {
            return Err(self.early_error_at(await_at, "Await expression cannot be a default value"));
        }
        Ok(())
    }

    pub(crate) fn check_accessor_params(&self, is_getter: bool, function: &Function) -> Result<(), ParseError> {
        let at = function.span.start;
        if is_getter {
            if !function.params.is_empty() {
                return Err(self.early_error_at(at, "Getter must not have any formal parameters"));
            }
            return Ok(());
        }
        match function.params.as_slice() {
            [Pattern::Rest(_)] => Err(self.early_error_at(at, "Setter cannot use rest params")),
            [_] => Ok(()),
            _ => Err(self.early_error_at(at, "Setter must have exactly one formal parameter")),
        }
    }

    // ============ ARROWS ============

    /// Body of an arrow function whose `=>` was just consumed
    pub(crate) fn parse_arrow_body(
        &mut self,
        ctx: Context,
        start: Mark,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<ArrowFunctionExpression, ParseError> {
        let inner = ctx.enter_arrow(is_async);
        let saved_positions = (
            self.yield_pos.take(),
            self.await_pos.take(),
            self.await_ident_pos.take(),
        );
        self.scopes.enter(ScopeFlags::FUNCTION);

        let (body, expression) = if self.check(&TokenKind::LBrace) {
            let saved_labels = std::mem::take(&mut self.labels);
            let block = self.parse_function_body(inner, start.offset, &params, None, true)?;
            self.labels = saved_labels;
            (ArrowFunctionBody::Block(block), false)
        } else {
            self.check_params(inner, &params, false)?;
            // a concise body keeps the [In] parameter of its context
            let body_ctx = inner.and(Context::DISALLOW_IN, !ctx.has_in());
            let expr = self.parse_assignment_expression(body_ctx)?;
            (ArrowFunctionBody::Expression(Box::new(expr)), true)
        };

        self.scopes.exit();
        (self.yield_pos, self.await_pos, self.await_ident_pos) = saved_positions;

        Ok(ArrowFunctionExpression {
            params,
            body,
            expression,
            is_async,
            generator: false,
            span: self.span_from(start),
        })
    }

    // ============ DIRECTIVES ============

    /// Look ahead from the current token over a directive prologue for a
    /// "use strict" directive, without consuming anything.
    ///
    /// Strictness must be known before the prologue itself is parsed: a
    /// legacy octal escape in an earlier directive is already an error.
    pub(crate) fn has_use_strict_directive(&mut self) -> bool {
        let checkpoint = self.lexer.checkpoint();
        let found = self.scan_directive_prologue();
        self.lexer.restore(checkpoint);
        // a lexical error here is reported when the prologue is parsed
        found.unwrap_or(false)
    }

    fn scan_directive_prologue(&mut self) -> Result<bool, ParseError> {
        let mut token = self.current.clone();
        loop {
            if !matches!(token.kind, TokenKind::String(_)) {
                return Ok(false);
            }
            let raw = token.text(self.source);
            let is_use_strict = raw == "'use strict'" || raw == "\"use strict\"";

            let next = self.lexer.next_token()?;
            let complete = matches!(
                next.kind,
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
            ) || (next.newline_before && !continues_expression(&next.kind));
            if !complete {
                return Ok(false);
            }
            if is_use_strict {
                return Ok(true);
            }
            token = if next.kind == TokenKind::Semicolon {
                self.lexer.next_token()?
            } else {
                next
            };
        }
    }
}
