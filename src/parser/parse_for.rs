//! `for`, `for-in`, `for-of` and `for await`.
//!
//! The head is parsed once. A declaration keyword commits to parsing
//! declarators; anything else is parsed as an expression with `in`
//! excluded. The token after the first part (`;`, `in` or `of`) then
//! decides the statement kind, and an expression head is reinterpreted
//! as an assignment pattern when it turns out to be the loop target.

use log::trace;

use super::parse_pattern::CoverGrammar;
use super::scope::ScopeFlags;
use super::{Context, Mark, Parser, StatementContext};
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::TokenKind;

/// The first part of a `for` head, before the kind of loop is known
enum ForHead {
    Declaration(VariableDeclaration),
    Expression {
        expr: Expression,
        cover: CoverGrammar,
        starts_with_let: bool,
        /// An unescaped, unparenthesized `async` identifier
        is_async: bool,
    },
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_for_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        self.advance()?;

        let await_at = if ctx.has_await() && self.check_keyword("await") {
            let offset = self.current.start;
            self.advance()?;
            Some(offset)
        } else {
            None
        };
        self.require_token(&TokenKind::LParen)?;
        self.scopes.enter(ScopeFlags::empty());

        let statement = self.parse_for_rest(ctx, start, await_at);
        self.scopes.exit();
        statement
    }

    fn parse_for_rest(&mut self, ctx: Context, start: Mark, await_at: Option<usize>) -> Result<Statement, ParseError> {
        if self.check(&TokenKind::Semicolon) {
            if let Some(offset) = await_at {
                return Err(self.syntax_error_at(offset, "Unexpected token 'await'"));
            }
            return self.parse_for_loop(ctx, start, None);
        }

        let head = self.parse_for_head(ctx, await_at.is_some())?;
        let is_of = self.check_keyword("of");
        if !is_of && !self.check(&TokenKind::In) {
            if let Some(offset) = await_at {
                return Err(self.syntax_error_at(offset, "Unexpected token 'await'"));
            }
            let init = match head {
                ForHead::Declaration(declaration) => ForInit::Variable(declaration),
                ForHead::Expression { expr, cover, .. } => {
                    self.check_expression_errors(&cover)?;
                    ForInit::Expression(expr)
                }
            };
            return self.parse_for_loop(ctx, start, Some(init));
        }

        if let Some(offset) = await_at {
            if !is_of {
                return Err(self.syntax_error_at(offset, "Unexpected token 'await'"));
            }
        }
        trace!("for head at {} commits to for-{}", start.offset, if is_of { "of" } else { "in" });

        let left = match head {
            ForHead::Declaration(declaration) => {
                self.check_for_in_of_declaration(ctx, &declaration, is_of)?;
                ForInOfLeft::Variable(declaration)
            }
            ForHead::Expression {
                expr,
                cover,
                starts_with_let,
                is_async,
            } => {
                if is_of && await_at.is_none() && is_async {
                    return Err(self.syntax_error_at(
                        expr.span().start,
                        "The left-hand side of a for-of loop may not be 'async'",
                    ));
                }
                if is_of && starts_with_let {
                    return Err(self.syntax_error_at(
                        expr.span().start,
                        "The left-hand side of a for-of loop may not start with let",
                    ));
                }
                ForInOfLeft::Pattern(self.to_assignment_target(ctx, expr, Some(&cover))?)
            }
        };

        self.advance()?;
        let right = if is_of {
            self.parse_assignment_expression(ctx.allow_in())?
        } else {
            self.parse_expression(ctx.allow_in())?
        };
        self.require_token(&TokenKind::RParen)?;
        let body = Box::new(self.parse_loop_body(ctx)?);

        let span = self.span_from(start);
        Ok(if is_of {
            Statement::ForOf(ForOfStatement {
                left,
                right,
                body,
                is_await: await_at.is_some(),
                span,
            })
        } else {
            Statement::ForIn(ForInStatement { left, right, body, span })
        })
    }

    /// Declarators or an expression, up to the token that decides the loop
    fn parse_for_head(&mut self, ctx: Context, is_await: bool) -> Result<ForHead, ParseError> {
        let start = self.mark();
        let kind = if self.check(&TokenKind::Var) {
            Some(VariableKind::Var)
        } else if self.check(&TokenKind::Const) {
            Some(VariableKind::Const)
        } else if self.is_let_declaration(StatementContext::StatementList)? {
            Some(VariableKind::Let)
        } else {
            None
        };
        if let Some(kind) = kind {
            self.advance()?;
            let declaration = self.parse_variable_declarations(ctx, start, kind, true)?;
            return Ok(ForHead::Declaration(declaration));
        }

        let starts_with_let = self.check_keyword("let");
        let is_async_word = self.check_keyword("async");
        let head_ctx = ctx.disallow_in();
        let mut cover = CoverGrammar::default();

        let expr = if is_await {
            self.for_await_init_at = Some(start.offset);
            let expr = self.parse_expr_subscripts(head_ctx, &mut cover);
            self.for_await_init_at = None;
            expr?
        } else {
            self.parse_expression_covered(head_ctx, &mut cover)?
        };

        let is_async = is_async_word
            && matches!(&expr, Expression::Identifier(id) if id.span.start == start.offset);
        Ok(ForHead::Expression {
            expr,
            cover,
            starts_with_let,
            is_async,
        })
    }

    /// A `for-in`/`for-of` head declares exactly one binding and, apart
    /// from the web-compatible `for (var x = 0 in o)`, no initializer
    fn check_for_in_of_declaration(
        &self,
        ctx: Context,
        declaration: &VariableDeclaration,
        is_of: bool,
    ) -> Result<(), ParseError> {
        let loop_kind = if is_of { "for-of" } else { "for-in" };
        let [declarator] = declaration.declarations.as_slice() else {
            return Err(self.syntax_error_at(
                declaration.span.start,
                format!("Invalid left-hand side in {} loop: Must have a single binding", loop_kind),
            ));
        };
        if declarator.init.is_none() {
            return Ok(());
        }
        let legacy_var_init = !is_of
            && !ctx.is_strict()
            && self.options.web_compat()
            && declaration.kind == VariableKind::Var
            && matches!(declarator.id, Pattern::Identifier(_));
        if legacy_var_init {
            return Ok(());
        }
        Err(self.syntax_error_at(
            declaration.span.start,
            format!("{} loop variable declaration may not have an initializer", loop_kind),
        ))
    }

    /// `; test ; update )` and the body of a C-style loop
    fn parse_for_loop(&mut self, ctx: Context, start: Mark, init: Option<ForInit>) -> Result<Statement, ParseError> {
        self.require_token(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(ctx.allow_in())?)
        };
        self.require_token(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression(ctx.allow_in())?)
        };
        self.require_token(&TokenKind::RParen)?;
        let body = Box::new(self.parse_loop_body(ctx)?);

        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_loop_body(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        self.parse_statement((ctx | Context::ITERATION).allow_in(), StatementContext::Single)
    }
}
