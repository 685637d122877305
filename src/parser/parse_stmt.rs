//! Statements, declarations and directive prologues

use log::trace;

use super::scope::{BindingKind, ScopeFlags};
use super::{Context, Label, LabelKind, Mark, Parser, StatementContext};
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    /// A program or function body: a directive prologue followed by
    /// statements. Function bodies stop at (without consuming) `}`.
    pub(crate) fn parse_directives_and_statements(
        &mut self,
        ctx: Context,
        top_level: bool,
    ) -> Result<Vec<Statement>, ParseError> {
        let mut body = Vec::new();
        let mut in_prologue = true;

        loop {
            if top_level {
                if self.is_at_end() {
                    break;
                }
            } else if self.check(&TokenKind::RBrace) {
                break;
            } else if self.is_at_end() {
                return Err(self.unexpected_token());
            }

            let (token_start, token_end) = (self.current.start, self.current.end);
            let mut statement = if top_level && ctx.is_module() {
                self.parse_module_item(ctx)?
            } else {
                self.parse_statement_list_item(ctx)?
            };

            if in_prologue {
                in_prologue = self.mark_directive(&mut statement, token_start, token_end);
            }
            body.push(statement);
        }
        Ok(body)
    }

    /// Set `directive` on a prologue statement. Returns whether the
    /// statement was a directive, i.e. whether the prologue continues.
    fn mark_directive(&self, statement: &mut Statement, token_start: usize, token_end: usize) -> bool {
        let Statement::Expression(stmt) = statement else {
            return false;
        };
        let Expression::Literal(Literal {
            value: LiteralValue::String(_),
            span,
            ..
        }) = &stmt.expression
        else {
            return false;
        };
        // `("a")` and `"a" + b` are plain expression statements
        if span.start != token_start || span.end != token_end {
            return false;
        }
        let raw = self
            .source
            .get(token_start + 1..token_end.saturating_sub(1))
            .unwrap_or_default();
        stmt.directive = Some(raw.to_string());
        true
    }

    /// Statements up to (not including) the closing `}` of a block
    pub(crate) fn parse_statement_list(&mut self, ctx: Context) -> Result<Vec<Statement>, ParseError> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.unexpected_token());
            }
            body.push(self.parse_statement_list_item(ctx)?);
        }
        Ok(body)
    }

    /// A statement or a declaration
    pub(crate) fn parse_statement_list_item(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        self.parse_statement(ctx, StatementContext::StatementList)
    }

    /// Any statement; `stmt_ctx` decides which declarations may appear
    pub(crate) fn parse_statement(
        &mut self,
        ctx: Context,
        stmt_ctx: StatementContext,
    ) -> Result<Statement, ParseError> {
        let start = self.mark();

        if self.is_let_declaration(stmt_ctx)? {
            if !stmt_ctx.is_statement_list() {
                return Err(self.error("Lexical declaration cannot appear in a single-statement context"));
            }
            let declaration = self.parse_variable_statement(ctx, VariableKind::Let)?;
            return Ok(Statement::VariableDeclaration(declaration));
        }
        if self.is_async_function()? {
            if !stmt_ctx.is_statement_list() {
                return Err(self.error(
                    "Async functions can only be declared at the top level or inside a block",
                ));
            }
            self.advance()?;
            self.advance()?;
            let function = self.parse_function_declaration(ctx, start, true, false, false)?;
            return Ok(Statement::FunctionDeclaration(function));
        }

        match self.current.kind {
            TokenKind::Function => self.parse_function_statement(ctx, stmt_ctx, start),
            TokenKind::Class => {
                if !stmt_ctx.is_statement_list() {
                    return Err(self.unexpected_token());
                }
                Ok(Statement::ClassDeclaration(self.parse_class_declaration(ctx, false)?))
            }
            TokenKind::Var => {
                let declaration = self.parse_variable_statement(ctx, VariableKind::Var)?;
                Ok(Statement::VariableDeclaration(declaration))
            }
            TokenKind::Const => {
                if !stmt_ctx.is_statement_list() {
                    return Err(self.error("Lexical declaration cannot appear in a single-statement context"));
                }
                let declaration = self.parse_variable_statement(ctx, VariableKind::Const)?;
                Ok(Statement::VariableDeclaration(declaration))
            }
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block(ctx, true)?)),
            TokenKind::If => self.parse_if_statement(ctx),
            TokenKind::For => self.parse_for_statement(ctx),
            TokenKind::While => self.parse_while_statement(ctx),
            TokenKind::Do => self.parse_do_while_statement(ctx),
            TokenKind::Switch => self.parse_switch_statement(ctx),
            TokenKind::Try => self.parse_try_statement(ctx),
            TokenKind::Return => self.parse_return_statement(ctx),
            TokenKind::Break | TokenKind::Continue => self.parse_break_continue(ctx),
            TokenKind::Throw => self.parse_throw_statement(ctx),
            TokenKind::With => self.parse_with_statement(ctx),
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(Statement::Empty(EmptyStatement {
                    span: self.span_from(start),
                }))
            }
            TokenKind::Debugger => {
                self.advance()?;
                self.expect_semicolon()?;
                Ok(Statement::Debugger(DebuggerStatement {
                    span: self.span_from(start),
                }))
            }
            TokenKind::Export => Err(self.misplaced_module_item()),
            TokenKind::Import => {
                let next = self.peek()?;
                if matches!(next.kind, TokenKind::LParen | TokenKind::Dot) {
                    self.parse_expression_statement(ctx, stmt_ctx)
                } else {
                    Err(self.misplaced_module_item())
                }
            }
            _ => self.parse_expression_statement(ctx, stmt_ctx),
        }
    }

    fn misplaced_module_item(&self) -> ParseError {
        if self.options.module {
            self.error("'import' and 'export' may only appear at the top level")
        } else {
            self.error("'import' and 'export' may appear only with 'sourceType: module'")
        }
    }

    /// `let` starts a declaration rather than an identifier expression.
    ///
    /// `let [` is always a declaration; in single statement positions
    /// nothing else is.
    pub(crate) fn is_let_declaration(&mut self, stmt_ctx: StatementContext) -> Result<bool, ParseError> {
        if !self.check_keyword("let") {
            return Ok(false);
        }
        let next = self.peek()?;
        Ok(match next.kind {
            TokenKind::LBracket => true,
            _ if !stmt_ctx.is_statement_list() => false,
            TokenKind::LBrace | TokenKind::Identifier(_) => true,
            TokenKind::In | TokenKind::Instanceof => false,
            ref kind => kind.keyword_str().is_some(),
        })
    }

    /// `async function` with no line break between the words
    pub(crate) fn is_async_function(&mut self) -> Result<bool, ParseError> {
        if !self.check_keyword("async") {
            return Ok(false);
        }
        let next = self.peek()?;
        Ok(next.kind == TokenKind::Function && !next.newline_before)
    }

    fn parse_function_statement(
        &mut self,
        ctx: Context,
        stmt_ctx: StatementContext,
        start: Mark,
    ) -> Result<Statement, ParseError> {
        let hanging = match stmt_ctx {
            StatementContext::StatementList => false,
            StatementContext::If | StatementContext::Label { allow_function: true }
                if !ctx.is_strict() && self.options.web_compat() =>
            {
                true
            }
            _ if ctx.is_strict() => {
                return Err(self.error(
                    "In strict mode code, functions can only be declared at top level or inside a block",
                ));
            }
            _ => {
                return Err(self.error("Function declarations are not allowed in this position"));
            }
        };
        self.advance()?;
        if hanging && self.check(&TokenKind::Star) {
            return Err(self.error("Generators can only be declared at the top level or inside a block"));
        }
        let function = self.parse_function_declaration(ctx, start, false, hanging, false)?;
        Ok(Statement::FunctionDeclaration(function))
    }

    // ============ VARIABLES ============

    fn parse_variable_statement(&mut self, ctx: Context, kind: VariableKind) -> Result<VariableDeclaration, ParseError> {
        let start = self.mark();
        self.advance()?;
        let mut declaration = self.parse_variable_declarations(ctx, start, kind, false)?;
        self.expect_semicolon()?;
        declaration.span = self.span_from(start);
        Ok(declaration)
    }

    /// Declarator list after `var`/`let`/`const`. Inside a `for` head the
    /// initializers exclude `in`, and a missing initializer is left for
    /// the head to judge when `in` or `of` follows.
    pub(crate) fn parse_variable_declarations(
        &mut self,
        ctx: Context,
        start: Mark,
        kind: VariableKind,
        in_for: bool,
    ) -> Result<VariableDeclaration, ParseError> {
        let binding = match kind {
            VariableKind::Var => BindingKind::Var,
            VariableKind::Let | VariableKind::Const => BindingKind::Lexical,
        };
        let init_ctx = ctx.and(Context::DISALLOW_IN, in_for);

        let mut declarations = Vec::new();
        loop {
            let declarator_start = self.mark();
            let id = self.parse_binding_target(ctx)?;
            if binding == BindingKind::Lexical {
                if let Some(let_id) = id.bound_names().into_iter().find(|id| id.name == "let") {
                    return Err(self.early_error_at(
                        let_id.span.start,
                        "let is disallowed as a lexically bound name",
                    ));
                }
            }
            self.declare_pattern(ctx, &id, binding)?;

            let head_follows = in_for && (self.check(&TokenKind::In) || self.check_keyword("of"));
            let init = if self.match_token(&TokenKind::Eq)? {
                Some(self.parse_assignment_expression(init_ctx)?)
            } else if kind == VariableKind::Const && !head_follows {
                return Err(self.error("Missing initializer in const declaration"));
            } else if !matches!(id, Pattern::Identifier(_)) && !head_follows {
                return Err(self.error("Complex binding patterns require an initialization value"));
            } else {
                None
            };

            declarations.push(VariableDeclarator {
                id,
                init,
                span: self.span_from(declarator_start),
            });
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        Ok(VariableDeclaration {
            declarations,
            kind,
            span: self.span_from(start),
        })
    }

    // ============ BLOCKS ============

    /// `{ statements }`; `new_scope` is false when the block shares the
    /// scope of a catch parameter
    pub(crate) fn parse_block(&mut self, ctx: Context, new_scope: bool) -> Result<BlockStatement, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::LBrace)?;
        if new_scope {
            self.scopes.enter(ScopeFlags::empty());
        }
        let body = self.parse_statement_list(ctx)?;
        self.require_token(&TokenKind::RBrace)?;
        if new_scope {
            self.scopes.exit();
        }
        Ok(BlockStatement {
            body,
            span: self.span_from(start),
        })
    }

    // ============ CONTROL FLOW ============

    /// `( Expression )` after `if`, `while`, `switch` and `with`
    fn parse_paren_expression(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        self.require_token(&TokenKind::LParen)?;
        let expr = self.parse_expression(ctx.allow_in())?;
        self.require_token(&TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_if_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        self.advance()?;
        let test = self.parse_paren_expression(ctx)?;
        let consequent = Box::new(self.parse_statement(ctx, StatementContext::If)?);
        let alternate = if self.match_token(&TokenKind::Else)? {
            Some(Box::new(self.parse_statement(ctx, StatementContext::If)?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        }))
    }

    fn parse_while_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        self.advance()?;
        let test = self.parse_paren_expression(ctx)?;
        let body = Box::new(self.parse_statement(ctx | Context::ITERATION, StatementContext::Single)?);
        Ok(Statement::While(WhileStatement {
            test,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_do_while_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        self.advance()?;
        let body = Box::new(self.parse_statement(ctx | Context::ITERATION, StatementContext::Single)?);
        self.require_token(&TokenKind::While)?;
        let test = self.parse_paren_expression(ctx)?;
        // the semicolon after `do ... while (x)` is always optional
        self.match_token(&TokenKind::Semicolon)?;
        Ok(Statement::DoWhile(DoWhileStatement {
            body,
            test,
            span: self.span_from(start),
        }))
    }

    fn parse_switch_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        self.advance()?;
        let discriminant = self.parse_paren_expression(ctx)?;
        self.require_token(&TokenKind::LBrace)?;
        self.scopes.enter(ScopeFlags::empty());

        let case_ctx = ctx | Context::SWITCH;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.check(&TokenKind::RBrace) {
            let case_start = self.mark();
            let test = if self.match_token(&TokenKind::Case)? {
                Some(self.parse_expression(ctx.allow_in())?)
            } else if self.check(&TokenKind::Default) {
                if seen_default {
                    return Err(self.error("Multiple default clauses"));
                }
                seen_default = true;
                self.advance()?;
                None
            } else {
                return Err(self.unexpected_token());
            };
            self.require_token(&TokenKind::Colon)?;

            let mut consequent = Vec::new();
            while !matches!(
                self.current.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                consequent.push(self.parse_statement_list_item(case_ctx)?);
            }
            cases.push(SwitchCase {
                test,
                consequent,
                span: self.span_from(case_start),
            });
        }

        self.require_token(&TokenKind::RBrace)?;
        self.scopes.exit();
        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
            span: self.span_from(start),
        }))
    }

    fn parse_try_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        self.advance()?;
        let block = self.parse_block(ctx, true)?;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.mark();
            self.advance()?;
            let param = if self.match_token(&TokenKind::LParen)? {
                let param = self.parse_binding_target(ctx)?;
                let simple = matches!(param, Pattern::Identifier(_));
                self.scopes.enter(if simple { ScopeFlags::SIMPLE_CATCH } else { ScopeFlags::empty() });
                let kind = if simple { BindingKind::SimpleCatch } else { BindingKind::Lexical };
                self.declare_pattern(ctx, &param, kind)?;
                self.require_token(&TokenKind::RParen)?;
                Some(param)
            } else {
                self.scopes.enter(ScopeFlags::empty());
                None
            };
            let body = self.parse_block(ctx, false)?;
            self.scopes.exit();
            Some(CatchClause {
                param,
                body,
                span: self.span_from(catch_start),
            })
        } else {
            None
        };

        let finalizer = if self.match_token(&TokenKind::Finally)? {
            Some(self.parse_block(ctx, true)?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
            span: self.span_from(start),
        }))
    }

    fn parse_return_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        if !ctx.contains(Context::RETURN) {
            return Err(self.error("Illegal return statement"));
        }
        self.advance()?;
        let argument = if self.check(&TokenKind::Semicolon) || self.can_insert_semicolon() {
            None
        } else {
            Some(self.parse_expression(ctx.allow_in())?)
        };
        self.expect_semicolon()?;
        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_break_continue(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        let is_break = self.check(&TokenKind::Break);
        self.advance()?;

        let label = if self.check_identifier() && !self.current.newline_before {
            Some(self.parse_identifier(ctx)?)
        } else {
            None
        };
        self.expect_semicolon()?;

        match &label {
            None if is_break && !ctx.intersects(Context::ITERATION | Context::SWITCH) => {
                return Err(self.syntax_error_at(start.offset, "Illegal break statement"));
            }
            None if !is_break && !ctx.contains(Context::ITERATION) => {
                return Err(self.syntax_error_at(
                    start.offset,
                    "Illegal continue statement: no surrounding iteration statement",
                ));
            }
            None => {}
            Some(id) => match self.labels.iter().rev().find(|l| l.name == id.name) {
                None => {
                    return Err(self.syntax_error_at(id.span.start, format!("Undefined label '{}'", id.name)));
                }
                Some(target) if !is_break && target.kind != LabelKind::Loop => {
                    return Err(self.syntax_error_at(
                        id.span.start,
                        format!(
                            "Illegal continue statement: '{}' does not denote an iteration statement",
                            id.name
                        ),
                    ));
                }
                Some(_) => {}
            },
        }

        let span = self.span_from(start);
        Ok(if is_break {
            Statement::Break(BreakStatement { label, span })
        } else {
            Statement::Continue(ContinueStatement { label, span })
        })
    }

    fn parse_throw_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        self.advance()?;
        if self.current.newline_before {
            return Err(self.syntax_error_at(self.previous.end, "Illegal newline after throw"));
        }
        let argument = self.parse_expression(ctx.allow_in())?;
        self.expect_semicolon()?;
        Ok(Statement::Throw(ThrowStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_with_statement(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        if ctx.is_strict() {
            return Err(self.early_error_at(start.offset, "Strict mode code may not include a with statement"));
        }
        self.advance()?;
        let object = self.parse_paren_expression(ctx)?;
        let body = Box::new(self.parse_statement(ctx, StatementContext::Single)?);
        Ok(Statement::With(WithStatement {
            object,
            body,
            span: self.span_from(start),
        }))
    }

    // ============ EXPRESSIONS AND LABELS ============

    fn parse_expression_statement(&mut self, ctx: Context, stmt_ctx: StatementContext) -> Result<Statement, ParseError> {
        let start = self.mark();
        let starts_with_identifier = self.check_identifier();
        let expression = self.parse_expression(ctx.allow_in())?;

        match expression {
            Expression::Identifier(label) if starts_with_identifier && self.check(&TokenKind::Colon) => {
                self.advance()?;
                self.parse_labeled_statement(ctx, stmt_ctx, start, label)
            }
            expression => {
                self.expect_semicolon()?;
                Ok(Statement::Expression(ExpressionStatement {
                    expression,
                    directive: None,
                    span: self.span_from(start),
                }))
            }
        }
    }

    /// The body of `label:`, with the colon consumed
    fn parse_labeled_statement(
        &mut self,
        ctx: Context,
        stmt_ctx: StatementContext,
        start: Mark,
        label: Identifier,
    ) -> Result<Statement, ParseError> {
        if self.labels.iter().any(|l| l.name == label.name) {
            return Err(self.early_error_at(
                label.span.start,
                format!("Label '{}' is already declared", label.name),
            ));
        }
        let kind = match self.current.kind {
            TokenKind::For | TokenKind::While | TokenKind::Do => LabelKind::Loop,
            _ => LabelKind::Other,
        };
        // `a: b: while (x)` makes both labels loop labels
        for enclosing in self.labels.iter_mut().rev() {
            if enclosing.statement_start != start.offset {
                break;
            }
            enclosing.statement_start = self.current.start;
            enclosing.kind = kind;
        }
        trace!("label '{}' ({:?})", label.name, kind);
        self.labels.push(Label {
            name: label.name.clone(),
            kind,
            statement_start: self.current.start,
        });

        let allow_function = matches!(
            stmt_ctx,
            StatementContext::StatementList | StatementContext::Label { allow_function: true }
        );
        let body = self.parse_statement(ctx, StatementContext::Label { allow_function });
        self.labels.pop();

        Ok(Statement::Labeled(LabeledStatement {
            label,
            body: Box::new(body?),
            span: self.span_from(start),
        }))
    }
}
