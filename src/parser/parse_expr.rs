//! Expression parsing
//!
//! Precedence levels, loosest first: sequence, assignment/yield/arrow,
//! conditional, binary operators (precedence climbing), unary, postfix,
//! call/member subscripts, primary atoms.

use super::parse_pattern::CoverGrammar;
use super::{Context, Mark, Parser};
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{TemplatePart, Token, TokenKind};

/// Precedence of `&&`; the right operand of `??` is parsed just above it
/// so that `a ?? b && c` is left for the mixing check
const AND_PRECEDENCE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

impl<'a> Parser<'a> {
    // ============ SEQUENCE AND ASSIGNMENT ============

    /// Expression[In]: a comma separated sequence
    pub(crate) fn parse_expression(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let mut cover = CoverGrammar::default();
        let expr = self.parse_expression_covered(ctx, &mut cover)?;
        self.check_expression_errors(&cover)?;
        Ok(expr)
    }

    /// Sequence expression whose cover grammar errors are left to the caller
    pub(crate) fn parse_expression_covered(
        &mut self,
        ctx: Context,
        cover: &mut CoverGrammar,
    ) -> Result<Expression, ParseError> {
        let start = self.mark();
        let first = self.parse_maybe_assign(ctx, cover)?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.match_token(&TokenKind::Comma)? {
            expressions.push(self.parse_maybe_assign(ctx, cover)?);
        }
        Ok(Expression::Sequence(SequenceExpression {
            expressions,
            span: self.span_from(start),
        }))
    }

    /// AssignmentExpression in a position that is never a pattern
    pub(crate) fn parse_assignment_expression(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let mut cover = CoverGrammar::default();
        let expr = self.parse_maybe_assign(ctx, &mut cover)?;
        self.check_expression_errors(&cover)?;
        Ok(expr)
    }

    /// AssignmentExpression that may still be reinterpreted as a pattern
    pub(crate) fn parse_maybe_assign(
        &mut self,
        ctx: Context,
        cover: &mut CoverGrammar,
    ) -> Result<Expression, ParseError> {
        if ctx.has_yield() && self.check_keyword("yield") {
            return self.parse_yield(ctx);
        }

        let old_paren_assign = cover.parenthesized_assign.take();
        let old_trailing_comma = cover.trailing_comma.take();
        let old_double_proto = cover.double_proto.take();

        let start = self.mark();
        if self.check(&TokenKind::LParen) || self.check_identifier() {
            self.potential_arrow_at = Some(self.current.start);
        }
        let left = self.parse_conditional(ctx, cover)?;

        let Some(operator) = assignment_operator(&self.current.kind) else {
            if old_paren_assign.is_some() {
                cover.parenthesized_assign = old_paren_assign;
            }
            if old_trailing_comma.is_some() {
                cover.trailing_comma = old_trailing_comma;
            }
            if old_double_proto.is_some() {
                cover.double_proto = old_double_proto;
            }
            return Ok(left);
        };

        let left_start = left.span().start;
        let target = if operator == AssignmentOp::Assign {
            self.to_assignment_target(ctx, left, Some(&*cover))?
        } else {
            self.check_simple_target(ctx, &left)?;
            match left {
                Expression::Identifier(id) => Pattern::Identifier(id),
                Expression::Member(member) => Pattern::Member(member),
                other => {
                    return Err(self.early_error_at(other.span().start, "Invalid left-hand side in assignment"));
                }
            }
        };

        // The left side was a pattern after all
        cover.parenthesized_assign = None;
        cover.trailing_comma = None;
        cover.double_proto = None;
        if cover.shorthand_assign.is_some_and(|offset| offset >= left_start) {
            cover.shorthand_assign = None;
        }

        self.advance()?;
        let right = self.parse_assignment_expression(ctx)?;
        if old_double_proto.is_some() {
            cover.double_proto = old_double_proto;
        }

        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            left: Box::new(target),
            right: Box::new(right),
            span: self.span_from(start),
        }))
    }

    fn parse_yield(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.mark();
        self.yield_pos.get_or_insert(start.offset);
        self.advance()?;

        let has_argument = !self.check(&TokenKind::Semicolon)
            && !self.can_insert_semicolon()
            && (self.check(&TokenKind::Star) || self.current.kind.starts_expression());
        let (argument, delegate) = if has_argument {
            let delegate = self.match_token(&TokenKind::Star)?;
            let argument = self.parse_assignment_expression(ctx)?;
            (Some(Box::new(argument)), delegate)
        } else {
            (None, false)
        };

        Ok(Expression::Yield(YieldExpression {
            argument,
            delegate,
            span: self.span_from(start),
        }))
    }

    // ============ CONDITIONAL AND BINARY ============

    fn parse_conditional(&mut self, ctx: Context, cover: &mut CoverGrammar) -> Result<Expression, ParseError> {
        let start = self.mark();
        let test = self.parse_binary_expression(ctx, cover)?;
        if blocks_operators(cover) || is_bare_arrow(&test, start) {
            return Ok(test);
        }
        if !self.match_token(&TokenKind::Question)? {
            return Ok(test);
        }

        let consequent = self.parse_assignment_expression(ctx.allow_in())?;
        self.require_token(&TokenKind::Colon)?;
        let alternate = self.parse_assignment_expression(ctx)?;

        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: self.span_from(start),
        }))
    }

    fn parse_binary_expression(
        &mut self,
        ctx: Context,
        cover: &mut CoverGrammar,
    ) -> Result<Expression, ParseError> {
        let start = self.mark();
        let left = self.parse_unary(ctx, cover)?;
        if blocks_operators(cover) || is_bare_arrow(&left, start) {
            return Ok(left);
        }
        self.parse_binary_operators(ctx, left, start, 0)
    }

    /// Precedence climbing over the operators following `left`
    fn parse_binary_operators(
        &mut self,
        ctx: Context,
        mut left: Expression,
        start: Mark,
        min_precedence: u8,
    ) -> Result<Expression, ParseError> {
        loop {
            let Some((operator, precedence)) = binary_operator(&self.current.kind) else {
                return Ok(left);
            };
            if operator == Operator::Binary(BinaryOp::In) && !ctx.has_in() {
                return Ok(left);
            }
            if precedence <= min_precedence {
                return Ok(left);
            }
            self.advance()?;

            let is_coalesce = operator == Operator::Logical(LogicalOp::NullishCoalescing);
            let is_logical = matches!(operator, Operator::Logical(LogicalOp::And | LogicalOp::Or));
            let right_precedence = if is_coalesce { AND_PRECEDENCE } else { precedence };

            let right_start = self.mark();
            let operand = self.parse_unary_operand(ctx)?;
            let right = self.parse_binary_operators(ctx, operand, right_start, right_precedence)?;

            if let Expression::PrivateIdentifier(private) = &right {
                return Err(self.syntax_error_at(
                    private.span.start,
                    "Private identifier can only be left side of binary expression",
                ));
            }
            let span = self.span_from(start);
            left = match operator {
                Operator::Binary(operator) => Expression::Binary(BinaryExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                }),
                Operator::Logical(operator) => Expression::Logical(LogicalExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                }),
            };

            let next_is_coalesce = self.check(&TokenKind::QuestionQuestion);
            let next_is_logical = self.check(&TokenKind::AmpAmp) || self.check(&TokenKind::PipePipe);
            if (is_logical && next_is_coalesce) || (is_coalesce && next_is_logical) {
                return Err(self.error(
                    "Logical expressions and coalesce expressions cannot be mixed. Wrap either by parentheses",
                ));
            }
        }
    }

    // ============ UNARY AND POSTFIX ============

    pub(crate) fn parse_unary(&mut self, ctx: Context, cover: &mut CoverGrammar) -> Result<Expression, ParseError> {
        self.parse_unary_inner(ctx, cover, false, false)
    }

    /// Operand of a prefix or binary operator; never a pattern
    fn parse_unary_operand(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let mut cover = CoverGrammar::default();
        let expr = self.parse_unary(ctx, &mut cover)?;
        self.check_expression_errors(&cover)?;
        Ok(expr)
    }

    /// `saw_unary`: a unary operator applies to this operand, so `**` may
    /// not follow it. `inc_dec`: the operand of a prefix `++`/`--`, which
    /// binds tighter than `**`.
    fn parse_unary_inner(
        &mut self,
        ctx: Context,
        cover: &mut CoverGrammar,
        saw_unary: bool,
        inc_dec: bool,
    ) -> Result<Expression, ParseError> {
        let start = self.mark();
        let mut saw_unary = saw_unary;

        let expr = if ctx.has_await() && self.check_keyword("await") {
            saw_unary = true;
            self.parse_await(ctx)?
        } else if let Some(operator) = unary_operator(&self.current.kind) {
            self.advance()?;
            let mut inner = CoverGrammar::default();
            let argument = self.parse_unary_inner(ctx, &mut inner, true, false)?;
            self.check_expression_errors(&inner)?;
            if operator == UnaryOp::Delete {
                self.check_delete_operand(ctx, start, &argument)?;
            }
            saw_unary = true;
            Expression::Unary(UnaryExpression {
                operator,
                prefix: true,
                argument: Box::new(argument),
                span: self.span_from(start),
            })
        } else if let Some(operator) = update_operator(&self.current.kind) {
            self.advance()?;
            let mut inner = CoverGrammar::default();
            let argument = self.parse_unary_inner(ctx, &mut inner, true, true)?;
            self.check_expression_errors(&inner)?;
            self.check_simple_target(ctx, &argument)?;
            Expression::Update(UpdateExpression {
                operator,
                prefix: true,
                argument: Box::new(argument),
                span: self.span_from(start),
            })
        } else if !saw_unary && matches!(self.current.kind, TokenKind::PrivateName(_)) {
            // `#x in obj`
            if !ctx.has_in() || self.private_names.is_empty() {
                return Err(self.unexpected_token());
            }
            let private = self.parse_private_identifier()?;
            if !self.check(&TokenKind::In) {
                return Err(self.unexpected_token());
            }
            return Ok(private);
        } else {
            let mut expr = self.parse_expr_subscripts(ctx, cover)?;
            if blocks_operators(cover) {
                return Ok(expr);
            }
            while let Some(operator) = update_operator(&self.current.kind) {
                if self.can_insert_semicolon() {
                    break;
                }
                self.check_simple_target(ctx, &expr)?;
                self.advance()?;
                expr = Expression::Update(UpdateExpression {
                    operator,
                    prefix: false,
                    argument: Box::new(expr),
                    span: self.span_from(start),
                });
            }
            expr
        };

        if inc_dec || !self.check(&TokenKind::StarStar) {
            return Ok(expr);
        }
        if saw_unary {
            return Err(self.error(
                "Unary operator used immediately before exponentiation expression. \
                 Parenthesis must be used to disambiguate operator precedence",
            ));
        }
        self.advance()?;
        let right = self.parse_unary_operand(ctx)?;
        Ok(Expression::Binary(BinaryExpression {
            operator: BinaryOp::Exp,
            left: Box::new(expr),
            right: Box::new(right),
            span: self.span_from(start),
        }))
    }

    fn parse_await(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.mark();
        self.await_pos.get_or_insert(start.offset);
        self.advance()?;
        let mut cover = CoverGrammar::default();
        let argument = self.parse_unary_inner(ctx, &mut cover, true, false)?;
        self.check_expression_errors(&cover)?;
        Ok(Expression::Await(AwaitExpression {
            argument: Box::new(argument),
            span: self.span_from(start),
        }))
    }

    fn check_delete_operand(&self, ctx: Context, start: Mark, argument: &Expression) -> Result<(), ParseError> {
        if ctx.is_strict() && matches!(argument, Expression::Identifier(_)) {
            return Err(self.early_error_at(start.offset, "Deleting local variable in strict mode"));
        }
        let member = match argument {
            Expression::Member(member) => Some(member),
            Expression::Chain(chain) => match chain.expression.as_ref() {
                Expression::Member(member) => Some(member),
                _ => None,
            },
            _ => None,
        };
        if member.is_some_and(|m| matches!(m.property.as_ref(), Expression::PrivateIdentifier(_))) {
            return Err(self.early_error_at(start.offset, "Private fields can not be deleted"));
        }
        Ok(())
    }

    // ============ CALLS AND MEMBERS ============

    pub(crate) fn parse_expr_subscripts(&mut self, ctx: Context, cover: &mut CoverGrammar) -> Result<Expression, ParseError> {
        let start = self.mark();
        let atom = self.parse_atom(ctx, cover, false)?;
        if matches!(atom, Expression::ArrowFunction(_)) && self.previous.kind != TokenKind::RParen {
            return Ok(atom);
        }
        let result = self.parse_subscripts(ctx, atom, start, false)?;

        // `(a).b = c` and `[(a.b)] = c` are fine
        if let Expression::Member(member) = &result {
            let member_start = member.span.start;
            for slot in [
                &mut cover.parenthesized_assign,
                &mut cover.parenthesized_bind,
                &mut cover.trailing_comma,
            ] {
                if slot.is_some_and(|offset| offset >= member_start) {
                    *slot = None;
                }
            }
        }
        Ok(result)
    }

    /// Member accesses, calls, optional chains and tagged templates after
    /// `base`. With `no_calls` (the callee of `new`) argument lists end
    /// the chain.
    fn parse_subscripts(
        &mut self,
        ctx: Context,
        mut base: Expression,
        start: Mark,
        no_calls: bool,
    ) -> Result<Expression, ParseError> {
        let mut maybe_async_arrow = !no_calls
            && matches!(&base, Expression::Identifier(id) if id.name == "async")
            && base.span().end - base.span().start == 5
            && self.previous.end == base.span().end
            && !self.can_insert_semicolon()
            && self.potential_arrow_at == Some(base.span().start);
        let mut optional_chained = false;

        loop {
            let optional = self.match_token(&TokenKind::QuestionDot)?;
            if optional {
                if no_calls {
                    return Err(self.syntax_error_at(
                        self.previous.start,
                        "Optional chaining cannot appear in the callee of new expressions",
                    ));
                }
                optional_chained = true;
            }

            let computed = self.match_token(&TokenKind::LBracket)?;
            let is_member = computed
                || (optional && !self.check(&TokenKind::LParen) && !self.is_template_start())
                || self.match_token(&TokenKind::Dot)?;

            if is_member {
                let property = if computed {
                    let property = self.parse_expression(ctx.allow_in())?;
                    self.require_token(&TokenKind::RBracket)?;
                    property
                } else if matches!(self.current.kind, TokenKind::PrivateName(_))
                    && !matches!(base, Expression::Super(_))
                {
                    self.parse_private_identifier()?
                } else {
                    Expression::Identifier(self.parse_identifier_name()?)
                };
                base = Expression::Member(MemberExpression {
                    object: Box::new(base),
                    property: Box::new(property),
                    computed,
                    optional,
                    span: self.span_from(start),
                });
            } else if !no_calls && self.check(&TokenKind::LParen) {
                let saved = (
                    self.yield_pos.take(),
                    self.await_pos.take(),
                    self.await_ident_pos.take(),
                );
                self.advance()?;
                let mut args_cover = CoverGrammar::default();
                let arguments = self.parse_call_arguments(ctx, &mut args_cover)?;

                if maybe_async_arrow && !optional && !self.can_insert_semicolon() && self.check(&TokenKind::Arrow) {
                    self.check_pattern_errors(&args_cover, false)?;
                    self.check_yield_await_in_params()?;
                    if let Some(offset) = self.await_ident_pos {
                        return Err(self.early_error_at(
                            offset,
                            "Cannot use 'await' as identifier inside an async function",
                        ));
                    }
                    (self.yield_pos, self.await_pos, self.await_ident_pos) = saved;
                    self.advance()?;
                    let params = self.to_arrow_params(ctx.enter_arrow(true), arguments)?;
                    let arrow = self.parse_arrow_body(ctx, start, params, true)?;
                    return Ok(Expression::ArrowFunction(arrow));
                }

                self.check_expression_errors(&args_cover)?;
                self.yield_pos = saved.0.or(self.yield_pos);
                self.await_pos = saved.1.or(self.await_pos);
                self.await_ident_pos = saved.2.or(self.await_ident_pos);

                base = Expression::Call(CallExpression {
                    callee: Box::new(base),
                    arguments,
                    optional,
                    span: self.span_from(start),
                });
            } else if self.is_template_start() {
                if optional_chained {
                    return Err(self.error(
                        "Optional chaining cannot appear in the tag of tagged template expressions",
                    ));
                }
                let quasi = self.parse_template(ctx, true)?;
                base = Expression::TaggedTemplate(TaggedTemplateExpression {
                    tag: Box::new(base),
                    quasi,
                    span: self.span_from(start),
                });
            } else {
                break;
            }
            maybe_async_arrow = false;
        }

        if optional_chained {
            return Ok(Expression::Chain(ChainExpression {
                expression: Box::new(base),
                span: self.span_from(start),
            }));
        }
        Ok(base)
    }

    /// Arguments after an already consumed `(`, through the closing `)`
    fn parse_call_arguments(
        &mut self,
        ctx: Context,
        cover: &mut CoverGrammar,
    ) -> Result<Vec<ExpressionOrSpread>, ParseError> {
        let ctx = ctx.allow_in();
        let mut arguments = Vec::new();
        while !self.match_token(&TokenKind::RParen)? {
            if !arguments.is_empty() {
                self.require_token(&TokenKind::Comma)?;
                if self.match_token(&TokenKind::RParen)? {
                    break;
                }
            }
            if self.check(&TokenKind::DotDotDot) {
                let spread = self.parse_spread(ctx, cover)?;
                if self.check(&TokenKind::Comma) && cover.trailing_comma.is_none() {
                    cover.trailing_comma = Some(self.current.start);
                }
                arguments.push(ExpressionOrSpread::Spread(spread));
            } else {
                arguments.push(ExpressionOrSpread::Expression(self.parse_maybe_assign(ctx, cover)?));
            }
        }
        Ok(arguments)
    }

    fn parse_spread(&mut self, ctx: Context, cover: &mut CoverGrammar) -> Result<SpreadElement, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::DotDotDot)?;
        let argument = self.parse_maybe_assign(ctx, cover)?;
        Ok(SpreadElement {
            argument: Box::new(argument),
            span: self.span_from(start),
        })
    }

    fn parse_new(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let start = self.mark();
        let new_token = self.current.clone();
        self.advance()?;

        if self.match_token(&TokenKind::Dot)? {
            let escaped = self.current.escaped;
            let property = self.parse_identifier_name()?;
            if property.name != "target" {
                return Err(self.syntax_error_at(
                    property.span.start,
                    "The only valid meta property for new is 'new.target'",
                ));
            }
            if escaped {
                return Err(self.syntax_error_at(
                    property.span.start,
                    "'new.target' must not contain escaped characters",
                ));
            }
            if !ctx.contains(Context::NEW_TARGET) {
                return Err(self.early_error_at(
                    start.offset,
                    "'new.target' can only be used in functions and class static block",
                ));
            }
            return Ok(Expression::MetaProperty(MetaProperty {
                meta: Identifier {
                    name: "new".to_string(),
                    span: self.token_span(&new_token),
                },
                property,
                span: self.span_from(start),
            }));
        }

        let callee_start = self.mark();
        let mut cover = CoverGrammar::default();
        let atom = self.parse_atom(ctx, &mut cover, true)?;
        self.check_expression_errors(&cover)?;
        let callee = self.parse_subscripts(ctx, atom, callee_start, true)?;

        let arguments = if self.match_token(&TokenKind::LParen)? {
            let mut cover = CoverGrammar::default();
            let arguments = self.parse_call_arguments(ctx, &mut cover)?;
            self.check_expression_errors(&cover)?;
            arguments
        } else {
            Vec::new()
        };

        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
            span: self.span_from(start),
        }))
    }

    // ============ PRIMARY ============

    fn parse_atom(&mut self, ctx: Context, cover: &mut CoverGrammar, for_new: bool) -> Result<Expression, ParseError> {
        let start = self.mark();
        let can_be_arrow = self.potential_arrow_at == Some(self.current.start);

        match self.current.kind {
            TokenKind::Super => self.parse_super(ctx),
            TokenKind::This => {
                let span = self.token_span(&self.current);
                self.advance()?;
                Ok(Expression::This(ThisExpression { span }))
            }
            TokenKind::Identifier(_) => self.parse_identifier_atom(ctx, start, can_be_arrow),
            TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::BigInt(_)
            | TokenKind::RegExp { .. }
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => Ok(Expression::Literal(self.parse_literal(ctx)?)),
            TokenKind::Slash | TokenKind::SlashEq => {
                self.rescan_regexp()?;
                Ok(Expression::Literal(self.parse_literal(ctx)?))
            }
            TokenKind::LParen => {
                let expr = self.parse_paren_and_distinguish(ctx, can_be_arrow)?;
                if cover.parenthesized_assign.is_none()
                    && !matches!(expr, Expression::Identifier(_) | Expression::Member(_))
                {
                    cover.parenthesized_assign = Some(start.offset);
                }
                if cover.parenthesized_bind.is_none() {
                    cover.parenthesized_bind = Some(start.offset);
                }
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array_literal(ctx, cover),
            TokenKind::LBrace => self.parse_object_literal(ctx, cover),
            TokenKind::Function => {
                self.advance()?;
                let function = self.parse_function_expression(ctx, start, false)?;
                Ok(Expression::Function(function))
            }
            TokenKind::Class => Ok(Expression::Class(self.parse_class_expression(ctx)?)),
            TokenKind::New => self.parse_new(ctx),
            TokenKind::TemplateHead(_) | TokenKind::TemplateNoSub(_) => {
                Ok(Expression::Template(self.parse_template(ctx, false)?))
            }
            TokenKind::Import => self.parse_import_expression(ctx, for_new),
            _ => Err(self.unexpected_token()),
        }
    }

    /// An identifier reference, or the start of `x => ..`, `async x => ..`
    /// or `async function`
    fn parse_identifier_atom(&mut self, ctx: Context, start: Mark, can_be_arrow: bool) -> Result<Expression, ParseError> {
        let escaped = self.current.escaped;
        let id = self.parse_identifier(ctx)?;
        let is_async = !escaped && id.name == "async";

        if is_async && !self.can_insert_semicolon() && self.check(&TokenKind::Function) {
            self.advance()?;
            let function = self.parse_function_expression(ctx, start, true)?;
            return Ok(Expression::Function(function));
        }

        if can_be_arrow && !self.can_insert_semicolon() {
            if self.match_token(&TokenKind::Arrow)? {
                let params = vec![Pattern::Identifier(id)];
                let arrow = self.parse_arrow_body(ctx, start, params, false)?;
                return Ok(Expression::ArrowFunction(arrow));
            }
            // `for await (async of x)` iterates over `x`
            let in_for_await_head = self.for_await_init_at == Some(start.offset) && self.check_keyword("of");
            if is_async && self.check_identifier() && !in_for_await_head {
                let param = self.parse_identifier(ctx)?;
                if self.can_insert_semicolon() || !self.check(&TokenKind::Arrow) {
                    return Err(self.unexpected_token());
                }
                self.advance()?;
                let items = vec![ExpressionOrSpread::Expression(Expression::Identifier(param))];
                let params = self.to_arrow_params(ctx.enter_arrow(true), items)?;
                let arrow = self.parse_arrow_body(ctx, start, params, true)?;
                return Ok(Expression::ArrowFunction(arrow));
            }
        }

        Ok(Expression::Identifier(id))
    }

    fn parse_super(&mut self, ctx: Context) -> Result<Expression, ParseError> {
        let token = self.current.clone();
        if !ctx.intersects(Context::SUPER_PROPERTY | Context::SUPER_CALL) {
            return Err(self.early_error_at(token.start, "'super' keyword outside a method"));
        }
        self.advance()?;
        if self.check(&TokenKind::LParen) && !ctx.contains(Context::SUPER_CALL) {
            return Err(self.early_error_at(token.start, "super() call outside constructor of a subclass"));
        }
        if !matches!(
            self.current.kind,
            TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
        ) {
            return Err(self.unexpected_token());
        }
        Ok(Expression::Super(Super {
            span: self.token_span(&token),
        }))
    }

    /// `( ... )`: a parenthesized expression or arrow function parameters
    fn parse_paren_and_distinguish(&mut self, ctx: Context, can_be_arrow: bool) -> Result<Expression, ParseError> {
        let start = self.mark();
        self.advance()?;
        let inner_ctx = ctx.allow_in();

        let old_yield_pos = self.yield_pos.take();
        let old_await_pos = self.await_pos.take();

        let mut cover = CoverGrammar::default();
        let mut items = Vec::new();
        let mut rest = None;
        let mut rest_start = None;
        let mut last_is_comma = false;
        let mut first = true;

        while !self.check(&TokenKind::RParen) {
            if first {
                first = false;
            } else {
                self.require_token(&TokenKind::Comma)?;
            }
            if self.check(&TokenKind::RParen) {
                last_is_comma = true;
                break;
            }
            if self.check(&TokenKind::DotDotDot) {
                rest_start = Some(self.current.start);
                rest = Some(self.parse_binding_rest(inner_ctx)?);
                if self.check(&TokenKind::Comma) {
                    return Err(self.error("Comma is not permitted after the rest element"));
                }
                break;
            }
            items.push(self.parse_maybe_assign(inner_ctx, &mut cover)?);
        }
        let inner_end = (self.previous.end, self.previous.loc.end);
        self.require_token(&TokenKind::RParen)?;

        if can_be_arrow && !self.can_insert_semicolon() && self.check(&TokenKind::Arrow) {
            self.check_pattern_errors(&cover, false)?;
            self.check_yield_await_in_params()?;
            self.yield_pos = old_yield_pos;
            self.await_pos = old_await_pos;
            self.advance()?;

            let items = items.into_iter().map(ExpressionOrSpread::Expression).collect();
            let mut params = self.to_arrow_params(ctx.enter_arrow(false), items)?;
            params.extend(rest);
            let arrow = self.parse_arrow_body(ctx, start, params, false)?;
            return Ok(Expression::ArrowFunction(arrow));
        }

        if items.is_empty() || last_is_comma {
            return Err(self.syntax_error_at(self.previous.start, "Unexpected token ')'"));
        }
        if let Some(offset) = rest_start {
            return Err(self.syntax_error_at(offset, "Unexpected token '...'"));
        }
        self.check_expression_errors(&cover)?;
        self.yield_pos = old_yield_pos.or(self.yield_pos);
        self.await_pos = old_await_pos.or(self.await_pos);

        if items.len() == 1 {
            if let Some(expr) = items.pop() {
                return Ok(expr);
            }
        }
        let first_start = items.first().map(|e| Mark::of(e.span())).unwrap_or(start);
        let span = self.make_span(first_start.offset, first_start.position, inner_end.0, inner_end.1);
        Ok(Expression::Sequence(SequenceExpression {
            expressions: items,
            span,
        }))
    }

    fn parse_array_literal(&mut self, ctx: Context, cover: &mut CoverGrammar) -> Result<Expression, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::LBracket)?;
        let ctx = ctx.allow_in();
        let mut elements = Vec::new();
        let mut first = true;

        while !self.match_token(&TokenKind::RBracket)? {
            if !first {
                self.require_token(&TokenKind::Comma)?;
                if self.match_token(&TokenKind::RBracket)? {
                    break;
                }
            }
            first = false;

            if self.check(&TokenKind::Comma) {
                elements.push(None); // hole
            } else if self.check(&TokenKind::DotDotDot) {
                let spread = self.parse_spread(ctx, cover)?;
                if self.check(&TokenKind::Comma) && cover.trailing_comma.is_none() {
                    cover.trailing_comma = Some(self.current.start);
                }
                elements.push(Some(ExpressionOrSpread::Spread(spread)));
            } else {
                let element = self.parse_maybe_assign(ctx, cover)?;
                elements.push(Some(ExpressionOrSpread::Expression(element)));
            }
        }

        Ok(Expression::Array(ArrayExpression {
            elements,
            span: self.span_from(start),
        }))
    }

    fn parse_object_literal(&mut self, ctx: Context, cover: &mut CoverGrammar) -> Result<Expression, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::LBrace)?;
        let ctx = ctx.allow_in();
        let mut properties = Vec::new();
        let mut has_proto = false;

        while !self.match_token(&TokenKind::RBrace)? {
            if !properties.is_empty() {
                self.require_token(&TokenKind::Comma)?;
                if self.match_token(&TokenKind::RBrace)? {
                    break;
                }
            }
            let member = self.parse_object_member(ctx, cover)?;
            if let ObjectMember::Property(prop) = &member {
                if is_proto_property(prop) {
                    if has_proto && cover.double_proto.is_none() {
                        cover.double_proto = Some(prop.key.span().start);
                    }
                    has_proto = true;
                }
            }
            properties.push(member);
        }

        Ok(Expression::Object(ObjectExpression {
            properties,
            span: self.span_from(start),
        }))
    }

    fn parse_object_member(&mut self, ctx: Context, cover: &mut CoverGrammar) -> Result<ObjectMember, ParseError> {
        let start = self.mark();
        if self.check(&TokenKind::DotDotDot) {
            let spread = self.parse_spread(ctx, cover)?;
            if self.check(&TokenKind::Comma) && cover.trailing_comma.is_none() {
                cover.trailing_comma = Some(self.current.start);
            }
            return Ok(ObjectMember::Spread(spread));
        }

        let mut is_generator = self.match_token(&TokenKind::Star)?;
        let key_token = self.current.clone();
        let (mut key, mut computed) = self.parse_property_name(ctx)?;
        let is_plain_word = |word: &str| {
            !key_token.escaped && matches!(&key_token.kind, TokenKind::Identifier(name) if name == word)
        };

        let mut is_async = false;
        if !is_generator && is_plain_word("async") && self.is_method_modifier_follow() {
            is_async = true;
            is_generator = self.match_token(&TokenKind::Star)?;
            (key, computed) = self.parse_property_name(ctx)?;
        }

        if (is_generator || is_async) && !self.check(&TokenKind::LParen) {
            return Err(self.unexpected_token());
        }

        let (value, kind, method, shorthand) = if self.match_token(&TokenKind::Colon)? {
            let value = self.parse_maybe_assign(ctx, cover)?;
            (value, PropertyKind::Init, false, false)
        } else if self.check(&TokenKind::LParen) {
            let function = self.parse_method(ctx, is_async, is_generator, false)?;
            (Expression::Function(function), PropertyKind::Init, true, false)
        } else if (is_plain_word("get") || is_plain_word("set"))
            && !matches!(
                self.current.kind,
                TokenKind::Comma | TokenKind::RBrace | TokenKind::Eq
            )
        {
            let kind = if is_plain_word("get") {
                PropertyKind::Get
            } else {
                PropertyKind::Set
            };
            (key, computed) = self.parse_property_name(ctx)?;
            let function = self.parse_method(ctx, false, false, false)?;
            self.check_accessor_params(kind == PropertyKind::Get, &function.function)?;
            (Expression::Function(function), kind, false, false)
        } else if let (Expression::Identifier(id), false) = (&key, computed) {
            if !matches!(key_token.kind, TokenKind::Identifier(_)) {
                return Err(self.syntax_error_at(
                    key_token.start,
                    format!("Unexpected keyword '{}'", id.name),
                ));
            }
            let id = id.clone();
            self.check_identifier_name(ctx, &id.name, id.span.start, false)?;
            let value = if self.check(&TokenKind::Eq) {
                if cover.shorthand_assign.is_none() {
                    cover.shorthand_assign = Some(self.current.start);
                }
                self.advance()?;
                let right = self.parse_assignment_expression(ctx)?;
                Expression::Assignment(AssignmentExpression {
                    operator: AssignmentOp::Assign,
                    left: Box::new(Pattern::Identifier(id)),
                    right: Box::new(right),
                    span: self.span_from(start),
                })
            } else {
                Expression::Identifier(id)
            };
            (value, PropertyKind::Init, false, true)
        } else {
            return Err(self.unexpected_token());
        };

        Ok(ObjectMember::Property(Property {
            key,
            value,
            kind,
            method,
            shorthand,
            computed,
            span: self.span_from(start),
        }))
    }

    /// After `async`/`get`/`set` in an object or class body: does a
    /// property name follow on the same line, making the word a modifier?
    pub(crate) fn is_method_modifier_follow(&self) -> bool {
        if self.current.newline_before {
            return false;
        }
        matches!(
            self.current.kind,
            TokenKind::Identifier(_)
                | TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::BigInt(_)
                | TokenKind::PrivateName(_)
                | TokenKind::LBracket
                | TokenKind::Star
        ) || self.current.kind.keyword_str().is_some()
    }

    /// PropertyName: identifier name, string, number or `[computed]`
    pub(crate) fn parse_property_name(&mut self, ctx: Context) -> Result<(Expression, bool), ParseError> {
        match self.current.kind {
            TokenKind::LBracket => {
                self.advance()?;
                let key = self.parse_assignment_expression(ctx.allow_in())?;
                self.require_token(&TokenKind::RBracket)?;
                Ok((key, true))
            }
            TokenKind::Number(_) | TokenKind::String(_) | TokenKind::BigInt(_) => {
                Ok((Expression::Literal(self.parse_literal(ctx)?), false))
            }
            _ => Ok((Expression::Identifier(self.parse_identifier_name()?), false)),
        }
    }

    /// `#name` as a member property or the left side of `in`
    pub(crate) fn parse_private_identifier(&mut self) -> Result<Expression, ParseError> {
        let TokenKind::PrivateName(name) = &self.current.kind else {
            return Err(self.unexpected_token());
        };
        let name = name.clone();
        let span = self.token_span(&self.current);
        self.use_private_name(&name, span.start)?;
        self.advance()?;
        Ok(Expression::PrivateIdentifier(PrivateIdentifier { name, span }))
    }

    // ============ TEMPLATES ============

    fn is_template_start(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::TemplateHead(_) | TokenKind::TemplateNoSub(_)
        )
    }

    /// A template literal starting at the current token. Untagged templates
    /// may not contain escapes that fail to cook.
    pub(crate) fn parse_template(&mut self, ctx: Context, tagged: bool) -> Result<TemplateLiteral, ParseError> {
        let start = self.mark();
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();

        loop {
            let token = self.current.clone();
            let (part, tail) = match token.kind.clone() {
                TokenKind::TemplateNoSub(part) | TokenKind::TemplateTail(part) => (part, true),
                TokenKind::TemplateHead(part) | TokenKind::TemplateMiddle(part) => (part, false),
                _ => return Err(self.unexpected_token()),
            };
            if !tagged && part.cooked.is_none() {
                return Err(ParseError::lexical(
                    "Invalid escape sequence in template",
                    self.location_at(token.start),
                ));
            }
            quasis.push(self.template_element(&token, part, tail));
            self.advance()?;
            if tail {
                break;
            }

            expressions.push(self.parse_expression(ctx.allow_in())?);
            if self.is_at_end() {
                return Err(self.error("Unterminated template literal"));
            }
            if !self.check(&TokenKind::RBrace) {
                return Err(self.unexpected_token());
            }
            self.rescan_template_continuation()?;
        }

        Ok(TemplateLiteral {
            quasis,
            expressions,
            span: self.span_from(start),
        })
    }

    /// The element covers the text between the delimiters: after the
    /// opening `` ` `` or `}`, before the closing `` ` `` or `${`
    fn template_element(&self, token: &Token, part: TemplatePart, tail: bool) -> TemplateElement {
        let closing: u32 = if tail { 1 } else { 2 };
        let start = Position {
            line: token.loc.start.line,
            column: token.loc.start.column + 1,
        };
        let end = Position {
            line: token.loc.end.line,
            column: token.loc.end.column.saturating_sub(closing),
        };
        TemplateElement {
            value: TemplateElementValue {
                raw: part.raw,
                cooked: part.cooked,
            },
            tail,
            span: self.make_span(token.start + 1, start, token.end.saturating_sub(closing as usize), end),
        }
    }

    // ============ IMPORT ============

    /// `import(specifier)` or `import.meta`
    fn parse_import_expression(&mut self, ctx: Context, for_new: bool) -> Result<Expression, ParseError> {
        let start = self.mark();
        let import_token = self.current.clone();
        self.advance()?;

        if self.check(&TokenKind::LParen) && !for_new {
            self.advance()?;
            let source = self.parse_assignment_expression(ctx.allow_in())?;
            let mut options = None;

            if self.options.next {
                if !self.match_token(&TokenKind::RParen)? {
                    self.require_token(&TokenKind::Comma)?;
                    if !self.match_token(&TokenKind::RParen)? {
                        options = Some(Box::new(self.parse_assignment_expression(ctx.allow_in())?));
                        if !self.match_token(&TokenKind::RParen)? {
                            self.require_token(&TokenKind::Comma)?;
                            self.require_token(&TokenKind::RParen)?;
                        }
                    }
                }
            } else if !self.match_token(&TokenKind::RParen)? {
                let comma_at = self.current.start;
                if !self.match_token(&TokenKind::Comma)? {
                    return Err(self.unexpected_token());
                }
                if self.check(&TokenKind::RParen) {
                    return Err(self.syntax_error_at(comma_at, "Trailing comma is not allowed in import()"));
                }
                return Err(self.unexpected_token());
            }

            return Ok(Expression::Import(ImportExpression {
                source: Box::new(source),
                options,
                span: self.span_from(start),
            }));
        }

        if self.match_token(&TokenKind::Dot)? {
            let escaped = self.current.escaped;
            let property = self.parse_identifier_name()?;
            if property.name != "meta" {
                return Err(self.syntax_error_at(
                    property.span.start,
                    "The only valid meta property for import is 'import.meta'",
                ));
            }
            if escaped {
                return Err(self.syntax_error_at(
                    property.span.start,
                    "'import.meta' must not contain escaped characters",
                ));
            }
            if !self.options.module {
                return Err(self.syntax_error_at(start.offset, "Cannot use 'import.meta' outside a module"));
            }
            return Ok(Expression::MetaProperty(MetaProperty {
                meta: Identifier {
                    name: "import".to_string(),
                    span: self.token_span(&import_token),
                },
                property,
                span: self.span_from(start),
            }));
        }

        Err(self.unexpected_token())
    }
}

/// A pattern-only construct was seen; stop before any operator so the
/// caller can decide which reading applies
fn blocks_operators(cover: &CoverGrammar) -> bool {
    cover.shorthand_assign.is_some() || cover.double_proto.is_some()
}

/// An arrow function that was not parenthesized ends its expression
fn is_bare_arrow(expr: &Expression, start: Mark) -> bool {
    matches!(expr, Expression::ArrowFunction(arrow) if arrow.span.start == start.offset)
}

/// `__proto__: value` in an object literal
fn is_proto_property(prop: &Property) -> bool {
    if prop.computed || prop.method || prop.shorthand || prop.kind != PropertyKind::Init {
        return false;
    }
    match &prop.key {
        Expression::Identifier(id) => id.name == "__proto__",
        Expression::Literal(Literal {
            value: LiteralValue::String(s),
            ..
        }) => s == "__proto__",
        _ => false,
    }
}

fn binary_operator(kind: &TokenKind) -> Option<(Operator, u8)> {
    use Operator::{Binary, Logical};
    let entry = match kind {
        TokenKind::PipePipe => (Logical(LogicalOp::Or), 4),
        TokenKind::QuestionQuestion => (Logical(LogicalOp::NullishCoalescing), 4),
        TokenKind::AmpAmp => (Logical(LogicalOp::And), AND_PRECEDENCE),
        TokenKind::Pipe => (Binary(BinaryOp::BitOr), 6),
        TokenKind::Caret => (Binary(BinaryOp::BitXor), 7),
        TokenKind::Amp => (Binary(BinaryOp::BitAnd), 8),
        TokenKind::EqEq => (Binary(BinaryOp::Eq), 9),
        TokenKind::BangEq => (Binary(BinaryOp::NotEq), 9),
        TokenKind::EqEqEq => (Binary(BinaryOp::StrictEq), 9),
        TokenKind::BangEqEq => (Binary(BinaryOp::StrictNotEq), 9),
        TokenKind::Lt => (Binary(BinaryOp::Lt), 10),
        TokenKind::LtEq => (Binary(BinaryOp::LtEq), 10),
        TokenKind::Gt => (Binary(BinaryOp::Gt), 10),
        TokenKind::GtEq => (Binary(BinaryOp::GtEq), 10),
        TokenKind::In => (Binary(BinaryOp::In), 10),
        TokenKind::Instanceof => (Binary(BinaryOp::Instanceof), 10),
        TokenKind::LtLt => (Binary(BinaryOp::LShift), 11),
        TokenKind::GtGt => (Binary(BinaryOp::RShift), 11),
        TokenKind::GtGtGt => (Binary(BinaryOp::URShift), 11),
        TokenKind::Plus => (Binary(BinaryOp::Add), 12),
        TokenKind::Minus => (Binary(BinaryOp::Sub), 12),
        TokenKind::Star => (Binary(BinaryOp::Mul), 13),
        TokenKind::Slash => (Binary(BinaryOp::Div), 13),
        TokenKind::Percent => (Binary(BinaryOp::Mod), 13),
        _ => return None,
    };
    Some(entry)
}

fn unary_operator(kind: &TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Minus),
        TokenKind::Plus => Some(UnaryOp::Plus),
        TokenKind::Bang => Some(UnaryOp::Not),
        TokenKind::Tilde => Some(UnaryOp::BitNot),
        TokenKind::Typeof => Some(UnaryOp::Typeof),
        TokenKind::Void => Some(UnaryOp::Void),
        TokenKind::Delete => Some(UnaryOp::Delete),
        _ => None,
    }
}

fn update_operator(kind: &TokenKind) -> Option<UpdateOp> {
    match kind {
        TokenKind::PlusPlus => Some(UpdateOp::Increment),
        TokenKind::MinusMinus => Some(UpdateOp::Decrement),
        _ => None,
    }
}

fn assignment_operator(kind: &TokenKind) -> Option<AssignmentOp> {
    match kind {
        TokenKind::Eq => Some(AssignmentOp::Assign),
        TokenKind::PlusEq => Some(AssignmentOp::AddAssign),
        TokenKind::MinusEq => Some(AssignmentOp::SubAssign),
        TokenKind::StarEq => Some(AssignmentOp::MulAssign),
        TokenKind::SlashEq => Some(AssignmentOp::DivAssign),
        TokenKind::PercentEq => Some(AssignmentOp::ModAssign),
        TokenKind::StarStarEq => Some(AssignmentOp::ExpAssign),
        TokenKind::AmpEq => Some(AssignmentOp::BitAndAssign),
        TokenKind::PipeEq => Some(AssignmentOp::BitOrAssign),
        TokenKind::CaretEq => Some(AssignmentOp::BitXorAssign),
        TokenKind::LtLtEq => Some(AssignmentOp::LShiftAssign),
        TokenKind::GtGtEq => Some(AssignmentOp::RShiftAssign),
        TokenKind::GtGtGtEq => Some(AssignmentOp::URShiftAssign),
        TokenKind::AmpAmpEq => Some(AssignmentOp::AndAssign),
        TokenKind::PipePipeEq => Some(AssignmentOp::OrAssign),
        TokenKind::QuestionQuestionEq => Some(AssignmentOp::NullishAssign),
        _ => None,
    }
}

/// Whether a token continues the expression of a preceding string, so
/// that the string is not a complete directive
pub(crate) fn continues_expression(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Dot
            | TokenKind::QuestionDot
            | TokenKind::Question
            | TokenKind::Comma
            | TokenKind::TemplateHead(_)
            | TokenKind::TemplateNoSub(_)
            | TokenKind::StarStar
            | TokenKind::Eq
            | TokenKind::BangEq
            | TokenKind::BangEqEq
    ) || (binary_operator(kind).is_some() && !matches!(kind, TokenKind::In | TokenKind::Instanceof))
        || assignment_operator(kind).is_some()
}
