//! Binding patterns and expression-to-pattern reinterpretation
//!
//! Array and object literals, and parenthesized lists, are parsed once as
//! expressions. Constructs that are only legal in one reading are recorded
//! in a [`CoverGrammar`] instead of failing immediately; once the position
//! is known to be a pattern (`=` follows, `=>` follows, `for (.. of ..)`) the
//! expression is converted, otherwise the recorded expression errors fire.

use super::scope::BindingKind;
use super::{Context, Mark, Parser, await_identifier_message};
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::TokenKind;

/// Offsets of constructs whose legality depends on the final reading
#[derive(Debug, Default, Clone)]
pub(crate) struct CoverGrammar {
    /// `{ a = 1 }`: only valid as a pattern
    pub(crate) shorthand_assign: Option<usize>,
    /// A comma after a spread element: invalid after a rest element
    pub(crate) trailing_comma: Option<usize>,
    /// A parenthesized non-simple target: invalid in assignment patterns
    pub(crate) parenthesized_assign: Option<usize>,
    /// Any parenthesized element: invalid in binding patterns
    pub(crate) parenthesized_bind: Option<usize>,
    /// A second `__proto__: v` property: only valid as a pattern
    pub(crate) double_proto: Option<usize>,
}

impl<'a> Parser<'a> {
    // ============ COVER GRAMMAR ============

    /// The expression reading was chosen; fail on pattern-only constructs
    pub(crate) fn check_expression_errors(&self, cover: &CoverGrammar) -> Result<(), ParseError> {
        if let Some(offset) = cover.shorthand_assign {
            return Err(self.syntax_error_at(
                offset,
                "Shorthand property assignments are valid only in destructuring patterns",
            ));
        }
        if let Some(offset) = cover.double_proto {
            return Err(self.early_error_at(offset, "Redefinition of __proto__ property"));
        }
        Ok(())
    }

    /// The pattern reading was chosen; fail on expression-only constructs
    pub(crate) fn check_pattern_errors(
        &self,
        cover: &CoverGrammar,
        is_assign: bool,
    ) -> Result<(), ParseError> {
        if let Some(offset) = cover.trailing_comma {
            return Err(self.syntax_error_at(offset, "Comma is not permitted after the rest element"));
        }
        let parens = if is_assign {
            cover.parenthesized_assign
        } else {
            cover.parenthesized_bind
        };
        if let Some(offset) = parens {
            return Err(self.syntax_error_at(offset, "Parenthesized pattern"));
        }
        Ok(())
    }

    // ============ EXPRESSION TO PATTERN ============

    /// Convert the left side of `=` or of a `for-in`/`for-of` head.
    ///
    /// Unlike nested elements, the whole target may not itself be an
    /// assignment: `(a = 1) = 2` and `for (a = 0 of b)` are errors.
    pub(crate) fn to_assignment_target(
        &mut self,
        ctx: Context,
        expr: Expression,
        cover: Option<&CoverGrammar>,
    ) -> Result<Pattern, ParseError> {
        if let Expression::Assignment(assign) = &expr {
            return Err(self.early_error_at(
                assign.span.start,
                "Invalid left-hand side in assignment",
            ));
        }
        let pattern = self.to_assignable(ctx, expr, false, cover)?;
        self.check_assignment_pattern(ctx, &pattern)?;
        Ok(pattern)
    }

    /// Convert an expression into the equivalent pattern
    pub(crate) fn to_assignable(
        &mut self,
        ctx: Context,
        expr: Expression,
        is_binding: bool,
        cover: Option<&CoverGrammar>,
    ) -> Result<Pattern, ParseError> {
        match expr {
            Expression::Identifier(id) => {
                if ctx.has_await() && id.name == "await" {
                    return Err(self.early_error_at(id.span.start, await_identifier_message(ctx)));
                }
                Ok(Pattern::Identifier(id))
            }

            Expression::Member(member) if !is_binding => Ok(Pattern::Member(member)),

            Expression::Object(object) => {
                if let Some(cover) = cover {
                    self.check_pattern_errors(cover, true)?;
                }
                let count = object.properties.len();
                let mut properties = Vec::with_capacity(count);
                for (index, member) in object.properties.into_iter().enumerate() {
                    match member {
                        ObjectMember::Property(prop) => {
                            if prop.kind != PropertyKind::Init || prop.method {
                                return Err(self.early_error_at(
                                    prop.key.span().start,
                                    "Object pattern can't contain getter, setter or method",
                                ));
                            }
                            let value = self.to_assignable(ctx, prop.value, is_binding, None)?;
                            properties.push(ObjectPatternProperty::Property(AssignmentProperty {
                                key: prop.key,
                                value,
                                kind: PropertyKind::Init,
                                method: false,
                                shorthand: prop.shorthand,
                                computed: prop.computed,
                                span: prop.span,
                            }));
                        }
                        ObjectMember::Spread(spread) => {
                            if index + 1 != count {
                                return Err(self.syntax_error_at(
                                    spread.span.start,
                                    "Rest element must be last element",
                                ));
                            }
                            let argument = self.to_assignable(ctx, *spread.argument, is_binding, None)?;
                            if !matches!(argument, Pattern::Identifier(_) | Pattern::Member(_)) {
                                return Err(self.syntax_error_at(
                                    argument.span().start,
                                    "`...` must be followed by an assignable reference in assignment contexts",
                                ));
                            }
                            properties.push(ObjectPatternProperty::Rest(RestElement {
                                argument: Box::new(argument),
                                span: spread.span,
                            }));
                        }
                    }
                }
                Ok(Pattern::Object(ObjectPattern {
                    properties,
                    span: object.span,
                }))
            }

            Expression::Array(array) => {
                if let Some(cover) = cover {
                    self.check_pattern_errors(cover, true)?;
                }
                let count = array.elements.len();
                let mut elements = Vec::with_capacity(count);
                for (index, element) in array.elements.into_iter().enumerate() {
                    let pattern = match element {
                        None => None,
                        Some(ExpressionOrSpread::Expression(expr)) => {
                            Some(self.to_assignable(ctx, expr, is_binding, None)?)
                        }
                        Some(ExpressionOrSpread::Spread(spread)) => {
                            if index + 1 != count {
                                return Err(self.syntax_error_at(
                                    spread.span.start,
                                    "Rest element must be last element",
                                ));
                            }
                            let argument = self.to_assignable(ctx, *spread.argument, is_binding, None)?;
                            if let Pattern::Assignment(assign) = &argument {
                                return Err(self.syntax_error_at(
                                    assign.span.start,
                                    "Rest elements cannot have a default value",
                                ));
                            }
                            Some(Pattern::Rest(RestElement {
                                argument: Box::new(argument),
                                span: spread.span,
                            }))
                        }
                    };
                    elements.push(pattern);
                }
                Ok(Pattern::Array(ArrayPattern {
                    elements,
                    span: array.span,
                }))
            }

            Expression::Assignment(assign) => {
                if assign.operator != AssignmentOp::Assign {
                    return Err(self.syntax_error_at(
                        assign.left.span().end,
                        "Only '=' operator can be used for specifying default value.",
                    ));
                }
                let left = if is_binding {
                    self.rebind(*assign.left)?
                } else {
                    *assign.left
                };
                Ok(Pattern::Assignment(AssignmentPattern {
                    left: Box::new(left),
                    right: assign.right,
                    span: assign.span,
                }))
            }

            Expression::Chain(chain) => Err(self.early_error_at(
                chain.span.start,
                "Optional chaining cannot appear in left-hand side",
            )),

            other => {
                let message = if is_binding {
                    "Binding rvalue"
                } else {
                    "Assigning to rvalue"
                };
                Err(self.early_error_at(other.span().start, message))
            }
        }
    }

    /// An assignment target already converted while parsing `a = b` that
    /// now turns out to sit in a binding position, e.g. `([x.y] = z) => 0`
    fn rebind(&self, pattern: Pattern) -> Result<Pattern, ParseError> {
        match pattern {
            Pattern::Member(member) => Err(self.early_error_at(member.span.start, "Binding member expression")),
            Pattern::Identifier(_) => Ok(pattern),
            Pattern::Object(object) => {
                let mut properties = Vec::with_capacity(object.properties.len());
                for prop in object.properties {
                    properties.push(match prop {
                        ObjectPatternProperty::Property(mut p) => {
                            p.value = self.rebind(p.value)?;
                            ObjectPatternProperty::Property(p)
                        }
                        ObjectPatternProperty::Rest(mut r) => {
                            r.argument = Box::new(self.rebind(*r.argument)?);
                            ObjectPatternProperty::Rest(r)
                        }
                    });
                }
                Ok(Pattern::Object(ObjectPattern {
                    properties,
                    span: object.span,
                }))
            }
            Pattern::Array(array) => {
                let mut elements = Vec::with_capacity(array.elements.len());
                for element in array.elements {
                    elements.push(element.map(|e| self.rebind(e)).transpose()?);
                }
                Ok(Pattern::Array(ArrayPattern {
                    elements,
                    span: array.span,
                }))
            }
            Pattern::Rest(mut rest) => {
                rest.argument = Box::new(self.rebind(*rest.argument)?);
                Ok(Pattern::Rest(rest))
            }
            Pattern::Assignment(mut assign) => {
                assign.left = Box::new(self.rebind(*assign.left)?);
                Ok(Pattern::Assignment(assign))
            }
        }
    }

    /// Convert arrow parameters parsed as a parenthesized list or as the
    /// arguments of `async(...)`
    pub(crate) fn to_arrow_params(
        &mut self,
        ctx: Context,
        items: Vec<ExpressionOrSpread>,
    ) -> Result<Vec<Pattern>, ParseError> {
        let count = items.len();
        let mut params = Vec::with_capacity(count);
        for (index, item) in items.into_iter().enumerate() {
            let param = match item {
                ExpressionOrSpread::Expression(expr) => self.to_assignable(ctx, expr, true, None)?,
                ExpressionOrSpread::Spread(spread) => {
                    if index + 1 != count {
                        return Err(self.syntax_error_at(
                            spread.span.start,
                            "Rest parameter must be last formal parameter",
                        ));
                    }
                    let argument = self.to_assignable(ctx, *spread.argument, true, None)?;
                    if let Pattern::Assignment(assign) = &argument {
                        return Err(self.syntax_error_at(
                            assign.span.start,
                            "Rest parameter may not have a default initializer",
                        ));
                    }
                    Pattern::Rest(RestElement {
                        argument: Box::new(argument),
                        span: spread.span,
                    })
                }
            };
            params.push(param);
        }
        Ok(params)
    }

    /// Identifier leaves of an assignment pattern must be assignable in
    /// the current mode
    pub(crate) fn check_assignment_pattern(&self, ctx: Context, pattern: &Pattern) -> Result<(), ParseError> {
        if !ctx.is_strict() {
            return Ok(());
        }
        for id in pattern.bound_names() {
            if id.name == "eval" || id.name == "arguments" {
                return Err(self.early_error_at(
                    id.span.start,
                    format!("Assigning to {} in strict mode", id.name),
                ));
            }
        }
        Ok(())
    }

    /// Target of `++`, `--` and compound assignment
    pub(crate) fn check_simple_target(&self, ctx: Context, expr: &Expression) -> Result<(), ParseError> {
        match expr {
            Expression::Identifier(id) => {
                if ctx.is_strict() && (id.name == "eval" || id.name == "arguments") {
                    return Err(self.early_error_at(
                        id.span.start,
                        format!("Assigning to {} in strict mode", id.name),
                    ));
                }
                Ok(())
            }
            Expression::Member(_) => Ok(()),
            Expression::Chain(chain) => Err(self.early_error_at(
                chain.span.start,
                "Optional chaining cannot appear in left-hand side",
            )),
            other => Err(self.early_error_at(other.span().start, "Invalid left-hand side in assignment")),
        }
    }

    // ============ BINDING PATTERNS ============

    /// BindingIdentifier or BindingPattern
    pub(crate) fn parse_binding_target(&mut self, ctx: Context) -> Result<Pattern, ParseError> {
        match &self.current.kind {
            TokenKind::LBracket => self.parse_array_binding_pattern(ctx),
            TokenKind::LBrace => self.parse_object_binding_pattern(ctx),
            _ => Ok(Pattern::Identifier(self.parse_binding_identifier(ctx)?)),
        }
    }

    /// Binding target with an optional `= default`
    pub(crate) fn parse_binding_element(&mut self, ctx: Context) -> Result<Pattern, ParseError> {
        let start = self.mark();
        let target = self.parse_binding_target(ctx)?;
        self.parse_binding_default(ctx, start, target)
    }

    fn parse_binding_default(
        &mut self,
        ctx: Context,
        start: Mark,
        target: Pattern,
    ) -> Result<Pattern, ParseError> {
        if !self.match_token(&TokenKind::Eq)? {
            return Ok(target);
        }
        let right = self.parse_assignment_expression(ctx.allow_in())?;
        Ok(Pattern::Assignment(AssignmentPattern {
            left: Box::new(target),
            right: Box::new(right),
            span: self.span_from(start),
        }))
    }

    /// `...target` in a binding list; no default, nothing after it
    pub(crate) fn parse_binding_rest(&mut self, ctx: Context) -> Result<Pattern, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::DotDotDot)?;
        let argument = self.parse_binding_target(ctx)?;
        if self.check(&TokenKind::Eq) {
            return Err(self.error("Rest elements cannot have a default value"));
        }
        Ok(Pattern::Rest(RestElement {
            argument: Box::new(argument),
            span: self.span_from(start),
        }))
    }

    fn parse_array_binding_pattern(&mut self, ctx: Context) -> Result<Pattern, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::LBracket)?;
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RBracket) {
            if self.match_token(&TokenKind::Comma)? {
                elements.push(None); // hole
                continue;
            }
            if self.check(&TokenKind::DotDotDot) {
                elements.push(Some(self.parse_binding_rest(ctx)?));
                if self.check(&TokenKind::Comma) {
                    return Err(self.error("Comma is not permitted after the rest element"));
                }
                break;
            }
            elements.push(Some(self.parse_binding_element(ctx)?));
            if !self.check(&TokenKind::RBracket) {
                self.require_token(&TokenKind::Comma)?;
            }
        }

        self.require_token(&TokenKind::RBracket)?;
        Ok(Pattern::Array(ArrayPattern {
            elements,
            span: self.span_from(start),
        }))
    }

    fn parse_object_binding_pattern(&mut self, ctx: Context) -> Result<Pattern, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::LBrace)?;
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::DotDotDot) {
                let rest_start = self.mark();
                self.advance()?;
                let argument = self.parse_binding_identifier(ctx)?;
                properties.push(ObjectPatternProperty::Rest(RestElement {
                    argument: Box::new(Pattern::Identifier(argument)),
                    span: self.span_from(rest_start),
                }));
                if self.check(&TokenKind::Comma) {
                    return Err(self.error("Comma is not permitted after the rest element"));
                }
                break;
            }

            let prop_start = self.mark();
            let key_token = self.current.clone();
            let (key, computed) = self.parse_property_name(ctx)?;

            let property = if self.match_token(&TokenKind::Colon)? {
                let value = self.parse_binding_element(ctx)?;
                AssignmentProperty {
                    key,
                    value,
                    kind: PropertyKind::Init,
                    method: false,
                    shorthand: false,
                    computed,
                    span: self.span_from(prop_start),
                }
            } else {
                // Shorthand `{ x }` / `{ x = 1 }`: the key is also the binding
                let Expression::Identifier(id) = &key else {
                    return Err(self.unexpected_token());
                };
                if computed || !matches!(key_token.kind, TokenKind::Identifier(_)) {
                    return Err(self.syntax_error_at(
                        key_token.start,
                        format!("Unexpected keyword '{}'", id.name),
                    ));
                }
                self.check_identifier_name(ctx, &id.name, id.span.start, true)?;
                let target = Pattern::Identifier(id.clone());
                let value = self.parse_binding_default(ctx, prop_start, target)?;
                AssignmentProperty {
                    key,
                    value,
                    kind: PropertyKind::Init,
                    method: false,
                    shorthand: true,
                    computed: false,
                    span: self.span_from(prop_start),
                }
            };
            properties.push(ObjectPatternProperty::Property(property));

            if !self.check(&TokenKind::RBrace) {
                self.require_token(&TokenKind::Comma)?;
            }
        }

        self.require_token(&TokenKind::RBrace)?;
        Ok(Pattern::Object(ObjectPattern {
            properties,
            span: self.span_from(start),
        }))
    }

    // ============ DECLARING ============

    /// Declare every name bound by `pattern` in the current scope
    pub(crate) fn declare_pattern(
        &mut self,
        ctx: Context,
        pattern: &Pattern,
        kind: BindingKind,
    ) -> Result<(), ParseError> {
        for id in pattern.bound_names() {
            self.declare_name(ctx, id, kind)?;
        }
        Ok(())
    }

    pub(crate) fn declare_name(
        &mut self,
        ctx: Context,
        id: &Identifier,
        kind: BindingKind,
    ) -> Result<(), ParseError> {
        if ctx.is_strict() && (id.name == "eval" || id.name == "arguments") {
            return Err(self.early_error_at(
                id.span.start,
                format!("Binding '{}' in strict mode", id.name),
            ));
        }
        if !self.scopes.declare(&id.name, kind) {
            return Err(self.early_error_at(
                id.span.start,
                format!("Identifier '{}' has already been declared", id.name),
            ));
        }
        Ok(())
    }
}
