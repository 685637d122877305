//! Class declarations and expressions, class elements, private names

use log::trace;
use rustc_hash::FxHashMap;

use super::parse_pattern::CoverGrammar;
use super::scope::{BindingKind, ScopeFlags};
use super::{Context, Mark, Parser};
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

/// What a private name has been declared as so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrivateSlot {
    /// Field, method, or a getter/setter pair
    Complete,
    Getter { is_static: bool },
    Setter { is_static: bool },
}

/// Private names declared by one class body, and the references made
/// inside it that must resolve against this or an enclosing class
#[derive(Debug, Default)]
pub(crate) struct PrivateNameScope {
    declared: FxHashMap<String, PrivateSlot>,
    used: Vec<(String, usize)>,
}

impl PrivateNameScope {
    /// Returns `false` if `name` is already taken. A getter and a setter
    /// with the same staticness may share a name.
    fn declare(&mut self, name: &str, kind: MethodKind, is_static: bool) -> bool {
        let next = match kind {
            MethodKind::Get => PrivateSlot::Getter { is_static },
            MethodKind::Set => PrivateSlot::Setter { is_static },
            _ => PrivateSlot::Complete,
        };
        let merged = match (self.declared.get(name).copied(), next) {
            (None, next) => next,
            (Some(PrivateSlot::Getter { is_static: a }), PrivateSlot::Setter { is_static: b })
            | (Some(PrivateSlot::Setter { is_static: a }), PrivateSlot::Getter { is_static: b })
                if a == b =>
            {
                PrivateSlot::Complete
            }
            _ => return false,
        };
        self.declared.insert(name.to_string(), merged);
        true
    }
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_class_declaration(
        &mut self,
        ctx: Context,
        id_optional: bool,
    ) -> Result<ClassDeclaration, ParseError> {
        let class = self.parse_class(ctx, true, id_optional)?;
        Ok(ClassDeclaration { class })
    }

    pub(crate) fn parse_class_expression(&mut self, ctx: Context) -> Result<ClassExpression, ParseError> {
        let class = self.parse_class(ctx, false, true)?;
        Ok(ClassExpression { class })
    }

    /// `class Name extends Heritage { body }`; all of it is strict code
    fn parse_class(&mut self, ctx: Context, is_statement: bool, id_optional: bool) -> Result<Class, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::Class)?;
        let ctx = ctx | Context::STRICT;

        let id = if self.check_identifier() {
            let id = self.parse_binding_identifier(ctx)?;
            if is_statement {
                self.declare_name(ctx, &id, BindingKind::Lexical)?;
            }
            Some(id)
        } else if is_statement && !id_optional {
            return Err(self.unexpected_token());
        } else {
            None
        };

        let super_class = if self.match_token(&TokenKind::Extends)? {
            let mut cover = CoverGrammar::default();
            let heritage = self.parse_expr_subscripts(ctx, &mut cover)?;
            self.check_expression_errors(&cover)?;
            Some(Box::new(heritage))
        } else {
            None
        };

        let body = self.parse_class_body(ctx, super_class.is_some())?;
        Ok(Class {
            id,
            super_class,
            body,
            span: self.span_from(start),
        })
    }

    fn parse_class_body(&mut self, ctx: Context, has_super: bool) -> Result<ClassBody, ParseError> {
        let start = self.mark();
        self.require_token(&TokenKind::LBrace)?;
        self.private_names.push(PrivateNameScope::default());

        let mut body = Vec::new();
        let mut had_constructor = false;
        while !self.check(&TokenKind::RBrace) {
            if self.match_token(&TokenKind::Semicolon)? {
                continue;
            }
            let element = self.parse_class_element(ctx, has_super)?;
            match &element {
                ClassElement::Method(method) if method.kind == MethodKind::Constructor => {
                    if had_constructor {
                        return Err(self.early_error_at(
                            method.span.start,
                            "Duplicate constructor in the same class",
                        ));
                    }
                    had_constructor = true;
                }
                ClassElement::Method(MethodDefinition {
                    key: Expression::PrivateIdentifier(id),
                    kind,
                    is_static,
                    ..
                }) => self.declare_private_name(id, *kind, *is_static)?,
                ClassElement::Property(PropertyDefinition {
                    key: Expression::PrivateIdentifier(id),
                    is_static,
                    ..
                }) => self.declare_private_name(id, MethodKind::Method, *is_static)?,
                _ => {}
            }
            body.push(element);
        }

        self.require_token(&TokenKind::RBrace)?;
        self.exit_private_name_scope()?;
        Ok(ClassBody {
            body,
            span: self.span_from(start),
        })
    }

    /// One method, field or static block. Modifier words (`static`,
    /// `async`, `get`, `set`) name the element themselves when no element
    /// name follows them.
    fn parse_class_element(&mut self, ctx: Context, has_super: bool) -> Result<ClassElement, ParseError> {
        let start = self.mark();
        let mut word_key: Option<Token> = None;

        let mut is_static = false;
        if self.check_keyword("static") {
            let token = self.current.clone();
            self.advance()?;
            if self.match_token(&TokenKind::LBrace)? {
                return self.parse_static_block(ctx, start);
            }
            if self.is_class_element_name_start() || self.check(&TokenKind::Star) {
                is_static = true;
            } else {
                word_key = Some(token);
            }
        }

        let mut is_async = false;
        if word_key.is_none() && self.check_keyword("async") {
            let token = self.current.clone();
            self.advance()?;
            if (self.is_class_element_name_start() || self.check(&TokenKind::Star)) && !self.current.newline_before {
                is_async = true;
            } else {
                word_key = Some(token);
            }
        }

        let is_generator = word_key.is_none() && self.match_token(&TokenKind::Star)?;

        let mut kind = MethodKind::Method;
        if word_key.is_none() && !is_async && !is_generator && (self.check_keyword("get") || self.check_keyword("set")) {
            let token = self.current.clone();
            self.advance()?;
            if self.is_class_element_name_start() {
                kind = if matches!(&token.kind, TokenKind::Identifier(word) if word == "get") {
                    MethodKind::Get
                } else {
                    MethodKind::Set
                };
            } else {
                word_key = Some(token);
            }
        }

        let (key, computed) = match word_key {
            Some(token) => {
                let name = token.text(self.source).to_string();
                let span = self.token_span(&token);
                (Expression::Identifier(Identifier { name, span }), false)
            }
            None => self.parse_class_element_name(ctx)?,
        };
        let key_start = key.span().start;

        if self.check(&TokenKind::LParen) || kind != MethodKind::Method || is_generator || is_async {
            let is_constructor = !is_static && is_key_named(&key, computed, "constructor");
            if is_constructor {
                if kind != MethodKind::Method {
                    return Err(self.early_error_at(key_start, "Constructor can't have get/set modifier"));
                }
                if is_generator {
                    return Err(self.early_error_at(key_start, "Constructor can't be a generator"));
                }
                if is_async {
                    return Err(self.early_error_at(key_start, "Constructor can't be an async method"));
                }
            } else if is_static && is_key_named(&key, computed, "prototype") {
                return Err(self.early_error_at(
                    key_start,
                    "Classes may not have a static property named prototype",
                ));
            }

            let value = self.parse_method(ctx, is_async, is_generator, is_constructor && has_super)?;
            if matches!(kind, MethodKind::Get | MethodKind::Set) {
                self.check_accessor_params(kind == MethodKind::Get, &value.function)?;
            }
            return Ok(ClassElement::Method(MethodDefinition {
                key,
                value,
                kind: if is_constructor { MethodKind::Constructor } else { kind },
                computed,
                is_static,
                span: self.span_from(start),
            }));
        }

        if is_key_named(&key, computed, "constructor") {
            return Err(self.early_error_at(key_start, "Classes can't have a field named 'constructor'"));
        }
        if is_static && is_key_named(&key, computed, "prototype") {
            return Err(self.early_error_at(
                key_start,
                "Classes can't have a static field named 'prototype'",
            ));
        }

        let value = if self.match_token(&TokenKind::Eq)? {
            let field_ctx = (ctx & (Context::STRICT | Context::MODULE))
                | Context::SUPER_PROPERTY
                | Context::NEW_TARGET
                | Context::CLASS_FIELD;
            Some(self.parse_assignment_expression(field_ctx)?)
        } else {
            None
        };
        self.expect_semicolon()?;

        Ok(ClassElement::Property(PropertyDefinition {
            key,
            value,
            computed,
            is_static,
            span: self.span_from(start),
        }))
    }

    fn is_class_element_name_start(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Identifier(_)
                | TokenKind::PrivateName(_)
                | TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::BigInt(_)
                | TokenKind::LBracket
        ) || self.current.kind.keyword_str().is_some()
    }

    fn parse_class_element_name(&mut self, ctx: Context) -> Result<(Expression, bool), ParseError> {
        let TokenKind::PrivateName(name) = &self.current.kind else {
            return self.parse_property_name(ctx);
        };
        if name == "constructor" {
            return Err(self.early_error_at(
                self.current.start,
                "Classes can't have an element named '#constructor'",
            ));
        }
        let name = name.clone();
        let span = self.token_span(&self.current);
        self.advance()?;
        Ok((Expression::PrivateIdentifier(PrivateIdentifier { name, span }), false))
    }

    /// `static { ... }` after the opening brace
    fn parse_static_block(&mut self, ctx: Context, start: Mark) -> Result<ClassElement, ParseError> {
        let block_ctx = (ctx & (Context::STRICT | Context::MODULE))
            | Context::SUPER_PROPERTY
            | Context::NEW_TARGET
            | Context::STATIC_BLOCK;
        let saved_labels = std::mem::take(&mut self.labels);
        self.scopes.enter(ScopeFlags::STATIC_BLOCK);

        let body = self.parse_statement_list(block_ctx)?;
        self.require_token(&TokenKind::RBrace)?;

        self.scopes.exit();
        self.labels = saved_labels;
        Ok(ClassElement::StaticBlock(StaticBlock {
            body,
            span: self.span_from(start),
        }))
    }

    // ============ PRIVATE NAMES ============

    fn declare_private_name(&mut self, id: &PrivateIdentifier, kind: MethodKind, is_static: bool) -> Result<(), ParseError> {
        let declared = self
            .private_names
            .last_mut()
            .is_some_and(|scope| scope.declare(&id.name, kind, is_static));
        if !declared {
            return Err(self.early_error_at(
                id.span.start,
                format!("Identifier '#{}' has already been declared", id.name),
            ));
        }
        Ok(())
    }

    /// Record a reference to `#name`; it is resolved when the innermost
    /// class body ends
    pub(crate) fn use_private_name(&mut self, name: &str, offset: usize) -> Result<(), ParseError> {
        match self.private_names.last_mut() {
            Some(scope) => {
                scope.used.push((name.to_string(), offset));
                Ok(())
            }
            None => Err(self.early_error_at(
                offset,
                format!("Private field '#{}' must be declared in an enclosing class", name),
            )),
        }
    }

    /// Resolve the references of the class body that just ended; the
    /// unresolved ones move to the enclosing class
    fn exit_private_name_scope(&mut self) -> Result<(), ParseError> {
        let Some(scope) = self.private_names.pop() else {
            return Ok(());
        };
        for (name, offset) in scope.used {
            if scope.declared.contains_key(&name) {
                continue;
            }
            match self.private_names.last_mut() {
                Some(parent) => {
                    trace!("private name '#{}' deferred to enclosing class", name);
                    parent.used.push((name, offset));
                }
                None => {
                    return Err(self.early_error_at(
                        offset,
                        format!("Private field '#{}' must be declared in an enclosing class", name),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A non-computed key spelled `name`, as an identifier or a string
fn is_key_named(key: &Expression, computed: bool, name: &str) -> bool {
    if computed {
        return false;
    }
    match key {
        Expression::Identifier(id) => id.name == name,
        Expression::Literal(Literal {
            value: LiteralValue::String(s),
            ..
        }) => s == name,
        _ => false,
    }
}
