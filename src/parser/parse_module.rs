//! `import` and `export` declarations

use log::trace;

use super::scope::BindingKind;
use super::{is_strict_reserved_word, Context, Mark, Parser};
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{is_reserved_word, TokenKind};

impl<'a> Parser<'a> {
    /// A top-level item of a module
    pub(crate) fn parse_module_item(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        match self.current.kind {
            TokenKind::Import => {
                let next = self.peek()?;
                if matches!(next.kind, TokenKind::LParen | TokenKind::Dot) {
                    return self.parse_statement_list_item(ctx);
                }
                Ok(Statement::Import(self.parse_import_declaration(ctx)?))
            }
            TokenKind::Export => self.parse_export_declaration(ctx),
            _ => self.parse_statement_list_item(ctx),
        }
    }

    // ============ IMPORT ============

    fn parse_import_declaration(&mut self, ctx: Context) -> Result<ImportDeclaration, ParseError> {
        let start = self.mark();
        self.advance()?;

        let mut specifiers = Vec::new();
        if !matches!(self.current.kind, TokenKind::String(_)) {
            if self.check_identifier() {
                let local = self.parse_import_local(ctx)?;
                let span = local.span;
                specifiers.push(ImportDeclarationSpecifier::Default(ImportDefaultSpecifier { local, span }));
                if self.match_token(&TokenKind::Comma)? {
                    self.parse_import_clause_rest(ctx, &mut specifiers)?;
                }
            } else {
                self.parse_import_clause_rest(ctx, &mut specifiers)?;
            }
            if !self.match_keyword("from")? {
                return Err(self.unexpected_token());
            }
        }

        let source = self.parse_string_literal(ctx)?;
        let attributes = self.parse_import_attributes(ctx)?;
        self.expect_semicolon()?;
        Ok(ImportDeclaration {
            specifiers,
            source,
            attributes,
            span: self.span_from(start),
        })
    }

    /// `* as ns` or `{ a, b as c }`
    fn parse_import_clause_rest(
        &mut self,
        ctx: Context,
        specifiers: &mut Vec<ImportDeclarationSpecifier>,
    ) -> Result<(), ParseError> {
        let start = self.mark();
        if self.match_token(&TokenKind::Star)? {
            if !self.match_keyword("as")? {
                return Err(self.unexpected_token());
            }
            let local = self.parse_import_local(ctx)?;
            specifiers.push(ImportDeclarationSpecifier::Namespace(ImportNamespaceSpecifier {
                local,
                span: self.span_from(start),
            }));
            return Ok(());
        }

        self.require_token(&TokenKind::LBrace)?;
        while !self.match_token(&TokenKind::RBrace)? {
            let specifier_start = self.mark();
            let imported = self.parse_module_export_name(ctx)?;
            let local = if self.match_keyword("as")? {
                self.parse_import_local(ctx)?
            } else {
                // `{ x }` binds `x` itself, so it must be a valid binding
                let ModuleExportName::Identifier(id) = &imported else {
                    return Err(self.unexpected_token());
                };
                self.check_local_name(id)?;
                self.check_identifier_name(ctx, &id.name, id.span.start, true)?;
                self.declare_name(ctx, id, BindingKind::Lexical)?;
                id.clone()
            };
            specifiers.push(ImportDeclarationSpecifier::Named(ImportSpecifier {
                imported,
                local,
                span: self.span_from(specifier_start),
            }));
            if !self.check(&TokenKind::RBrace) {
                self.require_token(&TokenKind::Comma)?;
            }
        }
        Ok(())
    }

    fn parse_import_local(&mut self, ctx: Context) -> Result<Identifier, ParseError> {
        let local = self.parse_binding_identifier(ctx)?;
        self.declare_name(ctx, &local, BindingKind::Lexical)?;
        Ok(local)
    }

    /// `with { key: "value", ... }` after a module specifier
    fn parse_import_attributes(&mut self, ctx: Context) -> Result<Vec<ImportAttribute>, ParseError> {
        if !self.options.next || !self.check(&TokenKind::With) {
            return Ok(Vec::new());
        }
        self.advance()?;
        self.require_token(&TokenKind::LBrace)?;

        let mut attributes: Vec<ImportAttribute> = Vec::new();
        while !self.match_token(&TokenKind::RBrace)? {
            let start = self.mark();
            let key = if matches!(self.current.kind, TokenKind::String(_)) {
                ModuleExportName::Literal(self.parse_string_literal(ctx)?)
            } else {
                ModuleExportName::Identifier(self.parse_identifier_name()?)
            };
            if attributes.iter().any(|a| a.key.name() == key.name()) {
                return Err(self.early_error_at(
                    key.span().start,
                    format!("Duplicate attribute key '{}'", key.name()),
                ));
            }
            self.require_token(&TokenKind::Colon)?;
            let value = self.parse_string_literal(ctx)?;
            attributes.push(ImportAttribute {
                key,
                value,
                span: self.span_from(start),
            });
            if !self.check(&TokenKind::RBrace) {
                self.require_token(&TokenKind::Comma)?;
            }
        }
        Ok(attributes)
    }

    /// IdentifierName or string literal in an import/export list
    fn parse_module_export_name(&mut self, ctx: Context) -> Result<ModuleExportName, ParseError> {
        if matches!(self.current.kind, TokenKind::String(_)) {
            return Ok(ModuleExportName::Literal(self.parse_string_literal(ctx)?));
        }
        Ok(ModuleExportName::Identifier(self.parse_identifier_name()?))
    }

    /// Reserved words may be exported or imported by name, but never
    /// name a local binding
    fn check_local_name(&self, id: &Identifier) -> Result<(), ParseError> {
        let name = id.name.as_str();
        if is_reserved_word(name) || is_strict_reserved_word(name) || name == "await" {
            return Err(self.syntax_error_at(id.span.start, format!("Unexpected keyword '{}'", name)));
        }
        Ok(())
    }

    // ============ EXPORT ============

    fn parse_export_declaration(&mut self, ctx: Context) -> Result<Statement, ParseError> {
        let start = self.mark();
        self.advance()?;

        if self.check(&TokenKind::Star) {
            return self.parse_export_all(ctx, start).map(Statement::ExportAll);
        }
        if self.check(&TokenKind::Default) {
            return self.parse_export_default(ctx, start).map(Statement::ExportDefault);
        }
        if self.check(&TokenKind::LBrace) {
            return self.parse_export_list(ctx, start).map(Statement::ExportNamed);
        }

        let declaration = if self.check(&TokenKind::Var)
            || self.check(&TokenKind::Const)
            || self.check_keyword("let")
        {
            let kind = match self.current.kind {
                TokenKind::Var => VariableKind::Var,
                TokenKind::Const => VariableKind::Const,
                _ => VariableKind::Let,
            };
            let declaration_start = self.mark();
            self.advance()?;
            let mut declaration = self.parse_variable_declarations(ctx, declaration_start, kind, false)?;
            self.expect_semicolon()?;
            declaration.span = self.span_from(declaration_start);
            for id in declaration.declarations.iter().flat_map(|d| d.id.bound_names()) {
                self.add_export(&id.name, id.span.start)?;
            }
            Declaration::Variable(declaration)
        } else if self.check(&TokenKind::Function) || self.check_keyword("async") {
            let function_start = self.mark();
            let is_async = self.match_keyword("async")?;
            if is_async && self.current.newline_before {
                return Err(self.unexpected_token());
            }
            self.require_token(&TokenKind::Function)?;
            let function = self.parse_function_declaration(ctx, function_start, is_async, false, false)?;
            if let Some(id) = &function.function.id {
                self.add_export(&id.name, id.span.start)?;
            }
            Declaration::Function(function)
        } else if self.check(&TokenKind::Class) {
            let class = self.parse_class_declaration(ctx, false)?;
            if let Some(id) = &class.class.id {
                self.add_export(&id.name, id.span.start)?;
            }
            Declaration::Class(class)
        } else {
            return Err(self.unexpected_token());
        };

        Ok(Statement::ExportNamed(ExportNamedDeclaration {
            declaration: Some(declaration),
            specifiers: Vec::new(),
            source: None,
            attributes: Vec::new(),
            span: self.span_from(start),
        }))
    }

    /// `export * from "m"` and `export * as ns from "m"`
    fn parse_export_all(&mut self, ctx: Context, start: Mark) -> Result<ExportAllDeclaration, ParseError> {
        self.advance()?;
        let exported = if self.match_keyword("as")? {
            let name = self.parse_module_export_name(ctx)?;
            self.add_export(name.name(), name.span().start)?;
            Some(name)
        } else {
            None
        };
        if !self.match_keyword("from")? {
            return Err(self.unexpected_token());
        }
        let source = self.parse_string_literal(ctx)?;
        let attributes = self.parse_import_attributes(ctx)?;
        self.expect_semicolon()?;
        Ok(ExportAllDeclaration {
            exported,
            source,
            attributes,
            span: self.span_from(start),
        })
    }

    fn parse_export_default(&mut self, ctx: Context, start: Mark) -> Result<ExportDefaultDeclaration, ParseError> {
        let default_at = self.current.start;
        self.advance()?;
        self.add_export("default", default_at)?;

        let declaration = if self.check(&TokenKind::Function) || self.is_async_function()? {
            let function_start = self.mark();
            let is_async = self.match_keyword("async")?;
            self.require_token(&TokenKind::Function)?;
            let function = self.parse_function_declaration(ctx, function_start, is_async, false, true)?;
            ExportDefaultKind::Function(function)
        } else if self.check(&TokenKind::Class) {
            ExportDefaultKind::Class(self.parse_class_declaration(ctx, true)?)
        } else {
            let expression = self.parse_assignment_expression(ctx.allow_in())?;
            self.expect_semicolon()?;
            ExportDefaultKind::Expression(expression)
        };

        Ok(ExportDefaultDeclaration {
            declaration,
            span: self.span_from(start),
        })
    }

    /// `export { a, b as c } [from "m"]`
    fn parse_export_list(&mut self, ctx: Context, start: Mark) -> Result<ExportNamedDeclaration, ParseError> {
        self.advance()?;
        let mut specifiers = Vec::new();
        while !self.match_token(&TokenKind::RBrace)? {
            let specifier_start = self.mark();
            let local = self.parse_module_export_name(ctx)?;
            let exported = if self.match_keyword("as")? {
                self.parse_module_export_name(ctx)?
            } else {
                local.clone()
            };
            self.add_export(exported.name(), exported.span().start)?;
            specifiers.push(ExportSpecifier {
                local,
                exported,
                span: self.span_from(specifier_start),
            });
            if !self.check(&TokenKind::RBrace) {
                self.require_token(&TokenKind::Comma)?;
            }
        }

        let (source, attributes) = if self.match_keyword("from")? {
            let source = self.parse_string_literal(ctx)?;
            (Some(source), self.parse_import_attributes(ctx)?)
        } else {
            // without `from` every local name refers to a top-level binding
            for specifier in &specifiers {
                let ModuleExportName::Identifier(id) = &specifier.local else {
                    return Err(self.syntax_error_at(
                        specifier.local.span().start,
                        "A string literal cannot be used as an exported binding without `from`",
                    ));
                };
                self.check_local_name(id)?;
                self.scopes.export_local(&id.name, id.span.start);
            }
            (None, Vec::new())
        };
        self.expect_semicolon()?;

        Ok(ExportNamedDeclaration {
            declaration: None,
            specifiers,
            source,
            attributes,
            span: self.span_from(start),
        })
    }

    fn add_export(&mut self, name: &str, offset: usize) -> Result<(), ParseError> {
        trace!("export '{}'", name);
        if !self.exported_names.insert(name.to_string()) {
            return Err(self.early_error_at(offset, format!("Duplicate export '{}'", name)));
        }
        Ok(())
    }
}
