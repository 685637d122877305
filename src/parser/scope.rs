//! Binding declarations per lexical scope, for redeclaration early errors.
//!
//! The parser pushes a scope when it enters a block, function, `for` head,
//! catch clause or static block and pops it on exit. Each declaration is
//! checked against the scopes it would share an environment with.

use bitflags::bitflags;
use indexmap::IndexMap;
use log::trace;
use rustc_hash::{FxBuildHasher, FxHashSet};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct ScopeFlags: u8 {
        /// Program body
        const TOP = 1 << 0;
        /// Function (or arrow) parameters and body
        const FUNCTION = 1 << 1;
        /// Catch clause with a plain identifier parameter
        const SIMPLE_CATCH = 1 << 2;
        /// Class static initialization block
        const STATIC_BLOCK = 1 << 3;

        /// Scopes that `var` declarations hoist to
        const VAR = Self::TOP.bits() | Self::FUNCTION.bits() | Self::STATIC_BLOCK.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingKind {
    /// `let`, `const`, `class`, imports, strict block functions
    Lexical,
    /// `var` and parameters
    Var,
    /// Sloppy function declaration
    Function,
    /// The identifier of `catch (e)`
    SimpleCatch,
}

#[derive(Debug)]
struct Scope {
    flags: ScopeFlags,
    lexical: FxHashSet<String>,
    vars: FxHashSet<String>,
    functions: FxHashSet<String>,
    catch_param: Option<String>,
}

impl Scope {
    fn new(flags: ScopeFlags) -> Self {
        Self {
            flags,
            lexical: FxHashSet::default(),
            vars: FxHashSet::default(),
            functions: FxHashSet::default(),
            catch_param: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
    module: bool,
    /// `var e` may redeclare a simple catch parameter
    catch_var_redeclaration: bool,
    /// Names listed in local `export { .. }` clauses not yet declared,
    /// with the offset of their first mention
    undefined_exports: IndexMap<String, usize, FxBuildHasher>,
}

impl ScopeStack {
    pub(crate) fn new(module: bool, web_compat: bool) -> Self {
        Self {
            scopes: vec![Scope::new(ScopeFlags::TOP)],
            module,
            catch_var_redeclaration: web_compat,
            undefined_exports: IndexMap::default(),
        }
    }

    pub(crate) fn enter(&mut self, flags: ScopeFlags) {
        trace!("enter scope {:?} (depth {})", flags, self.scopes.len());
        self.scopes.push(Scope::new(flags));
    }

    pub(crate) fn exit(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
        trace!("exit scope (depth {})", self.scopes.len());
    }

    /// Functions at the top of a function body, or of a script, behave like
    /// `var` when checked against other declarations.
    fn treat_functions_as_var_in(&self, scope: &Scope) -> bool {
        scope.flags.contains(ScopeFlags::FUNCTION)
            || (!self.module && scope.flags.contains(ScopeFlags::TOP))
    }

    pub(crate) fn treat_functions_as_var(&self) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| self.treat_functions_as_var_in(scope))
    }

    /// Record a declaration. Returns `false` when `name` conflicts with an
    /// existing binding.
    pub(crate) fn declare(&mut self, name: &str, kind: BindingKind) -> bool {
        let module = self.module;
        let treat_as_var = self.treat_functions_as_var();
        let mut redeclared = false;

        match kind {
            BindingKind::Lexical => {
                let Some(scope) = self.scopes.last_mut() else {
                    return true;
                };
                redeclared = scope.lexical.contains(name)
                    || scope.functions.contains(name)
                    || scope.vars.contains(name);
                scope.lexical.insert(name.to_string());
                if module && scope.flags.contains(ScopeFlags::TOP) {
                    self.undefined_exports.shift_remove(name);
                }
            }
            BindingKind::SimpleCatch => {
                if let Some(scope) = self.scopes.last_mut() {
                    scope.lexical.insert(name.to_string());
                    scope.catch_param = Some(name.to_string());
                }
            }
            BindingKind::Function => {
                let Some(scope) = self.scopes.last_mut() else {
                    return true;
                };
                redeclared = if treat_as_var {
                    scope.lexical.contains(name)
                } else {
                    scope.lexical.contains(name) || scope.vars.contains(name)
                };
                scope.functions.insert(name.to_string());
            }
            BindingKind::Var => {
                for index in (0..self.scopes.len()).rev() {
                    let Some(scope) = self.scopes.get(index) else {
                        break;
                    };
                    let catch_exempt = self.catch_var_redeclaration
                        && scope.flags.contains(ScopeFlags::SIMPLE_CATCH)
                        && scope.catch_param.as_deref() == Some(name);
                    if (scope.lexical.contains(name) && !catch_exempt)
                        || (!self.treat_functions_as_var_in(scope) && scope.functions.contains(name))
                    {
                        redeclared = true;
                        break;
                    }
                    let is_top = scope.flags.contains(ScopeFlags::TOP);
                    let is_var_scope = scope.flags.intersects(ScopeFlags::VAR);
                    if let Some(scope) = self.scopes.get_mut(index) {
                        scope.vars.insert(name.to_string());
                    }
                    if module && is_top {
                        self.undefined_exports.shift_remove(name);
                    }
                    if is_var_scope {
                        break;
                    }
                }
            }
        }

        if redeclared {
            trace!("redeclaration of '{}' as {:?}", name, kind);
        }
        !redeclared
    }

    /// A local name exported with `export { name }`; it must be declared at
    /// the top level of the module by the end of parsing.
    pub(crate) fn export_local(&mut self, name: &str, offset: usize) {
        let Some(top) = self.scopes.first() else {
            return;
        };
        if !top.lexical.contains(name) && !top.vars.contains(name) {
            self.undefined_exports.entry(name.to_string()).or_insert(offset);
        }
    }

    /// The first exported name that was never declared
    pub(crate) fn first_undefined_export(&self) -> Option<(&str, usize)> {
        self.undefined_exports
            .first()
            .map(|(name, offset)| (name.as_str(), *offset))
    }
}
