//! Grammar context flags threaded through every parse function.
//!
//! A `Context` is `Copy` and passed by value: callees receive an adjusted
//! copy, so nothing has to be restored on return.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Context: u32 {
        /// Strict mode code
        const STRICT = 1 << 0;
        /// Module goal; `await` is reserved everywhere
        const MODULE = 1 << 1;
        /// `return` is allowed
        const RETURN = 1 << 2;
        /// [Yield]: `yield` is an operator
        const YIELD = 1 << 3;
        /// [Await]: `await` is an operator
        const AWAIT = 1 << 4;
        /// Inside a loop body; unlabeled `continue` is allowed
        const ITERATION = 1 << 5;
        /// Inside a switch body; unlabeled `break` is allowed
        const SWITCH = 1 << 6;
        /// Absence of [In]: a bare `in` ends the expression (for-statement heads)
        const DISALLOW_IN = 1 << 7;
        /// `super.x` and `super[x]` are allowed
        const SUPER_PROPERTY = 1 << 8;
        /// `super()` is allowed (derived class constructors)
        const SUPER_CALL = 1 << 9;
        /// `new.target` is allowed
        const NEW_TARGET = 1 << 10;
        /// Class field initializer; `arguments` is forbidden
        const CLASS_FIELD = 1 << 11;
        /// Class static block; `await` is reserved and `arguments` forbidden
        const STATIC_BLOCK = 1 << 12;
    }
}

impl Context {
    #[inline]
    pub(crate) fn is_strict(self) -> bool {
        self.contains(Self::STRICT)
    }

    #[inline]
    pub(crate) fn is_module(self) -> bool {
        self.contains(Self::MODULE)
    }

    #[inline]
    pub(crate) fn has_yield(self) -> bool {
        self.contains(Self::YIELD)
    }

    #[inline]
    pub(crate) fn has_await(self) -> bool {
        self.contains(Self::AWAIT)
    }

    #[inline]
    pub(crate) fn has_in(self) -> bool {
        !self.contains(Self::DISALLOW_IN)
    }

    /// Context for a nested bracketed construct where `in` is an operator again
    #[inline]
    pub(crate) fn allow_in(self) -> Self {
        self - Self::DISALLOW_IN
    }

    #[inline]
    pub(crate) fn disallow_in(self) -> Self {
        self | Self::DISALLOW_IN
    }

    #[inline]
    pub(crate) fn and(self, flag: Self, set: bool) -> Self {
        if set { self | flag } else { self - flag }
    }

    /// Context for the parameters and body of a non-arrow function.
    ///
    /// Only STRICT and MODULE carry over; everything else is decided by the
    /// function's own kind.
    pub(crate) fn enter_function(self, is_async: bool, is_generator: bool) -> Self {
        (self & (Self::STRICT | Self::MODULE))
            .union(Self::RETURN | Self::NEW_TARGET)
            .and(Self::AWAIT, is_async)
            .and(Self::YIELD, is_generator)
    }

    /// Context for an arrow function body; `super`, `new.target` and the
    /// class field restrictions are inherited lexically.
    pub(crate) fn enter_arrow(self, is_async: bool) -> Self {
        let inherited = self
            & (Self::STRICT
                | Self::MODULE
                | Self::SUPER_PROPERTY
                | Self::SUPER_CALL
                | Self::NEW_TARGET
                | Self::CLASS_FIELD
                | Self::STATIC_BLOCK);
        (inherited | Self::RETURN).and(Self::AWAIT, is_async)
    }
}

/// Where a statement appears, which decides whether declarations are allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementContext {
    /// Block, function body or program body
    StatementList,
    /// Direct body of `if`/`else`
    If,
    /// Body of a labelled statement; carries whether a function may follow
    Label { allow_function: bool },
    /// Any other single-statement position (loops, `with`)
    Single,
}

impl StatementContext {
    pub(crate) fn is_statement_list(self) -> bool {
        self == Self::StatementList
    }
}
