//! Null-handling modes and the lowering result type.
//!
//! Every translation request carries a [`NullAs`] telling the translator what
//! the caller wants in place of SQL NULL. Predicates ask for [`NullAs::False`]
//! and never see a null; projections ask for [`NullAs::Null`] and get a
//! nullable value; operators that have already checked their operands ask for
//! [`NullAs::NotPossible`] and get a primitive.

use sqlcg_core::Repr;

use crate::conversion;
use crate::ir::{Builtin, Expression};

/// What a translation should produce in place of SQL NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullAs {
    /// Produce null; the result is nullable.
    Null,
    /// Null becomes `false`; the result is a primitive boolean.
    False,
    /// Null becomes `true`; the result is a primitive boolean.
    True,
    /// The caller asserts the value is never null; the result is unboxed.
    NotPossible,
    /// Produce `true` iff the value is null.
    IsNull,
    /// Produce `true` iff the value is not null.
    IsNotNull,
}

impl NullAs {
    /// The default mode for an expression of the given nullability.
    pub fn of(nullable: bool) -> Self {
        if nullable {
            NullAs::Null
        } else {
            NullAs::NotPossible
        }
    }

    /// Adapt an already-computed value to this mode.
    ///
    /// A primitive is never null: the null tests fold to constants and every
    /// other mode returns it unchanged.
    pub fn handle(self, x: Expression) -> Expression {
        if x.repr().is_primitive() {
            return match self {
                NullAs::IsNull => Expression::FALSE,
                NullAs::IsNotNull => Expression::TRUE,
                _ => x,
            };
        }
        if x.is_null_constant() {
            return match self {
                NullAs::True | NullAs::IsNull => Expression::TRUE,
                NullAs::False | NullAs::IsNotNull => Expression::FALSE,
                NullAs::Null | NullAs::NotPossible => x,
            };
        }
        match self {
            NullAs::Null => x,
            NullAs::NotPossible => conversion::unbox_value(x),
            NullAs::False => Expression::call(Builtin::IsTrue, vec![x]),
            NullAs::True => Expression::call(Builtin::IsNotFalse, vec![x]),
            NullAs::IsNull => Expression::is_null(x),
            NullAs::IsNotNull => Expression::is_not_null(x),
        }
    }

    /// The result for a value known to be null at translation time.
    ///
    /// `repr` is the representation the value would have had; a typed null
    /// uses its boxed form.
    pub fn null_outcome(self, repr: Repr) -> Lowered {
        match self {
            NullAs::True | NullAs::IsNull => Lowered::Value(Expression::TRUE),
            NullAs::False | NullAs::IsNotNull => Lowered::Value(Expression::FALSE),
            NullAs::Null => Lowered::Value(Expression::typed_null(repr.to_boxed())),
            NullAs::NotPossible => Lowered::AlwaysNull,
        }
    }

    /// The result of a translation that cannot be null.
    ///
    /// Collection constructors and null tests use this: the two null tests
    /// fold, every other mode keeps the value.
    pub fn never_null(self, x: Expression) -> Expression {
        match self {
            NullAs::IsNull => Expression::FALSE,
            NullAs::IsNotNull => Expression::TRUE,
            _ => x,
        }
    }
}

/// The outcome of lowering one expression.
///
/// `AlwaysNull` is only produced under [`NullAs::NotPossible`], when the
/// expression is statically null and so no non-null value exists. It is an
/// expected outcome that callers handle, not an error.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lowered<T = Expression> {
    Value(T),
    AlwaysNull,
}

impl<T> Lowered<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lowered<U> {
        match self {
            Lowered::Value(v) => Lowered::Value(f(v)),
            Lowered::AlwaysNull => Lowered::AlwaysNull,
        }
    }

    pub fn is_always_null(&self) -> bool {
        matches!(self, Lowered::AlwaysNull)
    }

    /// The value, or `None` for a statically-null expression.
    pub fn value(self) -> Option<T> {
        match self {
            Lowered::Value(v) => Some(v),
            Lowered::AlwaysNull => None,
        }
    }

    pub fn unwrap_or_else(self, f: impl FnOnce() -> T) -> T {
        self.value().unwrap_or_else(f)
    }
}
