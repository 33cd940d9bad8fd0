//! Persistent nullability overlay.
//!
//! Operators that have already tested an operand for null re-translate it
//! with a "known not null" assertion. Assertions are scoped to the translator
//! value that carries them, so the overlay is an immutable linked list:
//! extending it is O(1) and never disturbs translators that share the tail.

use std::rc::Rc;

use sqlcg_core::ScalarExpr;

/// Overrides of declared nullability, keyed by structural equality.
#[derive(Debug, Clone, Default)]
pub struct NullabilityOverlay<'ast> {
    head: Option<Rc<Assertion<'ast>>>,
}

#[derive(Debug)]
struct Assertion<'ast> {
    expr: &'ast ScalarExpr<'ast>,
    nullable: bool,
    next: Option<Rc<Assertion<'ast>>>,
}

impl<'ast> NullabilityOverlay<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new overlay where `expr` has the given nullability. The newest
    /// assertion for an expression wins.
    pub fn with(&self, expr: &'ast ScalarExpr<'ast>, nullable: bool) -> Self {
        Self {
            head: Some(Rc::new(Assertion {
                expr,
                nullable,
                next: self.head.clone(),
            })),
        }
    }

    /// The asserted nullability of `expr`, if any.
    pub fn get(&self, expr: &ScalarExpr<'ast>) -> Option<bool> {
        let mut node = self.head.as_deref();
        while let Some(assertion) = node {
            if std::ptr::eq(assertion.expr, expr) || assertion.expr == expr {
                return Some(assertion.nullable);
            }
            node = assertion.next.as_deref();
        }
        None
    }

    pub fn len(&self) -> usize {
        let mut len = 0;
        let mut node = self.head.as_deref();
        while let Some(assertion) = node {
            len += 1;
            node = assertion.next.as_deref();
        }
        len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use sqlcg_core::{ExprBuilder, SqlType};

    #[test]
    fn newest_assertion_wins() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let x = b.input_ref(0, SqlType::integer().with_nullable(true));

        let base = NullabilityOverlay::new();
        let not_null = base.with(x, false);
        let nullable_again = not_null.with(x, true);

        assert_eq!(base.get(x), None);
        assert_eq!(not_null.get(x), Some(false));
        assert_eq!(nullable_again.get(x), Some(true));
        assert_eq!(nullable_again.len(), 2);
        assert!(base.is_empty());
    }

    #[test]
    fn lookup_is_structural() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let ty = SqlType::integer().with_nullable(true);
        let overlay = NullabilityOverlay::new().with(b.input_ref(0, ty), false);

        assert_eq!(overlay.get(b.input_ref(0, ty)), Some(false));
        assert_eq!(overlay.get(b.input_ref(1, ty)), None);
    }
}
