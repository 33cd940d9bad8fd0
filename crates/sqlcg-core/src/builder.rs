//! Arena-backed construction of scalar expressions.
//!
//! ```
//! use bumpalo::Bump;
//! use sqlcg_core::{ExprBuilder, SqlType, ops};
//!
//! let arena = Bump::new();
//! let b = ExprBuilder::new(&arena);
//! let sum = b.call(
//!     ops::PLUS,
//!     &[b.input_ref(0, SqlType::integer()), b.int_literal(1)],
//!     SqlType::integer(),
//! );
//! assert_eq!(sum.to_string(), "+($0, 1)");
//! ```

use bumpalo::Bump;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;

use crate::error::LoweringError;
use crate::expr::{CallExpr, InputRef, Literal, LiteralValue, LocalRef, NlsString, ScalarExpr};
use crate::operator::Operator;
use crate::sql_type::{SqlType, SqlTypeName};

/// Builds expression nodes in an arena.
#[derive(Clone, Copy)]
pub struct ExprBuilder<'ast> {
    arena: &'ast Bump,
}

impl<'ast> ExprBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self { arena }
    }

    /// The underlying arena.
    pub fn arena(&self) -> &'ast Bump {
        self.arena
    }

    fn alloc(&self, expr: ScalarExpr<'ast>) -> &'ast ScalarExpr<'ast> {
        self.arena.alloc(expr)
    }

    /// Copy expressions into an arena slice (expression lists, projections).
    pub fn exprs(&self, exprs: &[&ScalarExpr<'ast>]) -> &'ast [ScalarExpr<'ast>] {
        self.arena
            .alloc_slice_fill_iter(exprs.iter().map(|e| (*e).clone()))
    }

    pub fn input_ref(&self, index: usize, ty: SqlType) -> &'ast ScalarExpr<'ast> {
        self.alloc(ScalarExpr::InputRef(InputRef { index, ty }))
    }

    pub fn local_ref(&self, index: usize, ty: SqlType) -> &'ast ScalarExpr<'ast> {
        self.alloc(ScalarExpr::LocalRef(LocalRef { index, ty }))
    }

    pub fn call(
        &self,
        op: Operator,
        operands: &[&ScalarExpr<'ast>],
        ty: SqlType,
    ) -> &'ast ScalarExpr<'ast> {
        let operands = self.exprs(operands);
        self.alloc(ScalarExpr::Call(self.arena.alloc(CallExpr { op, operands, ty })))
    }

    // =========================================================================
    // Literals
    // =========================================================================

    pub fn literal(&self, value: Option<LiteralValue>, ty: SqlType) -> &'ast ScalarExpr<'ast> {
        self.alloc(ScalarExpr::Literal(Literal { value, ty }))
    }

    /// SQL NULL of the given type; the type is made nullable.
    pub fn null_literal(&self, ty: SqlType) -> &'ast ScalarExpr<'ast> {
        self.literal(None, ty.with_nullable(true))
    }

    pub fn bool_literal(&self, value: bool) -> &'ast ScalarExpr<'ast> {
        self.literal(Some(LiteralValue::Bool(value)), SqlType::boolean())
    }

    /// An `INTEGER NOT NULL` literal.
    pub fn int_literal(&self, value: i64) -> &'ast ScalarExpr<'ast> {
        self.exact_literal(Decimal::from(value), SqlType::integer())
    }

    /// An exact numeric literal of an arbitrary numeric type.
    pub fn exact_literal(&self, value: Decimal, ty: SqlType) -> &'ast ScalarExpr<'ast> {
        self.literal(Some(LiteralValue::Exact(value)), ty)
    }

    /// A `DECIMAL(p, s)` literal parsed from its canonical text.
    pub fn decimal_literal(&self, text: &str) -> Result<&'ast ScalarExpr<'ast>, LoweringError> {
        let value = Decimal::from_str_exact(text).map_err(|_| LoweringError::InvalidLiteral {
            value: text.to_string(),
            ty: SqlTypeName::Decimal.to_string(),
        })?;
        let digits = value.mantissa().unsigned_abs().to_string().len() as u32;
        let scale = value.scale();
        let ty = SqlType::decimal(digits.max(scale), scale);
        Ok(self.exact_literal(value, ty))
    }

    pub fn double_literal(&self, value: f64) -> &'ast ScalarExpr<'ast> {
        self.literal(
            Some(LiteralValue::Approx(OrderedFloat(value))),
            SqlType::double(),
        )
    }

    /// A character literal typed `CHAR(n)`, `n` being its length.
    pub fn char_literal(&self, value: &str) -> &'ast ScalarExpr<'ast> {
        let ty = SqlType::char(value.chars().count() as u32);
        self.text_literal(NlsString::new(value), ty)
    }

    pub fn text_literal(&self, value: NlsString, ty: SqlType) -> &'ast ScalarExpr<'ast> {
        self.literal(Some(LiteralValue::Text(value)), ty)
    }

    pub fn date_literal(&self, value: NaiveDate) -> &'ast ScalarExpr<'ast> {
        self.literal(Some(LiteralValue::Date(value)), SqlType::date())
    }

    pub fn time_literal(&self, value: NaiveTime) -> &'ast ScalarExpr<'ast> {
        self.literal(
            Some(LiteralValue::Time(value)),
            SqlType::new(SqlTypeName::Time),
        )
    }

    pub fn timestamp_literal(&self, value: NaiveDateTime) -> &'ast ScalarExpr<'ast> {
        self.literal(
            Some(LiteralValue::Timestamp(value)),
            SqlType::new(SqlTypeName::Timestamp),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_literal_derives_precision_and_scale() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let lit = b.decimal_literal("-123.45").unwrap();
        assert_eq!(*lit.ty(), SqlType::decimal(5, 2));
    }

    #[test]
    fn decimal_literal_rejects_garbage() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        assert!(matches!(
            b.decimal_literal("12x"),
            Err(LoweringError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn char_literal_is_fixed_length() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let lit = b.char_literal("héllo");
        assert_eq!(*lit.ty(), SqlType::char(5));
    }

    #[test]
    fn null_literal_is_nullable() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let lit = b.null_literal(SqlType::integer());
        assert!(lit.ty().nullable);
        match lit {
            ScalarExpr::Literal(l) => assert!(l.is_null()),
            other => panic!("expected literal, got {other:?}"),
        }
    }
}
