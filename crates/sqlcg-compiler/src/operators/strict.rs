//! Strict operators: the result is null whenever any operand is null.
//!
//! [`implement_strict`] handles the null side once for every such operator.
//! Nullable operands are tested first; the operator body then sees every
//! operand as a primitive (or non-null reference) under a translator that
//! asserts them non-null. That body is lowered into a nested scope, so no
//! operand is unboxed before its test has passed. The null tests and the
//! value are combined per mode:
//!
//! | mode          | result                          |
//! |---------------|---------------------------------|
//! | `Null`        | `any_null ? null : box(value)`  |
//! | `False`       | `!any_null && value`            |
//! | `True`        | `any_null \|\| value`           |
//! | `IsNull`      | `any_null`                      |
//! | `IsNotNull`   | `!any_null`                     |
//! | `NotPossible` | `value`                         |

use sqlcg_core::{CallExpr, LoweringError, Repr};

use super::{expect_operand_range, expect_operands};
use crate::conversion::{self, widest};
use crate::ir::{BinaryOp, Builtin, Expression};
use crate::null_as::{Lowered, NullAs};
use crate::registry::CallImplementor;
use crate::translator::Translator;

/// Lower a strict call. `value` builds the operator's result from the
/// operand values, which are never null.
pub fn implement_strict<'ast>(
    translator: &Translator<'_, 'ast>,
    call: &'ast CallExpr<'ast>,
    null_as: NullAs,
    value: impl FnOnce(Vec<Expression>) -> Result<Expression, LoweringError>,
) -> Result<Lowered, LoweringError> {
    let result_repr = translator.repr_for(&call.ty);
    let mut inner = translator.clone();
    let mut null_tests = Vec::new();

    for operand in call.operands {
        if !translator.is_nullable(operand) {
            continue;
        }
        if null_as != NullAs::NotPossible {
            let test = translator
                .translate(operand, NullAs::IsNull)?
                .unwrap_or_else(|| Expression::TRUE);
            match test.as_bool() {
                Some(true) => return Ok(null_as.null_outcome(result_repr)),
                Some(false) => {}
                None => null_tests.push(test),
            }
        }
        inner = inner.with_nullability(operand, false);
    }

    let any_null = Expression::or_all(null_tests);
    match null_as {
        NullAs::IsNull => return Ok(Lowered::Value(any_null)),
        NullAs::IsNotNull => return Ok(Lowered::Value(Expression::not(any_null))),
        _ => {}
    }

    // Behind a null test, unboxing and computing must wait for the test.
    let computed = if any_null.as_bool() == Some(false) {
        compute(&inner, call, value)?
    } else {
        inner.in_scope(|scoped| compute(scoped, call, value))?
    };
    let value = match computed {
        Lowered::Value(value) => value,
        Lowered::AlwaysNull => return Ok(null_as.null_outcome(result_repr)),
    };

    Ok(Lowered::Value(match null_as {
        NullAs::NotPossible | NullAs::IsNull | NullAs::IsNotNull => value,
        NullAs::False => Expression::and_also(Expression::not(any_null), value),
        NullAs::True => Expression::or_else(any_null, value),
        NullAs::Null if any_null.as_bool() == Some(false) => value,
        NullAs::Null => Expression::condition(
            any_null,
            Expression::typed_null(result_repr.to_boxed()),
            value.map_result(conversion::box_value),
        ),
    }))
}

/// Lower the operands as non-null values and apply `value` to them.
fn compute<'ast>(
    translator: &Translator<'_, 'ast>,
    call: &'ast CallExpr<'ast>,
    value: impl FnOnce(Vec<Expression>) -> Result<Expression, LoweringError>,
) -> Result<Lowered, LoweringError> {
    match translator.translate_list(call.operands, NullAs::NotPossible)? {
        Lowered::Value(operands) => value(operands).map(Lowered::Value),
        Lowered::AlwaysNull => Ok(Lowered::AlwaysNull),
    }
}

/// Comparison and arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct BinaryImplementor {
    op: BinaryOp,
}

impl BinaryImplementor {
    pub fn new(op: BinaryOp) -> Self {
        Self { op }
    }

    /// Arithmetic is computed in the result's representation; comparisons
    /// bring both sides to the wider of the two.
    fn build(&self, left: Expression, right: Expression, result: Repr) -> Expression {
        let target = if self.op.is_arithmetic() && conversion::is_numeric(result) {
            result
        } else {
            widest(left.repr(), right.repr())
        };
        Expression::binary(
            self.op,
            conversion::convert(left, target),
            conversion::convert(right, target),
        )
    }
}

impl CallImplementor for BinaryImplementor {
    fn implement<'ast>(
        &self,
        translator: &Translator<'_, 'ast>,
        call: &'ast CallExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        expect_operands(call, 2)?;
        let result = translator.repr_for(&translator.types().with_nullability(&call.ty, false));
        implement_strict(translator, call, null_as, |operands| {
            let mut operands = operands.into_iter();
            match (operands.next(), operands.next()) {
                (Some(left), Some(right)) => Ok(self.build(left, right, result)),
                _ => Err(LoweringError::OperandCount {
                    op: call.op.name.to_string(),
                    expected: "2".to_string(),
                    found: call.operands.len(),
                }),
            }
        })
    }
}

/// A runtime library function applied to its operands.
#[derive(Debug, Clone, Copy)]
pub struct FunctionImplementor {
    builtin: Builtin,
}

impl FunctionImplementor {
    pub fn new(builtin: Builtin) -> Self {
        Self { builtin }
    }
}

impl CallImplementor for FunctionImplementor {
    fn implement<'ast>(
        &self,
        translator: &Translator<'_, 'ast>,
        call: &'ast CallExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        let (min, max) = self.builtin.arity();
        expect_operand_range(call, min, max)?;
        implement_strict(translator, call, null_as, |operands| {
            Ok(Expression::call(self.builtin, operands))
        })
    }
}

/// `CAST(x AS type)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CastImplementor;

impl CallImplementor for CastImplementor {
    fn implement<'ast>(
        &self,
        translator: &Translator<'_, 'ast>,
        call: &'ast CallExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        expect_operands(call, 1)?;
        let types = translator.types();
        let source = types.with_nullability(call.operands[0].ty(), false);
        let target = types.with_nullability(&call.ty, false);
        implement_strict(translator, call, null_as, |mut operands| {
            let operand = operands.pop().ok_or_else(|| LoweringError::OperandCount {
                op: call.op.name.to_string(),
                expected: "1".to_string(),
                found: 0,
            })?;
            Ok(translator.translate_cast(&source, &target, operand, false))
        })
    }
}
