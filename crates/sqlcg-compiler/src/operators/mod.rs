//! The standard operator catalog.
//!
//! Implementors fall into three groups:
//! - Strict operators (comparison, arithmetic, CAST, string functions):
//!   null if any operand is null. See [`strict`].
//! - Logical operators (AND, OR, NOT, IS [NOT] NULL), which have their own
//!   three-valued rules. See [`logical`].
//! - Value constructors and aggregates.

mod aggregate;
mod logical;
mod strict;

pub use aggregate::{AccessorAggregate, CountAggregate};
pub use logical::{IsNullImplementor, LogicalImplementor, NotImplementor};
pub use strict::{BinaryImplementor, CastImplementor, FunctionImplementor, implement_strict};

use tracing::debug;

use sqlcg_core::{CallExpr, LoweringError, ops};

use crate::ir::{BinaryOp, Builtin, Method};
use crate::null_as::{Lowered, NullAs};
use crate::registry::{CallImplementor, ImplementorTable};
use crate::translator::Translator;

/// Build the table holding every standard operator.
pub(crate) fn standard_table() -> ImplementorTable {
    let mut table = ImplementorTable::new();

    for (op, binary) in [
        (ops::EQUALS, BinaryOp::Equal),
        (ops::NOT_EQUALS, BinaryOp::NotEqual),
        (ops::LESS_THAN, BinaryOp::LessThan),
        (ops::LESS_THAN_OR_EQUAL, BinaryOp::LessThanOrEqual),
        (ops::GREATER_THAN, BinaryOp::GreaterThan),
        (ops::GREATER_THAN_OR_EQUAL, BinaryOp::GreaterThanOrEqual),
        (ops::PLUS, BinaryOp::Add),
        (ops::MINUS, BinaryOp::Subtract),
        (ops::TIMES, BinaryOp::Multiply),
        (ops::DIVIDE, BinaryOp::Divide),
    ] {
        table.register(op, BinaryImplementor::new(binary));
    }

    table.register(ops::AND, LogicalImplementor::and());
    table.register(ops::OR, LogicalImplementor::or());
    table.register(ops::NOT, NotImplementor);
    table.register(ops::IS_NULL, IsNullImplementor::is_null());
    table.register(ops::IS_NOT_NULL, IsNullImplementor::is_not_null());

    table.register(ops::CAST, CastImplementor);
    table.register(ops::UPPER, FunctionImplementor::new(Builtin::Upper));
    table.register(ops::CHAR_LENGTH, FunctionImplementor::new(Builtin::CharLength));
    table.register(ops::SUBSTRING, FunctionImplementor::new(Builtin::Substring));

    table.register(ops::MAP_VALUE_CONSTRUCTOR, ConstructorImplementor);
    table.register(ops::ARRAY_VALUE_CONSTRUCTOR, ConstructorImplementor);

    table.register_aggregate(ops::COUNT, CountAggregate);
    table.register_aggregate(ops::SUM, AccessorAggregate::new(Method::Sum));
    table.register_aggregate(ops::MIN, AccessorAggregate::new(Method::Min));
    table.register_aggregate(ops::MAX, AccessorAggregate::new(Method::Max));

    debug!(implementors = table.len(), "built standard implementor table");
    table
}

/// MAP and ARRAY value constructors. The constructed collection is never
/// null.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstructorImplementor;

impl CallImplementor for ConstructorImplementor {
    fn implement<'ast>(
        &self,
        translator: &Translator<'_, 'ast>,
        call: &'ast CallExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        let value = translator.translate_constructor(call.operands, call.op.kind)?;
        Ok(Lowered::Value(null_as.never_null(value)))
    }
}

/// Fail unless `call` has exactly `expected` operands.
pub(crate) fn expect_operands(call: &CallExpr<'_>, expected: usize) -> Result<(), LoweringError> {
    expect_operand_range(call, expected, expected)
}

/// Fail unless `call` has between `min` and `max` operands.
pub(crate) fn expect_operand_range(
    call: &CallExpr<'_>,
    min: usize,
    max: usize,
) -> Result<(), LoweringError> {
    let found = call.operands.len();
    if (min..=max).contains(&found) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    };
    Err(LoweringError::OperandCount {
        op: call.op.name.to_string(),
        expected,
        found,
    })
}
