//! Aggregates over a grouping.

use sqlcg_core::{LoweringError, PrimitiveKind, Repr};

use crate::ir::{Expression, Method};
use crate::registry::AggregateImplementor;

/// `COUNT(*)`: the number of rows in the group.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountAggregate;

impl AggregateImplementor for CountAggregate {
    fn implement_aggregate(
        &self,
        grouping: Expression,
        _accessor: Option<Expression>,
    ) -> Result<Expression, LoweringError> {
        Ok(Expression::method_call(
            grouping,
            Method::Count,
            vec![],
            Repr::Primitive(PrimitiveKind::Int64),
        ))
    }

    fn uses_accessor(&self) -> bool {
        false
    }
}

/// An aggregate folding one value read from each row, such as `SUM`.
///
/// The result is boxed: an empty group yields null.
#[derive(Debug, Clone, Copy)]
pub struct AccessorAggregate {
    method: Method,
}

impl AccessorAggregate {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl AggregateImplementor for AccessorAggregate {
    fn implement_aggregate(
        &self,
        grouping: Expression,
        accessor: Option<Expression>,
    ) -> Result<Expression, LoweringError> {
        let accessor = accessor.ok_or_else(|| LoweringError::OperandCount {
            op: self.method.name().to_uppercase(),
            expected: "1".to_string(),
            found: 0,
        })?;
        let repr = accessor.repr().to_boxed();
        Ok(Expression::method_call(
            grouping,
            self.method,
            vec![accessor],
            repr,
        ))
    }
}
