//! Operator implementor registry.
//!
//! The translator owns no operator semantics. Every call node is dispatched
//! through an [`ImplementorTable`] keyed by operator name; the standard
//! catalog lives in [`crate::operators`].

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::debug;

use sqlcg_core::{CallExpr, LoweringError, Operator};

use crate::ir::Expression;
use crate::null_as::{Lowered, NullAs};
use crate::translator::Translator;

/// Lowers calls to one scalar operator.
pub trait CallImplementor: Send + Sync {
    /// Lower `call` under `null_as`. Operands are translated through
    /// `translator`, which also gives access to the statement sink.
    fn implement<'ast>(
        &self,
        translator: &Translator<'_, 'ast>,
        call: &'ast CallExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError>;
}

/// Lowers one aggregate function over a group.
pub trait AggregateImplementor: Send + Sync {
    /// Produce the aggregate over `grouping`. `accessor` reads the
    /// aggregated value from one row of the group.
    fn implement_aggregate(
        &self,
        grouping: Expression,
        accessor: Option<Expression>,
    ) -> Result<Expression, LoweringError>;

    /// Whether the aggregate reads a value from each row. `COUNT(*)` has
    /// no operand and is never handed an accessor.
    fn uses_accessor(&self) -> bool {
        true
    }
}

/// Operator name to implementor.
///
/// Read-only once built; one table may serve concurrent translations.
#[derive(Default)]
pub struct ImplementorTable {
    calls: FxHashMap<&'static str, Box<dyn CallImplementor>>,
    aggregates: FxHashMap<&'static str, Box<dyn AggregateImplementor>>,
}

impl ImplementorTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard operator catalog.
    pub fn standard() -> Self {
        crate::operators::standard_table()
    }

    /// Register or replace the implementor for `op`.
    pub fn register(&mut self, op: Operator, implementor: impl CallImplementor + 'static) {
        self.calls.insert(op.name, Box::new(implementor));
    }

    /// Register or replace the aggregate implementor for `op`.
    pub fn register_aggregate(
        &mut self,
        op: Operator,
        implementor: impl AggregateImplementor + 'static,
    ) {
        self.aggregates.insert(op.name, Box::new(implementor));
    }

    pub fn lookup(&self, op: &Operator) -> Option<&dyn CallImplementor> {
        self.calls.get(op.name).map(|b| b.as_ref())
    }

    pub fn lookup_aggregate(&self, op: &Operator) -> Option<&dyn AggregateImplementor> {
        self.aggregates.get(op.name).map(|b| b.as_ref())
    }

    /// Lower `aggregation` over `grouping`. The accessor is withheld from
    /// aggregates that do not read row values.
    pub fn translate_aggregate(
        &self,
        grouping: Expression,
        aggregation: &Operator,
        accessor: Option<Expression>,
    ) -> Result<Expression, LoweringError> {
        let implementor =
            self.lookup_aggregate(aggregation)
                .ok_or_else(|| LoweringError::UnknownAggregate {
                    name: aggregation.name.to_string(),
                })?;
        let accessor = accessor.filter(|_| implementor.uses_accessor());
        debug!(aggregate = aggregation.name, with_accessor = accessor.is_some(), "translating aggregate");
        implementor.implement_aggregate(grouping, accessor)
    }

    pub fn len(&self) -> usize {
        self.calls.len() + self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.aggregates.is_empty()
    }
}

impl fmt::Debug for ImplementorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut calls: Vec<_> = self.calls.keys().collect();
        calls.sort();
        let mut aggregates: Vec<_> = self.aggregates.keys().collect();
        aggregates.sort();
        f.debug_struct("ImplementorTable")
            .field("calls", &calls)
            .field("aggregates", &aggregates)
            .finish()
    }
}
