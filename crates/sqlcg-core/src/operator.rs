//! Operator identities.
//!
//! An [`Operator`] names a scalar function, predicate or aggregate. The set
//! of operators is open: implementor tables are keyed by operator name, and
//! [`SqlKind`] only classifies operators the lowering core needs to
//! recognise structurally (value constructors, CAST, aggregates).

use std::fmt;

/// Structural classification of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlKind {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Plus,
    Minus,
    Times,
    Divide,
    And,
    Or,
    Not,
    IsNull,
    IsNotNull,
    Cast,
    MapValueConstructor,
    ArrayValueConstructor,
    Count,
    Sum,
    Min,
    Max,
    /// Any other function.
    Other,
}

/// An operator: a name plus its structural kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operator {
    /// Operator name; the implementor table key.
    pub name: &'static str,
    /// Structural kind.
    pub kind: SqlKind,
}

impl Operator {
    pub const fn new(name: &'static str, kind: SqlKind) -> Self {
        Self { name, kind }
    }

    /// Create an operator of kind [`SqlKind::Other`].
    pub const fn function(name: &'static str) -> Self {
        Self::new(name, SqlKind::Other)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Well-known operators.
pub mod ops {
    use super::{Operator, SqlKind};

    pub const EQUALS: Operator = Operator::new("=", SqlKind::Equals);
    pub const NOT_EQUALS: Operator = Operator::new("<>", SqlKind::NotEquals);
    pub const LESS_THAN: Operator = Operator::new("<", SqlKind::LessThan);
    pub const LESS_THAN_OR_EQUAL: Operator = Operator::new("<=", SqlKind::LessThanOrEqual);
    pub const GREATER_THAN: Operator = Operator::new(">", SqlKind::GreaterThan);
    pub const GREATER_THAN_OR_EQUAL: Operator =
        Operator::new(">=", SqlKind::GreaterThanOrEqual);
    pub const PLUS: Operator = Operator::new("+", SqlKind::Plus);
    pub const MINUS: Operator = Operator::new("-", SqlKind::Minus);
    pub const TIMES: Operator = Operator::new("*", SqlKind::Times);
    pub const DIVIDE: Operator = Operator::new("/", SqlKind::Divide);
    pub const AND: Operator = Operator::new("AND", SqlKind::And);
    pub const OR: Operator = Operator::new("OR", SqlKind::Or);
    pub const NOT: Operator = Operator::new("NOT", SqlKind::Not);
    pub const IS_NULL: Operator = Operator::new("IS NULL", SqlKind::IsNull);
    pub const IS_NOT_NULL: Operator = Operator::new("IS NOT NULL", SqlKind::IsNotNull);
    pub const CAST: Operator = Operator::new("CAST", SqlKind::Cast);
    pub const MAP_VALUE_CONSTRUCTOR: Operator =
        Operator::new("MAP", SqlKind::MapValueConstructor);
    pub const ARRAY_VALUE_CONSTRUCTOR: Operator =
        Operator::new("ARRAY", SqlKind::ArrayValueConstructor);
    pub const UPPER: Operator = Operator::function("UPPER");
    pub const CHAR_LENGTH: Operator = Operator::function("CHAR_LENGTH");
    pub const SUBSTRING: Operator = Operator::function("SUBSTRING");

    pub const COUNT: Operator = Operator::new("COUNT", SqlKind::Count);
    pub const SUM: Operator = Operator::new("SUM", SqlKind::Sum);
    pub const MIN: Operator = Operator::new("MIN", SqlKind::Min);
    pub const MAX: Operator = Operator::new("MAX", SqlKind::Max);
}
