//! Scalar expression tree.
//!
//! Expressions are produced by the planner and only read by the lowering
//! pass. Nodes live in an arena and are borrowed for `'ast`; operator
//! operands are arena slices. Equality and hashing are structural, so two
//! separately built copies of `$0 + 1` are the same expression.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;

use crate::operator::Operator;
use crate::sql_type::SqlType;

/// A scalar expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarExpr<'ast> {
    /// A field of the current input row.
    InputRef(InputRef),
    /// A shared sub-expression in the program's expression list.
    LocalRef(LocalRef),
    /// A typed constant.
    Literal(Literal),
    /// An operator applied to operands.
    Call(&'ast CallExpr<'ast>),
}

impl<'ast> ScalarExpr<'ast> {
    /// The declared SQL type of this node.
    pub fn ty(&self) -> &SqlType {
        match self {
            ScalarExpr::InputRef(r) => &r.ty,
            ScalarExpr::LocalRef(r) => &r.ty,
            ScalarExpr::Literal(l) => &l.ty,
            ScalarExpr::Call(c) => &c.ty,
        }
    }

    /// A short name for the node kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ScalarExpr::InputRef(_) => "input ref",
            ScalarExpr::LocalRef(_) => "local ref",
            ScalarExpr::Literal(_) => "literal",
            ScalarExpr::Call(_) => "call",
        }
    }

    /// The call node, if this is a call.
    pub fn as_call(&self) -> Option<&'ast CallExpr<'ast>> {
        match self {
            ScalarExpr::Call(call) => Some(*call),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::InputRef(r) => write!(f, "${}", r.index),
            ScalarExpr::LocalRef(r) => write!(f, "$t{}", r.index),
            ScalarExpr::Literal(l) => match &l.value {
                Some(value) => write!(f, "{value}"),
                None => f.write_str("null"),
            },
            ScalarExpr::Call(c) => {
                write!(f, "{}(", c.op)?;
                for (i, operand) in c.operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{operand}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Reference to a field of the current input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputRef {
    /// 0-based field index.
    pub index: usize,
    /// Field type.
    pub ty: SqlType,
}

/// Reference into the program's shared expression list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalRef {
    /// Index into the expression list.
    pub index: usize,
    /// Type of the referenced expression.
    pub ty: SqlType,
}

/// A typed constant. `value` is `None` for SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: Option<LiteralValue>,
    pub ty: SqlType,
}

impl Literal {
    /// Whether this literal is SQL NULL.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

/// The value of a non-null literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Bool(bool),
    /// Any exact numeric, including integers.
    Exact(Decimal),
    /// Approximate numeric.
    Approx(OrderedFloat<f64>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Text(NlsString),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            LiteralValue::Exact(d) => write!(f, "{d}"),
            LiteralValue::Approx(d) => write!(f, "{}E0", d.0),
            LiteralValue::Date(d) => write!(f, "DATE '{d}'"),
            LiteralValue::Time(t) => write!(f, "TIME '{t}'"),
            LiteralValue::Timestamp(ts) => write!(f, "TIMESTAMP '{ts}'"),
            LiteralValue::Text(s) => write!(f, "'{}'", s.value),
        }
    }
}

/// A character string with its national-language attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NlsString {
    /// The characters.
    pub value: String,
    /// Character set name, if declared.
    pub charset: Option<String>,
    /// Collation name, if declared.
    pub collation: Option<String>,
}

impl NlsString {
    /// A string with no charset or collation.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            charset: None,
            collation: None,
        }
    }

    /// Attach a collation.
    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }
}

/// An operator applied to an ordered list of operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallExpr<'ast> {
    pub op: Operator,
    pub operands: &'ast [ScalarExpr<'ast>],
    /// Result type.
    pub ty: SqlType,
}

impl<'ast> CallExpr<'ast> {
    /// The operand at `index`, if present.
    pub fn operand(&self, index: usize) -> Option<&'ast ScalarExpr<'ast>> {
        self.operands.get(index)
    }
}
