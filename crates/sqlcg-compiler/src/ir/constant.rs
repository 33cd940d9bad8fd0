//! Constant values embedded in emitted code.

use std::fmt;

use ordered_float::OrderedFloat;
use sqlcg_core::{PrimitiveKind, Repr};

/// A constant value.
///
/// Floats are wrapped in [`OrderedFloat`] so constants can key the block
/// builder's commoning index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// The null reference.
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(OrderedFloat<f32>),
    Float64(OrderedFloat<f64>),
    /// Text.
    String(String),
}

impl Constant {
    /// Whether this is the null constant.
    pub fn is_null(&self) -> bool {
        matches!(self, Constant::Null)
    }

    /// The primitive kind of a non-null, non-text constant.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        match self {
            Constant::Bool(_) => Some(PrimitiveKind::Bool),
            Constant::Int8(_) => Some(PrimitiveKind::Int8),
            Constant::Int16(_) => Some(PrimitiveKind::Int16),
            Constant::Int32(_) => Some(PrimitiveKind::Int32),
            Constant::Int64(_) => Some(PrimitiveKind::Int64),
            Constant::Float32(_) => Some(PrimitiveKind::Float32),
            Constant::Float64(_) => Some(PrimitiveKind::Float64),
            Constant::Null | Constant::String(_) => None,
        }
    }

    /// The natural representation of this constant. Null has none.
    pub fn natural_repr(&self) -> Option<Repr> {
        match self {
            Constant::String(_) => Some(Repr::String),
            other => other.kind().map(Repr::Primitive),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => f.write_str("null"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int8(v) => write!(f, "{v}i8"),
            Constant::Int16(v) => write!(f, "{v}i16"),
            Constant::Int32(v) => write!(f, "{v}"),
            Constant::Int64(v) => write!(f, "{v}L"),
            Constant::Float32(v) => write!(f, "{:?}f", v.0),
            Constant::Float64(v) => write!(f, "{:?}", v.0),
            Constant::String(s) => write!(f, "{s:?}"),
        }
    }
}
