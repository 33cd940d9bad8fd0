//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use sqlcg_core::{PrimitiveKind, RuntimeError};

use super::runtime;

/// A value computed by an emitted block.
///
/// Boxing is not tracked: a boxed `i32` and a primitive `i32` are both
/// `Int32`, and a null box is `Null`. Lists and maps are shared and
/// mutable, since emitted code builds them by insertion after allocating
/// them.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(OrderedFloat<f32>),
    Float64(OrderedFloat<f64>),
    Decimal(Decimal),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    /// Insertion ordered; a repeated key keeps its first position.
    Map(Rc<RefCell<IndexMap<Value, Value>>>),
}

impl Value {
    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn map(entries: IndexMap<Value, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Value::Str(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int8(_) => "i8",
            Value::Int16(_) => "i16",
            Value::Int32(_) => "i32",
            Value::Int64(_) => "i64",
            Value::Float32(_) => "f32",
            Value::Float64(_) => "f64",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_bool(&self) -> Result<bool, RuntimeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Null => Err(RuntimeError::NullUnbox {
                target: "bool".to_string(),
            }),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str, RuntimeError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(mismatch("string", other)),
        }
    }

    /// The value as an `i64`, for integer values.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int8(v) => Some(i64::from(v)),
            Value::Int16(v) => Some(i64::from(v)),
            Value::Int32(v) => Some(i64::from(v)),
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// The value as an `f64`, for any numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(f64::from(v.0)),
            Value::Float64(v) => Some(v.0),
            Value::Decimal(d) => d.to_f64(),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Convert a number to another primitive kind. Fractions truncate toward
    /// zero; a value the target cannot hold is an overflow error.
    pub fn to_kind(&self, kind: PrimitiveKind) -> Result<Value, RuntimeError> {
        if self.is_null() {
            return Err(RuntimeError::NullUnbox {
                target: kind.name().to_string(),
            });
        }
        if kind == PrimitiveKind::Bool {
            return self.as_bool().map(Value::Bool);
        }
        if let Value::Decimal(d) = self {
            return decimal_to_kind(*d, kind);
        }
        let overflow = || RuntimeError::Overflow {
            op: format!("{} to {kind}", self.type_name()),
        };
        if let Some(v) = self.as_i64() {
            return Ok(match kind {
                PrimitiveKind::Int8 => Value::Int8(i8::try_from(v).map_err(|_| overflow())?),
                PrimitiveKind::Int16 => Value::Int16(i16::try_from(v).map_err(|_| overflow())?),
                PrimitiveKind::Int32 => Value::Int32(i32::try_from(v).map_err(|_| overflow())?),
                PrimitiveKind::Int64 => Value::Int64(v),
                PrimitiveKind::Float32 => Value::Float32(OrderedFloat(v as f32)),
                PrimitiveKind::Float64 => Value::Float64(OrderedFloat(v as f64)),
                PrimitiveKind::Bool => return Err(mismatch("bool", self)),
            });
        }
        let f = self
            .as_f64()
            .ok_or_else(|| mismatch(kind.name(), self))?;
        // NaN and infinities have no integer value; `to_i*` rejects them.
        let t = f.trunc();
        Ok(match kind {
            PrimitiveKind::Int8 => Value::Int8(t.to_i8().ok_or_else(overflow)?),
            PrimitiveKind::Int16 => Value::Int16(t.to_i16().ok_or_else(overflow)?),
            PrimitiveKind::Int32 => Value::Int32(t.to_i32().ok_or_else(overflow)?),
            PrimitiveKind::Int64 => Value::Int64(t.to_i64().ok_or_else(overflow)?),
            PrimitiveKind::Float32 => {
                let narrowed = f as f32;
                if f.is_finite() && narrowed.is_infinite() {
                    return Err(overflow());
                }
                Value::Float32(OrderedFloat(narrowed))
            }
            PrimitiveKind::Float64 => Value::Float64(OrderedFloat(f)),
            PrimitiveKind::Bool => return Err(mismatch("bool", self)),
        })
    }

    /// Convert a number to a decimal. Null passes through.
    pub fn to_decimal(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Null | Value::Decimal(_) => Ok(self.clone()),
            Value::Str(s) => Decimal::from_str_exact(s)
                .map(Value::Decimal)
                .map_err(|_| mismatch("decimal", self)),
            other => {
                if let Some(v) = other.as_i64() {
                    return Ok(Value::Decimal(Decimal::from(v)));
                }
                other
                    .as_f64()
                    .and_then(Decimal::from_f64_retain)
                    .map(Value::Decimal)
                    .ok_or_else(|| mismatch("decimal", other))
            }
        }
    }
}

fn decimal_to_kind(d: Decimal, kind: PrimitiveKind) -> Result<Value, RuntimeError> {
    let overflow = || RuntimeError::Overflow {
        op: format!("decimal to {kind}"),
    };
    Ok(match kind {
        PrimitiveKind::Int8 => Value::Int8(d.trunc().to_i8().ok_or_else(overflow)?),
        PrimitiveKind::Int16 => Value::Int16(d.trunc().to_i16().ok_or_else(overflow)?),
        PrimitiveKind::Int32 => Value::Int32(d.trunc().to_i32().ok_or_else(overflow)?),
        PrimitiveKind::Int64 => Value::Int64(d.trunc().to_i64().ok_or_else(overflow)?),
        PrimitiveKind::Float32 => Value::Float32(OrderedFloat(d.to_f32().ok_or_else(overflow)?)),
        PrimitiveKind::Float64 => Value::Float64(OrderedFloat(d.to_f64().ok_or_else(overflow)?)),
        PrimitiveKind::Bool => {
            return Err(RuntimeError::TypeMismatch {
                message: "expected bool, found decimal".to_string(),
            });
        }
    })
}

pub(crate) fn mismatch(expected: &str, found: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        message: format!("expected {expected}, found {}", found.type_name()),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int8(v) => v.hash(state),
            Value::Int16(v) => v.hash(state),
            Value::Int32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Float32(v) => v.hash(state),
            Value::Float64(v) => v.hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(values) => values.borrow().hash(state),
            // Map equality ignores order, so only the size is hashed.
            Value::Map(entries) => entries.borrow().len().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => f.write_str(&runtime::format_f32(v.0)),
            Value::Float64(v) => f.write_str(&runtime::format_f64(v.0)),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Str(s) => f.write_str(s),
            Value::List(values) => {
                f.write_str("[")?;
                for (i, value) in values.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(OrderedFloat(v))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_out_of_range_overflows() {
        assert!(matches!(
            Value::Int32(300).to_kind(PrimitiveKind::Int8),
            Err(RuntimeError::Overflow { .. })
        ));
        assert_eq!(
            Value::Int32(-128).to_kind(PrimitiveKind::Int8).unwrap(),
            Value::Int8(-128)
        );
        assert!(matches!(
            Value::Int64(i64::from(i32::MAX) + 1).to_kind(PrimitiveKind::Int32),
            Err(RuntimeError::Overflow { .. })
        ));
        assert_eq!(
            Value::Int32(7).to_kind(PrimitiveKind::Int64).unwrap(),
            Value::Int64(7)
        );
    }

    #[test]
    fn floats_truncate_or_overflow() {
        assert_eq!(
            Value::from(-2.9).to_kind(PrimitiveKind::Int32).unwrap(),
            Value::Int32(-2)
        );
        for f in [1e20, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    Value::from(f).to_kind(PrimitiveKind::Int32),
                    Err(RuntimeError::Overflow { .. })
                ),
                "{f}"
            );
        }
        assert!(matches!(
            Value::from(1e300).to_kind(PrimitiveKind::Float32),
            Err(RuntimeError::Overflow { .. })
        ));
        assert_eq!(
            Value::from(0.5).to_kind(PrimitiveKind::Float32).unwrap(),
            Value::Float32(OrderedFloat(0.5))
        );
        let inf = Value::from(f64::INFINITY).to_kind(PrimitiveKind::Float32).unwrap();
        assert_eq!(inf, Value::Float32(OrderedFloat(f32::INFINITY)));
    }

    #[test]
    fn unboxing_null_fails() {
        assert_eq!(
            Value::Null.to_kind(PrimitiveKind::Int32).unwrap_err(),
            RuntimeError::NullUnbox {
                target: "i32".to_string()
            }
        );
    }

    #[test]
    fn decimal_conversions() {
        let d = Decimal::new(1250, 2);
        assert_eq!(
            Value::Decimal(d).to_kind(PrimitiveKind::Int32).unwrap(),
            Value::Int32(12)
        );
        assert_eq!(
            Value::Int32(3).to_decimal().unwrap(),
            Value::Decimal(Decimal::from(3))
        );
        assert_eq!(
            Value::str("1.50").to_decimal().unwrap(),
            Value::Decimal(Decimal::new(150, 2))
        );
        assert!(Value::Null.to_decimal().unwrap().is_null());
    }

    #[test]
    fn lists_compare_by_content() {
        let a = Value::list(vec![Value::Int32(1), Value::Null]);
        let b = Value::list(vec![Value::Int32(1), Value::Null]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[1, null]");
    }

    #[test]
    fn maps_display_in_insertion_order() {
        let mut entries = IndexMap::new();
        entries.insert(Value::from("b"), Value::Int32(2));
        entries.insert(Value::from("a"), Value::Int32(1));
        assert_eq!(Value::map(entries).to_string(), "{b=2, a=1}");
    }
}
