//! Literal encoding.
//!
//! Turns a typed SQL literal into a constant of the literal's target
//! representation. Null literals are resolved through
//! [`NullAs::null_outcome`]; the null-test modes fold to a constant without
//! looking at the value.

use chrono::{NaiveTime, Timelike};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use tracing::trace;

use sqlcg_core::{
    LiteralValue, LoweringError, MILLIS_PER_DAY, PrimitiveKind, Repr, SqlType, SqlTypeName,
    TypeSystem,
};

use crate::ir::{Constant, Expression};
use crate::null_as::{Lowered, NullAs};

/// Encode a literal of type `ty`. `value` is `None` for SQL NULL.
pub fn translate_literal(
    value: Option<&LiteralValue>,
    ty: &SqlType,
    types: &dyn TypeSystem,
    null_as: NullAs,
) -> Result<Lowered, LoweringError> {
    let repr = types.repr_for(ty);
    let Some(value) = value else {
        trace!(ty = %ty, ?null_as, "null literal");
        return Ok(null_as.null_outcome(repr));
    };
    match null_as {
        NullAs::IsNull => return Ok(Lowered::Value(Expression::FALSE)),
        NullAs::IsNotNull => return Ok(Lowered::Value(Expression::TRUE)),
        _ => {}
    }
    // A constant is never null; only a projection keeps the declared box so
    // both arms of a null guard agree.
    let repr = if null_as == NullAs::Null {
        repr
    } else {
        repr.to_primitive()
    };
    encode(value, ty, repr).map(Lowered::Value)
}

fn encode(value: &LiteralValue, ty: &SqlType, repr: Repr) -> Result<Expression, LoweringError> {
    match ty.name {
        SqlTypeName::Decimal => decimal(value, ty),
        SqlTypeName::Date => {
            let days = epoch_millis(value, ty)?.div_euclid(MILLIS_PER_DAY);
            integer(days, value, repr)
        }
        SqlTypeName::Time => {
            let millis = epoch_millis(value, ty)?.rem_euclid(MILLIS_PER_DAY);
            integer(millis, value, repr)
        }
        SqlTypeName::Timestamp => integer(epoch_millis(value, ty)?, value, repr),
        SqlTypeName::Char | SqlTypeName::Varchar => match value {
            // Charset and collation are not part of the runtime value.
            LiteralValue::Text(s) => Ok(Expression::constant(
                Constant::String(s.value.clone()),
                repr,
            )),
            _ => Err(invalid(value, ty)),
        },
        _ => match repr.primitive().or(repr.boxed()) {
            Some(kind) => Ok(Expression::constant(primitive(value, ty, kind)?, repr)),
            None => natural(value),
        },
    }
}

/// A decimal is built from its canonical text, never from a binary float.
/// An approximate value must have a decimal form: NaN, infinities and
/// magnitudes beyond the decimal range are rejected.
fn decimal(value: &LiteralValue, ty: &SqlType) -> Result<Expression, LoweringError> {
    let text = match value {
        LiteralValue::Exact(d) => d.to_string(),
        LiteralValue::Approx(f) => Decimal::from_f64(f.0)
            .ok_or_else(|| invalid(value, ty))?
            .to_string(),
        _ => return Err(invalid(value, ty)),
    };
    Ok(Expression::new_instance(
        Repr::Decimal,
        vec![Expression::string(text)],
    ))
}

/// Milliseconds since the epoch of a datetime literal.
fn epoch_millis(value: &LiteralValue, ty: &SqlType) -> Result<i64, LoweringError> {
    match value {
        LiteralValue::Date(d) => Ok(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis()),
        LiteralValue::Time(t) => Ok(i64::from(t.num_seconds_from_midnight()) * 1000
            + i64::from(t.nanosecond() / 1_000_000)),
        LiteralValue::Timestamp(ts) => Ok(ts.and_utc().timestamp_millis()),
        LiteralValue::Exact(d) if d.fract().is_zero() => d.to_i64().ok_or_else(|| out_of_range(value, "i64")),
        _ => Err(invalid(value, ty)),
    }
}

fn integer(v: i64, value: &LiteralValue, repr: Repr) -> Result<Expression, LoweringError> {
    let Some(kind) = repr.primitive().or(repr.boxed()) else {
        return Ok(Expression::constant(
            Constant::Int64(v),
            Repr::Primitive(PrimitiveKind::Int64),
        ));
    };
    let constant = fit_integer(v, kind).ok_or_else(|| out_of_range(value, kind.name()))?;
    Ok(Expression::constant(constant, repr))
}

fn fit_integer(v: i64, kind: PrimitiveKind) -> Option<Constant> {
    match kind {
        PrimitiveKind::Int8 => i8::try_from(v).ok().map(Constant::Int8),
        PrimitiveKind::Int16 => i16::try_from(v).ok().map(Constant::Int16),
        PrimitiveKind::Int32 => i32::try_from(v).ok().map(Constant::Int32),
        PrimitiveKind::Int64 => Some(Constant::Int64(v)),
        PrimitiveKind::Float32 => Some(Constant::Float32(OrderedFloat(v as f32))),
        PrimitiveKind::Float64 => Some(Constant::Float64(OrderedFloat(v as f64))),
        PrimitiveKind::Bool => None,
    }
}

/// A numeric or boolean literal in a primitive kind. Magnitudes that do
/// not fit are rejected rather than wrapped.
fn primitive(value: &LiteralValue, ty: &SqlType, kind: PrimitiveKind) -> Result<Constant, LoweringError> {
    let fitted = match (value, kind) {
        (LiteralValue::Bool(b), PrimitiveKind::Bool) => Some(Constant::Bool(*b)),
        (LiteralValue::Exact(d), PrimitiveKind::Float32) => {
            d.to_f32().map(|f| Constant::Float32(OrderedFloat(f)))
        }
        (LiteralValue::Exact(d), PrimitiveKind::Float64) => {
            d.to_f64().map(|f| Constant::Float64(OrderedFloat(f)))
        }
        (LiteralValue::Exact(d), k) if k.is_integer() => exact_integer(*d).and_then(|v| fit_integer(v, k)),
        (LiteralValue::Approx(f), PrimitiveKind::Float64) => Some(Constant::Float64(*f)),
        (LiteralValue::Approx(f), PrimitiveKind::Float32) => {
            let narrowed = f.0 as f32;
            (narrowed.is_finite() || !f.0.is_finite()).then_some(Constant::Float32(OrderedFloat(narrowed)))
        }
        (LiteralValue::Approx(f), k) if k.is_integer() => {
            let in_range = f.0.fract() == 0.0 && f.0 >= i64::MIN as f64 && f.0 < i64::MAX as f64;
            if in_range {
                fit_integer(f.0 as i64, k)
            } else {
                None
            }
        }
        _ => return Err(invalid(value, ty)),
    };
    fitted.ok_or_else(|| out_of_range(value, kind.name()))
}

fn exact_integer(d: Decimal) -> Option<i64> {
    if d.fract().is_zero() { d.to_i64() } else { None }
}

/// Literals of types without a fixed primitive (`ANY` and friends) keep
/// their natural shape.
fn natural(value: &LiteralValue) -> Result<Expression, LoweringError> {
    Ok(match value {
        LiteralValue::Bool(b) => Expression::bool(*b),
        LiteralValue::Exact(d) => {
            Expression::new_instance(Repr::Decimal, vec![Expression::string(d.to_string())])
        }
        LiteralValue::Approx(f) => Expression::constant(
            Constant::Float64(*f),
            Repr::Primitive(PrimitiveKind::Float64),
        ),
        LiteralValue::Text(s) => Expression::string(s.value.clone()),
        LiteralValue::Date(_) | LiteralValue::Time(_) | LiteralValue::Timestamp(_) => {
            Expression::constant(
                Constant::Int64(epoch_millis(value, &SqlType::new(SqlTypeName::Any))?),
                Repr::Primitive(PrimitiveKind::Int64),
            )
        }
    })
}

fn invalid(value: &LiteralValue, ty: &SqlType) -> LoweringError {
    LoweringError::InvalidLiteral {
        value: value.to_string(),
        ty: ty.to_string(),
    }
}

fn out_of_range(value: &LiteralValue, target: &str) -> LoweringError {
    LoweringError::LiteralOutOfRange {
        value: value.to_string(),
        target: target.to_string(),
    }
}
