//! The runtime function library called by emitted code.
//!
//! String functions pass null through; lowering only guards them when the
//! operand may be null, so a null here means the caller skipped the guard.

use chrono::{Days, NaiveDate};

use sqlcg_compiler::Builtin;
use sqlcg_core::RuntimeError;

use super::value::{Value, mismatch};

/// Invoke `builtin` on already evaluated arguments.
pub fn call(builtin: Builtin, args: &[Value]) -> Result<Value, RuntimeError> {
    match builtin {
        Builtin::IsTrue => Ok(Value::Bool(is_true(arg(builtin, args, 0)?)?)),
        Builtin::IsNotFalse => Ok(Value::Bool(is_not_false(arg(builtin, args, 0)?)?)),
        Builtin::And3 => and3(args),
        Builtin::Or3 => or3(args),
        Builtin::Truncate => {
            let length = arg(builtin, args, 1)?;
            let length = length
                .as_i64()
                .ok_or_else(|| mismatch("integer", length))?;
            string_fn(arg(builtin, args, 0)?, |s| Ok(Value::str(truncate(s, length))))
        }
        Builtin::TrimTrailing => {
            string_fn(arg(builtin, args, 0)?, |s| Ok(Value::str(trim_trailing(s))))
        }
        Builtin::UnixDateToString => match arg(builtin, args, 0)? {
            Value::Null => Ok(Value::Null),
            Value::Int32(days) => unix_date_to_string(*days).map(Value::Str),
            other => Err(mismatch("i32", other)),
        },
        Builtin::FloatToString => match arg(builtin, args, 0)? {
            Value::Float32(f) => Ok(Value::Str(format_f32(f.0))),
            Value::Float64(f) => Ok(Value::Str(format_f64(f.0))),
            other => Err(mismatch("float", other)),
        },
        Builtin::NumberToString | Builtin::ToString => match arg(builtin, args, 0)? {
            Value::Null => Ok(Value::Null),
            value => Ok(Value::Str(value.to_string())),
        },
        Builtin::Upper => string_fn(arg(builtin, args, 0)?, |s| Ok(Value::str(s.to_uppercase()))),
        Builtin::CharLength => string_fn(arg(builtin, args, 0)?, |s| {
            i32::try_from(s.chars().count())
                .map(Value::Int32)
                .map_err(|_| RuntimeError::Overflow {
                    op: "char_length".to_string(),
                })
        }),
        Builtin::Substring => {
            let start = integer_arg(builtin, args, 1)?;
            let length = match args.get(2) {
                Some(_) => Some(integer_arg(builtin, args, 2)?),
                None => None,
            };
            string_fn(arg(builtin, args, 0)?, |s| substring(s, start, length).map(Value::Str))
        }
    }
}

fn integer_arg(builtin: Builtin, args: &[Value], index: usize) -> Result<i64, RuntimeError> {
    let value = arg(builtin, args, index)?;
    value.as_i64().ok_or_else(|| mismatch("integer", value))
}

fn arg<'v>(builtin: Builtin, args: &'v [Value], index: usize) -> Result<&'v Value, RuntimeError> {
    args.get(index).ok_or_else(|| RuntimeError::TypeMismatch {
        message: format!(
            "{} expects at least {} arguments, found {}",
            builtin.name(),
            index + 1,
            args.len()
        ),
    })
}

fn string_fn(
    value: &Value,
    f: impl FnOnce(&str) -> Result<Value, RuntimeError>,
) -> Result<Value, RuntimeError> {
    match value {
        Value::Null => Ok(Value::Null),
        other => f(other.as_str()?),
    }
}

/// Whether a nullable boolean is true. Null is not.
pub fn is_true(value: &Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Null => Ok(false),
        other => other.as_bool(),
    }
}

/// Whether a nullable boolean is not false. Null is not false.
pub fn is_not_false(value: &Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Null => Ok(true),
        other => other.as_bool(),
    }
}

/// Three-valued AND: false if any operand is false, otherwise null if any
/// operand is null.
pub fn and3(args: &[Value]) -> Result<Value, RuntimeError> {
    connective3(args, false)
}

/// Three-valued OR: true if any operand is true, otherwise null if any
/// operand is null.
pub fn or3(args: &[Value]) -> Result<Value, RuntimeError> {
    connective3(args, true)
}

fn connective3(args: &[Value], absorbing: bool) -> Result<Value, RuntimeError> {
    let mut saw_null = false;
    for value in args {
        match value {
            Value::Null => saw_null = true,
            other if other.as_bool()? == absorbing => return Ok(Value::Bool(absorbing)),
            _ => {}
        }
    }
    Ok(if saw_null {
        Value::Null
    } else {
        Value::Bool(!absorbing)
    })
}

/// The first `length` characters of `s`.
pub fn truncate(s: &str, length: i64) -> String {
    let length = usize::try_from(length).unwrap_or(0);
    s.chars().take(length).collect()
}

/// The characters of `s` from the 1-based position `start`, for `length`
/// characters or to the end. Positions before the first character count
/// toward `length` but select nothing.
pub fn substring(s: &str, start: i64, length: Option<i64>) -> Result<String, RuntimeError> {
    let end = match length {
        Some(length) if length < 0 => {
            return Err(RuntimeError::InvalidArgument {
                function: "substring".to_string(),
                message: format!("negative length {length}"),
            });
        }
        Some(length) => Some(start.saturating_add(length)),
        None => None,
    };
    let skip = usize::try_from(start.saturating_sub(1)).unwrap_or(0);
    let chars = s.chars().skip(skip);
    Ok(match end {
        Some(end) => {
            let take = usize::try_from(end.saturating_sub(start.max(1))).unwrap_or(0);
            chars.take(take).collect()
        }
        None => chars.collect(),
    })
}

/// `s` without trailing blanks.
pub fn trim_trailing(s: &str) -> String {
    s.trim_end_matches(' ').to_string()
}

/// Render a day count since 1970-01-01 as `YYYY-MM-DD`.
pub fn unix_date_to_string(days: i32) -> Result<String, RuntimeError> {
    let overflow = || RuntimeError::Overflow {
        op: "unix_date_to_string".to_string(),
    };
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or_else(overflow)?;
    let date = if days >= 0 {
        epoch.checked_add_days(Days::new(u64::from(days.unsigned_abs())))
    } else {
        epoch.checked_sub_days(Days::new(u64::from(days.unsigned_abs())))
    }
    .ok_or_else(overflow)?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Shortest text that reads back as the same `f64`. Integral values have
/// no fractional part.
pub fn format_f64(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        f.to_string()
    }
}

/// [`format_f64`] for `f32`, with `f32` precision.
pub fn format_f32(f: f32) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_valued_connectives() {
        let t = Value::Bool(true);
        let f = Value::Bool(false);
        let n = Value::Null;

        assert_eq!(and3(&[n.clone(), f.clone()]).unwrap(), f);
        assert_eq!(and3(&[n.clone(), t.clone()]).unwrap(), n);
        assert_eq!(and3(&[t.clone(), t.clone()]).unwrap(), t);
        assert_eq!(or3(&[n.clone(), t.clone()]).unwrap(), t);
        assert_eq!(or3(&[n.clone(), f.clone()]).unwrap(), n);
        assert_eq!(or3(&[f.clone(), f.clone()]).unwrap(), f);
    }

    #[test]
    fn null_forcing_predicates() {
        assert!(!is_true(&Value::Null).unwrap());
        assert!(is_not_false(&Value::Null).unwrap());
        assert!(is_true(&Value::Bool(true)).unwrap());
        assert!(!is_not_false(&Value::Bool(false)).unwrap());
    }

    #[test]
    fn string_functions() {
        assert_eq!(truncate("hello world", 5), "hello");
        assert_eq!(truncate("hi", 5), "hi");
        assert_eq!(trim_trailing("ab        "), "ab");
        assert_eq!(trim_trailing("  ab"), "  ab");
        assert_eq!(
            call(Builtin::Upper, &[Value::from("abc")]).unwrap(),
            Value::from("ABC")
        );
        assert_eq!(
            call(Builtin::CharLength, &[Value::from("héllo")]).unwrap(),
            Value::Int32(5)
        );
        assert_eq!(call(Builtin::TrimTrailing, &[Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn substring_counts_from_one() {
        assert_eq!(substring("hello", 2, Some(3)).unwrap(), "ell");
        assert_eq!(substring("hello", 2, None).unwrap(), "ello");
        assert_eq!(substring("hello", 4, Some(10)).unwrap(), "lo");
        assert_eq!(substring("hello", 9, None).unwrap(), "");
        assert_eq!(substring("héllo", 2, Some(1)).unwrap(), "é");
        // Start before the string still consumes length.
        assert_eq!(substring("hello", 0, Some(3)).unwrap(), "he");
        assert_eq!(substring("hello", -2, Some(3)).unwrap(), "");
        assert_eq!(substring("hello", -2, None).unwrap(), "hello");
        assert!(matches!(
            substring("hello", 1, Some(-1)),
            Err(RuntimeError::InvalidArgument { .. })
        ));
        assert_eq!(
            call(
                Builtin::Substring,
                &[Value::from("hello"), Value::Int32(1), Value::Int32(4)]
            )
            .unwrap(),
            Value::from("hell")
        );
        assert_eq!(
            call(Builtin::Substring, &[Value::Null, Value::Int32(1)]).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn dates_render_from_day_counts() {
        assert_eq!(unix_date_to_string(0).unwrap(), "1970-01-01");
        assert_eq!(unix_date_to_string(19_000).unwrap(), "2022-01-08");
        assert_eq!(unix_date_to_string(-1).unwrap(), "1969-12-31");
    }

    #[test]
    fn floats_render_canonically() {
        assert_eq!(format_f64(1.0), "1");
        assert_eq!(format_f64(0.1), "0.1");
        assert_eq!(format_f64(f64::NAN), "NaN");
        assert_eq!(format_f64(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_f32(2.5), "2.5");
    }

    #[test]
    fn missing_argument_is_reported() {
        assert!(matches!(
            call(Builtin::Truncate, &[Value::from("x")]),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }
}
