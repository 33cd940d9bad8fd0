//! SQL CAST lowering, built on [`crate::conversion`].

use sqlcg_core::{Repr, SqlType, SqlTypeName, TypeSystem};

use crate::conversion::{self, null_guard};
use crate::ir::{Builtin, Expression};

/// Lower `CAST(operand AS target)` where `operand` has SQL type `source`.
///
/// - A DATE rendered as text goes through the calendar formatter rather
///   than the generic integer rendering.
/// - A CHAR rendered as text has its blank padding trimmed.
/// - A CHAR or VARCHAR target with a declared length truncates, unless the
///   source is character data already known to fit.
///
/// Null guards are only emitted when `nullable` is set.
pub fn translate_cast(
    types: &dyn TypeSystem,
    source: &SqlType,
    target: &SqlType,
    operand: Expression,
    nullable: bool,
) -> Expression {
    let target_repr = types.repr_for(target);
    let to_text = target_repr == Repr::String;

    let mut converted = if source.name == SqlTypeName::Date && to_text {
        date_to_text(operand, nullable)
    } else {
        conversion::convert_with_nullability(operand, target_repr, nullable)
    };

    if source.name == SqlTypeName::Char && to_text {
        converted = string_call(Builtin::TrimTrailing, converted, vec![], nullable);
    }

    if let Some(length) = target.precision
        && target.is_character()
        && !fits_without_truncation(source, length)
    {
        converted = string_call(
            Builtin::Truncate,
            converted,
            vec![Expression::int32(i32::try_from(length).unwrap_or(i32::MAX))],
            nullable,
        );
    }
    converted
}

fn fits_without_truncation(source: &SqlType, length: u32) -> bool {
    source.is_character() && source.precision.is_some_and(|p| p <= length)
}

fn date_to_text(operand: Expression, nullable: bool) -> Expression {
    match operand.repr() {
        Repr::Boxed(kind) if !nullable => Expression::call(
            Builtin::UnixDateToString,
            vec![Expression::unbox(operand, kind)],
        ),
        Repr::Boxed(kind) => {
            let value = Expression::call(
                Builtin::UnixDateToString,
                vec![Expression::unbox(operand.clone(), kind)],
            );
            null_guard(operand, value, Repr::String)
        }
        _ => Expression::call(Builtin::UnixDateToString, vec![operand]),
    }
}

/// Apply a string function, passing a null operand through.
fn string_call(
    builtin: Builtin,
    operand: Expression,
    extra: Vec<Expression>,
    nullable: bool,
) -> Expression {
    let never_null = !nullable || operand.is_never_null();
    let mut args = vec![operand.clone()];
    args.extend(extra);
    let call = Expression::call(builtin, args);
    if never_null {
        call
    } else {
        null_guard(operand, call, Repr::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlcg_core::{PrimitiveKind, StandardTypeSystem};

    fn cast(source: SqlType, target: SqlType, operand: Expression) -> String {
        translate_cast(&StandardTypeSystem, &source, &target, operand, source.nullable).to_string()
    }

    #[test]
    fn date_to_varchar_uses_calendar_format() {
        let x = Expression::variable("x", Repr::Primitive(PrimitiveKind::Int32));
        assert_eq!(
            cast(SqlType::date(), SqlType::new(SqlTypeName::Varchar), x),
            "unix_date_to_string(x)"
        );

        let boxed = Expression::variable("x", Repr::Boxed(PrimitiveKind::Int32));
        assert_eq!(
            cast(
                SqlType::date().with_nullable(true),
                SqlType::new(SqlTypeName::Varchar).with_nullable(true),
                boxed
            ),
            "((x == null) ? null : unix_date_to_string(x.i32_value()))"
        );
    }

    #[test]
    fn char_source_is_trimmed() {
        let x = Expression::variable("x", Repr::String);
        assert_eq!(
            cast(SqlType::char(5), SqlType::new(SqlTypeName::Varchar), x.clone()),
            "trim_trailing(x)"
        );
        assert_eq!(
            cast(
                SqlType::char(5).with_nullable(true),
                SqlType::new(SqlTypeName::Varchar).with_nullable(true),
                x
            ),
            "((x == null) ? null : trim_trailing(x))"
        );
    }

    #[test]
    fn narrowing_truncates() {
        let x = Expression::variable("x", Repr::String);
        assert_eq!(
            cast(SqlType::varchar(10), SqlType::varchar(3), x.clone()),
            "truncate(x, 3)"
        );
        assert_eq!(
            cast(SqlType::varchar(10).with_nullable(true), SqlType::varchar(3), x),
            "((x == null) ? null : truncate(x, 3))"
        );
    }

    #[test]
    fn widening_does_not_truncate() {
        let x = Expression::variable("x", Repr::String);
        assert_eq!(cast(SqlType::varchar(3), SqlType::varchar(10), x), "x");
    }

    #[test]
    fn unknown_source_length_truncates() {
        let x = Expression::variable("x", Repr::String);
        assert_eq!(
            cast(SqlType::new(SqlTypeName::Varchar), SqlType::varchar(4), x),
            "truncate(x, 4)"
        );
    }

    #[test]
    fn integer_to_char_converts_then_truncates() {
        let x = Expression::variable("x", Repr::Primitive(PrimitiveKind::Int32));
        assert_eq!(
            cast(SqlType::integer(), SqlType::char(2), x),
            "truncate(number_to_string(x), 2)"
        );
    }

    #[test]
    fn non_null_boxed_operand_is_not_guarded() {
        let flag = Expression::variable("f", Repr::Boxed(PrimitiveKind::Bool));
        let truth = Expression::call(Builtin::IsTrue, vec![flag]);
        let rendered = cast(SqlType::boolean(), SqlType::varchar(3), truth);
        assert_eq!(rendered, "truncate(number_to_string(is_true(f)), 3)");
        assert!(!rendered.contains("null"));

        let date = Expression::variable("d", Repr::Boxed(PrimitiveKind::Int32));
        let rendered = cast(SqlType::date(), SqlType::varchar(10), date);
        assert_eq!(rendered, "truncate(unix_date_to_string(d.i32_value()), 10)");
    }

    #[test]
    fn numeric_cast_uses_conversion() {
        let x = Expression::variable("x", Repr::Primitive(PrimitiveKind::Int32));
        assert_eq!(cast(SqlType::integer(), SqlType::bigint(), x), "(i64) x");
    }
}
