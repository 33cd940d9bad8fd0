//! Representation conversion.
//!
//! [`convert`] rewrites an expression of one [`Repr`] into another. It is
//! pure: it never emits statements, so the result may evaluate its operand
//! more than once (in null guards). Callers pass already-bound variables.
//!
//! ## Conversion Priority
//!
//! Rules are checked in this order:
//! 1. Identity
//! 2. Primitive to primitive (widening or narrowing)
//! 3. Box of the same kind, boxed numeric or numeric class to primitive
//!    (unbox accessor)
//! 4. Anything else to primitive (downcast to the box, then unbox)
//! 5. Boxed numeric to boxed numeric (null-guarded)
//! 6. Boxed numeric to decimal (null-guarded)
//! 7. Primitive numeric to decimal
//! 8. Anything to text
//! 9. Direct cast
//!
//! Rule 3 must precede rule 4, or an unnecessary downcast is inserted.

mod numeric;
mod text;

pub use numeric::widest;

use sqlcg_core::{PrimitiveKind, Repr};

use crate::ir::Expression;

/// Convert `operand` to `to`, assuming the operand may be null.
pub fn convert(operand: Expression, to: Repr) -> Expression {
    convert_with_nullability(operand, to, true)
}

/// Convert `operand` to `to`.
///
/// `nullable` only matters for decimal-to-text conversion, where a value
/// known to be non-null is rendered without a null guard.
pub fn convert_with_nullability(operand: Expression, to: Repr, nullable: bool) -> Expression {
    let from = operand.repr();
    if from == to {
        return operand;
    }

    if let Some(kind) = to.primitive() {
        return numeric::to_primitive(operand, from, kind);
    }

    if let (Some(from_kind), Some(to_kind)) = (from.boxed(), to.boxed())
        && from_kind.is_numeric()
        && to_kind.is_numeric()
    {
        return numeric::boxed_to_boxed(operand, to_kind);
    }

    if to == Repr::Decimal {
        match from {
            Repr::Boxed(kind) if kind.is_numeric() => {
                return numeric::boxed_to_decimal(operand, kind);
            }
            Repr::Primitive(kind) if kind.is_numeric() => {
                return Expression::new_instance(Repr::Decimal, vec![operand]);
            }
            _ => {}
        }
    }

    if to == Repr::String {
        return text::to_text(operand, from, nullable);
    }

    direct_cast(operand, from, to)
}

/// Rule 9. A primitive cast to a box is boxed, converting the primitive
/// first when the kinds differ.
fn direct_cast(operand: Expression, from: Repr, to: Repr) -> Expression {
    match (from, to) {
        (Repr::Primitive(from_kind), Repr::Boxed(to_kind)) => {
            let primitive = if from_kind == to_kind {
                operand
            } else {
                Expression::convert(operand, Repr::Primitive(to_kind))
            };
            Expression::box_primitive(primitive, to_kind)
        }
        _ => Expression::convert(operand, to),
    }
}

/// Box a primitive; other representations are returned unchanged.
pub fn box_value(operand: Expression) -> Expression {
    match operand.repr() {
        Repr::Primitive(kind) => Expression::box_primitive(operand, kind),
        _ => operand,
    }
}

/// Unbox a box; other representations are returned unchanged.
pub fn unbox_value(operand: Expression) -> Expression {
    match operand.repr() {
        Repr::Boxed(kind) => Expression::unbox(operand, kind),
        _ => operand,
    }
}

/// `operand == null ? null : value`, typed as `repr`.
pub(crate) fn null_guard(operand: Expression, value: Expression, repr: Repr) -> Expression {
    Expression::condition(
        Expression::is_null(operand),
        Expression::typed_null(repr),
        value,
    )
}

/// Whether a value of `repr` is numeric, boxed or not.
pub fn is_numeric(repr: Repr) -> bool {
    match repr {
        Repr::Primitive(kind) | Repr::Boxed(kind) => kind.is_numeric(),
        other => other.is_numeric_class(),
    }
}

fn kind_of(repr: Repr) -> Option<PrimitiveKind> {
    repr.primitive().or(repr.boxed())
}
