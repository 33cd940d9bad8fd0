//! Numeric conversions: primitives, boxes and decimals.

use sqlcg_core::{PrimitiveKind, Repr};

use super::{is_numeric, kind_of, null_guard};
use crate::ir::Expression;

/// Rules 2 to 4: any representation to a primitive.
pub(super) fn to_primitive(operand: Expression, from: Repr, kind: PrimitiveKind) -> Expression {
    match from {
        Repr::Primitive(_) => Expression::convert(operand, Repr::Primitive(kind)),
        Repr::Boxed(k) if k == kind || k.is_numeric() => Expression::unbox(operand, kind),
        other if other.is_numeric_class() => Expression::unbox(operand, kind),
        _ => Expression::unbox(Expression::convert(operand, Repr::Boxed(kind)), kind),
    }
}

/// Rule 5.
pub(super) fn boxed_to_boxed(operand: Expression, to: PrimitiveKind) -> Expression {
    let value = Expression::box_primitive(Expression::unbox(operand.clone(), to), to);
    null_guard(operand, value, Repr::Boxed(to))
}

/// Rule 6.
pub(super) fn boxed_to_decimal(operand: Expression, from: PrimitiveKind) -> Expression {
    let value = Expression::new_instance(
        Repr::Decimal,
        vec![Expression::unbox(operand.clone(), from)],
    );
    null_guard(operand, value, Repr::Decimal)
}

/// The representation two numeric operands are brought to before a binary
/// operation: decimal if either is decimal, otherwise the wider primitive
/// kind (boxed if either side is boxed). Non-numeric pairs keep `a`.
pub fn widest(a: Repr, b: Repr) -> Repr {
    if a == b || !is_numeric(a) || !is_numeric(b) {
        return a;
    }
    if a == Repr::Decimal || b == Repr::Decimal {
        return Repr::Decimal;
    }
    match (kind_of(a), kind_of(b)) {
        (Some(x), Some(y)) if a.is_primitive() && b.is_primitive() => Repr::Primitive(x.max(y)),
        (Some(x), Some(y)) => Repr::Boxed(x.max(y)),
        _ => a,
    }
}
