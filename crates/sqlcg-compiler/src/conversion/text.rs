//! Rule 8: conversion to text.

use sqlcg_core::Repr;

use super::null_guard;
use crate::ir::{Builtin, Expression};

pub(super) fn to_text(operand: Expression, from: Repr, nullable: bool) -> Expression {
    match from {
        // Floats go through the engine's own formatter so every path renders
        // them identically.
        Repr::Primitive(kind) if kind.is_floating() => {
            Expression::call(Builtin::FloatToString, vec![operand])
        }
        Repr::Primitive(_) => Expression::call(Builtin::NumberToString, vec![operand]),
        Repr::Decimal if !nullable => Expression::call(Builtin::ToString, vec![operand]),
        _ => {
            let value = Expression::call(Builtin::ToString, vec![operand.clone()]);
            null_guard(operand, value, Repr::String)
        }
    }
}
