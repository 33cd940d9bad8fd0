//! AND, OR, NOT and the null tests.
//!
//! These are not strict: `FALSE AND NULL` is `FALSE`. When the caller only
//! needs a two-valued answer (`False`, `True`), each operand is lowered in
//! the same mode and the connective short-circuits over primitive booleans.
//! Operands after the first are lowered into nested scopes so they only run
//! when the connective reaches them. A nullable three-valued result goes
//! through the runtime `and3`/`or3` functions instead.
//!
//! A connective known to be non-null (`NotPossible`) may still have null
//! operands: `NULL AND FALSE` is `FALSE`. Its operands are lowered with null
//! as false, which gives the right answer for both connectives whenever the
//! result itself is not null.

use sqlcg_core::{CallExpr, LoweringError, Repr};

use super::expect_operands;
use crate::conversion;
use crate::ir::{Builtin, Expression};
use crate::null_as::{Lowered, NullAs};
use crate::registry::CallImplementor;
use crate::translator::Translator;

/// `AND` or `OR` over any number of operands.
#[derive(Debug, Clone, Copy)]
pub struct LogicalImplementor {
    and: bool,
}

impl LogicalImplementor {
    pub fn and() -> Self {
        Self { and: true }
    }

    pub fn or() -> Self {
        Self { and: false }
    }

    fn connective(&self, operands: Vec<Expression>) -> Expression {
        if self.and {
            Expression::and_all(operands)
        } else {
            Expression::or_all(operands)
        }
    }

    fn two_valued<'ast>(
        &self,
        translator: &Translator<'_, 'ast>,
        call: &'ast CallExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        let mut operands = Vec::with_capacity(call.operands.len());
        for (i, operand) in call.operands.iter().enumerate() {
            let lowered = if i == 0 {
                translator.translate(operand, null_as)?
            } else {
                translator.in_scope(|scoped| scoped.translate(operand, null_as))?
            };
            match lowered {
                Lowered::Value(value) => operands.push(value),
                Lowered::AlwaysNull => return Ok(Lowered::AlwaysNull),
            }
        }
        Ok(Lowered::Value(self.connective(operands)))
    }
}

impl CallImplementor for LogicalImplementor {
    fn implement<'ast>(
        &self,
        translator: &Translator<'_, 'ast>,
        call: &'ast CallExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        match null_as {
            NullAs::False | NullAs::True => return self.two_valued(translator, call, null_as),
            NullAs::NotPossible => return self.two_valued(translator, call, NullAs::False),
            NullAs::Null | NullAs::IsNull | NullAs::IsNotNull => {}
        }

        if !call.operands.iter().any(|o| translator.is_nullable(o)) {
            return Ok(self
                .two_valued(translator, call, NullAs::NotPossible)?
                .map(|value| null_as.handle(value)));
        }

        let operands: Vec<Expression> =
            match translator.translate_list(call.operands, NullAs::Null)? {
                Lowered::Value(operands) => {
                    operands.into_iter().map(conversion::box_value).collect()
                }
                Lowered::AlwaysNull => return Ok(Lowered::AlwaysNull),
            };
        let builtin = if self.and { Builtin::And3 } else { Builtin::Or3 };
        let value = translator.append("v", Expression::call(builtin, operands));
        Ok(Lowered::Value(null_as.handle(value)))
    }
}

/// `NOT x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotImplementor;

impl CallImplementor for NotImplementor {
    fn implement<'ast>(
        &self,
        translator: &Translator<'_, 'ast>,
        call: &'ast CallExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        expect_operands(call, 1)?;
        let operand = &call.operands[0];
        let negated = |mode| -> Result<Lowered, LoweringError> {
            Ok(translator.translate(operand, mode)?.map(Expression::not))
        };
        match null_as {
            // NOT x is true exactly when x is false, so a null x must count
            // as true before the negation.
            NullAs::False => negated(NullAs::True),
            NullAs::True => negated(NullAs::False),
            NullAs::NotPossible => negated(NullAs::NotPossible),
            NullAs::IsNull | NullAs::IsNotNull => translator.translate(operand, null_as),
            NullAs::Null if !translator.is_nullable(operand) => negated(NullAs::NotPossible),
            NullAs::Null => {
                let value = translator
                    .translate(operand, NullAs::Null)?
                    .unwrap_or_else(|| Expression::typed_null(Repr::BOXED_BOOL));
                if value.is_null_constant() {
                    return Ok(Lowered::Value(value));
                }
                Ok(Lowered::Value(Expression::condition(
                    Expression::is_null(value.clone()),
                    Expression::typed_null(Repr::BOXED_BOOL),
                    conversion::box_value(Expression::not(conversion::unbox_value(value))),
                )))
            }
        }
    }
}

/// `x IS NULL` and `x IS NOT NULL`. The result itself is never null.
#[derive(Debug, Clone, Copy)]
pub struct IsNullImplementor {
    negated: bool,
}

impl IsNullImplementor {
    pub fn is_null() -> Self {
        Self { negated: false }
    }

    pub fn is_not_null() -> Self {
        Self { negated: true }
    }
}

impl CallImplementor for IsNullImplementor {
    fn implement<'ast>(
        &self,
        translator: &Translator<'_, 'ast>,
        call: &'ast CallExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        expect_operands(call, 1)?;
        let mode = if self.negated {
            NullAs::IsNotNull
        } else {
            NullAs::IsNull
        };
        let test = translator
            .translate(&call.operands[0], mode)?
            .unwrap_or_else(|| Expression::bool(!self.negated));
        Ok(Lowered::Value(null_as.never_null(test)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bumpalo::Bump;
    use sqlcg_core::{
        ExprBuilder, Operator, Program, ScalarExpr, SqlType, StandardTypeSystem, ops,
    };

    use super::*;
    use crate::emit::BlockBuilder;
    use crate::input::RowAccessor;
    use crate::registry::ImplementorTable;

    fn nullable_bool() -> SqlType {
        SqlType::boolean().with_nullable(true)
    }

    /// Translate against rows of `(BOOLEAN NULL, BOOLEAN NULL, BOOLEAN,
    /// BOOLEAN)`; returns the result and the rendered statements.
    fn lower<'ast>(node: &'ast ScalarExpr<'ast>, null_as: NullAs) -> (Lowered, String) {
        lower_with(&ImplementorTable::standard(), node, null_as)
    }

    fn lower_with<'ast>(
        table: &ImplementorTable,
        node: &'ast ScalarExpr<'ast>,
        null_as: NullAs,
    ) -> (Lowered, String) {
        let types = StandardTypeSystem;
        let block = RefCell::new(BlockBuilder::new());
        let program = Program::new(&[], &[], None).unwrap();
        let input = RowAccessor::new(
            &types,
            &[
                nullable_bool(),
                nullable_bool(),
                SqlType::boolean(),
                SqlType::boolean(),
            ],
        );
        let t = Translator::new(&program, &types, &input, table, &block);
        let lowered = t.translate(node, null_as).unwrap();
        let rendered = block
            .take()
            .statements()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        (lowered, rendered)
    }

    #[test]
    fn and_as_predicate_short_circuits() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let and = b.call(
            ops::AND,
            &[b.input_ref(0, nullable_bool()), b.input_ref(1, nullable_bool())],
            nullable_bool(),
        );
        let (lowered, block) = lower(and, NullAs::False);
        assert_eq!(lowered.value().unwrap().to_string(), "v3");
        assert_eq!(
            block,
            "let v: bool? = row[0];\n\
             let v0: bool = is_true(v);\n\
             let v3: bool = (v0 && { let v1: bool? = row[1]; let v2: bool = is_true(v1); v2 });"
        );
    }

    #[test]
    fn non_null_connective_tolerates_null_operands() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        for op in [ops::AND, ops::OR] {
            let call = b.call(
                op,
                &[b.input_ref(0, nullable_bool()), b.input_ref(1, nullable_bool())],
                nullable_bool(),
            );
            let (lowered, block) = lower(call, NullAs::NotPossible);
            assert_eq!(lowered.value().unwrap().repr(), Repr::BOOL);
            assert!(block.contains("is_true(v)"), "{block}");
            assert!(!block.contains("bool_value"), "{block}");
        }
    }

    #[test]
    fn nullable_and_uses_three_valued_logic() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let and = b.call(
            ops::AND,
            &[b.input_ref(0, nullable_bool()), b.input_ref(2, SqlType::boolean())],
            nullable_bool(),
        );
        let (lowered, block) = lower(and, NullAs::Null);
        assert_eq!(lowered.value().unwrap().repr(), Repr::BOXED_BOOL);
        assert_eq!(
            block,
            "let v: bool? = row[0];\n\
             let v0: bool = row[2];\n\
             let v1: bool? = and3(v, box(v0));"
        );
    }

    /// Always lowers to a statically-null value.
    struct Unknowable;

    impl CallImplementor for Unknowable {
        fn implement<'ast>(
            &self,
            _: &Translator<'_, 'ast>,
            _: &'ast CallExpr<'ast>,
            _: NullAs,
        ) -> Result<Lowered, LoweringError> {
            Ok(Lowered::AlwaysNull)
        }
    }

    #[test]
    fn statically_null_operand_is_not_dropped() {
        const UNKNOWABLE: Operator = Operator::function("UNKNOWABLE");
        let mut table = ImplementorTable::standard();
        table.register(UNKNOWABLE, Unknowable);

        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        for op in [ops::AND, ops::OR] {
            let call = b.call(
                op,
                &[b.call(UNKNOWABLE, &[], nullable_bool()), b.input_ref(0, nullable_bool())],
                nullable_bool(),
            );
            let (lowered, block) = lower_with(&table, call, NullAs::Null);
            assert_eq!(lowered, Lowered::AlwaysNull);
            assert!(!block.contains("and3") && !block.contains("or3"), "{block}");
        }
    }

    #[test]
    fn not_null_operands_stay_primitive() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let or = b.call(
            ops::OR,
            &[b.input_ref(2, SqlType::boolean()), b.input_ref(3, SqlType::boolean())],
            SqlType::boolean(),
        );
        let (lowered, block) = lower(or, NullAs::Null);
        assert_eq!(lowered.value().unwrap().repr(), Repr::BOOL);
        assert_eq!(
            block,
            "let v: bool = row[2];\n\
             let v1: bool = (v || { let v0: bool = row[3]; v0 });"
        );
    }

    #[test]
    fn constant_operand_folds_the_connective() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let and = b.call(
            ops::AND,
            &[b.input_ref(0, nullable_bool()), b.bool_literal(false)],
            nullable_bool(),
        );
        let (lowered, _) = lower(and, NullAs::False);
        assert_eq!(lowered, Lowered::Value(Expression::FALSE));
    }

    #[test]
    fn not_in_a_predicate_treats_null_as_true_first() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let not = b.call(ops::NOT, &[b.input_ref(0, nullable_bool())], nullable_bool());
        let (_, block) = lower(not, NullAs::False);
        assert_eq!(
            block,
            "let v: bool? = row[0];\n\
             let v0: bool = is_not_false(v);\n\
             let v1: bool = !v0;"
        );
    }

    #[test]
    fn nullable_not_guards_the_unbox() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let not = b.call(ops::NOT, &[b.input_ref(0, nullable_bool())], nullable_bool());
        let (_, block) = lower(not, NullAs::Null);
        assert_eq!(
            block,
            "let v: bool? = row[0];\n\
             let v0: bool? = ((v == null) ? null : box(!v.bool_value()));"
        );
    }

    #[test]
    fn not_of_null_literal_is_null() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let not = b.call(ops::NOT, &[b.null_literal(SqlType::boolean())], nullable_bool());
        let (lowered, block) = lower(not, NullAs::Null);
        assert_eq!(
            lowered,
            Lowered::Value(Expression::typed_null(Repr::BOXED_BOOL))
        );
        assert!(block.is_empty());
    }

    #[test]
    fn is_null_is_never_null() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let is_null = b.call(
            ops::IS_NULL,
            &[b.input_ref(0, nullable_bool())],
            SqlType::boolean(),
        );
        let (lowered, block) = lower(is_null, NullAs::False);
        assert_eq!(lowered.value().unwrap().to_string(), "v0");
        assert_eq!(block, "let v: bool? = row[0];\nlet v0: bool = (v == null);");

        let (lowered, _) = lower(is_null, NullAs::IsNull);
        assert_eq!(lowered, Lowered::Value(Expression::FALSE));
    }

    #[test]
    fn is_not_null_of_not_null_input_folds() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let test = b.call(
            ops::IS_NOT_NULL,
            &[b.input_ref(2, SqlType::boolean())],
            SqlType::boolean(),
        );
        let (lowered, block) = lower(test, NullAs::Null);
        assert_eq!(lowered, Lowered::Value(Expression::TRUE));
        assert!(block.is_empty());
    }
}
