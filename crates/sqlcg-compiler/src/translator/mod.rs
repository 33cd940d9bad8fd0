//! The scalar expression translator.
//!
//! [`Translator`] walks a [`Program`]'s expressions and lowers them into a
//! shared [`BlockBuilder`]. Dispatch is by node kind: input references go
//! through the [`InputAccessor`], local references are re-resolved through
//! the program, literals through [`crate::literal`], and calls through the
//! [`ImplementorTable`].
//!
//! A translator is a cheap value. Every field is a shared reference except
//! the nullability overlay, and [`Translator::with_nullability`] returns a new
//! translator rather than changing this one. All copies append to the same
//! block, except inside [`Translator::in_scope`], which lowers into a nested
//! block that only runs where its result is evaluated.

mod nullability;

pub use nullability::NullabilityOverlay;

use std::cell::RefCell;

use tracing::{debug, trace};

use sqlcg_core::{LoweringError, Program, Repr, ScalarExpr, SqlKind, SqlType, TypeSystem};

use crate::emit::BlockBuilder;
use crate::input::InputAccessor;
use crate::ir::{Expression, Statement};
use crate::null_as::{Lowered, NullAs};
use crate::registry::ImplementorTable;
use crate::{cast, constructor, literal};

/// Lowers scalar expressions of one program into one block.
#[derive(Clone)]
pub struct Translator<'a, 'ast> {
    program: &'a Program<'ast>,
    types: &'a dyn TypeSystem,
    input: &'a dyn InputAccessor,
    table: &'a ImplementorTable,
    block: &'a RefCell<BlockBuilder>,
    nullability: NullabilityOverlay<'ast>,
}

impl<'a, 'ast> Translator<'a, 'ast> {
    pub fn new(
        program: &'a Program<'ast>,
        types: &'a dyn TypeSystem,
        input: &'a dyn InputAccessor,
        table: &'a ImplementorTable,
        block: &'a RefCell<BlockBuilder>,
    ) -> Self {
        Self {
            program,
            types,
            input,
            table,
            block,
            nullability: NullabilityOverlay::new(),
        }
    }

    pub fn program(&self) -> &'a Program<'ast> {
        self.program
    }

    pub fn types(&self) -> &'a dyn TypeSystem {
        self.types
    }

    pub fn table(&self) -> &'a ImplementorTable {
        self.table
    }

    pub fn block(&self) -> &'a RefCell<BlockBuilder> {
        self.block
    }

    // =========================================================================
    // Program-level entry points
    // =========================================================================

    /// Lower every projection with the mode its nullability implies.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn translate_projection(&self) -> Result<Vec<Expression>, LoweringError> {
        let projects = self.program.projects();
        debug!(count = projects.len(), "translating projection");
        projects.iter().map(|p| self.translate_default(p)).collect()
    }

    /// Lower the condition as a `WHERE` predicate: unknown rejects the row.
    /// A program without a condition accepts every row.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn translate_condition(&self) -> Result<Expression, LoweringError> {
        match self.program.condition() {
            None => Ok(Expression::TRUE),
            Some(condition) => {
                debug!(condition = %condition, "translating condition");
                self.translate_predicate(condition)
            }
        }
    }

    /// Lower a boolean expression so that null counts as false.
    pub fn translate_predicate(
        &self,
        node: &'ast ScalarExpr<'ast>,
    ) -> Result<Expression, LoweringError> {
        Ok(self
            .translate(node, NullAs::False)?
            .unwrap_or_else(|| Expression::FALSE))
    }

    /// Lower `node` with the mode implied by its nullability. A statically
    /// null value becomes a typed null.
    pub fn translate_default(
        &self,
        node: &'ast ScalarExpr<'ast>,
    ) -> Result<Expression, LoweringError> {
        let null_as = NullAs::of(self.is_nullable(node));
        Ok(self
            .translate(node, null_as)?
            .unwrap_or_else(|| Expression::typed_null(self.repr_for(node.ty()).to_boxed())))
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Lower `node` under `null_as` and bind the result in the block.
    pub fn translate(
        &self,
        node: &'ast ScalarExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        trace!(node = %node, ?null_as, "translate");
        let lowered = self.translate0(node, null_as)?;
        Ok(lowered.map(|expr| self.append("v", expr)))
    }

    fn translate0(
        &self,
        node: &'ast ScalarExpr<'ast>,
        null_as: NullAs,
    ) -> Result<Lowered, LoweringError> {
        match node {
            ScalarExpr::InputRef(input) => {
                if !self.is_nullable(node) {
                    match null_as {
                        NullAs::IsNull => return Ok(Lowered::Value(Expression::FALSE)),
                        NullAs::IsNotNull => return Ok(Lowered::Value(Expression::TRUE)),
                        _ => {}
                    }
                }
                let field = self
                    .input
                    .field(&mut self.block.borrow_mut(), input.index)?;
                let field = self.append("v", field);
                Ok(Lowered::Value(null_as.handle(field)))
            }
            ScalarExpr::LocalRef(local) => {
                let shared = self.program.expr(local.index)?;
                if self.nullability.get(node) == Some(false) {
                    return self.with_nullability(shared, false).translate0(shared, null_as);
                }
                self.translate0(shared, null_as)
            }
            ScalarExpr::Literal(lit) => {
                let nullable = self.is_nullable(node) && null_as != NullAs::NotPossible;
                let ty = self.types.with_nullability(&lit.ty, nullable);
                literal::translate_literal(lit.value.as_ref(), &ty, self.types, null_as)
            }
            ScalarExpr::Call(call) => {
                let implementor =
                    self.table
                        .lookup(&call.op)
                        .ok_or_else(|| LoweringError::UnknownOperator {
                            name: call.op.name.to_string(),
                        })?;
                implementor.implement(self, *call, null_as)
            }
        }
    }

    /// Lower operands left to right. Stops at the first statically-null
    /// operand, which only `NotPossible` can produce.
    pub fn translate_list(
        &self,
        operands: &'ast [ScalarExpr<'ast>],
        null_as: NullAs,
    ) -> Result<Lowered<Vec<Expression>>, LoweringError> {
        let mut values = Vec::with_capacity(operands.len());
        for operand in operands {
            match self.translate(operand, null_as)? {
                Lowered::Value(value) => values.push(value),
                Lowered::AlwaysNull => return Ok(Lowered::AlwaysNull),
            }
        }
        Ok(Lowered::Value(values))
    }

    /// Lower `CAST(operand AS target)`; `operand` is already lowered.
    pub fn translate_cast(
        &self,
        source: &SqlType,
        target: &SqlType,
        operand: Expression,
        nullable: bool,
    ) -> Expression {
        cast::translate_cast(self.types, source, target, operand, nullable)
    }

    /// Build a MAP or ARRAY value from `operands`.
    pub fn translate_constructor(
        &self,
        operands: &'ast [ScalarExpr<'ast>],
        kind: SqlKind,
    ) -> Result<Expression, LoweringError> {
        constructor::translate_constructor(self, operands, kind)
    }

    // =========================================================================
    // Nullability
    // =========================================================================

    /// The asserted nullability of `node`, falling back to its declared type.
    pub fn is_nullable(&self, node: &ScalarExpr<'ast>) -> bool {
        self.nullability
            .get(node)
            .unwrap_or_else(|| node.ty().nullable)
    }

    /// A translator that treats `node` as having the given nullability. The
    /// block is shared with `self`.
    pub fn with_nullability(&self, node: &'ast ScalarExpr<'ast>, nullable: bool) -> Self {
        Self {
            nullability: self.nullability.with(node, nullable),
            ..self.clone()
        }
    }

    // =========================================================================
    // Block access
    // =========================================================================

    pub fn repr_for(&self, ty: &SqlType) -> Repr {
        self.types.repr_for(ty)
    }

    /// A translator appending to `block` instead of this translator's block.
    fn with_block<'b>(&self, block: &'b RefCell<BlockBuilder>) -> Translator<'b, 'ast>
    where
        'a: 'b,
    {
        Translator {
            program: self.program,
            types: self.types,
            input: self.input,
            table: self.table,
            block,
            nullability: self.nullability.clone(),
        }
    }

    /// Run `lower` against a nested block and close it into the value it
    /// produces. Work done by `lower` only happens where that value is
    /// evaluated, so a guard around it also guards the work.
    pub fn in_scope(
        &self,
        lower: impl FnOnce(&Translator<'_, 'ast>) -> Result<Lowered, LoweringError>,
    ) -> Result<Lowered, LoweringError> {
        let scope = RefCell::new(self.block.borrow().nested());
        let lowered = lower(&self.with_block(&scope))?;
        let scope = scope.into_inner();
        Ok(lowered.map(|value| self.block.borrow_mut().close(scope, value)))
    }

    /// Bind `expr` in the shared block.
    pub fn append(&self, hint: &str, expr: Expression) -> Expression {
        self.block.borrow_mut().append(hint, expr)
    }

    /// Add a statement to the shared block.
    pub fn add(&self, statement: Statement) {
        self.block.borrow_mut().add(statement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RowAccessor;
    use bumpalo::Bump;
    use sqlcg_core::{ExprBuilder, PrimitiveKind, StandardTypeSystem, ops};

    struct Fixture {
        types: StandardTypeSystem,
        table: ImplementorTable,
        block: RefCell<BlockBuilder>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                types: StandardTypeSystem,
                table: ImplementorTable::standard(),
                block: RefCell::new(BlockBuilder::new()),
            }
        }
    }

    fn nullable_int() -> SqlType {
        SqlType::integer().with_nullable(true)
    }

    #[test]
    fn input_ref_modes() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let fx = Fixture::new();
        let program = Program::new(&[], &[], None).unwrap();
        let input = RowAccessor::new(&fx.types, &[nullable_int(), SqlType::integer()]);
        let t = Translator::new(&program, &fx.types, &input, &fx.table, &fx.block);

        let x = b.input_ref(0, nullable_int());
        let v = t.translate(x, NullAs::Null).unwrap().value().unwrap();
        assert_eq!(v.repr(), Repr::Boxed(PrimitiveKind::Int32));

        let v = t.translate(x, NullAs::NotPossible).unwrap().value().unwrap();
        assert_eq!(v.repr(), Repr::Primitive(PrimitiveKind::Int32));

        let y = b.input_ref(1, SqlType::integer());
        assert_eq!(
            t.translate(y, NullAs::IsNull).unwrap(),
            Lowered::Value(Expression::FALSE)
        );
    }

    #[test]
    fn identical_reads_share_one_binding() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let fx = Fixture::new();
        let program = Program::new(&[], &[], None).unwrap();
        let input = RowAccessor::new(&fx.types, &[nullable_int()]);
        let t = Translator::new(&program, &fx.types, &input, &fx.table, &fx.block);

        let a = t.translate(b.input_ref(0, nullable_int()), NullAs::Null).unwrap();
        let c = t.translate(b.input_ref(0, nullable_int()), NullAs::Null).unwrap();
        assert_eq!(a, c);
        assert_eq!(fx.block.borrow().len(), 1);
    }

    #[test]
    fn assertion_does_not_leak_to_the_original() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let fx = Fixture::new();
        let program = Program::new(&[], &[], None).unwrap();
        let input = RowAccessor::new(&fx.types, &[nullable_int()]);
        let t = Translator::new(&program, &fx.types, &input, &fx.table, &fx.block);

        let x = b.input_ref(0, nullable_int());
        let asserted = t.with_nullability(x, false);
        assert!(t.is_nullable(x));
        assert!(!asserted.is_nullable(x));
        assert!(!asserted.is_nullable(b.input_ref(0, nullable_int())));

        asserted.translate(x, NullAs::Null).unwrap();
        t.translate(x, NullAs::Null).unwrap();
        assert_eq!(fx.block.borrow().len(), 1);
    }

    #[test]
    fn null_literal_under_not_possible_is_always_null() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let fx = Fixture::new();
        let program = Program::new(&[], &[], None).unwrap();
        let input = RowAccessor::new(&fx.types, &[]);
        let t = Translator::new(&program, &fx.types, &input, &fx.table, &fx.block);

        let null = b.null_literal(SqlType::integer());
        assert!(t.translate(null, NullAs::NotPossible).unwrap().is_always_null());
        assert_eq!(
            t.translate(null, NullAs::Null).unwrap(),
            Lowered::Value(Expression::typed_null(Repr::Boxed(PrimitiveKind::Int32)))
        );
    }

    #[test]
    fn local_refs_resolve_through_the_program() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let fx = Fixture::new();
        let exprs = b.exprs(&[b.input_ref(0, SqlType::integer())]);
        let projects = b.exprs(&[b.local_ref(0, SqlType::integer())]);
        let program = Program::new(exprs, projects, None).unwrap();
        let input = RowAccessor::new(&fx.types, &[SqlType::integer()]);
        let t = Translator::new(&program, &fx.types, &input, &fx.table, &fx.block);

        let projected = t.translate_projection().unwrap();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].to_string(), "v");
    }

    #[test]
    fn no_condition_accepts_every_row() {
        let fx = Fixture::new();
        let program = Program::new(&[], &[], None).unwrap();
        let input = RowAccessor::new(&fx.types, &[]);
        let t = Translator::new(&program, &fx.types, &input, &fx.table, &fx.block);
        assert_eq!(t.translate_condition().unwrap(), Expression::TRUE);
        assert!(fx.block.borrow().is_empty());
    }

    #[test]
    fn unknown_operator_is_fatal() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let fx = Fixture::new();
        let program = Program::new(&[], &[], None).unwrap();
        let input = RowAccessor::new(&fx.types, &[]);
        let t = Translator::new(&program, &fx.types, &input, &fx.table, &fx.block);

        let call = b.call(
            sqlcg_core::Operator::function("SOUNDEX"),
            &[b.char_literal("x")],
            SqlType::varchar(4),
        );
        assert_eq!(
            t.translate(call, NullAs::Null).unwrap_err(),
            LoweringError::UnknownOperator {
                name: "SOUNDEX".to_string()
            }
        );
    }

    #[test]
    fn scoped_work_stays_out_of_the_block() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let fx = Fixture::new();
        let program = Program::new(&[], &[], None).unwrap();
        let input = RowAccessor::new(&fx.types, &[nullable_int()]);
        let t = Translator::new(&program, &fx.types, &input, &fx.table, &fx.block);

        let x = b.input_ref(0, nullable_int());
        let field = t.translate(x, NullAs::Null).unwrap().value().unwrap();
        let scoped = t
            .in_scope(|inner| inner.translate(x, NullAs::NotPossible))
            .unwrap()
            .value()
            .unwrap();
        assert_eq!(field.to_string(), "v");
        assert_eq!(scoped.to_string(), "{ let v0: i32 = v.i32_value(); v0 }");
        assert_eq!(fx.block.borrow().len(), 1);

        let always_null = t
            .in_scope(|inner| inner.translate(b.null_literal(SqlType::integer()), NullAs::NotPossible))
            .unwrap();
        assert!(always_null.is_always_null());
    }

    #[test]
    fn predicate_on_nullable_comparison() {
        let arena = Bump::new();
        let b = ExprBuilder::new(&arena);
        let fx = Fixture::new();
        let cond = b.call(
            ops::GREATER_THAN,
            &[b.input_ref(0, nullable_int()), b.int_literal(5)],
            SqlType::boolean().with_nullable(true),
        );
        let program = Program::new(&[], &[], Some(cond)).unwrap();
        let input = RowAccessor::new(&fx.types, &[nullable_int()]);
        let t = Translator::new(&program, &fx.types, &input, &fx.table, &fx.block);

        let predicate = t.translate_condition().unwrap();
        assert_eq!(predicate.repr(), Repr::BOOL);
        let block = fx.block.take().finish(predicate);
        assert_eq!(
            block.to_string(),
            "let v: i32? = row[0];\n\
             let v0: bool = (v == null);\n\
             let v2: bool = (!v0 && { let v1: i32 = v.i32_value(); (v1 > 5) });\n\
             return v2;"
        );
    }
}
