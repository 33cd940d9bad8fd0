//! sqlcg: lowering SQL scalar expressions into executable blocks.
//!
//! A planner hands over a [`Program`]: shared sub-expressions, projections
//! and an optional condition, built in an arena with [`ExprBuilder`].
//! [`compile_program`] lowers it into two blocks of imperative code and the
//! [`Vm`] runs those blocks one row at a time.
//!
//! ```
//! use sqlcg::{Bump, ExprBuilder, ImplementorTable, Program, SqlType, StandardTypeSystem, Value};
//! use sqlcg::{compile_program, ops};
//!
//! let arena = Bump::new();
//! let b = ExprBuilder::new(&arena);
//! let a = SqlType::integer().with_nullable(true);
//! let bool_or_null = SqlType::boolean().with_nullable(true);
//!
//! // SELECT $0 + 1 WHERE $0 > 5
//! let condition = b.call(ops::GREATER_THAN, &[b.input_ref(0, a), b.int_literal(5)], bool_or_null);
//! let projects = b.exprs(&[b.call(ops::PLUS, &[b.input_ref(0, a), b.int_literal(1)], a)]);
//! let program = Program::new(&[], projects, Some(condition)).unwrap();
//!
//! let compiled = compile_program(&program, &StandardTypeSystem, &ImplementorTable::standard(), &[a]).unwrap();
//! assert_eq!(compiled.execute(vec![Value::Int32(9)]).unwrap(), Some(vec![Value::Int32(10)]));
//! assert_eq!(compiled.execute(vec![Value::Int32(2)]).unwrap(), None);
//! assert_eq!(compiled.execute(vec![Value::Null]).unwrap(), None);
//! ```

pub mod vm;

pub use vm::{Value, Vm};

pub use bumpalo::Bump;
pub use sqlcg_compiler::{
    AggregateImplementor, Block, BlockBuilder, BlockConfig, CallImplementor, Expression,
    ImplementorTable, InputAccessor, Lowered, LoweredProgram, NullAs, RowAccessor, Statement,
    Translator, lower_program,
};
pub use sqlcg_core::{
    CallExpr, ExprBuilder, LiteralValue, LoweringError, NlsString, Operator, PrimitiveKind,
    Program, Repr, RuntimeError, ScalarExpr, SqlKind, SqlType, SqlTypeName, SqlcgError,
    StandardTypeSystem, TypeSystem, ops,
};

use tracing::debug;

/// A lowered program ready to run against rows.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    lowered: LoweredProgram,
}

impl CompiledProgram {
    /// The block evaluating the condition.
    pub fn condition(&self) -> &Block {
        &self.lowered.condition
    }

    /// The block evaluating the projections as a list.
    pub fn projection(&self) -> &Block {
        &self.lowered.projection
    }

    /// Whether `row` passes the condition. Unknown does not pass.
    pub fn filter(&self, row: Vec<Value>) -> Result<bool, RuntimeError> {
        Vm::new(&self.lowered.condition).run(row)?.as_bool()
    }

    /// The projected values for `row`, one per projection.
    pub fn project(&self, row: Vec<Value>) -> Result<Vec<Value>, RuntimeError> {
        match Vm::new(&self.lowered.projection).run(row)? {
            Value::List(values) => Ok(values.borrow().clone()),
            other => Err(RuntimeError::TypeMismatch {
                message: format!("projection produced {}", other.type_name()),
            }),
        }
    }

    /// Filter then project. `None` when the row is rejected.
    pub fn execute(&self, row: Vec<Value>) -> Result<Option<Vec<Value>>, SqlcgError> {
        if !self.filter(row.clone())? {
            return Ok(None);
        }
        Ok(Some(self.project(row)?))
    }
}

/// Lower `program` for input rows of the given field types with the default
/// block optimizations.
pub fn compile_program(
    program: &Program<'_>,
    types: &dyn TypeSystem,
    table: &ImplementorTable,
    input_types: &[SqlType],
) -> Result<CompiledProgram, LoweringError> {
    compile_program_with_config(program, types, table, input_types, BlockConfig::default())
}

/// [`compile_program`] with explicit block options.
pub fn compile_program_with_config(
    program: &Program<'_>,
    types: &dyn TypeSystem,
    table: &ImplementorTable,
    input_types: &[SqlType],
    config: BlockConfig,
) -> Result<CompiledProgram, LoweringError> {
    let lowered = lower_program(program, types, table, input_types, config)?;
    debug!(
        projections = program.projects().len(),
        has_condition = program.condition().is_some(),
        "compiled program"
    );
    Ok(CompiledProgram { lowered })
}
