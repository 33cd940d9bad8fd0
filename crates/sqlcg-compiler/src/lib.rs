//! sqlcg Compiler
//!
//! Lowers SQL scalar expression programs into imperative blocks.
//!
//! ## Architecture
//!
//! A [`Translator`] walks the expression tree under a requested
//! [`NullAs`] mode, dispatching calls through an [`ImplementorTable`] and
//! appending every intermediate value to a shared [`BlockBuilder`]. The
//! block builder binds each value to a fresh variable, so a value computed
//! once is never recomputed.
//!
//! ## Modules
//!
//! - [`ir`]: Target expressions, statements and blocks
//! - [`emit`]: Block builder (the statement sink)
//! - [`null_as`]: Null-handling modes and the lowering result type
//! - [`literal`]: Typed literal encoding
//! - [`conversion`]: Representation conversion
//! - [`cast`]: SQL CAST semantics
//! - [`input`]: Input row access
//! - [`registry`]: Operator implementor traits and table
//! - [`operators`]: The standard operator catalog
//! - [`translator`]: The expression translator

pub mod cast;
mod constructor;
pub mod conversion;
pub mod emit;
pub mod input;
pub mod ir;
pub mod literal;
pub mod null_as;
pub mod operators;
pub mod registry;
pub mod translator;

pub use cast::translate_cast;
pub use emit::{BlockBuilder, BlockConfig};
pub use input::{InputAccessor, RowAccessor};
pub use ir::{BinaryOp, Block, Builtin, Constant, Expression, Method, Statement};
pub use literal::translate_literal;
pub use null_as::{Lowered, NullAs};
pub use registry::{AggregateImplementor, CallImplementor, ImplementorTable};
pub use translator::{NullabilityOverlay, Translator};

// Re-export LoweringError from core for convenience
pub use sqlcg_core::LoweringError;

use std::cell::RefCell;

use sqlcg_core::{Program, Repr, SqlType, TypeSystem};
use tracing::debug;

/// The two blocks lowered from one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredProgram {
    /// Evaluates to a primitive boolean: whether the row passes the
    /// condition.
    pub condition: Block,
    /// Evaluates to a list holding one value per projection.
    pub projection: Block,
}

/// Lower `program` against input rows of the given field types.
///
/// The condition and the projection are lowered into separate blocks so the
/// projection only runs for rows the condition accepts.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn lower_program(
    program: &Program<'_>,
    types: &dyn TypeSystem,
    table: &ImplementorTable,
    input_types: &[SqlType],
    config: BlockConfig,
) -> Result<LoweredProgram, LoweringError> {
    let input = RowAccessor::new(types, input_types);

    let block = RefCell::new(BlockBuilder::with_config(config));
    let condition = Translator::new(program, types, &input, table, &block).translate_condition()?;
    let condition = block.into_inner().finish(condition);
    debug!(statements = condition.statements.len(), "condition block finished");

    let block = RefCell::new(BlockBuilder::with_config(config));
    let projections = Translator::new(program, types, &input, table, &block)
        .translate_projection()?
        .into_iter()
        .map(conversion::box_value)
        .collect();
    let projection = block
        .into_inner()
        .finish(Expression::new_instance(Repr::List, projections));
    debug!(statements = projection.statements.len(), "projection block finished");

    Ok(LoweredProgram {
        condition,
        projection,
    })
}
