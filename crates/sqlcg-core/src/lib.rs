//! Core types for the sqlcg scalar lowering pass.
//!
//! ## Modules
//!
//! - [`sql_type`]: SQL types with precision and nullability
//! - [`repr`]: Target representations (primitive, boxed, decimal, text, ...)
//! - [`type_system`]: SQL type to representation mapping
//! - [`expr`]: The scalar expression tree consumed by lowering
//! - [`operator`]: Operator identities and well-known operators
//! - [`program`]: Scalar expression programs
//! - [`builder`]: Arena-backed expression construction
//! - [`error`]: Lowering and runtime errors

pub mod builder;
pub mod error;
pub mod expr;
pub mod operator;
pub mod program;
pub mod repr;
pub mod sql_type;
pub mod type_system;

pub use builder::ExprBuilder;
pub use error::{LoweringError, RuntimeError, SqlcgError};
pub use expr::{CallExpr, InputRef, Literal, LiteralValue, LocalRef, NlsString, ScalarExpr};
pub use operator::{Operator, SqlKind, ops};
pub use program::Program;
pub use repr::{PrimitiveKind, Repr};
pub use sql_type::{SqlType, SqlTypeName};
pub use type_system::{StandardTypeSystem, TypeSystem};

/// Milliseconds in one day; the only day/millisecond conversion factor.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
