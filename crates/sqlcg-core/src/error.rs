//! Error types for lowering and execution.
//!
//! ## Error Hierarchy
//!
//! ```text
//! SqlcgError (top-level wrapper)
//! ├── LoweringError - unsupported constructs and malformed programs
//! └── RuntimeError  - failures while executing an emitted block
//! ```
//!
//! A statically-null expression under a "never null" request is not an
//! error; it is reported through the lowering result type instead.

use thiserror::Error;

// ============================================================================
// Lowering Errors
// ============================================================================

/// Defects detected while lowering a scalar expression program.
///
/// None of these are recoverable: they indicate a mismatch between the
/// planner and the engine and abort compilation of the enclosing program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    /// An expression kind with no dispatch rule.
    #[error("cannot translate expression {expr}")]
    UnsupportedExpression {
        /// The offending expression.
        expr: String,
    },

    /// An operator that has no registered implementor.
    #[error("no implementor for operator '{name}'")]
    UnknownOperator {
        /// The operator name.
        name: String,
    },

    /// An aggregate that has no registered implementor.
    #[error("unknown aggregate '{name}'")]
    UnknownAggregate {
        /// The aggregate name.
        name: String,
    },

    /// A value constructor other than MAP or ARRAY.
    #[error("unsupported value constructor {kind}")]
    UnsupportedConstructor {
        /// The constructor kind.
        kind: String,
    },

    /// A local reference outside the program's expression list.
    #[error("local reference $t{index} out of range (program has {len} expressions)")]
    LocalRefOutOfRange {
        /// The referenced index.
        index: usize,
        /// Length of the expression list.
        len: usize,
    },

    /// An input field index past the end of the input row type.
    #[error("input field ${index} out of range (row has {len} fields)")]
    InputFieldOutOfRange {
        /// The referenced field index.
        index: usize,
        /// Number of fields in the input row.
        len: usize,
    },

    /// A numeric literal that does not fit its target representation.
    #[error("literal {value} out of range for {target}")]
    LiteralOutOfRange {
        /// The literal value.
        value: String,
        /// The target representation.
        target: String,
    },

    /// A literal whose value does not match its declared type.
    #[error("invalid literal {value} for type {ty}")]
    InvalidLiteral {
        /// The literal value.
        value: String,
        /// The declared type.
        ty: String,
    },

    /// An operator applied to the wrong number of operands.
    #[error("operator '{op}' expects {expected} operands, found {found}")]
    OperandCount {
        /// The operator name.
        op: String,
        /// Description of the expected count.
        expected: String,
        /// Actual operand count.
        found: usize,
    },
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised while executing an emitted block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A null value was unboxed to a primitive.
    #[error("null value unboxed to {target}")]
    NullUnbox {
        /// The primitive being produced.
        target: String,
    },

    /// A value did not have the shape an operation required.
    #[error("type mismatch: {message}")]
    TypeMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// A variable was read before it was declared.
    #[error("unknown variable '{name}'")]
    UnknownVariable {
        /// The variable name.
        name: String,
    },

    /// A parameter was not bound.
    #[error("unbound parameter '{name}'")]
    UnboundParameter {
        /// The parameter name.
        name: String,
    },

    /// A row field index past the end of the row.
    #[error("field {index} out of range for row of {len} fields")]
    FieldOutOfRange {
        /// The field index.
        index: usize,
        /// Number of fields in the row.
        len: usize,
    },

    /// Integer or decimal division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic overflow.
    #[error("arithmetic overflow in {op}")]
    Overflow {
        /// The operation that overflowed.
        op: String,
    },

    /// A library function was called with an argument outside its domain.
    #[error("invalid argument to {function}: {message}")]
    InvalidArgument {
        /// The function name.
        function: String,
        /// Description of the argument.
        message: String,
    },

    /// A construct the virtual machine cannot execute.
    #[error("unsupported: {message}")]
    Unsupported {
        /// Description of the construct.
        message: String,
    },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for lowering and execution.
///
/// Each variant uses `#[from]` so phase-specific errors convert with `?`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlcgError {
    /// A lowering error.
    #[error(transparent)]
    Lowering(#[from] LoweringError),

    /// A runtime error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl SqlcgError {
    /// Check if this is a lowering error.
    pub fn is_lowering(&self) -> bool {
        matches!(self, SqlcgError::Lowering(_))
    }

    /// Check if this is a runtime error.
    pub fn is_runtime(&self) -> bool {
        matches!(self, SqlcgError::Runtime(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
