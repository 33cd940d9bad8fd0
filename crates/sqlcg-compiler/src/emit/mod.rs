//! Statement sink for lowered code.
//!
//! The [`BlockBuilder`] collects the statements of one emitted block. The
//! translator appends every intermediate value through
//! [`BlockBuilder::append`], which binds it to a fresh variable and hands
//! back a reference to that variable, so each sub-expression is evaluated
//! once.
//!
//! # Example
//!
//! ```
//! use sqlcg_compiler::emit::BlockBuilder;
//! use sqlcg_compiler::ir::Expression;
//! use sqlcg_core::{PrimitiveKind, Repr};
//!
//! let mut block = BlockBuilder::new();
//! let row = Expression::parameter("row", Repr::List);
//! let field = Expression::field(row, 0, Repr::Primitive(PrimitiveKind::Int32));
//!
//! let a = block.append("v", field.clone());
//! let b = block.append("v", field);
//! assert_eq!(a, b);
//!
//! let block = block.finish(a);
//! assert_eq!(block.statements.len(), 1);
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::ir::{Block, Expression, Statement};

/// Optimizations applied by [`BlockBuilder::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockConfig {
    /// Return constants, variables and parameters as-is instead of binding
    /// them.
    pub inline_trivial: bool,
    /// Reuse the variable of an earlier, structurally identical reusable
    /// expression.
    pub common_bindings: bool,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            inline_trivial: true,
            common_bindings: true,
        }
    }
}

impl BlockConfig {
    /// Bind every appended expression; useful when inspecting raw output.
    pub fn unoptimized() -> Self {
        Self {
            inline_trivial: false,
            common_bindings: false,
        }
    }
}

/// Builds a single block of statements.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    /// Statements in emission order.
    statements: Vec<Statement>,

    /// Every name declared so far.
    names: FxHashSet<String>,

    /// Commoning index: reusable expression to the variable holding it.
    bindings: FxHashMap<Expression, String>,

    config: BlockConfig,
}

impl BlockBuilder {
    /// Create an empty block with the default optimizations.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BlockConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> BlockConfig {
        self.config
    }

    /// Bind `expr` to a variable named after `hint` and return a reference
    /// to it.
    ///
    /// Trivial expressions come back unchanged, and an expression already
    /// bound in this block comes back as the existing variable (subject to
    /// [`BlockConfig`]).
    pub fn append(&mut self, hint: &str, expr: Expression) -> Expression {
        if self.config.inline_trivial && expr.is_trivial() {
            return expr;
        }

        let common = self.config.common_bindings && expr.is_reusable();
        if common && let Some(name) = self.bindings.get(&expr) {
            trace!(name = %name, "reusing binding");
            return Expression::variable(name.clone(), expr.repr());
        }

        let name = self.fresh_name(hint);
        let repr = expr.repr();
        trace!(name = %name, expr = %expr, "binding");
        if common {
            self.bindings.insert(expr.clone(), name.clone());
        }
        self.statements.push(Statement::Declare {
            name: name.clone(),
            value: expr,
        });
        Expression::variable(name, repr)
    }

    /// Add a statement verbatim.
    pub fn add(&mut self, statement: Statement) {
        if let Statement::Declare { name, .. } = &statement {
            self.names.insert(name.clone());
        }
        self.statements.push(statement);
    }

    /// A name starting with `hint` that is not yet declared: `hint`, then
    /// `hint0`, `hint1`, ...
    pub fn fresh_name(&mut self, hint: &str) -> String {
        let mut candidate = hint.to_string();
        let mut i = 0;
        while self.names.contains(&candidate) {
            candidate = format!("{hint}{i}");
            i += 1;
        }
        self.names.insert(candidate.clone());
        candidate
    }

    /// Start a nested block. It can reuse this block's bindings, and the
    /// names it declares never clash with this block's.
    pub fn nested(&self) -> BlockBuilder {
        BlockBuilder {
            statements: Vec::new(),
            names: self.names.clone(),
            bindings: self.bindings.clone(),
            config: self.config,
        }
    }

    /// Close a block started with [`nested`](Self::nested) into a single
    /// expression yielding `result`. Bindings made inside it stay inside.
    pub fn close(&mut self, scope: BlockBuilder, result: Expression) -> Expression {
        self.names.extend(scope.names);
        Expression::scope(scope.statements, result)
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Finish the block with its result expression.
    pub fn finish(self, result: Expression) -> Block {
        Block {
            statements: self.statements,
            result,
        }
    }
}
