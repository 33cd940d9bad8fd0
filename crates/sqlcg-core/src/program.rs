//! Scalar expression programs.
//!
//! A [`Program`] bundles a shared expression list with the projections and
//! optional condition that reference it. Structural sharing in the planner's
//! expression DAG is collapsed into the list: a [`LocalRef`] is a plain
//! index that always points into it.
//!
//! [`LocalRef`]: crate::expr::LocalRef

use crate::error::LoweringError;
use crate::expr::ScalarExpr;

/// A scalar expression program.
#[derive(Debug, Clone, Copy)]
pub struct Program<'ast> {
    exprs: &'ast [ScalarExpr<'ast>],
    projects: &'ast [ScalarExpr<'ast>],
    condition: Option<&'ast ScalarExpr<'ast>>,
}

impl<'ast> Program<'ast> {
    /// Create a program, checking that every local reference reachable from
    /// the expression list, projections and condition is in range.
    pub fn new(
        exprs: &'ast [ScalarExpr<'ast>],
        projects: &'ast [ScalarExpr<'ast>],
        condition: Option<&'ast ScalarExpr<'ast>>,
    ) -> Result<Self, LoweringError> {
        let program = Self {
            exprs,
            projects,
            condition,
        };
        for expr in exprs.iter().chain(projects).chain(condition) {
            program.check_refs(expr)?;
        }
        Ok(program)
    }

    fn check_refs(&self, expr: &ScalarExpr<'ast>) -> Result<(), LoweringError> {
        match expr {
            ScalarExpr::LocalRef(r) => {
                self.expr(r.index)?;
                Ok(())
            }
            ScalarExpr::Call(call) => call.operands.iter().try_for_each(|o| self.check_refs(o)),
            ScalarExpr::InputRef(_) | ScalarExpr::Literal(_) => Ok(()),
        }
    }

    /// The shared expression at `index`.
    pub fn expr(&self, index: usize) -> Result<&'ast ScalarExpr<'ast>, LoweringError> {
        self.exprs
            .get(index)
            .ok_or(LoweringError::LocalRefOutOfRange {
                index,
                len: self.exprs.len(),
            })
    }

    /// The shared expression list.
    pub fn exprs(&self) -> &'ast [ScalarExpr<'ast>] {
        self.exprs
    }

    /// The projections, in output order.
    pub fn projects(&self) -> &'ast [ScalarExpr<'ast>] {
        self.projects
    }

    /// The condition; `None` means every row qualifies.
    pub fn condition(&self) -> Option<&'ast ScalarExpr<'ast>> {
        self.condition
    }
}
