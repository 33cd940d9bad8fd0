//! Access to fields of the current input row.

use sqlcg_core::{LoweringError, Repr, SqlType, TypeSystem};

use crate::emit::BlockBuilder;
use crate::ir::Expression;

/// Produces the expression that reads one field of the current row.
///
/// The translator knows nothing about the physical row layout; it asks the
/// accessor for field `index` and gets back an expression of the field's
/// representation.
pub trait InputAccessor {
    fn field(&self, block: &mut BlockBuilder, index: usize) -> Result<Expression, LoweringError>;
}

/// Reads positional fields from a row bound to the `row` parameter.
#[derive(Debug, Clone)]
pub struct RowAccessor {
    row: Expression,
    fields: Vec<Repr>,
}

impl RowAccessor {
    /// Name of the parameter the row is bound to.
    pub const ROW_PARAMETER: &'static str = "row";

    /// An accessor for rows with the given field types.
    pub fn new(types: &dyn TypeSystem, fields: &[SqlType]) -> Self {
        Self {
            row: Expression::parameter(Self::ROW_PARAMETER, Repr::List),
            fields: fields.iter().map(|ty| types.repr_for(ty)).collect(),
        }
    }

    pub fn field_reprs(&self) -> &[Repr] {
        &self.fields
    }
}

impl InputAccessor for RowAccessor {
    fn field(&self, block: &mut BlockBuilder, index: usize) -> Result<Expression, LoweringError> {
        let repr = self
            .fields
            .get(index)
            .copied()
            .ok_or(LoweringError::InputFieldOutOfRange {
                index,
                len: self.fields.len(),
            })?;
        let current = block.append(&format!("current{index}"), self.row.clone());
        Ok(Expression::field(current, index, repr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::BlockConfig;
    use sqlcg_core::{PrimitiveKind, StandardTypeSystem};

    #[test]
    fn field_reads_from_row_parameter() {
        let accessor = RowAccessor::new(
            &StandardTypeSystem,
            &[SqlType::integer(), SqlType::integer().with_nullable(true)],
        );
        let mut block = BlockBuilder::new();
        let field = accessor.field(&mut block, 1).unwrap();
        assert_eq!(field.to_string(), "row[1]");
        assert_eq!(field.repr(), Repr::Boxed(PrimitiveKind::Int32));
        assert!(block.is_empty());
    }

    #[test]
    fn unoptimized_block_binds_the_row() {
        let accessor = RowAccessor::new(&StandardTypeSystem, &[SqlType::integer()]);
        let mut block = BlockBuilder::with_config(BlockConfig::unoptimized());
        let field = accessor.field(&mut block, 0).unwrap();
        assert_eq!(field.to_string(), "current0[0]");
        assert_eq!(block.len(), 1);
    }

    #[test]
    fn out_of_range_field() {
        let accessor = RowAccessor::new(&StandardTypeSystem, &[SqlType::integer()]);
        let mut block = BlockBuilder::new();
        assert_eq!(
            accessor.field(&mut block, 2).unwrap_err(),
            LoweringError::InputFieldOutOfRange { index: 2, len: 1 }
        );
    }
}
