//! Mapping from SQL types to target representations.

use crate::repr::{PrimitiveKind, Repr};
use crate::sql_type::{SqlType, SqlTypeName};

/// Computes target representations for SQL types.
///
/// Implementations must be safe for concurrent read-only use; one type
/// system is typically shared by every translation in a process.
pub trait TypeSystem: Send + Sync {
    /// The representation used for values of `ty`.
    fn repr_for(&self, ty: &SqlType) -> Repr;

    /// `ty` with its nullability replaced.
    fn with_nullability(&self, ty: &SqlType, nullable: bool) -> SqlType {
        ty.with_nullable(nullable)
    }
}

/// The default type mapping.
///
/// Nullable types whose NOT NULL form maps to a primitive are boxed. Dates
/// and times are `i32` day and millisecond counts, timestamps `i64`
/// milliseconds since the epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTypeSystem;

impl StandardTypeSystem {
    pub fn new() -> Self {
        Self
    }

    fn primitive_for(name: SqlTypeName) -> Option<PrimitiveKind> {
        match name {
            SqlTypeName::Boolean => Some(PrimitiveKind::Bool),
            SqlTypeName::TinyInt => Some(PrimitiveKind::Int8),
            SqlTypeName::SmallInt => Some(PrimitiveKind::Int16),
            SqlTypeName::Integer | SqlTypeName::Date | SqlTypeName::Time => {
                Some(PrimitiveKind::Int32)
            }
            SqlTypeName::BigInt | SqlTypeName::Timestamp => Some(PrimitiveKind::Int64),
            SqlTypeName::Real => Some(PrimitiveKind::Float32),
            SqlTypeName::Double => Some(PrimitiveKind::Float64),
            _ => None,
        }
    }
}

impl TypeSystem for StandardTypeSystem {
    fn repr_for(&self, ty: &SqlType) -> Repr {
        if let Some(kind) = Self::primitive_for(ty.name) {
            return if ty.nullable {
                Repr::Boxed(kind)
            } else {
                Repr::Primitive(kind)
            };
        }
        match ty.name {
            SqlTypeName::Decimal => Repr::Decimal,
            SqlTypeName::Char | SqlTypeName::Varchar => Repr::String,
            SqlTypeName::Array => Repr::List,
            SqlTypeName::Map => Repr::Map,
            _ => Repr::Object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_primitives_are_boxed() {
        let types = StandardTypeSystem::new();
        assert_eq!(
            types.repr_for(&SqlType::integer()),
            Repr::Primitive(PrimitiveKind::Int32)
        );
        assert_eq!(
            types.repr_for(&SqlType::integer().with_nullable(true)),
            Repr::Boxed(PrimitiveKind::Int32)
        );
    }

    #[test]
    fn datetime_types_are_integers() {
        let types = StandardTypeSystem::new();
        assert_eq!(
            types.repr_for(&SqlType::date()),
            Repr::Primitive(PrimitiveKind::Int32)
        );
        assert_eq!(
            types.repr_for(&SqlType::new(SqlTypeName::Timestamp)),
            Repr::Primitive(PrimitiveKind::Int64)
        );
    }

    #[test]
    fn reference_types_ignore_nullability() {
        let types = StandardTypeSystem::new();
        assert_eq!(types.repr_for(&SqlType::decimal(5, 2)), Repr::Decimal);
        assert_eq!(
            types.repr_for(&SqlType::varchar(4).with_nullable(true)),
            Repr::String
        );
        assert_eq!(types.repr_for(&SqlType::new(SqlTypeName::Any)), Repr::Object);
    }

    #[test]
    fn with_nullability_replaces_flag() {
        let types = StandardTypeSystem::new();
        let ty = types.with_nullability(&SqlType::char(2), true);
        assert!(ty.nullable);
        assert_eq!(ty.precision, Some(2));
    }
}
