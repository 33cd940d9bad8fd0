//! Target representations of runtime values.
//!
//! A [`Repr`] is the concrete shape a value takes in emitted code: a
//! primitive, a nullable box around a primitive, an arbitrary-precision
//! decimal, text, or one of the unconstrained reference shapes.

use std::fmt;

/// Primitive value kinds.
///
/// These are the non-nullable scalar shapes the execution engine computes
/// with directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl PrimitiveKind {
    /// Get the name of this primitive kind.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int8 => "i8",
            PrimitiveKind::Int16 => "i16",
            PrimitiveKind::Int32 => "i32",
            PrimitiveKind::Int64 => "i64",
            PrimitiveKind::Float32 => "f32",
            PrimitiveKind::Float64 => "f64",
        }
    }

    /// Whether this kind is numeric (everything except `Bool`).
    pub const fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Bool)
    }

    /// Whether this kind is a floating-point kind.
    pub const fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float32 | PrimitiveKind::Float64)
    }

    /// Whether this kind is an integer kind.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8 | PrimitiveKind::Int16 | PrimitiveKind::Int32 | PrimitiveKind::Int64
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The runtime representation of a value in emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repr {
    /// A primitive value; never null.
    Primitive(PrimitiveKind),
    /// A nullable box around a primitive.
    Boxed(PrimitiveKind),
    /// Arbitrary-precision decimal (nullable reference).
    Decimal,
    /// Text (nullable reference).
    String,
    /// A boxed number whose primitive kind is not statically known.
    Number,
    /// Unconstrained value.
    Object,
    /// Ordered list.
    List,
    /// Insertion-ordered map.
    Map,
}

impl Repr {
    /// `bool`.
    pub const BOOL: Repr = Repr::Primitive(PrimitiveKind::Bool);
    /// Nullable boolean.
    pub const BOXED_BOOL: Repr = Repr::Boxed(PrimitiveKind::Bool);

    /// The primitive kind if this is a primitive representation.
    pub const fn primitive(self) -> Option<PrimitiveKind> {
        match self {
            Repr::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// The primitive kind if this is a boxed representation.
    pub const fn boxed(self) -> Option<PrimitiveKind> {
        match self {
            Repr::Boxed(kind) => Some(kind),
            _ => None,
        }
    }

    /// Whether this representation is a primitive.
    pub const fn is_primitive(self) -> bool {
        matches!(self, Repr::Primitive(_))
    }

    /// Whether a value of this representation may hold null.
    pub const fn is_nullable(self) -> bool {
        !self.is_primitive()
    }

    /// Whether this representation is statically known to hold a number
    /// without being a box of a particular primitive.
    pub const fn is_numeric_class(self) -> bool {
        matches!(self, Repr::Decimal | Repr::Number)
    }

    /// The boxed counterpart of a primitive; other representations are
    /// returned unchanged.
    pub const fn to_boxed(self) -> Repr {
        match self {
            Repr::Primitive(kind) => Repr::Boxed(kind),
            other => other,
        }
    }

    /// The primitive counterpart of a box; other representations are
    /// returned unchanged.
    pub const fn to_primitive(self) -> Repr {
        match self {
            Repr::Boxed(kind) => Repr::Primitive(kind),
            other => other,
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repr::Primitive(kind) => write!(f, "{kind}"),
            Repr::Boxed(kind) => write!(f, "{kind}?"),
            Repr::Decimal => f.write_str("decimal"),
            Repr::String => f.write_str("string"),
            Repr::Number => f.write_str("number"),
            Repr::Object => f.write_str("object"),
            Repr::List => f.write_str("list"),
            Repr::Map => f.write_str("map"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxing_round_trip() {
        let int = Repr::Primitive(PrimitiveKind::Int32);
        assert_eq!(int.to_boxed(), Repr::Boxed(PrimitiveKind::Int32));
        assert_eq!(int.to_boxed().to_primitive(), int);
        assert_eq!(Repr::String.to_boxed(), Repr::String);
    }

    #[test]
    fn nullability_follows_shape() {
        assert!(!Repr::BOOL.is_nullable());
        assert!(Repr::BOXED_BOOL.is_nullable());
        assert!(Repr::Decimal.is_nullable());
    }

    #[test]
    fn numeric_classes() {
        assert!(Repr::Decimal.is_numeric_class());
        assert!(Repr::Number.is_numeric_class());
        assert!(!Repr::Boxed(PrimitiveKind::Int64).is_numeric_class());
        assert!(!Repr::Object.is_numeric_class());
    }

    #[test]
    fn display() {
        assert_eq!(Repr::Boxed(PrimitiveKind::Int16).to_string(), "i16?");
        assert_eq!(Repr::Primitive(PrimitiveKind::Float64).to_string(), "f64");
    }
}
