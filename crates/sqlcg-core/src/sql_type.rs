//! SqlType - a relational type with precision, scale and nullability.
//!
//! # Example
//!
//! ```
//! use sqlcg_core::{SqlType, SqlTypeName};
//!
//! let name = SqlType::varchar(20).with_nullable(true);
//! assert_eq!(name.name, SqlTypeName::Varchar);
//! assert_eq!(name.precision, Some(20));
//! assert_eq!(name.to_string(), "VARCHAR(20)");
//!
//! let count = SqlType::new(SqlTypeName::BigInt);
//! assert_eq!(count.to_string(), "BIGINT NOT NULL");
//! ```

use std::fmt::{self, Display, Formatter};

/// The name (family) of a SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlTypeName {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Real,
    Double,
    Date,
    Time,
    Timestamp,
    Char,
    Varchar,
    Array,
    Map,
    Any,
}

impl SqlTypeName {
    /// The SQL spelling of this type name.
    pub const fn name(self) -> &'static str {
        match self {
            SqlTypeName::Boolean => "BOOLEAN",
            SqlTypeName::TinyInt => "TINYINT",
            SqlTypeName::SmallInt => "SMALLINT",
            SqlTypeName::Integer => "INTEGER",
            SqlTypeName::BigInt => "BIGINT",
            SqlTypeName::Decimal => "DECIMAL",
            SqlTypeName::Real => "REAL",
            SqlTypeName::Double => "DOUBLE",
            SqlTypeName::Date => "DATE",
            SqlTypeName::Time => "TIME",
            SqlTypeName::Timestamp => "TIMESTAMP",
            SqlTypeName::Char => "CHAR",
            SqlTypeName::Varchar => "VARCHAR",
            SqlTypeName::Array => "ARRAY",
            SqlTypeName::Map => "MAP",
            SqlTypeName::Any => "ANY",
        }
    }

    /// Whether this is a fixed- or variable-length character type.
    pub const fn is_character(self) -> bool {
        matches!(self, SqlTypeName::Char | SqlTypeName::Varchar)
    }

    /// Whether this is a numeric type (exact or approximate).
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            SqlTypeName::TinyInt
                | SqlTypeName::SmallInt
                | SqlTypeName::Integer
                | SqlTypeName::BigInt
                | SqlTypeName::Decimal
                | SqlTypeName::Real
                | SqlTypeName::Double
        )
    }

    /// Whether this is a date, time or timestamp type.
    pub const fn is_datetime(self) -> bool {
        matches!(
            self,
            SqlTypeName::Date | SqlTypeName::Time | SqlTypeName::Timestamp
        )
    }
}

impl Display for SqlTypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A SQL type including precision, scale and nullability.
///
/// For character types `precision` is the declared maximum length; `None`
/// means the length is unknown or unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlType {
    /// The type family.
    pub name: SqlTypeName,
    /// Declared precision (character length for CHAR/VARCHAR).
    pub precision: Option<u32>,
    /// Declared scale (DECIMAL only).
    pub scale: Option<u32>,
    /// Whether values of this type may be NULL.
    pub nullable: bool,
}

impl SqlType {
    /// Create a NOT NULL type with no precision or scale.
    pub const fn new(name: SqlTypeName) -> Self {
        Self {
            name,
            precision: None,
            scale: None,
            nullable: false,
        }
    }

    /// `BOOLEAN NOT NULL`.
    pub const fn boolean() -> Self {
        Self::new(SqlTypeName::Boolean)
    }

    /// `INTEGER NOT NULL`.
    pub const fn integer() -> Self {
        Self::new(SqlTypeName::Integer)
    }

    /// `BIGINT NOT NULL`.
    pub const fn bigint() -> Self {
        Self::new(SqlTypeName::BigInt)
    }

    /// `DOUBLE NOT NULL`.
    pub const fn double() -> Self {
        Self::new(SqlTypeName::Double)
    }

    /// `DATE NOT NULL`.
    pub const fn date() -> Self {
        Self::new(SqlTypeName::Date)
    }

    /// `DECIMAL(precision, scale) NOT NULL`.
    pub const fn decimal(precision: u32, scale: u32) -> Self {
        Self {
            name: SqlTypeName::Decimal,
            precision: Some(precision),
            scale: Some(scale),
            nullable: false,
        }
    }

    /// `CHAR(length) NOT NULL`.
    pub const fn char(length: u32) -> Self {
        Self::new(SqlTypeName::Char).with_precision(length)
    }

    /// `VARCHAR(length) NOT NULL`.
    pub const fn varchar(length: u32) -> Self {
        Self::new(SqlTypeName::Varchar).with_precision(length)
    }

    /// Return a copy with the given nullability.
    pub const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Return a copy with the given precision.
    pub const fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Whether this is a character type.
    pub const fn is_character(&self) -> bool {
        self.name.is_character()
    }
}

impl Display for SqlType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match (self.precision, self.scale) {
            (Some(p), Some(s)) => write!(f, "({p}, {s})")?,
            (Some(p), None) => write!(f, "({p})")?,
            _ => {}
        }
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}
