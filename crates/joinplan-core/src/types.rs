//! Column types as declared in schema metadata.

use serde::{Deserialize, Serialize};

/// Declared SQL type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal { precision: u8, scale: u8 },
    Text,
    Varchar(u16),
    Blob,
    Date,
    Time,
    Timestamp,
    Uuid,
    Json,
}

/// Groups of types whose values can be compared with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Boolean,
    Integer,
    Numeric,
    Text,
    Binary,
    Temporal,
    Uuid,
    Json,
}

impl SqlType {
    /// The comparison family of this type.
    #[must_use]
    pub const fn family(&self) -> TypeFamily {
        match self {
            SqlType::Boolean => TypeFamily::Boolean,
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
                TypeFamily::Integer
            }
            SqlType::Real | SqlType::Double | SqlType::Decimal { .. } => TypeFamily::Numeric,
            SqlType::Text | SqlType::Varchar(_) => TypeFamily::Text,
            SqlType::Blob => TypeFamily::Binary,
            SqlType::Date | SqlType::Time | SqlType::Timestamp => TypeFamily::Temporal,
            SqlType::Uuid => TypeFamily::Uuid,
            SqlType::Json => TypeFamily::Json,
        }
    }

    /// Whether a foreign key of this type can be joined to a key of `other`.
    ///
    /// Types within one family compare; `Json` and `Blob` never do.
    #[must_use]
    pub fn is_comparable_with(&self, other: &SqlType) -> bool {
        let family = self.family();
        family == other.family() && !matches!(family, TypeFamily::Json | TypeFamily::Binary)
    }

    /// SQL spelling used in messages.
    #[must_use]
    pub fn sql_name(&self) -> String {
        match self {
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::TinyInt => "TINYINT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Varchar(len) => format!("VARCHAR({})", len),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Json => "JSON".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths_are_comparable() {
        assert!(SqlType::Integer.is_comparable_with(&SqlType::BigInt));
        assert!(SqlType::TinyInt.is_comparable_with(&SqlType::SmallInt));
    }

    #[test]
    fn test_cross_family_not_comparable() {
        assert!(!SqlType::Integer.is_comparable_with(&SqlType::Text));
        assert!(!SqlType::Varchar(20).is_comparable_with(&SqlType::Uuid));
        assert!(!SqlType::Integer.is_comparable_with(&SqlType::Double));
    }

    #[test]
    fn test_json_and_blob_never_comparable() {
        assert!(!SqlType::Json.is_comparable_with(&SqlType::Json));
        assert!(!SqlType::Blob.is_comparable_with(&SqlType::Blob));
    }

    #[test]
    fn test_sql_name() {
        assert_eq!(
            SqlType::Decimal {
                precision: 10,
                scale: 2
            }
            .sql_name(),
            "DECIMAL(10, 2)"
        );
        assert_eq!(SqlType::Varchar(64).sql_name(), "VARCHAR(64)");
    }
}
