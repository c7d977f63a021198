//! Relationship metadata.
//!
//! Foreign keys declared in [`TableMetadata`](crate::TableMetadata) give
//! implicit relationships. Callers can declare additional ones on a table
//! reference with [`Relationship`], naming a local column, an operator and a
//! column of another table.

use serde::{Deserialize, Serialize};

use crate::condition::ColumnRef;
use crate::operator::Operator;

/// Where a join predicate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Foreign key to primary key equality found in the metadata.
    ImplicitForeignKey,
    /// A relationship declared on a table reference.
    ExplicitRelationship,
    /// A caller condition naming exactly two tables.
    ExplicitCondition,
}

impl Provenance {
    /// Whether the caller asserted this predicate explicitly.
    #[must_use]
    pub const fn is_explicit(self) -> bool {
        !matches!(self, Provenance::ImplicitForeignKey)
    }
}

/// An explicitly declared relationship between a column of the declaring
/// table and a column of another table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    /// Column of the declaring table.
    pub local_column: String,
    /// Comparison operator, `local op foreign`.
    pub operator: Operator,
    /// Column of the related table.
    pub foreign: ColumnRef,
}

impl Relationship {
    /// Create an equality relationship.
    pub fn new(local_column: impl Into<String>, foreign: ColumnRef) -> Self {
        Self {
            local_column: local_column.into(),
            operator: Operator::Eq,
            foreign,
        }
    }

    /// Use a different comparison operator.
    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }
}
