//! Error types for query construction.

use crate::table::TableId;
use std::error::Error as StdError;
use std::fmt;

/// Result alias used throughout joinplan.
pub type Result<T> = std::result::Result<T, Error>;

/// A query with no effective filter was built without the blank-query override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankQueryError {
    /// Tables participating in the rejected query, in insertion order.
    pub tables: Vec<TableId>,
}

impl fmt::Display for BlankQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.tables.iter().map(TableId::as_str).collect();
        write!(
            f,
            "blank query: no conditions restrict [{}]; allow blank queries to return every row",
            names.join(", ")
        )
    }
}

impl StdError for BlankQueryError {}

/// Errors raised while resolving relationships, building the query graph or
/// rendering SQL.
///
/// All variants describe a defect in the caller's tables, conditions or
/// schema mapping. None of them are retryable.
#[derive(Debug)]
pub enum Error {
    /// A foreign key does not point at a primary key of the referenced table,
    /// or the two column types cannot be compared.
    ForeignKeyCannotBeComparedToPrimaryKey {
        /// Table declaring the foreign key.
        table: TableId,
        /// Foreign key column.
        column: String,
        /// Referenced table as declared.
        target_table: String,
        /// Referenced column, if the declaration names one.
        target_column: Option<String>,
        /// Why the pair cannot be compared.
        reason: String,
    },
    /// A column was attributed to a table that does not declare it.
    ColumnOwnershipMismatch {
        /// The table the reference claims.
        table: TableId,
        /// The column name that is not part of that table.
        column: String,
    },
    /// No effective filter and blank queries are not allowed.
    BlankQuery(BlankQueryError),
    /// A table would be joined with no predicate connecting it to the rest of
    /// the query, producing a cartesian product.
    DisconnectedTable {
        /// The disconnected table.
        table: TableId,
    },
    /// The same table was added twice with foreign key settings that cannot
    /// both hold.
    ConflictingReference {
        /// The table added twice.
        table: TableId,
        /// What differs between the two references.
        reason: String,
    },
    /// A condition or ordering refers to a table that was never added.
    TableNotInQuery {
        /// The missing table.
        table: TableId,
    },
    /// The plan needs FULL OUTER JOIN but the dialect has no such join.
    FullOuterJoinUnsupported {
        /// Dialect name.
        dialect: &'static str,
    },
    /// A join plan was rendered against a graph that changed after the plan
    /// was computed.
    StalePlan {
        /// Graph generation recorded by the plan.
        plan_generation: u64,
        /// Current graph generation.
        graph_generation: u64,
    },
    /// The query has no tables.
    EmptyQuery,
    /// Invalid schema metadata.
    Schema(String),
    /// JSON decoding of schema metadata or options failed.
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ForeignKeyCannotBeComparedToPrimaryKey {
                table,
                column,
                target_table,
                target_column,
                reason,
            } => {
                write!(f, "foreign key {}.{} references {}", table, column, target_table)?;
                if let Some(target_column) = target_column {
                    write!(f, ".{}", target_column)?;
                }
                write!(f, " which cannot be compared to its primary key: {}", reason)
            }
            Error::ColumnOwnershipMismatch { table, column } => {
                write!(f, "column {} does not belong to table {}", column, table)
            }
            Error::BlankQuery(err) => write!(f, "{}", err),
            Error::DisconnectedTable { table } => write!(
                f,
                "table {} is not connected to the rest of the query; joining it would produce a cartesian product",
                table
            ),
            Error::ConflictingReference { table, reason } => {
                write!(f, "table {} was added twice with conflicting settings: {}", table, reason)
            }
            Error::TableNotInQuery { table } => {
                write!(f, "table {} is referenced but was not added to the query", table)
            }
            Error::FullOuterJoinUnsupported { dialect } => {
                write!(f, "{} does not support FULL OUTER JOIN", dialect)
            }
            Error::StalePlan {
                plan_generation,
                graph_generation,
            } => write!(
                f,
                "join plan was computed for graph generation {} but the graph is at generation {}",
                plan_generation, graph_generation
            ),
            Error::EmptyQuery => write!(f, "query has no tables"),
            Error::Schema(msg) => write!(f, "invalid schema: {}", msg),
            Error::Json(err) => write!(f, "json error: {}", err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::BlankQuery(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BlankQueryError> for Error {
    fn from(err: BlankQueryError) -> Self {
        Error::BlankQuery(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_error_message_names_both_sides() {
        let err = Error::ForeignKeyCannotBeComparedToPrimaryKey {
            table: TableId::new("Marque"),
            column: "fk_carcompany".to_string(),
            target_table: "car_company".to_string(),
            target_column: Some("name".to_string()),
            reason: "name is not a primary key column".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Marque.fk_carcompany"));
        assert!(msg.contains("car_company.name"));
        assert!(msg.contains("not a primary key"));
    }

    #[test]
    fn test_blank_query_error_converts_and_keeps_source() {
        let blank = BlankQueryError {
            tables: vec![TableId::new("A"), TableId::new("B")],
        };
        let err: Error = blank.into();
        assert!(err.to_string().contains("[A, B]"));
        assert!(err.source().is_some());
    }
}
