//! Core types for joinplan.
//!
//! `joinplan-core` is the **data layer** of the workspace. It defines the
//! immutable schema metadata handed over by a schema loader, the condition
//! expressions callers attach to tables, and the single error type every
//! other crate returns.
//!
//! # Role In The Architecture
//!
//! - **Schema contract**: `TableMetadata`, `ColumnInfo` and `ForeignKeyRef`
//!   describe tables, primary keys and declared foreign keys. They are
//!   produced once (by hand, by a derive, or from JSON via `Schema`) and never
//!   mutated by the query layer.
//! - **Predicates**: `Operator`, `ColumnRef` and `Condition` express filters
//!   and join predicates independently of any SQL dialect.
//! - **Errors**: `Error` covers every construction-time failure; none of them
//!   are transient.
//!
//! `joinplan-query` consumes these types to build the join graph and render
//! SQL. Most applications should use the `joinplan` facade.

pub mod condition;
pub mod error;
pub mod identifiers;
pub mod operator;
pub mod relationship;
pub mod table;
pub mod types;
pub mod value;

pub use condition::{ColumnRef, Condition, Operand};
pub use error::{BlankQueryError, Error, Result};
pub use identifiers::{
    is_reserved_word, is_simple_identifier, needs_quoting, quote_ident, quote_ident_with, validate_identifier,
};
pub use operator::Operator;
pub use relationship::{Provenance, Relationship};
pub use table::{ColumnInfo, ForeignKeyRef, Schema, TableId, TableMetadata};
pub use types::{SqlType, TypeFamily};
pub use value::Value;
