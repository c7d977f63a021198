//! Join-graph construction and SQL join assembly for ORM query layers.
//!
//! `joinplan` is the facade crate. It re-exports the data model from
//! `joinplan-core` and the planner from `joinplan-query` so applications
//! depend on one crate.
//!
//! # Example
//!
//! ```
//! use joinplan::prelude::*;
//!
//! let schema = Schema::from_json(r#"[
//!     {"id": "CarCompany", "name": "car_company", "columns": [
//!         {"name": "uid_carcompany", "sql_type": "integer", "primary_key": true},
//!         {"name": "name", "sql_type": "text"}
//!     ]},
//!     {"id": "Marque", "name": "marque", "columns": [
//!         {"name": "uid_marque", "sql_type": "integer", "primary_key": true},
//!         {"name": "fk_carcompany", "sql_type": "integer",
//!          "foreign_key": "car_company.uid_carcompany"}
//!     ]}
//! ]"#)?;
//!
//! let company = TableReference::from_schema(&schema, "CarCompany")?;
//! let marque = TableReference::from_schema(&schema, "Marque")?;
//! let toyota = company.col("name").eq("Toyota");
//!
//! let mut query = SelectQuery::new(QueryOptions::default());
//! query.add_required([company.with_condition(toyota), marque])?;
//! let built = query.build()?;
//! assert!(built.sql.contains(" INNER JOIN marque AS "));
//! # Ok::<(), joinplan::Error>(())
//! ```

pub use joinplan_core::{
    BlankQueryError, ColumnInfo, ColumnRef, Condition, Error, ForeignKeyRef, Operand, Operator,
    Provenance, Relationship, Result, Schema, SqlType, TableId, TableMetadata, TypeFamily, Value,
};
pub use joinplan_query::{
    AliasMap, BlankQueryGuard, BuiltQuery, CartesianPolicy, Dialect, JoinClause, JoinClauseBuilder,
    JoinOrderer, JoinPlan, NodeId, OrderBy, Predicate, QueryGraph, QueryOptions, QueryWarning,
    RelationshipEdge, RelationshipResolver, SelectQuery, TableReference, table_alias,
};

/// Common imports.
pub mod prelude {
    pub use crate::{
        BuiltQuery, CartesianPolicy, ColumnInfo, ColumnRef, Condition, Dialect, Error, Operator,
        OrderBy, QueryGraph, QueryOptions, QueryWarning, Result, Schema, SelectQuery, SqlType,
        TableId, TableMetadata, TableReference, Value,
    };
}
