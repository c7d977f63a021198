//! Query graph construction and join assembly for joinplan.
//!
//! `joinplan-query` is the **planning layer**. It takes table references
//! supplied by the caller, derives the predicates that connect them, orders
//! the tables and renders the FROM / WHERE text for a dialect.
//!
//! # Pipeline
//!
//! 1. [`RelationshipResolver`] derives join predicates between two tables:
//!    foreign keys, declared relationships and two-table conditions.
//! 2. [`QueryGraph`] holds the tables as nodes and the predicates as edges.
//!    Tables are added as required or optional sets, in any order.
//! 3. [`JoinOrderer`] produces a deterministic [`JoinPlan`] that lists
//!    required tables first and keeps connected tables together.
//! 4. [`JoinClauseBuilder`] renders the plan with ANSI or legacy join syntax.
//! 5. [`BlankQueryGuard`] refuses statements without an effective filter.
//!
//! [`SelectQuery`] runs the whole pipeline and wraps the result in a complete
//! SELECT statement.

pub mod alias;
pub mod dialect;
pub mod graph;
pub mod guard;
pub mod join;
pub mod options;
pub mod order;
pub mod reference;
pub mod render;
pub mod resolver;
pub mod select;

pub use alias::{table_alias, AliasMap};
pub use dialect::Dialect;
pub use graph::{Adjacent, NodeId, QueryGraph};
pub use guard::BlankQueryGuard;
pub use join::{JoinClause, JoinClauseBuilder, QueryWarning};
pub use options::{CartesianPolicy, QueryOptions};
pub use order::{JoinOrderer, JoinPlan, Priority};
pub use reference::TableReference;
pub use render::RenderContext;
pub use resolver::{Predicate, RelationshipEdge, RelationshipResolver};
pub use select::{BuiltQuery, OrderBy, SelectQuery};
