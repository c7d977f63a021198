//! Query building options.

use joinplan_core::Result;
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// What to do with a table that has no predicate linking it to the tables
/// joined before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartesianPolicy {
    /// Join it silently.
    Allow,
    /// Join it, log a warning and report it on the built query.
    #[default]
    Warn,
    /// Refuse to build the query.
    Deny,
}

/// Configuration for building a query.
///
/// Fields omitted from JSON keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Dialect used for rendering.
    pub dialect: Dialect,
    /// Use ANSI `JOIN ... ON` syntax instead of a flat FROM list.
    pub ansi_join: bool,
    /// Connect join predicates with AND; OR when false.
    pub match_all_relationships: bool,
    /// Connect conditions with AND; OR when false.
    pub match_all_conditions: bool,
    /// Permit queries without any effective filter.
    pub allow_blank: bool,
    /// Handling of tables that would form a cartesian product.
    pub cartesian: CartesianPolicy,
    /// Emit SELECT DISTINCT.
    pub distinct: bool,
    /// Maximum rows per page.
    pub row_limit: Option<u64>,
    /// Zero-based page, used with `row_limit`.
    pub page_index: u64,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            ansi_join: true,
            match_all_relationships: true,
            match_all_conditions: true,
            allow_blank: false,
            cartesian: CartesianPolicy::default(),
            distinct: false,
            row_limit: None,
            page_index: 0,
        }
    }
}

impl QueryOptions {
    /// Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Choose between ANSI and legacy join syntax.
    pub fn ansi_join(mut self, value: bool) -> Self {
        self.ansi_join = value;
        self
    }

    /// Require every relationship (AND) or any relationship (OR).
    pub fn match_all_relationships(mut self, value: bool) -> Self {
        self.match_all_relationships = value;
        self
    }

    /// Require every condition (AND) or any condition (OR).
    pub fn match_all_conditions(mut self, value: bool) -> Self {
        self.match_all_conditions = value;
        self
    }

    /// Allow or forbid blank queries.
    pub fn allow_blank(mut self, value: bool) -> Self {
        self.allow_blank = value;
        self
    }

    /// Set the cartesian join policy.
    pub fn cartesian(mut self, policy: CartesianPolicy) -> Self {
        self.cartesian = policy;
        self
    }

    /// Emit SELECT DISTINCT.
    pub fn distinct(mut self, value: bool) -> Self {
        self.distinct = value;
        self
    }

    /// Limit the rows returned per page.
    pub fn row_limit(mut self, limit: u64) -> Self {
        self.row_limit = Some(limit);
        self
    }

    /// Select a zero-based page.
    pub fn page(mut self, index: u64) -> Self {
        self.page_index = index;
        self
    }

    /// Number of rows skipped for the selected page.
    pub fn offset(&self) -> u64 {
        self.row_limit
            .map_or(0, |limit| limit.saturating_mul(self.page_index))
    }
}
