//! SQL dialect tokens.
//!
//! The join builder never hard-codes SQL keywords; every token that varies
//! between databases comes from [`Dialect`].

use joinplan_core::{needs_quoting, quote_ident, quote_ident_with};
use serde::{Deserialize, Serialize};

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
    Oracle,
    SqlServer,
}

impl Dialect {
    /// Human readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "PostgreSQL",
            Dialect::Mysql => "MySQL",
            Dialect::Sqlite => "SQLite",
            Dialect::Oracle => "Oracle",
            Dialect::SqlServer => "SQL Server",
        }
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite => format!("?{}", index),
            Dialect::Mysql => "?".to_string(),
            Dialect::Oracle => format!(":{}", index),
            Dialect::SqlServer => format!("@p{}", index),
        }
    }

    /// Quote an identifier unconditionally.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Mysql => quote_ident_with(name, '`', '`'),
            Dialect::SqlServer => quote_ident_with(name, '[', ']'),
            Dialect::Postgres | Dialect::Sqlite | Dialect::Oracle => quote_ident(name),
        }
    }

    /// Format a table or column name, quoting names that are not simple
    /// identifiers or that collide with a keyword.
    pub fn format_identifier(self, name: &str) -> String {
        if needs_quoting(name) {
            self.quote_identifier(name)
        } else {
            name.to_string()
        }
    }

    /// Token between a table name and its alias.
    ///
    /// Oracle rejects `AS` for table aliases.
    pub const fn table_alias_token(self) -> &'static str {
        match self {
            Dialect::Oracle => " ",
            _ => " AS ",
        }
    }

    /// Token between a column expression and its alias.
    pub const fn column_alias_token(self) -> &'static str {
        " AS "
    }

    pub const fn inner_join(self) -> &'static str {
        " INNER JOIN "
    }

    pub const fn left_outer_join(self) -> &'static str {
        " LEFT OUTER JOIN "
    }

    pub const fn full_outer_join(self) -> &'static str {
        " FULL OUTER JOIN "
    }

    /// SQLite supports FULL OUTER JOIN from 3.39.
    pub const fn supports_full_outer_join(self) -> bool {
        !matches!(self, Dialect::Mysql)
    }

    pub const fn begin_on_clause(self) -> &'static str {
        " ON( "
    }

    pub const fn end_on_clause(self) -> &'static str {
        " )"
    }

    pub const fn and_token(self) -> &'static str {
        " AND "
    }

    pub const fn or_token(self) -> &'static str {
        " OR "
    }

    /// Predicate that is always true; the blank WHERE and the ON clause of an
    /// unconnected table.
    pub const fn always_true(self) -> &'static str {
        "1=1"
    }

    /// Predicate that is always false; an empty permitted-values list.
    pub const fn always_false(self) -> &'static str {
        "1=0"
    }

    /// Case-insensitive LIKE between two rendered operands.
    pub fn case_insensitive_like(self, left: &str, right: &str) -> String {
        match self {
            Dialect::Postgres => format!("{} ILIKE {}", left, right),
            _ => format!("LOWER({}) LIKE LOWER({})", left, right),
        }
    }

    /// Whether OFFSET/FETCH needs an ORDER BY to be valid.
    pub const fn requires_order_for_offset(self) -> bool {
        matches!(self, Dialect::SqlServer)
    }

    /// Row limit clause, or `None` when nothing restricts the rows.
    pub fn limit_clause(self, limit: Option<u64>, offset: u64) -> Option<String> {
        match self {
            Dialect::Postgres | Dialect::Mysql | Dialect::Sqlite => match (limit, offset) {
                (None, 0) => None,
                (Some(limit), 0) => Some(format!("LIMIT {}", limit)),
                (Some(limit), offset) => Some(format!("LIMIT {} OFFSET {}", limit, offset)),
                // MySQL needs a LIMIT before OFFSET; the largest unsigned
                // bigint means "no limit" there and is accepted by the others.
                (None, offset) => Some(format!("LIMIT {} OFFSET {}", u64::MAX, offset)),
            },
            Dialect::Oracle | Dialect::SqlServer => match (limit, offset) {
                (None, 0) => None,
                (Some(limit), offset) => Some(format!(
                    "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                    offset, limit
                )),
                (None, offset) => Some(format!("OFFSET {} ROWS", offset)),
            },
        }
    }
}
