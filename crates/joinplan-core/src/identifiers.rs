//! SQL identifier validation and quoting.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Pattern for identifiers that every supported dialect accepts unquoted.
const SIMPLE_IDENTIFIER: &str = r"^[A-Za-z_][A-Za-z0-9_$]*$";

fn simple_identifier() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(SIMPLE_IDENTIFIER).expect("identifier pattern is valid"))
}

/// Check whether `name` can be emitted without quoting.
pub fn is_simple_identifier(name: &str) -> bool {
    simple_identifier().is_match(name)
}

/// Keywords reserved by at least one supported dialect, uppercase and
/// sorted for binary search.
const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CHECK",
    "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "DEFAULT", "DELETE", "DESC", "DISTINCT",
    "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL",
    "GRANT", "GROUP", "HAVING", "IN", "INDEX", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN",
    "KEY", "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER",
    "PRIMARY", "REFERENCES", "RIGHT", "ROW", "ROWS", "SELECT", "SET", "TABLE", "THEN", "TO", "TOP",
    "TRUE", "UNION", "UNIQUE", "UPDATE", "USER", "USING", "VALUES", "VIEW", "WHEN", "WHERE", "WITH",
];

/// Whether `name` is a reserved keyword in any supported dialect.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS
        .binary_search(&name.to_ascii_uppercase().as_str())
        .is_ok()
}

/// Whether `name` must be quoted to be read back as an identifier.
pub fn needs_quoting(name: &str) -> bool {
    !is_simple_identifier(name) || is_reserved_word(name)
}

/// Longest identifier accepted from schema metadata.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Validate a table or column name coming from schema metadata.
///
/// Names that are not simple identifiers are still accepted; dialects quote
/// them when rendering. Empty names, overlong names and names containing
/// control characters are rejected. `what` names the kind of identifier in
/// the error message.
pub fn validate_identifier(name: &str, what: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_IDENTIFIER_LEN
        && !name.chars().any(char::is_control);
    if valid {
        Ok(())
    } else {
        tracing::debug!(name = name, kind = what, "Rejected identifier");
        Err(Error::Schema(format!("invalid {} name {:?}", what, name)))
    }
}

/// Quote an identifier with ANSI double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    quote_ident_with(name, '"', '"')
}

/// Quote an identifier with the given delimiters.
///
/// Occurrences of the closing delimiter are doubled.
pub fn quote_ident_with(name: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push(open);
    for ch in name.chars() {
        if ch == close {
            out.push(close);
        }
        out.push(ch);
    }
    out.push(close);
    out
}
