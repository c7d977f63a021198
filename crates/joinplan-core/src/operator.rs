//! Comparison operators used by relationships and conditions.

use serde::{Deserialize, Serialize};

/// A binary comparison operator.
///
/// Each operator knows its SQL text and its logical inverse. Symbolic
/// operators negate by substituting the inverse symbol (`>` becomes `<=`);
/// the LIKE family is its own inverse and negates by wrapping the whole
/// comparison in `NOT (...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    /// Case-insensitive LIKE. Dialects render it as `ILIKE` or by lowering
    /// both operands.
    LikeCi,
}

impl Operator {
    /// SQL text of the operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "<>",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like | Operator::LikeCi => "LIKE",
        }
    }

    /// Logical inverse of the operator.
    #[must_use]
    pub const fn inverse(self) -> Operator {
        match self {
            Operator::Eq => Operator::Neq,
            Operator::Neq => Operator::Eq,
            Operator::Gt => Operator::Lte,
            Operator::Lte => Operator::Gt,
            Operator::Gte => Operator::Lt,
            Operator::Lt => Operator::Gte,
            Operator::Like => Operator::Like,
            Operator::LikeCi => Operator::LikeCi,
        }
    }

    /// SQL text of the operator, or of its inverse when `inverted`.
    #[must_use]
    pub const fn text(self, inverted: bool) -> &'static str {
        if inverted {
            self.inverse().symbol()
        } else {
            self.symbol()
        }
    }

    /// Whether negation wraps the comparison instead of substituting a
    /// symbol.
    #[must_use]
    pub const fn negates_by_wrapping(self) -> bool {
        matches!(self, Operator::Like | Operator::LikeCi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Like,
        Operator::LikeCi,
    ];

    #[test]
    fn test_inverse_is_an_involution() {
        for op in ALL {
            assert_eq!(op.inverse().inverse(), op, "{:?}", op);
        }
    }

    #[test]
    fn test_symbolic_inverses() {
        assert_eq!(Operator::Gt.text(true), "<=");
        assert_eq!(Operator::Gte.text(true), "<");
        assert_eq!(Operator::Eq.text(true), "<>");
        assert_eq!(Operator::Lt.text(false), "<");
    }

    #[test]
    fn test_like_family_negates_by_wrapping() {
        assert!(Operator::Like.negates_by_wrapping());
        assert!(Operator::LikeCi.negates_by_wrapping());
        assert!(!Operator::Eq.negates_by_wrapping());
        assert_eq!(Operator::Like.text(true), "LIKE");
    }
}
