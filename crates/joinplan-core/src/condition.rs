//! Dialect-independent condition expressions.
//!
//! Conditions reference columns through [`ColumnRef`], which names the owning
//! table by identity. The set of tables a condition touches decides where the
//! query layer places it: one table makes it a standalone filter on that
//! table, two tables make it a join predicate, anything else goes to WHERE.
//!
//! # Example
//!
//! ```
//! use joinplan_core::{ColumnRef, Condition};
//!
//! let price = ColumnRef::new("Marque", "price");
//! let cond = price.gt(20_000).and(ColumnRef::new("Marque", "name").like("A%"));
//! assert_eq!(cond.tables().len(), 1);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::operator::Operator;
use crate::table::TableId;
use crate::value::Value;

/// A column of a specific table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Owning table identity.
    pub table: TableId,
    /// Column name.
    pub column: String,
}

impl ColumnRef {
    /// Create a column reference.
    pub fn new(table: impl Into<TableId>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    fn compare(self, op: Operator, right: impl Into<Operand>) -> Condition {
        Condition::Compare {
            left: Operand::Column(self),
            op,
            right: right.into(),
        }
    }

    /// `self = right`
    pub fn eq(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operator::Eq, right)
    }

    /// `self <> right`
    pub fn neq(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operator::Neq, right)
    }

    /// `self > right`
    pub fn gt(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operator::Gt, right)
    }

    /// `self >= right`
    pub fn gte(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operator::Gte, right)
    }

    /// `self < right`
    pub fn lt(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operator::Lt, right)
    }

    /// `self <= right`
    pub fn lte(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operator::Lte, right)
    }

    /// `self LIKE pattern`
    pub fn like(self, pattern: impl Into<Operand>) -> Condition {
        self.compare(Operator::Like, pattern)
    }

    /// Case-insensitive LIKE.
    pub fn ilike(self, pattern: impl Into<Operand>) -> Condition {
        self.compare(Operator::LikeCi, pattern)
    }

    /// `self IN (values...)`, the permitted-values filter.
    pub fn is_in<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Condition {
        Condition::In {
            column: self,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `self BETWEEN low AND high`
    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Condition {
        Condition::Between {
            column: self,
            low: low.into(),
            high: high.into(),
        }
    }

    /// `self IS NULL`
    pub fn is_null(self) -> Condition {
        Condition::IsNull(self)
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Column(ColumnRef),
    Value(Value),
}

impl From<ColumnRef> for Operand {
    fn from(column: ColumnRef) -> Self {
        Operand::Column(column)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

macro_rules! operand_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Value(Value::from(v))
                }
            }
        )*
    };
}

operand_from_literal!(bool, i32, i64, f64, &str, String);

/// A boolean condition over columns and literal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Compare {
        left: Operand,
        op: Operator,
        right: Operand,
    },
    In {
        column: ColumnRef,
        values: Vec<Value>,
    },
    Between {
        column: ColumnRef,
        low: Value,
        high: Value,
    },
    IsNull(ColumnRef),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Condition) -> Condition {
        match (self, other) {
            (Condition::And(mut left), Condition::And(right)) => {
                left.extend(right);
                Condition::And(left)
            }
            (Condition::And(mut left), other) => {
                left.push(other);
                Condition::And(left)
            }
            (this, other) => Condition::And(vec![this, other]),
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Condition) -> Condition {
        match (self, other) {
            (Condition::Or(mut left), Condition::Or(right)) => {
                left.extend(right);
                Condition::Or(left)
            }
            (Condition::Or(mut left), other) => {
                left.push(other);
                Condition::Or(left)
            }
            (this, other) => Condition::Or(vec![this, other]),
        }
    }

    /// Logical negation. Double negation cancels.
    pub fn negate(self) -> Condition {
        match self {
            Condition::Not(inner) => *inner,
            other => Condition::Not(Box::new(other)),
        }
    }

    /// Every column referenced, in expression order.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Condition::Compare { left, right, .. } => {
                for operand in [left, right] {
                    if let Operand::Column(column) = operand {
                        out.push(column);
                    }
                }
            }
            Condition::In { column, .. }
            | Condition::Between { column, .. }
            | Condition::IsNull(column) => out.push(column),
            Condition::And(parts) | Condition::Or(parts) => {
                for part in parts {
                    part.collect_columns(out);
                }
            }
            Condition::Not(inner) => inner.collect_columns(out),
        }
    }

    /// Distinct tables referenced, ordered by identity.
    pub fn tables(&self) -> BTreeSet<TableId> {
        self.columns().into_iter().map(|c| c.table.clone()).collect()
    }

    /// Whether the condition references exactly the tables `a` and `b`.
    pub fn connects(&self, a: &TableId, b: &TableId) -> bool {
        let tables = self.tables();
        a != b && tables.len() == 2 && tables.contains(a) && tables.contains(b)
    }
}
