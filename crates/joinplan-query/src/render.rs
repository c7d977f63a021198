//! Rendering of conditions and join predicates to SQL text.
//!
//! Columns render as `alias.column`. Literal values never appear in the SQL
//! text: each one is pushed onto the parameter list and replaced by the
//! dialect's placeholder, so placeholders are numbered in textual order as
//! long as fragments are rendered in the order they appear in the statement.

use joinplan_core::{ColumnRef, Condition, Error, Operand, Operator, Result, Value};

use crate::alias::AliasMap;
use crate::dialect::Dialect;
use crate::graph::QueryGraph;
use crate::resolver::{Predicate, RelationshipEdge};

/// Accumulates parameters while rendering fragments of one statement.
#[derive(Debug)]
pub struct RenderContext<'a> {
    graph: &'a QueryGraph,
    aliases: &'a AliasMap,
    dialect: Dialect,
    params: Vec<Value>,
}

impl<'a> RenderContext<'a> {
    pub fn new(graph: &'a QueryGraph, aliases: &'a AliasMap, dialect: Dialect) -> Self {
        Self {
            graph,
            aliases,
            dialect,
            params: Vec::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parameters pushed so far.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// `alias.column` for a column of a table in the graph.
    pub fn column(&self, column: &ColumnRef) -> Result<String> {
        let alias = self
            .graph
            .node_id(&column.table)
            .and_then(|node| self.aliases.get(node))
            .ok_or_else(|| Error::TableNotInQuery {
                table: column.table.clone(),
            })?;
        Ok(format!(
            "{}.{}",
            alias,
            self.dialect.format_identifier(&column.column)
        ))
    }

    fn value(&mut self, value: &Value) -> String {
        self.params.push(value.clone());
        self.dialect.placeholder(self.params.len())
    }

    fn operand(&mut self, operand: &Operand) -> Result<String> {
        match operand {
            Operand::Column(column) => self.column(column),
            Operand::Value(value) => Ok(self.value(value)),
        }
    }

    /// Render a condition.
    pub fn condition(&mut self, condition: &Condition) -> Result<String> {
        self.render(condition, false)
    }

    /// Render the predicate of a join edge.
    pub fn edge(&mut self, edge: &RelationshipEdge) -> Result<String> {
        match &edge.predicate {
            Predicate::Columns { left, op, right } => self.compare(
                &Operand::Column(left.clone()),
                *op,
                &Operand::Column(right.clone()),
                false,
            ),
            Predicate::Expression(condition) => self.condition(condition),
        }
    }

    fn render(&mut self, condition: &Condition, negated: bool) -> Result<String> {
        match condition {
            Condition::Compare { left, op, right } => self.compare(left, *op, right, negated),
            Condition::In { column, values } => {
                if values.is_empty() {
                    return Ok(self.literal(negated).to_string());
                }
                let column = self.column(column)?;
                let placeholders: Vec<String> = values.iter().map(|v| self.value(v)).collect();
                let keyword = if negated { "NOT IN" } else { "IN" };
                Ok(format!("{} {} ({})", column, keyword, placeholders.join(", ")))
            }
            Condition::Between { column, low, high } => {
                let column = self.column(column)?;
                let low = self.value(low);
                let high = self.value(high);
                let keyword = if negated { "NOT BETWEEN" } else { "BETWEEN" };
                Ok(format!("{} {} {} AND {}", column, keyword, low, high))
            }
            Condition::IsNull(column) => {
                let column = self.column(column)?;
                Ok(if negated {
                    format!("{} IS NOT NULL", column)
                } else {
                    format!("{} IS NULL", column)
                })
            }
            // De Morgan: a negated conjunction is a disjunction of negations.
            Condition::And(parts) => self.group(parts, !negated, negated),
            Condition::Or(parts) => self.group(parts, negated, negated),
            Condition::Not(inner) => self.render(inner, !negated),
        }
    }

    fn compare(&mut self, left: &Operand, op: Operator, right: &Operand, negated: bool) -> Result<String> {
        let null_side = match (left, right) {
            (other, Operand::Value(Value::Null)) | (Operand::Value(Value::Null), other) => Some(other),
            _ => None,
        };
        if let Some(other) = null_side {
            if matches!(op, Operator::Eq | Operator::Neq) {
                let is_null = (op == Operator::Eq) != negated;
                let rendered = self.operand(other)?;
                return Ok(if is_null {
                    format!("{} IS NULL", rendered)
                } else {
                    format!("{} IS NOT NULL", rendered)
                });
            }
        }

        let left = self.operand(left)?;
        let right = self.operand(right)?;
        let text = match op {
            Operator::LikeCi => self.dialect.case_insensitive_like(&left, &right),
            _ => format!("{} {} {}", left, op.text(negated && !op.negates_by_wrapping()), right),
        };
        Ok(if negated && op.negates_by_wrapping() {
            format!("NOT ({})", text)
        } else {
            text
        })
    }

    fn group(&mut self, parts: &[Condition], conjunction: bool, negated: bool) -> Result<String> {
        let rendered = parts
            .iter()
            .map(|part| self.render(part, negated))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.combine(rendered, conjunction))
    }

    /// Join rendered predicates with AND or OR. Several parts are
    /// parenthesized; none yields the connector's neutral literal.
    pub fn combine(&self, parts: Vec<String>, conjunction: bool) -> String {
        let token = if conjunction {
            self.dialect.and_token()
        } else {
            self.dialect.or_token()
        };
        match parts.len() {
            0 => self.literal(conjunction).to_string(),
            1 => parts.into_iter().next().unwrap_or_default(),
            _ => format!("({})", parts.join(token)),
        }
    }

    /// The dialect's constant predicate for `truth`.
    fn literal(&self, truth: bool) -> &'static str {
        if truth {
            self.dialect.always_true()
        } else {
            self.dialect.always_false()
        }
    }
}
