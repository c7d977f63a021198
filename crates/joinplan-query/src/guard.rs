//! Refusal of queries without an effective filter.

use joinplan_core::BlankQueryError;

use crate::graph::QueryGraph;

/// Detects blank queries.
///
/// A query is blank when nothing the caller asserted restricts it: no table
/// carries a standalone filter, no residual condition names a column, and
/// every join predicate was derived from a foreign key. Joining tables along
/// their keys without a filter still returns every row of the data set, and
/// a condition over literals alone (`1 = 1`, an empty group) filters nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankQueryGuard;

impl BlankQueryGuard {
    /// Whether `graph` describes a blank query.
    pub fn is_blank(graph: &QueryGraph) -> bool {
        let filtered = graph.node_ids().any(|node| graph.has_conditions(node));
        let asserted = graph.edges().iter().any(|edge| edge.provenance.is_explicit());
        let restricted = graph
            .residual_conditions()
            .iter()
            .any(|condition| !condition.columns().is_empty());
        !filtered && !asserted && !restricted
    }

    /// Fail on a blank query unless `allow_blank` is set.
    pub fn enforce(graph: &QueryGraph, allow_blank: bool) -> Result<(), BlankQueryError> {
        if allow_blank || !Self::is_blank(graph) {
            return Ok(());
        }
        let tables = graph.nodes().iter().map(|n| n.id().clone()).collect();
        tracing::debug!(tables = graph.len(), "Rejected blank query");
        Err(BlankQueryError { tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::TableReference;
    use joinplan_core::{ColumnInfo, ColumnRef, Condition, Operand, Operator, SqlType, TableMetadata, Value};

    fn table(id: &str) -> TableReference {
        TableReference::new(
            TableMetadata::new(id, id.to_lowercase())
                .column(ColumnInfo::new("id", SqlType::Integer).primary_key(true))
                .column(ColumnInfo::new("owner", SqlType::Integer).references_table("Owner")),
        )
    }

    fn owner() -> TableReference {
        TableReference::new(
            TableMetadata::new("Owner", "owner")
                .column(ColumnInfo::new("id", SqlType::Integer).primary_key(true)),
        )
    }

    #[test]
    fn test_foreign_key_joins_alone_are_blank() {
        let graph = QueryGraph::new(vec![owner(), table("Car")], vec![]).unwrap();
        assert_eq!(graph.edges().len(), 1);
        assert!(BlankQueryGuard::is_blank(&graph));
        let err = BlankQueryGuard::enforce(&graph, false).unwrap_err();
        assert_eq!(err.tables.len(), 2);
        assert!(BlankQueryGuard::enforce(&graph, true).is_ok());
    }

    #[test]
    fn test_standalone_filter_is_not_blank() {
        let car = table("Car");
        let filter = car.col("id").eq(3);
        let graph = QueryGraph::new(vec![owner(), car.with_condition(filter)], vec![]).unwrap();
        assert!(!BlankQueryGuard::is_blank(&graph));
    }

    #[test]
    fn test_explicit_condition_edge_is_not_blank() {
        let graph = QueryGraph::new(
            vec![table("Car"), table("Boat")],
            vec![ColumnRef::new("Car", "owner").eq(ColumnRef::new("Boat", "owner"))],
        )
        .unwrap();
        assert!(!BlankQueryGuard::is_blank(&graph));
    }

    #[test]
    fn test_condition_over_literals_is_blank() {
        let tautology = Condition::Compare {
            left: Operand::Value(Value::Int(1)),
            op: Operator::Eq,
            right: Operand::Value(Value::Int(1)),
        };
        let graph = QueryGraph::new(vec![owner()], vec![Condition::And(vec![]), tautology]).unwrap();
        assert_eq!(graph.residual_conditions().len(), 2);
        assert!(BlankQueryGuard::is_blank(&graph));
        assert!(BlankQueryGuard::enforce(&graph, false).is_err());
    }

    #[test]
    fn test_residual_condition_over_three_tables_is_not_blank() {
        let spans = ColumnRef::new("Car", "owner")
            .eq(ColumnRef::new("Owner", "id"))
            .and(ColumnRef::new("Boat", "owner").eq(ColumnRef::new("Owner", "id")));
        let graph = QueryGraph::new(vec![owner(), table("Car"), table("Boat")], vec![spans]).unwrap();
        assert_eq!(graph.residual_conditions().len(), 1);
        assert!(!BlankQueryGuard::is_blank(&graph));
    }
}
