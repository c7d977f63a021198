//! Join ordering.
//!
//! [`JoinOrderer`] turns a [`QueryGraph`] into a [`JoinPlan`]: one linear,
//! deterministic order over every node. Component roots are chosen by
//! priority (required tables with filters first, then required tables, then
//! optional tables with filters, then the rest) and each component is listed
//! by a pre-order depth-first walk following edges in insertion order.
//!
//! The walk runs in two passes. The required pass steps through required
//! tables, and through an optional table only when it leads on to a required
//! table not yet listed. Optional tables that merely hang off a required one
//! therefore wait until every required table is listed, while a required
//! table reachable only through optional ones still follows its bridge and
//! never lands in the join without a predicate. The optional pass then hangs
//! the remaining optional components off the tables already listed before
//! falling back to priority roots for whatever is left.

use joinplan_core::TableId;

use crate::graph::{NodeId, QueryGraph};

/// Root selection priority; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    RequiredWithConditions,
    Required,
    OptionalWithConditions,
    Optional,
}

impl Priority {
    /// Priority of `node` within `graph`.
    pub fn of(graph: &QueryGraph, node: NodeId) -> Self {
        match (graph.node(node).is_required(), graph.has_conditions(node)) {
            (true, true) => Priority::RequiredWithConditions,
            (true, false) => Priority::Required,
            (false, true) => Priority::OptionalWithConditions,
            (false, false) => Priority::Optional,
        }
    }

    const fn is_required(self) -> bool {
        matches!(self, Priority::RequiredWithConditions | Priority::Required)
    }
}

/// A linear visitation order over every node of a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    order: Vec<NodeId>,
    tables: Vec<TableId>,
    generation: u64,
}

impl JoinPlan {
    /// Nodes in join order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.order
    }

    /// Table identities in join order.
    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    /// Graph generation this plan was computed from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position of `node` in the plan.
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.order.iter().position(|&n| n == node)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Computes the [`JoinPlan`] of a graph.
#[derive(Debug, Clone, Copy)]
pub struct JoinOrderer<'a> {
    graph: &'a QueryGraph,
}

impl<'a> JoinOrderer<'a> {
    pub fn new(graph: &'a QueryGraph) -> Self {
        Self { graph }
    }

    /// Compute the order.
    pub fn order(&self) -> JoinPlan {
        let graph = self.graph;
        let mut visited = vec![false; graph.len()];
        let mut order = Vec::with_capacity(graph.len());

        let towards_required = |node: NodeId, visited: &[bool]| {
            graph.node(node).is_required() || self.bridges(node, visited)
        };
        for root in self.roots(true) {
            if !visited[root.index()] {
                self.walk(root, &towards_required, &mut visited, &mut order);
            }
        }

        let any = |_: NodeId, _: &[bool]| true;
        let mut anchor = 0;
        while anchor < order.len() {
            for adjacent in graph.neighbours(order[anchor]) {
                if !visited[adjacent.node.index()] {
                    self.walk(adjacent.node, &any, &mut visited, &mut order);
                }
            }
            anchor += 1;
        }

        for root in self.roots(false) {
            if !visited[root.index()] {
                self.walk(root, &any, &mut visited, &mut order);
            }
        }

        let tables: Vec<TableId> = order.iter().map(|&n| graph.node(n).id().clone()).collect();
        tracing::debug!(order = ?tables, generation = graph.generation(), "Computed join order");
        JoinPlan {
            order,
            tables,
            generation: graph.generation(),
        }
    }

    /// Required or optional candidate roots, in priority order and insertion
    /// order within a priority.
    fn roots(&self, required: bool) -> Vec<NodeId> {
        let mut roots: Vec<(Priority, NodeId)> = self
            .graph
            .node_ids()
            .map(|node| (Priority::of(self.graph, node), node))
            .filter(|(priority, _)| priority.is_required() == required)
            .collect();
        // Stable sort keeps insertion order inside a bucket.
        roots.sort_by_key(|&(priority, _)| priority);
        roots.into_iter().map(|(_, node)| node).collect()
    }

    /// Whether unvisited optional tables starting at `start` lead to an
    /// unvisited required table.
    fn bridges(&self, start: NodeId, visited: &[bool]) -> bool {
        let mut seen = visited.to_vec();
        seen[start.index()] = true;
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for adjacent in self.graph.neighbours(node) {
                let next = adjacent.node;
                if seen[next.index()] {
                    continue;
                }
                if self.graph.node(next).is_required() {
                    return true;
                }
                seen[next.index()] = true;
                stack.push(next);
            }
        }
        false
    }

    /// Pre-order depth-first walk from `root` through nodes accepted by
    /// `step`, which sees the visited set as it stands.
    fn walk(
        &self,
        root: NodeId,
        step: &dyn Fn(NodeId, &[bool]) -> bool,
        visited: &mut [bool],
        order: &mut Vec<NodeId>,
    ) {
        visited[root.index()] = true;
        order.push(root);
        let mut stack = vec![(root, 0usize)];
        while let Some(&(node, cursor)) = stack.last() {
            let neighbours = self.graph.neighbours(node);
            let seen: &[bool] = visited;
            let next = neighbours[cursor..]
                .iter()
                .position(|adj| !seen[adj.node.index()] && step(adj.node, seen));
            match next {
                Some(offset) => {
                    let next = neighbours[cursor + offset].node;
                    if let Some(top) = stack.last_mut() {
                        top.1 = cursor + offset + 1;
                    }
                    visited[next.index()] = true;
                    order.push(next);
                    stack.push((next, 0));
                }
                None => {
                    stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::TableReference;
    use joinplan_core::{ColumnInfo, SqlType, TableMetadata};

    fn table(id: &str) -> TableReference {
        TableReference::new(
            TableMetadata::new(id, id.to_lowercase())
                .column(ColumnInfo::new("id", SqlType::Integer).primary_key(true)),
        )
    }

    fn child(id: &str, parent: &str) -> TableReference {
        TableReference::new(
            TableMetadata::new(id, id.to_lowercase())
                .column(ColumnInfo::new("id", SqlType::Integer).primary_key(true))
                .column(ColumnInfo::new("parent_id", SqlType::Integer).references_table(parent)),
        )
    }

    fn filtered(table: TableReference) -> TableReference {
        let cond = table.col("id").is_in([1, 2]);
        table.with_condition(cond)
    }

    fn names(plan: &JoinPlan) -> Vec<&str> {
        plan.tables().iter().map(TableId::as_str).collect()
    }

    #[test]
    fn test_required_tables_precede_reachable_optional_ones() {
        let mut graph = QueryGraph::new(vec![table("A"), table("B"), table("C")], vec![]).unwrap();
        graph
            .add_optional(vec![child("D", "A"), child("E", "D")], vec![])
            .unwrap();
        let plan = graph.to_list();
        assert_eq!(names(&plan), ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_filtered_required_table_is_first_root() {
        let graph = QueryGraph::new(vec![table("A"), filtered(table("B"))], vec![]).unwrap();
        assert_eq!(names(&graph.to_list()), ["B", "A"]);
    }

    #[test]
    fn test_required_component_walks_depth_first() {
        let graph = QueryGraph::new(
            vec![table("A"), child("B", "A"), child("C", "B"), child("D", "A")],
            vec![],
        )
        .unwrap();
        assert_eq!(names(&graph.to_list()), ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_optional_only_uses_single_pass_priority() {
        let mut graph = QueryGraph::default();
        graph
            .add_optional(
                vec![table("A"), filtered(table("B")), child("C", "A")],
                vec![],
            )
            .unwrap();
        assert_eq!(names(&graph.to_list()), ["B", "A", "C"]);
    }

    #[test]
    fn test_late_required_tables_lead() {
        let mut graph = QueryGraph::default();
        graph
            .add_optional(vec![table("A"), table("B"), table("C")], vec![])
            .unwrap();
        graph
            .add_required(vec![filtered(table("D")), filtered(table("E"))], vec![])
            .unwrap();
        assert_eq!(names(&graph.to_list()), ["D", "E", "A", "B", "C"]);
    }

    #[test]
    fn test_isolated_optional_table_trails() {
        let mut graph = QueryGraph::new(vec![table("A")], vec![]).unwrap();
        graph
            .add_optional(vec![table("Z"), child("B", "A")], vec![])
            .unwrap();
        assert_eq!(names(&graph.to_list()), ["A", "B", "Z"]);
    }

    #[test]
    fn test_plan_records_generation() {
        let graph = QueryGraph::new(vec![table("A")], vec![]).unwrap();
        let plan = graph.to_list();
        assert_eq!(plan.generation(), graph.generation());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.position(plan.nodes()[0]), Some(0));
    }

    #[test]
    fn test_order_is_deterministic() {
        let mut graph = QueryGraph::new(vec![table("A"), child("B", "A")], vec![]).unwrap();
        graph.add_optional(vec![child("C", "B"), table("D")], vec![]).unwrap();
        assert_eq!(graph.to_list(), graph.to_list());
    }
}
