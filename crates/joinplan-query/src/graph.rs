//! The query graph: table references as nodes, join predicates as edges.
//!
//! The graph is an arena of [`TableReference`] nodes plus a flat edge list.
//! Each node keeps its incident edges in insertion order, which is the order
//! the join orderer follows when it walks a component. Parallel edges are
//! kept: a composite foreign key contributes one edge per column pair and all
//! of them end up in the ON clause.

use std::collections::HashMap;
use std::fmt;

use joinplan_core::{Condition, Error, Relationship, Result, TableId};

use crate::order::{JoinOrderer, JoinPlan};
use crate::reference::TableReference;
use crate::resolver::{RelationshipEdge, RelationshipResolver};

/// Index of a node in a [`QueryGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in insertion order.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One incident edge of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacent {
    /// Index into [`QueryGraph::edges`].
    pub edge: usize,
    /// The node at the other end.
    pub node: NodeId,
}

/// Undirected multigraph of the tables in one query.
#[derive(Debug, Clone, Default)]
pub struct QueryGraph {
    nodes: Vec<TableReference>,
    index: HashMap<TableId, NodeId>,
    edges: Vec<RelationshipEdge>,
    endpoints: Vec<(NodeId, NodeId)>,
    adjacency: Vec<Vec<Adjacent>>,
    standalone: Vec<Vec<Condition>>,
    residual: Vec<Condition>,
    pending: Vec<Condition>,
    generation: u64,
}

/// Changes computed by one `add` call, applied only once everything resolved.
struct Staged {
    nodes: Vec<TableReference>,
    merged: Vec<(NodeId, TableReference)>,
    edges: Vec<RelationshipEdge>,
    standalone: Vec<(TableId, Condition)>,
    residual: Vec<Condition>,
    pending: Vec<Condition>,
}

impl QueryGraph {
    /// Build a graph from the required tables and the conditions among them.
    pub fn new(required: Vec<TableReference>, conditions: Vec<Condition>) -> Result<Self> {
        let mut graph = Self::default();
        graph.add(required, conditions, true)?;
        Ok(graph)
    }

    /// Add optional tables, resolving edges to every node already present.
    pub fn add_optional(&mut self, optional: Vec<TableReference>, conditions: Vec<Condition>) -> Result<()> {
        self.add(optional, conditions, false)
    }

    /// Add required tables, resolving edges to every node already present.
    pub fn add_required(&mut self, required: Vec<TableReference>, conditions: Vec<Condition>) -> Result<()> {
        self.add(required, conditions, true)
    }

    /// Add query-level conditions without adding tables.
    pub fn add_conditions(&mut self, conditions: Vec<Condition>) -> Result<()> {
        self.add(Vec::new(), conditions, false)
    }

    fn add(&mut self, tables: Vec<TableReference>, conditions: Vec<Condition>, required: bool) -> Result<()> {
        let staged = self.stage(tables, conditions, required)?;
        self.commit(staged);
        Ok(())
    }

    /// Resolve everything an addition implies without touching the graph, so
    /// a failing addition leaves it unchanged.
    fn stage(&self, tables: Vec<TableReference>, conditions: Vec<Condition>, required: bool) -> Result<Staged> {
        let mut nodes: Vec<TableReference> = Vec::new();
        // Updated copies of nodes already in the graph that were added again,
        // with the relationships the repeat declared for the first time.
        let mut merged: Vec<(NodeId, TableReference, Vec<Relationship>)> = Vec::new();
        for mut table in tables {
            table.validate()?;
            if let Some(&node) = self.index.get(table.id()) {
                tracing::debug!(table = %table.id(), node = %node, "Merging repeated table reference");
                let slot = match merged.iter().position(|(n, ..)| *n == node) {
                    Some(slot) => slot,
                    None => {
                        merged.push((node, self.nodes[node.index()].clone(), Vec::new()));
                        merged.len() - 1
                    }
                };
                let (_, current, fresh) = &mut merged[slot];
                fresh.extend(current.absorb(table, required)?);
            } else if let Some(current) = nodes.iter_mut().find(|n| n.id() == table.id()) {
                tracing::debug!(table = %table.id(), "Merging repeated table reference");
                current.absorb(table, required)?;
            } else {
                table.set_required(required);
                nodes.push(table);
            }
        }

        let existing: Vec<&TableReference> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                merged
                    .iter()
                    .find(|(n, ..)| n.index() == i)
                    .map_or(node, |(_, current, _)| current)
            })
            .collect();

        let lookup = |id: &TableId| -> Option<&TableReference> {
            self.index
                .get(id)
                .map(|node| &self.nodes[node.index()])
                .or_else(|| nodes.iter().find(|n| n.id() == id))
        };

        let mut residual = Vec::new();
        let mut open = self.pending.clone();
        for condition in conditions {
            match condition.tables().len() {
                1 | 2 => open.push(condition),
                _ => residual.push(condition),
            }
        }

        let mut standalone = Vec::new();
        let mut pairs = Vec::new();
        let mut pending = Vec::new();
        for condition in open {
            let tables = condition.tables();
            if !tables.iter().all(|id| lookup(id).is_some()) {
                pending.push(condition);
                continue;
            }
            let mut ids = tables.into_iter();
            match (ids.next(), ids.next()) {
                (Some(id), None) => standalone.push((id, condition)),
                _ => pairs.push(condition),
            }
        }

        for (id, condition) in &standalone {
            if let Some(table) = lookup(id) {
                for column in condition.columns() {
                    if !table.metadata().has_column(&column.column) {
                        return Err(Error::ColumnOwnershipMismatch {
                            table: id.clone(),
                            column: column.column.clone(),
                        });
                    }
                }
            }
        }

        let resolver = RelationshipResolver::new();
        let mut edges = Vec::new();
        // Pairs of nodes that were both present before this call only gain
        // edges from the conditions resolved now and from relationships a
        // repeated reference declared.
        for (i, a) in existing.iter().enumerate() {
            for b in &existing[i + 1..] {
                resolver.condition_edges(a, b, &pairs, &mut edges)?;
            }
        }
        for (node, current, fresh) in &merged {
            for (i, other) in existing.iter().enumerate() {
                if i != node.index() {
                    resolver.declared_edges(current, fresh, other, &mut edges)?;
                }
            }
        }
        for (i, new) in nodes.iter().enumerate() {
            for prior in existing.iter().copied().chain(&nodes[..i]) {
                edges.extend(resolver.edges_between(prior, new, &pairs)?);
            }
        }

        let merged = merged
            .into_iter()
            .map(|(node, current, _)| (node, current))
            .collect();
        Ok(Staged {
            nodes,
            merged,
            edges,
            standalone,
            residual,
            pending,
        })
    }

    fn commit(&mut self, staged: Staged) {
        for (node, table) in staged.merged {
            self.nodes[node.index()] = table;
        }
        for table in staged.nodes {
            let id = NodeId(self.nodes.len());
            tracing::debug!(
                table = %table.id(),
                node = %id,
                required = table.is_required(),
                "Added table to query graph"
            );
            self.index.insert(table.id().clone(), id);
            self.nodes.push(table);
            self.adjacency.push(Vec::new());
            self.standalone.push(Vec::new());
        }
        for edge in staged.edges {
            let (Some(&left), Some(&right)) = (self.index.get(&edge.left), self.index.get(&edge.right)) else {
                continue;
            };
            let position = self.edges.len();
            self.adjacency[left.index()].push(Adjacent {
                edge: position,
                node: right,
            });
            self.adjacency[right.index()].push(Adjacent {
                edge: position,
                node: left,
            });
            self.endpoints.push((left, right));
            self.edges.push(edge);
        }
        for (id, condition) in staged.standalone {
            if let Some(node) = self.index.get(&id) {
                self.standalone[node.index()].push(condition);
            }
        }
        self.residual.extend(staged.residual);
        self.pending = staged.pending;
        self.generation += 1;
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            generation = self.generation,
            "Query graph updated"
        );
    }

    /// Table references in insertion order.
    pub fn nodes(&self) -> &[TableReference] {
        &self.nodes
    }

    /// The table at `node`.
    pub fn node(&self, node: NodeId) -> &TableReference {
        &self.nodes[node.index()]
    }

    /// The node holding table `id`.
    pub fn node_id(&self, id: &TableId) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Every edge in insertion order.
    pub fn edges(&self) -> &[RelationshipEdge] {
        &self.edges
    }

    /// Endpoints of edge `edge` as stored.
    pub fn endpoints(&self, edge: usize) -> (NodeId, NodeId) {
        self.endpoints[edge]
    }

    /// Edges connecting `a` and `b`, in insertion order.
    pub fn edges_between(&self, a: NodeId, b: NodeId) -> impl Iterator<Item = &RelationshipEdge> + '_ {
        self.adjacency[a.index()]
            .iter()
            .filter(move |adj| adj.node == b)
            .map(|adj| &self.edges[adj.edge])
    }

    /// Incident edges of `node` in insertion order.
    pub fn neighbours(&self, node: NodeId) -> &[Adjacent] {
        &self.adjacency[node.index()]
    }

    /// Filters on `node` alone: those attached to the reference, then
    /// query-level conditions naming only this table.
    pub fn standalone_conditions(&self, node: NodeId) -> impl Iterator<Item = &Condition> + '_ {
        self.nodes[node.index()]
            .conditions()
            .iter()
            .chain(&self.standalone[node.index()])
    }

    /// Whether any standalone filter applies to `node`.
    pub fn has_conditions(&self, node: NodeId) -> bool {
        self.nodes[node.index()].has_conditions() || !self.standalone[node.index()].is_empty()
    }

    /// Conditions naming no table or more than two tables.
    pub fn residual_conditions(&self) -> &[Condition] {
        &self.residual
    }

    /// Check that every query-level condition could be placed and that
    /// residual conditions only name columns of tables in the graph.
    pub fn check_conditions(&self) -> Result<()> {
        for condition in self.pending.iter().chain(&self.residual) {
            for column in condition.columns() {
                let Some(node) = self.node_id(&column.table) else {
                    return Err(Error::TableNotInQuery {
                        table: column.table.clone(),
                    });
                };
                if !self.node(node).metadata().has_column(&column.column) {
                    return Err(Error::ColumnOwnershipMismatch {
                        table: column.table.clone(),
                        column: column.column.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether any table is required.
    pub fn has_required(&self) -> bool {
        self.nodes.iter().any(TableReference::is_required)
    }

    /// Mutation counter; bumped by every successful addition.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Compute the join order.
    pub fn to_list(&self) -> JoinPlan {
        JoinOrderer::new(self).order()
    }
}
