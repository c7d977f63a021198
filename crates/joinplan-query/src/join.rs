//! FROM / WHERE assembly.
//!
//! [`JoinClauseBuilder`] walks a [`JoinPlan`] and renders either ANSI joins
//! (`a AS t1 INNER JOIN b AS t2 ON( ... )`) or the legacy flat form
//! (`a AS t1, b AS t2` with every predicate in WHERE).
//!
//! In ANSI mode each table after the first is joined on every edge that
//! connects it to any table already emitted, so composite keys and multiple
//! paths all land in the same ON clause. The keyword is `INNER JOIN` for
//! required tables, `LEFT OUTER JOIN` for optional tables when the plan has a
//! required table, and `FULL OUTER JOIN` when it has none.
//!
//! Legacy mode cannot express outer joins; optional tables are filtered like
//! required ones and a [`QueryWarning::LegacyOuterJoin`] is reported.

use std::fmt;

use joinplan_core::{Error, Result, TableId, Value};

use crate::alias::AliasMap;
use crate::dialect::Dialect;
use crate::graph::{NodeId, QueryGraph};
use crate::options::{CartesianPolicy, QueryOptions};
use crate::order::JoinPlan;
use crate::render::RenderContext;

/// Non-fatal findings reported with a built query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryWarning {
    /// The table has no predicate linking it to the tables before it.
    DisconnectedTable { table: TableId },
    /// An optional table was rendered with inner-join semantics in legacy mode.
    LegacyOuterJoin { table: TableId },
}

impl fmt::Display for QueryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryWarning::DisconnectedTable { table } => write!(
                f,
                "table {} has no join predicate to the preceding tables; the join is a cartesian product",
                table
            ),
            QueryWarning::LegacyOuterJoin { table } => write!(
                f,
                "optional table {} is filtered like a required table in legacy join syntax",
                table
            ),
        }
    }
}

/// The rendered FROM and WHERE bodies of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Body of the FROM clause, without the keyword.
    pub from: String,
    /// Body of the WHERE clause, without the keyword. Never empty.
    pub where_clause: String,
    /// Parameters referenced by placeholders in `from` then `where_clause`.
    pub params: Vec<Value>,
    pub warnings: Vec<QueryWarning>,
    /// Aliases used in the clause.
    pub aliases: AliasMap,
}

impl JoinClause {
    /// `FROM <from> WHERE <where>`.
    pub fn to_sql(&self) -> String {
        format!("FROM {} WHERE {}", self.from, self.where_clause)
    }
}

/// Renders a [`JoinPlan`] of a [`QueryGraph`].
#[derive(Debug, Clone)]
pub struct JoinClauseBuilder<'a> {
    graph: &'a QueryGraph,
    dialect: Dialect,
    ansi: bool,
    match_all_relationships: bool,
    match_all_conditions: bool,
    cartesian: CartesianPolicy,
}

impl<'a> JoinClauseBuilder<'a> {
    /// ANSI joins, AND connectors and the default cartesian policy.
    pub fn new(graph: &'a QueryGraph, dialect: Dialect) -> Self {
        Self {
            graph,
            dialect,
            ansi: true,
            match_all_relationships: true,
            match_all_conditions: true,
            cartesian: CartesianPolicy::default(),
        }
    }

    /// Take every setting from `options`.
    pub fn from_options(graph: &'a QueryGraph, options: &QueryOptions) -> Self {
        Self::new(graph, options.dialect)
            .ansi(options.ansi_join)
            .match_all_relationships(options.match_all_relationships)
            .match_all_conditions(options.match_all_conditions)
            .cartesian(options.cartesian)
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Choose between ANSI and legacy join syntax.
    pub fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    pub fn match_all_relationships(mut self, value: bool) -> Self {
        self.match_all_relationships = value;
        self
    }

    pub fn match_all_conditions(mut self, value: bool) -> Self {
        self.match_all_conditions = value;
        self
    }

    pub fn cartesian(mut self, policy: CartesianPolicy) -> Self {
        self.cartesian = policy;
        self
    }

    /// Render `plan`, which must have been computed from the current state of
    /// the graph.
    #[tracing::instrument(level = "debug", skip(self, plan), fields(tables = plan.len(), ansi = self.ansi))]
    pub fn build(&self, plan: &JoinPlan) -> Result<JoinClause> {
        let graph = self.graph;
        if plan.generation() != graph.generation() || plan.len() != graph.len() {
            return Err(Error::StalePlan {
                plan_generation: plan.generation(),
                graph_generation: graph.generation(),
            });
        }
        if graph.is_empty() {
            return Err(Error::EmptyQuery);
        }
        graph.check_conditions()?;

        let has_required = graph.has_required();
        if self.ansi && !has_required && plan.len() > 1 && !self.dialect.supports_full_outer_join() {
            return Err(Error::FullOuterJoinUnsupported {
                dialect: self.dialect.name(),
            });
        }

        let aliases = AliasMap::for_graph(graph);
        let mut ctx = RenderContext::new(graph, &aliases, self.dialect);
        let mut warnings = Vec::new();
        let mut emitted = vec![false; graph.len()];
        let mut tables = Vec::with_capacity(plan.len());
        let mut edge_predicates = Vec::new();
        let mut filtered_in_where: Vec<NodeId> = Vec::new();

        for (position, &node) in plan.nodes().iter().enumerate() {
            let table = graph.node(node);
            let alias = aliases.get(node).ok_or_else(|| Error::TableNotInQuery {
                table: table.id().clone(),
            })?;
            let source = format!(
                "{}{}{}",
                self.dialect.format_identifier(table.name()),
                self.dialect.table_alias_token(),
                alias
            );

            let edges: Vec<usize> = graph
                .neighbours(node)
                .iter()
                .filter(|adj| emitted[adj.node.index()])
                .map(|adj| adj.edge)
                .collect();
            if position > 0 && edges.is_empty() {
                self.disconnected(table.id(), &mut warnings)?;
            }
            let predicates = edges
                .iter()
                .map(|&edge| ctx.edge(&graph.edges()[edge]))
                .collect::<Result<Vec<_>>>()?;

            if !self.ansi {
                if !table.is_required() && plan.len() > 1 {
                    tracing::warn!(table = %table.id(), "Legacy join syntax drops outer join semantics");
                    warnings.push(QueryWarning::LegacyOuterJoin {
                        table: table.id().clone(),
                    });
                }
                tables.push(source);
                edge_predicates.extend(predicates);
                filtered_in_where.push(node);
            } else if position == 0 {
                tables.push(source);
                filtered_in_where.push(node);
            } else {
                let keyword = if table.is_required() {
                    self.dialect.inner_join()
                } else if has_required {
                    self.dialect.left_outer_join()
                } else {
                    self.dialect.full_outer_join()
                };
                let mut on = if predicates.is_empty() {
                    self.dialect.always_true().to_string()
                } else {
                    ctx.combine(predicates, self.match_all_relationships)
                };
                if table.is_required() {
                    filtered_in_where.push(node);
                } else {
                    // Filters on an outer-joined table belong to its ON
                    // clause, otherwise WHERE discards the unmatched rows.
                    let filters = graph
                        .standalone_conditions(node)
                        .map(|c| ctx.condition(c))
                        .collect::<Result<Vec<_>>>()?;
                    if !filters.is_empty() {
                        let filters = ctx.combine(filters, self.match_all_conditions);
                        on = format!("{}{}{}", on, self.dialect.and_token(), filters);
                    }
                }
                tables.push(format!(
                    "{}{}{}{}{}",
                    keyword,
                    source,
                    self.dialect.begin_on_clause(),
                    on,
                    self.dialect.end_on_clause()
                ));
            }
            emitted[node.index()] = true;
        }

        let mut filters = Vec::new();
        for &node in &filtered_in_where {
            for condition in graph.standalone_conditions(node) {
                filters.push(ctx.condition(condition)?);
            }
        }
        for condition in graph.residual_conditions() {
            filters.push(ctx.condition(condition)?);
        }

        let edge_group = (!edge_predicates.is_empty())
            .then(|| ctx.combine(edge_predicates, self.match_all_relationships));
        let filter_group = (!filters.is_empty()).then(|| ctx.combine(filters, self.match_all_conditions));
        let where_clause = match (edge_group, filter_group) {
            (Some(edges), Some(filters)) => format!("{}{}{}", edges, self.dialect.and_token(), filters),
            (Some(group), None) | (None, Some(group)) => group,
            (None, None) => self.dialect.always_true().to_string(),
        };

        let from = if self.ansi {
            tables.concat()
        } else {
            tables.join(", ")
        };
        let params = ctx.into_params();
        tracing::trace!(from = %from, where_clause = %where_clause, params = params.len(), "Rendered join clause");
        Ok(JoinClause {
            from,
            where_clause,
            params,
            warnings,
            aliases,
        })
    }

    fn disconnected(&self, table: &TableId, warnings: &mut Vec<QueryWarning>) -> Result<()> {
        match self.cartesian {
            CartesianPolicy::Allow => Ok(()),
            CartesianPolicy::Warn => {
                tracing::warn!(table = %table, "Table is not connected to the preceding tables");
                warnings.push(QueryWarning::DisconnectedTable { table: table.clone() });
                Ok(())
            }
            CartesianPolicy::Deny => Err(Error::DisconnectedTable { table: table.clone() }),
        }
    }
}
