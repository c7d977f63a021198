//! Complete SELECT statements over a query graph.

use joinplan_core::{ColumnRef, Condition, Error, Result, Value};

use crate::dialect::Dialect;
use crate::graph::QueryGraph;
use crate::guard::BlankQueryGuard;
use crate::join::{JoinClause, JoinClauseBuilder, QueryWarning};
use crate::options::QueryOptions;
use crate::order::JoinPlan;
use crate::reference::TableReference;

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub descending: bool,
}

impl OrderBy {
    /// Ascending order on `column`.
    pub fn asc(column: ColumnRef) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    /// Descending order on `column`.
    pub fn desc(column: ColumnRef) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// A rendered statement ready for an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    /// SQL text.
    pub sql: String,
    /// Bound parameters in placeholder order.
    pub params: Vec<Value>,
    /// The join order the statement was rendered with.
    pub plan: JoinPlan,
    pub warnings: Vec<QueryWarning>,
}

/// SELECT over the tables of one query.
///
/// # Example
///
/// ```
/// use joinplan_core::{ColumnInfo, SqlType, TableId, TableMetadata};
/// use joinplan_query::{table_alias, QueryOptions, SelectQuery, TableReference};
///
/// let company = TableMetadata::new("CarCompany", "car_company")
///     .column(ColumnInfo::new("uid_carcompany", SqlType::Integer).primary_key(true))
///     .column(ColumnInfo::new("name", SqlType::Text));
/// let company = TableReference::new(company);
/// let name = company.col("name");
///
/// let mut query = SelectQuery::new(QueryOptions::default());
/// query.add_required([company.with_condition(name.eq("Toyota"))])?;
/// let built = query.build()?;
/// let alias = table_alias(&TableId::new("CarCompany"));
/// assert!(built.sql.ends_with(&format!("WHERE {}.name = $1", alias)));
/// assert_eq!(built.params.len(), 1);
/// # Ok::<(), joinplan_core::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    options: QueryOptions,
    graph: QueryGraph,
    order_by: Vec<OrderBy>,
}

impl SelectQuery {
    /// Create an empty query.
    pub fn new(options: QueryOptions) -> Self {
        Self {
            options,
            graph: QueryGraph::default(),
            order_by: Vec::new(),
        }
    }

    /// Add tables every result row must match.
    pub fn add_required(&mut self, tables: impl IntoIterator<Item = TableReference>) -> Result<&mut Self> {
        self.graph.add_required(tables.into_iter().collect(), Vec::new())?;
        Ok(self)
    }

    /// Add tables joined with outer-join semantics.
    pub fn add_optional(&mut self, tables: impl IntoIterator<Item = TableReference>) -> Result<&mut Self> {
        self.graph.add_optional(tables.into_iter().collect(), Vec::new())?;
        Ok(self)
    }

    /// Add a query-level condition. It may name tables added later.
    pub fn add_condition(&mut self, condition: Condition) -> Result<&mut Self> {
        self.graph.add_conditions(vec![condition])?;
        Ok(self)
    }

    /// Append an ORDER BY term.
    pub fn order_by(&mut self, order: OrderBy) -> &mut Self {
        self.order_by.push(order);
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut QueryOptions {
        &mut self.options
    }

    pub fn graph(&self) -> &QueryGraph {
        &self.graph
    }

    /// The join order for the current tables.
    pub fn plan(&self) -> JoinPlan {
        self.graph.to_list()
    }

    /// Build with the configured dialect.
    pub fn build(&self) -> Result<BuiltQuery> {
        self.build_with_dialect(self.options.dialect)
    }

    /// Build the SELECT for a specific dialect.
    #[tracing::instrument(level = "debug", skip(self), fields(tables = self.graph.len()))]
    pub fn build_with_dialect(&self, dialect: Dialect) -> Result<BuiltQuery> {
        let (plan, clause) = self.prepare(dialect)?;

        let mut columns = Vec::new();
        for &node in plan.nodes() {
            let table = self.graph.node(node);
            let alias = clause.aliases.get(node).ok_or_else(|| Error::TableNotInQuery {
                table: table.id().clone(),
            })?;
            for column in &table.metadata().columns {
                columns.push(format!(
                    "{}.{}{}{}",
                    alias,
                    dialect.format_identifier(&column.name),
                    dialect.column_alias_token(),
                    dialect.format_identifier(&format!("{}_{}", alias, column.name))
                ));
            }
        }

        let mut sql = String::from("SELECT ");
        if self.options.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&columns.join(", "));
        sql.push(' ');
        sql.push_str(&clause.to_sql());

        let limit = dialect.limit_clause(self.options.row_limit, self.options.offset());
        let order = self.render_order_by(&clause, dialect)?;
        match (order, &limit) {
            (Some(order), _) => {
                sql.push_str(" ORDER BY ");
                sql.push_str(&order);
            }
            (None, Some(_)) if dialect.requires_order_for_offset() => {
                sql.push_str(" ORDER BY (SELECT NULL)");
            }
            (None, _) => {}
        }
        if let Some(limit) = limit {
            sql.push(' ');
            sql.push_str(&limit);
        }

        tracing::trace!(sql = %sql, params = clause.params.len(), "Built select statement");
        Ok(BuiltQuery {
            sql,
            params: clause.params,
            plan,
            warnings: clause.warnings,
        })
    }

    /// Build `SELECT COUNT(*)` over the same joins and filters. Ordering and
    /// paging do not apply.
    #[tracing::instrument(level = "debug", skip(self), fields(tables = self.graph.len()))]
    pub fn build_count(&self) -> Result<BuiltQuery> {
        let (plan, clause) = self.prepare(self.options.dialect)?;
        let sql = format!("SELECT COUNT(*) {}", clause.to_sql());
        tracing::trace!(sql = %sql, "Built count statement");
        Ok(BuiltQuery {
            sql,
            params: clause.params,
            plan,
            warnings: clause.warnings,
        })
    }

    fn prepare(&self, dialect: Dialect) -> Result<(JoinPlan, JoinClause)> {
        if self.graph.is_empty() {
            return Err(Error::EmptyQuery);
        }
        BlankQueryGuard::enforce(&self.graph, self.options.allow_blank)?;
        let plan = self.graph.to_list();
        let clause = JoinClauseBuilder::from_options(&self.graph, &self.options)
            .dialect(dialect)
            .build(&plan)?;
        Ok((plan, clause))
    }

    fn render_order_by(&self, clause: &JoinClause, dialect: Dialect) -> Result<Option<String>> {
        if self.order_by.is_empty() {
            return Ok(None);
        }
        let mut terms = Vec::with_capacity(self.order_by.len());
        for order in &self.order_by {
            let column = &order.column;
            let node = self.graph.node_id(&column.table).ok_or_else(|| Error::TableNotInQuery {
                table: column.table.clone(),
            })?;
            if !self.graph.node(node).metadata().has_column(&column.column) {
                return Err(Error::ColumnOwnershipMismatch {
                    table: column.table.clone(),
                    column: column.column.clone(),
                });
            }
            let alias = clause.aliases.get(node).ok_or_else(|| Error::TableNotInQuery {
                table: column.table.clone(),
            })?;
            terms.push(format!(
                "{}.{} {}",
                alias,
                dialect.format_identifier(&column.column),
                if order.descending { "DESC" } else { "ASC" }
            ));
        }
        Ok(Some(terms.join(", ")))
    }
}
