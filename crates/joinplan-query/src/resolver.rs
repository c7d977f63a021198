//! Derivation of join predicates between pairs of tables.

use joinplan_core::{
    ColumnInfo, ColumnRef, Condition, Error, ForeignKeyRef, Operator, Provenance, Relationship, Result,
    TableId,
};

use crate::reference::TableReference;

/// The predicate carried by an edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `left op right` between two columns.
    Columns {
        left: ColumnRef,
        op: Operator,
        right: ColumnRef,
    },
    /// A caller condition referencing exactly the two endpoint tables.
    Expression(Condition),
}

/// A join predicate connecting exactly two tables.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipEdge {
    pub left: TableId,
    pub right: TableId,
    pub predicate: Predicate,
    pub provenance: Provenance,
}

impl RelationshipEdge {
    /// Whether the edge connects `a` and `b`, in either direction.
    pub fn connects(&self, a: &TableId, b: &TableId) -> bool {
        (&self.left == a && &self.right == b) || (&self.left == b && &self.right == a)
    }

    /// The endpoint opposite `table`.
    pub fn other(&self, table: &TableId) -> Option<&TableId> {
        if &self.left == table {
            Some(&self.right)
        } else if &self.right == table {
            Some(&self.left)
        } else {
            None
        }
    }

    /// Operator of a column predicate.
    pub fn operator(&self) -> Option<Operator> {
        match &self.predicate {
            Predicate::Columns { op, .. } => Some(*op),
            Predicate::Expression(_) => None,
        }
    }
}

/// Finds every predicate connecting two table references.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipResolver;

impl RelationshipResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Every edge between `a` and `b`: foreign keys in both directions,
    /// explicit relationships declared on either table, and `conditions`
    /// naming exactly these two tables, in that order.
    pub fn edges_between(
        &self,
        a: &TableReference,
        b: &TableReference,
        conditions: &[Condition],
    ) -> Result<Vec<RelationshipEdge>> {
        let mut edges = Vec::new();
        Self::foreign_key_edges(a, b, &mut edges)?;
        Self::foreign_key_edges(b, a, &mut edges)?;
        Self::relationship_edges(a, a.relationships(), b, &mut edges)?;
        Self::relationship_edges(b, b.relationships(), a, &mut edges)?;
        self.condition_edges(a, b, conditions, &mut edges)?;
        for edge in &edges {
            tracing::trace!(
                left = %edge.left,
                right = %edge.right,
                provenance = ?edge.provenance,
                "Resolved join predicate"
            );
        }
        Ok(edges)
    }

    /// Edges for `conditions` that reference exactly `a` and `b`.
    pub fn condition_edges(
        &self,
        a: &TableReference,
        b: &TableReference,
        conditions: &[Condition],
        out: &mut Vec<RelationshipEdge>,
    ) -> Result<()> {
        for condition in conditions.iter().filter(|c| c.connects(a.id(), b.id())) {
            for column in condition.columns() {
                let owner = if &column.table == a.id() { a } else { b };
                if !owner.metadata().has_column(&column.column) {
                    return Err(Error::ColumnOwnershipMismatch {
                        table: column.table.clone(),
                        column: column.column.clone(),
                    });
                }
            }
            out.push(RelationshipEdge {
                left: a.id().clone(),
                right: b.id().clone(),
                predicate: Predicate::Expression(condition.clone()),
                provenance: Provenance::ExplicitCondition,
            });
        }
        Ok(())
    }

    /// Edges for `relationships` declared on `from` whose foreign column
    /// lives in `to`.
    pub fn declared_edges(
        &self,
        from: &TableReference,
        relationships: &[Relationship],
        to: &TableReference,
        out: &mut Vec<RelationshipEdge>,
    ) -> Result<()> {
        Self::relationship_edges(from, relationships, to, out)
    }

    /// Foreign keys declared on `from` that reference `to`.
    ///
    /// The edge is oriented referenced-key first: `to.pk = from.fk`.
    fn foreign_key_edges(
        from: &TableReference,
        to: &TableReference,
        out: &mut Vec<RelationshipEdge>,
    ) -> Result<()> {
        for (column, fk) in from.metadata().foreign_keys() {
            if !fk.targets(to.metadata()) || !from.uses_foreign_key(&column.name) {
                continue;
            }
            let target = Self::foreign_key_target(from, column, fk, to)?;
            out.push(RelationshipEdge {
                left: to.id().clone(),
                right: from.id().clone(),
                predicate: Predicate::Columns {
                    left: to.col(target.name.clone()),
                    op: Operator::Eq,
                    right: from.col(column.name.clone()),
                },
                provenance: Provenance::ImplicitForeignKey,
            });
        }
        Ok(())
    }

    /// The primary key column a foreign key compares against.
    fn foreign_key_target<'a>(
        from: &TableReference,
        column: &ColumnInfo,
        fk: &ForeignKeyRef,
        to: &'a TableReference,
    ) -> Result<&'a ColumnInfo> {
        let mismatch = |reason: String| Error::ForeignKeyCannotBeComparedToPrimaryKey {
            table: from.id().clone(),
            column: column.name.clone(),
            target_table: fk.table.clone(),
            target_column: fk.column.clone(),
            reason,
        };
        let primary_key = to.metadata().primary_key();
        let target = match &fk.column {
            Some(name) => match to.metadata().column_named(name) {
                Some(target) if target.primary_key => target,
                Some(_) => {
                    return Err(mismatch(format!("{} is not a primary key column of {}", name, to.id())));
                }
                None => return Err(mismatch(format!("{} has no column {}", to.id(), name))),
            },
            None => match primary_key.as_slice() {
                [single] => single,
                [] => return Err(mismatch(format!("{} has no primary key", to.id()))),
                _ => {
                    return Err(mismatch(format!(
                        "{} has a composite primary key; the foreign key must name a column",
                        to.id()
                    )));
                }
            },
        };
        if !column.sql_type.is_comparable_with(&target.sql_type) {
            return Err(mismatch(format!(
                "{} cannot be compared to {}",
                column.sql_type.sql_name(),
                target.sql_type.sql_name()
            )));
        }
        Ok(target)
    }

    fn relationship_edges(
        from: &TableReference,
        relationships: &[Relationship],
        to: &TableReference,
        out: &mut Vec<RelationshipEdge>,
    ) -> Result<()> {
        for relationship in relationships {
            if &relationship.foreign.table != to.id() {
                continue;
            }
            if !to.metadata().has_column(&relationship.foreign.column) {
                return Err(Error::ColumnOwnershipMismatch {
                    table: to.id().clone(),
                    column: relationship.foreign.column.clone(),
                });
            }
            out.push(RelationshipEdge {
                left: from.id().clone(),
                right: to.id().clone(),
                predicate: Predicate::Columns {
                    left: from.col(relationship.local_column.clone()),
                    op: relationship.operator,
                    right: relationship.foreign.clone(),
                },
                provenance: Provenance::ExplicitRelationship,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinplan_core::{ColumnInfo, SqlType, TableMetadata};

    fn car_company() -> TableReference {
        TableReference::new(
            TableMetadata::new("CarCompany", "car_company")
                .column(ColumnInfo::new("uid_carcompany", SqlType::Integer).primary_key(true))
                .column(ColumnInfo::new("name", SqlType::Text)),
        )
    }

    fn marque(fk: ColumnInfo) -> TableReference {
        TableReference::new(
            TableMetadata::new("Marque", "marque")
                .column(ColumnInfo::new("uid_marque", SqlType::Integer).primary_key(true))
                .column(ColumnInfo::new("name", SqlType::Text))
                .column(fk),
        )
    }

    fn standard_marque() -> TableReference {
        marque(
            ColumnInfo::new("fk_carcompany", SqlType::Integer)
                .references("car_company", "uid_carcompany"),
        )
    }

    #[test]
    fn test_foreign_key_edge_points_at_primary_key() {
        let edges = RelationshipResolver::new()
            .edges_between(&car_company(), &standard_marque(), &[])
            .unwrap();
        assert_eq!(edges.len(), 1);
        let edge = &edges[0];
        assert_eq!(edge.provenance, Provenance::ImplicitForeignKey);
        assert_eq!(
            edge.predicate,
            Predicate::Columns {
                left: ColumnRef::new("CarCompany", "uid_carcompany"),
                op: Operator::Eq,
                right: ColumnRef::new("Marque", "fk_carcompany"),
            }
        );
    }

    #[test]
    fn test_foreign_key_found_in_either_argument_order() {
        let resolver = RelationshipResolver::new();
        let forward = resolver.edges_between(&car_company(), &standard_marque(), &[]).unwrap();
        let backward = resolver.edges_between(&standard_marque(), &car_company(), &[]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_foreign_key_without_column_uses_single_primary_key() {
        let marque = marque(ColumnInfo::new("fk_carcompany", SqlType::BigInt).references_table("CarCompany"));
        let edges = RelationshipResolver::new()
            .edges_between(&marque, &car_company(), &[])
            .unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_foreign_key_to_non_key_column_fails() {
        let marque = marque(ColumnInfo::new("fk_carcompany", SqlType::Text).references("car_company", "name"));
        let err = RelationshipResolver::new()
            .edges_between(&car_company(), &marque, &[])
            .unwrap_err();
        assert!(matches!(err, Error::ForeignKeyCannotBeComparedToPrimaryKey { .. }));
    }

    #[test]
    fn test_foreign_key_type_mismatch_fails() {
        let marque = marque(
            ColumnInfo::new("fk_carcompany", SqlType::Text).references("car_company", "uid_carcompany"),
        );
        let err = RelationshipResolver::new()
            .edges_between(&car_company(), &marque, &[])
            .unwrap_err();
        assert!(err.to_string().contains("TEXT cannot be compared to INTEGER"));
    }

    #[test]
    fn test_ignored_foreign_key_produces_no_edge() {
        let marque = standard_marque().ignore_foreign_key("fk_carcompany");
        let edges = RelationshipResolver::new()
            .edges_between(&car_company(), &marque, &[])
            .unwrap();
        assert!(edges.is_empty());
    }

    #[test]
    fn test_explicit_relationship_edge() {
        let company = car_company();
        let marque = standard_marque()
            .ignore_all_foreign_keys()
            .relate("name", Operator::Like, company.col("name"));
        let edges = RelationshipResolver::new()
            .edges_between(&company, &marque, &[])
            .unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].provenance, Provenance::ExplicitRelationship);
        assert_eq!(edges[0].operator(), Some(Operator::Like));
        assert_eq!(edges[0].left, TableId::new("Marque"));
    }

    #[test]
    fn test_explicit_relationship_to_missing_column_fails() {
        let company = car_company();
        let marque = standard_marque().relate("name", Operator::Eq, company.col("missing"));
        let err = RelationshipResolver::new()
            .edges_between(&company, &marque, &[])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnOwnershipMismatch { ref table, .. } if table.as_str() == "CarCompany"
        ));
    }

    #[test]
    fn test_condition_edges_only_for_exact_pair() {
        let company = car_company();
        let marque = standard_marque();
        let pair = marque.col("name").eq(company.col("name"));
        let single = marque.col("name").eq("Toyota");
        let edges = RelationshipResolver::new()
            .edges_between(&company, &marque, &[pair, single])
            .unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].provenance, Provenance::ExplicitCondition);
        assert!(edges[1].connects(&TableId::new("Marque"), &TableId::new("CarCompany")));
        assert_eq!(edges[1].other(&TableId::new("Marque")), Some(&TableId::new("CarCompany")));
    }

    #[test]
    fn test_composite_foreign_key_gives_parallel_edges() {
        let parent = TableReference::new(
            TableMetadata::new("Model", "model")
                .column(ColumnInfo::new("marque_id", SqlType::Integer).primary_key(true))
                .column(ColumnInfo::new("model_no", SqlType::Integer).primary_key(true)),
        );
        let child = TableReference::new(
            TableMetadata::new("Trim", "trim_level")
                .column(ColumnInfo::new("uid_trim", SqlType::Integer).primary_key(true))
                .column(ColumnInfo::new("fk_marque", SqlType::Integer).references("model", "marque_id"))
                .column(ColumnInfo::new("fk_model", SqlType::Integer).references("model", "model_no")),
        );
        let edges = RelationshipResolver::new()
            .edges_between(&parent, &child, &[])
            .unwrap();
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_composite_key_requires_named_column() {
        let parent = TableReference::new(
            TableMetadata::new("Model", "model")
                .column(ColumnInfo::new("marque_id", SqlType::Integer).primary_key(true))
                .column(ColumnInfo::new("model_no", SqlType::Integer).primary_key(true)),
        );
        let child = TableReference::new(
            TableMetadata::new("Trim", "trim_level")
                .column(ColumnInfo::new("fk_model", SqlType::Integer).references_table("model")),
        );
        let err = RelationshipResolver::new()
            .edges_between(&parent, &child, &[])
            .unwrap_err();
        assert!(err.to_string().contains("composite primary key"));
    }
}
