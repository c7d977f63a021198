//! Table references participating in a query.

use std::collections::BTreeSet;
use std::sync::Arc;

use joinplan_core::{
    ColumnRef, Condition, Error, Operator, Relationship, Result, Schema, TableId, TableMetadata,
};

/// One table participating in a query.
///
/// A reference carries the table's metadata plus everything the caller
/// attached to it: standalone filter conditions, explicit relationships to
/// other tables, and foreign keys to ignore. Whether the table is required
/// or optional is decided by the query it is added to.
///
/// # Example
///
/// ```
/// use joinplan_core::{ColumnInfo, SqlType, TableMetadata};
/// use joinplan_query::TableReference;
///
/// let meta = TableMetadata::new("Marque", "marque")
///     .column(ColumnInfo::new("uid_marque", SqlType::Integer).primary_key(true))
///     .column(ColumnInfo::new("name", SqlType::Text));
/// let marque = TableReference::new(meta);
/// let marque = marque.clone().with_condition(marque.col("name").eq("Toyota"));
/// assert!(marque.has_conditions());
/// ```
#[derive(Debug, Clone)]
pub struct TableReference {
    metadata: Arc<TableMetadata>,
    required: bool,
    conditions: Vec<Condition>,
    relationships: Vec<Relationship>,
    ignored_foreign_keys: BTreeSet<String>,
    ignore_all_foreign_keys: bool,
}

impl TableReference {
    /// Reference a table.
    pub fn new(metadata: impl Into<Arc<TableMetadata>>) -> Self {
        Self {
            metadata: metadata.into(),
            required: false,
            conditions: Vec::new(),
            relationships: Vec::new(),
            ignored_foreign_keys: BTreeSet::new(),
            ignore_all_foreign_keys: false,
        }
    }

    /// Reference a table from a schema by identity.
    pub fn from_schema(schema: &Schema, id: &str) -> Result<Self> {
        Ok(Self::new(schema.table(id)?.clone()))
    }

    /// Attach a standalone filter. It must only reference this table.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Declare a relationship `local_column op foreign`.
    pub fn relate(mut self, local_column: impl Into<String>, op: Operator, foreign: ColumnRef) -> Self {
        self.relationships
            .push(Relationship::new(local_column, foreign).operator(op));
        self
    }

    /// Declare a prepared relationship.
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Do not derive a join from the foreign key declared on `column`.
    pub fn ignore_foreign_key(mut self, column: impl Into<String>) -> Self {
        self.ignored_foreign_keys.insert(column.into());
        self
    }

    /// Do not derive joins from any foreign key of this table.
    pub fn ignore_all_foreign_keys(mut self) -> Self {
        self.ignore_all_foreign_keys = true;
        self
    }

    pub(crate) fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    /// Fold a second reference to the same table into this one.
    ///
    /// Filters and relationships accumulate and a required duplicate makes
    /// the table required. Returns the relationships `other` declared that
    /// this reference did not already have.
    pub(crate) fn absorb(&mut self, other: TableReference, required: bool) -> Result<Vec<Relationship>> {
        if self.ignore_all_foreign_keys != other.ignore_all_foreign_keys
            || self.ignored_foreign_keys != other.ignored_foreign_keys
        {
            return Err(Error::ConflictingReference {
                table: self.id().clone(),
                reason: "ignored foreign keys differ".to_string(),
            });
        }
        self.required |= required;
        self.conditions.extend(other.conditions);
        let mut fresh = Vec::new();
        for relationship in other.relationships {
            if !self.relationships.contains(&relationship) {
                self.relationships.push(relationship.clone());
                fresh.push(relationship);
            }
        }
        Ok(fresh)
    }

    /// Table identity.
    pub fn id(&self) -> &TableId {
        &self.metadata.id
    }

    /// SQL table name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Whether the table is required. Only meaningful once added to a graph.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether standalone conditions are attached to this reference.
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Whether the foreign key on `column` contributes implicit joins.
    pub fn uses_foreign_key(&self, column: &str) -> bool {
        !self.ignore_all_foreign_keys && !self.ignored_foreign_keys.contains(column)
    }

    /// A column reference into this table.
    pub fn col(&self, column: impl Into<String>) -> ColumnRef {
        self.metadata.col(column)
    }

    /// Check that attached conditions and relationships name columns of this
    /// table.
    pub fn validate(&self) -> Result<()> {
        self.metadata.validate()?;
        for condition in &self.conditions {
            for column in condition.columns() {
                if &column.table != self.id() || !self.metadata.has_column(&column.column) {
                    return Err(Error::ColumnOwnershipMismatch {
                        table: self.id().clone(),
                        column: column.column.clone(),
                    });
                }
            }
        }
        for relationship in &self.relationships {
            if !self.metadata.has_column(&relationship.local_column) {
                return Err(Error::ColumnOwnershipMismatch {
                    table: self.id().clone(),
                    column: relationship.local_column.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinplan_core::{ColumnInfo, SqlType};

    fn marque() -> TableReference {
        TableReference::new(
            TableMetadata::new("Marque", "marque")
                .column(ColumnInfo::new("uid_marque", SqlType::Integer).primary_key(true))
                .column(
                    ColumnInfo::new("fk_carcompany", SqlType::Integer).references_table("car_company"),
                ),
        )
    }

    #[test]
    fn test_condition_on_own_column_validates() {
        let table = marque();
        let table = table.clone().with_condition(table.col("uid_marque").eq(4));
        assert!(table.validate().is_ok());
        assert!(table.has_conditions());
    }

    #[test]
    fn test_condition_on_unknown_column_is_rejected() {
        let table = marque();
        let table = table.clone().with_condition(table.col("price").gt(1));
        assert!(matches!(
            table.validate(),
            Err(Error::ColumnOwnershipMismatch { ref column, .. }) if column == "price"
        ));
    }

    #[test]
    fn test_condition_on_other_table_is_rejected() {
        let table = marque().with_condition(ColumnRef::new("CarCompany", "uid_marque").eq(1));
        assert!(matches!(
            table.validate(),
            Err(Error::ColumnOwnershipMismatch { .. })
        ));
    }

    #[test]
    fn test_relationship_local_column_must_exist() {
        let table = marque().relate("nope", Operator::Eq, ColumnRef::new("CarCompany", "uid"));
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_ignored_foreign_keys() {
        let table = marque();
        assert!(table.uses_foreign_key("fk_carcompany"));
        assert!(!table.clone().ignore_foreign_key("fk_carcompany").uses_foreign_key("fk_carcompany"));
        assert!(!table.ignore_all_foreign_keys().uses_foreign_key("fk_carcompany"));
    }

    #[test]
    fn test_absorb_keeps_filters_and_new_relationships() {
        let mut first = marque().relate("uid_marque", Operator::Eq, ColumnRef::new("Dealer", "marque"));
        let second = marque();
        let second = second
            .clone()
            .with_condition(second.col("uid_marque").eq(9))
            .relate("uid_marque", Operator::Eq, ColumnRef::new("Dealer", "marque"))
            .relate("uid_marque", Operator::Gt, ColumnRef::new("Dealer", "floor"));

        let fresh = first.absorb(second, true).unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].foreign.column, "floor");
        assert_eq!(first.relationships().len(), 2);
        assert_eq!(first.conditions().len(), 1);
        assert!(first.is_required());
    }

    #[test]
    fn test_absorb_rejects_different_ignored_foreign_keys() {
        let mut first = marque();
        let err = first
            .absorb(marque().ignore_foreign_key("fk_carcompany"), false)
            .unwrap_err();
        assert!(matches!(err, Error::ConflictingReference { .. }));
        assert!(!first.is_required());
    }
}
