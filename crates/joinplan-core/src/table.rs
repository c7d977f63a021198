//! Table and column metadata.
//!
//! Metadata is produced once by a schema loader and treated as immutable by
//! the query layer. A table is identified by its [`TableId`] (the mapped type,
//! e.g. `CarCompany`), which is distinct from its SQL name (`car_company`):
//! two references to the same mapped table are the same table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::condition::ColumnRef;
use crate::error::{Error, Result};
use crate::identifiers::validate_identifier;
use crate::types::SqlType;

/// Stable identity of a mapped table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// Create a table identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TableId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Target of a foreign key, written as `"table.column"` or `"table"`.
///
/// Without a column the foreign key targets the referenced table's single
/// primary key column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ForeignKeyRef {
    /// Referenced table, by SQL name or by table identity.
    pub table: String,
    /// Referenced column.
    pub column: Option<String>,
}

impl ForeignKeyRef {
    /// Reference a specific column of a table.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: Some(column.into()),
        }
    }

    /// Reference a table's primary key.
    pub fn to_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: None,
        }
    }

    /// Parse the `"table.column"` form.
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = || Error::Schema(format!("invalid foreign key reference {:?}", reference));
        match reference.split_once('.') {
            Some((table, column)) => {
                if table.is_empty() || column.is_empty() || column.contains('.') {
                    return Err(invalid());
                }
                Ok(Self::new(table, column))
            }
            None if reference.is_empty() => Err(invalid()),
            None => Ok(Self::to_table(reference)),
        }
    }

    /// Whether this reference names `table` by SQL name or identity.
    pub fn targets(&self, table: &TableMetadata) -> bool {
        self.table == table.name || self.table == table.id.as_str()
    }
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "{}.{}", self.table, column),
            None => f.write_str(&self.table),
        }
    }
}

impl FromStr for ForeignKeyRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ForeignKeyRef {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ForeignKeyRef> for String {
    fn from(reference: ForeignKeyRef) -> Self {
        reference.to_string()
    }
}

/// Metadata about one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Database column name.
    pub name: String,
    /// Declared SQL type.
    pub sql_type: SqlType,
    /// Whether this column is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether this column is nullable.
    #[serde(default)]
    pub nullable: bool,
    /// Declared foreign key target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnInfo {
    /// Create a non-key, non-null column.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
            nullable: false,
            foreign_key: None,
        }
    }

    /// Set primary key flag.
    pub fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    /// Set nullable flag.
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Declare a foreign key to `table.column`.
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef::new(table, column));
        self
    }

    /// Declare a foreign key to the primary key of `table`.
    pub fn references_table(mut self, table: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef::to_table(table));
        self
    }
}

/// Immutable description of one mapped table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table identity.
    pub id: TableId,
    /// SQL table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnInfo>,
}

impl TableMetadata {
    /// Create metadata with no columns.
    pub fn new(id: impl Into<TableId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column.
    pub fn column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    /// Look up a column by name.
    pub fn column_named(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether the table declares `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_named(name).is_some()
    }

    /// Primary key columns in declaration order.
    pub fn primary_key(&self) -> Vec<&ColumnInfo> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    /// Columns declaring a foreign key.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&ColumnInfo, &ForeignKeyRef)> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c, fk)))
    }

    /// A column reference into this table.
    ///
    /// The column is not checked here; ownership is verified when the
    /// reference is added to a query.
    pub fn col(&self, column: impl Into<String>) -> ColumnRef {
        ColumnRef::new(self.id.clone(), column)
    }

    /// Check names and column uniqueness.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(self.id.as_str(), "table identity")?;
        validate_identifier(&self.name, "table")?;
        for (i, column) in self.columns.iter().enumerate() {
            validate_identifier(&column.name, "column")?;
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::Schema(format!(
                    "table {} declares column {} twice",
                    self.id, column.name
                )));
            }
        }
        Ok(())
    }
}

/// An ordered collection of table metadata, usually loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: Vec<TableMetadata>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table after validating it.
    pub fn add(&mut self, table: TableMetadata) -> Result<()> {
        table.validate()?;
        if self.get(&table.id).is_some() {
            return Err(Error::Schema(format!("table {} declared twice", table.id)));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Decode and validate a JSON array of tables.
    pub fn from_json(json: &str) -> Result<Self> {
        let tables: Vec<TableMetadata> = serde_json::from_str(json)?;
        let mut schema = Self::new();
        for table in tables {
            schema.add(table)?;
        }
        tracing::debug!(tables = schema.len(), "Loaded schema metadata");
        Ok(schema)
    }

    /// Look up a table by identity.
    pub fn get(&self, id: &TableId) -> Option<&TableMetadata> {
        self.tables.iter().find(|t| &t.id == id)
    }

    /// Look up a table by identity, failing when it is unknown.
    pub fn table(&self, id: &str) -> Result<&TableMetadata> {
        self.tables
            .iter()
            .find(|t| t.id.as_str() == id)
            .ok_or_else(|| Error::Schema(format!("unknown table {}", id)))
    }

    /// Tables in declaration order.
    pub fn tables(&self) -> &[TableMetadata] {
        &self.tables
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
