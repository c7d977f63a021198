//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use joinplan::prelude::*;
use joinplan::table_alias;

pub fn car_company() -> TableReference {
    TableReference::new(
        TableMetadata::new("CarCompany", "car_company")
            .column(ColumnInfo::new("uid_carcompany", SqlType::Integer).primary_key(true))
            .column(ColumnInfo::new("name", SqlType::Varchar(64))),
    )
}

pub fn marque() -> TableReference {
    TableReference::new(
        TableMetadata::new("Marque", "marque")
            .column(ColumnInfo::new("uid_marque", SqlType::Integer).primary_key(true))
            .column(ColumnInfo::new("name", SqlType::Varchar(64)))
            .column(
                ColumnInfo::new("fk_carcompany", SqlType::Integer)
                    .references("car_company", "uid_carcompany"),
            ),
    )
}

/// A table with a primary key and a label, optionally referencing `parent`.
pub fn letter(id: &str, parent: Option<&str>) -> TableReference {
    let mut meta = TableMetadata::new(id, format!("table_{}", id.to_lowercase()))
        .column(ColumnInfo::new("id", SqlType::BigInt).primary_key(true))
        .column(ColumnInfo::new("label", SqlType::Text));
    if let Some(parent) = parent {
        meta = meta.column(ColumnInfo::new("parent_id", SqlType::BigInt).references_table(parent));
    }
    TableReference::new(meta)
}

/// `A`, `B`, `C` unrelated; `D` references `A`; `E` references `D`.
pub fn lettered() -> [TableReference; 5] {
    [
        letter("A", None),
        letter("B", None),
        letter("C", None),
        letter("D", Some("A")),
        letter("E", Some("D")),
    ]
}

/// Attach a permitted-values filter on `id`.
pub fn with_allowed_ids(table: TableReference, ids: &[i64]) -> TableReference {
    let filter = table.col("id").is_in(ids.iter().copied());
    table.with_condition(filter)
}

pub fn names(plan: &joinplan::JoinPlan) -> Vec<String> {
    plan.tables().iter().map(|t| t.as_str().to_string()).collect()
}

/// Replace the generated alias of each table with a readable stand-in.
pub fn dealias(sql: &str, tables: &[(&str, &str)]) -> String {
    tables.iter().fold(sql.to_string(), |sql, (id, short)| {
        sql.replace(&table_alias(&TableId::new(*id)), short)
    })
}
