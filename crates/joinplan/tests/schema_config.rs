//! Schema metadata and options loaded from JSON, and the errors they raise.

mod common;

use common::{car_company, dealias};
use joinplan::prelude::*;

const SCHEMA: &str = r#"[
    {"id": "CarCompany", "name": "car_company", "columns": [
        {"name": "uid_carcompany", "sql_type": "integer", "primary_key": true},
        {"name": "name", "sql_type": {"varchar": 64}}
    ]},
    {"id": "Marque", "name": "marque", "columns": [
        {"name": "uid_marque", "sql_type": "integer", "primary_key": true},
        {"name": "name", "sql_type": "text", "nullable": true},
        {"name": "fk_carcompany", "sql_type": "big_int",
         "foreign_key": "car_company.uid_carcompany"}
    ]},
    {"id": "Dealer", "name": "dealer", "columns": [
        {"name": "uid_dealer", "sql_type": "uuid", "primary_key": true},
        {"name": "fk_marque", "sql_type": "text", "foreign_key": "Marque"}
    ]}
]"#;

#[test]
fn schema_and_options_from_json_build_a_query() {
    let schema = Schema::from_json(SCHEMA).unwrap();
    assert_eq!(schema.len(), 3);

    let options = QueryOptions::from_json(
        r#"{"dialect": "sqlite", "distinct": true, "row_limit": 50, "page_index": 1}"#,
    )
    .unwrap();
    let company = TableReference::from_schema(&schema, "CarCompany").unwrap();
    let marque = TableReference::from_schema(&schema, "Marque").unwrap();
    let filter = marque.col("name").like("Corol%");

    let mut query = SelectQuery::new(options);
    query
        .add_required([company, marque.with_condition(filter)])
        .unwrap();
    let built = query.build().unwrap();
    let sql = dealias(&built.sql, &[("CarCompany", "cc"), ("Marque", "mq")]);

    // The filtered table leads the join.
    assert!(sql.starts_with("SELECT DISTINCT mq.uid_marque AS mq_uid_marque"));
    assert!(sql.contains(
        "FROM marque AS mq INNER JOIN car_company AS cc ON( cc.uid_carcompany = mq.fk_carcompany )"
    ));
    assert!(sql.contains("WHERE mq.name LIKE ?1"));
    assert!(sql.ends_with("LIMIT 50 OFFSET 50"));
    assert_eq!(built.params, vec![Value::Text("Corol%".to_string())]);
}

#[test]
fn foreign_key_type_mismatch_fails_fast() {
    let schema = Schema::from_json(SCHEMA).unwrap();
    let marque = TableReference::from_schema(&schema, "Marque").unwrap();
    let dealer = TableReference::from_schema(&schema, "Dealer").unwrap();
    let err = QueryGraph::new(vec![marque, dealer], vec![]).unwrap_err();
    match err {
        Error::ForeignKeyCannotBeComparedToPrimaryKey { table, column, .. } => {
            assert_eq!(table.as_str(), "Dealer");
            assert_eq!(column, "fk_marque");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_key_to_non_key_column_fails_fast() {
    let bad = TableReference::new(
        TableMetadata::new("Marque", "marque")
            .column(ColumnInfo::new("uid_marque", SqlType::Integer).primary_key(true))
            .column(ColumnInfo::new("company_name", SqlType::Text).references("car_company", "name")),
    );
    let err = QueryGraph::new(vec![car_company(), bad], vec![]).unwrap_err();
    assert!(err.to_string().contains("not a primary key"));
}

#[test]
fn column_of_another_table_is_rejected() {
    let company = car_company();
    let wrong = ColumnRef::new("CarCompany", "uid_marque").eq(3);
    let err = QueryGraph::new(vec![company.with_condition(wrong)], vec![]).unwrap_err();
    assert!(matches!(err, Error::ColumnOwnershipMismatch { .. }));
}

#[test]
fn malformed_json_is_reported() {
    assert!(matches!(Schema::from_json("{"), Err(Error::Json(_))));
    assert!(matches!(
        QueryOptions::from_json(r#"{"cartesian": "sometimes"}"#),
        Err(Error::Json(_))
    ));
    let duplicate = r#"[
        {"id": "A", "name": "a", "columns": []},
        {"id": "A", "name": "a2", "columns": []}
    ]"#;
    assert!(matches!(Schema::from_json(duplicate), Err(Error::Schema(_))));
}

#[test]
fn unknown_schema_table_is_an_error() {
    let schema = Schema::from_json(SCHEMA).unwrap();
    assert!(TableReference::from_schema(&schema, "Owner").is_err());
}
