//! Tests for statement builders against the generic dialect: clause order,
//! parameter order and builder reuse.

mod common;
use common::*;

use sqlweave_core::builder::{decimal, integer, timestamp, varchar, SqlBuilder, SqlValue};

#[test]
fn select_full_clause_order() {
    let mut select = SqlBuilder::default().select();
    select
        .distinct()
        .columns(["DEPT", "COUNT(*)"])
        .from("EMPLOYEES")
        .where_with("HIRED > ?", ["2020-01-01"])
        .group_by("DEPT")
        .having_with("COUNT(*) > ?", [3])
        .order_by("DEPT", false)
        .limit(5);
    let sql = select.build();
    assert_eq!(
        sql,
        "SELECT DISTINCT DEPT, COUNT(*) FROM EMPLOYEES WHERE HIRED > ? GROUP BY DEPT \
         HAVING COUNT(*) > ? ORDER BY DEPT DESC LIMIT 5"
    );
    assert_placeholders(&sql, select.parameters().len());
    assert_eq!(
        select.parameters(),
        vec![SqlValue::Text(String::from("2020-01-01")), SqlValue::Int(3)]
    );
}

#[test]
fn select_quoted_keeps_expressions_verbatim() {
    let sql = quoted("postgresql")
        .select()
        .columns(["ID", "COUNT(*)"])
        .from("Orders")
        .group_by("ID")
        .build();
    assert_eq!(
        sql,
        "SELECT \"ID\", COUNT(*) FROM \"Orders\" GROUP BY \"ID\""
    );
}

#[test]
fn insert_update_delete_parameters() {
    let sb = SqlBuilder::default();

    let mut insert = sb.insert().into("ITEMS");
    insert
        .column("ID")
        .column("NAME")
        .value_with("?", 1)
        .value_with("?", "Widget");
    let sql = insert.build();
    assert_eq!(sql, "INSERT INTO ITEMS (ID, NAME) VALUES (?, ?)");
    assert_placeholders(&sql, insert.parameters().len());

    let mut update = sb.update();
    update
        .table("ITEMS")
        .set_with("NAME", "?", "Gadget")
        .where_with("ID = ?", [1]);
    let sql = update.build();
    assert_eq!(sql, "UPDATE ITEMS SET NAME = ? WHERE ID = ?");
    assert_eq!(
        update.parameters(),
        vec![SqlValue::Text(String::from("Gadget")), SqlValue::Int(1)]
    );

    let mut delete = sb.delete();
    delete.from("ITEMS").where_with("ID = ?", [1]);
    assert_eq!(delete.build(), "DELETE FROM ITEMS WHERE ID = ?");
    assert_eq!(delete.parameters(), &[SqlValue::Int(1)]);
}

#[test]
fn insert_without_values_gets_one_placeholder_per_column() {
    let sql = SqlBuilder::default()
        .insert()
        .into("T")
        .column("A")
        .column("B")
        .column("C")
        .build();
    assert_eq!(sql, "INSERT INTO T (A, B, C) VALUES (?, ?, ?)");
}

#[test]
fn create_then_drop_round() {
    let sb = builder("h2");
    let create = sb
        .create()
        .table("INVOICES")
        .if_not_exists()
        .column(integer("ID").primary_key())
        .column(decimal("AMOUNT", 12, 2).not_null())
        .column(timestamp("ISSUED"))
        .column(varchar("NOTE", 200))
        .build();
    assert_eq!(
        create,
        "CREATE TABLE IF NOT EXISTS INVOICES (ID INTEGER PRIMARY KEY, \
         AMOUNT DECIMAL(12, 2) NOT NULL, ISSUED TIMESTAMP, NOTE VARCHAR(200))"
    );
    assert_eq!(
        sb.drop().table("INVOICES").if_exists().build(),
        "DROP TABLE IF EXISTS INVOICES"
    );
}

#[test]
fn views_and_sequences() {
    let sb = builder("postgresql");
    let select = sb.select().column("ID").from("INVOICES").build();
    assert_eq!(
        sb.create().view("V_INVOICES").as_select(select).build(),
        "CREATE VIEW V_INVOICES AS SELECT ID FROM INVOICES"
    );
    assert_eq!(
        sb.create().sequence("INVOICES_ID").start(100).build(),
        "CREATE SEQUENCE INVOICES_ID START WITH 100"
    );
    assert_eq!(
        sb.drop().sequence("INVOICES_ID").if_exists().build(),
        "DROP SEQUENCE IF EXISTS INVOICES_ID"
    );
}

#[test]
fn builders_do_not_reset_on_build() {
    let mut insert = SqlBuilder::default().insert().into("T");
    insert.column("A");
    let first = insert.build();
    insert.column("B");
    assert_eq!(first, "INSERT INTO T (A) VALUES (?)");
    assert_eq!(insert.build(), "INSERT INTO T (A, B) VALUES (?, ?)");
}
