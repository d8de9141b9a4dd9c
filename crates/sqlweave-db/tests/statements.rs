mod common;

use chrono::NaiveDate;
use common::*;
use rust_decimal::Decimal;
use sqlweave_db::{DataType, ErrorKind, Param, Parameters, SqlValue};

#[test]
fn test_prepared_insert_and_query() {
    let t = TestDb::new();
    t.execute("CREATE TABLE PERSON (ID INTEGER PRIMARY KEY, NAME VARCHAR(50), AGE INTEGER)");

    let conn = t.connection();
    let mut insert = conn
        .prepare_statement("INSERT INTO PERSON (ID, NAME, AGE) VALUES (?, ?, ?)")
        .unwrap();
    insert.set_long(1, 1).unwrap();
    insert.set_string(2, "Ada").unwrap();
    insert.set_int(3, 36).unwrap();
    assert_eq!(insert.execute_update().unwrap(), 1);

    insert.set_long(1, 2).unwrap();
    insert.set_string(2, "Alan").unwrap();
    insert.set_null(3, DataType::Integer).unwrap();
    assert!(!insert.execute().unwrap());
    assert_eq!(insert.update_count(), Some(1));

    let mut select = conn
        .prepare_statement("SELECT ID, NAME, AGE FROM PERSON WHERE ID >= ? ORDER BY ID")
        .unwrap();
    select.set_long(1, 1).unwrap();
    let mut rs = select.execute_query().unwrap();
    assert_eq!(rs.column_names(), ["ID", "NAME", "AGE"]);

    assert!(rs.next().unwrap());
    assert_eq!(rs.get_long("ID").unwrap(), Some(1));
    assert_eq!(rs.get_string("name").unwrap().as_deref(), Some("Ada"));
    assert_eq!(rs.get_int(3_usize).unwrap(), Some(36));

    assert!(rs.next().unwrap());
    assert_eq!(rs.get_int("AGE").unwrap(), None);
    assert!(rs.was_null());

    assert!(!rs.next().unwrap());
}

#[test]
fn test_typed_values_round_trip() {
    let t = TestDb::new();
    t.execute("CREATE TABLE ITEM (ID INTEGER, PRICE DECIMAL(10, 2), SOLD DATE, ACTIVE BOOLEAN, DATA BLOB)");

    let conn = t.connection();
    let price: Decimal = "12.50".parse().unwrap();
    let sold = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let mut insert = conn
        .prepare_statement("INSERT INTO ITEM VALUES (?, ?, ?, ?, ?)")
        .unwrap();
    insert.set_long(1, 1).unwrap();
    insert.set_big_decimal(2, price).unwrap();
    insert.set_date(3, sold).unwrap();
    insert.set_boolean(4, true).unwrap();
    insert.set_bytes(5, &[1, 2, 3]).unwrap();
    insert.execute_update().unwrap();

    let mut rs = conn.query("SELECT PRICE, SOLD, ACTIVE, DATA FROM ITEM", &[]).unwrap();
    assert!(rs.next().unwrap());
    assert_eq!(rs.get_big_decimal("PRICE").unwrap(), Some(price));
    assert_eq!(rs.get_date("SOLD").unwrap(), Some(sold));
    assert_eq!(rs.get_boolean("ACTIVE").unwrap(), Some(true));
    assert_eq!(rs.get_bytes("DATA").unwrap(), Some(vec![1, 2, 3]));

    let err = rs.get_long("SOLD").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    let err = rs.get_long("MISSING").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ColumnNotFound);
}

#[test]
fn test_unbound_parameter() {
    let t = TestDb::new();
    let conn = t.connection();
    let mut stmt = conn.prepare_statement("SELECT ? AS A, ? AS B").unwrap();
    stmt.set_long(2, 1).unwrap();
    let err = stmt.execute_query().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(stmt.set_long(0, 1).is_err());
}

#[test]
fn test_closed_statement() {
    let t = TestDb::new();
    let conn = t.connection();
    let mut stmt = conn.prepare_statement("SELECT 1").unwrap();
    assert!(!stmt.is_closed());
    stmt.close();
    assert!(stmt.is_closed());
    assert_eq!(stmt.execute().unwrap_err().kind(), ErrorKind::StatementClosed);
    assert_eq!(stmt.set_int(1, 1).unwrap_err().kind(), ErrorKind::StatementClosed);
}

#[test]
fn test_closing_connection_invalidates_statements() {
    let t = TestDb::new();
    let conn = t.connection();
    let mut stmt = conn.prepare_statement("SELECT 1 AS ONE").unwrap();
    let rs = stmt.execute_query().unwrap();

    conn.close().unwrap();
    assert!(conn.is_closed());
    assert!(stmt.is_closed());
    assert!(rs.is_closed());
    assert_eq!(stmt.execute().unwrap_err().kind(), ErrorKind::StatementClosed);
    assert_eq!(
        conn.prepare_statement("SELECT 1").unwrap_err().kind(),
        ErrorKind::StatementClosed
    );
    conn.close().unwrap();
}

#[test]
fn test_batch_stops_at_first_failure() {
    let t = TestDb::new();
    t.execute("CREATE TABLE TAG (NAME VARCHAR(20) UNIQUE)");

    let conn = t.connection();
    let mut stmt = conn.prepare_statement("INSERT INTO TAG (NAME) VALUES (?)").unwrap();
    for name in ["a", "b"] {
        stmt.set_string(1, name).unwrap();
        stmt.add_batch().unwrap();
    }
    assert_eq!(stmt.execute_batch().unwrap(), vec![1, 1]);

    for name in ["c", "a", "d"] {
        stmt.set_string(1, name).unwrap();
        stmt.add_batch().unwrap();
    }
    let err = stmt.execute_batch().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SqlExecution);

    let mut rs = conn.query("SELECT COUNT(*) AS N FROM TAG", &[]).unwrap();
    rs.next().unwrap();
    assert_eq!(rs.get_long("N").unwrap(), Some(3));
}

#[test]
fn test_manual_transaction() {
    let t = TestDb::new();
    t.execute("CREATE TABLE LOG (MSG TEXT)");
    let conn = t.connection();

    conn.set_auto_commit(false).unwrap();
    assert!(!conn.auto_commit());
    conn.update("INSERT INTO LOG VALUES (?)", &[Param::from("discarded")]).unwrap();
    conn.rollback().unwrap();
    conn.update("INSERT INTO LOG VALUES (?)", &[Param::from("kept")]).unwrap();
    conn.commit().unwrap();
    conn.set_auto_commit(true).unwrap();

    let mut rs = conn.query("SELECT MSG FROM LOG", &[]).unwrap();
    assert!(rs.next().unwrap());
    assert_eq!(rs.get_string("MSG").unwrap().as_deref(), Some("kept"));
    assert!(!rs.next().unwrap());
}

#[test]
fn test_dropping_connection_rolls_back() {
    let t = TestDb::new();
    t.execute("CREATE TABLE LOG (MSG TEXT)");
    {
        let conn = t.connection();
        conn.set_auto_commit(false).unwrap();
        conn.update("INSERT INTO LOG VALUES ('lost')", &[]).unwrap();
    }
    let mut rs = t.db.query("SELECT COUNT(*) AS N FROM LOG", &[], None, None).unwrap();
    rs.next().unwrap();
    assert_eq!(rs.get_long("N").unwrap(), Some(0));
}

#[test]
fn test_callable_out_parameters() {
    let t = TestDb::new();
    let conn = t.connection();
    let mut call = conn.prepare_call("SELECT ? * 2 AS A, ? AS B").unwrap();
    call.set_long(1, 21).unwrap();
    call.register_out_parameter(1, DataType::Bigint).unwrap();
    call.register_out_parameter(2, DataType::Varchar(None)).unwrap();

    assert!(call.execute().unwrap());
    assert_eq!(call.get_long(1).unwrap(), Some(42));
    assert_eq!(call.get_string(2).unwrap(), None);
    assert!(call.was_null());

    let err = call.get_long(3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ColumnNotFound);

    call.close();
    assert_eq!(call.get_long(1).unwrap_err().kind(), ErrorKind::StatementClosed);
}

#[test]
fn test_syntax_error_keeps_driver_message() {
    let t = TestDb::new();
    let conn = t.connection();
    let err = conn.query("SELEC 1", &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SqlSyntax);
    assert!(err.to_string().contains("syntax error"));
}

#[test]
fn test_values_travel_as_sql_values() {
    let t = TestDb::new();
    let conn = t.connection();
    let mut rs = conn
        .query("SELECT ? AS T, ? AS N", &[Param::from("x"), Param::Value(SqlValue::Null)])
        .unwrap();
    rs.next().unwrap();
    assert_eq!(rs.get_object("T").unwrap(), Some(SqlValue::Text(String::from("x"))));
    assert_eq!(rs.get_object("N").unwrap(), None);
}
