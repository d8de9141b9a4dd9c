mod common;

use std::collections::HashSet;

use common::*;
use sqlweave_db::{sequence, ErrorKind};

#[test]
fn test_nextval_creates_and_increments() {
    let t = TestDb::new();
    let values: Vec<i64> = (0..5)
        .map(|_| t.db.nextval("ORDER_ID", None, None).unwrap())
        .collect();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_sequences_are_independent() {
    let t = TestDb::new();
    let conn = t.connection();
    assert_eq!(sequence::nextval(&conn, "A").unwrap(), 1);
    assert_eq!(sequence::nextval(&conn, "A").unwrap(), 2);
    assert_eq!(sequence::nextval(&conn, "B").unwrap(), 1);
}

#[test]
fn test_drop_then_nextval_restarts() {
    let t = TestDb::new();
    for _ in 0..3 {
        t.db.nextval("S", None, None).unwrap();
    }
    t.db.drop_sequence("S", None, None).unwrap();
    assert_eq!(t.db.nextval("S", None, None).unwrap(), 1);
}

#[test]
fn test_drop_missing_sequence_is_a_no_op() {
    let t = TestDb::new();
    t.db.drop_sequence("NEVER_CREATED", None, None).unwrap();
    t.db.drop_sequence("NEVER_CREATED", None, None).unwrap();
}

#[test]
fn test_create_with_start() {
    let t = TestDb::new();
    t.db.create_sequence("INVOICE", Some(100), None, None).unwrap();
    assert_eq!(t.db.nextval("INVOICE", None, None).unwrap(), 100);
    assert_eq!(t.db.nextval("INVOICE", None, None).unwrap(), 101);
    assert!(t.db.create_sequence("INVOICE", None, None, None).is_err());
}

#[test]
fn test_seeded_sequence_starts_after_existing_keys() {
    let t = TestDb::new();
    t.execute("CREATE TABLE BOOK (ID INTEGER PRIMARY KEY, TITLE TEXT)");
    t.execute("INSERT INTO BOOK VALUES (1, 'a'), (7, 'b')");
    let conn = t.connection();
    assert_eq!(sequence::nextval_seeded(&conn, "BOOK_ID", "BOOK", "ID").unwrap(), 8);
    assert_eq!(sequence::nextval_seeded(&conn, "BOOK_ID", "BOOK", "ID").unwrap(), 9);
    assert!(sequence::nextval_seeded(&conn, "MISSING_ID", "NO_SUCH_TABLE", "ID").is_err());
}

#[test]
fn test_nextval_joins_caller_transaction() {
    let t = TestDb::new();
    let conn = t.connection();
    conn.set_auto_commit(false).unwrap();
    assert_eq!(sequence::nextval(&conn, "TX").unwrap(), 1);
    assert_eq!(sequence::nextval(&conn, "TX").unwrap(), 2);
    conn.rollback().unwrap();

    assert_eq!(sequence::nextval(&conn, "TX").unwrap(), 1);
    conn.commit().unwrap();
    conn.set_auto_commit(true).unwrap();
    assert_eq!(t.db.nextval("TX", None, None).unwrap(), 2);
}

#[test]
fn test_seeded_sequence_after_largest_key_fails() {
    let t = TestDb::new();
    t.execute("CREATE TABLE BOOK (ID INTEGER PRIMARY KEY, TITLE TEXT)");
    t.execute(&format!("INSERT INTO BOOK VALUES ({}, 'last')", i64::MAX));
    let conn = t.connection();
    let err = sequence::nextval_seeded(&conn, "BOOK_ID", "BOOK", "ID").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SqlExecution);
}

#[test]
fn test_concurrent_nextval_values_are_distinct() {
    const THREADS: usize = 4;
    const CALLS: usize = 25;

    let t = TestDb::new();
    assert_eq!(t.db.nextval("SHARED", None, None).unwrap(), 1);

    let values: Vec<i64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    let conn = t.connection();
                    (0..CALLS)
                        .map(|_| sequence::nextval(&conn, "SHARED").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let distinct: HashSet<i64> = values.iter().copied().collect();
    assert_eq!(values.len(), THREADS * CALLS);
    assert_eq!(distinct.len(), THREADS * CALLS);
    assert_eq!(distinct.iter().max(), Some(&((THREADS * CALLS) as i64 + 1)));
}
