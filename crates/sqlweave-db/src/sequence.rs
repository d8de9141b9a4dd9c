//! Sequences.
//!
//! Dialects with sequence objects use them directly. The others keep one
//! counter row per sequence in [`SEQUENCE_TABLE`] and advance it with a
//! single atomic statement, or inside a transaction where the dialect has
//! no such statement. A sequence that does not exist yet is created on
//! first use.
//!
//! [`SEQUENCE_TABLE`]: sqlweave_core::dialect::SEQUENCE_TABLE

use sqlweave_core::dialect::SequenceStrategy;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{DbError, Result};
use crate::value::convert;

const SAVEPOINT: &str = "SQLWEAVE_SEQUENCE";

/// Returns the next value of sequence `name`, creating it at 1 when it does
/// not exist.
pub fn nextval(conn: &Connection, name: &str) -> Result<i64> {
    next_or_create(conn, name, || Ok(1))
}

/// Returns the next value of sequence `name`. A missing sequence is created
/// starting after the largest `column` value of `table`.
pub fn nextval_seeded(conn: &Connection, name: &str, table: &str, column: &str) -> Result<i64> {
    next_or_create(conn, name, || max_plus_one(conn, table, column))
}

/// Creates sequence `name`, optionally with its first value.
pub fn create(conn: &Connection, name: &str, start: Option<i64>) -> Result<()> {
    let dialect = conn.dialect();
    if dialect.sequence_strategy().is_emulated() {
        match conn.update(&dialect.sequence_table_ddl(), &[]) {
            Err(e) if !e.is_already_exists() => return Err(e),
            _ => {}
        }
    }
    let mut create = conn.sql().create().sequence(name);
    if let Some(start) = start {
        create.start(start);
    }
    conn.update(&create.build(), &[])?;
    info!(sequence = %name, datasource = %conn.data_source(), "Sequence created");
    Ok(())
}

/// Drops sequence `name`. Dropping a missing sequence succeeds.
pub fn drop(conn: &Connection, name: &str) -> Result<()> {
    let mut drop = conn.sql().drop().sequence(name);
    if conn.dialect().supports_if_exists() {
        drop.if_exists();
    }
    match conn.update(&drop.build(), &[]) {
        Ok(_) => {
            info!(sequence = %name, datasource = %conn.data_source(), "Sequence dropped");
            Ok(())
        }
        Err(e) if e.is_missing_object() => Ok(()),
        Err(e) => Err(e),
    }
}

fn next_or_create(
    conn: &Connection,
    name: &str,
    start: impl FnOnce() -> Result<i64>,
) -> Result<i64> {
    match guarded(conn, || advance(conn, name)) {
        Err(DbError::SequenceNotFound(_)) => {
            warn!(sequence = %name, datasource = %conn.data_source(), "Sequence not found, creating it");
            let start = start()?;
            match guarded(conn, || create(conn, name, Some(start))) {
                Ok(()) => {}
                Err(e) if e.is_already_exists() => {
                    debug!(sequence = %name, "Sequence was created concurrently");
                }
                Err(e) => return Err(e),
            }
            advance(conn, name)
        }
        other => other,
    }
}

/// Runs `f` behind a savepoint when it joins the caller's transaction on a
/// dialect where a failure would abort that transaction.
fn guarded<T>(conn: &Connection, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let dialect = conn.dialect();
    if conn.auto_commit() || !dialect.error_aborts_transaction() {
        return f();
    }
    conn.update(&dialect.savepoint(SAVEPOINT), &[])?;
    let result = f();
    let end = if result.is_ok() {
        dialect.release_savepoint(SAVEPOINT)
    } else {
        dialect.rollback_to_savepoint(SAVEPOINT)
    };
    conn.update(&end, &[])?;
    result
}

fn advance(conn: &Connection, name: &str) -> Result<i64> {
    let dialect = conn.dialect();
    let sql = conn.sql().nextval(name).build();
    let result = match dialect.sequence_strategy() {
        SequenceStrategy::Native | SequenceStrategy::CounterReturning => {
            first_value(conn, name, &sql)
        }
        SequenceStrategy::CounterLastInsertId => increment(conn, name, &sql)
            .and_then(|()| first_value(conn, name, &dialect.sequence_value_query(name))),
        SequenceStrategy::CounterRowLock => {
            locked_increment(conn, name, &sql, &dialect.sequence_value_query(name))
        }
    };
    result.map_err(|e| {
        if e.is_missing_object() {
            DbError::SequenceNotFound(name.to_string())
        } else {
            e
        }
    })
}

fn first_value(conn: &Connection, name: &str, sql: &str) -> Result<i64> {
    let rows = conn.fetch(sql, &[])?;
    let (Some(column), Some(value)) = (
        rows.columns.first(),
        rows.rows.first().and_then(|row| row.first()),
    ) else {
        return Err(DbError::SequenceNotFound(name.to_string()));
    };
    convert::<i64>(column, value)?.ok_or_else(|| DbError::SequenceNotFound(name.to_string()))
}

fn increment(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    if conn.update(sql, &[])? == 0 {
        return Err(DbError::SequenceNotFound(name.to_string()));
    }
    Ok(())
}

/// Increments and re-reads the counter row within one transaction, joining
/// the caller's transaction when auto-commit is off.
fn locked_increment(conn: &Connection, name: &str, update: &str, select: &str) -> Result<i64> {
    let own_transaction = conn.auto_commit();
    if own_transaction {
        conn.set_auto_commit(false)?;
    }
    let result = increment(conn, name, update).and_then(|()| first_value(conn, name, select));
    if own_transaction {
        let end = if result.is_ok() {
            conn.commit()
        } else {
            conn.rollback()
        };
        conn.set_auto_commit(true)?;
        end?;
    }
    result
}

fn max_plus_one(conn: &Connection, table: &str, column: &str) -> Result<i64> {
    let sb = conn.sql();
    let sql = sb
        .select()
        .column(format!("MAX({})", sb.identifier(column)))
        .from(table)
        .build();
    let rows = conn.fetch(&sql, &[])?;
    let max = match rows.rows.first().and_then(|row| row.first()) {
        Some(value) => convert::<i64>(column, value)?,
        None => None,
    };
    match max {
        None => Ok(1),
        Some(m) => m.checked_add(1).ok_or_else(|| {
            DbError::execution(format!(
                "{table}.{column} already holds the largest key {m}, no value follows it"
            ))
        }),
    }
}
