use rust_decimal::Decimal;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteQueryResult, SqliteRow};
use sqlx::{Row as _, Sqlite, TypeInfo as _, ValueRef as _};
use sqlweave_core::SqlValue;

use super::column_label;
use crate::error::{DbError, Result};
use crate::value::Param;

super::backend_ops!(Sqlite);

/// SQLite has no native decimal or temporal storage: those values are bound
/// as text, which column affinity converts on insert.
fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &Param,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    let Param::Value(value) = param else {
        return query.bind(None::<String>);
    };
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(n) => query.bind(*n),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
        SqlValue::Decimal(_) | SqlValue::Date(_) | SqlValue::Time(_) | SqlValue::Timestamp(_) => {
            query.bind(value.to_text())
        }
    }
}

fn last_insert_id(result: &SqliteQueryResult) -> Option<i64> {
    Some(result.last_insert_rowid())
}

fn decode(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" => SqlValue::Int(row.try_get_unchecked(index)?),
        "BOOLEAN" => SqlValue::Bool(row.try_get_unchecked(index)?),
        "REAL" => SqlValue::Float(row.try_get_unchecked(index)?),
        "NUMERIC" => {
            let text: String = row.try_get_unchecked(index)?;
            text.parse::<Decimal>()
                .map_or(SqlValue::Text(text), SqlValue::Decimal)
        }
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(SqlValue::Text)
            .map_err(|_| DbError::mismatch(column_label(row, index), "a supported type", type_name))?,
    };
    Ok(value)
}
