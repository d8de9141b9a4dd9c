use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlArguments, MySqlQueryResult, MySqlRow};
use sqlx::query::Query;
use sqlx::{MySql, Row as _, TypeInfo as _, ValueRef as _};
use sqlweave_core::SqlValue;

use super::column_label;
use crate::error::{DbError, Result};
use crate::value::Param;

super::backend_ops!(MySql);

fn bind<'q>(query: Query<'q, MySql, MySqlArguments>, param: &Param) -> Query<'q, MySql, MySqlArguments> {
    let Param::Value(value) = param else {
        return query.bind(None::<String>);
    };
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(n) => query.bind(*n),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Decimal(d) => query.bind(*d),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::Time(t) => query.bind(*t),
        SqlValue::Timestamp(ts) => query.bind(*ts),
    }
}

fn last_insert_id(result: &MySqlQueryResult) -> Option<i64> {
    match result.last_insert_id() {
        0 => None,
        id => i64::try_from(id).ok(),
    }
}

fn decode(row: &MySqlRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOLEAN" => SqlValue::Bool(row.try_get(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            SqlValue::Int(row.try_get_unchecked(index)?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => {
            let n: u64 = row.try_get_unchecked(index)?;
            i64::try_from(n).map_or_else(|_| SqlValue::Decimal(Decimal::from(n)), SqlValue::Int)
        }
        "FLOAT" => SqlValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        "DOUBLE" => SqlValue::Float(row.try_get(index)?),
        "DECIMAL" => SqlValue::Decimal(row.try_get(index)?),
        "DATE" => SqlValue::Date(row.try_get::<NaiveDate, _>(index)?),
        "TIME" => SqlValue::Time(row.try_get::<NaiveTime, _>(index)?),
        "DATETIME" | "TIMESTAMP" => SqlValue::Timestamp(row.try_get::<NaiveDateTime, _>(index)?),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            SqlValue::Blob(row.try_get(index)?)
        }
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(SqlValue::Text)
            .map_err(|_| DbError::mismatch(column_label(row, index), "a supported type", type_name))?,
    };
    Ok(value)
}
