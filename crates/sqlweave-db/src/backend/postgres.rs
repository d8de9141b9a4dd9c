use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgQueryResult, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row as _, TypeInfo as _, ValueRef as _};
use sqlweave_core::{DataType, SqlValue};

use super::column_label;
use crate::error::{DbError, Result};
use crate::value::Param;

super::backend_ops!(Postgres);

fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &Param,
) -> Query<'q, Postgres, PgArguments> {
    match param {
        Param::Value(value) => bind_value(query, value),
        Param::Null(data_type) => bind_null(query, data_type),
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
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

/// Binds a NULL carrying the parameter type, so the server does not have to
/// infer it from a text placeholder.
fn bind_null<'q>(
    query: Query<'q, Postgres, PgArguments>,
    data_type: &DataType,
) -> Query<'q, Postgres, PgArguments> {
    match data_type {
        DataType::Boolean => query.bind(None::<bool>),
        DataType::Tinyint | DataType::Smallint => query.bind(None::<i16>),
        DataType::Integer => query.bind(None::<i32>),
        DataType::Bigint => query.bind(None::<i64>),
        DataType::Real | DataType::Double => query.bind(None::<f64>),
        DataType::Decimal { .. } => query.bind(None::<Decimal>),
        DataType::Blob | DataType::Varbinary(_) => query.bind(None::<Vec<u8>>),
        DataType::Date => query.bind(None::<NaiveDate>),
        DataType::Time => query.bind(None::<NaiveTime>),
        DataType::Timestamp => query.bind(None::<NaiveDateTime>),
        _ => query.bind(None::<String>),
    }
}

/// PostgreSQL reports generated keys only through `RETURNING`.
const fn last_insert_id(_result: &PgQueryResult) -> Option<i64> {
    None
}

fn decode(row: &PgRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOL" => SqlValue::Bool(row.try_get(index)?),
        "INT2" => SqlValue::Int(i64::from(row.try_get::<i16, _>(index)?)),
        "INT4" => SqlValue::Int(i64::from(row.try_get::<i32, _>(index)?)),
        "INT8" => SqlValue::Int(row.try_get(index)?),
        "FLOAT4" => SqlValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        "FLOAT8" => SqlValue::Float(row.try_get(index)?),
        "NUMERIC" => SqlValue::Decimal(row.try_get::<Decimal, _>(index)?),
        "BYTEA" => SqlValue::Blob(row.try_get(index)?),
        "DATE" => SqlValue::Date(row.try_get(index)?),
        "TIME" => SqlValue::Time(row.try_get(index)?),
        "TIMESTAMP" => SqlValue::Timestamp(row.try_get(index)?),
        "TIMESTAMPTZ" => SqlValue::Timestamp(row.try_get::<DateTime<Utc>, _>(index)?.naive_utc()),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(SqlValue::Text)
            .map_err(|_| DbError::mismatch(column_label(row, index), "a supported type", type_name))?,
    };
    Ok(value)
}
