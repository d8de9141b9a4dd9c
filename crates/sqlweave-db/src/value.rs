//! Parameter and column value conversions.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use sqlweave_core::{DataType, SqlValue, ToSqlValue};

use crate::error::{DbError, Result};

/// A statement parameter: a value, or a NULL of a known SQL type.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// A concrete value. [`SqlValue::Null`] binds an untyped NULL.
    Value(SqlValue),
    /// A NULL bound with the given SQL type.
    Null(DataType),
}

impl Param {
    /// Returns whether the parameter is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null(_) | Self::Value(SqlValue::Null))
    }
}

impl<T: ToSqlValue> From<T> for Param {
    fn from(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }
}

/// Converts a list of values into parameters.
pub fn params<I, T>(values: I) -> Vec<Param>
where
    I: IntoIterator<Item = T>,
    T: ToSqlValue,
{
    values.into_iter().map(Param::from).collect()
}

/// Types that can be read from a column value.
pub trait FromSqlValue: Sized {
    /// Name used in type mismatch errors.
    const SQL_TYPE: &'static str;

    /// Converts a non-NULL value, or returns `None` when it cannot be read
    /// as this type.
    fn from_sql_value(value: &SqlValue) -> Option<Self>;
}

/// Reads `value` as `T`, mapping NULL to `None`.
pub(crate) fn convert<T: FromSqlValue>(column: &str, value: &SqlValue) -> Result<Option<T>> {
    if value.is_null() {
        return Ok(None);
    }
    T::from_sql_value(value)
        .map(Some)
        .ok_or_else(|| DbError::mismatch(column, T::SQL_TYPE, value.type_name()))
}

impl FromSqlValue for SqlValue {
    const SQL_TYPE: &'static str = "ANY";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromSqlValue for i64 {
    const SQL_TYPE: &'static str = "BIGINT";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int(n) => Some(*n),
            SqlValue::Bool(b) => Some(Self::from(*b)),
            SqlValue::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            #[allow(clippy::cast_possible_truncation)]
            SqlValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as Self),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

macro_rules! narrow_int_from_sql_value {
    ($($t:ty => $name:literal),*) => {
        $(
            impl FromSqlValue for $t {
                const SQL_TYPE: &'static str = $name;

                fn from_sql_value(value: &SqlValue) -> Option<Self> {
                    i64::from_sql_value(value).and_then(|n| <$t>::try_from(n).ok())
                }
            }
        )*
    };
}

narrow_int_from_sql_value!(i32 => "INTEGER", i16 => "SMALLINT", i8 => "TINYINT");

impl FromSqlValue for f64 {
    const SQL_TYPE: &'static str = "DOUBLE";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(n) => Some(*n as Self),
            SqlValue::Decimal(d) => d.to_f64(),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for f32 {
    const SQL_TYPE: &'static str = "REAL";

    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        f64::from_sql_value(value).map(|f| f as Self)
    }
}

impl FromSqlValue for Decimal {
    const SQL_TYPE: &'static str = "DECIMAL";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Decimal(d) => Some(*d),
            SqlValue::Int(n) => Some(Self::from(*n)),
            SqlValue::Float(f) => Self::from_f64(*f),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for bool {
    const SQL_TYPE: &'static str = "BOOLEAN";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::Int(n) => Some(*n != 0),
            SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "y" => Some(true),
                "false" | "f" | "0" | "n" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromSqlValue for String {
    const SQL_TYPE: &'static str = "VARCHAR";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.to_text()
    }
}

impl FromSqlValue for Vec<u8> {
    const SQL_TYPE: &'static str = "BLOB";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Blob(b) => Some(b.clone()),
            SqlValue::Text(s) => Some(s.clone().into_bytes()),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveDate {
    const SQL_TYPE: &'static str = "DATE";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Date(d) => Some(*d),
            SqlValue::Timestamp(ts) => Some(ts.date()),
            SqlValue::Text(s) => Self::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .or_else(|| parse_timestamp(s).map(|ts| ts.date())),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveTime {
    const SQL_TYPE: &'static str = "TIME";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Time(t) => Some(*t),
            SqlValue::Timestamp(ts) => Some(ts.time()),
            SqlValue::Text(s) => Self::parse_from_str(s.trim(), "%H:%M:%S%.f").ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    const SQL_TYPE: &'static str = "TIMESTAMP";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Timestamp(ts) => Some(*ts),
            SqlValue::Date(d) => d.and_hms_opt(0, 0, 0),
            SqlValue::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Converts a column value to JSON.
///
/// Decimals keep their digits as JSON numbers, temporal values become
/// ISO-8601 strings and blobs become base64 strings.
#[must_use]
pub fn to_json(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Bool(*b),
        SqlValue::Int(n) => Value::from(*n),
        SqlValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        SqlValue::Decimal(d) => d
            .normalize()
            .to_string()
            .parse::<Number>()
            .map_or_else(|_| Value::String(d.to_string()), Value::Number),
        SqlValue::Text(s) => Value::String(s.clone()),
        SqlValue::Blob(b) => Value::String(STANDARD.encode(b)),
        SqlValue::Date(_) | SqlValue::Time(_) | SqlValue::Timestamp(_) => {
            value.to_text().map_or(Value::Null, Value::String)
        }
    }
}

/// Builds one JSON object per row, keyed by column label.
pub(crate) fn row_to_json(columns: &[String], row: &[SqlValue]) -> Value {
    let object: Map<String, Value> = columns
        .iter()
        .zip(row)
        .map(|(column, value)| (column.clone(), to_json(value)))
        .collect();
    Value::Object(object)
}

/// Parses statement parameters from JSON.
///
/// Accepts an array whose elements are scalars (`null`, booleans, numbers,
/// strings) or typed objects `{"type": "DATE", "value": "2024-01-31"}`.
/// A typed object with a `null` value binds a NULL of that type.
pub fn params_from_json(json: &Value) -> Result<Vec<Param>> {
    match json {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(param_from_json).collect(),
        other => Err(DbError::Validation(format!(
            "Parameters must be an array, got {other}"
        ))),
    }
}

fn param_from_json(json: &Value) -> Result<Param> {
    match json {
        Value::Object(object) => {
            let type_name = object.get("type").and_then(Value::as_str).ok_or_else(|| {
                DbError::Validation(format!("Typed parameter without a type: {json}"))
            })?;
            let data_type = DataType::from_name(type_name, None, None, None).ok_or_else(|| {
                DbError::Validation(format!("Unknown parameter type: {type_name}"))
            })?;
            let value = object.get("value").unwrap_or(&Value::Null);
            typed_param(&data_type, value)
        }
        Value::Array(_) => Err(DbError::Validation(format!(
            "Nested arrays are not valid parameters: {json}"
        ))),
        scalar => Ok(Param::Value(scalar_value(scalar))),
    }
}

fn scalar_value(json: &Value) -> SqlValue {
    match json {
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Number(n) => n.as_i64().map_or_else(
            || {
                n.to_string()
                    .parse::<Decimal>()
                    .map_or_else(|_| SqlValue::Float(n.as_f64().unwrap_or_default()), SqlValue::Decimal)
            },
            SqlValue::Int,
        ),
        Value::String(s) => SqlValue::Text(s.clone()),
        _ => SqlValue::Null,
    }
}

fn typed_param(data_type: &DataType, json: &Value) -> Result<Param> {
    if json.is_null() {
        return Ok(Param::Null(data_type.clone()));
    }
    let raw = scalar_value(json);
    let invalid = || DbError::Validation(format!("Invalid {} parameter: {json}", data_type.to_sql()));

    let value = match data_type {
        DataType::Boolean => SqlValue::Bool(bool::from_sql_value(&raw).ok_or_else(invalid)?),
        DataType::Tinyint | DataType::Smallint | DataType::Integer | DataType::Bigint => {
            SqlValue::Int(i64::from_sql_value(&raw).ok_or_else(invalid)?)
        }
        DataType::Real | DataType::Double => {
            SqlValue::Float(f64::from_sql_value(&raw).ok_or_else(invalid)?)
        }
        DataType::Decimal { .. } => {
            SqlValue::Decimal(Decimal::from_sql_value(&raw).ok_or_else(invalid)?)
        }
        DataType::Date => SqlValue::Date(NaiveDate::from_sql_value(&raw).ok_or_else(invalid)?),
        DataType::Time => SqlValue::Time(NaiveTime::from_sql_value(&raw).ok_or_else(invalid)?),
        DataType::Timestamp => {
            SqlValue::Timestamp(NaiveDateTime::from_sql_value(&raw).ok_or_else(invalid)?)
        }
        DataType::Blob | DataType::Varbinary(_) => {
            let text = json.as_str().ok_or_else(invalid)?;
            SqlValue::Blob(STANDARD.decode(text).map_err(|_| invalid())?)
        }
        _ => SqlValue::Text(raw.to_text().ok_or_else(invalid)?),
    };
    Ok(Param::Value(value))
}
