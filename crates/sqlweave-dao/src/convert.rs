//! Conversion of entity values between JSON and SQL by property type.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlweave_core::{DataType, SqlValue};
use sqlweave_db::{to_json, DbError, Param, Result};

use crate::schema::Property;

/// Converts a JSON entity value into a statement parameter for `property`.
/// JSON `null` binds a NULL of the property's type.
pub fn to_param(property: &Property, value: &Value) -> Result<Param> {
    if value.is_null() {
        return Ok(Param::Null(property.data_type.clone()));
    }
    to_sql(property, value).map(Param::Value)
}

/// Converts a non-null JSON value into a SQL value of the property's type.
pub fn to_sql(property: &Property, value: &Value) -> Result<SqlValue> {
    let converted = match &property.data_type {
        DataType::Tinyint | DataType::Smallint | DataType::Integer | DataType::Bigint => {
            integer(value).map(SqlValue::Int)
        }
        DataType::Real | DataType::Double => float(value).map(SqlValue::Float),
        DataType::Decimal { .. } => decimal(value).map(SqlValue::Decimal),
        DataType::Boolean => boolean(value).map(SqlValue::Bool),
        DataType::Date => date(value).map(SqlValue::Date),
        DataType::Time => text(value).and_then(time).map(SqlValue::Time),
        DataType::Timestamp => timestamp(value).map(SqlValue::Timestamp),
        DataType::Blob | DataType::Varbinary(_) => bytes(value).map(SqlValue::Blob),
        DataType::Char(_)
        | DataType::Varchar(_)
        | DataType::Nvarchar(_)
        | DataType::Text
        | DataType::Clob
        | DataType::Nclob
        | DataType::Custom(_) => match value {
            Value::String(s) => Some(SqlValue::Text(s.clone())),
            Value::Bool(_) | Value::Number(_) => Some(SqlValue::Text(value.to_string())),
            _ => None,
        },
    };
    converted.ok_or_else(|| {
        DbError::Validation(format!(
            "Value {value} of property {} is not a valid {}",
            property.name, property.data_type
        ))
    })
}

/// Converts a column value read for `property` into JSON.
///
/// Booleans stored as integers or text come back as JSON booleans.
#[must_use]
pub fn to_value(property: &Property, value: &SqlValue) -> Value {
    match (&property.data_type, value) {
        (DataType::Boolean, SqlValue::Int(n)) => Value::Bool(*n != 0),
        (DataType::Boolean, SqlValue::Text(s)) => {
            boolean(&Value::String(s.clone())).map_or_else(|| Value::String(s.clone()), Value::Bool)
        }
        _ => to_json(value),
    }
}

fn text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim)
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    let digits = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    digits
        .parse()
        .ok()
        .or_else(|| Decimal::from_scientific(&digits).ok())
}

fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "y" | "yes" => Some(true),
            "false" | "f" | "0" | "n" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn date(value: &Value) -> Option<NaiveDate> {
    text(value)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .or_else(|| timestamp(value).map(|ts| ts.date()))
}

fn time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Accepts ISO-8601 with or without offset, or epoch milliseconds.
fn timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_utc())
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    }
}

fn bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => STANDARD.decode(s.trim()).ok(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlweave_db::ErrorKind;

    fn property(data_type: DataType) -> Property {
        Property {
            name: String::from("p"),
            column: String::from("P"),
            data_type,
            id: false,
            required: false,
            unique: false,
            auto_increment: false,
            identity: false,
        }
    }

    #[test]
    fn test_integer_conversion() {
        let p = property(DataType::Integer);
        assert_eq!(to_sql(&p, &json!(42)).unwrap(), SqlValue::Int(42));
        assert_eq!(to_sql(&p, &json!("42")).unwrap(), SqlValue::Int(42));
        assert!(to_sql(&p, &json!(3.5)).is_err());
        let err = to_sql(&p, &json!("forty")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_null_binds_typed_null() {
        let p = property(DataType::Date);
        assert_eq!(
            to_param(&p, &Value::Null).unwrap(),
            Param::Null(DataType::Date)
        );
    }

    #[test]
    fn test_decimal_conversion() {
        let p = property(DataType::Decimal {
            precision: Some(10),
            scale: Some(2),
        });
        assert_eq!(
            to_sql(&p, &json!("12.50")).unwrap(),
            SqlValue::Decimal("12.50".parse().unwrap())
        );
        assert_eq!(
            to_sql(&p, &json!(9.99)).unwrap(),
            SqlValue::Decimal("9.99".parse().unwrap())
        );
    }

    #[test]
    fn test_temporal_conversion() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            to_sql(&property(DataType::Date), &json!("2024-02-29")).unwrap(),
            SqlValue::Date(date)
        );
        assert_eq!(
            to_sql(&property(DataType::Timestamp), &json!("2024-02-29T10:30:00Z")).unwrap(),
            SqlValue::Timestamp(date.and_hms_opt(10, 30, 0).unwrap())
        );
        assert_eq!(
            to_sql(&property(DataType::Timestamp), &json!("2024-02-29 10:30:00")).unwrap(),
            SqlValue::Timestamp(date.and_hms_opt(10, 30, 0).unwrap())
        );
        assert_eq!(
            to_sql(&property(DataType::Time), &json!("08:15")).unwrap(),
            SqlValue::Time(NaiveTime::from_hms_opt(8, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_boolean_round_trip() {
        let p = property(DataType::Boolean);
        assert_eq!(to_sql(&p, &json!("yes")).unwrap(), SqlValue::Bool(true));
        assert_eq!(to_value(&p, &SqlValue::Int(1)), json!(true));
        assert_eq!(to_value(&p, &SqlValue::Int(0)), json!(false));
        assert_eq!(to_value(&p, &SqlValue::Bool(true)), json!(true));
    }

    #[test]
    fn test_text_and_blob() {
        let p = property(DataType::Varchar(Some(10)));
        assert_eq!(to_sql(&p, &json!(7)).unwrap(), SqlValue::Text(String::from("7")));
        assert!(to_sql(&p, &json!({"a": 1})).is_err());

        let p = property(DataType::Blob);
        assert_eq!(to_sql(&p, &json!("AQID")).unwrap(), SqlValue::Blob(vec![1, 2, 3]));
        assert_eq!(to_sql(&p, &json!([1, 2, 3])).unwrap(), SqlValue::Blob(vec![1, 2, 3]));
        assert_eq!(to_value(&p, &SqlValue::Blob(vec![1, 2, 3])), json!("AQID"));
    }
}
