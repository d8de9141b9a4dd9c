//! Buffered result sets.

use std::cell::Cell;

use serde_json::Value;
use sqlweave_core::SqlValue;

use crate::backend::RowSet;
use crate::connection::Connection;
use crate::error::{DbError, Result};
use crate::value::{convert, row_to_json, FromSqlValue};

/// Rows serialized by [`ResultSet::to_json`] when output is limited.
pub const JSON_ROW_LIMIT: usize = 100;

/// Identifies a column: by label (case-insensitive) or by 1-based index.
pub trait ColumnIndex {
    /// Returns the 0-based position of the column.
    fn position(&self, columns: &[String]) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn position(&self, columns: &[String]) -> Result<usize> {
        if *self == 0 || *self > columns.len() {
            return Err(DbError::ColumnNotFound(format!(
                "index {self} of {} columns",
                columns.len()
            )));
        }
        Ok(self - 1)
    }
}

impl ColumnIndex for &str {
    fn position(&self, columns: &[String]) -> Result<usize> {
        columns
            .iter()
            .position(|c| c == self)
            .or_else(|| columns.iter().position(|c| c.eq_ignore_ascii_case(self)))
            .ok_or_else(|| DbError::ColumnNotFound((*self).to_string()))
    }
}

impl ColumnIndex for &String {
    fn position(&self, columns: &[String]) -> Result<usize> {
        self.as_str().position(columns)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    BeforeFirst,
    Row(usize),
    AfterLast,
}

/// Generates the typed getters over a `get` method.
macro_rules! typed_getters {
    ($($index:tt)+) => {
        /// Reads a text value.
        pub fn get_string(&self, column: $($index)+) -> Result<Option<String>> {
            self.get(column)
        }

        /// Reads a national character value.
        pub fn get_nstring(&self, column: $($index)+) -> Result<Option<String>> {
            self.get(column)
        }

        /// Reads a character large object.
        pub fn get_clob(&self, column: $($index)+) -> Result<Option<String>> {
            self.get(column)
        }

        /// Reads a 32-bit integer.
        pub fn get_int(&self, column: $($index)+) -> Result<Option<i32>> {
            self.get(column)
        }

        /// Reads a 64-bit integer.
        pub fn get_long(&self, column: $($index)+) -> Result<Option<i64>> {
            self.get(column)
        }

        /// Reads a 16-bit integer.
        pub fn get_short(&self, column: $($index)+) -> Result<Option<i16>> {
            self.get(column)
        }

        /// Reads an 8-bit integer.
        pub fn get_byte(&self, column: $($index)+) -> Result<Option<i8>> {
            self.get(column)
        }

        /// Reads a boolean.
        pub fn get_boolean(&self, column: $($index)+) -> Result<Option<bool>> {
            self.get(column)
        }

        /// Reads a double precision float.
        pub fn get_double(&self, column: $($index)+) -> Result<Option<f64>> {
            self.get(column)
        }

        /// Reads a single precision float.
        pub fn get_float(&self, column: $($index)+) -> Result<Option<f32>> {
            self.get(column)
        }

        /// Reads an exact decimal.
        pub fn get_big_decimal(&self, column: $($index)+) -> Result<Option<rust_decimal::Decimal>> {
            self.get(column)
        }

        /// Reads a date.
        pub fn get_date(&self, column: $($index)+) -> Result<Option<chrono::NaiveDate>> {
            self.get(column)
        }

        /// Reads a time of day.
        pub fn get_time(&self, column: $($index)+) -> Result<Option<chrono::NaiveTime>> {
            self.get(column)
        }

        /// Reads a timestamp.
        pub fn get_timestamp(&self, column: $($index)+) -> Result<Option<chrono::NaiveDateTime>> {
            self.get(column)
        }

        /// Reads binary data.
        pub fn get_bytes(&self, column: $($index)+) -> Result<Option<Vec<u8>>> {
            self.get(column)
        }

        /// Reads a binary large object.
        pub fn get_blob(&self, column: $($index)+) -> Result<Option<Vec<u8>>> {
            self.get(column)
        }

        /// Reads the raw value.
        pub fn get_object(&self, column: $($index)+) -> Result<Option<SqlValue>> {
            self.get(column)
        }
    };
}

pub(crate) use typed_getters;

/// Rows returned by a query, read through a forward cursor.
///
/// Rows are fetched eagerly when the query runs. The cursor starts before
/// the first row; [`ResultSet::next`] returns `false` once past the last.
#[derive(Debug)]
pub struct ResultSet<'c> {
    owner: Option<&'c Connection>,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    cursor: Cursor,
    closed: bool,
    was_null: Cell<bool>,
}

impl<'c> ResultSet<'c> {
    pub(crate) fn new(owner: Option<&'c Connection>, rows: RowSet) -> Self {
        Self {
            owner,
            columns: rows.columns,
            rows: rows.rows,
            cursor: Cursor::BeforeFirst,
            closed: false,
            was_null: Cell::new(false),
        }
    }

    /// Detaches the rows from their connection.
    #[must_use]
    pub fn detach(self) -> ResultSet<'static> {
        ResultSet {
            owner: None,
            columns: self.columns,
            rows: self.rows,
            cursor: self.cursor,
            closed: self.closed,
            was_null: self.was_null,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed || self.owner.is_some_and(Connection::is_closed) {
            return Err(DbError::StatementClosed(String::from("ResultSet is closed")));
        }
        Ok(())
    }

    /// Advances to the next row.
    pub fn next(&mut self) -> Result<bool> {
        self.ensure_open()?;
        self.cursor = match self.cursor {
            Cursor::BeforeFirst if !self.rows.is_empty() => Cursor::Row(0),
            Cursor::Row(i) if i + 1 < self.rows.len() => Cursor::Row(i + 1),
            _ => Cursor::AfterLast,
        };
        Ok(matches!(self.cursor, Cursor::Row(_)))
    }

    /// Returns whether the cursor is before the first row.
    #[must_use]
    pub fn is_before_first(&self) -> bool {
        self.cursor == Cursor::BeforeFirst && !self.rows.is_empty()
    }

    /// Returns whether the cursor is past the last row.
    #[must_use]
    pub fn is_after_last(&self) -> bool {
        self.cursor == Cursor::AfterLast
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column labels in select order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Total number of rows fetched.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Reads a column of the current row.
    pub fn get<T: FromSqlValue>(&self, column: impl ColumnIndex) -> Result<Option<T>> {
        self.ensure_open()?;
        let Cursor::Row(row) = self.cursor else {
            return Err(DbError::execution("ResultSet is not positioned on a row"));
        };
        let position = column.position(&self.columns)?;
        let value = &self.rows[row][position];
        self.was_null.set(value.is_null());
        convert(&self.columns[position], value)
    }

    typed_getters!(impl ColumnIndex);

    /// Returns whether the last value read was NULL.
    #[must_use]
    pub fn was_null(&self) -> bool {
        self.was_null.get()
    }

    /// Serializes the remaining rows as a JSON array of objects, advancing
    /// the cursor past them. When `limited` is set at most
    /// [`JSON_ROW_LIMIT`] rows are serialized.
    pub fn to_json(&mut self, limited: bool) -> Result<Value> {
        let mut records = Vec::new();
        while !(limited && records.len() >= JSON_ROW_LIMIT) && self.next()? {
            if let Cursor::Row(row) = self.cursor {
                records.push(row_to_json(&self.columns, &self.rows[row]));
            }
        }
        Ok(Value::Array(records))
    }

    /// Same as [`ResultSet::to_json`], rendered to a string.
    pub fn to_json_string(&mut self, limited: bool) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json(limited)?)?)
    }

    /// Releases the rows. The connection stays open.
    pub fn close(&mut self) {
        self.closed = true;
        self.rows = Vec::new();
    }

    /// Returns whether the result set, or its connection, is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.ensure_open().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: i64) -> ResultSet<'static> {
        ResultSet::new(
            None,
            RowSet {
                columns: vec![String::from("ID"), String::from("NAME")],
                rows: (1..=n)
                    .map(|i| vec![SqlValue::Int(i), SqlValue::Text(format!("n{i}"))])
                    .collect(),
            },
        )
    }

    #[test]
    fn test_cursor_states() {
        let mut rs = rows(2);
        assert!(rs.is_before_first());
        assert!(rs.next().unwrap());
        assert!(rs.next().unwrap());
        assert!(!rs.next().unwrap());
        assert!(rs.is_after_last());
        assert!(!rs.next().unwrap());
    }

    #[test]
    fn test_getters_by_name_and_index() {
        let mut rs = rows(1);
        rs.next().unwrap();
        assert_eq!(rs.get_long("id").unwrap(), Some(1));
        assert_eq!(rs.get_string(2_usize).unwrap().as_deref(), Some("n1"));
        assert!(!rs.was_null());
    }

    #[test]
    fn test_missing_column() {
        let mut rs = rows(1);
        rs.next().unwrap();
        let err = rs.get_string("NOPE").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ColumnNotFound);
        let err = rs.get_string(0_usize).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ColumnNotFound);
    }

    #[test]
    fn test_type_mismatch() {
        let mut rs = rows(1);
        rs.next().unwrap();
        let err = rs.get_int("NAME").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_get_before_first_row() {
        let rs = rows(1);
        assert!(rs.get_long("ID").is_err());
    }

    #[test]
    fn test_to_json_is_limited() {
        let mut rs = rows(250);
        let json = rs.to_json(true).unwrap();
        assert_eq!(json.as_array().unwrap().len(), JSON_ROW_LIMIT);

        let mut rs = rows(250);
        assert_eq!(rs.to_json(false).unwrap().as_array().unwrap().len(), 250);
    }

    #[test]
    fn test_to_json_starts_after_current_row() {
        let mut rs = rows(3);
        rs.next().unwrap();
        let json = rs.to_json(false).unwrap();
        assert_eq!(json, serde_json::json!([{"ID": 2, "NAME": "n2"}, {"ID": 3, "NAME": "n3"}]));
        assert!(rs.is_after_last());
    }

    #[test]
    fn test_closed_result_set() {
        let mut rs = rows(1);
        rs.close();
        assert!(rs.is_closed());
        assert_eq!(rs.next().unwrap_err().kind(), crate::ErrorKind::StatementClosed);
    }
}
