//! Prepared and callable statements.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sqlweave_core::{DataType, SqlValue, ToSqlValue};
use tracing::warn;

use crate::backend::{Outcome, RowSet};
use crate::connection::Connection;
use crate::error::{DbError, Result};
use crate::resultset::{typed_getters, ResultSet};
use crate::value::{convert, FromSqlValue, Param};

/// Positional parameter binding, 1-based in placeholder order.
pub trait Parameters {
    /// Binds parameter `index`.
    fn set_parameter(&mut self, index: usize, param: Param) -> Result<()>;

    /// Binds a NULL of the given SQL type.
    fn set_null(&mut self, index: usize, data_type: DataType) -> Result<()> {
        self.set_parameter(index, Param::Null(data_type))
    }

    /// Binds any convertible value.
    fn set_object(&mut self, index: usize, value: impl ToSqlValue) -> Result<()>
    where
        Self: Sized,
    {
        self.set_parameter(index, Param::Value(value.to_sql_value()))
    }

    /// Binds a boolean.
    fn set_boolean(&mut self, index: usize, value: bool) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Bool(value)))
    }

    /// Binds an 8-bit integer.
    fn set_byte(&mut self, index: usize, value: i8) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Int(i64::from(value))))
    }

    /// Binds a 16-bit integer.
    fn set_short(&mut self, index: usize, value: i16) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Int(i64::from(value))))
    }

    /// Binds a 32-bit integer.
    fn set_int(&mut self, index: usize, value: i32) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Int(i64::from(value))))
    }

    /// Binds a 64-bit integer.
    fn set_long(&mut self, index: usize, value: i64) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Int(value)))
    }

    /// Binds a single-precision float, widened to `f64`.
    fn set_float(&mut self, index: usize, value: f32) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Float(f64::from(value))))
    }

    /// Binds a double-precision float.
    fn set_double(&mut self, index: usize, value: f64) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Float(value)))
    }

    /// Binds an exact decimal.
    fn set_big_decimal(&mut self, index: usize, value: Decimal) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Decimal(value)))
    }

    /// Binds text.
    fn set_string(&mut self, index: usize, value: &str) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Text(value.to_string())))
    }

    /// Binds national character text; same as [`Parameters::set_string`].
    fn set_nstring(&mut self, index: usize, value: &str) -> Result<()> {
        self.set_string(index, value)
    }

    /// Binds character large object text.
    fn set_clob(&mut self, index: usize, value: &str) -> Result<()> {
        self.set_string(index, value)
    }

    /// Binds national character large object text.
    fn set_nclob(&mut self, index: usize, value: &str) -> Result<()> {
        self.set_string(index, value)
    }

    /// Binds binary data.
    fn set_bytes(&mut self, index: usize, value: &[u8]) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Blob(value.to_vec())))
    }

    /// Binds binary large object data.
    fn set_blob(&mut self, index: usize, value: &[u8]) -> Result<()> {
        self.set_bytes(index, value)
    }

    /// Binds a date.
    fn set_date(&mut self, index: usize, value: NaiveDate) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Date(value)))
    }

    /// Binds a time of day.
    fn set_time(&mut self, index: usize, value: NaiveTime) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Time(value)))
    }

    /// Binds a timestamp without time zone.
    fn set_timestamp(&mut self, index: usize, value: NaiveDateTime) -> Result<()> {
        self.set_parameter(index, Param::Value(SqlValue::Timestamp(value)))
    }
}

/// A statement with `?` placeholders bound by position.
///
/// Open until [`PreparedStatement::close`] or until its connection closes;
/// every operation afterwards fails with [`DbError::StatementClosed`].
#[derive(Debug)]
pub struct PreparedStatement<'c> {
    conn: &'c Connection,
    sql: String,
    params: Vec<Option<Param>>,
    batch: Vec<Vec<Param>>,
    result: Option<RowSet>,
    update_count: Option<u64>,
    last_insert_id: Option<i64>,
    closed: bool,
}

impl<'c> PreparedStatement<'c> {
    pub(crate) fn new(conn: &'c Connection, sql: &str) -> Self {
        Self {
            conn,
            sql: sql.to_string(),
            params: Vec::new(),
            batch: Vec::new(),
            result: None,
            update_count: None,
            last_insert_id: None,
            closed: false,
        }
    }

    /// Statement text as prepared.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed || self.conn.is_closed() {
            return Err(DbError::StatementClosed(String::from("Statement is closed")));
        }
        Ok(())
    }

    fn bound(&self) -> Result<Vec<Param>> {
        self.params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                p.clone()
                    .ok_or_else(|| DbError::Validation(format!("Parameter {} is not bound", i + 1)))
            })
            .collect()
    }

    fn run(&mut self, params: &[Param]) -> Result<Outcome> {
        self.ensure_open()?;
        self.result = None;
        self.update_count = None;
        self.last_insert_id = None;
        self.conn.run(&self.sql, params)
    }

    /// Runs the statement. Returns `true` when it produced a result set,
    /// available through [`PreparedStatement::result_set`].
    pub fn execute(&mut self) -> Result<bool> {
        let params = self.bound()?;
        match self.run(&params)? {
            Outcome::Rows(rows) => {
                self.result = Some(rows);
                Ok(true)
            }
            Outcome::Count {
                rows_affected,
                last_insert_id,
            } => {
                self.update_count = Some(rows_affected);
                self.last_insert_id = last_insert_id;
                Ok(false)
            }
        }
    }

    /// Runs a query.
    pub fn execute_query(&mut self) -> Result<ResultSet<'c>> {
        let params = self.bound()?;
        match self.run(&params)? {
            Outcome::Rows(rows) => Ok(ResultSet::new(Some(self.conn), rows)),
            Outcome::Count { .. } => Err(DbError::execution(format!(
                "Statement did not return a result set: {}",
                self.sql
            ))),
        }
    }

    /// Runs a modification and returns the affected row count.
    pub fn execute_update(&mut self) -> Result<u64> {
        let params = self.bound()?;
        let count = match self.run(&params)? {
            Outcome::Rows(rows) => {
                let count = rows.rows.len() as u64;
                self.result = Some(rows);
                count
            }
            Outcome::Count {
                rows_affected,
                last_insert_id,
            } => {
                self.last_insert_id = last_insert_id;
                rows_affected
            }
        };
        self.update_count = Some(count);
        Ok(count)
    }

    /// Result set of the last [`PreparedStatement::execute`], taken once.
    pub fn result_set(&mut self) -> Result<Option<ResultSet<'c>>> {
        self.ensure_open()?;
        Ok(self.result.take().map(|rows| ResultSet::new(Some(self.conn), rows)))
    }

    /// Row count of the last execution, if it modified data.
    #[must_use]
    pub const fn update_count(&self) -> Option<u64> {
        self.update_count
    }

    /// Key generated by the last insert, where the driver reports one.
    #[must_use]
    pub const fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// Queues the current parameters as one batch command.
    pub fn add_batch(&mut self) -> Result<()> {
        self.ensure_open()?;
        let params = self.bound()?;
        self.batch.push(params);
        Ok(())
    }

    /// Runs the queued commands in order and returns one count per command.
    ///
    /// Stops at the first failure and returns its error. Commands already
    /// run are not rolled back. The queue is cleared either way.
    pub fn execute_batch(&mut self) -> Result<Vec<u64>> {
        self.ensure_open()?;
        let batch = std::mem::take(&mut self.batch);
        let mut counts = Vec::with_capacity(batch.len());
        for (i, params) in batch.iter().enumerate() {
            match self.run(params) {
                Ok(Outcome::Count { rows_affected, .. }) => counts.push(rows_affected),
                Ok(Outcome::Rows(rows)) => counts.push(rows.rows.len() as u64),
                Err(e) => {
                    warn!(command = i + 1, of = batch.len(), error = %e, "Batch aborted");
                    return Err(e);
                }
            }
        }
        Ok(counts)
    }

    /// Discards queued batch commands.
    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    /// Unbinds every parameter.
    pub fn clear_parameters(&mut self) {
        self.params.clear();
    }

    /// Closes the statement. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.closed = true;
        self.params.clear();
        self.batch.clear();
        self.result = None;
    }

    /// Returns whether the statement, or its connection, is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.ensure_open().is_err()
    }
}

impl Parameters for PreparedStatement<'_> {
    fn set_parameter(&mut self, index: usize, param: Param) -> Result<()> {
        self.ensure_open()?;
        if index == 0 {
            return Err(DbError::Validation(String::from(
                "Parameter indexes start at 1",
            )));
        }
        if self.params.len() < index {
            self.params.resize(index, None);
        }
        self.params[index - 1] = Some(param);
        Ok(())
    }
}

/// An OUT parameter registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutParameter {
    /// SQL type of the value.
    pub data_type: DataType,
    /// Scale for decimal values.
    pub scale: Option<u16>,
    /// Database specific type name.
    pub type_name: Option<String>,
}

/// A procedure or function call with OUT parameters.
///
/// OUT values are read from the first row the call produces: the k-th
/// registered OUT parameter, in ascending parameter order, takes the k-th
/// column. OUT-only parameters that were not bound are sent as NULL.
#[derive(Debug)]
pub struct CallableStatement<'c> {
    statement: PreparedStatement<'c>,
    out_parameters: BTreeMap<usize, OutParameter>,
    out_values: HashMap<usize, SqlValue>,
    was_null: Cell<bool>,
}

impl<'c> CallableStatement<'c> {
    pub(crate) fn new(conn: &'c Connection, sql: &str) -> Self {
        Self {
            statement: PreparedStatement::new(conn, sql),
            out_parameters: BTreeMap::new(),
            out_values: HashMap::new(),
            was_null: Cell::new(false),
        }
    }

    fn register(&mut self, index: usize, out: OutParameter) -> Result<()> {
        self.statement.ensure_open()?;
        if index == 0 {
            return Err(DbError::Validation(String::from(
                "Parameter indexes start at 1",
            )));
        }
        self.out_parameters.insert(index, out);
        Ok(())
    }

    /// Registers parameter `index` as OUT (or INOUT when also bound).
    pub fn register_out_parameter(&mut self, index: usize, data_type: DataType) -> Result<()> {
        self.register(
            index,
            OutParameter {
                data_type,
                scale: None,
                type_name: None,
            },
        )
    }

    /// Registers a decimal OUT parameter with its scale.
    pub fn register_out_parameter_by_scale(
        &mut self,
        index: usize,
        data_type: DataType,
        scale: u16,
    ) -> Result<()> {
        self.register(
            index,
            OutParameter {
                data_type,
                scale: Some(scale),
                type_name: None,
            },
        )
    }

    /// Registers an OUT parameter of a database specific type.
    pub fn register_out_parameter_by_type_name(
        &mut self,
        index: usize,
        data_type: DataType,
        type_name: &str,
    ) -> Result<()> {
        self.register(
            index,
            OutParameter {
                data_type,
                scale: None,
                type_name: Some(type_name.to_string()),
            },
        )
    }

    fn bind_out_placeholders(&mut self) -> Result<()> {
        let unbound: Vec<(usize, DataType)> = self
            .out_parameters
            .iter()
            .filter(|(index, _)| {
                self.statement
                    .params
                    .get(**index - 1)
                    .map_or(true, Option::is_none)
            })
            .map(|(index, out)| (*index, out.data_type.clone()))
            .collect();
        for (index, data_type) in unbound {
            self.statement.set_null(index, data_type)?;
        }
        Ok(())
    }

    fn capture_out_values(&mut self, rows: Option<&RowSet>) {
        self.out_values.clear();
        let Some(first) = rows.and_then(|r| r.rows.first()) else {
            return;
        };
        for ((index, out), value) in self.out_parameters.iter().zip(first) {
            let value = match (out.scale, value) {
                (Some(scale), SqlValue::Decimal(d)) => SqlValue::Decimal(d.round_dp(u32::from(scale))),
                _ => value.clone(),
            };
            self.out_values.insert(*index, value);
        }
    }

    /// Runs the call. Returns `true` when it produced a result set.
    pub fn execute(&mut self) -> Result<bool> {
        self.bind_out_placeholders()?;
        let has_rows = self.statement.execute()?;
        let rows = self.statement.result.clone();
        self.capture_out_values(rows.as_ref());
        Ok(has_rows)
    }

    /// Runs the call and returns its rows.
    pub fn execute_query(&mut self) -> Result<ResultSet<'c>> {
        self.execute()?;
        self.statement
            .result_set()?
            .ok_or_else(|| DbError::execution("Call did not return a result set"))
    }

    /// Runs the call and returns the affected row count.
    pub fn execute_update(&mut self) -> Result<u64> {
        self.execute()?;
        Ok(self
            .statement
            .update_count()
            .unwrap_or_else(|| self.statement.result.as_ref().map_or(0, |r| r.rows.len() as u64)))
    }

    /// Result set of the last execution, taken once.
    pub fn result_set(&mut self) -> Result<Option<ResultSet<'c>>> {
        self.statement.result_set()
    }

    /// Row count of the last execution, if it modified data.
    #[must_use]
    pub const fn update_count(&self) -> Option<u64> {
        self.statement.update_count()
    }

    /// Reads OUT parameter `index`.
    pub fn get<T: FromSqlValue>(&self, index: usize) -> Result<Option<T>> {
        self.statement.ensure_open()?;
        if !self.out_parameters.contains_key(&index) {
            return Err(DbError::ColumnNotFound(format!(
                "parameter {index} is not registered as OUT"
            )));
        }
        let value = self.out_values.get(&index).unwrap_or(&SqlValue::Null);
        self.was_null.set(value.is_null());
        convert(&format!("parameter {index}"), value)
    }

    typed_getters!(usize);

    /// Returns whether the last OUT value read was NULL.
    #[must_use]
    pub fn was_null(&self) -> bool {
        self.was_null.get()
    }

    /// Unbinds every parameter. OUT registrations are kept.
    pub fn clear_parameters(&mut self) {
        self.statement.clear_parameters();
    }

    /// Closes the statement.
    pub fn close(&mut self) {
        self.statement.close();
        self.out_values.clear();
    }

    /// Returns whether the statement, or its connection, is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.statement.is_closed()
    }
}

impl Parameters for CallableStatement<'_> {
    fn set_parameter(&mut self, index: usize, param: Param) -> Result<()> {
        self.statement.set_parameter(index, param)
    }
}
