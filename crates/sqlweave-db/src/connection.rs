//! Pooled connections.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Arc;

use sqlweave_core::builder::SqlBuilder;
use sqlweave_core::Dialect;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::backend::{Backend, Outcome, PooledConnection, RowSet};
use crate::error::{DbError, Result};
use crate::resultset::ResultSet;
use crate::statement::{CallableStatement, PreparedStatement};
use crate::value::Param;

/// A connection checked out of a data source pool.
///
/// A connection is confined to one thread at a time: it is `Send` but not
/// `Sync`. Statements and result sets borrow it and fail with
/// [`DbError::StatementClosed`] once it is closed. Dropping or closing the
/// connection returns it to the pool, rolling back an open transaction.
pub struct Connection {
    inner: RefCell<Option<PooledConnection>>,
    runtime: Arc<Runtime>,
    dialect: &'static dyn Dialect,
    backend: Backend,
    database_type: String,
    data_source: String,
    case_sensitive: bool,
    auto_commit: Cell<bool>,
    in_transaction: Cell<bool>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("data_source", &self.data_source)
            .field("product", &self.backend.product_name())
            .field("dialect", &self.dialect.name())
            .field("auto_commit", &self.auto_commit.get())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Where a connection comes from.
pub(crate) struct Origin<'a> {
    pub database_type: &'a str,
    pub data_source: &'a str,
    pub backend: Backend,
    pub case_sensitive: bool,
}

impl Connection {
    pub(crate) fn new(
        conn: PooledConnection,
        runtime: Arc<Runtime>,
        dialect: &'static dyn Dialect,
        origin: &Origin<'_>,
    ) -> Self {
        Self {
            inner: RefCell::new(Some(conn)),
            runtime,
            dialect,
            backend: origin.backend,
            database_type: origin.database_type.to_string(),
            data_source: origin.data_source.to_string(),
            case_sensitive: origin.case_sensitive,
            auto_commit: Cell::new(true),
            in_transaction: Cell::new(false),
        }
    }

    /// Prepares a statement with `?` placeholders.
    pub fn prepare_statement(&self, sql: &str) -> Result<PreparedStatement<'_>> {
        self.ensure_open()?;
        Ok(PreparedStatement::new(self, sql))
    }

    /// Prepares a procedure call with `?` placeholders.
    pub fn prepare_call(&self, sql: &str) -> Result<CallableStatement<'_>> {
        self.ensure_open()?;
        Ok(CallableStatement::new(self, sql))
    }

    /// Runs a query and returns its rows.
    pub fn query(&self, sql: &str, params: &[Param]) -> Result<ResultSet<'_>> {
        match self.run(sql, params)? {
            Outcome::Rows(rows) => Ok(ResultSet::new(Some(self), rows)),
            Outcome::Count { .. } => Err(DbError::execution(format!(
                "Statement did not return a result set: {sql}"
            ))),
        }
    }

    /// Runs a data or schema modification and returns the affected row count.
    pub fn update(&self, sql: &str, params: &[Param]) -> Result<u64> {
        match self.run(sql, params)? {
            Outcome::Count { rows_affected, .. } => Ok(rows_affected),
            Outcome::Rows(rows) => Ok(rows.rows.len() as u64),
        }
    }

    /// Runs SQL text without preparing it, e.g. a procedure definition.
    pub fn execute_script(&self, sql: &str) -> Result<u64> {
        debug!(datasource = %self.data_source, sql = %sql, "Executing script");
        self.with_connection(|conn, runtime| runtime.block_on(conn.run_unprepared(sql)))
    }

    /// Runs one statement. `?` placeholders are rewritten for the dialect.
    pub(crate) fn run(&self, sql: &str, params: &[Param]) -> Result<Outcome> {
        let sql = self.dialect.prepare_sql(sql);
        debug!(datasource = %self.data_source, sql = %sql, params = params.len(), "Executing SQL");
        self.with_connection(|conn, runtime| runtime.block_on(conn.run(&sql, params)))
    }

    /// Runs a query expected to return rows.
    pub(crate) fn fetch(&self, sql: &str, params: &[Param]) -> Result<RowSet> {
        match self.run(sql, params)? {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Count { .. } => Ok(RowSet::default()),
        }
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut PooledConnection, &Runtime) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self
            .inner
            .try_borrow_mut()
            .map_err(|_| DbError::Connection(String::from("Connection is already in use")))?;
        let conn = guard.as_mut().ok_or_else(closed)?;
        if !self.auto_commit.get() && !self.in_transaction.get() {
            let begin = self.dialect.begin_transaction();
            debug!(datasource = %self.data_source, sql = begin, "Starting transaction");
            self.runtime.block_on(conn.run_unprepared(begin))?;
            self.in_transaction.set(true);
        }
        f(conn, self.runtime.as_ref())
    }

    fn end_transaction(&self, sql: &str) -> Result<()> {
        if !self.in_transaction.get() {
            self.ensure_open()?;
            return Ok(());
        }
        let mut guard = self
            .inner
            .try_borrow_mut()
            .map_err(|_| DbError::Connection(String::from("Connection is already in use")))?;
        let conn = guard.as_mut().ok_or_else(closed)?;
        debug!(datasource = %self.data_source, sql = sql, "Ending transaction");
        self.in_transaction.set(false);
        self.runtime.block_on(conn.run_unprepared(sql))?;
        Ok(())
    }

    /// Enables or disables auto-commit. Re-enabling it commits an open
    /// transaction. With auto-commit off, a transaction starts with the
    /// next statement.
    pub fn set_auto_commit(&self, auto_commit: bool) -> Result<()> {
        self.ensure_open()?;
        if auto_commit && self.in_transaction.get() {
            self.commit()?;
        }
        self.auto_commit.set(auto_commit);
        Ok(())
    }

    /// Returns whether auto-commit is enabled.
    #[must_use]
    pub fn auto_commit(&self) -> bool {
        self.auto_commit.get()
    }

    /// Commits the open transaction, if any.
    pub fn commit(&self) -> Result<()> {
        self.end_transaction("COMMIT")
    }

    /// Rolls back the open transaction, if any.
    pub fn rollback(&self) -> Result<()> {
        self.end_transaction("ROLLBACK")
    }

    /// Returns the connection to its pool. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let Ok(mut guard) = self.inner.try_borrow_mut() else {
            return Err(DbError::Connection(String::from("Connection is already in use")));
        };
        let Some(mut conn) = guard.take() else {
            return Ok(());
        };
        let result = if self.in_transaction.replace(false) {
            self.runtime
                .block_on(conn.run_unprepared("ROLLBACK"))
                .map(|_| ())
        } else {
            Ok(())
        };
        // Returning a connection to the pool spawns onto the runtime.
        let _enter = self.runtime.enter();
        drop(conn);
        result
    }

    /// Returns whether the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.try_borrow().map_or(false, |inner| inner.is_none())
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(closed())
        } else {
            Ok(())
        }
    }

    /// Database product name, e.g. `PostgreSQL`.
    #[must_use]
    pub const fn product_name(&self) -> &'static str {
        self.backend.product_name()
    }

    /// Dialect resolved from the product name.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// Builders rendering for this connection's dialect.
    #[must_use]
    pub fn sql(&self) -> SqlBuilder {
        SqlBuilder::new(self.dialect).case_sensitive(self.case_sensitive)
    }

    /// Returns whether generated identifiers are quoted.
    #[must_use]
    pub const fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Database type the data source is registered under.
    #[must_use]
    pub fn database_type(&self) -> &str {
        &self.database_type
    }

    /// Name of the data source.
    #[must_use]
    pub fn data_source(&self) -> &str {
        &self.data_source
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(datasource = %self.data_source, error = %e, "Failed to release connection");
        }
    }
}

fn closed() -> DbError {
    DbError::StatementClosed(String::from("Connection is closed"))
}
