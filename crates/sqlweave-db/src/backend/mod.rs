//! Driver backends.
//!
//! Each backend owns a native sqlx pool so that temporal and decimal
//! columns decode into their real types. The generic execution path is
//! shared through [`backend_ops!`]; binding and decoding are written per
//! backend.

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlweave_core::SqlValue;
use url::Url;

use crate::error::{DbError, Result};
use crate::value::Param;

/// Supported drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Postgres,
    MySql,
    Sqlite,
}

impl Backend {
    /// Resolves a driver name (`postgres`, `postgresql`, `mysql`,
    /// `mariadb`, `sqlite`), case-insensitively.
    pub fn from_driver(driver: &str) -> Result<Self> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(DbError::Config(format!("Unsupported driver: {other}"))),
        }
    }

    /// Infers the backend from a connection URL scheme.
    pub fn from_url(url: &Url) -> Result<Self> {
        Self::from_driver(url.scheme())
    }

    /// Product name reported for connections of this backend.
    #[must_use]
    pub const fn product_name(self) -> &'static str {
        match self {
            Self::Postgres => "PostgreSQL",
            Self::MySql => "MySQL",
            Self::Sqlite => "SQLite",
        }
    }

    /// Canonical URL scheme.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.product_name())
    }
}

/// Rows returned by a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    /// Column labels in select order.
    pub columns: Vec<String>,
    /// Row values, one entry per column.
    pub rows: Vec<Vec<SqlValue>>,
}

/// Result of running one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The statement produced a result set.
    Rows(RowSet),
    /// The statement modified data or schema.
    Count {
        rows_affected: u64,
        last_insert_id: Option<i64>,
    },
}

/// Connection pool for one data source.
///
/// Uses native pool types instead of `AnyPool` so every backend keeps its
/// full type support.
#[derive(Debug, Clone)]
pub enum DbPool {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl DbPool {
    /// Creates a pool without opening a connection.
    ///
    /// Must be called within a Tokio runtime context.
    pub fn connect_lazy(backend: Backend, url: &str, max_connections: u32) -> Result<Self> {
        let pool = match backend {
            Backend::Postgres => Self::Postgres(
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect_lazy(url)?,
            ),
            Backend::MySql => Self::MySql(
                MySqlPoolOptions::new()
                    .max_connections(max_connections)
                    .connect_lazy(url)?,
            ),
            Backend::Sqlite => Self::Sqlite(
                SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .connect_lazy(url)?,
            ),
        };
        Ok(pool)
    }

    /// Returns the backend of this pool.
    #[must_use]
    pub const fn backend(&self) -> Backend {
        match self {
            Self::Postgres(_) => Backend::Postgres,
            Self::MySql(_) => Backend::MySql,
            Self::Sqlite(_) => Backend::Sqlite,
        }
    }

    /// Checks out a connection.
    pub async fn acquire(&self) -> Result<PooledConnection> {
        let conn = match self {
            Self::Postgres(pool) => PooledConnection::Postgres(pool.acquire().await?),
            Self::MySql(pool) => PooledConnection::MySql(pool.acquire().await?),
            Self::Sqlite(pool) => PooledConnection::Sqlite(pool.acquire().await?),
        };
        Ok(conn)
    }

    /// Closes the pool, waiting for checked out connections to return.
    pub async fn close(&self) {
        match self {
            Self::Postgres(pool) => pool.close().await,
            Self::MySql(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
    }
}

/// A connection checked out of a [`DbPool`].
#[derive(Debug)]
pub enum PooledConnection {
    Postgres(PoolConnection<sqlx::Postgres>),
    MySql(PoolConnection<sqlx::MySql>),
    Sqlite(PoolConnection<sqlx::Sqlite>),
}

impl PooledConnection {
    /// Runs one statement, binding `params` positionally.
    pub async fn run(&mut self, sql: &str, params: &[Param]) -> Result<Outcome> {
        match self {
            Self::Postgres(conn) => postgres::run(conn, sql, params).await,
            Self::MySql(conn) => mysql::run(conn, sql, params).await,
            Self::Sqlite(conn) => sqlite::run(conn, sql, params).await,
        }
    }

    /// Runs SQL text without preparing it. Used for transaction control
    /// and procedure bodies.
    pub async fn run_unprepared(&mut self, sql: &str) -> Result<u64> {
        match self {
            Self::Postgres(conn) => postgres::run_unprepared(conn, sql).await,
            Self::MySql(conn) => mysql::run_unprepared(conn, sql).await,
            Self::Sqlite(conn) => sqlite::run_unprepared(conn, sql).await,
        }
    }
}

/// Expands the shared execution path for one backend module.
///
/// The module must define `bind`, `decode` and `last_insert_id`.
macro_rules! backend_ops {
    ($db:ty) => {
        pub(super) async fn run(
            conn: &mut sqlx::pool::PoolConnection<$db>,
            sql: &str,
            params: &[$crate::value::Param],
        ) -> $crate::error::Result<$crate::backend::Outcome> {
            use sqlx::{Column as _, Executor as _, Row as _, Statement as _};

            let described = match (&mut **conn).prepare(sql).await {
                Ok(statement) => statement,
                // Some statements cannot go through the prepared protocol.
                Err(sqlx::Error::Database(_)) if params.is_empty() => {
                    let rows_affected = run_unprepared(conn, sql).await?;
                    return Ok($crate::backend::Outcome::Count {
                        rows_affected,
                        last_insert_id: None,
                    });
                }
                Err(err) => return Err(err.into()),
            };
            let columns: Vec<String> = described
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();

            let mut query = sqlx::query(sql);
            for param in params {
                query = bind(query, param);
            }

            if columns.is_empty() {
                let result = query.execute(&mut **conn).await?;
                return Ok($crate::backend::Outcome::Count {
                    rows_affected: result.rows_affected(),
                    last_insert_id: last_insert_id(&result),
                });
            }

            let fetched = query.fetch_all(&mut **conn).await?;
            let mut rows = Vec::with_capacity(fetched.len());
            for row in &fetched {
                let mut values = Vec::with_capacity(row.len());
                for index in 0..row.len() {
                    values.push(decode(row, index)?);
                }
                rows.push(values);
            }
            Ok($crate::backend::Outcome::Rows($crate::backend::RowSet {
                columns,
                rows,
            }))
        }

        pub(super) async fn run_unprepared(
            conn: &mut sqlx::pool::PoolConnection<$db>,
            sql: &str,
        ) -> $crate::error::Result<u64> {
            use sqlx::Executor as _;

            let result = (&mut **conn).execute(sql).await?;
            Ok(result.rows_affected())
        }
    };
}

pub(crate) use backend_ops;

/// Column name used in decode errors.
fn column_label<R: sqlx::Row>(row: &R, index: usize) -> String {
    use sqlx::Column as _;

    row.columns()
        .get(index)
        .map_or_else(|| index.to_string(), |c| c.name().to_string())
}
