//! # sqlweave-db
//!
//! Synchronous database access on top of `sqlx`: a registry of named data
//! sources, pooled [`Connection`]s, JDBC-style [`PreparedStatement`]s,
//! [`CallableStatement`]s and buffered [`ResultSet`]s, and sequences that
//! work the same on every supported database.
//!
//! Every call blocks the current thread. A [`Database`] owns the runtime
//! driving its pools, so it must not be used from inside an async context.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlweave_db::{params, Database, DatabaseConfig, DataSourceDescriptor};
//!
//! let db = Database::new(DatabaseConfig::default())?;
//! db.register(DataSourceDescriptor::new("DefaultDB", "sqlite", "sqlite:///tmp/app.db?mode=rwc"))?;
//!
//! db.update("CREATE TABLE IF NOT EXISTS T (ID INTEGER, NAME TEXT)", &[], None, None)?;
//! db.update("INSERT INTO T VALUES (?, ?)", &params([1, 2]), None, None)?;
//!
//! let mut rows = db.query("SELECT * FROM T", &[], None, None)?;
//! println!("{}", rows.to_json_string(true)?);
//!
//! let id = db.nextval("T_ID", None, None)?;
//! # let _ = id;
//! # Ok::<(), sqlweave_db::DbError>(())
//! ```

mod backend;
pub mod config;
pub mod connection;
pub mod database;
pub mod datasource;
pub mod error;
pub mod resultset;
pub mod sequence;
pub mod statement;
pub mod value;

pub use backend::{Backend, RowSet};
pub use config::DatabaseConfig;
pub use connection::Connection;
pub use database::{dialect_for, Database};
pub use datasource::DataSourceDescriptor;
pub use error::{DbError, ErrorKind, Result};
pub use resultset::{ColumnIndex, ResultSet, JSON_ROW_LIMIT};
pub use statement::{CallableStatement, OutParameter, Parameters, PreparedStatement};
pub use value::{params, params_from_json, to_json, FromSqlValue, Param};

pub use sqlweave_core::{DataType, Dialect, SqlBuilder, SqlValue};
