//! # sqlweave-dao
//!
//! Configuration-driven data access objects on top of `sqlweave-db`.
//!
//! A [`Dao`] is created from a JSON entity description, either ORM-style or
//! as a table definition (see [`schema`]). It creates and drops the entity's
//! table, and inserts, finds, lists, updates, removes and counts entities
//! represented as JSON objects.
//!
//! ## Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use sqlweave_dao::{Dao, QuerySettings};
//! use sqlweave_db::{Database, DatabaseConfig, DataSourceDescriptor};
//!
//! let db = Database::new(DatabaseConfig::default())?;
//! db.register(DataSourceDescriptor::new("DefaultDB", "sqlite", "sqlite:///tmp/books.db?mode=rwc"))?;
//!
//! let books = Dao::new(&db, &json!({
//!     "table": "BOOKS",
//!     "properties": [
//!         {"name": "id", "column": "BOOK_ID", "type": "INTEGER", "id": true},
//!         {"name": "title", "column": "TITLE", "type": "VARCHAR", "length": 100, "required": true}
//!     ]
//! }), None)?;
//!
//! if !books.exists_table()? {
//!     books.create_table()?;
//! }
//! let id = books.insert(&json!({"title": "The Rust Programming Language"}))?;
//! let found = books.find(&id, &[], &[])?;
//! let page = books.list(&QuerySettings::parse("$filter=title contains Rust&$limit=10")?)?;
//! # let _ = (found, page);
//! # Ok::<(), sqlweave_db::DbError>(())
//! ```

mod convert;
pub mod dao;
pub mod filter;
pub mod schema;
pub mod settings;

pub use dao::{create, Dao, Entity};
pub use filter::{CompareOp, FilterExpr, Q};
pub use schema::{Association, Cardinality, EntityDefinition, EntitySchema, Property};
pub use settings::{Condition, Operator, QuerySettings, SortOrder};
