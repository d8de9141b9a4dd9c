//! # sqlweave-core
//!
//! Dialect-aware SQL statement AST and fluent builders.
//!
//! This crate provides:
//! - Statement ASTs for SELECT, INSERT, UPDATE, DELETE and the CREATE/DROP
//!   family of TABLE, VIEW and SEQUENCE
//! - Fluent builders rendering those ASTs to SQL text for one dialect
//! - A closed table of dialects resolved by product name or database type
//!
//! No I/O happens here; the `sqlweave-db` crate executes the rendered text.
//!
//! ## Rendering for a dialect
//!
//! ```rust
//! use sqlweave_core::builder::SqlBuilder;
//! use sqlweave_core::dialect;
//!
//! let pg = dialect::resolve("PostgreSQL").unwrap();
//! let sql = SqlBuilder::new(pg)
//!     .select()
//!     .column("NAME")
//!     .from("CUSTOMERS")
//!     .where_clause("ID = ?")
//!     .order_by("NAME", true)
//!     .limit(10)
//!     .build();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT NAME FROM CUSTOMERS WHERE ID = ? ORDER BY NAME ASC LIMIT 10"
//! );
//! ```
//!
//! ## Sequences
//!
//! Dialects without native sequences render `nextval` against a counter
//! table instead:
//!
//! ```rust
//! use sqlweave_core::builder::SqlBuilder;
//! use sqlweave_core::dialect::SqliteDialect;
//!
//! let sql = SqlBuilder::new(&SqliteDialect).nextval("ORDERS_ID").build();
//! assert!(sql.starts_with("UPDATE SQLWEAVE_SEQUENCES"));
//! ```

pub mod ast;
pub mod builder;
pub mod dialect;

pub use ast::{ColumnDef, DataType};
pub use builder::{SqlBuilder, SqlValue, ToSqlValue};
pub use dialect::Dialect;
