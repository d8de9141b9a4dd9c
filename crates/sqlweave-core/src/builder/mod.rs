//! Fluent SQL builders.
//!
//! Every builder accumulates into a statement AST through `&mut self`
//! mutators that return the same builder, and renders it with a single
//! terminal `build()`. Building does not consume or reset the builder.
//!
//! # Example
//!
//! ```rust
//! use sqlweave_core::builder::SqlBuilder;
//!
//! let sql = SqlBuilder::default()
//!     .select()
//!     .column("*")
//!     .from("T")
//!     .where_clause("A = ?")
//!     .build();
//!
//! assert_eq!(sql, "SELECT * FROM T WHERE A = ?");
//! ```

mod create;
mod delete;
mod drop;
mod insert;
mod select;
mod update;
pub mod value;

pub use create::{
    bigint, blob, boolean, char, clob, date, decimal, double, integer, nclob, nvarchar, real,
    smallint, text, time, timestamp, tinyint, varbinary, varchar, Create, CreateSequence,
    CreateTable, CreateView,
};
pub use delete::Delete;
pub use drop::{Drop, DropObject};
pub use insert::Insert;
pub use select::{NextVal, Select};
pub use update::Update;
pub use value::{SqlValue, ToSqlValue};

use crate::dialect::{self, Dialect};

/// Entry point to the builders for one dialect.
///
/// `case_sensitive` controls identifier quoting: when set, plain table and
/// column names are quoted with the dialect's quote character.
#[derive(Debug, Clone, Copy)]
pub struct SqlBuilder {
    dialect: &'static dyn Dialect,
    case_sensitive: bool,
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new(dialect::default_dialect())
    }
}

impl SqlBuilder {
    /// Creates builders rendering for `dialect`.
    #[must_use]
    pub fn new(dialect: &'static dyn Dialect) -> Self {
        Self {
            dialect,
            case_sensitive: false,
        }
    }

    /// Enables or disables identifier quoting.
    #[must_use]
    pub const fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// Returns whether identifiers are quoted.
    #[must_use]
    pub const fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Renders a table or column name for this dialect.
    #[must_use]
    pub fn identifier(&self, name: &str) -> String {
        self.dialect.identifier(name, self.case_sensitive)
    }

    /// Starts a SELECT statement.
    #[must_use]
    pub fn select(&self) -> Select {
        Select::new(*self)
    }

    /// Starts an INSERT statement.
    #[must_use]
    pub fn insert(&self) -> Insert {
        Insert::new(*self)
    }

    /// Starts an UPDATE statement.
    #[must_use]
    pub fn update(&self) -> Update {
        Update::new(*self)
    }

    /// Starts a DELETE statement.
    #[must_use]
    pub fn delete(&self) -> Delete {
        Delete::new(*self)
    }

    /// Starts a CREATE TABLE / VIEW / SEQUENCE statement.
    #[must_use]
    pub fn create(&self) -> Create {
        Create::new(*self)
    }

    /// Starts a DROP TABLE / VIEW / SEQUENCE statement.
    #[must_use]
    pub fn drop(&self) -> Drop {
        Drop::new(*self)
    }

    /// Builds the "next value" statement of sequence `name`.
    #[must_use]
    pub fn nextval(&self, name: impl Into<String>) -> NextVal {
        NextVal::new(*self, name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};

    #[test]
    fn test_default_builder_is_generic() {
        let sb = SqlBuilder::default();
        assert_eq!(sb.dialect().name(), "generic");
        assert!(!sb.is_case_sensitive());
    }

    #[test]
    fn test_canonical_select() {
        let sql = SqlBuilder::default()
            .select()
            .column("*")
            .from("T")
            .where_clause("A = ?")
            .build();
        assert_eq!(sql, "SELECT * FROM T WHERE A = ?");
    }

    #[test]
    fn test_canonical_select_quoted() {
        let sql = SqlBuilder::new(&MySqlDialect)
            .case_sensitive(true)
            .select()
            .column("*")
            .from("T")
            .where_clause("A = ?")
            .build();
        assert_eq!(sql, "SELECT * FROM `T` WHERE A = ?");

        let sql = SqlBuilder::new(&PostgresDialect)
            .case_sensitive(true)
            .select()
            .column("*")
            .from("T")
            .build();
        assert_eq!(sql, "SELECT * FROM \"T\"");
    }

    #[test]
    fn test_build_is_deterministic_for_every_dialect() {
        for dialect in dialect::all() {
            let sb = SqlBuilder::new(*dialect);
            let mut select = sb.select();
            select
                .column("A")
                .from("T")
                .where_clause("A = ?")
                .order_by("A", true)
                .limit(10)
                .offset(5);
            assert_eq!(select.build(), select.build());

            let mut table = sb.create().table("T");
            table
                .column(integer("ID").primary_key())
                .column(varchar("NAME", 20).unique());
            assert_eq!(table.build(), table.build());

            let nextval = sb.nextval("S");
            assert_eq!(nextval.build(), nextval.build());
            assert!(!nextval.build().contains('?'));
        }
    }
}
