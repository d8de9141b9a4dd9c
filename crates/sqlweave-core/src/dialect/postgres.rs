//! PostgreSQL dialect.

use std::borrow::Cow;

use super::{numbered_placeholders, CaseFolding, Dialect};
use crate::ast::{ColumnDef, DataType};
use crate::builder::value::quote_literal;

/// PostgreSQL dialect: native sequences, `$n` placeholders, lower-case folding.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["postgres", "pg"]
    }

    fn case_folding(&self) -> CaseFolding {
        CaseFolding::Lower
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn error_aborts_transaction(&self) -> bool {
        true
    }

    fn prepare_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        if sql.contains('?') {
            Cow::Owned(numbered_placeholders(sql))
        } else {
            Cow::Borrowed(sql)
        }
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        match dt {
            DataType::Tinyint | DataType::Smallint => "SMALLINT".to_string(),
            DataType::Double => "DOUBLE PRECISION".to_string(),
            DataType::Nvarchar(len) => crate::ast::sized("VARCHAR", *len),
            DataType::Clob | DataType::Nclob => "TEXT".to_string(),
            DataType::Blob | DataType::Varbinary(_) => "BYTEA".to_string(),
            _ => dt.to_sql(),
        }
    }

    fn identity_keyword(&self) -> &'static str {
        ""
    }

    fn column_type(&self, col: &ColumnDef) -> String {
        if col.identity {
            match col.data_type {
                DataType::Tinyint | DataType::Smallint => return "SMALLSERIAL".to_string(),
                DataType::Integer => return "SERIAL".to_string(),
                DataType::Bigint => return "BIGSERIAL".to_string(),
                _ => {}
            }
        }
        self.map_data_type(&col.data_type)
    }

    fn native_nextval(&self, name: &str) -> String {
        format!("SELECT nextval({})", quote_literal(name))
    }

    fn table_exists_query(&self) -> &'static str {
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = ?"
    }

    fn list_tables_query(&self) -> &'static str {
        "SELECT table_name::text AS table_name FROM information_schema.tables WHERE table_schema = current_schema() ORDER BY table_name"
    }

    fn version_query(&self) -> Option<&'static str> {
        Some("SELECT version()")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SequenceStatement;

    #[test]
    fn test_postgres_data_types() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.map_data_type(&DataType::Blob), "BYTEA");
        assert_eq!(dialect.map_data_type(&DataType::Double), "DOUBLE PRECISION");
        assert_eq!(dialect.map_data_type(&DataType::Nvarchar(Some(10))), "VARCHAR(10)");
        assert_eq!(dialect.map_data_type(&DataType::Varchar(Some(10))), "VARCHAR(10)");
    }

    #[test]
    fn test_postgres_identity_column() {
        let dialect = PostgresDialect::new();
        let col = ColumnDef::new("id", DataType::Bigint).primary_key().identity();
        assert_eq!(
            dialect.column_definition(&col, true, false),
            "id BIGSERIAL PRIMARY KEY"
        );
    }

    #[test]
    fn test_postgres_savepoints() {
        let dialect = PostgresDialect::new();
        assert!(dialect.error_aborts_transaction());
        assert_eq!(dialect.savepoint("sp"), "SAVEPOINT sp");
        assert_eq!(dialect.rollback_to_savepoint("sp"), "ROLLBACK TO SAVEPOINT sp");
        assert_eq!(dialect.release_savepoint("sp"), "RELEASE SAVEPOINT sp");
    }

    #[test]
    fn test_postgres_placeholders() {
        let dialect = PostgresDialect::new();
        assert_eq!(
            dialect.prepare_sql("UPDATE t SET a = ? WHERE id = ?"),
            "UPDATE t SET a = $1 WHERE id = $2"
        );
        assert!(matches!(dialect.prepare_sql("SELECT 1"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_postgres_nextval() {
        let dialect = PostgresDialect::new();
        let stmt = SequenceStatement {
            name: String::from("Orders_Seq"),
            start: None,
        };
        assert_eq!(
            dialect.render_nextval(&stmt, false),
            "SELECT nextval('Orders_Seq')"
        );
        assert_eq!(
            dialect.render_nextval(&stmt, true),
            "SELECT nextval('\"Orders_Seq\"')"
        );
        assert_eq!(dialect.fold_case("Orders"), "orders");
    }
}
