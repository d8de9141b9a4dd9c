//! SQLite dialect.

use super::{Dialect, SequenceStrategy};
use crate::ast::{ColumnDef, DataType};

/// SQLite dialect.
///
/// SQLite has no sequence objects; sequences are counter rows advanced with
/// `UPDATE .. RETURNING`, a single atomic statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sqlite3"]
    }

    fn sequence_strategy(&self) -> SequenceStrategy {
        SequenceStrategy::CounterReturning
    }

    fn supports_for_update(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        // SQLite has dynamic typing with type affinity
        match dt {
            DataType::Tinyint | DataType::Smallint | DataType::Integer | DataType::Bigint => {
                "INTEGER".to_string()
            }
            DataType::Boolean => "INTEGER".to_string(), // SQLite has no bool, use 0/1
            DataType::Real | DataType::Double => "REAL".to_string(),
            DataType::Decimal { .. } => "NUMERIC".to_string(),
            DataType::Blob | DataType::Varbinary(_) => "BLOB".to_string(),
            DataType::Custom(name) => name.clone(),
            _ => "TEXT".to_string(),
        }
    }

    fn identity_keyword(&self) -> &'static str {
        ""
    }

    fn column_definition(&self, col: &ColumnDef, inline_pk: bool, case_sensitive: bool) -> String {
        // AUTOINCREMENT is only valid on an INTEGER PRIMARY KEY column
        if col.identity && inline_pk {
            let mut sql = format!(
                "{} INTEGER PRIMARY KEY AUTOINCREMENT",
                self.identifier(&col.name, case_sensitive)
            );
            if let Some(ref args) = col.args {
                sql.push(' ');
                sql.push_str(args);
            }
            return sql;
        }
        let mut sql = format!(
            "{} {}",
            self.identifier(&col.name, case_sensitive),
            self.column_type(col)
        );
        if inline_pk {
            sql.push_str(" PRIMARY KEY");
        } else {
            if !col.nullable {
                sql.push_str(" NOT NULL");
            }
            if col.unique {
                sql.push_str(" UNIQUE");
            }
        }
        if let Some(ref args) = col.args {
            sql.push(' ');
            sql.push_str(args);
        }
        sql
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, Some(m)) => format!(" LIMIT -1 OFFSET {m}"),
            (Some(n), Some(m)) => format!(" LIMIT {n} OFFSET {m}"),
            (Some(n), None) => format!(" LIMIT {n}"),
            (None, None) => String::new(),
        }
    }

    fn table_exists_query(&self) -> &'static str {
        "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND lower(name) = lower(?)"
    }

    fn list_tables_query(&self) -> &'static str {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
    }

    fn version_query(&self) -> Option<&'static str> {
        Some("SELECT sqlite_version()")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SequenceStatement;

    #[test]
    fn test_sqlite_data_types() {
        let dialect = SqliteDialect::new();
        assert_eq!(dialect.map_data_type(&DataType::Integer), "INTEGER");
        assert_eq!(dialect.map_data_type(&DataType::Bigint), "INTEGER");
        assert_eq!(dialect.map_data_type(&DataType::Varchar(Some(255))), "TEXT");
        assert_eq!(dialect.map_data_type(&DataType::Blob), "BLOB");
        assert_eq!(dialect.map_data_type(&DataType::Boolean), "INTEGER");
        assert_eq!(dialect.map_data_type(&DataType::Timestamp), "TEXT");
    }

    #[test]
    fn test_sqlite_identity_column() {
        let dialect = SqliteDialect::new();
        let col = ColumnDef::new("id", DataType::Bigint).primary_key().identity();
        assert_eq!(
            dialect.column_definition(&col, true, false),
            "id INTEGER PRIMARY KEY AUTOINCREMENT"
        );
    }

    #[test]
    fn test_sqlite_nextval_uses_returning() {
        let dialect = SqliteDialect::new();
        let stmt = SequenceStatement {
            name: String::from("S1"),
            start: None,
        };
        assert_eq!(
            dialect.render_nextval(&stmt, false),
            "UPDATE SQLWEAVE_SEQUENCES SET SEQUENCE_VALUE = SEQUENCE_VALUE + 1 WHERE SEQUENCE_NAME = 'S1' RETURNING SEQUENCE_VALUE"
        );
    }

    #[test]
    fn test_sqlite_offset_without_limit() {
        assert_eq!(
            SqliteDialect::new().limit_offset(None, Some(3)),
            " LIMIT -1 OFFSET 3"
        );
    }
}
