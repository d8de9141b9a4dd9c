//! MySQL / MariaDB dialect.

use super::{Dialect, SequenceStrategy};
use crate::ast::DataType;

/// MySQL dialect: backtick quoting, `AUTO_INCREMENT`, no sequence objects.
///
/// Sequences are emulated with a counter row advanced through
/// `LAST_INSERT_ID(expr)`, which is atomic and connection-scoped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["mariadb"]
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn sequence_strategy(&self) -> SequenceStrategy {
        SequenceStrategy::CounterLastInsertId
    }

    fn begin_transaction(&self) -> &'static str {
        "START TRANSACTION"
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        match dt {
            DataType::Clob | DataType::Nclob => "LONGTEXT".to_string(),
            DataType::Blob => "LONGBLOB".to_string(),
            DataType::Timestamp => "DATETIME".to_string(),
            _ => dt.to_sql(),
        }
    }

    fn identity_keyword(&self) -> &'static str {
        " AUTO_INCREMENT"
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, Some(m)) => format!(" LIMIT 18446744073709551615 OFFSET {m}"),
            (Some(n), Some(m)) => format!(" LIMIT {n} OFFSET {m}"),
            (Some(n), None) => format!(" LIMIT {n}"),
            (None, None) => String::new(),
        }
    }

    fn sequence_value_query(&self, _name: &str) -> String {
        String::from("SELECT LAST_INSERT_ID()")
    }

    fn table_exists_query(&self) -> &'static str {
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ?"
    }

    fn list_tables_query(&self) -> &'static str {
        "SELECT table_name FROM information_schema.tables WHERE table_schema = DATABASE() ORDER BY table_name"
    }

    fn version_query(&self) -> Option<&'static str> {
        Some("SELECT version()")
    }
}
