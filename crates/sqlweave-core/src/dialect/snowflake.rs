//! Snowflake dialect.

use super::{CaseFolding, Dialect};
use crate::ast::DataType;

/// Snowflake dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeDialect;

impl Dialect for SnowflakeDialect {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn case_folding(&self) -> CaseFolding {
        CaseFolding::Upper
    }

    fn supports_for_update(&self) -> bool {
        false
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        match dt {
            DataType::Blob | DataType::Varbinary(_) => "BINARY".to_string(),
            DataType::Clob | DataType::Nclob => "TEXT".to_string(),
            _ => dt.to_sql(),
        }
    }

    fn identity_keyword(&self) -> &'static str {
        " AUTOINCREMENT"
    }

    fn native_nextval(&self, name: &str) -> String {
        format!("SELECT {name}.NEXTVAL")
    }

    fn version_query(&self) -> Option<&'static str> {
        Some("SELECT CURRENT_VERSION()")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_nextval() {
        assert_eq!(SnowflakeDialect.native_nextval("S"), "SELECT S.NEXTVAL");
        assert_eq!(SnowflakeDialect.map_data_type(&DataType::Blob), "BINARY");
    }
}
