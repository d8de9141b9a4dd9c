//! SAP HANA dialect.

use super::{CaseFolding, Dialect};
use crate::ast::DataType;

/// SAP HANA dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct HanaDialect;

impl Dialect for HanaDialect {
    fn name(&self) -> &'static str {
        "hana"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["HDB", "SAP HANA"]
    }

    fn case_folding(&self) -> CaseFolding {
        CaseFolding::Upper
    }

    fn supports_if_exists(&self) -> bool {
        false
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        match dt {
            DataType::Text => "NCLOB".to_string(),
            _ => dt.to_sql(),
        }
    }

    fn native_nextval(&self, name: &str) -> String {
        format!("SELECT {name}.NEXTVAL FROM DUMMY")
    }

    fn table_exists_query(&self) -> &'static str {
        "SELECT COUNT(*) FROM SYS.TABLES WHERE SCHEMA_NAME = CURRENT_SCHEMA AND TABLE_NAME = ?"
    }

    fn list_tables_query(&self) -> &'static str {
        "SELECT TABLE_NAME FROM SYS.TABLES WHERE SCHEMA_NAME = CURRENT_SCHEMA ORDER BY TABLE_NAME"
    }

    fn version_query(&self) -> Option<&'static str> {
        Some("SELECT VERSION FROM SYS.M_DATABASE")
    }
}
