//! H2 dialect.

use super::{CaseFolding, Dialect};
use crate::ast::DataType;

/// H2 dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct H2Dialect;

impl Dialect for H2Dialect {
    fn name(&self) -> &'static str {
        "h2"
    }

    fn case_folding(&self) -> CaseFolding {
        CaseFolding::Upper
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        match dt {
            DataType::Text => "CLOB".to_string(),
            _ => dt.to_sql(),
        }
    }

    fn identity_keyword(&self) -> &'static str {
        " AUTO_INCREMENT"
    }

    fn version_query(&self) -> Option<&'static str> {
        Some("SELECT H2VERSION()")
    }
}
