//! Apache Derby dialect.

use super::{CaseFolding, Dialect, Paging};
use crate::ast::DataType;

/// Apache Derby dialect: `OFFSET .. FETCH` paging, `VALUES NEXT VALUE FOR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerbyDialect;

impl Dialect for DerbyDialect {
    fn name(&self) -> &'static str {
        "derby"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["Apache Derby"]
    }

    fn case_folding(&self) -> CaseFolding {
        CaseFolding::Upper
    }

    fn paging(&self) -> Paging {
        Paging::OffsetFetch
    }

    fn supports_if_exists(&self) -> bool {
        false
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        match dt {
            DataType::Tinyint => "SMALLINT".to_string(),
            DataType::Text | DataType::Nclob => "CLOB".to_string(),
            DataType::Nvarchar(len) => crate::ast::sized("VARCHAR", *len),
            _ => dt.to_sql(),
        }
    }

    fn native_nextval(&self, name: &str) -> String {
        format!("VALUES NEXT VALUE FOR {name}")
    }

    fn table_exists_query(&self) -> &'static str {
        "SELECT COUNT(*) FROM SYS.SYSTABLES WHERE TABLENAME = ?"
    }

    fn list_tables_query(&self) -> &'static str {
        "SELECT TABLENAME FROM SYS.SYSTABLES WHERE TABLETYPE = 'T' ORDER BY TABLENAME"
    }
}
