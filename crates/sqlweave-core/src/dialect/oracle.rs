//! Oracle dialect.

use super::{CaseFolding, Dialect, Paging};
use crate::ast::DataType;

/// Oracle dialect: `ROWNUM` paging, `seq.NEXTVAL FROM DUAL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn case_folding(&self) -> CaseFolding {
        CaseFolding::Upper
    }

    fn paging(&self) -> Paging {
        Paging::RowNum
    }

    fn supports_if_exists(&self) -> bool {
        false
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        match dt {
            DataType::Tinyint => "NUMBER(3)".to_string(),
            DataType::Smallint => "NUMBER(5)".to_string(),
            DataType::Integer => "NUMBER(10)".to_string(),
            DataType::Bigint => "NUMBER(19)".to_string(),
            DataType::Boolean => "NUMBER(1)".to_string(),
            DataType::Real => "BINARY_FLOAT".to_string(),
            DataType::Double => "BINARY_DOUBLE".to_string(),
            DataType::Varchar(len) => crate::ast::sized("VARCHAR2", *len),
            DataType::Nvarchar(len) => crate::ast::sized("NVARCHAR2", *len),
            DataType::Text => "CLOB".to_string(),
            DataType::Varbinary(len) => crate::ast::sized("RAW", *len),
            DataType::Time => "TIMESTAMP".to_string(),
            _ => dt.to_sql(),
        }
    }

    fn native_nextval(&self, name: &str) -> String {
        format!("SELECT {name}.NEXTVAL FROM DUAL")
    }

    fn table_exists_query(&self) -> &'static str {
        "SELECT COUNT(*) FROM USER_TABLES WHERE TABLE_NAME = ?"
    }

    fn list_tables_query(&self) -> &'static str {
        "SELECT TABLE_NAME FROM USER_TABLES ORDER BY TABLE_NAME"
    }
}
