//! Microsoft SQL Server and Sybase ASE dialects.

use super::{
    Dialect, Paging, SequenceStrategy, SEQUENCE_NAME_COLUMN, SEQUENCE_TABLE, SEQUENCE_VALUE_COLUMN,
};
use crate::ast::{ColumnDef, CreateTableStatement, DataType};

/// Microsoft SQL Server dialect: `TOP n` paging, `IDENTITY(1,1)` columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["Microsoft SQL Server", "mssql"]
    }

    fn paging(&self) -> Paging {
        Paging::Top
    }

    fn supports_for_update(&self) -> bool {
        false
    }

    fn begin_transaction(&self) -> &'static str {
        "BEGIN TRANSACTION"
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        transact_sql_type(dt)
    }

    fn identity_keyword(&self) -> &'static str {
        " IDENTITY(1,1)"
    }

    fn version_query(&self) -> Option<&'static str> {
        Some("SELECT @@VERSION")
    }
}

/// Sybase Adaptive Server Enterprise dialect.
///
/// ASE has no sequence objects; sequences are counter rows updated and
/// re-read inside one transaction. Paging is `TOP` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SybaseDialect;

impl Dialect for SybaseDialect {
    fn name(&self) -> &'static str {
        "sybase"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["Adaptive Server Enterprise", "ASE"]
    }

    fn paging(&self) -> Paging {
        Paging::TopOnly
    }

    fn sequence_strategy(&self) -> SequenceStrategy {
        SequenceStrategy::CounterRowLock
    }

    fn supports_for_update(&self) -> bool {
        false
    }

    fn supports_if_exists(&self) -> bool {
        false
    }

    fn begin_transaction(&self) -> &'static str {
        "BEGIN TRANSACTION"
    }

    fn map_data_type(&self, dt: &DataType) -> String {
        match dt {
            DataType::Boolean => "BIT".to_string(),
            DataType::Double => "FLOAT".to_string(),
            DataType::Timestamp => "DATETIME".to_string(),
            DataType::Blob => "IMAGE".to_string(),
            DataType::Text | DataType::Clob => "TEXT".to_string(),
            DataType::Nclob => "UNITEXT".to_string(),
            _ => dt.to_sql(),
        }
    }

    fn identity_keyword(&self) -> &'static str {
        " IDENTITY"
    }

    fn sequence_table_ddl(&self) -> String {
        let stmt = CreateTableStatement {
            name: SEQUENCE_TABLE.to_string(),
            columns: vec![
                ColumnDef::new(SEQUENCE_NAME_COLUMN, DataType::Varchar(Some(255))).primary_key(),
                ColumnDef::new(SEQUENCE_VALUE_COLUMN, DataType::Bigint).not_null(),
            ],
            ..CreateTableStatement::default()
        };
        format!(
            "IF OBJECT_ID('{SEQUENCE_TABLE}') IS NULL {}",
            self.render_create_table(&stmt, false)
        )
    }

    fn version_query(&self) -> Option<&'static str> {
        Some("SELECT @@VERSION")
    }
}

fn transact_sql_type(dt: &DataType) -> String {
    match dt {
        DataType::Boolean => "BIT".to_string(),
        DataType::Double => "FLOAT".to_string(),
        DataType::Timestamp => "DATETIME".to_string(),
        DataType::Blob => "VARBINARY(MAX)".to_string(),
        DataType::Text | DataType::Clob => "VARCHAR(MAX)".to_string(),
        DataType::Nclob => "NVARCHAR(MAX)".to_string(),
        _ => dt.to_sql(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SequenceStatement;

    #[test]
    fn test_transact_sql_types() {
        assert_eq!(SqlServerDialect.map_data_type(&DataType::Boolean), "BIT");
        assert_eq!(SqlServerDialect.map_data_type(&DataType::Blob), "VARBINARY(MAX)");
        assert_eq!(SybaseDialect.map_data_type(&DataType::Blob), "IMAGE");
        assert_eq!(SybaseDialect.map_data_type(&DataType::Clob), "TEXT");
        assert_eq!(SybaseDialect.map_data_type(&DataType::Nclob), "UNITEXT");
    }

    #[test]
    fn test_sybase_sequence_table_is_guarded() {
        assert_eq!(
            SybaseDialect.sequence_table_ddl(),
            "IF OBJECT_ID('SQLWEAVE_SEQUENCES') IS NULL CREATE TABLE SQLWEAVE_SEQUENCES \
             (SEQUENCE_NAME VARCHAR(255) PRIMARY KEY, SEQUENCE_VALUE BIGINT NOT NULL)"
        );
    }

    #[test]
    fn test_sybase_counter_sequence() {
        let stmt = SequenceStatement {
            name: String::from("S"),
            start: None,
        };
        assert_eq!(
            SybaseDialect.render_nextval(&stmt, false),
            "UPDATE SQLWEAVE_SEQUENCES SET SEQUENCE_VALUE = SEQUENCE_VALUE + 1 WHERE SEQUENCE_NAME = 'S'"
        );
        assert_eq!(
            SybaseDialect.sequence_value_query("S"),
            "SELECT SEQUENCE_VALUE FROM SQLWEAVE_SEQUENCES WHERE SEQUENCE_NAME = 'S'"
        );
        assert_eq!(
            SqlServerDialect.render_nextval(&stmt, false),
            "SELECT NEXT VALUE FOR S"
        );
    }
}
