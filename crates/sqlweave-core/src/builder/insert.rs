//! INSERT builder.

use super::value::{SqlValue, ToSqlValue};
use super::SqlBuilder;
use crate::ast::InsertStatement;

/// An INSERT statement builder.
///
/// When no values are given, one `?` placeholder is rendered per column.
#[derive(Debug, Clone)]
pub struct Insert {
    ctx: SqlBuilder,
    stmt: InsertStatement,
    params: Vec<SqlValue>,
}

impl Insert {
    pub(crate) fn new(ctx: SqlBuilder) -> Self {
        Self {
            ctx,
            stmt: InsertStatement::default(),
            params: Vec::new(),
        }
    }

    /// Sets the target table, consuming the builder.
    #[must_use]
    pub fn into(mut self, table: impl Into<String>) -> Self {
        self.stmt.table = table.into();
        self
    }

    /// Adds a target column.
    pub fn column(&mut self, column: impl Into<String>) -> &mut Self {
        self.stmt.columns.push(column.into());
        self
    }

    /// Adds a value expression, usually `?`.
    pub fn value(&mut self, value: impl Into<String>) -> &mut Self {
        self.stmt.values.push(value.into());
        self
    }

    /// Adds a value expression together with the value of its placeholder.
    pub fn value_with(&mut self, value: impl Into<String>, param: impl ToSqlValue) -> &mut Self {
        self.stmt.values.push(value.into());
        self.params.push(param.to_sql_value());
        self
    }

    /// Inserts the rows of a rendered SELECT instead of VALUES.
    pub fn select(&mut self, select: impl Into<String>) -> &mut Self {
        self.stmt.select = Some(select.into());
        self
    }

    /// Returns the accumulated statement.
    #[must_use]
    pub fn statement(&self) -> &InsertStatement {
        &self.stmt
    }

    /// Returns the values collected through [`Insert::value_with`].
    #[must_use]
    pub fn parameters(&self) -> &[SqlValue] {
        &self.params
    }

    /// Renders the statement.
    #[must_use]
    pub fn build(&self) -> String {
        self.ctx
            .dialect()
            .render_insert(&self.stmt, self.ctx.is_case_sensitive())
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{SqlBuilder, SqlValue};
    use crate::dialect::PostgresDialect;

    #[test]
    fn test_insert_with_values() {
        let mut insert = SqlBuilder::default().insert().into("USERS");
        insert
            .column("ID")
            .column("NAME")
            .value("?")
            .value_with("?", "Ann");
        assert_eq!(insert.build(), "INSERT INTO USERS (ID, NAME) VALUES (?, ?)");
        assert_eq!(insert.parameters(), &[SqlValue::Text(String::from("Ann"))]);
    }

    #[test]
    fn test_insert_defaults_placeholders() {
        let sql = SqlBuilder::default()
            .insert()
            .into("USERS")
            .column("ID")
            .column("NAME")
            .build();
        assert_eq!(sql, "INSERT INTO USERS (ID, NAME) VALUES (?, ?)");
    }

    #[test]
    fn test_insert_select() {
        let sb = SqlBuilder::default();
        let source = sb.select().column("ID").from("STAGING").build();
        let sql = sb.insert().into("USERS").column("ID").select(source).build();
        assert_eq!(sql, "INSERT INTO USERS (ID) SELECT ID FROM STAGING");
    }

    #[test]
    fn test_insert_into_on_binding() {
        let sb = SqlBuilder::default();
        let mut insert = sb.insert();
        insert.column("A");
        let mut insert = insert.into("T");
        insert.column("B");
        assert_eq!(insert.build(), "INSERT INTO T (A, B) VALUES (?, ?)");
    }

    #[test]
    fn test_insert_case_sensitive() {
        let sql = SqlBuilder::new(&PostgresDialect)
            .case_sensitive(true)
            .insert()
            .into("Users")
            .column("Id")
            .build();
        assert_eq!(sql, "INSERT INTO \"Users\" (\"Id\") VALUES (?)");
    }
}
