//! UPDATE builder.

use super::value::{SqlValue, ToSqlValue};
use super::SqlBuilder;
use crate::ast::{Assignment, UpdateStatement};

/// An UPDATE statement builder.
#[derive(Debug, Clone)]
pub struct Update {
    ctx: SqlBuilder,
    stmt: UpdateStatement,
    set_params: Vec<SqlValue>,
    where_params: Vec<SqlValue>,
}

impl Update {
    pub(crate) fn new(ctx: SqlBuilder) -> Self {
        Self {
            ctx,
            stmt: UpdateStatement::default(),
            set_params: Vec::new(),
            where_params: Vec::new(),
        }
    }

    /// Sets the target table.
    pub fn table(&mut self, table: impl Into<String>) -> &mut Self {
        self.stmt.table = table.into();
        self
    }

    /// Adds a `column = value` assignment.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.stmt.assignments.push(Assignment {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Adds an assignment together with the value of its placeholder.
    pub fn set_with(
        &mut self,
        column: impl Into<String>,
        value: impl Into<String>,
        param: impl ToSqlValue,
    ) -> &mut Self {
        self.set(column, value);
        self.set_params.push(param.to_sql_value());
        self
    }

    /// Adds a WHERE condition; several conditions are ANDed.
    pub fn where_clause(&mut self, condition: impl Into<String>) -> &mut Self {
        self.stmt.conditions.push(condition.into());
        self
    }

    /// Adds a WHERE condition together with its placeholder values.
    pub fn where_with<I, V>(&mut self, condition: impl Into<String>, params: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.stmt.conditions.push(condition.into());
        self.where_params
            .extend(params.into_iter().map(ToSqlValue::to_sql_value));
        self
    }

    /// Returns the accumulated statement.
    #[must_use]
    pub fn statement(&self) -> &UpdateStatement {
        &self.stmt
    }

    /// Returns the collected values: SET values first, then WHERE values.
    #[must_use]
    pub fn parameters(&self) -> Vec<SqlValue> {
        self.set_params
            .iter()
            .chain(&self.where_params)
            .cloned()
            .collect()
    }

    /// Renders the statement.
    #[must_use]
    pub fn build(&self) -> String {
        self.ctx
            .dialect()
            .render_update(&self.stmt, self.ctx.is_case_sensitive())
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{SqlBuilder, SqlValue};

    #[test]
    fn test_update() {
        let mut update = SqlBuilder::default().update();
        update
            .table("USERS")
            .where_with("ID = ?", [7])
            .set_with("NAME", "?", "Bob")
            .set("VERSION", "VERSION + 1");
        assert_eq!(
            update.build(),
            "UPDATE USERS SET NAME = ?, VERSION = VERSION + 1 WHERE ID = ?"
        );
        assert_eq!(
            update.parameters(),
            vec![SqlValue::Text(String::from("Bob")), SqlValue::Int(7)]
        );
    }
}
