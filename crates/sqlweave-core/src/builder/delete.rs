//! DELETE builder.

use super::value::{SqlValue, ToSqlValue};
use super::SqlBuilder;
use crate::ast::DeleteStatement;

/// A DELETE statement builder. Without conditions every row is deleted.
#[derive(Debug, Clone)]
pub struct Delete {
    ctx: SqlBuilder,
    stmt: DeleteStatement,
    params: Vec<SqlValue>,
}

impl Delete {
    pub(crate) fn new(ctx: SqlBuilder) -> Self {
        Self {
            ctx,
            stmt: DeleteStatement::default(),
            params: Vec::new(),
        }
    }

    /// Sets the target table.
    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        self.stmt.table = table.into();
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
        self.params
            .extend(params.into_iter().map(ToSqlValue::to_sql_value));
        self
    }

    /// Returns the accumulated statement.
    #[must_use]
    pub fn statement(&self) -> &DeleteStatement {
        &self.stmt
    }

    /// Returns the collected values.
    #[must_use]
    pub fn parameters(&self) -> &[SqlValue] {
        &self.params
    }

    /// Renders the statement.
    #[must_use]
    pub fn build(&self) -> String {
        self.ctx
            .dialect()
            .render_delete(&self.stmt, self.ctx.is_case_sensitive())
    }
}
