//! DROP builders.

use super::SqlBuilder;
use crate::ast::{DropStatement, ObjectKind};

/// Entry point for DROP statements.
#[derive(Debug, Clone, Copy)]
pub struct Drop {
    ctx: SqlBuilder,
}

impl Drop {
    pub(crate) const fn new(ctx: SqlBuilder) -> Self {
        Self { ctx }
    }

    fn object(self, kind: ObjectKind, name: String) -> DropObject {
        DropObject {
            ctx: self.ctx,
            stmt: DropStatement {
                kind,
                name,
                if_exists: false,
            },
        }
    }

    /// Starts a DROP TABLE statement.
    #[must_use]
    pub fn table(&self, name: impl Into<String>) -> DropObject {
        self.object(ObjectKind::Table, name.into())
    }

    /// Starts a DROP VIEW statement.
    #[must_use]
    pub fn view(&self, name: impl Into<String>) -> DropObject {
        self.object(ObjectKind::View, name.into())
    }

    /// Starts a DROP SEQUENCE statement.
    #[must_use]
    pub fn sequence(&self, name: impl Into<String>) -> DropObject {
        self.object(ObjectKind::Sequence, name.into())
    }
}

/// A DROP TABLE / VIEW / SEQUENCE statement builder.
#[derive(Debug, Clone)]
pub struct DropObject {
    ctx: SqlBuilder,
    stmt: DropStatement,
}

impl DropObject {
    /// Adds `IF EXISTS` where the dialect supports it.
    pub fn if_exists(&mut self) -> &mut Self {
        self.stmt.if_exists = true;
        self
    }

    /// Returns the accumulated statement.
    #[must_use]
    pub fn statement(&self) -> &DropStatement {
        &self.stmt
    }

    /// Renders the statement.
    #[must_use]
    pub fn build(&self) -> String {
        self.ctx
            .dialect()
            .render_drop(&self.stmt, self.ctx.is_case_sensitive())
    }
}
