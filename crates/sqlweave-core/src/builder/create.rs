//! CREATE TABLE / VIEW / SEQUENCE builders and column constructors.

use super::SqlBuilder;
use crate::ast::{
    Check, ColumnDef, CreateTableStatement, CreateViewStatement, DataType, ForeignKey,
    KeyConstraint, SequenceStatement,
};

/// Entry point for CREATE statements.
#[derive(Debug, Clone, Copy)]
pub struct Create {
    ctx: SqlBuilder,
}

impl Create {
    pub(crate) const fn new(ctx: SqlBuilder) -> Self {
        Self { ctx }
    }

    /// Starts a CREATE TABLE statement.
    #[must_use]
    pub fn table(&self, name: impl Into<String>) -> CreateTable {
        CreateTable {
            ctx: self.ctx,
            stmt: CreateTableStatement {
                name: name.into(),
                ..CreateTableStatement::default()
            },
        }
    }

    /// Starts a CREATE VIEW statement.
    #[must_use]
    pub fn view(&self, name: impl Into<String>) -> CreateView {
        CreateView {
            ctx: self.ctx,
            stmt: CreateViewStatement {
                name: name.into(),
                ..CreateViewStatement::default()
            },
        }
    }

    /// Starts a CREATE SEQUENCE statement.
    #[must_use]
    pub fn sequence(&self, name: impl Into<String>) -> CreateSequence {
        CreateSequence {
            ctx: self.ctx,
            stmt: SequenceStatement {
                name: name.into(),
                start: None,
            },
        }
    }
}

/// A CREATE TABLE statement builder.
///
/// # Example
///
/// ```rust
/// use sqlweave_core::builder::{integer, varchar, SqlBuilder};
///
/// let sql = SqlBuilder::default()
///     .create()
///     .table("CUSTOMERS")
///     .column(integer("ID").primary_key())
///     .column(varchar("EMAIL", 120).not_null().unique())
///     .build();
///
/// assert_eq!(
///     sql,
///     "CREATE TABLE CUSTOMERS (ID INTEGER PRIMARY KEY, EMAIL VARCHAR(120) NOT NULL UNIQUE)"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CreateTable {
    ctx: SqlBuilder,
    stmt: CreateTableStatement,
}

fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}

impl CreateTable {
    /// Adds `IF NOT EXISTS` where the dialect supports it.
    pub fn if_not_exists(&mut self) -> &mut Self {
        self.stmt.if_not_exists = true;
        self
    }

    /// Adds a column.
    pub fn column(&mut self, column: ColumnDef) -> &mut Self {
        self.stmt.columns.push(column);
        self
    }

    /// Sets an explicit primary key constraint.
    pub fn primary_key(&mut self, name: Option<&str>, columns: &[&str]) -> &mut Self {
        self.stmt.primary_key = Some(KeyConstraint {
            name: name.map(str::to_string),
            columns: names(columns),
        });
        self
    }

    /// Adds a foreign key constraint.
    pub fn foreign_key(
        &mut self,
        name: Option<&str>,
        columns: &[&str],
        ref_table: impl Into<String>,
        ref_columns: &[&str],
    ) -> &mut Self {
        self.stmt.foreign_keys.push(ForeignKey {
            name: name.map(str::to_string),
            columns: names(columns),
            ref_table: ref_table.into(),
            ref_columns: names(ref_columns),
        });
        self
    }

    /// Adds a unique constraint.
    pub fn unique(&mut self, name: Option<&str>, columns: &[&str]) -> &mut Self {
        self.stmt.uniques.push(KeyConstraint {
            name: name.map(str::to_string),
            columns: names(columns),
        });
        self
    }

    /// Adds a check constraint.
    pub fn check(&mut self, name: Option<&str>, expression: impl Into<String>) -> &mut Self {
        self.stmt.checks.push(Check {
            name: name.map(str::to_string),
            expression: expression.into(),
        });
        self
    }

    /// Returns the accumulated statement.
    #[must_use]
    pub fn statement(&self) -> &CreateTableStatement {
        &self.stmt
    }

    /// Renders the statement.
    #[must_use]
    pub fn build(&self) -> String {
        self.ctx
            .dialect()
            .render_create_table(&self.stmt, self.ctx.is_case_sensitive())
    }
}

/// A CREATE VIEW statement builder.
#[derive(Debug, Clone)]
pub struct CreateView {
    ctx: SqlBuilder,
    stmt: CreateViewStatement,
}

impl CreateView {
    /// Adds a view column name.
    pub fn column(&mut self, column: impl Into<String>) -> &mut Self {
        self.stmt.columns.push(column.into());
        self
    }

    /// Sets the defining SELECT.
    pub fn as_select(&mut self, select: impl Into<String>) -> &mut Self {
        self.stmt.select = select.into();
        self
    }

    /// Returns the accumulated statement.
    #[must_use]
    pub fn statement(&self) -> &CreateViewStatement {
        &self.stmt
    }

    /// Renders the statement.
    #[must_use]
    pub fn build(&self) -> String {
        self.ctx
            .dialect()
            .render_create_view(&self.stmt, self.ctx.is_case_sensitive())
    }
}

/// A CREATE SEQUENCE statement builder.
#[derive(Debug, Clone)]
pub struct CreateSequence {
    ctx: SqlBuilder,
    stmt: SequenceStatement,
}

impl CreateSequence {
    /// Sets the first value handed out.
    pub fn start(&mut self, start: i64) -> &mut Self {
        self.stmt.start = Some(start);
        self
    }

    /// Returns the accumulated statement.
    #[must_use]
    pub fn statement(&self) -> &SequenceStatement {
        &self.stmt
    }

    /// Renders the statement.
    #[must_use]
    pub fn build(&self) -> String {
        self.ctx
            .dialect()
            .render_create_sequence(&self.stmt, self.ctx.is_case_sensitive())
    }
}

/// Creates a TINYINT column.
pub fn tinyint(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Tinyint)
}

/// Creates a SMALLINT column.
pub fn smallint(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Smallint)
}

/// Creates an INTEGER column.
pub fn integer(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Integer)
}

/// Creates a BIGINT column.
pub fn bigint(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Bigint)
}

/// Creates a REAL column.
pub fn real(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Real)
}

/// Creates a DOUBLE column.
pub fn double(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Double)
}

/// Creates a DECIMAL column.
pub fn decimal(name: impl Into<String>, precision: u16, scale: u16) -> ColumnDef {
    ColumnDef::new(
        name,
        DataType::Decimal {
            precision: Some(precision),
            scale: Some(scale),
        },
    )
}

/// Creates a CHAR column.
pub fn char(name: impl Into<String>, len: u32) -> ColumnDef {
    ColumnDef::new(name, DataType::Char(Some(len)))
}

/// Creates a VARCHAR column.
pub fn varchar(name: impl Into<String>, len: u32) -> ColumnDef {
    ColumnDef::new(name, DataType::Varchar(Some(len)))
}

/// Creates an NVARCHAR column.
pub fn nvarchar(name: impl Into<String>, len: u32) -> ColumnDef {
    ColumnDef::new(name, DataType::Nvarchar(Some(len)))
}

/// Creates a TEXT column.
pub fn text(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Text)
}

/// Creates a CLOB column.
pub fn clob(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Clob)
}

/// Creates an NCLOB column.
pub fn nclob(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Nclob)
}

/// Creates a BLOB column.
pub fn blob(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Blob)
}

/// Creates a VARBINARY column.
pub fn varbinary(name: impl Into<String>, len: u32) -> ColumnDef {
    ColumnDef::new(name, DataType::Varbinary(Some(len)))
}

/// Creates a DATE column.
pub fn date(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Date)
}

/// Creates a TIME column.
pub fn time(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Time)
}

/// Creates a TIMESTAMP column.
pub fn timestamp(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Timestamp)
}

/// Creates a BOOLEAN column.
pub fn boolean(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, DataType::Boolean)
}
