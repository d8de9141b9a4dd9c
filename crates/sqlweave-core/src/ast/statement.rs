//! Statement AST nodes.
//!
//! These are the dialect-neutral shapes the builders accumulate into. A
//! [`Dialect`](crate::dialect::Dialect) renders them to SQL text.

use super::types::ColumnDef;

/// A table reference in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Table name.
    pub name: String,
    /// Optional alias.
    pub alias: Option<String>,
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `JOIN`
    Plain,
    /// `INNER JOIN`
    Inner,
    /// `FULL OUTER JOIN`
    Outer,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `FULL JOIN`
    Full,
}

impl JoinKind {
    /// Returns the SQL keyword(s) for this join kind.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Plain => "JOIN",
            Self::Inner => "INNER JOIN",
            Self::Outer => "FULL OUTER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Join kind.
    pub kind: JoinKind,
    /// Joined table.
    pub table: String,
    /// Join condition.
    pub on: String,
    /// Optional alias.
    pub alias: Option<String>,
}

/// An ORDER BY item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column or expression.
    pub column: String,
    /// Ascending when true.
    pub asc: bool,
}

/// SELECT statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectStatement {
    /// `SELECT DISTINCT`
    pub distinct: bool,
    /// Trailing `FOR UPDATE`
    pub for_update: bool,
    /// Selected columns; empty renders `*`.
    pub columns: Vec<String>,
    /// Schema prefix applied to FROM tables.
    pub schema: Option<String>,
    /// FROM tables.
    pub from: Vec<TableRef>,
    /// Joins in declaration order.
    pub joins: Vec<Join>,
    /// WHERE conditions, combined with AND.
    pub conditions: Vec<String>,
    /// GROUP BY columns.
    pub group_by: Vec<String>,
    /// HAVING condition.
    pub having: Option<String>,
    /// ORDER BY items.
    pub order_by: Vec<OrderBy>,
    /// Row limit.
    pub limit: Option<u64>,
    /// Row offset.
    pub offset: Option<u64>,
    /// Rendered SELECTs appended as `UNION` blocks.
    pub unions: Vec<String>,
}

/// INSERT statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertStatement {
    /// Target table.
    pub table: String,
    /// Target columns.
    pub columns: Vec<String>,
    /// Value expressions, usually `?`.
    pub values: Vec<String>,
    /// `INSERT ... SELECT` source.
    pub select: Option<String>,
}

/// A `column = value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Column name.
    pub column: String,
    /// Value expression.
    pub value: String,
}

/// UPDATE statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStatement {
    /// Target table.
    pub table: String,
    /// SET assignments.
    pub assignments: Vec<Assignment>,
    /// WHERE conditions, combined with AND.
    pub conditions: Vec<String>,
}

/// DELETE statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteStatement {
    /// Target table.
    pub table: String,
    /// WHERE conditions, combined with AND.
    pub conditions: Vec<String>,
}

/// A named constraint over a column list (PRIMARY KEY, UNIQUE).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConstraint {
    /// Constraint name.
    pub name: Option<String>,
    /// Constrained columns.
    pub columns: Vec<String>,
}

/// A FOREIGN KEY constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: Option<String>,
    /// Referencing columns.
    pub columns: Vec<String>,
    /// Referenced table.
    pub ref_table: String,
    /// Referenced columns.
    pub ref_columns: Vec<String>,
}

/// A CHECK constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// Constraint name.
    pub name: Option<String>,
    /// Check expression.
    pub expression: String,
}

/// CREATE TABLE statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTableStatement {
    /// Table name.
    pub name: String,
    /// `IF NOT EXISTS`
    pub if_not_exists: bool,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Explicit primary key constraint.
    pub primary_key: Option<KeyConstraint>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKey>,
    /// Unique constraints.
    pub uniques: Vec<KeyConstraint>,
    /// Check constraints.
    pub checks: Vec<Check>,
}

impl CreateTableStatement {
    /// Returns the primary key columns: the explicit constraint if any,
    /// otherwise every column flagged as primary key.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&str> {
        match &self.primary_key {
            Some(pk) => pk.columns.iter().map(String::as_str).collect(),
            None => self
                .columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| c.name.as_str())
                .collect(),
        }
    }

    /// Returns whether the primary key is rendered inline on its column.
    #[must_use]
    pub fn inline_primary_key(&self) -> bool {
        self.primary_key.is_none() && self.columns.iter().filter(|c| c.primary_key).count() == 1
    }
}

/// CREATE VIEW statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateViewStatement {
    /// View name.
    pub name: String,
    /// Optional column list.
    pub columns: Vec<String>,
    /// Defining SELECT.
    pub select: String,
}

/// CREATE SEQUENCE / NEXTVAL statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceStatement {
    /// Sequence name.
    pub name: String,
    /// First value handed out.
    pub start: Option<i64>,
}

/// Kinds of droppable objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A table.
    Table,
    /// A view.
    View,
    /// A sequence.
    Sequence,
}

impl ObjectKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::View => "VIEW",
            Self::Sequence => "SEQUENCE",
        }
    }
}

/// DROP statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropStatement {
    /// Object kind.
    pub kind: ObjectKind,
    /// Object name.
    pub name: String,
    /// `IF EXISTS`, where supported.
    pub if_exists: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;

    #[test]
    fn test_primary_key_columns_from_flags() {
        let stmt = CreateTableStatement {
            name: String::from("T"),
            columns: vec![
                ColumnDef::new("A", DataType::Integer).primary_key(),
                ColumnDef::new("B", DataType::Integer).primary_key(),
                ColumnDef::new("C", DataType::Text),
            ],
            ..CreateTableStatement::default()
        };
        assert_eq!(stmt.primary_key_columns(), vec!["A", "B"]);
        assert!(!stmt.inline_primary_key());
    }

    #[test]
    fn test_explicit_primary_key_wins() {
        let stmt = CreateTableStatement {
            name: String::from("T"),
            columns: vec![ColumnDef::new("A", DataType::Integer).primary_key()],
            primary_key: Some(KeyConstraint {
                name: Some(String::from("PK_T")),
                columns: vec![String::from("A")],
            }),
            ..CreateTableStatement::default()
        };
        assert_eq!(stmt.primary_key_columns(), vec!["A"]);
        assert!(!stmt.inline_primary_key());
    }
}
