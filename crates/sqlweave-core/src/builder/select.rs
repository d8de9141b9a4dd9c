//! SELECT and NEXTVAL builders.

use std::fmt;

use super::value::{SqlValue, ToSqlValue};
use super::SqlBuilder;
use crate::ast::{Join, JoinKind, OrderBy, SelectStatement, SequenceStatement, TableRef};

/// A SELECT statement builder.
///
/// # Example
///
/// ```rust
/// use sqlweave_core::builder::SqlBuilder;
///
/// let mut select = SqlBuilder::default().select();
/// select
///     .column("o.ID")
///     .column("c.NAME")
///     .from_as("ORDERS", "o")
///     .left_join_as("CUSTOMERS", "c.ID = o.CUSTOMER_ID", "c")
///     .where_with("o.TOTAL > ?", [100])
///     .order_by("o.ID", false)
///     .limit(10);
///
/// assert_eq!(
///     select.build(),
///     "SELECT o.ID, c.NAME FROM ORDERS AS o LEFT JOIN CUSTOMERS AS c ON c.ID = o.CUSTOMER_ID \
///      WHERE o.TOTAL > ? ORDER BY o.ID DESC LIMIT 10"
/// );
/// assert_eq!(select.parameters().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    ctx: SqlBuilder,
    stmt: SelectStatement,
    where_params: Vec<SqlValue>,
    having_params: Vec<SqlValue>,
}

impl Select {
    pub(crate) fn new(ctx: SqlBuilder) -> Self {
        Self {
            ctx,
            stmt: SelectStatement::default(),
            where_params: Vec::new(),
            having_params: Vec::new(),
        }
    }

    /// Adds DISTINCT.
    pub fn distinct(&mut self) -> &mut Self {
        self.stmt.distinct = true;
        self
    }

    /// Adds a trailing FOR UPDATE (omitted by dialects without row locks).
    pub fn for_update(&mut self) -> &mut Self {
        self.stmt.for_update = true;
        self
    }

    /// Adds a selected column or expression.
    pub fn column(&mut self, column: impl Into<String>) -> &mut Self {
        self.stmt.columns.push(column.into());
        self
    }

    /// Adds several selected columns.
    pub fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stmt.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Sets the schema prefixed to FROM and JOIN tables.
    pub fn schema(&mut self, schema: impl Into<String>) -> &mut Self {
        self.stmt.schema = Some(schema.into());
        self
    }

    /// Adds a FROM table.
    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        self.stmt.from.push(TableRef {
            name: table.into(),
            alias: None,
        });
        self
    }

    /// Adds a FROM table with an alias.
    pub fn from_as(&mut self, table: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.stmt.from.push(TableRef {
            name: table.into(),
            alias: Some(alias.into()),
        });
        self
    }

    /// Adds a join of any kind.
    pub fn join_with(
        &mut self,
        kind: JoinKind,
        table: impl Into<String>,
        on: impl Into<String>,
        alias: Option<String>,
    ) -> &mut Self {
        self.stmt.joins.push(Join {
            kind,
            table: table.into(),
            on: on.into(),
            alias,
        });
        self
    }

    /// Adds a `JOIN`.
    pub fn join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join_with(JoinKind::Plain, table, on, None)
    }

    /// Adds an `INNER JOIN`.
    pub fn inner_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join_with(JoinKind::Inner, table, on, None)
    }

    /// Adds a `FULL OUTER JOIN`.
    pub fn outer_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join_with(JoinKind::Outer, table, on, None)
    }

    /// Adds a `LEFT JOIN`.
    pub fn left_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join_with(JoinKind::Left, table, on, None)
    }

    /// Adds a `LEFT JOIN` with an alias.
    pub fn left_join_as(
        &mut self,
        table: impl Into<String>,
        on: impl Into<String>,
        alias: impl Into<String>,
    ) -> &mut Self {
        self.join_with(JoinKind::Left, table, on, Some(alias.into()))
    }

    /// Adds a `RIGHT JOIN`.
    pub fn right_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join_with(JoinKind::Right, table, on, None)
    }

    /// Adds a `FULL JOIN`.
    pub fn full_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join_with(JoinKind::Full, table, on, None)
    }

    /// Adds a WHERE condition; several conditions are ANDed.
    pub fn where_clause(&mut self, condition: impl Into<String>) -> &mut Self {
        self.stmt.conditions.push(condition.into());
        self
    }

    /// Adds a WHERE condition together with the values of its placeholders.
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

    /// Adds a GROUP BY column.
    pub fn group_by(&mut self, column: impl Into<String>) -> &mut Self {
        self.stmt.group_by.push(column.into());
        self
    }

    /// Sets the HAVING condition.
    pub fn having(&mut self, condition: impl Into<String>) -> &mut Self {
        self.stmt.having = Some(condition.into());
        self
    }

    /// Sets the HAVING condition together with its placeholder values.
    pub fn having_with<I, V>(&mut self, condition: impl Into<String>, params: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.stmt.having = Some(condition.into());
        self.having_params = params.into_iter().map(ToSqlValue::to_sql_value).collect();
        self
    }

    /// Adds an ORDER BY item.
    pub fn order_by(&mut self, column: impl Into<String>, asc: bool) -> &mut Self {
        self.stmt.order_by.push(OrderBy {
            column: column.into(),
            asc,
        });
        self
    }

    /// Limits the number of rows.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.stmt.limit = Some(limit);
        self
    }

    /// Skips the first rows.
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.stmt.offset = Some(offset);
        self
    }

    /// Appends a `UNION` with an already rendered SELECT.
    pub fn union(&mut self, select: impl Into<String>) -> &mut Self {
        self.stmt.unions.push(select.into());
        self
    }

    /// Returns the accumulated statement.
    #[must_use]
    pub fn statement(&self) -> &SelectStatement {
        &self.stmt
    }

    /// Returns the values collected through `*_with` methods, in placeholder order.
    #[must_use]
    pub fn parameters(&self) -> Vec<SqlValue> {
        self.where_params
            .iter()
            .chain(&self.having_params)
            .cloned()
            .collect()
    }

    /// Renders the statement.
    #[must_use]
    pub fn build(&self) -> String {
        self.ctx
            .dialect()
            .render_select(&self.stmt, self.ctx.is_case_sensitive())
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Builder of the statement returning the next value of a sequence.
#[derive(Debug, Clone)]
pub struct NextVal {
    ctx: SqlBuilder,
    stmt: SequenceStatement,
}

impl NextVal {
    pub(crate) fn new(ctx: SqlBuilder, name: String) -> Self {
        Self {
            ctx,
            stmt: SequenceStatement { name, start: None },
        }
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
            .render_nextval(&self.stmt, self.ctx.is_case_sensitive())
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{SqlBuilder, SqlValue};
    use crate::dialect::{
        DerbyDialect, MySqlDialect, OracleDialect, PostgresDialect, SqlServerDialect,
        SqliteDialect,
    };

    #[test]
    fn test_select_without_columns_renders_star() {
        let sql = SqlBuilder::default().select().from("users").build();
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_select_distinct_group_having() {
        let sql = SqlBuilder::default()
            .select()
            .distinct()
            .column("DEPT")
            .column("COUNT(*)")
            .from("EMP")
            .group_by("DEPT")
            .having("COUNT(*) > 1")
            .build();
        assert_eq!(
            sql,
            "SELECT DISTINCT DEPT, COUNT(*) FROM EMP GROUP BY DEPT HAVING COUNT(*) > 1"
        );
    }

    #[test]
    fn test_joins_render_in_declaration_order() {
        let sql = SqlBuilder::default()
            .select()
            .from("A")
            .inner_join("B", "B.A_ID = A.ID")
            .right_join("C", "C.B_ID = B.ID")
            .outer_join("D", "D.ID = C.D_ID")
            .build();
        assert_eq!(
            sql,
            "SELECT * FROM A INNER JOIN B ON B.A_ID = A.ID RIGHT JOIN C ON C.B_ID = B.ID \
             FULL OUTER JOIN D ON D.ID = C.D_ID"
        );
    }

    #[test]
    fn test_multiple_where_conditions() {
        let sql = SqlBuilder::default()
            .select()
            .from("T")
            .where_clause("A = ?")
            .where_clause("B = ? OR C = ?")
            .build();
        assert_eq!(sql, "SELECT * FROM T WHERE (A = ?) AND (B = ? OR C = ?)");
    }

    #[test]
    fn test_union_after_base_select() {
        let sb = SqlBuilder::default();
        let other = sb.select().column("ID").from("ARCHIVE").build();
        let sql = sb.select().column("ID").from("LIVE").union(other).build();
        assert_eq!(sql, "SELECT ID FROM LIVE UNION SELECT ID FROM ARCHIVE");
    }

    #[test]
    fn test_schema_prefix() {
        let sql = SqlBuilder::default()
            .select()
            .schema("APP")
            .from("USERS")
            .build();
        assert_eq!(sql, "SELECT * FROM APP.USERS");
    }

    #[test]
    fn test_paging_per_dialect() {
        let render = |sb: SqlBuilder| {
            sb.select()
                .from("T")
                .order_by("ID", true)
                .limit(10)
                .offset(20)
                .build()
        };
        assert_eq!(
            render(SqlBuilder::default()),
            "SELECT * FROM T ORDER BY ID ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            render(SqlBuilder::new(&PostgresDialect)),
            "SELECT * FROM T ORDER BY ID ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            render(SqlBuilder::new(&SqlServerDialect)),
            "SELECT * FROM T ORDER BY ID ASC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(
            render(SqlBuilder::new(&DerbyDialect)),
            "SELECT * FROM T ORDER BY ID ASC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(
            render(SqlBuilder::new(&OracleDialect)),
            "SELECT * FROM (SELECT a.*, ROWNUM rnum FROM (SELECT * FROM T ORDER BY ID ASC) a \
             WHERE ROWNUM <= 30) WHERE rnum > 20"
        );
    }

    #[test]
    fn test_top_paging() {
        let sql = SqlBuilder::new(&SqlServerDialect)
            .select()
            .distinct()
            .column("NAME")
            .from("T")
            .limit(5)
            .build();
        assert_eq!(sql, "SELECT DISTINCT TOP 5 NAME FROM T");

        let sql = SqlBuilder::new(&SqlServerDialect)
            .select()
            .from("T")
            .offset(5)
            .build();
        assert_eq!(sql, "SELECT * FROM T ORDER BY (SELECT NULL) OFFSET 5 ROWS");
    }

    #[test]
    fn test_rownum_limit_only() {
        let sql = SqlBuilder::new(&OracleDialect)
            .select()
            .from("T")
            .limit(3)
            .build();
        assert_eq!(sql, "SELECT * FROM (SELECT * FROM T) WHERE ROWNUM <= 3");
    }

    #[test]
    fn test_for_update() {
        let sql = SqlBuilder::new(&MySqlDialect)
            .select()
            .from("T")
            .where_clause("ID = ?")
            .for_update()
            .build();
        assert_eq!(sql, "SELECT * FROM T WHERE ID = ? FOR UPDATE");

        let sql = SqlBuilder::new(&SqliteDialect)
            .select()
            .from("T")
            .for_update()
            .build();
        assert_eq!(sql, "SELECT * FROM T");
    }

    #[test]
    fn test_parameters_follow_clause_order() {
        let mut select = SqlBuilder::default().select();
        select
            .from("T")
            .having_with("SUM(X) > ?", [3])
            .group_by("A")
            .where_with("A = ?", ["a"]);
        assert_eq!(
            select.parameters(),
            vec![SqlValue::Text(String::from("a")), SqlValue::Int(3)]
        );
    }

    #[test]
    fn test_builder_is_reusable_after_build() {
        let mut select = SqlBuilder::default().select();
        select.from("T");
        assert_eq!(select.build(), "SELECT * FROM T");
        select.where_clause("A = 1");
        assert_eq!(select.build(), "SELECT * FROM T WHERE A = 1");
        assert_eq!(select.statement().conditions.len(), 1);
        assert_eq!(select.to_string(), select.build());
    }

    #[test]
    fn test_nextval_default_dialect() {
        let sql = SqlBuilder::default().nextval("ORDERS_ID").build();
        assert_eq!(sql, "SELECT NEXT VALUE FOR ORDERS_ID");
    }
}
