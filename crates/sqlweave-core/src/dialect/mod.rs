//! SQL Dialect support.
//!
//! Different databases have slightly different SQL syntax. A [`Dialect`] is a
//! stateless capability descriptor: quoting rules, paging syntax, sequence
//! support and identity-column syntax, plus default rendering of every
//! statement AST that individual dialects override where they differ.
//!
//! Dialects are looked up by product name or database type through an
//! explicit table ([`resolve`]); unknown names are never defaulted.

mod derby;
mod generic;
mod h2;
mod hana;
mod mysql;
mod oracle;
mod postgres;
mod snowflake;
mod sqlite;
mod sqlserver;

pub use derby::DerbyDialect;
pub use generic::GenericDialect;
pub use h2::H2Dialect;
pub use hana::HanaDialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use snowflake::SnowflakeDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::{SqlServerDialect, SybaseDialect};

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use crate::ast::{
    ColumnDef, CreateTableStatement, CreateViewStatement, DataType, DeleteStatement,
    DropStatement, InsertStatement, KeyConstraint, ObjectKind, SelectStatement,
    SequenceStatement, UpdateStatement,
};
use crate::builder::value::quote_literal;

/// Counter table backing emulated sequences.
pub const SEQUENCE_TABLE: &str = "SQLWEAVE_SEQUENCES";
/// Sequence name column of [`SEQUENCE_TABLE`].
pub const SEQUENCE_NAME_COLUMN: &str = "SEQUENCE_NAME";
/// Current value column of [`SEQUENCE_TABLE`].
pub const SEQUENCE_VALUE_COLUMN: &str = "SEQUENCE_VALUE";

/// How a database folds unquoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFolding {
    /// Names are stored as written.
    Preserve,
    /// Unquoted names are stored upper-case.
    Upper,
    /// Unquoted names are stored lower-case.
    Lower,
}

/// Paging syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// `LIMIT n OFFSET m`
    LimitOffset,
    /// `SELECT TOP n`, falling back to `OFFSET .. FETCH` when an offset is set.
    Top,
    /// `SELECT TOP n` without any offset clause. An offset `m` widens the
    /// bound to `n + m`; the reader skips the first `m` rows.
    TopOnly,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
    OffsetFetch,
    /// `ROWNUM` filtering around a subquery.
    RowNum,
}

/// How `nextval` is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStrategy {
    /// Native sequence objects.
    Native,
    /// Counter table row incremented with `UPDATE .. RETURNING`.
    CounterReturning,
    /// Counter table row incremented through `LAST_INSERT_ID(expr)`.
    CounterLastInsertId,
    /// Counter table row incremented and re-read inside a transaction.
    CounterRowLock,
}

impl SequenceStrategy {
    /// Returns whether sequences live in [`SEQUENCE_TABLE`].
    #[must_use]
    pub const fn is_emulated(self) -> bool {
        !matches!(self, Self::Native)
    }
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Additional product names and database types resolving to this dialect.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns how unquoted identifiers are folded.
    fn case_folding(&self) -> CaseFolding {
        CaseFolding::Preserve
    }

    /// Returns the paging syntax.
    fn paging(&self) -> Paging {
        Paging::LimitOffset
    }

    /// Returns how sequences are provided.
    fn sequence_strategy(&self) -> SequenceStrategy {
        SequenceStrategy::Native
    }

    /// Returns whether `SELECT .. FOR UPDATE` is accepted.
    fn supports_for_update(&self) -> bool {
        true
    }

    /// Returns whether the dialect supports RETURNING clause.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Returns whether `DROP .. IF EXISTS` and `CREATE TABLE IF NOT EXISTS` are accepted.
    fn supports_if_exists(&self) -> bool {
        true
    }

    /// Folds a name the way the database stores unquoted identifiers.
    fn fold_case(&self, name: &str) -> String {
        match self.case_folding() {
            CaseFolding::Preserve => name.to_string(),
            CaseFolding::Upper => name.to_uppercase(),
            CaseFolding::Lower => name.to_lowercase(),
        }
    }

    /// Quotes an identifier unconditionally.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Renders a table or column name.
    ///
    /// In case-sensitive mode plain identifiers (and each part of a dotted
    /// name) are quoted; anything else, such as `*` or `COUNT(*)`, is kept
    /// verbatim.
    fn identifier(&self, name: &str, case_sensitive: bool) -> String {
        if case_sensitive && is_plain_identifier(name) {
            name.split('.')
                .map(|part| self.quote_identifier(part))
                .collect::<Vec<_>>()
                .join(".")
        } else {
            name.to_string()
        }
    }

    /// Rewrites `?` placeholders into the driver's native style.
    fn prepare_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(sql)
    }

    /// Statement opening an explicit transaction.
    fn begin_transaction(&self) -> &'static str {
        "BEGIN"
    }

    /// Whether a failed statement leaves the open transaction unusable until
    /// it is rolled back.
    fn error_aborts_transaction(&self) -> bool {
        false
    }

    /// Statement setting savepoint `name`.
    fn savepoint(&self, name: &str) -> String {
        format!("SAVEPOINT {name}")
    }

    /// Statement undoing the work done since savepoint `name`.
    fn rollback_to_savepoint(&self, name: &str) -> String {
        format!("ROLLBACK TO SAVEPOINT {name}")
    }

    /// Statement discarding savepoint `name` and keeping its work.
    fn release_savepoint(&self, name: &str) -> String {
        format!("RELEASE SAVEPOINT {name}")
    }

    /// Maps a `DataType` to the dialect-specific SQL type.
    fn map_data_type(&self, dt: &DataType) -> String {
        dt.to_sql()
    }

    /// Keyword appended after the type of an identity column.
    fn identity_keyword(&self) -> &'static str {
        " GENERATED BY DEFAULT AS IDENTITY"
    }

    /// Returns the rendered type of a column.
    fn column_type(&self, col: &ColumnDef) -> String {
        self.map_data_type(&col.data_type)
    }

    /// Generates SQL for a column definition.
    fn column_definition(&self, col: &ColumnDef, inline_pk: bool, case_sensitive: bool) -> String {
        let mut sql = format!(
            "{} {}",
            self.identifier(&col.name, case_sensitive),
            self.column_type(col)
        );
        if col.identity {
            sql.push_str(self.identity_keyword());
        }
        if inline_pk {
            sql.push_str(" PRIMARY KEY");
        } else {
            if !col.nullable {
                sql.push_str(" NOT NULL");
            }
            if col.unique {
                sql.push_str(" UNIQUE");
            }
        }
        if let Some(ref args) = col.args {
            sql.push(' ');
            sql.push_str(args);
        }
        sql
    }

    /// Renders the LIMIT/OFFSET tail for [`Paging::LimitOffset`].
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut sql = String::new();
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }
        if let Some(m) = offset {
            sql.push_str(&format!(" OFFSET {m}"));
        }
        sql
    }

    /// Generates SQL for SELECT.
    fn render_select(&self, stmt: &SelectStatement, case_sensitive: bool) -> String {
        let paging = self.paging();
        let mut sql = String::from("SELECT ");
        if stmt.distinct {
            sql.push_str("DISTINCT ");
        }
        let top = match (paging, stmt.limit, stmt.offset) {
            (Paging::Top, Some(n), None) => Some(n),
            (Paging::TopOnly, Some(n), m) => Some(n.saturating_add(m.unwrap_or(0))),
            _ => None,
        };
        if let Some(n) = top {
            sql.push_str(&format!("TOP {n} "));
        }
        if stmt.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&identifiers(self, &stmt.columns, case_sensitive));
        }

        let schema = stmt.schema.as_deref();
        if !stmt.from.is_empty() {
            let tables: Vec<String> = stmt
                .from
                .iter()
                .map(|t| table_ref(self, schema, &t.name, t.alias.as_deref(), case_sensitive))
                .collect();
            sql.push_str(" FROM ");
            sql.push_str(&tables.join(", "));
        }
        for join in &stmt.joins {
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push(' ');
            sql.push_str(&table_ref(
                self,
                schema,
                &join.table,
                join.alias.as_deref(),
                case_sensitive,
            ));
            sql.push_str(" ON ");
            sql.push_str(&join.on);
        }
        sql.push_str(&where_clause(&stmt.conditions));
        if !stmt.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&identifiers(self, &stmt.group_by, case_sensitive));
        }
        if let Some(ref having) = stmt.having {
            sql.push_str(" HAVING ");
            sql.push_str(having);
        }
        if !stmt.order_by.is_empty() {
            let items: Vec<String> = stmt
                .order_by
                .iter()
                .map(|o| {
                    let dir = if o.asc { "ASC" } else { "DESC" };
                    format!("{} {dir}", self.identifier(&o.column, case_sensitive))
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&items.join(", "));
        } else if paging == Paging::Top && stmt.offset.is_some() {
            // OFFSET .. FETCH requires an ORDER BY
            sql.push_str(" ORDER BY (SELECT NULL)");
        }

        let mut sql = match paging {
            Paging::LimitOffset => sql + &self.limit_offset(stmt.limit, stmt.offset),
            Paging::Top if stmt.offset.is_none() => sql,
            Paging::TopOnly => sql,
            Paging::Top | Paging::OffsetFetch => sql + &offset_fetch(stmt.limit, stmt.offset),
            Paging::RowNum => rownum_wrap(sql, stmt.limit, stmt.offset),
        };

        for union in &stmt.unions {
            sql.push_str(" UNION ");
            sql.push_str(union);
        }
        if stmt.for_update && self.supports_for_update() {
            sql.push_str(" FOR UPDATE");
        }
        sql
    }

    /// Generates SQL for INSERT.
    fn render_insert(&self, stmt: &InsertStatement, case_sensitive: bool) -> String {
        let mut sql = format!(
            "INSERT INTO {}",
            self.identifier(&stmt.table, case_sensitive)
        );
        if !stmt.columns.is_empty() {
            sql.push_str(" (");
            sql.push_str(&identifiers(self, &stmt.columns, case_sensitive));
            sql.push(')');
        }
        if let Some(ref select) = stmt.select {
            sql.push(' ');
            sql.push_str(select);
        } else if stmt.values.is_empty() {
            let placeholders = vec!["?"; stmt.columns.len()];
            sql.push_str(&format!(" VALUES ({})", placeholders.join(", ")));
        } else {
            sql.push_str(&format!(" VALUES ({})", stmt.values.join(", ")));
        }
        sql
    }

    /// Generates SQL for UPDATE.
    fn render_update(&self, stmt: &UpdateStatement, case_sensitive: bool) -> String {
        let assignments: Vec<String> = stmt
            .assignments
            .iter()
            .map(|a| format!("{} = {}", self.identifier(&a.column, case_sensitive), a.value))
            .collect();
        format!(
            "UPDATE {} SET {}{}",
            self.identifier(&stmt.table, case_sensitive),
            assignments.join(", "),
            where_clause(&stmt.conditions)
        )
    }

    /// Generates SQL for DELETE.
    fn render_delete(&self, stmt: &DeleteStatement, case_sensitive: bool) -> String {
        format!(
            "DELETE FROM {}{}",
            self.identifier(&stmt.table, case_sensitive),
            where_clause(&stmt.conditions)
        )
    }

    /// Generates SQL for CREATE TABLE.
    ///
    /// Columns come first in declaration order, followed by the primary key,
    /// foreign keys, unique constraints and checks.
    fn render_create_table(&self, stmt: &CreateTableStatement, case_sensitive: bool) -> String {
        let mut sql = String::from("CREATE TABLE ");
        if stmt.if_not_exists && self.supports_if_exists() {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.identifier(&stmt.name, case_sensitive));
        sql.push_str(" (");

        let inline_pk = stmt.inline_primary_key();
        let mut parts: Vec<String> = stmt
            .columns
            .iter()
            .map(|c| self.column_definition(c, inline_pk && c.primary_key, case_sensitive))
            .collect();

        if !inline_pk {
            let pk_columns = stmt.primary_key_columns();
            if !pk_columns.is_empty() {
                let name = stmt.primary_key.as_ref().and_then(|pk| pk.name.as_deref());
                let cols: Vec<String> = pk_columns
                    .iter()
                    .map(|c| self.identifier(c, case_sensitive))
                    .collect();
                parts.push(format!(
                    "{}PRIMARY KEY ({})",
                    constraint_prefix(self, name, case_sensitive),
                    cols.join(", ")
                ));
            }
        }
        for fk in &stmt.foreign_keys {
            parts.push(format!(
                "{}FOREIGN KEY ({}) REFERENCES {} ({})",
                constraint_prefix(self, fk.name.as_deref(), case_sensitive),
                identifiers(self, &fk.columns, case_sensitive),
                self.identifier(&fk.ref_table, case_sensitive),
                identifiers(self, &fk.ref_columns, case_sensitive)
            ));
        }
        for unique in &stmt.uniques {
            parts.push(key_constraint(self, "UNIQUE", unique, case_sensitive));
        }
        for check in &stmt.checks {
            parts.push(format!(
                "{}CHECK ({})",
                constraint_prefix(self, check.name.as_deref(), case_sensitive),
                check.expression
            ));
        }

        sql.push_str(&parts.join(", "));
        sql.push(')');
        sql
    }

    /// Generates SQL for CREATE VIEW.
    fn render_create_view(&self, stmt: &CreateViewStatement, case_sensitive: bool) -> String {
        let mut sql = format!("CREATE VIEW {}", self.identifier(&stmt.name, case_sensitive));
        if !stmt.columns.is_empty() {
            sql.push_str(&format!(
                " ({})",
                identifiers(self, &stmt.columns, case_sensitive)
            ));
        }
        sql.push_str(" AS ");
        sql.push_str(&stmt.select);
        sql
    }

    /// Generates SQL for CREATE SEQUENCE, or the counter row insert when
    /// sequences are emulated.
    fn render_create_sequence(&self, stmt: &SequenceStatement, case_sensitive: bool) -> String {
        if self.sequence_strategy().is_emulated() {
            return format!(
                "INSERT INTO {SEQUENCE_TABLE} ({SEQUENCE_NAME_COLUMN}, {SEQUENCE_VALUE_COLUMN}) VALUES ({}, {})",
                quote_literal(&stmt.name),
                i128::from(stmt.start.unwrap_or(1)) - 1
            );
        }
        let mut sql = format!(
            "CREATE SEQUENCE {}",
            self.identifier(&stmt.name, case_sensitive)
        );
        if let Some(start) = stmt.start {
            sql.push_str(&format!(" START WITH {start}"));
        }
        sql
    }

    /// Generates SQL for DROP. Dropping an emulated sequence deletes its
    /// counter row.
    fn render_drop(&self, stmt: &DropStatement, case_sensitive: bool) -> String {
        if stmt.kind == ObjectKind::Sequence && self.sequence_strategy().is_emulated() {
            return format!(
                "DELETE FROM {SEQUENCE_TABLE} WHERE {SEQUENCE_NAME_COLUMN} = {}",
                quote_literal(&stmt.name)
            );
        }
        let mut sql = format!("DROP {} ", stmt.kind.as_sql());
        if stmt.if_exists && self.supports_if_exists() {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.identifier(&stmt.name, case_sensitive));
        sql
    }

    /// Native "next sequence value" query for an already rendered name.
    fn native_nextval(&self, name: &str) -> String {
        format!("SELECT NEXT VALUE FOR {name}")
    }

    /// Generates the statement advancing a sequence.
    ///
    /// Emulated strategies render the counter increment; for
    /// [`SequenceStrategy::CounterLastInsertId`] and
    /// [`SequenceStrategy::CounterRowLock`] the new value is then read with
    /// [`Dialect::sequence_value_query`].
    fn render_nextval(&self, stmt: &SequenceStatement, case_sensitive: bool) -> String {
        let name = quote_literal(&stmt.name);
        match self.sequence_strategy() {
            SequenceStrategy::Native => {
                self.native_nextval(&self.identifier(&stmt.name, case_sensitive))
            }
            SequenceStrategy::CounterReturning => format!(
                "UPDATE {SEQUENCE_TABLE} SET {SEQUENCE_VALUE_COLUMN} = {SEQUENCE_VALUE_COLUMN} + 1 \
                 WHERE {SEQUENCE_NAME_COLUMN} = {name} RETURNING {SEQUENCE_VALUE_COLUMN}"
            ),
            SequenceStrategy::CounterLastInsertId => format!(
                "UPDATE {SEQUENCE_TABLE} SET {SEQUENCE_VALUE_COLUMN} = LAST_INSERT_ID({SEQUENCE_VALUE_COLUMN} + 1) \
                 WHERE {SEQUENCE_NAME_COLUMN} = {name}"
            ),
            SequenceStrategy::CounterRowLock => format!(
                "UPDATE {SEQUENCE_TABLE} SET {SEQUENCE_VALUE_COLUMN} = {SEQUENCE_VALUE_COLUMN} + 1 \
                 WHERE {SEQUENCE_NAME_COLUMN} = {name}"
            ),
        }
    }

    /// Query reading the value produced by the last counter increment.
    fn sequence_value_query(&self, name: &str) -> String {
        format!(
            "SELECT {SEQUENCE_VALUE_COLUMN} FROM {SEQUENCE_TABLE} WHERE {SEQUENCE_NAME_COLUMN} = {}",
            quote_literal(name)
        )
    }

    /// DDL creating [`SEQUENCE_TABLE`] if it is missing.
    fn sequence_table_ddl(&self) -> String {
        let stmt = CreateTableStatement {
            name: SEQUENCE_TABLE.to_string(),
            if_not_exists: true,
            columns: vec![
                ColumnDef::new(SEQUENCE_NAME_COLUMN, DataType::Varchar(Some(255))).primary_key(),
                ColumnDef::new(SEQUENCE_VALUE_COLUMN, DataType::Bigint).not_null(),
            ],
            ..CreateTableStatement::default()
        };
        self.render_create_table(&stmt, false)
    }

    /// Query counting tables named by its single `?` parameter.
    fn table_exists_query(&self) -> &'static str {
        "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE UPPER(TABLE_NAME) = UPPER(?)"
    }

    /// Query listing the tables of the current schema.
    fn list_tables_query(&self) -> &'static str {
        "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES ORDER BY TABLE_NAME"
    }

    /// Query returning the server version, if the dialect has one.
    fn version_query(&self) -> Option<&'static str> {
        None
    }
}

/// Returns whether `name` is a (possibly dotted) plain identifier.
#[must_use]
pub fn is_plain_identifier(name: &str) -> bool {
    name.split('.').all(|part| {
        let mut chars = part.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    })
}

/// Rewrites `?` placeholders to `$1`, `$2`, ... skipping quoted text.
#[must_use]
pub fn numbered_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '?' => {
                index += 1;
                out.push_str(&format!("${index}"));
                continue;
            }
            None => {}
        }
        out.push(c);
    }
    out
}

fn identifiers<D: Dialect + ?Sized>(dialect: &D, names: &[String], case_sensitive: bool) -> String {
    names
        .iter()
        .map(|n| dialect.identifier(n, case_sensitive))
        .collect::<Vec<_>>()
        .join(", ")
}

fn table_ref<D: Dialect + ?Sized>(
    dialect: &D,
    schema: Option<&str>,
    name: &str,
    alias: Option<&str>,
    case_sensitive: bool,
) -> String {
    let mut sql = match schema {
        Some(s) => format!(
            "{}.{}",
            dialect.identifier(s, case_sensitive),
            dialect.identifier(name, case_sensitive)
        ),
        None => dialect.identifier(name, case_sensitive),
    };
    if let Some(alias) = alias {
        sql.push_str(" AS ");
        sql.push_str(alias);
    }
    sql
}

fn constraint_prefix<D: Dialect + ?Sized>(
    dialect: &D,
    name: Option<&str>,
    case_sensitive: bool,
) -> String {
    name.map_or_else(String::new, |n| {
        format!("CONSTRAINT {} ", dialect.identifier(n, case_sensitive))
    })
}

fn key_constraint<D: Dialect + ?Sized>(
    dialect: &D,
    keyword: &str,
    constraint: &KeyConstraint,
    case_sensitive: bool,
) -> String {
    format!(
        "{}{keyword} ({})",
        constraint_prefix(dialect, constraint.name.as_deref(), case_sensitive),
        identifiers(dialect, &constraint.columns, case_sensitive)
    )
}

/// Renders the WHERE clause; several conditions are parenthesized and ANDed.
fn where_clause(conditions: &[String]) -> String {
    match conditions {
        [] => String::new(),
        [single] => format!(" WHERE {single}"),
        many => {
            let parts: Vec<String> = many.iter().map(|c| format!("({c})")).collect();
            format!(" WHERE {}", parts.join(" AND "))
        }
    }
}

fn offset_fetch(limit: Option<u64>, offset: Option<u64>) -> String {
    match (limit, offset) {
        (None, None) => String::new(),
        (Some(n), None) => format!(" FETCH FIRST {n} ROWS ONLY"),
        (limit, Some(m)) => {
            let mut sql = format!(" OFFSET {m} ROWS");
            if let Some(n) = limit {
                sql.push_str(&format!(" FETCH NEXT {n} ROWS ONLY"));
            }
            sql
        }
    }
}

fn rownum_wrap(sql: String, limit: Option<u64>, offset: Option<u64>) -> String {
    match (limit, offset) {
        (None, None) => sql,
        (Some(n), None) => format!("SELECT * FROM ({sql}) WHERE ROWNUM <= {n}"),
        (Some(n), Some(m)) => format!(
            "SELECT * FROM (SELECT a.*, ROWNUM rnum FROM ({sql}) a WHERE ROWNUM <= {}) WHERE rnum > {m}",
            n.saturating_add(m)
        ),
        (None, Some(m)) => {
            format!("SELECT * FROM (SELECT a.*, ROWNUM rnum FROM ({sql}) a) WHERE rnum > {m}")
        }
    }
}

static DIALECTS: &[&dyn Dialect] = &[
    &GenericDialect,
    &PostgresDialect,
    &MySqlDialect,
    &SqliteDialect,
    &H2Dialect,
    &HanaDialect,
    &SqlServerDialect,
    &SybaseDialect,
    &OracleDialect,
    &DerbyDialect,
    &SnowflakeDialect,
];

/// Returns every known dialect.
#[must_use]
pub fn all() -> &'static [&'static dyn Dialect] {
    DIALECTS
}

/// Returns the dialect used when no connection or database type is given.
#[must_use]
pub fn default_dialect() -> &'static dyn Dialect {
    &GenericDialect
}

/// Resolves a product name or database type, case-insensitively.
#[must_use]
pub fn resolve(product: &str) -> Option<&'static dyn Dialect> {
    let wanted = product.trim();
    DIALECTS.iter().copied().find(|d| {
        d.name().eq_ignore_ascii_case(wanted)
            || d.aliases().iter().any(|a| a.eq_ignore_ascii_case(wanted))
    })
}

/// Returns the first name claimed by more than one dialect, if any.
#[must_use]
pub fn ambiguous_name() -> Option<&'static str> {
    let mut seen = HashSet::new();
    DIALECTS
        .iter()
        .flat_map(|d| std::iter::once(d.name()).chain(d.aliases().iter().copied()))
        .find(|name| !seen.insert(name.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves_to_its_dialect() {
        for dialect in all() {
            assert_eq!(resolve(dialect.name()).map(|d| d.name()), Some(dialect.name()));
            for alias in dialect.aliases() {
                assert_eq!(resolve(alias).map(|d| d.name()), Some(dialect.name()));
            }
        }
    }

    #[test]
    fn test_names_are_unambiguous() {
        assert_eq!(ambiguous_name(), None);
    }

    #[test]
    fn test_product_names() {
        assert_eq!(resolve("PostgreSQL").map(|d| d.name()), Some("postgresql"));
        assert_eq!(resolve("SQLite").map(|d| d.name()), Some("sqlite"));
        assert_eq!(resolve(" MySQL ").map(|d| d.name()), Some("mysql"));
        assert_eq!(resolve("MariaDB").map(|d| d.name()), Some("mysql"));
        assert_eq!(resolve("HDB").map(|d| d.name()), Some("hana"));
        assert_eq!(
            resolve("Microsoft SQL Server").map(|d| d.name()),
            Some("sqlserver")
        );
        assert!(resolve("Informix").is_none());
        assert!(resolve("").is_none());
    }

    #[test]
    fn test_plain_identifier() {
        assert!(is_plain_identifier("users"));
        assert!(is_plain_identifier("app.users"));
        assert!(is_plain_identifier("_x1$"));
        assert!(!is_plain_identifier("*"));
        assert!(!is_plain_identifier("COUNT(*)"));
        assert!(!is_plain_identifier("a b"));
        assert!(!is_plain_identifier("1abc"));
        assert!(!is_plain_identifier("a."));
    }

    #[test]
    fn test_numbered_placeholders() {
        assert_eq!(
            numbered_placeholders("SELECT * FROM T WHERE A = ? AND B = '?' AND C = ?"),
            "SELECT * FROM T WHERE A = $1 AND B = '?' AND C = $2"
        );
        assert_eq!(numbered_placeholders("SELECT \"?\" FROM T"), "SELECT \"?\" FROM T");
    }

    #[test]
    fn test_where_clause_rendering() {
        assert_eq!(where_clause(&[]), "");
        assert_eq!(where_clause(&[String::from("A = ?")]), " WHERE A = ?");
        assert_eq!(
            where_clause(&[String::from("A = ?"), String::from("B > 1")]),
            " WHERE (A = ?) AND (B > 1)"
        );
    }

    #[test]
    fn test_paging_helpers() {
        assert_eq!(offset_fetch(Some(5), None), " FETCH FIRST 5 ROWS ONLY");
        assert_eq!(
            offset_fetch(Some(5), Some(10)),
            " OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );
        assert_eq!(
            rownum_wrap(String::from("SELECT * FROM T"), Some(5), Some(10)),
            "SELECT * FROM (SELECT a.*, ROWNUM rnum FROM (SELECT * FROM T) a WHERE ROWNUM <= 15) WHERE rnum > 10"
        );
    }

    #[test]
    fn test_sequence_table_ddl() {
        assert_eq!(
            GenericDialect.sequence_table_ddl(),
            "CREATE TABLE IF NOT EXISTS SQLWEAVE_SEQUENCES (SEQUENCE_NAME VARCHAR(255) PRIMARY KEY, SEQUENCE_VALUE BIGINT NOT NULL)"
        );
    }
}
