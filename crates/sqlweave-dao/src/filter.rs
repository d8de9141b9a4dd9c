//! Q objects for DAO filter expressions.
//!
//! Q objects combine conditions with AND, OR and NOT and render them to a
//! WHERE fragment with `?` placeholders plus the values to bind, in
//! placeholder order. Field names are written verbatim, so callers pass
//! identifiers already rendered for their dialect.

use std::fmt;

use sqlweave_core::{SqlValue, ToSqlValue};

/// A filter expression that can be combined with other expressions.
///
/// # Example
///
/// ```rust
/// use sqlweave_dao::Q;
///
/// let (sql, params) = Q::eq("STATUS", "active")
///     .and(Q::gt("AGE", 18).or(Q::is_null("AGE")))
///     .build();
///
/// assert_eq!(sql, "(STATUS = ?) AND ((AGE > ?) OR (AGE IS NULL))");
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Q {
    expr: FilterExpr,
}

/// Filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `field op ?`
    Comparison {
        field: String,
        op: CompareOp,
        value: SqlValue,
    },
    /// `field IS NULL`
    IsNull { field: String },
    /// `field IS NOT NULL`
    IsNotNull { field: String },
    /// `field IN (?, ..)`
    InList {
        field: String,
        values: Vec<SqlValue>,
    },
    /// `field LIKE ?`
    Like { field: String, pattern: String },
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl Q {
    /// Creates a comparison `field op value`.
    #[must_use]
    pub fn compare<V: ToSqlValue>(field: &str, op: CompareOp, value: V) -> Self {
        Self {
            expr: FilterExpr::Comparison {
                field: field.to_string(),
                op,
                value: value.to_sql_value(),
            },
        }
    }

    /// `field = value`
    #[must_use]
    pub fn eq<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// `field <> value`
    #[must_use]
    pub fn ne<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// `field > value`
    #[must_use]
    pub fn gt<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    /// `field >= value`
    #[must_use]
    pub fn gte<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    /// `field < value`
    #[must_use]
    pub fn lt<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    /// `field <= value`
    #[must_use]
    pub fn lte<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    /// Creates an IS NULL filter.
    #[must_use]
    pub fn is_null(field: &str) -> Self {
        Self {
            expr: FilterExpr::IsNull {
                field: field.to_string(),
            },
        }
    }

    /// Creates an IS NOT NULL filter.
    #[must_use]
    pub fn is_not_null(field: &str) -> Self {
        Self {
            expr: FilterExpr::IsNotNull {
                field: field.to_string(),
            },
        }
    }

    /// Creates an IN list filter. An empty list matches nothing.
    #[must_use]
    pub fn in_list<V: ToSqlValue>(field: &str, values: Vec<V>) -> Self {
        Self {
            expr: FilterExpr::InList {
                field: field.to_string(),
                values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            },
        }
    }

    /// Creates a LIKE filter; `%` and `_` are wildcards.
    #[must_use]
    pub fn like(field: &str, pattern: &str) -> Self {
        Self {
            expr: FilterExpr::Like {
                field: field.to_string(),
                pattern: pattern.to_string(),
            },
        }
    }

    /// Creates a contains filter (LIKE %value%).
    #[must_use]
    pub fn contains(field: &str, value: &str) -> Self {
        Self::like(field, &format!("%{value}%"))
    }

    /// Combines this filter with another using AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self {
            expr: FilterExpr::And(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Combines this filter with another using OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            expr: FilterExpr::Or(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Negates this filter with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self {
            expr: FilterExpr::Not(Box::new(self.expr)),
        }
    }

    /// ANDs all filters together; `None` when there are none.
    #[must_use]
    pub fn all<I: IntoIterator<Item = Self>>(filters: I) -> Option<Self> {
        filters.into_iter().reduce(Self::and)
    }

    /// Returns the expression tree.
    #[must_use]
    pub fn into_expr(self) -> FilterExpr {
        self.expr
    }

    /// Renders the WHERE fragment and its parameters.
    #[must_use]
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.expr.render(&mut sql, &mut params);
        (sql, params)
    }
}

impl From<Q> for FilterExpr {
    fn from(q: Q) -> Self {
        q.expr
    }
}

impl FilterExpr {
    fn render(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        match self {
            Self::Comparison { field, op, value } => {
                sql.push_str(&format!("{field} {op} ?"));
                params.push(value.clone());
            }
            Self::IsNull { field } => sql.push_str(&format!("{field} IS NULL")),
            Self::IsNotNull { field } => sql.push_str(&format!("{field} IS NOT NULL")),
            Self::InList { field, values } if values.is_empty() => {
                sql.push_str(&format!("{field} IN (NULL)"));
            }
            Self::InList { field, values } => {
                let placeholders = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!("{field} IN ({placeholders})"));
                params.extend(values.iter().cloned());
            }
            Self::Like { field, pattern } => {
                sql.push_str(&format!("{field} LIKE ?"));
                params.push(SqlValue::Text(pattern.clone()));
            }
            Self::And(left, right) => Self::binary(left, "AND", right, sql, params),
            Self::Or(left, right) => Self::binary(left, "OR", right, sql, params),
            Self::Not(inner) => {
                sql.push_str("NOT (");
                inner.render(sql, params);
                sql.push(')');
            }
        }
    }

    fn binary(left: &Self, op: &str, right: &Self, sql: &mut String, params: &mut Vec<SqlValue>) {
        sql.push('(');
        left.render(sql, params);
        sql.push_str(&format!(") {op} ("));
        right.render(sql, params);
        sql.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_eq() {
        let (sql, params) = Q::eq("NAME", "Alice").build();
        assert_eq!(sql, "NAME = ?");
        assert_eq!(params, vec![SqlValue::Text(String::from("Alice"))]);
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(Q::ne("A", 1).build().0, "A <> ?");
        assert_eq!(Q::gt("A", 1).build().0, "A > ?");
        assert_eq!(Q::gte("A", 1).build().0, "A >= ?");
        assert_eq!(Q::lt("A", 1).build().0, "A < ?");
        assert_eq!(Q::lte("A", 1).build().0, "A <= ?");
    }

    #[test]
    fn test_null_checks() {
        let (sql, params) = Q::is_null("DELETED_AT").build();
        assert_eq!(sql, "DELETED_AT IS NULL");
        assert!(params.is_empty());
        assert_eq!(Q::is_not_null("EMAIL").build().0, "EMAIL IS NOT NULL");
    }

    #[test]
    fn test_in_list() {
        let (sql, params) = Q::in_list("STATUS", vec!["a", "b", "c"]).build();
        assert_eq!(sql, "STATUS IN (?, ?, ?)");
        assert_eq!(params.len(), 3);

        let (sql, params) = Q::in_list::<i64>("ID", vec![]).build();
        assert_eq!(sql, "ID IN (NULL)");
        assert!(params.is_empty());
    }

    #[test]
    fn test_contains() {
        let (sql, params) = Q::contains("TITLE", "rust").build();
        assert_eq!(sql, "TITLE LIKE ?");
        assert_eq!(params, vec![SqlValue::Text(String::from("%rust%"))]);
    }

    #[test]
    fn test_and_or_not() {
        let (sql, params) = Q::eq("A", 1).and(Q::eq("B", 2)).or(Q::eq("C", 3).not()).build();
        assert_eq!(sql, "((A = ?) AND (B = ?)) OR (NOT (C = ?))");
        assert_eq!(
            params,
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
        );
    }

    #[test]
    fn test_all() {
        assert!(Q::all(Vec::new()).is_none());
        let q = Q::all(vec![Q::eq("A", 1), Q::eq("B", 2), Q::is_null("C")]).unwrap();
        assert_eq!(q.build().0, "((A = ?) AND (B = ?)) AND (C IS NULL)");
    }
}
