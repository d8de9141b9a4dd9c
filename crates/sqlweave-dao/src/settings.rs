//! List query settings.
//!
//! [`QuerySettings::parse`] reads the `&`-separated form used by callers of
//! [`Dao::list`](crate::Dao::list):
//!
//! ```text
//! $select=id,title&$sort=title&$order=desc&$limit=10&$offset=20
//! $filter=price gt 10;title contains rust
//! author=7
//! ```
//!
//! A key without a `$` prefix is an equality condition on that property.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use sqlweave_db::{DbError, Result};

const CONDITION: &str =
    r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s+(eq|ne|gt|ge|lt|le|contains|like|null|notnull)\b\s*(.*?)\s*$";

/// Condition operator of a `$filter` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    Like,
    Null,
    NotNull,
}

impl Operator {
    fn parse(op: &str) -> Option<Self> {
        let op = match op {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "contains" => Self::Contains,
            "like" => Self::Like,
            "null" => Self::Null,
            "notnull" => Self::NotNull,
            _ => return None,
        };
        Some(op)
    }

    /// Whether the operator compares against a value.
    #[must_use]
    pub const fn takes_value(self) -> bool {
        !matches!(self, Self::Null | Self::NotNull)
    }
}

/// One filter condition on an entity property.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub property: String,
    pub operator: Operator,
    /// Converted to the property's type when the query is built.
    pub value: Value,
}

/// Sort direction applied to all `$sort` properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Selection, filtering, ordering and paging of a DAO listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySettings {
    pub select: Vec<String>,
    pub expand: Vec<String>,
    pub sort: Vec<String>,
    pub order: SortOrder,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub conditions: Vec<Condition>,
}

impl QuerySettings {
    /// Creates empty settings, listing every entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the `key=value&key=value` form.
    pub fn parse(query: &str) -> Result<Self> {
        let mut settings = Self::new();
        for pair in query.split('&').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                DbError::Validation(format!("Query setting without a value: {pair}"))
            })?;
            let (key, value) = (key.trim(), value.trim());
            match key {
                "$select" => settings.select = list(value),
                "$expand" => settings.expand = list(value),
                "$sort" => settings.sort = list(value),
                "$order" => {
                    settings.order = match value.to_ascii_lowercase().as_str() {
                        "asc" => SortOrder::Asc,
                        "desc" => SortOrder::Desc,
                        _ => {
                            return Err(DbError::Validation(format!(
                                "Sort order must be asc or desc, got {value}"
                            )));
                        }
                    }
                }
                "$limit" => settings.limit = Some(number(key, value)?),
                "$offset" => settings.offset = Some(number(key, value)?),
                "$filter" => {
                    for condition in value.split(';').filter(|c| !c.trim().is_empty()) {
                        settings.conditions.push(parse_condition(condition)?);
                    }
                }
                _ if key.starts_with('$') => {
                    return Err(DbError::Validation(format!("Unknown query setting {key}")));
                }
                _ => settings.conditions.push(Condition {
                    property: key.to_string(),
                    operator: Operator::Eq,
                    value: Value::String(value.to_string()),
                }),
            }
        }
        Ok(settings)
    }

    /// Adds a condition.
    #[must_use]
    pub fn filter(mut self, property: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            property: property.to_string(),
            operator,
            value: value.into(),
        });
        self
    }

    /// Adds an equality condition.
    #[must_use]
    pub fn filter_eq(self, property: &str, value: impl Into<Value>) -> Self {
        self.filter(property, Operator::Eq, value)
    }

    /// Restricts the returned properties.
    #[must_use]
    pub fn select<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Inlines the named associations.
    #[must_use]
    pub fn expand<I, S>(mut self, associations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expand = associations.into_iter().map(Into::into).collect();
        self
    }

    /// Orders by the given properties.
    #[must_use]
    pub fn sort<I, S>(mut self, properties: I, order: SortOrder) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = properties.into_iter().map(Into::into).collect();
        self.order = order;
        self
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, limit: Option<u64>, offset: Option<u64>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

impl FromStr for QuerySettings {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn number(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| DbError::Validation(format!("{key} must be a non-negative integer, got {value}")))
}

fn condition_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(pattern) = PATTERN.get() {
        return Ok(pattern);
    }
    let compiled = Regex::new(CONDITION).map_err(|e| DbError::Validation(e.to_string()))?;
    Ok(PATTERN.get_or_init(|| compiled))
}

fn parse_condition(condition: &str) -> Result<Condition> {
    let invalid = || DbError::Validation(format!("Invalid filter condition: {}", condition.trim()));
    let captures = condition_pattern()?.captures(condition).ok_or_else(invalid)?;
    let operator = Operator::parse(&captures[2]).ok_or_else(invalid)?;
    let value = captures.get(3).map_or("", |m| m.as_str());
    let value = match (operator.takes_value(), value.is_empty()) {
        (true, false) => Value::String(value.to_string()),
        (false, true) => Value::Null,
        _ => return Err(invalid()),
    };
    Ok(Condition {
        property: captures[1].to_string(),
        operator,
        value,
    })
}
