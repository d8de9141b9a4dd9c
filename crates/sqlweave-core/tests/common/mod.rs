#![allow(dead_code)]

use sqlweave_core::builder::SqlBuilder;
use sqlweave_core::dialect::{self, Dialect};

pub fn dialect(name: &str) -> &'static dyn Dialect {
    dialect::resolve(name).unwrap_or_else(|| panic!("Unknown dialect: {name}"))
}

pub fn builder(name: &str) -> SqlBuilder {
    SqlBuilder::new(dialect(name))
}

pub fn quoted(name: &str) -> SqlBuilder {
    builder(name).case_sensitive(true)
}

/// Asserts that every `?` of `sql` is matched by one parameter.
pub fn assert_placeholders(sql: &str, params: usize) {
    let count = sql.matches('?').count();
    assert_eq!(
        count, params,
        "Placeholder mismatch.\n  SQL:    {sql}\n  Params: {params}"
    );
}
