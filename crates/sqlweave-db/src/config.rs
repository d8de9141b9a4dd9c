//! Database configuration.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};

/// Settings shared by every data source of a [`crate::Database`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database type used when a caller does not name one.
    pub default_database_type: String,
    /// Data source used when a caller does not name one.
    pub default_datasource: String,
    /// Quote identifiers in generated SQL.
    pub case_sensitive_names: bool,
    /// Maximum pooled connections per data source.
    pub max_connections: u32,
    /// Worker threads of the runtime driving the pools.
    pub worker_threads: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            default_database_type: String::from("local"),
            default_datasource: String::from("DefaultDB"),
            case_sensitive_names: false,
            max_connections: 8,
            worker_threads: 2,
        }
    }
}

impl DatabaseConfig {
    /// Reads the configuration from `SQLWEAVE_*` environment variables,
    /// keeping defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = var("SQLWEAVE_DEFAULT_DATABASE_TYPE") {
            config.default_database_type = value;
        }
        if let Some(value) = var("SQLWEAVE_DEFAULT_DATASOURCE") {
            config.default_datasource = value;
        }
        if let Some(value) = var("SQLWEAVE_NAMES_CASE_SENSITIVE") {
            config.case_sensitive_names = parse_bool("SQLWEAVE_NAMES_CASE_SENSITIVE", &value)?;
        }
        if let Some(value) = var("SQLWEAVE_MAX_CONNECTIONS") {
            config.max_connections = parse_number("SQLWEAVE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = var("SQLWEAVE_WORKER_THREADS") {
            config.worker_threads = parse_number("SQLWEAVE_WORKER_THREADS", &value)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON configuration document. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DbError::Config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_database_type.trim().is_empty() {
            return Err(DbError::Config(String::from("Default database type is empty")));
        }
        if self.default_datasource.trim().is_empty() {
            return Err(DbError::Config(String::from("Default data source is empty")));
        }
        if self.max_connections == 0 {
            return Err(DbError::Config(String::from("max_connections must be positive")));
        }
        if self.worker_threads == 0 {
            return Err(DbError::Config(String::from("worker_threads must be positive")));
        }
        Ok(())
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(DbError::Config(format!("{key}: expected a boolean, got '{value}'"))),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DbError::Config(format!("{key}: expected a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.default_database_type, "local");
        assert_eq!(config.default_datasource, "DefaultDB");
        assert!(!config.case_sensitive_names);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = DatabaseConfig::from_json(r#"{"case_sensitive_names": true}"#).unwrap();
        assert!(config.case_sensitive_names);
        assert_eq!(config.max_connections, 8);
    }

    #[test]
    fn test_from_json_rejects_zero_pool() {
        let err = DatabaseConfig::from_json(r#"{"max_connections": 0}"#).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_bool("K", "Yes").unwrap());
        assert!(parse_bool("K", "maybe").is_err());
        assert_eq!(parse_number::<u32>("K", " 4 ").unwrap(), 4);
        assert!(parse_number::<u32>("K", "four").is_err());
    }
}
