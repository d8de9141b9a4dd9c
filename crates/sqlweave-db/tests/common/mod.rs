//! Shared helpers for integration tests.

#![allow(dead_code)]

use sqlweave_db::{Connection, DataSourceDescriptor, Database, DatabaseConfig};
use tempfile::TempDir;

/// A database with one SQLite data source named `DefaultDB` in a
/// temporary directory.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        Self::with_config(DatabaseConfig::default())
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::new(config).expect("Failed to create database");
        db.register(DataSourceDescriptor::new("DefaultDB", "sqlite", sqlite_url(&dir, "test.db")))
            .expect("Failed to register data source");
        Self { db, _dir: dir }
    }

    pub fn connection(&self) -> Connection {
        self.db
            .connection(None, None)
            .expect("Failed to get connection")
    }

    pub fn execute(&self, sql: &str) {
        self.db
            .update(sql, &[], None, None)
            .unwrap_or_else(|e| panic!("Failed to execute {sql}: {e}"));
    }
}

/// URL of a SQLite file in `dir`, created on first connect.
pub fn sqlite_url(dir: &TempDir, file: &str) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join(file).display())
}
