//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use sqlweave_dao::Dao;
use sqlweave_db::{DataSourceDescriptor, Database, DatabaseConfig};
use tempfile::TempDir;

/// A database with one SQLite data source named `DefaultDB` in a
/// temporary directory.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::new(DatabaseConfig::default()).expect("Failed to create database");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        db.register(DataSourceDescriptor::new("DefaultDB", "sqlite", url))
            .expect("Failed to register data source");
        Self { db, _dir: dir }
    }

    /// Creates a DAO without touching the database.
    pub fn open(&self, config: &Value) -> Dao<'_> {
        Dao::new(&self.db, config, None).expect("Failed to create DAO")
    }

    /// Creates a DAO and its table.
    pub fn dao(&self, config: &Value) -> Dao<'_> {
        let dao = self.open(config);
        dao.create_table().expect("Failed to create table");
        dao
    }

    /// Books with a many-to-one author and one-to-many chapters, all tables
    /// created.
    pub fn library(&self) -> Dao<'_> {
        let authors = Arc::new(self.dao(&authors_config()));
        let chapters = Arc::new(self.dao(&chapters_config()));
        let mut books = self.dao(&books_config());
        books
            .bind_association("author", authors)
            .expect("Failed to bind author")
            .bind_association("chapters", chapters)
            .expect("Failed to bind chapters");
        books
    }
}

pub fn books_config() -> Value {
    json!({
        "table": "BOOKS",
        "properties": [
            {"name": "id", "column": "BOOK_ID", "type": "INTEGER", "id": true},
            {"name": "title", "column": "TITLE", "type": "VARCHAR", "length": 100, "required": true},
            {"name": "price", "column": "PRICE", "type": "INTEGER"},
            {"name": "available", "column": "AVAILABLE", "type": "BOOLEAN", "required": true},
            {"name": "authorId", "column": "AUTHOR_ID", "type": "INTEGER"}
        ],
        "associations": [
            {"name": "author", "entity": "AUTHORS", "type": "many-to-one", "key": "authorId"},
            {"name": "chapters", "entity": "CHAPTERS", "type": "one-to-many", "joinKey": "bookId"}
        ]
    })
}

pub fn authors_config() -> Value {
    json!({
        "table": "AUTHORS",
        "properties": [
            {"name": "id", "column": "AUTHOR_ID", "type": "INTEGER", "id": true},
            {"name": "name", "column": "NAME", "type": "String", "required": true, "unique": true}
        ]
    })
}

pub fn chapters_config() -> Value {
    json!({
        "table": "CHAPTERS",
        "properties": [
            {"name": "id", "column": "CHAPTER_ID", "type": "INTEGER", "id": true},
            {"name": "bookId", "column": "BOOK_ID", "type": "INTEGER", "required": true},
            {"name": "title", "column": "TITLE", "type": "VARCHAR", "length": 100}
        ]
    })
}
