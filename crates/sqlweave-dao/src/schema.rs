//! Entity schemas.
//!
//! A DAO is configured either ORM-style:
//!
//! ```json
//! {
//!   "table": "BOOKS",
//!   "properties": [
//!     {"name": "id", "column": "BOOK_ID", "type": "INTEGER", "id": true},
//!     {"name": "title", "column": "TITLE", "type": "VARCHAR", "length": 100, "required": true}
//!   ],
//!   "associations": [
//!     {"name": "chapters", "entity": "CHAPTERS", "type": "one-to-many", "joinKey": "bookId"}
//!   ]
//! }
//! ```
//!
//! or with a table definition, whose flags may be booleans or the strings
//! `"true"`/`"false"`:
//!
//! ```json
//! {
//!   "name": "BOOKS",
//!   "type": "TABLE",
//!   "columns": [
//!     {"name": "BOOK_ID", "type": "INTEGER", "primaryKey": "true"},
//!     {"name": "TITLE", "type": "VARCHAR", "length": "100", "nullable": "false"}
//!   ]
//! }
//! ```
//!
//! Both are normalized into one [`EntitySchema`] when the DAO is created.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use sqlweave_core::DataType;
use sqlweave_db::{DbError, Result};

/// Length given to character properties declared without one.
pub const DEFAULT_LENGTH: u32 = 255;

/// ORM-style entity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrmDefinition {
    pub table: String,
    pub properties: Vec<OrmProperty>,
    #[serde(default)]
    pub associations: Vec<OrmAssociation>,
}

/// One property of an [`OrmDefinition`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrmProperty {
    pub name: String,
    /// Defaults to the property name.
    #[serde(default)]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub id: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    /// Key drawn from the entity's sequence. Defaults to true for integral
    /// primary keys that are not identity columns.
    #[serde(default)]
    pub auto_increment: Option<bool>,
    /// Key generated by the database.
    #[serde(default)]
    pub identity: bool,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub precision: Option<u16>,
    #[serde(default)]
    pub scale: Option<u16>,
}

/// One association of an [`OrmDefinition`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrmAssociation {
    pub name: String,
    /// Table of the target entity. Missing or equal to this table for a
    /// self reference.
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub join_key: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Table-definition configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub columns: Vec<ColumnDefinition>,
}

/// One column of a [`TableDefinition`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub length: Option<Value>,
    #[serde(default)]
    pub precision: Option<Value>,
    #[serde(default)]
    pub scale: Option<Value>,
    #[serde(default)]
    pub primary_key: Option<Value>,
    #[serde(default)]
    pub nullable: Option<Value>,
    #[serde(default)]
    pub unique: Option<Value>,
    #[serde(default)]
    pub identity: Option<Value>,
}

/// Either configuration shape.
#[derive(Debug, Clone)]
pub enum EntityDefinition {
    Orm(OrmDefinition),
    Table(TableDefinition),
}

impl EntityDefinition {
    /// Recognizes the configuration shape: a `table` key marks the ORM
    /// style, a `columns` key a table definition.
    pub fn from_value(config: &Value) -> Result<Self> {
        let Value::Object(object) = config else {
            return Err(DbError::DaoConfig(format!(
                "Entity configuration must be an object, got {config}"
            )));
        };
        if object.contains_key("table") {
            OrmDefinition::deserialize(config)
                .map(Self::Orm)
                .map_err(|e| DbError::DaoConfig(format!("Invalid entity configuration: {e}")))
        } else if object.contains_key("columns") {
            TableDefinition::deserialize(config)
                .map(Self::Table)
                .map_err(|e| DbError::DaoConfig(format!("Invalid table definition: {e}")))
        } else {
            Err(DbError::DaoConfig(String::from(
                "Entity configuration needs either a table and properties or a name and columns",
            )))
        }
    }

    /// Parses and recognizes a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| DbError::DaoConfig(format!("Invalid entity configuration: {e}")))?;
        Self::from_value(&value)
    }
}

/// Association cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToOne,
    ManyToOne,
    OneToMany,
}

impl Cardinality {
    fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "one-to-one" => Some(Self::OneToOne),
            "many-to-one" => Some(Self::ManyToOne),
            "one-to-many" => Some(Self::OneToMany),
            _ => None,
        }
    }

    /// Whether the association resolves to at most one target entity.
    #[must_use]
    pub const fn is_single(self) -> bool {
        matches!(self, Self::OneToOne | Self::ManyToOne)
    }
}

/// A normalized entity property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub column: String,
    pub data_type: DataType,
    pub id: bool,
    pub required: bool,
    pub unique: bool,
    pub auto_increment: bool,
    pub identity: bool,
}

impl Property {
    /// Whether the key is generated rather than supplied by the caller.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        self.auto_increment || self.identity
    }
}

/// A normalized association.
///
/// For single-valued associations `key` is the property of this entity
/// holding the target's primary key. For one-to-many associations
/// `join_key` is the property of the target holding `key` of this entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub name: String,
    pub entity: Option<String>,
    pub cardinality: Cardinality,
    pub key: String,
    pub join_key: Option<String>,
}

/// A normalized entity, immutable for the lifetime of its DAO.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    table: String,
    properties: Vec<Property>,
    primary_key: usize,
    associations: Vec<Association>,
}

impl EntitySchema {
    /// Normalizes a configuration value.
    pub fn from_value(config: &Value) -> Result<Self> {
        Self::try_from(EntityDefinition::from_value(config)?)
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Returns the primary key property.
    #[must_use]
    pub fn primary_key(&self) -> &Property {
        &self.properties[self.primary_key]
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Looks up a property by name, failing for unknown names.
    pub fn require_property(&self, name: &str) -> Result<&Property> {
        self.property(name).ok_or_else(|| {
            DbError::Validation(format!("Unknown property {name} of entity {}", self.table))
        })
    }

    /// Returns the associations.
    #[must_use]
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Looks up an association by name.
    pub fn association(&self, name: &str) -> Result<&Association> {
        self.associations
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| {
                DbError::Validation(format!("Unknown association {name} of entity {}", self.table))
            })
    }

    /// Name of the sequence generating primary keys, `<TABLE>_<KEY COLUMN>`.
    #[must_use]
    pub fn sequence_name(&self) -> String {
        format!("{}_{}", self.table, self.primary_key().column).to_uppercase()
    }

    fn new(table: String, properties: Vec<Property>, associations: Vec<Association>) -> Result<Self> {
        if table.trim().is_empty() {
            return Err(DbError::DaoConfig(String::from("Entity table name is empty")));
        }
        if properties.is_empty() {
            return Err(DbError::DaoConfig(format!("Entity {table} has no properties")));
        }
        let mut names = HashSet::new();
        for property in &properties {
            if !names.insert(property.name.as_str()) {
                return Err(DbError::DaoConfig(format!(
                    "Entity {table} declares property {} twice",
                    property.name
                )));
            }
        }
        let keys: Vec<usize> = properties
            .iter()
            .enumerate()
            .filter(|(_, p)| p.id)
            .map(|(i, _)| i)
            .collect();
        let primary_key = match keys.as_slice() {
            [key] => *key,
            [] => {
                return Err(DbError::DaoConfig(format!("Entity {table} has no primary key")));
            }
            _ => {
                return Err(DbError::DaoConfig(format!(
                    "Entity {table} declares a composite primary key"
                )));
            }
        };
        let schema = Self {
            table,
            properties,
            primary_key,
            associations,
        };
        for association in &schema.associations {
            if schema.property(&association.key).is_none() {
                return Err(DbError::DaoConfig(format!(
                    "Association {} of entity {} refers to unknown property {}",
                    association.name, schema.table, association.key
                )));
            }
        }
        Ok(schema)
    }
}

impl TryFrom<EntityDefinition> for EntitySchema {
    type Error = DbError;

    fn try_from(definition: EntityDefinition) -> Result<Self> {
        match definition {
            EntityDefinition::Orm(orm) => Self::try_from(orm),
            EntityDefinition::Table(table) => Self::try_from(table),
        }
    }
}

impl TryFrom<OrmDefinition> for EntitySchema {
    type Error = DbError;

    fn try_from(orm: OrmDefinition) -> Result<Self> {
        let properties = orm
            .properties
            .iter()
            .map(|p| {
                let data_type = property_type(&p.type_name, p.length, p.precision, p.scale)
                    .ok_or_else(|| unknown_type(&orm.table, &p.name, &p.type_name))?;
                let auto_increment = p.id
                    && !p.identity
                    && p.auto_increment.unwrap_or_else(|| data_type.is_integral());
                Ok(Property {
                    name: p.name.clone(),
                    column: p.column.clone().unwrap_or_else(|| p.name.clone()),
                    data_type,
                    id: p.id,
                    required: p.required || p.id,
                    unique: p.unique,
                    auto_increment,
                    identity: p.id && p.identity,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let primary_key = properties.iter().find(|p| p.id).map(|p| p.name.clone());
        let associations = orm
            .associations
            .iter()
            .map(|a| association(&orm.table, a, primary_key.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        Self::new(orm.table, properties, associations)
    }
}

impl TryFrom<TableDefinition> for EntitySchema {
    type Error = DbError;

    fn try_from(table: TableDefinition) -> Result<Self> {
        if let Some(kind) = &table.kind {
            if !kind.eq_ignore_ascii_case("TABLE") && !kind.eq_ignore_ascii_case("VIEW") {
                return Err(DbError::DaoConfig(format!(
                    "Definition {} has unsupported type {kind}",
                    table.name
                )));
            }
        }
        let properties = table
            .columns
            .iter()
            .map(|c| {
                let length = c.length.as_ref().and_then(positive);
                let precision = c.precision.as_ref().and_then(positive);
                let scale = c.scale.as_ref().and_then(positive);
                let data_type = property_type(
                    &c.type_name,
                    length,
                    precision.and_then(|n| u16::try_from(n).ok()),
                    scale.and_then(|n| u16::try_from(n).ok()),
                )
                .ok_or_else(|| unknown_type(&table.name, &c.name, &c.type_name))?;
                let id = flag(c.primary_key.as_ref());
                let identity = id && flag(c.identity.as_ref());
                Ok(Property {
                    name: camel_case(&c.name),
                    column: c.name.clone(),
                    id,
                    required: id || c.nullable.as_ref().is_some_and(|v| !flag(Some(v))),
                    unique: flag(c.unique.as_ref()),
                    auto_increment: id && !identity && data_type.is_integral(),
                    identity,
                    data_type,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(table.name, properties, Vec::new())
    }
}

fn association(
    table: &str,
    config: &OrmAssociation,
    primary_key: Option<&str>,
) -> Result<Association> {
    let cardinality = Cardinality::parse(&config.kind).ok_or_else(|| {
        DbError::DaoConfig(format!(
            "Association {} of entity {table} has unsupported type {}",
            config.name, config.kind
        ))
    })?;
    let missing = |what: &str| {
        DbError::DaoConfig(format!(
            "Association {} of entity {table} needs a {what}",
            config.name
        ))
    };
    let (key, join_key) = if cardinality.is_single() {
        let key = config
            .key
            .clone()
            .or_else(|| config.join_key.clone())
            .ok_or_else(|| missing("key"))?;
        (key, None)
    } else {
        let join_key = config.join_key.clone().ok_or_else(|| missing("joinKey"))?;
        let key = config
            .key
            .clone()
            .or_else(|| primary_key.map(String::from))
            .ok_or_else(|| missing("key"))?;
        (key, Some(join_key))
    };
    Ok(Association {
        name: config.name.clone(),
        entity: config.entity.clone(),
        cardinality,
        key,
        join_key,
    })
}

fn unknown_type(table: &str, property: &str, type_name: &str) -> DbError {
    DbError::DaoConfig(format!(
        "Property {property} of entity {table} has unknown type {type_name}"
    ))
}

/// Resolves a property type from its SQL name or a Java-style alias such
/// as `String` or `Long`.
#[must_use]
pub fn property_type(
    name: &str,
    length: Option<u32>,
    precision: Option<u16>,
    scale: Option<u16>,
) -> Option<DataType> {
    let data_type = match name.trim().to_ascii_uppercase().as_str() {
        "STRING" => DataType::Varchar(length),
        "LONG" => DataType::Bigint,
        "SHORT" => DataType::Smallint,
        "BYTE" => DataType::Tinyint,
        "BIGDECIMAL" => DataType::Decimal { precision, scale },
        "BYTES" => DataType::Blob,
        _ => DataType::from_name(name, length, precision, scale)?,
    };
    Some(match data_type {
        DataType::Varchar(None) => DataType::Varchar(Some(DEFAULT_LENGTH)),
        DataType::Nvarchar(None) => DataType::Nvarchar(Some(DEFAULT_LENGTH)),
        other => other,
    })
}

/// Reads a boolean flag given as a JSON boolean or string.
fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Reads a positive number given as a JSON number or string.
fn positive(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (n > 0).then_some(n)
}

/// Derives a property name from a column name: `BOOK_ID` becomes `bookId`.
#[must_use]
pub fn camel_case(column: &str) -> String {
    let mut name = String::with_capacity(column.len());
    let mut upper = false;
    for c in column.chars() {
        if c == '_' || c == ' ' {
            upper = !name.is_empty();
        } else if upper {
            name.extend(c.to_uppercase());
            upper = false;
        } else {
            name.extend(c.to_lowercase());
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlweave_db::ErrorKind;

    fn books() -> Value {
        json!({
            "table": "BOOKS",
            "properties": [
                {"name": "id", "column": "BOOK_ID", "type": "INTEGER", "id": true},
                {"name": "title", "column": "TITLE", "type": "VARCHAR", "length": 100, "required": true},
                {"name": "price", "column": "PRICE", "type": "DECIMAL", "precision": 10, "scale": 2},
                {"name": "author", "column": "AUTHOR_ID", "type": "INTEGER"}
            ],
            "associations": [
                {"name": "chapters", "entity": "CHAPTERS", "type": "one-to-many", "joinKey": "bookId"},
                {"name": "writer", "entity": "AUTHORS", "type": "many-to-one", "key": "author"}
            ]
        })
    }

    #[test]
    fn test_orm_definition() {
        let schema = EntitySchema::from_value(&books()).unwrap();
        assert_eq!(schema.table(), "BOOKS");
        assert_eq!(schema.properties().len(), 4);

        let pk = schema.primary_key();
        assert_eq!(pk.name, "id");
        assert_eq!(pk.column, "BOOK_ID");
        assert!(pk.auto_increment);
        assert!(pk.required);
        assert_eq!(schema.sequence_name(), "BOOKS_BOOK_ID");

        let title = schema.property("title").unwrap();
        assert_eq!(title.data_type, DataType::Varchar(Some(100)));
        assert!(title.required);
        assert_eq!(
            schema.property("price").unwrap().data_type,
            DataType::Decimal {
                precision: Some(10),
                scale: Some(2)
            }
        );
    }

    #[test]
    fn test_associations() {
        let schema = EntitySchema::from_value(&books()).unwrap();
        let chapters = schema.association("chapters").unwrap();
        assert_eq!(chapters.cardinality, Cardinality::OneToMany);
        assert_eq!(chapters.key, "id");
        assert_eq!(chapters.join_key.as_deref(), Some("bookId"));

        let writer = schema.association("writer").unwrap();
        assert!(writer.cardinality.is_single());
        assert_eq!(writer.key, "author");

        let err = schema.association("reviews").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_table_definition() {
        let config = json!({
            "name": "ORDER_ITEMS",
            "type": "TABLE",
            "columns": [
                {"name": "ITEM_ID", "type": "INTEGER", "length": "0", "primaryKey": "true", "nullable": "false"},
                {"name": "PRODUCT_NAME", "type": "VARCHAR", "length": "40", "nullable": "false"},
                {"name": "IN_STOCK", "type": "BOOLEAN", "nullable": true}
            ]
        });
        let schema = EntitySchema::from_value(&config).unwrap();
        assert_eq!(schema.primary_key().name, "itemId");
        assert!(schema.primary_key().auto_increment);

        let name = schema.property("productName").unwrap();
        assert_eq!(name.column, "PRODUCT_NAME");
        assert_eq!(name.data_type, DataType::Varchar(Some(40)));
        assert!(name.required);
        assert!(!schema.property("inStock").unwrap().required);
    }

    #[test]
    fn test_missing_primary_key() {
        let config = json!({
            "table": "NOTES",
            "properties": [{"name": "text", "type": "VARCHAR"}]
        });
        let err = EntitySchema::from_value(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DaoConfig);
        assert!(err.to_string().contains("no primary key"));
    }

    #[test]
    fn test_malformed_configurations() {
        let cases = [
            json!("BOOKS"),
            json!({"table": "BOOKS"}),
            json!({"table": "BOOKS", "properties": {"id": "INTEGER"}}),
            json!({"table": "BOOKS", "properties": [{"name": "id", "type": "GEOMETRY", "id": true}]}),
            json!({"table": "BOOKS", "properties": []}),
            json!({"rows": []}),
            json!({
                "table": "BOOKS",
                "properties": [
                    {"name": "id", "type": "INTEGER", "id": true},
                    {"name": "id", "type": "INTEGER"}
                ]
            }),
            json!({
                "table": "BOOKS",
                "properties": [
                    {"name": "a", "type": "INTEGER", "id": true},
                    {"name": "b", "type": "INTEGER", "id": true}
                ]
            }),
            json!({
                "table": "BOOKS",
                "properties": [{"name": "id", "type": "INTEGER", "id": true}],
                "associations": [{"name": "tags", "type": "many-to-many", "joinKey": "bookId"}]
            }),
            json!({
                "table": "BOOKS",
                "properties": [{"name": "id", "type": "INTEGER", "id": true}],
                "associations": [{"name": "writer", "type": "many-to-one", "key": "author"}]
            }),
        ];
        for config in cases {
            let err = EntitySchema::from_value(&config).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DaoConfig, "{config}");
        }
    }

    #[test]
    fn test_key_generation_flags() {
        let config = json!({
            "table": "CODES",
            "properties": [{"name": "code", "type": "VARCHAR", "length": 8, "id": true}]
        });
        let schema = EntitySchema::from_value(&config).unwrap();
        assert!(!schema.primary_key().is_generated());

        let config = json!({
            "table": "EVENTS",
            "properties": [{"name": "id", "type": "BIGINT", "id": true, "identity": true}]
        });
        let pk = EntitySchema::from_value(&config).unwrap().primary_key().clone();
        assert!(pk.identity);
        assert!(!pk.auto_increment);
        assert!(pk.is_generated());
    }

    #[test]
    fn test_property_type_aliases() {
        assert_eq!(
            property_type("String", None, None, None),
            Some(DataType::Varchar(Some(DEFAULT_LENGTH)))
        );
        assert_eq!(property_type("Long", None, None, None), Some(DataType::Bigint));
        assert_eq!(property_type("int", None, None, None), Some(DataType::Integer));
        assert_eq!(property_type("POINT", None, None, None), None);
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("BOOK_ID"), "bookId");
        assert_eq!(camel_case("TITLE"), "title");
        assert_eq!(camel_case("_ORDER_LINE_NO"), "orderLineNo");
    }
}
