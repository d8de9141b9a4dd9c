//! Generic data access object.
//!
//! A [`Dao`] performs CRUD and schema operations for one entity described
//! by an [`EntitySchema`]. Entities are JSON objects keyed by property name.
//!
//! Associations named in `expand` are resolved with one query per
//! association and context entity. Each operation checks out its own
//! connection and returns it before recursing into associated DAOs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use sqlweave_core::dialect::Paging;
use sqlweave_core::{ColumnDef, DataType, SqlBuilder, SqlValue};
use sqlweave_db::{sequence, Connection, Database, DbError, Param, Parameters, ResultSet, Result};
use tracing::span::EnteredSpan;
use tracing::{debug, debug_span, info, warn};

use crate::convert::{to_param, to_sql, to_value};
use crate::filter::Q;
use crate::schema::{Association, Cardinality, EntitySchema, Property};
use crate::settings::{Condition, Operator, QuerySettings, SortOrder};

/// An entity: property name to JSON value.
pub type Entity = Map<String, Value>;

/// Creates a DAO on the process-wide [`Database`].
pub fn create(config: &Value, logger_name: Option<&str>) -> Result<Dao<'static>> {
    Dao::new(Database::global()?, config, logger_name)
}

/// CRUD and schema operations for one entity.
pub struct Dao<'db> {
    db: &'db Database,
    schema: EntitySchema,
    logger: String,
    database_type: Option<String>,
    data_source: Option<String>,
    targets: HashMap<String, Arc<Dao<'db>>>,
}

impl fmt::Debug for Dao<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dao")
            .field("table", &self.schema.table())
            .field("logger", &self.logger)
            .field("database_type", &self.database_type)
            .field("data_source", &self.data_source)
            .field("targets", &self.targets.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<'db> Dao<'db> {
    /// Creates a DAO from an ORM-style configuration or a table definition.
    ///
    /// The logger name defaults to `db.dao.<table in lower case>`.
    pub fn new(db: &'db Database, config: &Value, logger_name: Option<&str>) -> Result<Self> {
        Ok(Self::from_schema(db, EntitySchema::from_value(config)?, logger_name))
    }

    /// Creates a DAO from an already normalized schema.
    #[must_use]
    pub fn from_schema(db: &'db Database, schema: EntitySchema, logger_name: Option<&str>) -> Self {
        let logger = logger_name.map_or_else(
            || format!("db.dao.{}", schema.table().to_lowercase()),
            String::from,
        );
        Self {
            db,
            schema,
            logger,
            database_type: None,
            data_source: None,
            targets: HashMap::new(),
        }
    }

    /// Runs against the given database type and data source instead of the
    /// defaults.
    #[must_use]
    pub fn with_data_source(mut self, database_type: Option<&str>, data_source: Option<&str>) -> Self {
        self.database_type = database_type.map(String::from);
        self.data_source = data_source.map(String::from);
        self
    }

    /// Binds the DAO of an association's target entity.
    ///
    /// Unbound associations resolve to this DAO when they name no entity
    /// or this DAO's own table.
    pub fn bind_association(&mut self, name: &str, target: Arc<Self>) -> Result<&mut Self> {
        self.schema.association(name)?;
        self.targets.insert(name.to_string(), target);
        Ok(self)
    }

    /// Returns the entity schema.
    #[must_use]
    pub const fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Returns the logger name.
    #[must_use]
    pub fn logger(&self) -> &str {
        &self.logger
    }

    fn span(&self) -> EnteredSpan {
        debug_span!("dao", logger = %self.logger).entered()
    }

    fn connection(&self) -> Result<Connection> {
        self.db
            .connection(self.database_type.as_deref(), self.data_source.as_deref())
    }

    fn target(&self, association: &Association) -> Result<&Self> {
        if let Some(target) = self.targets.get(&association.name) {
            return Ok(target.as_ref());
        }
        let is_self = association
            .entity
            .as_deref()
            .is_none_or(|entity| entity.eq_ignore_ascii_case(self.schema.table()));
        if is_self {
            Ok(self)
        } else {
            Err(DbError::DaoConfig(format!(
                "Association {} of entity {} has no bound DAO",
                association.name,
                self.schema.table()
            )))
        }
    }

    /// Creates the entity's table.
    pub fn create_table(&self) -> Result<&Self> {
        let _span = self.span();
        let table = self.schema.table();
        let conn = self.connection()?;
        let mut create = conn.sql().create().table(table);
        for property in self.schema.properties() {
            create.column(column_def(property));
        }
        match conn.update(&create.build(), &[]) {
            Ok(_) => {
                info!(table = %table, "Table created");
                Ok(self)
            }
            Err(e) if e.is_already_exists() => Err(DbError::Schema(format!(
                "Table {table} already exists: {e}"
            ))),
            Err(e) => Err(e),
        }
    }

    /// Drops the entity's table and, when asked, its key sequence.
    pub fn drop_table(&self, drop_id_sequence: bool) -> Result<&Self> {
        let _span = self.span();
        let table = self.schema.table();
        let conn = self.connection()?;
        let sql = conn.sql().drop().table(table).build();
        match conn.update(&sql, &[]) {
            Ok(_) => info!(table = %table, "Table dropped"),
            Err(e) if e.is_missing_object() => {
                return Err(DbError::Schema(format!("Table {table} does not exist: {e}")));
            }
            Err(e) => return Err(e),
        }
        if drop_id_sequence {
            sequence::drop(&conn, &self.schema.sequence_name())?;
        }
        Ok(self)
    }

    /// Checks whether the entity's table exists.
    pub fn exists_table(&self) -> Result<bool> {
        let _span = self.span();
        let conn = self.connection()?;
        let dialect = conn.dialect();
        let name = if conn.is_case_sensitive() {
            self.schema.table().to_string()
        } else {
            dialect.fold_case(self.schema.table())
        };
        let mut rs = conn.query(dialect.table_exists_query(), &[Param::from(name)])?;
        let exists = rs.next()? && rs.get::<i64>(1_usize)?.unwrap_or(0) > 0;
        Ok(exists)
    }

    /// Inserts one entity object or an array of them, returning the key or
    /// the keys in input order.
    pub fn insert(&self, entity: &Value) -> Result<Value> {
        match entity {
            Value::Array(items) => items
                .iter()
                .map(|item| self.insert(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(object) => self.insert_one(object),
            other => Err(DbError::Validation(format!(
                "Entity of {} must be an object, got {other}",
                self.schema.table()
            ))),
        }
    }

    /// Inserts entities in order, returning their keys.
    pub fn insert_many(&self, entities: &[Entity]) -> Result<Vec<Value>> {
        entities.iter().map(|entity| self.insert_one(entity)).collect()
    }

    /// Inserts one entity and the one-to-many children it carries inline.
    ///
    /// Sequence-generated keys are drawn from `<TABLE>_<KEY COLUMN>`,
    /// created on first use after the largest key already stored.
    pub fn insert_one(&self, entity: &Entity) -> Result<Value> {
        let _span = self.span();
        self.validate(entity, false)?;
        let key = {
            let conn = self.connection()?;
            self.insert_row(&conn, entity)?
        };
        debug!(table = %self.schema.table(), id = %key, "Entity inserted");

        if let Err(e) = self.insert_children(entity, &key) {
            warn!(table = %self.schema.table(), id = %key, error = %e, "Inserting dependents failed, removing entity");
            if let Err(cleanup) = self.remove_one(&key) {
                warn!(table = %self.schema.table(), id = %key, error = %cleanup, "Removing entity failed");
            }
            return Err(e);
        }
        Ok(key)
    }

    fn insert_row(&self, conn: &Connection, entity: &Entity) -> Result<Value> {
        let pk = self.schema.primary_key();
        let key = if pk.auto_increment {
            let id = sequence::nextval_seeded(
                conn,
                &self.schema.sequence_name(),
                self.schema.table(),
                &pk.column,
            )?;
            Some(Value::from(id))
        } else if pk.identity {
            None
        } else {
            entity.get(&pk.name).cloned()
        };

        let sb = conn.sql();
        let mut insert = sb.insert().into(self.schema.table());
        let mut params = Vec::new();
        for property in self.schema.properties() {
            let value = if property.id {
                match &key {
                    Some(key) => key,
                    None => continue,
                }
            } else {
                entity.get(&property.name).unwrap_or(&Value::Null)
            };
            insert.column(property.column.as_str());
            params.push(to_param(property, value)?);
        }

        match key {
            Some(key) => {
                conn.update(&insert.build(), &params)?;
                Ok(key)
            }
            None => generated_key(conn, &sb, insert.build(), &params, pk),
        }
    }

    fn insert_children(&self, entity: &Entity, key: &Value) -> Result<()> {
        let pk = self.schema.primary_key();
        for association in self.one_to_many() {
            let Some(children) = entity.get(&association.name) else {
                continue;
            };
            let Value::Array(children) = children else {
                return Err(DbError::Validation(format!(
                    "Association {} of {} must be an array",
                    association.name,
                    self.schema.table()
                )));
            };
            let target = self.target(association)?;
            let join_key = join_key(association)?;
            let join_value = if association.key == pk.name {
                key.clone()
            } else {
                entity.get(&association.key).cloned().unwrap_or(Value::Null)
            };
            for child in children {
                let Value::Object(child) = child else {
                    return Err(DbError::Validation(format!(
                        "Entries of association {} must be objects",
                        association.name
                    )));
                };
                let mut child = child.clone();
                child.insert(join_key.to_string(), join_value.clone());
                target.insert_one(&child)?;
            }
            debug!(table = %self.schema.table(), association = %association.name, count = children.len(), "Dependents inserted");
        }
        Ok(())
    }

    /// Updates the stored row with the properties present in `entity`,
    /// which must carry the primary key.
    pub fn update(&self, entity: &Entity) -> Result<&Self> {
        let _span = self.span();
        let pk = self.schema.primary_key();
        let id = entity
            .get(&pk.name)
            .filter(|id| !id.is_null())
            .ok_or_else(|| {
                DbError::Validation(format!(
                    "Entity of {} has no {} to update",
                    self.schema.table(),
                    pk.name
                ))
            })?;
        self.validate(entity, true)?;

        let conn = self.connection()?;
        let sb = conn.sql();
        let mut update = sb.update();
        update.table(self.schema.table());
        let mut params = Vec::new();
        for property in self.schema.properties().iter().filter(|p| !p.id) {
            if let Some(value) = entity.get(&property.name) {
                update.set(property.column.as_str(), "?");
                params.push(to_param(property, value)?);
            }
        }
        if params.is_empty() {
            debug!(table = %self.schema.table(), id = %id, "Nothing to update");
            return Ok(self);
        }
        update.where_clause(format!("{} = ?", sb.identifier(&pk.column)));
        params.push(to_param(pk, id)?);

        let count = conn.update(&update.build(), &params)?;
        if count == 0 {
            debug!(table = %self.schema.table(), id = %id, "No changes incurred");
        } else {
            debug!(table = %self.schema.table(), id = %id, "Entity updated");
        }
        Ok(self)
    }

    /// Deletes by key, by every key of an array, or everything for `null`.
    /// One-to-many dependents are deleted first.
    pub fn remove(&self, id: &Value) -> Result<()> {
        match id {
            Value::Null => self.remove_all(),
            Value::Array(ids) => self.remove_many(ids),
            id => self.remove_one(id),
        }
    }

    /// Deletes the entities with the given keys.
    pub fn remove_many(&self, ids: &[Value]) -> Result<()> {
        ids.iter().try_for_each(|id| self.remove_one(id))
    }

    /// Deletes every entity.
    pub fn remove_all(&self) -> Result<()> {
        let _span = self.span();
        if self.one_to_many().next().is_none() {
            let conn = self.connection()?;
            let sql = conn.sql().delete().from(self.schema.table()).build();
            let count = conn.update(&sql, &[])?;
            debug!(table = %self.schema.table(), count, "Entities deleted");
            return Ok(());
        }
        let pk = self.schema.primary_key();
        let ids: Vec<Value> = self
            .list(&QuerySettings::new().select([pk.name.as_str()]))?
            .into_iter()
            .filter_map(|mut entity| entity.remove(&pk.name))
            .collect();
        self.remove_many(&ids)
    }

    fn remove_one(&self, id: &Value) -> Result<()> {
        let _span = self.span();
        if id.is_null() {
            return Err(DbError::Validation(format!(
                "Cannot remove an entity of {} without a key",
                self.schema.table()
            )));
        }
        let pk = self.schema.primary_key();
        for association in self.one_to_many() {
            let target = self.target(association)?;
            let join_value = if association.key == pk.name {
                id.clone()
            } else {
                self.find(id, &[], &[association.key.as_str()])?
                    .and_then(|mut entity| entity.remove(&association.key))
                    .unwrap_or(Value::Null)
            };
            if join_value.is_null() {
                continue;
            }
            let target_pk = target.schema.primary_key().name.as_str();
            let settings = QuerySettings::new()
                .select([target_pk])
                .filter_eq(join_key(association)?, join_value);
            for mut dependent in target.list(&settings)? {
                if let Some(dependent_id) = dependent.remove(target_pk) {
                    target.remove_one(&dependent_id)?;
                }
            }
        }

        let conn = self.connection()?;
        let sb = conn.sql();
        let sql = sb
            .delete()
            .from(self.schema.table())
            .where_clause(format!("{} = ?", sb.identifier(&pk.column)))
            .build();
        let count = conn.update(&sql, &[to_param(pk, id)?])?;
        if count == 0 {
            debug!(table = %self.schema.table(), id = %id, "No changes incurred");
        } else {
            debug!(table = %self.schema.table(), id = %id, "Entity deleted");
        }
        Ok(())
    }

    /// Loads one entity by key.
    ///
    /// `select` restricts the returned properties; the primary key and the
    /// keys of expanded associations are always added when `expand` is
    /// non-empty. Each name in `expand` is inlined under the association
    /// name: an object (or `null`) for single-valued associations, an array
    /// for one-to-many ones.
    pub fn find(&self, id: &Value, expand: &[&str], select: &[&str]) -> Result<Option<Entity>> {
        let _span = self.span();
        let associations = self.associations(expand)?;
        let properties = self.selected(select, &associations)?;
        let pk = self.schema.primary_key();

        let entity = {
            let conn = self.connection()?;
            let sb = conn.sql();
            let sql = sb
                .select()
                .columns(properties.iter().map(|p| p.column.as_str()))
                .from(self.schema.table())
                .where_clause(format!("{} = ?", sb.identifier(&pk.column)))
                .build();
            let mut rs = conn.query(&sql, &[to_param(pk, id)?])?;
            if rs.next()? {
                Some(read_entity(&rs, &properties)?)
            } else {
                None
            }
        };

        match entity {
            Some(mut entity) => {
                debug!(table = %self.schema.table(), id = %id, "Entity found");
                self.expand(&mut entity, &associations)?;
                Ok(Some(entity))
            }
            None => {
                debug!(table = %self.schema.table(), id = %id, "Entity not found");
                Ok(None)
            }
        }
    }

    /// Lists the entities matching `settings`.
    pub fn list(&self, settings: &QuerySettings) -> Result<Vec<Entity>> {
        let _span = self.span();
        let expand: Vec<&str> = settings.expand.iter().map(String::as_str).collect();
        let associations = self.associations(&expand)?;
        let select: Vec<&str> = settings.select.iter().map(String::as_str).collect();
        let properties = self.selected(&select, &associations)?;

        let mut entities = {
            let conn = self.connection()?;
            let sb = conn.sql();
            let mut select = sb.select();
            select
                .columns(properties.iter().map(|p| p.column.as_str()))
                .from(self.schema.table());
            let filters = settings
                .conditions
                .iter()
                .map(|c| self.condition(&sb, c))
                .collect::<Result<Vec<_>>>()?;
            if let Some(filter) = Q::all(filters) {
                let (sql, values) = filter.build();
                select.where_with(sql, values);
            }
            let asc = settings.order == SortOrder::Asc;
            for name in &settings.sort {
                select.order_by(self.schema.require_property(name)?.column.as_str(), asc);
            }
            if let Some(limit) = settings.limit {
                select.limit(limit);
            }
            if let Some(offset) = settings.offset {
                select.offset(offset);
            }
            let params: Vec<Param> = select.parameters().into_iter().map(Param::from).collect();

            let mut skip = match (conn.dialect().paging(), settings.offset) {
                (Paging::TopOnly, Some(m)) => m,
                _ => 0,
            };

            let mut rs = conn.query(&select.build(), &params)?;
            let mut entities = Vec::new();
            while rs.next()? {
                if skip > 0 {
                    skip -= 1;
                    continue;
                }
                entities.push(read_entity(&rs, &properties)?);
            }
            entities
        };
        debug!(table = %self.schema.table(), count = entities.len(), "Entities listed");

        for entity in &mut entities {
            self.expand(entity, &associations)?;
        }
        Ok(entities)
    }

    /// Counts all stored entities.
    pub fn count(&self) -> Result<u64> {
        let _span = self.span();
        let conn = self.connection()?;
        let sql = conn
            .sql()
            .select()
            .column("COUNT(*)")
            .from(self.schema.table())
            .build();
        let mut rs = conn.query(&sql, &[])?;
        let count = if rs.next()? {
            rs.get::<i64>(1_usize)?.unwrap_or(0)
        } else {
            0
        };
        u64::try_from(count).map_err(|_| DbError::execution(format!("Invalid row count {count}")))
    }

    fn one_to_many(&self) -> impl Iterator<Item = &Association> {
        self.schema
            .associations()
            .iter()
            .filter(|a| a.cardinality == Cardinality::OneToMany)
    }

    fn associations(&self, names: &[&str]) -> Result<Vec<&Association>> {
        names
            .iter()
            .map(|name| self.schema.association(name))
            .collect()
    }

    /// Properties to read: all, or the selection plus the keys expanded
    /// associations need.
    fn selected(&self, select: &[&str], associations: &[&Association]) -> Result<Vec<&Property>> {
        if select.is_empty() {
            return Ok(self.schema.properties().iter().collect());
        }
        let mut properties = select
            .iter()
            .map(|name| self.schema.require_property(name))
            .collect::<Result<Vec<_>>>()?;
        if !associations.is_empty() {
            let keys = std::iter::once(self.schema.primary_key().name.as_str())
                .chain(associations.iter().map(|a| a.key.as_str()));
            for key in keys {
                if !properties.iter().any(|p| p.name == key) {
                    properties.push(self.schema.require_property(key)?);
                }
            }
        }
        Ok(properties)
    }

    fn expand(&self, entity: &mut Entity, associations: &[&Association]) -> Result<()> {
        for association in associations {
            let target = self.target(association)?;
            let key = entity.get(&association.key).cloned().unwrap_or(Value::Null);
            let expansion = if key.is_null() {
                if association.cardinality.is_single() {
                    Value::Null
                } else {
                    Value::Array(Vec::new())
                }
            } else if association.cardinality.is_single() {
                target.find(&key, &[], &[])?.map_or(Value::Null, Value::Object)
            } else {
                let settings = QuerySettings::new().filter_eq(join_key(association)?, key);
                Value::Array(target.list(&settings)?.into_iter().map(Value::Object).collect())
            };
            entity.insert(association.name.clone(), expansion);
        }
        Ok(())
    }

    fn condition(&self, sb: &SqlBuilder, condition: &Condition) -> Result<Q> {
        let property = self.schema.require_property(&condition.property)?;
        let field = sb.identifier(&property.column);
        let value = || to_sql(property, &condition.value);
        let pattern = || {
            condition
                .value
                .as_str()
                .map_or_else(|| condition.value.to_string(), String::from)
        };
        let q = match condition.operator {
            Operator::Eq if condition.value.is_null() => Q::is_null(&field),
            Operator::Ne if condition.value.is_null() => Q::is_not_null(&field),
            Operator::Eq => Q::eq(&field, value()?),
            Operator::Ne => Q::ne(&field, value()?),
            Operator::Gt => Q::gt(&field, value()?),
            Operator::Ge => Q::gte(&field, value()?),
            Operator::Lt => Q::lt(&field, value()?),
            Operator::Le => Q::lte(&field, value()?),
            Operator::Contains if property.data_type.is_character() => {
                Q::contains(&field, &pattern())
            }
            Operator::Contains => Q::eq(&field, value()?),
            Operator::Like => Q::like(&field, &pattern()),
            Operator::Null => Q::is_null(&field),
            Operator::NotNull => Q::is_not_null(&field),
        };
        Ok(q)
    }

    /// Checks required properties. Booleans are exempt, as is a generated
    /// key on insert. With `partial`, only properties present in `entity`
    /// are checked.
    fn validate(&self, entity: &Entity, partial: bool) -> Result<()> {
        for property in self.schema.properties() {
            if !property.required
                || property.data_type == DataType::Boolean
                || (property.id && property.is_generated())
            {
                continue;
            }
            let missing = match entity.get(&property.name) {
                None => !partial,
                Some(value) => value.is_null(),
            };
            if missing {
                return Err(DbError::Validation(format!(
                    "Property {} of entity {} is required",
                    property.name,
                    self.schema.table()
                )));
            }
        }
        Ok(())
    }
}

fn column_def(property: &Property) -> ColumnDef {
    let mut column = ColumnDef::new(property.column.as_str(), property.data_type.clone());
    if property.id {
        column = column.primary_key();
    } else {
        if property.required {
            column = column.not_null();
        }
        if property.unique {
            column = column.unique();
        }
    }
    if property.identity {
        column = column.identity();
    }
    column
}

fn join_key(association: &Association) -> Result<&str> {
    association.join_key.as_deref().ok_or_else(|| {
        DbError::DaoConfig(format!("Association {} has no join key", association.name))
    })
}

/// Inserts and reads back a database-generated key, through `RETURNING`
/// where the dialect has it and the driver's last insert id otherwise.
fn generated_key(
    conn: &Connection,
    sb: &SqlBuilder,
    mut sql: String,
    params: &[Param],
    pk: &Property,
) -> Result<Value> {
    if sb.dialect().supports_returning() {
        sql.push_str(&format!(" RETURNING {}", sb.identifier(&pk.column)));
    }
    let mut stmt = conn.prepare_statement(&sql)?;
    for (index, param) in params.iter().enumerate() {
        stmt.set_parameter(index + 1, param.clone())?;
    }
    let key = if stmt.execute()? {
        let mut rs = stmt
            .result_set()?
            .ok_or_else(|| DbError::execution(format!("No generated key returned by {sql}")))?;
        if rs.next()? {
            rs.get::<SqlValue>(1_usize)?.map(|v| to_value(pk, &v))
        } else {
            None
        }
    } else {
        stmt.last_insert_id().map(Value::from)
    };
    key.ok_or_else(|| DbError::execution(format!("No key was generated for {sql}")))
}

fn read_entity(rs: &ResultSet<'_>, properties: &[&Property]) -> Result<Entity> {
    let mut entity = Entity::new();
    for property in properties {
        let value = rs.get::<SqlValue>(property.column.as_str())?;
        entity.insert(
            property.name.clone(),
            value.map_or(Value::Null, |v| to_value(property, &v)),
        );
    }
    Ok(entity)
}
