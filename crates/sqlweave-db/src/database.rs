//! The process-wide registry of data sources and the operations run
//! against them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{json, Value};
use sqlweave_core::builder::SqlBuilder;
use sqlweave_core::dialect::{self, Dialect};
use tokio::runtime::Runtime;
use tracing::info;

use crate::backend::DbPool;
use crate::config::DatabaseConfig;
use crate::connection::{Connection, Origin};
use crate::datasource::{DataSource, DataSourceDescriptor};
use crate::error::{DbError, Result};
use crate::resultset::ResultSet;
use crate::sequence;
use crate::statement::Parameters;
use crate::value::{convert, Param};

static GLOBAL: OnceLock<Database> = OnceLock::new();

/// Resolves the dialect of a database product or type name.
pub fn dialect_for(product: &str) -> Result<&'static dyn Dialect> {
    dialect::resolve(product).ok_or_else(|| DbError::DialectUnsupported(product.to_string()))
}

/// Data sources grouped by database type, with the runtime driving their
/// pools.
///
/// Every method blocks the calling thread until the database answers.
/// Methods taking `database_type` and `data_source` fall back to the
/// configured defaults for `None`.
#[derive(Debug)]
pub struct Database {
    config: DatabaseConfig,
    runtime: Arc<Runtime>,
    data_sources: RwLock<BTreeMap<String, Arc<DataSource>>>,
}

impl Database {
    /// Creates an empty registry.
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        if let Some(name) = dialect::ambiguous_name() {
            return Err(DbError::Config(format!(
                "Dialect name '{name}' resolves to more than one dialect"
            )));
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name("sqlweave-db")
            .enable_all()
            .build()
            .map_err(|e| DbError::Config(format!("Failed to start runtime: {e}")))?;
        Ok(Self {
            config,
            runtime: Arc::new(runtime),
            data_sources: RwLock::new(BTreeMap::new()),
        })
    }

    /// Returns the process-wide registry, configured from the environment
    /// on first use.
    pub fn global() -> Result<&'static Self> {
        if let Some(database) = GLOBAL.get() {
            return Ok(database);
        }
        let database = Self::new(DatabaseConfig::from_env()?)?;
        Ok(GLOBAL.get_or_init(|| database))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<DataSource>>> {
        self.data_sources.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Arc<DataSource>>> {
        self.data_sources.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lists database types: the default type and every type with a data
    /// source.
    #[must_use]
    pub fn database_types(&self) -> Vec<String> {
        let mut types: BTreeSet<String> =
            self.read().values().map(|ds| ds.database_type.clone()).collect();
        types.insert(self.config.default_database_type.clone());
        types.into_iter().collect()
    }

    /// Lists the data sources of a database type.
    #[must_use]
    pub fn data_sources(&self, database_type: Option<&str>) -> Vec<String> {
        let database_type = database_type.unwrap_or(&self.config.default_database_type);
        self.read()
            .values()
            .filter(|ds| ds.database_type == database_type)
            .map(|ds| ds.name.clone())
            .collect()
    }

    /// Registers a data source under the default database type.
    pub fn create_data_source(
        &self,
        name: &str,
        driver: &str,
        url: &str,
        username: Option<&str>,
        password: Option<&str>,
        properties: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut descriptor = DataSourceDescriptor::new(name, driver, url);
        descriptor.username = username.map(str::to_string);
        descriptor.password = password.map(str::to_string);
        descriptor.properties.clone_from(properties);
        self.register(descriptor)
    }

    /// Registers a data source. No connection is opened until first use.
    pub fn register(&self, descriptor: DataSourceDescriptor) -> Result<()> {
        if descriptor.name.trim().is_empty() {
            return Err(DbError::Config(String::from("Data source name is empty")));
        }
        let (backend, url) = descriptor.connection_url()?;
        let database_type = descriptor
            .database_type
            .clone()
            .unwrap_or_else(|| self.config.default_database_type.clone());

        let mut data_sources = self.write();
        if data_sources.contains_key(&descriptor.name) {
            return Err(DbError::Config(format!(
                "Data source '{}' already exists",
                descriptor.name
            )));
        }
        let pool = {
            // Lazy pools start their maintenance tasks on the runtime.
            let _enter = self.runtime.enter();
            DbPool::connect_lazy(backend, &url, self.config.max_connections)?
        };
        info!(
            datasource = %descriptor.name,
            database_type = %database_type,
            driver = %backend,
            "Data source registered"
        );
        data_sources.insert(
            descriptor.name.clone(),
            Arc::new(DataSource {
                name: descriptor.name,
                database_type,
                backend,
                pool,
            }),
        );
        Ok(())
    }

    /// Unregisters a data source and closes its pool.
    pub fn remove_data_source(&self, name: &str) -> Result<()> {
        let removed = self
            .write()
            .remove(name)
            .ok_or_else(|| DbError::DataSourceNotFound(name.to_string()))?;
        self.runtime.block_on(removed.pool.close());
        info!(datasource = %name, "Data source removed");
        Ok(())
    }

    fn lookup(&self, database_type: Option<&str>, name: Option<&str>) -> Result<Arc<DataSource>> {
        let data_sources = self.read();
        if let Some(name) = name {
            return data_sources
                .get(name)
                .filter(|ds| database_type.map_or(true, |t| ds.database_type == t))
                .cloned()
                .ok_or_else(|| DbError::DataSourceNotFound(name.to_string()));
        }

        let database_type = database_type.unwrap_or(&self.config.default_database_type);
        let candidates: Vec<&Arc<DataSource>> = data_sources
            .values()
            .filter(|ds| ds.database_type == database_type)
            .collect();
        candidates
            .iter()
            .find(|ds| ds.name == self.config.default_datasource)
            .or_else(|| match candidates.as_slice() {
                [only] => Some(only),
                _ => None,
            })
            .map(|ds| Arc::clone(ds))
            .ok_or_else(|| {
                DbError::DataSourceNotFound(format!(
                    "{database_type}/{}",
                    self.config.default_datasource
                ))
            })
    }

    /// Checks out a connection.
    pub fn connection(
        &self,
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<Connection> {
        let ds = self.lookup(database_type, data_source)?;
        let dialect = dialect_for(ds.backend.product_name())?;
        let conn = self.runtime.block_on(ds.pool.acquire())?;
        Ok(Connection::new(
            conn,
            Arc::clone(&self.runtime),
            dialect,
            &Origin {
                database_type: &ds.database_type,
                data_source: &ds.name,
                backend: ds.backend,
                case_sensitive: self.config.case_sensitive_names,
            },
        ))
    }

    /// Product name of a data source, e.g. `PostgreSQL`.
    pub fn product_name(
        &self,
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<String> {
        Ok(self
            .lookup(database_type, data_source)?
            .backend
            .product_name()
            .to_string())
    }

    /// Resolves a dialect.
    ///
    /// A registered database type or a named data source resolves through
    /// its product name. Any other `database_type` must itself name a
    /// dialect. With neither given, the default data source decides, or the
    /// generic dialect when there is none.
    pub fn dialect(
        &self,
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<&'static dyn Dialect> {
        match (database_type, data_source) {
            (_, Some(_)) => dialect_for(self.lookup(database_type, data_source)?.backend.product_name()),
            (Some(database_type), None) => {
                if self.data_sources(Some(database_type)).is_empty() {
                    dialect_for(database_type)
                } else {
                    dialect_for(self.lookup(Some(database_type), None)?.backend.product_name())
                }
            }
            (None, None) => match self.lookup(None, None) {
                Ok(ds) => dialect_for(ds.backend.product_name()),
                Err(_) => Ok(dialect::default_dialect()),
            },
        }
    }

    /// Builders for a data source's dialect.
    pub fn sql(&self, database_type: Option<&str>, data_source: Option<&str>) -> Result<SqlBuilder> {
        Ok(SqlBuilder::new(self.dialect(database_type, data_source)?)
            .case_sensitive(self.config.case_sensitive_names))
    }

    /// Describes a data source: product, version, dialect and tables.
    pub fn metadata(&self, database_type: Option<&str>, data_source: Option<&str>) -> Result<Value> {
        let conn = self.connection(database_type, data_source)?;
        let dialect = conn.dialect();

        let version = match dialect.version_query() {
            Some(sql) => {
                let rows = conn.fetch(sql, &[])?;
                match (rows.columns.first(), rows.rows.first().and_then(|r| r.first())) {
                    (Some(column), Some(value)) => convert::<String>(column, value)?,
                    _ => None,
                }
            }
            None => None,
        };

        let tables = conn.fetch(dialect.list_tables_query(), &[])?;
        let mut names = Vec::with_capacity(tables.rows.len());
        for row in &tables.rows {
            if let (Some(column), Some(value)) = (tables.columns.first(), row.first()) {
                if let Some(name) = convert::<String>(column, value)? {
                    names.push(name);
                }
            }
        }

        let metadata = json!({
            "productName": conn.product_name(),
            "productVersion": version,
            "databaseType": conn.database_type(),
            "dataSource": conn.data_source(),
            "dialect": dialect.name(),
            "tables": names,
        });
        conn.close()?;
        Ok(metadata)
    }

    /// Runs a query on a pooled connection and returns its rows.
    pub fn query(
        &self,
        sql: &str,
        params: &[Param],
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<ResultSet<'static>> {
        let conn = self.connection(database_type, data_source)?;
        let rows = conn.query(sql, params)?.detach();
        conn.close()?;
        Ok(rows)
    }

    /// Runs a modification on a pooled connection and returns the affected
    /// row count.
    pub fn update(
        &self,
        sql: &str,
        params: &[Param],
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<u64> {
        let conn = self.connection(database_type, data_source)?;
        let count = conn.update(sql, params)?;
        conn.close()?;
        Ok(count)
    }

    /// Creates a stored procedure or function. The text is sent as is.
    pub fn create_procedure(
        &self,
        sql: &str,
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<()> {
        let conn = self.connection(database_type, data_source)?;
        conn.execute_script(sql)?;
        conn.close()
    }

    /// Calls a procedure and returns every row it produces as a JSON array.
    pub fn execute_procedure(
        &self,
        sql: &str,
        params: &[Param],
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<Value> {
        let conn = self.connection(database_type, data_source)?;
        let rows = {
            let mut call = conn.prepare_call(sql)?;
            for (i, param) in params.iter().enumerate() {
                call.set_parameter(i + 1, param.clone())?;
            }
            let rows = if call.execute()? {
                match call.result_set()? {
                    Some(mut rs) => rs.to_json(false)?,
                    None => Value::Array(Vec::new()),
                }
            } else {
                Value::Array(Vec::new())
            };
            call.close();
            rows
        };
        conn.close()?;
        Ok(rows)
    }

    /// Returns the next value of a sequence, creating it on first use.
    pub fn nextval(
        &self,
        name: &str,
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<i64> {
        let conn = self.connection(database_type, data_source)?;
        let value = sequence::nextval(&conn, name)?;
        conn.close()?;
        Ok(value)
    }

    /// Creates a sequence.
    pub fn create_sequence(
        &self,
        name: &str,
        start: Option<i64>,
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<()> {
        let conn = self.connection(database_type, data_source)?;
        sequence::create(&conn, name, start)?;
        conn.close()
    }

    /// Drops a sequence. Dropping a missing sequence succeeds.
    pub fn drop_sequence(
        &self,
        name: &str,
        database_type: Option<&str>,
        data_source: Option<&str>,
    ) -> Result<()> {
        let conn = self.connection(database_type, data_source)?;
        sequence::drop(&conn, name)?;
        conn.close()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let data_sources = std::mem::take(&mut *self.write());
        for ds in data_sources.values() {
            self.runtime.block_on(ds.pool.close());
        }
    }
}
