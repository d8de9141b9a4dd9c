//! sqlweave CLI
//!
//! Runs statements, sequences and entity listings against one data source.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use sqlweave_dao::{Dao, QuerySettings};
use sqlweave_db::{params_from_json, DataSourceDescriptor, Database, DatabaseConfig, Param};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Dialect-aware access to SQL databases.
#[derive(Parser)]
#[command(name = "sqlweave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Connection URL, e.g. `postgres://host/db` or `sqlite://app.db?mode=rwc`.
    #[arg(short, long, env = "DATABASE_URL")]
    url: String,

    /// Driver name (derived from the URL scheme if not specified).
    #[arg(short, long)]
    driver: Option<String>,

    /// Data source name.
    #[arg(short, long, default_value = "DefaultDB")]
    name: String,

    /// User name.
    #[arg(long, env = "DATABASE_USER", requires = "password")]
    user: Option<String>,

    /// Password.
    #[arg(long, env = "DATABASE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// JSON configuration file (`SQLWEAVE_*` environment variables otherwise).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print every row instead of the first 100.
    #[arg(short, long)]
    all: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print its rows as JSON.
    Query {
        sql: String,

        /// Parameters as a JSON array.
        #[arg(short, long)]
        params: Option<String>,
    },

    /// Run a statement and print the affected row count.
    Update {
        sql: String,

        /// Parameters as a JSON array.
        #[arg(short, long)]
        params: Option<String>,
    },

    /// Print the next value of a sequence, creating it if needed.
    Nextval { name: String },

    /// Drop a sequence.
    DropSequence { name: String },

    /// Describe the data source.
    Metadata,

    /// Print the dialect resolved for the data source.
    Dialect,

    /// List entities of a DAO configuration file.
    List {
        /// Entity configuration (JSON).
        entity: PathBuf,

        /// Query settings, e.g. `$filter=price gt 10&$limit=5`.
        #[arg(short, long, default_value = "")]
        settings: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            DatabaseConfig::from_json(&json)?
        }
        None => DatabaseConfig::from_env()?,
    };
    let db = Database::new(config)?;

    let driver = match &cli.driver {
        Some(driver) => driver.clone(),
        None => cli
            .url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_string())
            .context("Cannot derive the driver from the URL, pass --driver")?,
    };
    let mut descriptor = DataSourceDescriptor::new(&cli.name, driver, &cli.url);
    if let (Some(user), Some(password)) = (&cli.user, &cli.password) {
        descriptor = descriptor.credentials(user, password);
    }
    db.register(descriptor)?;
    let ds = Some(cli.name.as_str());

    match cli.command {
        Commands::Query { sql, params } => {
            let params = parse_params(params.as_deref())?;
            let mut rows = db.query(&sql, &params, None, ds)?;
            println!("{}", serde_json::to_string_pretty(&rows.to_json(!cli.all)?)?);
        }

        Commands::Update { sql, params } => {
            let params = parse_params(params.as_deref())?;
            let count = db.update(&sql, &params, None, ds)?;
            info!("{count} row(s) affected");
        }

        Commands::Nextval { name } => {
            println!("{}", db.nextval(&name, None, ds)?);
        }

        Commands::DropSequence { name } => {
            db.drop_sequence(&name, None, ds)?;
        }

        Commands::Metadata => {
            println!("{}", serde_json::to_string_pretty(&db.metadata(None, ds)?)?);
        }

        Commands::Dialect => {
            println!("{}", db.dialect(None, ds)?.name());
        }

        Commands::List { entity, settings } => {
            let json = std::fs::read_to_string(&entity)
                .with_context(|| format!("Failed to read {}", entity.display()))?;
            let config: Value = serde_json::from_str(&json)?;
            let dao = Dao::new(&db, &config, None)?.with_data_source(None, ds);
            let settings = QuerySettings::parse(&settings)?;
            debug!(settings = ?settings, "Listing entities");
            let entities = dao.list(&settings)?;
            println!("{}", serde_json::to_string_pretty(&entities)?);
        }
    }

    Ok(())
}

fn parse_params(json: Option<&str>) -> anyhow::Result<Vec<Param>> {
    let Some(json) = json else {
        return Ok(Vec::new());
    };
    let value: Value = serde_json::from_str(json).context("Parameters are not valid JSON")?;
    Ok(params_from_json(&value)?)
}
