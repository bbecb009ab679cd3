//! CLI command implementations
//!
//! Each command loads the configuration, initializes logging and opens only
//! what it needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::auth::UserRepository;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::db::{schema, DbPool};
use crate::http_server::{AppState, HttpServer};
use crate::observability::init_logging;

use super::args::{Command, DEFAULT_CONFIG_PATH};
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            config,
            port,
            database,
        } => {
            let mut config = load_config(config)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(database) = database {
                config.database.path = database;
            }
            config.validate()?;
            serve(config)
        }
        Command::InitDb { config } => init_db(&load_config(config)?),
        Command::AddUser {
            username,
            password,
            config,
        } => add_user(&load_config(config)?, &username, &password),
    }
}

/// Load an explicit config path strictly, or the default path if present
pub fn load_config(path: Option<PathBuf>) -> CliResult<Config> {
    let config = match path {
        Some(path) => Config::load_or_default(&path, true)?,
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_PATH), false)?,
    };
    Ok(config)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Open the pool, build the blob store and serve HTTP until ctrl-c
pub fn serve(config: Config) -> CliResult<()> {
    init_logging(&config.log_filter);

    let rt = runtime()?;
    rt.block_on(async {
        let pool = DbPool::open(&config.database)?;
        let blobs = config.blobs.build()?;
        tracing::info!(
            database = %config.database.path,
            pool_size = pool.size(),
            blobs = ?config.blobs.backend,
            "storage opened"
        );

        let state = AppState::new(pool, blobs, Arc::new(SystemClock));
        HttpServer::with_config(config.server.clone(), state)
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Create the database file (if needed) and apply pending migrations
pub fn init_db(config: &Config) -> CliResult<()> {
    init_logging(&config.log_filter);

    let mut config_db = config.database.clone();
    config_db.pool_size = 1;
    let pool = DbPool::open(&config_db)?;

    let rt = runtime()?;
    let version = rt.block_on(pool.run(|conn| schema::current_version(conn)))?;
    pool.close();

    println!(
        "Database {} ready at schema version {} (latest {})",
        config.database.path,
        version,
        schema::latest_version()
    );
    Ok(())
}

/// Register a login user with a hashed password
pub fn add_user(config: &Config, username: &str, password: &str) -> CliResult<()> {
    init_logging(&config.log_filter);

    let mut config_db = config.database.clone();
    config_db.pool_size = 1;
    let pool = DbPool::open(&config_db)?;
    let users = UserRepository::new(pool.clone());

    let rt = runtime()?;
    let added = rt.block_on(users.add_user(username, password));
    pool.close();

    let user_id = added?;
    println!("Added user '{}' (id {})", username.trim(), user_id);
    Ok(())
}
