//! CLI module for the compliance tracker
//!
//! Provides command-line interface for:
//! - serve: Run the HTTP API
//! - init-db: Create and migrate the database
//! - add-user: Register a login user

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, DEFAULT_CONFIG_PATH};
pub use commands::{add_user, init_db, load_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
