//! CLI argument definitions using clap
//!
//! Commands:
//! - compliance-tracker serve [--config <path>] [--port <n>] [--database <path>]
//! - compliance-tracker init-db [--config <path>]
//! - compliance-tracker add-user --username <u> --password <p> [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Config file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "./compliance.json";

/// Compliance Tracker - policy documents, audits and incidents
#[derive(Parser, Debug)]
#[command(name = "compliance-tracker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API until ctrl-c
    Serve {
        /// Path to configuration file (default: ./compliance.json, optional)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override server.port
        #[arg(long)]
        port: Option<u16>,

        /// Override database.path
        #[arg(long)]
        database: Option<String>,
    },

    /// Create the database file and apply migrations
    InitDb {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Register a login user
    AddUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
