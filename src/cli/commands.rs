//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// glesys-server - Declarative GleSYS Cloud server manager.
#[derive(Parser, Debug)]
#[command(name = "glesys-server")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "GLESYS_SERVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// GleSYS project name (overrides the config file and `GLESYS_PROJECT`).
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// GleSYS API key (overrides the config file and `GLESYS_API_KEY`).
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter server.yaml.
    Init {
        /// Directory to initialize (defaults to current directory).
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Force overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the server configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Show what apply would do, without changing anything.
    Plan {
        /// Show the differing fields.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Reconcile the server with the configuration.
    Apply {
        /// Dry-run: report what would change without mutating.
        #[arg(long)]
        check: bool,
    },

    /// Show the current state of the server.
    Status,

    /// Delete the server.
    Destroy {
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Dry-run: report whether the server would be deleted.
        #[arg(long)]
        check: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
