//! CLI module for the glesys-server tool.
//!
//! This module provides the command-line interface for reconciling a
//! GleSYS Cloud server.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
