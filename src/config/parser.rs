//! Configuration parser for loading `server.yaml`.
//!
//! This module handles locating and loading the configuration file and the
//! `.env` file next to it.

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::ServerConfig;

/// Configuration parser for loading the desired server.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ServerConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to read file: {e}"),
            location: Some(path.display().to_string()),
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ServerConfig> {
        debug!("Parsing YAML configuration");

        let config: ServerConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source
                .map(|p| p.display().to_string())
                .or_else(|| e.location().map(|l| format!("line {}, column {}", l.line(), l.column())));
            ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            }
        })?;

        debug!("Parsed configuration for server: {}", config.server.label());
        Ok(config)
    }

    /// Loads the `.env` file from the base path, or the working directory,
    /// if present. Variables already set in the environment are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the `.env` file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| ConfigError::ParseError {
                message: format!("Failed to load .env file: {e}"),
                location: Some(env_path.display().to_string()),
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["server.yaml", "server.yml", "glesys.server.yaml"];

/// Finds the configuration file in `start_dir` or one of its parents, then in
/// the user configuration directory (`<config_dir>/glesys/server.yaml`).
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();

    if let Some(found) = search_ancestors(start) {
        return Ok(found);
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("glesys").join(DEFAULT_CONFIG_FILES[0])) {
        if user_config.exists() {
            info!("Found configuration file: {}", user_config.display());
            return Ok(user_config);
        }
    }

    Err(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }
    .into())
}

fn search_ancestors(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Some(config_path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
