//! API credential resolution.
//!
//! Each credential is taken from the first source that provides a non-empty
//! value, in this order: command-line flag, configuration file, environment.

use std::fmt;
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::spec::CredentialsConfig;

/// Environment variable holding the project name.
pub const PROJECT_ENV: &str = "GLESYS_PROJECT";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GLESYS_API_KEY";

/// Resolved API credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Project (account) name.
    pub project: String,
    /// API key.
    pub api_key: String,
}

impl Credentials {
    /// Creates credentials from explicit values.
    #[must_use]
    pub fn new(project: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project", &self.project)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Command-line flag.
    Flag,
    /// Configuration file.
    ConfigFile,
    /// Environment variable.
    Environment,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => write!(f, "command-line flag"),
            Self::ConfigFile => write!(f, "configuration file"),
            Self::Environment => write!(f, "environment"),
        }
    }
}

/// Ordered resolver for the project name and API key.
#[derive(Debug, Default, Clone)]
pub struct CredentialResolver {
    project_flag: Option<String>,
    api_key_flag: Option<String>,
    file: CredentialsConfig,
}

impl CredentialResolver {
    /// Creates a resolver with no flag or file values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values given on the command line.
    #[must_use]
    pub fn with_flags(mut self, project: Option<String>, api_key: Option<String>) -> Self {
        self.project_flag = project;
        self.api_key_flag = api_key;
        self
    }

    /// Sets the credentials section of the configuration file.
    #[must_use]
    pub fn with_file(mut self, file: &CredentialsConfig) -> Self {
        self.file = file.clone();
        self
    }

    /// Resolves both credentials, consulting the process environment last.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first credential no source provides.
    pub fn resolve(&self) -> Result<Credentials> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolves both credentials with `env` standing in for the environment.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first credential no source provides.
    pub fn resolve_with<F>(&self, env: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project = pick(
            "project",
            self.project_flag.as_deref(),
            self.file.project.as_deref(),
            PROJECT_ENV,
            &env,
        )?;
        let api_key = pick(
            "apikey",
            self.api_key_flag.as_deref(),
            self.file.apikey.as_deref(),
            API_KEY_ENV,
            &env,
        )?;

        Ok(Credentials::new(project, api_key))
    }
}

/// Returns the first non-empty value among flag, file and environment.
fn pick<F>(
    name: &str,
    flag: Option<&str>,
    file: Option<&str>,
    env_var: &str,
    env: &F,
) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let found = non_empty(flag.map(str::to_string))
        .map(|v| (v, CredentialSource::Flag))
        .or_else(|| non_empty(file.map(str::to_string)).map(|v| (v, CredentialSource::ConfigFile)))
        .or_else(|| non_empty(env(env_var)).map(|v| (v, CredentialSource::Environment)));

    match found {
        Some((value, source)) => {
            debug!("Using {name} from {source}");
            Ok(value)
        }
        None => Err(ConfigError::MissingCredential {
            name: name.to_string(),
            env_var: env_var.to_string(),
        }
        .into()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GlesysError;

    fn env_with(project: &'static str, key: &'static str) -> impl Fn(&str) -> Option<String> {
        move |name| match name {
            PROJECT_ENV => Some(project.to_string()),
            API_KEY_ENV => Some(key.to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_flag_wins_over_file_and_env() {
        let file = CredentialsConfig {
            project: Some(String::from("file-project")),
            apikey: Some(String::from("file-key")),
        };
        let creds = CredentialResolver::new()
            .with_flags(Some(String::from("flag-project")), None)
            .with_file(&file)
            .resolve_with(env_with("env-project", "env-key"))
            .unwrap();

        assert_eq!(creds.project, "flag-project");
        assert_eq!(creds.api_key, "file-key");
    }

    #[test]
    fn test_env_is_last_resort() {
        let creds = CredentialResolver::new()
            .resolve_with(env_with("env-project", "env-key"))
            .unwrap();
        assert_eq!(creds, Credentials::new("env-project", "env-key"));
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let file = CredentialsConfig {
            project: Some(String::from("  ")),
            apikey: None,
        };
        let creds = CredentialResolver::new()
            .with_flags(Some(String::new()), None)
            .with_file(&file)
            .resolve_with(env_with("env-project", "env-key"))
            .unwrap();
        assert_eq!(creds.project, "env-project");
    }

    #[test]
    fn test_missing_credential() {
        let err = CredentialResolver::new()
            .with_flags(Some(String::from("cl1")), None)
            .resolve_with(|_| None)
            .unwrap_err();

        match err {
            GlesysError::Config(ConfigError::MissingCredential { name, env_var }) => {
                assert_eq!(name, "apikey");
                assert_eq!(env_var, API_KEY_ENV);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let text = format!("{:?}", Credentials::new("cl1", "topsecret"));
        assert!(!text.contains("topsecret"));
    }
}
