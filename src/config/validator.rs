//! Configuration validation for the desired server.
//!
//! This module checks a parsed `server.yaml` for values the provider would
//! reject or that cannot identify a server, before any network call.

use crate::error::{ConfigError, Result};
use tracing::debug;

use super::spec::{DesiredServer, ServerConfig, TargetState};

/// Validator for server configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a server configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self, config: &ServerConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_identity(&config.server, &mut result);
        Self::validate_sizing(&config.server, &mut result);
        Self::validate_policy(&config.server, &mut result);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )
            .into())
        }
    }

    /// Validates the server id and hostname.
    fn validate_identity(server: &DesiredServer, result: &mut ValidationResult) {
        if server.serverid.is_none() && server.hostname.is_none() {
            result.errors.push(ValidationError {
                field: String::from("server"),
                message: String::from("One of server.serverid or server.hostname is required"),
            });
        }

        if server.serverid.as_deref().is_some_and(|id| id.trim().is_empty()) {
            result.errors.push(ValidationError {
                field: String::from("server.serverid"),
                message: String::from("Server id cannot be empty"),
            });
        }

        if let Some(hostname) = &server.hostname {
            if !is_valid_hostname(hostname) {
                result.errors.push(ValidationError {
                    field: String::from("server.hostname"),
                    message: format!(
                        "Hostname '{hostname}' is invalid. Must be alphanumeric with hyphens and dots."
                    ),
                });
            }
        } else if server.state != TargetState::Absent {
            result.warnings.push(String::from(
                "No hostname set: the server cannot be created if the id is not found",
            ));
        }
    }

    /// Validates sizing fields.
    fn validate_sizing(server: &DesiredServer, result: &mut ValidationResult) {
        let sizing = [
            ("server.cpus", server.cpus),
            ("server.memory", server.memory),
            ("server.disk", server.disk),
            ("server.bandwidth", server.bandwidth),
        ];

        for (field, value) in sizing {
            if value == Some(0) {
                result.errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!("{field} must be at least 1"),
                });
            }
        }

        if server.state == TargetState::Absent && sizing.iter().any(|(_, v)| v.is_some()) {
            result
                .warnings
                .push(String::from("Sizing is ignored when state is absent"));
        }
    }

    /// Validates the reconciliation policy and create-only fields.
    fn validate_policy(server: &DesiredServer, result: &mut ValidationResult) {
        if server.wait && server.wait_timeout == 0 {
            result.errors.push(ValidationError {
                field: String::from("server.wait_timeout"),
                message: String::from("Wait timeout must be at least 1 second when wait is enabled"),
            });
        }

        if server.has_blank_password() && server.state != TargetState::Absent {
            result.warnings.push(String::from(
                "Password is blank: a random root password will be generated on create",
            ));
        }
    }
}

/// Validates a hostname: dot-separated labels of ASCII letters, digits and
/// hyphens, no label starting or ending with a hyphen.
fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 253 {
        return false;
    }

    hostname.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
