//! Error types for the GleSYS server reconciler.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration, the GleSYS API, and reconciliation itself.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the reconciler.
#[derive(Debug, Error)]
pub enum GlesysError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// GleSYS API errors.
    #[error("GleSYS API error: {0}")]
    Api(#[from] ApiError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Malformed local input, rejected before any network call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A credential could not be resolved from any source.
    #[error("Missing credential '{name}' (set it in the config file, pass it as a flag, or export {env_var})")]
    MissingCredential {
        /// Name of the credential.
        name: String,
        /// Environment variable consulted last.
        env_var: String,
    },
}

/// GleSYS API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a status of 400 or above.
    #[error("{message} (HTTP {status})")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Error text from `response.status.text`, verbatim.
        message: String,
    },

    /// The server id no longer exists on the provider side.
    #[error("Server not found: {server_id}")]
    ServerNotFound {
        /// ID of the missing server.
        server_id: String,
    },

    /// Network error.
    #[error("Network error communicating with GleSYS: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from API.
    #[error("Invalid response from GleSYS API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Reconciliation errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The desired configuration cannot identify or create a server.
    #[error("{message}")]
    ValidationConflict {
        /// Description of the conflict.
        message: String,
    },

    /// The server did not reach the awaited state within `wait_timeout`.
    #[error("Timeout waiting for server {server_id} to reach state {expected_state}")]
    Timeout {
        /// ID of the server.
        server_id: String,
        /// Expected state that was not reached.
        expected_state: String,
    },

    /// The lock wait hit its configured poll bound.
    #[error("Server {server_id} still locked after {polls} polls")]
    LockWaitExhausted {
        /// ID of the server.
        server_id: String,
        /// Number of status polls issued.
        polls: u32,
    },
}

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, GlesysError>;

impl GlesysError {
    /// Creates an invalid-argument error with the given message.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns true if this error means the server does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::ServerNotFound { .. }))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl ApiError {
    /// Creates a provider error.
    #[must_use]
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

impl ReconcileError {
    /// Creates a validation conflict.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::ValidationConflict {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_keeps_message_verbatim() {
        let err = GlesysError::from(ApiError::provider(400, "Unable to edit server: locked"));
        let text = err.to_string();
        assert!(text.contains("Unable to edit server: locked"));
        assert!(text.contains("400"));
    }

    #[test]
    fn test_is_not_found() {
        let err = GlesysError::from(ApiError::ServerNotFound {
            server_id: String::from("wps123"),
        });
        assert!(err.is_not_found());
        assert!(!GlesysError::invalid_argument("x").is_not_found());
    }
}
