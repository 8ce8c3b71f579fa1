//! Configuration module for the GleSYS server reconciler.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `server.yaml`
//! - Validation of configuration values
//! - Resolving API credentials from flags, file and environment

mod credentials;
mod parser;
mod spec;
mod validator;

pub use credentials::{
    CredentialResolver, CredentialSource, Credentials, API_KEY_ENV, PROJECT_ENV,
};
pub use parser::{find_config_file, ConfigParser, DEFAULT_CONFIG_FILES};
pub use spec::{CredentialsConfig, DesiredServer, ServerConfig, TargetState};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
