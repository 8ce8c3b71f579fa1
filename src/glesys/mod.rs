//! GleSYS API integration module.
//!
//! This module provides the provider interface used by the reconciler, the
//! HTTP client implementing it, the wire types, and root password generation.

mod api;
mod client;
mod password;
mod types;

#[cfg(test)]
pub(crate) use api::mock;

pub use api::{find_server, ServerApi};
pub use client::{GlesysClient, DEFAULT_ENDPOINT};
pub use password::{
    generate_password, GENERATED_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, PASSWORD_ALPHABET,
};
pub use types::{
    CreateServerRequest, IpAddress, PowerAction, PowerState, ServerSnapshot, ServerSummary,
    SupportedFeatures, UpdateFields,
};
