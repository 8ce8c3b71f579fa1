//! Configuration specification types for the server reconciler.
//!
//! This module defines the structs that map to the `server.yaml` file. They
//! describe the desired server and the reconciliation policy; credentials
//! are kept in their own section and never travel with the desired state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::glesys::PowerState;

/// The root of a `server.yaml` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Optional API credentials. Flags and environment variables may
    /// supply them instead.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// The desired server.
    pub server: DesiredServer,
}

/// Credentials section of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialsConfig {
    /// Project (account) name, e.g. `cl12345`.
    #[serde(default)]
    pub project: Option<String>,
    /// API key.
    #[serde(default, skip_serializing)]
    pub apikey: Option<String>,
}

/// Desired state of the managed server plus the reconciliation policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesiredServer {
    /// Provider-assigned server id, if already known.
    #[serde(default)]
    pub serverid: Option<String>,
    /// Hostname; used for lookup when no id is given and required to create.
    #[serde(default)]
    pub hostname: Option<String>,
    /// Number of CPU cores.
    #[serde(default)]
    pub cpus: Option<u32>,
    /// Memory in MB.
    #[serde(default)]
    pub memory: Option<u32>,
    /// Disk in GB.
    #[serde(default)]
    pub disk: Option<u32>,
    /// Bandwidth in Mbit/s.
    #[serde(default)]
    pub bandwidth: Option<u32>,
    /// Root password used on create; blank means generated.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Public SSH key installed for root on create.
    #[serde(default)]
    pub ssh_pub_key: Option<String>,
    /// Data center.
    #[serde(default = "default_datacenter")]
    pub datacenter: String,
    /// Virtualisation platform.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Template to install.
    #[serde(default = "default_template")]
    pub template: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// User definitions, passed to the provider on create as-is.
    #[serde(default)]
    pub users: Option<serde_json::Value>,
    /// Target state.
    #[serde(default)]
    pub state: TargetState,
    /// Whether to wait for the target state to be observed.
    #[serde(default = "default_wait")]
    pub wait: bool,
    /// Upper bound, in seconds, on the wait for the target state.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: u64,
}

/// Target state of the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    /// The server exists, in whatever power state.
    #[default]
    Present,
    /// The server exists and is running.
    Running,
    /// The server exists and is stopped.
    Stopped,
    /// The server is rebooted, then running.
    Rebooted,
    /// The server does not exist.
    Absent,
}

impl TargetState {
    /// Returns the power state the convergence wait looks for, or `None`
    /// when any observed state satisfies the target.
    #[must_use]
    pub const fn awaited_state(self) -> Option<PowerState> {
        match self {
            Self::Running | Self::Rebooted => Some(PowerState::Running),
            Self::Stopped => Some(PowerState::Stopped),
            Self::Present | Self::Absent => None,
        }
    }

    /// Returns the lowercase name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Rebooted => "rebooted",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_datacenter() -> String {
    String::from("Falkenberg")
}

fn default_platform() -> String {
    String::from("VMware")
}

fn default_template() -> String {
    String::from("Debian 9 64-bit")
}

const fn default_wait() -> bool {
    true
}

const fn default_wait_timeout() -> u64 {
    600
}

impl Default for DesiredServer {
    fn default() -> Self {
        Self {
            serverid: None,
            hostname: None,
            cpus: None,
            memory: None,
            disk: None,
            bandwidth: None,
            password: None,
            ssh_pub_key: None,
            datacenter: default_datacenter(),
            platform: default_platform(),
            template: default_template(),
            description: None,
            users: None,
            state: TargetState::default(),
            wait: default_wait(),
            wait_timeout: default_wait_timeout(),
        }
    }
}

impl DesiredServer {
    /// Creates a desired server identified by hostname, with defaults for
    /// everything else.
    #[must_use]
    pub fn with_hostname(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            ..Self::default()
        }
    }

    /// Sets the target state.
    #[must_use]
    pub const fn with_state(mut self, state: TargetState) -> Self {
        self.state = state;
        self
    }

    /// Returns a human-readable handle for the server: its id, else its
    /// hostname.
    #[must_use]
    pub fn label(&self) -> &str {
        self.serverid
            .as_deref()
            .or(self.hostname.as_deref())
            .unwrap_or("<unnamed>")
    }

    /// Returns true if a password was given but is blank.
    #[must_use]
    pub fn has_blank_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| p.trim().is_empty())
    }
}
