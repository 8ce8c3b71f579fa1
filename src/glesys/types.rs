//! GleSYS API types and data structures.
//!
//! These mirror the `response.server` and `response.servers` payloads of the
//! `server/*` API family, plus the request bodies the client sends.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::config::DesiredServer;
use crate::error::{ReconcileError, Result};

/// Power state reported by `server/status` and `server/details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PowerState {
    /// Server is running.
    Running,
    /// Server is stopped.
    Stopped,
    /// Server is busy with a provider-side operation.
    Locked,
    /// Any other state string, kept verbatim.
    Other(String),
}

impl PowerState {
    /// Returns the wire representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Locked => "locked",
            Self::Other(s) => s,
        }
    }

    /// Returns true while the provider rejects mutations on the server.
    ///
    /// `locked` is the only busy marker the API reports; any other state is
    /// treated as settled.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

impl From<String> for PowerState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "running" => Self::Running,
            "stopped" => Self::Stopped,
            "locked" => Self::Locked,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for PowerState {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<PowerState> for String {
    fn from(state: PowerState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power action accepted by `server/start`, `server/stop` and `server/reboot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    /// Boot a stopped server.
    Start,
    /// Shut a running server down.
    Stop,
    /// Restart the server.
    Reboot,
}

impl PowerAction {
    /// Returns the API function name for this action.
    #[must_use]
    pub const fn function(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reboot => "reboot",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function())
    }
}

/// An IP address assigned to a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    /// The address itself.
    pub ipaddress: String,
    /// IP version, 4 or 6.
    pub version: u8,
}

/// Feature flags reported per server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFeatures {
    /// Whether bandwidth can be changed through `server/edit`.
    #[serde(default, deserialize_with = "yes_no")]
    pub editbandwidth: bool,
}

/// Accepts the provider's `"yes"`/`"no"` strings as well as plain booleans.
fn yes_no<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Word(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Word(w) => w.eq_ignore_ascii_case("yes"),
    })
}

/// Entry of `response.servers` as returned by `server/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    /// Server identifier.
    pub serverid: String,
    /// Hostname.
    #[serde(default)]
    pub hostname: String,
    /// Data center.
    #[serde(default)]
    pub datacenter: Option<String>,
    /// Virtualisation platform.
    #[serde(default)]
    pub platform: Option<String>,
}

/// Full provider-side view of a server, as returned by `server/details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    /// Server identifier.
    pub serverid: String,
    /// Hostname.
    #[serde(default)]
    pub hostname: String,
    /// Data center.
    #[serde(default)]
    pub datacenter: Option<String>,
    /// Virtualisation platform.
    #[serde(default)]
    pub platform: Option<String>,
    /// Template the server was created from.
    #[serde(default)]
    pub templatename: Option<String>,
    /// Number of CPU cores.
    #[serde(default)]
    pub cpucores: Option<u32>,
    /// Memory in MB.
    #[serde(default)]
    pub memorysize: Option<u32>,
    /// Disk in GB.
    #[serde(default)]
    pub disksize: Option<u32>,
    /// Bandwidth in Mbit/s.
    #[serde(default)]
    pub bandwidth: Option<u32>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Power state, present when details were requested with `includestate`.
    #[serde(default)]
    pub state: Option<PowerState>,
    /// Assigned addresses.
    #[serde(default)]
    pub iplist: Vec<IpAddress>,
    /// Feature flags.
    #[serde(default)]
    pub supportedfeatures: SupportedFeatures,
}

impl ServerSnapshot {
    /// Returns the address to show for the server: the first IPv4 address,
    /// otherwise the first IPv6 address.
    #[must_use]
    pub fn display_address(&self) -> Option<&str> {
        self.iplist
            .iter()
            .find(|ip| ip.version == 4)
            .or_else(|| self.iplist.iter().find(|ip| ip.version == 6))
            .map(|ip| ip.ipaddress.as_str())
    }

    /// Returns true if the snapshot reports a locked server.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.as_ref().is_some_and(PowerState::is_busy)
    }
}

/// Body of a `server/create` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateServerRequest {
    /// Hostname.
    pub hostname: String,
    /// Virtualisation platform.
    pub platform: String,
    /// Data center.
    pub datacenter: String,
    /// Template name.
    pub templatename: String,
    /// Disk in GB.
    pub disksize: u32,
    /// Memory in MB.
    pub memorysize: u32,
    /// Number of CPU cores.
    pub cpucores: u32,
    /// Bandwidth in Mbit/s.
    pub bandwidth: u32,
    /// Root password; blank means one is generated at submission.
    pub rootpassword: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// User definitions, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<serde_json::Value>,
    /// Public SSH key for the root account.
    #[serde(rename = "ssh_pub_key", skip_serializing_if = "Option::is_none")]
    pub sshkey: Option<String>,
}

impl CreateServerRequest {
    /// Default number of CPU cores on create.
    pub const DEFAULT_CPUS: u32 = 1;
    /// Default memory in MB on create.
    pub const DEFAULT_MEMORY: u32 = 2048;
    /// Default disk in GB on create.
    pub const DEFAULT_DISK: u32 = 20;
    /// Default bandwidth in Mbit/s on create.
    pub const DEFAULT_BANDWIDTH: u32 = 100;

    /// Builds a create request from the desired configuration, filling in the
    /// creation defaults for unset sizing fields.
    ///
    /// # Errors
    ///
    /// Returns a validation conflict if the configuration has no hostname.
    pub fn from_desired(desired: &DesiredServer) -> Result<Self> {
        let hostname = desired.hostname.clone().ok_or_else(|| {
            ReconcileError::conflict(
                "server not found and serverid specified, use hostname to create new servers",
            )
        })?;

        Ok(Self {
            hostname,
            platform: desired.platform.clone(),
            datacenter: desired.datacenter.clone(),
            templatename: desired.template.clone(),
            disksize: desired.disk.unwrap_or(Self::DEFAULT_DISK),
            memorysize: desired.memory.unwrap_or(Self::DEFAULT_MEMORY),
            cpucores: desired.cpus.unwrap_or(Self::DEFAULT_CPUS),
            bandwidth: desired.bandwidth.unwrap_or(Self::DEFAULT_BANDWIDTH),
            rootpassword: desired.password.clone().unwrap_or_default(),
            description: desired.description.clone(),
            users: desired.users.clone(),
            sshkey: desired.ssh_pub_key.clone(),
        })
    }
}

/// Fields sent to `server/edit`. Only populated fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateFields {
    /// Number of CPU cores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpucores: Option<u32>,
    /// Disk in GB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disksize: Option<u32>,
    /// Memory in MB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memorysize: Option<u32>,
    /// Bandwidth in Mbit/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u32>,
    /// Hostname.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl UpdateFields {
    /// Returns true if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cpucores.is_none()
            && self.disksize.is_none()
            && self.memorysize.is_none()
            && self.bandwidth.is_none()
            && self.hostname.is_none()
    }

    /// Returns the names of the populated fields, in wire order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.cpucores.is_some() {
            names.push("cpucores");
        }
        if self.disksize.is_some() {
            names.push("disksize");
        }
        if self.memorysize.is_some() {
            names.push("memorysize");
        }
        if self.bandwidth.is_some() {
            names.push("bandwidth");
        }
        if self.hostname.is_some() {
            names.push("hostname");
        }
        names
    }
}
