//! Provider interface for the `server/*` API family.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use super::types::{
    CreateServerRequest, PowerAction, PowerState, ServerSnapshot, ServerSummary, UpdateFields,
};

/// Operations the reconciler needs from the provider.
///
/// Every method is a single request/response round trip; implementations do
/// not retry.
#[async_trait]
pub trait ServerApi: Send + Sync {
    /// Lists every server of the project.
    async fn list(&self) -> Result<Vec<ServerSummary>>;

    /// Fetches the full snapshot of a server, including its power state.
    ///
    /// Fails with a not-found error if the server does not exist.
    async fn details(&self, server_id: &str) -> Result<ServerSnapshot>;

    /// Fetches the current power state of a server.
    async fn status(&self, server_id: &str) -> Result<PowerState>;

    /// Creates a server. A blank root password is replaced by a generated one.
    async fn create(&self, request: &CreateServerRequest) -> Result<ServerSnapshot>;

    /// Edits the populated fields of a server.
    async fn update(&self, server_id: &str, fields: &UpdateFields) -> Result<ServerSnapshot>;

    /// Destroys a server without keeping its addresses.
    async fn destroy(&self, server_id: &str) -> Result<()>;

    /// Starts, stops or reboots a server.
    async fn power(&self, server_id: &str, action: PowerAction) -> Result<()>;
}

/// Looks a server up by id, then by hostname, and returns its full snapshot.
///
/// An exact id match wins over a hostname match. Returns `None` without any
/// request when neither key is given, and `None` when nothing matches.
///
/// # Errors
///
/// Returns an error if listing or fetching details fails.
pub async fn find_server<A: ServerApi + ?Sized>(
    api: &A,
    server_id: Option<&str>,
    hostname: Option<&str>,
) -> Result<Option<ServerSnapshot>> {
    if server_id.is_none() && hostname.is_none() {
        return Ok(None);
    }

    let servers = api.list().await?;

    let by_id = server_id.and_then(|id| servers.iter().find(|s| s.serverid == id));
    let matched = by_id.or_else(|| {
        hostname.and_then(|name| servers.iter().find(|s| s.hostname == name))
    });

    match matched {
        Some(summary) => {
            debug!("Found server {} ({})", summary.serverid, summary.hostname);
            api.details(&summary.serverid).await.map(Some)
        }
        None => {
            debug!("No server matches id {server_id:?} or hostname {hostname:?}");
            Ok(None)
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::glesys::types::SupportedFeatures;

    mockall::mock! {
        pub Api {}

        #[async_trait]
        impl ServerApi for Api {
            async fn list(&self) -> Result<Vec<ServerSummary>>;
            async fn details(&self, server_id: &str) -> Result<ServerSnapshot>;
            async fn status(&self, server_id: &str) -> Result<PowerState>;
            async fn create(&self, request: &CreateServerRequest) -> Result<ServerSnapshot>;
            async fn update(&self, server_id: &str, fields: &UpdateFields) -> Result<ServerSnapshot>;
            async fn destroy(&self, server_id: &str) -> Result<()>;
            async fn power(&self, server_id: &str, action: PowerAction) -> Result<()>;
        }
    }

    /// Builds a snapshot with the given id, hostname and state.
    pub fn snapshot(server_id: &str, hostname: &str, state: PowerState) -> ServerSnapshot {
        ServerSnapshot {
            serverid: server_id.to_string(),
            hostname: hostname.to_string(),
            datacenter: Some(String::from("Falkenberg")),
            platform: Some(String::from("VMware")),
            templatename: Some(String::from("Debian 9 64-bit")),
            cpucores: Some(1),
            memorysize: Some(2048),
            disksize: Some(20),
            bandwidth: Some(100),
            description: None,
            state: Some(state),
            iplist: Vec::new(),
            supportedfeatures: SupportedFeatures::default(),
        }
    }

    /// Builds a list entry.
    pub fn summary(server_id: &str, hostname: &str) -> ServerSummary {
        ServerSummary {
            serverid: server_id.to_string(),
            hostname: hostname.to_string(),
            datacenter: None,
            platform: None,
        }
    }
}
