//! In-memory provider shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use glesys_server::error::{ApiError, GlesysError, Result};
use glesys_server::glesys::{
    generate_password, CreateServerRequest, IpAddress, PowerAction, PowerState, ServerApi,
    ServerSnapshot, ServerSummary, SupportedFeatures, UpdateFields, GENERATED_PASSWORD_LENGTH,
};

#[derive(Default)]
struct FakeState {
    servers: Vec<ServerSnapshot>,
    next_id: u32,
    calls: Vec<&'static str>,
    created: Vec<CreateServerRequest>,
    locked_polls: u32,
}

/// A provider that keeps its servers in memory and records every call.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an existing server.
    pub fn with_server(self, server: ServerSnapshot) -> Self {
        self.state.lock().unwrap().servers.push(server);
        self
    }

    /// Makes the next `polls` status calls report `locked`. Details report
    /// `locked` until then.
    pub fn locked_for(self, polls: u32) -> Self {
        self.state.lock().unwrap().locked_polls = polls;
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == name)
            .count()
    }

    pub fn mutations(&self) -> usize {
        ["create", "update", "destroy", "power"]
            .iter()
            .map(|name| self.calls(name))
            .sum()
    }

    pub fn server(&self, hostname: &str) -> Option<ServerSnapshot> {
        self.state
            .lock()
            .unwrap()
            .servers
            .iter()
            .find(|s| s.hostname == hostname)
            .cloned()
    }

    pub fn created(&self) -> Vec<CreateServerRequest> {
        self.state.lock().unwrap().created.clone()
    }

    fn record(&self, call: &'static str) -> std::sync::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

fn not_found(server_id: &str) -> GlesysError {
    ApiError::ServerNotFound {
        server_id: server_id.to_string(),
    }
    .into()
}

/// A running server with one IPv6 and one IPv4 address, in that order.
pub fn server(server_id: &str, hostname: &str) -> ServerSnapshot {
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
        state: Some(PowerState::Running),
        iplist: vec![
            IpAddress {
                ipaddress: String::from("2a02:750:7::1"),
                version: 6,
            },
            IpAddress {
                ipaddress: String::from("192.0.2.10"),
                version: 4,
            },
        ],
        supportedfeatures: SupportedFeatures {
            editbandwidth: false,
        },
    }
}

#[async_trait]
impl ServerApi for FakeApi {
    async fn list(&self) -> Result<Vec<ServerSummary>> {
        let state = self.record("list");
        Ok(state
            .servers
            .iter()
            .map(|s| ServerSummary {
                serverid: s.serverid.clone(),
                hostname: s.hostname.clone(),
                datacenter: s.datacenter.clone(),
                platform: s.platform.clone(),
            })
            .collect())
    }

    async fn details(&self, server_id: &str) -> Result<ServerSnapshot> {
        let state = self.record("details");
        let mut server = state
            .servers
            .iter()
            .find(|s| s.serverid == server_id)
            .cloned()
            .ok_or_else(|| not_found(server_id))?;
        if state.locked_polls > 0 {
            server.state = Some(PowerState::Locked);
        }
        Ok(server)
    }

    async fn status(&self, server_id: &str) -> Result<PowerState> {
        let mut state = self.record("status");
        if state.locked_polls > 0 {
            state.locked_polls -= 1;
            return Ok(PowerState::Locked);
        }
        state
            .servers
            .iter()
            .find(|s| s.serverid == server_id)
            .and_then(|s| s.state.clone())
            .ok_or_else(|| not_found(server_id))
    }

    async fn create(&self, request: &CreateServerRequest) -> Result<ServerSnapshot> {
        let mut request = request.clone();
        if request.rootpassword.trim().is_empty() {
            request.rootpassword = generate_password(GENERATED_PASSWORD_LENGTH)?;
        }

        let mut state = self.record("create");
        state.next_id += 1;
        let mut created = server(&format!("wps{}", state.next_id), &request.hostname);
        created.datacenter = Some(request.datacenter.clone());
        created.platform = Some(request.platform.clone());
        created.templatename = Some(request.templatename.clone());
        created.cpucores = Some(request.cpucores);
        created.memorysize = Some(request.memorysize);
        created.disksize = Some(request.disksize);
        created.bandwidth = Some(request.bandwidth);
        created.description = request.description.clone();

        state.servers.push(created.clone());
        state.created.push(request);
        Ok(created)
    }

    async fn update(&self, server_id: &str, fields: &UpdateFields) -> Result<ServerSnapshot> {
        if fields.is_empty() {
            return Err(GlesysError::invalid_argument("empty edit"));
        }

        let mut state = self.record("update");
        let server = state
            .servers
            .iter_mut()
            .find(|s| s.serverid == server_id)
            .ok_or_else(|| not_found(server_id))?;

        if let Some(v) = fields.cpucores {
            server.cpucores = Some(v);
        }
        if let Some(v) = fields.disksize {
            server.disksize = Some(v);
        }
        if let Some(v) = fields.memorysize {
            server.memorysize = Some(v);
        }
        if let Some(v) = fields.bandwidth {
            server.bandwidth = Some(v);
        }
        if let Some(v) = &fields.hostname {
            server.hostname.clone_from(v);
        }
        Ok(server.clone())
    }

    async fn destroy(&self, server_id: &str) -> Result<()> {
        let mut state = self.record("destroy");
        let before = state.servers.len();
        state.servers.retain(|s| s.serverid != server_id);
        if state.servers.len() == before {
            return Err(not_found(server_id));
        }
        Ok(())
    }

    async fn power(&self, server_id: &str, action: PowerAction) -> Result<()> {
        let mut state = self.record("power");
        let server = state
            .servers
            .iter_mut()
            .find(|s| s.serverid == server_id)
            .ok_or_else(|| not_found(server_id))?;
        server.state = Some(match action {
            PowerAction::Start | PowerAction::Reboot => PowerState::Running,
            PowerAction::Stop => PowerState::Stopped,
        });
        Ok(())
    }
}
