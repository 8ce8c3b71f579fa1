//! GleSYS API client implementation.
//!
//! Reads are `GET {endpoint}/server/{function}/{key}/{value}/...`, mutations
//! are `POST {endpoint}/server/{function}` with a JSON body. Both use HTTP
//! Basic authentication with the project name and API key.

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::config::Credentials;
use crate::error::{ApiError, GlesysError, Result};

use super::api::ServerApi;
use super::password::{generate_password, GENERATED_PASSWORD_LENGTH};
use super::types::{
    CreateServerRequest, PowerAction, PowerState, ServerSnapshot, ServerSummary, UpdateFields,
};

/// GleSYS API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://api.glesys.com";

/// Request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// GleSYS API client.
#[derive(Clone)]
pub struct GlesysClient {
    /// HTTP client.
    client: Client,
    /// Base URL, without the `/server` suffix.
    endpoint: String,
    /// Project (account) name, the Basic auth user.
    project: String,
    /// API key, the Basic auth password.
    api_key: String,
}

impl fmt::Debug for GlesysClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlesysClient")
            .field("endpoint", &self.endpoint)
            .field("project", &self.project)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GlesysClient {
    /// Creates a client for the public GleSYS endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project: credentials.project.clone(),
            api_key: credentials.api_key.clone(),
        })
    }

    /// Points the client at another base URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builds `{endpoint}/server/{function}/{k1}/{v1}/...`.
    fn url(&self, function: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            GlesysError::invalid_argument(format!("invalid endpoint '{}': {e}", self.endpoint))
        })?;

        url.path_segments_mut()
            .map_err(|()| {
                GlesysError::invalid_argument(format!(
                    "endpoint '{}' cannot carry a path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(["server", function])
            .extend(params.iter().flat_map(|(k, v)| [*k, *v]));

        Ok(url)
    }

    /// Issues a GET with key/value pairs encoded as path segments.
    async fn query<T: DeserializeOwned>(
        &self,
        function: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.url(function, params)?;
        self.send::<T, ()>(Method::GET, url, None).await
    }

    /// Issues a POST with a JSON body.
    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        function: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(function, &[])?;
        self.send(Method::POST, url, Some(body)).await
    }

    /// Sends one request and decodes the `response` envelope.
    async fn send<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        trace!("{method} {url}");

        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.project, Some(&self.api_key))
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::network(format!("Request failed: {e}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response body: {e}")))?;

        parse_response(status, &text)
    }
}

/// Decodes a raw API answer.
///
/// Every answer is wrapped in a `response` object. Status 400 and above
/// becomes a provider error carrying `response.status.text`, or the raw body
/// if that cannot be read, or the HTTP reason phrase if the body is empty.
/// An empty body decodes as `{}`.
fn parse_response<T: DeserializeOwned>(status: u16, text: &str) -> Result<T> {
    let body: Option<Value> = if text.trim().is_empty() {
        Some(Value::Object(Map::new()))
    } else {
        serde_json::from_str(text).ok()
    };

    if status >= 400 {
        let message = body
            .as_ref()
            .and_then(|b| b.pointer("/response/status/text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| (!text.trim().is_empty()).then(|| text.to_string()))
            .or_else(|| {
                StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_string)
            })
            .unwrap_or_default();
        return Err(ApiError::provider(status, message).into());
    }

    let Some(Value::Object(mut body)) = body else {
        return Err(ApiError::invalid_response("response body is not a JSON object").into());
    };
    let response = body
        .remove("response")
        .unwrap_or_else(|| Value::Object(Map::new()));

    serde_json::from_value(response)
        .map_err(|e| ApiError::invalid_response(format!("Failed to parse response: {e}")).into())
}

#[derive(Debug, Deserialize)]
struct ServerEnvelope {
    server: ServerSnapshot,
}

#[derive(Serialize)]
struct ServerIdBody<'a> {
    serverid: &'a str,
}

#[async_trait]
impl ServerApi for GlesysClient {
    async fn list(&self) -> Result<Vec<ServerSummary>> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            servers: Vec<ServerSummary>,
        }

        let response: Response = self.query("list", &[]).await?;
        debug!("Listed {} servers", response.servers.len());
        Ok(response.servers)
    }

    async fn details(&self, server_id: &str) -> Result<ServerSnapshot> {
        let response: ServerEnvelope = self
            .query(
                "details",
                &[("serverid", server_id), ("includestate", "true")],
            )
            .await
            .map_err(|e| match e {
                GlesysError::Api(ApiError::Provider { status: 404, .. }) => {
                    GlesysError::Api(ApiError::ServerNotFound {
                        server_id: server_id.to_string(),
                    })
                }
                other => other,
            })?;
        Ok(response.server)
    }

    async fn status(&self, server_id: &str) -> Result<PowerState> {
        #[derive(Deserialize)]
        struct Server {
            state: PowerState,
        }
        #[derive(Deserialize)]
        struct Response {
            server: Server,
        }

        let response: Response = self.query("status", &[("serverid", server_id)]).await?;
        Ok(response.server.state)
    }

    async fn create(&self, request: &CreateServerRequest) -> Result<ServerSnapshot> {
        let mut request = request.clone();
        if request.rootpassword.trim().is_empty() {
            debug!("No root password given, generating one");
            request.rootpassword = generate_password(GENERATED_PASSWORD_LENGTH)?;
        }

        info!(
            "Creating server {} in {} ({})",
            request.hostname, request.datacenter, request.platform
        );
        let response: ServerEnvelope = self.post("create", &request).await?;
        Ok(response.server)
    }

    async fn update(&self, server_id: &str, fields: &UpdateFields) -> Result<ServerSnapshot> {
        #[derive(Serialize)]
        struct Body<'a> {
            serverid: &'a str,
            #[serde(flatten)]
            fields: &'a UpdateFields,
        }

        if fields.is_empty() {
            return Err(GlesysError::invalid_argument(
                "refusing to send an edit without any field",
            ));
        }

        info!("Editing server {server_id}: {}", fields.names().join(", "));
        let response: ServerEnvelope = self
            .post("edit", &Body { serverid: server_id, fields })
            .await?;
        Ok(response.server)
    }

    async fn destroy(&self, server_id: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            serverid: &'a str,
            keepip: &'static str,
        }

        info!("Destroying server {server_id}");
        let _: Value = self
            .post(
                "destroy",
                &Body {
                    serverid: server_id,
                    keepip: "false",
                },
            )
            .await?;
        Ok(())
    }

    async fn power(&self, server_id: &str, action: PowerAction) -> Result<()> {
        info!("Sending {action} to server {server_id}");
        let _: Value = self
            .post(action.function(), &ServerIdBody { serverid: server_id })
            .await?;
        Ok(())
    }
}
