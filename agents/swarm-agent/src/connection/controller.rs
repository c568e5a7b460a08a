//! Controller Client
//!
//! The step source boundary of the dispatch loop, and its HTTP
//! implementation against the installation service's agent API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::agent::params::WorkerConfig;
use crate::connection::protocol::{HostRegistration, StepReply, Steps};

const AGENT_API_PREFIX: &str = "/api/assisted-install/v2";

/// Errors talking to the controller
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("controller request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("controller returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode controller response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid controller configuration: {0}")]
    Config(String),
}

impl ControllerError {
    /// Whether retrying can never succeed
    ///
    /// Authentication failures and an unknown host or infra-env end the
    /// agent; everything else is retried.
    pub fn is_fatal(&self) -> bool {
        match self {
            ControllerError::Status { status, .. } => matches!(status, 401 | 403 | 404),
            ControllerError::Config(_) => true,
            ControllerError::Transport(_) | ControllerError::Decode(_) => false,
        }
    }
}

/// Source of steps for one agent
#[async_trait]
pub trait StepSource: Send + Sync {
    /// Announce the host to the controller
    async fn register(&self) -> Result<(), ControllerError>;

    /// Fetch the next batch of steps
    async fn next_steps(&self) -> Result<Steps, ControllerError>;

    /// Report the result of one step
    async fn post_reply(&self, reply: &StepReply) -> Result<(), ControllerError>;
}

/// Builds the step source for a new agent
pub trait Connector: Send + Sync {
    fn connect(&self, config: &WorkerConfig) -> Result<Arc<dyn StepSource>, ControllerError>;
}

/// HTTP client for one agent's conversation with the installation service
pub struct ControllerClient {
    client: reqwest::Client,
    hosts_url: String,
    host_id: Uuid,
    agent_version: String,
}

impl ControllerClient {
    /// Create a client from the worker's connectivity settings
    pub fn new(config: &WorkerConfig, timeout: Duration) -> Result<Self, ControllerError> {
        let connectivity = &config.connectivity;
        let base_url = connectivity
            .target_url
            .as_deref()
            .ok_or_else(|| ControllerError::Config("service_url is required".to_string()))?;
        let infra_env_id = connectivity
            .infra_env_id
            .ok_or_else(|| ControllerError::Config("infra_env_id is required".to_string()))?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &connectivity.pull_secret_token {
            let value = HeaderValue::from_str(token).map_err(|e| {
                ControllerError::Config(format!("pull secret is not a valid header value: {e}"))
            })?;
            headers.insert("x-secret-key", value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .danger_accept_invalid_certs(connectivity.insecure_connection);

        if let Some(path) = &connectivity.ca_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                ControllerError::Config(format!(
                    "failed to read CA certificate {}: {e}",
                    path.display()
                ))
            })?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                ControllerError::Config(format!(
                    "failed to parse CA certificate {}: {e}",
                    path.display()
                ))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        Ok(Self {
            client: builder.build()?,
            hosts_url: format!(
                "{}{}/infra-envs/{}/hosts",
                base_url.trim_end_matches('/'),
                AGENT_API_PREFIX,
                infra_env_id
            ),
            host_id: config.host_id(),
            agent_version: connectivity.agent_version.clone(),
        })
    }

    fn instructions_url(&self) -> String {
        format!("{}/{}/instructions", self.hosts_url, self.host_id)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ControllerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ControllerError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl StepSource for ControllerClient {
    async fn register(&self) -> Result<(), ControllerError> {
        let registration = HostRegistration {
            host_id: self.host_id,
            discovery_agent_version: self.agent_version.clone(),
        };
        let response = self
            .client
            .post(&self.hosts_url)
            .json(&registration)
            .send()
            .await?;
        Self::check(response).await?;
        debug!(host_id = %self.host_id, "Host registered");
        Ok(())
    }

    async fn next_steps(&self) -> Result<Steps, ControllerError> {
        let response = self
            .client
            .get(self.instructions_url())
            .query(&[("discovery_agent_version", &self.agent_version)])
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;
        Ok(Steps::from_json(&body)?)
    }

    async fn post_reply(&self, reply: &StepReply) -> Result<(), ControllerError> {
        let response = self
            .client
            .post(self.instructions_url())
            .query(&[("discovery_agent_version", &self.agent_version)])
            .json(reply)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Connector creating one `ControllerClient` per agent
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, config: &WorkerConfig) -> Result<Arc<dyn StepSource>, ControllerError> {
        Ok(Arc::new(ControllerClient::new(config, self.timeout)?))
    }
}
