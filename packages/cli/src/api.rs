//! API Client
//!
//! HTTP client for communicating with the swarm agent REST API.

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;

const API_PREFIX: &str = "/api/swarm";

/// Error body returned by the swarm agent
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub reason: String,
}

/// Agent record as returned by the swarm agent
#[derive(Debug, Clone, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub terminated_at: Option<String>,
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create from saved config, `api_url` taking precedence
    pub fn from_config(api_url: Option<String>) -> Result<Self> {
        let base_url = match api_url {
            Some(url) => url,
            None => Config::load()?.api_url().to_string(),
        };
        Self::new(&base_url)
    }

    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Turn a non-success response into `[code] reason`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if let Ok(err) = serde_json::from_str::<ApiError>(&text) {
            bail!("[{}] {}", err.code, err.reason);
        }
        bail!("API request failed with status {}", status);
    }

    /// GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        let body = Self::check(response).await?.json().await?;
        Ok(body)
    }

    /// GET request expecting no content
    pub async fn get_empty(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::check(response).await?;
        Ok(())
    }

    /// POST request with a JSON body and a JSON response
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        let body = Self::check(response).await?.json().await?;
        Ok(body)
    }

    /// POST request expecting no content
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::check(response).await?;
        Ok(())
    }

    /// DELETE request
    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::check(response).await?;
        Ok(())
    }
}
