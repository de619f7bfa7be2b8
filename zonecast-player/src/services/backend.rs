//! Backend REST client
//!
//! Thin wrapper over `reqwest` shared by the playback control client and
//! the catalog client: base URL joining, bearer authentication and mapping
//! of non-2xx responses onto [`Error::RemoteApi`].

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use zonecast_common::config::RemoteConfig;

const USER_AGENT: &str = concat!("zonecast-player/", env!("CARGO_PKG_VERSION"));

/// Authenticated client for the backend API
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config
                .token
                .clone()
                .filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/playback/control/play/`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.authorize(self.http.get(&url)).send().await?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::RemoteApi(format!("Invalid response from {}: {}", url, e)))
    }

    /// POST a JSON body, discarding any response body
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self.authorize(self.http.post(&url)).json(body).send().await?;
        check_status(response).await?;
        Ok(())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Map a non-2xx response onto a RemoteApi error
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
    Err(Error::RemoteApi(message))
}

/// Extract the backend's human-readable error text
///
/// Looks at `detail`, then `message`, then `error`. Non-JSON bodies are
/// returned as-is when not blank.
pub fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => ["detail", "message", "error"]
            .iter()
            .filter_map(|key| value.get(*key))
            .find_map(|v| v.as_str().map(str::to_string)),
        Err(_) => {
            let text = body.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
    }
}
