//! Reqwest-based client for the hub's job-launch API.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;

const DEFAULT_HUB_BASE: &str = "https://nanohub.org/api";

/// JSON body submitted to the job-launch endpoint: a tool name and the
/// driver XML describing the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub app: String,
    pub xml: String,
}

/// A session with the hub's tool-execution service.
///
/// `get_results` yields `None` while the run has not finished; callers
/// decide when to ask again.
#[async_trait]
pub trait ToolSession {
    async fn launch_tool(&self, request: &LaunchRequest) -> Result<String>;
    async fn get_results(&self, session_id: &str) -> Result<Option<String>>;
}

#[derive(Debug)]
pub struct HubClient {
    http: Client,
    base: String,
    token: Option<String>,
}

impl HubClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base = cfg
            .get("HUB_API_BASE")
            .unwrap_or_else(|| DEFAULT_HUB_BASE.to_string());
        let token = cfg.get("HUB_ACCESS_TOKEN").filter(|s| !s.trim().is_empty());
        let timeout_secs = cfg
            .get("REQUEST_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        Self::with_timeout(base, token, Duration::from_secs(timeout_secs))
    }

    pub fn new(base: impl Into<String>, token: Option<String>) -> Result<Self> {
        Self::with_timeout(base, token, Duration::from_secs(60))
    }

    fn with_timeout(
        base: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let base = base.into().trim_end_matches('/').to_string();
        Ok(Self { http, base, token })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ToolSession for HubClient {
    async fn launch_tool(&self, request: &LaunchRequest) -> Result<String> {
        let url = format!("{}/tools/run", self.base);
        debug!(app = %request.app, "launching tool");

        let resp = self
            .authorized(self.http.post(&url))
            .json(request)
            .send()
            .await
            .context("failed to send launch request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("tool launch failed: {} - {}", status, text);
        }

        let body: Value = resp.json().await.context("launch response is not JSON")?;
        let session_id = match body.get("session") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => bail!("launch response has no session id: {}", body),
        };
        debug!(%session_id, "tool launched");
        Ok(session_id)
    }

    async fn get_results(&self, session_id: &str) -> Result<Option<String>> {
        let url = format!("{}/tools/output/{}", self.base, session_id);
        let resp = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .context("failed to fetch run output")?;

        match resp.status() {
            // Run still in progress
            StatusCode::ACCEPTED => Ok(None),
            StatusCode::OK => {
                let body: Value = resp.json().await.context("output response is not JSON")?;
                Ok(body
                    .get("run")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()))
            }
            status => {
                let text = resp.text().await.unwrap_or_default();
                bail!("fetching run output failed: {} - {}", status, text)
            }
        }
    }
}
