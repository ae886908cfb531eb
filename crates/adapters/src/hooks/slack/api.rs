//! Slack Web API client.
//!
//! Every Web API method answers with a JSON envelope carrying `ok` and, on
//! failure, an `error` code. JSON-bodied methods go through [`SlackTransport::call`];
//! `files.upload` needs a multipart body and goes through [`SlackTransport::upload`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::SlackSettings;
use crate::credential::Credential;
use crate::error::{HookError, HookResult};

/// Envelope returned by every Slack Web API method.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SlackResponse {
    #[serde(default)]
    pub ok: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
    /// Method-specific fields (`ts`, `channel`, `file`, ...).
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SlackResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// Treat `ok: false` (or a missing `ok`) as a failed call.
    pub fn into_result(self) -> HookResult<Self> {
        if self.ok {
            if let Some(ref warning) = self.warning {
                tracing::warn!(warning = %warning, "Slack API returned a warning");
            }
            Ok(self)
        } else {
            Err(HookError::Api {
                service: "Slack",
                error: self.error.unwrap_or_else(|| "unknown_error".to_string()),
            })
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.rest.get(key).and_then(Value::as_str)
    }
}

/// File contents for a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A handle capable of performing Slack Web API calls.
#[async_trait]
pub trait SlackTransport: Send + Sync {
    /// Invoke `method` with a JSON object body.
    async fn call(&self, method: &str, params: Map<String, Value>) -> HookResult<SlackResponse>;

    /// Invoke `method` with a multipart body of text fields plus one file.
    async fn upload(
        &self,
        method: &str,
        fields: Vec<(String, String)>,
        file: FileUpload,
    ) -> HookResult<SlackResponse>;
}

/// reqwest-backed Slack client bound to one token.
#[derive(Clone)]
pub struct SlackApiClient {
    client: reqwest::Client,
    token: Credential,
    base_url: String,
}

impl SlackApiClient {
    pub fn new(token: Credential, settings: &SlackSettings) -> HookResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| HookError::Transport(format!("HTTP client init: {}", e)))?;

        Ok(Self {
            client,
            token,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn read_envelope(method: &str, resp: reqwest::Response) -> HookResult<SlackResponse> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| HookError::Transport(format!("{} read failed: {}", method, e)))?;

        match serde_json::from_str::<SlackResponse>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(HookError::Api {
                service: "Slack",
                error: format!("HTTP {}", status),
            }),
            Err(e) => Err(HookError::Parse(format!("{} parse: {}", method, e))),
        }
    }
}

#[async_trait]
impl SlackTransport for SlackApiClient {
    async fn call(&self, method: &str, params: Map<String, Value>) -> HookResult<SlackResponse> {
        let resp = self
            .client
            .post(self.method_url(method))
            .bearer_auth(self.token.expose())
            .json(&params)
            .send()
            .await
            .map_err(|e| HookError::Transport(format!("{} failed: {}", method, e)))?;

        Self::read_envelope(method, resp).await
    }

    async fn upload(
        &self,
        method: &str,
        fields: Vec<(String, String)>,
        file: FileUpload,
    ) -> HookResult<SlackResponse> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name, value);
        }
        let part = reqwest::multipart::Part::bytes(file.content).file_name(file.filename);
        form = form.part("file", part);

        let resp = self
            .client
            .post(self.method_url(method))
            .bearer_auth(self.token.expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| HookError::Transport(format!("{} failed: {}", method, e)))?;

        Self::read_envelope(method, resp).await
    }
}
