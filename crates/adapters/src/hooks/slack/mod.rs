//! Slack Web API hook: post messages, upload files, call any method.

pub mod api;

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::SlackSettings;
use crate::connection::ConnectionStore;
use crate::credential::resolve_credential;
use crate::error::{HookError, HookResult};

pub use api::{FileUpload, SlackApiClient, SlackResponse, SlackTransport};

/// Talks to Slack with a single resolved token.
///
/// Accepts either a token directly or the id of a connection whose password
/// is the token; when both are supplied the token is used.
#[derive(Clone)]
pub struct SlackWebApiHook {
    transport: Arc<dyn SlackTransport>,
    source: Option<String>,
}

impl SlackWebApiHook {
    pub async fn new(
        token: Option<&str>,
        slack_conn_id: Option<&str>,
        store: &dyn ConnectionStore,
        settings: &SlackSettings,
    ) -> HookResult<Self> {
        let (credential, _) = resolve_credential(token, slack_conn_id, store).await?;
        let client = SlackApiClient::new(credential, settings)?;
        Ok(Self::with_transport(Arc::new(client)))
    }

    /// Use an already constructed client handle.
    pub fn with_transport(transport: Arc<dyn SlackTransport>) -> Self {
        Self {
            transport,
            source: None,
        }
    }

    /// Tag log lines with the task that issued the call.
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    /// Post a message to `channel_id`. At least one of `text` or `blocks`
    /// must carry content.
    pub async fn post_message(
        &self,
        channel_id: &str,
        text: Option<&str>,
        blocks: Option<&Value>,
    ) -> HookResult<SlackResponse> {
        require_channel(channel_id)?;
        let text = text.filter(|t| !t.is_empty());
        let blocks = blocks.filter(|b| !is_empty_json(b));
        if text.is_none() && blocks.is_none() {
            return Err(HookError::InvalidRequest(
                "either text or blocks must be provided".to_string(),
            ));
        }

        let mut params = Map::new();
        params.insert("channel".to_string(), Value::String(channel_id.to_string()));
        if let Some(text) = text {
            params.insert("text".to_string(), Value::String(text.to_string()));
        }
        if let Some(blocks) = blocks {
            params.insert("blocks".to_string(), blocks.clone());
        }

        let resp = self.transport.call("chat.postMessage", params).await?.into_result()?;
        tracing::info!(
            channel = %channel_id,
            ts = resp.get_str("ts").unwrap_or("-"),
            source = self.source.as_deref().unwrap_or("-"),
            "Slack message posted"
        );
        Ok(resp)
    }

    /// Upload a local file to `channel_id`.
    pub async fn post_file(
        &self,
        file_path: &Path,
        channel_id: &str,
        title: Option<&str>,
        comment: Option<&str>,
    ) -> HookResult<SlackResponse> {
        require_channel(channel_id)?;
        if file_path.as_os_str().is_empty() {
            return Err(HookError::InvalidRequest("file path is empty".to_string()));
        }

        let content = tokio::fs::read(file_path)
            .await
            .map_err(|e| HookError::io(file_path, e))?;
        let filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mut fields = vec![
            ("channels".to_string(), channel_id.to_string()),
            ("filename".to_string(), filename.clone()),
        ];
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            fields.push(("title".to_string(), title.to_string()));
        }
        if let Some(comment) = comment.filter(|c| !c.is_empty()) {
            fields.push(("initial_comment".to_string(), comment.to_string()));
        }

        let size = content.len();
        let resp = self
            .transport
            .upload("files.upload", fields, FileUpload { filename, content })
            .await?
            .into_result()?;
        tracing::info!(
            channel = %channel_id,
            path = %file_path.display(),
            bytes = size,
            source = self.source.as_deref().unwrap_or("-"),
            "Slack file uploaded"
        );
        Ok(resp)
    }

    /// Call any Web API method with arbitrary parameters.
    pub async fn call(&self, method: &str, api_params: Map<String, Value>) -> HookResult<SlackResponse> {
        if method.is_empty() {
            return Err(HookError::InvalidRequest("method name is empty".to_string()));
        }
        let resp = self.transport.call(method, api_params).await?.into_result()?;
        tracing::debug!(method, source = self.source.as_deref().unwrap_or("-"), "Slack API call succeeded");
        Ok(resp)
    }
}

fn require_channel(channel_id: &str) -> HookResult<()> {
    if channel_id.trim().is_empty() {
        return Err(HookError::InvalidRequest("channel is required".to_string()));
    }
    Ok(())
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
