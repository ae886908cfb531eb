//! SparkPost transmissions API client.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use crate::credential::Credential;
use crate::error::{HookError, HookResult};

/// One mailbox; `header_to` is the `To:` header shown to cc/bcc recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_to: Option<String>,
}

/// Entry of the transmission's `recipients` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: Address,
}

/// Inline `content` block of a transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub from: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attachments: Vec<Attachment>,
}

/// Body of `POST /transmissions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transmission {
    pub recipients: Vec<Recipient>,
    pub content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_path: Option<String>,
}

impl Transmission {
    /// Build the recipient list. Cc and bcc recipients carry the primary
    /// recipients in `header_to`; cc addresses also go into the `CC` header.
    pub fn new(to: &[String], cc: &[String], bcc: &[String], content: Content) -> Self {
        let header_to = to.join(",");
        let mut content = content;
        if !cc.is_empty() {
            content.headers.insert("CC".to_string(), cc.join(", "));
        }

        let primary = to.iter().map(|email| Recipient {
            address: Address {
                email: email.clone(),
                header_to: None,
            },
        });
        let copies = cc.iter().chain(bcc.iter()).map(|email| Recipient {
            address: Address {
                email: email.clone(),
                header_to: Some(header_to.clone()),
            },
        });

        Self {
            recipients: primary.chain(copies).collect(),
            content,
            return_path: None,
        }
    }
}

/// `results` block of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransmissionResult {
    pub id: String,
    #[serde(default)]
    pub total_accepted_recipients: u64,
    #[serde(default)]
    pub total_rejected_recipients: u64,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    results: TransmissionResult,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    code: Option<String>,
    description: Option<String>,
}

fn describe_errors(status: reqwest::StatusCode, body: &str) -> String {
    let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
    let details: Vec<String> = parsed
        .errors
        .iter()
        .map(|e| {
            let mut s = e.message.clone();
            if let Some(ref code) = e.code {
                s.push_str(&format!(" [{}]", code));
            }
            if let Some(ref d) = e.description {
                s.push_str(&format!(": {}", d));
            }
            s
        })
        .collect();
    if details.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), details.join("; "))
    }
}

/// Something that can submit a transmission.
#[async_trait]
pub trait TransmissionSender: Send + Sync {
    async fn send(&self, transmission: &Transmission) -> HookResult<TransmissionResult>;
}

/// reqwest-backed SparkPost client bound to one API key.
#[derive(Clone)]
pub struct SparkPostClient {
    client: reqwest::Client,
    api_key: Credential,
    base_uri: String,
}

impl SparkPostClient {
    pub fn new(api_key: Credential, base_uri: &str, timeout_secs: u64) -> HookResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HookError::Transport(format!("HTTP client init: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            base_uri: base_uri.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TransmissionSender for SparkPostClient {
    async fn send(&self, transmission: &Transmission) -> HookResult<TransmissionResult> {
        let resp = self
            .client
            .post(format!("{}/transmissions", self.base_uri))
            .header(reqwest::header::AUTHORIZATION, self.api_key.expose())
            .json(transmission)
            .send()
            .await
            .map_err(|e| HookError::Transport(format!("transmission send failed: {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| HookError::Transport(format!("transmission read failed: {}", e)))?;

        if !status.is_success() {
            return Err(HookError::Api {
                service: "SparkPost",
                error: describe_errors(status, &body),
            });
        }

        let parsed: SendResponse = serde_json::from_str(&body)
            .map_err(|e| HookError::Parse(format!("transmission response: {}", e)))?;
        Ok(parsed.results)
    }
}
