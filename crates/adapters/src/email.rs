//! Email message model and the backend seam.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HookResult;

/// Recipients given either as one delimited string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressList {
    Delimited(String),
    List(Vec<String>),
}

impl Default for AddressList {
    fn default() -> Self {
        AddressList::List(Vec::new())
    }
}

impl From<&str> for AddressList {
    fn from(s: &str) -> Self {
        AddressList::Delimited(s.to_string())
    }
}

impl From<Vec<String>> for AddressList {
    fn from(v: Vec<String>) -> Self {
        AddressList::List(v)
    }
}

impl AddressList {
    /// Split on `,` and `;`, trim, drop empties.
    pub fn addresses(&self) -> Vec<String> {
        match self {
            AddressList::Delimited(s) => split_addresses(s),
            AddressList::List(items) => items.iter().flat_map(|s| split_addresses(s)).collect(),
        }
    }
}

fn split_addresses(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalise `to`/`cc`/`bcc` input into individual addresses.
pub fn email_address_list(addresses: &AddressList) -> Vec<String> {
    addresses.addresses()
}

/// One outgoing HTML email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: AddressList,
    pub subject: String,
    pub html_content: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub cc: Option<AddressList>,
    #[serde(default)]
    pub bcc: Option<AddressList>,
    #[serde(default)]
    pub from_email: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
}

impl EmailMessage {
    pub fn new(to: impl Into<AddressList>, subject: &str, html_content: &str) -> Self {
        Self {
            to: to.into(),
            subject: subject.to_string(),
            html_content: html_content.to_string(),
            ..Self::default()
        }
    }
}

/// A service that delivers [`EmailMessage`]s.
#[async_trait]
pub trait EmailBackend: Send + Sync {
    /// Send one message. Returns the remote transmission id when one was
    /// obtained; `Ok(None)` means a failure was handled under a non-raising
    /// policy.
    async fn send_email(&self, message: &EmailMessage) -> HookResult<Option<String>>;
}
