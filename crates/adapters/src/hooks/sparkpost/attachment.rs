use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{HookError, HookResult};

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// An inline attachment as the transmissions API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Base64 of the file contents.
    pub data: String,
}

impl Attachment {
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            mime_type: guess_mime_type(name),
            data: STANDARD.encode(bytes),
        }
    }

    /// Read the whole file and encode it. No size limit is applied.
    pub async fn from_path(path: &Path) -> HookResult<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                HookError::InvalidRequest(format!("attachment path has no file name: {}", path.display()))
            })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| HookError::io(path, e))?;
        Ok(Self::from_bytes(&name, &bytes))
    }

    pub fn decode(&self) -> HookResult<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| HookError::Parse(format!("attachment {}: {}", self.name, e)))
    }
}

/// MIME type from the file extension, `application/octet-stream` if unknown.
pub fn guess_mime_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}
