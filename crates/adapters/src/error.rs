use std::path::PathBuf;

use thiserror::Error;

use crate::capability::Capability;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("{capability} support is not compiled in (rebuild with --features {feature})", feature = .capability.feature())]
    CapabilityUnavailable { capability: Capability },

    #[error("template error: {0}")]
    Template(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{service} API call failed ({error})")]
    Api { service: &'static str, error: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "kubernetes")]
    #[error("kubernetes client error: {0}")]
    Kube(String),
}

impl HookError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised before any remote call was attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::MissingCredential(_)
                | Self::ConnectionNotFound(_)
                | Self::CapabilityUnavailable { .. }
                | Self::Template(_)
        )
    }
}

pub type HookResult<T> = Result<T, HookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_embeds_remote_code() {
        let err = HookError::Api {
            service: "Slack",
            error: "channel_not_found".to_string(),
        };
        assert_eq!(err.to_string(), "Slack API call failed (channel_not_found)");
        assert!(!err.is_configuration());
    }

    #[test]
    fn capability_error_names_feature() {
        let err = HookError::CapabilityUnavailable {
            capability: Capability::Kubernetes,
        };
        assert!(err.to_string().contains("--features kubernetes"));
        assert!(err.is_configuration());
    }
}
