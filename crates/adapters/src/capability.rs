//! Compile-time adapter availability.
//!
//! Each external service is behind a cargo feature. Callers check the
//! capability when a task is configured, so a missing client library is a
//! startup error rather than a failure halfway through a run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HookError, HookResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Slack,
    Kubernetes,
    Email,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Slack, Capability::Kubernetes, Capability::Email];

    /// Cargo feature that provides this capability.
    pub fn feature(&self) -> &'static str {
        match self {
            Capability::Slack => "slack",
            Capability::Kubernetes => "kubernetes",
            Capability::Email => "sparkpost",
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            Capability::Slack => cfg!(feature = "slack"),
            Capability::Kubernetes => cfg!(feature = "kubernetes"),
            Capability::Email => cfg!(feature = "sparkpost"),
        }
    }

    pub fn require(self) -> HookResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(HookError::CapabilityUnavailable { capability: self })
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Slack => write!(f, "Slack"),
            Capability::Kubernetes => write!(f, "Kubernetes"),
            Capability::Email => write!(f, "SparkPost email"),
        }
    }
}

/// Capabilities compiled into this build.
pub fn available_capabilities() -> Vec<Capability> {
    Capability::ALL
        .into_iter()
        .filter(Capability::is_available)
        .collect()
}
