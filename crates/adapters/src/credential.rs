//! Credential resolution shared by every hook.
//!
//! A hook accepts an explicit secret and/or the id of a stored connection.
//! The explicit value wins; otherwise the connection's password field is used.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::connection::ConnectionStore;
use crate::error::{HookError, HookResult};

/// An opaque secret (API token, API key).
///
/// Never printed: `Debug` is redacted and there is no `Display`. The buffer is
/// wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret. Empty input is rejected.
    pub fn new(value: impl Into<String>) -> HookResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(HookError::MissingCredential(
                "credential value is empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Where a resolved credential came from. Safe to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit,
    Connection(String),
}

/// Resolve the secret a hook should use.
///
/// 1. a non-empty `explicit` value,
/// 2. the password of connection `connection_id` in `store`,
/// 3. otherwise a configuration error.
pub async fn resolve_credential(
    explicit: Option<&str>,
    connection_id: Option<&str>,
    store: &dyn ConnectionStore,
) -> HookResult<(Credential, CredentialSource)> {
    if let Some(value) = explicit.filter(|v| !v.is_empty()) {
        tracing::info!("using explicitly supplied credential");
        return Ok((Credential::new(value)?, CredentialSource::Explicit));
    }

    let Some(conn_id) = connection_id.filter(|c| !c.is_empty()) else {
        return Err(HookError::MissingCredential(
            "no usable credential supplied: neither a secret nor a connection id was given"
                .to_string(),
        ));
    };

    let conn = store
        .get_connection(conn_id)
        .await?
        .ok_or_else(|| HookError::ConnectionNotFound(conn_id.to_string()))?;

    let password = conn.password().ok_or_else(|| {
        HookError::MissingCredential(format!(
            "Missing token(password) in connection '{}'",
            conn_id
        ))
    })?;

    tracing::info!(conn_id, "using credential from stored connection");
    Ok((
        Credential::new(password)?,
        CredentialSource::Connection(conn_id.to_string()),
    ))
}
