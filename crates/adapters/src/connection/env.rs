//! Environment variable connection store.
//!
//! A connection `slack_default` is read from `TASKHOOKS_CONN_SLACK_DEFAULT`
//! as a connection URI. Read-only.

use async_trait::async_trait;

use super::{Connection, ConnectionStore};
use crate::error::HookResult;

pub const DEFAULT_ENV_PREFIX: &str = "TASKHOOKS_CONN_";

pub struct EnvConnectionStore {
    prefix: String,
}

impl EnvConnectionStore {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn var_name(&self, conn_id: &str) -> String {
        format!("{}{}", self.prefix, conn_id.to_uppercase())
    }
}

impl Default for EnvConnectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionStore for EnvConnectionStore {
    async fn get_connection(&self, conn_id: &str) -> HookResult<Option<Connection>> {
        match std::env::var(self.var_name(conn_id)) {
            Ok(uri) if !uri.trim().is_empty() => Connection::from_uri(conn_id, uri.trim()).map(Some),
            // Unset, empty, or not valid Unicode: this store has nothing.
            _ => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "env"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn var_name_uppercases_id() {
        let store = EnvConnectionStore::new();
        assert_eq!(store.var_name("slack_default"), "TASKHOOKS_CONN_SLACK_DEFAULT");
    }

    #[tokio::test]
    #[serial]
    async fn reads_uri_from_env() {
        std::env::set_var("TESTHOOKS_CONN_SLACK_OPS", "https://:xoxb-abc@slack.com");
        let store = EnvConnectionStore::with_prefix("TESTHOOKS_CONN_");
        let conn = store.get_connection("slack_ops").await.unwrap().unwrap();
        assert_eq!(conn.password(), Some("xoxb-abc"));
        std::env::remove_var("TESTHOOKS_CONN_SLACK_OPS");
    }

    #[tokio::test]
    #[serial]
    async fn unset_var_is_none() {
        std::env::remove_var("TESTHOOKS_CONN_NOPE");
        let store = EnvConnectionStore::with_prefix("TESTHOOKS_CONN_");
        assert!(store.get_connection("nope").await.unwrap().is_none());
    }
}
