use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::connection::env::DEFAULT_ENV_PREFIX;
use crate::error::{HookError, HookResult};

pub const DEFAULT_CONFIG_FILE: &str = "taskhooks.toml";
pub const CONFIG_PATH_ENV: &str = "TASKHOOKS_CONFIG";

/// Top-level configuration, usually loaded from `taskhooks.toml`.
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub connections: ConnectionsConfig,
    pub slack: SlackSettings,
    pub kubernetes: KubernetesConfig,
    pub email: EmailConfig,
}

impl HooksConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> HookResult<Self> {
        toml::from_str(content)
            .map_err(|e| HookError::Config(format!("invalid configuration: {}", e)))
    }

    pub fn from_file(path: &Path) -> HookResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HookError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Load from `path`, else `$TASKHOOKS_CONFIG`, else `./taskhooks.toml`,
    /// else `~/.taskhooks/taskhooks.toml`.
    ///
    /// Missing default files yield the defaults; an explicitly named file
    /// must exist.
    pub fn load(path: Option<&Path>) -> HookResult<Self> {
        if let Some(p) = path {
            return Self::from_file(p);
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(Path::new(&p));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        if let Some(user) = user_config_path().filter(|p| p.exists()) {
            return Self::from_file(&user);
        }
        tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
        Ok(Self::default())
    }
}

/// `~/.taskhooks/taskhooks.toml`, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".taskhooks").join(DEFAULT_CONFIG_FILE))
}

/// Where named connections are looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionsConfig {
    /// Consult `<env_prefix><CONN_ID>` environment variables first.
    pub env_enabled: bool,
    pub env_prefix: String,
    /// Optional YAML/JSON/TOML connections file.
    pub file: Option<PathBuf>,
}

impl Default for ConnectionsConfig {
    fn default() -> Self {
        Self {
            env_enabled: true,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            file: None,
        }
    }
}

/// Slack Web API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            base_url: default_slack_base_url(),
            timeout_secs: 15,
        }
    }
}

pub fn default_slack_base_url() -> String {
    "https://slack.com/api".to_string()
}

/// Defaults for Kubernetes client construction. Explicit call arguments take
/// precedence over these values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    pub in_cluster: bool,
    pub cluster_context: Option<String>,
    pub config_file: Option<PathBuf>,
    pub namespace: Option<String>,
}

/// What the email backend does when the remote API rejects a send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailFailurePolicy {
    /// Return the error to the caller.
    #[default]
    Raise,
    /// Log a warning and report success without a transmission id.
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub from_email: Option<String>,
    pub from_name: Option<String>,
    /// Environment variable holding the SparkPost API key.
    pub api_key_env: String,
    /// Connection whose password is the API key, used when the variable is unset.
    pub connection_id: Option<String>,
    pub base_uri: String,
    pub failure_policy: EmailFailurePolicy,
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_email: None,
            from_name: None,
            api_key_env: "SPARKPOST_API_KEY".to_string(),
            connection_id: None,
            base_uri: default_sparkpost_base_uri(),
            failure_policy: EmailFailurePolicy::Raise,
            timeout_secs: 30,
        }
    }
}

pub fn default_sparkpost_base_uri() -> String {
    "https://api.sparkpost.com/api/v1".to_string()
}
