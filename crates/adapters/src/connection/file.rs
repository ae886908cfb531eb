//! File-backed connection store.
//!
//! The file maps connection ids to either a URI string or a record:
//!
//! ```yaml
//! slack_default:
//!   conn_type: slack
//!   password: xoxb-...
//! sparkpost: "https://:api-key@api.sparkpost.com"
//! ```
//!
//! YAML, JSON and TOML are accepted, chosen by extension. The file is read on
//! every lookup so edits take effect without a restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::{Connection, ConnectionStore};
use crate::error::{HookError, HookResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> HookResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(HookError::Config(format!(
                "unsupported connections file extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Uri(String),
    Record(Connection),
}

pub struct FileConnectionStore {
    path: PathBuf,
}

impl FileConnectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> HookResult<HashMap<String, FileEntry>> {
        let format = FileFormat::from_path(&self.path)?;
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| HookError::io(&self.path, e))?;
        parse_entries(&content, format).map_err(|e| {
            HookError::Parse(format!(
                "failed to parse connections file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

fn parse_entries(content: &str, format: FileFormat) -> Result<HashMap<String, FileEntry>, String> {
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    match format {
        FileFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        FileFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        FileFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}

#[async_trait]
impl ConnectionStore for FileConnectionStore {
    async fn get_connection(&self, conn_id: &str) -> HookResult<Option<Connection>> {
        let mut entries = self.load().await?;
        match entries.remove(conn_id) {
            Some(FileEntry::Uri(uri)) => Connection::from_uri(conn_id, &uri).map(Some),
            Some(FileEntry::Record(mut conn)) => {
                conn.conn_id = conn_id.to_string();
                Ok(Some(conn))
            }
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn yaml_record_and_uri_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "connections.yaml",
            "slack_default:\n  conn_type: slack\n  password: xoxb-1\nsparkpost: \"https://:key-2@api.sparkpost.com\"\n",
        );
        let store = FileConnectionStore::new(path);

        let slack = store.get_connection("slack_default").await.unwrap().unwrap();
        assert_eq!(slack.conn_id, "slack_default");
        assert_eq!(slack.password(), Some("xoxb-1"));

        let sp = store.get_connection("sparkpost").await.unwrap().unwrap();
        assert_eq!(sp.password(), Some("key-2"));
        assert_eq!(sp.host.as_deref(), Some("api.sparkpost.com"));

        assert!(store.get_connection("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn toml_and_json_formats() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = write(&dir, "c.toml", "[ops]\npassword = \"t-1\"\n");
        let json_path = write(&dir, "c.json", r#"{"ops": {"password": "j-1", "extra": {"team": "T1"}}}"#);

        let from_toml = FileConnectionStore::new(toml_path).get_connection("ops").await.unwrap().unwrap();
        assert_eq!(from_toml.password(), Some("t-1"));

        let from_json = FileConnectionStore::new(json_path).get_connection("ops").await.unwrap().unwrap();
        assert_eq!(from_json.password(), Some("j-1"));
        assert_eq!(from_json.extra_str("team"), Some("T1"));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConnectionStore::new(dir.path().join("absent.yaml"));
        let err = store.get_connection("x").await.unwrap_err();
        assert!(matches!(err, HookError::Io { .. }));
    }

    #[test]
    fn unknown_extension_rejected() {
        assert!(FileFormat::from_path(Path::new("conns.ini")).is_err());
    }
}
