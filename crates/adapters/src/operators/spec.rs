//! Task files: a `task_id` plus a `type`-tagged operator body.
//!
//! ```yaml
//! task_id: notify_ops
//! type: slack_message
//! slack_conn_id: slack_default
//! channel: C0123456789
//! message: "Run {{ run_id }} finished"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Operator;
use crate::capability::Capability;
use crate::config::HooksConfig;
use crate::connection::DynConnectionStore;
use crate::email::AddressList;
use crate::error::{HookError, HookResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_id: String,
    #[serde(flatten)]
    pub operator: OperatorSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperatorSpec {
    SlackMessage(SlackMessageArgs),
    SlackFileUpload(SlackFileUploadArgs),
    Email(EmailArgs),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackMessageArgs {
    pub slack_conn_id: Option<String>,
    pub api_token: Option<String>,
    pub message: String,
    pub blocks: Option<Value>,
    pub channel: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackFileUploadArgs {
    pub slack_conn_id: Option<String>,
    pub api_token: Option<String>,
    pub file_path: String,
    pub title: String,
    pub channel: Option<String>,
    pub comment: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailArgs {
    pub to: AddressList,
    pub subject: String,
    pub html_content: String,
    pub files: Vec<String>,
    pub cc: Option<AddressList>,
    pub bcc: Option<AddressList>,
    pub from_email: Option<String>,
    pub from_name: Option<String>,
}

impl OperatorSpec {
    pub fn capability(&self) -> Capability {
        match self {
            OperatorSpec::SlackMessage(_) | OperatorSpec::SlackFileUpload(_) => Capability::Slack,
            OperatorSpec::Email(_) => Capability::Email,
        }
    }
}

impl TaskSpec {
    /// Parse a YAML (or JSON, which is valid YAML) task document.
    pub fn from_yaml_str(content: &str) -> HookResult<Self> {
        serde_yaml::from_str(content).map_err(|e| HookError::Config(format!("invalid task file: {}", e)))
    }

    pub fn from_file(path: &Path) -> HookResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HookError::io(path, e))?;
        Self::from_yaml_str(&content)
    }

    /// Checks that need no I/O: task id present, adapter compiled in.
    pub fn validate(&self) -> HookResult<()> {
        if self.task_id.trim().is_empty() {
            return Err(HookError::Config("task_id must not be empty".to_string()));
        }
        self.operator.capability().require()
    }
}

/// Turn a validated spec into a runnable operator.
pub fn build_operator(
    spec: TaskSpec,
    config: &HooksConfig,
    store: DynConnectionStore,
) -> HookResult<Box<dyn Operator>> {
    spec.validate()?;
    let task_id = spec.task_id;
    match spec.operator {
        OperatorSpec::SlackMessage(args) => build_slack_message(task_id, args, config, store),
        OperatorSpec::SlackFileUpload(args) => build_slack_file_upload(task_id, args, config, store),
        OperatorSpec::Email(args) => build_email(task_id, args, config, store),
    }
}

#[cfg(feature = "slack")]
fn build_slack_message(
    task_id: String,
    args: SlackMessageArgs,
    config: &HooksConfig,
    store: DynConnectionStore,
) -> HookResult<Box<dyn Operator>> {
    Ok(Box::new(super::SlackMessageOperator::new(
        task_id,
        args,
        store,
        config.slack.clone(),
    )))
}

#[cfg(not(feature = "slack"))]
fn build_slack_message(
    _task_id: String,
    _args: SlackMessageArgs,
    _config: &HooksConfig,
    _store: DynConnectionStore,
) -> HookResult<Box<dyn Operator>> {
    Err(HookError::CapabilityUnavailable {
        capability: Capability::Slack,
    })
}

#[cfg(feature = "slack")]
fn build_slack_file_upload(
    task_id: String,
    args: SlackFileUploadArgs,
    config: &HooksConfig,
    store: DynConnectionStore,
) -> HookResult<Box<dyn Operator>> {
    Ok(Box::new(super::SlackFileUploadOperator::new(
        task_id,
        args,
        store,
        config.slack.clone(),
    )))
}

#[cfg(not(feature = "slack"))]
fn build_slack_file_upload(
    _task_id: String,
    _args: SlackFileUploadArgs,
    _config: &HooksConfig,
    _store: DynConnectionStore,
) -> HookResult<Box<dyn Operator>> {
    Err(HookError::CapabilityUnavailable {
        capability: Capability::Slack,
    })
}

#[cfg(feature = "sparkpost")]
fn build_email(
    task_id: String,
    args: EmailArgs,
    config: &HooksConfig,
    store: DynConnectionStore,
) -> HookResult<Box<dyn Operator>> {
    Ok(Box::new(super::EmailOperator::new(
        task_id,
        args,
        store,
        config.email.clone(),
    )))
}

#[cfg(not(feature = "sparkpost"))]
fn build_email(
    _task_id: String,
    _args: EmailArgs,
    _config: &HooksConfig,
    _store: DynConnectionStore,
) -> HookResult<Box<dyn Operator>> {
    Err(HookError::CapabilityUnavailable {
        capability: Capability::Email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MemoryConnectionStore;
    use std::sync::Arc;

    #[test]
    fn parses_slack_message_task() {
        let spec = TaskSpec::from_yaml_str(
            r#"
task_id: notify
type: slack_message
slack_conn_id: slack_default
channel: C123
message: "Run {{ run_id }} done"
blocks:
  - type: divider
"#,
        )
        .unwrap();
        assert_eq!(spec.task_id, "notify");
        match spec.operator {
            OperatorSpec::SlackMessage(ref args) => {
                assert_eq!(args.slack_conn_id.as_deref(), Some("slack_default"));
                assert_eq!(args.channel.as_deref(), Some("C123"));
                assert_eq!(args.blocks.as_ref().unwrap()[0]["type"], "divider");
                assert_eq!(args.api_token, None);
            }
            ref other => panic!("unexpected {:?}", other),
        }
        assert_eq!(spec.operator.capability(), Capability::Slack);
    }

    #[test]
    fn parses_email_task_with_list_recipients() {
        let spec = TaskSpec::from_yaml_str(
            r#"
task_id: mail
type: email
to: [a@x.com, b@x.com]
cc: "c@x.com; d@x.com"
subject: Daily
html_content: "<p>ok</p>"
files: [/tmp/report.csv]
"#,
        )
        .unwrap();
        match spec.operator {
            OperatorSpec::Email(ref args) => {
                assert_eq!(args.to.addresses(), vec!["a@x.com", "b@x.com"]);
                assert_eq!(args.cc.as_ref().unwrap().addresses().len(), 2);
                assert_eq!(args.files, vec!["/tmp/report.csv"]);
            }
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_type_rejected() {
        let err = TaskSpec::from_yaml_str("task_id: t\ntype: pagerduty\n").unwrap_err();
        assert!(matches!(err, HookError::Config(_)));
    }

    #[test]
    fn empty_task_id_fails_validation() {
        let spec = TaskSpec {
            task_id: " ".to_string(),
            operator: OperatorSpec::SlackMessage(SlackMessageArgs::default()),
        };
        assert!(spec.validate().is_err());
    }

    #[cfg(feature = "slack")]
    #[test]
    fn builds_operator_with_task_id() {
        let spec = TaskSpec {
            task_id: "notify".to_string(),
            operator: OperatorSpec::SlackMessage(SlackMessageArgs::default()),
        };
        let op = build_operator(
            spec,
            &HooksConfig::default(),
            Arc::new(MemoryConnectionStore::new()),
        )
        .unwrap();
        assert_eq!(op.task_id(), "notify");
        assert!(op.template_fields().contains(&"message"));
    }

    #[cfg(not(feature = "sparkpost"))]
    #[test]
    fn email_task_needs_sparkpost_feature() {
        let spec = TaskSpec {
            task_id: "mail".to_string(),
            operator: OperatorSpec::Email(EmailArgs::default()),
        };
        let err = build_operator(spec, &HooksConfig::default(), Arc::new(MemoryConnectionStore::new()))
            .err()
            .unwrap();
        assert!(matches!(err, HookError::CapabilityUnavailable { .. }));
    }
}
