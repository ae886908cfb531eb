//! Declarative task wrappers.
//!
//! An operator holds templated parameters, renders them against a
//! [`TaskContext`] at execution time, and runs one hook action:
//! resolve credential, build client, invoke.

#[cfg(feature = "sparkpost")]
pub mod email;
#[cfg(feature = "slack")]
pub mod slack;
pub mod spec;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HookResult;

#[cfg(feature = "sparkpost")]
pub use email::EmailOperator;
#[cfg(feature = "slack")]
pub use slack::{SlackFileUploadOperator, SlackMessageOperator};
pub use spec::{build_operator, OperatorSpec, TaskSpec};

/// Values available to templated fields during one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    pub task_id: String,
    pub run_id: String,
    pub logical_date: DateTime<Utc>,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl TaskContext {
    pub fn new(task_id: &str, run_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            run_id: run_id.to_string(),
            logical_date: Utc::now(),
            params: HashMap::new(),
        }
    }

    pub fn with_logical_date(mut self, logical_date: DateTime<Utc>) -> Self {
        self.logical_date = logical_date;
        self
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }
}

/// A unit of work handed to the scheduler.
#[async_trait]
pub trait Operator: Send + Sync {
    fn task_id(&self) -> &str;

    /// Names of the fields rendered as templates before execution.
    fn template_fields(&self) -> &'static [&'static str];

    async fn execute(&self, ctx: &TaskContext) -> HookResult<()>;
}
