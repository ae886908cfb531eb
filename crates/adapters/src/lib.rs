//! Hooks and operators that let workflow tasks call external services.
//!
//! A *hook* resolves a credential, builds a client for one service and
//! performs a single remote call per action. An *operator* wraps a hook as a
//! declarative, templated task.
//!
//! # Adapters
//! - Slack Web API (feature: `slack`, default): post message, upload file,
//!   call any method
//! - SparkPost (feature: `sparkpost`, default): HTML email with attachments
//! - Kubernetes (feature: `kubernetes`): in-cluster or kubeconfig client
//!   construction
//!
//! Credentials come either from an explicit value or from the password of a
//! named connection in a [`ConnectionStore`]. The explicit value wins.

pub mod capability;
pub mod config;
pub mod connection;
pub mod credential;
pub mod email;
pub mod error;
pub mod hooks;
pub mod operators;
pub mod template;

// Re-export core types
pub use capability::{available_capabilities, Capability};
pub use config::{EmailConfig, EmailFailurePolicy, HooksConfig, KubernetesConfig, SlackSettings};
pub use connection::{
    connection_store_from_config, ChainConnectionStore, Connection, ConnectionStore,
    DynConnectionStore, EnvConnectionStore, FileConnectionStore, MemoryConnectionStore,
};
pub use credential::{resolve_credential, Credential, CredentialSource};
pub use email::{email_address_list, AddressList, EmailBackend, EmailMessage};
pub use error::{HookError, HookResult};
pub use operators::{build_operator, Operator, OperatorSpec, TaskContext, TaskSpec};

#[cfg(feature = "slack")]
pub use hooks::slack::{SlackApiClient, SlackResponse, SlackTransport, SlackWebApiHook};

#[cfg(feature = "sparkpost")]
pub use hooks::sparkpost::{SparkPostClient, SparkPostHook};

#[cfg(feature = "kubernetes")]
pub use hooks::kubernetes::{get_kube_client, CoreClient, KubeConfigSource};
