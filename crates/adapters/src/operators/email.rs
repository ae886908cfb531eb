//! Email operator backed by SparkPost.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::spec::EmailArgs;
use super::{Operator, TaskContext};
use crate::config::EmailConfig;
use crate::connection::DynConnectionStore;
use crate::email::{AddressList, EmailBackend, EmailMessage};
use crate::error::HookResult;
use crate::hooks::sparkpost::SparkPostHook;
use crate::template::{render, render_opt};

const TEMPLATE_FIELDS: &[&str] = &["to", "subject", "html_content", "files", "cc", "bcc"];

enum Backend {
    /// Resolve the API key and build a client on every execution.
    Configured {
        store: DynConnectionStore,
        config: EmailConfig,
    },
    Fixed(Arc<dyn EmailBackend>),
}

pub struct EmailOperator {
    task_id: String,
    args: EmailArgs,
    backend: Backend,
}

impl EmailOperator {
    pub fn new(task_id: String, args: EmailArgs, store: DynConnectionStore, config: EmailConfig) -> Self {
        Self {
            task_id,
            args,
            backend: Backend::Configured { store, config },
        }
    }

    /// Deliver through an existing backend instead of building one per run.
    pub fn with_backend(task_id: String, args: EmailArgs, backend: Arc<dyn EmailBackend>) -> Self {
        Self {
            task_id,
            args,
            backend: Backend::Fixed(backend),
        }
    }

    fn render_message(&self, ctx: &TaskContext) -> HookResult<EmailMessage> {
        let args = &self.args;
        Ok(EmailMessage {
            to: render_addresses(&args.to, ctx)?,
            subject: render(&args.subject, ctx)?,
            html_content: render(&args.html_content, ctx)?,
            files: args
                .files
                .iter()
                .map(|f| render(f, ctx).map(PathBuf::from))
                .collect::<HookResult<_>>()?,
            cc: args.cc.as_ref().map(|l| render_addresses(l, ctx)).transpose()?,
            bcc: args.bcc.as_ref().map(|l| render_addresses(l, ctx)).transpose()?,
            from_email: render_opt(args.from_email.as_deref(), ctx)?,
            from_name: render_opt(args.from_name.as_deref(), ctx)?,
        })
    }
}

fn render_addresses(list: &AddressList, ctx: &TaskContext) -> HookResult<AddressList> {
    Ok(match list {
        AddressList::Delimited(s) => AddressList::Delimited(render(s, ctx)?),
        AddressList::List(items) => AddressList::List(
            items
                .iter()
                .map(|s| render(s, ctx))
                .collect::<HookResult<_>>()?,
        ),
    })
}

#[async_trait]
impl Operator for EmailOperator {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    fn template_fields(&self) -> &'static [&'static str] {
        TEMPLATE_FIELDS
    }

    async fn execute(&self, ctx: &TaskContext) -> HookResult<()> {
        let message = self.render_message(ctx)?;
        let sent = match &self.backend {
            Backend::Configured { store, config } => {
                let hook = SparkPostHook::from_config(config, store.as_ref()).await?;
                hook.send_email(&message).await?
            }
            Backend::Fixed(backend) => backend.send_email(&message).await?,
        };
        if sent.is_none() {
            tracing::warn!(task_id = %self.task_id, "Email task finished without a transmission id");
        }
        Ok(())
    }
}
