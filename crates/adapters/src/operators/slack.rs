//! Slack operators: one message or one file upload per execution.

use std::path::Path;

use async_trait::async_trait;

use super::spec::{SlackFileUploadArgs, SlackMessageArgs};
use super::{Operator, TaskContext};
use crate::config::SlackSettings;
use crate::connection::DynConnectionStore;
use crate::error::HookResult;
use crate::hooks::slack::SlackWebApiHook;
use crate::template::{render, render_json, render_opt};

const MESSAGE_TEMPLATE_FIELDS: &[&str] = &[
    "slack_conn_id",
    "api_token",
    "message",
    "blocks",
    "channel",
    "source",
];

const FILE_TEMPLATE_FIELDS: &[&str] = &[
    "slack_conn_id",
    "api_token",
    "file_path",
    "title",
    "channel",
    "comment",
    "source",
];

/// Rendered connection fields shared by both operators.
struct SlackTarget {
    slack_conn_id: Option<String>,
    api_token: Option<String>,
    channel: String,
    source: Option<String>,
}

impl SlackTarget {
    fn render(
        slack_conn_id: Option<&str>,
        api_token: Option<&str>,
        channel: Option<&str>,
        source: Option<&str>,
        ctx: &TaskContext,
    ) -> HookResult<Self> {
        Ok(Self {
            slack_conn_id: render_opt(slack_conn_id, ctx)?,
            api_token: render_opt(api_token, ctx)?,
            channel: render_opt(channel, ctx)?.unwrap_or_default(),
            source: render_opt(source, ctx)?,
        })
    }

    async fn hook(&self, store: &DynConnectionStore, settings: &SlackSettings) -> HookResult<SlackWebApiHook> {
        let hook = SlackWebApiHook::new(
            self.api_token.as_deref(),
            self.slack_conn_id.as_deref(),
            store.as_ref(),
            settings,
        )
        .await?;
        Ok(hook.with_source(self.source.clone()))
    }
}

/// Posts `message` and/or `blocks` to `channel`.
pub struct SlackMessageOperator {
    task_id: String,
    args: SlackMessageArgs,
    store: DynConnectionStore,
    settings: SlackSettings,
}

impl SlackMessageOperator {
    pub fn new(task_id: String, args: SlackMessageArgs, store: DynConnectionStore, settings: SlackSettings) -> Self {
        Self {
            task_id,
            args,
            store,
            settings,
        }
    }
}

#[async_trait]
impl Operator for SlackMessageOperator {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    fn template_fields(&self) -> &'static [&'static str] {
        MESSAGE_TEMPLATE_FIELDS
    }

    async fn execute(&self, ctx: &TaskContext) -> HookResult<()> {
        let args = &self.args;
        let target = SlackTarget::render(
            args.slack_conn_id.as_deref(),
            args.api_token.as_deref(),
            args.channel.as_deref(),
            args.source.as_deref(),
            ctx,
        )?;
        let message = render(&args.message, ctx)?;
        let blocks = args.blocks.as_ref().map(|b| render_json(b, ctx)).transpose()?;

        tracing::debug!(task_id = %self.task_id, channel = %target.channel, "Executing Slack message task");
        let hook = target.hook(&self.store, &self.settings).await?;
        hook.post_message(&target.channel, Some(&message), blocks.as_ref())
            .await?;
        Ok(())
    }
}

/// Uploads the file at `file_path` to `channel`.
pub struct SlackFileUploadOperator {
    task_id: String,
    args: SlackFileUploadArgs,
    store: DynConnectionStore,
    settings: SlackSettings,
}

impl SlackFileUploadOperator {
    pub fn new(
        task_id: String,
        args: SlackFileUploadArgs,
        store: DynConnectionStore,
        settings: SlackSettings,
    ) -> Self {
        Self {
            task_id,
            args,
            store,
            settings,
        }
    }
}

#[async_trait]
impl Operator for SlackFileUploadOperator {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    fn template_fields(&self) -> &'static [&'static str] {
        FILE_TEMPLATE_FIELDS
    }

    async fn execute(&self, ctx: &TaskContext) -> HookResult<()> {
        let args = &self.args;
        let target = SlackTarget::render(
            args.slack_conn_id.as_deref(),
            args.api_token.as_deref(),
            args.channel.as_deref(),
            args.source.as_deref(),
            ctx,
        )?;
        let file_path = render(&args.file_path, ctx)?;
        let title = render(&args.title, ctx)?;
        let comment = render(&args.comment, ctx)?;

        tracing::debug!(task_id = %self.task_id, channel = %target.channel, file = %file_path, "Executing Slack upload task");
        let hook = target.hook(&self.store, &self.settings).await?;
        hook.post_file(Path::new(&file_path), &target.channel, Some(&title), Some(&comment))
            .await?;
        Ok(())
    }
}
