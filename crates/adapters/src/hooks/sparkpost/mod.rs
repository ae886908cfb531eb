//! SparkPost email hook.
//!
//! Sends HTML email with file attachments through the transmissions API and
//! doubles as an [`EmailBackend`].

pub mod api;
pub mod attachment;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{EmailConfig, EmailFailurePolicy};
use crate::connection::ConnectionStore;
use crate::credential::resolve_credential;
use crate::email::{email_address_list, EmailBackend, EmailMessage};
use crate::error::{HookError, HookResult};

pub use api::{SparkPostClient, Transmission, TransmissionResult, TransmissionSender};
pub use attachment::Attachment;

pub const FROM_EMAIL_ENV: &str = "SPARKPOST_FROM_EMAIL";
pub const FROM_NAME_ENV: &str = "SPARKPOST_FROM_NAME";

/// Sender address and display name, each optional until resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderIdentity {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl SenderIdentity {
    /// `"Name <email>"`, or `"<email>"` without a name.
    pub fn display(&self) -> String {
        format_from(self.name.as_deref(), self.email.as_deref().unwrap_or(""))
    }
}

pub fn format_from(name: Option<&str>, email: &str) -> String {
    format!("{} <{}>", name.unwrap_or(""), email).trim().to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolve the sender: message fields, then `SPARKPOST_FROM_*` variables,
/// then configuration.
pub fn sender_identity(message: &EmailMessage, config: &EmailConfig) -> SenderIdentity {
    let email = non_empty(message.from_email.clone())
        .or_else(|| non_empty(std::env::var(FROM_EMAIL_ENV).ok()))
        .or_else(|| non_empty(config.from_email.clone()));
    let name = non_empty(message.from_name.clone())
        .or_else(|| non_empty(std::env::var(FROM_NAME_ENV).ok()))
        .or_else(|| non_empty(config.from_name.clone()));

    if email.is_none() {
        tracing::warn!(
            "{} is not set in environment or configuration. Sending email will fail.",
            FROM_EMAIL_ENV
        );
    }
    SenderIdentity { email, name }
}

/// Sends HTML email through a SparkPost transmissions client.
pub struct SparkPostHook {
    sender: Arc<dyn TransmissionSender>,
    config: EmailConfig,
}

impl SparkPostHook {
    /// Build a hook with an API key taken from `config.api_key_env`, falling
    /// back to the password of `config.connection_id`.
    pub async fn from_config(config: &EmailConfig, store: &dyn ConnectionStore) -> HookResult<Self> {
        let from_env = std::env::var(&config.api_key_env).ok();
        let (api_key, _) =
            resolve_credential(from_env.as_deref(), config.connection_id.as_deref(), store).await?;
        let client = SparkPostClient::new(api_key, &config.base_uri, config.timeout_secs)?;
        Ok(Self::with_sender(Arc::new(client), config.clone()))
    }

    pub fn with_sender(sender: Arc<dyn TransmissionSender>, config: EmailConfig) -> Self {
        Self { sender, config }
    }

    pub fn failure_policy(&self) -> EmailFailurePolicy {
        self.config.failure_policy
    }

    /// Assemble the transmission for `message`, reading every attachment.
    pub async fn build_transmission(&self, message: &EmailMessage) -> HookResult<Transmission> {
        let to = email_address_list(&message.to);
        if to.is_empty() {
            return Err(HookError::InvalidRequest("at least one recipient is required".to_string()));
        }
        let cc = message.cc.as_ref().map(email_address_list).unwrap_or_default();
        let bcc = message.bcc.as_ref().map(email_address_list).unwrap_or_default();

        let mut attachments = Vec::with_capacity(message.files.len());
        for path in &message.files {
            attachments.push(Attachment::from_path(path).await?);
        }

        let sender = sender_identity(message, &self.config);
        let content = api::Content {
            from: sender.display(),
            subject: message.subject.clone(),
            html: message.html_content.clone(),
            headers: BTreeMap::new(),
            attachments,
        };

        let mut transmission = Transmission::new(&to, &cc, &bcc, content);
        transmission.return_path = sender.email;
        Ok(transmission)
    }

    /// Send `message`, returning the remote result or the error.
    pub async fn send(&self, message: &EmailMessage) -> HookResult<TransmissionResult> {
        let transmission = self.build_transmission(message).await?;
        let result = self.sender.send(&transmission).await?;
        let recipients: Vec<&str> = transmission
            .recipients
            .iter()
            .map(|r| r.address.email.as_str())
            .collect();
        tracing::info!(
            subject = %message.subject,
            transmission_id = %result.id,
            recipients = ?recipients,
            "Email successfully sent"
        );
        Ok(result)
    }
}

#[async_trait]
impl EmailBackend for SparkPostHook {
    async fn send_email(&self, message: &EmailMessage) -> HookResult<Option<String>> {
        match self.send(message).await {
            Ok(result) => Ok(Some(result.id)),
            Err(HookError::Api { error, .. }) if self.config.failure_policy == EmailFailurePolicy::Warn => {
                tracing::warn!(
                    subject = %message.subject,
                    error = %error,
                    "Failed to send out email"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Mutex;

    struct StubSender {
        outcome: Result<TransmissionResult, String>,
        sent: Mutex<Vec<Transmission>>,
    }

    impl StubSender {
        fn ok(id: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(TransmissionResult {
                    id: id.to_string(),
                    total_accepted_recipients: 1,
                    total_rejected_recipients: 0,
                }),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn failing(error: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(error.to_string()),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TransmissionSender for StubSender {
        async fn send(&self, transmission: &Transmission) -> HookResult<TransmissionResult> {
            self.sent.lock().unwrap().push(transmission.clone());
            self.outcome.clone().map_err(|error| HookError::Api {
                service: "SparkPost",
                error,
            })
        }
    }

    fn config(policy: EmailFailurePolicy) -> EmailConfig {
        EmailConfig {
            from_email: Some("config@example.com".to_string()),
            failure_policy: policy,
            ..EmailConfig::default()
        }
    }

    #[test]
    fn from_display_string() {
        assert_eq!(format_from(Some("Ops"), "ops@x.com"), "Ops <ops@x.com>");
        assert_eq!(format_from(None, "ops@x.com"), "<ops@x.com>");
    }

    #[test]
    #[serial]
    fn explicit_sender_beats_env_and_config() {
        std::env::set_var(FROM_EMAIL_ENV, "env@example.com");
        let mut msg = EmailMessage::new("a@x.com", "s", "h");
        msg.from_email = Some("explicit@example.com".to_string());
        let id = sender_identity(&msg, &config(EmailFailurePolicy::Raise));
        assert_eq!(id.email.as_deref(), Some("explicit@example.com"));

        msg.from_email = None;
        let id = sender_identity(&msg, &config(EmailFailurePolicy::Raise));
        assert_eq!(id.email.as_deref(), Some("env@example.com"));
        std::env::remove_var(FROM_EMAIL_ENV);

        let id = sender_identity(&msg, &config(EmailFailurePolicy::Raise));
        assert_eq!(id.email.as_deref(), Some("config@example.com"));
    }

    #[tokio::test]
    #[serial]
    async fn missing_sender_still_sends() {
        std::env::remove_var(FROM_EMAIL_ENV);
        std::env::remove_var(FROM_NAME_ENV);
        let sender = StubSender::ok("tx-1");
        let hook = SparkPostHook::with_sender(sender.clone(), EmailConfig::default());
        let id = hook
            .send_email(&EmailMessage::new("a@x.com", "s", "<p>h</p>"))
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("tx-1"));
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].return_path, None);
        assert_eq!(sent[0].content.from, "<>");
    }

    #[tokio::test]
    #[serial]
    async fn builds_transmission_with_attachments() {
        std::env::remove_var(FROM_EMAIL_ENV);
        std::env::remove_var(FROM_NAME_ENV);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, b"x,y\n").unwrap();

        let sender = StubSender::ok("tx-2");
        let hook = SparkPostHook::with_sender(sender.clone(), config(EmailFailurePolicy::Raise));
        let mut msg = EmailMessage::new("a@x.com; b@x.com", "Daily", "<b>done</b>");
        msg.cc = Some("c@x.com".into());
        msg.from_name = Some("Reports".to_string());
        msg.files = vec![path];

        let result = hook.send(&msg).await.unwrap();
        assert_eq!(result.id, "tx-2");

        let sent = sender.sent.lock().unwrap();
        let t = &sent[0];
        assert_eq!(t.recipients.len(), 3);
        assert_eq!(t.content.from, "Reports <config@example.com>");
        assert_eq!(t.return_path.as_deref(), Some("config@example.com"));
        assert_eq!(t.content.attachments.len(), 1);
        assert_eq!(t.content.attachments[0].name, "data.csv");
        assert_eq!(t.content.attachments[0].mime_type, "text/csv");
        assert_eq!(t.content.attachments[0].decode().unwrap(), b"x,y\n");
    }

    #[tokio::test]
    async fn api_error_raises_by_default() {
        let hook = SparkPostHook::with_sender(StubSender::failing("status 400"), config(EmailFailurePolicy::Raise));
        let err = hook
            .send_email(&EmailMessage::new("a@x.com", "s", "h"))
            .await
            .unwrap_err();
        assert!(matches!(err, HookError::Api { service: "SparkPost", .. }));
    }

    #[tokio::test]
    async fn api_error_is_logged_under_warn_policy() {
        let hook = SparkPostHook::with_sender(StubSender::failing("status 400"), config(EmailFailurePolicy::Warn));
        let id = hook
            .send_email(&EmailMessage::new("a@x.com", "s", "h"))
            .await
            .unwrap();
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn io_error_propagates_even_under_warn_policy() {
        let hook = SparkPostHook::with_sender(StubSender::ok("tx"), config(EmailFailurePolicy::Warn));
        let mut msg = EmailMessage::new("a@x.com", "s", "h");
        msg.files = vec!["/nonexistent/report.pdf".into()];
        let err = hook.send_email(&msg).await.unwrap_err();
        assert!(matches!(err, HookError::Io { .. }));
    }

    #[tokio::test]
    async fn no_recipients_rejected() {
        let sender = StubSender::ok("tx");
        let hook = SparkPostHook::with_sender(sender.clone(), config(EmailFailurePolicy::Raise));
        let err = hook
            .send_email(&EmailMessage::new(" ; ", "s", "h"))
            .await
            .unwrap_err();
        assert!(matches!(err, HookError::InvalidRequest(_)));
        assert!(sender.sent.lock().unwrap().is_empty());
    }
}
