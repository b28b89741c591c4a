use async_trait::async_trait;
use tracing::info;

/// A fully composed message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery seam. Implementations decide how mail actually leaves the
/// process (SMTP pool, provider API, message broker). Errors are carried
/// back to the caller as a transport failure; the issued code stays
/// persisted so a later re-issue or retry still works.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutgoingMail) -> anyhow::Result<()>;
}

/// Default transport for local development: logs the message and
/// reports success.
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            bytes = mail.html.len(),
            "mail delivery stub"
        );
        Ok(())
    }
}
