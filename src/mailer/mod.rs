//! Notification capability: template composition plus a delivery seam.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::ActivatorConfig;
use crate::error::ActivatorError;

mod compose;
mod transport;

pub use compose::Composer;
pub use transport::{LogTransport, MailTransport, OutgoingMail};

/// Which email template a notification renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Activate,
    PasswordReset,
    CafeAuth,
    CafeReset,
}

impl TemplateKind {
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::PasswordReset => "passwordreset",
            Self::CafeAuth => "cafeauth",
            Self::CafeReset => "cafereset",
        }
    }
}

/// Payload handed to the notifier on issuance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotifyData {
    pub code: String,
    pub email: String,
    pub id: Option<String>,
    /// Opaque request payload forwarded from the HTTP layer, available
    /// to custom notifiers.
    pub request: Option<Value>,
}

/// Notification capability the issuance flow depends on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        kind: TemplateKind,
        lang: &str,
        data: &NotifyData,
        to: &str,
        subject: &str,
    ) -> Result<(), ActivatorError>;
}

/// Default notifier: renders a template and hands the result to a
/// [`MailTransport`]. Transport failures surface as a 502-class error;
/// the persisted code is left intact so validation can still be retried
/// after a fresh issuance.
pub struct TemplateNotifier {
    composer: Composer,
    transport: Arc<dyn MailTransport>,
    from: String,
}

impl TemplateNotifier {
    pub fn new(config: &ActivatorConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            composer: Composer::new(config),
            transport,
            from: config.from_address.clone(),
        }
    }
}

#[async_trait]
impl Notifier for TemplateNotifier {
    async fn send(
        &self,
        kind: TemplateKind,
        lang: &str,
        data: &NotifyData,
        to: &str,
        subject: &str,
    ) -> Result<(), ActivatorError> {
        let html = self.composer.compose(kind, lang, data).await?;
        let mail = OutgoingMail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            html,
        };
        self.transport.deliver(&mail).await.map_err(|err| {
            tracing::error!(to = %mail.to, error = %err, "mail delivery failed");
            ActivatorError::common(502, format!("Couldn't send email: {err}"))
        })?;
        debug!(to = %mail.to, kind = ?kind, "notification sent");
        Ok(())
    }
}
