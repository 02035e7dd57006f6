//! Mailer used when no SMTP transport is configured.

use async_trait::async_trait;

use super::{ConfirmationEmail, MailError, Mailer};

/// Logs the send instead of performing it. Dev/test default; also the
/// fallback when SMTP environment is absent, since confirmation email is
/// best-effort by contract.
#[derive(Debug, Default)]
pub struct NoopMailer;

impl NoopMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_confirmation(&self, email: &ConfirmationEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, event = %email.event_title, "confirmation email suppressed (no SMTP configured)");
        Ok(())
    }
}
