//! Outbound email collaborator port.
//!
//! Email is best-effort: the pipeline spawns the send as a detached task and
//! only ever observes failures through logging.

use async_trait::async_trait;
use thiserror::Error;

pub mod noop;
pub mod smtp;

pub use noop::NoopMailer;
pub use smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to send email: {0}")]
    Send(String),
}

/// Confirmation message contents for one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationEmail {
    pub to: String,
    pub full_name: String,
    pub event_title: String,
    /// Signed ticket-image URL embedded in the message body.
    pub qr_url: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation(&self, email: &ConfirmationEmail) -> Result<(), MailError>;
}
