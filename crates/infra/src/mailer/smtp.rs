//! SMTP mailer using Lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpConfig;

use super::{ConfirmationEmail, MailError, Mailer};

/// Sends real confirmation emails via SMTP.
#[derive(Clone)]
pub struct SmtpMailer {
    smtp_server: String,
    smtp_port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self {
            smtp_server: config.server,
            smtp_port: config.port,
            credentials: Credentials::new(config.username, config.password),
            from_email: config.from_email,
            from_name: config.from_name,
        }
    }

    /// Build a transport per send to avoid connection pooling issues.
    fn build_transport(&self) -> Result<SmtpTransport, MailError> {
        Ok(SmtpTransport::relay(&self.smtp_server)
            .map_err(|e| MailError::Send(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}

fn confirmation_html(email: &ConfirmationEmail) -> String {
    format!(
        r#"<!doctype html><html><body>
      <p>Bonjour {full_name},</p>
      <p>Votre inscription à <strong>{event_title}</strong> est confirmée.</p>
      <p>Vous trouverez votre QR ci-dessous ainsi qu'un lien si nécessaire.</p>
      <p><img src="{qr_url}" alt="QR Code" style="max-width:240px"/></p>
      <p><a href="{qr_url}">Télécharger le QR</a></p>
      <p>À bientôt,</p>
      <p>L'équipe GESTEVENT</p>
    </body></html>"#,
        full_name = email.full_name,
        event_title = email.event_title,
        qr_url = email.qr_url,
    )
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation(&self, email: &ConfirmationEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| MailError::Address(format!("invalid from address: {e}")))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| MailError::Address(format!("invalid to address: {e}")))?)
            .subject(format!("Confirmation d'inscription – {}", email.event_title))
            .header(ContentType::TEXT_HTML)
            .body(confirmation_html(email))
            .map_err(|e| MailError::Build(e.to_string()))?;

        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&message)
                .map_err(|e| MailError::Send(e.to_string()))
        })
        .await
        .map_err(|e| MailError::Send(format!("email task failed: {e}")))?
        .map(|_| ())
    }
}
