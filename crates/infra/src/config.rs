//! Environment-driven configuration for the persistent collaborators.
//!
//! In-memory mode needs none of this. Persistent mode reads everything at
//! startup; a missing storage/database environment degrades the service to
//! the `env_missing` responder instead of panicking mid-request.

use std::env;

/// Supabase-storage connection settings for the tickets bucket.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
}

impl StorageConfig {
    /// Read `STORAGE_URL`, `STORAGE_SERVICE_KEY` and (optional)
    /// `STORAGE_BUCKET`. Returns `None` when the required pieces are absent.
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("STORAGE_URL").ok().filter(|v| !v.is_empty())?;
        let service_key = env::var("STORAGE_SERVICE_KEY")
            .ok()
            .filter(|v| !v.is_empty())?;
        let bucket = env::var("STORAGE_BUCKET").unwrap_or_else(|_| "tickets".to_string());
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        })
    }
}

/// SMTP settings for the confirmation mailer.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl SmtpConfig {
    /// Read `SMTP_SERVER`/`SMTP_PORT`/`SMTP_USERNAME`/`SMTP_PASSWORD` and the
    /// optional `MAIL_FROM`/`MAIL_FROM_NAME`. Email is best-effort, so a
    /// missing SMTP environment is not an error — callers fall back to the
    /// no-op mailer.
    pub fn from_env() -> Option<Self> {
        let server = env::var("SMTP_SERVER").ok().filter(|v| !v.is_empty())?;
        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(587);
        let username = env::var("SMTP_USERNAME").ok()?;
        let password = env::var("SMTP_PASSWORD").ok()?;
        let from_email =
            env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@gestevent.com".to_string());
        let from_name = env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "GESTEVENT".to_string());
        Some(Self {
            server,
            port,
            username,
            password,
            from_email,
            from_name,
        })
    }
}

/// `DATABASE_URL`, when set and non-empty.
pub fn database_url() -> Option<String> {
    env::var("DATABASE_URL").ok().filter(|v| !v.is_empty())
}
