//! Collaborator wiring for the registration pipeline.
//!
//! In-memory wiring is the default (dev/test). Persistent wiring (Postgres +
//! Supabase storage + SMTP) is selected with `USE_PERSISTENT_STORES=true` and
//! the `postgres` feature; an incomplete environment degrades to the
//! `env_missing` responder instead of panicking mid-request.

use std::sync::Arc;

use gestevent_infra::blob::InMemoryTicketBucket;
use gestevent_infra::mailer::NoopMailer;
use gestevent_infra::store::{
    InMemoryConsentStore, InMemoryDirectory, InMemoryParticipantStore, InMemoryRateLimitStore,
};
use gestevent_infra::RegistrationService;

#[cfg(feature = "postgres")]
use gestevent_infra::{
    blob::SupabaseTicketBucket,
    config::{self, SmtpConfig, StorageConfig},
    mailer::SmtpMailer,
    store::PostgresStore,
};
#[cfg(feature = "postgres")]
use sqlx::PgPool;

pub enum AppServices {
    InMemory {
        registration: Arc<RegistrationService>,
        directory: Arc<InMemoryDirectory>,
        participants: Arc<InMemoryParticipantStore>,
        consents: Arc<InMemoryConsentStore>,
        bucket: Arc<InMemoryTicketBucket>,
    },
    #[cfg(feature = "postgres")]
    Persistent {
        registration: Arc<RegistrationService>,
    },
    /// Persistent mode was requested but the environment is incomplete; the
    /// endpoint answers `env_missing` instead of serving half-wired.
    Unconfigured,
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        #[cfg(feature = "postgres")]
        {
            return build_persistent_services().await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
            return build_in_memory_services();
        }
    }

    build_in_memory_services()
}

pub fn build_in_memory_services() -> AppServices {
    let directory = Arc::new(InMemoryDirectory::new());
    let participants = Arc::new(InMemoryParticipantStore::new());
    let consents = Arc::new(InMemoryConsentStore::new());
    let bucket = Arc::new(InMemoryTicketBucket::new());

    let registration = Arc::new(RegistrationService::new(
        directory.clone(),
        participants.clone(),
        Arc::new(InMemoryRateLimitStore::new()),
        consents.clone(),
        bucket.clone(),
        Arc::new(NoopMailer::new()),
    ));

    AppServices::InMemory {
        registration,
        directory,
        participants,
        consents,
        bucket,
    }
}

#[cfg(feature = "postgres")]
async fn build_persistent_services() -> AppServices {
    let Some(database_url) = config::database_url() else {
        tracing::warn!("USE_PERSISTENT_STORES=true but DATABASE_URL is not set");
        return AppServices::Unconfigured;
    };
    let Some(storage) = StorageConfig::from_env() else {
        tracing::warn!("USE_PERSISTENT_STORES=true but storage env is not set");
        return AppServices::Unconfigured;
    };

    let pool = match PgPool::connect(&database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            tracing::warn!(error = %err, "failed to connect to Postgres");
            return AppServices::Unconfigured;
        }
    };

    let store = Arc::new(PostgresStore::new(pool));
    let bucket = Arc::new(SupabaseTicketBucket::new(storage));

    // Email is best-effort: an absent SMTP environment only downgrades it.
    let mailer: Arc<dyn gestevent_infra::mailer::Mailer> = match SmtpConfig::from_env() {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)),
        None => {
            tracing::warn!("SMTP env not set; confirmation emails disabled");
            Arc::new(NoopMailer::new())
        }
    };

    let registration = Arc::new(RegistrationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        bucket,
        mailer,
    ));

    AppServices::Persistent { registration }
}

impl AppServices {
    pub fn registration(&self) -> Option<&Arc<RegistrationService>> {
        match self {
            AppServices::InMemory { registration, .. } => Some(registration),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { registration } => Some(registration),
            AppServices::Unconfigured => None,
        }
    }

    /// In-memory event directory, for seeding in dev/tests.
    pub fn directory_in_memory(&self) -> Option<Arc<InMemoryDirectory>> {
        match self {
            AppServices::InMemory { directory, .. } => Some(directory.clone()),
            _ => None,
        }
    }

    pub fn participants_in_memory(&self) -> Option<Arc<InMemoryParticipantStore>> {
        match self {
            AppServices::InMemory { participants, .. } => Some(participants.clone()),
            _ => None,
        }
    }

    pub fn consents_in_memory(&self) -> Option<Arc<InMemoryConsentStore>> {
        match self {
            AppServices::InMemory { consents, .. } => Some(consents.clone()),
            _ => None,
        }
    }

    pub fn bucket_in_memory(&self) -> Option<Arc<InMemoryTicketBucket>> {
        match self {
            AppServices::InMemory { bucket, .. } => Some(bucket.clone()),
            _ => None,
        }
    }
}
