//! Relational-store collaborator ports.
//!
//! The registration pipeline only ever talks to these traits; the store owns
//! the `events` and `participants` tables and the uniqueness/capacity
//! invariants. Adapters: [`memory`] (dev/test) and, behind the `postgres`
//! feature, [`postgres`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use gestevent_core::{EventId, ParticipantId};
use gestevent_registration::{EventRecord, NewParticipant};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{
    InMemoryConsentStore, InMemoryDirectory, InMemoryParticipantStore, InMemoryRateLimitStore,
};
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

/// Failure talking to the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Backend(String),
}

/// Outcome of the authoritative participant insert.
#[derive(Debug, Error)]
pub enum InsertError {
    /// The (event, email) pair already has a confirmed participant.
    #[error("duplicate registration for this event and email")]
    Duplicate,
    /// The event is at its configured capacity.
    #[error("event is at capacity")]
    CapacityExceeded,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read access to the `events` table.
#[async_trait]
pub trait EventDirectory: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<EventRecord>, StoreError>;
}

/// Read/write access to the `participants` table.
#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Confirmed participants for `(event, email_lower)` — the advisory quota
    /// pre-check input.
    async fn count_confirmed_for_email(
        &self,
        event_id: EventId,
        email_lower: &str,
    ) -> Result<u32, StoreError>;

    /// All confirmed participants for the event — the advisory capacity
    /// pre-check input.
    async fn count_confirmed(&self, event_id: EventId) -> Result<u32, StoreError>;

    /// Insert a `confirmed` row. This is the concurrency-safety boundary:
    /// the adapter must enforce the `(event_id, email_lower)` uniqueness
    /// invariant and, when `capacity` is configured, the capacity invariant,
    /// atomically with respect to concurrent inserts.
    async fn insert_confirmed(
        &self,
        new: NewParticipant,
        capacity: Option<u32>,
    ) -> Result<ParticipantId, InsertError>;

    /// Compensating delete for a failed ticket pipeline.
    async fn delete(&self, id: ParticipantId) -> Result<(), StoreError>;

    /// Attach the signed ticket URL to an existing row.
    async fn set_ticket_url(&self, id: ParticipantId, url: &str) -> Result<(), StoreError>;
}

/// Append-only request log for best-effort throttling.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn record(&self, ip: &str, at: DateTime<Utc>) -> Result<(), StoreError>;
    async fn count_since(&self, ip: &str, since: DateTime<Utc>) -> Result<u32, StoreError>;
}

/// Write-once consent/audit record; never read back by this core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRecord {
    /// SHA-256 hex of the lower-cased email.
    pub email_hash: String,
    pub ip: String,
    pub event_id: EventId,
    pub participant_id: ParticipantId,
}

#[async_trait]
pub trait ConsentStore: Send + Sync {
    async fn record(&self, consent: ConsentRecord) -> Result<(), StoreError>;
}
