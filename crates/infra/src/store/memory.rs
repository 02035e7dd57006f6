//! In-memory store adapters for dev and tests.
//!
//! The participant store performs its duplicate and capacity checks under
//! the same lock as the insert, which makes the invariants race-safe here
//! the same way the Postgres constraints make them race-safe in production.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gestevent_core::{EventId, ParticipantId};
use gestevent_registration::{EventRecord, NewParticipant, Participant, ParticipantStatus};

use super::{
    ConsentRecord, ConsentStore, EventDirectory, InsertError, ParticipantStore, RateLimitStore,
    StoreError,
};

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// In-memory `events` table, keyed by slug.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    events: RwLock<HashMap<String, EventRecord>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace an event (test/dev setup).
    pub fn upsert(&self, event: EventRecord) {
        if let Ok(mut events) = self.events.write() {
            events.insert(event.slug.clone(), event);
        }
    }
}

#[async_trait]
impl EventDirectory for InMemoryDirectory {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<EventRecord>, StoreError> {
        let events = self.events.read().map_err(|_| poisoned())?;
        Ok(events.get(slug).cloned())
    }
}

/// In-memory `participants` table.
#[derive(Debug, Default)]
pub struct InMemoryParticipantStore {
    rows: Mutex<Vec<Participant>>,
}

impl InMemoryParticipantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ParticipantId) -> Option<Participant> {
        let rows = self.rows.lock().ok()?;
        rows.iter().find(|r| r.id == id).cloned()
    }

    pub fn for_event(&self, event_id: EventId) -> Vec<Participant> {
        match self.rows.lock() {
            Ok(rows) => rows.iter().filter(|r| r.event_id == event_id).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ParticipantStore for InMemoryParticipantStore {
    async fn count_confirmed_for_email(
        &self,
        event_id: EventId,
        email_lower: &str,
    ) -> Result<u32, StoreError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        let n = rows
            .iter()
            .filter(|r| {
                r.event_id == event_id
                    && r.email_lower == email_lower
                    && r.status == ParticipantStatus::Confirmed
            })
            .count();
        Ok(n as u32)
    }

    async fn count_confirmed(&self, event_id: EventId) -> Result<u32, StoreError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        let n = rows
            .iter()
            .filter(|r| r.event_id == event_id && r.status == ParticipantStatus::Confirmed)
            .count();
        Ok(n as u32)
    }

    async fn insert_confirmed(
        &self,
        new: NewParticipant,
        capacity: Option<u32>,
    ) -> Result<ParticipantId, InsertError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;

        let duplicate = rows.iter().any(|r| {
            r.event_id == new.event_id
                && r.email_lower == new.email_lower
                && r.status == ParticipantStatus::Confirmed
        });
        if duplicate {
            return Err(InsertError::Duplicate);
        }

        if let Some(capacity) = capacity.filter(|c| *c > 0) {
            let confirmed = rows
                .iter()
                .filter(|r| r.event_id == new.event_id && r.status == ParticipantStatus::Confirmed)
                .count() as u32;
            if confirmed >= capacity {
                return Err(InsertError::CapacityExceeded);
            }
        }

        let id = ParticipantId::new();
        rows.push(Participant {
            id,
            event_id: new.event_id,
            full_name: new.full_name,
            email: new.email,
            email_lower: new.email_lower,
            phone: new.phone,
            status: ParticipantStatus::Confirmed,
            created_at: Utc::now(),
            qr_png_url: None,
        });
        Ok(id)
    }

    async fn delete(&self, id: ParticipantId) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        rows.retain(|r| r.id != id);
        Ok(())
    }

    async fn set_ticket_url(&self, id: ParticipantId, url: &str) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.qr_png_url = Some(url.to_string());
        }
        Ok(())
    }
}

/// In-memory trailing-window request log.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    hits: Mutex<Vec<(String, DateTime<Utc>)>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn record(&self, ip: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut hits = self.hits.lock().map_err(|_| poisoned())?;
        hits.push((ip.to_string(), at));
        Ok(())
    }

    async fn count_since(&self, ip: &str, since: DateTime<Utc>) -> Result<u32, StoreError> {
        let hits = self.hits.lock().map_err(|_| poisoned())?;
        let n = hits.iter().filter(|(h, at)| h == ip && *at >= since).count();
        Ok(n as u32)
    }
}

/// In-memory consent/audit sink.
#[derive(Debug, Default)]
pub struct InMemoryConsentStore {
    records: Mutex<Vec<ConsentRecord>>,
}

impl InMemoryConsentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<ConsentRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl ConsentStore for InMemoryConsentStore {
    async fn record(&self, consent: ConsentRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| poisoned())?;
        records.push(consent);
        Ok(())
    }
}
