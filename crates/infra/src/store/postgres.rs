//! Postgres-backed store adapters.
//!
//! ## Invariants at the database level
//!
//! The advisory pre-checks in the pipeline are racy by design; these adapters
//! carry the authoritative guards:
//!
//! - duplicate registrations: partial unique index on
//!   `(event_id, email_lower) WHERE status = 'confirmed'` — a violation maps
//!   PostgreSQL error `23505` to [`InsertError::Duplicate`];
//! - capacity: `insert_confirmed` locks the event row (`FOR UPDATE`),
//!   re-counts confirmed participants inside the transaction, and refuses the
//!   insert with [`InsertError::CapacityExceeded`] when full. Row-locking the
//!   event serializes concurrent inserts per event, so two registrations
//!   cannot both observe the last free seat.
//!
//! Schema lives in `crates/infra/migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use gestevent_core::{EventId, ParticipantId};
use gestevent_registration::{EventRecord, EventStatus, NewParticipant};

use super::{
    ConsentRecord, ConsentStore, EventDirectory, InsertError, ParticipantStore, RateLimitStore,
    StoreError,
};

/// One adapter over a shared connection pool, implementing every store port.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn event_from_row(row: &sqlx::postgres::PgRow) -> Result<EventRecord, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let capacity: Option<i32> = row.try_get("capacity")?;
    let max_per_user: Option<i32> = row.try_get("max_per_user")?;

    Ok(EventRecord {
        id: EventId::from_uuid(row.try_get("id")?),
        title: row.try_get("title")?,
        status: EventStatus::parse(&status),
        is_open: row.try_get("is_open")?,
        sales_from: row.try_get("sales_from")?,
        sales_until: row.try_get("sales_until")?,
        capacity: capacity.and_then(|c| u32::try_from(c).ok()),
        max_per_user: max_per_user
            .and_then(|q| u32::try_from(q).ok())
            .unwrap_or(0),
        slug: row.try_get("slug")?,
    })
}

#[async_trait]
impl EventDirectory for PostgresStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<EventRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, status, is_open, sales_from, sales_until,
                   capacity, max_per_user, slug
            FROM events
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(|r| event_from_row(&r).map_err(map_sqlx)).transpose()
    }
}

#[async_trait]
impl ParticipantStore for PostgresStore {
    async fn count_confirmed_for_email(
        &self,
        event_id: EventId,
        email_lower: &str,
    ) -> Result<u32, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM participants
            WHERE event_id = $1 AND email_lower = $2 AND status = 'confirmed'
            "#,
        )
        .bind(event_id.as_uuid())
        .bind(email_lower)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn count_confirmed(&self, event_id: EventId) -> Result<u32, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM participants
            WHERE event_id = $1 AND status = 'confirmed'
            "#,
        )
        .bind(event_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn insert_confirmed(
        &self,
        new: NewParticipant,
        capacity: Option<u32>,
    ) -> Result<ParticipantId, InsertError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Serialize inserts per event so the capacity count below is
        // authoritative with respect to concurrent registrations.
        sqlx::query("SELECT 1 FROM events WHERE id = $1 FOR UPDATE")
            .bind(new.event_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        if let Some(capacity) = capacity.filter(|c| *c > 0) {
            let confirmed: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM participants
                WHERE event_id = $1 AND status = 'confirmed'
                "#,
            )
            .bind(new.event_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx)?;

            if u32::try_from(confirmed).unwrap_or(u32::MAX) >= capacity {
                return Err(InsertError::CapacityExceeded);
            }
        }

        let id = ParticipantId::new();
        let inserted = sqlx::query(
            r#"
            INSERT INTO participants
                (id, event_id, full_name, email, email_lower, phone, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'confirmed', $7)
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.event_id.as_uuid())
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.email_lower)
        .bind(&new.phone)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Err(InsertError::Duplicate),
            Err(err) => return Err(InsertError::Store(map_sqlx(err))),
        }

        tx.commit().await.map_err(map_sqlx)?;
        Ok(id)
    }

    async fn delete(&self, id: ParticipantId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM participants WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn set_ticket_url(&self, id: ParticipantId, url: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE participants SET qr_png_url = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}

#[async_trait]
impl RateLimitStore for PostgresStore {
    async fn record(&self, ip: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO rate_limits_public_register (ip, created_at) VALUES ($1, $2)")
            .bind(ip)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn count_since(&self, ip: &str, since: DateTime<Utc>) -> Result<u32, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM rate_limits_public_register
            WHERE ip = $1 AND created_at >= $2
            "#,
        )
        .bind(ip)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl ConsentStore for PostgresStore {
    async fn record(&self, consent: ConsentRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO consents (email_hash, ip, event_id, participant_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&consent.email_hash)
        .bind(&consent.ip)
        .bind(consent.event_id.as_uuid())
        .bind(consent.participant_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}
