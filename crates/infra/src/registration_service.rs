//! The public-registration pipeline.
//!
//! Control flow per request: rate limiter → event lookup → eligibility →
//! participant insert → ticket artifact (render, upload, sign, attach) →
//! detached notification sinks. Everything after the insert is covered by
//! compensating actions; everything after the signed URL is best-effort.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use gestevent_core::{sha256_hex, ParticipantId};
use gestevent_registration::{
    eligibility, EventRecord, NewParticipant, RegistrationError, RegistrationRequest,
};
use gestevent_tickets::TicketPayload;

use crate::blob::TicketBucket;
use crate::mailer::{ConfirmationEmail, Mailer};
use crate::saga::{Compensation, CompensationStack};
use crate::store::{
    ConsentRecord, ConsentStore, EventDirectory, InsertError, ParticipantStore, RateLimitStore,
};

/// Trailing window used for per-address throttling.
pub const RATE_LIMIT_WINDOW_SECS: i64 = 60;
/// Attempts allowed per address inside the window (the recorded attempt
/// itself included).
pub const RATE_LIMIT_MAX_PER_WINDOW: u32 = 5;
/// Lifetime of the signed ticket URL.
const SIGNED_URL_TTL_SECS: u64 = 60 * 60 * 24;

/// Successful outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationAccepted {
    pub participant_id: ParticipantId,
}

/// Orchestrates one registration attempt against the collaborator ports.
///
/// Holds no per-request state; cross-request coordination is entirely
/// delegated to the participant store's insert invariants.
pub struct RegistrationService {
    events: Arc<dyn EventDirectory>,
    participants: Arc<dyn ParticipantStore>,
    rate_limits: Arc<dyn RateLimitStore>,
    consents: Arc<dyn ConsentStore>,
    bucket: Arc<dyn TicketBucket>,
    mailer: Arc<dyn Mailer>,
}

impl RegistrationService {
    pub fn new(
        events: Arc<dyn EventDirectory>,
        participants: Arc<dyn ParticipantStore>,
        rate_limits: Arc<dyn RateLimitStore>,
        consents: Arc<dyn ConsentStore>,
        bucket: Arc<dyn TicketBucket>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            events,
            participants,
            rate_limits,
            consents,
            bucket,
            mailer,
        }
    }

    /// Run the full pipeline for one validated request.
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationAccepted, RegistrationError> {
        let now = Utc::now();

        if self.is_rate_limited(&request.source_ip, now).await {
            return Err(RegistrationError::RateLimited);
        }

        let event = match self.events.find_by_slug(&request.slug).await {
            Ok(Some(event)) => event,
            Ok(None) => return Err(RegistrationError::EventNotFound),
            Err(err) => {
                tracing::warn!(error = %err, slug = %request.slug, "event lookup failed");
                return Err(RegistrationError::EventNotFound);
            }
        };

        eligibility::check_schedule(&event, now)?;

        // Advisory pre-checks. TOCTOU-prone by construction: two requests can
        // both pass them. The insert below is the authoritative guard.
        let confirmed_for_email = self
            .participants
            .count_confirmed_for_email(event.id, &request.email)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "duplicate pre-check failed");
                RegistrationError::DbCheckError
            })?;
        eligibility::check_quota(&event, confirmed_for_email)?;

        if event.effective_capacity().is_some() {
            let confirmed_total =
                self.participants
                    .count_confirmed(event.id)
                    .await
                    .map_err(|err| {
                        tracing::warn!(error = %err, "capacity pre-count failed");
                        RegistrationError::DbCountError
                    })?;
            eligibility::check_capacity(&event, confirmed_total)?;
        }

        let new = NewParticipant {
            event_id: event.id,
            full_name: request.full_name.clone(),
            email: request.email.clone(),
            email_lower: request.email.clone(),
            phone: request.phone.clone(),
        };
        let participant_id = match self
            .participants
            .insert_confirmed(new, event.effective_capacity())
            .await
        {
            Ok(id) => id,
            Err(InsertError::Duplicate) => return Err(RegistrationError::AlreadyRegistered),
            Err(InsertError::CapacityExceeded) => return Err(RegistrationError::SoldOut),
            Err(InsertError::Store(err)) => {
                tracing::warn!(error = %err, "participant insert failed");
                return Err(RegistrationError::ParticipantCreateFailed);
            }
        };

        let mut compensations = CompensationStack::new();
        compensations.push(Compensation::DeleteParticipant(participant_id));

        let qr_url = match self
            .issue_ticket(&event, participant_id, &mut compensations)
            .await
        {
            Ok(url) => url,
            Err(err) => {
                self.unwind(compensations).await;
                return Err(err);
            }
        };

        // From here the registration is a success; nothing below may change
        // the response.
        if let Err(err) = self
            .participants
            .set_ticket_url(participant_id, &qr_url)
            .await
        {
            tracing::warn!(error = %err, participant = %participant_id, "ticket url attach failed");
        }

        self.spawn_notifications(&event, participant_id, &request, qr_url);

        Ok(RegistrationAccepted { participant_id })
    }

    /// Render, upload, and sign the ticket artifact, registering the upload
    /// compensation once the object exists.
    async fn issue_ticket(
        &self,
        event: &EventRecord,
        participant_id: ParticipantId,
        compensations: &mut CompensationStack,
    ) -> Result<String, RegistrationError> {
        let payload = TicketPayload::new(event.id, participant_id);
        let png = gestevent_tickets::render_png(&payload.encode()).map_err(|err| {
            tracing::warn!(error = %err, participant = %participant_id, "qr rendering failed");
            RegistrationError::QrUploadFailed
        })?;

        let path = gestevent_tickets::object_path(event.id, participant_id);
        self.bucket.upload(&path, png).await.map_err(|err| {
            tracing::warn!(error = %err, path = %path, "qr upload failed");
            RegistrationError::QrUploadFailed
        })?;
        compensations.push(Compensation::RemoveTicketObject(path.clone()));

        self.bucket
            .signed_url(&path, SIGNED_URL_TTL_SECS)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, path = %path, "qr url signing failed");
                RegistrationError::QrSignFailed
            })
    }

    /// Best-effort trailing-window throttle. Any store failure disables the
    /// check for this request — rate limiting is never a hard dependency.
    async fn is_rate_limited(&self, ip: &str, now: DateTime<Utc>) -> bool {
        if ip.is_empty() {
            return false;
        }

        let counted: Result<u32, _> = async {
            self.rate_limits.record(ip, now).await?;
            self.rate_limits
                .count_since(ip, now - Duration::seconds(RATE_LIMIT_WINDOW_SECS))
                .await
        }
        .await;

        match counted {
            Ok(count) => count > RATE_LIMIT_MAX_PER_WINDOW,
            Err(err) => {
                tracing::debug!(error = %err, "rate-limit store unavailable, skipping check");
                false
            }
        }
    }

    /// Run compensations for all completed steps in reverse order.
    async fn unwind(&self, compensations: CompensationStack) {
        for compensation in compensations.unwind() {
            match compensation {
                Compensation::DeleteParticipant(id) => {
                    if let Err(err) = self.participants.delete(id).await {
                        tracing::error!(error = %err, participant = %id, "compensating delete failed");
                    }
                }
                Compensation::RemoveTicketObject(path) => {
                    if let Err(err) = self.bucket.remove(&path).await {
                        tracing::error!(error = %err, path = %path, "compensating object removal failed");
                    }
                }
            }
        }
    }

    /// Detached consent + email sinks; failures are observed only via logs.
    fn spawn_notifications(
        &self,
        event: &EventRecord,
        participant_id: ParticipantId,
        request: &RegistrationRequest,
        qr_url: String,
    ) {
        let consents = Arc::clone(&self.consents);
        let consent = ConsentRecord {
            email_hash: sha256_hex(&request.email),
            ip: request.source_ip.clone(),
            event_id: event.id,
            participant_id,
        };
        tokio::spawn(async move {
            if let Err(err) = consents.record(consent).await {
                tracing::warn!(error = %err, "consent logging failed");
            }
        });

        let mailer = Arc::clone(&self.mailer);
        let email = ConfirmationEmail {
            to: request.email.clone(),
            full_name: request.full_name.clone(),
            event_title: event.title.clone(),
            qr_url,
        };
        tokio::spawn(async move {
            if let Err(err) = mailer.send_confirmation(&email).await {
                tracing::warn!(error = %err, to = %email.to, "confirmation email failed");
            }
        });
    }
}
