//! Participant records written by the registration pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gestevent_core::{EventId, ParticipantId};

/// Participant lifecycle status. `Confirmed` is the only status this core
/// ever writes; other statuses belong to back-office tooling.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Confirmed,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
        }
    }
}

/// Data for a participant row about to be inserted.
///
/// `(event_id, email_lower)` must be unique among confirmed participants —
/// the store adapter enforces this as the authoritative race-safe guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub event_id: EventId,
    pub full_name: String,
    pub email: String,
    pub email_lower: String,
    pub phone: Option<String>,
}

/// A durably stored participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub event_id: EventId,
    pub full_name: String,
    pub email: String,
    pub email_lower: String,
    pub phone: Option<String>,
    pub status: ParticipantStatus,
    pub created_at: DateTime<Utc>,
    pub qr_png_url: Option<String>,
}
