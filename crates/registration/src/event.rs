//! Event record as read from the directory collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gestevent_core::EventId;

/// Publication status of an event.
///
/// Anything the backing store reports that is not `published`
/// (case-insensitive) is treated as [`EventStatus::Draft`]: an unknown status
/// must never open registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
}

impl EventStatus {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("published") {
            Self::Published
        } else {
            Self::Draft
        }
    }
}

/// An event as the registration pipeline sees it.
///
/// Owned by the relational store collaborator; this core only reads it and
/// never caches it beyond a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    pub status: EventStatus,
    pub is_open: bool,
    pub sales_from: Option<DateTime<Utc>>,
    pub sales_until: Option<DateTime<Utc>>,
    /// `None` or `Some(0)` means unlimited.
    pub capacity: Option<u32>,
    /// Maximum confirmed registrations per email; `0` disables the check.
    pub max_per_user: u32,
    pub slug: String,
}

impl EventRecord {
    /// Capacity, when one is actually configured (set and positive).
    pub fn effective_capacity(&self) -> Option<u32> {
        self.capacity.filter(|c| *c > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(EventStatus::parse("published"), EventStatus::Published);
        assert_eq!(EventStatus::parse("Published"), EventStatus::Published);
        assert_eq!(EventStatus::parse("PUBLISHED"), EventStatus::Published);
    }

    #[test]
    fn unknown_status_is_draft() {
        assert_eq!(EventStatus::parse("draft"), EventStatus::Draft);
        assert_eq!(EventStatus::parse("archived"), EventStatus::Draft);
        assert_eq!(EventStatus::parse(""), EventStatus::Draft);
    }

    #[test]
    fn zero_capacity_means_unlimited() {
        let mut event = crate::eligibility::tests::published_event();
        event.capacity = Some(0);
        assert_eq!(event.effective_capacity(), None);
        event.capacity = None;
        assert_eq!(event.effective_capacity(), None);
        event.capacity = Some(2);
        assert_eq!(event.effective_capacity(), Some(2));
    }
}
