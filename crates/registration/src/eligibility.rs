//! Eligibility state machine for a registration attempt.
//!
//! Checks run in strict order, short-circuiting on the first failure:
//! publication, open flag, sales window, then quota, then capacity. Policy
//! state is checked before quota/capacity so the caller gets the most
//! actionable message. The quota/capacity checks consume counts the caller
//! fetches separately and are advisory only — the store adapter's insert is
//! the authoritative guard under concurrency.

use chrono::{DateTime, Utc};

use crate::error::RegistrationError;
use crate::event::{EventRecord, EventStatus};

/// Publication / open-flag / sales-window checks (steps 2–5).
///
/// Needs only the event record and the clock; runs before any count query.
pub fn check_schedule(event: &EventRecord, now: DateTime<Utc>) -> Result<(), RegistrationError> {
    if event.status != EventStatus::Published {
        return Err(RegistrationError::EventNotPublished);
    }
    if !event.is_open {
        return Err(RegistrationError::RegistrationsClosed);
    }
    if let Some(from) = event.sales_from {
        if from > now {
            return Err(RegistrationError::RegistrationsNotOpenYet);
        }
    }
    if let Some(until) = event.sales_until {
        if until < now {
            return Err(RegistrationError::RegistrationsClosedPeriod);
        }
    }
    Ok(())
}

/// Per-email quota check (step 6). A `max_per_user` of `0` disables it.
pub fn check_quota(event: &EventRecord, confirmed_for_email: u32) -> Result<(), RegistrationError> {
    if event.max_per_user > 0 && confirmed_for_email >= event.max_per_user {
        return Err(RegistrationError::UserQuotaReached);
    }
    Ok(())
}

/// Capacity check (step 7). Unset or zero capacity means unlimited.
pub fn check_capacity(event: &EventRecord, confirmed_total: u32) -> Result<(), RegistrationError> {
    if let Some(capacity) = event.effective_capacity() {
        if confirmed_total >= capacity {
            return Err(RegistrationError::SoldOut);
        }
    }
    Ok(())
}
