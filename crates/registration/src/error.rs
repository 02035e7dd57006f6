//! Registration error taxonomy.
//!
//! One enum covers the whole pipeline: client input errors, policy
//! rejections, rate limiting, and infrastructure failures. Each variant
//! carries a stable machine code (`code()`) and an HTTP class (`class()`);
//! the boundary maps the class to a status and serializes
//! `{ "error": <message>, "code": <code> }`. User-facing messages keep the
//! product's French wording; codes are what clients switch on.

use thiserror::Error;

/// Which HTTP class a [`RegistrationError`] belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing/malformed input or unknown slug — 400, no retry implied.
    Validation,
    /// Event state forbids registration — 403, shown verbatim to the user.
    Policy,
    /// Too many attempts from one source address — 429.
    RateLimit,
    /// Collaborator failure — 500, generic user message, code kept for operators.
    Infrastructure,
}

/// Every way a registration attempt can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("slug required")]
    SlugRequired,
    #[error("full_name required")]
    FullNameRequired,
    #[error("email required")]
    EmailRequired,
    #[error("Événement introuvable")]
    EventNotFound,

    #[error("Événement non publié")]
    EventNotPublished,
    #[error("Inscriptions fermées")]
    RegistrationsClosed,
    #[error("Inscriptions pas encore ouvertes")]
    RegistrationsNotOpenYet,
    #[error("Inscriptions clôturées")]
    RegistrationsClosedPeriod,
    #[error("Quota atteint pour cet email")]
    UserQuotaReached,
    #[error("Complet")]
    SoldOut,
    #[error("Déjà inscrit pour cet événement")]
    AlreadyRegistered,

    #[error("Trop de tentatives, réessayez plus tard")]
    RateLimited,

    #[error("Erreur vérification existants")]
    DbCheckError,
    #[error("Erreur comptage")]
    DbCountError,
    #[error("Impossible de créer le participant")]
    ParticipantCreateFailed,
    #[error("Échec upload QR")]
    QrUploadFailed,
    #[error("Échec signature URL")]
    QrSignFailed,
    #[error("Service env not set")]
    EnvMissing,
}

impl RegistrationError {
    /// Stable machine-readable code, surfaced in every failure response.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson => "invalid_json",
            Self::SlugRequired => "slug_required",
            Self::FullNameRequired => "full_name_required",
            Self::EmailRequired => "email_required",
            Self::EventNotFound => "event_not_found",
            Self::EventNotPublished => "event_not_published",
            Self::RegistrationsClosed => "registrations_closed",
            Self::RegistrationsNotOpenYet => "registrations_not_open_yet",
            Self::RegistrationsClosedPeriod => "registrations_closed_period",
            Self::UserQuotaReached => "user_quota_reached",
            Self::SoldOut => "sold_out",
            Self::AlreadyRegistered => "already_registered",
            Self::RateLimited => "rate_limited",
            Self::DbCheckError => "db_check_error",
            Self::DbCountError => "db_count_error",
            Self::ParticipantCreateFailed => "participant_create_failed",
            Self::QrUploadFailed => "qr_upload_failed",
            Self::QrSignFailed => "qr_sign_failed",
            Self::EnvMissing => "env_missing",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidJson
            | Self::SlugRequired
            | Self::FullNameRequired
            | Self::EmailRequired
            | Self::EventNotFound => ErrorClass::Validation,

            Self::EventNotPublished
            | Self::RegistrationsClosed
            | Self::RegistrationsNotOpenYet
            | Self::RegistrationsClosedPeriod
            | Self::UserQuotaReached
            | Self::SoldOut
            | Self::AlreadyRegistered => ErrorClass::Policy,

            Self::RateLimited => ErrorClass::RateLimit,

            Self::DbCheckError
            | Self::DbCountError
            | Self::ParticipantCreateFailed
            | Self::QrUploadFailed
            | Self::QrSignFailed
            | Self::EnvMissing => ErrorClass::Infrastructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_identifiers() {
        assert_eq!(RegistrationError::SoldOut.code(), "sold_out");
        assert_eq!(RegistrationError::AlreadyRegistered.code(), "already_registered");
        assert_eq!(RegistrationError::QrUploadFailed.code(), "qr_upload_failed");
    }

    #[test]
    fn classes_match_http_taxonomy() {
        assert_eq!(RegistrationError::SlugRequired.class(), ErrorClass::Validation);
        assert_eq!(RegistrationError::EventNotFound.class(), ErrorClass::Validation);
        assert_eq!(RegistrationError::SoldOut.class(), ErrorClass::Policy);
        assert_eq!(RegistrationError::RateLimited.class(), ErrorClass::RateLimit);
        assert_eq!(RegistrationError::QrSignFailed.class(), ErrorClass::Infrastructure);
    }
}
