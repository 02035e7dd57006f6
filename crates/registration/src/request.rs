//! Inbound registration payload and its validation.

use serde::Deserialize;

use crate::error::RegistrationError;

/// Raw JSON body of `POST /public_register`, before validation.
///
/// All fields are optional at the wire; `RegistrationRequest::from_payload`
/// decides what is actually required. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationPayload {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub client_ip: Option<String>,
}

/// A validated registration attempt.
///
/// Ephemeral: constructed per request, either rejected before any write or
/// consumed to produce exactly one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub slug: String,
    pub full_name: String,
    /// Trimmed and lower-cased; used both for storage and duplicate matching.
    pub email: String,
    pub phone: Option<String>,
    /// Resolved source address; empty disables rate limiting.
    pub source_ip: String,
}

impl RegistrationRequest {
    /// Validate and normalize a raw payload.
    ///
    /// `full_name` wins over `firstname`/`lastname`; a present-but-empty
    /// `full_name` falls back to the name parts. Fails fast with a distinct
    /// code per missing required field, before any collaborator call.
    pub fn from_payload(
        payload: RegistrationPayload,
        source_ip: String,
    ) -> Result<Self, RegistrationError> {
        let slug = payload.slug.unwrap_or_default().trim().to_string();

        let full_name = match payload.full_name {
            Some(name) if !name.is_empty() => name,
            _ => format!(
                "{} {}",
                payload.firstname.unwrap_or_default(),
                payload.lastname.unwrap_or_default()
            ),
        }
        .trim()
        .to_string();

        let email = payload.email.unwrap_or_default().trim().to_lowercase();

        let phone = payload.phone.filter(|p| !p.is_empty());

        if slug.is_empty() {
            return Err(RegistrationError::SlugRequired);
        }
        if full_name.is_empty() {
            return Err(RegistrationError::FullNameRequired);
        }
        if email.is_empty() {
            return Err(RegistrationError::EmailRequired);
        }

        Ok(Self {
            slug,
            full_name,
            email,
            phone,
            source_ip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> RegistrationPayload {
        serde_json::from_str(json).expect("payload should deserialize")
    }

    fn validate(json: &str) -> Result<RegistrationRequest, RegistrationError> {
        RegistrationRequest::from_payload(payload(json), String::new())
    }

    #[test]
    fn accepts_complete_payload() {
        let req = validate(
            r#"{"slug":" spring-gala ","full_name":" Jane Doe ","email":" Jane@Example.COM ","phone":"+33 6 00 00 00 00"}"#,
        )
        .unwrap();
        assert_eq!(req.slug, "spring-gala");
        assert_eq!(req.full_name, "Jane Doe");
        assert_eq!(req.email, "jane@example.com");
        assert_eq!(req.phone.as_deref(), Some("+33 6 00 00 00 00"));
    }

    #[test]
    fn full_name_falls_back_to_name_parts() {
        let req =
            validate(r#"{"slug":"gala","firstname":"Jane","lastname":"Doe","email":"j@d.io"}"#)
                .unwrap();
        assert_eq!(req.full_name, "Jane Doe");
    }

    #[test]
    fn empty_full_name_falls_back_to_name_parts() {
        let req = validate(
            r#"{"slug":"gala","full_name":"","firstname":"Jane","lastname":"Doe","email":"j@d.io"}"#,
        )
        .unwrap();
        assert_eq!(req.full_name, "Jane Doe");
    }

    #[test]
    fn whitespace_full_name_without_parts_is_rejected() {
        // "  " is present, so it wins over the (absent) parts, then trims away.
        assert_eq!(
            validate(r#"{"slug":"gala","full_name":"  ","email":"j@d.io"}"#),
            Err(RegistrationError::FullNameRequired)
        );
    }

    #[test]
    fn missing_fields_fail_with_distinct_codes() {
        assert_eq!(
            validate(r#"{"full_name":"Jane","email":"j@d.io"}"#),
            Err(RegistrationError::SlugRequired)
        );
        assert_eq!(
            validate(r#"{"slug":"gala","email":"j@d.io"}"#),
            Err(RegistrationError::FullNameRequired)
        );
        assert_eq!(
            validate(r#"{"slug":"gala","full_name":"Jane"}"#),
            Err(RegistrationError::EmailRequired)
        );
    }

    #[test]
    fn slug_is_checked_before_name_and_email() {
        assert_eq!(validate(r#"{}"#), Err(RegistrationError::SlugRequired));
    }

    #[test]
    fn empty_phone_becomes_none() {
        let req = validate(r#"{"slug":"gala","full_name":"Jane","email":"j@d.io","phone":""}"#)
            .unwrap();
        assert_eq!(req.phone, None);
    }

    #[test]
    fn null_fields_are_tolerated() {
        let req = validate(
            r#"{"slug":"gala","full_name":"Jane","email":"j@d.io","phone":null,"client_ip":null}"#,
        )
        .unwrap();
        assert_eq!(req.phone, None);
    }
}
