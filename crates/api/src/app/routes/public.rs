//! Public registration endpoint.
//!
//! `POST /public_register` — anonymous by design; no identity provider is
//! consulted. The handler only does boundary work (method gating, body
//! parsing, source-address resolution); everything else lives in the
//! registration pipeline.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Extension, Json, Router};

use gestevent_registration::{RegistrationError, RegistrationPayload, RegistrationRequest};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route(
        "/public_register",
        post(register).options(preflight).fallback(post_only),
    )
}

/// CORS pre-flight is answered by the CORS layer; plain OPTIONS gets a no-op.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn post_only() -> axum::response::Response {
    // Code derived from the message: `post_only`.
    errors::json_error(StatusCode::BAD_REQUEST, None, "POST only")
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let Some(service) = services.registration() else {
        return errors::registration_error_to_response(&RegistrationError::EnvMissing);
    };

    let payload: RegistrationPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => return errors::registration_error_to_response(&RegistrationError::InvalidJson),
    };

    let source_ip = client_ip(&headers, payload.client_ip.as_deref());
    let request = match RegistrationRequest::from_payload(payload, source_ip) {
        Ok(request) => request,
        Err(err) => return errors::registration_error_to_response(&err),
    };

    match service.register(request).await {
        Ok(accepted) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "participant_id": accepted.participant_id.to_string(),
            })),
        )
            .into_response(),
        Err(err) => errors::registration_error_to_response(&err),
    }
}

/// Resolve the source address: forwarded headers win over the
/// client-supplied body field.
fn client_ip(headers: &HeaderMap, from_body: Option<&str>) -> String {
    let from_headers = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        });

    from_headers
        .or(from_body)
        .map(str::to_owned)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn forwarded_header_wins_over_body() {
        let h = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        assert_eq!(client_ip(&h, Some("9.9.9.9")), "203.0.113.7");
    }

    #[test]
    fn real_ip_is_second_choice() {
        let h = headers(&[("x-real-ip", "203.0.113.8")]);
        assert_eq!(client_ip(&h, Some("9.9.9.9")), "203.0.113.8");
    }

    #[test]
    fn body_field_is_the_fallback() {
        assert_eq!(client_ip(&HeaderMap::new(), Some("9.9.9.9")), "9.9.9.9");
        assert_eq!(client_ip(&HeaderMap::new(), None), "");
    }
}
