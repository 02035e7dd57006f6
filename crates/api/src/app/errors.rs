//! Consistent JSON error responses.
//!
//! Failure bodies are `{ "error": <message>, "code": <machine code> }`. When
//! no explicit code is supplied the code is derived by slugifying the
//! message, so every error stays machine-matchable.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gestevent_core::slugify;
use gestevent_registration::{ErrorClass, RegistrationError};

pub fn json_error(
    status: StatusCode,
    code: Option<&str>,
    message: impl Into<String>,
) -> axum::response::Response {
    let message = message.into();
    let code = code.map(str::to_owned).unwrap_or_else(|| slugify(&message));
    (
        status,
        axum::Json(json!({
            "error": message,
            "code": code,
        })),
    )
        .into_response()
}

pub fn registration_error_to_response(err: &RegistrationError) -> axum::response::Response {
    let status = match err.class() {
        ErrorClass::Validation => StatusCode::BAD_REQUEST,
        ErrorClass::Policy => StatusCode::FORBIDDEN,
        ErrorClass::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorClass::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, Some(err.code()), err.to_string())
}
