use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopfront_auth::{AuthzError, PasswordError, TokenError};
use shopfront_core::{DomainError, FieldErrors};
use shopfront_infra::StoreError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 400 with the per-field messages under `"fields"`.
pub fn validation_error(errors: FieldErrors) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": errors.to_string(),
            "fields": errors,
        })),
    )
        .into_response()
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}

/// 401 body; `detail` mirrors `message` for clients that read that key.
pub fn unauthorized(code: &'static str, message: impl Into<String>) -> axum::response::Response {
    let message = message.into();
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({
            "error": code,
            "message": message,
            "detail": message,
        })),
    )
        .into_response()
}

pub fn not_authenticated(message: impl Into<String>) -> axum::response::Response {
    unauthorized("not_authenticated", message)
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(errors) => validation_error(errors),
        // An id that cannot exist is indistinguishable from an unknown one.
        DomainError::InvalidId(_) | DomainError::NotFound => not_found(),
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    match err {
        AuthzError::NotAuthenticated => not_authenticated(err.to_string()),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "store operation failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
}

pub fn password_error_to_response(err: PasswordError) -> axum::response::Response {
    tracing::error!(error = %err, "password hashing failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
}

pub fn token_error_to_response(err: TokenError) -> axum::response::Response {
    match err {
        TokenError::Encode(_) => {
            tracing::error!(error = %err, "token encoding failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
        _ => {
            tracing::debug!(error = %err, "token rejected");
            not_authenticated(err.to_string())
        }
    }
}

/// Bodies that are not JSON at all never reach the field contract.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "parse_error", rejection.body_text())
}

/// Failure of a `spawn_blocking` task (panic or cancellation).
pub fn join_error_to_response(err: tokio::task::JoinError) -> axum::response::Response {
    tracing::error!(error = %err, "blocking task failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
}
