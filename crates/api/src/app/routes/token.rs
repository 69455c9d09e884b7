//! Token pair issuance and refresh.

use std::sync::Arc;

use axum::{
    extract::{Extension, rejection::JsonRejection},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;

use shopfront_auth::{Credentials, TokenType, UserAccount};
use shopfront_core::fields::{self, FieldErrors, FieldValue, Payload, TextRules};

use crate::app::errors;
use crate::app::routes::route_both;
use crate::app::services::AppServices;

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

pub fn router() -> Router {
    let router = route_both(Router::new(), "/token", post(obtain_token));
    route_both(router, "/token/refresh", post(refresh_token))
}

fn invalid_credentials() -> axum::response::Response {
    errors::unauthorized("invalid_credentials", INVALID_CREDENTIALS)
}

fn issue_for(services: &AppServices, account: &UserAccount) -> axum::response::Response {
    match services.tokens.issue_pair(account.id, &account.username, Utc::now()) {
        Ok(pair) => Json(pair).into_response(),
        Err(e) => errors::token_error_to_response(e),
    }
}

pub async fn obtain_token(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let Credentials { username, password } = match Credentials::from_json(&body) {
        Ok(c) => c,
        Err(e) => return errors::validation_error(e),
    };

    let account = match services.accounts.find_by_username(&username).await {
        Ok(Some(account)) => account,
        Ok(None) => return invalid_credentials(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let stored_hash = account.password_hash.clone();
    match tokio::task::spawn_blocking(move || password.verify(&stored_hash)).await {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) => {
            tracing::debug!(username = %username, "password mismatch");
            return invalid_credentials();
        }
        Ok(Err(e)) => return errors::password_error_to_response(e),
        Err(e) => return errors::join_error_to_response(e),
    }

    tracing::info!(user_id = %account.id, "token pair issued");
    issue_for(&services, &account)
}

pub async fn refresh_token(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let token = match refresh_field(&body) {
        Ok(t) => t,
        Err(e) => return errors::validation_error(e),
    };

    let claims = match services.tokens.validate_as(&token, TokenType::Refresh, Utc::now()) {
        Ok(c) => c,
        Err(e) => return errors::token_error_to_response(e),
    };

    // The account may have been removed since the token was issued.
    let account = match services.accounts.get(claims.sub).await {
        Ok(Some(account)) => account,
        Ok(None) => return errors::not_authenticated("user not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    issue_for(&services, &account)
}

fn refresh_field(body: &Value) -> Result<String, FieldErrors> {
    let payload = Payload::from_json(body)?;
    let mut errors = FieldErrors::new();
    match payload.field("refresh") {
        FieldValue::Missing => errors.add("refresh", fields::REQUIRED),
        FieldValue::Null => errors.add("refresh", fields::NOT_NULL),
        FieldValue::Present(v) => match fields::parse_text(v, TextRules::new()) {
            Ok(token) => return Ok(token),
            Err(msg) => errors.add("refresh", msg),
        },
    }
    Err(errors)
}
