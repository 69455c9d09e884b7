use std::sync::Arc;

use axum::{
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;

use shopfront_auth::registration::username_taken;
use shopfront_auth::{AccessPolicy, Caller, Operation, RegisteredUser, Registration};
use shopfront_core::UserId;
use shopfront_infra::StoreError;

use crate::app::routes::route_both;
use crate::app::services::AppServices;
use crate::app::errors;

pub fn router() -> Router {
    route_both(Router::new(), "/register", post(register))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = AccessPolicy::AllowAny.check(&caller, Operation::Write) {
        return errors::authz_error_to_response(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let registration = match Registration::from_json(&body) {
        Ok(r) => r,
        Err(e) => return errors::validation_error(e),
    };

    // Checked before hashing; a concurrent duplicate is still caught by the store.
    match services.accounts.find_by_username(&registration.username).await {
        Ok(Some(_)) => return errors::validation_error(username_taken()),
        Ok(None) => {}
        Err(e) => return errors::store_error_to_response(e),
    }

    let password = registration.password.clone();
    let password_hash = match tokio::task::spawn_blocking(move || password.hash()).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => return errors::password_error_to_response(e),
        Err(e) => return errors::join_error_to_response(e),
    };

    let account = registration
        .into_new_account(password_hash)
        .into_account(UserId::new(), Utc::now());

    match services.accounts.insert(account).await {
        Ok(account) => {
            tracing::info!(user_id = %account.id, username = %account.username, "user registered");
            (StatusCode::CREATED, Json(RegisteredUser::from(&account))).into_response()
        }
        Err(StoreError::Conflict(_)) => errors::validation_error(username_taken()),
        Err(e) => errors::store_error_to_response(e),
    }
}
