use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use shopfront_auth::{AccessPolicy, Caller, Operation};

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/whoami", get(whoami))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(caller): Extension<Caller>) -> axum::response::Response {
    if let Err(e) = AccessPolicy::Authenticated.check(&caller, Operation::Read) {
        return errors::authz_error_to_response(e);
    }
    match caller.user() {
        Some(user) => Json(dto::caller_to_json(user)).into_response(),
        None => errors::not_authenticated("authentication credentials were not provided"),
    }
}
