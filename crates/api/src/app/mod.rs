//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and token codec wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: response mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServices) -> Router {
    let auth_state = middleware::AuthState {
        jwt: services.tokens.clone(),
        accounts: services.accounts.clone(),
    };
    let services = Arc::new(services);

    // Every resource route sees a classified caller.
    let classified = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(services.clone()))
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            )),
    );

    // Token issuance ignores any bearer the client still attaches.
    let unauthenticated = routes::token::router().layer(Extension(services));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(unauthenticated)
        .merge(classified)
}
