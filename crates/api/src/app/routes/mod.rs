use axum::{Router, routing::MethodRouter};

pub mod products;
pub mod system;
pub mod token;
pub mod users;

/// Router for every endpoint behind the auth middleware.
pub fn router() -> Router {
    Router::new()
        .merge(system::router())
        .merge(products::router())
        .merge(users::router())
}

/// Register `path` both with and without a trailing slash.
fn route_both(router: Router, path: &str, methods: MethodRouter) -> Router {
    let trimmed = path.trim_end_matches('/');
    router
        .route(trimmed, methods.clone())
        .route(&format!("{trimmed}/"), methods)
}
