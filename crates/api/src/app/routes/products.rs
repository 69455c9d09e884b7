use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;

use shopfront_auth::{AccessPolicy, Caller, Operation};
use shopfront_core::ProductId;
use shopfront_infra::ProductChange;
use shopfront_products::{Product, ProductFields, ProductPatch};

use crate::app::routes::route_both;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Anyone may read the catalog; only authenticated callers may change it.
const POLICY: AccessPolicy = AccessPolicy::AuthenticatedOrReadOnly;

pub fn router() -> Router {
    let router = route_both(
        Router::new(),
        "/products",
        get(list_products).post(create_product),
    );
    route_both(
        router,
        "/products/:id",
        get(get_product)
            .put(update_product)
            .patch(partial_update_product)
            .delete(delete_product),
    )
}

fn parse_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    if let Err(e) = POLICY.check(&caller, Operation::Read) {
        return errors::authz_error_to_response(e);
    }

    match services.products.list().await {
        Ok(products) => {
            Json(products.iter().map(dto::product_to_json).collect::<Vec<_>>()).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = POLICY.check(&caller, Operation::Read) {
        return errors::authz_error_to_response(e);
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.get(id).await {
        Ok(Some(product)) => Json(dto::product_to_json(&product)).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = POLICY.check(&caller, Operation::Write) {
        return errors::authz_error_to_response(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let fields = match ProductFields::from_json(&body) {
        Ok(f) => f,
        Err(e) => return errors::validation_error(e),
    };

    let product = Product::create(ProductId::new(), fields, Utc::now());
    match services.products.insert(product).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id_typed(), caller = %caller, "product created");
            (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = POLICY.check(&caller, Operation::Write) {
        return errors::authz_error_to_response(e);
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let fields = match ProductFields::from_json(&body) {
        Ok(f) => f,
        Err(e) => return errors::validation_error(e),
    };

    apply_change(&services, &caller, id, ProductChange::Replace(fields)).await
}

pub async fn partial_update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = POLICY.check(&caller, Operation::Write) {
        return errors::authz_error_to_response(e);
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let patch = match ProductPatch::from_json(&body) {
        Ok(p) => p,
        Err(e) => return errors::validation_error(e),
    };

    apply_change(&services, &caller, id, ProductChange::Patch(patch)).await
}

async fn apply_change(
    services: &AppServices,
    caller: &Caller,
    id: ProductId,
    change: ProductChange,
) -> axum::response::Response {
    match services.products.update(id, change, Utc::now()).await {
        Ok(Some(product)) => {
            tracing::info!(product_id = %id, caller = %caller, "product updated");
            Json(dto::product_to_json(&product)).into_response()
        }
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = POLICY.check(&caller, Operation::Write) {
        return errors::authz_error_to_response(e);
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.delete(id).await {
        Ok(true) => {
            tracing::info!(product_id = %id, caller = %caller, "product deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}
