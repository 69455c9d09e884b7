use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use shopfront_auth::AuthenticatedUser;
use shopfront_products::{Product, format_price};

// -------------------------
// Response mapping
// -------------------------

/// Wire representation of a product. Prices travel as fixed-point strings.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: i32,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub fn product_to_json(product: &Product) -> ProductResponse {
    ProductResponse {
        id: product.id_typed().to_string(),
        name: product.name().to_string(),
        description: product.description().to_string(),
        price: format_price(&product.price()),
        stock: product.stock(),
        category: product.category().to_string(),
        image_url: product.image_url().map(str::to_string),
        created_at: timestamp(product.created_at()),
        updated_at: timestamp(product.updated_at()),
    }
}

pub fn caller_to_json(user: &AuthenticatedUser) -> serde_json::Value {
    serde_json::json!({
        "id": user.user_id.to_string(),
        "username": user.username,
    })
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
