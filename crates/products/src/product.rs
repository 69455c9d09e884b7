use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shopfront_core::{Entity, ProductId};

use crate::contract::{ProductFields, ProductPatch};

/// Number of decimal places prices are stored and rendered with.
pub const PRICE_SCALE: u32 = 2;

/// Catalog product record.
///
/// Client-writable state lives in [`ProductFields`]; `id`, `created_at` and
/// `updated_at` are only ever assigned here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    fields: ProductFields,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// A brand-new record; both timestamps start at `now`.
    pub fn create(id: ProductId, fields: ProductFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a record loaded from storage.
    pub fn restore(
        id: ProductId,
        fields: ProductFields,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            fields,
            created_at,
            updated_at,
        }
    }

    /// Full update: every writable field is replaced.
    pub fn replace(&mut self, fields: ProductFields, now: DateTime<Utc>) {
        self.fields = fields;
        self.touch(now);
    }

    /// Partial update: only the fields present in `patch` change.
    pub fn patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        let ProductPatch {
            name,
            description,
            price,
            stock,
            category,
            image_url,
        } = patch;

        if let Some(v) = name {
            self.fields.name = v;
        }
        if let Some(v) = description {
            self.fields.description = v;
        }
        if let Some(v) = price {
            self.fields.price = v;
        }
        if let Some(v) = stock {
            self.fields.stock = v;
        }
        if let Some(v) = category {
            self.fields.category = v;
        }
        if let Some(v) = image_url {
            self.fields.image_url = v;
        }
        self.touch(now);
    }

    // updated_at never moves backwards, even if the wall clock does.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at);
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn fields(&self) -> &ProductFields {
        &self.fields
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn description(&self) -> &str {
        &self.fields.description
    }

    pub fn price(&self) -> Decimal {
        self.fields.price
    }

    pub fn stock(&self) -> i32 {
        self.fields.stock
    }

    pub fn category(&self) -> &str {
        &self.fields.category
    }

    pub fn image_url(&self) -> Option<&str> {
        self.fields.image_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Render a price the way clients see it: a string with exactly two decimals.
pub fn format_price(price: &Decimal) -> String {
    let mut p = *price;
    p.rescale(PRICE_SCALE);
    p.to_string()
}
