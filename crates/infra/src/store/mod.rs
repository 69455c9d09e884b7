//! Storage abstractions for the catalog and the account registry.

use chrono::{DateTime, Utc};
use thiserror::Error;

use shopfront_auth::UserAccount;
use shopfront_core::{ProductId, UserId};
use shopfront_products::{Product, ProductFields, ProductPatch};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryAccountStore, InMemoryProductStore};
pub use postgres::{PostgresAccountStore, PostgresProductStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated (e.g. duplicate username).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other backend failure (connection, query, decoding, poisoned lock).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A change applied to an existing product under the store's write lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductChange {
    Replace(ProductFields),
    Patch(ProductPatch),
}

impl ProductChange {
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) {
        match self {
            Self::Replace(fields) => product.replace(fields, now),
            Self::Patch(patch) => product.patch(patch, now),
        }
    }
}

/// Product catalog storage.
///
/// `list` returns every product ordered by name (byte-wise), ties broken by id.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn insert(&self, product: Product) -> Result<Product, StoreError>;

    /// Apply `change` atomically. Returns `None` if the product does not exist.
    async fn update(
        &self,
        id: ProductId,
        change: ProductChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Product>, StoreError>;

    /// Returns `false` if nothing was deleted.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;
}

/// Registered user accounts. Usernames are unique (case-sensitive).
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] if the username is already taken.
    async fn insert(&self, account: UserAccount) -> Result<UserAccount, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError>;

    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;
}

/// Catalog ordering: name compared byte-wise, then id.
pub(crate) fn catalog_order(a: &Product, b: &Product) -> core::cmp::Ordering {
    a.name()
        .as_bytes()
        .cmp(b.name().as_bytes())
        .then_with(|| a.id_typed().as_uuid().cmp(b.id_typed().as_uuid()))
}
