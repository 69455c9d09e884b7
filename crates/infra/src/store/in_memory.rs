use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use shopfront_auth::UserAccount;
use shopfront_core::{Entity, ProductId, UserId};
use shopfront_products::Product;

use super::{AccountStore, ProductChange, ProductStore, StoreError, catalog_order};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
}

/// In-memory product catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let map = read(&self.inner)?;
        let mut products: Vec<Product> = map.values().cloned().collect();
        products.sort_by(catalog_order);
        Ok(products)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(read(&self.inner)?.get(&id).cloned())
    }

    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let mut map = write(&self.inner)?;
        let id = product.id();
        if map.contains_key(&id) {
            return Err(StoreError::Conflict(format!("product {id} already exists")));
        }
        map.insert(id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        change: ProductChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Product>, StoreError> {
        let mut map = write(&self.inner)?;
        let Some(product) = map.get_mut(&id) else {
            return Ok(None);
        };
        change.apply(product, now);
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        Ok(write(&self.inner)?.remove(&id).is_some())
    }
}

/// In-memory account registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<HashMap<UserId, UserAccount>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, account: UserAccount) -> Result<UserAccount, StoreError> {
        let mut map = write(&self.inner)?;
        if map.values().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                account.username
            )));
        }
        map.insert(account.id(), account.clone());
        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(read(&self.inner)?
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(read(&self.inner)?.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shopfront_auth::NewAccount;
    use shopfront_products::{ProductFields, ProductPatch};

    fn fields(name: &str) -> ProductFields {
        ProductFields {
            name: name.to_string(),
            description: String::new(),
            price: Decimal::new(1999, 2),
            stock: 0,
            category: String::new(),
            image_url: None,
        }
    }

    fn account(username: &str) -> UserAccount {
        NewAccount {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$fake".to_string(),
        }
        .into_account(UserId::new(), Utc::now())
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = InMemoryProductStore::new();
        let product = Product::create(ProductId::new(), fields("Mug"), Utc::now());

        store.insert(product.clone()).await.unwrap();

        assert_eq!(store.get(product.id_typed()).await.unwrap(), Some(product));
        assert_eq!(store.get(ProductId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_is_sorted_by_name_bytes() {
        let store = InMemoryProductStore::new();
        let now = Utc::now();
        for name in ["banana", "Apple", "apple", "Zebra"] {
            store
                .insert(Product::create(ProductId::new(), fields(name), now))
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, ["Apple", "Zebra", "apple", "banana"]);
    }

    #[tokio::test]
    async fn update_applies_change_and_keeps_created_at() {
        let store = InMemoryProductStore::new();
        let created = Utc::now();
        let product = Product::create(ProductId::new(), fields("Mug"), created);
        store.insert(product.clone()).await.unwrap();

        let later = created + chrono::Duration::seconds(5);
        let patch = ProductPatch {
            stock: Some(7),
            ..ProductPatch::default()
        };
        let updated = store
            .update(product.id_typed(), ProductChange::Patch(patch), later)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.stock(), 7);
        assert_eq!(updated.name(), "Mug");
        assert_eq!(updated.created_at(), created);
        assert_eq!(updated.updated_at(), later);
        assert_eq!(store.get(product.id_typed()).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_product_report_absence() {
        let store = InMemoryProductStore::new();
        let id = ProductId::new();

        let updated = store
            .update(id, ProductChange::Replace(fields("x")), Utc::now())
            .await
            .unwrap();
        assert_eq!(updated, None);
        assert!(!store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_product() {
        let store = InMemoryProductStore::new();
        let product = Product::create(ProductId::new(), fields("Mug"), Utc::now());
        store.insert(product.clone()).await.unwrap();

        assert!(store.delete(product.id_typed()).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = InMemoryAccountStore::new();
        store.insert(account("alice")).await.unwrap();

        let err = store.insert(account("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Usernames are case-sensitive.
        store.insert(account("Alice")).await.unwrap();
    }

    #[tokio::test]
    async fn accounts_are_found_by_username_and_id() {
        let store = InMemoryAccountStore::new();
        let alice = store.insert(account("alice")).await.unwrap();

        assert_eq!(store.find_by_username("alice").await.unwrap(), Some(alice.clone()));
        assert_eq!(store.find_by_username("bob").await.unwrap(), None);
        assert_eq!(store.get(alice.id).await.unwrap(), Some(alice));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: listing is always sorted by (name bytes, id), whatever
            /// the insertion order.
            #[test]
            fn listing_is_always_in_catalog_order(names in prop::collection::vec("[a-zA-Z0-9 ]{1,8}", 0..20)) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let listed = rt.block_on(async {
                    let store = InMemoryProductStore::new();
                    let now = Utc::now();
                    for name in &names {
                        store.insert(Product::create(ProductId::new(), fields(name), now)).await.unwrap();
                    }
                    store.list().await.unwrap()
                });

                prop_assert_eq!(listed.len(), names.len());
                for pair in listed.windows(2) {
                    prop_assert!(catalog_order(&pair[0], &pair[1]).is_le());
                }
            }
        }
    }
}
