//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Other | N/A | `Backend` |
//!
//! ## Concurrency
//!
//! Product updates run inside a transaction that locks the row
//! (`SELECT ... FOR UPDATE`), so concurrent partial updates never lose
//! each other's fields. Username uniqueness is enforced by a unique index.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use shopfront_auth::UserAccount;
use shopfront_core::{ProductId, UserId};
use shopfront_products::{Product, ProductFields};

use super::{AccountStore, ProductChange, ProductStore, StoreError};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, category, image_url, created_at, updated_at";
const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, date_joined";

/// Postgres-backed product catalog.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name COLLATE "C" ASC, id ASC"#
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id_typed()), err)]
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let fields = product.fields();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (
                id, name, description, price, stock, category, image_url, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id_typed().as_uuid())
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.stock)
        .bind(&fields.category)
        .bind(fields.image_url.as_deref())
        .bind(product.created_at())
        .bind(product.updated_at())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        product_from_row(&row)
    }

    #[instrument(skip(self, change), fields(product_id = %id), err)]
    async fn update(
        &self,
        id: ProductId,
        change: ProductChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Product>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_product", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        };

        let mut product = product_from_row(&row)?;
        change.apply(&mut product, now);
        let fields = product.fields();

        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET name = $2,
                description = $3,
                price = $4,
                stock = $5,
                category = $6,
                image_url = $7,
                updated_at = $8
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.stock)
        .bind(&fields.category)
        .bind(fields.image_url.as_deref())
        .bind(product.updated_at())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        let updated = product_from_row(&row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(Some(updated))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Postgres-backed account registry.
#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: Arc<PgPool>,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip(self, account), fields(username = %account.username), err)]
    async fn insert(&self, account: UserAccount) -> Result<UserAccount, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, date_joined)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account.id.as_uuid())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.date_joined)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(AccountRow::from_row(&row).map_err(decode_error)?.into())
    }

    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_username", e))?;

        row.map(|r| AccountRow::from_row(&r).map(Into::into).map_err(decode_error))
            .transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;

        row.map(|r| AccountRow::from_row(&r).map(Into::into).map_err(decode_error))
            .transpose()
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code() {
                Some(code) if code.as_ref() == "23505" => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to decode row: {}", err))
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    ProductRow::from_row(row).map(Into::into).map_err(decode_error)
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: uuid::Uuid,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    category: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            category: row.try_get("category")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::restore(
            ProductId::from_uuid(row.id),
            ProductFields {
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                category: row.category,
                image_url: row.image_url,
            },
            row.created_at,
            row.updated_at,
        )
    }
}

#[derive(Debug)]
struct AccountRow {
    id: uuid::Uuid,
    username: String,
    email: String,
    password_hash: String,
    date_joined: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            date_joined: row.try_get("date_joined")?,
        })
    }
}

impl From<AccountRow> for UserAccount {
    fn from(row: AccountRow) -> Self {
        UserAccount {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            date_joined: row.date_joined,
        }
    }
}
