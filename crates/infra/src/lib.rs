//! Infrastructure layer: storage backends for products and user accounts.
//!
//! Two interchangeable backends are provided behind the same traits:
//! in-memory (tests/dev) and Postgres (via SQLx).

pub mod db;
pub mod store;

pub use db::{DatabaseSettings, connect, ensure_schema};
pub use store::{
    AccountStore, InMemoryAccountStore, InMemoryProductStore, PostgresAccountStore,
    PostgresProductStore, ProductChange, ProductStore, StoreError,
};
