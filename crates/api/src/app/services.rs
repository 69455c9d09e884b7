use std::sync::Arc;

use anyhow::Context;

use shopfront_auth::Hs256Jwt;
use shopfront_infra::{
    AccountStore, InMemoryAccountStore, InMemoryProductStore, PostgresAccountStore,
    PostgresProductStore, ProductStore,
};

use crate::config::{ApiConfig, Persistence};

/// Everything handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<dyn ProductStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub tokens: Arc<Hs256Jwt>,
}

impl AppServices {
    /// In-memory stores (dev/tests).
    pub fn in_memory(tokens: Hs256Jwt) -> Self {
        Self {
            products: Arc::new(InMemoryProductStore::new()),
            accounts: Arc::new(InMemoryAccountStore::new()),
            tokens: Arc::new(tokens),
        }
    }
}

/// Wire the stores selected by configuration.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let tokens = Hs256Jwt::new(config.jwt_secret.as_bytes(), config.token_lifetimes);

    match &config.persistence {
        Persistence::InMemory => {
            tracing::info!("using in-memory stores");
            Ok(AppServices::in_memory(tokens))
        }
        Persistence::Postgres(settings) => {
            let pool = shopfront_infra::connect(settings)
                .await
                .context("failed to connect to Postgres")?;
            shopfront_infra::ensure_schema(&pool)
                .await
                .context("failed to prepare database schema")?;

            tracing::info!("using postgres stores");
            Ok(AppServices {
                products: Arc::new(PostgresProductStore::new(pool.clone())),
                accounts: Arc::new(PostgresAccountStore::new(pool)),
                tokens: Arc::new(tokens),
            })
        }
    }
}
