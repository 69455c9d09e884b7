//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

use shopfront_auth::TokenLifetimes;
use shopfront_infra::DatabaseSettings;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,
}

/// Which storage backend the services are wired to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    InMemory,
    Postgres(DatabaseSettings),
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_lifetimes: TokenLifetimes,
    pub persistence: Persistence,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_lifetimes", &self.token_lifetimes)
            .field("persistence", &self.persistence)
            .finish()
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = parse_or(&lookup, "BIND_ADDR", "a socket address", || {
            DEFAULT_BIND_ADDR.parse().ok()
        })?;

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let defaults = TokenLifetimes::default();
        let access: u32 = parse_or(&lookup, "ACCESS_TOKEN_TTL_SECS", "a positive integer", || {
            u32::try_from(defaults.access.num_seconds()).ok()
        })?;
        let refresh: u32 = parse_or(&lookup, "REFRESH_TOKEN_TTL_SECS", "a positive integer", || {
            u32::try_from(defaults.refresh.num_seconds()).ok()
        })?;
        let token_lifetimes = TokenLifetimes {
            access: Duration::seconds(positive("ACCESS_TOKEN_TTL_SECS", access)?.into()),
            refresh: Duration::seconds(positive("REFRESH_TOKEN_TTL_SECS", refresh)?.into()),
        };

        let use_persistent: bool =
            parse_or(&lookup, "USE_PERSISTENT_STORES", "true or false", || Some(false))?;
        let persistence = if use_persistent {
            let url = lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingDatabaseUrl)?;
            let mut settings = DatabaseSettings::new(url);
            let default_max = settings.max_connections;
            settings.max_connections = parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                "a positive integer",
                || Some(default_max),
            )?;
            positive("DATABASE_MAX_CONNECTIONS", settings.max_connections)?;
            Persistence::Postgres(settings)
        } else {
            Persistence::InMemory
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_lifetimes,
            persistence,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: impl FnOnce() -> Option<T>,
) -> Result<T, ConfigError> {
    let invalid = |value: String| ConfigError::Invalid {
        name,
        value,
        expected,
    };
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| invalid(raw)),
        None => default().ok_or_else(|| invalid(String::new())),
    }
}

fn positive(name: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
            expected: "a positive integer",
        });
    }
    Ok(value)
}
