//! HS256 bearer tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;

use shopfront_core::UserId;

use crate::claims::{JwtClaims, TokenType, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad encoding, bad signature or unexpected claim shape.
    #[error("invalid token: {0}")]
    Malformed(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("expected a {expected:?} token")]
    WrongType { expected: TokenType },

    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// Decodes a bearer token into trusted claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// How long issued tokens stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(5),
            refresh: Duration::days(1),
        }
    }
}

/// An access/refresh token pair as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Shared-secret HS256 token codec.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetimes: TokenLifetimes,
}

impl Hs256Jwt {
    pub fn new(secret: &[u8], lifetimes: TokenLifetimes) -> Self {
        // Time-window checks run in `validate_claims`; our claims carry
        // RFC 3339 timestamps rather than the registered numeric `exp`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetimes,
        }
    }

    /// Issue a fresh access + refresh pair for an account.
    pub fn issue_pair(
        &self,
        user_id: UserId,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(user_id, username, TokenType::Access, now)?,
            refresh: self.issue(user_id, username, TokenType::Refresh, now)?,
        })
    }

    pub fn issue(
        &self,
        user_id: UserId,
        username: &str,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = match token_type {
            TokenType::Access => self.lifetimes.access,
            TokenType::Refresh => self.lifetimes.refresh,
        };
        let claims = JwtClaims {
            sub: user_id,
            username: username.to_string(),
            token_type,
            issued_at: now,
            expires_at: now + ttl,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Validate a token and require it to be of the given type.
    pub fn validate_as(
        &self,
        token: &str,
        expected: TokenType,
        now: DateTime<Utc>,
    ) -> Result<JwtClaims, TokenError> {
        let claims = self.validate(token, now)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType { expected });
        }
        Ok(claims)
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt")
            .field("lifetimes", &self.lifetimes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> Hs256Jwt {
        Hs256Jwt::new(b"test-secret", TokenLifetimes::default())
    }

    #[test]
    fn issued_pair_validates() {
        let jwt = codec();
        let now = Utc::now();
        let user_id = UserId::new();

        let pair = jwt.issue_pair(user_id, "alice", now).unwrap();

        let access = jwt.validate_as(&pair.access, TokenType::Access, now).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(access.username, "alice");
        assert_eq!(access.expires_at, now + Duration::minutes(5));

        let refresh = jwt.validate_as(&pair.refresh, TokenType::Refresh, now).unwrap();
        assert_eq!(refresh.expires_at, now + Duration::days(1));
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let jwt = codec();
        let now = Utc::now();
        let pair = jwt.issue_pair(UserId::new(), "alice", now).unwrap();

        assert_eq!(
            jwt.validate_as(&pair.refresh, TokenType::Access, now),
            Err(TokenError::WrongType { expected: TokenType::Access })
        );
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let jwt = codec();
        let issued = Utc::now() - Duration::minutes(10);
        let token = jwt.issue(UserId::new(), "alice", TokenType::Access, issued).unwrap();

        assert_eq!(
            jwt.validate(&token, Utc::now()),
            Err(TokenError::Claims(TokenValidationError::Expired))
        );
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let now = Utc::now();
        let token = Hs256Jwt::new(b"other-secret", TokenLifetimes::default())
            .issue(UserId::new(), "mallory", TokenType::Access, now)
            .unwrap();

        assert!(matches!(codec().validate(&token, now), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            codec().validate("not.a.token", Utc::now()),
            Err(TokenError::Malformed(_))
        ));
    }
}
