//! `shopfront-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it classifies
//! callers, decides whether an operation is allowed, issues and checks bearer
//! tokens, hashes credentials, and defines the account registration contract.

pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod jwt;
pub mod password;
pub mod principal;
pub mod registration;
pub mod user;

pub use authorize::{authorize, AccessPolicy, AuthzError, Operation};
pub use claims::{JwtClaims, TokenType, TokenValidationError, validate_claims};
pub use credentials::Credentials;
pub use jwt::{Hs256Jwt, JwtValidator, TokenError, TokenLifetimes, TokenPair};
pub use password::{Password, PasswordError};
pub use principal::{AuthenticatedUser, Caller};
pub use registration::{RegisteredUser, Registration};
pub use user::{NewAccount, UserAccount};
