//! `shopfront-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod fields;
pub mod id;

pub use entity::Entity;
pub use error::DomainError;
pub use fields::{FieldErrors, FieldValue, Payload, TextRules};
pub use id::{ProductId, UserId};
