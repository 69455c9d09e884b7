//! Products domain module.
//!
//! This crate contains business rules for the product catalog, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage): the
//! product record itself and the field contract that governs what a client
//! may write to it.

pub mod contract;
pub mod product;

pub use contract::{ProductFields, ProductPatch};
pub use product::{Product, format_price};
