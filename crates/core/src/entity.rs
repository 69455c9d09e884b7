//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stores key records by this identifier; it never changes once assigned.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
