#![forbid(unsafe_code)]

//! Opaque element identity.

use std::fmt;

/// Identity of an element in the host's presentation tree.
///
/// The engines never inspect an element beyond comparing identities and
/// asking the [`Environment`](crate::Environment) about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
