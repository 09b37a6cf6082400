//! `ElementId`: a strong, zero-cost handle for mesh elements.
//!
//! Every mesh element (vertex, cell, interface) is addressed by a stable,
//! mesh-scoped identifier. `ElementId` wraps a nonzero `u64` so that 0 stays
//! reserved as an invalid/sentinel value, and so the niche makes
//! `Option<ElementId>` the same size as `u64`.
//!
//! Identifier spaces are per element kind within one mesh: a vertex and a
//! cell may legitimately share the same raw value. Fields carry a location
//! tag precisely to say which space their keys live in.

use std::{fmt, num::NonZeroU64};

/// Opaque identifier for a mesh vertex, cell, or interface.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ElementId(NonZeroU64);

impl ElementId {
    /// Creates a new `ElementId` from a raw `u64` value.
    ///
    /// # Panics
    ///
    /// Panics if `raw == 0`; zero is reserved as the invalid sentinel.
    #[inline]
    pub fn new(raw: u64) -> Self {
        ElementId(NonZeroU64::new(raw).expect("ElementId must be non-zero"))
    }

    /// Fallible constructor; returns `None` for the reserved zero value.
    #[inline]
    pub const fn try_new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(ElementId(v)),
            None => None,
        }
    }

    /// Returns the raw `u64` value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementId").field(&self.get()).finish()
    }
}

/// Prints the numeric id without wrapper text.
impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
