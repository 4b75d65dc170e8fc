//! Error taxonomy shared by every engine.
//!
//! Missing keys are not errors: lookups and removals on absent keys
//! resolve to the map's default return value.

use thiserror::Error;

/// Failures reported synchronously at the operation boundary.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MapError {
    /// The requested slot count exceeds [`MAX_CAPACITY`](crate::hash::MAX_CAPACITY).
    #[error("capacity overflow: {requested} slots requested, maximum is {max}")]
    CapacityOverflow {
        /// Number of slots that would have been needed.
        requested: usize,
        /// Largest representable slot count.
        max: usize,
    },

    /// Load factors must lie in `(0, 1]`.
    #[error("invalid load factor {0}: must be in (0, 1]")]
    InvalidLoadFactor(f32),

    /// Bulk key/value slices of different lengths.
    #[error("length mismatch: {keys} keys but {values} values")]
    LengthMismatch {
        /// Length of the key slice.
        keys: usize,
        /// Length of the value slice.
        values: usize,
    },

    /// A key (or nested range bound) falls outside a range view.
    #[error("key outside the view's range")]
    KeyOutOfRange,

    /// Range start is greater than range end.
    #[error("invalid range: start is greater than end")]
    InvalidRange,

    /// The map was structurally modified behind a cursor's back.
    #[error("map was modified during iteration")]
    ConcurrentModification,

    /// Cursor removal without a current entry.
    #[error("cursor has no current entry to remove")]
    NoCurrentEntry,
}

impl MapError {
    pub(crate) fn capacity_overflow(requested: usize) -> Self {
        Self::CapacityOverflow {
            requested,
            max: crate::hash::MAX_CAPACITY,
        }
    }
}
