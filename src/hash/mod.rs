//! Open-addressing hash engines.
//!
//! - `raw`: the slot array. Linear probing from `mix(hash) & mask`,
//!   tombstone-free backward-shift deletion, and an on-slot-moved hook so
//!   layers that index slots by position can follow relocations.
//! - `open`: [`OpenHashMap`], the plain table.
//! - `linked`: [`LinkedHashMap`], the table plus a doubly-linked
//!   traversal order kept in a parallel link array.
//!
//! Capacity is always a power of two. The table grows when `len` exceeds
//! `max_fill = min(ceil(capacity * load_factor), capacity - 1)`, so at
//! least one slot is always empty and every probe terminates.

pub mod linked;
pub mod open;
mod raw;

pub use linked::LinkedHashMap;
pub use open::OpenHashMap;

use crate::error::MapError;

/// Slot count used by `new()`.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
/// Load factor used by `new()`.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;
/// Largest slot count a table may reach.
pub const MAX_CAPACITY: usize = 1 << 30;
/// Smallest slot count a table is ever sized to.
pub(crate) const MIN_CAPACITY: usize = 2;

/// Construction parameters for the hash engines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HashConfig {
    /// Initial slot count; rounded up to a power of two.
    pub initial_capacity: usize,
    /// Occupancy ratio in `(0, 1]` that triggers growth.
    pub load_factor: f32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl HashConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Check the parameters and return the slot count they resolve to.
    pub fn validate(&self) -> Result<usize, MapError> {
        check_load_factor(self.load_factor)?;
        slots_for_capacity(self.initial_capacity)
    }
}

pub(crate) fn check_load_factor(f: f32) -> Result<(), MapError> {
    if f > 0.0 && f <= 1.0 {
        Ok(())
    } else {
        Err(MapError::InvalidLoadFactor(f))
    }
}

/// Round a requested slot count up to a legal power of two.
pub(crate) fn slots_for_capacity(requested: usize) -> Result<usize, MapError> {
    if requested > MAX_CAPACITY {
        return Err(MapError::capacity_overflow(requested));
    }
    Ok(requested.max(MIN_CAPACITY).next_power_of_two())
}

/// Slot count needed to hold `expected` entries under load factor `f`.
pub(crate) fn slots_for_len(expected: usize, f: f32) -> Result<usize, MapError> {
    let needed = (expected as f64 / f as f64).ceil();
    if needed > MAX_CAPACITY as f64 {
        return Err(MapError::capacity_overflow(needed as usize));
    }
    slots_for_capacity(needed as usize)
}

/// Largest `len` a table of `n` slots may hold before growing.
pub(crate) fn max_fill(n: usize, f: f32) -> usize {
    let fill = (n as f64 * f as f64).ceil() as usize;
    fill.min(n - 1)
}

/// Spread the strategy's hash so that low bits (used as the home slot)
/// depend on all input bits.
#[inline]
pub(crate) fn mix(hash: u64) -> u64 {
    let h = hash.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h ^ (h >> 32)
}

#[cold]
#[inline(never)]
pub(crate) fn capacity_overflow(err: MapError) -> ! {
    #[cfg(feature = "tracing")]
    tracing::error!(%err, "hash table cannot grow");
    panic!("{err}")
}
