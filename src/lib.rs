//! scalar-maps: map engines for small, copyable keys and values with
//! per-map default return values in place of a missing-key marker.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one generic implementation of each engine; the compiler
//!   monomorphizes it per key/value kind.
//! - Engines:
//!   - OpenHashMap<K, V, S>: open addressing, linear probing, backward-
//!     shift deletion (no tombstones), power-of-two capacity.
//!   - LinkedHashMap<K, V, S>: the same slot array plus a doubly-linked
//!     traversal order over slot positions, with move-to-first/last.
//!   - TreeMap<K, V, C, B>: an ordered map over a slotmap node arena,
//!     balanced by `Avl` or `RedBlack`, with floor/ceiling/lower/higher
//!     navigation and live range views.
//! - Shared surface: the `MapCore` trait. Engines implement a few
//!   `Option`-returning primitives; the sentinel and bulk operations are
//!   provided on top.
//!
//! Layers
//! - `hash::raw::RawTable` owns slots, probing, resizing and the
//!   on-slot-moved hook fired for every entry backward shift relocates.
//!   `OpenHashMap` uses it directly; `LinkedHashMap` re-points its links
//!   inside the hook, so the chain never refers to a stale position.
//! - `tree::raw::RawTree` owns nodes, descent, in-order steps and
//!   rotations. The sealed `Balance` policies only rebalance.
//! - `tree::view` wraps a borrowed tree and a pair of bounds. Views are
//!   never copies; navigation through a view is clamped to its bounds.
//!
//! Default return values
//! - `get`, `put`, `remove` and friends return the map's default return
//!   value for an absent key. A stored value equal to the sentinel is
//!   indistinguishable from absence; `contains_key` and the `Option`
//!   primitives (`get_ref`, `insert`, `remove_entry`) tell them apart.
//!
//! Concurrency
//! - No internal synchronization. Wrap a map in a `Mutex` for shared use.
//! - Cursors are detached: they hold a position and a mutation stamp,
//!   and take the map on every step. A step after a structural change the
//!   cursor did not make fails with `ConcurrentModification` and the
//!   cursor stays unusable.
//!
//! Reentrancy
//! - Hash strategies run while a probe is in progress. In debug builds a
//!   guard panics if a strategy re-enters the table; release builds
//!   compile the guard away.
//!
//! Failure model
//! - Errors are `MapError` values returned at the operation boundary.
//! - Growth past `MAX_CAPACITY` during an insert is fatal (panic after an
//!   `error!` event). `with_capacity`/`try_reserve` report it instead.
//!
//! Notes and non-goals
//! - No persistence, no lock-striped variant, no synchronized wrappers.
//! - Keys are immutable once inserted.

pub mod error;
pub mod hash;
pub mod map;
pub mod strategy;
pub mod tree;

mod engine_proptest;
mod reentrancy;
mod stamp;

// Public surface
pub use error::MapError;
pub use hash::{HashConfig, LinkedHashMap, OpenHashMap, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, MAX_CAPACITY};
pub use map::{Entries, MapCore, MapEntry};
pub use strategy::{Comparator, DefaultStrategy, FnStrategy, HashStrategy, NaturalOrder, ReverseOrder};
pub use tree::{Avl, AvlTreeMap, Balance, RbTreeMap, RedBlack, SubMap, SubMapMut, TreeMap};
