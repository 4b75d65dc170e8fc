//! Pluggable equivalence for the hash engines and ordering for the trees.
//!
//! The hash engines never call `K: Hash`/`K: Eq` directly; everything goes
//! through a [`HashStrategy`]. Trees go through a [`Comparator`].

use core::cmp::Ordering;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash/equality policy supplied at construction time.
///
/// Implementations must be consistent: `equals(a, b)` implies
/// `hash(a) == hash(b)`.
pub trait HashStrategy<K: ?Sized> {
    fn hash(&self, key: &K) -> u64;
    fn equals(&self, a: &K, b: &K) -> bool;
}

/// Strategy backed by `K: Hash + Eq` and a `BuildHasher`.
#[derive(Clone, Default)]
pub struct DefaultStrategy<S = DefaultHashBuilder> {
    hasher: S,
}

impl<S> DefaultStrategy<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<S> fmt::Debug for DefaultStrategy<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultStrategy")
    }
}

impl<K, S> HashStrategy<K> for DefaultStrategy<S>
where
    K: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.hasher.hash_one(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Strategy assembled from two closures, e.g. for case-insensitive keys.
#[derive(Clone)]
pub struct FnStrategy<H, E> {
    hash: H,
    equals: E,
}

impl<H, E> FnStrategy<H, E> {
    pub fn new(hash: H, equals: E) -> Self {
        Self { hash, equals }
    }
}

impl<H, E> fmt::Debug for FnStrategy<H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnStrategy")
    }
}

impl<K, H, E> HashStrategy<K> for FnStrategy<H, E>
where
    K: ?Sized,
    H: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        (self.equals)(a, b)
    }
}

/// Total ordering used by the tree engines.
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// `K: Ord` ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: ?Sized + Ord> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Reverse of `K: Ord`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReverseOrder;

impl<K: ?Sized + Ord> Comparator<K> for ReverseOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        b.cmp(a)
    }
}

impl<K, F> Comparator<K> for F
where
    K: ?Sized,
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}
