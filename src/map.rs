//! Operation surface shared by every engine.
//!
//! Engines implement a handful of primitives (`get_ref`, `get_mut`,
//! `insert`, `remove_entry`, `iter`, ...). The sentinel-returning calls
//! and the bulk operations are provided on top of those.
//!
//! A returned value equal to the default return value is ambiguous with
//! absence; use `contains_key` (or the `Option`-returning primitives) to
//! tell them apart.

use crate::error::MapError;
use core::ops::{Add, Sub};

/// Owned key/value pair, for callers that keep entries beyond one step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapEntry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> MapEntry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for MapEntry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

/// Allocating entry iterator returned by [`MapCore::entries`].
#[derive(Clone, Debug)]
pub struct Entries<I> {
    inner: I,
}

impl<'a, K, V, I> Iterator for Entries<I>
where
    K: Clone + 'a,
    V: Clone + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    type Item = MapEntry<K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(k, v)| MapEntry::new(k.clone(), v.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V, I> DoubleEndedIterator for Entries<I>
where
    K: Clone + 'a,
    V: Clone + 'a,
    I: DoubleEndedIterator<Item = (&'a K, &'a V)>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|(k, v)| MapEntry::new(k.clone(), v.clone()))
    }
}

/// Core map contract implemented by [`OpenHashMap`](crate::OpenHashMap),
/// [`LinkedHashMap`](crate::LinkedHashMap) and [`TreeMap`](crate::TreeMap).
pub trait MapCore<K, V> {
    /// Borrowing iterator in the engine's iteration order.
    type Iter<'a>: Iterator<Item = (&'a K, &'a V)>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_ref(&self, key: &K) -> Option<&V>;

    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Insert or overwrite; returns the previous value if the key was present.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    fn remove_entry(&mut self, key: &K) -> Option<(K, V)>;

    fn contains_key(&self, key: &K) -> bool {
        self.get_ref(key).is_some()
    }

    fn clear(&mut self);

    fn default_return_value(&self) -> &V;

    fn set_default_return_value(&mut self, value: V);

    fn iter(&self) -> Self::Iter<'_>;

    /// Replace every value with `f(key, value)`, in iteration order.
    fn replace_all<F>(&mut self, f: F)
    where
        F: FnMut(&K, &V) -> V;

    /// Size hint before a bulk insert. Engines without capacity ignore it.
    fn reserve(&mut self, _additional: usize) {}

    /// Value for `key`, or the default return value.
    fn get(&self, key: &K) -> V
    where
        V: Clone,
    {
        self.get_ref(key)
            .unwrap_or_else(|| self.default_return_value())
            .clone()
    }

    /// Value for `key`, or `fallback`.
    fn get_or(&self, key: &K, fallback: V) -> V
    where
        V: Clone,
    {
        self.get_ref(key).cloned().unwrap_or(fallback)
    }

    /// Insert or overwrite; returns the previous value or the default return value.
    fn put(&mut self, key: K, value: V) -> V
    where
        V: Clone,
    {
        match self.insert(key, value) {
            Some(old) => old,
            None => self.default_return_value().clone(),
        }
    }

    /// Insert only if absent; returns the current value or the default return value.
    fn put_if_absent(&mut self, key: K, value: V) -> V
    where
        V: Clone,
    {
        if let Some(v) = self.get_ref(&key) {
            return v.clone();
        }
        self.insert(key, value);
        self.default_return_value().clone()
    }

    /// Remove `key`; returns its value or the default return value.
    fn remove(&mut self, key: &K) -> V
    where
        V: Clone,
    {
        match self.remove_entry(key) {
            Some((_, v)) => v,
            None => self.default_return_value().clone(),
        }
    }

    /// Remove `key`; returns its value or `fallback`.
    fn remove_or(&mut self, key: &K, fallback: V) -> V {
        self.remove_entry(key).map_or(fallback, |(_, v)| v)
    }

    /// Overwrite the value of a present key; absent keys are left absent.
    fn replace(&mut self, key: &K, value: V) -> V
    where
        V: Clone,
    {
        match self.get_mut(key) {
            Some(slot) => core::mem::replace(slot, value),
            None => self.default_return_value().clone(),
        }
    }

    fn compute_if_absent<F>(&mut self, key: K, f: F) -> V
    where
        V: Clone,
        F: FnOnce(&K) -> V,
    {
        if let Some(v) = self.get_ref(&key) {
            return v.clone();
        }
        let value = f(&key);
        self.insert(key, value.clone());
        value
    }

    fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|(_, v)| v == value)
    }

    /// Copy every entry of `other` into `self`, in `other`'s iteration order.
    fn put_all<M>(&mut self, other: &M)
    where
        M: MapCore<K, V> + ?Sized,
        K: Clone,
        V: Clone,
    {
        self.reserve(other.len());
        for (k, v) in other.iter() {
            self.insert(k.clone(), v.clone());
        }
    }

    /// Insert `keys[i] -> values[i]` for every `i`. Nothing is inserted
    /// when the lengths differ.
    fn put_all_slices(&mut self, keys: &[K], values: &[V]) -> Result<(), MapError>
    where
        K: Clone,
        V: Clone,
    {
        if keys.len() != values.len() {
            return Err(MapError::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        self.reserve(keys.len());
        for (k, v) in keys.iter().zip(values) {
            self.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    /// Add `increment` to the value of `key` in place. An absent key
    /// starts from the default return value. Returns the previous value.
    fn add_to(&mut self, key: K, increment: V) -> V
    where
        V: Copy + Add<Output = V>,
    {
        match self.get_mut(&key) {
            Some(v) => {
                let old = *v;
                *v = old + increment;
                old
            }
            None => {
                let base = *self.default_return_value();
                self.insert(key, base + increment);
                base
            }
        }
    }

    /// Counterpart of [`add_to`](Self::add_to) for subtraction.
    fn subtract_from(&mut self, key: K, decrement: V) -> V
    where
        V: Copy + Sub<Output = V>,
    {
        match self.get_mut(&key) {
            Some(v) => {
                let old = *v;
                *v = old - decrement;
                old
            }
            None => {
                let base = *self.default_return_value();
                self.insert(key, base - decrement);
                base
            }
        }
    }

    fn add_to_all<I>(&mut self, increments: I)
    where
        I: IntoIterator<Item = (K, V)>,
        V: Copy + Add<Output = V>,
    {
        for (k, v) in increments {
            self.add_to(k, v);
        }
    }

    fn subtract_all<I>(&mut self, decrements: I)
    where
        I: IntoIterator<Item = (K, V)>,
        V: Copy + Sub<Output = V>,
    {
        for (k, v) in decrements {
            self.subtract_from(k, v);
        }
    }

    /// Insert `value` if `key` is absent, else store `f(&old, value)`.
    /// Returns the value now associated with `key`.
    fn merge<F>(&mut self, key: K, value: V, f: F) -> V
    where
        V: Clone,
        F: FnOnce(&V, V) -> V,
    {
        match self.get_mut(&key) {
            Some(slot) => {
                let merged = f(slot, value);
                *slot = merged.clone();
                merged
            }
            None => {
                self.insert(key, value.clone());
                value
            }
        }
    }

    fn merge_all<I, F>(&mut self, entries: I, mut f: F)
    where
        I: IntoIterator<Item = (K, V)>,
        V: Clone,
        F: FnMut(&V, V) -> V,
    {
        for (k, v) in entries {
            self.merge(k, v, &mut f);
        }
    }

    /// Iterate owned copies of every entry.
    fn entries(&self) -> Entries<Self::Iter<'_>>
    where
        K: Clone,
        V: Clone,
    {
        Entries { inner: self.iter() }
    }
}
