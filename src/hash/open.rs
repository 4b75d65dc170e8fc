//! OpenHashMap: open-addressing table with linear probing and
//! backward-shift deletion.

use super::raw::{Probe, RawTable, Slot};
use super::HashConfig;
use crate::error::MapError;
use crate::map::MapCore;
use crate::stamp::Stamp;
use crate::strategy::{DefaultStrategy, HashStrategy};
use core::fmt;
use core::hash::Hash;

/// Hash map storing entries directly in a power-of-two slot array.
///
/// Lookups and removals on absent keys resolve to a per-map default
/// return value (see [`MapCore::get`] and [`MapCore::remove`]).
#[derive(Clone)]
pub struct OpenHashMap<K, V, S = DefaultStrategy> {
    table: RawTable<K, V, S>,
    default_value: V,
}

impl<K, V> OpenHashMap<K, V>
where
    K: Hash + Eq,
    V: Default,
{
    pub fn new() -> Self {
        Self::with_strategy(DefaultStrategy::default())
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, MapError> {
        Self::with_config(
            HashConfig::new().initial_capacity(capacity),
            DefaultStrategy::default(),
        )
    }

    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self, MapError> {
        Self::with_config(
            HashConfig::new()
                .initial_capacity(capacity)
                .load_factor(load_factor),
            DefaultStrategy::default(),
        )
    }
}

impl<K, V> Default for OpenHashMap<K, V>
where
    K: Hash + Eq,
    V: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> OpenHashMap<K, V, S>
where
    S: HashStrategy<K>,
{
    pub fn with_strategy(strategy: S) -> Self
    where
        V: Default,
    {
        Self {
            table: RawTable::new(strategy),
            default_value: V::default(),
        }
    }

    pub fn with_config(config: HashConfig, strategy: S) -> Result<Self, MapError>
    where
        V: Default,
    {
        Ok(Self {
            table: RawTable::with_config(config, strategy)?,
            default_value: V::default(),
        })
    }

    /// Replace the default return value while building.
    pub fn with_default_return_value(mut self, value: V) -> Self {
        self.default_value = value;
        self
    }

    /// Current slot count.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    pub fn strategy(&self) -> &S {
        self.table.strategy()
    }

    /// Grow so that `additional` more entries fit without rehashing.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), MapError> {
        let wanted = self.table.len().saturating_add(additional);
        let n = super::slots_for_len(wanted, self.table.load_factor())?;
        if n > self.table.capacity() {
            self.rehash(n);
        }
        Ok(())
    }

    /// Shrink the slot array to the smallest size holding `expected`
    /// entries (never below the current length).
    pub fn shrink_to(&mut self, expected: usize) -> Result<(), MapError> {
        if let Some(n) = self.table.trimmed_capacity(expected)? {
            self.rehash(n);
        }
        Ok(())
    }

    pub fn shrink_to_fit(&mut self) {
        if let Ok(Some(n)) = self.table.trimmed_capacity(self.table.len()) {
            self.rehash(n);
        }
    }

    fn rehash(&mut self, n: usize) {
        let old = self.table.begin_rehash(n);
        for slot in old.into_iter().flatten() {
            self.table.place(slot);
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            remaining: self.table.len(),
            slots: self.table.slots_mut().iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Detached fail-fast cursor; see [`Cursor`].
    pub fn cursor(&self) -> Cursor {
        Cursor {
            pos: self.table.capacity(),
            last: None,
            wrapped: Vec::new(),
            skip: Vec::new(),
            stamp: Stamp::new(self.table.mod_count()),
        }
    }

    #[cfg(test)]
    pub(crate) fn probe_chains_intact(&self) -> bool {
        self.table.probe_chains_intact()
    }
}

impl<K, V, S> MapCore<K, V> for OpenHashMap<K, V, S>
where
    S: HashStrategy<K>,
{
    type Iter<'a>
        = Iter<'a, K, V>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    #[inline]
    fn len(&self) -> usize {
        self.table.len()
    }

    fn get_ref(&self, key: &K) -> Option<&V> {
        let pos = self.table.find(key)?;
        self.table.entry(pos).map(|(_, v)| v)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let pos = self.table.find(key)?;
        self.table.entry_mut(pos).map(|(_, v)| v)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.table.probe(&key) {
            Probe::Found(pos) => self
                .table
                .entry_mut(pos)
                .map(|(_, v)| core::mem::replace(v, value)),
            Probe::Vacant { pos, hash } => {
                self.table.occupy(pos, hash, key, value);
                if self.table.needs_growth() {
                    let n = self.table.grown_capacity();
                    self.rehash(n);
                }
                None
            }
        }
    }

    fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let pos = self.table.find(key)?;
        let removed = self.table.remove_at(pos, |_, _| {});
        if self.table.should_shrink() {
            #[cfg(feature = "tracing")]
            tracing::debug!(len = self.table.len(), capacity = self.table.capacity(), "shrink");
            self.rehash(self.table.capacity() / 2);
        }
        removed
    }

    fn clear(&mut self) {
        self.table.clear();
    }

    fn default_return_value(&self) -> &V {
        &self.default_value
    }

    fn set_default_return_value(&mut self, value: V) {
        self.default_value = value;
    }

    fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            remaining: self.table.len(),
            slots: self.table.slots().iter(),
        }
    }

    fn replace_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> V,
    {
        for (k, v) in self.iter_mut() {
            *v = f(k, v);
        }
    }

    fn reserve(&mut self, additional: usize) {
        if let Err(e) = self.try_reserve(additional) {
            super::capacity_overflow(e);
        }
    }
}

/// Iterator over entries in physical slot order.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Option<Slot<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(s) = slot {
                self.remaining -= 1;
                return Some((&s.key, &s.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over entries with mutable values, in physical slot order.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Option<Slot<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(s) = slot {
                self.remaining -= 1;
                return Some((&s.key, &mut s.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a OpenHashMap<K, V, S>
where
    S: HashStrategy<K>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Detached, fail-fast cursor over an [`OpenHashMap`].
///
/// The cursor holds no borrow; each step takes the map explicitly and
/// yields references that live only as long as that borrow. Any
/// structural change not made through [`Cursor::remove`] makes the next
/// step fail with [`MapError::ConcurrentModification`], permanently.
///
/// Slots are visited from the top of the array down. Removing through
/// the cursor may backward-shift entries from the unvisited low end
/// across the wraparound into already-visited slots; those are tracked
/// and yielded after the scan, and entries shifted the other way are
/// skipped, so every entry is seen exactly once.
#[derive(Debug, Clone)]
pub struct Cursor {
    // Slots at or above `pos` have been scanned.
    pos: usize,
    last: Option<usize>,
    // Unvisited entries now sitting in scanned slots.
    wrapped: Vec<usize>,
    // Visited entries now sitting in unscanned slots.
    skip: Vec<usize>,
    stamp: Stamp,
}

impl Cursor {
    pub fn next<'m, K, V, S>(
        &mut self,
        map: &'m OpenHashMap<K, V, S>,
    ) -> Result<Option<(&'m K, &'m V)>, MapError>
    where
        S: HashStrategy<K>,
    {
        self.stamp.check(map.table.mod_count())?;
        while self.pos > 0 {
            self.pos -= 1;
            if let Some(i) = self.skip.iter().position(|&p| p == self.pos) {
                self.skip.swap_remove(i);
                continue;
            }
            if let Some(entry) = map.table.entry(self.pos) {
                self.last = Some(self.pos);
                return Ok(Some(entry));
            }
        }
        self.last = self.wrapped.pop();
        Ok(self.last.and_then(|p| map.table.entry(p)))
    }

    /// Remove the entry returned by the last successful `next`.
    pub fn remove<K, V, S>(&mut self, map: &mut OpenHashMap<K, V, S>) -> Result<(K, V), MapError>
    where
        S: HashStrategy<K>,
    {
        self.stamp.check(map.table.mod_count())?;
        let last = self.last.take().ok_or(MapError::NoCurrentEntry)?;
        let scanned = self.pos;
        let (wrapped, skip) = (&mut self.wrapped, &mut self.skip);
        let removed = map.table.remove_at(last, |from, to| {
            if let Some(i) = skip.iter().position(|&p| p == from) {
                if to >= scanned {
                    skip.swap_remove(i);
                } else {
                    skip[i] = to;
                }
            } else if let Some(i) = wrapped.iter().position(|&p| p == from) {
                if to < scanned {
                    wrapped.swap_remove(i);
                } else {
                    wrapped[i] = to;
                }
            } else if from < scanned && to >= scanned {
                wrapped.push(to);
            } else if from >= scanned && to < scanned {
                skip.push(to);
            }
        });
        self.stamp.sync(map.table.mod_count());
        removed.ok_or(MapError::NoCurrentEntry)
    }
}

impl<K, V, S> fmt::Debug for OpenHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
    S: HashStrategy<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for OpenHashMap<K, V, S>
where
    V: PartialEq,
    S: HashStrategy<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get_ref(k).is_some_and(|ov| ov == v))
    }
}

impl<K, V, S> Extend<(K, V)> for OpenHashMap<K, V, S>
where
    S: HashStrategy<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for OpenHashMap<K, V>
where
    K: Hash + Eq,
    V: Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::new();
        m.extend(iter);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::mix;
    use crate::strategy::FnStrategy;
    use std::collections::BTreeSet;

    #[test]
    fn put_get_remove_with_sentinel() {
        let mut m: OpenHashMap<i32, i32> = OpenHashMap::new();
        m.set_default_return_value(-1);
        assert_eq!(m.put(1, 10), -1);
        assert_eq!(m.put(1, 11), 10);
        assert_eq!(m.get(&1), 11);
        assert_eq!(m.get(&2), -1);
        assert_eq!(m.remove(&1), 11);
        assert_eq!(m.remove(&1), -1);
        assert!(m.is_empty());
    }

    /// Invariant (debug-only): a strategy whose `equals` reads the same map
    /// during a probe panics on the reentrancy guard.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_equals_during_probe() {
        use std::cell::RefCell;
        use std::rc::Rc;

        type Hook = Rc<RefCell<Option<Box<dyn Fn()>>>>;
        let hook: Hook = Rc::new(RefCell::new(None));
        let in_equals = Rc::clone(&hook);
        let strategy = FnStrategy::new(
            |_: &u32| 0u64,
            move |a: &u32, b: &u32| {
                if let Some(f) = in_equals.borrow().as_ref() {
                    f();
                }
                a == b
            },
        );
        let map = Rc::new(RefCell::new(OpenHashMap::<u32, u32, _>::with_strategy(strategy)));
        map.borrow_mut().put(1, 10);

        let inner = Rc::clone(&map);
        *hook.borrow_mut() = Some(Box::new(move || {
            inner.borrow().get(&1);
        }));
        // Every key hashes alike, so looking up 2 compares against 1.
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| map.borrow().get(&2)));
        assert!(res.is_err(), "re-entering the map from equals must panic");

        hook.borrow_mut().take();
        assert_eq!(map.borrow().get(&1), 10);
    }

    #[test]
    fn grows_past_load_factor() {
        let mut m: OpenHashMap<u32, u32> = OpenHashMap::with_capacity(4).unwrap();
        assert_eq!(m.capacity(), 4);
        for k in 0..3 {
            m.insert(k, k);
        }
        assert_eq!(m.capacity(), 4);
        m.insert(3, 3);
        assert_eq!(m.capacity(), 8);
        assert!(m.probe_chains_intact());
    }

    #[test]
    fn shrinks_after_mass_removal() {
        let mut m: OpenHashMap<u32, u32> = OpenHashMap::new();
        for k in 0..1000 {
            m.insert(k, k);
        }
        let grown = m.capacity();
        for k in 0..995 {
            m.remove_entry(&k);
        }
        assert!(m.capacity() < grown);
        assert!(m.capacity() >= 16);
        for k in 995..1000 {
            assert_eq!(m.get(&k), k);
        }
        assert!(m.probe_chains_intact());
    }

    #[test]
    fn reserve_and_shrink_to_fit() {
        let mut m: OpenHashMap<u32, u32> = OpenHashMap::new();
        m.try_reserve(100).unwrap();
        assert_eq!(m.capacity(), 256);
        m.insert(1, 1);
        m.shrink_to_fit();
        assert_eq!(m.capacity(), 2);
        assert_eq!(m.get(&1), 1);
        assert!(matches!(
            m.try_reserve(usize::MAX),
            Err(MapError::CapacityOverflow { .. })
        ));
    }

    // Constant hash whose home slot is the last slot of a 16-slot table, so
    // a single probe run wraps from slot 15 into slots 0, 1, 2, ...
    fn wrapping_map() -> OpenHashMap<u32, u32, impl HashStrategy<u32>> {
        let c = (0u64..).find(|h| mix(*h) as usize & 15 == 15).unwrap();
        OpenHashMap::with_config(
            HashConfig::new().initial_capacity(16).load_factor(1.0),
            FnStrategy::new(move |_: &u32| c, |a: &u32, b: &u32| a == b),
        )
        .unwrap()
    }

    #[test]
    fn cursor_remove_visits_wrapped_entries_once() {
        let mut m = wrapping_map();
        for k in 0..10 {
            m.insert(k, k * 100);
        }
        assert_eq!(m.capacity(), 16);
        let mut cur = m.cursor();
        let mut seen = Vec::new();
        while let Some((k, _)) = cur.next(&m).unwrap() {
            seen.push(*k);
            cur.remove(&mut m).unwrap();
            assert!(m.probe_chains_intact());
        }
        let set: BTreeSet<_> = seen.iter().copied().collect();
        assert_eq!(seen.len(), 10);
        assert_eq!(set, (0..10).collect());
        assert!(m.is_empty());
    }

    #[test]
    fn cursor_remove_every_other_entry() {
        let mut m = wrapping_map();
        for k in 0..12 {
            m.insert(k, k);
        }
        let mut cur = m.cursor();
        let mut seen = BTreeSet::new();
        let mut flip = false;
        while let Some((k, _)) = cur.next(&m).unwrap() {
            assert!(seen.insert(*k), "key {k} yielded twice");
            flip = !flip;
            if flip {
                cur.remove(&mut m).unwrap();
            }
        }
        assert_eq!(seen.len(), 12);
        assert_eq!(m.len(), 6);
        assert!(m.probe_chains_intact());
    }

    #[test]
    fn cursor_fails_fast_after_outside_mutation() {
        let mut m: OpenHashMap<u32, u32> = OpenHashMap::new();
        m.insert(1, 1);
        m.insert(2, 2);
        let mut cur = m.cursor();
        assert!(cur.next(&m).unwrap().is_some());
        m.insert(3, 3);
        assert_eq!(cur.next(&m), Err(MapError::ConcurrentModification));
        assert_eq!(cur.remove(&mut m), Err(MapError::ConcurrentModification));
    }

    #[test]
    fn cursor_remove_requires_current_entry() {
        let mut m: OpenHashMap<u32, u32> = OpenHashMap::new();
        m.insert(1, 1);
        let mut cur = m.cursor();
        assert_eq!(cur.remove(&mut m), Err(MapError::NoCurrentEntry));
        cur.next(&m).unwrap();
        assert!(cur.remove(&mut m).is_ok());
        assert_eq!(cur.remove(&mut m), Err(MapError::NoCurrentEntry));
    }

    #[test]
    fn value_update_does_not_invalidate_cursor() {
        let mut m: OpenHashMap<u32, u32> = OpenHashMap::new();
        m.insert(1, 1);
        m.insert(2, 2);
        let mut cur = m.cursor();
        cur.next(&m).unwrap();
        m.put(1, 5);
        assert!(cur.next(&m).is_ok());
    }

    #[test]
    fn equality_ignores_layout() {
        let a: OpenHashMap<u32, u32> = (0..50).map(|k| (k, k)).collect();
        let mut b: OpenHashMap<u32, u32> = OpenHashMap::with_capacity(512).unwrap();
        for k in (0..50).rev() {
            b.insert(k, k);
        }
        assert_eq!(a, b);
        b.put(7, 0);
        assert_ne!(a, b);
    }
}
