//! LinkedHashMap: the open-addressing table plus a traversal order.
//!
//! Order is a doubly-linked chain over slot positions, stored in a link
//! array parallel to the slots. Backward-shift deletion physically moves
//! other entries; the table reports each move through its on-slot-moved
//! hook and the links are re-pointed inside that same callback, so the
//! chain is never observed pointing at a stale position.

use super::raw::{Probe, RawTable};
use super::HashConfig;
use crate::error::MapError;
use crate::map::MapCore;
use crate::stamp::Stamp;
use crate::strategy::{DefaultStrategy, HashStrategy};
use core::fmt;
use core::hash::Hash;

const NIL: usize = usize::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Link {
    prev: usize,
    next: usize,
}

impl Link {
    const DETACHED: Link = Link {
        prev: NIL,
        next: NIL,
    };
}

/// Link array plus chain ends. Kept apart from the table so the removal
/// hook can borrow it while the table shifts slots.
#[derive(Clone, Debug)]
struct Order {
    links: Vec<Link>,
    head: usize,
    tail: usize,
}

impl Order {
    fn new(n: usize) -> Self {
        Self {
            links: vec![Link::DETACHED; n],
            head: NIL,
            tail: NIL,
        }
    }

    fn detach(&mut self, i: usize) {
        let Link { prev, next } = self.links[i];
        if prev == NIL {
            self.head = next;
        } else {
            self.links[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.links[next].prev = prev;
        }
        self.links[i] = Link::DETACHED;
    }

    fn attach_first(&mut self, i: usize) {
        self.links[i] = Link {
            prev: NIL,
            next: self.head,
        };
        if self.head == NIL {
            self.tail = i;
        } else {
            self.links[self.head].prev = i;
        }
        self.head = i;
    }

    fn attach_last(&mut self, i: usize) {
        self.links[i] = Link {
            prev: self.tail,
            next: NIL,
        };
        if self.tail == NIL {
            self.head = i;
        } else {
            self.links[self.tail].next = i;
        }
        self.tail = i;
    }

    /// The entry at `from` now lives at `to`.
    fn relocate(&mut self, from: usize, to: usize) {
        let link = self.links[from];
        self.links[to] = link;
        self.links[from] = Link::DETACHED;
        if link.prev == NIL {
            self.head = to;
        } else {
            self.links[link.prev].next = to;
        }
        if link.next == NIL {
            self.tail = to;
        } else {
            self.links[link.next].prev = to;
        }
    }

    #[inline]
    fn next(&self, i: usize) -> usize {
        self.links[i].next
    }

    #[inline]
    fn prev(&self, i: usize) -> usize {
        self.links[i].prev
    }
}

/// Hash map iterating in insertion order, with explicit reordering.
///
/// New keys are appended at the end; overwriting a present key keeps its
/// position. The `*_move_to_first`/`*_move_to_last` family reorders.
#[derive(Clone)]
pub struct LinkedHashMap<K, V, S = DefaultStrategy> {
    table: RawTable<K, V, S>,
    order: Order,
    default_value: V,
}

impl<K, V> LinkedHashMap<K, V>
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

impl<K, V> Default for LinkedHashMap<K, V>
where
    K: Hash + Eq,
    V: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

enum End {
    First,
    Last,
}

impl<K, V, S> LinkedHashMap<K, V, S>
where
    S: HashStrategy<K>,
{
    pub fn with_strategy(strategy: S) -> Self
    where
        V: Default,
    {
        let table = RawTable::new(strategy);
        Self {
            order: Order::new(table.capacity()),
            table,
            default_value: V::default(),
        }
    }

    pub fn with_config(config: HashConfig, strategy: S) -> Result<Self, MapError>
    where
        V: Default,
    {
        let table = RawTable::with_config(config, strategy)?;
        Ok(Self {
            order: Order::new(table.capacity()),
            table,
            default_value: V::default(),
        })
    }

    pub fn with_default_return_value(mut self, value: V) -> Self {
        self.default_value = value;
        self
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    pub fn strategy(&self) -> &S {
        self.table.strategy()
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), MapError> {
        let wanted = self.table.len().saturating_add(additional);
        let n = super::slots_for_len(wanted, self.table.load_factor())?;
        if n > self.table.capacity() {
            self.rehash(n);
        }
        Ok(())
    }

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

    /// Reinsert in chain order so the new link array is built front to back.
    fn rehash(&mut self, n: usize) {
        let mut old = self.table.begin_rehash(n);
        let old_order = core::mem::replace(&mut self.order, Order::new(n));
        let mut i = old_order.head;
        while i != NIL {
            let next = old_order.next(i);
            if let Some(slot) = old[i].take() {
                let pos = self.table.place(slot);
                self.order.attach_last(pos);
            }
            i = next;
        }
    }

    fn insert_at(&mut self, key: K, value: V, end: End) -> Option<V> {
        match self.table.probe(&key) {
            Probe::Found(pos) => {
                let old = self
                    .table
                    .entry_mut(pos)
                    .map(|(_, v)| core::mem::replace(v, value));
                self.move_index(pos, end);
                old
            }
            Probe::Vacant { pos, hash } => {
                self.table.occupy(pos, hash, key, value);
                match end {
                    End::First => self.order.attach_first(pos),
                    End::Last => self.order.attach_last(pos),
                }
                if self.table.needs_growth() {
                    let n = self.table.grown_capacity();
                    self.rehash(n);
                }
                None
            }
        }
    }

    fn move_index(&mut self, i: usize, end: End) {
        let at_end = match end {
            End::First => self.order.head == i,
            End::Last => self.order.tail == i,
        };
        if at_end {
            return;
        }
        self.order.detach(i);
        match end {
            End::First => self.order.attach_first(i),
            End::Last => self.order.attach_last(i),
        }
        self.table.touch();
    }

    /// Unlink and remove the entry at `pos`. `follow` is rewritten if the
    /// slot it names is shifted. Never resizes.
    fn remove_tracked(&mut self, pos: usize, follow: &mut usize) -> Option<(K, V)> {
        self.order.detach(pos);
        let order = &mut self.order;
        self.table.remove_at(pos, |from, to| {
            order.relocate(from, to);
            if *follow == from {
                *follow = to;
            }
        })
    }

    fn remove_index(&mut self, pos: usize) -> Option<(K, V)> {
        let mut follow = NIL;
        let removed = self.remove_tracked(pos, &mut follow);
        if self.table.should_shrink() {
            #[cfg(feature = "tracing")]
            tracing::debug!(len = self.table.len(), capacity = self.table.capacity(), "shrink");
            self.rehash(self.table.capacity() / 2);
        }
        removed
    }

    /// Insert or overwrite, then make the entry first. Returns the previous
    /// value or the default return value.
    pub fn put_and_move_to_first(&mut self, key: K, value: V) -> V
    where
        V: Clone,
    {
        self.insert_at(key, value, End::First)
            .unwrap_or_else(|| self.default_value.clone())
    }

    /// Insert or overwrite, then make the entry last.
    pub fn put_and_move_to_last(&mut self, key: K, value: V) -> V
    where
        V: Clone,
    {
        self.insert_at(key, value, End::Last)
            .unwrap_or_else(|| self.default_value.clone())
    }

    /// Make `key` first. Returns false (and changes nothing) if absent.
    pub fn move_to_first(&mut self, key: &K) -> bool {
        match self.table.find(key) {
            Some(pos) => {
                self.move_index(pos, End::First);
                true
            }
            None => false,
        }
    }

    pub fn move_to_last(&mut self, key: &K) -> bool {
        match self.table.find(key) {
            Some(pos) => {
                self.move_index(pos, End::Last);
                true
            }
            None => false,
        }
    }

    /// Value for `key` (or the default return value); a present key is
    /// moved first.
    pub fn get_and_move_to_first(&mut self, key: &K) -> V
    where
        V: Clone,
    {
        match self.table.find(key) {
            Some(pos) => {
                self.move_index(pos, End::First);
                self.value_at(pos)
            }
            None => self.default_value.clone(),
        }
    }

    pub fn get_and_move_to_last(&mut self, key: &K) -> V
    where
        V: Clone,
    {
        match self.table.find(key) {
            Some(pos) => {
                self.move_index(pos, End::Last);
                self.value_at(pos)
            }
            None => self.default_value.clone(),
        }
    }

    fn value_at(&self, pos: usize) -> V
    where
        V: Clone,
    {
        self.table
            .entry(pos)
            .map_or_else(|| self.default_value.clone(), |(_, v)| v.clone())
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.table.entry(self.order.head)
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.table.entry(self.order.tail)
    }

    pub fn first_key(&self) -> Option<&K> {
        self.first().map(|(k, _)| k)
    }

    pub fn last_key(&self) -> Option<&K> {
        self.last().map(|(k, _)| k)
    }

    pub fn first_value(&self) -> Option<&V> {
        self.first().map(|(_, v)| v)
    }

    pub fn last_value(&self) -> Option<&V> {
        self.last().map(|(_, v)| v)
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        match self.order.head {
            NIL => None,
            head => self.remove_index(head),
        }
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        match self.order.tail {
            NIL => None,
            tail => self.remove_index(tail),
        }
    }

    pub fn poll_first_key(&mut self) -> Option<K> {
        self.pop_first().map(|(k, _)| k)
    }

    pub fn poll_last_key(&mut self) -> Option<K> {
        self.pop_last().map(|(k, _)| k)
    }

    /// Iterate the entries that follow `key` in order; `None` if `key` is absent.
    pub fn iter_after(&self, key: &K) -> Option<Iter<'_, K, V, S>> {
        let pos = self.table.find(key)?;
        let mut remaining = 0;
        let mut i = self.order.next(pos);
        while i != NIL {
            remaining += 1;
            i = self.order.next(i);
        }
        Some(Iter {
            map: self,
            front: self.order.next(pos),
            back: if remaining == 0 { NIL } else { self.order.tail },
            remaining,
        })
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Detached fail-fast cursor walking the order chain from the front.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            next: self.order.head,
            last: None,
            stamp: Stamp::new(self.table.mod_count()),
        }
    }

    #[cfg(test)]
    pub(crate) fn structure_intact(&self) -> bool {
        if !self.table.probe_chains_intact() {
            return false;
        }
        let mut count = 0;
        let mut prev = NIL;
        let mut i = self.order.head;
        while i != NIL {
            if self.table.entry(i).is_none() || self.order.prev(i) != prev || count > self.table.len() {
                return false;
            }
            count += 1;
            prev = i;
            i = self.order.next(i);
        }
        prev == self.order.tail && count == self.table.len()
    }
}

impl<K, V, S> MapCore<K, V> for LinkedHashMap<K, V, S>
where
    S: HashStrategy<K>,
{
    type Iter<'a>
        = Iter<'a, K, V, S>
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
            Probe::Vacant { .. } => self.insert_at(key, value, End::Last),
        }
    }

    fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let pos = self.table.find(key)?;
        self.remove_index(pos)
    }

    fn clear(&mut self) {
        self.table.clear();
        self.order = Order::new(self.table.capacity());
    }

    fn default_return_value(&self) -> &V {
        &self.default_value
    }

    fn set_default_return_value(&mut self, value: V) {
        self.default_value = value;
    }

    fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            map: self,
            front: self.order.head,
            back: self.order.tail,
            remaining: self.table.len(),
        }
    }

    fn replace_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> V,
    {
        let mut i = self.order.head;
        while i != NIL {
            if let Some((k, v)) = self.table.entry_mut(i) {
                *v = f(k, v);
            }
            i = self.order.next(i);
        }
    }

    fn reserve(&mut self, additional: usize) {
        if let Err(e) = self.try_reserve(additional) {
            super::capacity_overflow(e);
        }
    }
}

/// Iterator in chain order; double-ended.
pub struct Iter<'a, K, V, S> {
    map: &'a LinkedHashMap<K, V, S>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S>
where
    S: HashStrategy<K>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let i = self.front;
        self.remaining -= 1;
        self.front = self.map.order.next(i);
        self.map.table.entry(i)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> DoubleEndedIterator for Iter<'_, K, V, S>
where
    S: HashStrategy<K>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let i = self.back;
        self.remaining -= 1;
        self.back = self.map.order.prev(i);
        self.map.table.entry(i)
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S> where S: HashStrategy<K> {}

impl<'a, K, V, S> IntoIterator for &'a LinkedHashMap<K, V, S>
where
    S: HashStrategy<K>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Detached, fail-fast cursor over a [`LinkedHashMap`], in chain order.
///
/// Reordering calls (`move_to_first`, ...) count as structural changes.
#[derive(Debug, Clone)]
pub struct Cursor {
    next: usize,
    last: Option<usize>,
    stamp: Stamp,
}

impl Cursor {
    pub fn next<'m, K, V, S>(
        &mut self,
        map: &'m LinkedHashMap<K, V, S>,
    ) -> Result<Option<(&'m K, &'m V)>, MapError>
    where
        S: HashStrategy<K>,
    {
        self.stamp.check(map.table.mod_count())?;
        if self.next == NIL {
            self.last = None;
            return Ok(None);
        }
        let i = self.next;
        self.next = map.order.next(i);
        self.last = Some(i);
        Ok(map.table.entry(i))
    }

    /// Remove the entry returned by the last successful `next`.
    pub fn remove<K, V, S>(&mut self, map: &mut LinkedHashMap<K, V, S>) -> Result<(K, V), MapError>
    where
        S: HashStrategy<K>,
    {
        self.stamp.check(map.table.mod_count())?;
        let last = self.last.take().ok_or(MapError::NoCurrentEntry)?;
        let removed = map.remove_tracked(last, &mut self.next);
        self.stamp.sync(map.table.mod_count());
        removed.ok_or(MapError::NoCurrentEntry)
    }
}

impl<K, V, S> fmt::Debug for LinkedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
    S: HashStrategy<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equal when the same entries appear in the same order.
impl<K, V, S> PartialEq for LinkedHashMap<K, V, S>
where
    V: PartialEq,
    S: HashStrategy<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((ka, va), (kb, vb))| self.table.strategy().equals(ka, kb) && va == vb)
    }
}

impl<K, V, S> Extend<(K, V)> for LinkedHashMap<K, V, S>
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

impl<K, V> FromIterator<(K, V)> for LinkedHashMap<K, V>
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

    fn keys<S: HashStrategy<char>>(m: &LinkedHashMap<char, i32, S>) -> Vec<char> {
        m.keys().copied().collect()
    }

    #[test]
    fn insertion_order_and_overwrite_keeps_position() {
        let mut m: LinkedHashMap<char, i32> = LinkedHashMap::new();
        m.insert('a', 1);
        m.insert('b', 2);
        m.insert('c', 3);
        assert_eq!(m.put('a', 10), 1);
        assert_eq!(keys(&m), vec!['a', 'b', 'c']);
        assert!(m.structure_intact());
    }

    #[test]
    fn put_and_move_variants() {
        let mut m: LinkedHashMap<char, i32> = LinkedHashMap::new();
        m.insert('a', 1);
        m.insert('b', 2);
        assert_eq!(m.put_and_move_to_first('c', 3), 0);
        assert_eq!(keys(&m), vec!['c', 'a', 'b']);
        assert_eq!(m.put_and_move_to_last('a', 4), 1);
        assert_eq!(keys(&m), vec!['c', 'b', 'a']);
        assert_eq!(m.get_and_move_to_first(&'a'), 4);
        assert_eq!(keys(&m), vec!['a', 'c', 'b']);
        assert_eq!(m.get_and_move_to_last(&'z'), 0);
        assert!(!m.move_to_last(&'z'));
        assert!(m.structure_intact());
    }

    #[test]
    fn removal_relinks_across_backward_shift() {
        // Every key hashes alike, so each removal shifts the whole run.
        let mut m = LinkedHashMap::with_strategy(FnStrategy::new(
            |_: &char| 7u64,
            |a: &char, b: &char| a == b,
        ));
        for (i, c) in ['a', 'b', 'c', 'd', 'e'].into_iter().enumerate() {
            m.insert(c, i as i32);
        }
        m.move_to_first(&'d');
        m.remove(&'a');
        assert_eq!(keys(&m), vec!['d', 'b', 'c', 'e']);
        assert!(m.structure_intact());
        m.remove(&'d');
        assert_eq!(keys(&m), vec!['b', 'c', 'e']);
        assert!(m.structure_intact());
        assert_eq!(m.last_key(), Some(&'e'));
    }

    #[test]
    fn rehash_preserves_order() {
        let mut m: LinkedHashMap<u32, u32> = LinkedHashMap::with_capacity(2).unwrap();
        for k in (0..100).rev() {
            m.insert(k, k);
        }
        m.move_to_first(&50);
        let order: Vec<u32> = m.keys().copied().collect();
        assert_eq!(order[0], 50);
        assert_eq!(order[1], 99);
        assert_eq!(*order.last().unwrap(), 0);
        for k in 0..90 {
            if k != 50 {
                m.remove(&k);
            }
        }
        let order: Vec<u32> = m.keys().copied().collect();
        assert_eq!(order, vec![50, 99, 98, 97, 96, 95, 94, 93, 92, 91, 90]);
        assert!(m.structure_intact());
    }

    #[test]
    fn double_ended_and_iter_after() {
        let m: LinkedHashMap<u32, u32> = (1..=5).map(|k| (k, k * 10)).collect();
        let back: Vec<u32> = m.keys().rev().copied().collect();
        assert_eq!(back, vec![5, 4, 3, 2, 1]);
        let after: Vec<u32> = m.iter_after(&2).unwrap().map(|(k, _)| *k).collect();
        assert_eq!(after, vec![3, 4, 5]);
        assert_eq!(m.iter_after(&5).unwrap().count(), 0);
        assert!(m.iter_after(&9).is_none());
        let mut it = m.iter();
        assert_eq!(it.next().map(|(k, _)| *k), Some(1));
        assert_eq!(it.next_back().map(|(k, _)| *k), Some(5));
        assert_eq!(it.len(), 3);
    }

    #[test]
    fn cursor_remove_follows_shifted_successor() {
        let c = (0u64..).find(|h| mix(*h) as usize & 15 == 14).unwrap();
        let mut m = LinkedHashMap::with_config(
            HashConfig::new().initial_capacity(16).load_factor(1.0),
            FnStrategy::new(move |_: &char| c, |a: &char, b: &char| a == b),
        )
        .unwrap();
        for (i, ch) in "abcdef".chars().enumerate() {
            m.insert(ch, i as i32);
        }
        let mut cur = m.cursor();
        let mut seen = String::new();
        while let Some((k, _)) = cur.next(&m).unwrap() {
            seen.push(*k);
            if *k != 'c' {
                cur.remove(&mut m).unwrap();
                assert!(m.structure_intact());
            }
        }
        assert_eq!(seen, "abcdef");
        assert_eq!(keys(&m), vec!['c']);
    }

    #[test]
    fn reorder_invalidates_cursor() {
        let mut m: LinkedHashMap<u32, u32> = (0..3).map(|k| (k, k)).collect();
        let mut cur = m.cursor();
        cur.next(&m).unwrap();
        m.move_to_first(&2);
        assert_eq!(cur.next(&m), Err(MapError::ConcurrentModification));
    }

    #[test]
    fn pop_and_clear() {
        let mut m: LinkedHashMap<u32, u32> = (0..4).map(|k| (k, k)).collect();
        assert_eq!(m.pop_first(), Some((0, 0)));
        assert_eq!(m.pop_last(), Some((3, 3)));
        assert_eq!(m.first(), Some((&1, &1)));
        assert_eq!(m.last_value(), Some(&2));
        m.clear();
        assert!(m.first().is_none());
        assert_eq!(m.poll_first_key(), None);
        m.insert(9, 9);
        assert_eq!(keys_u32(&m), vec![9]);
        assert!(m.structure_intact());
    }

    fn keys_u32(m: &LinkedHashMap<u32, u32>) -> Vec<u32> {
        m.keys().copied().collect()
    }
}
