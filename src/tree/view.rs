//! Live range windows over a [`TreeMap`].
//!
//! A view is a borrow of the map plus a window: two bounds in the
//! map's natural order and a direction flag. Nothing is copied. Every
//! navigation call resolves against the parent tree and is clamped to
//! the bounds; a descending window swaps floor with ceiling, lower with
//! higher and first with last.

use super::raw::{NodeId, Walk};
use super::{bound, Balance, TreeMap};
use crate::error::MapError;
use crate::map::MapCore;
use crate::strategy::Comparator;
use core::cmp::Ordering;
use core::ops::Bound;

#[derive(Clone, Debug)]
pub(crate) struct Window<K> {
    lo: Bound<K>,
    hi: Bound<K>,
    descending: bool,
}

impl<K> Window<K> {
    pub(crate) fn full() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    pub(crate) fn new(lo: Bound<K>, hi: Bound<K>) -> Self {
        Self {
            lo,
            hi,
            descending: false,
        }
    }

    pub(crate) fn reversed(mut self) -> Self {
        self.descending = !self.descending;
        self
    }

    /// Window over `[lo, hi]`; fails if `lo` lies after `hi`.
    pub(crate) fn checked<C: Comparator<K>>(cmp: &C, lo: Bound<K>, hi: Bound<K>) -> Result<Self, MapError> {
        if let (Bound::Included(a) | Bound::Excluded(a), Bound::Included(b) | Bound::Excluded(b)) = (&lo, &hi) {
            if cmp.compare(a, b) == Ordering::Greater {
                return Err(MapError::InvalidRange);
            }
        }
        Ok(Self::new(lo, hi))
    }

    fn lo(&self) -> Bound<&K> {
        self.lo.as_ref()
    }

    fn hi(&self) -> Bound<&K> {
        self.hi.as_ref()
    }
}

fn too_low<K, C: Comparator<K>>(cmp: &C, lo: Bound<&K>, key: &K) -> bool {
    match lo {
        Bound::Unbounded => false,
        Bound::Included(b) => cmp.compare(key, b) == Ordering::Less,
        Bound::Excluded(b) => cmp.compare(key, b) != Ordering::Greater,
    }
}

fn too_high<K, C: Comparator<K>>(cmp: &C, hi: Bound<&K>, key: &K) -> bool {
    match hi {
        Bound::Unbounded => false,
        Bound::Included(b) => cmp.compare(key, b) == Ordering::Greater,
        Bound::Excluded(b) => cmp.compare(key, b) != Ordering::Less,
    }
}

fn in_bounds<K, C: Comparator<K>>(cmp: &C, lo: Bound<&K>, hi: Bound<&K>, key: &K) -> bool {
    !too_low(cmp, lo, key) && !too_high(cmp, hi, key)
}

/// Least node inside the bounds.
fn lowest<K, V, C, B>(map: &TreeMap<K, V, C, B>, lo: Bound<&K>, hi: Bound<&K>) -> Option<NodeId>
where
    C: Comparator<K>,
    B: Balance,
{
    let id = match lo {
        Bound::Unbounded => map.tree.first(),
        Bound::Included(k) => map.tree.nearest(&map.comparator, k, false, true),
        Bound::Excluded(k) => map.tree.nearest(&map.comparator, k, false, false),
    }?;
    (!too_high(&map.comparator, hi, map.tree.entry(id).0)).then_some(id)
}

/// Greatest node inside the bounds.
fn highest<K, V, C, B>(map: &TreeMap<K, V, C, B>, lo: Bound<&K>, hi: Bound<&K>) -> Option<NodeId>
where
    C: Comparator<K>,
    B: Balance,
{
    let id = match hi {
        Bound::Unbounded => map.tree.last(),
        Bound::Included(k) => map.tree.nearest(&map.comparator, k, true, true),
        Bound::Excluded(k) => map.tree.nearest(&map.comparator, k, true, false),
    }?;
    (!too_low(&map.comparator, lo, map.tree.entry(id).0)).then_some(id)
}

/// Nearest node below (or above) `key` in natural order, clamped to the bounds.
fn nearest_in<K, V, C, B>(
    map: &TreeMap<K, V, C, B>,
    lo: Bound<&K>,
    hi: Bound<&K>,
    key: &K,
    below: bool,
    inclusive: bool,
) -> Option<NodeId>
where
    C: Comparator<K>,
    B: Balance,
{
    let cmp = &map.comparator;
    if below {
        if too_high(cmp, hi, key) {
            return highest(map, lo, hi);
        }
        let id = map.tree.nearest(cmp, key, true, inclusive)?;
        (!too_low(cmp, lo, map.tree.entry(id).0)).then_some(id)
    } else {
        if too_low(cmp, lo, key) {
            return lowest(map, lo, hi);
        }
        let id = map.tree.nearest(cmp, key, false, inclusive)?;
        (!too_high(cmp, hi, map.tree.entry(id).0)).then_some(id)
    }
}

/// Iterator over the entries inside a pair of bounds, in either direction.
pub struct Range<'a, K, V, C, B: Balance> {
    map: &'a TreeMap<K, V, C, B>,
    walk: Walk,
    descending: bool,
}

impl<'a, K, V, C, B> Range<'a, K, V, C, B>
where
    C: Comparator<K>,
    B: Balance,
{
    pub(crate) fn new(map: &'a TreeMap<K, V, C, B>, lo: Bound<&K>, hi: Bound<&K>, descending: bool) -> Self {
        let walk = match (lowest(map, lo, hi), highest(map, lo, hi)) {
            (Some(first), Some(last))
                if map.comparator.compare(map.tree.entry(first).0, map.tree.entry(last).0)
                    != Ordering::Greater =>
            {
                Walk::between(Some(first), Some(last))
            }
            _ => Walk::EMPTY,
        };
        Self { map, walk, descending }
    }
}

impl<'a, K, V, C, B> Iterator for Range<'a, K, V, C, B>
where
    C: Comparator<K>,
    B: Balance,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = if self.descending {
            self.walk.next_back(&self.map.tree)
        } else {
            self.walk.next(&self.map.tree)
        }?;
        Some(self.map.tree.entry(id))
    }
}

impl<K, V, C, B> DoubleEndedIterator for Range<'_, K, V, C, B>
where
    C: Comparator<K>,
    B: Balance,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let id = if self.descending {
            self.walk.next(&self.map.tree)
        } else {
            self.walk.next_back(&self.map.tree)
        }?;
        Some(self.map.tree.entry(id))
    }
}

/// Read-only live view of a key range of a [`TreeMap`].
pub struct SubMap<'a, K, V, C, B: Balance> {
    map: &'a TreeMap<K, V, C, B>,
    window: Window<K>,
}

impl<'a, K, V, C, B> SubMap<'a, K, V, C, B>
where
    C: Comparator<K>,
    B: Balance,
{
    pub(crate) fn new(map: &'a TreeMap<K, V, C, B>, window: Window<K>) -> Self {
        Self { map, window }
    }

    pub fn is_descending(&self) -> bool {
        self.window.descending
    }

    /// Whether `key` lies inside the view's bounds (present or not).
    pub fn in_range(&self, key: &K) -> bool {
        in_bounds(&self.map.comparator, self.window.lo(), self.window.hi(), key)
    }

    pub fn get_ref(&self, key: &K) -> Option<&'a V> {
        if !self.in_range(key) {
            return None;
        }
        self.map.get_ref(key)
    }

    /// Value for `key`, or the map's default return value when absent or
    /// outside the range.
    pub fn get(&self, key: &K) -> V
    where
        V: Clone,
    {
        self.get_ref(key)
            .unwrap_or_else(|| self.map.default_return_value())
            .clone()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get_ref(key).is_some()
    }

    /// Number of entries in range. Walks the range.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Entries in the view's order.
    pub fn iter(&self) -> Range<'a, K, V, C, B> {
        Range::new(self.map, self.window.lo(), self.window.hi(), self.window.descending)
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &'a K> + 'a
    where
        K: 'a,
        V: 'a,
    {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &'a V> + 'a
    where
        K: 'a,
        V: 'a,
    {
        self.iter().map(|(_, v)| v)
    }

    fn end(&self, last: bool) -> Option<NodeId> {
        let (lo, hi) = (self.window.lo(), self.window.hi());
        if last != self.window.descending {
            highest(self.map, lo, hi)
        } else {
            lowest(self.map, lo, hi)
        }
    }

    /// Navigation in view order: `below` means "comes before".
    fn nav(&self, key: &K, below: bool, inclusive: bool) -> Option<NodeId> {
        let below = below != self.window.descending;
        nearest_in(self.map, self.window.lo(), self.window.hi(), key, below, inclusive)
    }

    fn key_of(&self, id: Option<NodeId>) -> Option<&'a K> {
        let map = self.map;
        id.map(|id| map.tree.entry(id).0)
    }

    fn entry_of(&self, id: Option<NodeId>) -> Option<(&'a K, &'a V)> {
        let map = self.map;
        id.map(|id| map.tree.entry(id))
    }

    pub fn first_key(&self) -> Option<&'a K> {
        self.key_of(self.end(false))
    }

    pub fn last_key(&self) -> Option<&'a K> {
        self.key_of(self.end(true))
    }

    pub fn first_entry(&self) -> Option<(&'a K, &'a V)> {
        self.entry_of(self.end(false))
    }

    pub fn last_entry(&self) -> Option<(&'a K, &'a V)> {
        self.entry_of(self.end(true))
    }

    pub fn floor_key(&self, key: &K) -> Option<&'a K> {
        self.key_of(self.nav(key, true, true))
    }

    pub fn ceiling_key(&self, key: &K) -> Option<&'a K> {
        self.key_of(self.nav(key, false, true))
    }

    pub fn lower_key(&self, key: &K) -> Option<&'a K> {
        self.key_of(self.nav(key, true, false))
    }

    pub fn higher_key(&self, key: &K) -> Option<&'a K> {
        self.key_of(self.nav(key, false, false))
    }

    pub fn floor_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry_of(self.nav(key, true, true))
    }

    pub fn ceiling_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry_of(self.nav(key, false, true))
    }

    pub fn lower_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry_of(self.nav(key, true, false))
    }

    pub fn higher_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry_of(self.nav(key, false, false))
    }

    /// The map's navigation sentinel lying before (or after) every key in
    /// view order. A descending view answers floor misses with `above`.
    fn sentinel(&self, before: bool) -> Option<&'a K> {
        let map = self.map;
        if before != self.window.descending {
            map.below.as_ref()
        } else {
            map.above.as_ref()
        }
    }

    pub fn floor_or_default(&self, key: &K) -> Option<&'a K> {
        self.floor_key(key).or_else(|| self.sentinel(true))
    }

    pub fn lower_or_default(&self, key: &K) -> Option<&'a K> {
        self.lower_key(key).or_else(|| self.sentinel(true))
    }

    pub fn ceiling_or_default(&self, key: &K) -> Option<&'a K> {
        self.ceiling_key(key).or_else(|| self.sentinel(false))
    }

    pub fn higher_or_default(&self, key: &K) -> Option<&'a K> {
        self.higher_key(key).or_else(|| self.sentinel(false))
    }

    /// Whether a nested bound on `key` stays inside this view. An
    /// exclusive bound may sit on an excluded endpoint.
    fn admits(&self, key: &K, inclusive: bool) -> bool {
        if inclusive {
            return self.in_range(key);
        }
        let cmp = &self.map.comparator;
        let below = match self.window.lo() {
            Bound::Included(b) | Bound::Excluded(b) => cmp.compare(key, b) == Ordering::Less,
            Bound::Unbounded => false,
        };
        let above = match self.window.hi() {
            Bound::Included(b) | Bound::Excluded(b) => cmp.compare(key, b) == Ordering::Greater,
            Bound::Unbounded => false,
        };
        !below && !above
    }

    fn nested(&self, lo: Bound<K>, hi: Bound<K>) -> Result<SubMap<'a, K, V, C, B>, MapError> {
        let mut w = Window::checked(&self.map.comparator, lo, hi)?;
        w.descending = self.window.descending;
        Ok(SubMap::new(self.map, w))
    }

    /// Nested view from `from` to `to`, both given in this view's order.
    pub fn sub_map(&self, from: K, from_inclusive: bool, to: K, to_inclusive: bool) -> Result<SubMap<'a, K, V, C, B>, MapError> {
        if !self.admits(&from, from_inclusive) || !self.admits(&to, to_inclusive) {
            return Err(MapError::KeyOutOfRange);
        }
        let (from, to) = (bound(from, from_inclusive), bound(to, to_inclusive));
        if self.window.descending {
            self.nested(to, from)
        } else {
            self.nested(from, to)
        }
    }

    /// Nested view of the keys before `to` in this view's order.
    pub fn head_map(&self, to: K, inclusive: bool) -> Result<SubMap<'a, K, V, C, B>, MapError>
    where
        K: Clone,
    {
        if !self.admits(&to, inclusive) {
            return Err(MapError::KeyOutOfRange);
        }
        let to = bound(to, inclusive);
        if self.window.descending {
            self.nested(to, self.window.hi.clone())
        } else {
            self.nested(self.window.lo.clone(), to)
        }
    }

    /// Nested view of the keys from `from` on in this view's order.
    pub fn tail_map(&self, from: K, inclusive: bool) -> Result<SubMap<'a, K, V, C, B>, MapError>
    where
        K: Clone,
    {
        if !self.admits(&from, inclusive) {
            return Err(MapError::KeyOutOfRange);
        }
        let from = bound(from, inclusive);
        if self.window.descending {
            self.nested(self.window.lo.clone(), from)
        } else {
            self.nested(from, self.window.hi.clone())
        }
    }

    /// The same range in the opposite order.
    pub fn descending_map(&self) -> SubMap<'a, K, V, C, B>
    where
        K: Clone,
    {
        SubMap::new(self.map, self.window.clone().reversed())
    }
}

/// Mutable live view of a key range. Insertions outside the range are
/// rejected; removals outside it are no-ops.
pub struct SubMapMut<'a, K, V, C, B: Balance> {
    map: &'a mut TreeMap<K, V, C, B>,
    window: Window<K>,
}

impl<'a, K, V, C, B> SubMapMut<'a, K, V, C, B>
where
    C: Comparator<K>,
    B: Balance,
{
    pub(crate) fn new(map: &'a mut TreeMap<K, V, C, B>, window: Window<K>) -> Self {
        Self { map, window }
    }

    /// Read-only view over the same range, for navigation and iteration.
    pub fn view(&self) -> SubMap<'_, K, V, C, B>
    where
        K: Clone,
    {
        SubMap::new(&*self.map, self.window.clone())
    }

    pub fn in_range(&self, key: &K) -> bool {
        in_bounds(&self.map.comparator, self.window.lo(), self.window.hi(), key)
    }

    pub fn len(&self) -> usize {
        Range::new(&*self.map, self.window.lo(), self.window.hi(), false).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Range<'_, K, V, C, B> {
        Range::new(&*self.map, self.window.lo(), self.window.hi(), self.window.descending)
    }

    pub fn get_ref(&self, key: &K) -> Option<&V> {
        if !self.in_range(key) {
            return None;
        }
        self.map.get_ref(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if !self.in_range(key) {
            return None;
        }
        self.map.get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get_ref(key).is_some()
    }

    /// Insert or overwrite through the view. The map is left unchanged
    /// when `key` is out of range.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, MapError> {
        if !self.in_range(&key) {
            #[cfg(feature = "tracing")]
            tracing::trace!("view rejected out-of-range key");
            return Err(MapError::KeyOutOfRange);
        }
        Ok(self.map.insert(key, value))
    }

    /// Like [`insert`](Self::insert), returning the previous value or the
    /// default return value.
    pub fn put(&mut self, key: K, value: V) -> Result<V, MapError>
    where
        V: Clone,
    {
        Ok(self
            .insert(key, value)?
            .unwrap_or_else(|| self.map.default_return_value().clone()))
    }

    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        if !self.in_range(key) {
            return None;
        }
        self.map.remove_entry(key)
    }

    /// Remove `key` if in range; returns its value or the default return value.
    pub fn remove(&mut self, key: &K) -> V
    where
        V: Clone,
    {
        match self.remove_entry(key) {
            Some((_, v)) => v,
            None => self.map.default_return_value().clone(),
        }
    }

    fn pop_end(&mut self, last: bool) -> Option<(K, V)> {
        let (lo, hi) = (self.window.lo(), self.window.hi());
        let id = if last != self.window.descending {
            highest(&*self.map, lo, hi)
        } else {
            lowest(&*self.map, lo, hi)
        }?;
        self.map.remove_node(id).map(|(_, k, v)| (k, v))
    }

    /// Remove the first entry in the view's order.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.pop_end(false)
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.pop_end(true)
    }

    /// Remove every entry in range; entries outside it are untouched.
    pub fn clear(&mut self) {
        while self.pop_end(false).is_some() {}
    }
}
