//! Balanced-tree engines with navigable-map semantics.
//!
//! [`TreeMap`] is one map generic over a balance policy: [`Avl`] or
//! [`RedBlack`]. The two share the node arena, descent, navigation and
//! rotation code in `raw`; the policies only decide how to rebalance
//! after a leaf is attached or a node is spliced out.
//!
//! - `raw`: slotmap-backed nodes with parent links, rotations, in-order steps.
//! - `avl`, `rb`: the two policies.
//! - `view`: live range windows ([`SubMap`], [`SubMapMut`]) and the
//!   [`Range`](view::Range) iterator.
//!
//! Keys are ordered by a [`Comparator`], [`NaturalOrder`] by default.

mod avl;
mod raw;
mod rb;
pub mod view;

pub use avl::Avl;
pub use rb::RedBlack;
pub use view::{SubMap, SubMapMut};

use crate::error::MapError;
use crate::map::MapCore;
use crate::stamp::Stamp;
use crate::strategy::{Comparator, NaturalOrder};
use core::fmt;
use core::ops::{Bound, RangeBounds};
use raw::{NodeId, RawTree, Search, Walk};
use view::{Range, Window};

pub(crate) mod sealed {
    use super::raw::{NodeId, RawTree};

    /// Rebalancing hooks. Not implementable outside the crate.
    pub trait Rebalance {
        type Meta: Copy + core::fmt::Debug;

        /// Metadata of a freshly attached leaf.
        fn leaf() -> Self::Meta;

        fn after_insert<K, V>(t: &mut RawTree<K, V, Self::Meta>, id: NodeId);

        /// Detach `id` (which has at most one child) and rebalance. The
        /// node stays in the arena.
        fn unlink<K, V>(t: &mut RawTree<K, V, Self::Meta>, id: NodeId);

        #[cfg(test)]
        fn check<K, V>(t: &RawTree<K, V, Self::Meta>) -> bool;
    }
}

/// Balance policy of a [`TreeMap`]. Sealed: implemented by [`Avl`] and
/// [`RedBlack`] only.
pub trait Balance: sealed::Rebalance {}

/// Ordered map balanced by the AVL policy.
pub type AvlTreeMap<K, V, C = NaturalOrder> = TreeMap<K, V, C, Avl>;
/// Ordered map balanced by the red-black policy.
pub type RbTreeMap<K, V, C = NaturalOrder> = TreeMap<K, V, C, RedBlack>;

/// Navigable ordered map.
///
/// Besides the [`MapCore`] surface it answers floor/ceiling/lower/higher
/// queries, hands out range views, and can carry a pair of navigation
/// sentinels (`below`, `above`) returned by the `*_or_default` lookups
/// when no key qualifies.
pub struct TreeMap<K, V, C = NaturalOrder, B: Balance = RedBlack> {
    tree: RawTree<K, V, B::Meta>,
    comparator: C,
    default_value: V,
    below: Option<K>,
    above: Option<K>,
}

impl<K, V, B> TreeMap<K, V, NaturalOrder, B>
where
    K: Ord,
    V: Default,
    B: Balance,
{
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, B> Default for TreeMap<K, V, NaturalOrder, B>
where
    K: Ord,
    V: Default,
    B: Balance,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, B> TreeMap<K, V, C, B>
where
    C: Comparator<K>,
    B: Balance,
{
    pub fn with_comparator(comparator: C) -> Self
    where
        V: Default,
    {
        Self {
            tree: RawTree::default(),
            comparator,
            default_value: V::default(),
            below: None,
            above: None,
        }
    }

    pub fn with_default_return_value(mut self, value: V) -> Self {
        self.default_value = value;
        self
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Sentinels for the `*_or_default` navigation calls: `below` answers
    /// floor/lower misses, `above` answers ceiling/higher misses.
    pub fn set_navigation_defaults(&mut self, below: K, above: K) {
        self.below = Some(below);
        self.above = Some(above);
    }

    pub fn navigation_defaults(&self) -> (Option<&K>, Option<&K>) {
        (self.below.as_ref(), self.above.as_ref())
    }

    /// Longest root-to-leaf path, counted in nodes.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    fn key_of(&self, id: Option<NodeId>) -> Option<&K> {
        id.map(|id| self.tree.entry(id).0)
    }

    fn entry_of(&self, id: Option<NodeId>) -> Option<(&K, &V)> {
        id.map(|id| self.tree.entry(id))
    }

    pub fn first_key(&self) -> Option<&K> {
        self.key_of(self.tree.first())
    }

    pub fn last_key(&self) -> Option<&K> {
        self.key_of(self.tree.last())
    }

    pub fn first_entry(&self) -> Option<(&K, &V)> {
        self.entry_of(self.tree.first())
    }

    pub fn last_entry(&self) -> Option<(&K, &V)> {
        self.entry_of(self.tree.last())
    }

    /// Greatest key `<= key`.
    pub fn floor_key(&self, key: &K) -> Option<&K> {
        self.key_of(self.tree.nearest(&self.comparator, key, true, true))
    }

    /// Least key `>= key`.
    pub fn ceiling_key(&self, key: &K) -> Option<&K> {
        self.key_of(self.tree.nearest(&self.comparator, key, false, true))
    }

    /// Greatest key `< key`.
    pub fn lower_key(&self, key: &K) -> Option<&K> {
        self.key_of(self.tree.nearest(&self.comparator, key, true, false))
    }

    /// Least key `> key`.
    pub fn higher_key(&self, key: &K) -> Option<&K> {
        self.key_of(self.tree.nearest(&self.comparator, key, false, false))
    }

    pub fn floor_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.entry_of(self.tree.nearest(&self.comparator, key, true, true))
    }

    pub fn ceiling_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.entry_of(self.tree.nearest(&self.comparator, key, false, true))
    }

    pub fn lower_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.entry_of(self.tree.nearest(&self.comparator, key, true, false))
    }

    pub fn higher_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.entry_of(self.tree.nearest(&self.comparator, key, false, false))
    }

    pub fn floor_or_default(&self, key: &K) -> Option<&K> {
        self.floor_key(key).or(self.below.as_ref())
    }

    pub fn lower_or_default(&self, key: &K) -> Option<&K> {
        self.lower_key(key).or(self.below.as_ref())
    }

    pub fn ceiling_or_default(&self, key: &K) -> Option<&K> {
        self.ceiling_key(key).or(self.above.as_ref())
    }

    pub fn higher_or_default(&self, key: &K) -> Option<&K> {
        self.higher_key(key).or(self.above.as_ref())
    }

    /// Remove the node holding a live entry. Returns the entry and the
    /// arena node that actually left the tree.
    fn remove_node(&mut self, id: NodeId) -> Option<(NodeId, K, V)> {
        let victim = self.tree.prepare_removal(id);
        B::unlink(&mut self.tree, victim);
        let (k, v) = self.tree.take(victim)?;
        Some((victim, k, v))
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let id = self.tree.first()?;
        self.remove_node(id).map(|(_, k, v)| (k, v))
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let id = self.tree.last()?;
        self.remove_node(id).map(|(_, k, v)| (k, v))
    }

    pub fn poll_first_key(&mut self) -> Option<K> {
        self.pop_first().map(|(k, _)| k)
    }

    pub fn poll_last_key(&mut self) -> Option<K> {
        self.pop_last().map(|(k, _)| k)
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Keys in descending order.
    pub fn descending_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().rev().map(|(k, _)| k)
    }

    /// Entries whose keys fall in `bounds`, ascending. An inverted range
    /// yields nothing.
    pub fn range<R: RangeBounds<K>>(&self, bounds: R) -> Range<'_, K, V, C, B> {
        Range::new(self, bounds.start_bound(), bounds.end_bound(), false)
    }

    /// Live view of the whole map in descending order.
    pub fn descending_map(&self) -> SubMap<'_, K, V, C, B> {
        SubMap::new(self, Window::full().reversed())
    }

    /// Live view of the keys between `lo` and `hi`.
    pub fn sub_map(&self, lo: K, lo_inclusive: bool, hi: K, hi_inclusive: bool) -> Result<SubMap<'_, K, V, C, B>, MapError> {
        let w = Window::checked(&self.comparator, bound(lo, lo_inclusive), bound(hi, hi_inclusive))?;
        Ok(SubMap::new(self, w))
    }

    /// Live view of the keys before `hi`.
    pub fn head_map(&self, hi: K, inclusive: bool) -> SubMap<'_, K, V, C, B> {
        SubMap::new(self, Window::new(Bound::Unbounded, bound(hi, inclusive)))
    }

    /// Live view of the keys from `lo` on.
    pub fn tail_map(&self, lo: K, inclusive: bool) -> SubMap<'_, K, V, C, B> {
        SubMap::new(self, Window::new(bound(lo, inclusive), Bound::Unbounded))
    }

    pub fn sub_map_mut(
        &mut self,
        lo: K,
        lo_inclusive: bool,
        hi: K,
        hi_inclusive: bool,
    ) -> Result<SubMapMut<'_, K, V, C, B>, MapError> {
        let w = Window::checked(&self.comparator, bound(lo, lo_inclusive), bound(hi, hi_inclusive))?;
        Ok(SubMapMut::new(self, w))
    }

    pub fn head_map_mut(&mut self, hi: K, inclusive: bool) -> SubMapMut<'_, K, V, C, B> {
        SubMapMut::new(self, Window::new(Bound::Unbounded, bound(hi, inclusive)))
    }

    pub fn tail_map_mut(&mut self, lo: K, inclusive: bool) -> SubMapMut<'_, K, V, C, B> {
        SubMapMut::new(self, Window::new(bound(lo, inclusive), Bound::Unbounded))
    }

    pub fn descending_map_mut(&mut self) -> SubMapMut<'_, K, V, C, B> {
        SubMapMut::new(self, Window::full().reversed())
    }

    /// Detached fail-fast cursor walking the map in ascending order.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            next: self.tree.first(),
            last: None,
            stamp: Stamp::new(self.tree.mod_count()),
        }
    }

    #[cfg(test)]
    pub(crate) fn structure_intact(&self) -> bool {
        self.tree.links_and_order_intact(&self.comparator) && B::check(&self.tree)
    }
}

pub(crate) fn bound<K>(key: K, inclusive: bool) -> Bound<K> {
    if inclusive {
        Bound::Included(key)
    } else {
        Bound::Excluded(key)
    }
}

impl<K, V, C, B> MapCore<K, V> for TreeMap<K, V, C, B>
where
    C: Comparator<K>,
    B: Balance,
{
    type Iter<'a>
        = Iter<'a, K, V, B>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    #[inline]
    fn len(&self) -> usize {
        self.tree.len()
    }

    fn get_ref(&self, key: &K) -> Option<&V> {
        let id = self.tree.find(&self.comparator, key)?;
        Some(self.tree.entry(id).1)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.tree.find(&self.comparator, key)?;
        Some(&mut self.tree.node_mut(id).value)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.tree.search(&self.comparator, &key) {
            Search::Found(id) => Some(core::mem::replace(&mut self.tree.node_mut(id).value, value)),
            Search::Vacant(at) => {
                let id = self.tree.attach(at, key, value, B::leaf());
                B::after_insert(&mut self.tree, id);
                None
            }
        }
    }

    fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let id = self.tree.find(&self.comparator, key)?;
        self.remove_node(id).map(|(_, k, v)| (k, v))
    }

    fn clear(&mut self) {
        self.tree.clear();
    }

    fn default_return_value(&self) -> &V {
        &self.default_value
    }

    fn set_default_return_value(&mut self, value: V) {
        self.default_value = value;
    }

    fn iter(&self) -> Iter<'_, K, V, B> {
        Iter {
            tree: &self.tree,
            walk: Walk::between(self.tree.first(), self.tree.last()),
            remaining: self.tree.len(),
        }
    }

    fn replace_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> V,
    {
        let mut cur = self.tree.first();
        while let Some(id) = cur {
            let n = self.tree.node_mut(id);
            n.value = f(&n.key, &n.value);
            cur = self.tree.successor(id);
        }
    }
}

/// In-order iterator over a [`TreeMap`]; double-ended.
pub struct Iter<'a, K, V, B: Balance> {
    tree: &'a RawTree<K, V, B::Meta>,
    walk: Walk,
    remaining: usize,
}

impl<'a, K, V, B: Balance> Iterator for Iter<'a, K, V, B> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.walk.next(self.tree)?;
        self.remaining -= 1;
        Some(self.tree.entry(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, B: Balance> DoubleEndedIterator for Iter<'_, K, V, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let id = self.walk.next_back(self.tree)?;
        self.remaining -= 1;
        Some(self.tree.entry(id))
    }
}

impl<K, V, B: Balance> ExactSizeIterator for Iter<'_, K, V, B> {}

impl<'a, K, V, C, B> IntoIterator for &'a TreeMap<K, V, C, B>
where
    C: Comparator<K>,
    B: Balance,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Detached, fail-fast cursor over a [`TreeMap`], ascending.
#[derive(Debug, Clone)]
pub struct Cursor {
    next: Option<NodeId>,
    last: Option<NodeId>,
    stamp: Stamp,
}

impl Cursor {
    pub fn next<'m, K, V, C, B>(&mut self, map: &'m TreeMap<K, V, C, B>) -> Result<Option<(&'m K, &'m V)>, MapError>
    where
        C: Comparator<K>,
        B: Balance,
    {
        self.stamp.check(map.tree.mod_count())?;
        let Some(id) = self.next else {
            self.last = None;
            return Ok(None);
        };
        self.next = map.tree.successor(id);
        self.last = Some(id);
        Ok(Some(map.tree.entry(id)))
    }

    /// Remove the entry returned by the last successful `next`.
    pub fn remove<K, V, C, B>(&mut self, map: &mut TreeMap<K, V, C, B>) -> Result<(K, V), MapError>
    where
        C: Comparator<K>,
        B: Balance,
    {
        self.stamp.check(map.tree.mod_count())?;
        let last = self.last.take().ok_or(MapError::NoCurrentEntry)?;
        let (victim, k, v) = map.remove_node(last).ok_or(MapError::NoCurrentEntry)?;
        // The successor's entry moved into `last`.
        if victim != last {
            self.next = Some(last);
        }
        self.stamp.sync(map.tree.mod_count());
        Ok((k, v))
    }
}

impl<K, V, C, B> Clone for TreeMap<K, V, C, B>
where
    K: Clone,
    V: Clone,
    C: Clone,
    B: Balance,
{
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            comparator: self.comparator.clone(),
            default_value: self.default_value.clone(),
            below: self.below.clone(),
            above: self.above.clone(),
        }
    }
}

impl<K, V, C, B> fmt::Debug for TreeMap<K, V, C, B>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Comparator<K>,
    B: Balance,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C, B> PartialEq for TreeMap<K, V, C, B>
where
    V: PartialEq,
    C: Comparator<K>,
    B: Balance,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().zip(other.iter()).all(|((ka, va), (kb, vb))| {
                self.comparator.compare(ka, kb) == core::cmp::Ordering::Equal && va == vb
            })
    }
}

impl<K, V, C, B> Extend<(K, V)> for TreeMap<K, V, C, B>
where
    C: Comparator<K>,
    B: Balance,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, B> FromIterator<(K, V)> for TreeMap<K, V, NaturalOrder, B>
where
    K: Ord,
    V: Default,
    B: Balance,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::new();
        m.extend(iter);
        m
    }
}
