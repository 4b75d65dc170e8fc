//! RawTree: node arena, descent, navigation and rotations.
//!
//! Nodes live in a `SlotMap` and refer to each other by [`NodeId`]
//! (left, right, parent). The balance policies only see this layer; they
//! own the per-node metadata `M` (a height or a color) and decide when to
//! rotate.
//!
//! Removal of a node with two children swaps its payload with its
//! in-order successor and unlinks the successor node instead, so the
//! node a caller asked to remove may survive holding the successor's
//! entry. [`RawTree::prepare_removal`] reports which node will actually go.

use crate::stamp::ModCount;
use crate::strategy::Comparator;
use core::cmp::Ordering;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct NodeId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    Left,
    Right,
}

impl Dir {
    #[inline]
    pub(crate) fn opposite(self) -> Self {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node<K, V, M> {
    pub key: K,
    pub value: V,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub parent: Option<NodeId>,
    pub meta: M,
}

/// Result of descending for a key.
pub enum Search {
    Found(NodeId),
    /// Where a new node would hang; `None` for an empty tree.
    Vacant(Option<(NodeId, Dir)>),
}

#[derive(Clone, Debug)]
pub struct RawTree<K, V, M> {
    nodes: SlotMap<NodeId, Node<K, V, M>>,
    root: Option<NodeId>,
    mod_count: ModCount,
}

impl<K, V, M> Default for RawTree<K, V, M> {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            mod_count: ModCount::default(),
        }
    }
}

impl<K, V, M: Copy> RawTree<K, V, M> {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub(crate) fn mod_count(&self) -> ModCount {
        self.mod_count
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V, M> {
        &mut self.nodes[id]
    }

    #[inline]
    pub(crate) fn entry(&self, id: NodeId) -> (&K, &V) {
        let n = &self.nodes[id];
        (&n.key, &n.value)
    }

    #[inline]
    pub(crate) fn meta(&self, id: NodeId) -> M {
        self.nodes[id].meta
    }

    #[inline]
    pub(crate) fn set_meta(&mut self, id: NodeId, meta: M) {
        self.nodes[id].meta = meta;
    }

    #[inline]
    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    #[inline]
    pub(crate) fn child(&self, id: NodeId, dir: Dir) -> Option<NodeId> {
        let n = &self.nodes[id];
        match dir {
            Dir::Left => n.left,
            Dir::Right => n.right,
        }
    }

    #[inline]
    fn child_mut(&mut self, id: NodeId, dir: Dir) -> &mut Option<NodeId> {
        let n = &mut self.nodes[id];
        match dir {
            Dir::Left => &mut n.left,
            Dir::Right => &mut n.right,
        }
    }

    /// Which side of its parent `id` hangs on; `None` for the root.
    pub(crate) fn side(&self, id: NodeId) -> Option<Dir> {
        let p = self.parent(id)?;
        if self.nodes[p].left == Some(id) {
            Some(Dir::Left)
        } else {
            Some(Dir::Right)
        }
    }

    pub(crate) fn search<C: Comparator<K>>(&self, cmp: &C, key: &K) -> Search {
        let mut cur = self.root;
        let mut at = None;
        while let Some(id) = cur {
            let n = &self.nodes[id];
            match cmp.compare(key, &n.key) {
                Ordering::Less => {
                    at = Some((id, Dir::Left));
                    cur = n.left;
                }
                Ordering::Greater => {
                    at = Some((id, Dir::Right));
                    cur = n.right;
                }
                Ordering::Equal => return Search::Found(id),
            }
        }
        Search::Vacant(at)
    }

    pub(crate) fn find<C: Comparator<K>>(&self, cmp: &C, key: &K) -> Option<NodeId> {
        match self.search(cmp, key) {
            Search::Found(id) => Some(id),
            Search::Vacant(_) => None,
        }
    }

    /// Nearest node on one side of `key`: the greatest key below it when
    /// `below`, else the least key above it. `inclusive` admits `key` itself.
    pub(crate) fn nearest<C: Comparator<K>>(&self, cmp: &C, key: &K, below: bool, inclusive: bool) -> Option<NodeId> {
        let mut cur = self.root;
        let mut best = None;
        while let Some(id) = cur {
            let n = &self.nodes[id];
            let ord = cmp.compare(key, &n.key);
            if ord == Ordering::Equal && inclusive {
                return Some(id);
            }
            if below {
                if ord == Ordering::Greater {
                    best = Some(id);
                    cur = n.right;
                } else {
                    cur = n.left;
                }
            } else if ord == Ordering::Less {
                best = Some(id);
                cur = n.left;
            } else {
                cur = n.right;
            }
        }
        best
    }

    /// Extreme node of the subtree at `id` in direction `dir`.
    pub(crate) fn extreme_from(&self, mut id: NodeId, dir: Dir) -> NodeId {
        while let Some(c) = self.child(id, dir) {
            id = c;
        }
        id
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        self.root.map(|r| self.extreme_from(r, Dir::Left))
    }

    pub(crate) fn last(&self) -> Option<NodeId> {
        self.root.map(|r| self.extreme_from(r, Dir::Right))
    }

    /// In-order neighbour: successor for `Dir::Right`, predecessor for `Dir::Left`.
    pub(crate) fn step(&self, id: NodeId, dir: Dir) -> Option<NodeId> {
        if let Some(c) = self.child(id, dir) {
            return Some(self.extreme_from(c, dir.opposite()));
        }
        let mut cur = id;
        let mut parent = self.parent(cur);
        while let Some(p) = parent {
            if self.child(p, dir) != Some(cur) {
                return Some(p);
            }
            cur = p;
            parent = self.parent(p);
        }
        None
    }

    #[inline]
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        self.step(id, Dir::Right)
    }

    #[inline]
    pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.step(id, Dir::Left)
    }

    /// Insert a fresh leaf at a position returned by [`search`](Self::search).
    pub(crate) fn attach(&mut self, at: Option<(NodeId, Dir)>, key: K, value: V, meta: M) -> NodeId {
        let id = self.nodes.insert(Node {
            key,
            value,
            left: None,
            right: None,
            parent: at.map(|(p, _)| p),
            meta,
        });
        match at {
            None => self.root = Some(id),
            Some((p, dir)) => *self.child_mut(p, dir) = Some(id),
        }
        self.mod_count.bump();
        id
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let n = &mut self.nodes[p];
                if n.left == Some(old) {
                    n.left = new;
                } else {
                    n.right = new;
                }
            }
        }
    }

    /// Rotate the subtree at `x` towards `dir`; the child on the opposite
    /// side becomes the subtree root and is returned. A missing child
    /// leaves the tree unchanged.
    pub(crate) fn rotate(&mut self, x: NodeId, dir: Dir) -> NodeId {
        let Some(y) = self.child(x, dir.opposite()) else {
            return x;
        };
        let inner = self.child(y, dir);
        *self.child_mut(x, dir.opposite()) = inner;
        if let Some(b) = inner {
            self.nodes[b].parent = Some(x);
        }
        let p = self.parent(x);
        self.nodes[y].parent = p;
        self.replace_child(p, x, Some(y));
        *self.child_mut(y, dir) = Some(x);
        self.nodes[x].parent = Some(y);
        y
    }

    /// Node that will physically leave the tree when `id` is removed. For
    /// a node with two children the payloads of `id` and its successor are
    /// swapped first, and the successor is returned.
    pub(crate) fn prepare_removal(&mut self, id: NodeId) -> NodeId {
        let n = &self.nodes[id];
        let (Some(_), Some(right)) = (n.left, n.right) else {
            return id;
        };
        let s = self.extreme_from(right, Dir::Left);
        if let Some([a, b]) = self.nodes.get_disjoint_mut([id, s]) {
            core::mem::swap(&mut a.key, &mut b.key);
            core::mem::swap(&mut a.value, &mut b.value);
        }
        s
    }

    /// Splice out `id`, which has at most one child, lifting that child
    /// into its place. The node stays in the arena until [`take`](Self::take).
    pub(crate) fn splice(&mut self, id: NodeId) -> Option<NodeId> {
        let n = &self.nodes[id];
        debug_assert!(n.left.is_none() || n.right.is_none());
        let child = n.left.or(n.right);
        let parent = n.parent;
        if let Some(c) = child {
            self.nodes[c].parent = parent;
        }
        self.replace_child(parent, id, child);
        let n = &mut self.nodes[id];
        n.left = None;
        n.right = None;
        n.parent = None;
        child
    }

    /// Drop a spliced node from the arena.
    pub(crate) fn take(&mut self, id: NodeId) -> Option<(K, V)> {
        let n = self.nodes.remove(id)?;
        self.mod_count.bump();
        Some((n.key, n.value))
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.mod_count.bump();
    }

    /// Longest root-to-leaf path, counted in nodes.
    pub(crate) fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let n = &self.nodes[id];
            stack.extend(n.left.map(|c| (c, depth + 1)));
            stack.extend(n.right.map(|c| (c, depth + 1)));
        }
        deepest
    }

    /// Parent links agree with child links and in-order keys strictly increase.
    #[cfg(test)]
    pub(crate) fn links_and_order_intact<C: Comparator<K>>(&self, cmp: &C) -> bool {
        if let Some(r) = self.root {
            if self.parent(r).is_some() {
                return false;
            }
        }
        for (id, n) in self.nodes.iter() {
            for c in [n.left, n.right].into_iter().flatten() {
                if self.parent(c) != Some(id) {
                    return false;
                }
            }
        }
        let mut count = 0;
        let mut cur = self.first();
        let mut prev: Option<NodeId> = None;
        while let Some(id) = cur {
            if let Some(p) = prev {
                if cmp.compare(&self.nodes[p].key, &self.nodes[id].key) != Ordering::Less {
                    return false;
                }
            }
            count += 1;
            prev = Some(id);
            cur = self.successor(id);
        }
        count == self.nodes.len()
    }
}

/// Bidirectional walk over an inclusive node interval.
#[derive(Clone, Copy, Debug)]
pub struct Walk {
    front: Option<NodeId>,
    back: Option<NodeId>,
}

impl Walk {
    pub(crate) const EMPTY: Walk = Walk {
        front: None,
        back: None,
    };

    /// Walk from `first` to `last` inclusive. Callers guarantee `first`
    /// does not come after `last`.
    pub(crate) fn between(first: Option<NodeId>, last: Option<NodeId>) -> Self {
        match (first, last) {
            (Some(_), Some(_)) => Walk {
                front: first,
                back: last,
            },
            _ => Self::EMPTY,
        }
    }

    pub(crate) fn next<K, V, M: Copy>(&mut self, tree: &RawTree<K, V, M>) -> Option<NodeId> {
        let id = self.front?;
        if self.front == self.back {
            *self = Self::EMPTY;
        } else {
            self.front = tree.successor(id);
        }
        Some(id)
    }

    pub(crate) fn next_back<K, V, M: Copy>(&mut self, tree: &RawTree<K, V, M>) -> Option<NodeId> {
        let id = self.back?;
        if self.front == self.back {
            *self = Self::EMPTY;
        } else {
            self.back = tree.predecessor(id);
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::NaturalOrder;

    fn insert(t: &mut RawTree<i32, i32, ()>, k: i32) -> NodeId {
        match t.search(&NaturalOrder, &k) {
            Search::Found(id) => id,
            Search::Vacant(at) => t.attach(at, k, k * 10, ()),
        }
    }

    fn keys(t: &RawTree<i32, i32, ()>) -> Vec<i32> {
        let mut out = Vec::new();
        let mut w = Walk::between(t.first(), t.last());
        while let Some(id) = w.next(t) {
            out.push(*t.entry(id).0);
        }
        out
    }

    #[test]
    fn navigation_on_unbalanced_tree() {
        let mut t = RawTree::default();
        for k in [50, 30, 70, 20, 40, 60, 80] {
            insert(&mut t, k);
        }
        let key = |id: Option<NodeId>| id.map(|id| *t.entry(id).0);
        assert_eq!(key(t.nearest(&NaturalOrder, &45, true, true)), Some(40));
        assert_eq!(key(t.nearest(&NaturalOrder, &40, true, false)), Some(30));
        assert_eq!(key(t.nearest(&NaturalOrder, &40, false, true)), Some(40));
        assert_eq!(key(t.nearest(&NaturalOrder, &40, false, false)), Some(50));
        assert_eq!(key(t.nearest(&NaturalOrder, &10, true, true)), None);
        assert_eq!(key(t.nearest(&NaturalOrder, &90, false, true)), None);
        assert_eq!(keys(&t), vec![20, 30, 40, 50, 60, 70, 80]);
        assert!(t.links_and_order_intact(&NaturalOrder));
    }

    #[test]
    fn rotation_keeps_order_and_links() {
        let mut t = RawTree::default();
        for k in [1, 2, 3] {
            insert(&mut t, k);
        }
        assert_eq!(t.height(), 3);
        let root = t.root().unwrap();
        let top = t.rotate(root, Dir::Left);
        assert_eq!(t.root(), Some(top));
        assert_eq!(*t.entry(top).0, 2);
        assert_eq!(t.height(), 2);
        assert!(t.links_and_order_intact(&NaturalOrder));
    }

    #[test]
    fn removal_with_two_children_takes_successor_node() {
        let mut t = RawTree::default();
        for k in [2, 1, 3] {
            insert(&mut t, k);
        }
        let root = t.root().unwrap();
        let victim = t.prepare_removal(root);
        assert_ne!(victim, root);
        assert_eq!(*t.entry(root).0, 3);
        t.splice(victim);
        assert_eq!(t.take(victim), Some((2, 20)));
        assert_eq!(keys(&t), vec![1, 3]);
        assert!(t.links_and_order_intact(&NaturalOrder));
    }

    #[test]
    fn walk_from_both_ends() {
        let mut t = RawTree::default();
        for k in [4, 2, 6, 1, 3, 5, 7] {
            insert(&mut t, k);
        }
        let mut w = Walk::between(t.first(), t.last());
        let mut got = Vec::new();
        loop {
            match (w.next(&t), w.next_back(&t)) {
                (Some(a), Some(b)) => got.extend([*t.entry(a).0, *t.entry(b).0]),
                (Some(a), None) => got.push(*t.entry(a).0),
                _ => break,
            }
        }
        assert_eq!(got, vec![1, 7, 2, 6, 3, 5, 4]);
    }
}
