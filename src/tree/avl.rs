//! AVL rebalancing. Node metadata is the subtree height (a leaf is 1).
//!
//! After an insert or a splice, every node on the path back to the root
//! gets its height recomputed; a node whose children differ in height by
//! two is fixed with a single or double rotation chosen by the sign of
//! the heavier child's own imbalance.

use super::raw::{Dir, NodeId, RawTree};
use super::sealed::Rebalance;
use super::Balance;

/// Height-balanced policy: `|height(left) - height(right)| <= 1` everywhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Avl;

impl Balance for Avl {}

fn height<K, V>(t: &RawTree<K, V, u32>, id: Option<NodeId>) -> u32 {
    id.map_or(0, |id| t.meta(id))
}

fn update<K, V>(t: &mut RawTree<K, V, u32>, id: NodeId) {
    let h = 1 + height(t, t.child(id, Dir::Left)).max(height(t, t.child(id, Dir::Right)));
    t.set_meta(id, h);
}

fn balance_factor<K, V>(t: &RawTree<K, V, u32>, id: NodeId) -> i64 {
    height(t, t.child(id, Dir::Left)) as i64 - height(t, t.child(id, Dir::Right)) as i64
}

/// Rotate towards `dir` and refresh both heights that changed.
fn rotate<K, V>(t: &mut RawTree<K, V, u32>, id: NodeId, dir: Dir) -> NodeId {
    let top = t.rotate(id, dir);
    update(t, id);
    update(t, top);
    top
}

/// Restore balance at `id`; returns the root of the (possibly rotated) subtree.
fn fix<K, V>(t: &mut RawTree<K, V, u32>, id: NodeId) -> NodeId {
    update(t, id);
    let bf = balance_factor(t, id);
    if bf > 1 {
        if let Some(l) = t.child(id, Dir::Left) {
            if balance_factor(t, l) < 0 {
                rotate(t, l, Dir::Left);
            }
        }
        rotate(t, id, Dir::Right)
    } else if bf < -1 {
        if let Some(r) = t.child(id, Dir::Right) {
            if balance_factor(t, r) > 0 {
                rotate(t, r, Dir::Right);
            }
        }
        rotate(t, id, Dir::Left)
    } else {
        id
    }
}

fn retrace<K, V>(t: &mut RawTree<K, V, u32>, mut cur: Option<NodeId>) {
    while let Some(id) = cur {
        let top = fix(t, id);
        cur = t.parent(top);
    }
}

impl Rebalance for Avl {
    type Meta = u32;

    fn leaf() -> u32 {
        1
    }

    fn after_insert<K, V>(t: &mut RawTree<K, V, u32>, id: NodeId) {
        let parent = t.parent(id);
        retrace(t, parent);
    }

    fn unlink<K, V>(t: &mut RawTree<K, V, u32>, id: NodeId) {
        let parent = t.parent(id);
        t.splice(id);
        retrace(t, parent);
    }

    #[cfg(test)]
    fn check<K, V>(t: &RawTree<K, V, u32>) -> bool {
        fn walk<K, V>(t: &RawTree<K, V, u32>, id: Option<NodeId>) -> Option<u32> {
            let Some(id) = id else {
                return Some(0);
            };
            let l = walk(t, t.child(id, Dir::Left))?;
            let r = walk(t, t.child(id, Dir::Right))?;
            let h = 1 + l.max(r);
            (l.abs_diff(r) <= 1 && t.meta(id) == h).then_some(h)
        }
        walk(t, t.root()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapCore;
    use crate::tree::AvlTreeMap;

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut m: AvlTreeMap<i32, i32> = AvlTreeMap::new();
        for k in 1..=7 {
            m.insert(k, k);
        }
        assert_eq!(m.height(), 3);
        assert!(Avl::check(&m.tree));
    }

    #[test]
    fn double_rotation_cases() {
        // Left-right then right-left shapes.
        let mut m: AvlTreeMap<i32, i32> = AvlTreeMap::new();
        for k in [30, 10, 20] {
            m.insert(k, k);
        }
        assert_eq!(m.height(), 2);
        assert_eq!(m.tree.root().map(|r| *m.tree.entry(r).0), Some(20));
        let mut m: AvlTreeMap<i32, i32> = AvlTreeMap::new();
        for k in [10, 30, 20] {
            m.insert(k, k);
        }
        assert_eq!(m.tree.root().map(|r| *m.tree.entry(r).0), Some(20));
    }

    #[test]
    fn removals_rebalance_to_root() {
        let mut m: AvlTreeMap<i32, i32> = AvlTreeMap::new();
        for k in 0..64 {
            m.insert(k, k);
        }
        for k in (0..64).filter(|k| k % 3 != 0) {
            assert_eq!(m.remove_entry(&k), Some((k, k)));
            assert!(Avl::check(&m.tree));
        }
        assert_eq!(m.len(), 22);
        assert!(m.height() <= 6);
    }
}
