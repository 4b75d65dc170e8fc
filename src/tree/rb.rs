//! Red-black rebalancing. Node metadata is the color; absent children
//! count as black.
//!
//! Insertion recolors and rotates upward from the new red leaf. Deletion
//! runs the sibling case analysis on the node being spliced out; a black
//! leaf is fixed up while still attached, so the walk can start from its
//! own position, and only then detached.

use super::raw::{Dir, NodeId, RawTree};
use super::sealed::Rebalance;
use super::Balance;

/// Red-black policy: no red node has a red child, every root-to-leaf path
/// crosses the same number of black nodes, and the root is black.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedBlack;

impl Balance for RedBlack {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

type Tree<K, V> = RawTree<K, V, Color>;

fn color<K, V>(t: &Tree<K, V>, id: Option<NodeId>) -> Color {
    id.map_or(Color::Black, |id| t.meta(id))
}

fn paint<K, V>(t: &mut Tree<K, V>, id: Option<NodeId>, c: Color) {
    if let Some(id) = id {
        t.set_meta(id, c);
    }
}

fn child<K, V>(t: &Tree<K, V>, id: Option<NodeId>, dir: Dir) -> Option<NodeId> {
    id.and_then(|id| t.child(id, dir))
}

fn rotate<K, V>(t: &mut Tree<K, V>, id: Option<NodeId>, dir: Dir) {
    if let Some(id) = id {
        t.rotate(id, dir);
    }
}

fn fix_after_insert<K, V>(t: &mut Tree<K, V>, mut x: NodeId) {
    while let Some(p) = t.parent(x) {
        if t.meta(p) != Color::Red {
            break;
        }
        let (Some(g), Some(dir)) = (t.parent(p), t.side(p)) else {
            break;
        };
        let uncle = t.child(g, dir.opposite());
        if color(t, uncle) == Color::Red {
            paint(t, Some(p), Color::Black);
            paint(t, uncle, Color::Black);
            paint(t, Some(g), Color::Red);
            x = g;
        } else {
            if t.side(x) == Some(dir.opposite()) {
                x = p;
                t.rotate(x, dir);
            }
            let px = t.parent(x);
            paint(t, px, Color::Black);
            paint(t, Some(g), Color::Red);
            t.rotate(g, dir.opposite());
        }
    }
    let root = t.root();
    paint(t, root, Color::Black);
}

fn fix_after_delete<K, V>(t: &mut Tree<K, V>, mut x: NodeId) {
    while Some(x) != t.root() && t.meta(x) == Color::Black {
        let (Some(p), Some(dir)) = (t.parent(x), t.side(x)) else {
            break;
        };
        let far = dir.opposite();
        let mut sib = t.child(p, far);
        if color(t, sib) == Color::Red {
            paint(t, sib, Color::Black);
            paint(t, Some(p), Color::Red);
            t.rotate(p, dir);
            sib = t.child(p, far);
        }
        if color(t, child(t, sib, dir)) == Color::Black && color(t, child(t, sib, far)) == Color::Black {
            paint(t, sib, Color::Red);
            x = p;
        } else {
            if color(t, child(t, sib, far)) == Color::Black {
                let near_nephew = child(t, sib, dir);
                paint(t, near_nephew, Color::Black);
                paint(t, sib, Color::Red);
                rotate(t, sib, far);
                sib = t.child(p, far);
            }
            let pc = t.meta(p);
            paint(t, sib, pc);
            paint(t, Some(p), Color::Black);
            let far_nephew = child(t, sib, far);
            paint(t, far_nephew, Color::Black);
            t.rotate(p, dir);
            match t.root() {
                Some(r) => x = r,
                None => break,
            }
        }
    }
    paint(t, Some(x), Color::Black);
}

impl Rebalance for RedBlack {
    type Meta = Color;

    fn leaf() -> Color {
        Color::Red
    }

    fn after_insert<K, V>(t: &mut Tree<K, V>, id: NodeId) {
        fix_after_insert(t, id);
    }

    fn unlink<K, V>(t: &mut Tree<K, V>, id: NodeId) {
        let was_black = t.meta(id) == Color::Black;
        let has_child = t.child(id, Dir::Left).is_some() || t.child(id, Dir::Right).is_some();
        if has_child {
            let replacement = t.splice(id);
            if let (true, Some(r)) = (was_black, replacement) {
                fix_after_delete(t, r);
            }
        } else {
            if was_black && t.parent(id).is_some() {
                fix_after_delete(t, id);
            }
            t.splice(id);
        }
    }

    #[cfg(test)]
    fn check<K, V>(t: &Tree<K, V>) -> bool {
        /// Black height of the subtree, or `None` on a violation.
        fn walk<K, V>(t: &Tree<K, V>, id: Option<NodeId>) -> Option<usize> {
            let Some(id) = id else {
                return Some(1);
            };
            let c = t.meta(id);
            let l = t.child(id, Dir::Left);
            let r = t.child(id, Dir::Right);
            if c == Color::Red && (color(t, l) == Color::Red || color(t, r) == Color::Red) {
                return None;
            }
            let bl = walk(t, l)?;
            let br = walk(t, r)?;
            (bl == br).then_some(bl + usize::from(c == Color::Black))
        }
        color(t, t.root()) == Color::Black && walk(t, t.root()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapCore;
    use crate::tree::RbTreeMap;

    #[test]
    fn insert_fixup_recolors_and_rotates() {
        let mut m: RbTreeMap<i32, i32> = RbTreeMap::new();
        for k in 1..=100 {
            m.insert(k, k);
            assert!(RedBlack::check(&m.tree));
        }
        assert!(m.height() <= 2 * 7);
    }

    #[test]
    fn delete_fixup_covers_black_leaves() {
        let mut m: RbTreeMap<i32, i32> = RbTreeMap::new();
        for k in [8, 4, 12, 2, 6, 10, 14, 1, 3, 5, 7, 9, 11, 13, 15] {
            m.insert(k, k);
        }
        for k in [1, 3, 2, 8, 15, 14, 4, 12, 6] {
            assert_eq!(m.remove_entry(&k), Some((k, k)));
            assert!(RedBlack::check(&m.tree), "after removing {k}");
        }
        let left: Vec<i32> = m.keys().copied().collect();
        assert_eq!(left, vec![5, 7, 9, 10, 11, 13]);
    }

    #[test]
    fn removing_everything_empties_the_tree() {
        let mut m: RbTreeMap<u32, ()> = RbTreeMap::new();
        for k in 0..50 {
            m.insert(k * 7 % 50, ());
        }
        for k in 0..50 {
            m.remove_entry(&k);
            assert!(RedBlack::check(&m.tree));
        }
        assert!(m.is_empty());
        assert_eq!(m.tree.root(), None);
    }
}
