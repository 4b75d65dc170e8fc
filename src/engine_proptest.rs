#![cfg(test)]

// Property tests kept inside the crate so they can check structural
// invariants (probe runs, link chains, tree balance) that the public API
// does not expose.

use crate::hash::{HashConfig, LinkedHashMap, OpenHashMap};
use crate::map::MapCore;
use crate::strategy::{DefaultStrategy, HashStrategy};
use crate::tree::{bound, Avl, Balance, RedBlack, TreeMap};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hasher;

// Small key space so removals hit present keys and runs collide.
#[derive(Clone, Debug)]
enum HashOp {
    Put(u16, i32),
    Remove(u16),
    Get(u16),
    AddTo(u16, i32),
    ShrinkToFit,
    Iterate,
}

fn arb_hash_ops() -> impl Strategy<Value = Vec<HashOp>> {
    let key = 0u16..48;
    let op = prop_oneof![
        4 => (key.clone(), -1_000_000i32..1_000_000).prop_map(|(k, v)| HashOp::Put(k, v)),
        3 => key.clone().prop_map(HashOp::Remove),
        2 => key.clone().prop_map(HashOp::Get),
        1 => (key, -100i32..100).prop_map(|(k, d)| HashOp::AddTo(k, d)),
        1 => Just(HashOp::ShrinkToFit),
        1 => Just(HashOp::Iterate),
    ];
    proptest::collection::vec(op, 1..200)
}

fn run_open<S: HashStrategy<u16>>(mut sut: OpenHashMap<u16, i32, S>, ops: Vec<HashOp>) -> Result<(), TestCaseError> {
    let mut model: HashMap<u16, i32> = HashMap::new();
    for op in ops {
        match op {
            HashOp::Put(k, v) => {
                prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
            }
            HashOp::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.remove(&k).unwrap_or(-1));
            }
            HashOp::Get(k) => {
                prop_assert_eq!(sut.get(&k), model.get(&k).copied().unwrap_or(-1));
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            HashOp::AddTo(k, d) => {
                let before = *model.get(&k).unwrap_or(&-1);
                model.insert(k, before + d);
                prop_assert_eq!(sut.add_to(k, d), before);
            }
            HashOp::ShrinkToFit => sut.shrink_to_fit(),
            HashOp::Iterate => {
                let mut got: Vec<(u16, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                let mut want: Vec<(u16, i32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
                got.sort_unstable();
                want.sort_unstable();
                prop_assert_eq!(got, want);
            }
        }
        prop_assert!(sut.probe_chains_intact(), "probe run broken after {:?}", sut);
        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.capacity().is_power_of_two());
    }
    Ok(())
}

// Constant hasher: every key shares one home slot.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl std::hash::BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: OpenHashMap agrees with std's HashMap and every occupied slot
// stays reachable from its home slot after every operation, across
// growth, automatic shrink and explicit trimming.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_open_state_machine(ops in arb_hash_ops()) {
        let sut = OpenHashMap::with_capacity(2).unwrap().with_default_return_value(-1);
        run_open(sut, ops)?;
    }

    #[test]
    fn prop_open_state_machine_with_collisions(ops in arb_hash_ops()) {
        let sut = OpenHashMap::with_config(
            HashConfig::new().initial_capacity(4).load_factor(0.9),
            DefaultStrategy::with_hasher(ConstBuildHasher),
        )
        .unwrap()
        .with_default_return_value(-1);
        run_open(sut, ops)?;
    }
}

#[derive(Clone, Debug)]
enum LinkedOp {
    Put(u16, i32),
    PutFirst(u16, i32),
    Remove(u16),
    MoveFirst(u16),
    MoveLast(u16),
    GetLast(u16),
    PopFirst,
    PopLast,
}

fn arb_linked_ops() -> impl Strategy<Value = Vec<LinkedOp>> {
    let key = 0u16..32;
    let op = prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| LinkedOp::Put(k, v)),
        2 => (key.clone(), any::<i32>()).prop_map(|(k, v)| LinkedOp::PutFirst(k, v)),
        3 => key.clone().prop_map(LinkedOp::Remove),
        1 => key.clone().prop_map(LinkedOp::MoveFirst),
        1 => key.clone().prop_map(LinkedOp::MoveLast),
        1 => key.prop_map(LinkedOp::GetLast),
        1 => Just(LinkedOp::PopFirst),
        1 => Just(LinkedOp::PopLast),
    ];
    proptest::collection::vec(op, 1..200)
}

fn model_move(model: &mut Vec<(u16, i32)>, k: u16, first: bool) -> bool {
    let Some(i) = model.iter().position(|(mk, _)| *mk == k) else {
        return false;
    };
    let e = model.remove(i);
    if first {
        model.insert(0, e);
    } else {
        model.push(e);
    }
    true
}

fn run_linked<S: HashStrategy<u16>>(mut sut: LinkedHashMap<u16, i32, S>, ops: Vec<LinkedOp>) -> Result<(), TestCaseError> {
    // Model: entries in traversal order.
    let mut model: Vec<(u16, i32)> = Vec::new();
    for op in ops {
        match op {
            LinkedOp::Put(k, v) => {
                let prev = match model.iter_mut().find(|(mk, _)| *mk == k) {
                    Some(e) => Some(std::mem::replace(&mut e.1, v)),
                    None => {
                        model.push((k, v));
                        None
                    }
                };
                prop_assert_eq!(sut.insert(k, v), prev);
            }
            LinkedOp::PutFirst(k, v) => {
                let prev = match model.iter().position(|(mk, _)| *mk == k) {
                    Some(i) => Some(model.remove(i).1),
                    None => None,
                };
                model.insert(0, (k, v));
                prop_assert_eq!(sut.put_and_move_to_first(k, v), prev.unwrap_or(0));
            }
            LinkedOp::Remove(k) => {
                let want = model.iter().position(|(mk, _)| *mk == k).map(|i| model.remove(i));
                prop_assert_eq!(sut.remove_entry(&k), want);
            }
            LinkedOp::MoveFirst(k) => {
                prop_assert_eq!(sut.move_to_first(&k), model_move(&mut model, k, true));
            }
            LinkedOp::MoveLast(k) => {
                prop_assert_eq!(sut.move_to_last(&k), model_move(&mut model, k, false));
            }
            LinkedOp::GetLast(k) => {
                let want = model.iter().find(|(mk, _)| *mk == k).map_or(0, |e| e.1);
                model_move(&mut model, k, false);
                prop_assert_eq!(sut.get_and_move_to_last(&k), want);
            }
            LinkedOp::PopFirst => {
                let want = (!model.is_empty()).then(|| model.remove(0));
                prop_assert_eq!(sut.pop_first(), want);
            }
            LinkedOp::PopLast => {
                prop_assert_eq!(sut.pop_last(), model.pop());
            }
        }
        prop_assert!(sut.structure_intact(), "link chain broken after {:?}", sut);
        let order: Vec<(u16, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&order, &model);
        let back: Vec<(u16, i32)> = sut.iter().rev().map(|(k, v)| (*k, *v)).collect();
        prop_assert!(back.iter().eq(model.iter().rev()));
    }
    Ok(())
}

// Property: LinkedHashMap iterates exactly like a Vec model of the
// traversal order, forwards and backwards, and its link chain stays a
// single acyclic chain over occupied slots through backward shifts and
// rehashes.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_linked_state_machine(ops in arb_linked_ops()) {
        run_linked(LinkedHashMap::with_capacity(2).unwrap(), ops)?;
    }

    #[test]
    fn prop_linked_state_machine_with_collisions(ops in arb_linked_ops()) {
        let sut = LinkedHashMap::with_config(
            HashConfig::new().initial_capacity(4).load_factor(1.0),
            DefaultStrategy::with_hasher(ConstBuildHasher),
        )
        .unwrap();
        run_linked(sut, ops)?;
    }
}

#[derive(Clone, Debug)]
enum TreeOp {
    Put(i16, i32),
    Remove(i16),
    PopFirst,
    PopLast,
    Navigate(i16),
    CursorSweep(i16),
    Window {
        a: i16,
        b: i16,
        lo_inclusive: bool,
        hi_inclusive: bool,
        descending: bool,
        at: i16,
    },
}

fn arb_tree_ops() -> impl Strategy<Value = Vec<TreeOp>> {
    let key = -64i16..64;
    let op = prop_oneof![
        5 => (key.clone(), any::<i32>()).prop_map(|(k, v)| TreeOp::Put(k, v)),
        3 => key.clone().prop_map(TreeOp::Remove),
        1 => Just(TreeOp::PopFirst),
        1 => Just(TreeOp::PopLast),
        2 => key.clone().prop_map(TreeOp::Navigate),
        1 => key.clone().prop_map(TreeOp::CursorSweep),
        2 => (key.clone(), key, any::<bool>(), any::<bool>(), any::<bool>(), -72i16..72).prop_map(
            |(a, b, lo_inclusive, hi_inclusive, descending, at)| TreeOp::Window {
                a,
                b,
                lo_inclusive,
                hi_inclusive,
                descending,
                at,
            }
        ),
    ];
    proptest::collection::vec(op, 1..200)
}

fn run_tree<B: Balance>(ops: Vec<TreeOp>) -> Result<(), TestCaseError> {
    let mut sut: TreeMap<i16, i32, _, B> = TreeMap::new();
    sut.set_navigation_defaults(i16::MIN, i16::MAX);
    let mut model: BTreeMap<i16, i32> = BTreeMap::new();
    for op in ops {
        match op {
            TreeOp::Put(k, v) => {
                prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
            }
            TreeOp::Remove(k) => {
                prop_assert_eq!(sut.remove_entry(&k), model.remove_entry(&k));
            }
            TreeOp::PopFirst => {
                prop_assert_eq!(sut.pop_first(), model.pop_first());
            }
            TreeOp::PopLast => {
                prop_assert_eq!(sut.pop_last(), model.pop_last());
            }
            TreeOp::Navigate(k) => {
                prop_assert_eq!(sut.floor_key(&k), model.range(..=k).next_back().map(|(k, _)| k));
                prop_assert_eq!(sut.lower_key(&k), model.range(..k).next_back().map(|(k, _)| k));
                prop_assert_eq!(sut.ceiling_key(&k), model.range(k..).next().map(|(k, _)| k));
                prop_assert_eq!(
                    sut.higher_key(&k),
                    model.range((std::ops::Bound::Excluded(k), std::ops::Bound::Unbounded)).next().map(|(k, _)| k)
                );
                let hi = k.saturating_add(20);
                let got: Vec<i16> = sut.range(k..hi).map(|(k, _)| *k).collect();
                let want: Vec<i16> = model.range(k..hi).map(|(k, _)| *k).collect();
                prop_assert_eq!(got, want);
            }
            TreeOp::Window {
                a,
                b,
                lo_inclusive,
                hi_inclusive,
                descending,
                at,
            } => {
                let (lo, hi) = (a.min(b), a.max(b));
                let view = sut.sub_map(lo, lo_inclusive, hi, hi_inclusive).unwrap();
                let view = if descending { view.descending_map() } else { view };
                // Keys of the window in view order, and the sentinels that
                // answer misses before and after them.
                let mut seq: Vec<i16> = if lo == hi && !lo_inclusive && !hi_inclusive {
                    Vec::new()
                } else {
                    model
                        .range((bound(lo, lo_inclusive), bound(hi, hi_inclusive)))
                        .map(|(k, _)| *k)
                        .collect()
                };
                let (before, after) = if descending {
                    seq.reverse();
                    (i16::MAX, i16::MIN)
                } else {
                    (i16::MIN, i16::MAX)
                };
                let rank = |x: i16| if descending { -i32::from(x) } else { i32::from(x) };
                let p = rank(at);

                prop_assert!(view.keys().copied().eq(seq.iter().copied()));
                prop_assert_eq!(view.len(), seq.len());
                prop_assert_eq!(view.first_key().copied(), seq.first().copied());
                prop_assert_eq!(view.last_key().copied(), seq.last().copied());

                let floor = seq.iter().rev().find(|&&x| rank(x) <= p).copied();
                let lower = seq.iter().rev().find(|&&x| rank(x) < p).copied();
                let ceiling = seq.iter().find(|&&x| rank(x) >= p).copied();
                let higher = seq.iter().find(|&&x| rank(x) > p).copied();
                prop_assert_eq!(view.floor_key(&at).copied(), floor);
                prop_assert_eq!(view.lower_key(&at).copied(), lower);
                prop_assert_eq!(view.ceiling_key(&at).copied(), ceiling);
                prop_assert_eq!(view.higher_key(&at).copied(), higher);
                prop_assert_eq!(view.floor_or_default(&at).copied(), Some(floor.unwrap_or(before)));
                prop_assert_eq!(view.lower_or_default(&at).copied(), Some(lower.unwrap_or(before)));
                prop_assert_eq!(view.ceiling_or_default(&at).copied(), Some(ceiling.unwrap_or(after)));
                prop_assert_eq!(view.higher_or_default(&at).copied(), Some(higher.unwrap_or(after)));
            }
            TreeOp::CursorSweep(below) => {
                // Remove every key under `below` through a cursor.
                let mut cur = sut.cursor();
                while let Some((k, _)) = cur.next(&sut).unwrap() {
                    if *k < below {
                        let (k, v) = cur.remove(&mut sut).unwrap();
                        prop_assert_eq!(model.remove(&k), Some(v));
                    }
                }
            }
        }
        prop_assert!(sut.structure_intact(), "tree invariants broken after {:?}", sut);
        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.iter().map(|(k, v)| (*k, *v)).eq(model.iter().map(|(k, v)| (*k, *v))));
    }
    Ok(())
}

// Property: both balance policies agree with BTreeMap on contents,
// iteration order and navigation (whole map and random windows in
// either direction, sentinels included), and keep their own invariants (AVL
// height balance, red-black coloring) after every operation.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_avl_state_machine(ops in arb_tree_ops()) {
        run_tree::<Avl>(ops)?;
    }

    #[test]
    fn prop_red_black_state_machine(ops in arb_tree_ops()) {
        run_tree::<RedBlack>(ops)?;
    }
}
