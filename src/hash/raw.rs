//! RawTable: the slot array shared by both hash engines.
//!
//! Invariant: for every occupied slot, walking forward (with wraparound)
//! from its home slot `mix(hash) & mask` reaches it without crossing an
//! empty slot. Removal keeps this true by shifting later members of the
//! probe run backward into the hole; there are no tombstones.
//!
//! Each slot stores the strategy hash computed at insertion. Rehashing,
//! shifting and home-slot checks use the stored hash, so the strategy is
//! only consulted for the key being looked up.

use super::{
    capacity_overflow, max_fill, mix, slots_for_len, HashConfig, DEFAULT_INITIAL_CAPACITY,
    DEFAULT_LOAD_FACTOR,
};
use crate::error::MapError;
use crate::reentrancy::DebugReentrancy;
use crate::stamp::ModCount;
use crate::strategy::HashStrategy;

#[derive(Clone, Debug)]
pub(crate) struct Slot<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    hash: u64,
}

/// Outcome of probing for a key.
pub(crate) enum Probe {
    Found(usize),
    Vacant { pos: usize, hash: u64 },
}

#[derive(Clone)]
pub(crate) struct RawTable<K, V, S> {
    slots: Vec<Option<Slot<K, V>>>,
    mask: usize,
    len: usize,
    max_fill: usize,
    load_factor: f32,
    min_capacity: usize,
    strategy: S,
    mod_count: ModCount,
    reentrancy: DebugReentrancy,
}

fn empty_slots<K, V>(n: usize) -> Vec<Option<Slot<K, V>>> {
    std::iter::repeat_with(|| None).take(n).collect()
}

impl<K, V, S> RawTable<K, V, S>
where
    S: HashStrategy<K>,
{
    pub(crate) fn new(strategy: S) -> Self {
        Self::build(DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, strategy)
    }

    pub(crate) fn with_config(config: HashConfig, strategy: S) -> Result<Self, MapError> {
        let n = config.validate()?;
        Ok(Self::build(n, config.load_factor, strategy))
    }

    fn build(n: usize, load_factor: f32, strategy: S) -> Self {
        Self {
            slots: empty_slots(n),
            mask: n - 1,
            len: 0,
            max_fill: max_fill(n, load_factor),
            load_factor,
            min_capacity: n,
            strategy,
            mod_count: ModCount::default(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn load_factor(&self) -> f32 {
        self.load_factor
    }

    pub(crate) fn strategy(&self) -> &S {
        &self.strategy
    }

    #[inline]
    pub(crate) fn mod_count(&self) -> ModCount {
        self.mod_count
    }

    /// Record a structural change made by an upper layer (e.g. reordering).
    #[inline]
    pub(crate) fn touch(&mut self) {
        self.mod_count.bump();
    }

    #[inline]
    fn home(&self, hash: u64) -> usize {
        mix(hash) as usize & self.mask
    }

    pub(crate) fn find(&self, key: &K) -> Option<usize> {
        match self.probe(key) {
            Probe::Found(pos) => Some(pos),
            Probe::Vacant { .. } => None,
        }
    }

    /// Walk the probe run for `key` until it matches or an empty slot ends it.
    pub(crate) fn probe(&self, key: &K) -> Probe {
        let _g = self.reentrancy.enter();
        let hash = self.strategy.hash(key);
        let mut pos = self.home(hash);
        loop {
            match &self.slots[pos] {
                None => return Probe::Vacant { pos, hash },
                Some(s) if s.hash == hash && self.strategy.equals(&s.key, key) => {
                    return Probe::Found(pos)
                }
                Some(_) => pos = (pos + 1) & self.mask,
            }
        }
    }

    /// Fill a vacant slot returned by `probe`. The caller checks
    /// `needs_growth` afterwards.
    pub(crate) fn occupy(&mut self, pos: usize, hash: u64, key: K, value: V) {
        debug_assert!(self.slots[pos].is_none());
        self.slots[pos] = Some(Slot { key, value, hash });
        self.len += 1;
        self.mod_count.bump();
    }

    #[inline]
    pub(crate) fn needs_growth(&self) -> bool {
        self.len > self.max_fill
    }

    /// Slot count to grow to once `needs_growth` fires. Overflow is fatal.
    pub(crate) fn grown_capacity(&self) -> usize {
        match slots_for_len(self.len + 1, self.load_factor) {
            Ok(n) => n,
            Err(e) => capacity_overflow(e),
        }
    }

    pub(crate) fn should_shrink(&self) -> bool {
        let n = self.capacity();
        n > self.min_capacity && n > DEFAULT_INITIAL_CAPACITY && self.len < self.max_fill / 4
    }

    /// Slot count that would hold `expected` entries, if it differs from now.
    pub(crate) fn trimmed_capacity(&self, expected: usize) -> Result<Option<usize>, MapError> {
        let n = slots_for_len(expected.max(self.len), self.load_factor)?;
        if n >= self.capacity() || self.len > max_fill(n, self.load_factor) {
            return Ok(None);
        }
        Ok(Some(n))
    }

    /// Remove the entry at `pos`, then backward-shift the rest of its
    /// probe run. `on_move(from, to)` fires for every relocated slot, in
    /// shift order, before the next one moves.
    pub(crate) fn remove_at<F>(&mut self, pos: usize, mut on_move: F) -> Option<(K, V)>
    where
        F: FnMut(usize, usize),
    {
        let removed = self.slots[pos].take()?;
        self.len -= 1;
        self.mod_count.bump();
        self.shift_back(pos, &mut on_move);
        Some((removed.key, removed.value))
    }

    fn shift_back<F>(&mut self, mut gap: usize, on_move: &mut F)
    where
        F: FnMut(usize, usize),
    {
        loop {
            let mut pos = (gap + 1) & self.mask;
            loop {
                let home = match &self.slots[pos] {
                    None => return,
                    Some(s) => self.home(s.hash),
                };
                // The slot must stay put if its home lies cyclically in (gap, pos].
                let stays = if gap <= pos {
                    gap < home && home <= pos
                } else {
                    gap < home || home <= pos
                };
                if !stays {
                    break;
                }
                pos = (pos + 1) & self.mask;
            }
            self.slots[gap] = self.slots[pos].take();
            on_move(pos, gap);
            gap = pos;
        }
    }

    /// Swap in an empty array of `n` slots and hand back the old one. The
    /// caller reinserts every entry with `place`, in whatever order it needs.
    pub(crate) fn begin_rehash(&mut self, n: usize) -> Vec<Option<Slot<K, V>>> {
        #[cfg(feature = "tracing")]
        tracing::debug!(from = self.capacity(), to = n, len = self.len, "rehash");
        let old = std::mem::replace(&mut self.slots, empty_slots(n));
        self.mask = n - 1;
        self.max_fill = max_fill(n, self.load_factor);
        self.len = 0;
        self.mod_count.bump();
        old
    }

    /// Reinsert a slot known to be absent from the table, returning its new position.
    pub(crate) fn place(&mut self, slot: Slot<K, V>) -> usize {
        let mut pos = self.home(slot.hash);
        while self.slots[pos].is_some() {
            pos = (pos + 1) & self.mask;
        }
        self.slots[pos] = Some(slot);
        self.len += 1;
        pos
    }

    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.len = 0;
        self.mod_count.bump();
    }

    #[inline]
    pub(crate) fn entry(&self, pos: usize) -> Option<(&K, &V)> {
        self.slots
            .get(pos)
            .and_then(|s| s.as_ref())
            .map(|s| (&s.key, &s.value))
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, pos: usize) -> Option<(&K, &mut V)> {
        self.slots
            .get_mut(pos)
            .and_then(|s| s.as_mut())
            .map(|s| (&s.key, &mut s.value))
    }

    pub(crate) fn slots(&self) -> &[Option<Slot<K, V>>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Slot<K, V>>] {
        &mut self.slots
    }

    /// Every occupied slot is reachable from its home without crossing an
    /// empty slot, and `len` matches occupancy.
    #[cfg(test)]
    pub(crate) fn probe_chains_intact(&self) -> bool {
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        if occupied != self.len || self.len > self.max_fill {
            return false;
        }
        self.slots.iter().enumerate().all(|(pos, s)| match s {
            None => true,
            Some(s) => {
                let mut p = self.home(s.hash);
                while p != pos {
                    if self.slots[p].is_none() {
                        return false;
                    }
                    p = (p + 1) & self.mask;
                }
                true
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::FnStrategy;

    // Tests lay out probe runs by searching for keys with a given home slot.
    fn table(n: usize) -> RawTable<u64, u64, impl HashStrategy<u64>> {
        RawTable::with_config(
            HashConfig::new().initial_capacity(n).load_factor(1.0),
            FnStrategy::new(|k: &u64| *k, |a: &u64, b: &u64| a == b),
        )
        .unwrap()
    }

    fn insert<S: HashStrategy<u64>>(t: &mut RawTable<u64, u64, S>, k: u64) {
        if let Probe::Vacant { pos, hash } = t.probe(&k) {
            t.occupy(pos, hash, k, k * 10);
        }
    }

    fn keys_with_home<S: HashStrategy<u64>>(t: &RawTable<u64, u64, S>, home: usize, n: usize) -> Vec<u64> {
        (0u64..)
            .filter(|k| t.home(*k) == home)
            .take(n)
            .collect()
    }

    #[test]
    fn removal_shifts_run_back_and_reports_moves() {
        let mut t = table(8);
        let run = keys_with_home(&t, 3, 3);
        for &k in &run {
            insert(&mut t, k);
        }
        let mut moves = Vec::new();
        let pos = t.find(&run[0]).unwrap();
        assert_eq!(pos, 3);
        let (k, v) = t.remove_at(pos, |from, to| moves.push((from, to))).unwrap();
        assert_eq!((k, v), (run[0], run[0] * 10));
        assert_eq!(moves, vec![(4, 3), (5, 4)]);
        assert_eq!(t.find(&run[1]), Some(3));
        assert_eq!(t.find(&run[2]), Some(4));
        assert!(t.probe_chains_intact());
    }

    #[test]
    fn removal_leaves_slots_at_home_in_place() {
        let mut t = table(8);
        let a = keys_with_home(&t, 2, 2);
        let b = keys_with_home(&t, 4, 1)[0];
        insert(&mut t, a[0]); // 2
        insert(&mut t, a[1]); // 3
        insert(&mut t, b); // 4, at home
        let mut moves = Vec::new();
        t.remove_at(2, |from, to| moves.push((from, to)));
        assert_eq!(moves, vec![(3, 2)]);
        assert_eq!(t.find(&b), Some(4));
        assert!(t.probe_chains_intact());
    }

    #[test]
    fn removal_shifts_across_wraparound() {
        let mut t = table(8);
        let run = keys_with_home(&t, 7, 3);
        for &k in &run {
            insert(&mut t, k);
        }
        // Run occupies 7, 0, 1.
        assert_eq!(t.find(&run[2]), Some(1));
        let mut moves = Vec::new();
        t.remove_at(7, |from, to| moves.push((from, to)));
        assert_eq!(moves, vec![(0, 7), (1, 0)]);
        assert!(t.probe_chains_intact());
        assert_eq!(t.find(&run[1]), Some(7));
    }

    #[test]
    fn rehash_places_everything() {
        let mut t = table(4);
        for k in 0..3 {
            insert(&mut t, k);
        }
        let old = t.begin_rehash(16);
        for s in old.into_iter().flatten() {
            t.place(s);
        }
        assert_eq!(t.len(), 3);
        assert_eq!(t.capacity(), 16);
        for k in 0..3 {
            assert!(t.find(&k).is_some());
        }
        assert!(t.probe_chains_intact());
    }
}
