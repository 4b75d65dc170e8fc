//! Mutation stamps for fail-fast cursors.
//!
//! Every engine owns a [`ModCount`] bumped on each structural change
//! (insert, remove, resize, rotation, reordering). A cursor records the
//! count it last observed in a [`Stamp`] and compares on every step. The
//! check is best-effort; it is not a synchronization mechanism.

use crate::error::MapError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ModCount(u64);

impl ModCount {
    #[inline]
    pub(crate) fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    #[inline]
    pub(crate) fn get(self) -> u64 {
        self.0
    }
}

/// Last mutation count a cursor has seen. Once a mismatch is observed
/// the stamp stays poisoned.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stamp {
    expected: u64,
    poisoned: bool,
}

impl Stamp {
    pub(crate) fn new(current: ModCount) -> Self {
        Self {
            expected: current.get(),
            poisoned: false,
        }
    }

    #[inline]
    pub(crate) fn check(&mut self, current: ModCount) -> Result<(), MapError> {
        if self.poisoned || self.expected != current.get() {
            self.poisoned = true;
            return Err(MapError::ConcurrentModification);
        }
        Ok(())
    }

    /// Adopt the count after a mutation performed through the cursor itself.
    #[inline]
    pub(crate) fn sync(&mut self, current: ModCount) {
        self.expected = current.get();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_poisons() {
        let mut count = ModCount::default();
        let mut stamp = Stamp::new(count);
        assert!(stamp.check(count).is_ok());
        count.bump();
        assert_eq!(stamp.check(count), Err(MapError::ConcurrentModification));
        stamp.sync(count);
        assert_eq!(stamp.check(count), Err(MapError::ConcurrentModification));
    }

    #[test]
    fn sync_follows_own_mutations() {
        let mut count = ModCount::default();
        let mut stamp = Stamp::new(count);
        count.bump();
        stamp.sync(count);
        assert!(stamp.check(count).is_ok());
    }
}
