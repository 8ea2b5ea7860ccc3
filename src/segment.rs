//! A segment: one immutable automaton plus its deleted keys.
//!
//! Segments are stacked in insertion order; a key deleted in a segment is
//! masked for that segment only, older copies stay visible to exact
//! lookup. Both halves sit behind `Arc`s, so cloning a segment is cheap
//! and snapshots share storage.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::fsa::Automaton;

/// One automaton with its deletion set.
pub struct Segment<F = Automaton> {
    fsa: Arc<F>,
    deleted: Arc<FxHashSet<Box<[u8]>>>,
}

impl<F> Segment<F> {
    pub fn new(fsa: Arc<F>) -> Self {
        Self {
            fsa,
            deleted: Arc::new(FxHashSet::default()),
        }
    }

    pub fn fsa(&self) -> &Arc<F> {
        &self.fsa
    }

    /// Whether `key` has been deleted in this segment.
    pub fn is_deleted(&self, key: &[u8]) -> bool {
        self.deleted.contains(key)
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// A copy of this segment with `keys` added to its deletion set. The
    /// automaton is shared; only the set is copied.
    pub fn with_deleted(&self, keys: impl IntoIterator<Item = Box<[u8]>>) -> Self {
        let mut deleted = (*self.deleted).clone();
        deleted.extend(keys);
        Self {
            fsa: self.fsa.clone(),
            deleted: Arc::new(deleted),
        }
    }
}

impl<F> Clone for Segment<F> {
    fn clone(&self) -> Self {
        Self {
            fsa: self.fsa.clone(),
            deleted: self.deleted.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> Segment {
        Segment::new(Arc::new(
            Automaton::from_pairs([("abc", "1"), ("abd", "2")]).expect("build failed"),
        ))
    }

    #[test]
    fn fresh_segment_has_no_deletions() {
        let segment = segment();
        assert!(!segment.is_deleted(b"abc"));
        assert_eq!(segment.deleted_count(), 0);
    }

    #[test]
    fn with_deleted_is_copy_on_write() {
        let original = segment();
        let masked = original.with_deleted([Box::from(&b"abc"[..])]);

        assert!(masked.is_deleted(b"abc"));
        assert!(!masked.is_deleted(b"abd"));
        assert!(!original.is_deleted(b"abc"));
        // the automaton is shared, not copied
        assert!(Arc::ptr_eq(original.fsa(), masked.fsa()));
    }
}
