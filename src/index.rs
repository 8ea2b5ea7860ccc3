//! Read-mostly index over a stack of segments.
//!
//! The segment list is published through an `ArcSwap`: readers and
//! matchers grab the current snapshot and keep working against it while
//! writers install a new list. Mutators serialize on a mutex, clone the
//! list, and swap it in whole, so a reader never observes a half-updated
//! stack. Newer segments mask older ones, both for values and for
//! deletions.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::fsa::{Automaton, Fsa};
use crate::matching::{FuzzyMatches, FuzzyMatching, Match, NearMatches, NearMatching};
use crate::segment::Segment;
use crate::DictError;

/// An embedded key/value dictionary over stacked FSA segments.
///
/// ```
/// use fsadict::Index;
///
/// let index = Index::new();
/// index.add_segment([("abc", "{a:1}"), ("abbc", "{b:2}")]).unwrap();
/// assert!(index.contains(b"abc"));
/// assert_eq!(index.get(b"abbc").value(), b"{b:2}");
/// ```
pub struct Index {
    segments: ArcSwap<Vec<Segment>>,
    write_lock: Mutex<()>,
}

impl Index {
    pub fn new() -> Self {
        Self {
            segments: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Compile `pairs` into a new automaton and append it as the newest
    /// segment. In-flight matchers keep their previous snapshot.
    pub fn add_segment<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<(), DictError>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let automaton = Automaton::from_pairs(pairs)?;
        let _guard = self.write_lock.lock();
        let mut segments = (**self.segments.load()).clone();
        segments.push(Segment::new(Arc::new(automaton)));
        self.segments.store(Arc::new(segments));
        Ok(())
    }

    /// Mark `keys` deleted in the segment at `segment` (0 = oldest).
    pub fn mark_deleted<K: AsRef<[u8]>>(
        &self,
        segment: usize,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<(), DictError> {
        let _guard = self.write_lock.lock();
        let mut segments = (**self.segments.load()).clone();
        let Some(slot) = segments.get_mut(segment) else {
            return Err(DictError::NoSuchSegment(segment));
        };
        *slot = slot.with_deleted(keys.into_iter().map(|key| Box::from(key.as_ref())));
        self.segments.store(Arc::new(segments));
        Ok(())
    }

    pub fn segment_count(&self) -> usize {
        self.segments.load().len()
    }

    /// Total keys across segments; duplicates masked by newer segments
    /// still count once per segment.
    pub fn key_count(&self) -> usize {
        self.segments.load().iter().map(|s| s.fsa().len()).sum()
    }

    /// Exact lookup, newest segment first. A key deleted in a newer
    /// segment falls back to older segments; returns the empty match when
    /// nothing is found.
    pub fn get(&self, key: &[u8]) -> Match {
        if key.is_empty() {
            return Match::empty();
        }
        let segments = self.segments.load();
        for segment in segments.iter().rev() {
            let fsa = segment.fsa();
            let state = fsa.walk(fsa.start_state(), key);
            if !state.is_none() && fsa.is_final(state) && !segment.is_deleted(key) {
                return Match::new(key.to_vec(), 0, fsa.clone(), state);
            }
        }
        Match::empty()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        !self.get(key).is_empty()
    }

    /// Keys within `max_edit_distance` of `query`, constrained to the
    /// exact prefix.
    pub fn fuzzy(
        &self,
        query: &[u8],
        max_edit_distance: usize,
        minimum_exact_prefix: usize,
    ) -> FuzzyMatches {
        let segments = self.segments.load_full();
        FuzzyMatching::from_segments(&segments, query, max_edit_distance, minimum_exact_prefix)
    }

    /// Keys sharing the exact prefix, by shared-continuation depth.
    pub fn near(&self, query: &[u8], minimum_exact_prefix: usize, greedy: bool) -> NearMatches {
        let segments = self.segments.load_full();
        NearMatching::from_segments(&segments, query, minimum_exact_prefix, greedy)
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}
