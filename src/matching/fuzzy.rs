//! Fuzzy matching: keys within a bounded edit distance of the query.
//!
//! The query's first `minimum_exact_prefix` bytes are walked literally
//! through every segment; segments missing the prefix drop out. Below the
//! prefix each surviving segment is traversed with a Levenshtein payload
//! and the per-segment traversers are merged by the zip traverser, so
//! matches come out in one ordered, de-duplicated stream.

use std::sync::Arc;

use log::trace;

use crate::fsa::{
    ComparableStateTraverser, Fsa, FuzzyPayload, StateId, Traverser, ZipStateTraverser,
};
use crate::segment::Segment;
use crate::Automaton;

use super::Match;

/// The matcher type returned by [`crate::Index::fuzzy`].
pub type FuzzyMatches = FuzzyMatching<ZipStateTraverser<Automaton, FuzzyPayload>>;

/// Iterator over keys within `max_edit_distance` of the query.
///
/// Created per query, advanced forward only, destroyed when the consumer
/// stops iterating.
pub struct FuzzyMatching<T: Traverser> {
    traverser: Option<T>,
    segments: Vec<Segment<T::Fsa>>,
    prefix: Vec<u8>,
    max_edit_distance: usize,
    pending: Option<Match<T::Fsa>>,
}

impl<F: Fsa> FuzzyMatching<ZipStateTraverser<F, FuzzyPayload>> {
    /// Fuzzy-match `query` against a stack of segments.
    ///
    /// Segment priority is positional: later segments are newer and mask
    /// older ones during de-duplication and deletion checks.
    pub fn from_segments(
        segments: &[Segment<F>],
        query: &[u8],
        max_edit_distance: usize,
        minimum_exact_prefix: usize,
    ) -> Self {
        if minimum_exact_prefix > query.len() {
            return Self::unmatched();
        }
        let (prefix, suffix) = query.split_at(minimum_exact_prefix);
        let suffix: Arc<[u8]> = suffix.into();

        let survivors = gate_prefix(segments, prefix);
        trace!(
            "fuzzy: {} of {} segments contain the exact prefix",
            survivors.len(),
            segments.len()
        );
        if survivors.is_empty() {
            return Self::unmatched();
        }

        let pending = if suffix.len() <= max_edit_distance {
            prefix_state_match(segments, &survivors, prefix)
                .map(|(fsa, state)| Match::new(prefix.to_vec(), suffix.len(), fsa, state))
        } else {
            None
        };

        let traversers = survivors
            .into_iter()
            .map(|(order, fsa, state)| {
                ComparableStateTraverser::new(
                    fsa,
                    state,
                    FuzzyPayload::new(suffix.clone(), max_edit_distance),
                    order,
                )
            })
            .collect();

        Self {
            traverser: Some(ZipStateTraverser::new(traversers)),
            segments: segments.to_vec(),
            prefix: prefix.to_vec(),
            max_edit_distance,
            pending,
        }
    }
}

impl<T: Traverser> FuzzyMatching<T> {
    fn unmatched() -> Self {
        Self {
            traverser: None,
            segments: Vec::new(),
            prefix: Vec::new(),
            max_edit_distance: 0,
            pending: None,
        }
    }
}

impl<F: Fsa> FuzzyMatching<ComparableStateTraverser<F, FuzzyPayload>> {
    /// Fuzzy-match `query` against one automaton, without deletions.
    pub fn from_single_fsa(
        fsa: Arc<F>,
        query: &[u8],
        max_edit_distance: usize,
        minimum_exact_prefix: usize,
    ) -> Self {
        let segment = Segment::new(fsa);
        if minimum_exact_prefix > query.len() {
            return Self::unmatched();
        }
        let (prefix, suffix) = query.split_at(minimum_exact_prefix);
        let suffix: Arc<[u8]> = suffix.into();

        let fsa = segment.fsa().clone();
        let state = fsa.walk(fsa.start_state(), prefix);
        if state.is_none() {
            return Self::unmatched();
        }
        let pending = (suffix.len() <= max_edit_distance && fsa.is_final(state))
            .then(|| Match::new(prefix.to_vec(), suffix.len(), fsa.clone(), state));
        let traverser = ComparableStateTraverser::new(
            fsa,
            state,
            FuzzyPayload::new(suffix, max_edit_distance),
            0,
        );
        Self {
            traverser: Some(traverser),
            segments: vec![segment],
            prefix: prefix.to_vec(),
            max_edit_distance,
            pending,
        }
    }
}

impl<T> FuzzyMatching<T>
where
    T: Traverser<Payload = FuzzyPayload>,
{
    /// The first match, or the empty sentinel when there is none. The
    /// iterator continues with the remaining matches.
    pub fn first_match(&mut self) -> Match<T::Fsa> {
        self.next().unwrap_or_else(Match::empty)
    }
}

impl<T> Iterator for FuzzyMatching<T>
where
    T: Traverser<Payload = FuzzyPayload>,
{
    type Item = Match<T::Fsa>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }
        let traverser = self.traverser.as_mut()?;
        while !traverser.at_end() {
            if traverser.is_final() {
                let distance = traverser.payload().distance();
                if distance <= self.max_edit_distance {
                    let mut matched = self.prefix.clone();
                    matched.extend_from_slice(traverser.state_labels());
                    let deleted = self
                        .segments
                        .get(traverser.order())
                        .is_some_and(|segment| segment.is_deleted(&matched));
                    if !deleted {
                        let found =
                            Match::new(matched, distance, traverser.fsa().clone(), traverser.state());
                        traverser.advance();
                        return Some(found);
                    }
                }
            }
            traverser.advance();
        }
        None
    }
}

/// Walk the exact prefix through every segment, keeping those that
/// complete it. Returns `(order, fsa, post-prefix state)` triples.
pub(crate) fn gate_prefix<F: Fsa>(
    segments: &[Segment<F>],
    prefix: &[u8],
) -> Vec<(usize, Arc<F>, StateId)> {
    segments
        .iter()
        .enumerate()
        .filter_map(|(order, segment)| {
            let fsa = segment.fsa();
            let state = fsa.walk(fsa.start_state(), prefix);
            if state.is_none() {
                None
            } else {
                Some((order, fsa.clone(), state))
            }
        })
        .collect()
}

/// If the post-prefix state itself terminates a key, the prefix is a
/// legitimate match; report it from the newest segment whose state is
/// final, unless that segment deleted the key.
pub(crate) fn prefix_state_match<F: Fsa>(
    segments: &[Segment<F>],
    survivors: &[(usize, Arc<F>, StateId)],
    prefix: &[u8],
) -> Option<(Arc<F>, StateId)> {
    let (order, fsa, state) = survivors
        .iter()
        .rev()
        .find(|(_, fsa, state)| fsa.is_final(*state))?;
    if segments
        .get(*order)
        .is_some_and(|segment| segment.is_deleted(prefix))
    {
        return None;
    }
    Some((fsa.clone(), *state))
}
