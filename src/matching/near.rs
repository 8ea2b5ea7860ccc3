//! Near matching: keys sharing the exact prefix, by approximate proximity.
//!
//! Below the mandatory exact prefix the traversal follows the remaining
//! query bytes (the near key) as far as transitions exist before fanning
//! out, so the first keys reported are the ones sharing the longest
//! continuation. With `greedy` every key below the prefix is reported; in
//! the default mode the first reported match locks the shared depth, ties
//! are reported too, and the stream ends once depth regresses, since
//! depth-first order guarantees nothing better remains. Useful for
//! proximity lookups over space-filling-curve keys, where a longer shared
//! prefix means spatially closer.

use std::sync::Arc;

use log::trace;

use crate::fsa::{ComparableStateTraverser, Fsa, NearPayload, Traverser, ZipStateTraverser};
use crate::segment::Segment;
use crate::Automaton;

use super::fuzzy::{gate_prefix, prefix_state_match};
use super::Match;

/// The matcher type returned by [`crate::Index::near`].
pub type NearMatches = NearMatching<ZipStateTraverser<Automaton, NearPayload>>;

/// Iterator over keys below the exact prefix, scored by
/// `prefix length + matched near-key depth`.
pub struct NearMatching<T: Traverser> {
    traverser: Option<T>,
    segments: Vec<Segment<T::Fsa>>,
    prefix: Vec<u8>,
    greedy: bool,
    /// `None` while seeking; locked to the first emission's exact depth
    /// in non-greedy mode.
    matched_depth: Option<usize>,
    pending: Option<Match<T::Fsa>>,
}

impl<F: Fsa> NearMatching<ZipStateTraverser<F, NearPayload>> {
    /// Near-match `query` against a stack of segments.
    ///
    /// # Arguments
    /// * `minimum_exact_prefix` - bytes of the query that must match
    ///   byte-for-byte before approximate matching begins
    /// * `greedy` - report every key below the prefix instead of locking
    ///   to the first reported depth
    pub fn from_segments(
        segments: &[Segment<F>],
        query: &[u8],
        minimum_exact_prefix: usize,
        greedy: bool,
    ) -> Self {
        if minimum_exact_prefix > query.len() {
            return Self::unmatched(greedy);
        }
        let (prefix, near_key) = query.split_at(minimum_exact_prefix);
        let near_key: Arc<[u8]> = near_key.into();

        let survivors = gate_prefix(segments, prefix);
        trace!(
            "near: {} of {} segments contain the exact prefix",
            survivors.len(),
            segments.len()
        );
        if survivors.is_empty() {
            return Self::unmatched(greedy);
        }

        let pending = if near_key.is_empty() {
            prefix_state_match(segments, &survivors, prefix)
                .map(|(fsa, state)| Match::new(prefix.to_vec(), prefix.len(), fsa, state))
        } else {
            None
        };

        let traversers = survivors
            .into_iter()
            .map(|(order, fsa, state)| {
                ComparableStateTraverser::new(fsa, state, NearPayload::new(near_key.clone()), order)
            })
            .collect();

        Self {
            traverser: Some(ZipStateTraverser::new(traversers)),
            segments: segments.to_vec(),
            prefix: prefix.to_vec(),
            greedy,
            matched_depth: None,
            pending,
        }
    }
}

impl<F: Fsa> NearMatching<ComparableStateTraverser<F, NearPayload>> {
    /// Near-match `query` against one automaton, without deletions.
    pub fn from_single_fsa(
        fsa: Arc<F>,
        query: &[u8],
        minimum_exact_prefix: usize,
        greedy: bool,
    ) -> Self {
        let segment = Segment::new(fsa);
        if minimum_exact_prefix > query.len() {
            return Self::unmatched(greedy);
        }
        let (prefix, near_key) = query.split_at(minimum_exact_prefix);
        let near_key: Arc<[u8]> = near_key.into();

        let fsa = segment.fsa().clone();
        let state = fsa.walk(fsa.start_state(), prefix);
        if state.is_none() {
            return Self::unmatched(greedy);
        }
        let pending = (near_key.is_empty() && fsa.is_final(state))
            .then(|| Match::new(prefix.to_vec(), prefix.len(), fsa.clone(), state));
        let traverser =
            ComparableStateTraverser::new(fsa, state, NearPayload::new(near_key), 0);
        Self {
            traverser: Some(traverser),
            segments: vec![segment],
            prefix: prefix.to_vec(),
            greedy,
            matched_depth: None,
            pending,
        }
    }
}

impl<T: Traverser> NearMatching<T> {
    fn unmatched(greedy: bool) -> Self {
        Self {
            traverser: None,
            segments: Vec::new(),
            prefix: Vec::new(),
            greedy,
            matched_depth: None,
            pending: None,
        }
    }
}

impl<T> NearMatching<T>
where
    T: Traverser<Payload = NearPayload>,
{
    /// The first match, or the empty sentinel when there is none. The
    /// iterator continues with the remaining matches.
    pub fn first_match(&mut self) -> Match<T::Fsa> {
        self.next().unwrap_or_else(Match::empty)
    }
}

impl<T> Iterator for NearMatching<T>
where
    T: Traverser<Payload = NearPayload>,
{
    type Item = Match<T::Fsa>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            if !self.greedy && self.matched_depth.is_none() {
                self.matched_depth = Some(0);
            }
            return Some(pending);
        }
        let mut traverser = self.traverser.take()?;
        while !traverser.at_end() {
            if traverser.is_final() {
                let exact_depth = traverser.payload().exact_depth();
                if !self.greedy {
                    if let Some(locked) = self.matched_depth {
                        if exact_depth < locked {
                            // depth-first order: nothing at the locked
                            // depth can follow a regression
                            return None;
                        }
                        if exact_depth > locked {
                            traverser.advance();
                            continue;
                        }
                    }
                }
                let mut matched = self.prefix.clone();
                matched.extend_from_slice(traverser.state_labels());
                let deleted = self
                    .segments
                    .get(traverser.order())
                    .is_some_and(|segment| segment.is_deleted(&matched));
                if deleted {
                    // a masked match neither reports nor locks
                    traverser.advance();
                    continue;
                }
                if !self.greedy && self.matched_depth.is_none() {
                    trace!("locking near matches to exact depth {exact_depth}");
                    self.matched_depth = Some(exact_depth);
                }
                let found = Match::new(
                    matched,
                    self.prefix.len() + exact_depth,
                    traverser.fsa().clone(),
                    traverser.state(),
                );
                traverser.advance();
                self.traverser = Some(traverser);
                return Some(found);
            }
            traverser.advance();
        }
        None
    }
}
