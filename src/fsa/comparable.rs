//! Comparable adapter over a state traverser.
//!
//! Wraps a `StateTraverser` with the segment ordinal it was created for
//! and a total order over traversal positions, which is what the zip
//! merger keys its priority queue on. The adapter never changes traversal
//! order, it only makes the position observable.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::StateId;

use super::{Fsa, StateTraverser, TraversalPayload, Traverser};

/// A state traverser with an observable, totally ordered position.
///
/// Positions compare by label path under the payload's per-depth ranking,
/// with an ancestor sorting before all of its extensions. Ties on the path
/// are broken by ordinal, larger (newer segment) first, so that during a
/// merge the newest segment's state is the one reported.
pub struct ComparableStateTraverser<F: Fsa, P: TraversalPayload> {
    inner: StateTraverser<F, P>,
    order: usize,
}

impl<F: Fsa, P: TraversalPayload> ComparableStateTraverser<F, P> {
    /// # Arguments
    /// * `root` - state to traverse below, typically the post-prefix state
    /// * `order` - the segment's position in the caller's segment list
    pub fn new(fsa: Arc<F>, root: StateId, payload: P, order: usize) -> Self {
        Self {
            inner: StateTraverser::new(fsa, root, payload),
            order,
        }
    }

    /// The current position as `(label, depth, order)`; meaningful only
    /// while not exhausted.
    pub fn key(&self) -> (u8, usize, usize) {
        let labels = self.inner.state_labels();
        (labels.last().copied().unwrap_or(0), self.depth(), self.order)
    }
}

impl<F: Fsa, P: TraversalPayload> Traverser for ComparableStateTraverser<F, P> {
    type Fsa = F;
    type Payload = P;

    fn advance(&mut self) {
        self.inner.advance();
    }

    fn at_end(&self) -> bool {
        self.inner.at_end()
    }

    fn depth(&self) -> usize {
        self.inner.depth()
    }

    fn state(&self) -> StateId {
        self.inner.state()
    }

    fn is_final(&self) -> bool {
        self.inner.is_final()
    }

    fn state_labels(&self) -> &[u8] {
        self.inner.state_labels()
    }

    fn payload(&self) -> &P {
        self.inner.payload()
    }

    fn fsa(&self) -> &Arc<F> {
        self.inner.fsa()
    }

    fn order(&self) -> usize {
        self.order
    }
}

impl<F: Fsa, P: TraversalPayload> Ord for ComparableStateTraverser<F, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        let ours = self.state_labels();
        let theirs = other.state_labels();
        let payload = self.payload();
        for i in 0..ours.len().min(theirs.len()) {
            if ours[i] != theirs[i] {
                return payload
                    .transition_rank(ours[i], i)
                    .cmp(&payload.transition_rank(theirs[i], i));
            }
        }
        ours.len()
            .cmp(&theirs.len())
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl<F: Fsa, P: TraversalPayload> PartialOrd for ComparableStateTraverser<F, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F: Fsa, P: TraversalPayload> PartialEq for ComparableStateTraverser<F, P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<F: Fsa, P: TraversalPayload> Eq for ComparableStateTraverser<F, P> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsa::{Automaton, FuzzyPayload, NearPayload};

    fn traverser(
        pairs: &[(&str, &str)],
        order: usize,
    ) -> ComparableStateTraverser<Automaton, FuzzyPayload> {
        let automaton =
            Arc::new(Automaton::from_pairs(pairs.iter().copied()).expect("build failed"));
        let root = automaton.start_state();
        ComparableStateTraverser::new(automaton, root, FuzzyPayload::new(Arc::from(&b""[..]), 8), order)
    }

    #[test]
    fn lower_label_sorts_first() {
        let a = traverser(&[("ax", "1")], 0);
        let b = traverser(&[("bx", "1")], 1);
        assert!(a < b);
    }

    #[test]
    fn ancestor_sorts_before_extension() {
        let mut deep = traverser(&[("ab", "1")], 0);
        let shallow = traverser(&[("ax", "1")], 1);
        deep.advance(); // now at "ab"
        assert_eq!(deep.depth(), 2);
        assert_eq!(shallow.depth(), 1);
        assert!(shallow < deep);
    }

    #[test]
    fn newer_segment_wins_position_ties() {
        let old = traverser(&[("ab", "1")], 0);
        let new = traverser(&[("ab", "2")], 1);
        assert!(new < old);
        assert!(old > new);
    }

    #[test]
    fn near_rank_reorders_position_comparison() {
        let automaton =
            Arc::new(Automaton::from_pairs([("a", "1"), ("m", "2")]).expect("build failed"));
        let root = automaton.start_state();
        let near = |order| {
            ComparableStateTraverser::new(
                automaton.clone(),
                root,
                NearPayload::new(Arc::from(&b"m"[..])),
                order,
            )
        };
        let mut at_m = near(0);
        let at_a = {
            let mut t = near(1);
            t.advance(); // past "m"
            t
        };
        assert_eq!(at_m.state_labels(), b"m");
        assert_eq!(at_a.state_labels(), b"a");
        // 'm' continues the near key, so it outranks the smaller byte 'a'
        assert!(at_m < at_a);
        at_m.advance();
        assert_eq!(at_m.state_labels(), b"a");
    }
}
