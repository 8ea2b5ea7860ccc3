//! Depth-first traversal of one automaton.
//!
//! `StateTraverser` enumerates the states reachable from a supplied root,
//! depth-first, visiting the children of every node in the order the
//! payload ranks them and skipping subtrees the payload rejects. The root
//! itself is not part of the enumeration; callers that care about the root
//! state inspect it directly before traversing.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::StateId;

use super::{Fsa, TraversalPayload};

/// A forward-only traversal cursor.
///
/// The single-automaton traverser, the comparable adapter and the zip
/// merger all expose this capability set, so the matching drivers are
/// written once against it. Accessors other than `at_end` are meaningful
/// only while `at_end` is false.
pub trait Traverser {
    type Fsa: Fsa;
    type Payload: TraversalPayload;

    /// Move to the next admissible state, or become exhausted.
    fn advance(&mut self);

    fn at_end(&self) -> bool;

    /// Path length from the traversal root to the current state.
    fn depth(&self) -> usize;

    /// The current state id.
    fn state(&self) -> StateId;

    fn is_final(&self) -> bool;

    /// The labels along the current path; length equals `depth`.
    fn state_labels(&self) -> &[u8];

    fn payload(&self) -> &Self::Payload;

    /// The automaton the current state belongs to.
    fn fsa(&self) -> &Arc<Self::Fsa>;

    /// Ordinal of the segment that produced the current state; 0 for a
    /// standalone traverser.
    fn order(&self) -> usize;

    /// Value handle at the current state.
    fn state_value(&self) -> Option<crate::ValueRef> {
        self.fsa().state_value(self.state())
    }
}

/// One edge on the current path.
struct Frame<P> {
    state: StateId,
    payload: P,
    /// Children of `state` in visit order.
    pending: SmallVec<[u8; 8]>,
    next_child: usize,
}

/// Depth-first enumeration of the states below a root, in payload rank
/// order, skipping subtrees the payload declares inadmissible.
///
/// The stack always keeps the root frame, so `payload()` and friends stay
/// total even after exhaustion.
pub struct StateTraverser<F: Fsa, P: TraversalPayload> {
    fsa: Arc<F>,
    stack: Vec<Frame<P>>,
    labels: Vec<u8>,
    at_end: bool,
}

impl<F: Fsa, P: TraversalPayload> StateTraverser<F, P> {
    /// Create a traverser rooted at `root` and advance it to the first
    /// reachable state.
    pub fn new(fsa: Arc<F>, root: StateId, payload: P) -> Self {
        let pending = if root.is_none() {
            SmallVec::new()
        } else {
            Self::ordered_labels(&fsa, root, &payload, 0)
        };
        let mut traverser = Self {
            fsa,
            stack: vec![Frame {
                state: root,
                payload,
                pending,
                next_child: 0,
            }],
            labels: Vec::new(),
            at_end: root.is_none(),
        };
        traverser.advance_inner();
        traverser
    }

    fn ordered_labels(fsa: &F, state: StateId, payload: &P, depth: usize) -> SmallVec<[u8; 8]> {
        let mut labels = SmallVec::from_slice(fsa.outgoing_labels(state));
        labels.sort_unstable_by_key(|&label| payload.transition_rank(label, depth));
        labels
    }

    fn advance_inner(&mut self) {
        if self.at_end {
            return;
        }
        loop {
            let depth = self.stack.len() - 1;
            let descend = match self.stack.last_mut() {
                Some(top) => {
                    let mut found = None;
                    while top.next_child < top.pending.len() {
                        let label = top.pending[top.next_child];
                        top.next_child += 1;
                        if let Some(payload) = top.payload.step(label, depth) {
                            found = Some((top.state, label, payload));
                            break;
                        }
                    }
                    found
                }
                None => None,
            };
            match descend {
                Some((state, label, payload)) => {
                    let child = self.fsa.try_walk(state, label);
                    let pending = Self::ordered_labels(&self.fsa, child, &payload, depth + 1);
                    self.labels.push(label);
                    self.stack.push(Frame {
                        state: child,
                        payload,
                        pending,
                        next_child: 0,
                    });
                    return;
                }
                None => {
                    if self.stack.len() <= 1 {
                        // root exhausted; keep its frame for total accessors
                        self.at_end = true;
                        return;
                    }
                    self.stack.pop();
                    self.labels.pop();
                }
            }
        }
    }

    fn top(&self) -> &Frame<P> {
        &self.stack[self.stack.len() - 1]
    }
}

impl<F: Fsa, P: TraversalPayload> Traverser for StateTraverser<F, P> {
    type Fsa = F;
    type Payload = P;

    fn advance(&mut self) {
        self.advance_inner();
    }

    fn at_end(&self) -> bool {
        self.at_end
    }

    fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn state(&self) -> StateId {
        self.top().state
    }

    fn is_final(&self) -> bool {
        !self.at_end && self.fsa.is_final(self.top().state)
    }

    fn state_labels(&self) -> &[u8] {
        &self.labels
    }

    fn payload(&self) -> &P {
        &self.top().payload
    }

    fn fsa(&self) -> &Arc<F> {
        &self.fsa
    }

    fn order(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsa::{Automaton, FuzzyPayload, NearPayload};

    fn automaton(pairs: &[(&str, &str)]) -> Arc<Automaton> {
        Arc::new(Automaton::from_pairs(pairs.iter().copied()).expect("build failed"))
    }

    fn collect_paths<F: Fsa, P: TraversalPayload>(
        mut traverser: StateTraverser<F, P>,
    ) -> Vec<(Vec<u8>, usize, bool)> {
        let mut paths = Vec::new();
        while !traverser.at_end() {
            paths.push((
                traverser.state_labels().to_vec(),
                traverser.depth(),
                traverser.is_final(),
            ));
            traverser.advance();
        }
        paths
    }

    #[test]
    fn visits_states_depth_first_in_byte_order() {
        let automaton = automaton(&[("ab", "1"), ("abc", "2"), ("b", "3")]);
        let root = automaton.start_state();
        let payload = FuzzyPayload::new(Arc::from(&b"abc"[..]), 3);
        let paths = collect_paths(StateTraverser::new(automaton, root, payload));
        assert_eq!(
            paths,
            vec![
                (b"a".to_vec(), 1, false),
                (b"ab".to_vec(), 2, true),
                (b"abc".to_vec(), 3, true),
                (b"b".to_vec(), 1, true),
            ]
        );
    }

    #[test]
    fn fuzzy_payload_prunes_subtrees() {
        let automaton = automaton(&[("ab", "1"), ("xy", "2")]);
        let root = automaton.start_state();
        let payload = FuzzyPayload::new(Arc::from(&b"ab"[..]), 0);
        let paths = collect_paths(StateTraverser::new(automaton, root, payload));
        // the whole 'x' subtree is skipped, not just unreported
        assert_eq!(
            paths,
            vec![(b"a".to_vec(), 1, false), (b"ab".to_vec(), 2, true)]
        );
    }

    #[test]
    fn near_payload_visits_key_byte_first() {
        let automaton = automaton(&[("ad", "1"), ("bd", "2"), ("cd", "3")]);
        let root = automaton.start_state();
        let payload = NearPayload::new(Arc::from(&b"bd"[..]));
        let paths: Vec<Vec<u8>> = collect_paths(StateTraverser::new(automaton, root, payload))
            .into_iter()
            .map(|(labels, _, _)| labels)
            .collect();
        assert_eq!(
            paths,
            vec![
                b"b".to_vec(),
                b"bd".to_vec(),
                b"a".to_vec(),
                b"ad".to_vec(),
                b"c".to_vec(),
                b"cd".to_vec(),
            ]
        );
    }

    #[test]
    fn exact_depth_follows_the_current_path() {
        let automaton = automaton(&[("ax", "1"), ("ab", "2")]);
        let root = automaton.start_state();
        let mut traverser =
            StateTraverser::new(automaton, root, NearPayload::new(Arc::from(&b"ab"[..])));

        let mut seen = Vec::new();
        while !traverser.at_end() {
            seen.push((
                traverser.state_labels().to_vec(),
                traverser.payload().exact_depth(),
            ));
            traverser.advance();
        }
        assert_eq!(
            seen,
            vec![
                (b"a".to_vec(), 1),
                (b"ab".to_vec(), 2),
                (b"ax".to_vec(), 1),
            ]
        );
    }

    #[test]
    fn rootless_traverser_is_exhausted() {
        let automaton = automaton(&[("ab", "1")]);
        let traverser = StateTraverser::new(
            automaton,
            StateId::NONE,
            NearPayload::new(Arc::from(&b""[..])),
        );
        assert!(traverser.at_end());
    }

    #[test]
    fn leaf_root_is_exhausted_immediately() {
        let automaton = automaton(&[("ab", "1")]);
        let leaf = automaton.walk(automaton.start_state(), b"ab");
        let traverser =
            StateTraverser::new(automaton, leaf, NearPayload::new(Arc::from(&b""[..])));
        assert!(traverser.at_end());
    }
}
