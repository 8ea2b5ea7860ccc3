//! Ordered merge of several comparable traversers.
//!
//! The zip traverser drives N per-segment traversers as one stream: the
//! smallest position across all segments is reported next, and segments
//! that sit on the identical label path are collapsed into a single
//! reported position, advancing together. Which of the collapsed segments
//! is reported follows priority, except that a segment whose state is
//! final outranks newer segments that merely pass through the same path,
//! so a key is always reported from the newest segment that contains it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use log::trace;

use crate::StateId;

use super::{ComparableStateTraverser, Fsa, TraversalPayload, Traverser};

/// Merge of N comparable traversers into one forward-only stream.
///
/// Must be built from at least one traverser; the matching drivers fall
/// back to an empty iterator before constructing one otherwise.
pub struct ZipStateTraverser<F: Fsa, P: TraversalPayload> {
    heap: BinaryHeap<Reverse<ComparableStateTraverser<F, P>>>,
    /// The traverser at the cursor; retained after exhaustion so that
    /// accessors stay total.
    current: Option<ComparableStateTraverser<F, P>>,
    /// Traversers tied on the identical path, in decreasing priority.
    shadowed: Vec<ComparableStateTraverser<F, P>>,
    at_end: bool,
}

impl<F: Fsa, P: TraversalPayload> ZipStateTraverser<F, P> {
    pub fn new(traversers: Vec<ComparableStateTraverser<F, P>>) -> Self {
        let mut zip = Self {
            heap: BinaryHeap::with_capacity(traversers.len()),
            current: None,
            shadowed: Vec::new(),
            at_end: false,
        };
        let mut exhausted = None;
        for traverser in traversers {
            if traverser.at_end() {
                exhausted = Some(traverser);
            } else {
                zip.heap.push(Reverse(traverser));
            }
        }
        zip.pull(exhausted);
        zip
    }

    /// Pop the next cursor off the heap and collapse everything tied on
    /// the same path behind it.
    fn pull(&mut self, fallback: Option<ComparableStateTraverser<F, P>>) {
        match self.heap.pop() {
            Some(Reverse(traverser)) => {
                self.current = Some(traverser);
                self.collapse_ties();
            }
            None => {
                self.at_end = true;
                if self.current.is_none() {
                    self.current = fallback;
                }
            }
        }
    }

    fn collapse_ties(&mut self) {
        let Some(current) = &self.current else {
            return;
        };
        loop {
            // path equality, not key equality: two segments can reach the
            // same depth through different label sequences
            let tied = match self.heap.peek() {
                Some(Reverse(head)) => head.state_labels() == current.state_labels(),
                None => false,
            };
            if !tied {
                break;
            }
            if let Some(Reverse(shadow)) = self.heap.pop() {
                trace!(
                    "collapsing duplicate path at depth {} from segment {}",
                    shadow.depth(),
                    shadow.order()
                );
                self.shadowed.push(shadow);
            }
        }
    }

    /// The member the reported state belongs to: the highest-priority
    /// final one if any state on the collapsed path is final, otherwise
    /// the cursor itself.
    fn active(&self) -> Option<&ComparableStateTraverser<F, P>> {
        let current = self.current.as_ref()?;
        if self.at_end || current.is_final() {
            return Some(current);
        }
        match self.shadowed.iter().find(|shadow| shadow.is_final()) {
            Some(shadow) => Some(shadow),
            None => Some(current),
        }
    }
}

impl<F: Fsa, P: TraversalPayload> Traverser for ZipStateTraverser<F, P> {
    type Fsa = F;
    type Payload = P;

    fn advance(&mut self) {
        if self.at_end {
            return;
        }
        let mut cluster: Vec<_> = self.shadowed.drain(..).collect();
        if let Some(current) = self.current.take() {
            cluster.push(current);
        }
        let mut exhausted = None;
        for mut traverser in cluster {
            traverser.advance();
            if traverser.at_end() {
                exhausted = Some(traverser);
            } else {
                self.heap.push(Reverse(traverser));
            }
        }
        self.pull(exhausted);
    }

    fn at_end(&self) -> bool {
        self.at_end
    }

    fn depth(&self) -> usize {
        self.current.as_ref().map_or(0, |t| t.depth())
    }

    fn state(&self) -> StateId {
        self.active().map_or(StateId::NONE, |t| t.state())
    }

    fn is_final(&self) -> bool {
        !self.at_end
            && (self.current.as_ref().is_some_and(|t| t.is_final())
                || self.shadowed.iter().any(|t| t.is_final()))
    }

    fn state_labels(&self) -> &[u8] {
        self.current.as_ref().map_or(&[], |t| t.state_labels())
    }

    fn payload(&self) -> &P {
        self.current
            .as_ref()
            .expect("zip traverser built with no inner traversers")
            .payload()
    }

    fn fsa(&self) -> &Arc<F> {
        self.active()
            .expect("zip traverser built with no inner traversers")
            .fsa()
    }

    fn order(&self) -> usize {
        self.active().map_or(0, |t| t.order())
    }
}
