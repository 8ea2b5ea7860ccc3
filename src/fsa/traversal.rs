//! Per-path traversal payloads for approximate matching.
//!
//! A payload is the mutable-per-path half of a traversal: the traverser owns
//! the state stack, the payload decides which transitions are admissible and
//! accumulates the matching state (edit-distance row or near-key depth).
//! Every stack frame carries its own payload snapshot, so backtracking is a
//! plain pop.

use std::sync::Arc;

use smallvec::SmallVec;

/// Per-path state cloned into each traversal frame.
///
/// `step` is consulted once per attempted transition; returning `None`
/// prunes the whole subtree behind that transition. `transition_rank`
/// defines the order in which sibling transitions are visited and must
/// depend only on the label and the depth, never on path-specific state,
/// so that merged traversals over different automata agree on one order.
pub trait TraversalPayload: Clone {
    /// The payload of the child frame reached by taking `label` at edge
    /// `depth`, or `None` if the subtree cannot contain a match.
    fn step(&self, label: u8, depth: usize) -> Option<Self>
    where
        Self: Sized;

    /// Sort key for sibling transitions at `depth`. Defaults to ascending
    /// byte order.
    fn transition_rank(&self, label: u8, depth: usize) -> (bool, u8) {
        let _ = depth;
        (false, label)
    }
}

/// Levenshtein payload: one dynamic-programming row over the query suffix.
///
/// `row[j]` is the minimum edit distance between the path consumed so far
/// and the first `j` bytes of the suffix. A subtree is pruned as soon as
/// the row minimum exceeds the allowed distance, since no extension of the
/// path can recover below it.
#[derive(Clone)]
pub struct FuzzyPayload {
    query: Arc<[u8]>,
    row: SmallVec<[usize; 16]>,
    max_distance: usize,
}

impl FuzzyPayload {
    /// Payload for the empty consumed path against the whole `query`
    /// suffix.
    pub fn new(query: Arc<[u8]>, max_distance: usize) -> Self {
        let row = (0..=query.len()).collect();
        Self {
            query,
            row,
            max_distance,
        }
    }

    /// Edit distance between the consumed path and the full query suffix.
    pub fn distance(&self) -> usize {
        self.row[self.query.len()]
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }
}

impl TraversalPayload for FuzzyPayload {
    fn step(&self, label: u8, _depth: usize) -> Option<Self> {
        let len = self.query.len();
        let mut next: SmallVec<[usize; 16]> = SmallVec::with_capacity(len + 1);
        next.push(self.row[0] + 1);
        let mut best = self.row[0] + 1;
        for j in 1..=len {
            let substitute = self.row[j - 1] + usize::from(self.query[j - 1] != label);
            let cell = substitute.min(self.row[j] + 1).min(next[j - 1] + 1);
            best = best.min(cell);
            next.push(cell);
        }
        if best > self.max_distance {
            return None;
        }
        Some(Self {
            query: self.query.clone(),
            row: next,
            max_distance: self.max_distance,
        })
    }
}

/// Near payload: the shared query tail plus how much of it the current
/// path has matched byte-for-byte.
///
/// All per-segment payloads of one query reference the same `near_key`
/// bytes. `exact_depth` never decreases along a path and never exceeds
/// `near_key.len()`.
#[derive(Clone)]
pub struct NearPayload {
    near_key: Arc<[u8]>,
    exact_depth: usize,
}

impl NearPayload {
    pub fn new(near_key: Arc<[u8]>) -> Self {
        Self {
            near_key,
            exact_depth: 0,
        }
    }

    /// Length of the `near_key` prefix the current path matches exactly.
    pub fn exact_depth(&self) -> usize {
        self.exact_depth
    }

    pub fn near_key(&self) -> &[u8] {
        &self.near_key
    }
}

impl TraversalPayload for NearPayload {
    fn step(&self, label: u8, depth: usize) -> Option<Self> {
        let mut child = self.clone();
        // extend only while the path has been exact all the way down
        if self.exact_depth == depth && self.near_key.get(depth) == Some(&label) {
            child.exact_depth = depth + 1;
        }
        Some(child)
    }

    /// The byte continuing the near key sorts before all others, so the
    /// traversal descends along the query tail first.
    fn transition_rank(&self, label: u8, depth: usize) -> (bool, u8) {
        match self.near_key.get(depth) {
            Some(&expected) => (expected != label, label),
            None => (false, label),
        }
    }
}
