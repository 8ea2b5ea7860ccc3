//! Matching drivers and the match record.
//!
//! - `Match`: one reported key with its score and lazily resolved value
//! - `FuzzyMatching`: keys within a bounded edit distance of the query
//! - `NearMatching`: keys sharing the exact prefix, ordered by how far
//!   they continue along the query tail

mod fuzzy;
mod near;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::fsa::{Automaton, Fsa, StateId};

pub use fuzzy::{FuzzyMatches, FuzzyMatching};
pub use near::{NearMatches, NearMatching};

/// One match reported by a matcher, or the empty sentinel.
///
/// The matched key bytes and the score are materialized eagerly; the value
/// is resolved from the owning automaton's value store on demand.
pub struct Match<F = Automaton> {
    start: usize,
    end: usize,
    matched: Vec<u8>,
    score: usize,
    fsa: Option<Arc<F>>,
    state: StateId,
}

impl<F: Fsa> Match<F> {
    pub(crate) fn new(matched: Vec<u8>, score: usize, fsa: Arc<F>, state: StateId) -> Self {
        Self {
            start: 0,
            end: matched.len(),
            matched,
            score,
            fsa: Some(fsa),
            state,
        }
    }

    /// The empty sentinel, reported by lookups that found nothing.
    pub fn empty() -> Self {
        Self {
            start: 0,
            end: 0,
            matched: Vec::new(),
            score: 0,
            fsa: None,
            state: StateId::NONE,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fsa.is_none()
    }

    /// The matched key bytes.
    pub fn matched(&self) -> &[u8] {
        &self.matched
    }

    /// The matched key, lossily decoded for display.
    pub fn matched_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.matched)
    }

    /// The serialized value stored under the matched key; empty for the
    /// sentinel.
    pub fn value(&self) -> &[u8] {
        match &self.fsa {
            Some(fsa) => match fsa.state_value(self.state) {
                Some(value) => fsa.value_bytes(value),
                None => &[],
            },
            None => &[],
        }
    }

    /// Fuzzy: the edit distance. Near: exact prefix length plus matched
    /// near-key depth.
    pub fn score(&self) -> usize {
        self.score
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset, equal to the matched key length in bytes.
    pub fn end(&self) -> usize {
        self.end
    }

    /// The automaton the match came from.
    pub fn fsa(&self) -> Option<&Arc<F>> {
        self.fsa.as_ref()
    }

    /// The final state the match ended on.
    pub fn state(&self) -> StateId {
        self.state
    }
}

impl<F> Clone for Match<F> {
    fn clone(&self) -> Self {
        Self {
            start: self.start,
            end: self.end,
            matched: self.matched.clone(),
            score: self.score,
            fsa: self.fsa.clone(),
            state: self.state,
        }
    }
}

impl<F: Fsa> fmt::Debug for Match<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("matched", &self.matched_str())
            .field("score", &self.score)
            .field("is_empty", &self.is_empty())
            .finish()
    }
}
