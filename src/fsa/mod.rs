//! Finite-state-automaton storage and traversal.
//!
//! This module contains the read side of the dictionary:
//!
//! - `Fsa`: the reader contract every automaton implementation satisfies
//! - `Automaton`: an arena-allocated in-memory automaton with a bulk builder
//! - `TraversalPayload` / `FuzzyPayload` / `NearPayload`: per-path state
//!   carried during approximate matching
//! - `StateTraverser`: depth-first enumeration of one automaton
//! - `ComparableStateTraverser`: a traverser with an observable position
//! - `ZipStateTraverser`: ordered, de-duplicating merge of several traversers

mod automaton;
mod comparable;
mod state_traverser;
mod traversal;
mod zip;

pub use automaton::Automaton;
pub use comparable::ComparableStateTraverser;
pub use state_traverser::{StateTraverser, Traverser};
pub use traversal::{FuzzyPayload, NearPayload, TraversalPayload};
pub use zip::ZipStateTraverser;

/// A state identifier inside one automaton.
///
/// Id 0 is reserved for "no state": a failed transition returns
/// `StateId::NONE` rather than an error.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct StateId(u32);

impl StateId {
    /// The reserved "no state" id.
    pub const NONE: StateId = StateId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        StateId(index as u32)
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An opaque handle to a value stored alongside a final state.
///
/// Resolved to bytes through [`Fsa::value_bytes`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ValueRef(u32);

impl ValueRef {
    pub(crate) fn from_index(index: usize) -> Self {
        ValueRef(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Read-side contract of an immutable, deterministic, acyclic automaton
/// with 8-bit transition labels.
///
/// Implementations must be safe for concurrent read-only access; the
/// matching layer never mutates automaton data.
pub trait Fsa {
    /// The state every traversal starts from.
    fn start_state(&self) -> StateId;

    /// Follow the transition labeled `label`, or return [`StateId::NONE`]
    /// if the state has no such transition.
    fn try_walk(&self, state: StateId, label: u8) -> StateId;

    /// Whether `state` terminates a stored key.
    fn is_final(&self, state: StateId) -> bool;

    /// The value handle attached to `state`, present on final states.
    fn state_value(&self, state: StateId) -> Option<ValueRef>;

    /// Resolve a value handle to its serialized bytes.
    fn value_bytes(&self, value: ValueRef) -> &[u8];

    /// The labels of all outgoing transitions of `state`, in ascending
    /// byte order.
    fn outgoing_labels(&self, state: StateId) -> &[u8];

    /// Walk a whole byte string from `state`, returning [`StateId::NONE`]
    /// as soon as a transition is missing.
    fn walk(&self, state: StateId, input: &[u8]) -> StateId {
        let mut current = state;
        for &byte in input {
            if current.is_none() {
                return StateId::NONE;
            }
            current = self.try_walk(current, byte);
        }
        current
    }
}
