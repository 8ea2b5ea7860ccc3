//! In-memory automaton with bulk construction from key/value pairs.
//!
//! States live in an arena `Vec` referenced by index, so the automaton is a
//! single allocation-friendly block with no ownership cycles. Slot 0 is an
//! unreachable sentinel, which keeps state id 0 free to mean "no state".
//! Each state stores its outgoing labels and target states as sorted
//! parallel arrays; transition lookup is a binary search.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{DictError, StateId, ValueRef};

use super::Fsa;

/// One state in the arena.
///
/// Most states have few children, so the parallel arrays are `SmallVec`s.
/// `labels` is kept sorted; `targets[i]` is the state reached on
/// `labels[i]`.
#[derive(Default)]
struct State {
    labels: SmallVec<[u8; 4]>,
    targets: SmallVec<[StateId; 4]>,
    value: Option<ValueRef>,
}

/// An immutable in-memory automaton representing a set of keys with
/// attached values.
///
/// Built once with [`Automaton::from_pairs`] and never modified afterwards,
/// which makes it safe to share behind an `Arc` across concurrently running
/// matchers.
pub struct Automaton {
    states: Vec<State>,
    values: Vec<Box<[u8]>>,
    key_count: usize,
}

impl Automaton {
    /// Build an automaton from key/value pairs.
    ///
    /// Pairs may arrive in any order; they are sorted internally. Empty
    /// keys and duplicate keys within one batch are rejected.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, DictError>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut pairs: Vec<(K, V)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

        let mut automaton = Automaton {
            // slot 0 is the "no state" sentinel, slot 1 the start state
            states: vec![State::default(), State::default()],
            values: Vec::new(),
            key_count: 0,
        };
        let mut value_refs: FxHashMap<Box<[u8]>, ValueRef> = FxHashMap::default();

        let mut previous: Option<&[u8]> = None;
        for (key, value) in &pairs {
            let key = key.as_ref();
            if key.is_empty() {
                return Err(DictError::EmptyKey);
            }
            if previous == Some(key) {
                return Err(DictError::DuplicateKey(key.to_vec()));
            }
            previous = Some(key);

            let mut state = automaton.start_state();
            for &byte in key {
                state = automaton.get_or_create_child(state, byte);
            }
            let value = automaton.intern_value(value.as_ref(), &mut value_refs);
            automaton.states[state.index()].value = Some(value);
            automaton.key_count += 1;
        }

        Ok(automaton)
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.key_count
    }

    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    /// Number of states, including the sentinel and the start state.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    fn alloc(&mut self) -> StateId {
        let id = StateId::from_index(self.states.len());
        self.states.push(State::default());
        id
    }

    /// Find the child of `parent` on `label`, creating it if absent.
    fn get_or_create_child(&mut self, parent: StateId, label: u8) -> StateId {
        match self.states[parent.index()].labels.binary_search(&label) {
            Ok(pos) => self.states[parent.index()].targets[pos],
            Err(pos) => {
                let child = self.alloc();
                let state = &mut self.states[parent.index()];
                state.labels.insert(pos, label);
                state.targets.insert(pos, child);
                child
            }
        }
    }

    /// Store value bytes once per distinct value.
    fn intern_value(
        &mut self,
        bytes: &[u8],
        value_refs: &mut FxHashMap<Box<[u8]>, ValueRef>,
    ) -> ValueRef {
        if let Some(&existing) = value_refs.get(bytes) {
            return existing;
        }
        let value = ValueRef::from_index(self.values.len());
        self.values.push(bytes.into());
        value_refs.insert(bytes.into(), value);
        value
    }
}

impl Fsa for Automaton {
    fn start_state(&self) -> StateId {
        StateId::from_index(1)
    }

    fn try_walk(&self, state: StateId, label: u8) -> StateId {
        if state.is_none() {
            return StateId::NONE;
        }
        let Some(state) = self.states.get(state.index()) else {
            return StateId::NONE;
        };
        match state.labels.binary_search(&label) {
            Ok(pos) => state.targets[pos],
            Err(_) => StateId::NONE,
        }
    }

    fn is_final(&self, state: StateId) -> bool {
        self.state_value(state).is_some()
    }

    fn state_value(&self, state: StateId) -> Option<ValueRef> {
        self.states.get(state.index())?.value
    }

    fn value_bytes(&self, value: ValueRef) -> &[u8] {
        match self.values.get(value.index()) {
            Some(bytes) => bytes,
            None => &[],
        }
    }

    fn outgoing_labels(&self, state: StateId) -> &[u8] {
        match self.states.get(state.index()) {
            Some(state) => &state.labels,
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Automaton {
        Automaton::from_pairs([("abc", "{a:1}"), ("abd", "{b:2}"), ("b", "{a:1}")])
            .expect("build failed")
    }

    #[test]
    fn walk_and_finality() {
        let automaton = sample();
        let start = automaton.start_state();

        let abc = automaton.walk(start, b"abc");
        assert!(!abc.is_none());
        assert!(automaton.is_final(abc));

        let ab = automaton.walk(start, b"ab");
        assert!(!ab.is_none());
        assert!(!automaton.is_final(ab));

        assert!(automaton.walk(start, b"abx").is_none());
        assert!(automaton.walk(start, b"abcd").is_none());
    }

    #[test]
    fn missing_transition_is_none() {
        let automaton = sample();
        let start = automaton.start_state();
        assert!(automaton.try_walk(start, b'x').is_none());
        // walking from the sentinel stays at the sentinel
        assert!(automaton.try_walk(StateId::NONE, b'a').is_none());
    }

    #[test]
    fn outgoing_labels_are_sorted() {
        let automaton =
            Automaton::from_pairs([("zb", "1"), ("ab", "2"), ("mb", "3")]).expect("build failed");
        assert_eq!(
            automaton.outgoing_labels(automaton.start_state()),
            &[b'a', b'm', b'z']
        );
    }

    #[test]
    fn values_resolve_and_dedup() {
        let automaton = sample();
        let start = automaton.start_state();

        let abc = automaton.walk(start, b"abc");
        let b = automaton.walk(start, b"b");
        let abd = automaton.walk(start, b"abd");

        let v_abc = automaton.state_value(abc).expect("missing value");
        let v_b = automaton.state_value(b).expect("missing value");
        let v_abd = automaton.state_value(abd).expect("missing value");

        assert_eq!(automaton.value_bytes(v_abc), b"{a:1}");
        assert_eq!(automaton.value_bytes(v_abd), b"{b:2}");
        // identical value bytes share one slot
        assert_eq!(v_abc, v_b);
    }

    #[test]
    fn unsorted_input_is_accepted() {
        let automaton =
            Automaton::from_pairs([("zz", "1"), ("aa", "2")]).expect("build failed");
        assert_eq!(automaton.len(), 2);
        let start = automaton.start_state();
        assert!(automaton.is_final(automaton.walk(start, b"aa")));
        assert!(automaton.is_final(automaton.walk(start, b"zz")));
    }

    #[test]
    fn empty_key_is_rejected() {
        let result = Automaton::from_pairs([("", "1")]);
        assert!(matches!(result, Err(DictError::EmptyKey)));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let result = Automaton::from_pairs([("abc", "1"), ("abc", "2")]);
        assert!(matches!(result, Err(DictError::DuplicateKey(_))));
    }
}
