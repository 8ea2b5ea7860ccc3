//! fsadict: an embedded, immutable FSA key/value dictionary with
//! approximate matching.
//!
//! Keys live in finite-state automata stacked as segments; newer segments
//! mask older ones. On top of exact lookup the dictionary answers two
//! approximate queries:
//!
//! - **fuzzy**: keys within a bounded Levenshtein distance of the query,
//!   constrained to a byte-exact minimum prefix
//! - **near**: keys sharing the exact prefix, ordered by how far they
//!   continue along the remaining query bytes. This gives proximity search
//!   when keys are locality-preserving encodings such as Morton-encoded
//!   geohashes
//!
//! ```
//! use fsadict::Index;
//!
//! let index = Index::new();
//! index
//!     .add_segment([("abc", "{a:1}"), ("abbc", "{b:2}")])
//!     .unwrap();
//!
//! let matches: Vec<String> = index
//!     .fuzzy(b"abc", 1, 2)
//!     .map(|m| m.matched_str().into_owned())
//!     .collect();
//! assert_eq!(matches, ["abbc", "abc"]);
//! ```
//!
//! Matchers are forward-only iterators created per query; they keep the
//! segment snapshot they were created against, so concurrent writers never
//! disturb an iteration in flight.

use std::fmt;

pub mod fsa;
pub mod matching;

mod index;
mod segment;

pub use fsa::{Automaton, Fsa, StateId, ValueRef};
pub use index::Index;
pub use matching::{FuzzyMatches, FuzzyMatching, Match, NearMatches, NearMatching};
pub use segment::Segment;

/// Errors raised while building or mutating a dictionary.
///
/// Matching never fails: invalid query arguments yield empty iterators.
#[derive(Debug)]
pub enum DictError {
    /// Keys must be at least one byte long.
    EmptyKey,
    /// The same key appeared twice in one segment batch.
    DuplicateKey(Vec<u8>),
    /// A deletion referenced a segment ordinal that does not exist.
    NoSuchSegment(usize),
}

impl fmt::Display for DictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictError::EmptyKey => write!(f, "empty keys are not allowed"),
            DictError::DuplicateKey(key) => {
                write!(f, "duplicate key: {}", String::from_utf8_lossy(key))
            }
            DictError::NoSuchSegment(ordinal) => {
                write!(f, "no segment with ordinal {}", ordinal)
            }
        }
    }
}

impl std::error::Error for DictError {}
