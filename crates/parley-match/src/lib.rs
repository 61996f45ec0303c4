//! Approximate string matching primitives for the chat pipeline.
//!
//! Everything here is deterministic and allocation-light: the matcher
//! normalizes both sides, scores with unit-cost edit distance, and falls
//! back through phonetic and partial strategies in a fixed priority
//! order. Query normalization (slang expansion) lives in [`normalize`].

pub mod fuzzy;
pub mod normalize;

pub use fuzzy::{BestMatch, FuzzyMatcher, MatchMethod, SmartMatch};
pub use normalize::normalize_query;
