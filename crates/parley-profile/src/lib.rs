//! Profile content store and full-text fallback search.
//!
//! The profile is a single JSON document loaded and validated once at
//! startup; every answer the engine renders is read from it. The
//! [`search::SearchEngine`] indexes the same document for the
//! last-resort keyword search layer.

pub mod load;
pub mod search;
pub mod types;

pub use search::{SearchEngine, SearchHit};
pub use types::{Contact, Person, Profile, Role, School, Skill, SkillGroup};
