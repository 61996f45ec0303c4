//! Lexical understanding: intent scoring, entity extraction, reference
//! detection, small-talk, and input validation.
//!
//! Every analyzer here is a pure function over its inputs. Nothing
//! mutates conversation state; the engine owns that.

pub mod entity;
pub mod intent;
pub mod reference;
pub mod smalltalk;
pub mod validator;

pub use entity::{EntityExtractor, EntityRelationship, EntityTypeDef};
pub use intent::{builtin_catalog, IntentClassifier, IntentDef};
pub use reference::{Reference, ReferenceResolver, ReferenceType};
pub use smalltalk::{SmallTalkHandler, SmallTalkKind};
pub use validator::{ContextValidator, FollowUpValidation};
