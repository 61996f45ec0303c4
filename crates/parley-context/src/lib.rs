//! Conversational memory: bounded history, a decaying entity stack and
//! active topic, weighted reference disambiguation, and the behavioral
//! user profile — all persisted through a pluggable key-value store.

pub mod context;
pub mod resolver;
pub mod store;
pub mod user_profile;

pub use context::{
    ActiveTopic, ContextManager, ConversationContext, ConversationTurn, EntityItem,
};
pub use resolver::{ContextResolver, ResolutionResult, ResolvedCandidate};
pub use store::{JsonFileStore, KvStore, MemoryStore};
pub use user_profile::{ConversationStyle, UserProfile};
