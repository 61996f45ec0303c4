//! The per-turn orchestrator and its response machinery.
//!
//! [`engine::ChatEngine`] sequences every analyzer per turn through an
//! ordered cascade of short-circuiting layers, composes the surviving
//! parts into one [`parley_core::Reply`], and contains every failure
//! behind a generic apology. Nothing below this crate is stateful.

pub mod answers;
pub mod coordinator;
pub mod engine;
pub mod fallback;
pub mod flow;

pub use coordinator::ResponseCoordinator;
pub use engine::ChatEngine;
pub use fallback::{FallbackCategory, FallbackStrategy};
pub use flow::{Flow, FlowEngine, FlowNode, FlowStep, Transition, Trigger};
