pub mod config;
pub mod error;
pub mod events;
pub mod sampling;
pub mod telemetry;
pub mod types;

pub use config::ParleyConfig;
pub use error::{CoreError, Result};
pub use events::{AnalyticsEvent, AnalyticsSink, MemorySink, NullSink};
pub use types::*;
