use serde::{Deserialize, Serialize};

/// Epoch-millisecond timestamp attached to every analytics event.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Telemetry events emitted by the engine.
///
/// Events are fire-and-forget: sinks must never block a turn and are
/// never required for correctness. A sink that drops everything is a
/// valid sink.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnalyticsEvent {
    /// A query was classified to an intent above threshold.
    IntentClassified {
        intent: String,
        confidence: f32,
        timestamp: i64,
    },

    /// A UI command was emitted for the presentation layer.
    CommandExecuted { command: String, timestamp: i64 },

    /// A fallback response was produced.
    FallbackUsed { category: String, timestamp: i64 },

    /// The last-resort profile search ran.
    SearchPerformed {
        query: String,
        result_count: usize,
        latency_ms: u64,
        timestamp: i64,
    },

    /// A scripted flow advanced to a new node.
    ScriptAdvanced {
        flow: String,
        node: String,
        timestamp: i64,
    },

    /// A turn finished, successfully or not.
    TurnCompleted {
        latency_ms: u64,
        timed_out: bool,
        timestamp: i64,
    },
}

impl AnalyticsEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> i64 {
        match self {
            AnalyticsEvent::IntentClassified { timestamp, .. }
            | AnalyticsEvent::CommandExecuted { timestamp, .. }
            | AnalyticsEvent::FallbackUsed { timestamp, .. }
            | AnalyticsEvent::SearchPerformed { timestamp, .. }
            | AnalyticsEvent::ScriptAdvanced { timestamp, .. }
            | AnalyticsEvent::TurnCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a stable snake_case event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            AnalyticsEvent::IntentClassified { .. } => "intent_classified",
            AnalyticsEvent::CommandExecuted { .. } => "command_executed",
            AnalyticsEvent::FallbackUsed { .. } => "fallback_used",
            AnalyticsEvent::SearchPerformed { .. } => "search_performed",
            AnalyticsEvent::ScriptAdvanced { .. } => "script_advanced",
            AnalyticsEvent::TurnCompleted { .. } => "turn_completed",
        }
    }
}

/// Destination for analytics events.
///
/// Implementations must not block and must not fail the caller.
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: AnalyticsEvent);
}

/// Sink that discards every event.
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn track(&self, _event: AnalyticsEvent) {}
}

/// Sink that buffers events in memory, for tests and local inspection.
#[derive(Default)]
pub struct MemorySink {
    events: std::sync::Mutex<Vec<AnalyticsEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything tracked so far.
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Count of tracked events.
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalyticsSink for MemorySink {
    fn track(&self, event: AnalyticsEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name() {
        let event = AnalyticsEvent::IntentClassified {
            intent: "experience".to_string(),
            confidence: 0.8,
            timestamp: now_millis(),
        };
        assert_eq!(event.event_name(), "intent_classified");
    }

    #[test]
    fn test_event_timestamp() {
        let event = AnalyticsEvent::FallbackUsed {
            category: "gibberish".to_string(),
            timestamp: 1700000000000,
        };
        assert_eq!(event.timestamp(), 1700000000000);
    }

    #[test]
    fn test_event_names_all_variants() {
        let ts = now_millis();
        let events: Vec<(AnalyticsEvent, &str)> = vec![
            (
                AnalyticsEvent::CommandExecuted {
                    command: "scroll".to_string(),
                    timestamp: ts,
                },
                "command_executed",
            ),
            (
                AnalyticsEvent::SearchPerformed {
                    query: "rust".to_string(),
                    result_count: 2,
                    latency_ms: 4,
                    timestamp: ts,
                },
                "search_performed",
            ),
            (
                AnalyticsEvent::ScriptAdvanced {
                    flow: "onboarding".to_string(),
                    node: "intro".to_string(),
                    timestamp: ts,
                },
                "script_advanced",
            ),
            (
                AnalyticsEvent::TurnCompleted {
                    latency_ms: 12,
                    timed_out: false,
                    timestamp: ts,
                },
                "turn_completed",
            ),
        ];
        for (event, name) in events {
            assert_eq!(event.event_name(), name);
            assert_eq!(event.timestamp(), ts);
        }
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = AnalyticsEvent::SearchPerformed {
            query: "kubernetes".to_string(),
            result_count: 1,
            latency_ms: 7,
            timestamp: now_millis(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let rt: AnalyticsEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(rt.event_name(), "search_performed");
        assert_eq!(rt.timestamp(), event.timestamp());
    }

    #[test]
    fn test_null_sink_accepts_events() {
        let sink = NullSink;
        sink.track(AnalyticsEvent::TurnCompleted {
            latency_ms: 1,
            timed_out: false,
            timestamp: now_millis(),
        });
    }

    #[test]
    fn test_memory_sink_buffers() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.track(AnalyticsEvent::FallbackUsed {
            category: "vague".to_string(),
            timestamp: now_millis(),
        });
        sink.track(AnalyticsEvent::FallbackUsed {
            category: "gibberish".to_string(),
            timestamp: now_millis(),
        });
        assert_eq!(sink.len(), 2);
        let events = sink.events();
        assert_eq!(events[0].event_name(), "fallback_used");
    }
}
