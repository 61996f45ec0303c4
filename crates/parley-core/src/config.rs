use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoreError, Result};

/// Top-level configuration for the Parley engine.
///
/// Loaded from `parley.toml` by default. Each section corresponds to one
/// subsystem of the response pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Per-turn engine behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether the chat engine accepts messages at all.
    pub enabled: bool,
    /// Maximum accepted message length in characters.
    pub max_message_chars: usize,
    /// Hard deadline for one turn of processing, in milliseconds.
    pub turn_timeout_ms: u64,
    /// Maximum suggestion chips attached to a reply.
    pub max_suggestions: usize,
    /// Exact token that triggers the internal state snapshot.
    pub debug_command: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_message_chars: 500,
            turn_timeout_ms: 1500,
            max_suggestions: 4,
            debug_command: "/debug".to_string(),
        }
    }
}

/// Conversational memory sizing and decay rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Sliding window of retained conversation turns.
    pub history_window: usize,
    /// Bounded log of recently classified intents.
    pub recent_intents: usize,
    /// Maximum entities held on the reference stack.
    pub entity_stack_size: usize,
    /// User turns an unmentioned entity survives before eviction.
    pub entity_ttl_turns: u32,
    /// Linear confidence decrement applied to the active topic per user turn.
    pub topic_decay_step: f32,
    /// Topic confidence below this clears the active topic.
    pub topic_floor: f32,
    /// Top-two resolver scores closer than this are ambiguous.
    pub ambiguity_margin: f32,
    /// Ambiguous resolutions below this confidence require clarification.
    pub clarify_floor: f32,
    /// Storage key for the persisted conversation context.
    pub storage_key: String,
    /// Storage key for the persisted visitor profile.
    pub profile_storage_key: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            recent_intents: 5,
            entity_stack_size: 5,
            entity_ttl_turns: 3,
            topic_decay_step: 0.1,
            topic_floor: 0.3,
            ambiguity_margin: 0.3,
            clarify_floor: 0.8,
            storage_key: "parley.context".to_string(),
            profile_storage_key: "parley.profile".to_string(),
        }
    }
}

/// Fuzzy string matching thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum normalized similarity for a fuzzy match.
    pub fuzzy_threshold: f64,
    /// Minimum shorter/longer length ratio for a partial match.
    pub partial_length_ratio: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.7,
            partial_length_ratio: 0.6,
        }
    }
}

/// Intent scoring knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Confidence floor applied to intents without an explicit threshold.
    pub default_intent_threshold: f32,
    /// Raw score divided by this to produce a clamped confidence.
    pub score_normalizer: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_intent_threshold: 0.6,
            score_normalizer: 50.0,
        }
    }
}

/// Last-resort profile search tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Hits scoring at or below this are suppressed.
    pub min_score: f64,
    /// Maximum hits surfaced per query.
    pub max_results: usize,
    /// Field boost for document titles.
    pub title_boost: f64,
    /// Field boost for company names.
    pub company_boost: f64,
    /// Field boost for free-form keywords.
    pub keyword_boost: f64,
    /// Matched-token length / query length below this rejects the hit.
    pub min_length_ratio: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_score: 1.0,
            max_results: 3,
            title_boost: 3.0,
            company_boost: 2.0,
            keyword_boost: 1.0,
            min_length_ratio: 0.25,
        }
    }
}
