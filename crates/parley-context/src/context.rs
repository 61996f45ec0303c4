//! The conversation aggregate and its decay-on-user-turn semantics.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use parley_core::config::ContextConfig;

use crate::store::KvStore;

/// Persisted shape version. Older persisted contexts are migrated on
/// load: history is salvaged, derived state is reset.
pub const CURRENT_VERSION: u32 = 2;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One remembered entity. `expires_after_turns` strictly decreases on
/// each user turn; the item is evicted at zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityItem {
    pub entity_type: String,
    pub value: String,
    pub timestamp: i64,
    pub expires_after_turns: u32,
}

/// The single subject the conversation is currently about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveTopic {
    pub name: String,
    pub confidence: f32,
    pub last_mentioned_at: i64,
}

/// One completed exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_query: String,
    pub intent: Option<String>,
    pub entities: Vec<String>,
    pub response: String,
    pub timestamp: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(default)]
    pub version: u32,
    /// Stable id for correlating analytics across turns.
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub history: VecDeque<ConversationTurn>,
    #[serde(default)]
    pub recent_intents: VecDeque<String>,
    #[serde(default)]
    pub entity_stack: Vec<EntityItem>,
    #[serde(default)]
    pub active_topic: Option<ActiveTopic>,
}

impl ConversationContext {
    pub fn fresh() -> Self {
        Self {
            version: CURRENT_VERSION,
            session_id: Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }
}

/// Sole owner of the conversation context. All mutation goes through
/// here; turns within one conversation are strictly sequential.
pub struct ContextManager {
    context: ConversationContext,
    store: Arc<dyn KvStore>,
    config: ContextConfig,
}

impl ContextManager {
    /// Loads persisted state through the store, migrating or starting
    /// fresh as needed.
    pub fn new(store: Arc<dyn KvStore>, config: ContextConfig) -> Self {
        let context = Self::load_from(store.as_ref(), &config);
        Self {
            context,
            store,
            config,
        }
    }

    fn load_from(store: &dyn KvStore, config: &ContextConfig) -> ConversationContext {
        let Some(value) = store.get(&config.storage_key) else {
            return ConversationContext::fresh();
        };
        match serde_json::from_value::<ConversationContext>(value) {
            Ok(mut context) => {
                if context.version < CURRENT_VERSION {
                    Self::migrate(&mut context, config);
                }
                context
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted context");
                ConversationContext::fresh()
            }
        }
    }

    /// Salvages what is forward-compatible (history, trimmed to the
    /// current window) and resets derived state rather than guessing.
    fn migrate(context: &mut ConversationContext, config: &ContextConfig) {
        debug!(
            from = context.version,
            to = CURRENT_VERSION,
            "Migrating persisted context"
        );
        while context.history.len() > config.history_window {
            context.history.pop_front();
        }
        context.recent_intents.clear();
        context.entity_stack.clear();
        context.active_topic = None;
        if context.session_id.is_empty() {
            context.session_id = Uuid::new_v4().to_string();
        }
        context.version = CURRENT_VERSION;
    }

    // ------------------------------------------------------------------
    // Turn recording
    // ------------------------------------------------------------------

    /// Opens a new turn. Decay is applied FIRST, so state recorded in
    /// this very turn is not decayed by it.
    pub fn record_user_turn(
        &mut self,
        query: &str,
        intent: Option<&str>,
        entities: &[(String, String)],
    ) {
        self.apply_decay();

        self.context.history.push_back(ConversationTurn {
            user_query: query.to_string(),
            intent: intent.map(str::to_string),
            entities: entities.iter().map(|(_, v)| v.clone()).collect(),
            response: String::new(),
            timestamp: now_millis(),
        });
        while self.context.history.len() > self.config.history_window {
            self.context.history.pop_front();
        }

        if let Some(intent) = intent {
            self.context.recent_intents.push_back(intent.to_string());
            while self.context.recent_intents.len() > self.config.recent_intents {
                self.context.recent_intents.pop_front();
            }
        }

        for (entity_type, value) in entities {
            self.push_entity(entity_type, value);
        }
    }

    /// Completes the pending turn with the bot's response. Never decays.
    pub fn record_bot_turn(&mut self, response: &str) {
        if let Some(turn) = self.context.history.back_mut() {
            turn.response = response.to_string();
        }
    }

    fn apply_decay(&mut self) {
        for item in &mut self.context.entity_stack {
            item.expires_after_turns = item.expires_after_turns.saturating_sub(1);
        }
        self.context
            .entity_stack
            .retain(|item| item.expires_after_turns > 0);

        if let Some(topic) = &mut self.context.active_topic {
            topic.confidence -= self.config.topic_decay_step;
            // tolerance keeps accumulated float error from clearing the
            // topic a turn early at the floor boundary
            if topic.confidence + 1e-4 < self.config.topic_floor {
                debug!(topic = %topic.name, "Active topic decayed out");
                self.context.active_topic = None;
            }
        }
    }

    /// Inserts at the head; a duplicate value (case-insensitive) is
    /// refreshed and moved to the head instead of duplicated.
    pub fn push_entity(&mut self, entity_type: &str, value: &str) {
        let lower = value.to_lowercase();
        self.context
            .entity_stack
            .retain(|item| item.value.to_lowercase() != lower);
        self.context.entity_stack.insert(
            0,
            EntityItem {
                entity_type: entity_type.to_string(),
                value: value.to_string(),
                timestamp: now_millis(),
                expires_after_turns: self.config.entity_ttl_turns,
            },
        );
        self.context
            .entity_stack
            .truncate(self.config.entity_stack_size);
    }

    /// Overwrites the active topic at full confidence.
    pub fn set_topic(&mut self, name: &str) {
        self.context.active_topic = Some(ActiveTopic {
            name: name.to_string(),
            confidence: 1.0,
            last_mentioned_at: now_millis(),
        });
    }

    /// Wipes the conversation (interrupt keywords, "restart").
    pub fn reset(&mut self) {
        self.context = ConversationContext::fresh();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Persists the context. Store failures are logged and swallowed;
    /// the in-memory state stays authoritative.
    pub fn save(&self) {
        let value = match serde_json::to_value(&self.context) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Could not serialize context");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.config.storage_key, value) {
            warn!(error = %e, "Could not persist context, continuing in memory");
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn history_len(&self) -> usize {
        self.context.history.len()
    }

    pub fn entity_stack(&self) -> &[EntityItem] {
        &self.context.entity_stack
    }

    pub fn active_topic(&self) -> Option<&ActiveTopic> {
        self.context.active_topic.as_ref()
    }

    pub fn recent_intents(&self) -> &VecDeque<String> {
        &self.context.recent_intents
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }
}
