//! Accumulated behavioral profile of the visitor.
//!
//! Not required for correctness; it biases suggestion ranking toward
//! unexplored topics and adapts tone over repeat visits.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::KvStore;

/// Words that read as technical vocabulary for style inference.
const TECHNICAL_WORDS: &[&str] = &[
    "api", "backend", "frontend", "database", "cloud", "kubernetes", "docker", "rust",
    "async", "latency", "deploy", "architecture", "infra",
];

/// Queries shorter than this on average read as concise.
const CONCISE_AVG_CHARS: f64 = 20.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStyle {
    #[default]
    Chatty,
    Concise,
    Technical,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub topics_explored: HashMap<String, u32>,
    #[serde(default)]
    pub companies_of_interest: Vec<String>,
    #[serde(default)]
    pub skills_of_interest: Vec<String>,
    #[serde(default)]
    pub style: ConversationStyle,
    #[serde(default)]
    pub detail_requests: u32,
    #[serde(default)]
    pub clicks: Vec<String>,
    #[serde(default)]
    pub visit_count: u32,
    #[serde(default)]
    pub last_seen: i64,
    // style inference inputs
    #[serde(default)]
    turns_seen: u32,
    #[serde(default)]
    total_query_chars: u64,
    #[serde(default)]
    technical_hits: u32,
}

impl UserProfile {
    /// Merges one user turn into the profile and re-infers style.
    pub fn absorb_turn(&mut self, query: &str, intent: Option<&str>, entities: &[(String, String)]) {
        if let Some(intent) = intent {
            *self.topics_explored.entry(intent.to_string()).or_insert(0) += 1;
        }
        for (entity_type, value) in entities {
            let list = match entity_type.as_str() {
                "company" => &mut self.companies_of_interest,
                "skill" => &mut self.skills_of_interest,
                _ => continue,
            };
            if !list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
                list.push(value.clone());
            }
        }

        self.turns_seen += 1;
        self.total_query_chars += query.chars().count() as u64;
        let lower = query.to_lowercase();
        if TECHNICAL_WORDS.iter().any(|w| lower.contains(w)) {
            self.technical_hits += 1;
        }
        self.last_seen = chrono::Utc::now().timestamp_millis();
        self.infer_style();
    }

    fn infer_style(&mut self) {
        if self.turns_seen == 0 {
            return;
        }
        let technical_ratio = self.technical_hits as f64 / self.turns_seen as f64;
        let avg_chars = self.total_query_chars as f64 / self.turns_seen as f64;
        self.style = if technical_ratio >= 0.5 {
            ConversationStyle::Technical
        } else if avg_chars < CONCISE_AVG_CHARS {
            ConversationStyle::Concise
        } else {
            ConversationStyle::Chatty
        };
    }

    pub fn record_click(&mut self, payload: &str) {
        self.clicks.push(payload.to_string());
    }

    pub fn record_visit(&mut self) {
        self.visit_count += 1;
    }

    /// Candidate topics ordered least-explored first; feeds suggestion
    /// ranking.
    pub fn least_explored<'a>(&self, topics: &[&'a str]) -> Vec<&'a str> {
        let mut ranked: Vec<&str> = topics.to_vec();
        ranked.sort_by_key(|t| self.topics_explored.get(*t).copied().unwrap_or(0));
        ranked
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Loads from the store, defaulting on any failure.
    pub fn load(store: &Arc<dyn KvStore>, key: &str) -> Self {
        match store.get(key) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable user profile");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Persists; failures are logged, never propagated.
    pub fn save(&self, store: &Arc<dyn KvStore>, key: &str) {
        match serde_json::to_value(self) {
            Ok(value) => {
                if let Err(e) = store.set(key, value) {
                    warn!(error = %e, "Could not persist user profile");
                }
            }
            Err(e) => warn!(error = %e, "Could not serialize user profile"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_absorb_counts_topics() {
        let mut p = UserProfile::default();
        p.absorb_turn("his experience", Some("experience"), &[]);
        p.absorb_turn("more experience", Some("experience"), &[]);
        p.absorb_turn("skills?", Some("skills"), &[]);
        assert_eq!(p.topics_explored["experience"], 2);
        assert_eq!(p.topics_explored["skills"], 1);
    }

    #[test]
    fn test_entities_deduplicated() {
        let mut p = UserProfile::default();
        let entities = vec![("company".to_string(), "Acme".to_string())];
        p.absorb_turn("acme", None, &entities);
        let again = vec![("company".to_string(), "ACME".to_string())];
        p.absorb_turn("acme again", None, &again);
        assert_eq!(p.companies_of_interest, vec!["Acme"]);
    }

    #[test]
    fn test_style_concise() {
        let mut p = UserProfile::default();
        for _ in 0..4 {
            p.absorb_turn("skills?", None, &[]);
        }
        assert_eq!(p.style, ConversationStyle::Concise);
    }

    #[test]
    fn test_style_technical() {
        let mut p = UserProfile::default();
        p.absorb_turn("how is the backend deployed to kubernetes?", None, &[]);
        p.absorb_turn("which database and api stack?", None, &[]);
        assert_eq!(p.style, ConversationStyle::Technical);
    }

    #[test]
    fn test_style_chatty() {
        let mut p = UserProfile::default();
        p.absorb_turn("could you tell me a bit about what she enjoys working on?", None, &[]);
        assert_eq!(p.style, ConversationStyle::Chatty);
    }

    #[test]
    fn test_least_explored_ordering() {
        let mut p = UserProfile::default();
        p.absorb_turn("q", Some("experience"), &[]);
        p.absorb_turn("q", Some("experience"), &[]);
        p.absorb_turn("q", Some("skills"), &[]);
        let ranked = p.least_explored(&["experience", "skills", "contact"]);
        assert_eq!(ranked[0], "contact");
        assert_eq!(ranked[2], "experience");
    }

    #[test]
    fn test_persistence_roundtrip() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let mut p = UserProfile::default();
        p.record_visit();
        p.absorb_turn("acme?", Some("experience"), &[]);
        p.save(&store, "parley.profile");

        let reloaded = UserProfile::load(&store, "parley.profile");
        assert_eq!(reloaded.visit_count, 1);
        assert_eq!(reloaded.topics_explored["experience"], 1);
    }

    #[test]
    fn test_load_missing_is_default() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let p = UserProfile::load(&store, "nope");
        assert_eq!(p.visit_count, 0);
    }
}
