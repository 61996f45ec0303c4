//! Weighted reference disambiguation over the entity stack.
//!
//! Every stacked entity is scored by a linear combination of recency,
//! topic agreement, and explicit mention. A small gap between the top
//! two candidates flags ambiguity instead of silently picking one.

use parley_core::config::ContextConfig;

use crate::context::{ActiveTopic, EntityItem};

const RECENCY_WEIGHT: f32 = 0.2;
const TOPIC_WEIGHT: f32 = 0.3;
const MENTION_WEIGHT: f32 = 0.5;

/// One scored candidate.
#[derive(Clone, Debug)]
pub struct ResolvedCandidate {
    pub entity: EntityItem,
    pub score: f32,
}

#[derive(Clone, Debug)]
pub struct ResolutionResult {
    pub resolved: Option<EntityItem>,
    pub confidence: f32,
    pub is_ambiguous: bool,
    /// The caller must ask the user to pick between the top two.
    pub needs_clarification: bool,
    /// Ranked candidates, best first.
    pub candidates: Vec<ResolvedCandidate>,
}

impl ResolutionResult {
    fn empty() -> Self {
        Self {
            resolved: None,
            confidence: 0.0,
            is_ambiguous: false,
            needs_clarification: false,
            candidates: Vec::new(),
        }
    }
}

pub struct ContextResolver {
    ambiguity_margin: f32,
    clarify_floor: f32,
}

impl ContextResolver {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            ambiguity_margin: config.ambiguity_margin,
            clarify_floor: config.clarify_floor,
        }
    }

    /// Scores every stacked entity against the query and active topic.
    ///
    /// Per entity: `0.2 × recency + 0.3 × topic_match + 0.5 × mention`.
    /// Recency decays linearly with stack position (head = 1.0 down to
    /// 1/len). Topic match is exact-or-containment against the active
    /// topic name. Mention is substring containment in the query.
    pub fn resolve(
        &self,
        query: &str,
        stack: &[EntityItem],
        topic: Option<&ActiveTopic>,
    ) -> ResolutionResult {
        if stack.is_empty() {
            return ResolutionResult::empty();
        }

        let query_lower = query.to_lowercase();
        let topic_lower = topic.map(|t| t.name.to_lowercase());
        let len = stack.len() as f32;

        let mut candidates: Vec<ResolvedCandidate> = stack
            .iter()
            .enumerate()
            .map(|(position, entity)| {
                let recency = (len - position as f32) / len;

                let value_lower = entity.value.to_lowercase();
                let topic_match = match &topic_lower {
                    Some(name) => {
                        if *name == value_lower
                            || name.contains(&value_lower)
                            || value_lower.contains(name.as_str())
                        {
                            1.0
                        } else {
                            0.0
                        }
                    }
                    None => 0.0,
                };

                let mentioned = if query_lower.contains(&value_lower) {
                    1.0
                } else {
                    0.0
                };

                let score = RECENCY_WEIGHT * recency
                    + TOPIC_WEIGHT * topic_match
                    + MENTION_WEIGHT * mentioned;
                ResolvedCandidate {
                    entity: entity.clone(),
                    score,
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let top = candidates[0].score;
        let gap = candidates.get(1).map(|c| top - c.score);
        let is_ambiguous = gap.is_some_and(|g| g < self.ambiguity_margin);
        let needs_clarification = is_ambiguous && top < self.clarify_floor;

        ResolutionResult {
            resolved: Some(candidates[0].entity.clone()),
            confidence: top,
            is_ambiguous,
            needs_clarification,
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(entity_type: &str, value: &str) -> EntityItem {
        EntityItem {
            entity_type: entity_type.to_string(),
            value: value.to_string(),
            timestamp: 0,
            expires_after_turns: 3,
        }
    }

    fn topic(name: &str) -> ActiveTopic {
        ActiveTopic {
            name: name.to_string(),
            confidence: 1.0,
            last_mentioned_at: 0,
        }
    }

    fn resolver() -> ContextResolver {
        ContextResolver::new(&ContextConfig::default())
    }

    #[test]
    fn test_empty_stack() {
        let r = resolver().resolve("tell me more", &[], None);
        assert!(r.resolved.is_none());
        assert_eq!(r.confidence, 0.0);
        assert!(!r.is_ambiguous);
        assert!(!r.needs_clarification);
    }

    #[test]
    fn test_mention_dominates() {
        let stack = vec![item("company", "Globex"), item("company", "Invitrace")];
        let r = resolver().resolve("tell me more about invitrace", &stack, None);
        let resolved = r.resolved.unwrap();
        assert_eq!(resolved.value, "Invitrace");
        // mention 0.5 + recency 0.2×(1/2) = 0.6
        assert!((r.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_recency_breaks_silence() {
        // Nothing mentioned, no topic: head of stack wins on recency,
        // but the gap (0.2 - 0.1 = 0.1) is inside the ambiguity margin.
        let stack = vec![item("company", "Acme"), item("company", "Globex")];
        let r = resolver().resolve("tell me more", &stack, None);
        assert_eq!(r.resolved.unwrap().value, "Acme");
        assert!(r.is_ambiguous);
        assert!(r.needs_clarification);
    }

    #[test]
    fn test_topic_agreement() {
        let stack = vec![item("company", "Acme"), item("company", "Globex")];
        let r = resolver().resolve("tell me more", &stack, Some(&topic("Globex")));
        // Globex: recency 0.1 + topic 0.3 = 0.4; Acme: 0.2
        assert_eq!(r.resolved.unwrap().value, "Globex");
        assert!((r.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_gap_below_margin_is_ambiguous() {
        let stack = vec![item("company", "Acme"), item("company", "Globex")];
        // Both mentioned: 0.7 vs 0.6 — gap 0.1 < 0.3
        let r = resolver().resolve("acme or globex?", &stack, None);
        assert!(r.is_ambiguous);
    }

    #[test]
    fn test_gap_at_margin_is_not_ambiguous() {
        // Single mention: 0.7 vs 0.1 — gap 0.6 ≥ 0.3
        let stack = vec![item("company", "Acme"), item("skill", "Rust")];
        let r = resolver().resolve("what about acme", &stack, None);
        assert!(!r.is_ambiguous);
        assert!(!r.needs_clarification);
    }

    #[test]
    fn test_high_confidence_skips_clarification() {
        // Acme: 0.2 + 0.3 + 0.5 = 1.0; Globex: 0.1 + 0.3 + 0.5 = 0.9.
        // Gap 0.1 flags ambiguity, but the top score clears the 0.8
        // floor, so no clarification is demanded.
        let stack = vec![item("company", "Acme"), item("company", "Globex")];
        let r = resolver().resolve("acme and globex", &stack, Some(&topic("acme and globex")));
        assert!(r.is_ambiguous);
        assert!(!r.needs_clarification);
        assert_eq!(r.resolved.unwrap().value, "Acme");
    }

    #[test]
    fn test_single_candidate_never_ambiguous() {
        let stack = vec![item("company", "Invitrace")];
        let r = resolver().resolve("tell me more about it", &stack, None);
        assert_eq!(r.resolved.unwrap().value, "Invitrace");
        assert!(!r.is_ambiguous);
    }

    #[test]
    fn test_candidates_ranked() {
        let stack = vec![
            item("company", "Acme"),
            item("company", "Globex"),
            item("skill", "Rust"),
        ];
        let r = resolver().resolve("rust?", &stack, None);
        assert_eq!(r.candidates[0].entity.value, "Rust");
        assert!(r.candidates.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
