//! Follow-up and anaphora detection.
//!
//! Detection is purely lexical; resolving what a reference points at
//! is the context resolver's job.

use std::sync::LazyLock;

use regex::Regex;

/// What kind of follow-up the user made. One type per turn; the first
/// matching category in priority order wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceType {
    /// Bare pronoun ("it", "they", ...).
    Pronoun,
    /// "Tell me more" style continuation.
    More,
    /// "What came before" style.
    Previous,
    /// "What came after" style.
    Next,
    /// "What about X" topic switch, with the topic extracted.
    ContextSwitch,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub ref_type: ReferenceType,
    pub topic: Option<String>,
}

const PRONOUNS: &[&str] = &["it", "that", "this", "they", "he", "she", "him", "her"];

const MORE_PHRASES: &[&str] = &[
    "tell me more",
    "more about",
    "more details",
    "go on",
    "elaborate",
    "keep going",
];

// "before that"/"after that" are deliberately absent: "that" already
// routes those through the pronoun layer.
const PREVIOUS_PHRASES: &[&str] = &["what came before", "go back", "previous", "earlier"];

const NEXT_PHRASES: &[&str] = &["what came after", "then what", "what happened next", "next"];

static CONTEXT_SWITCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:what|how)\s+about\s+(.+?)\s*\??\s*$").expect("static reference pattern")
});

pub struct ReferenceResolver;

impl ReferenceResolver {
    /// Detects the first matching reference category, or none.
    pub fn detect_reference(query: &str) -> Option<Reference> {
        let lower = query.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.iter().any(|t| PRONOUNS.contains(t)) {
            return Some(Reference {
                ref_type: ReferenceType::Pronoun,
                topic: None,
            });
        }
        if contains_phrase(&lower, &tokens, MORE_PHRASES) {
            return Some(Reference {
                ref_type: ReferenceType::More,
                topic: None,
            });
        }
        if contains_phrase(&lower, &tokens, PREVIOUS_PHRASES) {
            return Some(Reference {
                ref_type: ReferenceType::Previous,
                topic: None,
            });
        }
        if contains_phrase(&lower, &tokens, NEXT_PHRASES) {
            return Some(Reference {
                ref_type: ReferenceType::Next,
                topic: None,
            });
        }
        if let Some(caps) = CONTEXT_SWITCH.captures(&lower) {
            let topic = caps.get(1).map(|m| m.as_str().trim().to_string());
            return Some(Reference {
                ref_type: ReferenceType::ContextSwitch,
                topic,
            });
        }
        None
    }
}

/// Multi-word phrases match by containment; single words match as whole
/// tokens so "next" never fires inside "nextcloud".
fn contains_phrase(lower: &str, tokens: &[&str], phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| {
        if phrase.contains(' ') {
            lower.contains(phrase)
        } else {
            tokens.contains(phrase)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pronoun() {
        let r = ReferenceResolver::detect_reference("tell me more about it").unwrap();
        assert_eq!(r.ref_type, ReferenceType::Pronoun);
        assert_eq!(r.topic, None);
    }

    #[test]
    fn test_pronoun_needs_whole_token() {
        // "this" must not fire inside "history"
        assert!(ReferenceResolver::detect_reference("employment history").is_none());
        assert!(ReferenceResolver::detect_reference("the theory").is_none());
    }

    #[test]
    fn test_more() {
        let r = ReferenceResolver::detect_reference("tell me more").unwrap();
        assert_eq!(r.ref_type, ReferenceType::More);
    }

    #[test]
    fn test_previous_and_next() {
        let r = ReferenceResolver::detect_reference("what came before").unwrap();
        assert_eq!(r.ref_type, ReferenceType::Previous);
        let r = ReferenceResolver::detect_reference("and then what?").unwrap();
        assert_eq!(r.ref_type, ReferenceType::Next);
    }

    #[test]
    fn test_context_switch_extracts_topic() {
        let r = ReferenceResolver::detect_reference("what about skills").unwrap();
        assert_eq!(r.ref_type, ReferenceType::ContextSwitch);
        assert_eq!(r.topic.as_deref(), Some("skills"));
    }

    #[test]
    fn test_context_switch_strips_question_mark() {
        let r = ReferenceResolver::detect_reference("How about the education?").unwrap();
        assert_eq!(r.ref_type, ReferenceType::ContextSwitch);
        assert_eq!(r.topic.as_deref(), Some("the education"));
    }

    #[test]
    fn test_pronoun_outranks_context_switch() {
        let r = ReferenceResolver::detect_reference("what about him").unwrap();
        assert_eq!(r.ref_type, ReferenceType::Pronoun);
    }

    #[test]
    fn test_no_reference() {
        assert!(ReferenceResolver::detect_reference("show me the skills").is_none());
        assert!(ReferenceResolver::detect_reference("").is_none());
    }
}
