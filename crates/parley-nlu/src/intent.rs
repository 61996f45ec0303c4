//! Multi-signal intent scoring over a fixed catalog.
//!
//! Each intent accumulates additive keyword/synonym/pattern scores,
//! then multiplicative penalties and boosters are applied. Confidence
//! is the score over a fixed normalizer, clamped to 1.0 — intents with
//! many keyword hits can exceed the normalizer pre-clamp, which is
//! intentional headroom.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use parley_core::IntentScore;
use parley_match::{normalize_query, FuzzyMatcher};

// ============================================================================
// Scoring constants
// ============================================================================

const PRIMARY_WEIGHT: f32 = 10.0;
const SECONDARY_WEIGHT: f32 = 5.0;
const SYNONYM_WEIGHT: f32 = 7.0;
const PATTERN_WEIGHT: f32 = 15.0;
/// Negative keywords penalize without eliminating.
const NEGATIVE_FACTOR: f32 = 0.3;
const SCORE_NORMALIZER: f32 = 50.0;
/// Token-level fuzzy floor for primary keyword hits.
const TOKEN_FUZZY_FLOOR: f64 = 0.65;
/// Partial containment only counts for tokens at least this long.
const PARTIAL_MIN_TOKEN_LEN: usize = 3;
pub const DEFAULT_THRESHOLD: f32 = 0.6;

// ============================================================================
// Catalog
// ============================================================================

/// One intent definition. Patterns use `{a|b}` alternation groups and
/// flexible whitespace, compiled to case-insensitive regexes at
/// registration.
pub struct IntentDef {
    pub name: &'static str,
    pub primary_keywords: &'static [&'static str],
    pub secondary_keywords: &'static [&'static str],
    pub synonyms: &'static [&'static str],
    pub patterns: &'static [&'static str],
    pub negative_keywords: &'static [&'static str],
    /// (context flag, multiplicative factor) applied when the flag is set.
    pub context_boosters: &'static [(&'static str, f32)],
    pub threshold: Option<f32>,
}

struct CompiledIntent {
    def: IntentDef,
    patterns: Vec<(String, Regex)>,
}

/// Compiles `"tell me {about|more about} it"` into a case-insensitive
/// regex with `(?:...)` alternation and `\s+` between words.
fn compile_pattern(pattern: &str) -> Option<Regex> {
    let mut pieces: Vec<String> = Vec::new();
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        let close = rest[open..].find('}')? + open;
        pieces.extend(rest[..open].split_whitespace().map(regex::escape));
        let alternatives: Vec<String> = rest[open + 1..close]
            .split('|')
            .map(|a| escape_words(a.trim()))
            .collect();
        pieces.push(format!("(?:{})", alternatives.join("|")));
        rest = &rest[close + 1..];
    }
    pieces.extend(rest.split_whitespace().map(regex::escape));
    Regex::new(&format!("(?i){}", pieces.join(r"\s+"))).ok()
}

/// Escapes literal text, turning word gaps into flexible whitespace.
fn escape_words(text: &str) -> String {
    text.split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

/// Built-in catalog covering the portfolio domain. Registration order
/// is the documented tie-break for exactly-equal scores.
pub fn builtin_catalog() -> Vec<IntentDef> {
    vec![
        IntentDef {
            name: "experience",
            primary_keywords: &["experience", "work", "career", "job", "role"],
            secondary_keywords: &["worked", "position", "employment", "history", "company"],
            synonyms: &["background", "resume", "cv"],
            patterns: &[
                "tell me about {his|her|their} {experience|career|work}",
                "{his|her|their} {experience|career}",
                "where {has|did|do|does} {he|she|they} {work|worked}",
                "what {does|did} {he|she|they} do",
            ],
            negative_keywords: &["school", "degree"],
            context_boosters: &[("engaged", 1.2)],
            threshold: None,
        },
        IntentDef {
            name: "skills",
            primary_keywords: &["skills", "skill", "technologies", "stack", "languages"],
            secondary_keywords: &["tools", "frameworks", "coding", "programming"],
            synonyms: &["expertise", "competencies", "tech"],
            patterns: &[
                "what {can|does} {he|she|they} {do|use|know}",
                "{what|which} {technologies|languages|tools|frameworks}",
                "{does|do} {he|she|they} {know|use}",
                "{is|are} {he|she|they} good {at|with}",
            ],
            negative_keywords: &[],
            context_boosters: &[],
            threshold: None,
        },
        IntentDef {
            name: "education",
            primary_keywords: &["education", "degree", "university", "school"],
            secondary_keywords: &["studied", "college", "graduated"],
            synonyms: &["studies", "academic", "qualifications"],
            patterns: &[
                "where did {he|she|they} {study|go to school|graduate}",
                "{his|her|their} {education|degree|studies}",
            ],
            negative_keywords: &[],
            context_boosters: &[],
            threshold: None,
        },
        IntentDef {
            name: "contact",
            primary_keywords: &["contact", "email", "reach"],
            secondary_keywords: &["phone", "message", "touch", "available"],
            synonyms: &["hire", "connect", "recruit"],
            patterns: &[
                "how {can|do} i {contact|reach|email|message} {him|her|them}",
                "{contact|reach|email} {him|her|them}",
                "get in touch",
                "{is|are} {he|she|they} {available|open} {for|to}",
            ],
            negative_keywords: &[],
            context_boosters: &[("engaged", 1.3)],
            threshold: None,
        },
        IntentDef {
            name: "projects",
            primary_keywords: &["projects", "project", "portfolio", "built"],
            secondary_keywords: &["side", "open source", "github", "demos"],
            synonyms: &["creations", "showcase"],
            patterns: &[
                "what {has|have} {he|she|they} {built|made|created}",
                "{his|her|their} {projects|portfolio}",
            ],
            negative_keywords: &[],
            context_boosters: &[("engaged", 1.2)],
            threshold: None,
        },
        IntentDef {
            name: "about",
            primary_keywords: &["about", "who"],
            secondary_keywords: &["summary", "bio", "person"],
            synonyms: &["introduction", "intro", "overview"],
            patterns: &[
                "who {is|are} {he|she|they}",
                "tell me about {him|her|them}",
                "introduce {him|her|them|yourself}",
            ],
            negative_keywords: &["experience", "skills", "education", "contact", "projects"],
            context_boosters: &[],
            threshold: None,
        },
    ]
}

// ============================================================================
// Classifier
// ============================================================================

pub struct IntentClassifier {
    intents: Vec<CompiledIntent>,
    matcher: FuzzyMatcher,
    default_threshold: f32,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(builtin_catalog(), DEFAULT_THRESHOLD)
    }
}

impl IntentClassifier {
    pub fn new(catalog: Vec<IntentDef>, default_threshold: f32) -> Self {
        let intents = catalog
            .into_iter()
            .map(|def| {
                let patterns = def
                    .patterns
                    .iter()
                    .filter_map(|p| compile_pattern(p).map(|r| (p.to_string(), r)))
                    .collect();
                CompiledIntent { def, patterns }
            })
            .collect();
        Self {
            intents,
            matcher: FuzzyMatcher::default(),
            default_threshold,
        }
    }

    /// Known intent names, in registration order.
    pub fn intent_names(&self) -> Vec<&'static str> {
        self.intents.iter().map(|i| i.def.name).collect()
    }

    /// Scores the query against every intent, ranked descending.
    /// Exactly-equal scores keep catalog registration order (stable
    /// sort). An empty query scores nothing.
    pub fn classify(&self, query: &str, context_flags: &HashSet<String>) -> Vec<IntentScore> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Vec::new();
        }
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        let mut scores: Vec<IntentScore> = Vec::new();
        for intent in &self.intents {
            let score = self.score_intent(intent, &normalized, &tokens, context_flags);
            if score.score > 0.0 {
                scores.push(score);
            }
        }

        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(top) = scores.first() {
            debug!(intent = %top.intent, score = top.score, "Classified query");
        }
        scores
    }

    fn score_intent(
        &self,
        intent: &CompiledIntent,
        normalized: &str,
        tokens: &[&str],
        context_flags: &HashSet<String>,
    ) -> IntentScore {
        let def = &intent.def;
        let mut score = 0.0f32;
        let mut matched_keywords = Vec::new();
        let mut matched_patterns = Vec::new();

        for keyword in def.primary_keywords {
            if self.primary_hit(normalized, tokens, keyword) {
                score += PRIMARY_WEIGHT;
                matched_keywords.push(keyword.to_string());
            }
        }
        for keyword in def.secondary_keywords {
            if normalized.contains(keyword) {
                score += SECONDARY_WEIGHT;
                matched_keywords.push(keyword.to_string());
            }
        }
        for synonym in def.synonyms {
            if normalized.contains(synonym) {
                score += SYNONYM_WEIGHT;
                matched_keywords.push(synonym.to_string());
            }
        }
        for (source, regex) in &intent.patterns {
            if regex.is_match(normalized) {
                score += PATTERN_WEIGHT;
                matched_patterns.push(source.clone());
            }
        }

        for negative in def.negative_keywords {
            if normalized.contains(negative) {
                score *= NEGATIVE_FACTOR;
                break;
            }
        }
        for (flag, factor) in def.context_boosters {
            if context_flags.contains(*flag) {
                score *= factor;
            }
        }

        IntentScore {
            intent: def.name.to_string(),
            score,
            confidence: (score / SCORE_NORMALIZER).min(1.0),
            matched_keywords,
            matched_patterns,
        }
    }

    /// Primary keywords accept a substring hit, a token-level fuzzy hit,
    /// or partial containment for tokens of useful length.
    fn primary_hit(&self, normalized: &str, tokens: &[&str], keyword: &str) -> bool {
        if normalized.contains(keyword) {
            return true;
        }
        for token in tokens {
            if self.matcher.similarity(token, keyword) >= TOKEN_FUZZY_FLOOR {
                return true;
            }
            if token.len() >= PARTIAL_MIN_TOKEN_LEN && self.matcher.partial_match(token, keyword) {
                return true;
            }
        }
        false
    }

    pub fn best_intent(&self, query: &str, context_flags: &HashSet<String>) -> Option<IntentScore> {
        self.classify(query, context_flags).into_iter().next()
    }

    /// Per-intent threshold, falling back to the configured default.
    pub fn meets_threshold(&self, score: &IntentScore) -> bool {
        let threshold = self
            .intents
            .iter()
            .find(|i| i.def.name == score.intent)
            .and_then(|i| i.def.threshold)
            .unwrap_or(self.default_threshold);
        score.confidence >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::default()
    }

    fn no_flags() -> HashSet<String> {
        HashSet::new()
    }

    // ---- pattern compilation ----

    #[test]
    fn test_compile_pattern_alternation() {
        let re = compile_pattern("tell me {about|more about} it").unwrap();
        assert!(re.is_match("tell me about it"));
        assert!(re.is_match("Tell me  more about it"));
        assert!(!re.is_match("tell me it"));
    }

    #[test]
    fn test_compile_pattern_separates_groups_from_words() {
        let re = compile_pattern("tell me about {his|her|their} {experience|career|work}").unwrap();
        assert!(re.is_match("tell me about her career"));
        assert!(re.is_match("tell  me about their work"));
        assert!(!re.is_match("tell me abouttheir work"));
    }

    #[test]
    fn test_pattern_signal_reaches_score() {
        let c = classifier();
        let scores = c.classify("tell me about his experience", &no_flags());
        assert!(!scores[0].matched_patterns.is_empty());
        assert!(scores[0].confidence >= 0.8);
    }

    #[test]
    fn test_compile_pattern_plain() {
        let re = compile_pattern("get in touch").unwrap();
        assert!(re.is_match("how do I get in   touch?"));
    }

    // ---- classification ----

    #[test]
    fn test_empty_query() {
        assert!(classifier().classify("", &no_flags()).is_empty());
        assert!(classifier().classify("   ", &no_flags()).is_empty());
    }

    #[test]
    fn test_experience_query() {
        let c = classifier();
        let scores = c.classify("tell me about his experience", &no_flags());
        assert_eq!(scores[0].intent, "experience");
        // keyword +10 and two pattern hits +15 each
        assert!(scores[0].score >= 40.0);
        assert!(c.meets_threshold(&scores[0]));
    }

    #[test]
    fn test_skills_query() {
        let c = classifier();
        let best = c.best_intent("what technologies does she know?", &no_flags()).unwrap();
        assert_eq!(best.intent, "skills");
        assert!(c.meets_threshold(&best));
    }

    #[test]
    fn test_contact_query() {
        let c = classifier();
        let best = c.best_intent("how can i contact him", &no_flags()).unwrap();
        assert_eq!(best.intent, "contact");
        assert!(c.meets_threshold(&best));
    }

    #[test]
    fn test_slang_normalized_before_scoring() {
        let c = classifier();
        let best = c.best_intent("any xp with that?", &no_flags()).unwrap();
        assert_eq!(best.intent, "experience");
    }

    #[test]
    fn test_fuzzy_primary_keyword() {
        let c = classifier();
        // "expereince" is one transposition away
        let best = c.best_intent("his expereince", &no_flags()).unwrap();
        assert_eq!(best.intent, "experience");
    }

    #[test]
    fn test_negative_keyword_penalizes() {
        let c = classifier();
        let scores = c.classify("did his career include school?", &no_flags());
        let exp = scores.iter().find(|s| s.intent == "experience").unwrap();
        let edu = scores.iter().find(|s| s.intent == "education").unwrap();
        // "school" penalizes experience by 0.3 but it still scores
        assert!(exp.score > 0.0);
        assert!(edu.score > exp.score);
    }

    #[test]
    fn test_context_booster() {
        let c = classifier();
        let mut flags = HashSet::new();
        flags.insert("engaged".to_string());
        let plain = c.best_intent("his work experience", &no_flags()).unwrap();
        let boosted = c.best_intent("his work experience", &flags).unwrap();
        assert_eq!(boosted.intent, "experience");
        assert!((boosted.score - plain.score * 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_confidence_clamped() {
        let c = classifier();
        let scores = c.classify(
            "experience work career job role background resume cv",
            &no_flags(),
        );
        assert_eq!(scores[0].confidence, 1.0);
        for s in &scores {
            assert!(s.confidence <= 1.0);
        }
    }

    #[test]
    fn test_gibberish_scores_nothing_above_threshold() {
        let c = classifier();
        for s in c.classify("xjklqwz brtpk", &no_flags()) {
            assert!(!c.meets_threshold(&s));
        }
    }

    #[test]
    fn test_matched_keywords_reported() {
        let c = classifier();
        let best = c.best_intent("work experience", &no_flags()).unwrap();
        assert!(best.matched_keywords.contains(&"experience".to_string()));
        assert!(best.matched_keywords.contains(&"work".to_string()));
    }
}
