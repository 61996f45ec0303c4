use strsim::levenshtein;

/// Default acceptance threshold for [`FuzzyMatcher::matches`].
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Minimum length ratio (shorter/longer) before a partial containment
/// match is trusted. Below this, a short query matching inside a long
/// candidate is noise.
pub const PARTIAL_LENGTH_RATIO: f64 = 0.6;

// ============================================================================
// Types
// ============================================================================

/// Outcome of [`FuzzyMatcher::find_best_match`].
#[derive(Clone, Debug, PartialEq)]
pub struct BestMatch<'a> {
    pub value: &'a str,
    pub score: f64,
}

/// How a candidate was matched, in decreasing order of trust.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    Phonetic,
    Partial,
}

/// Outcome of [`FuzzyMatcher::smart_match`].
#[derive(Clone, Debug, PartialEq)]
pub struct SmartMatch {
    pub method: MatchMethod,
    pub confidence: f64,
}

// ============================================================================
// FuzzyMatcher
// ============================================================================

/// Normalizing string matcher built on unit-cost edit distance.
pub struct FuzzyMatcher {
    /// Similarity threshold (0.0-1.0) for a fuzzy hit.
    pub threshold: f64,
    /// Shorter/longer length ratio gate for partial containment.
    pub partial_length_ratio: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            partial_length_ratio: PARTIAL_LENGTH_RATIO,
        }
    }
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    fn normalize(s: &str) -> String {
        s.trim().to_lowercase()
    }

    /// Similarity between two strings in [0.0, 1.0].
    ///
    /// Identical (after trim + lowercase) scores 1.0; either side empty
    /// scores 0.0; otherwise `1 - levenshtein / max(char_len)`.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let a = Self::normalize(a);
        let b = Self::normalize(b);

        if a == b {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let max_len = a.chars().count().max(b.chars().count());
        let distance = levenshtein(&a, &b);
        1.0 - (distance as f64 / max_len as f64)
    }

    /// Whether two strings are similar at or above the threshold.
    pub fn matches(&self, a: &str, b: &str, threshold: Option<f64>) -> bool {
        self.similarity(a, b) >= threshold.unwrap_or(self.threshold)
    }

    /// Highest scoring candidate at or above `min_score` (default = the
    /// configured threshold).
    pub fn find_best_match<'a>(
        &self,
        query: &str,
        candidates: &'a [&'a str],
        min_score: Option<f64>,
    ) -> Option<BestMatch<'a>> {
        let floor = min_score.unwrap_or(self.threshold);
        let mut best: Option<BestMatch<'a>> = None;

        for candidate in candidates {
            let score = self.similarity(query, candidate);
            if score < floor {
                continue;
            }
            match &best {
                Some(b) if b.score >= score => {}
                _ => {
                    best = Some(BestMatch {
                        value: candidate,
                        score,
                    })
                }
            }
        }

        best
    }

    /// Coarse phonetic equality. Deliberately lossy: good enough to
    /// equate "kubernetes"/"koobernetis", not a real Soundex.
    pub fn sounds_like(&self, a: &str, b: &str) -> bool {
        let ka = phonetic_key(a);
        let kb = phonetic_key(b);
        !ka.is_empty() && ka == kb
    }

    /// Substring containment in either direction after normalization.
    pub fn partial_match(&self, a: &str, b: &str) -> bool {
        let a = Self::normalize(a);
        let b = Self::normalize(b);
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a.contains(&b) || b.contains(&a)
    }

    /// Matches a query against a candidate through the full strategy
    /// chain: exact, fuzzy, phonetic, then partial. Partial containment
    /// only counts when the shorter string is a meaningful fraction of
    /// the longer one.
    pub fn smart_match(&self, query: &str, candidate: &str) -> Option<SmartMatch> {
        let q = Self::normalize(query);
        let c = Self::normalize(candidate);

        if q.is_empty() || c.is_empty() {
            return None;
        }

        if q == c {
            return Some(SmartMatch {
                method: MatchMethod::Exact,
                confidence: 1.0,
            });
        }

        let score = self.similarity(&q, &c);
        if score >= self.threshold {
            return Some(SmartMatch {
                method: MatchMethod::Fuzzy,
                confidence: score,
            });
        }

        if self.sounds_like(&q, &c) {
            return Some(SmartMatch {
                method: MatchMethod::Phonetic,
                confidence: 0.8,
            });
        }

        if self.partial_match(&q, &c) {
            let shorter = q.chars().count().min(c.chars().count()) as f64;
            let longer = q.chars().count().max(c.chars().count()) as f64;
            if shorter / longer >= self.partial_length_ratio {
                return Some(SmartMatch {
                    method: MatchMethod::Partial,
                    confidence: 0.7,
                });
            }
        }

        None
    }
}

// ============================================================================
// Phonetic key
// ============================================================================

const DIGRAPHS: &[(&str, &str)] = &[
    ("sch", "sh"),
    ("ph", "f"),
    ("gh", "g"),
    ("ck", "k"),
    ("qu", "kw"),
    ("wr", "r"),
    ("kn", "n"),
    ("x", "ks"),
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Reduces a word to a rough phonetic signature: digraph
/// canonicalization, vowel runs collapsed to a single `*` marker,
/// doubled consonants collapsed.
fn phonetic_key(s: &str) -> String {
    let mut word: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();

    for (from, to) in DIGRAPHS {
        word = word.replace(from, to);
    }

    let mut key = String::with_capacity(word.len());
    let mut prev: Option<char> = None;
    for c in word.chars() {
        let c = if is_vowel(c) { '*' } else { c };
        if prev == Some(c) {
            continue;
        }
        key.push(c);
        prev = Some(c);
    }
    key
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- similarity ----

    #[test]
    fn test_identical_strings() {
        let m = FuzzyMatcher::default();
        assert_eq!(m.similarity("rust", "rust"), 1.0);
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let m = FuzzyMatcher::default();
        assert_eq!(m.similarity("  Rust ", "rust"), 1.0);
    }

    #[test]
    fn test_empty_inputs() {
        let m = FuzzyMatcher::default();
        assert_eq!(m.similarity("", "rust"), 0.0);
        assert_eq!(m.similarity("rust", ""), 0.0);
        // both empty normalize to identical
        assert_eq!(m.similarity("", ""), 1.0);
    }

    #[test]
    fn test_single_char_no_panic() {
        let m = FuzzyMatcher::default();
        let s = m.similarity("a", "b");
        assert!(s >= 0.0 && s <= 1.0);
    }

    #[test]
    fn test_one_edit() {
        let m = FuzzyMatcher::default();
        // "skils" vs "skills": 1 edit over 6 chars
        let s = m.similarity("skils", "skills");
        assert!((s - (1.0 - 1.0 / 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_strings_low() {
        let m = FuzzyMatcher::default();
        assert!(m.similarity("abc", "xyz") < 0.3);
    }

    // ---- matches / thresholds ----

    #[test]
    fn test_matches_default_threshold() {
        let m = FuzzyMatcher::default();
        assert!(m.matches("skils", "skills", None));
        assert!(!m.matches("cat", "dog", None));
    }

    #[test]
    fn test_matches_override_threshold() {
        let m = FuzzyMatcher::default();
        assert!(!m.matches("skils", "skills", Some(0.95)));
        assert!(m.matches("cat", "dog", Some(0.0)));
    }

    #[test]
    fn test_threshold_boundary_inclusive() {
        let m = FuzzyMatcher::default();
        let s = m.similarity("skils", "skills");
        assert!(m.matches("skils", "skills", Some(s)));
        assert!(!m.matches("skils", "skills", Some(s + 0.001)));
    }

    // ---- find_best_match ----

    #[test]
    fn test_best_match_picks_highest() {
        let m = FuzzyMatcher::default();
        let candidates = ["python", "rust", "ruby"];
        let best = m.find_best_match("rsut", &candidates, None).unwrap();
        assert_eq!(best.value, "rust");
    }

    #[test]
    fn test_best_match_respects_floor() {
        let m = FuzzyMatcher::default();
        let candidates = ["python", "java"];
        assert!(m.find_best_match("rust", &candidates, None).is_none());
    }

    #[test]
    fn test_best_match_empty_candidates() {
        let m = FuzzyMatcher::default();
        assert!(m.find_best_match("rust", &[], None).is_none());
    }

    // ---- phonetic ----

    #[test]
    fn test_sounds_like_digraphs() {
        let m = FuzzyMatcher::default();
        assert!(m.sounds_like("phone", "fone"));
        assert!(m.sounds_like("knight", "night"));
        assert!(m.sounds_like("back", "bak"));
    }

    #[test]
    fn test_sounds_like_vowel_runs() {
        let m = FuzzyMatcher::default();
        assert!(m.sounds_like("lead", "led"));
        assert!(m.sounds_like("koobernetes", "kubernetes"));
    }

    #[test]
    fn test_sounds_like_rejects_different() {
        let m = FuzzyMatcher::default();
        assert!(!m.sounds_like("rust", "python"));
    }

    #[test]
    fn test_sounds_like_empty_never_matches() {
        let m = FuzzyMatcher::default();
        assert!(!m.sounds_like("", ""));
        assert!(!m.sounds_like("123", "456"));
    }

    // ---- partial ----

    #[test]
    fn test_partial_both_directions() {
        let m = FuzzyMatcher::default();
        assert!(m.partial_match("script", "javascript"));
        assert!(m.partial_match("javascript", "script"));
        assert!(!m.partial_match("rust", "python"));
    }

    // ---- smart_match ----

    #[test]
    fn test_smart_exact_wins() {
        let m = FuzzyMatcher::default();
        let hit = m.smart_match("Rust", "rust").unwrap();
        assert_eq!(hit.method, MatchMethod::Exact);
        assert_eq!(hit.confidence, 1.0);
    }

    #[test]
    fn test_smart_fuzzy_before_phonetic() {
        let m = FuzzyMatcher::default();
        let hit = m.smart_match("skils", "skills").unwrap();
        assert_eq!(hit.method, MatchMethod::Fuzzy);
        assert!(hit.confidence >= m.threshold);
    }

    #[test]
    fn test_smart_phonetic() {
        let m = FuzzyMatcher::default();
        let hit = m.smart_match("knight", "night").unwrap();
        assert_eq!(hit.method, MatchMethod::Phonetic);
        assert_eq!(hit.confidence, 0.8);
    }

    #[test]
    fn test_smart_partial_respects_length_ratio() {
        let m = FuzzyMatcher::default();
        // "script"/"javascript" = 6/10 = exactly 0.6, passes
        let hit = m.smart_match("script", "javascript").unwrap();
        assert_eq!(hit.method, MatchMethod::Partial);
        assert_eq!(hit.confidence, 0.7);
        // "cat"/"concatenation" = 3/13, too short
        assert!(m.smart_match("cat", "concatenation").is_none());
    }

    #[test]
    fn test_smart_no_match() {
        let m = FuzzyMatcher::default();
        assert!(m.smart_match("banana", "kubernetes").is_none());
        assert!(m.smart_match("", "rust").is_none());
    }
}
