use regex::Regex;
use std::sync::LazyLock;

/// Slang and abbreviation expansions applied before classification.
/// Order matters only for readability; substitution is word-bounded so
/// entries never overlap.
const SLANG: &[(&str, &str)] = &[
    ("u", "you"),
    ("ur", "your"),
    ("thx", "thanks"),
    ("ty", "thanks"),
    ("pls", "please"),
    ("plz", "please"),
    ("sklz", "skills"),
    ("xp", "experience"),
    ("exp", "experience"),
    ("edu", "education"),
    ("abt", "about"),
    ("wat", "what"),
    ("wut", "what"),
    ("bc", "because"),
    ("cuz", "because"),
    ("rn", "right now"),
    ("msg", "message"),
    ("info", "information"),
];

static SLANG_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    SLANG
        .iter()
        .map(|(from, to)| {
            let pattern = format!(r"\b{}\b", regex::escape(from));
            (Regex::new(&pattern).expect("static slang pattern"), *to)
        })
        .collect()
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

/// Lowercases, collapses whitespace, and expands chat slang so the
/// classifier only ever sees canonical vocabulary.
pub fn normalize_query(raw: &str) -> String {
    let mut text = raw.trim().to_lowercase();
    text = WHITESPACE.replace_all(&text, " ").to_string();

    for (pattern, replacement) in SLANG_PATTERNS.iter() {
        text = pattern.replace_all(&text, *replacement).to_string();
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_whitespace() {
        assert_eq!(normalize_query("  What   IS  this "), "what is this");
    }

    #[test]
    fn test_slang_expansion() {
        assert_eq!(normalize_query("wut r u abt"), "what r you about");
        assert_eq!(normalize_query("show ur sklz pls"), "show your skills please");
    }

    #[test]
    fn test_xp_expands_to_experience() {
        assert_eq!(normalize_query("any xp with rust?"), "any experience with rust?");
        assert_eq!(normalize_query("work exp"), "work experience");
    }

    #[test]
    fn test_word_boundary_respected() {
        // "u" inside a word must not expand
        assert_eq!(normalize_query("education value"), "education value");
        assert_eq!(normalize_query("experience"), "experience");
    }

    #[test]
    fn test_multi_word_replacement() {
        assert_eq!(normalize_query("what are you doing rn"), "what are you doing right now");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_query(""), "");
        assert_eq!(normalize_query("   "), "");
    }
}
