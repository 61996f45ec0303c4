//! Input sanity checks: gibberish, vagueness, and follow-ups that have
//! no history to follow up on.

use crate::reference::ReferenceType;

/// Keyboard-roll fragments that mark mashed input outright.
const KEYBOARD_ROLLS: &[&str] = &[
    "qwert", "werty", "asdf", "sdfg", "dfgh", "zxcv", "xcvb", "hjkl", "qazwsx",
];

/// Vowel ratio below this over a minimum length reads as mashing.
const VOWEL_RATIO_FLOOR: f64 = 0.15;
const VOWEL_RATIO_MIN_LEN: usize = 5;
const MAX_CONSONANT_RUN: usize = 6;

/// Non-specific words that carry no answerable content on their own.
const VAGUE_WORDS: &[&str] = &[
    "something",
    "anything",
    "whatever",
    "stuff",
    "idk",
    "dunno",
    "everything",
];

/// Outcome of checking a follow-up reference against history.
#[derive(Clone, Debug, PartialEq)]
pub enum FollowUpValidation {
    Valid,
    /// Nothing to follow up on; carries a clarifying prompt.
    NoContext { prompt: String },
}

pub struct ContextValidator;

impl ContextValidator {
    /// True for keyboard mashing: known roll fragments, a starved vowel
    /// ratio, or a long consonant run.
    pub fn is_gibberish(query: &str) -> bool {
        let lower = query.trim().to_lowercase();
        if lower.is_empty() {
            return false;
        }

        if KEYBOARD_ROLLS.iter().any(|roll| lower.contains(roll)) {
            return true;
        }

        let alphabetic: Vec<char> = lower.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        if alphabetic.len() >= VOWEL_RATIO_MIN_LEN {
            let vowels = alphabetic
                .iter()
                .filter(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
                .count();
            if (vowels as f64) / (alphabetic.len() as f64) < VOWEL_RATIO_FLOOR {
                return true;
            }
        }

        let mut run = 0usize;
        for c in lower.chars() {
            if c.is_ascii_alphabetic() && !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u') {
                run += 1;
                if run >= MAX_CONSONANT_RUN {
                    return true;
                }
            } else {
                run = 0;
            }
        }

        false
    }

    /// True when the query contains a non-specific filler word.
    pub fn is_vague(query: &str) -> bool {
        let lower = query.trim().to_lowercase();
        lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .any(|token| VAGUE_WORDS.contains(&token))
    }

    /// Follow-up references only make sense with prior turns.
    pub fn validate_follow_up(ref_type: ReferenceType, history_len: usize) -> FollowUpValidation {
        let needs_history = matches!(
            ref_type,
            ReferenceType::Pronoun
                | ReferenceType::More
                | ReferenceType::Previous
                | ReferenceType::Next
        );
        if needs_history && history_len == 0 {
            FollowUpValidation::NoContext {
                prompt: "We haven't talked about anything yet. What would you like to know?"
                    .to_string(),
            }
        } else {
            FollowUpValidation::Valid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- gibberish ----

    #[test]
    fn test_keyboard_roll() {
        assert!(ContextValidator::is_gibberish("asdfgh"));
        assert!(ContextValidator::is_gibberish("qwertyuiop"));
    }

    #[test]
    fn test_no_vowels() {
        assert!(ContextValidator::is_gibberish("xjklqwz"));
    }

    #[test]
    fn test_consonant_run() {
        assert!(ContextValidator::is_gibberish("abcdfghjo"));
    }

    #[test]
    fn test_normal_text_not_gibberish() {
        assert!(!ContextValidator::is_gibberish("tell me about his experience"));
        assert!(!ContextValidator::is_gibberish("skills"));
        assert!(!ContextValidator::is_gibberish(""));
    }

    #[test]
    fn test_short_low_vowel_not_gibberish() {
        // below the minimum length for the vowel-ratio rule
        assert!(!ContextValidator::is_gibberish("gdp"));
    }

    // ---- vague ----

    #[test]
    fn test_vague() {
        assert!(ContextValidator::is_vague("tell me something"));
        assert!(ContextValidator::is_vague("idk"));
        assert!(!ContextValidator::is_vague("tell me about rust"));
    }

    // ---- follow-up ----

    #[test]
    fn test_follow_up_without_history() {
        let v = ContextValidator::validate_follow_up(ReferenceType::More, 0);
        assert!(matches!(v, FollowUpValidation::NoContext { .. }));
    }

    #[test]
    fn test_follow_up_with_history() {
        let v = ContextValidator::validate_follow_up(ReferenceType::More, 2);
        assert_eq!(v, FollowUpValidation::Valid);
    }

    #[test]
    fn test_context_switch_never_needs_history() {
        let v = ContextValidator::validate_follow_up(ReferenceType::ContextSwitch, 0);
        assert_eq!(v, FollowUpValidation::Valid);
    }
}
