//! Small-talk detection and canned responses.
//!
//! Detection reports presence, not dominance: "hi, what did she build?"
//! is both a greeting and a projects question, and the coordinator
//! composes the two downstream.

use rand::Rng;

use parley_core::sampling::weighted_pick;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmallTalkKind {
    Greeting,
    HowAreYou,
    Thanks,
    Goodbye,
    Compliment,
}

const HOW_ARE_YOU: &[&str] = &["how are you", "how's it going", "hows it going", "what's up", "whats up"];
const THANKS: &[&str] = &["thanks", "thank you", "cheers", "appreciated"];
const GOODBYE: &[&str] = &["bye", "goodbye", "see you", "farewell", "gotta go"];
const GREETING: &[&str] = &["hi", "hello", "hey", "yo", "greetings", "good morning", "good afternoon", "good evening"];
const COMPLIMENT: &[&str] = &["nice site", "cool site", "awesome", "impressive", "great work", "love this"];

/// (text, weight) variants per kind. Higher weight = picked more often.
const GREETING_RESPONSES: &[(&str, u32)] = &[
    ("Hi there! Ask me anything about this portfolio.", 3),
    ("Hello! Happy to walk you through the profile.", 2),
    ("Hey! What would you like to know?", 2),
];
const HOW_ARE_YOU_RESPONSES: &[(&str, u32)] = &[
    ("Doing great, thanks for asking! What can I tell you about?", 2),
    ("All good here. Want to hear about the work history?", 1),
    ("Running smoothly! Ask away.", 1),
];
const THANKS_RESPONSES: &[(&str, u32)] = &[
    ("You're welcome!", 3),
    ("Happy to help!", 2),
    ("Anytime!", 1),
];
const GOODBYE_RESPONSES: &[(&str, u32)] = &[
    ("Goodbye! Feel free to come back anytime.", 2),
    ("See you around!", 1),
    ("Take care!", 1),
];
const COMPLIMENT_RESPONSES: &[(&str, u32)] = &[
    ("Thank you! The contact section is right below if you want to say that in person.", 2),
    ("Glad you like it!", 2),
    ("Thanks! Plenty more to explore here.", 1),
];

pub struct SmallTalkHandler;

impl SmallTalkHandler {
    /// First matching kind in priority order, phrase-heavy kinds first
    /// so "hey, how are you" reads as the question rather than the
    /// greeting.
    pub fn detect(query: &str) -> Option<SmallTalkKind> {
        let lower = query.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
            .collect();

        let hit = |set: &[&str]| {
            set.iter().any(|phrase| {
                if phrase.contains(' ') {
                    lower.contains(phrase)
                } else {
                    tokens.contains(phrase)
                }
            })
        };

        if hit(HOW_ARE_YOU) {
            Some(SmallTalkKind::HowAreYou)
        } else if hit(THANKS) {
            Some(SmallTalkKind::Thanks)
        } else if hit(GOODBYE) {
            Some(SmallTalkKind::Goodbye)
        } else if hit(COMPLIMENT) {
            Some(SmallTalkKind::Compliment)
        } else if hit(GREETING) {
            Some(SmallTalkKind::Greeting)
        } else {
            None
        }
    }

    /// Weighted random pick among the canned variants for a kind.
    pub fn respond<R: Rng + ?Sized>(kind: SmallTalkKind, rng: &mut R) -> String {
        let variants = match kind {
            SmallTalkKind::Greeting => GREETING_RESPONSES,
            SmallTalkKind::HowAreYou => HOW_ARE_YOU_RESPONSES,
            SmallTalkKind::Thanks => THANKS_RESPONSES,
            SmallTalkKind::Goodbye => GOODBYE_RESPONSES,
            SmallTalkKind::Compliment => COMPLIMENT_RESPONSES,
        };
        weighted_pick(variants, rng).to_string()
    }
}
