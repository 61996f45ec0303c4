//! Canned-but-randomized responses for each failure category.
//!
//! Every category pairs a weighted set of response lines with a fixed,
//! small suggestion set. A confused user never sees the full menu.

use rand::Rng;

use parley_core::sampling::weighted_pick;
use parley_core::{Reply, ReplyKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FallbackCategory {
    /// Follow-up reference with no history behind it.
    NoContext,
    /// Non-specific query ("something", "whatever").
    Vague,
    /// No intent cleared its threshold.
    LowConfidence,
    /// Keyboard mashing.
    Gibberish,
    /// "Tell me everything" style requests.
    TooBroad,
}

struct CategoryDef {
    variants: &'static [(&'static str, u32)],
    suggestions: &'static [&'static str],
}

const NO_CONTEXT: CategoryDef = CategoryDef {
    variants: &[
        ("We haven't talked about anything yet — what would you like to know?", 3),
        ("I don't have anything to go back to. Pick a topic to start with.", 2),
        ("Nothing on record so far. Want an overview first?", 1),
    ],
    suggestions: &["experience", "skills"],
};

const VAGUE: CategoryDef = CategoryDef {
    variants: &[
        ("Here's a place to start.", 3),
        ("Let me pick something interesting for you.", 2),
        ("How about this:", 1),
    ],
    suggestions: &["experience", "skills", "about"],
};

const LOW_CONFIDENCE: CategoryDef = CategoryDef {
    variants: &[
        ("I'm not sure I follow. Could you rephrase, or pick one of these?", 3),
        ("That one's beyond me — try asking about the work history or skills.", 2),
        ("Hmm, I didn't quite get that. One of these might help.", 1),
    ],
    suggestions: &["experience", "skills", "contact"],
};

const GIBBERISH: CategoryDef = CategoryDef {
    variants: &[
        ("That doesn't look like a question I can parse. Try one of these.", 3),
        ("My keyboard does that sometimes too. Pick a topic below?", 2),
        ("I couldn't make sense of that one. These work though:", 1),
    ],
    suggestions: &["experience", "skills"],
};

const TOO_BROAD: CategoryDef = CategoryDef {
    variants: &[
        ("That's a lot of ground! Let's take it one topic at a time.", 3),
        ("Everything is a big ask — start with one of these?", 2),
        ("Happy to cover it all, piece by piece. Where first?", 1),
    ],
    suggestions: &["experience", "skills", "education"],
};

impl FallbackCategory {
    fn def(self) -> &'static CategoryDef {
        match self {
            FallbackCategory::NoContext => &NO_CONTEXT,
            FallbackCategory::Vague => &VAGUE,
            FallbackCategory::LowConfidence => &LOW_CONFIDENCE,
            FallbackCategory::Gibberish => &GIBBERISH,
            FallbackCategory::TooBroad => &TOO_BROAD,
        }
    }

    /// Stable name for analytics.
    pub fn name(self) -> &'static str {
        match self {
            FallbackCategory::NoContext => "no_context",
            FallbackCategory::Vague => "vague",
            FallbackCategory::LowConfidence => "low_confidence",
            FallbackCategory::Gibberish => "gibberish",
            FallbackCategory::TooBroad => "too_broad",
        }
    }
}

pub struct FallbackStrategy;

impl FallbackStrategy {
    /// A fallback reply for the category, with its fixed suggestions
    /// and a weighted-random response line.
    pub fn respond<R: Rng + ?Sized>(category: FallbackCategory, rng: &mut R) -> Reply {
        let def = category.def();
        let text = weighted_pick(def.variants, rng);
        Reply::plain(text, ReplyKind::Fallback)
            .with_suggestions(def.suggestions.iter().map(|s| s.to_string()).collect())
    }
}
