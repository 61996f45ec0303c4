use serde::{Deserialize, Serialize};

// =============================================================================
// Replies
// =============================================================================

/// What kind of reply the engine produced for a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// An intent was classified and answered from profile content.
    Answer,
    /// A small-talk response (greeting, thanks, goodbye).
    Greeting,
    /// The resolver needs the user to pick between candidates.
    Clarification,
    /// A safe canned response after the understanding layers missed.
    Fallback,
    /// The top-level menu, shown after an interrupt or reset.
    Menu,
    /// A canned message from an active scripted flow.
    Scripted,
    /// Internal state snapshot for the debug command.
    Debug,
    /// Generic apology after a timeout or unexpected failure.
    Error,
}

/// An abstract command for the presentation layer to execute.
///
/// The engine never touches rendering; it emits these and the widget
/// decides how to act on them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiCommand {
    /// Scroll the page to a named section.
    Scroll { target: String },
    /// Offer a downloadable resource (e.g. a resume PDF).
    Download { resource: String },
    /// Switch the site theme.
    Theme { value: String },
    /// Open an external link.
    OpenLink { url: String },
}

/// The user-visible result of one turn.
///
/// The engine's contract is that every turn produces one of these with
/// non-empty text; errors and timeouts are converted before they escape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reply {
    /// Natural-language response text.
    pub text: String,
    /// Follow-up suggestion chips (possibly empty, never the full menu
    /// after a fallback).
    pub suggestions: Vec<String>,
    /// Abstract UI commands for the presentation layer.
    pub commands: Vec<UiCommand>,
    /// The classified intent that produced this reply, if any.
    pub intent: Option<String>,
    /// Confidence in the reply, 0.0 to 1.0.
    pub confidence: f32,
    /// Reply category.
    pub kind: ReplyKind,
}

impl Reply {
    /// A reply with just text and a kind; suggestions and commands empty.
    pub fn plain(text: impl Into<String>, kind: ReplyKind) -> Self {
        Self {
            text: text.into(),
            suggestions: Vec::new(),
            commands: Vec::new(),
            intent: None,
            confidence: 0.0,
            kind,
        }
    }

    /// Attach suggestion chips.
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Attach a confidence figure.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

// =============================================================================
// Analyzer outputs
// =============================================================================

/// A structured value recognized inside free text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Entity category (e.g. "company", "skill").
    pub entity_type: String,
    /// Canonical extracted value.
    pub value: String,
    /// Extraction confidence, 0.0 to 1.0. Verbatim matches score 1.0,
    /// fuzzy and pattern matches less.
    pub confidence: f32,
    /// Byte offset of the match in the normalized query.
    pub position: usize,
}

/// One candidate intent with its accumulated evidence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntentScore {
    /// Intent name from the catalog.
    pub intent: String,
    /// Raw additive score (unbounded above).
    pub score: f32,
    /// Clamped confidence, `min(score / normalizer, 1.0)`.
    pub confidence: f32,
    /// Keywords that contributed to the score.
    pub matched_keywords: Vec<String>,
    /// Semantic patterns that matched.
    pub matched_patterns: Vec<String>,
}
