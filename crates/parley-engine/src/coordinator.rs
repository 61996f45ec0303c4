//! Merges partial response components into one reply.

use parley_core::{Reply, ReplyKind};

/// Dominance order when parts of different kinds are merged: the
/// composed reply takes the kind of its most substantial part.
fn dominance(kind: ReplyKind) -> u8 {
    match kind {
        ReplyKind::Answer => 7,
        ReplyKind::Scripted => 6,
        ReplyKind::Clarification => 5,
        ReplyKind::Menu => 4,
        ReplyKind::Fallback => 3,
        ReplyKind::Greeting => 2,
        ReplyKind::Debug => 1,
        ReplyKind::Error => 0,
    }
}

pub struct ResponseCoordinator {
    max_suggestions: usize,
}

impl ResponseCoordinator {
    pub fn new(max_suggestions: usize) -> Self {
        Self { max_suggestions }
    }

    /// Composes the parts in the order given: texts joined with a
    /// space (greeting first by caller convention), suggestions merged
    /// and deduplicated up to the cap, confidence is the max of parts,
    /// kind follows the dominant part.
    pub fn compose(&self, parts: Vec<Reply>) -> Option<Reply> {
        let mut parts: Vec<Reply> = parts.into_iter().filter(|p| !p.text.is_empty()).collect();
        if parts.is_empty() {
            return None;
        }
        if parts.len() == 1 {
            let mut only = parts.remove(0);
            only.suggestions.truncate(self.max_suggestions);
            return Some(only);
        }

        let text = parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut suggestions: Vec<String> = Vec::new();
        for part in &parts {
            for s in &part.suggestions {
                if !suggestions.iter().any(|have| have.eq_ignore_ascii_case(s)) {
                    suggestions.push(s.clone());
                }
            }
        }
        suggestions.truncate(self.max_suggestions);

        let commands = parts.iter().flat_map(|p| p.commands.clone()).collect();
        let confidence = parts.iter().map(|p| p.confidence).fold(0.0, f32::max);
        let kind = parts
            .iter()
            .map(|p| p.kind)
            .max_by_key(|k| dominance(*k))
            .unwrap_or(ReplyKind::Answer);
        let intent = parts.iter().find_map(|p| p.intent.clone());

        Some(Reply {
            text,
            suggestions,
            commands,
            intent,
            confidence,
            kind,
        })
    }
}
