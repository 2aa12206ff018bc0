//! Plain-text views of a [`ResolvedResult`] for language-model prompts.

use crate::types::{MatchCandidate, ResolvedResult};

/// `id|name|category`, one candidate per line
#[must_use]
pub fn render_entity_lines(candidates: &[MatchCandidate]) -> String {
    candidates
        .iter()
        .map(|c| format!("{}|{}|{}", c.entity_id, c.name, c.category))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `name (category)`, one candidate per line
#[must_use]
pub fn render_named_lines(candidates: &[MatchCandidate]) -> String {
    candidates
        .iter()
        .map(|c| format!("{} ({})", c.name, c.category))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Grounding block followed by the user's question
#[must_use]
pub fn build_context_prompt(result: &ResolvedResult) -> String {
    format!(
        "Known Entities in this company:\n{}\n\nUser question: {}\nAnswer based only on above entities and known financial context.",
        render_named_lines(&result.candidates),
        result.query
    )
}
