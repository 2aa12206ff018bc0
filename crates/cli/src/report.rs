use crate::OutputFormat;
use grounder_search::{
    build_context_prompt, render_entity_lines, render_named_lines, CatalogStats, ResolvedResult,
};

pub(crate) fn render(result: &ResolvedResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => render_table(result),
        OutputFormat::Lines => render_entity_lines(&result.candidates),
        OutputFormat::Named => render_named_lines(&result.candidates),
        OutputFormat::Prompt => build_context_prompt(result),
    }
}

fn render_table(result: &ResolvedResult) -> String {
    if result.is_empty() {
        return "No matching entities".to_string();
    }
    result
        .iter()
        .enumerate()
        .map(|(rank, c)| {
            let via = c
                .matched_phrase
                .as_deref()
                .map(|phrase| format!("  (via \"{phrase}\")"))
                .unwrap_or_default();
            format!(
                "{:>2}. {:>6.1}  {:<8}  {:<14}  {:<8}  {}{}",
                rank + 1,
                c.score,
                c.source.to_string(),
                c.category.label(),
                c.entity_id.as_str(),
                c.name,
                via
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn render_stats(stats: &CatalogStats, stopwords: &[&str]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Catalog generation {}\n", stats.generation));
    out.push_str(&format!("Entities: {}\n", stats.entities));
    for (category, count) in &stats.counts {
        out.push_str(&format!("  {:<14} {}\n", category.label(), count));
    }
    out.push_str(&format!("Vocabulary: {} tokens\n", stats.vocabulary));
    out.push_str(&format!("Exact patterns: {}\n", stats.exact_patterns));
    out.push_str(&format!(
        "Vector index: {}\n",
        stats.vector_index.as_deref().unwrap_or("disabled")
    ));
    if let Some(model) = &stats.embedding_model {
        out.push_str(&format!("Embedding model: {model}\n"));
    }
    out.push_str(&format!("Fingerprint: {}\n", stats.fingerprint));
    out.push_str(&format!(
        "Stopwords ({}): {}",
        stopwords.len(),
        stopwords.join(", ")
    ));
    out
}
