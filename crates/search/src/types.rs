use grounder_catalog::{Category, EntityId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Which scoring strategy produced a candidate's final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Exact,
    Fuzzy,
    Semantic,
    /// A category keyword boost was added on top of the best source score
    Boosted,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Semantic => "semantic",
            Self::Boosted => "boosted",
        })
    }
}

/// One entity proposed for a query, on the 0..=100 (+ boost) scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub entity_id: EntityId,
    pub category: Category,
    pub name: String,
    pub score: f32,
    pub source: MatchSource,
    /// Boost included in `score`
    #[serde(default, skip_serializing_if = "is_zero")]
    pub boost: f32,
    /// Query phrase a fuzzy hit was scored from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_phrase: Option<String>,
}

fn is_zero(value: &f32) -> bool {
    *value == 0.0
}

impl MatchCandidate {
    /// Merge identity
    #[must_use]
    pub fn key(&self) -> (Category, &EntityId) {
        (self.category, &self.entity_id)
    }
}

/// Ranked, deduplicated candidates for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResult {
    pub query: String,
    /// Generation of the catalog snapshot the query ran against
    pub generation: u64,
    pub candidates: Vec<MatchCandidate>,
}

impl ResolvedResult {
    #[must_use]
    pub fn empty(query: &str, generation: u64) -> Self {
        Self {
            query: query.to_string(),
            generation,
            candidates: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchCandidate> {
        self.candidates.iter()
    }

    /// Candidate names in rank order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a ResolvedResult {
    type Item = &'a MatchCandidate;
    type IntoIter = std::slice::Iter<'a, MatchCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Per-call knobs for [`crate::Resolver::match_with_options`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Result length; `None` uses the configured default
    pub top_k: Option<usize>,
    /// Restrict candidates to these categories; empty means all
    pub categories: Vec<Category>,
}

impl MatchOptions {
    #[must_use]
    pub fn top_k(top_k: usize) -> Self {
        Self {
            top_k: Some(top_k),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub(crate) fn allows(&self, category: Category) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }
}

/// Total order on scores, higher first
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Score(pub f32);

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
