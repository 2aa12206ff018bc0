use crate::config::StopwordConfig;
use crate::normalize::{normalize, tokens};
use std::collections::{BTreeSet, HashSet};

/// Question scaffolding that never names an entity on its own
pub const BASE_STOPWORDS: &[&str] = &[
    "what", "is", "are", "the", "for", "a", "an", "of", "and", "in", "on", "at", "from", "to",
    "by", "this", "that", "did", "we", "do", "amount", "total", "how", "much", "please", "give",
    "me", "show", "whats", "hows", "does", "compare", "list",
];

/// Reporting vocabulary that shows up in questions far more often than in names
pub const DOMAIN_FILLER: &[&str] = &[
    "trend",
    "sales",
    "sale",
    "monthly",
    "quarterly",
    "yearly",
    "report",
];

/// Catalog-aware token filter.
///
/// A listed stopword is only effective if no entity name contains it as a
/// token, so filler words that double as real name parts survive.
#[derive(Debug, Clone, Default)]
pub struct StopwordFilter {
    stopwords: HashSet<String>,
    vocabulary: HashSet<String>,
}

impl StopwordFilter {
    /// `normalized_names` must already be normalized
    pub fn build<'a>(
        normalized_names: impl IntoIterator<Item = &'a str>,
        config: &StopwordConfig,
    ) -> Self {
        let vocabulary: HashSet<String> = normalized_names
            .into_iter()
            .flat_map(tokens)
            .map(str::to_string)
            .collect();

        let domain: Vec<String> = match &config.domain {
            Some(words) => words.clone(),
            None => DOMAIN_FILLER.iter().map(|w| w.to_string()).collect(),
        };

        let stopwords = BASE_STOPWORDS
            .iter()
            .map(|w| w.to_string())
            .chain(config.extra.iter().cloned())
            .chain(domain)
            // configured words go through the same normalization as queries
            .flat_map(|w| tokens(&normalize(&w)).map(str::to_string).collect::<Vec<_>>())
            .filter(|w| !vocabulary.contains(w))
            .collect();

        Self {
            stopwords,
            vocabulary,
        }
    }

    #[must_use]
    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    #[must_use]
    pub fn in_vocabulary(&self, token: &str) -> bool {
        self.vocabulary.contains(token)
    }

    /// Whether a normalized query token survives filtering
    #[must_use]
    pub fn keeps(&self, token: &str) -> bool {
        if self.is_stopword(token) {
            return false;
        }
        token.chars().count() > 1 || self.in_vocabulary(token)
    }

    pub fn filter<'a>(&self, tokens: &[&'a str]) -> Vec<&'a str> {
        tokens.iter().copied().filter(|t| self.keeps(t)).collect()
    }

    /// Effective stopwords, sorted
    #[must_use]
    pub fn effective(&self) -> Vec<&str> {
        self.stopwords
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}
