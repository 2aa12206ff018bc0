use crate::boost::default_keywords;
use crate::error::{Result, SearchError};
use grounder_catalog::Category;
use grounder_vector_store::{Metric, StoreOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Longest n-gram span the matcher accepts
pub const MAX_NGRAM_LIMIT: usize = 5;

/// Resolver tuning, loadable from TOML. Every section and field is optional.
///
/// ```toml
/// [matching]
/// top_k = 5
///
/// [fuzzy]
/// threshold = 80
///
/// [boost]
/// max_total = inf          # uncapped
///
/// [boost.keywords]
/// ledger = ["sales", "gst"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub matching: MatchingConfig,
    pub fuzzy: FuzzyConfig,
    pub semantic: SemanticConfig,
    pub boost: BoostConfig,
    pub stopwords: StopwordConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingConfig {
    /// Result length when the caller does not pass one
    pub top_k: usize,
    /// Longest phrase (in tokens) handed to the fuzzy matcher
    pub max_ngram: usize,
    /// Tokens beyond this are dropped before n-gram generation
    pub max_query_tokens: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_ngram: 4,
            max_query_tokens: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FuzzyConfig {
    /// Minimum score (0..=100) a phrase/name pair needs to become a candidate
    pub threshold: f32,
    /// Entities kept per phrase
    pub top_n: usize,
    /// Retry with every unfiltered query token when the n-gram pass finds nothing
    pub token_fallback: bool,
    /// Weight of the best contiguous-window score for phrases shorter than the name
    pub partial_scale: f32,
    /// Window weight when the window covers none of the name; full coverage
    /// weighs 1. Keeps one shared generic word under the threshold.
    pub coverage_floor: f32,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            threshold: 75.0,
            top_n: 5,
            token_fallback: true,
            partial_scale: 0.9,
            coverage_floor: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SemanticConfig {
    pub enabled: bool,
    pub top_n: usize,
    /// Floor on the 0..=100 similarity scale
    pub min_similarity: f32,
    pub metric: Metric,
    pub ann_threshold: usize,
    pub shortlist_factor: usize,
    pub query_cache_capacity: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        let store = StoreOptions::default();
        Self {
            enabled: true,
            top_n: 10,
            min_similarity: 50.0,
            metric: store.metric,
            ann_threshold: store.ann_threshold,
            shortlist_factor: store.shortlist_factor,
            query_cache_capacity: 256,
        }
    }
}

impl SemanticConfig {
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            metric: self.metric,
            ann_threshold: self.ann_threshold,
            shortlist_factor: self.shortlist_factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoostConfig {
    /// Points added per distinct keyword found in the query
    pub increment: f32,
    /// Ceiling on the total boost of one category (`inf` disables it)
    pub max_total: f32,
    pub keywords: BTreeMap<Category, Vec<String>>,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            increment: 10.0,
            max_total: 30.0,
            keywords: default_keywords(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StopwordConfig {
    /// Added to the built-in base stopwords
    pub extra: Vec<String>,
    /// Replaces the built-in domain filler words when present
    pub domain: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Categories that must be non-empty for a reload to succeed
    pub required: Vec<Category>,
    /// Categories fetched by `Resolver::reload_from`; empty means all
    pub categories: Vec<Category>,
}

impl CatalogConfig {
    #[must_use]
    pub fn fetch_categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            Category::ALL.to_vec()
        } else {
            self.categories.clone()
        }
    }
}

impl ResolverConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SearchError::InvalidConfig(msg));

        if self.matching.top_k == 0 {
            return invalid("matching.top_k must be > 0".to_string());
        }
        if !(1..=MAX_NGRAM_LIMIT).contains(&self.matching.max_ngram) {
            return invalid(format!(
                "matching.max_ngram ({}) must be within 1..={MAX_NGRAM_LIMIT}",
                self.matching.max_ngram
            ));
        }
        if self.matching.max_query_tokens == 0 {
            return invalid("matching.max_query_tokens must be > 0".to_string());
        }

        if !(0.0..=100.0).contains(&self.fuzzy.threshold) {
            return invalid(format!(
                "fuzzy.threshold ({}) must be within 0..=100",
                self.fuzzy.threshold
            ));
        }
        if self.fuzzy.top_n == 0 {
            return invalid("fuzzy.top_n must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.fuzzy.partial_scale) {
            return invalid(format!(
                "fuzzy.partial_scale ({}) must be within 0..=1",
                self.fuzzy.partial_scale
            ));
        }
        if !(0.0..=1.0).contains(&self.fuzzy.coverage_floor) {
            return invalid(format!(
                "fuzzy.coverage_floor ({}) must be within 0..=1",
                self.fuzzy.coverage_floor
            ));
        }

        if self.semantic.top_n == 0 {
            return invalid("semantic.top_n must be > 0".to_string());
        }
        if !(0.0..=100.0).contains(&self.semantic.min_similarity) {
            return invalid(format!(
                "semantic.min_similarity ({}) must be within 0..=100",
                self.semantic.min_similarity
            ));
        }
        if self.semantic.shortlist_factor == 0 {
            return invalid("semantic.shortlist_factor must be > 0".to_string());
        }

        if !(self.boost.increment >= 0.0 && self.boost.increment.is_finite()) {
            return invalid(format!(
                "boost.increment ({}) must be a finite value >= 0",
                self.boost.increment
            ));
        }
        // NaN fails this comparison too
        if !(self.boost.max_total >= 0.0) {
            return invalid(format!(
                "boost.max_total ({}) must be >= 0",
                self.boost.max_total
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ResolverConfig::from_toml_str("").unwrap();
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.matching.top_k, 10);
        assert_eq!(config.fuzzy.threshold, 75.0);
        assert_eq!(config.boost.max_total, 30.0);
        assert!(config.catalog.required.is_empty());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = ResolverConfig::from_toml_str(
            r#"
            [fuzzy]
            threshold = 82.5

            [semantic]
            metric = "euclidean"

            [boost]
            max_total = inf

            [boost.keywords]
            ledger = ["sales", "gst"]

            [catalog]
            required = ["ledger", "Cost Centre"]
            "#,
        )
        .unwrap();

        assert_eq!(config.fuzzy.threshold, 82.5);
        assert_eq!(config.fuzzy.top_n, 5);
        assert_eq!(config.semantic.metric, Metric::Euclidean);
        assert!(config.boost.max_total.is_infinite());
        assert_eq!(config.boost.keywords.len(), 1);
        assert_eq!(
            config.catalog.required,
            vec![Category::Ledger, Category::CostCentre]
        );
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for raw in [
            "[matching]\nmax_ngram = 6",
            "[matching]\ntop_k = 0",
            "[fuzzy]\nthreshold = 101",
            "[fuzzy]\npartial_scale = 1.5",
            "[fuzzy]\ncoverage_floor = -0.1",
            "[boost]\nmax_total = -1",
            "[boost]\nincrement = nan",
        ] {
            let err = ResolverConfig::from_toml_str(raw).unwrap_err();
            assert!(matches!(err, SearchError::InvalidConfig(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let err = ResolverConfig::from_toml_str("[fuzzy]\nthreshhold = 80").unwrap_err();
        assert!(matches!(err, SearchError::ConfigParse(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grounder.toml");
        std::fs::write(&path, "[matching]\ntop_k = 3\n").unwrap();
        assert_eq!(ResolverConfig::load(&path).unwrap().matching.top_k, 3);
    }

    #[test]
    fn fetch_categories_default_to_all() {
        let config = CatalogConfig::default();
        assert_eq!(config.fetch_categories(), Category::ALL.to_vec());
    }
}
