//! # Grounder Search
//!
//! Resolves free-text financial questions against a catalog of known entity
//! names (ledgers, groups, cost centres, stock items, ...).
//!
//! ## Pipeline
//!
//! ```text
//! query ─> normalize ─┬─> stopwords ─> n-grams ─> fuzzy ──┐
//!                     ├─> exact (Aho-Corasick) ───────────┤
//!                     └─> semantic (embeddings) ──────────┼─> merge (max + boost) ─> top-k
//!        raw query ───────> boost per category ───────────┘
//! ```
//!
//! Every source scores on one 0..=100 scale, higher = better. The merger
//! keeps the best score per entity and adds the category keyword boost.
//!
//! ## Example
//!
//! ```rust
//! use grounder_catalog::{Category, EntitySet};
//! use grounder_search::{Resolver, ResolverConfig};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let entities = EntitySet::new()
//!     .with_category(Category::Group, [("1", "Sales Interstate")])
//!     .with_category(Category::Ledger, [("2", "3M India Limited-P")]);
//!
//! let resolver = Resolver::with_entities(ResolverConfig::default(), None, entities)
//!     .await
//!     .unwrap();
//! let result = resolver
//!     .match_query("Did we cross 10 lakhs in sales for 3M India?", 5)
//!     .await;
//! assert_eq!(result.candidates[0].name, "3M India Limited-P");
//! # });
//! ```

mod boost;
mod catalog;
mod config;
mod error;
mod exact;
mod fusion;
mod fuzzy;
mod hybrid;
mod ngram;
mod normalize;
mod render;
mod semantic;
mod stopwords;
mod types;

pub use boost::{default_keywords, BoostTable};
pub use catalog::{Catalog, CatalogStats};
pub use config::{
    BoostConfig, CatalogConfig, FuzzyConfig, MatchingConfig, ResolverConfig, SemanticConfig,
    StopwordConfig, MAX_NGRAM_LIMIT,
};
pub use error::{Result, SearchError};
pub use exact::ExactMatchIndex;
pub use fusion::ResultMerger;
pub use fuzzy::{FuzzyHit, FuzzyMatcher, NameForm};
pub use hybrid::Resolver;
pub use ngram::{expected_count, generate_ngrams, NGram};
pub use normalize::{normalize, tokens};
pub use render::{build_context_prompt, render_entity_lines, render_named_lines};
pub use semantic::{SemanticIndex, SemanticMatcher};
pub use stopwords::{StopwordFilter, BASE_STOPWORDS, DOMAIN_FILLER};
pub use types::{MatchCandidate, MatchOptions, MatchSource, ResolvedResult};
