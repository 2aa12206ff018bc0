use crate::boost::BoostTable;
use crate::catalog::{Catalog, CatalogStats};
use crate::config::ResolverConfig;
use crate::error::{Result, SearchError};
use crate::fusion::ResultMerger;
use crate::fuzzy::FuzzyMatcher;
use crate::normalize::{normalize, tokens};
use crate::semantic::SemanticMatcher;
use crate::types::{MatchCandidate, MatchOptions, MatchSource, ResolvedResult};
use grounder_catalog::{load_all, EntitySet, MasterDataLoader};
use grounder_vector_store::EmbeddingProvider;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Hybrid entity resolver: exact + fuzzy + semantic candidates, merged by
/// max score plus category keyword boost.
///
/// Holds the active [`Catalog`] behind a pointer swap. A query clones the
/// `Arc` once and runs entirely against that snapshot, so a concurrent
/// [`Resolver::reload`] never changes what an in-flight query sees.
pub struct Resolver {
    config: ResolverConfig,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    active: RwLock<Arc<Catalog>>,
    generation: AtomicU64,
    reload_lock: tokio::sync::Mutex<()>,
    fuzzy: FuzzyMatcher,
    semantic: SemanticMatcher,
    boost: BoostTable,
}

impl Resolver {
    /// Resolver over an empty catalog. Without an embedder, semantic matching
    /// is off.
    pub fn new(
        config: ResolverConfig,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            active: RwLock::new(Arc::new(Catalog::empty(&config))),
            generation: AtomicU64::new(0),
            reload_lock: tokio::sync::Mutex::new(()),
            fuzzy: FuzzyMatcher::new(&config.fuzzy),
            semantic: SemanticMatcher::new(&config.semantic),
            boost: BoostTable::new(&config.boost),
            embedder,
            config,
        })
    }

    /// [`Resolver::new`] followed by an initial [`Resolver::reload`]
    pub async fn with_entities(
        config: ResolverConfig,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        entities: EntitySet,
    ) -> Result<Self> {
        let resolver = Self::new(config, embedder)?;
        resolver.reload(entities).await?;
        Ok(resolver)
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The currently published catalog
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation()
    }

    pub fn stats(&self) -> CatalogStats {
        self.snapshot().stats()
    }

    /// Build a new catalog from `entities` and publish it.
    ///
    /// All-or-nothing: on any validation, index or embedding failure the
    /// previous catalog stays active and the error is returned.
    pub async fn reload(&self, entities: EntitySet) -> Result<CatalogStats> {
        let _guard = self.reload_lock.lock().await;
        let generation = self.generation.load(Ordering::Acquire) + 1;

        let catalog = match Catalog::build(
            &entities,
            &self.config,
            self.embedder.as_deref(),
            generation,
        )
        .await
        {
            Ok(catalog) => catalog,
            Err(e) => {
                log::warn!(
                    "Catalog reload rejected, keeping generation {}: {}",
                    self.generation(),
                    e
                );
                return Err(e);
            }
        };

        let stats = catalog.stats();
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        self.generation.store(generation, Ordering::Release);
        log::info!(
            "Published catalog generation {} ({} entities)",
            generation,
            stats.entities
        );
        Ok(stats)
    }

    /// Fetch every configured category from `loader`, then [`Resolver::reload`].
    /// A failed fetch aborts before anything is built.
    pub async fn reload_from(&self, loader: &dyn MasterDataLoader) -> Result<CatalogStats> {
        let categories = self.config.catalog.fetch_categories();
        let entities = match load_all(loader, &categories).await {
            Ok(entities) => entities,
            Err(e) => {
                log::warn!("Master-data fetch failed, catalog unchanged: {e}");
                return Err(e.into());
            }
        };
        self.reload(entities).await
    }

    /// Resolve `query` to at most `top_k` entities, best first
    pub async fn match_query(&self, query: &str, top_k: usize) -> ResolvedResult {
        self.match_with_options(query, &MatchOptions::top_k(top_k))
            .await
    }

    pub async fn match_with_options(&self, query: &str, options: &MatchOptions) -> ResolvedResult {
        let catalog = self.snapshot();
        self.resolve(&catalog, query, options).await
    }

    /// [`Resolver::match_query`] bounded by a deadline
    pub async fn match_with_timeout(
        &self,
        query: &str,
        top_k: usize,
        timeout: Duration,
    ) -> Result<ResolvedResult> {
        tokio::time::timeout(timeout, self.match_query(query, top_k))
            .await
            .map_err(|_| SearchError::Timeout(timeout))
    }

    /// Run the query pipeline against a specific snapshot
    pub async fn resolve(
        &self,
        catalog: &Catalog,
        query: &str,
        options: &MatchOptions,
    ) -> ResolvedResult {
        let top_k = options.top_k.unwrap_or(self.config.matching.top_k);
        let normalized = normalize(query);
        if normalized.is_empty() || top_k == 0 || catalog.is_empty() {
            return ResolvedResult::empty(query, catalog.generation());
        }

        let all_tokens: Vec<&str> = tokens(&normalized)
            .take(self.config.matching.max_query_tokens)
            .collect();
        let allow = |position: usize| {
            catalog
                .entity(position)
                .is_some_and(|e| options.allows(e.category))
        };

        let lexical = async {
            let exact: Vec<usize> = catalog
                .exact_index()
                .find(&normalized)
                .into_iter()
                .filter(|p| allow(*p))
                .collect();
            let kept = catalog.stopwords().filter(&all_tokens);
            let fuzzy = self.fuzzy.match_query(
                &kept,
                &all_tokens,
                self.config.matching.max_ngram,
                catalog.name_forms(),
                &allow,
            );
            (exact, fuzzy)
        };
        let semantic = self.semantic_hits(catalog, query.trim(), &allow, !options.categories.is_empty());
        let ((exact, fuzzy), semantic) = tokio::join!(lexical, semantic);

        log::debug!(
            "Query stages: {} tokens, {} exact, {} fuzzy, {} semantic",
            all_tokens.len(),
            exact.len(),
            fuzzy.len(),
            semantic.len()
        );

        let exact = exact
            .into_iter()
            .filter_map(|p| candidate(catalog, p, 100.0, MatchSource::Exact, None));
        let fuzzy = fuzzy.into_iter().filter_map(|hit| {
            candidate(catalog, hit.entity, hit.score, MatchSource::Fuzzy, Some(hit.phrase))
        });
        let semantic = semantic
            .into_iter()
            .filter_map(|(p, score)| candidate(catalog, p, score, MatchSource::Semantic, None));

        let boosts = self.boost.boosts(query);
        let candidates = ResultMerger::merge(exact.chain(fuzzy).chain(semantic), &boosts, top_k);

        ResolvedResult {
            query: query.to_string(),
            generation: catalog.generation(),
            candidates,
        }
    }

    /// Semantic hits, or nothing if the source is off or failing
    async fn semantic_hits(
        &self,
        catalog: &Catalog,
        query: &str,
        allow: &(dyn Fn(usize) -> bool + Sync),
        filtered: bool,
    ) -> Vec<(usize, f32)> {
        let (Some(index), Some(provider)) = (catalog.semantic_index(), self.embedder.as_deref())
        else {
            return Vec::new();
        };
        match self
            .semantic
            .search(index, provider, query, allow, filtered)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!("Semantic matching skipped for this query: {e}");
                Vec::new()
            }
        }
    }
}

fn candidate(
    catalog: &Catalog,
    position: usize,
    score: f32,
    source: MatchSource,
    matched_phrase: Option<String>,
) -> Option<MatchCandidate> {
    let entity = catalog.entity(position)?;
    Some(MatchCandidate {
        entity_id: entity.id.clone(),
        category: entity.category,
        name: entity.name.clone(),
        score,
        source,
        boost: 0.0,
        matched_phrase,
    })
}
