use async_trait::async_trait;
use grounder_catalog::{Category, EntityRecord, EntitySet, JsonFileLoader, MasterDataLoader};
use grounder_search::{
    MatchCandidate, MatchSource, Resolver, ResolverConfig, ResultMerger, SearchError,
};
use grounder_vector_store::{EmbeddingProvider, HashingEmbedder, VectorStoreError};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

fn company() -> EntitySet {
    EntitySet::new()
        .with_category(Category::Group, [("g1", "Sales Interstate"), ("g2", "Sundry Debtors")])
        .with_category(
            Category::Ledger,
            [
                ("l1", "3M India Limited-P"),
                ("l2", "Cash"),
                ("l3", "GST Payable"),
                ("l4", "Accord Soft"),
            ],
        )
        .with_category(Category::CostCentre, [("c1", "Head Office")])
        .with_category(Category::StockItem, [("s1", "Raw Material Copper")])
}

fn hashing() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashingEmbedder::new(128))
}

async fn resolver_for(entities: EntitySet) -> Resolver {
    Resolver::with_entities(ResolverConfig::default(), Some(hashing()), entities)
        .await
        .unwrap()
}

#[tokio::test]
async fn named_ledger_outranks_keyword_group() {
    let entities = EntitySet::new()
        .with_category(Category::Group, [("1", "Sales Interstate")])
        .with_category(Category::Ledger, [("2", "3M India Limited-P")]);
    let resolver = resolver_for(entities).await;

    let result = resolver
        .match_query("Did we cross 10 lakhs in sales for 3M India?", 10)
        .await;
    let names = result.names();
    let india = names.iter().position(|n| *n == "3M India Limited-P").unwrap();
    if let Some(sales) = names.iter().position(|n| *n == "Sales Interstate") {
        assert!(india < sales, "{names:?}");
    }
    assert_eq!(india, 0);
}

#[tokio::test]
async fn named_ledger_wins_on_name_alone() {
    let entities = EntitySet::new()
        .with_category(Category::Group, [("1", "Sales Interstate")])
        .with_category(Category::Ledger, [("2", "3M India Limited-P")]);
    let mut config = ResolverConfig::default();
    config.boost.keywords = BTreeMap::new();
    let resolver = Resolver::with_entities(config, Some(hashing()), entities)
        .await
        .unwrap();

    let result = resolver
        .match_query("Did we cross 10 lakhs in sales for 3M India?", 10)
        .await;
    let top = &result.candidates[0];
    assert_eq!(top.name, "3M India Limited-P");
    assert_eq!(top.boost, 0.0);
    if let Some(sales) = result.iter().find(|c| c.name == "Sales Interstate") {
        assert!(sales.score < top.score, "{:?}", result.names());
    }
}

#[tokio::test]
async fn shared_suffix_does_not_flood_fuzzy_results() {
    let entities = EntitySet::new().with_category(
        Category::Ledger,
        [
            ("1", "Aero Mfg Pvt Ltd"),
            ("2", "Bolt Works Pvt Ltd"),
            ("3", "Crest Traders Ltd"),
            ("4", "Delta Agencies Ltd"),
            ("5", "3M Electro Ltd"),
        ],
    );
    let mut config = ResolverConfig::default();
    config.semantic.enabled = false;
    let resolver = Resolver::with_entities(config, None, entities).await.unwrap();

    let result = resolver.match_query("How much did we bill Crest Traders Ltd?", 10).await;
    assert_eq!(result.names(), vec!["Crest Traders Ltd"]);
    assert!(result.candidates[0].score >= 100.0);
}

#[tokio::test]
async fn empty_catalog_resolves_to_nothing() {
    let resolver = Resolver::new(ResolverConfig::default(), Some(hashing())).unwrap();
    let result = resolver.match_query("Did we cross 10 lakhs in sales?", 10).await;
    assert!(result.is_empty());
    assert_eq!(result.generation, 0);

    // an explicitly empty reload is legal too
    resolver.reload(EntitySet::new()).await.unwrap();
    assert!(resolver.match_query("cash", 3).await.is_empty());
}

#[tokio::test]
async fn results_are_bounded_sorted_and_unique() {
    let resolver = resolver_for(company()).await;
    for top_k in [1, 2, 3, 10] {
        let result = resolver
            .match_query("cash and gst payable for accord soft at head office", top_k)
            .await;
        assert!(result.len() <= top_k);
        assert!(result.candidates.windows(2).all(|w| w[0].score >= w[1].score));
        let mut keys: Vec<_> = result.iter().map(|c| (c.category, c.entity_id.clone())).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), result.len());
    }
}

#[tokio::test]
async fn repeated_queries_are_byte_identical() {
    let resolver = resolver_for(company()).await;
    let query = "Raw materal copper stock at hed office?";
    let first = serde_json::to_string(&resolver.match_query(query, 10).await).unwrap();
    for _ in 0..5 {
        let again = serde_json::to_string(&resolver.match_query(query, 10).await).unwrap();
        assert_eq!(again, first);
    }
}

#[tokio::test]
async fn contained_names_get_the_exact_score() {
    let resolver = resolver_for(company()).await;
    let result = resolver
        .match_query("compare Cash with Sundry Debtors, please", 10)
        .await;
    for name in ["Cash", "Sundry Debtors"] {
        let hit = result.iter().find(|c| c.name == name).unwrap();
        assert!(hit.score >= 100.0, "{hit:?}");
    }
}

#[tokio::test]
async fn keyword_boost_adds_per_distinct_keyword() {
    let mut config = ResolverConfig::default();
    config.boost.max_total = f32::INFINITY;
    let resolver = Resolver::with_entities(config, None, company()).await.unwrap();

    let result = resolver.match_query("gst payable this month", 10).await;
    let gst = &result.candidates[0];
    assert_eq!(gst.name, "GST Payable");
    assert_eq!(gst.source, MatchSource::Boosted);
    assert_eq!(gst.boost, 20.0);
    assert_eq!(gst.score, 120.0);
}

#[test]
fn merge_takes_the_maximum_then_adds_boost() {
    let make = |score, source| MatchCandidate {
        entity_id: "e".into(),
        category: Category::Ledger,
        name: "Interest Received".to_string(),
        score,
        source,
        boost: 0.0,
        matched_phrase: None,
    };
    let sources = vec![make(72.0, MatchSource::Fuzzy), make(85.0, MatchSource::Semantic)];

    let plain = ResultMerger::merge(sources.clone(), &BTreeMap::new(), 10);
    assert_eq!(plain[0].score, 85.0);

    let boosted = ResultMerger::merge(sources, &BTreeMap::from([(Category::Ledger, 2.0 * 10.0)]), 10);
    assert_eq!(boosted[0].score, 85.0 + 2.0 * 10.0);
}

/// Blocks single-query embedding until released; batch embedding (catalog
/// builds) passes straight through.
struct GatedEmbedder {
    inner: HashingEmbedder,
    entered: Notify,
    gate: Semaphore,
}

#[async_trait]
impl EmbeddingProvider for GatedEmbedder {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed_batch(&self, texts: &[String]) -> grounder_vector_store::Result<Vec<Vec<f32>>> {
        self.inner.embed_batch(texts).await
    }

    async fn embed(&self, text: &str) -> grounder_vector_store::Result<Vec<f32>> {
        self.entered.notify_one();
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| VectorStoreError::Other(e.to_string()))?;
        self.inner.embed(text).await
    }
}

#[tokio::test]
async fn in_flight_query_keeps_its_snapshot_across_reload() {
    let embedder = Arc::new(GatedEmbedder {
        inner: HashingEmbedder::new(64),
        entered: Notify::new(),
        gate: Semaphore::new(0),
    });
    let provider: Arc<dyn EmbeddingProvider> = embedder.clone();
    let resolver = Arc::new(
        Resolver::with_entities(ResolverConfig::default(), Some(provider), company())
            .await
            .unwrap(),
    );

    let in_flight = tokio::spawn({
        let resolver = Arc::clone(&resolver);
        async move { resolver.match_query("cash at head office", 10).await }
    });
    embedder.entered.notified().await;

    let replacement =
        EntitySet::new().with_category(Category::Ledger, [("x1", "Cash Discount Allowed")]);
    resolver.reload(replacement).await.unwrap();
    assert_eq!(resolver.generation(), 2);

    embedder.gate.add_permits(1);
    let result = in_flight.await.unwrap();

    let before: Vec<String> = company().iter().map(|e| e.name.clone()).collect();
    assert_eq!(result.generation, 1);
    assert!(result.names().contains(&"Cash"));
    assert!(result.iter().all(|c| before.contains(&c.name)), "{:?}", result.names());

    // later queries see the new snapshot
    embedder.gate.add_permits(1);
    let after = resolver.match_query("cash at head office", 10).await;
    assert_eq!(after.generation, 2);
    assert!(after.iter().all(|c| c.name == "Cash Discount Allowed"));
}

/// Embeds catalogs fine, then starts failing on demand
struct FlakyEmbedder {
    inner: HashingEmbedder,
    down: AtomicBool,
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed_batch(&self, texts: &[String]) -> grounder_vector_store::Result<Vec<Vec<f32>>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(VectorStoreError::EmbeddingError("provider unreachable".into()));
        }
        self.inner.embed_batch(texts).await
    }
}

#[tokio::test]
async fn semantic_outage_degrades_instead_of_failing() {
    let embedder = Arc::new(FlakyEmbedder {
        inner: HashingEmbedder::new(64),
        down: AtomicBool::new(false),
    });
    let provider: Arc<dyn EmbeddingProvider> = embedder.clone();
    let resolver = Resolver::with_entities(ResolverConfig::default(), Some(provider), company())
        .await
        .unwrap();

    embedder.down.store(true, Ordering::SeqCst);
    let result = resolver.match_query("gst payable for accord sft", 10).await;
    assert!(result.names().contains(&"GST Payable"));
    assert!(result.names().contains(&"Accord Soft"));
    assert!(result.iter().all(|c| c.source != MatchSource::Semantic));

    // a reload needs the provider, so it fails and the old catalog stays
    assert!(resolver.reload(company()).await.is_err());
    assert_eq!(resolver.generation(), 1);
}

struct BrokenLoader;

#[async_trait]
impl MasterDataLoader for BrokenLoader {
    async fn fetch_entities(&self, category: Category) -> grounder_catalog::Result<Vec<EntityRecord>> {
        if category == Category::CostCentre {
            return Err(grounder_catalog::CatalogError::Fetch {
                category,
                reason: "connection reset".into(),
            });
        }
        Ok(vec![EntityRecord::new("n1", "New Ledger")])
    }
}

#[tokio::test]
async fn reload_from_loaders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("master.json");
    std::fs::write(&path, company().to_json_string().unwrap()).unwrap();

    let resolver = Resolver::new(ResolverConfig::default(), Some(hashing())).unwrap();
    let stats = resolver.reload_from(&JsonFileLoader::new(&path)).await.unwrap();
    assert_eq!(stats.entities, 8);
    assert_eq!(stats.generation, 1);

    let err = resolver.reload_from(&BrokenLoader).await.unwrap_err();
    assert!(matches!(err, SearchError::Catalog(_)), "{err}");
    assert_eq!(resolver.stats().entities, 8);
    assert_eq!(resolver.generation(), 1);
}

#[tokio::test]
async fn required_categories_guard_reloads() {
    let mut config = ResolverConfig::default();
    config.catalog.required = vec![Category::CostCategory];
    let resolver = Resolver::new(config, None).unwrap();
    let err = resolver.reload(company()).await.unwrap_err();
    assert!(matches!(err, SearchError::Catalog(_)));
    assert_eq!(resolver.generation(), 0);
}

#[tokio::test]
async fn concurrent_queries_share_one_snapshot() {
    let resolver = Arc::new(resolver_for(company()).await);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.match_query("accord soft sales", 5).await })
        })
        .collect();
    let mut outputs = Vec::new();
    for handle in handles {
        outputs.push(handle.await.unwrap());
    }
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test(start_paused = true)]
async fn slow_provider_hits_the_deadline() {
    let embedder = Arc::new(GatedEmbedder {
        inner: HashingEmbedder::new(32),
        entered: Notify::new(),
        gate: Semaphore::new(0),
    });
    let resolver = Resolver::with_entities(ResolverConfig::default(), Some(embedder), company())
        .await
        .unwrap();
    let err = resolver
        .match_with_timeout("cash", 5, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Timeout(_)));
}
