use crate::config::SemanticConfig;
use crate::error::Result;
use grounder_vector_store::{
    embed_checked, EmbeddingProvider, IndexKind, QueryEmbeddingCache, StoreOptions, VectorStore,
    VectorStoreError,
};

/// Entity-name embeddings of one catalog snapshot
pub struct SemanticIndex {
    store: VectorStore,
    model_id: String,
}

impl SemanticIndex {
    /// One batch call to the provider; item `i` is the entity at position `i`
    pub async fn build(
        names: &[String],
        provider: &dyn EmbeddingProvider,
        options: StoreOptions,
    ) -> Result<Self> {
        let vectors = embed_checked(provider, names).await?;
        let store = VectorStore::build(&vectors, provider.dimension(), options)?;
        Ok(Self {
            store,
            model_id: provider.model_id().to_string(),
        })
    }

    #[must_use]
    pub fn kind(&self) -> IndexKind {
        self.store.kind()
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Embeds the query once and ranks entities by similarity (0..=100)
pub struct SemanticMatcher {
    top_n: usize,
    min_similarity: f32,
    cache: QueryEmbeddingCache,
}

impl SemanticMatcher {
    #[must_use]
    pub fn new(config: &SemanticConfig) -> Self {
        Self {
            top_n: config.top_n.max(1),
            min_similarity: config.min_similarity,
            cache: QueryEmbeddingCache::new(config.query_cache_capacity),
        }
    }

    pub async fn search(
        &self,
        index: &SemanticIndex,
        provider: &dyn EmbeddingProvider,
        query: &str,
        allow: &(dyn Fn(usize) -> bool + Sync),
        filtered: bool,
    ) -> Result<Vec<(usize, f32)>> {
        if index.is_empty() {
            return Ok(Vec::new());
        }
        if provider.model_id() != index.model_id() {
            return Err(VectorStoreError::EmbeddingError(format!(
                "query model {} does not match catalog model {}",
                provider.model_id(),
                index.model_id()
            ))
            .into());
        }

        let embedding = self.cache.get_or_embed(provider, query).await?;
        // A category restriction may discard most of the nearest items
        let limit = if filtered { index.len() } else { self.top_n };
        let hits = index.store.search(&embedding, limit)?;

        Ok(hits
            .into_iter()
            .filter(|(entity, _)| allow(*entity))
            .map(|(entity, similarity)| (entity, similarity * 100.0))
            .filter(|(_, score)| *score >= self.min_similarity)
            .take(self.top_n)
            .collect())
    }

    #[must_use]
    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }
}
