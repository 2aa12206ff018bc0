use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// LRU of query text → embedding, keyed by model id so vectors from one
/// provider are never served for another.
pub struct QueryEmbeddingCache {
    inner: Option<Mutex<LruCache<(String, String), Arc<Vec<f32>>>>>,
}

impl QueryEmbeddingCache {
    /// `capacity == 0` disables caching
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub async fn get_or_embed(
        &self,
        provider: &dyn EmbeddingProvider,
        text: &str,
    ) -> Result<Arc<Vec<f32>>> {
        let key = (provider.model_id().to_string(), text.to_string());
        if let Some(hit) = self.lookup(&key) {
            log::debug!("Query embedding cache hit");
            return Ok(hit);
        }

        let vector = Arc::new(provider.embed(text).await?);
        if let Some(cache) = &self.inner {
            let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.put(key, vector.clone());
        }
        Ok(vector)
    }

    fn lookup(&self, key: &(String, String)) -> Option<Arc<Vec<f32>>> {
        let cache = self.inner.as_ref()?;
        let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |cache| {
            cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .len()
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
