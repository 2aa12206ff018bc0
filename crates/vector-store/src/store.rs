use crate::error::Result;
use crate::flat_index::{FlatIndex, VectorIndex};
use crate::quantized_index::QuantizedIndex;
use crate::types::{IndexKind, Metric, StoreOptions};

/// Immutable embedding index over a fixed list of items.
///
/// Item ids are positions in the vector list the store was built from. The
/// index flavor is picked once from the item count; callers only ever see
/// `(item, similarity)` with similarity in `[0, 1]`, higher = more similar.
pub struct VectorStore {
    index: Box<dyn VectorIndex>,
    metric: Metric,
    dimension: usize,
}

impl VectorStore {
    pub fn build(vectors: &[Vec<f32>], dimension: usize, options: StoreOptions) -> Result<Self> {
        let index: Box<dyn VectorIndex> = if vectors.len() >= options.ann_threshold {
            Box::new(QuantizedIndex::build(
                vectors,
                dimension,
                options.metric,
                options.shortlist_factor,
            )?)
        } else {
            Box::new(FlatIndex::build(vectors, dimension, options.metric)?)
        };

        log::info!(
            "Built {} vector index over {} items (dim={}, metric={:?})",
            index.kind(),
            index.len(),
            dimension,
            options.metric
        );

        Ok(Self {
            index,
            metric: options.metric,
            dimension,
        })
    }

    /// Top `limit` items by canonical similarity, descending
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(usize, f32)>> {
        let neighbors = self.index.search(query, limit)?;
        Ok(neighbors
            .into_iter()
            .map(|n| (n.id, self.metric.similarity(n.raw)))
            .collect())
    }

    #[must_use]
    pub fn kind(&self) -> IndexKind {
        self.index.kind()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;

    fn vectors(names: &[&str]) -> Vec<Vec<f32>> {
        let embedder = HashingEmbedder::new(64);
        names.iter().map(|n| embedder.embed_sync(n)).collect()
    }

    #[test]
    fn picks_index_by_item_count() {
        let v = vectors(&["cash", "bank", "sales"]);
        let small = VectorStore::build(&v, 64, StoreOptions::default()).unwrap();
        assert_eq!(small.kind(), IndexKind::Flat);

        let options = StoreOptions {
            ann_threshold: 3,
            ..StoreOptions::default()
        };
        let large = VectorStore::build(&v, 64, options).unwrap();
        assert_eq!(large.kind(), IndexKind::Quantized);
    }

    #[test]
    fn both_metrics_report_higher_is_better() {
        let v = vectors(&["purchase accounts", "sundry creditors", "purchase account"]);
        let query = HashingEmbedder::new(64).embed_sync("purchase accounts");
        for metric in [Metric::Cosine, Metric::Euclidean] {
            let options = StoreOptions {
                metric,
                ..StoreOptions::default()
            };
            let store = VectorStore::build(&v, 64, options).unwrap();
            let hits = store.search(&query, 3).unwrap();
            assert_eq!(hits[0].0, 0, "{metric:?}");
            assert!((hits[0].1 - 1.0).abs() < 1e-5, "{metric:?}");
            assert!(hits.windows(2).all(|w| w[0].1 >= w[1].1), "{metric:?}");
        }
    }
}
