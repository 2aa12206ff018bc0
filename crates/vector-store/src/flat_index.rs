use crate::embeddings::normalize;
use crate::error::{Result, VectorStoreError};
use crate::types::{IndexKind, Metric, Neighbor};
use ndarray::{Array1, Array2, ArrayView1};

/// Nearest-neighbor lookup over a fixed set of vectors.
///
/// Scores come back in the metric's native units, best first; converting to
/// the canonical similarity scale is the caller's job (see [`Metric::similarity`]).
pub trait VectorIndex: Send + Sync {
    fn kind(&self) -> IndexKind;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}

/// Exact index: one matrix-vector product per query.
pub struct FlatIndex {
    metric: Metric,
    dimension: usize,
    matrix: Array2<f32>,
}

impl FlatIndex {
    /// Rows are unit-normalized on the way in
    pub fn build(vectors: &[Vec<f32>], dimension: usize, metric: Metric) -> Result<Self> {
        let mut flat = Vec::with_capacity(vectors.len() * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(VectorStoreError::InvalidDimension {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            let mut row = vector.clone();
            normalize(&mut row);
            flat.extend(row);
        }

        let matrix = Array2::from_shape_vec((vectors.len(), dimension), flat)
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;

        Ok(Self {
            metric,
            dimension,
            matrix,
        })
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    pub(crate) fn unit_query(&self, query: &[f32]) -> Result<Vec<f32>> {
        if query.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let mut unit = query.to_vec();
        normalize(&mut unit);
        Ok(unit)
    }

    /// Dot product of every row with a unit query
    pub(crate) fn dots(&self, unit_query: &[f32]) -> Array1<f32> {
        self.matrix.dot(&ArrayView1::from(unit_query))
    }

    /// Dot product of one row with a unit query
    pub(crate) fn dot_row(&self, row: usize, unit_query: &[f32]) -> f32 {
        self.matrix.row(row).dot(&ArrayView1::from(unit_query))
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f32>> {
        self.matrix.rows().into_iter()
    }

    pub(crate) const fn metric(&self) -> Metric {
        self.metric
    }
}

impl VectorIndex for FlatIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Flat
    }

    fn len(&self) -> usize {
        self.matrix.nrows()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let unit = self.unit_query(query)?;
        let hits = self
            .dots(&unit)
            .iter()
            .enumerate()
            .map(|(id, dot)| Neighbor {
                id,
                raw: self.metric.raw_from_dot(*dot),
            })
            .collect();
        Ok(select_best(hits, k, self.metric))
    }
}

/// Partial selection of the `k` best hits, then a sort of only those.
/// Ties fall back to the lower id so results are reproducible.
pub(crate) fn select_best(mut hits: Vec<Neighbor>, k: usize, metric: Metric) -> Vec<Neighbor> {
    if k == 0 {
        return Vec::new();
    }
    let order = |a: &Neighbor, b: &Neighbor| {
        metric
            .best_first(a.raw, b.raw)
            .then_with(|| a.id.cmp(&b.id))
    };
    if hits.len() > k {
        hits.select_nth_unstable_by(k - 1, order);
        hits.truncate(k);
    }
    hits.sort_by(order);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_search() {
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.9, 0.1, 0.0], vec![0.0, 1.0, 0.0]];
        let index = FlatIndex::build(&vectors, 3, Metric::Cosine).unwrap();
        assert_eq!(index.len(), 3);

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);

        // First result should be id=0 (exact match)
        assert_eq!(results[0].id, 0);
        assert!((results[0].raw - 1.0).abs() < 1e-6);

        // Second should be id=1 (close)
        assert_eq!(results[1].id, 1);
        assert!(results[1].raw > 0.9);
    }

    #[test]
    fn euclidean_search_returns_smallest_distances_first() {
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.7, 0.7]];
        let index = FlatIndex::build(&vectors, 2, Metric::Euclidean).unwrap();
        let results = index.search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<_> = results.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert!(results[0].raw < results[1].raw);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = FlatIndex::build(&[vec![1.0, 0.0]], 3, Metric::Cosine);
        assert!(result.is_err());

        let index = FlatIndex::build(&[vec![1.0, 0.0, 0.0]], 3, Metric::Cosine).unwrap();
        let result = index.search(&[1.0, 0.0], 1);
        assert!(result.is_err());
    }

    #[test]
    fn empty_index_and_zero_k_yield_nothing() {
        let index = FlatIndex::build(&[], 4, Metric::Cosine).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 5).unwrap().is_empty());

        let index = FlatIndex::build(&[vec![1.0, 0.0]], 2, Metric::Cosine).unwrap();
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }
}
