use crate::error::Result;
use crate::flat_index::{select_best, FlatIndex, VectorIndex};
use crate::types::{IndexKind, Metric, Neighbor};
use ndarray::ArrayView1;

/// Approximate index for larger catalogs.
///
/// Every vector is reduced to one sign bit per component. A query first ranks
/// all codes by Hamming distance (a popcount per word), keeps a shortlist of
/// `k * shortlist_factor`, and reranks only the shortlist with exact dot
/// products against the full-precision rows.
pub struct QuantizedIndex {
    exact: FlatIndex,
    codes: Vec<Vec<u64>>,
    shortlist_factor: usize,
}

impl QuantizedIndex {
    pub fn build(
        vectors: &[Vec<f32>],
        dimension: usize,
        metric: Metric,
        shortlist_factor: usize,
    ) -> Result<Self> {
        let exact = FlatIndex::build(vectors, dimension, metric)?;
        let codes = exact.rows().map(quantize_to_binary).collect();
        Ok(Self {
            exact,
            codes,
            shortlist_factor: shortlist_factor.max(1),
        })
    }

    fn shortlist(&self, query_code: &[u64], size: usize) -> Vec<usize> {
        let mut ranked: Vec<(u32, usize)> = self
            .codes
            .iter()
            .enumerate()
            .map(|(id, code)| (hamming(query_code, code), id))
            .collect();
        if ranked.len() > size && size > 0 {
            ranked.select_nth_unstable(size - 1);
            ranked.truncate(size);
        }
        ranked.into_iter().map(|(_, id)| id).collect()
    }
}

impl VectorIndex for QuantizedIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Quantized
    }

    fn len(&self) -> usize {
        self.codes.len()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let unit = self.exact.unit_query(query)?;
        let query_code = quantize_to_binary(ArrayView1::from(unit.as_slice()));
        let size = k.saturating_mul(self.shortlist_factor).min(self.len());
        let metric = self.exact.metric();

        let hits = self
            .shortlist(&query_code, size)
            .into_iter()
            .map(|id| Neighbor {
                id,
                raw: metric.raw_from_dot(self.exact.dot_row(id, &unit)),
            })
            .collect();
        Ok(select_best(hits, k, metric))
    }
}

fn quantize_to_binary(vector: ArrayView1<'_, f32>) -> Vec<u64> {
    let mut code = vec![0u64; vector.len().div_ceil(64)];
    for (i, value) in vector.iter().enumerate() {
        if *value > 0.0 {
            code[i / 64] |= 1 << (i % 64);
        }
    }
    code
}

fn hamming(a: &[u64], b: &[u64]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}
