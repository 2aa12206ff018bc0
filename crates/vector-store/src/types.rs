use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Distance/similarity measure an index ranks by.
///
/// Both are computed on unit vectors. `Cosine` is natively higher-is-better,
/// `Euclidean` lower-is-better; [`Metric::similarity`] maps either onto `[0, 1]`
/// with higher = more similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

impl Metric {
    /// Native score from the dot product of two unit vectors
    #[must_use]
    pub fn raw_from_dot(self, dot: f32) -> f32 {
        match self {
            Self::Cosine => dot,
            Self::Euclidean => (2.0 - 2.0 * dot).max(0.0).sqrt(),
        }
    }

    /// Orders native scores best-first
    #[must_use]
    pub fn best_first(self, a: f32, b: f32) -> Ordering {
        match self {
            Self::Cosine => b.total_cmp(&a),
            Self::Euclidean => a.total_cmp(&b),
        }
    }

    /// Canonical similarity in `[0, 1]`, higher = more similar
    #[must_use]
    pub fn similarity(self, raw: f32) -> f32 {
        let sim = match self {
            Self::Cosine => raw,
            Self::Euclidean => 1.0 - raw / 2.0,
        };
        if sim.is_nan() {
            0.0
        } else {
            sim.clamp(0.0, 1.0)
        }
    }
}

/// One index hit, in the metric's native units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    pub raw: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Exhaustive scan
    Flat,
    /// Binary-code shortlist, exact rerank
    Quantized,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => f.write_str("flat"),
            Self::Quantized => f.write_str("quantized"),
        }
    }
}

/// How a [`crate::VectorStore`] picks and tunes its index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreOptions {
    pub metric: Metric,
    /// Entity count at or above which the quantized index replaces the flat scan
    pub ann_threshold: usize,
    /// Shortlist size multiplier for the quantized index
    pub shortlist_factor: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            metric: Metric::Cosine,
            ann_threshold: 2000,
            shortlist_factor: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_metrics_map_identical_vectors_to_full_similarity() {
        for metric in [Metric::Cosine, Metric::Euclidean] {
            let raw = metric.raw_from_dot(1.0);
            assert!((metric.similarity(raw) - 1.0).abs() < 1e-6, "{metric:?}");
        }
    }

    #[test]
    fn euclidean_ranks_smaller_distance_first() {
        let near = Metric::Euclidean.raw_from_dot(0.9);
        let far = Metric::Euclidean.raw_from_dot(0.1);
        assert!(near < far);
        assert_eq!(Metric::Euclidean.best_first(near, far), Ordering::Less);
        assert!(Metric::Euclidean.similarity(near) > Metric::Euclidean.similarity(far));
    }

    #[test]
    fn cosine_similarity_is_clamped_to_unit_range() {
        assert_eq!(Metric::Cosine.similarity(-0.4), 0.0);
        assert_eq!(Metric::Cosine.similarity(f32::NAN), 0.0);
        assert_eq!(Metric::Cosine.best_first(0.8, 0.2), Ordering::Less);
    }
}
