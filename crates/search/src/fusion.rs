use crate::types::{MatchCandidate, MatchSource};
use grounder_catalog::{Category, EntityId};
use std::collections::{BTreeMap, HashMap};

/// Max-then-boost fusion of per-source candidates.
///
/// Candidates are grouped by (category, id). A group keeps the single highest
/// score any source gave it; sources are never summed. The category boost is
/// then added once, the list is stable-sorted by score (ties keep discovery
/// order) and cut to `top_k`.
pub struct ResultMerger;

impl ResultMerger {
    pub fn merge<I>(candidates: I, boosts: &BTreeMap<Category, f32>, top_k: usize) -> Vec<MatchCandidate>
    where
        I: IntoIterator<Item = MatchCandidate>,
    {
        let mut slots: HashMap<(Category, EntityId), usize> = HashMap::new();
        let mut merged: Vec<MatchCandidate> = Vec::new();

        for candidate in candidates {
            let key = (candidate.category, candidate.entity_id.clone());
            match slots.get(&key) {
                Some(&slot) => {
                    if candidate.score > merged[slot].score {
                        merged[slot] = candidate;
                    }
                }
                None => {
                    slots.insert(key, merged.len());
                    merged.push(candidate);
                }
            }
        }

        for candidate in &mut merged {
            let boost = boosts.get(&candidate.category).copied().unwrap_or(0.0);
            if boost > 0.0 {
                candidate.score += boost;
                candidate.boost = boost;
                candidate.source = MatchSource::Boosted;
            }
        }

        merged.sort_by(|a, b| b.score.total_cmp(&a.score));
        merged.truncate(top_k);
        merged
    }
}
