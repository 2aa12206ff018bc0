use crate::error::{Result, SearchError};
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::HashMap;

/// Multi-pattern substring index over normalized entity names.
///
/// Identical normalized names share one pattern; a pattern maps back to every
/// entity carrying that name. Entities are referred to by their position in
/// the catalog.
#[derive(Debug, Clone, Default)]
pub struct ExactMatchIndex {
    automaton: Option<AhoCorasick>,
    owners: Vec<Vec<usize>>,
}

impl ExactMatchIndex {
    /// Blank names are not indexed: an empty pattern would match everywhere
    pub fn build<S: AsRef<str>>(normalized_names: &[S]) -> Result<Self> {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut patterns: Vec<&str> = Vec::new();
        let mut owners: Vec<Vec<usize>> = Vec::new();

        for (entity, name) in normalized_names.iter().enumerate() {
            let name = name.as_ref();
            if name.is_empty() {
                continue;
            }
            let slot = *slots.entry(name).or_insert_with(|| {
                patterns.push(name);
                owners.push(Vec::new());
                patterns.len() - 1
            });
            owners[slot].push(entity);
        }

        if patterns.is_empty() {
            return Ok(Self::default());
        }

        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| SearchError::Index(e.to_string()))?;

        Ok(Self {
            automaton: Some(automaton),
            owners,
        })
    }

    /// Entities whose normalized name occurs in `normalized_query`, in scan
    /// order. An entity is reported once per occurrence.
    #[must_use]
    pub fn find(&self, normalized_query: &str) -> Vec<usize> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };
        automaton
            .find_overlapping_iter(normalized_query)
            .flat_map(|m| self.owners[m.pattern().as_usize()].iter().copied())
            .collect()
    }

    /// Number of distinct indexed names
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.owners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reports_every_contained_name() {
        let names = ["3m india limited p", "sales interstate", "india", "cash"];
        let index = ExactMatchIndex::build(&names).unwrap();
        let hits = index.find("sales interstate for 3m india limited p");
        assert!(hits.contains(&0));
        assert!(hits.contains(&1));
        assert!(hits.contains(&2));
        assert!(!hits.contains(&3));
    }

    #[test]
    fn overlapping_and_repeated_names_all_surface() {
        let names = ["bank", "bank charges", "bank"];
        let index = ExactMatchIndex::build(&names).unwrap();
        assert_eq!(index.pattern_count(), 2);

        let mut hits = index.find("bank charges");
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1, 2]);
    }

    #[test]
    fn empty_index_and_blank_names() {
        let index = ExactMatchIndex::build::<&str>(&[]).unwrap();
        assert!(index.find("anything").is_empty());

        let index = ExactMatchIndex::build(&["", "gst"]).unwrap();
        assert_eq!(index.find("gst payable"), vec![1]);
        assert!(index.find("").is_empty());
    }
}
