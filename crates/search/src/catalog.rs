use crate::config::ResolverConfig;
use crate::error::Result;
use crate::exact::ExactMatchIndex;
use crate::fuzzy::NameForm;
use crate::normalize::normalize;
use crate::semantic::SemanticIndex;
use crate::stopwords::StopwordFilter;
use grounder_catalog::{Category, Entity, EntitySet};
use grounder_vector_store::{EmbeddingProvider, IndexKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// Immutable entity snapshot with every derived index built from it.
///
/// Entities are addressed by position; the automaton, fuzzy name forms and
/// embeddings all use the same positions, so none of them can describe a
/// different entity set than the one they were built with.
pub struct Catalog {
    generation: u64,
    entities: Vec<Entity>,
    normalized: Vec<String>,
    names: Vec<NameForm>,
    stopwords: StopwordFilter,
    exact: ExactMatchIndex,
    semantic: Option<SemanticIndex>,
    counts: BTreeMap<Category, usize>,
    fingerprint: String,
}

/// Summary of a built catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub generation: u64,
    pub entities: usize,
    pub counts: BTreeMap<Category, usize>,
    pub vocabulary: usize,
    pub stopwords: usize,
    pub exact_patterns: usize,
    /// `None` when semantic matching is off for this snapshot
    pub vector_index: Option<String>,
    pub embedding_model: Option<String>,
    pub fingerprint: String,
}

impl Catalog {
    /// Snapshot with no entities; every query resolves to nothing
    #[must_use]
    pub fn empty(config: &ResolverConfig) -> Self {
        let set = EntitySet::new();
        Self {
            generation: 0,
            entities: Vec::new(),
            normalized: Vec::new(),
            names: Vec::new(),
            stopwords: StopwordFilter::build(std::iter::empty(), &config.stopwords),
            exact: ExactMatchIndex::default(),
            semantic: None,
            counts: BTreeMap::new(),
            fingerprint: set.fingerprint(),
        }
    }

    /// Validate `set` and build all derived structures. Nothing is shared with
    /// any previous snapshot.
    pub async fn build(
        set: &EntitySet,
        config: &ResolverConfig,
        embedder: Option<&dyn EmbeddingProvider>,
        generation: u64,
    ) -> Result<Self> {
        let started = Instant::now();
        set.validate(&config.catalog.required)?;

        let entities: Vec<Entity> = set.iter().cloned().collect();
        let normalized: Vec<String> = entities.iter().map(|e| normalize(&e.name)).collect();

        let mut order: Vec<usize> = (0..entities.len()).collect();
        order.sort_by(|&a, &b| {
            entities[a]
                .id
                .cmp(&entities[b].id)
                .then_with(|| entities[a].category.cmp(&entities[b].category))
        });
        let mut ranks = vec![0u32; entities.len()];
        for (rank, entity) in order.into_iter().enumerate() {
            ranks[entity] = u32::try_from(rank).unwrap_or(u32::MAX);
        }
        let names = normalized
            .iter()
            .zip(&ranks)
            .map(|(name, rank)| NameForm::new(name, *rank))
            .collect();

        let stopwords =
            StopwordFilter::build(normalized.iter().map(String::as_str), &config.stopwords);
        let exact = ExactMatchIndex::build(&normalized)?;

        let semantic = match embedder {
            Some(provider) if config.semantic.enabled && !entities.is_empty() => {
                let raw_names: Vec<String> = entities.iter().map(|e| e.name.clone()).collect();
                Some(
                    SemanticIndex::build(&raw_names, provider, config.semantic.store_options())
                        .await?,
                )
            }
            _ => None,
        };

        let catalog = Self {
            generation,
            counts: set.counts(),
            fingerprint: set.fingerprint(),
            entities,
            normalized,
            names,
            stopwords,
            exact,
            semantic,
        };

        log::info!(
            "Built catalog generation {} with {} entities ({} exact patterns, vector index: {}) in {:.2?}",
            generation,
            catalog.len(),
            catalog.exact.pattern_count(),
            catalog
                .semantic
                .as_ref()
                .map_or_else(|| "none".to_string(), |s| s.kind().to_string()),
            started.elapsed()
        );
        log::debug!("Catalog fingerprint {}", catalog.fingerprint);

        Ok(catalog)
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn entity(&self, position: usize) -> Option<&Entity> {
        self.entities.get(position)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Normalized name of the entity at `position`
    #[must_use]
    pub fn normalized_name(&self, position: usize) -> Option<&str> {
        self.normalized.get(position).map(String::as_str)
    }

    pub(crate) fn name_forms(&self) -> &[NameForm] {
        &self.names
    }

    #[must_use]
    pub fn stopwords(&self) -> &StopwordFilter {
        &self.stopwords
    }

    #[must_use]
    pub fn exact_index(&self) -> &ExactMatchIndex {
        &self.exact
    }

    #[must_use]
    pub fn semantic_index(&self) -> Option<&SemanticIndex> {
        self.semantic.as_ref()
    }

    #[must_use]
    pub fn vector_index_kind(&self) -> Option<IndexKind> {
        self.semantic.as_ref().map(SemanticIndex::kind)
    }

    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            generation: self.generation,
            entities: self.len(),
            counts: self.counts.clone(),
            vocabulary: self.stopwords.vocabulary_len(),
            stopwords: self.stopwords.effective().len(),
            exact_patterns: self.exact.pattern_count(),
            vector_index: self.vector_index_kind().map(|k| k.to_string()),
            embedding_model: self.semantic.as_ref().map(|s| s.model_id().to_string()),
            fingerprint: self.fingerprint.clone(),
        }
    }
}
