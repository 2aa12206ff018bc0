use crate::error::{CatalogError, Result};
use crate::types::{Category, EntityRecord, EntitySet};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Source of master records, consulted only while building a catalog
#[async_trait]
pub trait MasterDataLoader: Send + Sync {
    /// Ordered `(id, name)` rows for one category
    async fn fetch_entities(&self, category: Category) -> Result<Vec<EntityRecord>>;

    /// Every listed category as one snapshot.
    ///
    /// The default fetches category by category and stops at the first
    /// failure. Sources that can hand out a whole export at once override it
    /// so all categories come from the same version.
    async fn fetch_all(&self, categories: &[Category]) -> Result<EntitySet> {
        let mut set = EntitySet::new();
        for &category in categories {
            let records = self
                .fetch_entities(category)
                .await
                .map_err(|err| as_fetch_error(category, err))?;
            log::debug!("Fetched {} {} entities", records.len(), category);
            set.insert(category, records);
        }
        Ok(set)
    }
}

/// Fetch every listed category into one snapshot.
///
/// The first failing fetch aborts the whole load; a partially fetched set is
/// never returned.
pub async fn load_all(loader: &dyn MasterDataLoader, categories: &[Category]) -> Result<EntitySet> {
    loader.fetch_all(categories).await
}

fn as_fetch_error(category: Category, err: CatalogError) -> CatalogError {
    match err {
        CatalogError::Fetch { .. } => err,
        other => CatalogError::Fetch {
            category,
            reason: other.to_string(),
        },
    }
}

/// Serves a fixed in-memory snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    set: EntitySet,
}

impl StaticLoader {
    #[must_use]
    pub const fn new(set: EntitySet) -> Self {
        Self { set }
    }
}

#[async_trait]
impl MasterDataLoader for StaticLoader {
    async fn fetch_entities(&self, category: Category) -> Result<Vec<EntityRecord>> {
        Ok(records_of(&self.set, category))
    }
}

/// Reads a JSON master-data export: `{ "<category>": [{"id": .., "name": ..}] }`
///
/// Every load re-reads the file so a reload sees the latest export; one
/// [`MasterDataLoader::fetch_all`] reads it exactly once.
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    path: PathBuf,
}

impl JsonFileLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole export at once
    pub async fn read_all(&self) -> Result<EntitySet> {
        log::info!("Reading master data from {:?}", self.path);
        let raw = tokio::fs::read_to_string(&self.path).await?;
        EntitySet::from_json_str(&raw)
    }
}

#[async_trait]
impl MasterDataLoader for JsonFileLoader {
    async fn fetch_entities(&self, category: Category) -> Result<Vec<EntityRecord>> {
        let set = self
            .read_all()
            .await
            .map_err(|err| as_fetch_error(category, err))?;
        Ok(records_of(&set, category))
    }

    async fn fetch_all(&self, categories: &[Category]) -> Result<EntitySet> {
        let export = self.read_all().await?;
        let mut set = EntitySet::new();
        for &category in categories {
            let records = records_of(&export, category);
            log::debug!("Fetched {} {} entities", records.len(), category);
            set.insert(category, records);
        }
        Ok(set)
    }
}

fn records_of(set: &EntitySet, category: Category) -> Vec<EntityRecord> {
    set.get(category)
        .iter()
        .map(|e| EntityRecord::new(e.id.clone(), e.name.clone()))
        .collect()
}
