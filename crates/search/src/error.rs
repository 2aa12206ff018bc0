use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] grounder_catalog::CatalogError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] grounder_vector_store::VectorStoreError),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),
}
