use crate::types::{Category, EntityId};
use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors raised while fetching or validating master data
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The master-data source failed for one category
    #[error("Failed to fetch {category} entities: {reason}")]
    Fetch { category: Category, reason: String },

    /// A required category came back empty
    #[error("Required category {0} has no entities")]
    EmptyCategory(Category),

    /// Two entities share an id within one category
    #[error("Duplicate id {id} in category {category}")]
    DuplicateId { category: Category, id: EntityId },

    /// An entity has a blank name
    #[error("Entity {id} in category {category} has an empty name")]
    EmptyName { category: Category, id: EntityId },

    /// Two keys of one document name the same category
    #[error("Category {category} appears twice in the document (as {first:?} and {second:?})")]
    DuplicateCategory {
        category: Category,
        first: String,
        second: String,
    },

    /// Unknown category label
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Master-data file could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
