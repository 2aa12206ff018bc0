//! # Grounder Catalog
//!
//! Master-data model for entity grounding: the closed set of financial
//! categories, entity records, and the immutable snapshot (`EntitySet`) every
//! search index is built from.
//!
//! ## Architecture
//!
//! ```text
//! MasterDataLoader (DB export, JSON file, in-memory)
//!     │
//!     ├──> fetch_entities(category) → [(id, name)]
//!     │
//!     └──> EntitySet (category → ordered entities)
//!            ├─> validate: non-empty names, unique ids, required categories
//!            └─> fingerprint: SHA-256 of the canonical listing
//! ```
//!
//! ## Example
//!
//! ```rust
//! use grounder_catalog::{Category, EntitySet};
//!
//! let set = EntitySet::new()
//!     .with_category(Category::Ledger, [(1u64, "3M India Limited-P")])
//!     .with_category(Category::Group, [(2u64, "Sales Interstate")]);
//!
//! set.validate(&[Category::Ledger]).unwrap();
//! assert_eq!(set.len(), 2);
//! ```

mod error;
mod loader;
mod types;

pub use error::{CatalogError, Result};
pub use loader::{load_all, JsonFileLoader, MasterDataLoader, StaticLoader};
pub use types::{Category, Entity, EntityId, EntityRecord, EntitySet};
