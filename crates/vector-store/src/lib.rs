//! # Grounder Vector Store
//!
//! Embedding seam and similarity search for entity names.
//!
//! ## Features
//!
//! - **Pluggable embeddings** through the [`EmbeddingProvider`] trait
//! - **Offline embedder** ([`HashingEmbedder`]) for tests and model-less runs
//! - **Exact or approximate search**: flat matrix scan for small catalogs,
//!   binary-quantized shortlist + exact rerank above a size threshold
//! - **One score convention**: every metric leaves the store as a similarity
//!   in `[0, 1]`, higher = more similar
//! - **Query embedding cache** (LRU)
//!
//! ## Architecture
//!
//! ```text
//! entity names
//!     │
//!     ├──> EmbeddingProvider::embed_batch
//!     │      └─> Vector[dim]
//!     │
//!     └──> VectorStore
//!            ├─> FlatIndex       (n < ann_threshold)
//!            └─> QuantizedIndex  (n ≥ ann_threshold)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use grounder_vector_store::{HashingEmbedder, StoreOptions, VectorStore};
//!
//! let embedder = HashingEmbedder::new(64);
//! let names = ["Sales Interstate", "3M India Limited-P"];
//! let vectors: Vec<Vec<f32>> = names.iter().map(|n| embedder.embed_sync(n)).collect();
//!
//! let store = VectorStore::build(&vectors, 64, StoreOptions::default()).unwrap();
//! let hits = store.search(&embedder.embed_sync("3M India"), 1).unwrap();
//! assert_eq!(hits[0].0, 1);
//! ```

mod embedding_cache;
mod embeddings;
mod error;
mod flat_index;
mod quantized_index;
mod store;
mod types;

pub use embedding_cache::QueryEmbeddingCache;
pub use embeddings::{cosine_similarity, embed_checked, normalize, EmbeddingProvider, HashingEmbedder};
pub use error::{Result, VectorStoreError};
pub use flat_index::{FlatIndex, VectorIndex};
pub use quantized_index::QuantizedIndex;
pub use store::VectorStore;
pub use types::{IndexKind, Metric, Neighbor, StoreOptions};
