use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;

/// External text-embedding model.
///
/// Implementations must be deterministic for a fixed `model_id` and return
/// vectors of exactly `dimension()` components.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the model and version producing the vectors
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| VectorStoreError::EmbeddingError("Empty embedding result".to_string()))
    }
}

/// Embed a batch and check the provider kept its contract
pub async fn embed_checked(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(vec![]);
    }
    let vectors = provider.embed_batch(texts).await?;
    if vectors.len() != texts.len() {
        return Err(VectorStoreError::BatchMismatch {
            sent: texts.len(),
            received: vectors.len(),
        });
    }
    let expected = provider.dimension();
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(VectorStoreError::InvalidDimension {
            expected,
            actual: bad.len(),
        });
    }
    Ok(vectors)
}

/// Offline embedder: character-trigram and word feature hashing.
///
/// Texts sharing many trigrams land close together, which is enough to rank
/// abbreviations and typos near their source names without a neural model.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSION: usize = 256;

    #[must_use]
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(8);
        Self {
            dimension,
            model_id: format!("hashing-trigram-v1-{dimension}"),
        }
    }

    #[must_use]
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        hash_embed(text, self.dimension)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_sync(text)).collect())
    }
}

fn hash_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dimension];
    let lowered: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    for word in lowered.split_whitespace() {
        add_feature(&mut vec, word.as_bytes(), 1.0);

        let padded: Vec<char> = format!(" {word} ").chars().collect();
        for window in padded.windows(3) {
            let gram: String = window.iter().collect();
            add_feature(&mut vec, gram.as_bytes(), 0.5);
        }
    }

    normalize(&mut vec);
    vec
}

fn add_feature(vec: &mut [f32], bytes: &[u8], weight: f32) {
    let mut state = fnv1a_64(bytes);
    let bits = splitmix64(&mut state);
    let slot = (bits % vec.len() as u64) as usize;
    let sign = if bits >> 63 == 0 { 1.0 } else { -1.0 };
    vec[slot] += sign * weight;
}

/// Scale to unit length in place; zero vectors stay zero
pub fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vec.iter_mut() {
            *x /= norm;
        }
    }
}

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
