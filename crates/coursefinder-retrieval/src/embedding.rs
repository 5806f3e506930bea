use crate::text::tokenize;
use async_trait::async_trait;
use coursefinder_core::{CourseFinderError, CourseFinderResult};

/// Trait for computing text embeddings (vector representations).
///
/// Implementations must be deterministic and return vectors of a single,
/// fixed dimensionality for every call.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute embedding vector for a single text.
    async fn embed(&self, text: &str) -> CourseFinderResult<Vec<f32>>;

    /// Compute embeddings for a batch of texts.
    async fn embed_batch(&self, texts: &[&str]) -> CourseFinderResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimension of the embedding vectors produced by this provider.
    fn dimension(&self) -> usize;
}

/// Hashed bag-of-words embedding that needs no model.
///
/// Every token (see [`tokenize`]) is added to a few buckets picked by seeded
/// FNV-1a hashes, weighted by `1 / token_count`, and the vector is scaled to
/// unit length. Texts sharing words get a positive dot product; a text with
/// no words embeds to the zero vector.
pub struct LocalEmbedding {
    dimension: usize,
}

/// `(seed, weight)` of each bucket a token is hashed into.
const PROBES: [(u8, f32); 3] = [(0, 1.0), (1, 0.7), (2, 0.5)];

impl LocalEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket(&self, token: &str, seed: u8) -> usize {
        fnv1a(seed, token.as_bytes()) as usize % self.dimension
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> CourseFinderResult<Vec<f32>> {
        if text.is_empty() {
            return Err(CourseFinderError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(CourseFinderError::Embedding(
                "Embedding dimension must be positive".to_string(),
            ));
        }

        let tokens = tokenize(text);
        let mut vector = vec![0.0f32; self.dimension];
        if tokens.is_empty() {
            return Ok(vector);
        }

        let weight = 1.0 / tokens.len() as f32;
        for token in &tokens {
            for (seed, scale) in PROBES {
                vector[self.bucket(token, seed)] += weight * scale;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a(seed: u8, bytes: &[u8]) -> u32 {
    std::iter::once(seed)
        .chain(bytes.iter().copied())
        .fold(0x811c_9dc5, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
        })
}
