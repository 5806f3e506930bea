use crate::embedding::EmbeddingProvider;
use async_trait::async_trait;
use coursefinder_core::{CourseFinderError, CourseFinderResult};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Output size of `sentence-transformers/all-MiniLM-L6-v2`.
pub const MINILM_DIMENSION: usize = 384;

/// In-process `all-MiniLM-L6-v2` sentence embeddings through fastembed (ONNX).
///
/// The model files are downloaded on first use and cached under `cache_dir`
/// (fastembed's default when `None`). Inference runs on the blocking pool.
pub struct FastEmbedding {
    model: Arc<TextEmbedding>,
}

impl FastEmbedding {
    /// Load the model. Blocks while the model is downloaded or read from cache.
    pub fn new(cache_dir: Option<PathBuf>) -> CourseFinderResult<Self> {
        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(options).map_err(|e| {
            CourseFinderError::Embedding(format!("Failed to load all-MiniLM-L6-v2: {e}"))
        })?;
        info!(
            model = "all-MiniLM-L6-v2",
            dimension = MINILM_DIMENSION,
            "Embedding model loaded"
        );
        Ok(Self {
            model: Arc::new(model),
        })
    }

    async fn run(&self, texts: Vec<String>) -> CourseFinderResult<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let expected = texts.len();
        let vectors = tokio::task::spawn_blocking(move || model.embed(texts, None))
            .await
            .map_err(|e| CourseFinderError::Embedding(format!("Embedding task failed: {e}")))?
            .map_err(|e| CourseFinderError::Embedding(format!("Embedding failed: {e}")))?;
        check_vectors(vectors, expected)
    }
}

/// One vector of [`MINILM_DIMENSION`] floats per input, or an error.
fn check_vectors(vectors: Vec<Vec<f32>>, expected: usize) -> CourseFinderResult<Vec<Vec<f32>>> {
    if vectors.len() != expected {
        return Err(CourseFinderError::Embedding(format!(
            "Model returned {} vectors for {expected} inputs",
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != MINILM_DIMENSION) {
        return Err(CourseFinderError::Embedding(format!(
            "Model returned a {}-dimensional vector, expected {MINILM_DIMENSION}",
            bad.len()
        )));
    }
    Ok(vectors)
}

#[async_trait]
impl EmbeddingProvider for FastEmbedding {
    async fn embed(&self, text: &str) -> CourseFinderResult<Vec<f32>> {
        if text.is_empty() {
            return Err(CourseFinderError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }
        let mut vectors = self.run(vec![text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| CourseFinderError::Embedding("Empty model output".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> CourseFinderResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.is_empty()) {
            return Err(CourseFinderError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }
        debug!(count = texts.len(), "Embedding batch");
        self.run(texts.iter().map(|t| (*t).to_string()).collect())
            .await
    }

    fn dimension(&self) -> usize {
        MINILM_DIMENSION
    }
}
