//! `coursefinder.toml` configuration.
//!
//! Every section and field is optional; a missing file yields the defaults.

use coursefinder_core::{CourseFinderError, CourseFinderResult};
use coursefinder_retrieval::{EmbeddingProvider, LocalEmbedding, SearchDefaults};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Environment variable that overrides `embedding.api_key`.
pub const API_KEY_ENV: &str = "COURSEFINDER_EMBEDDING_API_KEY";

#[derive(Debug, Deserialize)]
pub struct CourseFinderConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchDefaults,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Local,
    /// OpenAI-compatible `/v1/embeddings` endpoint; needs the `http-embeddings` feature.
    Http,
    /// In-process all-MiniLM-L6-v2; needs the `fastembed-embeddings` feature.
    Fastembed,
}

/// Output size of the model run by the `fastembed` provider.
const FASTEMBED_DIMENSION: usize = 384;

#[derive(Debug, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingBackend,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model cache for the `fastembed` provider.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for CourseFinderConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            server: ServerConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchDefaults::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::default(),
            dimension: default_dimension(),
            base_url: None,
            model: default_model(),
            api_key: None,
            cache_dir: None,
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("courses.json")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_dimension() -> usize {
    384
}
fn default_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

impl CourseFinderConfig {
    /// Parse a config document. Relative paths are resolved against `base_dir`.
    pub fn from_toml_str(data: &str, base_dir: &Path) -> CourseFinderResult<Self> {
        let mut config: Self = toml::from_str(data)
            .map_err(|e| CourseFinderError::Config(format!("Invalid config: {e}")))?;
        if config.catalog_path.is_relative() {
            config.catalog_path = base_dir.join(&config.catalog_path);
        }
        if let Some(dir) = config.embedding.cache_dir.as_mut() {
            if dir.is_relative() {
                *dir = base_dir.join(&*dir);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    pub async fn load(path: &Path) -> CourseFinderResult<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            info!(path = %path.display(), "Config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env();
            return Ok(config);
        }

        info!(path = %path.display(), "Loading configuration");
        let data = tokio::fs::read_to_string(path).await.map_err(|e| {
            CourseFinderError::Config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut config = Self::from_toml_str(&data, base_dir)?;
        config.apply_env();
        Ok(config)
    }

    /// Environment overrides, applied after the file is read.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.embedding.api_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> CourseFinderResult<()> {
        self.search.validate().map_err(|e| {
            CourseFinderError::Config(format!("Invalid [search] defaults: {e}"))
        })?;
        if self.embedding.dimension == 0 {
            return Err(CourseFinderError::Config(
                "embedding.dimension must be positive".to_string(),
            ));
        }
        if self.embedding.provider == EmbeddingBackend::Http && self.embedding.base_url.is_none()
        {
            return Err(CourseFinderError::Config(
                "embedding.base_url is required for the http provider".to_string(),
            ));
        }
        if self.embedding.provider == EmbeddingBackend::Fastembed
            && self.embedding.dimension != FASTEMBED_DIMENSION
        {
            return Err(CourseFinderError::Config(format!(
                "embedding.dimension must be {FASTEMBED_DIMENSION} for the fastembed provider, got {}",
                self.embedding.dimension
            )));
        }
        Ok(())
    }
}

impl EmbeddingConfig {
    /// Build the configured embedding provider.
    pub fn build(&self) -> CourseFinderResult<Arc<dyn EmbeddingProvider>> {
        match self.provider {
            EmbeddingBackend::Local => Ok(Arc::new(LocalEmbedding::new(self.dimension))),
            EmbeddingBackend::Http => self.build_http(),
            EmbeddingBackend::Fastembed => self.build_fastembed(),
        }
    }

    #[cfg(feature = "fastembed-embeddings")]
    fn build_fastembed(&self) -> CourseFinderResult<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::new(coursefinder_retrieval::FastEmbedding::new(
            self.cache_dir.clone(),
        )?))
    }

    #[cfg(not(feature = "fastembed-embeddings"))]
    fn build_fastembed(&self) -> CourseFinderResult<Arc<dyn EmbeddingProvider>> {
        Err(CourseFinderError::Config(
            "embedding provider 'fastembed' requires the fastembed-embeddings feature".to_string(),
        ))
    }

    #[cfg(feature = "http-embeddings")]
    fn build_http(&self) -> CourseFinderResult<Arc<dyn EmbeddingProvider>> {
        let base_url = self.base_url.clone().ok_or_else(|| {
            CourseFinderError::Config("embedding.base_url is required".to_string())
        })?;
        Ok(Arc::new(coursefinder_retrieval::HttpEmbedding::new(
            base_url,
            self.model.clone(),
            self.api_key.clone(),
            self.dimension,
        )))
    }

    #[cfg(not(feature = "http-embeddings"))]
    fn build_http(&self) -> CourseFinderResult<Arc<dyn EmbeddingProvider>> {
        Err(CourseFinderError::Config(format!(
            "embedding provider 'http' requires the http-embeddings feature (model {})",
            self.model
        )))
    }
}
