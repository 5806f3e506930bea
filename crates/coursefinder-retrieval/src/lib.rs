//! Similarity search over a fixed course catalog.
//!
//! Courses are embedded once at startup (title, description and every
//! learning objective) into an immutable [`EmbeddingStore`]. Queries, either
//! free text or an existing course, are scored against every candidate with
//! raw dot products, BM25, or a weighted blend of both, and the best `top_k`
//! candidates are returned in a stable order.
//!
//! # Main types
//!
//! - [`RawCatalog`]: The course catalog as read from disk, in file order.
//! - [`EmbeddingProvider`]: Trait for turning text into fixed-length vectors.
//! - [`LocalEmbedding`]: Deterministic hashed bag-of-words provider.
//! - `FastEmbedding` (feature `fastembed-embeddings`): in-process
//!   all-MiniLM-L6-v2 sentence embeddings.
//! - [`EmbeddingStore`]: Immutable courses with their precomputed embeddings.
//! - [`RetrievalMode`]: Dense, sparse or hybrid scoring policy.
//! - [`QueryResolver`]: Turns free text or a course ID into query vectors.
//! - [`Scorer`]: Per-candidate scoring and cross-field aggregation.
//! - [`Bm25Scorer`]: BM25 lexical scorer over the catalog's texts.
//! - [`RankingEngine`]: Stable top-K selection over courses or objectives.
//! - [`CourseSearch`]: Service facade used by the gateway and the CLI.

/// BM25 lexical scoring.
pub mod bm25;
/// Catalog file parsing.
pub mod catalog;
/// Embedding provider trait and local implementation.
pub mod embedding;
/// In-process sentence embeddings via fastembed.
#[cfg(feature = "fastembed-embeddings")]
pub mod fastembed_embedding;
/// OpenAI-compatible HTTP embedding provider.
#[cfg(feature = "http-embeddings")]
pub mod http_embedding;
/// Retrieval mode parsing and score blending.
pub mod mode;
/// Query resolution.
pub mod query;
/// Top-K ranking.
pub mod ranking;
/// Dot-product scoring and field aggregation.
pub mod scorer;
/// Search service facade.
pub mod search;
/// Immutable embedding store.
pub mod store;
mod text;

pub use bm25::Bm25Scorer;
pub use catalog::{RawCatalog, RawCourse};
pub use embedding::{EmbeddingProvider, LocalEmbedding};
#[cfg(feature = "fastembed-embeddings")]
pub use fastembed_embedding::{FastEmbedding, MINILM_DIMENSION};
#[cfg(feature = "http-embeddings")]
pub use http_embedding::HttpEmbedding;
pub use mode::RetrievalMode;
pub use query::{normalize_query, QueryAxis, QueryResolver, ResolvedQuery};
pub use ranking::{ObjectiveRef, Ranked, RankingEngine};
pub use scorer::{dot, LexicalScorer, Scorer};
pub use search::{
    CourseSearch, SearchDefaults, SearchHit, SearchParams, SearchRequest, SearchResponse,
};
pub use store::{Course, EmbeddingStore};
