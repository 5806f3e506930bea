use crate::bm25::Bm25Scorer;
use crate::embedding::EmbeddingProvider;
use crate::mode::RetrievalMode;
use crate::query::{QueryResolver, ResolvedQuery};
use crate::ranking::{ObjectiveRef, Ranked, RankingEngine};
use crate::scorer::{LexicalScorer, Scorer};
use crate::store::{Course, EmbeddingStore};
use coursefinder_core::CourseFinderResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Values used for request parameters the caller leaves out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDefaults {
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

fn default_top_k() -> i64 {
    10
}
fn default_mode() -> String {
    "dense".to_string()
}
fn default_alpha() -> f32 {
    0.5
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            mode: default_mode(),
            alpha: default_alpha(),
        }
    }
}

impl SearchDefaults {
    /// Check that the defaults themselves form a valid request.
    pub fn validate(&self) -> CourseFinderResult<()> {
        RetrievalMode::parse(&self.mode, self.alpha).map(|_| ())
    }
}

/// Raw, unvalidated request parameters as received from a transport.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchParams {
    pub top_k: Option<i64>,
    pub mode: Option<String>,
    pub alpha: Option<f32>,
}

impl SearchParams {
    /// Fill in defaults and validate.
    pub fn resolve(&self, defaults: &SearchDefaults) -> CourseFinderResult<SearchRequest> {
        let mode = RetrievalMode::parse(
            self.mode.as_deref().unwrap_or(&defaults.mode),
            self.alpha.unwrap_or(defaults.alpha),
        )?;
        Ok(SearchRequest {
            top_k: self.top_k.unwrap_or(defaults.top_k),
            mode,
        })
    }
}

/// A validated search request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRequest {
    pub top_k: i64,
    pub mode: RetrievalMode,
}

/// One ranked course or objective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub course_id: String,
    pub title: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_index: Option<usize>,
}

impl From<Ranked<&Course>> for SearchHit {
    fn from(ranked: Ranked<&Course>) -> Self {
        Self {
            course_id: ranked.candidate.id.clone(),
            title: ranked.candidate.title.clone(),
            score: ranked.score,
            objective: None,
            objective_index: None,
        }
    }
}

impl From<Ranked<ObjectiveRef<'_>>> for SearchHit {
    fn from(ranked: Ranked<ObjectiveRef<'_>>) -> Self {
        let objective = ranked.candidate;
        Self {
            course_id: objective.course().id.clone(),
            title: objective.course().title.clone(),
            score: ranked.score,
            objective: Some(objective.text().to_string()),
            objective_index: Some(objective.index()),
        }
    }
}

/// Ranked results plus the request that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query_identifier: String,
    pub results: Vec<SearchHit>,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
    pub top_k: i64,
}

impl SearchResponse {
    fn new(query: &ResolvedQuery<'_>, request: &SearchRequest, results: Vec<SearchHit>) -> Self {
        Self {
            query_identifier: query.identifier.clone(),
            results,
            mode: request.mode.name(),
            alpha: request.mode.alpha(),
            top_k: request.top_k,
        }
    }
}

/// Search service over a loaded [`EmbeddingStore`].
///
/// Holds only shared, read-only state: any number of searches may run
/// concurrently on the same instance.
pub struct CourseSearch {
    store: Arc<EmbeddingStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    lexical: Arc<dyn LexicalScorer>,
    defaults: SearchDefaults,
}

impl CourseSearch {
    pub fn new(
        store: Arc<EmbeddingStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        lexical: Arc<dyn LexicalScorer>,
    ) -> Self {
        Self {
            store,
            embedder,
            lexical,
            defaults: SearchDefaults::default(),
        }
    }

    /// Use a [`Bm25Scorer`] built from the store for sparse scores.
    pub fn with_bm25(store: Arc<EmbeddingStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let lexical = Arc::new(Bm25Scorer::from_store(&store));
        Self::new(store, embedder, lexical)
    }

    /// Set the defaults used by [`CourseSearch::request`]. Chainable builder method.
    pub fn with_defaults(mut self, defaults: SearchDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Validate raw parameters against this service's defaults.
    pub fn request(&self, params: &SearchParams) -> CourseFinderResult<SearchRequest> {
        params.resolve(&self.defaults)
    }

    fn resolver(&self) -> QueryResolver<'_> {
        QueryResolver::new(&self.store, self.embedder.as_ref())
    }

    fn engine(&self, mode: RetrievalMode) -> RankingEngine<'_> {
        RankingEngine::new(&self.store, Scorer::new(mode, self.lexical.as_ref()))
    }

    /// Courses most similar to an existing course.
    pub fn similar_courses(
        &self,
        course_id: &str,
        request: &SearchRequest,
    ) -> CourseFinderResult<SearchResponse> {
        let query = self.resolver().resolve_course(course_id)?;
        let ranked = self.engine(request.mode).rank_courses(&query, request.top_k)?;
        debug!(
            course_id,
            mode = %request.mode,
            results = ranked.len(),
            "Similar courses ranked"
        );
        let hits = ranked.into_iter().map(SearchHit::from).collect();
        Ok(SearchResponse::new(&query, request, hits))
    }

    /// Courses most similar to a free-text query.
    pub async fn search_courses(
        &self,
        text: &str,
        request: &SearchRequest,
    ) -> CourseFinderResult<SearchResponse> {
        let query = self.resolver().resolve_text(text, request.mode).await?;
        let ranked = self.engine(request.mode).rank_courses(&query, request.top_k)?;
        debug!(
            query = %query.identifier,
            mode = %request.mode,
            results = ranked.len(),
            "Courses ranked"
        );
        let hits = ranked.into_iter().map(SearchHit::from).collect();
        Ok(SearchResponse::new(&query, request, hits))
    }

    /// Objectives most similar to a free-text query.
    pub async fn search_objectives(
        &self,
        text: &str,
        request: &SearchRequest,
    ) -> CourseFinderResult<SearchResponse> {
        let query = self.resolver().resolve_text(text, request.mode).await?;
        let ranked = self
            .engine(request.mode)
            .rank_objectives(&query, request.top_k)?;
        debug!(
            query = %query.identifier,
            mode = %request.mode,
            results = ranked.len(),
            "Objectives ranked"
        );
        let hits = ranked.into_iter().map(SearchHit::from).collect();
        Ok(SearchResponse::new(&query, request, hits))
    }
}
