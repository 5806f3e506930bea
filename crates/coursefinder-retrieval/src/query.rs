use crate::embedding::EmbeddingProvider;
use crate::mode::RetrievalMode;
use crate::store::EmbeddingStore;
use coursefinder_core::{CourseFinderError, CourseFinderResult};
use std::borrow::Cow;
use tracing::debug;

/// One side of a query: the text used for lexical scoring and, when dense
/// scores are needed, its embedding.
#[derive(Debug, Clone)]
pub struct QueryAxis<'a> {
    pub text: Cow<'a, str>,
    pub embedding: Option<Cow<'a, [f32]>>,
}

/// A query ready for scoring.
///
/// Free text resolves to a single axis; a reference course resolves to two
/// (its title and its description), both borrowed from the store.
#[derive(Debug, Clone)]
pub struct ResolvedQuery<'a> {
    /// The normalized query text or the reference course ID.
    pub identifier: String,
    pub axes: Vec<QueryAxis<'a>>,
}

/// Lower-case and trim free-text input.
pub fn normalize_query(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Translates free text or a course ID into a [`ResolvedQuery`].
pub struct QueryResolver<'a> {
    store: &'a EmbeddingStore,
    embedder: &'a dyn EmbeddingProvider,
}

impl<'a> QueryResolver<'a> {
    pub fn new(store: &'a EmbeddingStore, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self { store, embedder }
    }

    /// Resolve a free-text query.
    ///
    /// The text is normalized first; an empty result is an
    /// [`CourseFinderError::Embedding`]. The embedding provider is called once,
    /// and only when `mode` needs dense scores.
    pub async fn resolve_text(
        &self,
        text: &str,
        mode: RetrievalMode,
    ) -> CourseFinderResult<ResolvedQuery<'static>> {
        let normalized = normalize_query(text);
        if normalized.is_empty() {
            return Err(CourseFinderError::Embedding(
                "Query text is empty".to_string(),
            ));
        }

        let embedding = if mode.uses_dense() {
            let vector = self.embedder.embed(&normalized).await.map_err(|e| match e {
                CourseFinderError::Embedding(_) => e,
                other => CourseFinderError::Embedding(other.to_string()),
            })?;
            debug!(query = %normalized, dimension = vector.len(), "Query embedded");
            Some(Cow::Owned(vector))
        } else {
            None
        };

        Ok(ResolvedQuery {
            identifier: normalized.clone(),
            axes: vec![QueryAxis {
                text: Cow::Owned(normalized),
                embedding,
            }],
        })
    }

    /// Resolve a reference course into its title and description axes.
    ///
    /// Reuses the stored embeddings; no embedding call is made.
    pub fn resolve_course(&self, course_id: &str) -> CourseFinderResult<ResolvedQuery<'a>> {
        let course = self
            .store
            .get(course_id)
            .ok_or_else(|| CourseFinderError::NotFound(course_id.to_string()))?;

        Ok(ResolvedQuery {
            identifier: course.id.clone(),
            axes: vec![
                QueryAxis {
                    text: Cow::Borrowed(&course.title),
                    embedding: Some(Cow::Borrowed(&course.title_embedding)),
                },
                QueryAxis {
                    text: Cow::Borrowed(&course.description),
                    embedding: Some(Cow::Borrowed(&course.description_embedding)),
                },
            ],
        })
    }
}
