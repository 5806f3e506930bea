use crate::mode::RetrievalMode;
use crate::query::ResolvedQuery;
use crate::ranking::ObjectiveRef;
use crate::store::Course;
use coursefinder_core::{CourseFinderError, CourseFinderResult};

/// Raw dot product of two vectors.
///
/// Not normalized to cosine similarity: magnitudes are part of the score.
/// Vectors of different lengths mean the store or the query is corrupt.
pub fn dot(a: &[f32], b: &[f32]) -> CourseFinderResult<f32> {
    if a.len() != b.len() {
        return Err(CourseFinderError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Keyword-based similarity between a query text and a candidate text.
///
/// Scores must be non-negative and deterministic. They are blended with raw
/// dot products in hybrid mode without rescaling.
pub trait LexicalScorer: Send + Sync {
    fn score(&self, query: &str, text: &str) -> f32;
}

/// A candidate field: its text and its stored embedding.
struct Field<'c> {
    text: &'c str,
    embedding: &'c [f32],
}

/// Computes the score of one candidate against a resolved query.
///
/// Every query axis is compared with every candidate field and the best pair
/// wins, separately for the dense and the sparse side. The two maxima are then
/// combined by [`RetrievalMode::blend`].
pub struct Scorer<'a> {
    mode: RetrievalMode,
    lexical: &'a dyn LexicalScorer,
}

impl<'a> Scorer<'a> {
    pub fn new(mode: RetrievalMode, lexical: &'a dyn LexicalScorer) -> Self {
        Self { mode, lexical }
    }

    /// Score a course: best match over {title, description}.
    pub fn score_course(&self, query: &ResolvedQuery<'_>, course: &Course) -> CourseFinderResult<f32> {
        self.score_fields(
            query,
            &[
                Field {
                    text: &course.title,
                    embedding: &course.title_embedding,
                },
                Field {
                    text: &course.description,
                    embedding: &course.description_embedding,
                },
            ],
        )
    }

    /// Score a single objective of a course, on its own.
    pub fn score_objective(
        &self,
        query: &ResolvedQuery<'_>,
        objective: ObjectiveRef<'_>,
    ) -> CourseFinderResult<f32> {
        let course = objective.course();
        let index = objective.index();
        let (text, embedding) = course
            .objectives
            .get(index)
            .zip(course.objective_embeddings.get(index))
            .ok_or_else(|| {
                CourseFinderError::Internal(format!(
                    "Course '{}' has no objective at index {index}",
                    course.id
                ))
            })?;
        self.score_fields(query, &[Field { text, embedding }])
    }

    fn score_fields(&self, query: &ResolvedQuery<'_>, fields: &[Field<'_>]) -> CourseFinderResult<f32> {
        let mut dense = f32::NEG_INFINITY;
        let mut sparse = f32::NEG_INFINITY;

        for axis in &query.axes {
            for field in fields {
                if self.mode.uses_dense() {
                    let q = axis.embedding.as_deref().ok_or_else(|| {
                        CourseFinderError::Embedding(
                            "Query has no embedding for dense scoring".to_string(),
                        )
                    })?;
                    dense = dense.max(dot(q, field.embedding)?);
                }
                if self.mode.uses_sparse() {
                    sparse = sparse.max(self.lexical.score(&axis.text, field.text));
                }
            }
        }

        Ok(self.mode.blend(dense, sparse))
    }
}
