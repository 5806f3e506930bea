use crate::query::ResolvedQuery;
use crate::scorer::Scorer;
use crate::store::{Course, EmbeddingStore};
use coursefinder_core::CourseFinderResult;

/// A candidate with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub candidate: T,
    pub score: f32,
}

/// A single objective of a course, as a ranking candidate.
///
/// Only built from [`EmbeddingStore::objectives`], so `index` is always in
/// range for the course's objectives and objective embeddings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveRef<'a> {
    course: &'a Course,
    index: usize,
}

impl<'a> ObjectiveRef<'a> {
    pub(crate) fn new(course: &'a Course, index: usize) -> Self {
        Self { course, index }
    }

    pub fn course(&self) -> &'a Course {
        self.course
    }

    /// Position of the objective within its course.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &'a str {
        &self.course.objectives[self.index]
    }
}

/// Number of results to keep, or `None` when nothing should be returned.
fn result_limit(k: i64) -> Option<usize> {
    if k <= 0 {
        None
    } else {
        Some(usize::try_from(k).unwrap_or(usize::MAX))
    }
}

/// Score every candidate and keep the `k` best, in descending order.
///
/// The sort is stable: equal scores keep the order in which `candidates`
/// enumerated them. `k <= 0` returns an empty list without scoring
/// anything; a `k` larger than the candidate count returns them all. The
/// first scoring error aborts the whole ranking.
pub fn top_k<T, I, F>(candidates: I, k: i64, mut score: F) -> CourseFinderResult<Vec<Ranked<T>>>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> CourseFinderResult<f32>,
{
    let Some(limit) = result_limit(k) else {
        return Ok(Vec::new());
    };

    let mut ranked = candidates
        .into_iter()
        .map(|candidate| {
            let score = score(&candidate)?;
            Ok(Ranked { candidate, score })
        })
        .collect::<CourseFinderResult<Vec<_>>>()?;

    // `sort_by` is stable; `total_cmp` keeps NaN placement deterministic.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(limit);
    Ok(ranked)
}

/// Ranks catalog courses or objectives for a resolved query.
pub struct RankingEngine<'a> {
    store: &'a EmbeddingStore,
    scorer: Scorer<'a>,
}

impl<'a> RankingEngine<'a> {
    pub fn new(store: &'a EmbeddingStore, scorer: Scorer<'a>) -> Self {
        Self { store, scorer }
    }

    /// Rank every course of the catalog, the reference course included.
    pub fn rank_courses(
        &self,
        query: &ResolvedQuery<'_>,
        k: i64,
    ) -> CourseFinderResult<Vec<Ranked<&'a Course>>> {
        top_k(self.store.courses().iter(), k, |course| {
            self.scorer.score_course(query, course)
        })
    }

    /// Rank every objective of every course as its own candidate.
    pub fn rank_objectives(
        &self,
        query: &ResolvedQuery<'_>,
        k: i64,
    ) -> CourseFinderResult<Vec<Ranked<ObjectiveRef<'a>>>> {
        let candidates = self
            .store
            .objectives()
            .map(|(course, index)| ObjectiveRef::new(course, index));
        top_k(candidates, k, |objective| {
            self.scorer.score_objective(query, *objective)
        })
    }
}
