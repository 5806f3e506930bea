use crate::catalog::{RawCatalog, RawCourse};
use crate::embedding::EmbeddingProvider;
use coursefinder_core::{CourseFinderError, CourseFinderResult};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// A catalog course with its precomputed embeddings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    /// The objectives joined with a single space.
    pub description: String,
    pub objectives: Vec<String>,
    #[serde(skip)]
    pub title_embedding: Vec<f32>,
    #[serde(skip)]
    pub description_embedding: Vec<f32>,
    /// Index-aligned with `objectives`.
    #[serde(skip)]
    pub objective_embeddings: Vec<Vec<f32>>,
}

impl Course {
    /// Build the description text of a course from its objectives.
    pub fn describe(objectives: &[String]) -> String {
        objectives.join(" ")
    }
}

/// Immutable mapping of course ID to [`Course`], in catalog order.
///
/// Every vector held by the store has the same length. The store is built
/// once (see [`EmbeddingStore::load`]) and only ever read afterwards, so it
/// is shared between requests as `Arc<EmbeddingStore>` without locking.
#[derive(Debug)]
pub struct EmbeddingStore {
    courses: Vec<Course>,
    index: HashMap<String, usize>,
    dimension: usize,
}

impl EmbeddingStore {
    /// Embed every course of `catalog` and build the store.
    ///
    /// Fails with [`CourseFinderError::Load`] if the catalog is empty, a course
    /// has no objectives, an ID is duplicated, the provider fails, or the
    /// provider returns vectors of inconsistent length. Nothing is returned on
    /// failure.
    pub async fn load(
        catalog: RawCatalog,
        embedder: &dyn EmbeddingProvider,
    ) -> CourseFinderResult<Self> {
        if catalog.is_empty() {
            return Err(CourseFinderError::Load("Catalog is empty".to_string()));
        }

        let mut courses = Vec::with_capacity(catalog.len());
        for raw in catalog.into_courses() {
            courses.push(embed_course(raw, embedder).await?);
        }

        let store = Self::from_courses(courses)?;
        info!(
            courses = store.len(),
            objectives = store.objective_count(),
            dimension = store.dimension,
            "Embedding store loaded"
        );
        Ok(store)
    }

    /// Build a store from courses whose embeddings are already computed.
    ///
    /// Enforces the same invariants as [`EmbeddingStore::load`].
    pub fn from_courses(courses: Vec<Course>) -> CourseFinderResult<Self> {
        let first = courses
            .first()
            .ok_or_else(|| CourseFinderError::Load("Catalog is empty".to_string()))?;
        let dimension = first.title_embedding.len();
        if dimension == 0 {
            return Err(CourseFinderError::Load(format!(
                "Course '{}' has an empty title embedding",
                first.id
            )));
        }

        let mut index = HashMap::with_capacity(courses.len());
        for (pos, course) in courses.iter().enumerate() {
            validate_course(course, dimension)?;
            if index.insert(course.id.clone(), pos).is_some() {
                return Err(CourseFinderError::Load(format!(
                    "Duplicate course ID '{}'",
                    course.id
                )));
            }
        }

        Ok(Self {
            courses,
            index,
            dimension,
        })
    }

    /// Look up a course by ID.
    pub fn get(&self, id: &str) -> Option<&Course> {
        self.index.get(id).map(|&pos| &self.courses[pos])
    }

    /// All courses, in catalog order.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// Every `(course, objective index)` pair, course order then objective order.
    pub fn objectives(&self) -> impl Iterator<Item = (&Course, usize)> + '_ {
        self.courses
            .iter()
            .flat_map(|c| (0..c.objectives.len()).map(move |i| (c, i)))
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn objective_count(&self) -> usize {
        self.courses.iter().map(|c| c.objectives.len()).sum()
    }
}

async fn embed_course(
    raw: RawCourse,
    embedder: &dyn EmbeddingProvider,
) -> CourseFinderResult<Course> {
    if raw.objectives.is_empty() {
        return Err(CourseFinderError::Load(format!(
            "Course '{}' has no objectives",
            raw.id
        )));
    }

    let description = Course::describe(&raw.objectives);
    let title_embedding = embedder
        .embed(&raw.title)
        .await
        .map_err(|e| load_error(&raw.id, "title", &e))?;
    let description_embedding = embedder
        .embed(&description)
        .await
        .map_err(|e| load_error(&raw.id, "description", &e))?;

    let texts: Vec<&str> = raw.objectives.iter().map(String::as_str).collect();
    let objective_embeddings = embedder
        .embed_batch(&texts)
        .await
        .map_err(|e| load_error(&raw.id, "objectives", &e))?;

    debug!(course_id = %raw.id, objectives = raw.objectives.len(), "Course embedded");

    Ok(Course {
        id: raw.id,
        title: raw.title,
        description,
        objectives: raw.objectives,
        title_embedding,
        description_embedding,
        objective_embeddings,
    })
}

fn load_error(course_id: &str, field: &str, err: &CourseFinderError) -> CourseFinderError {
    CourseFinderError::Load(format!(
        "Failed to embed {field} of course '{course_id}': {err}"
    ))
}

fn validate_course(course: &Course, dimension: usize) -> CourseFinderResult<()> {
    if course.objectives.is_empty() {
        return Err(CourseFinderError::Load(format!(
            "Course '{}' has no objectives",
            course.id
        )));
    }
    if course.objective_embeddings.len() != course.objectives.len() {
        return Err(CourseFinderError::Load(format!(
            "Course '{}' has {} objectives but {} objective embeddings",
            course.id,
            course.objectives.len(),
            course.objective_embeddings.len()
        )));
    }

    let vectors = [&course.title_embedding, &course.description_embedding]
        .into_iter()
        .chain(course.objective_embeddings.iter());
    for vector in vectors {
        if vector.len() != dimension {
            return Err(CourseFinderError::Load(format!(
                "Course '{}' has a {}-dimensional embedding, expected {dimension}",
                course.id,
                vector.len()
            )));
        }
    }
    Ok(())
}
