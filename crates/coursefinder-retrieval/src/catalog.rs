use coursefinder_core::{CourseFinderError, CourseFinderResult};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::info;

/// A course as it appears in the catalog file, before any embedding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawCourse {
    /// Unique course identifier (the key of the catalog object).
    #[serde(skip)]
    pub id: String,
    pub title: String,
    #[serde(rename = "learning-objectives", alias = "objectives", default)]
    pub objectives: Vec<String>,
}

impl RawCourse {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        objectives: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            objectives: objectives.into_iter().map(Into::into).collect(),
        }
    }
}

/// The raw course catalog, in file order.
///
/// The catalog file is a JSON object keyed by course ID:
///
/// ```json
/// { "c1": { "title": "Intro to ML", "learning-objectives": ["gradient descent"] } }
/// ```
///
/// Key order is significant: it becomes the enumeration order used to break
/// ranking ties, so the object is read entry by entry instead of through a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCatalog {
    courses: Vec<RawCourse>,
}

impl RawCatalog {
    pub fn new(courses: Vec<RawCourse>) -> Self {
        Self { courses }
    }

    /// Parse a catalog from its JSON text.
    pub fn from_json_str(json: &str) -> CourseFinderResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CourseFinderError::Load(format!("Invalid catalog JSON: {e}")))
    }

    /// Read and parse a catalog file.
    pub async fn from_path(path: &Path) -> CourseFinderResult<Self> {
        let data = tokio::fs::read_to_string(path).await.map_err(|e| {
            CourseFinderError::Load(format!(
                "Failed to read catalog '{}': {e}",
                path.display()
            ))
        })?;
        let catalog = Self::from_json_str(&data)?;
        info!(
            path = %path.display(),
            courses = catalog.len(),
            "Catalog read"
        );
        Ok(catalog)
    }

    pub fn courses(&self) -> &[RawCourse] {
        &self.courses
    }

    pub fn into_courses(self) -> Vec<RawCourse> {
        self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl<'de> Deserialize<'de> for RawCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CatalogVisitor)
    }
}

struct CatalogVisitor;

impl<'de> Visitor<'de> for CatalogVisitor {
    type Value = RawCatalog;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping course IDs to courses")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut courses = Vec::with_capacity(map.size_hint().unwrap_or(0));
        let mut seen = HashSet::new();
        while let Some((id, mut course)) = map.next_entry::<String, RawCourse>()? {
            if !seen.insert(id.clone()) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate course ID '{id}'"
                )));
            }
            course.id = id;
            courses.push(course);
        }
        Ok(RawCatalog { courses })
    }
}
