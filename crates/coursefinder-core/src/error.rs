use thiserror::Error;

/// A convenience `Result` alias using [`CourseFinderError`].
pub type CourseFinderResult<T> = Result<T, CourseFinderError>;

/// Top-level error type for coursefinder.
///
/// `Load`, `DimensionMismatch` and `Internal` describe a broken catalog or
/// store and are never expected while serving. `NotFound`, `InvalidParameter` and
/// `Embedding` are caused by the request and are reported back to the caller.
#[derive(Error, Debug)]
pub enum CourseFinderError {
    /// The catalog could not be read or the embedding store could not be built.
    #[error("Load error: {0}")]
    Load(String),

    /// A referenced course ID does not exist in the catalog.
    #[error("Course not found: {0}")]
    NotFound(String),

    /// A request parameter (`mode`, `alpha`, `top_k`, `query`) was rejected.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The query text was empty or the embedding call failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Two vectors that must share a dimensionality did not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the left-hand / reference vector.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// A store invariant did not hold while serving a request.
    #[error("Internal error: {0}")]
    Internal(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

}

impl CourseFinderError {
    /// Stable snake_case name of the variant, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Load(_) => "load",
            Self::NotFound(_) => "not_found",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::Embedding(_) => "embedding",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::Internal(_) => "internal",
            Self::Config(_) => "config",
        }
    }

    /// Whether the error was caused by the request rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::InvalidParameter(_) | Self::Embedding(_)
        )
    }
}
