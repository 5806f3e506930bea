use coursefinder_core::{CourseFinderError, CourseFinderResult};
use std::fmt;

/// How candidate scores are computed for a request.
///
/// - `Dense`: raw dot product of embeddings only.
/// - `Sparse`: lexical (BM25) score only; no embedding call is made.
/// - `Hybrid`: `alpha * dense + (1 - alpha) * sparse`, with no rescaling of
///   either side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RetrievalMode {
    #[default]
    Dense,
    Sparse,
    Hybrid {
        /// Weight of the dense score, in `[0, 1]`.
        alpha: f32,
    },
}

impl RetrievalMode {
    /// Parse the `mode` and `alpha` request parameters.
    ///
    /// `mode` must be one of `dense`, `sparse`, `hybrid`; `alpha` must lie in
    /// `[0, 1]`. Both are checked regardless of mode and nothing falls back to
    /// a default.
    pub fn parse(mode: &str, alpha: f32) -> CourseFinderResult<Self> {
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(CourseFinderError::InvalidParameter(format!(
                "alpha must be within [0, 1], got {alpha}"
            )));
        }
        match mode.trim() {
            "dense" => Ok(Self::Dense),
            "sparse" => Ok(Self::Sparse),
            "hybrid" => Ok(Self::Hybrid { alpha }),
            other => Err(CourseFinderError::InvalidParameter(format!(
                "mode must be one of dense, sparse, hybrid; got '{other}'"
            ))),
        }
    }

    /// Wire name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Sparse => "sparse",
            Self::Hybrid { .. } => "hybrid",
        }
    }

    /// The blend factor, only meaningful in hybrid mode.
    pub fn alpha(&self) -> Option<f32> {
        match self {
            Self::Hybrid { alpha } => Some(*alpha),
            _ => None,
        }
    }

    pub fn uses_dense(&self) -> bool {
        !matches!(self, Self::Sparse)
    }

    pub fn uses_sparse(&self) -> bool {
        !matches!(self, Self::Dense)
    }

    /// Combine the dense and sparse aggregates into the final score.
    ///
    /// The side a mode does not use is ignored.
    pub fn blend(&self, dense: f32, sparse: f32) -> f32 {
        match self {
            Self::Dense => dense,
            Self::Sparse => sparse,
            Self::Hybrid { alpha } => alpha * dense + (1.0 - alpha) * sparse,
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hybrid { alpha } => write!(f, "hybrid(alpha={alpha})"),
            other => f.write_str(other.name()),
        }
    }
}
