use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coursefinder_core::CourseFinderError;
use tracing::{debug, error};

/// A [`CourseFinderError`] rendered as an HTTP response.
///
/// Body: `{"error": {"kind": "...", "message": "..."}}`. Request errors keep
/// their message; service errors are logged and replaced by a generic one.
#[derive(Debug)]
pub struct ApiError(pub CourseFinderError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CourseFinderError::NotFound(_) => StatusCode::NOT_FOUND,
            CourseFinderError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            CourseFinderError::Embedding(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CourseFinderError> for ApiError {
    fn from(err: CourseFinderError) -> Self {
        Self(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(CourseFinderError::InvalidParameter(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(CourseFinderError::InvalidParameter(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, message) = if self.0.is_client_error() {
            debug!(kind = self.0.kind(), error = %self.0, "Request rejected");
            (self.0.kind(), self.0.to_string())
        } else {
            error!(kind = self.0.kind(), error = %self.0, "Request failed");
            ("internal", "Internal server error".to_string())
        };

        let body = serde_json::json!({
            "error": {
                "kind": kind,
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CourseFinderError::NotFound("c9".into()), StatusCode::NOT_FOUND),
            (
                CourseFinderError::InvalidParameter("mode".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CourseFinderError::Embedding("empty".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CourseFinderError::DimensionMismatch {
                    expected: 3,
                    actual: 2,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CourseFinderError::Load("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CourseFinderError::Internal("objective 3".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn test_into_response_status() {
        let resp = ApiError(CourseFinderError::NotFound("c9".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
