use crate::error::ApiError;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use coursefinder_core::CourseFinderError;
use coursefinder_retrieval::{CourseSearch, SearchParams, SearchResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub search: Arc<CourseSearch>,
}

/// Query string accepted by every search route.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub top_k: Option<i64>,
    pub mode: Option<String>,
    pub alpha: Option<f32>,
}

impl SearchQuery {
    fn params(&self) -> SearchParams {
        SearchParams {
            top_k: self.top_k,
            mode: self.mode.clone(),
            alpha: self.alpha,
        }
    }

    fn text(&self) -> Result<&str, ApiError> {
        self.query.as_deref().ok_or_else(|| {
            ApiError(CourseFinderError::InvalidParameter(
                "missing required parameter 'query'".to_string(),
            ))
        })
    }
}

type ApiResult = Result<Json<SearchResponse>, ApiError>;

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "coursefinder"}))
}

pub async fn similar_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult {
    let Path(course_id) = path?;
    let Query(query) = query?;
    let request = state.search.request(&query.params())?;

    let response = state.search.similar_courses(&course_id, &request)?;
    info!(
        course_id = %course_id,
        mode = response.mode,
        results = response.results.len(),
        "Similar courses served"
    );
    Ok(Json(response))
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let request = state.search.request(&query.params())?;
    let text = query.text()?;

    let response = state.search.search_courses(text, &request).await?;
    info!(
        query = %response.query_identifier,
        mode = response.mode,
        results = response.results.len(),
        "Course search served"
    );
    Ok(Json(response))
}

pub async fn objectives_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let request = state.search.request(&query.params())?;
    let text = query.text()?;

    let response = state.search.search_objectives(text, &request).await?;
    info!(
        query = %response.query_identifier,
        mode = response.mode,
        results = response.results.len(),
        "Objective search served"
    );
    Ok(Json(response))
}
