use crate::handlers::{
    health_handler, objectives_handler, search_handler, similar_handler, AppState,
};
use axum::{routing::get, Router};
use coursefinder_retrieval::CourseSearch;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The HTTP gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router over a loaded search service.
    pub fn build(search: Arc<CourseSearch>) -> Router {
        let state = Arc::new(AppState { search });

        Router::new()
            .route("/v1/health", get(health_handler))
            .route("/v1/search", get(search_handler))
            .route("/v1/objectives/search", get(objectives_handler))
            .route("/v1/courses/{course_id}/similar", get(similar_handler))
            .with_state(state)
    }

    /// Serve the router on an already bound listener until the process exits.
    pub async fn serve(listener: TcpListener, search: Arc<CourseSearch>) -> std::io::Result<()> {
        let courses = search.store().len();
        let app = Self::build(search);
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, courses, "coursefinder gateway listening");
        }
        axum::serve(listener, app).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use coursefinder_retrieval::{EmbeddingStore, LocalEmbedding, RawCatalog, RawCourse};
    use tower::ServiceExt;

    async fn app() -> Router {
        let embedder = Arc::new(LocalEmbedding::new(64));
        let catalog = RawCatalog::new(vec![
            RawCourse::new("c1", "Intro to ML", ["gradient descent"]),
            RawCourse::new("c2", "Advanced Cooking", ["knife skills"]),
        ]);
        let store = EmbeddingStore::load(catalog, embedder.as_ref()).await.unwrap();
        GatewayServer::build(Arc::new(CourseSearch::with_bm25(Arc::new(store), embedder)))
    }

    async fn status_of(uri: &str) -> StatusCode {
        app()
            .await
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_routes_status() {
        assert_eq!(status_of("/v1/health").await, StatusCode::OK);
        assert_eq!(status_of("/v1/search?query=gradient").await, StatusCode::OK);
        assert_eq!(
            status_of("/v1/objectives/search?query=knife").await,
            StatusCode::OK
        );
        assert_eq!(status_of("/v1/courses/c1/similar").await, StatusCode::OK);
        assert_eq!(status_of("/v1/courses/c9/similar").await, StatusCode::NOT_FOUND);
        assert_eq!(status_of("/v1/search").await, StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of("/v1/search?query=x&top_k=abc").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of("/v1/unknown").await, StatusCode::NOT_FOUND);
    }
}
