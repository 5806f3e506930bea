//! HTTP surface for coursefinder.
//!
//! Routes:
//!
//! - `GET /v1/courses/{course_id}/similar`: courses similar to a catalog course.
//! - `GET /v1/search`: courses similar to a free-text `query`.
//! - `GET /v1/objectives/search`: objectives similar to a free-text `query`.
//! - `GET /v1/health`: static liveness check.
//!
//! All search routes accept `top_k`, `mode` and `alpha`.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::GatewayServer;
