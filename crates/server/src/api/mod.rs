//! HTTP API.

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{public_message, ApiError, ErrorBody};
pub use handlers::{AskRequest, HealthResponse, StatusMessage};
pub use state::AppContext;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the service router.
pub fn router(context: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/ask/", post(handlers::ask))
        .route("/questions/", get(handlers::questions))
        .with_state(context)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
