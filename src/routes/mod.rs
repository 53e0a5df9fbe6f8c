//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod identity;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...` (caller identity from `X-User-Id`)
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        // Vocabulary
        .route(
            "/api/v1/vocabulary",
            get(http::http_list_vocabulary).post(http::http_add_vocabulary),
        )
        .route("/api/v1/vocabulary/import", post(http::http_import_vocabulary))
        .route("/api/v1/vocabulary/quiz", post(http::http_create_vocabulary_quiz))
        .route("/api/v1/vocabulary/:id", delete(http::http_delete_vocabulary))
        // Quizzes
        .route(
            "/api/v1/quizzes",
            get(http::http_list_quizzes).post(http::http_create_quiz),
        )
        .route("/api/v1/quizzes/:id", get(http::http_get_quiz))
        .route("/api/v1/quizzes/:id/submit", post(http::http_submit_quiz))
        .route("/api/v1/quizzes/:id/attempts", get(http::http_quiz_attempts))
        // Translation practice
        .route("/api/v1/translation/passage", get(http::http_get_passage))
        .route("/api/v1/translation/feedback", post(http::http_post_feedback))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
