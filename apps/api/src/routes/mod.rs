pub mod health;

use axum::{routing::get, routing::post, Router};

use crate::evaluation::handlers as evaluation_handlers;
use crate::execution;
use crate::interview::handlers as interview_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Evaluation API
        .route(
            "/api/v1/evaluations",
            post(evaluation_handlers::handle_evaluate),
        )
        .route(
            "/api/v1/interviews/summary",
            post(interview_handlers::handle_summary),
        )
        .route("/api/v1/execute", post(execution::handle_execute))
        .with_state(state)
}
