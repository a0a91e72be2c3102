use std::sync::Arc;

use crate::config::Config;
use crate::evaluation::Evaluator;
use crate::execution::ExecClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The evaluation pipeline. Holds the model gateway, the response
    /// cache, and the rate governor; shared by every in-flight request.
    pub evaluator: Arc<Evaluator>,
    pub exec: ExecClient,
    pub config: Config,
}
