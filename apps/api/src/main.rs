mod config;
mod errors;
mod evaluation;
mod execution;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::evaluation::{Evaluator, EvaluatorSettings};
use crate::execution::ExecClient;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Crucible API v{}", env!("CARGO_PKG_VERSION"));

    let call_timeout = Duration::from_secs(config.call_timeout_secs);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), call_timeout);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize code-execution client
    let exec = ExecClient::new(config.exec_api_url.clone(), call_timeout);
    info!("Execution client initialized ({})", config.exec_api_url);

    // Build the evaluation pipeline
    let evaluator = Arc::new(Evaluator::new(
        Arc::new(llm),
        EvaluatorSettings {
            calls_per_window: config.model_calls_per_window,
            window: Duration::from_secs(config.model_window_secs),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            call_timeout,
        },
    ));
    info!(
        "Evaluator initialized ({} calls / {}s window, cache TTL {}s)",
        config.model_calls_per_window, config.model_window_secs, config.cache_ttl_secs
    );

    // Build app state
    let state = AppState {
        evaluator,
        exec,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
