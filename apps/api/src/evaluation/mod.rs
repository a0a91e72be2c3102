//! Evaluation pipeline — turns one candidate answer into a bounded,
//! internally-consistent `EvaluationResult`.
//!
//! Flow: validate → skipped short-circuit → cache lookup → rate acquire →
//! prompt build → gateway call (timeout) → extract → normalize.
//!
//! The pipeline is an explicit two-branch design: the primary branch runs
//! the model path and yields a `RawEvaluation`; any failure in it diverts
//! to the heuristic branch, which yields a `RawEvaluation` of its own.
//! Both branches end in the same `normalizer::normalize` call, so callers
//! see one contract regardless of which branch ran. `evaluate` is total
//! apart from caller-input validation — provider failures never escape it.

pub mod cache;
pub mod extractor;
pub mod fallback;
pub mod handlers;
pub mod normalizer;
pub mod prompts;
pub mod rate;

use std::sync::Arc;

use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::{GenerationParams, LlmError, ModelGateway};
use crate::models::evaluation::{EvaluationRequest, EvaluationResult, ItemType, RawEvaluation};
use self::cache::ResponseCache;
use self::extractor::{ExtractionError, Shape};
use self::rate::RateGovernor;

/// Why the primary (model) branch could not produce a usable evaluation.
/// Every variant diverts to the heuristic branch.
#[derive(Debug, Error)]
enum PrimaryFailure {
    #[error("gateway: {0}")]
    Gateway(#[from] LlmError),

    #[error("gateway call exceeded deadline")]
    Timeout,

    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("extracted structure is not a usable evaluation: {0}")]
    Malformed(String),
}

/// Tuning knobs for one `Evaluator` instance. Tests construct these with
/// tight values and a scripted gateway.
#[derive(Debug, Clone)]
pub struct EvaluatorSettings {
    pub calls_per_window: u32,
    pub window: Duration,
    pub cache_ttl: Duration,
    pub call_timeout: Duration,
}

/// The evaluation pipeline. One instance per process; all concurrent
/// requests share its cache and rate governor.
pub struct Evaluator {
    gateway: Arc<dyn ModelGateway>,
    cache: ResponseCache,
    governor: RateGovernor,
    call_timeout: Duration,
}

impl Evaluator {
    pub fn new(gateway: Arc<dyn ModelGateway>, settings: EvaluatorSettings) -> Self {
        Self {
            gateway,
            cache: ResponseCache::new(settings.cache_ttl),
            governor: RateGovernor::new(settings.calls_per_window, settings.window),
            call_timeout: settings.call_timeout,
        }
    }

    /// Evaluates one answered item. Total apart from input validation:
    /// the caller always receives a completed evaluation unless the
    /// request carries nothing to evaluate.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
        item_type: ItemType,
    ) -> Result<EvaluationResult, AppError> {
        if request.skipped {
            debug!("item skipped by candidate; returning fixed skipped result");
            return Ok(fallback::skipped_result());
        }

        let has_response = !request.response_text.trim().is_empty();
        let has_code = request
            .code
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false);
        if !has_response && !has_code {
            return Err(AppError::Validation(
                "no response text submitted".to_string(),
            ));
        }

        let raw = match self.primary(request, item_type).await {
            Ok(raw) => raw,
            Err(failure) => {
                warn!("primary evaluation path failed ({failure}); using heuristic fallback");
                fallback::heuristic_raw(request, item_type)
            }
        };

        Ok(normalizer::normalize(raw, item_type))
    }

    /// The model branch: cache, rate slot, prompt, gateway, extraction.
    async fn primary(
        &self,
        request: &EvaluationRequest,
        item_type: ItemType,
    ) -> Result<RawEvaluation, PrimaryFailure> {
        let fingerprint = cache::fingerprint(&request.subject_text, &request.response_text);

        if let Some(value) = self.cache.lookup(&fingerprint).await {
            debug!("evaluation cache hit");
            return parse_raw(value);
        }

        self.governor.acquire().await;
        let (system, prompt) = prompts::build_evaluation_prompt(request, item_type);

        let text = timeout(
            self.call_timeout,
            self.gateway
                .generate(&prompt, &system, &GenerationParams::default()),
        )
        .await
        .map_err(|_| PrimaryFailure::Timeout)??;

        let value = extractor::extract(&text, Shape::Object)?;
        let raw = parse_raw(value.clone())?;

        // Cached only now: a structure without a usable score is a failure,
        // and failures are never cached.
        self.cache.store(fingerprint, value).await;
        info!(item_type = item_type.as_str(), "model evaluation extracted");
        Ok(raw)
    }

    /// One rate-governed, timeout-bounded model call returning plain text.
    /// Used for the aggregate narrative.
    pub(crate) async fn generate_text(&self, system: &str, prompt: &str) -> Result<String, AppError> {
        self.governor.acquire().await;
        let text = timeout(
            self.call_timeout,
            self.gateway
                .generate(prompt, system, &GenerationParams::default()),
        )
        .await
        .map_err(|_| AppError::Llm("narrative call exceeded deadline".to_string()))?
        .map_err(|e| AppError::Llm(e.to_string()))?;
        Ok(text)
    }
}

/// Binds an extracted JSON structure to the lenient raw-evaluation shape.
/// A structure without a score cannot seed normalization and counts as a
/// primary-branch failure.
fn parse_raw(value: serde_json::Value) -> Result<RawEvaluation, PrimaryFailure> {
    let raw: RawEvaluation = serde_json::from_value(value)
        .map_err(|e| PrimaryFailure::Malformed(e.to_string()))?;
    if raw.score.is_none() {
        return Err(PrimaryFailure::Malformed("missing score".to_string()));
    }
    Ok(raw)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
