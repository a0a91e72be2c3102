//! Code-execution client — runs candidate code in a remote sandbox.
//!
//! Talks to a Piston-compatible execute endpoint. The same defensive
//! posture as the model gateway applies: every call is bounded by a
//! timeout, and provider failures are mapped into a fallback-friendly
//! shape instead of propagating raw. Coding evaluations work fine without
//! a trace; they just lose the execution signal.

use axum::{extract::State, Json};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::evaluation::ExecutionTrace;
use crate::state::AppState;

const DEFAULT_RUNTIME_VERSION: &str = "*";

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("execution API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("execution timed out")]
    Timeout,
}

#[derive(Debug, Serialize)]
struct ExecuteApiRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<ExecuteFile<'a>>,
    stdin: &'a str,
}

#[derive(Debug, Serialize)]
struct ExecuteFile<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteApiResponse {
    run: RunResult,
}

#[derive(Debug, Deserialize)]
struct RunResult {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    code: Option<i32>,
    #[serde(default)]
    wall_time: Option<u64>,
    #[serde(default)]
    memory: Option<u64>,
}

/// Client for the sandboxed code-execution service.
#[derive(Clone)]
pub struct ExecClient {
    client: Client,
    base_url: String,
    call_timeout: Duration,
}

impl ExecClient {
    pub fn new(base_url: String, call_timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(call_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            call_timeout,
        }
    }

    /// Runs a script and returns its trace, or an `ExecError` on any
    /// provider failure.
    pub async fn run(
        &self,
        language: &str,
        version: Option<&str>,
        script: &str,
        stdin: &str,
    ) -> Result<ExecutionTrace, ExecError> {
        let body = ExecuteApiRequest {
            language,
            version: version.unwrap_or(DEFAULT_RUNTIME_VERSION),
            files: vec![ExecuteFile { content: script }],
            stdin,
        };

        let url = format!("{}/execute", self.base_url.trim_end_matches('/'));
        let send = self.client.post(&url).json(&body).send();
        let response = timeout(self.call_timeout, send)
            .await
            .map_err(|_| ExecError::Timeout)??;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExecError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ExecuteApiResponse = response.json().await?;
        debug!(
            exit_code = ?parsed.run.code,
            wall_time_ms = ?parsed.run.wall_time,
            memory_bytes = ?parsed.run.memory,
            "code execution completed"
        );
        Ok(trace_from_run(parsed.run))
    }

    /// Best-effort run for pipeline enrichment: failures come back as
    /// `None`, never as an error the caller has to handle.
    pub async fn try_run(
        &self,
        language: &str,
        version: Option<&str>,
        script: &str,
        stdin: &str,
    ) -> Option<ExecutionTrace> {
        match self.run(language, version, script, stdin).await {
            Ok(trace) => Some(trace),
            Err(e) => {
                warn!("code execution unavailable, evaluating without a trace: {e}");
                None
            }
        }
    }
}

fn trace_from_run(run: RunResult) -> ExecutionTrace {
    ExecutionTrace {
        output: run.stdout,
        error: run.stderr,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handler
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
    pub code: String,
    pub language: String,
    pub version: Option<String>,
    #[serde(default)]
    pub stdin: String,
}

/// POST /api/v1/execute
///
/// Total endpoint: provider failures map to a trace carrying the error
/// text, so callers always get the same shape back.
pub async fn handle_execute(
    State(state): State<AppState>,
    Json(body): Json<ExecuteBody>,
) -> Result<Json<ExecutionTrace>, AppError> {
    if body.code.trim().is_empty() {
        return Err(AppError::Validation("no code submitted".to_string()));
    }

    let trace = match state
        .exec
        .run(&body.language, body.version.as_deref(), &body.code, &body.stdin)
        .await
    {
        Ok(trace) => trace,
        Err(e) => {
            warn!("execution request failed: {e}");
            ExecutionTrace {
                output: String::new(),
                error: "Execution service unavailable. Try again shortly.".to_string(),
            }
        }
    };
    Ok(Json(trace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_result_maps_to_trace() {
        let run: RunResult = serde_json::from_str(
            r#"{"stdout": "42\n", "stderr": "", "code": 0, "wall_time": 18, "memory": 1024}"#,
        )
        .unwrap();
        let trace = trace_from_run(run);
        assert_eq!(trace.output, "42\n");
        assert!(trace.error.is_empty());
    }

    #[test]
    fn test_run_result_tolerates_missing_fields() {
        let run: RunResult = serde_json::from_str(r#"{"stderr": "boom"}"#).unwrap();
        let trace = trace_from_run(run);
        assert!(trace.output.is_empty());
        assert_eq!(trace.error, "boom");
    }

    #[test]
    fn test_execute_body_defaults_stdin() {
        let body: ExecuteBody =
            serde_json::from_str(r#"{"code": "print(1)", "language": "python"}"#).unwrap();
        assert!(body.stdin.is_empty());
        assert!(body.version.is_none());
    }

    #[test]
    fn test_api_request_serializes_piston_shape() {
        let body = ExecuteApiRequest {
            language: "python",
            version: "3.11",
            files: vec![ExecuteFile { content: "print(1)" }],
            stdin: "",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["language"], "python");
        assert_eq!(json["files"][0]["content"], "print(1)");
    }
}
