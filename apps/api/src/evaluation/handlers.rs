use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::evaluation::{EvaluationRequest, EvaluationResult, ItemType};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EvaluateBody {
    /// Identifier of the owning interview or analysis record. Persistence
    /// is the caller's concern; the id is echoed back untouched.
    pub interview_id: Option<Uuid>,
    pub item_type: ItemType,
    #[serde(flatten)]
    pub request: EvaluationRequest,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub interview_id: Option<Uuid>,
    pub item_type: ItemType,
    pub result: EvaluationResult,
    pub evaluated_at: DateTime<Utc>,
}

/// POST /api/v1/evaluations
///
/// Coding items without a trace get one chance at sandbox enrichment
/// before evaluation; enrichment failure is silent and the item is
/// evaluated without a trace.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(body): Json<EvaluateBody>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let mut request = body.request;

    if body.item_type == ItemType::Coding && request.execution_trace.is_none() && !request.skipped {
        if let (Some(code), Some(language)) = (request.code.as_deref(), request.code_language.as_deref()) {
            if !code.trim().is_empty() {
                request.execution_trace = state.exec.try_run(language, None, code, "").await;
            }
        }
    }

    let result = state.evaluator.evaluate(&request, body.item_type).await?;
    Ok(Json(EvaluateResponse {
        interview_id: body.interview_id,
        item_type: body.item_type,
        result,
        evaluated_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_body_flattens_request_fields() {
        let json = serde_json::json!({
            "interview_id": Uuid::new_v4(),
            "item_type": "coding",
            "subject_text": "Reverse a list",
            "response_text": "Use two pointers.",
            "code": "fn rev() {}",
            "code_language": "rust"
        });
        let body: EvaluateBody = serde_json::from_value(json).unwrap();
        assert_eq!(body.item_type, ItemType::Coding);
        assert_eq!(body.request.subject_text, "Reverse a list");
        assert_eq!(body.request.code.as_deref(), Some("fn rev() {}"));
        assert!(!body.request.skipped);
    }

    #[test]
    fn test_evaluate_body_without_interview_id() {
        let json = serde_json::json!({
            "item_type": "behavioral",
            "subject_text": "Tell me about a conflict",
            "response_text": "Last year..."
        });
        let body: EvaluateBody = serde_json::from_value(json).unwrap();
        assert!(body.interview_id.is_none());
    }
}
