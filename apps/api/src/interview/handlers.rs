use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::summarize;
use crate::models::evaluation::{EvaluationResult, ItemType};
use crate::models::interview::InterviewAggregate;
use crate::state::AppState;

/// One completed item: the evaluation result paired with its type.
#[derive(Debug, Deserialize)]
pub struct SummaryItem {
    pub item_type: ItemType,
    pub result: EvaluationResult,
}

#[derive(Debug, Deserialize)]
pub struct SummaryBody {
    pub interview_id: Option<Uuid>,
    pub items: Vec<SummaryItem>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub interview_id: Option<Uuid>,
    pub aggregate: InterviewAggregate,
    pub generated_at: DateTime<Utc>,
}

/// POST /api/v1/interviews/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Json(body): Json<SummaryBody>,
) -> Result<Json<SummaryResponse>, AppError> {
    if body.items.is_empty() {
        return Err(AppError::Validation(
            "summary requires at least one evaluated item".to_string(),
        ));
    }

    let (results, item_types): (Vec<EvaluationResult>, Vec<ItemType>) = body
        .items
        .into_iter()
        .map(|item| (item.result, item.item_type))
        .unzip();

    let aggregate = summarize(&state.evaluator, &results, &item_types).await;
    Ok(Json(SummaryResponse {
        interview_id: body.interview_id,
        aggregate,
        generated_at: Utc::now(),
    }))
}
