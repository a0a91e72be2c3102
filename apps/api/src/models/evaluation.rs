//! Data model for single-answer evaluation.
//!
//! `EvaluationRequest` is what a caller submits for one answered interview
//! item; `EvaluationResult` is what every caller gets back, on the model
//! path and the heuristic path alike. `RawEvaluation` is the lenient
//! binding for whatever the model actually returned — every field optional,
//! every number unbounded — and only `normalizer::normalize` turns it into
//! an `EvaluationResult`.

use serde::{Deserialize, Serialize};

/// Output of a sandboxed code run attached to a coding answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub output: String,
    pub error: String,
}

/// One answered (or skipped) interview item, as submitted by the caller.
/// Immutable once constructed — the pipeline never mutates it.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationRequest {
    /// The question or prompt context the response answers.
    pub subject_text: String,
    pub response_text: String,
    pub code: Option<String>,
    pub code_language: Option<String>,
    pub execution_trace: Option<ExecutionTrace>,
    /// Marked by the caller when the candidate skipped the item entirely.
    #[serde(default)]
    pub skipped: bool,
}

/// Kind of interview item being evaluated. Drives the signal scan in the
/// heuristic evaluator and per-category aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Behavioral,
    Technical,
    Coding,
    Communication,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Behavioral => "behavioral",
            Self::Technical => "technical",
            Self::Coding => "coding",
            Self::Communication => "communication",
        }
    }
}

/// Qualitative verdict on how well a response addresses its question.
///
/// Apart from `Skipped`, the variant is always the canonical band of the
/// numeric score — `normalizer` enforces this, whatever the model claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseCategory {
    PerfectlyRelevant,
    MostlyRelevant,
    PartiallyRelevant,
    MostlyIrrelevant,
    CompletelyOffTopic,
    Skipped,
}

/// Per-facet ratings, each on a 0–10 scale (1–10 for model-provided
/// facets; `efficiency` admits 0 when an execution trace shows a hard
/// failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubMetrics {
    pub relevance: u8,
    pub correctness: u8,
    pub syntax: u8,
    pub efficiency: u8,
    pub structure: u8,
    pub edge_cases: u8,
    pub clarity: u8,
    pub technical_accuracy: u8,
}

impl SubMetrics {
    /// All facets set to the same rating.
    pub fn uniform(rating: u8) -> Self {
        Self {
            relevance: rating,
            correctness: rating,
            syntax: rating,
            efficiency: rating,
            structure: rating,
            edge_cases: rating,
            clarity: rating,
            technical_accuracy: rating,
        }
    }
}

/// The structured, bounded evaluation handed back to callers.
///
/// Invariant: `response_category` is the unique canonical band containing
/// `score` (or `Skipped` with score 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: u8,
    pub response_category: ResponseCategory,
    pub metrics: SubMetrics,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub narrative: String,
    pub assessment: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient model-output binding
// ────────────────────────────────────────────────────────────────────────────

/// What the evaluation prompt asks the model to return. The provider
/// enforces no schema, so nothing here is trusted: numbers may be missing,
/// negative, or absurd, and `category` is advisory only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvaluation {
    pub score: Option<f64>,
    pub category: Option<String>,
    #[serde(default)]
    pub metrics: RawSubMetrics,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    pub narrative: Option<String>,
    pub assessment: Option<String>,
}

/// Facet ratings as the model reported them, unclamped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubMetrics {
    pub relevance: Option<f64>,
    pub correctness: Option<f64>,
    pub syntax: Option<f64>,
    pub efficiency: Option<f64>,
    pub structure: Option<f64>,
    pub edge_cases: Option<f64>,
    pub clarity: Option<f64>,
    pub technical_accuracy: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_category_serializes_kebab_case() {
        let json = serde_json::to_string(&ResponseCategory::MostlyRelevant).unwrap();
        assert_eq!(json, r#""mostly-relevant""#);
        let back: ResponseCategory = serde_json::from_str(r#""completely-off-topic""#).unwrap();
        assert_eq!(back, ResponseCategory::CompletelyOffTopic);
    }

    #[test]
    fn test_item_type_deserializes_lowercase() {
        let t: ItemType = serde_json::from_str(r#""coding""#).unwrap();
        assert_eq!(t, ItemType::Coding);
        assert_eq!(t.as_str(), "coding");
    }

    #[test]
    fn test_request_skipped_defaults_to_false() {
        let json = r#"{
            "subject_text": "Explain ownership in Rust.",
            "response_text": "Each value has a single owner."
        }"#;
        let req: EvaluationRequest = serde_json::from_str(json).unwrap();
        assert!(!req.skipped);
        assert!(req.code.is_none());
        assert!(req.execution_trace.is_none());
    }

    #[test]
    fn test_raw_evaluation_tolerates_partial_output() {
        // Model returned only a score and one strength — everything else
        // must default rather than fail deserialization.
        let json = r#"{"score": 72, "strengths": ["clear explanation"]}"#;
        let raw: RawEvaluation = serde_json::from_str(json).unwrap();
        assert_eq!(raw.score, Some(72.0));
        assert!(raw.category.is_none());
        assert!(raw.metrics.relevance.is_none());
        assert_eq!(raw.strengths.len(), 1);
        assert!(raw.improvements.is_empty());
    }

    #[test]
    fn test_raw_evaluation_accepts_fractional_score() {
        let json = r#"{"score": 83.5, "metrics": {"relevance": 8.0}}"#;
        let raw: RawEvaluation = serde_json::from_str(json).unwrap();
        assert_eq!(raw.score, Some(83.5));
        assert_eq!(raw.metrics.relevance, Some(8.0));
    }

    #[test]
    fn test_sub_metrics_uniform() {
        let m = SubMetrics::uniform(7);
        assert_eq!(m.relevance, 7);
        assert_eq!(m.technical_accuracy, 7);
    }
}
