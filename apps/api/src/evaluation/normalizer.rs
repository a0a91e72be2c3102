//! Score Normalizer — the single source of truth for score/category
//! alignment.
//!
//! Takes whatever the model (or the heuristic evaluator) produced and
//! returns an `EvaluationResult` whose numeric and qualitative fields
//! cannot contradict each other: the score is clamped, the category is
//! re-derived from the canonical bands, and every facet rating stays
//! within one point of the headline score. The model-supplied category is
//! advisory input only; a disagreement is logged as a correction, never
//! surfaced as an error.
//!
//! Pure apart from tracing — same inputs, same output.

use tracing::warn;

use crate::evaluation::fallback;
use crate::models::evaluation::{
    EvaluationResult, ItemType, RawEvaluation, ResponseCategory, SubMetrics,
};

/// Minimum length for a model narrative to be passed through as-is.
const MIN_NARRATIVE_CHARS: usize = 24;
/// Minimum length for a model assessment line.
const MIN_ASSESSMENT_CHARS: usize = 12;
/// Minimum length for a strength/improvement bullet to count.
const MIN_BULLET_CHARS: usize = 4;

/// The unique category whose band contains `score`.
pub fn canonical_category(score: u8) -> ResponseCategory {
    match score {
        85..=100 => ResponseCategory::PerfectlyRelevant,
        65..=84 => ResponseCategory::MostlyRelevant,
        45..=64 => ResponseCategory::PartiallyRelevant,
        25..=44 => ResponseCategory::MostlyIrrelevant,
        _ => ResponseCategory::CompletelyOffTopic,
    }
}

/// Normalizes a raw evaluation into the bounded, internally-consistent
/// result contract. Callers on the model path check score presence before
/// calling; a missing score defensively normalizes to zero.
pub fn normalize(raw: RawEvaluation, item_type: ItemType) -> EvaluationResult {
    let score = clamp_score(raw.score);
    let category = canonical_category(score);

    if let Some(claimed) = raw.category.as_deref() {
        let claimed_parsed: Option<ResponseCategory> =
            serde_json::from_value(serde_json::Value::String(claimed.to_string())).ok();
        if claimed_parsed != Some(category) {
            warn!(
                score,
                claimed, "upstream category disagrees with canonical band; corrected"
            );
        }
    }

    let base_rating = (score / 10).clamp(1, 10);
    let metrics = SubMetrics {
        relevance: clamp_facet(raw.metrics.relevance, base_rating),
        correctness: clamp_facet(raw.metrics.correctness, base_rating),
        syntax: clamp_facet(raw.metrics.syntax, base_rating),
        efficiency: clamp_efficiency(raw.metrics.efficiency, base_rating),
        structure: clamp_facet(raw.metrics.structure, base_rating),
        edge_cases: clamp_facet(raw.metrics.edge_cases, base_rating),
        clarity: clamp_facet(raw.metrics.clarity, base_rating),
        technical_accuracy: clamp_facet(raw.metrics.technical_accuracy, base_rating),
    };

    let strengths = keep_bullets(raw.strengths)
        .unwrap_or_else(|| fallback::synthesize_strengths(score, item_type));
    let improvements = keep_bullets(raw.improvements)
        .unwrap_or_else(|| fallback::synthesize_improvements(score, item_type));

    let narrative = raw
        .narrative
        .map(|n| n.trim().to_string())
        .filter(|n| n.chars().count() >= MIN_NARRATIVE_CHARS)
        .unwrap_or_else(|| fallback::synthesize_narrative(score, item_type));
    let assessment = raw
        .assessment
        .map(|a| a.trim().to_string())
        .filter(|a| a.chars().count() >= MIN_ASSESSMENT_CHARS)
        .unwrap_or_else(|| fallback::synthesize_assessment(score));

    EvaluationResult {
        score,
        response_category: category,
        metrics,
        strengths,
        improvements,
        narrative,
        assessment,
    }
}

fn clamp_score(raw: Option<f64>) -> u8 {
    match raw {
        Some(s) if s.is_finite() => s.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// Provided facet ratings clamp to [1,10]; absent ones backfill from the
/// base rating so no facet can contradict the overall verdict.
fn clamp_facet(raw: Option<f64>, base_rating: u8) -> u8 {
    match raw {
        Some(v) if v.is_finite() => v.round().clamp(1.0, 10.0) as u8,
        _ => base_rating,
    }
}

/// Efficiency is execution-derived and admits zero when provided; its
/// backfill runs one point conservative, still within one of the base.
fn clamp_efficiency(raw: Option<f64>, base_rating: u8) -> u8 {
    match raw {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 10.0) as u8,
        _ => base_rating.saturating_sub(1).max(1),
    }
}

/// Keeps a bullet list only when it has at least one sufficiently detailed
/// entry; blank and near-blank entries are dropped first.
fn keep_bullets(bullets: Vec<String>) -> Option<Vec<String>> {
    let kept: Vec<String> = bullets
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| b.chars().count() >= MIN_BULLET_CHARS)
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
