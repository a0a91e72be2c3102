//! Interview aggregation — folds per-item evaluations into one overall
//! assessment.
//!
//! The numeric aggregate is a pure computation over the per-item results
//! and never depends on the model. A single model call may be attempted to
//! phrase the closing narrative; when it fails, the locally derived
//! narrative stands.

pub mod handlers;

use tracing::warn;

use crate::evaluation::Evaluator;
use crate::evaluation::prompts::build_summary_prompt;
use crate::models::evaluation::{EvaluationResult, ItemType, ResponseCategory};
use crate::models::interview::{CategoryScores, InterviewAggregate, ReadinessLevel};

/// Minimum length for a model-phrased narrative to replace the local one.
const MIN_NARRATIVE_CHARS: usize = 40;

/// Pure numeric aggregation. Lists are parallel: `item_types[i]` describes
/// `results[i]`; a length mismatch ignores the unpaired tail.
pub fn compute_aggregate(
    results: &[EvaluationResult],
    item_types: &[ItemType],
) -> InterviewAggregate {
    let paired: Vec<(&EvaluationResult, ItemType)> = results
        .iter()
        .zip(item_types.iter().copied())
        .collect();

    let skipped = paired
        .iter()
        .filter(|(r, _)| r.response_category == ResponseCategory::Skipped)
        .count();
    let answered: Vec<(&EvaluationResult, ItemType)> = paired
        .into_iter()
        .filter(|(r, _)| r.response_category != ResponseCategory::Skipped)
        .collect();

    if answered.is_empty() {
        return not_ready_aggregate(skipped);
    }

    let overall = mean_score(answered.iter().map(|(r, _)| r.score));
    let category_scores = CategoryScores {
        behavioral: category_mean(&answered, ItemType::Behavioral, overall),
        technical: category_mean(&answered, ItemType::Technical, overall),
        coding: category_mean(&answered, ItemType::Coding, overall),
        communication: category_mean(&answered, ItemType::Communication, overall),
    };

    let mut readiness = readiness_for(overall);
    if skipped > 0 {
        readiness = readiness.demoted();
    }

    let strengths = collect_distinct(answered.iter().map(|(r, _)| &r.strengths), 5);
    let improvements = collect_distinct(answered.iter().map(|(r, _)| &r.improvements), 5);
    let recommendations = build_recommendations(&category_scores, skipped);
    let narrative = heuristic_narrative(overall, readiness, answered.len(), skipped, &category_scores);

    InterviewAggregate {
        overall_score: overall,
        readiness,
        category_scores,
        strengths,
        improvements,
        recommendations,
        narrative,
        answered: answered.len(),
        skipped,
    }
}

/// Aggregation with a model-phrased narrative where possible. The numbers
/// are final before the model is consulted.
pub async fn summarize(
    evaluator: &Evaluator,
    results: &[EvaluationResult],
    item_types: &[ItemType],
) -> InterviewAggregate {
    let mut aggregate = compute_aggregate(results, item_types);
    if aggregate.answered == 0 {
        return aggregate;
    }

    let (system, prompt) = build_summary_prompt(&aggregate);
    match evaluator.generate_text(&system, &prompt).await {
        Ok(text) if text.trim().chars().count() >= MIN_NARRATIVE_CHARS => {
            aggregate.narrative = text.trim().to_string();
        }
        Ok(_) => warn!("summary narrative too thin; keeping locally derived narrative"),
        Err(e) => warn!("summary narrative call failed ({e}); keeping locally derived narrative"),
    }
    aggregate
}

// ────────────────────────────────────────────────────────────────────────────
// Numeric helpers
// ────────────────────────────────────────────────────────────────────────────

fn mean_score(scores: impl Iterator<Item = u8>) -> u8 {
    let (sum, count) = scores.fold((0u32, 0u32), |(s, c), v| (s + v as u32, c + 1));
    if count == 0 {
        0
    } else {
        ((sum as f64 / count as f64).round() as u32).min(100) as u8
    }
}

/// Mean within one category; a category with no answered items falls back
/// to the global mean.
fn category_mean(
    answered: &[(&EvaluationResult, ItemType)],
    category: ItemType,
    global_mean: u8,
) -> u8 {
    let scores: Vec<u8> = answered
        .iter()
        .filter(|(_, t)| *t == category)
        .map(|(r, _)| r.score)
        .collect();
    if scores.is_empty() {
        global_mean
    } else {
        mean_score(scores.into_iter())
    }
}

fn readiness_for(overall: u8) -> ReadinessLevel {
    match overall {
        85..=100 => ReadinessLevel::WellPrepared,
        65..=84 => ReadinessLevel::AlmostReady,
        45..=64 => ReadinessLevel::NeedsPractice,
        _ => ReadinessLevel::NotReady,
    }
}

/// Fixed aggregate for an interview where nothing was answered.
fn not_ready_aggregate(skipped: usize) -> InterviewAggregate {
    InterviewAggregate {
        overall_score: 0,
        readiness: ReadinessLevel::NotReady,
        category_scores: CategoryScores {
            behavioral: 0,
            technical: 0,
            coding: 0,
            communication: 0,
        },
        strengths: vec![],
        improvements: vec![
            "Answer the questions — every item in this session was skipped.".to_string(),
        ],
        recommendations: vec![
            "Retake the mock interview and attempt each question, even partially.".to_string(),
        ],
        narrative: format!(
            "All {skipped} questions were skipped, so there is nothing to assess yet. \
             Attempt the questions to get a meaningful readiness picture."
        ),
        answered: 0,
        skipped,
    }
}

/// First `limit` distinct bullets across all results, in order.
fn collect_distinct<'a>(
    lists: impl Iterator<Item = &'a Vec<String>>,
    limit: usize,
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for item in list {
            if out.len() == limit {
                return out;
            }
            if seen.insert(item.to_lowercase()) {
                out.push(item.clone());
            }
        }
    }
    out
}

fn build_recommendations(scores: &CategoryScores, skipped: usize) -> Vec<String> {
    let mut recommendations = Vec::new();

    let categories = [
        ("behavioral", scores.behavioral, "practice structuring stories around situation, action, and result"),
        ("technical", scores.technical, "review core concepts and explain them out loud with examples"),
        ("coding", scores.coding, "drill timed coding exercises and run your solutions"),
        ("communication", scores.communication, "rehearse answering concisely and checking for understanding"),
    ];
    if let Some((name, score, advice)) = categories.iter().min_by_key(|(_, s, _)| *s) {
        if *score < 85 {
            recommendations.push(format!(
                "Focus on the {name} round ({score}/100): {advice}."
            ));
        }
    }
    if skipped > 0 {
        recommendations.push(format!(
            "Attempt every question next time — {skipped} skipped item(s) pulled the readiness verdict down."
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("Keep practicing under realistic interview conditions.".to_string());
    }
    recommendations
}

/// Narrative derived purely from the computed numbers.
fn heuristic_narrative(
    overall: u8,
    readiness: ReadinessLevel,
    answered: usize,
    skipped: usize,
    scores: &CategoryScores,
) -> String {
    let verdict = match readiness {
        ReadinessLevel::WellPrepared => "You are interview-ready",
        ReadinessLevel::AlmostReady => "You are close to interview-ready",
        ReadinessLevel::NeedsPractice => "You need focused practice before interviewing",
        ReadinessLevel::NotReady => "You are not ready to interview yet",
    };
    let weakest = [
        ("behavioral", scores.behavioral),
        ("technical", scores.technical),
        ("coding", scores.coding),
        ("communication", scores.communication),
    ]
    .into_iter()
    .min_by_key(|(_, s)| *s)
    .map(|(name, _)| name)
    .unwrap_or("technical");

    let skip_note = if skipped > 0 {
        format!(" Skipping {skipped} question(s) lowered the verdict.")
    } else {
        String::new()
    };

    format!(
        "{verdict}: {overall}/100 across {answered} answered question(s). \
         The weakest area was the {weakest} round, which is where preparation \
         time will pay off most.{skip_note}"
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::fallback;
    use crate::models::evaluation::SubMetrics;

    fn result_with_score(score: u8) -> EvaluationResult {
        EvaluationResult {
            score,
            response_category: crate::evaluation::normalizer::canonical_category(score),
            metrics: SubMetrics::uniform((score / 10).clamp(1, 10)),
            strengths: vec![format!("strength at {score}")],
            improvements: vec![format!("improvement at {score}")],
            narrative: "n".to_string(),
            assessment: "a".to_string(),
        }
    }

    #[test]
    fn test_all_skipped_interview_is_not_ready() {
        let results: Vec<EvaluationResult> = (0..10).map(|_| fallback::skipped_result()).collect();
        let types = vec![ItemType::Coding; 10];
        let aggregate = compute_aggregate(&results, &types);
        assert_eq!(aggregate.overall_score, 0);
        assert_eq!(aggregate.readiness, ReadinessLevel::NotReady);
        assert_eq!(aggregate.answered, 0);
        assert_eq!(aggregate.skipped, 10);
    }

    #[test]
    fn test_all_skipped_is_independent_of_item_types() {
        let results: Vec<EvaluationResult> = (0..10).map(|_| fallback::skipped_result()).collect();
        let mixed = vec![
            ItemType::Behavioral,
            ItemType::Technical,
            ItemType::Coding,
            ItemType::Communication,
            ItemType::Behavioral,
            ItemType::Technical,
            ItemType::Coding,
            ItemType::Communication,
            ItemType::Behavioral,
            ItemType::Technical,
        ];
        let aggregate = compute_aggregate(&results, &mixed);
        assert_eq!(aggregate.overall_score, 0);
        assert_eq!(aggregate.readiness, ReadinessLevel::NotReady);
    }

    #[test]
    fn test_uniform_technical_scores_propagate_to_all_categories() {
        let results: Vec<EvaluationResult> = (0..5).map(|_| result_with_score(70)).collect();
        let types = vec![ItemType::Technical; 5];
        let aggregate = compute_aggregate(&results, &types);
        assert_eq!(aggregate.overall_score, 70);
        assert_eq!(aggregate.category_scores.technical, 70);
        // Categories with no items fall back to the global mean.
        assert_eq!(aggregate.category_scores.behavioral, 70);
        assert_eq!(aggregate.category_scores.coding, 70);
        assert_eq!(aggregate.category_scores.communication, 70);
    }

    #[test]
    fn test_skipped_items_are_excluded_from_the_mean() {
        let results = vec![
            result_with_score(80),
            fallback::skipped_result(),
            result_with_score(60),
        ];
        let types = vec![ItemType::Technical, ItemType::Coding, ItemType::Technical];
        let aggregate = compute_aggregate(&results, &types);
        assert_eq!(aggregate.overall_score, 70);
        assert_eq!(aggregate.answered, 2);
        assert_eq!(aggregate.skipped, 1);
    }

    #[test]
    fn test_skips_demote_readiness_one_level() {
        let no_skip = compute_aggregate(
            &[result_with_score(90), result_with_score(90)],
            &[ItemType::Technical, ItemType::Coding],
        );
        assert_eq!(no_skip.readiness, ReadinessLevel::WellPrepared);

        let with_skip = compute_aggregate(
            &[
                result_with_score(90),
                result_with_score(90),
                fallback::skipped_result(),
            ],
            &[ItemType::Technical, ItemType::Coding, ItemType::Behavioral],
        );
        assert_eq!(with_skip.overall_score, 90);
        assert_eq!(with_skip.readiness, ReadinessLevel::AlmostReady);
    }

    #[test]
    fn test_per_category_means_are_separate() {
        let results = vec![
            result_with_score(90),
            result_with_score(50),
            result_with_score(70),
        ];
        let types = vec![ItemType::Behavioral, ItemType::Coding, ItemType::Coding];
        let aggregate = compute_aggregate(&results, &types);
        assert_eq!(aggregate.category_scores.behavioral, 90);
        assert_eq!(aggregate.category_scores.coding, 60);
        assert_eq!(aggregate.overall_score, 70);
        assert_eq!(aggregate.category_scores.technical, 70);
    }

    #[test]
    fn test_readiness_bands() {
        assert_eq!(readiness_for(85), ReadinessLevel::WellPrepared);
        assert_eq!(readiness_for(84), ReadinessLevel::AlmostReady);
        assert_eq!(readiness_for(65), ReadinessLevel::AlmostReady);
        assert_eq!(readiness_for(64), ReadinessLevel::NeedsPractice);
        assert_eq!(readiness_for(45), ReadinessLevel::NeedsPractice);
        assert_eq!(readiness_for(44), ReadinessLevel::NotReady);
        assert_eq!(readiness_for(0), ReadinessLevel::NotReady);
    }

    #[test]
    fn test_strengths_are_deduplicated_and_capped() {
        let mut results = Vec::new();
        for _ in 0..8 {
            let mut r = result_with_score(70);
            r.strengths = vec!["Clear communication".to_string()];
            results.push(r);
        }
        let types = vec![ItemType::Technical; 8];
        let aggregate = compute_aggregate(&results, &types);
        assert_eq!(aggregate.strengths.len(), 1);
    }

    #[test]
    fn test_recommendations_name_the_weakest_category() {
        let results = vec![result_with_score(90), result_with_score(40)];
        let types = vec![ItemType::Technical, ItemType::Coding];
        let aggregate = compute_aggregate(&results, &types);
        assert!(aggregate
            .recommendations
            .iter()
            .any(|r| r.contains("coding")));
    }

    #[test]
    fn test_narrative_mentions_skips_when_present() {
        let results = vec![result_with_score(70), fallback::skipped_result()];
        let types = vec![ItemType::Technical, ItemType::Coding];
        let aggregate = compute_aggregate(&results, &types);
        assert!(aggregate.narrative.contains("Skipping 1"));
    }

    #[test]
    fn test_length_mismatch_ignores_unpaired_tail() {
        let results = vec![result_with_score(80), result_with_score(60)];
        let types = vec![ItemType::Technical];
        let aggregate = compute_aggregate(&results, &types);
        assert_eq!(aggregate.answered, 1);
        assert_eq!(aggregate.overall_score, 80);
    }
}
