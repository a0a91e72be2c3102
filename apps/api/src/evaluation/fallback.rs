//! Fallback Evaluator — the model-free scoring path.
//!
//! Activated whenever the gateway call fails, times out, or the extractor
//! cannot recover a structure. Scoring is pattern-based: each item type has
//! a set of signals the response is scanned for, each present signal adds a
//! bonus onto a low base score, capped at 100. The output goes through the
//! same normalizer as the model path, so downstream consumers never see a
//! difference in contract.
//!
//! Also hosts the band-parameterized text synthesizers the normalizer uses
//! to backfill thin narratives and empty bullet lists.

use crate::evaluation::normalizer;
use crate::models::evaluation::{
    EvaluationRequest, EvaluationResult, ItemType, RawEvaluation, ResponseCategory, SubMetrics,
};

/// Floor score for any non-skipped attempt. Low but never zero.
const BASE_SCORE: u32 = 12;
const MAX_SCORE: u32 = 100;

/// Heuristic evaluation of one answered item. Total: never fails, always
/// yields at least one strength and one improvement.
pub fn evaluate_heuristically(
    request: &EvaluationRequest,
    item_type: ItemType,
) -> EvaluationResult {
    normalizer::normalize(heuristic_raw(request, item_type), item_type)
}

/// The raw (pre-normalization) heuristic evaluation. Exposed separately so
/// the pipeline can run both branches through one normalize step.
pub fn heuristic_raw(request: &EvaluationRequest, item_type: ItemType) -> RawEvaluation {
    let scan = match item_type {
        ItemType::Coding => scan_coding(request),
        ItemType::Technical => scan_technical(request),
        ItemType::Behavioral | ItemType::Communication => scan_behavioral(request),
    };

    let score = (BASE_SCORE + scan.bonus).min(MAX_SCORE) as f64;

    RawEvaluation {
        score: Some(score),
        category: None,
        metrics: Default::default(),
        strengths: scan.strengths,
        improvements: scan.improvements,
        narrative: None,
        assessment: None,
    }
}

/// Fixed result for an item the candidate skipped. No analysis runs.
pub fn skipped_result() -> EvaluationResult {
    EvaluationResult {
        score: 0,
        response_category: ResponseCategory::Skipped,
        metrics: SubMetrics::uniform(0),
        strengths: vec![],
        improvements: vec![
            "Attempt every question — even a partial answer scores better than a skip."
                .to_string(),
        ],
        narrative: "This question was skipped, so no response was evaluated.".to_string(),
        assessment: "Skipped".to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Signal scans
// ────────────────────────────────────────────────────────────────────────────

struct SignalScan {
    bonus: u32,
    strengths: Vec<String>,
    improvements: Vec<String>,
}

impl SignalScan {
    fn new() -> Self {
        Self {
            bonus: 0,
            strengths: vec![],
            improvements: vec![],
        }
    }

    fn signal(&mut self, present: bool, bonus: u32, strength: &str, improvement: &str) {
        if present {
            self.bonus += bonus;
            self.strengths.push(strength.to_string());
        } else {
            self.improvements.push(improvement.to_string());
        }
    }
}

fn scan_coding(request: &EvaluationRequest) -> SignalScan {
    let code = request.code.as_deref().unwrap_or("");
    let text = request.response_text.as_str();
    let combined = format!("{code}\n{text}");
    let lower = combined.to_lowercase();
    let mut scan = SignalScan::new();

    scan.signal(
        !code.trim().is_empty() || !text.trim().is_empty(),
        10,
        "Submitted a code attempt",
        "Submit working code, even a partial sketch",
    );
    scan.signal(
        !code.trim().is_empty() && balanced_delimiters(&combined),
        14,
        "Brackets and parentheses are balanced",
        "Check that all brackets and parentheses are closed",
    );
    scan.signal(
        lower.contains("return"),
        12,
        "Produces an explicit result",
        "Make sure the solution returns its result",
    );
    scan.signal(
        ["if ", "if(", "for ", "for(", "while ", "while(", "match ", "switch"]
            .iter()
            .any(|kw| lower.contains(kw)),
        14,
        "Uses control flow to handle cases",
        "Consider branching or iteration to cover the general case",
    );
    let ran_clean = request
        .execution_trace
        .as_ref()
        .map(|t| !t.output.trim().is_empty() && t.error.trim().is_empty())
        .unwrap_or(false);
    scan.signal(
        ran_clean,
        20,
        "Code ran and produced output",
        "Run the code to verify it produces output",
    );
    scan.signal(
        code.chars().count() > 80,
        10,
        "Solution is substantive",
        "Flesh the solution out beyond a stub",
    );
    scan.signal(
        text.chars().count() > 120,
        8,
        "Explains the approach alongside the code",
        "Walk through your approach in words as well as code",
    );
    scan
}

fn scan_technical(request: &EvaluationRequest) -> SignalScan {
    let lower = request.response_text.to_lowercase();
    let mut scan = SignalScan::new();

    const DOMAIN_TERMS: &[&str] = &[
        "complexity",
        "algorithm",
        "database",
        "index",
        "cache",
        "thread",
        "latency",
        "throughput",
        "memory",
        "network",
        "protocol",
        "queue",
        "transaction",
        "scal",
        "concurren",
    ];
    let term_hits = DOMAIN_TERMS.iter().filter(|t| lower.contains(*t)).count() as u32;
    scan.signal(
        term_hits > 0,
        (term_hits * 6).min(30),
        "Uses relevant technical vocabulary",
        "Ground the answer in concrete technical terms",
    );
    scan.signal(
        ["for example", "e.g.", "such as", "for instance"]
            .iter()
            .any(|m| lower.contains(m)),
        12,
        "Illustrates the point with an example",
        "Add a concrete example to illustrate the idea",
    );
    scan.signal(
        ["because", "therefore", "so that", "which means", "as a result"]
            .iter()
            .any(|m| lower.contains(m)),
        12,
        "Explains cause and effect",
        "Explain why, not just what",
    );
    scan.signal(
        lower.chars().count() > 200,
        10,
        "Answer has reasonable depth",
        "Expand the answer beyond a one-liner",
    );
    scan.signal(
        lower.chars().count() > 500,
        8,
        "Covers the topic thoroughly",
        "Cover trade-offs and edge cases for a fuller answer",
    );
    scan
}

fn scan_behavioral(request: &EvaluationRequest) -> SignalScan {
    let lower = request.response_text.to_lowercase();
    let mut scan = SignalScan::new();

    scan.signal(
        ["when", "while", "during", "at my", "in my", "last year"]
            .iter()
            .any(|m| lower.contains(m)),
        12,
        "Sets the situation clearly",
        "Open with the situation: when and where this happened",
    );
    scan.signal(
        ["i led", "i built", "i implemented", "i organized", "i decided", "my role", "i worked"]
            .iter()
            .any(|m| lower.contains(m)),
        14,
        "Describes their own actions",
        "Describe the specific actions you took, in the first person",
    );
    scan.signal(
        ["result", "outcome", "improved", "increased", "reduced", "learned", "achieved"]
            .iter()
            .any(|m| lower.contains(m)),
        14,
        "States the outcome",
        "Close with the result and what you learned",
    );
    scan.signal(
        lower.chars().any(|c| c.is_ascii_digit()),
        10,
        "Quantifies the impact",
        "Quantify the impact where you can",
    );
    scan.signal(
        lower.chars().count() > 200,
        10,
        "Tells a complete story",
        "Expand the story beyond a sentence or two",
    );
    scan.signal(
        lower.chars().count() > 500,
        6,
        "Gives rich context",
        "Add more context about the stakes and constraints",
    );
    scan
}

/// Coarse delimiter-balance check. Does not track string literals.
fn balanced_delimiters(text: &str) -> bool {
    let mut paren = 0i32;
    let mut brace = 0i32;
    let mut bracket = 0i32;
    for ch in text.chars() {
        match ch {
            '(' => paren += 1,
            ')' => paren -= 1,
            '{' => brace += 1,
            '}' => brace -= 1,
            '[' => bracket += 1,
            ']' => bracket -= 1,
            _ => {}
        }
        if paren < 0 || brace < 0 || bracket < 0 {
            return false;
        }
    }
    paren == 0 && brace == 0 && bracket == 0
}

// ────────────────────────────────────────────────────────────────────────────
// Band-parameterized text synthesizers
// ────────────────────────────────────────────────────────────────────────────

/// Default strengths for a score band and item type, used when neither the
/// model nor the signal scan produced any.
pub fn synthesize_strengths(score: u8, item_type: ItemType) -> Vec<String> {
    let subject = match item_type {
        ItemType::Coding => "solution",
        ItemType::Technical => "explanation",
        ItemType::Behavioral | ItemType::Communication => "answer",
    };
    match normalizer::canonical_category(score) {
        ResponseCategory::PerfectlyRelevant => {
            vec![format!("The {subject} addresses the question fully and accurately")]
        }
        ResponseCategory::MostlyRelevant => {
            vec![format!("The {subject} covers the core of the question well")]
        }
        ResponseCategory::PartiallyRelevant => {
            vec![format!("The {subject} touches on relevant points")]
        }
        _ => vec![format!("An attempt at the {subject} was made")],
    }
}

/// Default improvements for a score band and item type.
pub fn synthesize_improvements(score: u8, item_type: ItemType) -> Vec<String> {
    let focus = match item_type {
        ItemType::Coding => "walk through the code, its edge cases, and its complexity",
        ItemType::Technical => "go deeper on the underlying concepts and trade-offs",
        ItemType::Behavioral | ItemType::Communication => {
            "structure the story around situation, action, and result"
        }
    };
    match normalizer::canonical_category(score) {
        ResponseCategory::PerfectlyRelevant => {
            vec![format!("To polish further, {focus}")]
        }
        ResponseCategory::MostlyRelevant => {
            vec![format!("Strengthen the answer: {focus}")]
        }
        ResponseCategory::PartiallyRelevant => {
            vec![format!("Address the question more directly and {focus}")]
        }
        _ => vec![format!("Revisit the question being asked, then {focus}")],
    }
}

/// Default narrative derived purely from the score band.
pub fn synthesize_narrative(score: u8, item_type: ItemType) -> String {
    let kind = item_type.as_str();
    match normalizer::canonical_category(score) {
        ResponseCategory::PerfectlyRelevant => format!(
            "An excellent {kind} response ({score}/100) that answers the question directly and with command of the material."
        ),
        ResponseCategory::MostlyRelevant => format!(
            "A solid {kind} response ({score}/100) that addresses the question well, with room to sharpen the details."
        ),
        ResponseCategory::PartiallyRelevant => format!(
            "A partial {kind} response ({score}/100): some relevant ground is covered, but key aspects of the question go unanswered."
        ),
        ResponseCategory::MostlyIrrelevant => format!(
            "The {kind} response ({score}/100) engages only loosely with what was asked and needs substantial rework."
        ),
        _ => format!(
            "The {kind} response ({score}/100) does not address the question as asked."
        ),
    }
}

/// One-line assessment for the score band.
pub fn synthesize_assessment(score: u8) -> String {
    match normalizer::canonical_category(score) {
        ResponseCategory::PerfectlyRelevant => "Excellent response".to_string(),
        ResponseCategory::MostlyRelevant => "Good response".to_string(),
        ResponseCategory::PartiallyRelevant => "Adequate response".to_string(),
        ResponseCategory::MostlyIrrelevant => "Weak response".to_string(),
        _ => "Off-topic response".to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::evaluation::ExecutionTrace;

    fn request(subject: &str, response: &str) -> EvaluationRequest {
        EvaluationRequest {
            subject_text: subject.to_string(),
            response_text: response.to_string(),
            code: None,
            code_language: None,
            execution_trace: None,
            skipped: false,
        }
    }

    #[test]
    fn test_empty_coding_answer_scores_low_but_nonzero() {
        let result = evaluate_heuristically(&request("Reverse a linked list", ""), ItemType::Coding);
        assert!(result.score > 0);
        assert!(result.score < 25, "score was {}", result.score);
        assert!(matches!(
            result.response_category,
            ResponseCategory::MostlyIrrelevant | ResponseCategory::CompletelyOffTopic
        ));
    }

    #[test]
    fn test_heuristic_always_yields_strength_and_improvement() {
        for item_type in [
            ItemType::Coding,
            ItemType::Technical,
            ItemType::Behavioral,
            ItemType::Communication,
        ] {
            let result = evaluate_heuristically(&request("q", ""), item_type);
            assert!(!result.strengths.is_empty(), "{item_type:?}");
            assert!(!result.improvements.is_empty(), "{item_type:?}");
        }
    }

    #[test]
    fn test_coding_signals_raise_the_score() {
        let mut req = request(
            "Reverse a linked list",
            "I iterate with a prev pointer and relink each node as I go, then return prev.",
        );
        req.code = Some(
            "fn reverse(mut head: Option<Box<Node>>) -> Option<Box<Node>> {\n\
             let mut prev = None;\n\
             while let Some(mut node) = head {\n\
             head = node.next.take();\n\
             node.next = prev;\n\
             prev = Some(node);\n\
             }\n\
             return prev;\n\
             }"
            .to_string(),
        );
        req.execution_trace = Some(ExecutionTrace {
            output: "3 2 1".to_string(),
            error: String::new(),
        });
        let strong = evaluate_heuristically(&req, ItemType::Coding);
        let weak = evaluate_heuristically(&request("Reverse a linked list", "idk"), ItemType::Coding);
        assert!(strong.score > weak.score);
        assert!(strong.score >= 65, "score was {}", strong.score);
    }

    #[test]
    fn test_unbalanced_code_loses_the_balance_signal() {
        let mut balanced = request("q", "");
        balanced.code = Some("fn f() { return 1; }".to_string());
        let mut unbalanced = request("q", "");
        unbalanced.code = Some("fn f() { return 1;".to_string());
        let a = evaluate_heuristically(&balanced, ItemType::Coding);
        let b = evaluate_heuristically(&unbalanced, ItemType::Coding);
        assert!(a.score > b.score);
    }

    #[test]
    fn test_technical_answer_with_signals_beats_bare_one() {
        let rich = request(
            "How do database indexes speed up queries?",
            "An index is a sorted structure, such as a B-tree, that lets the database find rows \
             without scanning the whole table. Because lookups become logarithmic rather than \
             linear, query latency drops sharply. For example, an index on user_id makes point \
             lookups nearly constant in practice, at the cost of extra memory and slower writes.",
        );
        let bare = request("How do database indexes speed up queries?", "They make it fast.");
        let a = evaluate_heuristically(&rich, ItemType::Technical);
        let b = evaluate_heuristically(&bare, ItemType::Technical);
        assert!(a.score > b.score);
        assert!(a.score >= 45, "score was {}", a.score);
    }

    #[test]
    fn test_behavioral_star_answer_scores_well() {
        let star = request(
            "Tell me about a conflict on your team",
            "Last year, during a migration at my previous company, two of us disagreed on the \
             rollout plan. I organized a short design review, laid out both options with their \
             risks, and we agreed on a staged rollout. As a result we shipped two weeks early \
             and reduced incident count by 40%. I learned to surface disagreements early.",
        );
        let result = evaluate_heuristically(&star, ItemType::Behavioral);
        assert!(result.score >= 65, "score was {}", result.score);
    }

    #[test]
    fn test_skipped_result_is_fixed() {
        let result = skipped_result();
        assert_eq!(result.score, 0);
        assert_eq!(result.response_category, ResponseCategory::Skipped);
        assert!(!result.improvements.is_empty());
    }

    #[test]
    fn test_score_is_capped_at_100() {
        // Every signal present cannot push past the cap.
        let mut req = request(
            "q",
            &"because for example such as result outcome improved ".repeat(20),
        );
        req.code = Some("fn f() { if x { return 1 } }".to_string());
        let result = evaluate_heuristically(&req, ItemType::Technical);
        assert!(result.score <= 100);
    }

    #[test]
    fn test_balanced_delimiters() {
        assert!(balanced_delimiters("fn f() { (a[0]) }"));
        assert!(!balanced_delimiters("fn f() { (a[0]"));
        assert!(!balanced_delimiters(")("));
    }

    #[test]
    fn test_synthesized_texts_track_the_band() {
        assert!(synthesize_narrative(90, ItemType::Coding).contains("excellent"));
        assert!(synthesize_narrative(10, ItemType::Coding).contains("does not address"));
        assert_eq!(synthesize_assessment(70), "Good response");
        assert!(!synthesize_strengths(50, ItemType::Technical).is_empty());
        assert!(!synthesize_improvements(50, ItemType::Technical).is_empty());
    }
}
