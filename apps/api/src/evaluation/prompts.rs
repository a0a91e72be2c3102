//! Prompt assembly for answer evaluation and interview summaries.
//!
//! Templates are consts with `{placeholder}` slots. Caller-supplied content
//! is truncated to per-field caps before insertion, so the assembled prompt
//! stays bounded no matter what arrives over the API.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::models::evaluation::{EvaluationRequest, ItemType};
use crate::models::interview::InterviewAggregate;

const MAX_SUBJECT_CHARS: usize = 1200;
const MAX_RESPONSE_CHARS: usize = 4000;
const MAX_CODE_CHARS: usize = 4000;
const MAX_TRACE_CHARS: usize = 1500;

const EVALUATION_ROLE: &str = "You are a senior technical interviewer grading one candidate \
    answer. Score strictly but fairly, and judge only what the answer contains.";

/// Evaluation prompt template. Placeholders: {item_type}, {question},
/// {answer}, {code_section}, {trace_section}.
const EVALUATION_PROMPT_TEMPLATE: &str = r#"Evaluate the candidate's {item_type} interview answer below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 0,
  "category": "one of: perfectly-relevant | mostly-relevant | partially-relevant | mostly-irrelevant | completely-off-topic",
  "metrics": {
    "relevance": 5, "correctness": 5, "syntax": 5, "efficiency": 5,
    "structure": 5, "edge_cases": 5, "clarity": 5, "technical_accuracy": 5
  },
  "strengths": ["one short bullet per genuine strength"],
  "improvements": ["one short bullet per concrete improvement"],
  "narrative": "2-4 sentence evaluation of the answer",
  "assessment": "one-line verdict"
}

Scoring rules:
- "score" is an integer 0-100 for how well the answer addresses the question.
- Each metric is an integer 1-10 and must be consistent with the score.
- Strengths and improvements must reference the answer, not generic advice.

QUESTION:
{question}

CANDIDATE ANSWER:
{answer}
{code_section}{trace_section}"#;

const SUMMARY_ROLE: &str = "You are a senior interview coach writing the closing summary of a \
    mock technical interview. Write 3-5 plain sentences, encouraging but honest. \
    Respond with the summary text only, no preamble and no formatting.";

/// Summary narrative template. Placeholders: {overall}, {readiness},
/// {answered}, {skipped}, {category_lines}.
const SUMMARY_PROMPT_TEMPLATE: &str = r#"Write the closing narrative for this mock interview result.

Overall score: {overall}/100
Readiness: {readiness}
Questions answered: {answered}, skipped: {skipped}
Per-category scores:
{category_lines}

Ground every claim in the numbers above. Mention the weakest category and one concrete next step."#;

/// Builds the (system, user) prompt pair for evaluating one answer.
pub fn build_evaluation_prompt(request: &EvaluationRequest, item_type: ItemType) -> (String, String) {
    let code_section = match request.code.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(code) => format!(
            "\nCANDIDATE CODE ({}):\n{}\n",
            request.code_language.as_deref().unwrap_or("unspecified language"),
            truncate(code, MAX_CODE_CHARS)
        ),
        None => String::new(),
    };

    let trace_section = match &request.execution_trace {
        Some(trace) => format!(
            "\nEXECUTION RESULT:\nstdout: {}\nstderr: {}\n",
            truncate(&trace.output, MAX_TRACE_CHARS),
            truncate(&trace.error, MAX_TRACE_CHARS)
        ),
        None => String::new(),
    };

    let system = format!("{EVALUATION_ROLE} {JSON_ONLY_SYSTEM}");
    let prompt = EVALUATION_PROMPT_TEMPLATE
        .replace("{item_type}", item_type.as_str())
        .replace("{question}", truncate(&request.subject_text, MAX_SUBJECT_CHARS))
        .replace("{answer}", truncate(&request.response_text, MAX_RESPONSE_CHARS))
        .replace("{code_section}", &code_section)
        .replace("{trace_section}", &trace_section);

    (system, prompt)
}

/// Builds the (system, user) prompt pair for the aggregate narrative.
pub fn build_summary_prompt(aggregate: &InterviewAggregate) -> (String, String) {
    let category_lines = format!(
        "behavioral: {}/100\ntechnical: {}/100\ncoding: {}/100\ncommunication: {}/100",
        aggregate.category_scores.behavioral,
        aggregate.category_scores.technical,
        aggregate.category_scores.coding,
        aggregate.category_scores.communication,
    );

    let prompt = SUMMARY_PROMPT_TEMPLATE
        .replace("{overall}", &aggregate.overall_score.to_string())
        .replace("{readiness}", &format!("{:?}", aggregate.readiness))
        .replace("{answered}", &aggregate.answered.to_string())
        .replace("{skipped}", &aggregate.skipped.to_string())
        .replace("{category_lines}", &category_lines);

    (SUMMARY_ROLE.to_string(), prompt)
}

/// Truncates to a character cap on a char boundary.
fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
