//! Structured Extractor — recovers a JSON value from raw model text.
//!
//! The provider enforces no output schema, so replies arrive wrapped in
//! prose, fenced in markdown, littered with trailing commas, or cut off
//! mid-array. Extraction runs an ordered list of repair passes and attempts
//! a strict parse after each one; the first parse that yields a value of
//! the expected shape wins. Well-formed input parses before any repair
//! runs, so clean text is returned untouched.
//!
//! A reply that parses to the wrong shape (an object where an array was
//! asked for) is a failure, never silently returned.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Expected top-level shape of the extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Array,
    Object,
}

impl Shape {
    fn delimiters(self) -> (char, char) {
        match self {
            Self::Array => ('[', ']'),
            Self::Object => ('{', '}'),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// No plausible structure could be recovered. Callers must treat this the
/// same as the model being unavailable and divert to the heuristic path.
#[derive(Debug, Error)]
#[error("could not extract a JSON {shape} from model output")]
pub struct ExtractionError {
    pub shape: Shape,
    /// Original model text, kept for diagnostics.
    pub raw: String,
}

type Repair = fn(&str, Shape) -> Option<String>;

/// Repair passes in escalation order. Each takes the current candidate
/// text and returns a rewritten candidate, or `None` when it does not
/// apply. The passes are independent and individually tested.
const REPAIRS: &[(&str, Repair)] = &[
    ("strip-wrappers", strip_wrappers),
    ("slice-span", slice_span),
    ("tidy", tidy),
    ("escape-stray-quotes", escape_stray_quotes),
    ("reclose-truncated", reclose_truncated),
];

/// Extracts a JSON value of the given shape from raw model text.
pub fn extract(raw: &str, shape: Shape) -> Result<Value, ExtractionError> {
    if let Some(value) = try_parse(raw, shape) {
        return Ok(value);
    }

    let mut candidate = raw.to_string();
    for (name, repair) in REPAIRS {
        let Some(repaired) = repair(&candidate, shape) else {
            continue;
        };
        candidate = repaired;
        if let Some(value) = try_parse(&candidate, shape) {
            debug!("model output parsed after '{name}' repair");
            return Ok(value);
        }
    }

    Err(ExtractionError {
        shape,
        raw: raw.to_string(),
    })
}

/// Strict parse, accepted only when the top-level value has the expected shape.
fn try_parse(text: &str, shape: Shape) -> Option<Value> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    shape.matches(&value).then_some(value)
}

// ────────────────────────────────────────────────────────────────────────────
// Repair passes
// ────────────────────────────────────────────────────────────────────────────

/// Drops markdown code fences and any prose around them. An unterminated
/// fence (the model got cut off) keeps everything after the opener.
fn strip_wrappers(text: &str, _shape: Shape) -> Option<String> {
    let trimmed = text.trim();
    let start = trimmed.find("```")?;
    let after = &trimmed[start + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let body = match after.find("```") {
        Some(end) => &after[..end],
        None => after,
    };
    Some(body.trim().to_string())
}

/// Slices to the span from the first opening delimiter to the last closing
/// one. When no closer follows the opener the tail is kept as-is for the
/// reclose pass to finish.
fn slice_span(text: &str, shape: Shape) -> Option<String> {
    let (open, close) = shape.delimiters();
    let start = text.find(open)?;
    let slice = match text.rfind(close) {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    };
    Some(slice.to_string())
}

/// Normalizes formatting noise: raw newlines (invalid inside JSON strings)
/// become spaces, and trailing commas before a closing delimiter are
/// dropped. String content is otherwise left untouched.
fn tidy(text: &str, _shape: Shape) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                out.push(ch);
                escaped = false;
                continue;
            }
            match ch {
                '\\' => {
                    out.push(ch);
                    escaped = true;
                }
                '"' => {
                    in_string = false;
                    out.push(ch);
                }
                '\n' | '\r' => out.push(' '),
                _ => out.push(ch),
            }
        } else {
            match ch {
                '"' => {
                    in_string = true;
                    out.push(ch);
                }
                '\n' | '\r' | '\t' => out.push(' '),
                ',' => {
                    // Trailing comma: next non-space char closes a scope.
                    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if !matches!(next.copied(), Some('}') | Some(']')) {
                        out.push(ch);
                    }
                }
                _ => out.push(ch),
            }
        }
    }

    Some(out)
}

/// Escapes quotation marks that open or sit inside a string value without
/// plausibly closing it. A quote is taken as a closer only when the next
/// non-space character is a separator or scope end.
fn escape_stray_quotes(text: &str, _shape: Shape) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            continue;
        }
        if escaped {
            out.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                out.push(ch);
                escaped = true;
            }
            '"' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace()).copied();
                let closes = matches!(next, None | Some(',') | Some('}') | Some(']') | Some(':'));
                if closes {
                    in_string = false;
                    out.push('"');
                } else {
                    out.push_str("\\\"");
                }
            }
            _ => out.push(ch),
        }
    }

    Some(out)
}

/// Handles output truncated mid-structure: trims back to the last complete
/// element, then closes every still-open scope. Applies only when the
/// candidate has unbalanced delimiters.
fn reclose_truncated(text: &str, _shape: Shape) -> Option<String> {
    let open = open_scopes(text)?;
    if open.is_empty() {
        return None;
    }

    let cut = last_separator_outside_strings(text)?;
    let mut repaired = text[..cut].trim_end().to_string();
    let remaining = open_scopes(&repaired)?;
    for opener in remaining.iter().rev() {
        repaired.push(match opener {
            '[' => ']',
            _ => '}',
        });
    }
    Some(repaired)
}

/// Stack of unclosed delimiters, scanning outside string literals.
/// `None` when the text has a mismatched closer (beyond this repair).
fn open_scopes(text: &str) -> Option<Vec<char>> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' | '{' => stack.push(ch),
            ']' => {
                if stack.pop() != Some('[') {
                    return None;
                }
            }
            '}' => {
                if stack.pop() != Some('{') {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(stack)
}

/// Byte index of the last element separator outside any string literal.
fn last_separator_outside_strings(text: &str) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    let mut last = None;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            ',' => last = Some(i),
            _ => {}
        }
    }
    last
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
