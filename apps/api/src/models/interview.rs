//! Data model for whole-interview aggregation.

use serde::{Deserialize, Serialize};

/// Coarse readiness verdict for the interview as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessLevel {
    WellPrepared,
    AlmostReady,
    NeedsPractice,
    NotReady,
}

impl ReadinessLevel {
    /// One step more cautious. Applied once when any item was skipped.
    pub fn demoted(self) -> Self {
        match self {
            Self::WellPrepared => Self::AlmostReady,
            Self::AlmostReady => Self::NeedsPractice,
            Self::NeedsPractice | Self::NotReady => Self::NotReady,
        }
    }
}

/// Mean score per item category, 0–100 each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScores {
    pub behavioral: u8,
    pub technical: u8,
    pub coding: u8,
    pub communication: u8,
}

/// Derived summary over all per-item results of one interview. Never
/// persisted here — recomputed whenever the set of results changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewAggregate {
    pub overall_score: u8,
    pub readiness: ReadinessLevel,
    pub category_scores: CategoryScores,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub recommendations: Vec<String>,
    pub narrative: String,
    pub answered: usize,
    pub skipped: usize,
}
