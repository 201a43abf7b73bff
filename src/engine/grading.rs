use serde::{Deserialize, Serialize};

use crate::engine::word_score::MAX_SCORE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Correct,
    Partial,
    #[serde(other)]
    Incorrect,
}

impl UsageLevel {
    pub fn stars(self) -> u8 {
        match self {
            UsageLevel::Correct => 2,
            UsageLevel::Partial => 1,
            UsageLevel::Incorrect => 0,
        }
    }
}

/// Verdict returned by the sentence-grading service for one submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    pub grammar: bool,
    pub usage: UsageLevel,
    #[serde(default)]
    pub feedback: String,
}

impl GradeResult {
    /// Star rating in `0..=3`: one for grammar plus up to two for usage.
    pub fn stars(&self) -> u8 {
        (u8::from(self.grammar) + self.usage.stars()).min(MAX_SCORE)
    }

    pub fn is_perfect(&self) -> bool {
        self.stars() == MAX_SCORE
    }
}
