use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::low_score_cycle::LowScoreCycle;
use crate::engine::recency::RecencyTracker;

const SCHEMA_VERSION: u32 = 1;

pub const SCORES_FILE: &str = "word_scores.json";
pub const DICTIONARY_FILE: &str = "words.json";
pub const SELECTION_FILE: &str = "selection_state.json";

/// Word to ordered definitions, as stored in `words.json`.
pub type DictionaryData = BTreeMap<String, Vec<String>>;

/// Recency window and low-score cycle, kept across restarts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionStateData {
    pub schema_version: u32,
    #[serde(default)]
    pub recent: RecencyTracker,
    #[serde(default)]
    pub cycle: LowScoreCycle,
}

impl Default for SelectionStateData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            recent: RecencyTracker::default(),
            cycle: LowScoreCycle::default(),
        }
    }
}

impl SelectionStateData {
    pub fn new(recent: RecencyTracker, cycle: LowScoreCycle) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            recent,
            cycle,
        }
    }

    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
