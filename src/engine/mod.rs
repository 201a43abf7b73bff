pub mod grading;
pub mod low_score_cycle;
pub mod recency;
pub mod selector;
pub mod word_score;
