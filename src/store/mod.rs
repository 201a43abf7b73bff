pub mod json_store;
pub mod schema;
pub mod score_store;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score {0} is outside 0..=3")]
    InvalidScore(u8),
    #[error("word must not be empty")]
    EmptyWord,
    #[error("failed to persist {file}")]
    Write {
        file: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
