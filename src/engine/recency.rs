use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RECENT_WORDS: usize = 10;

fn default_capacity() -> usize {
    DEFAULT_MAX_RECENT_WORDS
}

/// FIFO window of the most recently served words.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecencyTracker {
    words: VecDeque<String>,
    #[serde(skip, default = "default_capacity")]
    capacity: usize,
}

impl Default for RecencyTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECENT_WORDS)
    }
}

impl RecencyTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            words: VecDeque::new(),
            capacity,
        }
    }

    /// Shrinking the window evicts the oldest entries right away.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict();
    }

    /// Exact, case-sensitive match.
    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn add(&mut self, word: impl Into<String>) {
        self.words.push_back(word.into());
        self.evict();
    }

    /// Removes the first occurrence. Returns whether anything was removed.
    pub fn remove(&mut self, word: &str) -> bool {
        match self.words.iter().position(|w| w == word) {
            Some(idx) => {
                self.words.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.words.clear();
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(|s| s.as_str())
    }

    fn evict(&mut self) {
        while self.words.len() > self.capacity {
            self.words.pop_front();
        }
    }
}
