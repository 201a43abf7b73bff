use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::word_score::WordScore;

/// Shuffled traversal over the low-score pool. Every candidate is served once
/// before any of them repeats; the order is reshuffled per pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LowScoreCycle {
    words: Vec<String>,
    index: usize,
}

impl LowScoreCycle {
    /// Next candidate in the current pass, reshuffling `candidates` into a new
    /// pass when the old one is empty or used up. Entries that have since
    /// left the candidate set are skipped, so the returned score always comes
    /// from `candidates`. `None` only when `candidates` is empty.
    pub fn next<'a, R: Rng + ?Sized>(
        &mut self,
        candidates: &'a [WordScore],
        rng: &mut R,
    ) -> Option<&'a WordScore> {
        if candidates.is_empty() {
            return None;
        }
        loop {
            if self.is_exhausted() {
                self.refresh(candidates, rng);
            }
            let word = &self.words[self.index];
            self.index += 1;
            if let Some(found) = candidates.iter().find(|c| c.word == *word) {
                return Some(found);
            }
            debug!(word = %word, "skipping cycle entry no longer in the low-score pool");
        }
    }

    pub fn invalidate(&mut self) {
        self.words.clear();
        self.index = 0;
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Drop a single word from the pass without disturbing the remaining
    /// order. The cursor shifts back if the word was already served.
    pub fn remove_word(&mut self, word: &str) -> bool {
        let Some(pos) = self.words.iter().position(|w| w == word) else {
            return false;
        };
        self.words.remove(pos);
        if self.index > pos {
            self.index -= 1;
        }
        true
    }

    /// `(served, total)` for the current pass, `None` before the first pass.
    pub fn progress(&self) -> Option<(usize, usize)> {
        if self.words.is_empty() {
            None
        } else {
            Some((self.index, self.words.len()))
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.words.is_empty() || self.index >= self.words.len()
    }

    fn refresh<R: Rng + ?Sized>(&mut self, candidates: &[WordScore], rng: &mut R) {
        self.words = candidates.iter().map(|c| c.word.clone()).collect();
        self.words.shuffle(rng);
        self.index = 0;
        debug!(size = self.words.len(), "reshuffled low-score cycle");
    }
}
