use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::config::Config;
use crate::dictionary::{Dictionary, WordEntry};
use crate::engine::low_score_cycle::LowScoreCycle;
use crate::engine::recency::RecencyTracker;
use crate::engine::word_score::WordScore;
use crate::store::schema::SelectionStateData;
use crate::store::score_store::ScoreStore;

/// Doubled averages up to 4 (a true average of 2.0) count as struggling.
pub const LOW_SCORE_RANGE: (u8, u8) = (0, 4);
pub const HIGH_SCORE_RANGE: (u8, u8) = (5, 6);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub new_words_studied: u8,
    pub max_recent_words: usize,
    pub last_score_threshold: Option<u8>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SelectionPolicy {
    fn from(config: &Config) -> Self {
        Self {
            new_words_studied: config.new_words_studied,
            max_recent_words: config.max_recent_words,
            last_score_threshold: config.last_score_threshold(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionSource {
    LowScoreReview,
    NewWord,
    HighScoreReview,
    Fallback,
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub entry: WordEntry,
    pub source: SelectionSource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionStats {
    pub recent_count: usize,
    pub cycle_progress: Option<(usize, usize)>,
}

impl fmt::Display for SelectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recent words: {}, low-score cycle: ", self.recent_count)?;
        match self.cycle_progress {
            Some((index, len)) => write!(f, "{index}/{len}"),
            None => write!(f, "Not started"),
        }
    }
}

/// Picks the next word to study:
///
/// 1. struggling words, cycled so each comes up once per pass;
/// 2. with `new_words_studied` percent chance, a word never graded;
/// 3. well-known words, weighted towards the lower of them;
/// 4. anything not shown recently (or anything at all).
///
/// Every pick enters the recency window and is skipped by later rounds until
/// it ages out.
pub struct WordSelector {
    policy: SelectionPolicy,
    recent: RecencyTracker,
    cycle: LowScoreCycle,
    rng: SmallRng,
}

impl WordSelector {
    pub fn new(policy: SelectionPolicy, rng: SmallRng) -> Self {
        Self::from_state(policy, SelectionStateData::default(), rng)
    }

    pub fn from_state(policy: SelectionPolicy, state: SelectionStateData, rng: SmallRng) -> Self {
        let mut recent = state.recent;
        recent.set_capacity(policy.max_recent_words);
        Self {
            policy,
            recent,
            cycle: state.cycle,
            rng,
        }
    }

    pub fn state(&self) -> SelectionStateData {
        SelectionStateData::new(self.recent.clone(), self.cycle.clone())
    }

    pub fn set_policy(&mut self, policy: SelectionPolicy) {
        self.recent.set_capacity(policy.max_recent_words);
        self.policy = policy;
    }

    pub fn recent(&self) -> &RecencyTracker {
        &self.recent
    }

    pub fn select_next(&mut self, scores: &ScoreStore, dictionary: &Dictionary) -> Selection {
        let picked = self
            .low_score_review(scores, dictionary)
            .map(|e| (e, SelectionSource::LowScoreReview))
            .or_else(|| {
                self.new_word(scores, dictionary)
                    .map(|e| (e, SelectionSource::NewWord))
            })
            .or_else(|| {
                self.high_score_review(scores, dictionary)
                    .map(|e| (e, SelectionSource::HighScoreReview))
            })
            .or_else(|| self.fallback(dictionary).map(|e| (e, SelectionSource::Fallback)));

        match picked {
            Some((entry, source)) => {
                self.recent.add(entry.word.clone());
                debug!(word = %entry.word, ?source, "selected word");
                Selection { entry, source }
            }
            None => {
                debug!("dictionary empty, nothing to select");
                Selection {
                    entry: WordEntry::empty(),
                    source: SelectionSource::Empty,
                }
            }
        }
    }

    fn low_score_review(&mut self, scores: &ScoreStore, dictionary: &Dictionary) -> Option<WordEntry> {
        let (min, max) = LOW_SCORE_RANGE;
        let pool = self.not_recent(in_dictionary(
            scores.scores_in_range(min, max, None),
            dictionary,
        ));
        let picked = self.cycle.next(&pool, &mut self.rng)?;
        entry_for(dictionary, &picked.word)
    }

    fn new_word(&mut self, scores: &ScoreStore, dictionary: &Dictionary) -> Option<WordEntry> {
        let roll: u8 = self.rng.gen_range(1..=100);
        if roll > self.policy.new_words_studied {
            return None;
        }
        let seen: HashSet<String> = scores
            .all_scores()
            .into_iter()
            .map(|ws| ws.word.to_lowercase())
            .collect();
        let recent = &self.recent;
        let unseen: Vec<(&str, &[String])> = dictionary
            .iter()
            .filter(|(word, _)| !seen.contains(&word.to_lowercase()) && !recent.contains(word))
            .collect();
        unseen.choose(&mut self.rng).map(|(word, defs)| WordEntry {
            word: word.to_string(),
            definitions: defs.to_vec(),
        })
    }

    fn high_score_review(&mut self, scores: &ScoreStore, dictionary: &Dictionary) -> Option<WordEntry> {
        let (min, max) = HIGH_SCORE_RANGE;
        let pool = self.not_recent(in_dictionary(
            scores.scores_in_range(min, max, self.policy.last_score_threshold),
            dictionary,
        ));
        if pool.is_empty() {
            return None;
        }
        let weights = pool
            .iter()
            .map(|ws| 1.0 / f64::from(ws.average_score_int() + 1));
        let dist = match WeightedIndex::new(weights) {
            Ok(dist) => dist,
            Err(e) => {
                warn!(error = %e, "could not weight high-score pool");
                return None;
            }
        };
        let picked = &pool[dist.sample(&mut self.rng)];
        entry_for(dictionary, &picked.word)
    }

    fn fallback(&mut self, dictionary: &Dictionary) -> Option<WordEntry> {
        let recent = &self.recent;
        let mut available: Vec<(&str, &[String])> = dictionary
            .iter()
            .filter(|(word, _)| !recent.contains(word))
            .collect();
        if available.is_empty() {
            available = dictionary.iter().collect();
        }
        available.choose(&mut self.rng).map(|(word, defs)| WordEntry {
            word: word.to_string(),
            definitions: defs.to_vec(),
        })
    }

    fn not_recent(&self, words: Vec<WordScore>) -> Vec<WordScore> {
        words
            .into_iter()
            .filter(|ws| !self.recent.contains(&ws.word))
            .collect()
    }

    /// Let a mastered word come back sooner. The low-score cycle is dropped
    /// when it holds the word, since its pool is now stale.
    pub fn mark_learned(&mut self, word: &str) -> bool {
        let removed = self.recent.remove(word);
        let in_cycle = self.cycle.contains(word);
        if in_cycle {
            self.cycle.invalidate();
        }
        removed || in_cycle
    }

    /// Scrub a word deleted from the dictionary out of the selection state.
    pub fn forget(&mut self, word: &str) {
        self.recent.remove(word);
        self.cycle.remove_word(word);
    }

    pub fn reset(&mut self) {
        self.recent.reset();
        self.cycle.invalidate();
    }

    pub fn stats(&self) -> SelectionStats {
        SelectionStats {
            recent_count: self.recent.len(),
            cycle_progress: self.cycle.progress(),
        }
    }
}

/// Scored words still in the dictionary, respelled with the dictionary key.
/// Words removed from the dictionary since they were scored drop out here.
fn in_dictionary(words: Vec<WordScore>, dictionary: &Dictionary) -> Vec<WordScore> {
    words
        .into_iter()
        .filter_map(|mut ws| {
            let key = dictionary.resolve(&ws.word)?.to_string();
            ws.word = key;
            Some(ws)
        })
        .collect()
}

fn entry_for(dictionary: &Dictionary, word: &str) -> Option<WordEntry> {
    dictionary.get(word).map(|defs| WordEntry {
        word: word.to_string(),
        definitions: defs.to_vec(),
    })
}
