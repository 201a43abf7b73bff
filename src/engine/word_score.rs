use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_SCORE: u8 = 3;
const HISTORY_LEN: usize = 2;

/// Bucket keys on the doubled average scale, highest first.
pub const AVERAGE_LEVELS: [u8; 7] = [6, 5, 4, 3, 2, 1, 0];

/// Rolling average of `scores` doubled and rounded, so 2.5 becomes 5.
pub fn doubled_average(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u32 = scores.iter().map(|&s| u32::from(s.min(MAX_SCORE))).sum();
    let count = scores.len() as u32;
    ((sum * 2 + count / 2) / count) as u8
}

// --- WordScore ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordScore {
    pub word: String,
    pub scores: Vec<u8>,
    pub last_updated: DateTime<Utc>,
}

impl WordScore {
    pub fn new(word: &str, score: u8, now: DateTime<Utc>) -> Self {
        Self {
            word: word.to_string(),
            scores: vec![score],
            last_updated: now,
        }
    }

    pub fn add_score(&mut self, score: u8, now: DateTime<Utc>) {
        self.scores.push(score);
        self.trim_history();
        self.last_updated = now;
    }

    pub fn average_score_int(&self) -> u8 {
        doubled_average(&self.scores)
    }

    pub fn last_score(&self) -> Option<u8> {
        self.scores.last().copied()
    }

    /// Case-insensitive word comparison.
    pub fn matches(&self, word: &str) -> bool {
        self.word.to_lowercase() == word.to_lowercase()
    }

    fn trim_history(&mut self) {
        if self.scores.len() > HISTORY_LEN {
            let excess = self.scores.len() - HISTORY_LEN;
            self.scores.drain(..excess);
        }
    }
}

// --- ScoreGroup ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreGroup {
    pub average_score_int: u8,
    #[serde(default)]
    pub words: Vec<WordScore>,
}

impl ScoreGroup {
    pub fn new(average_score_int: u8) -> Self {
        Self {
            average_score_int,
            words: Vec::new(),
        }
    }
}

// --- ScoreData ---

/// All seven buckets. Every word lives in exactly the bucket matching its
/// current doubled average.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreData {
    #[serde(default)]
    pub groups: Vec<ScoreGroup>,
}

impl Default for ScoreData {
    fn default() -> Self {
        Self {
            groups: AVERAGE_LEVELS.iter().map(|&avg| ScoreGroup::new(avg)).collect(),
        }
    }
}

impl ScoreData {
    /// Repair data read from disk: synthesize missing buckets, clamp and trim
    /// histories, drop case-insensitive duplicates (newest wins) and re-file
    /// any word sitting in the wrong bucket.
    pub fn normalized(self) -> Self {
        let mut words: Vec<WordScore> = self
            .groups
            .into_iter()
            .flat_map(|g| g.words)
            .filter(|ws| !ws.word.is_empty() && !ws.scores.is_empty())
            .collect();
        words.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));

        let mut data = ScoreData::default();
        for mut ws in words {
            if data.locate(&ws.word).is_some() {
                continue;
            }
            for s in ws.scores.iter_mut() {
                *s = (*s).min(MAX_SCORE);
            }
            ws.trim_history();
            data.insert(ws);
        }
        data
    }

    pub fn group(&self, average_score_int: u8) -> Option<&ScoreGroup> {
        self.groups
            .iter()
            .find(|g| g.average_score_int == average_score_int)
    }

    pub fn word_count(&self) -> usize {
        self.groups.iter().map(|g| g.words.len()).sum()
    }

    pub fn iter_words(&self) -> impl Iterator<Item = &WordScore> {
        self.groups.iter().flat_map(|g| g.words.iter())
    }

    /// (group index, word index) of `word`, compared case-insensitively.
    pub fn locate(&self, word: &str) -> Option<(usize, usize)> {
        let needle = word.to_lowercase();
        self.groups.iter().enumerate().find_map(|(gi, g)| {
            g.words
                .iter()
                .position(|ws| ws.word.to_lowercase() == needle)
                .map(|wi| (gi, wi))
        })
    }

    pub fn find(&self, word: &str) -> Option<&WordScore> {
        self.locate(word)
            .map(|(gi, wi)| &self.groups[gi].words[wi])
    }

    /// Append `score` to the word's history (creating it if unseen) and move
    /// it into the bucket for its new average.
    pub fn record(&mut self, word: &str, score: u8, now: DateTime<Utc>) -> WordScore {
        let updated = match self.locate(word) {
            Some((gi, wi)) => {
                let mut existing = self.groups[gi].words.remove(wi);
                existing.add_score(score, now);
                existing
            }
            None => WordScore::new(word, score, now),
        };
        self.insert(updated.clone());
        updated
    }

    fn insert(&mut self, ws: WordScore) {
        let avg = ws.average_score_int();
        match self.groups.iter_mut().find(|g| g.average_score_int == avg) {
            Some(group) => group.words.push(ws),
            None => {
                let mut group = ScoreGroup::new(avg);
                group.words.push(ws);
                self.groups.push(group);
                self.groups
                    .sort_by(|a, b| b.average_score_int.cmp(&a.average_score_int));
            }
        }
    }
}
