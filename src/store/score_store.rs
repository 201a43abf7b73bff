use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::dictionary::Dictionary;
use crate::engine::word_score::{MAX_SCORE, ScoreData, ScoreGroup, WordScore};
use crate::store::StoreError;
use crate::store::json_store::JsonStore;
use crate::store::schema::SCORES_FILE;

pub const DEFAULT_STALE_DAYS: i64 = 7;

/// Cached score history. Loaded once; every mutation is flushed to disk
/// before the cache is replaced, so a failed write leaves the previous state.
pub struct ScoreStore {
    store: JsonStore,
    data: ScoreData,
}

fn newest_first(mut words: Vec<WordScore>) -> Vec<WordScore> {
    words.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    words
}

impl ScoreStore {
    pub fn open(store: JsonStore) -> Self {
        let data = store.load_scores();
        info!(words = data.word_count(), "score store loaded");
        Self { store, data }
    }

    pub fn record_score(&mut self, word: &str, score: u8) -> Result<WordScore, StoreError> {
        self.record_score_at(word, score, Utc::now())
    }

    pub fn record_score_at(
        &mut self,
        word: &str,
        score: u8,
        now: DateTime<Utc>,
    ) -> Result<WordScore, StoreError> {
        if score > MAX_SCORE {
            return Err(StoreError::InvalidScore(score));
        }
        if word.trim().is_empty() {
            return Err(StoreError::EmptyWord);
        }

        let mut next = self.data.clone();
        let updated = next.record(word, score, now);
        self.flush(next)?;
        debug!(
            word,
            score,
            average = updated.average_score_int(),
            "recorded score"
        );
        Ok(updated)
    }

    /// Every tracked word, most recently updated first.
    pub fn all_scores(&self) -> Vec<WordScore> {
        newest_first(self.data.iter_words().cloned().collect())
    }

    /// Words whose bucket lies in `min..=max`, most recent first. With a
    /// threshold, words outside the range whose latest score reaches it are
    /// admitted too.
    pub fn scores_in_range(
        &self,
        min: u8,
        max: u8,
        last_element_threshold: Option<u8>,
    ) -> Vec<WordScore> {
        let mut matching = Vec::new();
        for group in &self.data.groups {
            if (min..=max).contains(&group.average_score_int) {
                matching.extend(group.words.iter().cloned());
            } else if let Some(threshold) = last_element_threshold {
                matching.extend(
                    group
                        .words
                        .iter()
                        .filter(|ws| ws.last_score().is_some_and(|s| s >= threshold))
                        .cloned(),
                );
            }
        }
        newest_first(matching)
    }

    pub fn words_with_score(&self, average_score_int: u8) -> Vec<WordScore> {
        self.data
            .group(average_score_int)
            .map(|g| newest_first(g.words.clone()))
            .unwrap_or_default()
    }

    /// In-range words that are still in the dictionary.
    pub fn count_in_range(&self, min: u8, max: u8, dictionary: &Dictionary) -> usize {
        self.data
            .groups
            .iter()
            .filter(|g| (min..=max).contains(&g.average_score_int))
            .flat_map(|g| g.words.iter())
            .filter(|ws| dictionary.resolve(&ws.word).is_some())
            .count()
    }

    /// Words due another look: seen only once, or untouched for
    /// `days_threshold` days. A threshold reaching past the representable
    /// range means no word is old enough.
    pub fn stale_words(&self, days_threshold: i64, now: DateTime<Utc>) -> Vec<WordScore> {
        let cutoff = Duration::try_days(days_threshold).and_then(|d| now.checked_sub_signed(d));
        newest_first(
            self.data
                .iter_words()
                .filter(|ws| {
                    ws.scores.len() == 1 || cutoff.is_some_and(|c| ws.last_updated <= c)
                })
                .cloned()
                .collect(),
        )
    }

    pub fn find(&self, word: &str) -> Option<&WordScore> {
        self.data.find(word)
    }

    pub fn groups(&self) -> &[ScoreGroup] {
        &self.data.groups
    }

    pub fn len(&self) -> usize {
        self.data.word_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.flush(ScoreData::default())?;
        info!("score history reset");
        Ok(())
    }

    fn flush(&mut self, next: ScoreData) -> Result<(), StoreError> {
        match self.store.save_scores(&next) {
            Ok(()) => {
                self.data = next;
                Ok(())
            }
            Err(source) => {
                warn!(error = %source, "score flush failed, keeping previous state");
                Err(StoreError::Write {
                    file: SCORES_FILE,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000 + secs, 0).unwrap()
    }

    fn make_store() -> (TempDir, ScoreStore) {
        let dir = TempDir::new().unwrap();
        let json = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, ScoreStore::open(json))
    }

    /// Seeds one word per requested doubled average.
    fn seed_averages(store: &mut ScoreStore, averages: &[u8]) {
        for (i, &avg) in averages.iter().enumerate() {
            let word = format!("w{avg}");
            let (a, b) = (avg / 2, avg - avg / 2);
            store.record_score_at(&word, a, t(i as i64 * 2)).unwrap();
            store.record_score_at(&word, b, t(i as i64 * 2 + 1)).unwrap();
        }
    }

    #[test]
    fn test_lucid_moves_from_five_to_four() {
        let (_dir, mut store) = make_store();
        store.record_score_at("lucid", 2, t(0)).unwrap();
        let ws = store.record_score_at("lucid", 3, t(1)).unwrap();
        assert_eq!(ws.average_score_int(), 5);
        assert_eq!(store.words_with_score(5).len(), 1);

        let ws = store.record_score_at("lucid", 1, t(2)).unwrap();
        assert_eq!(ws.scores, vec![3, 1]);
        assert!(store.words_with_score(5).is_empty());
        assert_eq!(store.words_with_score(4)[0].word, "lucid");
    }

    #[test]
    fn test_scores_in_range_selects_buckets() {
        let (_dir, mut store) = make_store();
        seed_averages(&mut store, &[0, 3, 4, 5, 6]);
        let words: Vec<String> = store
            .scores_in_range(0, 4, None)
            .into_iter()
            .map(|ws| ws.word)
            .collect();
        assert_eq!(words, vec!["w4", "w3", "w0"]);
    }

    #[test]
    fn test_threshold_admits_recent_high_score() {
        let (_dir, mut store) = make_store();
        store.record_score_at("rising", 0, t(0)).unwrap();
        store.record_score_at("rising", 3, t(1)).unwrap();
        store.record_score_at("steady", 3, t(2)).unwrap();

        let plain = store.scores_in_range(5, 6, None);
        assert_eq!(plain.len(), 1);
        let admitted = store.scores_in_range(5, 6, Some(3));
        assert_eq!(admitted.len(), 2);
    }

    #[test]
    fn test_all_scores_newest_first() {
        let (_dir, mut store) = make_store();
        store.record_score_at("old", 1, t(0)).unwrap();
        store.record_score_at("new", 3, t(10)).unwrap();
        store.record_score_at("mid", 2, t(5)).unwrap();
        let order: Vec<String> = store.all_scores().into_iter().map(|w| w.word).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_invalid_input_rejected() {
        let (_dir, mut store) = make_store();
        assert!(matches!(
            store.record_score("apt", 4),
            Err(StoreError::InvalidScore(4))
        ));
        assert!(matches!(store.record_score("  ", 1), Err(StoreError::EmptyWord)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_flush_keeps_cache() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        let json = JsonStore::with_base_dir(data_dir.clone()).unwrap();
        let mut store = ScoreStore::open(json);
        store.record_score_at("apt", 3, t(0)).unwrap();

        fs::remove_dir_all(&data_dir).unwrap();
        let result = store.record_score_at("apt", 0, t(1));
        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert_eq!(store.find("apt").unwrap().scores, vec![3]);

        assert!(store.reset().is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reset_empties_all_groups() {
        let (_dir, mut store) = make_store();
        seed_averages(&mut store, &[1, 4, 6]);
        store.reset().unwrap();
        assert_eq!(store.groups().len(), 7);
        assert!(store.groups().iter().all(|g| g.words.is_empty()));
        assert!(store.all_scores().is_empty());
    }

    #[test]
    fn test_reopen_reads_flushed_state() {
        let dir = TempDir::new().unwrap();
        let json = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut store = ScoreStore::open(json.clone());
        store.record_score_at("apt", 2, t(0)).unwrap();
        let reopened = ScoreStore::open(json);
        assert_eq!(reopened.find("APT").unwrap().scores, vec![2]);
    }

    #[test]
    fn test_stale_words() {
        let (_dir, mut store) = make_store();
        let now = t(0) + Duration::days(30);
        store.record_score_at("once", 2, now).unwrap();
        store.record_score_at("old", 2, t(0)).unwrap();
        store.record_score_at("old", 2, t(1)).unwrap();
        store.record_score_at("fresh", 2, now).unwrap();
        store.record_score_at("fresh", 3, now).unwrap();

        let mut stale: Vec<String> = store
            .stale_words(DEFAULT_STALE_DAYS, now)
            .into_iter()
            .map(|w| w.word)
            .collect();
        stale.sort();
        assert_eq!(stale, vec!["old", "once"]);
    }

    #[test]
    fn test_stale_words_huge_threshold_keeps_single_scores() {
        let (_dir, mut store) = make_store();
        store.record_score_at("once", 2, t(0)).unwrap();
        store.record_score_at("twice", 1, t(0)).unwrap();
        store.record_score_at("twice", 2, t(1)).unwrap();

        for days in [i64::MAX, i64::MIN] {
            let stale: Vec<String> = store
                .stale_words(days, t(100))
                .into_iter()
                .map(|w| w.word)
                .collect();
            assert_eq!(stale, vec!["once"], "days = {days}");
        }
    }

    #[test]
    fn test_count_in_range_ignores_case() {
        let (_dir, mut store) = make_store();
        store.record_score_at("Lucid", 0, t(0)).unwrap();
        store.record_score_at("gone", 0, t(1)).unwrap();
        let mut entries = crate::store::schema::DictionaryData::new();
        entries.insert("lucid".to_string(), vec!["clear".to_string()]);
        let dict = Dictionary::new(entries);
        assert_eq!(store.count_in_range(0, 3, &dict), 1);
    }
}
