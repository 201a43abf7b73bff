use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};

use crate::config::Config;
use crate::dictionary::csv_import::parse_csv;
use crate::dictionary::{Dictionary, DictionaryError, ImportSummary};
use crate::engine::grading::GradeResult;
use crate::engine::selector::{Selection, SelectionPolicy, SelectionStats, WordSelector};
use crate::engine::word_score::WordScore;
use crate::store::StoreError;
use crate::store::json_store::JsonStore;
use crate::store::score_store::ScoreStore;

/// Counts shown on the progress dashboard. Only words still in the
/// dictionary are counted per band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub total_attempted: usize,
    pub known: usize,
    pub almost: usize,
    pub learning: usize,
}

/// Owns every piece of study state for one data directory.
pub struct Coach {
    config: Config,
    store: JsonStore,
    dictionary: Dictionary,
    scores: ScoreStore,
    selector: WordSelector,
}

impl Coach {
    pub fn open(config: Config) -> Result<Self> {
        let store = JsonStore::with_base_dir(config.data_path())
            .with_context(|| format!("cannot use data directory {}", config.data_dir))?;
        Ok(Self::with_store(config, store, SmallRng::from_entropy()))
    }

    pub fn with_store(config: Config, store: JsonStore, rng: SmallRng) -> Self {
        let loader = Dictionary::spawn_load(store.clone());
        let scores = ScoreStore::open(store.clone());
        let state = store.load_selection_state();
        let dictionary = loader.join().unwrap_or_else(|_| {
            warn!("dictionary loader panicked, starting empty");
            Dictionary::default()
        });
        let selector = WordSelector::from_state(SelectionPolicy::from(&config), state, rng);
        Self {
            config,
            store,
            dictionary,
            scores,
            selector,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.selector.set_policy(SelectionPolicy::from(&config));
        self.config = config;
        self.persist_selection();
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn scores(&self) -> &ScoreStore {
        &self.scores
    }

    pub fn selector(&self) -> &WordSelector {
        &self.selector
    }

    pub fn next_word(&mut self) -> Selection {
        let selection = self.selector.select_next(&self.scores, &self.dictionary);
        self.persist_selection();
        selection
    }

    pub fn record_score(&mut self, word: &str, score: u8) -> Result<WordScore, StoreError> {
        self.scores.record_score(word, score)
    }

    pub fn submit_grade(&mut self, word: &str, grade: &GradeResult) -> Result<WordScore, StoreError> {
        self.record_score(word, grade.stars())
    }

    pub fn mark_learned(&mut self, word: &str) {
        let word = self.dictionary.resolve(word).unwrap_or(word);
        if self.selector.mark_learned(word) {
            self.persist_selection();
        }
    }

    pub fn add_word(&mut self, word: &str, definitions: Vec<String>) -> Result<(), DictionaryError> {
        self.dictionary.add_word(&self.store, word, definitions)
    }

    pub fn remove_word(&mut self, word: &str) -> Result<(), DictionaryError> {
        self.dictionary.remove_word(&self.store, word)?;
        self.selector.forget(word);
        self.persist_selection();
        Ok(())
    }

    /// Merge CSV text into the dictionary. Rows the parser rejects count as
    /// failed alongside entries the dictionary refuses.
    pub fn import_csv(&mut self, content: &str) -> Result<ImportSummary, DictionaryError> {
        let parsed = parse_csv(content);
        let mut summary = self.dictionary.merge(&self.store, parsed.entries)?;
        summary.failed += parsed.skipped_lines.len();
        Ok(summary)
    }

    pub fn import_csv_file(&mut self, path: &Path) -> Result<ImportSummary> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(self.import_csv(&content)?)
    }

    pub fn reset_dictionary(&mut self) -> Result<(), DictionaryError> {
        self.dictionary.reset_to_default(&self.store)?;
        self.reset_selection();
        Ok(())
    }

    pub fn reset_scores(&mut self) -> Result<(), StoreError> {
        self.scores.reset()
    }

    pub fn reset_selection(&mut self) {
        self.selector.reset();
        self.persist_selection();
        info!("selection state reset");
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard {
            total_attempted: self.scores.len(),
            known: self.scores.count_in_range(5, 6, &self.dictionary),
            almost: self.scores.count_in_range(4, 4, &self.dictionary),
            learning: self.scores.count_in_range(0, 3, &self.dictionary),
        }
    }

    pub fn selection_stats(&self) -> SelectionStats {
        self.selector.stats()
    }

    fn persist_selection(&self) {
        if let Err(e) = self.store.save_selection_state(&self.selector.state()) {
            warn!(error = %e, "failed to persist selection state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grading::UsageLevel;
    use crate::engine::selector::SelectionSource;
    use tempfile::TempDir;

    fn make_coach() -> (TempDir, Coach) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_string_lossy().to_string(),
            ..Config::default()
        };
        let store = JsonStore::with_base_dir(config.data_path()).unwrap();
        let coach = Coach::with_store(config, store, SmallRng::seed_from_u64(5));
        (dir, coach)
    }

    fn reopen(dir: &TempDir) -> Coach {
        let config = Config {
            data_dir: dir.path().to_string_lossy().to_string(),
            ..Config::default()
        };
        let store = JsonStore::with_base_dir(config.data_path()).unwrap();
        Coach::with_store(config, store, SmallRng::seed_from_u64(6))
    }

    #[test]
    fn test_fresh_coach_uses_bundled_dictionary() {
        let (_dir, mut coach) = make_coach();
        assert_eq!(coach.dictionary(), &Dictionary::bundled_default().unwrap());
        let picked = coach.next_word();
        assert!(coach.dictionary().contains(&picked.entry.word));
    }

    #[test]
    fn test_submit_grade_records_stars() {
        let (_dir, mut coach) = make_coach();
        let grade = GradeResult {
            grammar: true,
            usage: UsageLevel::Partial,
            feedback: String::new(),
        };
        let ws = coach.submit_grade("lucid", &grade).unwrap();
        assert_eq!(ws.scores, vec![2]);
        assert_eq!(ws.average_score_int(), 4);
    }

    #[test]
    fn test_struggling_word_served_first() {
        let (_dir, mut coach) = make_coach();
        coach.record_score("terse", 0).unwrap();
        let picked = coach.next_word();
        assert_eq!(picked.entry.word, "terse");
        assert_eq!(picked.source, SelectionSource::LowScoreReview);
    }

    #[test]
    fn test_struggling_word_recorded_in_other_case_served_first() {
        let (_dir, mut coach) = make_coach();
        coach.record_score("Lucid", 0).unwrap();
        let picked = coach.next_word();
        assert_eq!(picked.entry.word, "lucid");
        assert_eq!(picked.source, SelectionSource::LowScoreReview);

        coach.mark_learned("LUCID");
        assert!(!coach.selector().recent().contains("lucid"));
    }

    #[test]
    fn test_selection_state_survives_reopen() {
        let (dir, mut coach) = make_coach();
        let word = coach.next_word().entry.word;
        let reopened = reopen(&dir);
        assert!(reopened.selector().recent().contains(&word));
    }

    #[test]
    fn test_remove_word_scrubs_selection_state() {
        let (_dir, mut coach) = make_coach();
        let word = coach.next_word().entry.word;
        coach.remove_word(&word).unwrap();
        assert!(!coach.dictionary().contains(&word));
        assert!(!coach.selector().recent().contains(&word));
    }

    #[test]
    fn test_dashboard_counts_dictionary_members_only() {
        let (_dir, mut coach) = make_coach();
        coach.record_score("lucid", 3).unwrap();
        coach.record_score("apt", 2).unwrap();
        coach.record_score("terse", 1).unwrap();
        coach.record_score("notaword", 0).unwrap();
        let dash = coach.dashboard();
        assert_eq!(
            dash,
            Dashboard {
                total_attempted: 4,
                known: 1,
                almost: 1,
                learning: 1,
            }
        );
    }

    #[test]
    fn test_import_csv_merges_and_counts_rejects() {
        let (_dir, mut coach) = make_coach();
        let before = coach.dictionary().len();
        let summary = coach
            .import_csv("word,definitions\nquixotic,idealistic; impractical\nbroken\n")
            .unwrap();
        assert_eq!(summary, ImportSummary { imported: 1, failed: 1 });
        assert_eq!(coach.dictionary().len(), before + 1);
    }

    #[test]
    fn test_reset_dictionary_clears_selection() {
        let (_dir, mut coach) = make_coach();
        coach.add_word("custom", vec!["mine".into()]).unwrap();
        coach.next_word();
        coach.reset_dictionary().unwrap();
        assert!(!coach.dictionary().contains("custom"));
        assert!(coach.selector().recent().is_empty());
    }

    #[test]
    fn test_set_config_shrinks_window() {
        let (_dir, mut coach) = make_coach();
        for _ in 0..5 {
            coach.next_word();
        }
        let config = Config {
            max_recent_words: 2,
            ..coach.config().clone()
        };
        coach.set_config(config);
        assert_eq!(coach.selector().recent().len(), 2);
    }
}
