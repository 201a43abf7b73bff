pub mod csv_import;

use std::thread::{self, JoinHandle};

use rust_embed::RustEmbed;
use thiserror::Error;
use tracing::{info, warn};

use crate::store::json_store::JsonStore;
use crate::store::schema::DictionaryData;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

const DEFAULT_WORDS: &str = "default_words.json";

pub const NO_DEFINITION: &str = "No definition available";

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("word and definitions cannot be empty")]
    EmptyEntry,
    #[error("word not found in dictionary: {0}")]
    NotFound(String),
    #[error("bundled default dictionary is unavailable")]
    DefaultUnavailable,
    #[error("failed to save dictionary")]
    Write(#[source] anyhow::Error),
}

/// A word together with the definitions shown for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordEntry {
    pub word: String,
    pub definitions: Vec<String>,
}

impl WordEntry {
    /// Sentinel returned when there is nothing to study.
    pub const EMPTY_WORD: &'static str = "_";

    pub fn empty() -> Self {
        Self {
            word: Self::EMPTY_WORD.to_string(),
            definitions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.word == Self::EMPTY_WORD && self.definitions.is_empty()
    }

    pub fn definition_text(&self) -> String {
        self.definitions.join("\n")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dictionary {
    entries: DictionaryData,
}

impl Dictionary {
    pub fn new(entries: DictionaryData) -> Self {
        Self { entries }
    }

    pub fn bundled_default() -> Result<Self, DictionaryError> {
        let file = Assets::get(DEFAULT_WORDS).ok_or(DictionaryError::DefaultUnavailable)?;
        serde_json::from_slice(&file.data)
            .map(Self::new)
            .map_err(|_| DictionaryError::DefaultUnavailable)
    }

    /// The saved user dictionary, else the bundled default, else empty.
    pub fn load(store: &JsonStore) -> Self {
        if let Some(entries) = store.load_dictionary() {
            info!(words = entries.len(), "loaded user dictionary");
            return Self::new(entries);
        }
        match Self::bundled_default() {
            Ok(dict) => {
                info!(words = dict.len(), "loaded bundled dictionary");
                dict
            }
            Err(e) => {
                warn!(error = %e, "no dictionary available, starting empty");
                Self::default()
            }
        }
    }

    /// Load on a worker thread. Callers join before selecting words.
    pub fn spawn_load(store: JsonStore) -> JoinHandle<Dictionary> {
        thread::spawn(move || Dictionary::load(&store))
    }

    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word).map(|d| d.as_slice())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    /// The stored spelling of `word`: an exact key, else the first key that
    /// matches ignoring case.
    pub fn resolve(&self, word: &str) -> Option<&str> {
        if let Some((key, _)) = self.entries.get_key_value(word) {
            return Some(key.as_str());
        }
        let needle = word.to_lowercase();
        self.entries
            .keys()
            .find(|key| key.to_lowercase() == needle)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(w, d)| (w.as_str(), d.as_slice()))
    }

    /// Display entry for `word`, with a placeholder when it has no definitions.
    pub fn entry(&self, word: &str) -> WordEntry {
        WordEntry {
            word: word.to_string(),
            definitions: self
                .get(word)
                .map(|d| d.to_vec())
                .unwrap_or_else(|| vec![NO_DEFINITION.to_string()]),
        }
    }

    pub fn add_word(
        &mut self,
        store: &JsonStore,
        word: &str,
        definitions: Vec<String>,
    ) -> Result<(), DictionaryError> {
        let word = word.trim();
        if word.is_empty() || definitions.is_empty() {
            return Err(DictionaryError::EmptyEntry);
        }
        let previous = self.entries.clone();
        self.entries.insert(word.to_string(), definitions);
        self.commit(store, previous)
    }

    /// Returns the definitions the word had.
    pub fn remove_word(
        &mut self,
        store: &JsonStore,
        word: &str,
    ) -> Result<Vec<String>, DictionaryError> {
        let previous = self.entries.clone();
        let removed = self
            .entries
            .remove(word)
            .ok_or_else(|| DictionaryError::NotFound(word.to_string()))?;
        self.commit(store, previous)?;
        Ok(removed)
    }

    /// Add every entry, overwriting definitions of words already present.
    /// Entries with an empty word or no definitions are counted as failed.
    pub fn merge(
        &mut self,
        store: &JsonStore,
        entries: Vec<(String, Vec<String>)>,
    ) -> Result<ImportSummary, DictionaryError> {
        let previous = self.entries.clone();
        let mut summary = ImportSummary::default();
        for (word, definitions) in entries {
            let word = word.trim();
            if word.is_empty() || definitions.is_empty() {
                summary.failed += 1;
                continue;
            }
            self.entries.insert(word.to_string(), definitions);
            summary.imported += 1;
        }
        self.commit(store, previous)?;
        info!(
            imported = summary.imported,
            failed = summary.failed,
            "merged words into dictionary"
        );
        Ok(summary)
    }

    pub fn reset_to_default(&mut self, store: &JsonStore) -> Result<(), DictionaryError> {
        let default = Self::bundled_default()?;
        let previous = std::mem::replace(&mut self.entries, default.entries);
        self.commit(store, previous)?;
        info!(words = self.len(), "dictionary reset to default");
        Ok(())
    }

    /// Persist the current entries, restoring `previous` if the write fails.
    fn commit(&mut self, store: &JsonStore, previous: DictionaryData) -> Result<(), DictionaryError> {
        if let Err(e) = store.save_dictionary(&self.entries) {
            warn!(error = %e, "dictionary save failed, reverting");
            self.entries = previous;
            return Err(DictionaryError::Write(e));
        }
        Ok(())
    }
}
