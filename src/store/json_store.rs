use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::engine::word_score::ScoreData;
use crate::store::schema::{
    DICTIONARY_FILE, DictionaryData, SCORES_FILE, SELECTION_FILE, SelectionStateData,
};

/// Flat directory of JSON documents with atomic replace-on-write.
#[derive(Clone, Debug)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// `None` when the file is missing or cannot be parsed.
    fn read<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.file_path(name);
        if !path.exists() {
            return None;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(file = name, error = %e, "unreadable, treating as empty");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(file = name, error = %e, "corrupt, treating as empty");
                None
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(data)?;
        let staged = (|| -> Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &path)?;
            Ok(())
        })();
        if staged.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        staged
    }

    pub fn load_scores(&self) -> ScoreData {
        self.read::<ScoreData>(SCORES_FILE)
            .map(ScoreData::normalized)
            .unwrap_or_default()
    }

    pub fn save_scores(&self, data: &ScoreData) -> Result<()> {
        self.save(SCORES_FILE, data)
    }

    /// User dictionary, `None` if nothing has been saved yet.
    pub fn load_dictionary(&self) -> Option<DictionaryData> {
        self.read(DICTIONARY_FILE)
    }

    pub fn save_dictionary(&self, data: &DictionaryData) -> Result<()> {
        self.save(DICTIONARY_FILE, data)
    }

    pub fn load_selection_state(&self) -> SelectionStateData {
        match self.read::<SelectionStateData>(SELECTION_FILE) {
            Some(state) if !state.needs_reset() => state,
            _ => SelectionStateData::default(),
        }
    }

    pub fn save_selection_state(&self, data: &SelectionStateData) -> Result<()> {
        self.save(SELECTION_FILE, data)
    }
}
