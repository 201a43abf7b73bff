use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::word_score::MAX_SCORE;

const MAX_NEW_WORD_CHANCE: u8 = 100;
const MIN_RECENT_WORDS: usize = 1;
const MAX_RECENT_WORDS: usize = 50;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Percent chance of offering an unseen word once no struggling word is due.
    #[serde(default = "default_new_words_studied")]
    pub new_words_studied: u8,
    #[serde(default = "default_max_recent_words")]
    pub max_recent_words: usize,
    /// Admit words to the high-score review pool on a single strong score,
    /// before their rolling average catches up.
    #[serde(default = "default_early_admit")]
    pub early_admit: bool,
    #[serde(default = "default_early_admit_threshold")]
    pub early_admit_threshold: u8,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_new_words_studied() -> u8 {
    20
}
fn default_max_recent_words() -> usize {
    10
}
fn default_early_admit() -> bool {
    true
}
fn default_early_admit_threshold() -> u8 {
    3
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocab-coach")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            new_words_studied: default_new_words_studied(),
            max_recent_words: default_max_recent_words(),
            early_admit: default_early_admit(),
            early_admit_threshold: default_early_admit_threshold(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocab-coach")
            .join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn last_score_threshold(&self) -> Option<u8> {
        self.early_admit.then_some(self.early_admit_threshold)
    }

    /// Clamp values edited by hand into their supported ranges.
    pub fn validate(&mut self) {
        self.new_words_studied = self.new_words_studied.min(MAX_NEW_WORD_CHANCE);
        self.max_recent_words = self
            .max_recent_words
            .clamp(MIN_RECENT_WORDS, MAX_RECENT_WORDS);
        self.early_admit_threshold = self.early_admit_threshold.min(MAX_SCORE);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}
