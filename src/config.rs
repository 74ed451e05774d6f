//! Drill configuration constants and runtime settings.
//!
//! Constants shape every session. `DrillSettings` carries the few values that
//! may be overridden from `config.toml` or the environment.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::{DrillLevel, QuestionType};

// ==================== Session Shape ====================

/// Questions in one drill session
pub const TOTAL_QUESTIONS_PER_DRILL: usize = 30;

/// Wrong options shown next to the correct answer
pub const DISTRACTOR_COUNT: usize = 3;

/// Options per question (correct answer + distractors)
pub const OPTION_COUNT: usize = DISTRACTOR_COUNT + 1;

// ==================== Attempt Ceilings ====================

/// Mutation rounds per word question when collecting distractors
pub const WORD_MUTATION_ROUNDS: usize = 10;

/// Random draws before giving up on a synthetic word
pub const SYNTHETIC_WORD_ATTEMPTS: usize = 20;

/// Padding attempts allowed per missing question
pub const PADDING_ATTEMPTS_PER_QUESTION: usize = 40;

/// Emergency attempts allowed per missing question
pub const EMERGENCY_ATTEMPTS_PER_QUESTION: usize = 2;

/// Sequential generic distractors tried before the emergency pad
pub const GENERIC_PADDING_LIMIT: usize = 50;

/// Sequential emergency options tried before placeholder strings
pub const EMERGENCY_OPTION_LIMIT: usize = 20;

// ==================== Pool Sizes ====================

/// Same-length words sampled as pool-neighbour distractors
pub const DISTRACTOR_WORD_POOL_LIMIT: usize = 15;

/// Same-length words sampled from the broadened fallback pool
pub const FALLBACK_WORD_POOL_LIMIT: usize = 20;

/// Real words kept as a word tier of the emergency phase
pub const ABSOLUTE_FALLBACK_WORD_COUNT: usize = 10;

/// Quota-phase word pool size, as a multiple of the larger word quota
pub const WORD_POOL_QUOTA_MULTIPLIER: usize = 5;

// ==================== Immersive Reading ====================

/// Romaji options offered per reading unit
pub const READING_OPTION_COUNT: usize = 4;

/// Passages drawn for one reading session
pub const PASSAGES_PER_READING_LEVEL: usize = 20;

/// Random mora strings tried when padding reading options
pub const READING_PADDING_ATTEMPTS: usize = 20;

// ==================== Level Tables ====================

/// Questions per type for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Quotas {
    pub kana_to_romaji: usize,
    pub romaji_to_kana: usize,
    pub word_to_romaji: usize,
    pub romaji_to_word: usize,
}

impl Quotas {
    /// Built-in quota table. Harder levels shift weight from kana recognition
    /// toward word production.
    pub fn for_level(level: DrillLevel) -> Self {
        match level {
            DrillLevel::Easy => Self {
                kana_to_romaji: 12,
                romaji_to_kana: 6,
                word_to_romaji: 8,
                romaji_to_word: 4,
            },
            DrillLevel::Medium => Self {
                kana_to_romaji: 8,
                romaji_to_kana: 7,
                word_to_romaji: 8,
                romaji_to_word: 7,
            },
            DrillLevel::Difficult => Self {
                kana_to_romaji: 5,
                romaji_to_kana: 7,
                word_to_romaji: 7,
                romaji_to_word: 11,
            },
        }
    }

    pub fn get(&self, question_type: QuestionType) -> usize {
        match question_type {
            QuestionType::KanaToRomaji => self.kana_to_romaji,
            QuestionType::RomajiToKana => self.romaji_to_kana,
            QuestionType::WordToRomaji => self.word_to_romaji,
            QuestionType::RomajiToWord => self.romaji_to_word,
        }
    }

    pub fn total(&self) -> usize {
        self.kana_to_romaji + self.romaji_to_kana + self.word_to_romaji + self.romaji_to_word
    }
}

/// How often one kana stimulus may appear in a session
pub fn kana_stimulus_cap(level: DrillLevel) -> usize {
    if level == DrillLevel::Difficult { 2 } else { 3 }
}

/// How often one word stimulus may appear in a session
pub fn word_stimulus_cap(level: DrillLevel) -> usize {
    if level == DrillLevel::Difficult { 1 } else { 2 }
}

/// Word lengths (in morae) drawn during the quota phase
pub fn quota_word_lengths(level: DrillLevel) -> &'static [usize] {
    match level {
        DrillLevel::Easy => &[2, 3],
        DrillLevel::Medium => &[2, 3, 4],
        DrillLevel::Difficult => &[2, 3, 4, 5],
    }
}

// ==================== Runtime Settings ====================

/// Configuration file read from the working directory
pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_DATASET_DIR: &str = "KANA_DRILL_DATASET_DIR";
pub const ENV_TOTAL_QUESTIONS: &str = "KANA_DRILL_TOTAL_QUESTIONS";

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    drill: Option<DrillConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct DrillConfig {
    total_questions: Option<usize>,
    dataset_dir: Option<String>,
    #[serde(default)]
    quotas: HashMap<String, Quotas>,
}

/// Settings for drill assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillSettings {
    pub total_questions: usize,
    /// Directory replacing the built-in dataset
    pub dataset_dir: Option<PathBuf>,
    quotas: HashMap<DrillLevel, Quotas>,
}

impl Default for DrillSettings {
    fn default() -> Self {
        Self {
            total_questions: TOTAL_QUESTIONS_PER_DRILL,
            dataset_dir: None,
            quotas: HashMap::new(),
        }
    }
}

impl DrillSettings {
    /// Load settings with priority: config.toml > .env / environment > default
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
    }

    /// Load from an explicit config file and environment lookup.
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                    AppConfig::default()
                }
            },
            Err(_) => AppConfig::default(),
        };
        Self::resolve(file.drill.unwrap_or_default(), env)
    }

    /// Parse settings from TOML text, without environment fallback.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let config = toml::from_str::<AppConfig>(contents)?;
        Ok(Self::resolve(config.drill.unwrap_or_default(), |_| None))
    }

    fn resolve(file: DrillConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        // Priority 1: config.toml, Priority 2: environment
        if let Some(total) = file.total_questions {
            tracing::info!("Using total_questions from config.toml: {}", total);
            settings.total_questions = total;
        } else if let Some(value) = env(ENV_TOTAL_QUESTIONS) {
            match value.trim().parse::<usize>() {
                Ok(total) => {
                    tracing::info!("Using {} env: {}", ENV_TOTAL_QUESTIONS, total);
                    settings.total_questions = total;
                }
                Err(e) => tracing::warn!("Invalid {} '{}': {}", ENV_TOTAL_QUESTIONS, value, e),
            }
        }
        if settings.total_questions == 0 {
            tracing::warn!("total_questions must be positive, using {}", TOTAL_QUESTIONS_PER_DRILL);
            settings.total_questions = TOTAL_QUESTIONS_PER_DRILL;
        }

        settings.dataset_dir = file
            .dataset_dir
            .or_else(|| env(ENV_DATASET_DIR))
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        for (name, quotas) in file.quotas {
            let level = match name.parse::<DrillLevel>() {
                Ok(level) => level,
                Err(e) => {
                    tracing::warn!("Ignoring quotas: {}", e);
                    continue;
                }
            };
            if quotas.total() == settings.total_questions {
                settings.quotas.insert(level, quotas);
            } else {
                tracing::warn!(
                    "Quotas for {} sum to {}, expected {}; using defaults",
                    level,
                    quotas.total(),
                    settings.total_questions
                );
            }
        }
        settings
    }

    /// Quota table for a level: configured override or the built-in table.
    pub fn quotas(&self, level: DrillLevel) -> Quotas {
        self.quotas
            .get(&level)
            .copied()
            .unwrap_or_else(|| Quotas::for_level(level))
    }
}
