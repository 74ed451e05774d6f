//! Dataset loading and validation.
//!
//! Every table is parsed with `serde_json`, kana strings are NFC-normalized,
//! and cross references (line members, word constituents, similarity entries)
//! are checked against the mora table before the dataset is handed out.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::domain::{KanaLine, Mora, MoraType, PhoneticProfile, Script, Similarity, Word};
use crate::linguistics;

/// File names of the four tables, shared by the embedded and on-disk layouts.
pub const MORAS_FILE: &str = "moras.json";
pub const LINES_FILE: &str = "lines.json";
pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const SIMILARITIES_FILE: &str = "similarities.json";

pub const BUILTIN_MORAS: &str = include_str!("../../data/moras.json");
pub const BUILTIN_LINES: &str = include_str!("../../data/lines.json");
pub const BUILTIN_VOCABULARY: &str = include_str!("../../data/vocabulary.json");
pub const BUILTIN_SIMILARITIES: &str = include_str!("../../data/similarities.json");

static BUILTIN: OnceLock<Dataset> = OnceLock::new();

type PerScript<T> = BTreeMap<String, T>;

/// Immutable, validated dataset shared by every drill operation.
#[derive(Debug, Clone)]
pub struct Dataset {
    moras: Vec<Mora>,
    mora_index: HashMap<String, usize>,
    longest_kana: usize,
    lines: HashMap<Script, Vec<KanaLine>>,
    vocabulary: HashMap<Script, Vec<Word>>,
    vocabulary_index: HashSet<String>,
    similarities: HashMap<Script, HashMap<String, Vec<Similarity>>>,
}

impl Dataset {
    /// The embedded dataset, parsed on first use.
    ///
    /// The fixtures are checked by the test suite, so a parse failure here is
    /// logged and degrades to an empty dataset instead of aborting.
    pub fn builtin() -> &'static Dataset {
        BUILTIN.get_or_init(|| {
            match Dataset::from_json(
                BUILTIN_MORAS,
                BUILTIN_LINES,
                BUILTIN_VOCABULARY,
                BUILTIN_SIMILARITIES,
            ) {
                Ok(dataset) => {
                    tracing::debug!(
                        "Loaded built-in dataset: {} morae, {} words",
                        dataset.moras.len(),
                        dataset.vocabulary.values().map(Vec::len).sum::<usize>()
                    );
                    dataset
                }
                Err(e) => {
                    tracing::error!("Built-in dataset is invalid: {}", e);
                    Dataset::empty()
                }
            }
        })
    }

    fn empty() -> Self {
        Self {
            moras: Vec::new(),
            mora_index: HashMap::new(),
            longest_kana: 1,
            lines: HashMap::new(),
            vocabulary: HashMap::new(),
            vocabulary_index: HashSet::new(),
            similarities: HashMap::new(),
        }
    }

    /// Parse and validate the four tables from JSON text.
    pub fn from_json(
        moras: &str,
        lines: &str,
        vocabulary: &str,
        similarities: &str,
    ) -> Result<Self, DatasetError> {
        let moras: Vec<Mora> = parse(MORAS_FILE, moras)?;
        let lines: PerScript<Vec<KanaLine>> = parse(LINES_FILE, lines)?;
        let vocabulary: PerScript<Vec<Word>> = parse(VOCABULARY_FILE, vocabulary)?;
        let similarities: PerScript<BTreeMap<String, Vec<Similarity>>> =
            parse(SIMILARITIES_FILE, similarities)?;

        let mut dataset = Self::empty();
        dataset.index_moras(moras)?;

        for (script, script_lines) in lines {
            let script = parse_script(LINES_FILE, &script)?;
            let script_lines = dataset.validate_lines(script, script_lines)?;
            dataset.lines.insert(script, script_lines);
        }

        for (script, table) in similarities {
            let script = parse_script(SIMILARITIES_FILE, &script)?;
            let table = dataset.validate_similarities(script, table)?;
            dataset.similarities.insert(script, table);
        }

        // Words are derived last: segmentation needs the mora index.
        for (script, words) in vocabulary {
            let script = parse_script(VOCABULARY_FILE, &script)?;
            let words = words
                .into_iter()
                .map(|word| dataset.complete_word(script, word))
                .collect::<Result<Vec<_>, _>>()?;
            dataset
                .vocabulary_index
                .extend(words.iter().map(|w| w.kana.clone()));
            dataset.vocabulary.insert(script, words);
        }

        Ok(dataset)
    }

    /// Load the four tables from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self, DatasetError> {
        let moras = read_table(dir, MORAS_FILE)?;
        let lines = read_table(dir, LINES_FILE)?;
        let vocabulary = read_table(dir, VOCABULARY_FILE)?;
        let similarities = read_table(dir, SIMILARITIES_FILE)?;
        let dataset = Self::from_json(&moras, &lines, &vocabulary, &similarities)?;
        tracing::info!("Loaded dataset from {}", dir.display());
        Ok(dataset)
    }

    fn index_moras(&mut self, moras: Vec<Mora>) -> Result<(), DatasetError> {
        for mut mora in moras {
            mora.kana = linguistics::normalize(&mora.kana);
            if mora.kana.is_empty() {
                return Err(DatasetError::Invalid("mora with empty kana".to_string()));
            }
            if self.mora_index.contains_key(&mora.kana) {
                return Err(DatasetError::Invalid(format!("duplicate mora: {}", mora.kana)));
            }
            self.longest_kana = self.longest_kana.max(mora.kana.chars().count());
            self.mora_index.insert(mora.kana.clone(), self.moras.len());
            self.moras.push(mora);
        }
        Ok(())
    }

    fn require_mora(&self, script: Script, kana: &str, context: &str) -> Result<(), DatasetError> {
        match self.mora(kana) {
            Some(mora) if mora.script == script => Ok(()),
            Some(_) => Err(DatasetError::Invalid(format!(
                "{}: {} is not a {} mora",
                context, kana, script
            ))),
            None => Err(DatasetError::Invalid(format!("{}: unknown kana {}", context, kana))),
        }
    }

    fn validate_lines(
        &self,
        script: Script,
        lines: Vec<KanaLine>,
    ) -> Result<Vec<KanaLine>, DatasetError> {
        let mut seen = HashSet::new();
        lines
            .into_iter()
            .map(|mut line| {
                if !seen.insert(line.id.clone()) {
                    return Err(DatasetError::Invalid(format!(
                        "duplicate {} line id: {}",
                        script, line.id
                    )));
                }
                line.kana = line.kana.iter().map(|k| linguistics::normalize(k)).collect();
                for kana in &line.kana {
                    self.require_mora(script, kana, &format!("line {}", line.id))?;
                }
                Ok(line)
            })
            .collect()
    }

    fn validate_similarities(
        &self,
        script: Script,
        table: BTreeMap<String, Vec<Similarity>>,
    ) -> Result<HashMap<String, Vec<Similarity>>, DatasetError> {
        let mut validated = HashMap::new();
        for (kana, mut entries) in table {
            let kana = linguistics::normalize(&kana);
            self.require_mora(script, &kana, "similarity table")?;
            for entry in entries.iter_mut() {
                entry.similar_kana = linguistics::normalize(&entry.similar_kana);
                self.require_mora(script, &entry.similar_kana, &format!("similarity of {}", kana))?;
            }
            entries.sort_by(|a, b| b.strength.total_cmp(&a.strength));
            validated.insert(kana, entries);
        }
        Ok(validated)
    }

    /// Fill in the derived fields of a vocabulary entry and check its morae.
    fn complete_word(&self, script: Script, mut word: Word) -> Result<Word, DatasetError> {
        word.kana = linguistics::normalize(&word.kana);
        if word.constituent_kana.is_empty() {
            word.constituent_kana = linguistics::segment_kana(self, &word.kana);
        } else {
            word.constituent_kana = word
                .constituent_kana
                .iter()
                .map(|k| linguistics::normalize(k))
                .collect();
        }

        let context = format!("word {}", word.kana);
        for kana in &word.constituent_kana {
            self.require_mora(script, kana, &context)?;
        }
        if word.constituent_kana.concat() != word.kana {
            return Err(DatasetError::Invalid(format!(
                "{}: constituents do not spell the word",
                context
            )));
        }

        word.length = word.constituent_kana.len();
        word.common_learner_errors = word
            .common_learner_errors
            .iter()
            .map(|e| linguistics::normalize(e))
            .collect();
        if word.phonetic_profile.is_none() {
            word.phonetic_profile = Some(self.derive_profile(&word.constituent_kana));
        }
        Ok(word)
    }

    /// Phonetic features of a segmented word, read off the mora types.
    pub fn derive_profile(&self, constituents: &[String]) -> PhoneticProfile {
        let mut profile = PhoneticProfile::default();
        for mora in constituents.iter().filter_map(|k| self.mora(k)) {
            // Digraphs carry the voicing of their first character.
            let lead = mora
                .constituent_kana
                .as_ref()
                .and_then(|c| c.first())
                .and_then(|k| self.mora(k))
                .unwrap_or(mora);
            match lead.mora_type {
                MoraType::Voiced => profile.has_voiced = true,
                MoraType::Handakuten => profile.has_handakuten = true,
                _ => {}
            }
            match mora.mora_type {
                MoraType::Sokuon => profile.has_sokuon = true,
                MoraType::Choonpu => profile.has_choonpu = true,
                MoraType::YouonY | MoraType::YouonW => profile.has_youon = true,
                _ => {}
            }
        }
        profile
    }

    // ==================== Accessors ====================

    pub fn mora(&self, kana: &str) -> Option<&Mora> {
        self.mora_index.get(kana).map(|&i| &self.moras[i])
    }

    pub fn moras(&self) -> &[Mora] {
        &self.moras
    }

    pub fn moras_of(&self, script: Script) -> impl Iterator<Item = &Mora> {
        self.moras.iter().filter(move |m| m.script == script)
    }

    /// Character count of the longest mora key, the segmenter's lookahead.
    pub fn longest_kana(&self) -> usize {
        self.longest_kana
    }

    /// Lines of a script in curriculum order.
    pub fn lines(&self, script: Script) -> &[KanaLine] {
        self.lines.get(&script).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn line(&self, script: Script, id: &str) -> Option<&KanaLine> {
        self.lines(script).iter().find(|l| l.id == id)
    }

    /// Position of a line in its script's curriculum.
    pub fn line_position(&self, script: Script, id: &str) -> Option<usize> {
        self.lines(script).iter().position(|l| l.id == id)
    }

    /// A line made only of sokuon/chōonpu targets those marks.
    pub fn is_marks_line(&self, line: &KanaLine) -> bool {
        !line.kana.is_empty()
            && line
                .kana
                .iter()
                .all(|k| self.mora(k).is_some_and(|m| m.mora_type.is_mark()))
    }

    pub fn vocabulary(&self, script: Script) -> &[Word] {
        self.vocabulary.get(&script).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vocabulary_word(&self, script: Script, kana: &str) -> Option<&Word> {
        self.vocabulary(script).iter().find(|w| w.kana == kana)
    }

    /// True when the kana string is a real vocabulary entry of any script.
    pub fn is_vocabulary(&self, kana: &str) -> bool {
        self.vocabulary_index.contains(kana)
    }

    /// Visually similar kana, strongest first.
    pub fn similar_kana(&self, script: Script, kana: &str) -> &[Similarity] {
        self.similarities
            .get(&script)
            .and_then(|t| t.get(kana))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn parse<T: for<'de> Deserialize<'de>>(name: &str, text: &str) -> Result<T, DatasetError> {
    serde_json::from_str(text).map_err(|e| DatasetError::Parse(name.to_string(), e.to_string()))
}

fn parse_script(name: &str, key: &str) -> Result<Script, DatasetError> {
    key.parse::<Script>()
        .map_err(|e| DatasetError::Invalid(format!("{}: {}", name, e)))
}

fn read_table(dir: &Path, name: &str) -> Result<String, DatasetError> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(DatasetError::FileNotFound(path.display().to_string()));
    }
    fs::read_to_string(&path).map_err(|e| DatasetError::Io(path.display().to_string(), e.to_string()))
}

/// Dataset loading errors.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetError {
    FileNotFound(String),
    Io(String, String),
    Parse(String, String),
    Invalid(String),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::FileNotFound(path) => write!(f, "Dataset file not found: {}", path),
            DatasetError::Io(path, err) => write!(f, "IO error reading {}: {}", path, err),
            DatasetError::Parse(name, err) => write!(f, "Parse error in {}: {}", name, err),
            DatasetError::Invalid(msg) => write!(f, "Invalid dataset: {}", msg),
        }
    }
}

impl DatasetError {
    /// Returns a user-facing error message without exposing filesystem paths.
    pub fn user_message(&self) -> &'static str {
        match self {
            DatasetError::FileNotFound(_) => "Dataset file not found",
            DatasetError::Io(_, _) => "Failed to read dataset file",
            DatasetError::Parse(_, _) => "Failed to parse dataset file",
            DatasetError::Invalid(_) => "Dataset is inconsistent",
        }
    }
}

impl std::error::Error for DatasetError {}
