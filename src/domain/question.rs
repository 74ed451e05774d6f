use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::{Mora, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrillLevel {
  Easy,
  Medium,
  Difficult,
}

impl DrillLevel {
  pub const ALL: [DrillLevel; 3] = [DrillLevel::Easy, DrillLevel::Medium, DrillLevel::Difficult];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Easy => "easy",
      Self::Medium => "medium",
      Self::Difficult => "difficult",
    }
  }
}

impl std::fmt::Display for DrillLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for DrillLevel {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "easy" => Ok(Self::Easy),
      "medium" => Ok(Self::Medium),
      "difficult" | "hard" => Ok(Self::Difficult),
      _ => Err(format!("Invalid drill level: {}", s)),
    }
  }
}

/// Direction and unit of a drill question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
  KanaToRomaji,
  RomajiToKana,
  WordToRomaji,
  RomajiToWord,
}

impl QuestionType {
  pub const ALL: [QuestionType; 4] = [
    QuestionType::KanaToRomaji,
    QuestionType::RomajiToKana,
    QuestionType::WordToRomaji,
    QuestionType::RomajiToWord,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::KanaToRomaji => "kanaToRomaji",
      Self::RomajiToKana => "romajiToKana",
      Self::WordToRomaji => "wordToRomaji",
      Self::RomajiToWord => "romajiToWord",
    }
  }

  /// True when the question is about a whole word rather than a single mora.
  pub fn is_word_question(&self) -> bool {
    matches!(self, Self::WordToRomaji | Self::RomajiToWord)
  }

  /// True when the learner picks kana (the options are kana strings).
  pub fn answer_is_kana(&self) -> bool {
    matches!(self, Self::RomajiToKana | Self::RomajiToWord)
  }

  pub fn stimulus_kind(&self) -> UnitKind {
    match self {
      Self::KanaToRomaji => UnitKind::Kana,
      Self::WordToRomaji => UnitKind::Word,
      Self::RomajiToKana | Self::RomajiToWord => UnitKind::Romaji,
    }
  }

  pub fn answer_kind(&self) -> UnitKind {
    match self {
      Self::KanaToRomaji | Self::WordToRomaji => UnitKind::Romaji,
      Self::RomajiToKana => UnitKind::Kana,
      Self::RomajiToWord => UnitKind::Word,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
  Kana,
  Word,
  Romaji,
}

/// Learning content a question is built from.
///
/// Vocabulary and morae are borrowed from the dataset; generated non-words are owned.
#[derive(Debug, Clone, PartialEq)]
pub enum DrillItem<'d> {
  Kana(&'d Mora),
  Word(Cow<'d, Word>),
}

impl<'d> DrillItem<'d> {
  pub fn kana(&self) -> &str {
    match self {
      Self::Kana(mora) => &mora.kana,
      Self::Word(word) => &word.kana,
    }
  }

  pub fn romaji(&self) -> &str {
    match self {
      Self::Kana(mora) => &mora.romaji,
      Self::Word(word) => &word.romaji,
    }
  }

  pub fn is_word(&self) -> bool {
    matches!(self, Self::Word(_))
  }

  /// Mora count of a word item; 1 for a single mora.
  pub fn mora_length(&self) -> usize {
    match self {
      Self::Kana(_) => 1,
      Self::Word(word) => word.length,
    }
  }

  /// Stable identity used for per-session usage tracking.
  pub fn key(&self) -> ItemKey {
    ItemKey {
      is_word: self.is_word(),
      kana: self.kana().to_string(),
    }
  }

  /// Accepted romaji reading when the item is asked about in a drill.
  ///
  /// The topic particle は is drilled with its particle reading.
  pub fn drill_romaji(&self) -> &str {
    match self {
      Self::Kana(mora) if mora.kana == "は" => {
        mora.particle_romaji.as_deref().unwrap_or(&mora.romaji)
      }
      _ => self.romaji(),
    }
  }

  pub fn to_source(&self) -> QuestionSource {
    match self {
      Self::Kana(mora) => QuestionSource::Kana((*mora).clone()),
      Self::Word(word) => QuestionSource::Word(word.clone().into_owned()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
  pub is_word: bool,
  pub kana: String,
}

/// Back-reference from a question to the mora or word it tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "lowercase")]
pub enum QuestionSource {
  Kana(Mora),
  Word(Word),
}

impl QuestionSource {
  pub fn kana(&self) -> &str {
    match self {
      Self::Kana(mora) => &mora.kana,
      Self::Word(word) => &word.kana,
    }
  }
}

/// A multiple choice drill question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub stimulus: String,
  pub correct_answer: String,
  /// Exactly four distinct options, one of which is `correct_answer`
  pub options: Vec<String>,
  pub question_type: QuestionType,
  pub stimulus_type: UnitKind,
  pub answer_type: UnitKind,
  /// The stimulus and the answer always come from the same item
  pub source: QuestionSource,
}

impl Question {
  pub fn is_correct(&self, answer: &str) -> bool {
    answer.trim() == self.correct_answer
  }

  /// Order-independent identity of the question used to reject exact duplicates.
  pub fn signature(&self) -> String {
    let mut options = self.options.clone();
    options.sort();
    format!("{}-{}-{}", self.stimulus, self.correct_answer, options.join(","))
  }
}

/// Running score for a drill session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillStats {
  pub correct: u32,
  pub total: u32,
}

impl DrillStats {
  pub fn record(&mut self, is_correct: bool) {
    self.total += 1;
    if is_correct {
      self.correct += 1;
    }
  }

  /// Fraction of correct answers, 0.0 before any answer.
  pub fn accuracy(&self) -> f64 {
    if self.total == 0 {
      0.0
    } else {
      self.correct as f64 / self.total as f64
    }
  }
}
