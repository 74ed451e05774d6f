use serde::{Deserialize, Serialize};

/// Writing system a mora, line or word belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
  Hiragana,
  Katakana,
}

impl Script {
  pub const ALL: [Script; 2] = [Script::Hiragana, Script::Katakana];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Hiragana => "hiragana",
      Self::Katakana => "katakana",
    }
  }
}

impl std::fmt::Display for Script {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for Script {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "hiragana" => Ok(Self::Hiragana),
      "katakana" => Ok(Self::Katakana),
      _ => Err(format!("Invalid script: {}", s)),
    }
  }
}

/// Phonological category of a mora.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoraType {
  #[serde(rename = "basic")]
  Basic,
  /// Dakuten variant (が, ざ, ば ...)
  #[serde(rename = "basic-d")]
  Voiced,
  /// Handakuten variant (ぱ-line)
  #[serde(rename = "basic-hp")]
  Handakuten,
  #[serde(rename = "youon-y")]
  YouonY,
  #[serde(rename = "youon-w")]
  YouonW,
  #[serde(rename = "sokuon")]
  Sokuon,
  #[serde(rename = "choonpu")]
  Choonpu,
  #[serde(rename = "extended")]
  Extended,
  #[serde(rename = "n_syllabic")]
  SyllabicN,
}

impl MoraType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Basic => "basic",
      Self::Voiced => "basic-d",
      Self::Handakuten => "basic-hp",
      Self::YouonY => "youon-y",
      Self::YouonW => "youon-w",
      Self::Sokuon => "sokuon",
      Self::Choonpu => "choonpu",
      Self::Extended => "extended",
      Self::SyllabicN => "n_syllabic",
    }
  }

  /// Sokuon and chōonpu only modify a neighbouring mora.
  pub fn is_mark(&self) -> bool {
    matches!(self, Self::Sokuon | Self::Choonpu)
  }

  pub fn is_youon(&self) -> bool {
    matches!(self, Self::YouonY | Self::YouonW)
  }

  /// Plain, voiced and handakuten morae, the ones voicing toggles move between.
  pub fn is_gojuon(&self) -> bool {
    matches!(self, Self::Basic | Self::Voiced | Self::Handakuten)
  }
}

/// An atomic kana unit from the mora table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mora {
  pub kana: String,
  pub romaji: String,
  #[serde(rename = "type")]
  pub mora_type: MoraType,
  pub script: Script,
  /// Unvoiced form this mora derives from (か for が)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base_kana: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub consonant: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub vowel: Option<String>,
  /// Component characters of a digraph, e.g. [き, ゃ] for きゃ
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub constituent_kana: Option<Vec<String>>,
  /// Reading when used as a particle (は → wa)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub particle_romaji: Option<String>,
}

impl Mora {
  /// Consonant onset, treating an empty string as "none".
  pub fn consonant(&self) -> Option<&str> {
    self.consonant.as_deref().filter(|c| !c.is_empty())
  }

  pub fn vowel(&self) -> Option<&str> {
    self.vowel.as_deref().filter(|v| !v.is_empty())
  }

  /// A bare vowel kana (あ, イ ...).
  pub fn is_pure_vowel(&self) -> bool {
    self.mora_type == MoraType::Basic && self.consonant().is_none()
  }

  /// Kana of the unvoiced family head (か for が, か for か).
  pub fn family_head(&self) -> &str {
    self.base_kana.as_deref().unwrap_or(&self.kana)
  }
}

/// A curriculum unit: an ordered group of morae taught together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanaLine {
  pub id: String,
  pub name: String,
  pub kana: Vec<String>,
}

impl KanaLine {
  pub fn contains(&self, kana: &str) -> bool {
    self.kana.iter().any(|k| k == kana)
  }
}

/// One entry of the visual-similarity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
  pub similar_kana: String,
  pub strength: f32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
}
