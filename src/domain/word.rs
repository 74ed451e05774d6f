use serde::{Deserialize, Serialize};

/// Phonetic features present in a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneticProfile {
  #[serde(default)]
  pub has_voiced: bool,
  #[serde(default)]
  pub has_handakuten: bool,
  #[serde(default)]
  pub has_sokuon: bool,
  #[serde(default)]
  pub has_choonpu: bool,
  #[serde(default)]
  pub has_youon: bool,
}

/// Partial profile used to filter vocabulary; `None` fields are not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhoneticProfileFilter {
  pub has_voiced: Option<bool>,
  pub has_handakuten: Option<bool>,
  pub has_sokuon: Option<bool>,
  pub has_choonpu: Option<bool>,
  pub has_youon: Option<bool>,
}

impl PhoneticProfileFilter {
  pub fn matches(&self, profile: &PhoneticProfile) -> bool {
    fn check(wanted: Option<bool>, actual: bool) -> bool {
      wanted.is_none_or(|w| w == actual)
    }

    check(self.has_voiced, profile.has_voiced)
      && check(self.has_handakuten, profile.has_handakuten)
      && check(self.has_sokuon, profile.has_sokuon)
      && check(self.has_choonpu, profile.has_choonpu)
      && check(self.has_youon, profile.has_youon)
  }
}

/// Where a plausible non-word came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonWordProvenance {
  /// Real word it was derived from, if any
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_word: Option<String>,
  /// How it was derived (`voicing_toggle`, `synthetic_for_padding` ...)
  pub derivation: String,
}

/// A vocabulary entry, or a generated plausible non-word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
  pub kana: String,
  pub romaji: String,
  /// Mora count
  #[serde(default)]
  pub length: usize,
  #[serde(default)]
  pub constituent_kana: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub common_learner_errors: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phonetic_profile: Option<PhoneticProfile>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub plausible_non_word: Option<NonWordProvenance>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub meaning: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,
}

impl Word {
  /// Build a generated non-word from already segmented morae.
  pub fn plausible_non_word(
    constituent_kana: Vec<String>,
    romaji: String,
    source_word: Option<String>,
    derivation: &str,
  ) -> Self {
    Self {
      kana: constituent_kana.concat(),
      romaji,
      length: constituent_kana.len(),
      constituent_kana,
      common_learner_errors: Vec::new(),
      phonetic_profile: None,
      plausible_non_word: Some(NonWordProvenance {
        source_word,
        derivation: derivation.to_string(),
      }),
      meaning: None,
      tags: vec!["synthetic".to_string()],
    }
  }

  pub fn is_plausible_non_word(&self) -> bool {
    self.plausible_non_word.is_some()
  }

  /// Profile, or an all-false profile when none was recorded.
  pub fn profile(&self) -> PhoneticProfile {
    self.phonetic_profile.unwrap_or_default()
  }
}
