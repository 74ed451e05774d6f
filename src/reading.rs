//! Immersive reading: step through short passages and pick the romaji of each
//! highlighted unit.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::config::{PASSAGES_PER_READING_LEVEL, READING_OPTION_COUNT, READING_PADDING_ATTEMPTS};
use crate::content::Dataset;
use crate::domain::{Mora, Script};
use crate::linguistics::{reconstruct_word, segment_kana};

pub const BUILTIN_READING_PASSAGES: &str = include_str!("../data/reading_passages.json");

pub const READING_LEVELS: std::ops::RangeInclusive<u8> = 1..=3;

static BUILTIN: OnceLock<Vec<ReadingPassage>> = OnceLock::new();

const VOWELS: [char; 5] = ['a', 'i', 'u', 'e', 'o'];

// digraphs first so "sh" is not read as "s"
const CONSONANTS: [&str; 18] = [
  "ch", "sh", "ts", "k", "s", "t", "n", "h", "m", "y", "r", "w", "g", "z", "d", "b", "p", "j",
];

/// Hepburn spellings and the non-Hepburn spellings learners confuse them with.
const HEPBURN_CONFUSIONS: [(&str, &[&str]); 10] = [
  ("shi", &["si"]),
  ("chi", &["ti"]),
  ("tsu", &["tu"]),
  ("ji", &["zi", "di"]),
  ("zu", &["du"]),
  ("ō", &["ou", "oo"]),
  ("ē", &["ei", "ee"]),
  ("ū", &["uu"]),
  ("ā", &["aa"]),
  ("ī", &["ii"]),
];

const GEMINATING: [char; 4] = ['k', 's', 't', 'p'];

const PLACEHOLDERS: [&str; 4] = ["teki", "suto", "nera", "mika"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingUnit {
  pub japanese: String,
  pub romaji: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingPassage {
  pub id: String,
  /// Difficulty, 1 to 3
  pub level: u8,
  pub full_text: String,
  /// Units tested in order
  pub units: Vec<ReadingUnit>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_info: Option<String>,
}

/// Parse a passage table, dropping passages with no units or an unknown level.
pub fn load_reading_passages(json: &str) -> Result<Vec<ReadingPassage>, serde_json::Error> {
  let passages: Vec<ReadingPassage> = serde_json::from_str(json)?;
  Ok(
    passages
      .into_iter()
      .filter(|p| {
        let usable = READING_LEVELS.contains(&p.level) && !p.units.is_empty();
        if !usable {
          tracing::warn!("Skipping reading passage {} (level {}, {} units)", p.id, p.level, p.units.len());
        }
        usable
      })
      .collect(),
  )
}

/// The embedded passages, parsed on first use.
pub fn builtin_reading_passages() -> &'static [ReadingPassage] {
  BUILTIN.get_or_init(|| match load_reading_passages(BUILTIN_READING_PASSAGES) {
    Ok(passages) => passages,
    Err(e) => {
      tracing::error!("Built-in reading passages are invalid: {}", e);
      Vec::new()
    }
  })
}

/// `n` distinct romaji options for `unit`, one of them its own romaji.
///
/// Distractors are, in order of preference: single vowel and consonant swaps,
/// Hepburn confusions, a wrong double consonant, a look-alike kana swap and
/// another unit of the passage. Random mora strings and fixed placeholders
/// fill any remaining gap.
pub fn romaji_options_for_unit<R: Rng + ?Sized>(
  dataset: &Dataset,
  unit: &ReadingUnit,
  passage_units: &[ReadingUnit],
  n: usize,
  rng: &mut R,
) -> Vec<String> {
  if n == 0 {
    return Vec::new();
  }
  let correct = unit.romaji.as_str();
  let mut candidates = Candidates::new(correct);

  if correct.chars().count() > 1 {
    for swapped in vowel_swaps(correct, rng) {
      candidates.add(swapped);
    }
    for swapped in consonant_swaps(correct, rng) {
      candidates.add(swapped);
    }
  }
  for confused in hepburn_confusions(correct) {
    candidates.add(confused);
  }
  if let Some(geminated) = gemination_error(correct) {
    candidates.add(geminated);
  }
  if let Some(swapped) = similar_kana_swap(dataset, &unit.japanese, rng) {
    candidates.add(swapped);
  }
  let others: Vec<&ReadingUnit> = passage_units.iter().filter(|u| u.japanese != unit.japanese).collect();
  if let Some(other) = others.choose(rng) {
    candidates.add(other.romaji.clone());
  }

  let padding: Vec<&Mora> = dataset
    .moras_of(Script::Hiragana)
    .filter(|m| m.mora_type.is_gojuon())
    .collect();
  let target = correct.chars().count().saturating_sub(2).max(1);
  let mut attempts = 0;
  while candidates.len() < n && attempts < READING_PADDING_ATTEMPTS && !padding.is_empty() {
    let mut random = String::new();
    let mut builds = 0;
    while random.chars().count() < target && builds < 10 {
      if let Some(mora) = padding.choose(rng) {
        random.push_str(&mora.romaji);
      }
      builds += 1;
    }
    candidates.add(random);
    attempts += 1;
  }

  let mut distractors = candidates.distractors;
  distractors.shuffle(rng);
  distractors.truncate(n - 1);
  let mut options = distractors;
  options.push(correct.to_string());
  options.shuffle(rng);

  for placeholder in PLACEHOLDERS {
    if options.len() >= n {
      break;
    }
    if !options.iter().any(|o| o == placeholder) {
      options.push(placeholder.to_string());
    }
  }
  options.truncate(n);
  options
}

/// Distinct non-empty distractors, never equal to the correct answer.
struct Candidates<'a> {
  correct: &'a str,
  distractors: Vec<String>,
}

impl<'a> Candidates<'a> {
  fn new(correct: &'a str) -> Self {
    Self {
      correct,
      distractors: Vec::new(),
    }
  }

  fn add(&mut self, candidate: String) {
    if candidate.trim().is_empty() || candidate == self.correct || self.distractors.contains(&candidate) {
      return;
    }
    self.distractors.push(candidate);
  }

  /// Options so far, counting the correct answer
  fn len(&self) -> usize {
    self.distractors.len() + 1
  }
}

fn vowel_swaps<R: Rng + ?Sized>(romaji: &str, rng: &mut R) -> Vec<String> {
  let chars: Vec<char> = romaji.chars().collect();
  let mut swaps = Vec::new();
  for (i, c) in chars.iter().enumerate() {
    let lower = c.to_ascii_lowercase();
    if !VOWELS.contains(&lower) {
      continue;
    }
    let others: Vec<char> = VOWELS.iter().copied().filter(|v| *v != lower).collect();
    if let Some(&vowel) = others.choose(rng) {
      let mut swapped = chars.clone();
      swapped[i] = vowel;
      swaps.push(swapped.into_iter().collect());
    }
  }
  swaps
}

fn consonant_swaps<R: Rng + ?Sized>(romaji: &str, rng: &mut R) -> Vec<String> {
  let lower = romaji.to_lowercase();
  let mut swaps = Vec::new();
  let mut i = 0;
  while i < lower.len() {
    let rest = &lower[i..];
    match CONSONANTS.iter().find(|c| rest.starts_with(**c)) {
      Some(consonant) => {
        let others: Vec<&str> = CONSONANTS.iter().copied().filter(|c| c != consonant).collect();
        if let Some(other) = others.choose(rng) {
          swaps.push(format!("{}{}{}", &lower[..i], other, &rest[consonant.len()..]));
        }
        i += consonant.len();
      }
      None => i += rest.chars().next().map_or(1, char::len_utf8),
    }
  }
  swaps
}

fn hepburn_confusions(romaji: &str) -> Vec<String> {
  let mut confused = Vec::new();
  for (hepburn, wrong) in HEPBURN_CONFUSIONS {
    if romaji.contains(hepburn) {
      confused.extend(wrong.iter().map(|w| romaji.replacen(hepburn, w, 1)));
    } else {
      confused.extend(
        wrong
          .iter()
          .filter(|w| romaji.contains(**w))
          .map(|w| romaji.replacen(w, hepburn, 1)),
      );
    }
  }
  confused
}

/// Drop a doubled k/s/t/p, or double the first one that follows a vowel.
fn gemination_error(romaji: &str) -> Option<String> {
  let mut chars: Vec<char> = romaji.chars().collect();
  if let Some(i) = chars.windows(2).position(|w| w[0] == w[1] && GEMINATING.contains(&w[0])) {
    chars.remove(i);
    return Some(chars.into_iter().collect());
  }
  let i = chars
    .windows(2)
    .position(|w| VOWELS.contains(&w[0]) && GEMINATING.contains(&w[1]))?;
  chars.insert(i + 1, chars[i + 1]);
  Some(chars.into_iter().collect())
}

fn similar_kana_swap<R: Rng + ?Sized>(dataset: &Dataset, japanese: &str, rng: &mut R) -> Option<String> {
  let mut tokens = segment_kana(dataset, japanese);
  if tokens.is_empty() {
    return None;
  }
  let index = rng.random_range(0..tokens.len());
  let mora = dataset.mora(&tokens[index])?;
  let similar = dataset.similar_kana(mora.script, &mora.kana).choose(rng)?;
  tokens[index] = similar.similar_kana.clone();
  let (_, romaji) = reconstruct_word(dataset, &tokens);
  Some(romaji)
}

/// Running totals of a reading session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingStats {
  pub words_correct: usize,
  pub words_total: usize,
  pub passages_completed: usize,
  pub total_passages_in_level: usize,
}

impl ReadingStats {
  pub fn accuracy(&self) -> f64 {
    if self.words_total == 0 {
      0.0
    } else {
      self.words_correct as f64 / self.words_total as f64
    }
  }
}

/// A pass over a random selection of the passages of one level.
#[derive(Debug, Clone)]
pub struct ReadingSession<'p> {
  level: u8,
  passages: Vec<&'p ReadingPassage>,
  passage_index: usize,
  unit_index: usize,
  stats: ReadingStats,
}

impl<'p> ReadingSession<'p> {
  pub fn new<R: Rng + ?Sized>(passages: &'p [ReadingPassage], level: u8, rng: &mut R) -> Self {
    let mut selected: Vec<&'p ReadingPassage> = passages
      .iter()
      .filter(|p| p.level == level && !p.units.is_empty())
      .collect();
    selected.shuffle(rng);
    selected.truncate(PASSAGES_PER_READING_LEVEL);
    if selected.is_empty() {
      tracing::warn!("No reading passages for level {}", level);
    }

    let stats = ReadingStats {
      total_passages_in_level: selected.len(),
      ..Default::default()
    };
    Self {
      level,
      passages: selected,
      passage_index: 0,
      unit_index: 0,
      stats,
    }
  }

  pub fn level(&self) -> u8 {
    self.level
  }

  pub fn stats(&self) -> ReadingStats {
    self.stats
  }

  pub fn is_finished(&self) -> bool {
    self.passage_index >= self.passages.len()
  }

  pub fn current_passage(&self) -> Option<&'p ReadingPassage> {
    self.passages.get(self.passage_index).copied()
  }

  pub fn current_unit(&self) -> Option<&'p ReadingUnit> {
    self.current_passage()?.units.get(self.unit_index)
  }

  /// Options for the current unit, or empty once the session is over.
  pub fn options<R: Rng + ?Sized>(&self, dataset: &Dataset, rng: &mut R) -> Vec<String> {
    match (self.current_passage(), self.current_unit()) {
      (Some(passage), Some(unit)) => romaji_options_for_unit(dataset, unit, &passage.units, READING_OPTION_COUNT, rng),
      _ => Vec::new(),
    }
  }

  /// Grade an answer for the current unit and advance. `None` once finished.
  pub fn answer(&mut self, choice: &str) -> Option<bool> {
    let passage = self.current_passage()?;
    let unit = passage.units.get(self.unit_index)?;
    let is_correct = choice.trim() == unit.romaji;

    self.stats.words_total += 1;
    if is_correct {
      self.stats.words_correct += 1;
    }

    self.unit_index += 1;
    if self.unit_index >= passage.units.len() {
      self.stats.passages_completed += 1;
      self.passage_index += 1;
      self.unit_index = 0;
    }
    Some(is_correct)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand::rngs::StdRng;
  use std::collections::HashSet;

  fn unit(japanese: &str, romaji: &str) -> ReadingUnit {
    ReadingUnit {
      japanese: japanese.to_string(),
      romaji: romaji.to_string(),
    }
  }

  #[test]
  fn test_builtin_passages_cover_every_level() {
    let passages = builtin_reading_passages();
    assert_eq!(passages.len(), 60);
    for level in READING_LEVELS {
      assert_eq!(passages.iter().filter(|p| p.level == level).count(), 20);
    }
  }

  #[test]
  fn test_options_are_distinct_and_contain_answer() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(1);
    for passage in builtin_reading_passages() {
      for u in &passage.units {
        let options = romaji_options_for_unit(dataset, u, &passage.units, 4, &mut rng);
        assert_eq!(options.len(), 4, "{:?}", u);
        assert!(options.contains(&u.romaji));
        let distinct: HashSet<&String> = options.iter().collect();
        assert_eq!(distinct.len(), 4);
        assert!(options.iter().all(|o| !o.trim().is_empty()));
      }
    }
  }

  #[test]
  fn test_hepburn_confusions() {
    assert_eq!(hepburn_confusions("sushi"), vec!["susi"]);
    assert!(hepburn_confusions("tōkyō").contains(&"toukyō".to_string()));
    assert_eq!(hepburn_confusions("tu"), vec!["tsu"]);
  }

  #[test]
  fn test_gemination_error() {
    assert_eq!(gemination_error("kitte").as_deref(), Some("kite"));
    assert_eq!(gemination_error("kata").as_deref(), Some("katta"));
    assert_eq!(gemination_error("ima"), None);
  }

  #[test]
  fn test_consonant_swap_keeps_digraphs_whole() {
    let mut rng = StdRng::seed_from_u64(2);
    let swaps = consonant_swaps("shi", &mut rng);
    assert_eq!(swaps.len(), 1);
    assert!(swaps[0].ends_with('i'));
    assert!(!swaps[0].starts_with("sh"));
  }

  #[test]
  fn test_single_letter_unit_is_padded() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(3);
    let options = romaji_options_for_unit(dataset, &unit("を", "o"), &[], 4, &mut rng);
    assert_eq!(options.len(), 4);
    assert!(options.contains(&"o".to_string()));
  }

  #[test]
  fn test_session_walks_every_unit() {
    let mut rng = StdRng::seed_from_u64(4);
    let passages = builtin_reading_passages();
    let mut session = ReadingSession::new(passages, 1, &mut rng);
    assert_eq!(session.stats().total_passages_in_level, 20);

    let mut answered = 0;
    while let Some(u) = session.current_unit() {
      let correct = u.romaji.clone();
      let choice = if answered % 2 == 0 { correct.as_str() } else { "zzz" };
      session.answer(choice);
      answered += 1;
    }
    let stats = session.stats();
    assert!(session.is_finished());
    assert_eq!(stats.passages_completed, 20);
    assert_eq!(stats.words_total, answered);
    assert_eq!(stats.words_correct, answered.div_ceil(2));
    assert_eq!(session.answer("wa"), None);
  }

  #[test]
  fn test_unknown_level_is_empty() {
    let mut rng = StdRng::seed_from_u64(5);
    let session = ReadingSession::new(builtin_reading_passages(), 9, &mut rng);
    assert!(session.is_finished());
    assert_eq!(session.stats().total_passages_in_level, 0);
  }
}
