//! Fallback tiers of the padding and emergency phases.
//!
//! Each tier is a [`CandidateSource`]; the assembler walks an ordered list of
//! them and takes the first item it can use.

use rand::{Rng, RngCore};
use std::borrow::Cow;

use crate::content::Dataset;
use crate::distractor::generate_synthetic_word;
use crate::domain::{DrillItem, DrillLevel, Mora, Script, Word};
use crate::linguistics::LineScope;

/// A supplier of drill items for one fallback tier.
pub trait CandidateSource<'d> {
  /// Next candidate, or `None` when this tier has nothing to offer.
  fn try_next(&mut self, rng: &mut dyn RngCore) -> Option<DrillItem<'d>>;

  /// Tier name used in logs
  fn name(&self) -> &'static str;
}

/// Cycles through a fixed, pre-shuffled pool.
pub struct CyclingPool<'d> {
  name: &'static str,
  items: Vec<DrillItem<'d>>,
  cursor: usize,
}

impl<'d> CyclingPool<'d> {
  pub fn new(name: &'static str, items: Vec<DrillItem<'d>>) -> Self {
    Self { name, items, cursor: 0 }
  }

  pub fn of_moras(name: &'static str, moras: Vec<&'d Mora>) -> Self {
    Self::new(name, moras.into_iter().map(DrillItem::Kana).collect())
  }

  pub fn of_words(name: &'static str, words: Vec<&'d Word>) -> Self {
    Self::new(name, words.into_iter().map(|w| DrillItem::Word(Cow::Borrowed(w))).collect())
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl<'d> CandidateSource<'d> for CyclingPool<'d> {
  fn try_next(&mut self, _rng: &mut dyn RngCore) -> Option<DrillItem<'d>> {
    if self.items.is_empty() {
      return None;
    }
    let item = self.items[self.cursor % self.items.len()].clone();
    self.cursor += 1;
    Some(item)
  }

  fn name(&self) -> &'static str {
    self.name
  }
}

/// Length of a padding non-word: mostly short on Easy, longer on Difficult.
pub fn synthetic_length<R: Rng + ?Sized>(level: DrillLevel, rng: &mut R) -> usize {
  match level {
    DrillLevel::Easy => {
      if rng.random_bool(0.7) {
        2
      } else {
        3
      }
    }
    DrillLevel::Medium => rng.random_range(2..=3),
    DrillLevel::Difficult => rng.random_range(2..=4),
  }
}

/// Fresh plausible non-words from the scope's taught kana.
pub struct SyntheticWords<'d> {
  dataset: &'d Dataset,
  script: Script,
  scope: LineScope<'d>,
  lengths: LengthPolicy,
}

/// How a synthetic source picks word lengths.
#[derive(Debug, Clone, Copy)]
pub enum LengthPolicy {
  /// Level-dependent distribution of [`synthetic_length`]
  Level(DrillLevel),
  /// Uniform over an inclusive range
  Between(usize, usize),
}

impl<'d> SyntheticWords<'d> {
  pub fn new(dataset: &'d Dataset, script: Script, scope: LineScope<'d>, lengths: LengthPolicy) -> Self {
    Self {
      dataset,
      script,
      scope,
      lengths,
    }
  }
}

impl<'d> CandidateSource<'d> for SyntheticWords<'d> {
  fn try_next(&mut self, rng: &mut dyn RngCore) -> Option<DrillItem<'d>> {
    let length = match self.lengths {
      LengthPolicy::Level(level) => synthetic_length(level, rng),
      LengthPolicy::Between(min, max) => rng.random_range(min..=max.max(min)),
    };
    generate_synthetic_word(self.dataset, self.script, self.scope, length, rng)
      .map(|word| DrillItem::Word(Cow::Owned(word)))
  }

  fn name(&self) -> &'static str {
    "synthetic"
  }
}

/// Always yields the same item.
pub struct FixedItem<'d> {
  item: DrillItem<'d>,
}

impl<'d> FixedItem<'d> {
  pub fn new(item: DrillItem<'d>) -> Self {
    Self { item }
  }

  /// The word of last resort: ねこ (or ネコ), from the vocabulary when present.
  pub fn last_resort_word(dataset: &'d Dataset, script: Script) -> Self {
    let (kana, constituents) = match script {
      Script::Hiragana => ("ねこ", ["ね", "こ"]),
      Script::Katakana => ("ネコ", ["ネ", "コ"]),
    };
    let item = match dataset.vocabulary_word(script, kana) {
      Some(word) => DrillItem::Word(Cow::Borrowed(word)),
      None => DrillItem::Word(Cow::Owned(Word {
        kana: kana.to_string(),
        romaji: "neko".to_string(),
        length: 2,
        constituent_kana: constituents.iter().map(|k| k.to_string()).collect(),
        common_learner_errors: Vec::new(),
        phonetic_profile: None,
        plausible_non_word: None,
        meaning: Some("cat".to_string()),
        tags: Vec::new(),
      })),
    };
    Self::new(item)
  }
}

impl<'d> CandidateSource<'d> for FixedItem<'d> {
  fn try_next(&mut self, _rng: &mut dyn RngCore) -> Option<DrillItem<'d>> {
    Some(self.item.clone())
  }

  fn name(&self) -> &'static str {
    "last resort"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  #[test]
  fn test_cycling_pool_wraps_around() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(1);
    let a = dataset.mora("あ").unwrap();
    let i = dataset.mora("い").unwrap();
    let mut pool = CyclingPool::of_moras("test", vec![a, i]);
    let drawn: Vec<String> = (0..5)
      .filter_map(|_| pool.try_next(&mut rng))
      .map(|item| item.kana().to_string())
      .collect();
    assert_eq!(drawn, vec!["あ", "い", "あ", "い", "あ"]);
  }

  #[test]
  fn test_empty_pool_yields_nothing() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut pool = CyclingPool::new("empty", Vec::new());
    assert!(pool.is_empty());
    assert!(pool.try_next(&mut rng).is_none());
  }

  #[test]
  fn test_synthetic_lengths_by_level() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
      assert!((2..=3).contains(&synthetic_length(DrillLevel::Easy, &mut rng)));
      assert!((2..=3).contains(&synthetic_length(DrillLevel::Medium, &mut rng)));
      assert!((2..=4).contains(&synthetic_length(DrillLevel::Difficult, &mut rng)));
    }
  }

  #[test]
  fn test_synthetic_source_yields_non_words() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(4);
    let mut source = SyntheticWords::new(dataset, Script::Hiragana, LineScope::Mixed, LengthPolicy::Between(2, 3));
    let item = source.try_next(&mut rng).unwrap();
    match item {
      DrillItem::Word(word) => {
        assert!(word.is_plausible_non_word());
        assert!((2..=3).contains(&word.length));
      }
      DrillItem::Kana(_) => panic!("synthetic source returned a kana"),
    }
  }

  #[test]
  fn test_last_resort_word() {
    let mut rng = StdRng::seed_from_u64(5);
    let dataset = crate::testing::vocabulary_free_dataset();
    let mut source = FixedItem::last_resort_word(&dataset, Script::Katakana);
    let item = source.try_next(&mut rng).unwrap();
    assert_eq!(item.kana(), "ネコ");
    assert_eq!(item.romaji(), "neko");
    assert_eq!(item.mora_length(), 2);
  }
}
