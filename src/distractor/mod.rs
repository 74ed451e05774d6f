//! Distractor generation: three plausible wrong options per question.
//!
//! Candidates are gathered in priority order:
//! 1. catalogued learner errors of a word,
//! 2. single mutations of the answer ([`Mutation`]),
//! 3. neighbours from the scoped pool,
//! 4. the broadened pool of everything taught so far,
//! 5. sequential generic padding.
//!
//! Word distractors always keep the answer's mora count.

pub mod mutations;
pub mod synthetic;

pub use mutations::{Mutation, visual_swap, voicing_variant};
pub use synthetic::{SYNTHETIC_DERIVATION, generate_synthetic_word};

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::config::{
  DISTRACTOR_COUNT, DISTRACTOR_WORD_POOL_LIMIT, EMERGENCY_OPTION_LIMIT, FALLBACK_WORD_POOL_LIMIT,
  GENERIC_PADDING_LIMIT, OPTION_COUNT, WORD_MUTATION_ROUNDS,
};
use crate::content::Dataset;
use crate::domain::{DrillItem, DrillLevel, Mora, QuestionType, Script, Word};
use crate::linguistics::{LineScope, reconstruct_word, romanize, segment_kana};
use crate::pools::{KanaPoolOptions, WordPoolOptions, kana_pool, word_pool};

const GENERIC_BASE: [(Script, &str); 2] = [
  (Script::Hiragana, "あいうえおかきくけこ"),
  (Script::Katakana, "アイウエオカキクケコ"),
];

const EMERGENCY_BASE: [(Script, &str); 2] = [
  (Script::Hiragana, "さしすせそたちつてと"),
  (Script::Katakana, "サシスセソタチツテト"),
];

fn base_chars(table: &[(Script, &'static str)], script: Script) -> Vec<char> {
  table
    .iter()
    .find(|(s, _)| *s == script)
    .map(|(_, chars)| chars.chars().collect())
    .unwrap_or_default()
}

/// Distractor source for one drill context (script, line scope, level).
#[derive(Debug, Clone, Copy)]
pub struct DistractorGenerator<'d> {
  pub dataset: &'d Dataset,
  pub script: Script,
  pub scope: LineScope<'d>,
  pub level: DrillLevel,
}

impl<'d> DistractorGenerator<'d> {
  pub fn new(dataset: &'d Dataset, script: Script, scope: LineScope<'d>, level: DrillLevel) -> Self {
    Self {
      dataset,
      script,
      scope,
      level,
    }
  }

  /// Four distinct, non-empty options in random order, one of them
  /// `correct_answer`.
  pub fn options<R: Rng + ?Sized>(
    &self,
    item: &DrillItem<'_>,
    question_type: QuestionType,
    correct_answer: &str,
    rng: &mut R,
  ) -> Vec<String> {
    let mut collector = Collector::new(item, question_type, correct_answer);

    match item {
      DrillItem::Word(word) => self.word_candidates(&mut collector, word, rng),
      DrillItem::Kana(mora) => self.kana_candidates(&mut collector, mora, rng),
    }

    let mut distractors = collector.take_ranked(rng);
    if distractors.len() < DISTRACTOR_COUNT {
      self.generic_padding(&mut collector, item, GENERIC_PADDING_LIMIT, &GENERIC_BASE, 1);
      distractors = collector.take_ranked(rng);
    }

    let mut options: Vec<String> = std::iter::once(correct_answer.to_string())
      .chain(distractors.into_iter().take(DISTRACTOR_COUNT))
      .collect();

    if options.len() < OPTION_COUNT {
      tracing::warn!(
        "Only {} options for '{}', using emergency padding",
        options.len(),
        correct_answer
      );
      self.generic_padding(&mut collector, item, EMERGENCY_OPTION_LIMIT, &EMERGENCY_BASE, 0);
      complete_options(&mut options, collector.take_ranked(rng));
    }

    options.shuffle(rng);
    options
  }

  fn word_candidates<R: Rng + ?Sized>(&self, collector: &mut Collector, word: &Word, rng: &mut R) {
    let length = word.length;

    // 1. catalogued learner errors
    for error in &word.common_learner_errors {
      match self.dataset.vocabulary_word(self.script, error) {
        Some(real) if real.length == length => collector.add_word(real, 1),
        Some(_) => {}
        None => {
          let tokens = segment_kana(self.dataset, error);
          if tokens.len() == length {
            let (kana, romaji) = reconstruct_word(self.dataset, &tokens);
            collector.add(kana, romaji, 1);
          }
        }
      }
    }

    // 2. mutations
    for _ in 0..WORD_MUTATION_ROUNDS {
      if let Some(mutated) = self.transform_word(word, rng) {
        collector.add_word(&mutated, 2);
      }
    }

    // 3. same-length neighbours
    let options = WordPoolOptions {
      lengths: vec![length],
      limit: Some(DISTRACTOR_WORD_POOL_LIMIT),
      ..Default::default()
    };
    for neighbour in word_pool(self.dataset, self.script, self.scope, &options, rng) {
      collector.add_word(neighbour, 3);
    }

    // 4. everything taught so far
    if collector.len() < DISTRACTOR_COUNT {
      let options = WordPoolOptions {
        lengths: vec![length],
        limit: Some(FALLBACK_WORD_POOL_LIMIT),
        review: true,
        ..Default::default()
      };
      for candidate in word_pool(self.dataset, self.script, self.scope, &options, rng) {
        collector.add_word(candidate, 4);
      }
    }
  }

  fn kana_candidates<R: Rng + ?Sized>(&self, collector: &mut Collector, mora: &Mora, rng: &mut R) {
    // 2. voicing and visual variants
    if let Some(variant) = voicing_variant(self.dataset, mora, rng) {
      collector.add_mora(variant, 2);
    }
    if let Some(swapped) = visual_swap(self.dataset, mora, rng) {
      collector.add_mora(swapped, 2);
    }

    // 3. neighbours from the scoped pool
    let options = KanaPoolOptions {
      context: Some(mora),
      ..Default::default()
    };
    for neighbour in kana_pool(self.dataset, self.script, self.scope, self.level, options, rng) {
      collector.add_mora(neighbour, 3);
    }

    // 4. everything taught so far
    if collector.len() < DISTRACTOR_COUNT {
      let options = KanaPoolOptions {
        context: Some(mora),
        review: true,
        ..Default::default()
      };
      for candidate in kana_pool(self.dataset, self.script, self.scope, self.level, options, rng) {
        collector.add_mora(candidate, 4);
      }
    }
  }

  /// Sequential kana strings built from a fixed base set.
  fn generic_padding(
    &self,
    collector: &mut Collector,
    item: &DrillItem<'_>,
    limit: usize,
    table: &[(Script, &'static str)],
    start: usize,
  ) {
    let base = base_chars(table, self.script);
    if base.is_empty() {
      return;
    }
    let length = item.mora_length();
    for counter in start..limit {
      if collector.len() >= DISTRACTOR_COUNT {
        break;
      }
      let tokens: Vec<String> = (0..length)
        .map(|i| base[(counter + i) % base.len()].to_string())
        .collect();
      let (kana, romaji) = reconstruct_word(self.dataset, &tokens);
      collector.add(kana, romaji, 5);
    }
  }

  /// Apply one randomly chosen mutation that changes the word and keeps its
  /// mora count.
  ///
  /// A result that spells a real vocabulary entry is returned as that entry;
  /// anything else is a plausible non-word tagged with the mutation name.
  pub fn transform_word<R: Rng + ?Sized>(&self, word: &Word, rng: &mut R) -> Option<Word> {
    let mut mutations: Vec<Mutation> = Mutation::ALL
      .into_iter()
      .filter(|m| m.applies_to(self.script))
      .collect();
    mutations.shuffle(rng);

    for mutation in mutations {
      let Some(mutated) = mutation.apply(self, &word.constituent_kana, rng) else {
        continue;
      };
      let kana = mutated.concat();
      if kana == word.kana {
        continue;
      }
      let tokens = segment_kana(self.dataset, &kana);
      if tokens.len() != word.length {
        continue;
      }
      if let Some(real) = self.dataset.vocabulary_word(self.script, &kana) {
        return Some(real.clone());
      }
      let romaji = romanize(self.dataset, &tokens);
      let mut non_word =
        Word::plausible_non_word(tokens, romaji, Some(word.kana.clone()), mutation.as_str());
      non_word.phonetic_profile = Some(self.dataset.derive_profile(&non_word.constituent_kana));
      return Some(non_word);
    }
    None
  }
}

/// Top `options` up to [`OPTION_COUNT`] with unseen `extra` texts, then with
/// numbered placeholders.
fn complete_options(options: &mut Vec<String>, extra: Vec<String>) {
  for text in extra {
    if options.len() >= OPTION_COUNT {
      break;
    }
    if !options.contains(&text) {
      options.push(text);
    }
  }
  let mut counter = 0;
  while options.len() < OPTION_COUNT {
    let placeholder = format!("エラー{}", counter);
    if !options.contains(&placeholder) {
      options.push(placeholder);
    }
    counter += 1;
  }
}

/// Deduplicating, priority-tagged candidate list for one question.
struct Collector {
  answer_is_kana: bool,
  correct_kana: String,
  /// Readings of the correct answer; a kana option with one of them would
  /// also be correct
  readings: HashSet<String>,
  used: HashSet<String>,
  candidates: Vec<(u8, String)>,
}

impl Collector {
  fn new(
    item: &DrillItem<'_>,
    question_type: QuestionType,
    correct_answer: &str,
  ) -> Self {
    let readings: HashSet<String> = [item.romaji(), item.drill_romaji()]
      .into_iter()
      .map(str::to_string)
      .collect();
    let answer_is_kana = question_type.answer_is_kana();
    let mut used: HashSet<String> = HashSet::from([correct_answer.to_string()]);
    if !answer_is_kana {
      used.extend(readings.iter().cloned());
    }
    Self {
      answer_is_kana,
      correct_kana: item.kana().to_string(),
      readings,
      used,
      candidates: Vec::new(),
    }
  }

  fn len(&self) -> usize {
    self.candidates.len()
  }

  fn add(&mut self, kana: String, romaji: String, priority: u8) {
    if kana == self.correct_kana {
      return;
    }
    if self.answer_is_kana && self.readings.contains(&romaji) {
      return;
    }
    let text = if self.answer_is_kana { kana } else { romaji };
    if text.trim().is_empty() || !self.used.insert(text.clone()) {
      return;
    }
    self.candidates.push((priority, text));
  }

  fn add_word(&mut self, word: &Word, priority: u8) {
    self.add(word.kana.clone(), word.romaji.clone(), priority);
  }

  fn add_mora(&mut self, mora: &Mora, priority: u8) {
    if self.answer_is_kana {
      // a particle reading is as correct as the plain one
      if let Some(particle) = &mora.particle_romaji {
        if self.readings.contains(particle) {
          return;
        }
      }
    }
    self.add(mora.kana.clone(), mora.romaji.clone(), priority);
  }

  /// Candidate texts ordered by priority, ties in random order.
  fn take_ranked<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<String> {
    self.candidates.shuffle(rng);
    self.candidates.sort_by_key(|(priority, _)| *priority);
    self.candidates.iter().map(|(_, text)| text.clone()).collect()
  }
}
