//! Candidate pools scoped by script, curriculum line and level.
//!
//! Every pool is reshuffled on each call with the caller's random source.
//! Pools only ever contain material from the cumulative curriculum of the
//! requested line.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::content::Dataset;
use crate::domain::{DrillLevel, KanaLine, Mora, MoraType, PhoneticProfileFilter, Script, Word};
use crate::linguistics::{LineScope, cumulative_curriculum, cumulative_kana_set};

/// Seed used when filtering leaves a kana pool empty.
static SEED_KANA: [(Script, [&str; 3]); 2] = [
  (Script::Hiragana, ["あ", "い", "う"]),
  (Script::Katakana, ["ア", "イ", "ウ"]),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct KanaPoolOptions<'a> {
  /// Pool of question stimuli rather than distractor candidates
  pub stimulus_only: bool,
  /// Correct answer a distractor pool is built around; never part of the pool
  pub context: Option<&'a Mora>,
  /// Draw from everything taught up to the line instead of the line itself
  pub review: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WordPoolOptions {
  /// Accepted mora counts; empty accepts any length
  pub lengths: Vec<usize>,
  pub phonetic_profile: Option<PhoneticProfileFilter>,
  pub limit: Option<usize>,
  pub exclude_plausible_non_words: bool,
  /// Accept words that use none of the line's own kana
  pub review: bool,
}

/// Kana candidates for a drill.
///
/// For a specific line the pool is the line itself, widened for distractor
/// use with related material the learner has already met. Never empty.
pub fn kana_pool<'d, R: Rng + ?Sized>(
  dataset: &'d Dataset,
  script: Script,
  scope: LineScope<'_>,
  level: DrillLevel,
  options: KanaPoolOptions<'_>,
  rng: &mut R,
) -> Vec<&'d Mora> {
  let line = scope.resolve(dataset, script);
  let marks_line = line.is_some_and(|l| dataset.is_marks_line(l));

  let mut pool: Vec<&'d Mora> = match line {
    Some(line) if !options.review && marks_line => line_moras(dataset, line).collect(),
    Some(line) if !options.review => {
      if options.stimulus_only {
        line_moras(dataset, line).collect()
      } else if let Some(context) = options.context {
        distractor_neighbourhood(dataset, script, scope, line, context)
      } else {
        nearby_lines(dataset, script, scope, line)
      }
    }
    _ => cumulative_curriculum(dataset, script, scope),
  };

  let mut seen = HashSet::new();
  pool.retain(|&m| {
    m.script == script
      && options.context.is_none_or(|c| c.kana != m.kana)
      && seen.insert(m.kana.as_str())
  });

  if options.stimulus_only {
    if scope == LineScope::Mixed && level == DrillLevel::Easy {
      pool.retain(|m| m.mora_type == MoraType::Basic);
    }
    if !marks_line {
      pool.retain(|m| !m.mora_type.is_mark());
    }
  }

  if pool.is_empty() {
    pool = seed_kana(dataset, script)
      .filter(|m| options.context.is_none_or(|c| c.kana != m.kana))
      .collect();
    tracing::debug!("Kana pool for {}/{} empty, using seed kana", script, scope);
  }

  pool.shuffle(rng);
  pool
}

fn line_moras<'d>(dataset: &'d Dataset, line: &'d KanaLine) -> impl Iterator<Item = &'d Mora> {
  line.kana.iter().filter_map(|k| dataset.mora(k))
}

fn seed_kana(dataset: &Dataset, script: Script) -> impl Iterator<Item = &Mora> {
  SEED_KANA
    .iter()
    .filter(move |(s, _)| *s == script)
    .flat_map(|(_, kana)| kana.iter())
    .filter_map(|k| dataset.mora(k))
}

/// The line plus voicing relatives and look-alikes of `context`, limited to
/// taught kana.
fn distractor_neighbourhood<'d>(
  dataset: &'d Dataset,
  script: Script,
  scope: LineScope<'_>,
  line: &'d KanaLine,
  context: &Mora,
) -> Vec<&'d Mora> {
  let taught = cumulative_kana_set(dataset, script, scope);
  let head = context.family_head();

  let family = dataset
    .moras_of(script)
    .filter(|m| m.family_head() == head && m.mora_type.is_gojuon());
  let similar = dataset
    .similar_kana(script, &context.kana)
    .iter()
    .filter_map(|s| dataset.mora(&s.similar_kana));

  line_moras(dataset, line)
    .chain(family.chain(similar).filter(|m| taught.contains(m.kana.as_str())))
    .collect()
}

/// The line, the one before it and the lines sharing its voicing family,
/// limited to taught kana.
fn nearby_lines<'d>(
  dataset: &'d Dataset,
  script: Script,
  scope: LineScope<'_>,
  line: &'d KanaLine,
) -> Vec<&'d Mora> {
  let taught = cumulative_kana_set(dataset, script, scope);
  let lines = dataset.lines(script);
  let position = dataset.line_position(script, &line.id).unwrap_or(0);
  let head = line_moras(dataset, line).next().map(|m| m.family_head().to_string());

  let related = lines.iter().enumerate().filter(|(i, l)| {
    *i == position
      || *i + 1 == position
      || head.as_deref().is_some_and(|h| {
        line_moras(dataset, l).any(|m| m.family_head() == h)
      })
  });

  related
    .filter(|(_, l)| !dataset.is_marks_line(l))
    .flat_map(|(_, l)| line_moras(dataset, l))
    .filter(|m| taught.contains(m.kana.as_str()))
    .collect()
}

/// Vocabulary whose every mora has been taught by the scoped line.
///
/// A specific line additionally requires one of the word's morae to come from
/// that line, so its new material is exercised. A marks line keeps words
/// containing one of its marks.
pub fn word_pool<'d, R: Rng + ?Sized>(
  dataset: &'d Dataset,
  script: Script,
  scope: LineScope<'_>,
  options: &WordPoolOptions,
  rng: &mut R,
) -> Vec<&'d Word> {
  let taught = cumulative_kana_set(dataset, script, scope);
  let line = scope.resolve(dataset, script);
  let must_touch = line.filter(|l| !options.review || dataset.is_marks_line(l));

  let mut words: Vec<&'d Word> = dataset
    .vocabulary(script)
    .iter()
    .filter(|w| !(options.exclude_plausible_non_words && w.is_plausible_non_word()))
    .filter(|w| w.constituent_kana.iter().all(|k| taught.contains(k.as_str())))
    .filter(|w| must_touch.is_none_or(|l| w.constituent_kana.iter().any(|k| l.contains(k))))
    .filter(|w| options.lengths.is_empty() || options.lengths.contains(&w.length))
    .filter(|w| {
      options
        .phonetic_profile
        .is_none_or(|filter| filter.matches(&w.profile()))
    })
    .collect();

  words.shuffle(rng);
  if let Some(limit) = options.limit {
    words.truncate(limit);
  }
  words
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  fn kana_of(pool: &[&Mora]) -> HashSet<String> {
    pool.iter().map(|m| m.kana.clone()).collect()
  }

  fn set(kana: &[&str]) -> HashSet<String> {
    kana.iter().map(|k| k.to_string()).collect()
  }

  #[test]
  fn test_stimulus_pool_is_the_line() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(1);
    let options = KanaPoolOptions { stimulus_only: true, ..Default::default() };
    let pool = kana_pool(dataset, Script::Hiragana, LineScope::Line("ka-line"), DrillLevel::Medium, options, &mut rng);
    assert_eq!(kana_of(&pool), set(&["か", "き", "く", "け", "こ"]));
  }

  #[test]
  fn test_mixed_easy_stimuli_are_basic() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(2);
    let options = KanaPoolOptions { stimulus_only: true, ..Default::default() };
    let pool = kana_pool(dataset, Script::Katakana, LineScope::Mixed, DrillLevel::Easy, options, &mut rng);
    assert!(!pool.is_empty());
    assert!(pool.iter().all(|m| m.mora_type == MoraType::Basic));

    let medium = kana_pool(dataset, Script::Katakana, LineScope::Mixed, DrillLevel::Medium, options, &mut rng);
    assert!(medium.iter().any(|m| m.mora_type == MoraType::YouonY));
    assert!(medium.iter().all(|m| !m.mora_type.is_mark()));
  }

  #[test]
  fn test_marks_line_stimuli_keep_marks() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(3);
    let options = KanaPoolOptions { stimulus_only: true, ..Default::default() };
    let pool = kana_pool(dataset, Script::Katakana, LineScope::Line("sokuon-choonpu-line"), DrillLevel::Easy, options, &mut rng);
    assert_eq!(kana_of(&pool), set(&["ッ", "ー"]));
  }

  #[test]
  fn test_distractor_pool_has_no_forward_material() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(4);
    let ka = dataset.mora("か").unwrap();
    let options = KanaPoolOptions { context: Some(ka), ..Default::default() };
    let pool = kana_pool(dataset, Script::Hiragana, LineScope::Line("ka-line"), DrillLevel::Easy, options, &mut rng);
    let taught = cumulative_kana_set(dataset, Script::Hiragana, LineScope::Line("ka-line"));
    assert!(!pool.is_empty());
    assert!(pool.iter().all(|m| taught.contains(m.kana.as_str())));
    assert!(pool.iter().all(|m| m.kana != "か"));
    assert!(pool.iter().all(|m| m.kana != "が"));
  }

  #[test]
  fn test_distractor_pool_includes_voicing_family() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(5);
    let ga = dataset.mora("が").unwrap();
    let options = KanaPoolOptions { context: Some(ga), ..Default::default() };
    let pool = kana_pool(dataset, Script::Hiragana, LineScope::Line("ga-line"), DrillLevel::Medium, options, &mut rng);
    assert!(pool.iter().any(|m| m.kana == "か"));
  }

  #[test]
  fn test_nearby_lines_include_previous_line() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(6);
    let pool = kana_pool(dataset, Script::Hiragana, LineScope::Line("sa-line"), DrillLevel::Medium, KanaPoolOptions::default(), &mut rng);
    let kana = kana_of(&pool);
    assert!(kana.contains("さ"));
    assert!(kana.contains("か"));
    assert!(!kana.contains("あ"));
    assert!(!kana.contains("ざ"));
  }

  #[test]
  fn test_empty_pool_falls_back_to_seed() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(7);
    // the hiragana marks line holds only っ, which the context removes
    let small_tsu = dataset.mora("っ").unwrap();
    let options = KanaPoolOptions { context: Some(small_tsu), ..Default::default() };
    let pool = kana_pool(dataset, Script::Hiragana, LineScope::Line("sokuon-line"), DrillLevel::Easy, options, &mut rng);
    assert_eq!(kana_of(&pool), set(&["あ", "い", "う"]));
  }

  #[test]
  fn test_word_pool_respects_line() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(8);
    let scope = LineScope::Line("ka-line");
    let taught = cumulative_kana_set(dataset, Script::Hiragana, scope);
    let line = dataset.line(Script::Hiragana, "ka-line").unwrap();
    let words = word_pool(dataset, Script::Hiragana, scope, &WordPoolOptions::default(), &mut rng);
    assert!(!words.is_empty());
    for word in &words {
      assert!(word.constituent_kana.iter().all(|k| taught.contains(k.as_str())), "{}", word.kana);
      assert!(word.constituent_kana.iter().any(|k| line.contains(k)), "{}", word.kana);
    }
  }

  #[test]
  fn test_word_pool_review_drops_line_requirement() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(9);
    let scope = LineScope::Line("ka-line");
    let strict = word_pool(dataset, Script::Hiragana, scope, &WordPoolOptions::default(), &mut rng);
    let review = word_pool(dataset, Script::Hiragana, scope, &WordPoolOptions { review: true, ..Default::default() }, &mut rng);
    assert!(review.len() >= strict.len());
    assert!(review.iter().any(|w| w.kana == "いえ"));
  }

  #[test]
  fn test_word_pool_filters_and_limit() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(10);
    let options = WordPoolOptions {
      lengths: vec![2],
      limit: Some(3),
      ..Default::default()
    };
    let words = word_pool(dataset, Script::Hiragana, LineScope::Mixed, &options, &mut rng);
    assert_eq!(words.len(), 3);
    assert!(words.iter().all(|w| w.length == 2));

    let sokuon = WordPoolOptions {
      phonetic_profile: Some(PhoneticProfileFilter { has_sokuon: Some(true), ..Default::default() }),
      ..Default::default()
    };
    let words = word_pool(dataset, Script::Hiragana, LineScope::Mixed, &sokuon, &mut rng);
    assert!(!words.is_empty());
    assert!(words.iter().all(|w| w.profile().has_sokuon));
  }

  #[test]
  fn test_marks_line_word_pool_needs_marks() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(11);
    let words = word_pool(dataset, Script::Katakana, LineScope::Line("sokuon-choonpu-line"), &WordPoolOptions::default(), &mut rng);
    assert!(!words.is_empty());
    assert!(words.iter().all(|w| w.kana.contains('ッ') || w.kana.contains('ー')));
  }

  #[test]
  fn test_pools_are_reshuffled() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(12);
    let a = word_pool(dataset, Script::Hiragana, LineScope::Mixed, &WordPoolOptions::default(), &mut rng);
    let b = word_pool(dataset, Script::Hiragana, LineScope::Mixed, &WordPoolOptions::default(), &mut rng);
    let mut a_sorted: Vec<_> = a.iter().map(|w| &w.kana).collect();
    let mut b_sorted: Vec<_> = b.iter().map(|w| &w.kana).collect();
    assert_ne!(a_sorted, b_sorted);
    a_sorted.sort();
    b_sorted.sort();
    assert_eq!(a_sorted, b_sorted);
  }
}
