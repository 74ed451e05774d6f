use rand::Rng;
use rand::seq::SliceRandom;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use super::sources::{CandidateSource, CyclingPool, FixedItem, LengthPolicy, SyntheticWords};
use super::{DrillSession, FillReport};
use crate::config::{
  ABSOLUTE_FALLBACK_WORD_COUNT, DrillSettings, EMERGENCY_ATTEMPTS_PER_QUESTION, PADDING_ATTEMPTS_PER_QUESTION,
  Quotas, WORD_POOL_QUOTA_MULTIPLIER, kana_stimulus_cap, quota_word_lengths, word_stimulus_cap,
};
use crate::content::Dataset;
use crate::distractor::DistractorGenerator;
use crate::domain::{DrillItem, DrillLevel, ItemKey, Mora, Question, QuestionType, Script};
use crate::linguistics::{LineScope, cumulative_kana_set};
use crate::pools::{KanaPoolOptions, WordPoolOptions, kana_pool, word_pool};

/// Kana of the last kana tier, kept only where the curriculum has taught them.
static ABSOLUTE_FALLBACK_KANA: [(Script, [&str; 8]); 2] = [
  (Script::Hiragana, ["あ", "い", "う", "か", "き", "さ", "し", "す"]),
  (Script::Katakana, ["ア", "イ", "ウ", "カ", "キ", "サ", "シ", "ス"]),
];

type Tiers<'d> = Vec<Box<dyn CandidateSource<'d> + 'd>>;

/// What a drill is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillRequest<'a> {
  pub script: Script,
  /// Curriculum line id; `None` or "mixed" drills everything
  pub line_id: Option<&'a str>,
  pub level: DrillLevel,
}

/// Checks applied when a question is offered to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddMode {
  /// Quota phase: fresh items and fresh stimuli only
  Strict,
  /// Stimulus caps and duplicate signatures still apply
  Padding,
  /// Emergency fill, accepts anything
  Bypass,
}

/// Builds one drill session in three phases: per-type quotas, capped
/// padding from widening fallback tiers, then an unconditional emergency
/// fill up to the configured length.
pub struct DrillAssembler<'d, 'r, R: Rng> {
  dataset: &'d Dataset,
  script: Script,
  scope: LineScope<'d>,
  level: DrillLevel,
  total: usize,
  quotas: Quotas,
  generator: DistractorGenerator<'d>,
  rng: &'r mut R,
  questions: Vec<Question>,
  used_items: HashSet<ItemKey>,
  signatures: HashSet<String>,
  stimulus_uses: HashMap<String, usize>,
  fill: FillReport,
}

impl<'d, 'r, R: Rng> DrillAssembler<'d, 'r, R> {
  pub fn new(dataset: &'d Dataset, settings: &DrillSettings, request: DrillRequest<'d>, rng: &'r mut R) -> Self {
    let scope = LineScope::from_line_id(request.line_id);
    if let LineScope::Line(id) = scope {
      if dataset.line(request.script, id).is_none() {
        tracing::warn!("Unknown {} line '{}', drilling the full curriculum", request.script, id);
      }
    }

    Self {
      dataset,
      script: request.script,
      scope,
      level: request.level,
      total: settings.total_questions,
      quotas: settings.quotas(request.level),
      generator: DistractorGenerator::new(dataset, request.script, scope, request.level),
      rng,
      questions: Vec::with_capacity(settings.total_questions),
      used_items: HashSet::new(),
      signatures: HashSet::new(),
      stimulus_uses: HashMap::new(),
      fill: FillReport::default(),
    }
  }

  pub fn assemble(mut self) -> DrillSession {
    let mut cycle = QuestionType::ALL;
    cycle.shuffle(&mut *self.rng);

    self.fill_kana_quotas();
    self.fill_word_quotas();

    if !self.is_full() {
      tracing::debug!(
        "Quotas gave {}/{} questions for {} {}, padding",
        self.questions.len(),
        self.total,
        self.script,
        self.scope
      );
      self.pad(&cycle);
    }
    if !self.is_full() {
      tracing::warn!(
        "Padding gave {}/{} questions for {} {} ({}), using emergency fill",
        self.questions.len(),
        self.total,
        self.script,
        self.scope,
        self.level
      );
      self.emergency_fill(&cycle);
    }

    self.questions.shuffle(&mut *self.rng);
    tracing::info!(
      "Assembled {} drill for {} ({}): {} quota, {} padding, {} emergency",
      self.script,
      self.scope,
      self.level,
      self.fill.quota,
      self.fill.padding,
      self.fill.emergency
    );

    DrillSession {
      script: self.script,
      line_id: self.scope.line_id().map(str::to_string),
      level: self.level,
      questions: self.questions,
      fill: self.fill,
      generated_at: chrono::Utc::now(),
    }
  }

  fn is_full(&self) -> bool {
    self.questions.len() >= self.total
  }

  fn fill_kana_quotas(&mut self) {
    let options = KanaPoolOptions {
      stimulus_only: true,
      ..Default::default()
    };
    let stimuli = kana_pool(self.dataset, self.script, self.scope, self.level, options, &mut *self.rng);

    let (mut to_romaji, mut to_kana) = (0, 0);
    for mora in stimuli {
      if self.is_full() {
        break;
      }
      if to_romaji < self.quotas.kana_to_romaji
        && self.add(DrillItem::Kana(mora), QuestionType::KanaToRomaji, AddMode::Strict)
      {
        to_romaji += 1;
      }
      if to_kana < self.quotas.romaji_to_kana
        && self.add(DrillItem::Kana(mora), QuestionType::RomajiToKana, AddMode::Strict)
      {
        to_kana += 1;
      }
    }
  }

  fn fill_word_quotas(&mut self) {
    let limit = self.quotas.word_to_romaji.max(self.quotas.romaji_to_word) * WORD_POOL_QUOTA_MULTIPLIER;
    let options = WordPoolOptions {
      lengths: quota_word_lengths(self.level).to_vec(),
      limit: Some(limit),
      exclude_plausible_non_words: true,
      ..Default::default()
    };
    let words = word_pool(self.dataset, self.script, self.scope, &options, &mut *self.rng);

    let (mut to_romaji, mut to_word) = (0, 0);
    for word in words {
      if self.is_full() {
        break;
      }
      let item = DrillItem::Word(Cow::Borrowed(word));
      if to_romaji < self.quotas.word_to_romaji
        && self.add(item.clone(), QuestionType::WordToRomaji, AddMode::Strict)
      {
        to_romaji += 1;
      }
      if to_word < self.quotas.romaji_to_word && self.add(item, QuestionType::RomajiToWord, AddMode::Strict) {
        to_word += 1;
      }
    }
  }

  fn pad(&mut self, cycle: &[QuestionType]) {
    let mut kana_tiers = self.kana_tiers(false);
    let mut word_tiers = self.word_tiers(false);

    let ceiling = self.total * PADDING_ATTEMPTS_PER_QUESTION;
    let mut attempt = 0;
    while !self.is_full() && attempt < ceiling {
      let question_type = cycle[attempt % cycle.len()];
      attempt += 1;
      let tiers = if question_type.is_word_question() {
        &mut word_tiers
      } else {
        &mut kana_tiers
      };
      self.draw(tiers, question_type, AddMode::Padding);
    }
  }

  fn emergency_fill(&mut self, cycle: &[QuestionType]) {
    let mut kana_tiers = self.kana_tiers(true);
    let mut word_tiers = self.word_tiers(true);

    let ceiling = self.total * EMERGENCY_ATTEMPTS_PER_QUESTION;
    let mut attempt = 0;
    while !self.is_full() && attempt < ceiling {
      let question_type = cycle[attempt % cycle.len()];
      attempt += 1;
      let tiers = if question_type.is_word_question() {
        &mut word_tiers
      } else {
        &mut kana_tiers
      };
      self.draw(tiers, question_type, AddMode::Bypass);
    }

    if !self.is_full() {
      tracing::error!(
        "Drill for {} {} stopped at {}/{} questions",
        self.script,
        self.scope,
        self.questions.len(),
        self.total
      );
    }
  }

  /// Offer the first usable candidate of the tiers, narrowest tier first.
  fn draw(&mut self, tiers: &mut Tiers<'d>, question_type: QuestionType, mode: AddMode) -> bool {
    for (rank, tier) in tiers.iter_mut().enumerate() {
      let Some(item) = tier.try_next(&mut *self.rng) else {
        continue;
      };
      if self.add(item, question_type, mode) {
        if rank > 0 {
          tracing::debug!("{} question from the {} tier", question_type.as_str(), tier.name());
        }
        return true;
      }
    }
    false
  }

  fn kana_tiers(&mut self, emergency: bool) -> Tiers<'d> {
    let line = KanaPoolOptions {
      stimulus_only: true,
      ..Default::default()
    };
    let review = KanaPoolOptions {
      review: true,
      ..line
    };

    let mut tiers: Tiers<'d> = Vec::new();
    if !emergency && matches!(self.scope, LineScope::Line(_)) {
      let pool = kana_pool(self.dataset, self.script, self.scope, self.level, line, &mut *self.rng);
      tiers.push(Box::new(CyclingPool::of_moras("line", pool)));
    }
    let pool = kana_pool(self.dataset, self.script, self.scope, self.level, review, &mut *self.rng);
    tiers.push(Box::new(CyclingPool::of_moras("review", pool)));
    tiers.push(Box::new(CyclingPool::of_moras("absolute fallback", self.absolute_fallback_kana())));
    tiers
  }

  fn word_tiers(&mut self, emergency: bool) -> Tiers<'d> {
    let mut tiers: Tiers<'d> = Vec::new();

    if emergency {
      tiers.push(Box::new(SyntheticWords::new(
        self.dataset,
        self.script,
        self.scope,
        LengthPolicy::Between(2, 3),
      )));
      let options = WordPoolOptions {
        review: true,
        limit: Some(ABSOLUTE_FALLBACK_WORD_COUNT),
        ..Default::default()
      };
      let words = word_pool(self.dataset, self.script, self.scope, &options, &mut *self.rng);
      if words.is_empty() {
        tracing::warn!("No taught {} vocabulary for {}, only the last resort word is left", self.script, self.scope);
      }
      tiers.push(Box::new(CyclingPool::of_words("absolute fallback", words)));
      tiers.push(Box::new(FixedItem::last_resort_word(self.dataset, self.script)));
      return tiers;
    }

    let limit = self.quotas.word_to_romaji.max(self.quotas.romaji_to_word) * WORD_POOL_QUOTA_MULTIPLIER;
    let line = WordPoolOptions {
      lengths: quota_word_lengths(self.level).to_vec(),
      limit: Some(limit),
      ..Default::default()
    };
    let review = WordPoolOptions {
      review: true,
      ..Default::default()
    };
    let line_words = word_pool(self.dataset, self.script, self.scope, &line, &mut *self.rng);
    let review_words = word_pool(self.dataset, self.script, self.scope, &review, &mut *self.rng);
    tiers.push(Box::new(CyclingPool::of_words("line", line_words)));
    tiers.push(Box::new(CyclingPool::of_words("review", review_words)));
    tiers.push(Box::new(SyntheticWords::new(
      self.dataset,
      self.script,
      self.scope,
      LengthPolicy::Level(self.level),
    )));
    tiers
  }

  fn absolute_fallback_kana(&self) -> Vec<&'d Mora> {
    let taught = cumulative_kana_set(self.dataset, self.script, self.scope);
    ABSOLUTE_FALLBACK_KANA
      .iter()
      .filter(|(script, _)| *script == self.script)
      .flat_map(|(_, kana)| kana.iter())
      .filter(|k| taught.contains(**k))
      .filter_map(|k| self.dataset.mora(k))
      .collect()
  }

  /// Build and keep a question for `item` if `mode` allows it.
  fn add(&mut self, item: DrillItem<'d>, question_type: QuestionType, mode: AddMode) -> bool {
    if self.is_full() || item.is_word() != question_type.is_word_question() {
      return false;
    }

    let (stimulus, answer) = if question_type.answer_is_kana() {
      (item.drill_romaji().to_string(), item.kana().to_string())
    } else {
      (item.kana().to_string(), item.drill_romaji().to_string())
    };

    let key = item.key();
    if mode == AddMode::Strict
      && (self.used_items.contains(&key) || self.questions.iter().any(|q| q.stimulus == stimulus))
    {
      return false;
    }
    if mode != AddMode::Bypass {
      let cap = if item.is_word() {
        word_stimulus_cap(self.level)
      } else {
        kana_stimulus_cap(self.level)
      };
      if self.stimulus_uses.get(&stimulus).copied().unwrap_or(0) >= cap {
        return false;
      }
    }

    let options = self.generator.options(&item, question_type, &answer, &mut *self.rng);
    let kind = if item.is_word() { "word" } else { "kana" };
    let question = Question {
      id: format!(
        "q_{}_{}_{}_{:08x}",
        kind,
        question_type.as_str(),
        self.questions.len(),
        self.rng.random::<u32>()
      ),
      stimulus: stimulus.clone(),
      correct_answer: answer,
      options,
      question_type,
      stimulus_type: question_type.stimulus_kind(),
      answer_type: question_type.answer_kind(),
      source: item.to_source(),
    };

    let signature = question.signature();
    if mode != AddMode::Bypass && self.signatures.contains(&signature) {
      return false;
    }
    self.signatures.insert(signature);
    self.used_items.insert(key);
    *self.stimulus_uses.entry(stimulus).or_insert(0) += 1;
    self.questions.push(question);

    match mode {
      AddMode::Strict => self.fill.quota += 1,
      AddMode::Padding => self.fill.padding += 1,
      AddMode::Bypass => self.fill.emergency += 1,
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionSource;
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  fn assemble(dataset: &Dataset, script: Script, line_id: Option<&str>, level: DrillLevel, seed: u64) -> DrillSession {
    let mut rng = StdRng::seed_from_u64(seed);
    let request = DrillRequest { script, line_id, level };
    DrillAssembler::new(dataset, &DrillSettings::default(), request, &mut rng).assemble()
  }

  fn assert_well_formed(session: &DrillSession) {
    for q in &session.questions {
      assert_eq!(q.options.len(), 4, "{:?}", q);
      assert!(q.options.contains(&q.correct_answer), "{:?}", q);
      let distinct: HashSet<&String> = q.options.iter().collect();
      assert_eq!(distinct.len(), 4, "{:?}", q);
      assert!(q.options.iter().all(|o| !o.is_empty()));
    }
  }

  #[test]
  fn test_session_has_configured_length() {
    let dataset = Dataset::builtin();
    let session = assemble(dataset, Script::Hiragana, Some("ka-line"), DrillLevel::Medium, 1);
    assert_eq!(session.questions.len(), 30);
    assert_eq!(session.fill.total(), 30);
    assert_well_formed(&session);
  }

  #[test]
  fn test_stimulus_caps_hold() {
    let dataset = Dataset::builtin();
    let session = assemble(dataset, Script::Hiragana, None, DrillLevel::Medium, 2);
    assert!(session.fill.quota > 0);
    assert_eq!(session.fill.emergency, 0);

    let mut uses: HashMap<(&str, bool), usize> = HashMap::new();
    for q in &session.questions {
      let is_word = matches!(q.source, QuestionSource::Word(_));
      *uses.entry((q.stimulus.as_str(), is_word)).or_insert(0) += 1;
    }
    for ((stimulus, is_word), count) in uses {
      let cap = if is_word { 2 } else { 3 };
      assert!(count <= cap, "{} used {} times", stimulus, count);
    }
  }

  #[test]
  fn test_stimulus_matches_source() {
    let dataset = Dataset::builtin();
    let session = assemble(dataset, Script::Katakana, Some("sa-line"), DrillLevel::Difficult, 3);
    for q in &session.questions {
      match q.question_type {
        QuestionType::KanaToRomaji | QuestionType::WordToRomaji => {
          assert_eq!(q.stimulus, q.source.kana())
        }
        QuestionType::RomajiToKana | QuestionType::RomajiToWord => {
          assert_eq!(q.correct_answer, q.source.kana())
        }
      }
    }
  }

  #[test]
  fn test_same_seed_same_session() {
    let dataset = Dataset::builtin();
    let a = assemble(dataset, Script::Hiragana, Some("ta-line"), DrillLevel::Easy, 42);
    let b = assemble(dataset, Script::Hiragana, Some("ta-line"), DrillLevel::Easy, 42);
    assert_eq!(a.questions, b.questions);
    assert_eq!(a.fill, b.fill);
  }

  #[test]
  fn test_two_kana_line_still_fills() {
    let dataset = crate::testing::two_kana_dataset();
    for level in DrillLevel::ALL {
      let session = assemble(&dataset, Script::Hiragana, Some("starter-line"), level, 7);
      assert_eq!(session.questions.len(), 30);
      assert_well_formed(&session);
      for q in &session.questions {
        if let QuestionSource::Kana(mora) = &q.source {
          assert!(mora.kana == "あ" || mora.kana == "い", "{} is not taught", mora.kana);
        }
      }
    }
  }

  #[test]
  fn test_vocabulary_free_dataset_fills() {
    let dataset = crate::testing::vocabulary_free_dataset();
    let session = assemble(&dataset, Script::Hiragana, Some("starter-line"), DrillLevel::Easy, 9);
    assert_eq!(session.questions.len(), 30);
    assert_well_formed(&session);
  }

  #[test]
  fn test_emergency_fill_ignores_caps() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(5);
    let request = DrillRequest {
      script: Script::Katakana,
      line_id: Some("a-line"),
      level: DrillLevel::Easy,
    };
    let mut assembler = DrillAssembler::new(dataset, &DrillSettings::default(), request, &mut rng);
    assembler.emergency_fill(&QuestionType::ALL);
    assert_eq!(assembler.questions.len(), 30);
    assert_eq!(assembler.fill.emergency, 30);
    assert_eq!(assembler.fill.quota + assembler.fill.padding, 0);

    let session = DrillSession {
      script: Script::Katakana,
      line_id: None,
      level: DrillLevel::Easy,
      questions: assembler.questions,
      fill: assembler.fill,
      generated_at: chrono::Utc::now(),
    };
    assert_well_formed(&session);
  }

  #[test]
  fn test_marks_only_curriculum_uses_last_resort_word() {
    let dataset = crate::testing::marks_only_dataset();
    for level in DrillLevel::ALL {
      let session = assemble(&dataset, Script::Hiragana, Some("sokuon-line"), level, 3);
      assert_eq!(session.questions.len(), 30);
      assert!(session.fill.emergency > 0, "{:?}", session.fill);
      assert_well_formed(&session);

      let words: Vec<&Question> = session.questions.iter().filter(|q| q.question_type.is_word_question()).collect();
      assert!(!words.is_empty());
      assert!(words.iter().all(|q| q.source.kana() == "ねこ"), "{:?}", words);
    }
  }

  #[test]
  fn test_emergency_words_stay_taught() {
    let dataset = crate::testing::two_kana_dataset();
    let mut rng = StdRng::seed_from_u64(6);
    let request = DrillRequest {
      script: Script::Hiragana,
      line_id: Some("starter-line"),
      level: DrillLevel::Medium,
    };
    let taught = cumulative_kana_set(&dataset, Script::Hiragana, LineScope::Line("starter-line"));
    let mut assembler = DrillAssembler::new(&dataset, &DrillSettings::default(), request, &mut rng);
    let mut tiers = assembler.word_tiers(true);
    assert_eq!(tiers.len(), 3);

    let mut draw_rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
      if let Some(DrillItem::Word(word)) = tiers[1].try_next(&mut draw_rng) {
        assert!(word.constituent_kana.iter().all(|k| taught.contains(k.as_str())), "{}", word.kana);
      }
    }
    let fixed = tiers[2].try_next(&mut draw_rng).unwrap();
    assert_eq!(fixed.kana(), "ねこ");
  }

  #[test]
  fn test_configured_total() {
    let dataset = Dataset::builtin();
    let mut settings = DrillSettings::default();
    settings.total_questions = 12;
    let mut rng = StdRng::seed_from_u64(11);
    let request = DrillRequest {
      script: Script::Hiragana,
      line_id: Some("a-line"),
      level: DrillLevel::Easy,
    };
    let session = DrillAssembler::new(dataset, &settings, request, &mut rng).assemble();
    assert_eq!(session.questions.len(), 12);
  }

  #[test]
  fn test_unknown_line_drills_everything() {
    let dataset = Dataset::builtin();
    let session = assemble(dataset, Script::Hiragana, Some("no-such-line"), DrillLevel::Medium, 13);
    assert_eq!(session.questions.len(), 30);
    assert_eq!(session.line_id.as_deref(), Some("no-such-line"));
  }
}
