//! Drill session assembly.
//!
//! A session is a fixed number of multiple choice questions for one script,
//! curriculum line and level. Assembly never fails: when the scoped material
//! runs out it widens to review material, synthetic non-words and finally
//! fixed fallback items.

pub mod assembler;
pub mod sources;

pub use assembler::{DrillAssembler, DrillRequest};
pub use sources::{CandidateSource, CyclingPool, FixedItem, LengthPolicy, SyntheticWords};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DrillSettings;
use crate::content::Dataset;
use crate::domain::{DrillLevel, Question, QuestionType, Script};

/// How many questions each assembly phase contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
  pub quota: usize,
  pub padding: usize,
  pub emergency: usize,
}

impl FillReport {
  pub fn total(&self) -> usize {
    self.quota + self.padding + self.emergency
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillSession {
  pub script: Script,
  /// `None` for a mixed drill
  pub line_id: Option<String>,
  pub level: DrillLevel,
  pub questions: Vec<Question>,
  pub fill: FillReport,
  pub generated_at: DateTime<Utc>,
}

impl DrillSession {
  pub fn len(&self) -> usize {
    self.questions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.questions.is_empty()
  }

  pub fn count(&self, question_type: QuestionType) -> usize {
    self.questions
      .iter()
      .filter(|q| q.question_type == question_type)
      .count()
  }
}

/// Assemble a session with default settings and the thread-local random source.
pub fn assemble_drill_session(
  dataset: &Dataset,
  script: Script,
  line_id: Option<&str>,
  level: DrillLevel,
) -> DrillSession {
  let mut rng = rand::rng();
  let request = DrillRequest { script, line_id, level };
  DrillAssembler::new(dataset, &DrillSettings::default(), request, &mut rng).assemble()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_assemble_with_thread_rng() {
    let session = assemble_drill_session(Dataset::builtin(), Script::Katakana, Some("mixed"), DrillLevel::Easy);
    assert_eq!(session.len(), 30);
    assert_eq!(session.line_id, None);
    let total: usize = QuestionType::ALL.iter().map(|t| session.count(*t)).sum();
    assert_eq!(total, 30);
  }

  #[test]
  fn test_session_serializes() {
    let session = assemble_drill_session(Dataset::builtin(), Script::Hiragana, Some("na-line"), DrillLevel::Medium);
    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["script"], "hiragana");
    assert_eq!(json["level"], "medium");
    assert_eq!(json["questions"].as_array().unwrap().len(), 30);
    assert!(json["questions"][0]["question_type"].is_string());
  }
}
