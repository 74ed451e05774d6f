//! Cumulative curriculum: what a learner has seen up to a given line.

use std::collections::HashSet;

use crate::content::Dataset;
use crate::domain::{KanaLine, Mora, Script};

/// Curriculum scope of a drill: every line, or one line and those before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineScope<'a> {
  Mixed,
  Line(&'a str),
}

impl<'a> LineScope<'a> {
  /// `None` and `"mixed"` mean the whole curriculum.
  pub fn from_line_id(line_id: Option<&'a str>) -> Self {
    match line_id {
      None | Some("mixed") | Some("") => Self::Mixed,
      Some(id) => Self::Line(id),
    }
  }

  pub fn line_id(&self) -> Option<&'a str> {
    match self {
      Self::Mixed => None,
      Self::Line(id) => Some(id),
    }
  }

  /// The line this scope names, when it exists in the dataset.
  pub fn resolve<'d>(&self, dataset: &'d Dataset, script: Script) -> Option<&'d KanaLine> {
    self.line_id().and_then(|id| dataset.line(script, id))
  }
}

impl std::fmt::Display for LineScope<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Mixed => write!(f, "mixed"),
      Self::Line(id) => write!(f, "{}", id),
    }
  }
}

/// Morae taught up to and including the scoped line, in curriculum order.
///
/// The mixed scope, a marks line and an unknown line id all cover the full
/// curriculum. The script's sokuon/chōonpu are always part of the result.
pub fn cumulative_curriculum<'d>(
  dataset: &'d Dataset,
  script: Script,
  scope: LineScope<'_>,
) -> Vec<&'d Mora> {
  let target = match scope.resolve(dataset, script) {
    Some(line) if !dataset.is_marks_line(line) => Some(line.id.as_str()),
    Some(_) => None,
    None => {
      if let LineScope::Line(id) = scope {
        tracing::debug!("Unknown {} line '{}', using the full curriculum", script, id);
      }
      None
    }
  };

  let mut seen = HashSet::new();
  let mut moras = Vec::new();
  let mut push = |mora: &'d Mora| {
    if mora.script == script && seen.insert(mora.kana.as_str()) {
      moras.push(mora);
    }
  };

  for line in dataset.lines(script) {
    if !dataset.is_marks_line(line) {
      for mora in line.kana.iter().filter_map(|k| dataset.mora(k)) {
        push(mora);
      }
    }
    if target == Some(line.id.as_str()) {
      break;
    }
  }
  for mora in dataset.moras_of(script).filter(|m| m.mora_type.is_mark()) {
    push(mora);
  }
  moras
}

/// Kana strings of [`cumulative_curriculum`], for membership checks.
pub fn cumulative_kana_set<'d>(
  dataset: &'d Dataset,
  script: Script,
  scope: LineScope<'_>,
) -> HashSet<&'d str> {
  cumulative_curriculum(dataset, script, scope)
    .into_iter()
    .map(|m| m.kana.as_str())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kana(moras: &[&Mora]) -> Vec<String> {
    moras.iter().map(|m| m.kana.clone()).collect()
  }

  #[test]
  fn test_scope_from_line_id() {
    assert_eq!(LineScope::from_line_id(None), LineScope::Mixed);
    assert_eq!(LineScope::from_line_id(Some("mixed")), LineScope::Mixed);
    assert_eq!(LineScope::from_line_id(Some("ka-line")), LineScope::Line("ka-line"));
    assert_eq!(LineScope::Line("ka-line").to_string(), "ka-line");
  }

  #[test]
  fn test_first_line_plus_marks() {
    let dataset = Dataset::builtin();
    let moras = cumulative_curriculum(dataset, Script::Hiragana, LineScope::Line("a-line"));
    assert_eq!(kana(&moras), vec!["あ", "い", "う", "え", "お", "っ"]);
  }

  #[test]
  fn test_cumulative_includes_earlier_lines() {
    let dataset = Dataset::builtin();
    let set = cumulative_kana_set(dataset, Script::Hiragana, LineScope::Line("sa-line"));
    for k in ["あ", "か", "こ", "さ", "そ", "っ"] {
      assert!(set.contains(k), "missing {}", k);
    }
    for k in ["た", "が", "きゃ"] {
      assert!(!set.contains(k), "leaked {}", k);
    }
  }

  #[test]
  fn test_mixed_and_unknown_cover_everything() {
    let dataset = Dataset::builtin();
    let mixed = cumulative_curriculum(dataset, Script::Katakana, LineScope::Mixed);
    let unknown = cumulative_curriculum(dataset, Script::Katakana, LineScope::Line("no-such-line"));
    assert_eq!(kana(&mixed), kana(&unknown));
    assert!(mixed.iter().any(|m| m.kana == "ー"));
    assert!(mixed.iter().any(|m| m.kana == "ティ"));
    assert!(mixed.iter().all(|m| m.script == Script::Katakana));
  }

  #[test]
  fn test_marks_line_is_full_curriculum() {
    let dataset = Dataset::builtin();
    let marks = cumulative_curriculum(dataset, Script::Hiragana, LineScope::Line("sokuon-line"));
    let mixed = cumulative_curriculum(dataset, Script::Hiragana, LineScope::Mixed);
    assert_eq!(marks.len(), mixed.len());
  }

  #[test]
  fn test_no_duplicates() {
    let dataset = Dataset::builtin();
    let moras = cumulative_curriculum(dataset, Script::Hiragana, LineScope::Mixed);
    let unique: HashSet<_> = moras.iter().map(|m| m.kana.as_str()).collect();
    assert_eq!(unique.len(), moras.len());
  }
}
