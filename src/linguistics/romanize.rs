//! Hepburn romanization of segmented kana.

use crate::content::Dataset;
use crate::domain::{Mora, MoraType};

const VOWEL_MACRONS: [(char, char); 5] = [('a', 'ā'), ('i', 'ī'), ('u', 'ū'), ('e', 'ē'), ('o', 'ō')];

/// Doubled vowels collapsed after concatenation, applied in this order.
const LONG_VOWELS: [(&str, &str); 6] = [
  ("ou", "ō"),
  ("oo", "ō"),
  ("ee", "ē"),
  ("aa", "ā"),
  ("ii", "ī"),
  ("uu", "ū"),
];

fn macron(vowel: char) -> Option<char> {
  VOWEL_MACRONS
    .iter()
    .find(|(plain, long)| *plain == vowel || *long == vowel)
    .map(|(_, long)| *long)
}

/// Romanize a mora sequence.
///
/// Sokuon doubles the next consonant (`ch` doubles as `t`). Syllabic n becomes
/// `m` before b/p/m and takes an apostrophe before a vowel or y. Chōonpu
/// lengthens the previous vowel. The closing long-vowel pass runs over the
/// whole string, so it also merges vowels across mora boundaries
/// (おお → ō, but also こうえん's ou).
pub fn romanize<S: AsRef<str>>(dataset: &Dataset, tokens: &[S]) -> String {
  let mut romaji = String::new();

  for (i, token) in tokens.iter().enumerate() {
    let token = token.as_ref();
    let Some(mora) = dataset.mora(token) else {
      romaji.push_str(token);
      continue;
    };
    let next = tokens.get(i + 1).and_then(|t| dataset.mora(t.as_ref()));

    match mora.mora_type {
      MoraType::Sokuon => {
        if let Some(consonant) = next.and_then(|n| n.consonant()) {
          if consonant.starts_with("ch") {
            romaji.push('t');
          } else if let Some(first) = consonant.chars().next() {
            romaji.push(first);
          }
        }
      }
      MoraType::SyllabicN => {
        romaji.push(syllabic_n(next));
      }
      MoraType::Choonpu => {
        if let Some(last) = romaji.pop() {
          romaji.push(macron(last.to_ascii_lowercase()).unwrap_or(last));
        }
      }
      _ => romaji.push_str(&mora.romaji),
    }

    if mora.mora_type == MoraType::SyllabicN && needs_apostrophe(next) {
      romaji.push('\'');
    }
  }

  for (long, short) in LONG_VOWELS {
    romaji = romaji.replace(long, short);
  }
  romaji
}

fn syllabic_n(next: Option<&Mora>) -> char {
  let labial = next
    .and_then(|n| n.consonant())
    .and_then(|c| c.chars().next())
    .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'b' | 'p' | 'm'));
  if labial { 'm' } else { 'n' }
}

fn needs_apostrophe(next: Option<&Mora>) -> bool {
  let Some(next) = next else {
    return false;
  };
  if syllabic_n(Some(next)) == 'm' {
    return false;
  }
  let vowel_or_y = next.vowel().is_some() || next.consonant() == Some("y");
  vowel_or_y
    && next
      .romaji
      .chars()
      .next()
      .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'a' | 'i' | 'u' | 'e' | 'o' | 'y'))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::linguistics::segment_kana;

  fn romanize_str(text: &str) -> String {
    let dataset = Dataset::builtin();
    romanize(dataset, &segment_kana(dataset, text))
  }

  #[test]
  fn test_basic_words() {
    assert_eq!(romanize_str("ねこ"), "neko");
    assert_eq!(romanize_str("すし"), "sushi");
    assert_eq!(romanize_str("つくえ"), "tsukue");
  }

  #[test]
  fn test_sokuon_doubles_consonant() {
    assert_eq!(romanize_str("きって"), "kitte");
    assert_eq!(romanize_str("ざっし"), "zasshi");
    assert_eq!(romanize_str("まっちゃ"), "matcha");
  }

  #[test]
  fn test_trailing_sokuon_is_silent() {
    assert_eq!(romanize_str("あっ"), "a");
  }

  #[test]
  fn test_syllabic_n() {
    assert_eq!(romanize_str("しんぶん"), "shimbun");
    assert_eq!(romanize_str("てんぷら"), "tempura");
    assert_eq!(romanize_str("きんえん"), "kin'en");
    assert_eq!(romanize_str("ほんや"), "hon'ya");
    assert_eq!(romanize_str("ほん"), "hon");
    assert_eq!(romanize_str("かんじ"), "kanji");
  }

  #[test]
  fn test_choonpu_macron() {
    assert_eq!(romanize_str("コーヒー"), "kōhī");
    assert_eq!(romanize_str("ケーキ"), "kēki");
    // no preceding vowel: nothing to lengthen
    assert_eq!(romanize_str("ー"), "");
  }

  #[test]
  fn test_long_vowel_post_pass() {
    assert_eq!(romanize_str("がっこう"), "gakkō");
    assert_eq!(romanize_str("おかあさん"), "okāsan");
    assert_eq!(romanize_str("おおきい"), "ōkī");
  }

  #[test]
  fn test_post_pass_merges_across_boundaries() {
    // こ + お are two morae of separate elements, still collapsed
    assert_eq!(romanize_str("ここお"), "kokō");
    assert_eq!(romanize_str("いいえ"), "īe");
  }

  #[test]
  fn test_unknown_tokens_pass_through() {
    let dataset = Dataset::builtin();
    assert_eq!(romanize(dataset, &["ね", "X", "こ"]), "neXko");
  }
}
