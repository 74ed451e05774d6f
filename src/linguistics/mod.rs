//! Lookup layer: pure accessors over the dataset.
//!
//! Unknown characters are never an error here. Lookups return `None` and the
//! tokenizer passes unmatched characters through as single tokens.

pub mod curriculum;
pub mod romanize;

pub use curriculum::{LineScope, cumulative_curriculum, cumulative_kana_set};
pub use romanize::romanize;

use unicode_normalization::UnicodeNormalization;

use crate::content::Dataset;
use crate::domain::Mora;

/// NFC-normalize kana so decomposed dakuten match the composed mora.
pub fn normalize(text: &str) -> String {
  text.nfc().collect()
}

pub fn lookup_mora<'d>(dataset: &'d Dataset, kana: &str) -> Option<&'d Mora> {
  dataset.mora(kana)
}

/// Split a kana string into morae, longest match first.
///
/// Digraphs such as きゃ win over き + ゃ. Characters with no mora entry come
/// back as singleton tokens.
pub fn segment_kana(dataset: &Dataset, text: &str) -> Vec<String> {
  let text = normalize(text);
  let chars: Vec<char> = text.chars().collect();
  let mut tokens = Vec::new();
  let mut i = 0;

  while i < chars.len() {
    let max = dataset.longest_kana().min(chars.len() - i);
    let matched = (1..=max).rev().find_map(|len| {
      let candidate: String = chars[i..i + len].iter().collect();
      dataset.mora(&candidate).map(|_| (candidate, len))
    });

    match matched {
      Some((token, len)) => {
        tokens.push(token);
        i += len;
      }
      None => {
        tokens.push(chars[i].to_string());
        i += 1;
      }
    }
  }
  tokens
}

/// Join morae back into kana and romanize them.
pub fn reconstruct_word<S: AsRef<str>>(dataset: &Dataset, tokens: &[S]) -> (String, String) {
  let kana: String = tokens.iter().map(AsRef::as_ref).collect();
  (kana, romanize(dataset, tokens))
}
