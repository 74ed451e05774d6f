//! Plausible non-words assembled from taught kana.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::SYNTHETIC_WORD_ATTEMPTS;
use crate::content::Dataset;
use crate::domain::{Mora, MoraType, Script, Word};
use crate::linguistics::{LineScope, cumulative_curriculum, romanize};

/// Derivation name of words built by [`generate_synthetic_word`]
pub const SYNTHETIC_DERIVATION: &str = "synthetic_for_padding";

/// Build a random non-word of `length` morae from the scope's taught kana.
///
/// Marks, digraphs, small kana and syllabic n are avoided when possible. The
/// result never spells a real vocabulary entry; `None` after repeated
/// collisions or when nothing has been taught.
pub fn generate_synthetic_word<R: Rng + ?Sized>(
  dataset: &Dataset,
  script: Script,
  scope: LineScope<'_>,
  length: usize,
  rng: &mut R,
) -> Option<Word> {
  if length == 0 {
    return None;
  }

  let taught = cumulative_curriculum(dataset, script, scope);
  let mut usable: Vec<&Mora> = taught
    .iter()
    .copied()
    .filter(|m| {
      !m.mora_type.is_mark()
        && !m.mora_type.is_youon()
        && m.mora_type != MoraType::Extended
        && m.mora_type != MoraType::SyllabicN
    })
    .collect();
  if usable.is_empty() {
    usable = taught.into_iter().filter(|m| !m.mora_type.is_mark()).collect();
  }
  if usable.is_empty() {
    return None;
  }

  for _ in 0..SYNTHETIC_WORD_ATTEMPTS {
    let constituents: Vec<String> = (0..length)
      .filter_map(|_| usable.choose(rng).map(|m| m.kana.clone()))
      .collect();
    let kana = constituents.concat();
    if dataset.is_vocabulary(&kana) {
      continue;
    }
    let romaji = romanize(dataset, &constituents);
    let mut word = Word::plausible_non_word(constituents, romaji, None, SYNTHETIC_DERIVATION);
    word.phonetic_profile = Some(dataset.derive_profile(&word.constituent_kana));
    return Some(word);
  }

  tracing::debug!("No synthetic {}-mora {} word after {} attempts", length, script, SYNTHETIC_WORD_ATTEMPTS);
  None
}
