//! Single-step, length-preserving mutations of a mora sequence.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::DistractorGenerator;
use crate::content::Dataset;
use crate::domain::{Mora, MoraType, Script};
use crate::pools::{KanaPoolOptions, kana_pool};

/// Look-alikes considered by a visual swap, strongest first
const VISUAL_SWAP_TOP: usize = 3;

/// One way of turning a word into a plausible misspelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
  Substitution,
  VoicingToggle,
  VisualSwap,
  Transposition,
  YouonSwap,
  ConsonantSwap,
  VowelSwap,
  SokuonConsonant,
  ChoonpuToVowel,
  VowelToChoonpu,
}

impl Mutation {
  pub const ALL: [Mutation; 10] = [
    Mutation::Substitution,
    Mutation::VoicingToggle,
    Mutation::VisualSwap,
    Mutation::Transposition,
    Mutation::YouonSwap,
    Mutation::ConsonantSwap,
    Mutation::VowelSwap,
    Mutation::SokuonConsonant,
    Mutation::ChoonpuToVowel,
    Mutation::VowelToChoonpu,
  ];

  /// Derivation name recorded on mutated non-words.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Substitution => "substitution",
      Self::VoicingToggle => "voicing_toggle",
      Self::VisualSwap => "visual_swap",
      Self::Transposition => "transposition",
      Self::YouonSwap => "youon_swap",
      Self::ConsonantSwap => "consonant_swap",
      Self::VowelSwap => "vowel_swap",
      Self::SokuonConsonant => "sokuon_consonant",
      Self::ChoonpuToVowel => "choonpu_to_vowel",
      Self::VowelToChoonpu => "vowel_to_choonpu",
    }
  }

  /// Chōonpu conversions only exist in katakana.
  pub fn applies_to(&self, script: Script) -> bool {
    match self {
      Self::ChoonpuToVowel | Self::VowelToChoonpu => script == Script::Katakana,
      _ => true,
    }
  }

  /// Mutate a copy of `constituents`, or `None` when the mutation does not apply.
  pub fn apply<R: Rng + ?Sized>(
    &self,
    generator: &DistractorGenerator<'_>,
    constituents: &[String],
    rng: &mut R,
  ) -> Option<Vec<String>> {
    if constituents.is_empty() || !self.applies_to(generator.script) {
      return None;
    }
    let dataset = generator.dataset;
    let script = generator.script;

    match self {
      Self::Substitution => {
        let idx = rng.random_range(0..constituents.len());
        let original = dataset.mora(&constituents[idx])?;
        let options = KanaPoolOptions {
          context: Some(original),
          ..Default::default()
        };
        let pool = kana_pool(dataset, script, generator.scope, generator.level, options, rng);
        let candidates: Vec<&Mora> = pool
          .into_iter()
          .filter(|m| m.kana != original.kana && !m.mora_type.is_mark())
          .collect();
        replace_at(constituents, idx, candidates.choose(rng)?)
      }
      Self::VoicingToggle => {
        let idx = rng.random_range(0..constituents.len());
        let original = dataset.mora(&constituents[idx])?;
        replace_at(constituents, idx, voicing_variant(dataset, original, rng)?)
      }
      Self::VisualSwap => {
        let idx = rng.random_range(0..constituents.len());
        let original = dataset.mora(&constituents[idx])?;
        replace_at(constituents, idx, visual_swap(dataset, original, rng)?)
      }
      Self::Transposition => {
        if constituents.len() < 2 {
          return None;
        }
        let idx = rng.random_range(0..constituents.len() - 1);
        if constituents[idx] == constituents[idx + 1] {
          return None;
        }
        let mut mutated = constituents.to_vec();
        mutated.swap(idx, idx + 1);
        Some(mutated)
      }
      Self::YouonSwap => youon_swap(dataset, script, constituents, rng),
      Self::ConsonantSwap | Self::VowelSwap => {
        let eligible: Vec<usize> = (0..constituents.len())
          .filter(|&i| dataset.mora(&constituents[i]).is_some_and(swappable))
          .collect();
        let idx = *eligible.choose(rng)?;
        let original = dataset.mora(&constituents[idx])?;
        let keep_vowel = *self == Self::ConsonantSwap;
        let candidates: Vec<&Mora> = dataset
          .moras_of(script)
          .filter(|m| m.mora_type == MoraType::Basic && m.kana != original.kana)
          .filter(|m| {
            if keep_vowel {
              original.vowel().is_some()
                && m.vowel() == original.vowel()
                && m.consonant().is_some()
                && m.consonant() != original.consonant()
            } else {
              original.consonant().is_some()
                && m.consonant() == original.consonant()
                && m.vowel() != original.vowel()
            }
          })
          .collect();
        replace_at(constituents, idx, candidates.choose(rng)?)
      }
      Self::SokuonConsonant => sokuon_consonant(dataset, script, constituents, rng),
      Self::ChoonpuToVowel => {
        let i = (0..constituents.len() - 1).find(|&i| {
          dataset.mora(&constituents[i + 1]).is_some_and(|m| m.mora_type == MoraType::Choonpu)
            && dataset.mora(&constituents[i]).is_some_and(|m| m.vowel().is_some())
        })?;
        let vowel = dataset.mora(&constituents[i])?.vowel()?;
        let vowel_kana = dataset
          .moras_of(script)
          .find(|m| m.is_pure_vowel() && m.romaji == vowel)?;
        replace_at(constituents, i + 1, vowel_kana)
      }
      Self::VowelToChoonpu => {
        let i = (0..constituents.len() - 1).find(|&i| {
          let (Some(first), Some(second)) =
            (dataset.mora(&constituents[i]), dataset.mora(&constituents[i + 1]))
          else {
            return false;
          };
          second.is_pure_vowel() && first.vowel() == Some(second.romaji.as_str())
        })?;
        let choonpu = dataset
          .moras_of(script)
          .find(|m| m.mora_type == MoraType::Choonpu)?;
        replace_at(constituents, i + 1, choonpu)
      }
    }
  }
}

fn replace_at(constituents: &[String], idx: usize, with: &Mora) -> Option<Vec<String>> {
  if constituents[idx] == with.kana {
    return None;
  }
  let mut mutated = constituents.to_vec();
  mutated[idx] = with.kana.clone();
  Some(mutated)
}

/// Plain morae with an onset, the targets of consonant and vowel swaps.
fn swappable(mora: &Mora) -> bool {
  mora.consonant().is_some()
    && !mora.mora_type.is_mark()
    && !mora.mora_type.is_youon()
    && mora.mora_type != MoraType::SyllabicN
}

/// Another member of the mora's voicing family (か↔が, は↔ば↔ぱ, きゃ↔ぎゃ).
pub fn voicing_variant<'d, R: Rng + ?Sized>(
  dataset: &'d Dataset,
  mora: &Mora,
  rng: &mut R,
) -> Option<&'d Mora> {
  if !(mora.mora_type.is_gojuon() || mora.mora_type.is_youon()) {
    return None;
  }
  let head = mora.family_head();
  let family: Vec<&Mora> = dataset
    .moras_of(mora.script)
    .filter(|m| m.kana != mora.kana && m.family_head() == head)
    .filter(|m| m.mora_type.is_gojuon() || m.mora_type.is_youon())
    .collect();
  family.choose(rng).copied()
}

/// One of the strongest look-alikes of the mora.
pub fn visual_swap<'d, R: Rng + ?Sized>(
  dataset: &'d Dataset,
  mora: &Mora,
  rng: &mut R,
) -> Option<&'d Mora> {
  let similar = dataset.similar_kana(mora.script, &mora.kana);
  let top = &similar[..similar.len().min(VISUAL_SWAP_TOP)];
  let pick = top.choose(rng)?;
  dataset
    .mora(&pick.similar_kana)
    .filter(|m| m.script == mora.script)
}

/// Replace the small kana of the first yōon with another small kana.
fn youon_swap<R: Rng + ?Sized>(
  dataset: &Dataset,
  script: Script,
  constituents: &[String],
  rng: &mut R,
) -> Option<Vec<String>> {
  let (idx, youon) = constituents.iter().enumerate().find_map(|(i, k)| {
    dataset
      .mora(k)
      .filter(|m| m.mora_type == MoraType::YouonY && m.constituent_kana.is_some())
      .map(|m| (i, m))
  })?;
  let parts = youon.constituent_kana.as_ref()?;
  let (lead, small) = (parts.first()?, parts.get(1)?);

  // Digraphs sharing the lead character but ending in another small kana.
  let candidates: Vec<&Mora> = dataset
    .moras_of(script)
    .filter(|m| m.mora_type == MoraType::YouonY && m.kana != youon.kana)
    .filter(|m| {
      m.constituent_kana
        .as_ref()
        .is_some_and(|c| c.first() == Some(lead) && c.get(1).is_some_and(|s| s != small))
    })
    .collect();
  replace_at(constituents, idx, candidates.choose(rng)?)
}

/// Change the consonant doubled by the first sokuon.
fn sokuon_consonant<R: Rng + ?Sized>(
  dataset: &Dataset,
  script: Script,
  constituents: &[String],
  rng: &mut R,
) -> Option<Vec<String>> {
  let idx = constituents
    .iter()
    .position(|k| dataset.mora(k).is_some_and(|m| m.mora_type == MoraType::Sokuon))?;
  let next = dataset.mora(constituents.get(idx + 1)?)?;
  let consonant = next.consonant()?;
  let initial = consonant.chars().next();

  let mut candidates: Vec<&Mora> = Vec::new();
  candidates.extend(voicing_variant(dataset, next, rng));
  candidates.extend(
    dataset
      .similar_kana(script, &next.kana)
      .iter()
      .filter_map(|s| dataset.mora(&s.similar_kana))
      .filter(|m| m.consonant().and_then(|c| c.chars().next()) == initial),
  );
  candidates.extend(dataset.moras_of(script).filter(|m| {
    m.vowel() == next.vowel() && m.consonant().is_some() && m.consonant() != Some(consonant)
  }));
  candidates.retain(|m| m.kana != next.kana);
  replace_at(constituents, idx + 1, candidates.choose(rng)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::DrillLevel;
  use crate::linguistics::LineScope;
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  fn strings(kana: &[&str]) -> Vec<String> {
    kana.iter().map(|k| k.to_string()).collect()
  }

  fn generator(script: Script) -> DistractorGenerator<'static> {
    DistractorGenerator::new(Dataset::builtin(), script, LineScope::Mixed, DrillLevel::Medium)
  }

  #[test]
  fn test_derivation_names() {
    assert_eq!(Mutation::VoicingToggle.as_str(), "voicing_toggle");
    assert_eq!(Mutation::ChoonpuToVowel.as_str(), "choonpu_to_vowel");
    assert!(!Mutation::VowelToChoonpu.applies_to(Script::Hiragana));
    assert!(Mutation::Transposition.applies_to(Script::Hiragana));
  }

  #[test]
  fn test_voicing_variant_stays_in_family() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(1);
    let ha = dataset.mora("は").unwrap();
    for _ in 0..20 {
      let variant = voicing_variant(dataset, ha, &mut rng).unwrap();
      assert!(["ば", "ぱ"].contains(&variant.kana.as_str()));
    }
    let ga = dataset.mora("が").unwrap();
    assert_eq!(voicing_variant(dataset, ga, &mut rng).unwrap().kana, "か");
    assert!(voicing_variant(dataset, dataset.mora("あ").unwrap(), &mut rng).is_none());
    assert!(voicing_variant(dataset, dataset.mora("っ").unwrap(), &mut rng).is_none());
  }

  #[test]
  fn test_visual_swap_uses_top_matches() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(2);
    let sa = dataset.mora("さ").unwrap();
    let top: Vec<&str> = dataset
      .similar_kana(Script::Hiragana, "さ")
      .iter()
      .take(3)
      .map(|s| s.similar_kana.as_str())
      .collect();
    for _ in 0..10 {
      let swapped = visual_swap(dataset, sa, &mut rng).unwrap();
      assert!(top.contains(&swapped.kana.as_str()));
    }
  }

  #[test]
  fn test_transposition() {
    let mut rng = StdRng::seed_from_u64(3);
    let g = generator(Script::Hiragana);
    let mutated = Mutation::Transposition.apply(&g, &strings(&["ね", "こ"]), &mut rng).unwrap();
    assert_eq!(mutated, strings(&["こ", "ね"]));
    assert!(Mutation::Transposition.apply(&g, &strings(&["こ", "こ"]), &mut rng).is_none());
    assert!(Mutation::Transposition.apply(&g, &strings(&["こ"]), &mut rng).is_none());
  }

  #[test]
  fn test_youon_swap_keeps_lead() {
    let mut rng = StdRng::seed_from_u64(4);
    let g = generator(Script::Hiragana);
    let mutated = Mutation::YouonSwap.apply(&g, &strings(&["きゃ", "く"]), &mut rng).unwrap();
    assert!(["きゅ", "きょ"].contains(&mutated[0].as_str()));
    assert_eq!(mutated[1], "く");

    let g = generator(Script::Katakana);
    let mutated = Mutation::YouonSwap.apply(&g, &strings(&["シャ", "ツ"]), &mut rng).unwrap();
    assert!(["シュ", "ショ"].contains(&mutated[0].as_str()));
  }

  #[test]
  fn test_consonant_and_vowel_swaps() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(5);
    let g = generator(Script::Hiragana);
    for _ in 0..10 {
      let mutated = Mutation::ConsonantSwap.apply(&g, &strings(&["ね"]), &mut rng).unwrap();
      let mora = dataset.mora(&mutated[0]).unwrap();
      assert_eq!(mora.vowel(), Some("e"));
      assert_ne!(mora.kana, "ね");

      let mutated = Mutation::VowelSwap.apply(&g, &strings(&["ね"]), &mut rng).unwrap();
      let mora = dataset.mora(&mutated[0]).unwrap();
      assert_eq!(mora.consonant(), Some("n"));
      assert_ne!(mora.kana, "ね");
    }
    // pure vowels have no onset to swap
    assert!(Mutation::ConsonantSwap.apply(&g, &strings(&["あ", "い"]), &mut rng).is_none());
  }

  #[test]
  fn test_sokuon_consonant_changes_following_mora() {
    let mut rng = StdRng::seed_from_u64(6);
    let g = generator(Script::Hiragana);
    let original = strings(&["き", "っ", "て"]);
    let mutated = Mutation::SokuonConsonant.apply(&g, &original, &mut rng).unwrap();
    assert_eq!(&mutated[..2], &original[..2]);
    assert_ne!(mutated[2], "て");
    assert!(Mutation::SokuonConsonant.apply(&g, &strings(&["あ", "っ"]), &mut rng).is_none());
  }

  #[test]
  fn test_choonpu_conversions() {
    let mut rng = StdRng::seed_from_u64(7);
    let g = generator(Script::Katakana);
    let mutated = Mutation::ChoonpuToVowel.apply(&g, &strings(&["ケ", "ー", "キ"]), &mut rng).unwrap();
    assert_eq!(mutated, strings(&["ケ", "エ", "キ"]));
    let mutated = Mutation::VowelToChoonpu.apply(&g, &strings(&["ケ", "エ", "キ"]), &mut rng).unwrap();
    assert_eq!(mutated, strings(&["ケ", "ー", "キ"]));

    let hiragana = generator(Script::Hiragana);
    assert!(Mutation::VowelToChoonpu.apply(&hiragana, &strings(&["け", "え"]), &mut rng).is_none());
  }

  #[test]
  fn test_substitution_uses_taught_kana() {
    let dataset = Dataset::builtin();
    let mut rng = StdRng::seed_from_u64(8);
    let g = DistractorGenerator::new(dataset, Script::Hiragana, LineScope::Line("ka-line"), DrillLevel::Easy);
    let taught = crate::linguistics::cumulative_kana_set(dataset, Script::Hiragana, LineScope::Line("ka-line"));
    for _ in 0..10 {
      let mutated = Mutation::Substitution.apply(&g, &strings(&["か", "お"]), &mut rng).unwrap();
      assert!(mutated.iter().all(|k| taught.contains(k.as_str())));
      assert_ne!(mutated, strings(&["か", "お"]));
    }
  }
}
