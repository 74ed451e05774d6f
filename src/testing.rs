//! Test fixtures built from the embedded tables.

use crate::content::Dataset;
use crate::content::dataset::{BUILTIN_MORAS, BUILTIN_SIMILARITIES, BUILTIN_VOCABULARY};

/// Lines of a curriculum whose first unit teaches only two kana.
const TWO_KANA_LINES: &str = r#"{
    "hiragana": [
        {"id": "starter-line", "name": "Starter (あい)", "kana": ["あ", "い"]},
        {"id": "ka-line", "name": "Ka-line (かきくけこ)", "kana": ["か", "き", "く", "け", "こ"]}
    ],
    "katakana": [
        {"id": "starter-line", "name": "Starter (アイ)", "kana": ["ア", "イ"]}
    ]
}"#;

/// Full mora table and vocabulary with a curriculum that opens on a
/// two-kana line.
pub fn two_kana_dataset() -> Dataset {
    match Dataset::from_json(BUILTIN_MORAS, TWO_KANA_LINES, BUILTIN_VOCABULARY, BUILTIN_SIMILARITIES) {
        Ok(dataset) => dataset,
        Err(e) => panic!("two-kana fixture is invalid: {}", e),
    }
}

/// A dataset with one hiragana line and no vocabulary at all.
pub fn vocabulary_free_dataset() -> Dataset {
    let lines = r#"{"hiragana": [{"id": "starter-line", "name": "Starter", "kana": ["あ", "い"]}]}"#;
    match Dataset::from_json(BUILTIN_MORAS, lines, "{}", "{}") {
        Ok(dataset) => dataset,
        Err(e) => panic!("vocabulary-free fixture is invalid: {}", e),
    }
}

/// A hiragana curriculum that teaches nothing but the sokuon, without
/// vocabulary, so no word can be built from taught kana.
pub fn marks_only_dataset() -> Dataset {
    let lines = r#"{"hiragana": [{"id": "sokuon-line", "name": "Sokuon (っ)", "kana": ["っ"]}]}"#;
    match Dataset::from_json(BUILTIN_MORAS, lines, "{}", "{}") {
        Ok(dataset) => dataset,
        Err(e) => panic!("marks-only fixture is invalid: {}", e),
    }
}
