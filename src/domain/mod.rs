pub mod mora;
pub mod question;
pub mod word;

pub use mora::{KanaLine, Mora, MoraType, Script, Similarity};
pub use question::{
  DrillItem, DrillLevel, DrillStats, ItemKey, Question, QuestionSource, QuestionType, UnitKind,
};
pub use word::{NonWordProvenance, PhoneticProfile, PhoneticProfileFilter, Word};
