//! Maze quest: walk a grid, collect the kana of a word in order, then reach
//! the exit.
//!
//! Levels reference their words by kana; the words are resolved against the
//! shared vocabulary when the levels are loaded.

use serde::{Deserialize, Serialize};

use crate::content::Dataset;
use crate::domain::{Script, Word};

pub const BUILTIN_MAZE_LEVELS: &str = include_str!("../data/maze_levels.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
  Start,
  Path,
  Wall,
  Exit,
}

impl Tile {
  fn from_char(c: char) -> Option<Self> {
    match c {
      'S' => Some(Self::Start),
      'P' => Some(Self::Path),
      'W' => Some(Self::Wall),
      'E' => Some(Self::Exit),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
  pub x: usize,
  pub y: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanaSpot {
  pub kana: String,
  pub x: usize,
  pub y: usize,
}

impl KanaSpot {
  fn position(&self) -> Position {
    Position { x: self.x, y: self.y }
  }
}

/// Level record as stored in the JSON table.
#[derive(Debug, Deserialize)]
struct MazeLevelRecord {
  level_num: u32,
  layout: Vec<String>,
  words: Vec<String>,
  kana_spots: Vec<KanaSpot>,
  #[serde(default)]
  message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MazeLevel {
  pub level_num: u32,
  /// Rows of tiles, top row first
  pub layout: Vec<Vec<Tile>>,
  /// Words to form, in order
  pub words: Vec<Word>,
  pub kana_spots: Vec<KanaSpot>,
  pub message: Option<String>,
  pub start: Position,
}

impl MazeLevel {
  pub fn tile(&self, position: Position) -> Option<Tile> {
    self.layout.get(position.y)?.get(position.x).copied()
  }

  pub fn spot_at(&self, position: Position) -> Option<&KanaSpot> {
    self.kana_spots.iter().find(|s| s.position() == position)
  }
}

#[derive(Debug)]
pub enum MazeError {
  Parse(serde_json::Error),
  InvalidTile { level: u32, tile: char },
  MissingStart(u32),
  NoWords(u32),
  UnknownWord { level: u32, kana: String },
  BadSpot { level: u32, kana: String },
}

impl std::fmt::Display for MazeError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      MazeError::Parse(e) => write!(f, "Malformed maze levels: {}", e),
      MazeError::InvalidTile { level, tile } => write!(f, "Level {}: unknown tile '{}'", level, tile),
      MazeError::MissingStart(level) => write!(f, "Level {} has no start tile", level),
      MazeError::NoWords(level) => write!(f, "Level {} has no words", level),
      MazeError::UnknownWord { level, kana } => {
        write!(f, "Level {}: '{}' is not in the vocabulary", level, kana)
      }
      MazeError::BadSpot { level, kana } => {
        write!(f, "Level {}: kana spot '{}' is outside the maze or on a wall", level, kana)
      }
    }
  }
}

impl std::error::Error for MazeError {}

impl From<serde_json::Error> for MazeError {
  fn from(e: serde_json::Error) -> Self {
    MazeError::Parse(e)
  }
}

/// Parse and resolve a maze level table.
pub fn load_maze_levels(dataset: &Dataset, json: &str) -> Result<Vec<MazeLevel>, MazeError> {
  let records: Vec<MazeLevelRecord> = serde_json::from_str(json)?;
  records.into_iter().map(|r| resolve_level(dataset, r)).collect()
}

pub fn builtin_maze_levels(dataset: &Dataset) -> Result<Vec<MazeLevel>, MazeError> {
  load_maze_levels(dataset, BUILTIN_MAZE_LEVELS)
}

fn resolve_level(dataset: &Dataset, record: MazeLevelRecord) -> Result<MazeLevel, MazeError> {
  let level = record.level_num;

  let mut layout = Vec::with_capacity(record.layout.len());
  let mut start = None;
  for (y, row) in record.layout.iter().enumerate() {
    let mut tiles = Vec::with_capacity(row.len());
    for (x, c) in row.chars().enumerate() {
      let tile = Tile::from_char(c).ok_or(MazeError::InvalidTile { level, tile: c })?;
      if tile == Tile::Start && start.is_none() {
        start = Some(Position { x, y });
      }
      tiles.push(tile);
    }
    layout.push(tiles);
  }
  let start = start.ok_or(MazeError::MissingStart(level))?;

  if record.words.is_empty() {
    return Err(MazeError::NoWords(level));
  }
  let words = record
    .words
    .iter()
    .map(|kana| {
      Script::ALL
        .iter()
        .find_map(|&script| dataset.vocabulary_word(script, kana))
        .cloned()
        .ok_or_else(|| MazeError::UnknownWord {
          level,
          kana: kana.clone(),
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

  let resolved = MazeLevel {
    level_num: level,
    layout,
    words,
    kana_spots: record.kana_spots,
    message: record.message,
    start,
  };
  for spot in &resolved.kana_spots {
    match resolved.tile(spot.position()) {
      None | Some(Tile::Wall) => {
        return Err(MazeError::BadSpot {
          level,
          kana: spot.kana.clone(),
        });
      }
      _ => {}
    }
  }
  Ok(resolved)
}

/// Result of one move attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
  OutOfBounds,
  Wall,
  Moved,
  Collected { kana: String, next: String },
  WrongKana { found: String, needed: String },
  WordFormed { word: String, next_word: Option<String> },
  LevelComplete { level_num: u32 },
}

impl MoveOutcome {
  /// Feedback shown to the player.
  pub fn message(&self) -> String {
    match self {
      MoveOutcome::OutOfBounds => "Cannot move out of bounds.".to_string(),
      MoveOutcome::Wall => "Ouch! A wall.".to_string(),
      MoveOutcome::Moved => String::new(),
      MoveOutcome::Collected { kana, next } => format!("Collected {}! Next: {}", kana, next),
      MoveOutcome::WrongKana { found, needed } => {
        format!("That's {}, but you need {} next.", found, needed)
      }
      MoveOutcome::WordFormed { word, next_word: None } => {
        format!("Word \"{}\" formed! Head to the Exit (E).", word)
      }
      MoveOutcome::WordFormed {
        word,
        next_word: Some(next),
      } => format!("Word \"{}\" formed! Next word: {}", word, next),
      MoveOutcome::LevelComplete { level_num } => format!("Level {} Complete! 🎉", level_num),
    }
  }

  /// True if the player changed position.
  pub fn moved(&self) -> bool {
    !matches!(self, MoveOutcome::OutOfBounds | MoveOutcome::Wall)
  }
}

/// Play state of one maze level.
#[derive(Debug, Clone)]
pub struct MazeGame<'l> {
  level: &'l MazeLevel,
  position: Position,
  word_index: usize,
  collected: Vec<String>,
  collected_spots: Vec<Position>,
  complete: bool,
  message: String,
}

impl<'l> MazeGame<'l> {
  pub fn new(level: &'l MazeLevel) -> Self {
    let message = level.message.clone().unwrap_or_else(|| {
      let first = level.words.first().map(|w| w.kana.as_str()).unwrap_or_default();
      format!("Collect kana to form: {}", first)
    });
    Self {
      level,
      position: level.start,
      word_index: 0,
      collected: Vec::new(),
      collected_spots: Vec::new(),
      complete: false,
      message,
    }
  }

  pub fn level(&self) -> &MazeLevel {
    self.level
  }

  pub fn position(&self) -> Position {
    self.position
  }

  pub fn collected(&self) -> &[String] {
    &self.collected
  }

  pub fn target_word(&self) -> Option<&Word> {
    self.level.words.get(self.word_index)
  }

  /// All words formed; the exit is open.
  pub fn words_formed(&self) -> bool {
    self.word_index >= self.level.words.len()
  }

  pub fn is_complete(&self) -> bool {
    self.complete
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  /// Move by one step. Walls and the maze edge block the move.
  pub fn attempt_move(&mut self, dx: i32, dy: i32) -> MoveOutcome {
    let outcome = self.step(dx, dy);
    self.message = outcome.message();
    outcome
  }

  fn step(&mut self, dx: i32, dy: i32) -> MoveOutcome {
    if self.complete {
      return MoveOutcome::LevelComplete {
        level_num: self.level.level_num,
      };
    }

    let target = match (offset(self.position.x, dx), offset(self.position.y, dy)) {
      (Some(x), Some(y)) => Position { x, y },
      _ => return MoveOutcome::OutOfBounds,
    };
    let tile = match self.level.tile(target) {
      Some(tile) => tile,
      None => return MoveOutcome::OutOfBounds,
    };
    if tile == Tile::Wall {
      return MoveOutcome::Wall;
    }
    self.position = target;

    let level = self.level;
    let mut outcome = MoveOutcome::Moved;
    if let Some(spot) = level.spot_at(target) {
      outcome = self.collect(spot);
    }

    if tile == Tile::Exit && self.words_formed() {
      self.complete = true;
      tracing::debug!("Maze level {} complete", self.level.level_num);
      return MoveOutcome::LevelComplete {
        level_num: self.level.level_num,
      };
    }
    outcome
  }

  fn collect(&mut self, spot: &KanaSpot) -> MoveOutcome {
    let level = self.level;
    let Some(word) = level.words.get(self.word_index) else {
      return MoveOutcome::Moved;
    };
    let needed = match word.constituent_kana.get(self.collected.len()) {
      Some(kana) => kana,
      None => return MoveOutcome::Moved,
    };
    if spot.kana != *needed {
      // spot already used for the current word
      if self.collected_spots.contains(&spot.position()) {
        return MoveOutcome::Moved;
      }
      return MoveOutcome::WrongKana {
        found: spot.kana.clone(),
        needed: needed.clone(),
      };
    }

    self.collected.push(spot.kana.clone());
    self.collected_spots.push(spot.position());

    if let Some(next) = word.constituent_kana.get(self.collected.len()) {
      return MoveOutcome::Collected {
        kana: spot.kana.clone(),
        next: next.clone(),
      };
    }

    let formed = word.kana.clone();
    self.word_index += 1;
    self.collected.clear();
    self.collected_spots.clear();
    MoveOutcome::WordFormed {
      word: formed,
      next_word: self.target_word().map(|w| w.kana.clone()),
    }
  }
}

fn offset(value: usize, delta: i32) -> Option<usize> {
  if delta.is_negative() {
    value.checked_sub(delta.unsigned_abs() as usize)
  } else {
    value.checked_add(delta as usize)
  }
}
