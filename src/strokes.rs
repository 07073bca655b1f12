use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DatasetError, Result};

/// The two sides of the court. Serialized with the labels the stroke table uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    #[serde(rename = "upper player")]
    Upper,
    #[serde(rename = "bottom player")]
    Bottom,
}

impl Player {
    /// Fixed player vocabulary, independent of what the table contains.
    pub const ALL: [Player; 2] = [Player::Upper, Player::Bottom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::Upper => "upper player",
            Player::Bottom => "bottom player",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dataset partition a stroke (and every record generated from it) belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed stroke from the canonical table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrokeRecord {
    pub id: String,
    pub game: String,
    pub set: String,
    pub rally: u32,
    pub player: Player,
    pub stroke_name: String,
    pub hit_area: Option<String>,
    pub split: Split,
}

// csv row shape; extra columns (type, backhand, stroke_LLM, ...) are ignored
#[derive(Debug, Deserialize)]
struct StrokeRow {
    id: String,
    player: Player,
    stroke_name: String,
    #[serde(default)]
    hit_area: Option<String>,
    rally: u32,
    split: Split,
}

impl StrokeRecord {
    /// Builds a record, deriving `game` and `set` from the id.
    pub fn new(
        id: impl Into<String>,
        player: Player,
        stroke_name: impl Into<String>,
        hit_area: Option<&str>,
        rally: u32,
        split: Split,
    ) -> Result<Self> {
        let id = id.into();
        let (game, set) = parse_game_set(&id).ok_or_else(|| DatasetError::MalformedId {
            id: id.clone(),
            line: 0,
        })?;
        Ok(Self {
            game,
            set,
            id,
            rally,
            player,
            stroke_name: stroke_name.into(),
            hit_area: hit_area.map(str::to_owned),
            split,
        })
    }

    /// Media file the clip for this stroke is stored under.
    pub fn filename(&self, extension: &str) -> String {
        format!("{}.{}", self.id, extension)
    }
}

/// Splits `<game>_<set>_...` into its first two segments.
pub fn parse_game_set(id: &str) -> Option<(String, String)> {
    let mut parts = id.split('_');
    let game = parts.next().filter(|s| !s.is_empty())?;
    let set = parts.next().filter(|s| !s.is_empty())?;
    Some((game.to_owned(), set.to_owned()))
}

/// Loads the canonical stroke table from a CSV file.
pub fn load_strokes(path: &Path) -> Result<Vec<StrokeRecord>> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::io(path, e))?;
    read_strokes(file, path)
}

/// Reads canonical stroke rows; `label` only names the source in errors.
pub fn read_strokes<R: Read>(reader: R, label: &Path) -> Result<Vec<StrokeRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| DatasetError::csv(label, e))?
        .clone();

    let mut strokes = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| DatasetError::csv(label, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: StrokeRow = record
            .deserialize(Some(&headers))
            .map_err(|e| DatasetError::csv(label, e))?;

        let (game, set) = parse_game_set(&row.id).ok_or_else(|| DatasetError::MalformedId {
            id: row.id.clone(),
            line,
        })?;
        let hit_area = row.hit_area.filter(|a| !a.trim().is_empty());

        strokes.push(StrokeRecord {
            id: row.id,
            game,
            set,
            rally: row.rally,
            player: row.player,
            stroke_name: row.stroke_name,
            hit_area,
            split: row.split,
        });
    }
    Ok(strokes)
}
