use std::collections::HashSet;

use crate::strokes::{Player, StrokeRecord};

/// Global vocabularies the negative sampler draws complements from.
///
/// Built once over the whole table, then only read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    pub players: [Player; 2],
    /// Distinct stroke names, first-appearance order.
    pub strokes: Vec<String>,
    /// Distinct non-missing hit areas, first-appearance order.
    pub hit_areas: Vec<String>,
}

impl Vocabulary {
    pub fn from_strokes(strokes: &[StrokeRecord]) -> Self {
        Self {
            players: Player::ALL,
            strokes: distinct(strokes.iter().map(|s| s.stroke_name.as_str())),
            hit_areas: distinct(strokes.iter().filter_map(|s| s.hit_area.as_deref())),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_owned)
        .collect()
}
