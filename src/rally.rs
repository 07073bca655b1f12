use std::collections::BTreeMap;

use crate::strokes::{Split, StrokeRecord};
use crate::{DatasetError, Result};

/// Identifies a rally: (game, set, rally number).
pub type RallyKey<'a> = (&'a str, &'a str, u32);

/// Contiguous run of strokes from a single rally.
#[derive(Clone, Debug)]
pub struct Chunk<'a> {
    pub game: &'a str,
    pub set: &'a str,
    pub rally: u32,
    /// 1-based position of the chunk inside its rally.
    pub index: usize,
    pub strokes: Vec<&'a StrokeRecord>,
}

impl<'a> Chunk<'a> {
    pub fn chunk_id(&self) -> String {
        format!("{}_{}_{}_chunk{}", self.game, self.set, self.rally, self.index)
    }

    /// Inherited from the first stroke; rallies are not expected to mix splits.
    pub fn split(&self) -> Split {
        self.strokes[0].split
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn filenames(&self, extension: &str) -> Vec<String> {
        self.strokes.iter().map(|s| s.filename(extension)).collect()
    }
}

/// Groups strokes by rally and slices each rally into chunks of at most `chunk_size`.
///
/// Rallies come out in ascending (game, set, rally) order; strokes keep their
/// input order inside a rally, the table is never re-sorted.
pub fn partition_rallies(strokes: &[StrokeRecord], chunk_size: usize) -> Result<Vec<Chunk<'_>>> {
    if chunk_size == 0 {
        return Err(DatasetError::Configuration(
            "chunk_size must be at least 1".into(),
        ));
    }

    let mut rallies: BTreeMap<RallyKey<'_>, Vec<&StrokeRecord>> = BTreeMap::new();
    for stroke in strokes {
        rallies
            .entry((stroke.game.as_str(), stroke.set.as_str(), stroke.rally))
            .or_default()
            .push(stroke);
    }

    let mut chunks = Vec::new();
    for ((game, set, rally), members) in rallies {
        for (i, window) in members.chunks(chunk_size).enumerate() {
            chunks.push(Chunk {
                game,
                set,
                rally,
                index: i + 1,
                strokes: window.to_vec(),
            });
        }
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strokes::Player;

    fn stroke(id: &str, rally: u32) -> StrokeRecord {
        StrokeRecord::new(id, Player::Upper, "smash", Some("back"), rally, Split::Train).unwrap()
    }

    #[test]
    fn chunks_respect_size_and_order() {
        let strokes: Vec<_> = (0..7).map(|i| stroke(&format!("g1_s1_{i}"), 3)).collect();
        let chunks = partition_rallies(&strokes, 3).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks.iter().map(Chunk::len).collect::<Vec<_>>(),
            vec![3, 3, 1]
        );
        assert_eq!(chunks[2].chunk_id(), "g1_s1_3_chunk3");

        let rebuilt: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.strokes.iter().map(|s| s.id.as_str()))
            .collect();
        let original: Vec<&str> = strokes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn chunks_never_cross_rallies() {
        // interleaved rows: grouping must not re-sort within a rally
        let strokes = vec![
            stroke("g1_s1_30", 2),
            stroke("g1_s1_10", 1),
            stroke("g1_s1_20", 2),
            stroke("g1_s1_05", 1),
        ];
        let chunks = partition_rallies(&strokes, 5).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].rally, 1);
        assert_eq!(
            chunks[0].strokes.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec!["g1_s1_10", "g1_s1_05"]
        );
        assert_eq!(
            chunks[1].strokes.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec!["g1_s1_30", "g1_s1_20"]
        );
        assert_eq!(chunks[1].filenames("mp4"), vec!["g1_s1_30.mp4", "g1_s1_20.mp4"]);
    }

    #[test]
    fn short_rally_is_one_chunk_and_empty_table_is_empty() {
        let strokes = vec![stroke("g2_s1_1", 9)];
        let chunks = partition_rallies(&strokes, 5).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 1);

        assert!(partition_rallies(&[], 5).unwrap().is_empty());
        assert!(partition_rallies(&strokes, 0).is_err());
    }
}
