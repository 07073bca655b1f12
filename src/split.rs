use log::info;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::config::SplitConfig;
use crate::generator::{QaEntry, QaRecord};
use crate::strokes::Split;
use crate::Result;

/// Final train/val lists with the `split` tag stripped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitOutcome {
    pub train: Vec<QaEntry>,
    pub val: Vec<QaEntry>,
    /// How many val records were reallocated to train.
    pub moved: usize,
}

/// Partitions records by their split tag, then moves a seeded random
/// `val_to_train_ratio` share of val into train.
///
/// Moved records are appended to train in draw order; the remaining val
/// records keep their input order. Same input, seed and ratio give the
/// same outcome.
pub fn split_by_field(records: Vec<QaRecord>, config: &SplitConfig) -> Result<SplitOutcome> {
    config.validate()?;

    let mut train = Vec::new();
    let mut val = Vec::new();
    for record in records {
        match record.split {
            Split::Train => train.push(record.entry),
            Split::Val => val.push(record.entry),
        }
    }

    let n_move = (val.len() as f64 * config.val_to_train_ratio).floor() as usize;
    if n_move == 0 {
        return Ok(SplitOutcome {
            train,
            val,
            moved: 0,
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let picked = index::sample(&mut rng, val.len(), n_move).into_vec();

    let mut slots: Vec<Option<QaEntry>> = val.into_iter().map(Some).collect();
    for i in &picked {
        if let Some(entry) = slots[*i].take() {
            train.push(entry);
        }
    }
    let val: Vec<QaEntry> = slots.into_iter().flatten().collect();

    info!(
        "moved {} val records into train (ratio {}, seed {})",
        n_move, config.val_to_train_ratio, config.seed
    );
    Ok(SplitOutcome {
        train,
        val,
        moved: n_move,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, split: Split) -> QaRecord {
        QaRecord {
            entry: QaEntry {
                question_id: id,
                image: vec![format!("g_s_{id}.mp4")],
                question: format!("question {id}"),
                answer: "The event does not occur".into(),
                is_impossible: true,
                chunk_id: "g_s_1_chunk1".into(),
            },
            split,
        }
    }

    fn records() -> Vec<QaRecord> {
        (0..40)
            .map(|i| record(i, if i % 2 == 0 { Split::Train } else { Split::Val }))
            .collect()
    }

    #[test]
    fn zero_ratio_is_plain_partition() {
        let config = SplitConfig {
            val_to_train_ratio: 0.0,
            seed: 42,
        };
        let outcome = split_by_field(records(), &config).unwrap();
        assert_eq!(outcome.moved, 0);
        assert!(outcome.train.iter().all(|e| e.question_id % 2 == 0));
        assert!(outcome.val.iter().all(|e| e.question_id % 2 == 1));
        assert_eq!(outcome.train.len(), 20);
    }

    #[test]
    fn moves_floor_of_ratio_and_is_reproducible() {
        let config = SplitConfig {
            val_to_train_ratio: 0.25,
            seed: 7,
        };
        let first = split_by_field(records(), &config).unwrap();
        let second = split_by_field(records(), &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.moved, 5);
        assert_eq!(first.train.len(), 25);
        assert_eq!(first.val.len(), 15);
        // leftover val keeps input order
        let val_ids: Vec<u64> = first.val.iter().map(|e| e.question_id).collect();
        let mut sorted = val_ids.clone();
        sorted.sort_unstable();
        assert_eq!(val_ids, sorted);
        // moved records are val records
        assert!(first.train[20..].iter().all(|e| e.question_id % 2 == 1));
    }

    #[test]
    fn empty_input_and_bad_ratio() {
        let outcome = split_by_field(Vec::new(), &SplitConfig::default()).unwrap();
        assert_eq!(outcome, SplitOutcome::default());

        let config = SplitConfig {
            val_to_train_ratio: 2.0,
            seed: 1,
        };
        assert!(split_by_field(records(), &config).is_err());
    }
}
