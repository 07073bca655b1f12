use crate::{DatasetError, Result};

/// Negatives are capped at one per granularity, so the positive budget
/// per chunk is `num_questions_per_rally - NEGATIVE_SLOTS`.
pub const NEGATIVE_SLOTS: usize = 4;

/// Controls chunking and per-chunk question counts.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Max strokes per chunk.
    pub chunk_size: usize,
    /// Question budget per chunk, negatives included.
    pub num_questions_per_rally: usize,
    /// Wrap answers in the `<thinking>` chain-of-thought block.
    pub use_cot: bool,
    /// Extension appended to stroke ids for the `image` list.
    pub media_extension: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            num_questions_per_rally: 14,
            use_cot: true,
            media_extension: "mp4".to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DatasetError::Configuration(
                "chunk_size must be at least 1".into(),
            ));
        }
        if self.media_extension.is_empty() {
            return Err(DatasetError::Configuration(
                "media_extension must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Positive questions drawn per chunk; zero when the budget only covers negatives.
    pub fn positives_per_chunk(&self) -> usize {
        self.num_questions_per_rally.saturating_sub(NEGATIVE_SLOTS)
    }
}

/// Controls the seeded val -> train reallocation.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitConfig {
    pub val_to_train_ratio: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            val_to_train_ratio: 0.05,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.val_to_train_ratio) {
            return Err(DatasetError::Configuration(format!(
                "val_to_train_ratio must be within [0, 1], got {}",
                self.val_to_train_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let generation = GenerationConfig::default();
        generation.validate().unwrap();
        assert_eq!(generation.positives_per_chunk(), 10);
        SplitConfig::default().validate().unwrap();
    }

    #[test]
    fn small_budget_yields_no_positives() {
        let config = GenerationConfig {
            num_questions_per_rally: 3,
            ..GenerationConfig::default()
        };
        assert_eq!(config.positives_per_chunk(), 0);
    }

    #[test]
    fn rejects_bad_values() {
        let config = GenerationConfig {
            chunk_size: 0,
            ..GenerationConfig::default()
        };
        assert!(config.validate().is_err());

        for ratio in [-0.1, 1.5, f64::NAN] {
            let split = SplitConfig {
                val_to_train_ratio: ratio,
                seed: 1,
            };
            assert!(split.validate().is_err(), "ratio {ratio} accepted");
        }
    }
}
