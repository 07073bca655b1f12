//! Stroke-chunk QA dataset generation.
//!
//! Turns a canonical per-stroke table into chunked positive/negative
//! questions with optional chain-of-thought answers, then re-splits the
//! result into train/val files.

/// Answer strings and chain-of-thought wrapping.
pub mod answer;
/// Caption lookup and caption synthesis.
pub mod captions;
/// Generation and split configuration.
pub mod config;
mod errors;
/// Per-chunk QA record generation.
pub mod generator;
/// JSON loading and all-or-nothing output writing.
pub mod output;
/// Raw encoder CSV filtering, mapping and deduplication.
pub mod preprocess;
/// Rally grouping and chunking.
pub mod rally;
/// Negative and positive property sampling.
pub mod sampler;
/// Seeded val-to-train reallocation.
pub mod split;
/// Canonical stroke table types and loader.
pub mod strokes;
/// Question templates and granularities.
pub mod templates;
/// Global player/stroke/hit-area vocabularies.
pub mod vocab;

pub use answer::{NEGATIVE_ANSWER, POSITIVE_PREFIX};
pub use captions::{CaptionLookup, CaptionRow, NO_CAPTION};
pub use config::{GenerationConfig, SplitConfig};
pub use errors::DatasetError;
pub use generator::{QaEntry, QaGenerator, QaRecord};
pub use rally::{partition_rallies, Chunk};
pub use split::{split_by_field, SplitOutcome};
pub use strokes::{Player, Split, StrokeRecord};
pub use templates::{Granularity, PropertyTuple, TemplatePools};
pub use vocab::Vocabulary;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, DatasetError>;
