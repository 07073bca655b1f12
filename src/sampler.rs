use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::rally::Chunk;
use crate::templates::{Granularity, PropertyTuple};
use crate::vocab::Vocabulary;

/// Full cross product of the vocabularies at `granularity`, in vocabulary order.
pub fn universe(vocab: &Vocabulary, granularity: Granularity) -> Vec<PropertyTuple<'_>> {
    match granularity {
        Granularity::PlayerStrokeArea => vocab
            .players
            .iter()
            .flat_map(|&player| {
                vocab.strokes.iter().flat_map(move |stroke| {
                    vocab.hit_areas.iter().map(move |hit_area| PropertyTuple::PlayerStrokeArea {
                        player,
                        stroke: stroke.as_str(),
                        hit_area: hit_area.as_str(),
                    })
                })
            })
            .collect(),
        Granularity::PlayerStroke => vocab
            .players
            .iter()
            .flat_map(|&player| {
                vocab
                    .strokes
                    .iter()
                    .map(move |stroke| PropertyTuple::PlayerStroke {
                        player,
                        stroke: stroke.as_str(),
                    })
            })
            .collect(),
        Granularity::StrokeOnly => vocab
            .strokes
            .iter()
            .map(|s| PropertyTuple::Stroke(s.as_str()))
            .collect(),
        Granularity::HitAreaOnly => vocab
            .hit_areas
            .iter()
            .map(|h| PropertyTuple::HitArea(h.as_str()))
            .collect(),
    }
}

/// Whether any stroke in the chunk exhibits `tuple`.
pub fn observed(chunk: &Chunk<'_>, tuple: &PropertyTuple<'_>) -> bool {
    chunk.strokes.iter().any(|s| tuple.matches(s))
}

/// Universe minus the chunk's observed facts at `granularity`.
pub fn negative_pool<'v>(
    chunk: &Chunk<'_>,
    vocab: &'v Vocabulary,
    granularity: Granularity,
) -> Vec<PropertyTuple<'v>> {
    universe(vocab, granularity)
        .into_iter()
        .filter(|t| !observed(chunk, t))
        .collect()
}

/// One uniform draw from the negative pool, or `None` when every combination occurs.
pub fn draw_negative<'v, R: Rng + ?Sized>(
    chunk: &Chunk<'_>,
    vocab: &'v Vocabulary,
    granularity: Granularity,
    rng: &mut R,
) -> Option<PropertyTuple<'v>> {
    negative_pool(chunk, vocab, granularity).choose(rng).copied()
}

/// Indices of `count` chunk rows; with replacement only when the chunk is too small.
pub fn draw_positive_rows<R: Rng + ?Sized>(chunk: &Chunk<'_>, count: usize, rng: &mut R) -> Vec<usize> {
    let len = chunk.len();
    if count == 0 || len == 0 {
        return Vec::new();
    }
    if len < count {
        (0..count).map(|_| rng.gen_range(0..len)).collect()
    } else {
        index::sample(rng, len, count).into_vec()
    }
}

/// Every chunk position matching `tuple`, ascending.
pub fn match_indices(chunk: &Chunk<'_>, tuple: &PropertyTuple<'_>) -> Vec<usize> {
    chunk
        .strokes
        .iter()
        .enumerate()
        .filter(|(_, s)| tuple.matches(s))
        .map(|(i, _)| i)
        .collect()
}
