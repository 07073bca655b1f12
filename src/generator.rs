use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::answer::{self, NEGATIVE_ANSWER};
use crate::captions::CaptionLookup;
use crate::config::GenerationConfig;
use crate::rally::Chunk;
use crate::sampler;
use crate::strokes::Split;
use crate::templates::{Granularity, PropertyTuple, TemplatePools};
use crate::vocab::Vocabulary;
use crate::Result;

/// One dataset row as written to train.json / val.json.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaEntry {
    pub question_id: u64,
    pub image: Vec<String>,
    pub question: String,
    pub answer: String,
    pub is_impossible: bool,
    pub chunk_id: String,
}

/// A generated row still carrying the split it inherited from its chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    #[serde(flatten)]
    pub entry: QaEntry,
    pub split: Split,
}

/// Builds QA records chunk by chunk and owns the question id counter.
pub struct QaGenerator<'a> {
    vocab: &'a Vocabulary,
    captions: &'a CaptionLookup,
    templates: &'a TemplatePools,
    config: GenerationConfig,
    next_question_id: u64,
}

impl<'a> QaGenerator<'a> {
    pub fn new(
        vocab: &'a Vocabulary,
        captions: &'a CaptionLookup,
        templates: &'a TemplatePools,
        config: GenerationConfig,
    ) -> Result<Self> {
        config.validate()?;
        templates.validate()?;
        Ok(Self {
            vocab,
            captions,
            templates,
            config,
            next_question_id: 0,
        })
    }

    /// Number of records emitted so far.
    pub fn emitted(&self) -> u64 {
        self.next_question_id
    }

    /// Negatives (at most one per granularity) followed by positives for one chunk.
    pub fn generate_chunk<R: Rng + ?Sized>(&mut self, chunk: &Chunk<'_>, rng: &mut R) -> Vec<QaRecord> {
        let thinking: Vec<String> = chunk
            .strokes
            .iter()
            .enumerate()
            .map(|(i, s)| answer::thinking_line(i, self.captions.get(&s.id)))
            .collect();
        let image = chunk.filenames(&self.config.media_extension);
        let chunk_id = chunk.chunk_id();
        let split = chunk.split();

        let mut drafts: Vec<(String, String, bool)> = Vec::new();

        for granularity in Granularity::ALL {
            let Some(tuple) = sampler::draw_negative(chunk, self.vocab, granularity, rng) else {
                debug!("{chunk_id}: no {granularity} negative left, skipping");
                continue;
            };
            let Some(template) = self.templates.choose(granularity, rng) else {
                continue;
            };
            drafts.push((tuple.render(template), NEGATIVE_ANSWER.to_string(), true));
        }

        for row in sampler::draw_positive_rows(chunk, self.config.positives_per_chunk(), rng) {
            let stroke = chunk.strokes[row];
            let has_area = stroke.hit_area.is_some();
            let Some((granularity, template)) = self
                .templates
                .choose_tagged(rng, |g| has_area || !g.needs_hit_area())
            else {
                continue;
            };
            let Some(tuple) = PropertyTuple::project(stroke, granularity) else {
                continue;
            };
            let indices = sampler::match_indices(chunk, &tuple);
            drafts.push((tuple.render(template), answer::positive_answer(&indices), false));
        }

        drafts
            .into_iter()
            .map(|(question, answer_text, is_impossible)| {
                let question_id = self.next_question_id;
                self.next_question_id += 1;
                QaRecord {
                    entry: QaEntry {
                        question_id,
                        image: image.clone(),
                        question,
                        answer: answer::compose(&thinking, &answer_text, self.config.use_cot),
                        is_impossible,
                        chunk_id: chunk_id.clone(),
                    },
                    split,
                }
            })
            .collect()
    }

    /// Runs every chunk in order into one flat record list.
    pub fn generate_all<R: Rng + ?Sized>(&mut self, chunks: &[Chunk<'_>], rng: &mut R) -> Vec<QaRecord> {
        chunks
            .iter()
            .flat_map(|chunk| self.generate_chunk(chunk, rng))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::parse_positive_indices;
    use crate::rally::partition_rallies;
    use crate::strokes::{Player, StrokeRecord};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rally(ids: &[(&str, &str, Option<&str>)]) -> Vec<StrokeRecord> {
        ids.iter()
            .map(|(id, stroke, area)| {
                StrokeRecord::new(*id, Player::Upper, *stroke, *area, 1, Split::Train).unwrap()
            })
            .collect()
    }

    #[test]
    fn ids_are_contiguous_across_chunks() {
        let strokes = rally(&[
            ("g1_s1_1", "smash", Some("back")),
            ("g1_s1_2", "drive", Some("front")),
            ("g1_s1_3", "lob", Some("mid")),
            ("g1_s1_4", "smash", None),
        ]);
        let vocab = Vocabulary::from_strokes(&strokes);
        let captions = CaptionLookup::default();
        let templates = TemplatePools::default();
        let config = GenerationConfig {
            chunk_size: 2,
            num_questions_per_rally: 6,
            ..GenerationConfig::default()
        };
        let chunks = partition_rallies(&strokes, config.chunk_size).unwrap();
        let mut generator = QaGenerator::new(&vocab, &captions, &templates, config).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let records = generator.generate_all(&chunks, &mut rng);
        let ids: Vec<u64> = records.iter().map(|r| r.entry.question_id).collect();
        assert_eq!(ids, (0..records.len() as u64).collect::<Vec<_>>());
        assert_eq!(generator.emitted(), records.len() as u64);
    }

    #[test]
    fn missing_area_rows_still_get_non_empty_answers() {
        let strokes = rally(&[("g1_s1_1", "smash", None), ("g1_s1_2", "drop", None)]);
        let vocab = Vocabulary::from_strokes(&strokes);
        let captions = CaptionLookup::default();
        let templates = TemplatePools::default();
        let config = GenerationConfig {
            num_questions_per_rally: 20,
            use_cot: false,
            ..GenerationConfig::default()
        };
        let chunks = partition_rallies(&strokes, 5).unwrap();
        let mut generator = QaGenerator::new(&vocab, &captions, &templates, config).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        let records = generator.generate_chunk(&chunks[0], &mut rng);
        let positives: Vec<_> = records.iter().filter(|r| !r.entry.is_impossible).collect();
        assert_eq!(positives.len(), 16);
        for record in positives {
            let indices = parse_positive_indices(&record.entry.answer).unwrap();
            assert!(!indices.is_empty());
        }
        // no hit-area vocabulary and both strokes observed: only the bottom-player pair is left
        assert_eq!(records.iter().filter(|r| r.entry.is_impossible).count(), 1);
    }

    #[test]
    fn cot_answers_embed_captions() {
        let strokes = rally(&[("g1_s1_1", "smash", Some("back"))]);
        let vocab = Vocabulary::from_strokes(&strokes);
        let captions: CaptionLookup = [(
            "g1_s1_1".to_string(),
            "upper player hits a smash back".to_string(),
        )]
        .into_iter()
        .collect();
        let templates = TemplatePools::default();
        let config = GenerationConfig {
            num_questions_per_rally: 5,
            ..GenerationConfig::default()
        };
        let chunks = partition_rallies(&strokes, 5).unwrap();
        let mut generator = QaGenerator::new(&vocab, &captions, &templates, config).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let records = generator.generate_chunk(&chunks[0], &mut rng);
        // only the bottom-player triple and pair are unobserved
        assert_eq!(records.iter().filter(|r| r.entry.is_impossible).count(), 2);
        let positive = records.iter().find(|r| !r.entry.is_impossible).unwrap();
        assert!(positive
            .entry
            .answer
            .starts_with("<thinking>\nstroke 0: upper player hits a smash back\n"));
        assert!(positive
            .entry
            .answer
            .ends_with("<answer>The event happens at stroke 0</answer>"));
        assert_eq!(positive.entry.image, vec!["g1_s1_1.mp4"]);
        assert_eq!(positive.entry.chunk_id, "g1_s1_1_chunk1");
    }

    #[test]
    fn record_serializes_with_split_last() {
        let record = QaRecord {
            entry: QaEntry {
                question_id: 3,
                image: vec!["a.mp4".into()],
                question: "q".into(),
                answer: "a".into(),
                is_impossible: false,
                chunk_id: "g_s_1_chunk1".into(),
            },
            split: Split::Val,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"question_id":3,"image":["a.mp4"],"question":"q","answer":"a","is_impossible":false,"chunk_id":"g_s_1_chunk1","split":"val"}"#
        );
        let back: QaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
