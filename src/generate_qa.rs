/*
cargo run --bin generate_qa -- \
    --strokes-file  data_processing/processed/filtered_encoder_data.csv \
    --captions-file generated_labels/caption/dataset_labels_caption.csv \
    --out-file      generated_labels/QA/qa_dataset.json

custom templates, reproducible sampling, bare answers
cargo run --bin generate_qa -- \
    --strokes-file   data_processing/processed/filtered_encoder_data.csv \
    --captions-file  generated_labels/caption/dataset_labels_caption.csv \
    --templates-file dataset_pipeline/templates.json \
    --out-file       generated_labels/QA/qa_dataset.json \
    --num-questions-per-rally 14 --sampling-seed 7 --no-cot
*/

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

use rally_qa::output::{split_paths, write_dataset};
use rally_qa::strokes::load_strokes;
use rally_qa::{
    partition_rallies, CaptionLookup, GenerationConfig, QaGenerator, SplitConfig,
    TemplatePools, Vocabulary,
};

// CLI parameters
#[derive(Parser, Debug)]
#[command(version, about = "Generate chunked stroke QA data and its train/val split")]
struct Cli {
    // Canonical stroke table (id, player, stroke_name, hit_area, rally, split)
    #[arg(long)]
    strokes_file: PathBuf,
    // Caption table (image_id, caption)
    #[arg(long)]
    captions_file: PathBuf,
    // JSON object with the four template pools; built-in pools when omitted
    #[arg(long)]
    templates_file: Option<PathBuf>,
    // Full dataset; train.json and val.json are written next to it
    #[arg(long = "out-file", value_name = "PATH",
           default_value = "generated_labels/QA/qa_dataset.json")]
    out_file: PathBuf,
    #[arg(long, default_value_t = 5)]
    chunk_size: usize,
    // Questions per chunk, including up to 4 negatives
    #[arg(long, default_value_t = 14)]
    num_questions_per_rally: usize,
    #[arg(long, default_value_t = 0.05)]
    val_to_train_ratio: f64,
    // Seed for the val -> train reallocation
    #[arg(long, default_value_t = 42)]
    seed: u64,
    // Seed for template/tuple/row sampling; unseeded when omitted
    #[arg(long)]
    sampling_seed: Option<u64>,
    // Plain answers instead of <thinking> chain-of-thought
    #[arg(long)]
    no_cot: bool,
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logging setup
    create_dir_all(&cli.log_dir)?;
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = cli.log_dir.join(format!("generate_qa_{ts}.log"));
    WriteLogger::init(
        LevelFilter::Info,
        LogConfig::default(),
        File::create(&log_path)?,
    )?;
    info!("Starting QA generation");

    let generation = GenerationConfig {
        chunk_size: cli.chunk_size,
        num_questions_per_rally: cli.num_questions_per_rally,
        use_cot: !cli.no_cot,
        ..GenerationConfig::default()
    };
    let split_config = SplitConfig {
        val_to_train_ratio: cli.val_to_train_ratio,
        seed: cli.seed,
    };
    generation.validate()?;
    split_config.validate()?;
    if generation.positives_per_chunk() == 0 {
        warn!(
            "num_questions_per_rally={} leaves no room for positive questions",
            generation.num_questions_per_rally
        );
    }

    // load inputs
    let strokes = load_strokes(&cli.strokes_file)
        .with_context(|| format!("loading strokes from {}", cli.strokes_file.display()))?;
    let captions = CaptionLookup::load(&cli.captions_file)
        .with_context(|| format!("loading captions from {}", cli.captions_file.display()))?;
    let templates = match &cli.templates_file {
        Some(path) => TemplatePools::load(path)
            .with_context(|| format!("loading templates from {}", path.display()))?,
        None => TemplatePools::default(),
    };
    info!(
        "Loaded {} strokes, {} captions, {} templates",
        strokes.len(),
        captions.len(),
        templates.len()
    );

    let vocab = Vocabulary::from_strokes(&strokes);
    info!(
        "Vocabulary: {} strokes, {} hit areas",
        vocab.strokes.len(),
        vocab.hit_areas.len()
    );

    let chunks = partition_rallies(&strokes, generation.chunk_size)?;
    info!("Partitioned into {} chunks", chunks.len());

    let mut rng = match cli.sampling_seed {
        Some(seed) => {
            info!("Sampling seed {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => {
            warn!("No --sampling-seed given; question sampling is not reproducible across runs");
            StdRng::from_entropy()
        }
    };

    // generate
    let mut generator = QaGenerator::new(&vocab, &captions, &templates, generation)?;
    let bar = ProgressBar::new(chunks.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})",
    )?);
    let mut records = Vec::new();
    for chunk in &chunks {
        records.extend(generator.generate_chunk(chunk, &mut rng));
        bar.inc(1);
    }
    bar.finish_and_clear();

    let negatives = records.iter().filter(|r| r.entry.is_impossible).count();
    info!(
        "Generated {} records ({} negative, {} positive)",
        records.len(),
        negatives,
        records.len() - negatives
    );

    // split + write (nothing lands on disk unless every file serialized)
    let total = records.len();
    let outcome = write_dataset(&cli.out_file, records, &split_config)
        .with_context(|| format!("writing dataset to {}", cli.out_file.display()))?;
    let (train_path, val_path) = split_paths(&cli.out_file);
    info!(
        "Wrote {:?}, {:?} ({} records), {:?} ({} records)",
        cli.out_file,
        train_path,
        outcome.train.len(),
        val_path,
        outcome.val.len()
    );

    println!("\n=== QA generation summary ===");
    println!("Strokes            : {}", strokes.len());
    println!("Chunks             : {}", chunks.len());
    println!("Records            : {}", total);
    println!("Negative records   : {}", negatives);
    println!("Train / Val        : {} / {}", outcome.train.len(), outcome.val.len());
    println!("Moved val -> train : {}", outcome.moved);
    println!("Output JSON        : {:?}", cli.out_file);
    println!("Log file           : {:?}", log_path);

    Ok(())
}
