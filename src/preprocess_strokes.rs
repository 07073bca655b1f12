/*
cargo run --bin preprocess_strokes -- \
    --encoder-file        data_processing/raw/encoder_data.csv \
    --stroke-map-file     data_processing/mapping/stroke_mapping_name.csv \
    --hit-area-map-file   data_processing/mapping/hit_area_mapping.csv \
    --stroke-map-llm-file data_processing/mapping/stroke_mapping_llm.csv \
    --out-file            data_processing/processed/filtered_encoder_data.csv \
    --dedup-keep last

keep the highest-rally row per id
cargo run --bin preprocess_strokes -- \
    --encoder-file        data_processing/raw/encoder_data.csv \
    --stroke-map-file     data_processing/mapping/stroke_mapping_name.csv \
    --hit-area-map-file   data_processing/mapping/hit_area_mapping.csv \
    --stroke-map-llm-file data_processing/mapping/stroke_mapping_llm.csv \
    --sort-by rally --dedup-keep last
*/

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{info, warn};
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

use rally_qa::preprocess::{
    load_encoder_rows, load_mapping, numeric_keys, preprocess, write_canonical, DedupKeep,
    Mappings, SortColumn,
};

// CLI parameters
#[derive(Parser, Debug)]
#[command(version, about = "Filter, map and deduplicate the raw stroke encoder export")]
struct Cli {
    #[arg(long)]
    encoder_file: PathBuf,
    // Stroke, English_Type
    #[arg(long)]
    stroke_map_file: PathBuf,
    // id, hit_area
    #[arg(long)]
    hit_area_map_file: PathBuf,
    // Stroke, English_Type (names phrased for the LLM)
    #[arg(long)]
    stroke_map_llm_file: PathBuf,
    #[arg(long = "out-file", value_name = "PATH",
           default_value = "data_processing/processed/filtered_encoder_data.csv")]
    out_file: PathBuf,
    // Which duplicate id survives: first | last
    #[arg(long, default_value = "last")]
    dedup_keep: DedupKeep,
    // Output column to stable-sort by before dedup; input order when omitted
    #[arg(long)]
    sort_by: Option<SortColumn>,
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logging setup
    create_dir_all(&cli.log_dir)?;
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = cli.log_dir.join(format!("preprocess_strokes_{ts}.log"));
    WriteLogger::init(
        LevelFilter::Info,
        LogConfig::default(),
        File::create(&log_path)?,
    )?;
    info!("Starting stroke preprocessing");

    // load mapping tables
    let mappings = Mappings {
        strokes: load_mapping(&cli.stroke_map_file, "Stroke", "English_Type")
            .with_context(|| format!("reading {}", cli.stroke_map_file.display()))?,
        hit_areas: numeric_keys(
            load_mapping(&cli.hit_area_map_file, "id", "hit_area")
                .with_context(|| format!("reading {}", cli.hit_area_map_file.display()))?,
        ),
        llm_strokes: load_mapping(&cli.stroke_map_llm_file, "Stroke", "English_Type")
            .with_context(|| format!("reading {}", cli.stroke_map_llm_file.display()))?,
    };
    info!(
        "Mappings: {} stroke types, {} hit areas, {} LLM stroke names",
        mappings.strokes.len(),
        mappings.hit_areas.len(),
        mappings.llm_strokes.len()
    );

    let rows = load_encoder_rows(&cli.encoder_file)
        .with_context(|| format!("reading {}", cli.encoder_file.display()))?;
    info!("Loaded {} encoder rows", rows.len());

    if let Some(column) = cli.sort_by {
        info!("Sorting by '{column}' before dedup");
    }
    let (canonical, stats) = preprocess(rows, &mappings, cli.dedup_keep, cli.sort_by);
    if stats.non_numeric_rally > 0 {
        warn!("{} rows dropped for a missing or non-numeric rally", stats.non_numeric_rally);
    }
    if stats.unmapped_area > 0 {
        warn!("{} rows have a hit-area code missing from the mapping", stats.unmapped_area);
    }
    info!("Dropped {} duplicate ids (keep={})", stats.duplicates, cli.dedup_keep);

    write_canonical(&cli.out_file, &canonical)
        .with_context(|| format!("writing {}", cli.out_file.display()))?;
    info!("Wrote {} strokes → {:?}", canonical.len(), cli.out_file);

    println!("\n=== Preprocess summary ===");
    println!("Input rows         : {}", stats.input_rows);
    println!("Unknown stroke type: {}", stats.unknown_stroke);
    println!("Non-numeric area   : {}", stats.non_numeric_area);
    println!("Non-numeric rally  : {}", stats.non_numeric_rally);
    println!("Unmapped area      : {}", stats.unmapped_area);
    println!("Duplicates removed : {}", stats.duplicates);
    println!("Output rows        : {}", canonical.len());
    println!("Output CSV         : {:?}", cli.out_file);
    println!("Log file           : {:?}", log_path);

    Ok(())
}
