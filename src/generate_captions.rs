/*
cargo run --bin generate_captions -- \
    --strokes-file data_processing/processed/filtered_encoder_data.csv \
    --out-file     generated_labels/caption/dataset_labels_caption.csv
*/

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

use rally_qa::strokes::load_strokes;
use rally_qa::CaptionRow;

// CLI parameters
#[derive(Parser, Debug)]
#[command(version, about = "Write one caption per stroke")]
struct Cli {
    #[arg(long)]
    strokes_file: PathBuf,
    #[arg(long = "out-file", value_name = "PATH",
           default_value = "generated_labels/caption/dataset_labels_caption.csv")]
    out_file: PathBuf,
    #[arg(long, default_value = "mp4")]
    media_extension: String,
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logging setup
    create_dir_all(&cli.log_dir)?;
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = cli.log_dir.join(format!("generate_captions_{ts}.log"));
    WriteLogger::init(
        LevelFilter::Info,
        LogConfig::default(),
        File::create(&log_path)?,
    )?;
    info!("Starting caption generation");

    let strokes = load_strokes(&cli.strokes_file)
        .with_context(|| format!("loading strokes from {}", cli.strokes_file.display()))?;

    if let Some(parent) = cli.out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(&cli.out_file)
        .with_context(|| format!("creating {}", cli.out_file.display()))?;

    let bar = ProgressBar::new(strokes.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} captions",
    )?);
    let mut missing_area = 0usize;
    for stroke in &strokes {
        if stroke.hit_area.is_none() {
            missing_area += 1;
        }
        wtr.serialize(CaptionRow::from_stroke(stroke, &cli.media_extension))?;
        bar.inc(1);
    }
    wtr.flush()?;
    bar.finish_and_clear();
    info!("Wrote {} captions → {:?}", strokes.len(), cli.out_file);

    println!("\n=== Caption summary ===");
    println!("Captions           : {}", strokes.len());
    println!("Without hit area   : {}", missing_area);
    println!("Output CSV         : {:?}", cli.out_file);
    println!("Log file           : {:?}", log_path);

    Ok(())
}
