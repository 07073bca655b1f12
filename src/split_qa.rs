/*
cargo run --bin split_qa -- -i generated_labels/QA/qa_dataset.json

cargo run --bin split_qa -- \
    -i generated_labels/QA/qa_dataset.json \
    --train-file generated_labels/QA/resplit/train.json \
    --val-file   generated_labels/QA/resplit/val.json \
    -r 0.1 --seed 7
*/

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use log::{info, warn};
use simplelog::*;
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

use rally_qa::output::{load_records, split_paths, write_split};
use rally_qa::{Split, SplitConfig};

#[derive(Parser, Debug)]
#[clap(name = "qa_splitter")]
struct Args {
    // Full QA dataset JSON (records still carry their split)
    #[clap(short, long, default_value = "generated_labels/QA/qa_dataset.json")]
    input: PathBuf,

    // Train output; defaults to train.json next to the input
    #[clap(long)]
    train_file: Option<PathBuf>,

    // Val output; defaults to val.json next to the input
    #[clap(long)]
    val_file: Option<PathBuf>,

    // Share of val records moved into train (default 0.05)
    #[clap(short = 'r', long, default_value = "0.05")]
    val_to_train_ratio: f64,

    // Seed for picking the moved records
    #[clap(short, long, default_value = "42")]
    seed: u64,

    // Directory for the log file
    #[clap(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = SplitConfig {
        val_to_train_ratio: args.val_to_train_ratio,
        seed: args.seed,
    };
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        std::process::exit(1);
    }

    // Setup logging
    create_dir_all(&args.log_dir)?;
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    CombinedLogger::init(vec![WriteLogger::new(
        LevelFilter::Info,
        ConfigBuilder::new().build(),
        File::create(args.log_dir.join(format!("split_qa_{ts}.log")))?,
    )])?;

    info!("Starting QA splitter");
    info!("Input file: {:?}", args.input);
    info!(
        "Val -> train ratio: {}, seed: {}",
        config.val_to_train_ratio, config.seed
    );

    let records = load_records(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let val_count = records.iter().filter(|r| r.split == Split::Val).count();
    info!("Loaded {} records ({} val)", records.len(), val_count);
    if val_count == 0 {
        warn!("No val records in {:?}; val.json will be empty", args.input);
    }

    let (default_train, default_val) = split_paths(&args.input);
    let train_path = args.train_file.unwrap_or(default_train);
    let val_path = args.val_file.unwrap_or(default_val);

    let total = records.len();
    let outcome = write_split(records, &train_path, &val_path, &config)?;
    info!("Wrote train data to {:?}", train_path);
    info!("Wrote validation data to {:?}", val_path);

    println!(
        "Split complete: Total {}, Train {}, Val {}, Moved {}",
        total,
        outcome.train.len(),
        outcome.val.len(),
        outcome.moved
    );
    info!("All done successfully.");
    Ok(())
}
