// Melodia trainer: CLI entry point.
//
// Ingests a directory of MIDI files, persists the symbol corpus and
// vocabulary, and trains the stacked-LSTM model, checkpointing each epoch
// that improves the training loss. The loss chart is redrawn every epoch.
//
// Usage:
//   train [--config FILE] [--midi-dir DIR] [--pattern GLOB] [--epochs N]
//     [--batch-size N] [--sequence-length N] [--seed N]
//     [--validation-split F] [--keep-best N | --keep-last N]
//     [--checkpoint-dir DIR]
//
// Settings come from data/training_config.json when it exists (or the
// file named by --config); flags override the file.

use burn::backend::{Autodiff, NdArray};
use burn::config::Config;
use melodia_train::{RetentionPolicy, TrainingConfig, prepare, train};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type TrainBackend = Autodiff<NdArray>;

const DEFAULT_CONFIG_PATH: &str = "data/training_config.json";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let config = load_config(&args);
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    println!("=== Melodia Trainer ===");
    println!("MIDI files: {}/{}", config.midi_dir.display(), config.pattern);
    println!("Sequence length: {}", config.sequence_length);
    println!("Epochs: {} (batch size {})", config.epochs, config.batch_size);
    if config.validation_split > 0.0 {
        println!("Validation split: {:.2}", config.validation_split);
    }
    println!("Checkpoints: {} ({:?})", config.checkpoint_dir.display(), config.retention);
    println!("Seed: {}", config.seed);
    println!();

    println!("[1/5] Parsing MIDI files...");
    let prepared = match prepare(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("  Error: {e}");
            std::process::exit(1);
        }
    };
    println!("  {} files, {} symbols.", prepared.files, prepared.corpus_len);

    println!("[2/5] Saved corpus and vocabulary...");
    println!("  Corpus: {}", config.corpus_path.display());
    println!(
        "  Vocabulary: {} ({} symbols)",
        config.vocabulary_path.display(),
        prepared.vocabulary.len()
    );
    println!("  Pitch histogram: {}", config.histogram_plot_path.display());

    println!("[3/5] Windowing...");
    println!(
        "  {} training pairs{}.",
        prepared.train_set.len(),
        match &prepared.validation {
            Some(v) => format!(", {} validation pairs", v.len()),
            None => String::new(),
        }
    );

    println!("[4/5] Building model...");
    let device = Default::default();
    let model_config = config.model_config(prepared.vocabulary.len());
    if let Err(e) = model_config.save(&config.model_config_path) {
        eprintln!("  Error writing {}: {e}", config.model_config_path.display());
        std::process::exit(1);
    }
    println!(
        "  3 x LSTM({}) -> Dense({}) -> Dense({}), dropout {}",
        model_config.lstm_units,
        model_config.dense_units,
        model_config.vocab_size,
        model_config.dropout
    );
    <TrainBackend as burn::tensor::backend::Backend>::seed(config.seed);
    let model = model_config.init::<TrainBackend>(&device);

    println!("[5/5] Training...");
    match train::<TrainBackend>(
        model,
        &prepared.train_set,
        prepared.validation.as_ref(),
        &config,
        &device,
    ) {
        Ok(report) => {
            match report.best_loss {
                Some(best) => println!("  Done! Best loss {best:.4}."),
                None => println!("  Done! No epoch produced a finite loss."),
            }
            for path in &report.checkpoints {
                println!("  Checkpoint: {}", path.display());
            }
            println!("  Loss chart: {}", config.loss_plot_path.display());
        }
        Err(e) => {
            eprintln!("  Error: {e}");
            std::process::exit(1);
        }
    }
}

fn load_config(args: &[String]) -> TrainingConfig {
    let explicit: Option<PathBuf> = parse_flag(args, "--config");
    let path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = if explicit.is_some() || Path::new(&path).exists() {
        match TrainingConfig::load(&path) {
            Ok(c) => {
                println!("Loaded settings from {}.", path.display());
                c
            }
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        TrainingConfig::default()
    };

    if let Some(v) = parse_flag(args, "--midi-dir") {
        config.midi_dir = v;
    }
    if let Some(v) = parse_flag(args, "--pattern") {
        config.pattern = v;
    }
    if let Some(v) = parse_flag(args, "--checkpoint-dir") {
        config.checkpoint_dir = v;
    }
    if let Some(v) = parse_flag(args, "--epochs") {
        config.epochs = v;
    }
    if let Some(v) = parse_flag(args, "--batch-size") {
        config.batch_size = v;
    }
    if let Some(v) = parse_flag(args, "--sequence-length") {
        config.sequence_length = v;
    }
    if let Some(v) = parse_flag(args, "--seed") {
        config.seed = v;
    }
    if let Some(v) = parse_flag(args, "--validation-split") {
        config.validation_split = v;
    }
    if let Some(n) = parse_flag(args, "--keep-best") {
        config.retention = RetentionPolicy::KeepBestN(n);
    }
    if let Some(n) = parse_flag(args, "--keep-last") {
        config.retention = RetentionPolicy::KeepLastN(n);
    }
    config
}

fn print_usage() {
    println!("Usage: train [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <FILE>            JSON settings (default: {DEFAULT_CONFIG_PATH} if present)");
    println!("  --midi-dir <DIR>           Directory of MIDI files (default: midi_songs)");
    println!("  --pattern <GLOB>           File name pattern (default: *.mid)");
    println!("  --checkpoint-dir <DIR>     Where checkpoints go (default: .)");
    println!("  --epochs <N>               Training epochs (default: 200)");
    println!("  --batch-size <N>           Mini-batch size (default: 64)");
    println!("  --sequence-length <N>      Input window length (default: 100)");
    println!("  --seed <N>                 Shuffle and init seed (default: 0)");
    println!("  --validation-split <F>     Held-out tail fraction, 0 to 1 (default: 0)");
    println!("  --keep-best <N>            Keep only the N best checkpoints");
    println!("  --keep-last <N>            Keep only the N newest checkpoints");
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
