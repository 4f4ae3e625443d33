// Pitch histogram diagnostic: CLI entry point.
//
// Counts single-note pitches over a MIDI directory, using the same extraction
// as training, and draws the pitches that occur more than the threshold.
// Independent of training; writes nothing but the chart.
//
// Usage:
//   pitch_histogram [--midi-dir DIR] [--pattern GLOB] [--threshold N]
//     [--output FILE.svg] [--seed N]

use melodia_charts::{DIAGNOSTIC_THRESHOLD, render_pitch_histogram};
use melodia_corpus::pitch_histogram;
use melodia_prng::TrainRng;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }
    let midi_dir: PathBuf = parse_flag(&args, "--midi-dir").unwrap_or_else(|| "midi_songs".into());
    let pattern: String = parse_flag(&args, "--pattern").unwrap_or_else(|| "*.mid".to_string());
    let threshold: u64 = parse_flag(&args, "--threshold").unwrap_or(DIAGNOSTIC_THRESHOLD);
    let output: PathBuf =
        parse_flag(&args, "--output").unwrap_or_else(|| "pitch_histogram.svg".into());
    let seed: u64 = parse_flag(&args, "--seed").unwrap_or(0);

    println!("=== Melodia Pitch Histogram ===");
    println!("MIDI files: {}/{}", midi_dir.display(), pattern);
    println!("Threshold: > {threshold} occurrences");
    println!();

    println!("[1/2] Counting pitches...");
    let histogram = match pitch_histogram(&midi_dir, &pattern) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("  Error: {e}");
            std::process::exit(1);
        }
    };
    println!(
        "  {} distinct pitches, {} notes.",
        histogram.len(),
        histogram.total()
    );

    println!("[2/2] Drawing {}...", output.display());
    let mut rng = TrainRng::new(seed);
    match render_pitch_histogram(&histogram, threshold, &output, &mut rng) {
        Ok(bars) => println!("  Done! {bars} pitches above threshold."),
        Err(e) => {
            eprintln!("  Error drawing histogram: {e}");
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Usage: pitch_histogram [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --midi-dir <DIR>    Directory of MIDI files (default: midi_songs)");
    println!("  --pattern <GLOB>    File name pattern (default: *.mid)");
    println!("  --threshold <N>     Minimum occurrences, exclusive (default: {DIAGNOSTIC_THRESHOLD})");
    println!("  --output <FILE>     Output SVG (default: pitch_histogram.svg)");
    println!("  --seed <N>          Bar colour seed (default: 0)");
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
