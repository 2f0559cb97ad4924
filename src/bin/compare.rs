// Projection comparison entry point.
//
// Diffs two finished projection files (baseline vs candidate) and prints
// per-statistic RMSE, standard deviation, and variance over the mutual
// players, plus every data mismatch found along the way.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use capuchin::compare::{compare, load_projection_from_path};

/// Compare two projection files.
#[derive(Debug, Parser)]
#[command(name = "capuchin-compare", version, about = "Compare two projection files")]
struct Args {
    /// Baseline projection file.
    baseline: PathBuf,

    /// Candidate projection file to compare against the baseline.
    candidate: PathBuf,

    /// Number of columns before the player id in the baseline file.
    #[arg(long = "baseline-id-column", value_name = "N", default_value_t = 0)]
    baseline_id_column: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    println!(
        "Comparing {} to {}",
        args.baseline.display(),
        args.candidate.display()
    );

    let baseline = load_projection_from_path(&args.baseline, args.baseline_id_column)
        .with_context(|| format!("failed to load {}", args.baseline.display()))?;
    let candidate = load_projection_from_path(&args.candidate, 0)
        .with_context(|| format!("failed to load {}", args.candidate.display()))?;

    let report = compare(&baseline, &candidate);

    if !report.only_baseline.is_empty() {
        println!("Players only in baseline: {}", report.only_baseline.join(", "));
    }
    if !report.only_candidate.is_empty() {
        println!("Players only in candidate: {}", report.only_candidate.join(", "));
    }
    if !report.nan_players.is_empty() {
        println!("Players with NaNs: {}", report.nan_players.join(", "));
    }
    for d in &report.age_disagreements {
        println!(
            "{}'s age doesn't agree: {} != {}",
            d.player_id, d.baseline, d.candidate
        );
    }

    println!("stat\trmse\t\tstddev\t\tvariance");
    for s in &report.stats {
        println!(
            "{}\t{:<8.5}\t{:<8.5}\t{:<8.5}",
            s.name, s.rmse, s.stddev, s.variance
        );
    }

    Ok(())
}
