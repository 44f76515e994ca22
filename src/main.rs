//! Assess follow-up ligands against clustered fragment hits using SuCOS scores.
//!
//! The clusters are SD files, one per cluster of hits (typically one per binding pocket
//! of the target). Each input molecule is compared to every hit; in `max` mode the best
//! hit is reported, in `cum` mode the scores are summed. Molecules with no overlap
//! against any hit are dropped from the output.
//!
//! SuCOS is the work of Susan Leung:
//! https://doi.org/10.26434/chemrxiv.8100203.v1

use std::{io, path::PathBuf};

use clap::{Parser, ValueEnum};

use sucos::{
    scoring::ShapeMetric,
    screen::{ScoreMode, process},
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliMode {
    /// Report the best score over all hits
    Max,
    /// Report the sum of scores over all hits
    Cum,
}

impl From<CliMode> for ScoreMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Max => ScoreMode::Max,
            CliMode::Cum => ScoreMode::Cum,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "sucos",
    about = "Score molecules against clustered fragment hits with SuCOS"
)]
struct Args {
    /// Input file to score, in SDF format. Can be gzipped (*.gz).
    #[arg(short, long)]
    input: PathBuf,

    /// Output file, in SDF format. Can be gzipped (*.gz).
    #[arg(short, long)]
    output: PathBuf,

    /// Score mode
    #[arg(short, long, value_enum, default_value_t = CliMode::Max)]
    mode: CliMode,

    /// Use the symmetric Tanimoto shape overlap instead of the protrude overlap
    #[arg(long)]
    tanimoto: bool,

    /// One or more SDF files with the clustered hits
    #[arg(value_name = "CLUSTERS", required = true, num_args = 1..)]
    clusters: Vec<PathBuf>,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    println!(
        "SuCOS screen: input {:?}, output {:?}, mode {:?}, clusters {:?}",
        args.input, args.output, args.mode, args.clusters
    );

    let metric = if args.tanimoto {
        ShapeMetric::Tanimoto
    } else {
        ShapeMetric::Protrude
    };

    process(
        &args.input,
        &args.clusters,
        &args.output,
        args.mode.into(),
        metric,
    )?;

    Ok(())
}
