//! Analytic-signal summary of every column.

use clap::Args;
use neurotime_analysis::HilbertAnalyzer;
use neurotime_analysis::stats::{mean, std_dev};
use neurotime_config::AnalysisConfig;
use neurotime_core::TimeSeries;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{load_series, write_json};

/// Envelope, phase, and instantaneous frequency.
#[derive(Args)]
pub struct HilbertArgs {
    /// Delimited text file, one column per channel
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output JSON file (optional)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct HilbertReport<'a> {
    channels: &'a [String],
    magnitude: &'a TimeSeries,
    phase: &'a TimeSeries,
    #[serde(skip_serializing_if = "Option::is_none")]
    instantaneous_frequency: Option<&'a TimeSeries>,
}

/// Run the hilbert command.
pub fn run(args: HilbertArgs, config: &AnalysisConfig) -> anyhow::Result<()> {
    let (table, series) = load_series(&args.input, config)?;
    let analyzer = HilbertAnalyzer::new(&series);
    let magnitude = analyzer.magnitude()?;
    let phase = analyzer.phase()?;
    // A single sample has no frequency.
    let frequency = if series.len() > 1 {
        Some(analyzer.instantaneous_frequency()?)
    } else {
        None
    };

    println!(
        "{:<16} {:>14} {:>14} {:>14}",
        "Column", "Envelope", "Envelope std", "Freq (Hz)"
    );
    println!("{}", "-".repeat(61));
    for (i, name) in table.names.iter().enumerate() {
        let envelope = magnitude.channel(i);
        let freq = frequency.map_or(f64::NAN, |f| mean(f.channel(i)));
        println!(
            "{:<16} {:>14.6} {:>14.6} {:>14.6}",
            name,
            mean(envelope),
            std_dev(envelope),
            freq
        );
    }

    if let Some(path) = args.output {
        let report = HilbertReport {
            channels: &table.names,
            magnitude,
            phase,
            instantaneous_frequency: frequency,
        };
        write_json(&path, &report)?;
    }
    Ok(())
}
