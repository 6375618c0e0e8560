//! Welch coherence between columns.

use clap::Args;
use neurotime_analysis::{CoherenceAnalyzer, Window};
use neurotime_config::AnalysisConfig;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{load_series, write_json};

/// Coherence, phase, and delay for every pair of columns.
#[derive(Args)]
pub struct CoherenceArgs {
    /// Delimited text file, one column per channel
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Samples per Welch segment
    #[arg(long)]
    pub segment_len: Option<usize>,

    /// Samples shared by consecutive segments; half of --segment-len if only that is given
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Segment taper (rectangular, hann, hamming, blackman, blackman_harris)
    #[arg(long)]
    pub window: Option<String>,

    /// Output JSON file (optional)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct PairReport {
    a: String,
    b: String,
    coherence: Vec<f64>,
    phase: Vec<f64>,
}

#[derive(Serialize)]
struct CoherenceReport {
    frequencies: Vec<f64>,
    pairs: Vec<PairReport>,
}

/// Run the coherence command.
pub fn run(args: CoherenceArgs, config: &AnalysisConfig) -> anyhow::Result<()> {
    let (table, series) = load_series(&args.input, config)?;

    let mut params = config.coherence;
    if let Some(segment_len) = args.segment_len {
        params.segment_len = segment_len;
        if args.overlap.is_none() {
            params.overlap = segment_len / 2;
        }
    }
    if let Some(overlap) = args.overlap {
        params.overlap = overlap;
    }
    if let Some(name) = &args.window {
        params.window = Window::from_name(name)
            .ok_or_else(|| anyhow::anyhow!("unknown window '{}'", name))?;
    }

    let analyzer = CoherenceAnalyzer::with_params(&series, params);
    let coherence = analyzer.coherence()?;
    let phase = analyzer.phase()?;
    let delay = analyzer.delay()?;
    let frequencies = coherence.frequencies();

    println!(
        "Coherence ({} samples/segment, {} overlap, {:?})",
        params.segment_len, params.overlap, params.window
    );
    println!(
        "\n{:<24} {:>10} {:>12} {:>10} {:>12}",
        "Pair", "Mean", "Peak (Hz)", "Peak", "Delay (s)"
    );

    let mut report = CoherenceReport {
        frequencies: frequencies.to_vec(),
        pairs: Vec::new(),
    };
    for i in 0..series.n_channels() {
        for j in (i + 1)..series.n_channels() {
            let values = coherence.pair(i, j);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            // Skip DC when locating the peak; delay has no DC bin.
            let (peak_bin, peak) = values
                .iter()
                .copied()
                .enumerate()
                .skip(1)
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((0, values[0]));
            let peak_delay = delay.at(i, j, peak_bin.saturating_sub(1)).unwrap_or(0.0);

            let label = format!("{} / {}", table.names[i], table.names[j]);
            println!(
                "{:<24} {:>10.4} {:>12.4} {:>10.4} {:>12.6}",
                label, mean, frequencies[peak_bin], peak, peak_delay
            );
            report.pairs.push(PairReport {
                a: table.names[i].clone(),
                b: table.names[j].clone(),
                coherence: values.to_vec(),
                phase: phase.pair(i, j).to_vec(),
            });
        }
    }

    if let Some(path) = args.output {
        write_json(&path, &report)?;
    }
    Ok(())
}
