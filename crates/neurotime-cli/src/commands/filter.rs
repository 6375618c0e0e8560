//! Frequency-domain band limiting.

use clap::Args;
use neurotime_analysis::stats::variance;
use neurotime_analysis::{FilterAnalyzer, Passband};
use neurotime_config::AnalysisConfig;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{load_series, write_json};

/// Zero every frequency outside `[lb, ub]`.
#[derive(Args)]
pub struct FilterArgs {
    /// Delimited text file, one column per channel
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Lower cutoff in Hz
    #[arg(long)]
    pub lb: Option<f64>,

    /// Upper cutoff in Hz
    #[arg(long)]
    pub ub: Option<f64>,

    /// Output JSON file with the filtered columns (optional)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct FilterReport<'a> {
    channels: &'a [String],
    lb: Option<f64>,
    ub: Option<f64>,
    sampling_interval: f64,
    data: Vec<&'a [f64]>,
}

/// Run the filter command.
pub fn run(args: FilterArgs, config: &AnalysisConfig) -> anyhow::Result<()> {
    let (table, series) = load_series(&args.input, config)?;

    let mut params = config.filter;
    if args.lb.is_some() {
        params.lb = args.lb;
    }
    if args.ub.is_some() {
        params.ub = args.ub;
    }
    if params.passband() == Passband::All {
        tracing::warn!("no cutoff given; the output equals the input");
    }

    let analyzer = FilterAnalyzer::new(&series, params);
    let filtered = analyzer.filtered_fourier()?;

    println!("Passband: {:?}", params.passband());
    println!(
        "\n{:<16} {:>14} {:>14} {:>10}",
        "Column", "Var in", "Var out", "Kept"
    );
    println!("{}", "-".repeat(57));
    for (i, name) in table.names.iter().enumerate() {
        let before = variance(series.channel(i));
        let after = variance(filtered.channel(i));
        let kept = if before > 0.0 { after / before } else { 1.0 };
        println!(
            "{:<16} {:>14.6} {:>14.6} {:>9.1}%",
            name,
            before,
            after,
            100.0 * kept
        );
    }

    if let Some(path) = args.output {
        let report = FilterReport {
            channels: &table.names,
            lb: params.lb,
            ub: params.ub,
            sampling_interval: filtered.sampling_interval(),
            data: filtered.channels().collect(),
        };
        write_json(&path, &report)?;
    }
    Ok(())
}
