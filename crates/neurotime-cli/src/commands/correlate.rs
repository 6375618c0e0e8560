//! Correlation matrix and normalized cross-correlation between columns.

use clap::Args;
use neurotime_analysis::CorrelationAnalyzer;
use neurotime_config::AnalysisConfig;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{load_series, write_json};

/// Correlate every pair of columns.
#[derive(Args)]
pub struct CorrelateArgs {
    /// Delimited text file, one column per channel
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Also print the normalized cross-correlation for lags -N..=N
    #[arg(long, value_name = "N")]
    pub lags: Option<usize>,

    /// Output JSON file (optional)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct PairLags {
    a: String,
    b: String,
    values: Vec<f64>,
}

#[derive(Serialize)]
struct CorrelateReport {
    channels: Vec<String>,
    correlation: Vec<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lags: Option<Vec<isize>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    xcorr_norm: Vec<PairLags>,
}

/// Run the correlate command.
pub fn run(args: CorrelateArgs, config: &AnalysisConfig) -> anyhow::Result<()> {
    let (table, series) = load_series(&args.input, config)?;
    let analyzer = CorrelationAnalyzer::new(&series);
    let corr = analyzer.correlation()?;

    println!("Correlation matrix");
    print!("{:<12}", "");
    for name in &table.names {
        print!(" {:>10}", name);
    }
    println!();
    for (i, name) in table.names.iter().enumerate() {
        print!("{:<12}", name);
        for value in corr.row(i) {
            print!(" {:>10.4}", value);
        }
        println!();
    }

    let mut report = CorrelateReport {
        channels: table.names.clone(),
        correlation: corr.to_rows(),
        lags: None,
        xcorr_norm: Vec::new(),
    };

    if let Some(max) = args.lags {
        let xcorr = analyzer.xcorr_norm()?;
        let max = max.min(xcorr.max_lag()) as isize;
        let lags: Vec<isize> = (-max..=max).collect();
        let dt = series.sampling_interval();

        for i in 0..series.n_channels() {
            for j in (i + 1)..series.n_channels() {
                let values: Vec<f64> = lags
                    .iter()
                    .filter_map(|&lag| xcorr.at(i, j, lag))
                    .collect();
                println!(
                    "\nCross-correlation {} -> {} (lag, time, r)",
                    table.names[i], table.names[j]
                );
                for (&lag, value) in lags.iter().zip(&values) {
                    println!("{:>6} {:>12.6} {:>10.4}", lag, lag as f64 * dt, value);
                }
                report.xcorr_norm.push(PairLags {
                    a: table.names[i].clone(),
                    b: table.names[j].clone(),
                    values,
                });
            }
        }
        report.lags = Some(lags);
    }

    if let Some(path) = args.output {
        write_json(&path, &report)?;
    }
    Ok(())
}
