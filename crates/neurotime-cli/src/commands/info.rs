//! Display input file layout and per-column statistics.

use clap::Args;
use neurotime_analysis::stats::{mean, std_dev};
use neurotime_config::AnalysisConfig;
use std::path::PathBuf;

use super::common::{load_series, read_table};

/// Display input file information.
#[derive(Args)]
pub struct InfoArgs {
    /// Delimited text file, one column per channel
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

/// Run the info command.
pub fn run(args: InfoArgs, config: &AnalysisConfig) -> anyhow::Result<()> {
    println!("File:        {}", args.input.display());

    // Without a sampling interval the layout is still useful.
    if config.sampling_interval.is_none() {
        let table = read_table(&args.input)?;
        println!("Channels:    {}", table.columns.len());
        println!("Samples:     {}", table.rows());
        println!("Duration:    unknown (no sampling interval)");
        print_columns(&table.names, &table.columns);
        return Ok(());
    }

    let (table, series) = load_series(&args.input, config)?;
    println!("Channels:    {}", series.n_channels());
    println!("Samples:     {}", series.len());
    println!(
        "Sampling:    {} s ({} Hz)",
        series.sampling_interval(),
        series.sampling_rate()
    );
    println!("Duration:    {:.6} s", series.duration());
    print_columns(&table.names, &table.columns);
    Ok(())
}

fn print_columns(names: &[String], columns: &[Vec<f64>]) {
    println!("\n{:<16} {:>14} {:>14}", "Column", "Mean", "Std");
    println!("{}", "-".repeat(46));
    for (name, column) in names.iter().zip(columns) {
        println!("{:<16} {:>14.6} {:>14.6}", name, mean(column), std_dev(column));
    }
}
