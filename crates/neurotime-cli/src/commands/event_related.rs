//! Event-locked response estimates.

use anyhow::Context;
use clap::{Args, ValueEnum};
use neurotime_analysis::{EventRelatedAnalyzer, EventResponse, Scaling};
use neurotime_config::AnalysisConfig;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{load_series, write_json};

/// Which estimate to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    /// Event-triggered average
    Eta,
    /// Standard error of the average
    Ets,
    /// FIR deconvolution of overlapping responses
    Fir,
    /// Average from the cross-correlation of events and signal
    Xcorr,
}

/// Average a signal column around the events coded in another column.
#[derive(Args)]
pub struct EventRelatedArgs {
    /// Delimited text file, one column per channel
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Column holding the signal (name or zero-based index)
    #[arg(long, value_name = "COLUMN")]
    pub signal_column: String,

    /// Column holding event codes; 0 means no event
    #[arg(long, value_name = "COLUMN")]
    pub events_column: String,

    /// Samples per trial window
    #[arg(long)]
    pub window_len: Option<usize>,

    /// Window start relative to the event, in samples
    #[arg(long, allow_hyphen_values = true)]
    pub offset: Option<isize>,

    /// Z-score the signal before the cross-correlation estimate
    #[arg(long)]
    pub zscore: bool,

    /// Estimate to compute
    #[arg(long, value_enum, default_value = "eta")]
    pub estimator: Estimator,

    /// Output JSON file (optional)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct EventReport<'a> {
    signal: &'a str,
    estimator: Estimator,
    trial_counts: Vec<(u32, usize)>,
    response: &'a EventResponse,
}

/// Run the event-related command.
pub fn run(args: EventRelatedArgs, config: &AnalysisConfig) -> anyhow::Result<()> {
    let (table, series) = load_series(&args.input, config)?;
    let signal = table.column_index(&args.signal_column)?;
    let events = table.column_index(&args.events_column)?;
    let target = series.select(&[signal])?;
    let codes = series.select(&[events])?;

    let mut section = config.event_related;
    if args.window_len.is_some() {
        section.window_len = args.window_len;
    }
    if let Some(offset) = args.offset {
        section.offset = offset;
    }
    let mut params = section
        .params()
        .context("window length not set: pass --window-len or set it in the configuration")?;
    if args.zscore {
        params = params.with_scaling(Scaling::ZScore);
    }

    let analyzer = EventRelatedAnalyzer::new(&target, &codes, params);
    let response = match args.estimator {
        Estimator::Eta => analyzer.eta()?,
        Estimator::Ets => analyzer.ets()?,
        Estimator::Fir => analyzer.fir()?,
        Estimator::Xcorr => analyzer.xcorr_eta()?,
    };
    let trial_counts = analyzer.trial_counts()?;

    let name = &table.names[signal];
    println!("Event-related {:?} of '{}'", args.estimator, name);
    for &(code, trials) in &trial_counts {
        println!("  event {code}: {trials} trials");
    }

    print!("\n{:>12}", "time (s)");
    for code in response.codes() {
        print!(" {:>12}", format!("event {code}"));
    }
    println!();
    let dt = target.sampling_interval();
    for k in 0..params.window_len {
        print!("{:>12.6}", (params.offset + k as isize) as f64 * dt);
        for (_, trace) in response.iter() {
            print!(" {:>12.6}", trace.channel(0)[k]);
        }
        println!();
    }

    if let Some(path) = args.output {
        let report = EventReport {
            signal: name,
            estimator: args.estimator,
            trial_counts,
            response,
        };
        write_json(&path, &report)?;
    }
    Ok(())
}
