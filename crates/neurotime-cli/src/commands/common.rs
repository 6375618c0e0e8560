//! Shared CLI helpers used across multiple commands.

use std::path::Path;

use anyhow::{Context, bail};
use neurotime_config::{AnalysisConfig, resolve_config};
use neurotime_core::TimeSeries;
use serde::Serialize;

/// Columns of a delimited text file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Header names, or `0`, `1`, ... when the file has no header row.
    pub names: Vec<String>,
    /// One vector per column.
    pub columns: Vec<Vec<f64>>,
}

impl Table {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Column index by header name or by zero-based position.
    pub fn column_index(&self, key: &str) -> anyhow::Result<usize> {
        if let Some(index) = self.names.iter().position(|name| name == key) {
            return Ok(index);
        }
        match key.parse::<usize>() {
            Ok(index) if index < self.columns.len() => Ok(index),
            _ => bail!(
                "no column '{}' (available: {})",
                key,
                self.names.join(", ")
            ),
        }
    }
}

/// Load the configuration and apply the command-line sampling interval.
///
/// An explicit `--config` must exist; the per-user default is optional.
pub fn load_config(
    explicit: Option<&Path>,
    sampling_interval: Option<f64>,
) -> anyhow::Result<AnalysisConfig> {
    let mut config = match resolve_config(explicit) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            AnalysisConfig::load(&path)
                .with_context(|| format!("loading configuration {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    if sampling_interval.is_some() {
        config.sampling_interval = sampling_interval;
    }
    config.validate()?;
    Ok(config)
}

fn split_fields(line: &str) -> Vec<&str> {
    if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Parse delimited text: one column per channel, comma, tab, or whitespace
/// separated. Lines starting with `#` and blank lines are skipped. A first
/// row that does not parse as numbers is taken as the header.
pub fn parse_table(text: &str) -> anyhow::Result<Table> {
    let mut names: Option<Vec<String>> = None;
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = split_fields(line);
        let values: Result<Vec<f64>, _> = fields.iter().map(|f| f.parse::<f64>()).collect();

        match values {
            Ok(values) => {
                if columns.is_empty() {
                    if let Some(names) = &names
                        && names.len() != values.len()
                    {
                        bail!(
                            "line {}: {} values for {} header columns",
                            number + 1,
                            values.len(),
                            names.len()
                        );
                    }
                    columns = vec![Vec::new(); values.len()];
                } else if values.len() != columns.len() {
                    bail!(
                        "line {}: expected {} values, found {}",
                        number + 1,
                        columns.len(),
                        values.len()
                    );
                }
                for (column, value) in columns.iter_mut().zip(values) {
                    column.push(value);
                }
            }
            Err(err) if names.is_none() && columns.is_empty() => {
                tracing::debug!(line = number + 1, %err, "treating first row as header");
                names = Some(fields.iter().map(|f| (*f).to_string()).collect());
            }
            Err(err) => bail!("line {}: {}", number + 1, err),
        }
    }

    if columns.is_empty() {
        bail!("no numeric rows");
    }
    let names = names.unwrap_or_else(|| (0..columns.len()).map(|i| i.to_string()).collect());
    Ok(Table { names, columns })
}

/// Read a delimited text file.
pub fn read_table(path: &Path) -> anyhow::Result<Table> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_table(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Read a file as a time series using the configured sampling interval.
pub fn load_series(path: &Path, config: &AnalysisConfig) -> anyhow::Result<(Table, TimeSeries)> {
    let Some(interval) = config.sampling_interval else {
        bail!(
            "sampling interval not set: pass --sampling-interval or set it in the configuration"
        );
    };
    let table = read_table(path)?;
    let series = TimeSeries::from_interval(table.columns.clone(), interval)?;
    tracing::info!(
        file = %path.display(),
        channels = series.n_channels(),
        samples = series.len(),
        "loaded input"
    );
    Ok((table, series))
}

/// Write a value as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("\nWrote {}", path.display());
    Ok(())
}
