//! Event-related responses: averages, standard errors, single trials, and
//! two model-based estimates.
//!
//! The event signal runs parallel to the target: 0 means no event, a positive
//! integer k marks an onset of event type k. Every onset opens a trial window
//! of `window_len` samples starting `offset` samples after it (a negative
//! offset looks back before the event).
//!
//! | output | estimate |
//! |---|---|
//! | [`et_data`](EventRelatedAnalyzer::et_data) | the extracted trial windows |
//! | [`eta`](EventRelatedAnalyzer::eta) | mean over trials |
//! | [`ets`](EventRelatedAnalyzer::ets) | standard error: population std / sqrt(trials) |
//! | [`fir`](EventRelatedAnalyzer::fir) | least-squares kernels that allow overlapping responses |
//! | [`xcorr_eta`](EventRelatedAnalyzer::xcorr_eta) | onset train correlated with the target |
//!
//! # Example
//!
//! ```rust
//! use neurotime_analysis::{EventRelatedAnalyzer, EventRelatedParams};
//! use neurotime_core::TimeSeries;
//!
//! let signal: Vec<f64> = (0..400).map(|k| (k % 100) as f64).collect();
//! let mut codes = vec![0.0; 400];
//! for onset in [0, 100, 200, 300] {
//!     codes[onset] = 1.0;
//! }
//!
//! let target = TimeSeries::from_channel(signal, 10.0).unwrap();
//! let events = TimeSeries::from_channel(codes, 10.0).unwrap();
//! let analyzer = EventRelatedAnalyzer::new(&target, &events, EventRelatedParams::new(20));
//!
//! let eta = analyzer.eta().unwrap();
//! assert_eq!(eta.codes(), &[1]);
//! assert_eq!(eta.get(1).unwrap().channel(0)[5], 5.0);
//! ```

use std::collections::BTreeMap;

use neurotime_core::TimeSeries;
use serde::{Deserialize, Serialize};

use crate::deconvolution::fir_kernels;
use crate::error::{AnalysisError, Result};
use crate::memo::Memo;
use crate::stats::zscore;
use crate::xcorr::xcorr_fft;

/// Scaling of the target before the cross-correlation estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// Use the target as recorded.
    #[default]
    Raw,
    /// Standardize every channel to zero mean and unit variance first.
    ZScore,
}

/// What to do with a trial whose window leaves the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Skip the trial and log it.
    #[default]
    Drop,
    /// Fail with [`AnalysisError::OutOfBoundsWindow`].
    Strict,
}

/// Trial window and estimator options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRelatedParams {
    /// Samples per trial window.
    pub window_len: usize,
    /// Window start relative to the onset, in samples.
    #[serde(default)]
    pub offset: isize,
    /// Target scaling for [`EventRelatedAnalyzer::xcorr_eta`].
    #[serde(default)]
    pub scaling: Scaling,
    /// Handling of windows that leave the signal.
    #[serde(default)]
    pub boundary: BoundaryPolicy,
}

impl EventRelatedParams {
    /// Windows of `window_len` samples starting at the onset.
    pub fn new(window_len: usize) -> Self {
        Self {
            window_len,
            offset: 0,
            scaling: Scaling::Raw,
            boundary: BoundaryPolicy::Drop,
        }
    }

    /// Shift the window start by `offset` samples.
    pub fn with_offset(mut self, offset: isize) -> Self {
        self.offset = offset;
        self
    }

    /// Set the target scaling for the cross-correlation estimate.
    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Set the boundary policy.
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }
}

/// One series per event type, ordered by event code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResponse {
    codes: Vec<u32>,
    responses: Vec<TimeSeries>,
}

impl EventResponse {
    /// Event codes, ascending.
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Response for event code `code`.
    pub fn get(&self, code: u32) -> Option<&TimeSeries> {
        let index = self.codes.binary_search(&code).ok()?;
        self.responses.get(index)
    }

    /// Number of event types.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether there are no event types.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// `(code, response)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &TimeSeries)> {
        self.codes.iter().copied().zip(&self.responses)
    }
}

/// Extracted trial windows, grouped by event type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventTrials {
    codes: Vec<u32>,
    trials: Vec<Vec<TimeSeries>>,
}

impl EventTrials {
    /// Event codes, ascending.
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Trials of event code `code`, in onset order.
    pub fn get(&self, code: u32) -> Option<&[TimeSeries]> {
        let index = self.codes.binary_search(&code).ok()?;
        self.trials.get(index).map(Vec::as_slice)
    }

    /// `(code, trials)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[TimeSeries])> {
        self.codes
            .iter()
            .copied()
            .zip(self.trials.iter().map(Vec::as_slice))
    }
}

/// Onsets of every event type present in the event signal.
#[derive(Debug)]
struct Onsets {
    codes: Vec<u32>,
    by_type: Vec<Vec<usize>>,
}

/// Time-locked analysis of a target signal around coded events.
#[derive(Debug)]
pub struct EventRelatedAnalyzer<'a> {
    target: &'a TimeSeries,
    events: &'a TimeSeries,
    params: EventRelatedParams,
    onsets: Memo<Onsets>,
    starts: Memo<Vec<Vec<usize>>>,
    et_data: Memo<EventTrials>,
    eta: Memo<EventResponse>,
    ets: Memo<EventResponse>,
    fir: Memo<EventResponse>,
    xcorr_eta: Memo<EventResponse>,
}

impl<'a> EventRelatedAnalyzer<'a> {
    /// Pair a target with its event-code signal; inputs are checked on first use.
    pub fn new(target: &'a TimeSeries, events: &'a TimeSeries, params: EventRelatedParams) -> Self {
        Self {
            target,
            events,
            params,
            onsets: Memo::new(),
            starts: Memo::new(),
            et_data: Memo::new(),
            eta: Memo::new(),
            ets: Memo::new(),
            fir: Memo::new(),
            xcorr_eta: Memo::new(),
        }
    }

    /// The window and estimator options.
    pub fn params(&self) -> &EventRelatedParams {
        &self.params
    }

    /// Event codes present in the event signal, ascending.
    pub fn event_types(&self) -> Result<&[u32]> {
        Ok(&self.onsets()?.codes)
    }

    /// Trials kept per event type (after the boundary policy), in code order.
    pub fn trial_counts(&self) -> Result<Vec<(u32, usize)>> {
        let codes = self.event_types()?;
        let starts = self.starts()?;
        Ok(codes
            .iter()
            .copied()
            .zip(starts.iter().map(Vec::len))
            .collect())
    }

    /// Every trial window, grouped by event type.
    pub fn et_data(&self) -> Result<&EventTrials> {
        self.et_data.get_or_compute(|| {
            let codes = self.event_types()?.to_vec();
            let trials = self
                .starts()?
                .iter()
                .map(|starts| {
                    starts
                        .iter()
                        .map(|&start| self.window(start))
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(EventTrials { codes, trials })
        })
    }

    /// Event-triggered average.
    pub fn eta(&self) -> Result<&EventResponse> {
        self.eta.get_or_compute(|| {
            self.per_type(|starts, channel| {
                let n = starts.len() as f64;
                (0..self.params.window_len)
                    .map(|l| starts.iter().map(|&s| channel[s + l]).sum::<f64>() / n)
                    .collect()
            })
        })
    }

    /// Event-triggered standard error of the mean.
    ///
    /// The spread is the population standard deviation across trials (divisor
    /// equal to the trial count), divided by the square root of the trial count.
    pub fn ets(&self) -> Result<&EventResponse> {
        self.ets.get_or_compute(|| {
            self.per_type(|starts, channel| {
                let n = starts.len() as f64;
                (0..self.params.window_len)
                    .map(|l| {
                        let mean = starts.iter().map(|&s| channel[s + l]).sum::<f64>() / n;
                        let var = starts
                            .iter()
                            .map(|&s| (channel[s + l] - mean).powi(2))
                            .sum::<f64>()
                            / n;
                        var.sqrt() / n.sqrt()
                    })
                    .collect()
            })
        })
    }

    /// Deconvolved response kernels (see [`crate::deconvolution`]).
    ///
    /// Every onset enters the design, including the in-range part of windows
    /// the boundary policy drops from the averages.
    pub fn fir(&self) -> Result<&EventResponse> {
        self.fir.get_or_compute(|| {
            // Applies the boundary policy and the per-type trial requirement.
            self.starts()?;
            let onsets = self.onsets()?;
            let channels: Vec<&[f64]> = self.target.channels().collect();
            let kernels = fir_kernels(
                &channels,
                &onsets.by_type,
                self.params.window_len,
                self.params.offset,
            )?;
            let responses = kernels
                .into_iter()
                .map(|rows| self.response_series(rows))
                .collect::<Result<Vec<_>>>()?;
            Ok(EventResponse {
                codes: onsets.codes.clone(),
                responses,
            })
        })
    }

    /// Event-triggered average from the cross-correlation of each type's
    /// onset train with the target.
    ///
    /// With `R(τ) = Σ_n u[n] y[n + τ]`, u the 0/1 indicator of the kept
    /// onsets of a type, the estimate is `R(τ) / kept` for `τ` in
    /// `offset..offset + window_len`. Trials follow the boundary policy like
    /// every other estimate, so no sample outside the signal is read. With
    /// [`Scaling::Raw`] this equals [`eta`](Self::eta).
    pub fn xcorr_eta(&self) -> Result<&EventResponse> {
        self.xcorr_eta.get_or_compute(|| {
            let starts = self.starts()?;
            let codes = self.event_types()?.to_vec();
            let target: Vec<Vec<f64>> = match self.params.scaling {
                Scaling::Raw => self.target.channels().map(<[f64]>::to_vec).collect(),
                Scaling::ZScore => self
                    .target
                    .channels()
                    .enumerate()
                    .map(|(i, channel)| {
                        zscore(channel).ok_or_else(|| {
                            AnalysisError::degenerate(format!(
                                "cannot z-score channel {i}: zero variance"
                            ))
                        })
                    })
                    .collect::<Result<_>>()?,
            };

            let first = self.params.offset;
            let last = first + self.params.window_len as isize - 1;
            let max_lag = first.unsigned_abs().max(last.unsigned_abs());
            let len = self.target.len();

            let responses = starts
                .iter()
                .map(|type_starts| {
                    let mut indicator = vec![0.0; len];
                    for &start in type_starts {
                        indicator[(start as isize - first) as usize] = 1.0;
                    }
                    let count = type_starts.len() as f64;
                    let rows = target
                        .iter()
                        .map(|channel| {
                            let lagged = xcorr_fft(&indicator, channel, max_lag);
                            (first..=last)
                                .map(|lag| lagged[(lag + max_lag as isize) as usize] / count)
                                .collect()
                        })
                        .collect();
                    self.response_series(rows)
                })
                .collect::<Result<Vec<_>>>()?;

            tracing::debug!(
                types = codes.len(),
                max_lag,
                scaling = ?self.params.scaling,
                "cross-correlation ETA"
            );
            Ok(EventResponse { codes, responses })
        })
    }

    fn onsets(&self) -> Result<&Onsets> {
        self.onsets.get_or_compute(|| scan_events(self.target, self.events, &self.params))
    }

    /// Window start of every kept trial, per type.
    fn starts(&self) -> Result<&Vec<Vec<usize>>> {
        self.starts.get_or_compute(|| {
            let onsets = self.onsets()?;
            let len = self.target.len() as isize;
            let window = self.params.window_len as isize;

            onsets
                .codes
                .iter()
                .zip(&onsets.by_type)
                .map(|(&code, type_onsets)| {
                    let mut kept = Vec::with_capacity(type_onsets.len());
                    for &onset in type_onsets {
                        let start = onset as isize + self.params.offset;
                        if start >= 0 && start + window <= len {
                            kept.push(start as usize);
                            continue;
                        }
                        match self.params.boundary {
                            BoundaryPolicy::Strict => {
                                return Err(AnalysisError::out_of_bounds(format!(
                                    "event {code} at sample {onset}: window {start}..{} \
                                     leaves the signal of {len} samples",
                                    start + window
                                )));
                            }
                            BoundaryPolicy::Drop => {
                                tracing::debug!(
                                    code,
                                    onset,
                                    start,
                                    "dropping trial outside the signal"
                                );
                            }
                        }
                    }

                    let dropped = type_onsets.len() - kept.len();
                    if dropped > 0 {
                        tracing::warn!(
                            code,
                            dropped,
                            kept = kept.len(),
                            "trials outside the signal were dropped"
                        );
                    }
                    if kept.is_empty() {
                        return Err(AnalysisError::insufficient_trials(
                            code,
                            format!("all {} windows fall outside the signal", type_onsets.len()),
                        ));
                    }
                    Ok(kept)
                })
                .collect()
        })
    }

    fn per_type<F>(&self, mut estimate: F) -> Result<EventResponse>
    where
        F: FnMut(&[usize], &[f64]) -> Vec<f64>,
    {
        let codes = self.event_types()?.to_vec();
        let responses = self
            .starts()?
            .iter()
            .map(|starts| {
                let rows = self
                    .target
                    .channels()
                    .map(|channel| estimate(starts, channel))
                    .collect();
                self.response_series(rows)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EventResponse { codes, responses })
    }

    fn window(&self, start: usize) -> Result<TimeSeries> {
        let trial = self.target.slice(start..start + self.params.window_len)?;
        Ok(trial.with_t0(self.response_t0()))
    }

    fn response_series(&self, rows: Vec<Vec<f64>>) -> Result<TimeSeries> {
        Ok(TimeSeries::from_interval(rows, self.target.sampling_interval())?
            .with_t0(self.response_t0()))
    }

    fn response_t0(&self) -> f64 {
        self.params.offset as f64 * self.target.sampling_interval()
    }
}

fn scan_events(
    target: &TimeSeries,
    events: &TimeSeries,
    params: &EventRelatedParams,
) -> Result<Onsets> {
    if params.window_len == 0 {
        return Err(AnalysisError::invalid_input("window length must be at least 1 sample"));
    }
    if events.n_channels() != 1 {
        return Err(AnalysisError::invalid_input(format!(
            "event signal must have one channel, got {}",
            events.n_channels()
        )));
    }
    target.ensure_aligned(events).map_err(|e| {
        AnalysisError::invalid_input(format!("event signal does not match target: {e}"))
    })?;

    let mut grouped: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (sample, &value) in events.channel(0).iter().enumerate() {
        if value == 0.0 {
            continue;
        }
        let integral = value.is_finite() && value.fract() == 0.0;
        if !integral || value < 0.0 || value > f64::from(u32::MAX) {
            return Err(AnalysisError::invalid_input(format!(
                "event code {value} at sample {sample} is not a non-negative integer"
            )));
        }
        grouped.entry(value as u32).or_default().push(sample);
    }

    if grouped.is_empty() {
        return Err(AnalysisError::insufficient_trials(0, "the event signal contains no events"));
    }

    tracing::debug!(
        types = grouped.len(),
        onsets = grouped.values().map(Vec::len).sum::<usize>(),
        "event scan"
    );
    let (codes, by_type) = grouped.into_iter().unzip();
    Ok(Onsets { codes, by_type })
}
