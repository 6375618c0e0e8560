//! Pairwise correlation and time-lagged cross-correlation between channels.
//!
//! [`CorrelationAnalyzer`] borrows a multi-channel [`TimeSeries`] and exposes
//! three lazily computed outputs:
//!
//! - [`correlation`](CorrelationAnalyzer::correlation) - Pearson correlation matrix
//! - [`xcorr`](CorrelationAnalyzer::xcorr) - covariance at every lag, for every pair
//! - [`xcorr_norm`](CorrelationAnalyzer::xcorr_norm) - the same, scaled so the
//!   zero-lag entries are the correlation coefficients
//!
//! # Definitions
//!
//! With μ the channel mean and N the number of samples:
//!
//! ```text
//! ρ_ij     = Σ (x_i - μ_i)(x_j - μ_j) / sqrt(Σ (x_i - μ_i)² · Σ (x_j - μ_j)²)
//! R_ij(τ)  = (1/N) Σ_n (x_i[n] - μ_i)(x_j[n + τ] - μ_j),   τ ∈ [-(N-1), N-1]
//! R̂_ij(τ)  = R_ij(τ) / sqrt(R_ii(0) · R_jj(0)),            R̂_ij(0) = ρ_ij
//! ```
//!
//! # Example
//!
//! ```rust
//! use neurotime_analysis::CorrelationAnalyzer;
//! use neurotime_core::TimeSeries;
//!
//! let x: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
//! let y: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin() + 0.1 * (i % 3) as f64).collect();
//! let ts = TimeSeries::new(vec![x, y], 100.0).unwrap();
//!
//! let analyzer = CorrelationAnalyzer::new(&ts);
//! let corr = analyzer.correlation().unwrap();
//! assert_eq!(corr.get(0, 1), corr.get(1, 0));
//!
//! let norm = analyzer.xcorr_norm().unwrap();
//! assert_eq!(norm.at(0, 1, 0), Some(corr.get(0, 1)));
//! ```

use std::ops::{Index, RangeInclusive};

use neurotime_core::TimeSeries;
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::memo::Memo;
use crate::stats::{demean, is_constant};
use crate::xcorr::xcorr_fft;

/// Square, symmetric matrix of Pearson correlation coefficients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    size: usize,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Coefficient between channels `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    /// Rows as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.size).map(|i| self.row(i).to_vec()).collect()
    }
}

impl Index<(usize, usize)> for CorrelationMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.values[i * self.size + j]
    }
}

/// Lagged correlation for every ordered channel pair.
///
/// Each pair holds `2 * max_lag + 1` values laid out as
/// `[R(-max_lag), …, R(0), …, R(max_lag)]`. `pair(j, i)` is `pair(i, j)`
/// reversed, so `at(i, j, τ) == at(j, i, -τ)` holds exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossCorrelation {
    n_channels: usize,
    max_lag: usize,
    sampling_interval: f64,
    values: Vec<f64>,
}

impl CrossCorrelation {
    fn zeroed(n_channels: usize, max_lag: usize, sampling_interval: f64) -> Self {
        Self {
            n_channels,
            max_lag,
            sampling_interval,
            values: vec![0.0; n_channels * n_channels * (2 * max_lag + 1)],
        }
    }

    /// Number of channels on each axis.
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Largest lag magnitude, in samples.
    pub fn max_lag(&self) -> usize {
        self.max_lag
    }

    /// Values per pair (`2 * max_lag + 1`).
    pub fn width(&self) -> usize {
        2 * self.max_lag + 1
    }

    /// Index of lag 0 inside each pair.
    pub fn zero_lag_index(&self) -> usize {
        self.max_lag
    }

    /// Lags covered, in samples.
    pub fn lags(&self) -> RangeInclusive<isize> {
        -(self.max_lag as isize)..=self.max_lag as isize
    }

    /// Lag axis in seconds.
    pub fn lag_times(&self) -> Vec<f64> {
        self.lags()
            .map(|lag| lag as f64 * self.sampling_interval)
            .collect()
    }

    /// All lags for the pair `(i, j)`.
    pub fn pair(&self, i: usize, j: usize) -> &[f64] {
        let start = (i * self.n_channels + j) * self.width();
        &self.values[start..start + self.width()]
    }

    fn pair_mut(&mut self, i: usize, j: usize) -> &mut [f64] {
        let width = self.width();
        let start = (i * self.n_channels + j) * width;
        &mut self.values[start..start + width]
    }

    /// Value for the pair `(i, j)` at `lag` samples; `None` outside the lag range.
    pub fn at(&self, i: usize, j: usize, lag: isize) -> Option<f64> {
        if lag.unsigned_abs() > self.max_lag {
            return None;
        }
        Some(self.pair(i, j)[(lag + self.max_lag as isize) as usize])
    }

    /// The pair `(i, j)` as a single-channel series on the lag-time axis.
    pub fn to_time_series(&self, i: usize, j: usize) -> Result<TimeSeries> {
        let series =
            TimeSeries::from_interval(vec![self.pair(i, j).to_vec()], self.sampling_interval)?
                .with_t0(-(self.max_lag as f64) * self.sampling_interval);
        Ok(series)
    }
}

/// Correlation and cross-correlation between the channels of one series.
#[derive(Debug)]
pub struct CorrelationAnalyzer<'a> {
    input: &'a TimeSeries,
    correlation: Memo<CorrelationMatrix>,
    xcorr: Memo<CrossCorrelation>,
    xcorr_norm: Memo<CrossCorrelation>,
}

impl<'a> CorrelationAnalyzer<'a> {
    /// Wrap a series; nothing is computed until an output is requested.
    pub fn new(input: &'a TimeSeries) -> Self {
        Self {
            input,
            correlation: Memo::new(),
            xcorr: Memo::new(),
            xcorr_norm: Memo::new(),
        }
    }

    /// The analyzed series.
    pub fn input(&self) -> &TimeSeries {
        self.input
    }

    /// Pearson correlation matrix over the full length.
    pub fn correlation(&self) -> Result<&CorrelationMatrix> {
        self.correlation
            .get_or_compute(|| correlation_matrix(self.input))
    }

    /// Biased covariance at every lag from `-(N-1)` to `N-1`.
    pub fn xcorr(&self) -> Result<&CrossCorrelation> {
        self.xcorr.get_or_compute(|| cross_covariance(self.input))
    }

    /// Cross-correlation scaled so lag 0 reproduces [`correlation`](Self::correlation).
    pub fn xcorr_norm(&self) -> Result<&CrossCorrelation> {
        self.xcorr_norm.get_or_compute(|| {
            let correlation = self.correlation()?;
            let xcorr = self.xcorr()?;
            Ok(normalize(xcorr, correlation))
        })
    }
}

fn require_pairs(input: &TimeSeries) -> Result<()> {
    if input.n_channels() < 2 {
        return Err(AnalysisError::invalid_input(format!(
            "correlation needs at least 2 channels, got {}",
            input.n_channels()
        )));
    }
    Ok(())
}

fn correlation_matrix(input: &TimeSeries) -> Result<CorrelationMatrix> {
    require_pairs(input)?;
    if let Some(flat) = input.channels().position(is_constant) {
        return Err(AnalysisError::degenerate(format!(
            "channel {flat} has zero variance"
        )));
    }
    let size = input.n_channels();
    let centered: Vec<Vec<f64>> = input.channels().map(demean).collect();
    let energy: Vec<f64> = centered
        .iter()
        .map(|row| row.iter().map(|x| x * x).sum())
        .collect();

    let mut values = vec![0.0; size * size];
    for i in 0..size {
        values[i * size + i] = 1.0;
        for j in (i + 1)..size {
            let cross: f64 = centered[i]
                .iter()
                .zip(&centered[j])
                .map(|(a, b)| a * b)
                .sum();
            let rho = (cross / (energy[i] * energy[j]).sqrt()).clamp(-1.0, 1.0);
            values[i * size + j] = rho;
            values[j * size + i] = rho;
        }
    }

    tracing::debug!(channels = size, samples = input.len(), "correlation matrix");
    Ok(CorrelationMatrix { size, values })
}

fn cross_covariance(input: &TimeSeries) -> Result<CrossCorrelation> {
    require_pairs(input)?;
    let n = input.len();
    let size = input.n_channels();
    let max_lag = n - 1;
    let centered: Vec<Vec<f64>> = input.channels().map(demean).collect();

    let mut out = CrossCorrelation::zeroed(size, max_lag, input.sampling_interval());
    for i in 0..size {
        for j in i..size {
            let mut lagged = xcorr_fft(&centered[i], &centered[j], max_lag);
            for v in &mut lagged {
                *v /= n as f64;
            }
            if i == j {
                // Autocovariance is even in the lag; remove FFT round-off asymmetry.
                let width = lagged.len();
                for k in 0..max_lag {
                    let even = 0.5 * (lagged[k] + lagged[width - 1 - k]);
                    lagged[k] = even;
                    lagged[width - 1 - k] = even;
                }
            } else {
                let mut mirrored = lagged.clone();
                mirrored.reverse();
                out.pair_mut(j, i).copy_from_slice(&mirrored);
            }
            out.pair_mut(i, j).copy_from_slice(&lagged);
        }
    }

    tracing::debug!(
        channels = size,
        lags = out.width(),
        "cross-covariance for {} pairs",
        size * (size + 1) / 2
    );
    Ok(out)
}

fn normalize(xcorr: &CrossCorrelation, correlation: &CorrelationMatrix) -> CrossCorrelation {
    let size = xcorr.n_channels();
    let zero = xcorr.zero_lag_index();
    let mut out = xcorr.clone();

    for i in 0..size {
        for j in 0..size {
            let scale = (xcorr.pair(i, i)[zero] * xcorr.pair(j, j)[zero]).sqrt();
            let pair = out.pair_mut(i, j);
            for v in pair.iter_mut() {
                *v /= scale;
            }
            // Zero lag is the Pearson coefficient.
            pair[zero] = correlation.get(i, j);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_sine(n: usize, seed: u32) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|i| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let noise = f64::from(state >> 8) / f64::from(1u32 << 24);
                (10.0 * i as f64).sin() + noise
            })
            .collect()
    }

    fn two_channel(n: usize) -> TimeSeries {
        TimeSeries::new(vec![noisy_sine(n, 1), noisy_sine(n, 2)], std::f64::consts::PI).unwrap()
    }

    #[test]
    fn single_channel_is_rejected() {
        let ts = TimeSeries::from_channel(vec![1.0, 2.0, 3.0], 1.0).unwrap();
        let analyzer = CorrelationAnalyzer::new(&ts);
        assert!(matches!(
            analyzer.correlation(),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(analyzer.xcorr(), Err(AnalysisError::InvalidInput(_))));
        assert!(matches!(
            analyzer.xcorr_norm(),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn constant_channel_is_degenerate() {
        let ts = TimeSeries::new(vec![vec![1.0, 2.0, 3.0], vec![5.0; 3]], 1.0).unwrap();
        let analyzer = CorrelationAnalyzer::new(&ts);
        assert!(matches!(
            analyzer.correlation(),
            Err(AnalysisError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn perfectly_anticorrelated() {
        let x: Vec<f64> = (0..20).map(|i| (i as f64).sqrt()).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 - 2.0 * v).collect();
        let ts = TimeSeries::new(vec![x, y], 1.0).unwrap();
        let corr = CorrelationAnalyzer::new(&ts).correlation().unwrap().clone();
        assert!((corr[(0, 1)] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn xcorr_covers_all_lags() {
        let ts = two_channel(33);
        let analyzer = CorrelationAnalyzer::new(&ts);
        let xc = analyzer.xcorr().unwrap();
        assert_eq!(xc.max_lag(), 32);
        assert_eq!(xc.width(), 65);
        assert_eq!(xc.lags(), -32..=32);
        assert_eq!(xc.at(0, 1, 33), None);
        let times = xc.lag_times();
        assert!((times[0] + 32.0 / std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn xcorr_zero_lag_is_population_covariance() {
        let ts = two_channel(100);
        let analyzer = CorrelationAnalyzer::new(&ts);
        let xc = analyzer.xcorr().unwrap();

        let a = demean(ts.channel(0));
        let b = demean(ts.channel(1));
        let cov: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum::<f64>() / 100.0;
        assert!((xc.at(0, 1, 0).unwrap() - cov).abs() < 1e-10);
    }

    #[test]
    fn outputs_are_memoized() {
        let ts = two_channel(64);
        let analyzer = CorrelationAnalyzer::new(&ts);
        let first = analyzer.xcorr_norm().unwrap();
        let second = analyzer.xcorr_norm().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn lag_series_has_centered_axis() {
        let ts = two_channel(16);
        let analyzer = CorrelationAnalyzer::new(&ts);
        let series = analyzer.xcorr_norm().unwrap().to_time_series(0, 1).unwrap();
        assert_eq!(series.len(), 31);
        let zero = series.index_at(0.0).unwrap();
        assert_eq!(zero, 15);
    }
}
