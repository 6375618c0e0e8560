//! Uniformly sampled, multi-channel time series.
//!
//! [`TimeSeries`] is the input and output currency of every analyzer: an
//! immutable block of `f64` samples, one row per channel, with a fixed
//! sampling interval and a start time.
//!
//! ```text
//! t[k] = t0 + k · dt
//! ```
//!
//! # Example
//!
//! ```rust
//! use neurotime_core::TimeSeries;
//!
//! let ts = TimeSeries::new(vec![vec![0.0, 1.0, 0.0, -1.0]], 4.0).unwrap();
//! assert_eq!(ts.len(), 4);
//! assert_eq!(ts.sampling_interval(), 0.25);
//! assert_eq!(ts.time_at(2), 0.5);
//! ```

use std::ops::Range;

use serde::Serialize;

use crate::error::SignalError;

/// Immutable multi-channel signal sampled at a fixed interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    channels: Vec<Vec<f64>>,
    sampling_interval: f64,
    t0: f64,
}

impl TimeSeries {
    /// Build a series from channel rows and a sampling rate in Hz.
    pub fn new(channels: Vec<Vec<f64>>, sampling_rate: f64) -> Result<Self, SignalError> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(SignalError::InvalidSamplingInterval(1.0 / sampling_rate));
        }
        Self::from_interval(channels, 1.0 / sampling_rate)
    }

    /// Build a series from channel rows and a sampling interval in seconds.
    pub fn from_interval(
        channels: Vec<Vec<f64>>,
        sampling_interval: f64,
    ) -> Result<Self, SignalError> {
        if !sampling_interval.is_finite() || sampling_interval <= 0.0 {
            return Err(SignalError::InvalidSamplingInterval(sampling_interval));
        }
        let expected = channels.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(SignalError::Empty);
        }
        if let Some((channel, row)) = channels
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != expected)
        {
            return Err(SignalError::RaggedChannels {
                channel,
                expected,
                found: row.len(),
            });
        }

        Ok(Self {
            channels,
            sampling_interval,
            t0: 0.0,
        })
    }

    /// Build a single-channel series from samples and a sampling rate in Hz.
    pub fn from_channel(samples: Vec<f64>, sampling_rate: f64) -> Result<Self, SignalError> {
        Self::new(vec![samples], sampling_rate)
    }

    /// Set the time of the first sample.
    pub fn with_t0(mut self, t0: f64) -> Self {
        self.t0 = t0;
        self
    }

    /// Number of channels.
    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Always `false`; construction rejects empty series.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seconds between consecutive samples.
    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    /// Samples per second.
    pub fn sampling_rate(&self) -> f64 {
        1.0 / self.sampling_interval
    }

    /// Half the sampling rate.
    pub fn nyquist(&self) -> f64 {
        0.5 * self.sampling_rate()
    }

    /// Time of the first sample.
    pub fn t0(&self) -> f64 {
        self.t0
    }

    /// Length of the series in seconds (`len · dt`).
    pub fn duration(&self) -> f64 {
        self.len() as f64 * self.sampling_interval
    }

    /// Time of sample `k`.
    pub fn time_at(&self, k: usize) -> f64 {
        self.t0 + k as f64 * self.sampling_interval
    }

    /// Time axis, one entry per sample.
    pub fn time(&self) -> Vec<f64> {
        (0..self.len()).map(|k| self.time_at(k)).collect()
    }

    /// Index of the sample nearest to time `t`, or `None` outside the series.
    pub fn index_at(&self, t: f64) -> Option<usize> {
        let k = ((t - self.t0) / self.sampling_interval).round();
        if k < 0.0 || !k.is_finite() {
            return None;
        }
        let k = k as usize;
        (k < self.len()).then_some(k)
    }

    /// Samples of channel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= n_channels()`.
    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }

    /// Samples of channel `index`, or an error past the last channel.
    pub fn try_channel(&self, index: usize) -> Result<&[f64], SignalError> {
        self.channels
            .get(index)
            .map(Vec::as_slice)
            .ok_or(SignalError::ChannelOutOfRange {
                index,
                channels: self.n_channels(),
            })
    }

    /// Iterate over channel rows.
    pub fn channels(&self) -> impl ExactSizeIterator<Item = &[f64]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Single sample, `None` if either index is out of range.
    pub fn sample(&self, channel: usize, k: usize) -> Option<f64> {
        self.channels.get(channel)?.get(k).copied()
    }

    /// Sub-series over a sample range; `t0` moves to the first kept sample.
    pub fn slice(&self, range: Range<usize>) -> Result<Self, SignalError> {
        if range.start >= range.end || range.end > self.len() {
            return Err(SignalError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len(),
            });
        }
        let channels = self
            .channels
            .iter()
            .map(|row| row[range.clone()].to_vec())
            .collect();

        Ok(Self {
            channels,
            sampling_interval: self.sampling_interval,
            t0: self.time_at(range.start),
        })
    }

    /// Sub-series covering `[start, stop)` in seconds.
    pub fn slice_time(&self, start: f64, stop: f64) -> Result<Self, SignalError> {
        let first = ((start - self.t0) / self.sampling_interval).ceil().max(0.0) as usize;
        let last = ((stop - self.t0) / self.sampling_interval).ceil().max(0.0) as usize;
        self.slice(first..last.min(self.len()))
    }

    /// New series holding the listed channels, in order.
    pub fn select(&self, indices: &[usize]) -> Result<Self, SignalError> {
        let channels = indices
            .iter()
            .map(|&i| self.try_channel(i).map(<[f64]>::to_vec))
            .collect::<Result<Vec<_>, _>>()?;
        if channels.is_empty() {
            return Err(SignalError::Empty);
        }

        Ok(Self {
            channels,
            sampling_interval: self.sampling_interval,
            t0: self.t0,
        })
    }

    /// Concatenate the channels of several aligned series.
    ///
    /// All inputs must share length and sampling interval; `t0` is taken from
    /// the first.
    pub fn stack(series: &[&TimeSeries]) -> Result<Self, SignalError> {
        let first = series.first().ok_or(SignalError::Empty)?;
        for other in &series[1..] {
            first.ensure_aligned(other)?;
        }
        let channels = series
            .iter()
            .flat_map(|ts| ts.channels.iter().cloned())
            .collect();

        Ok(Self {
            channels,
            sampling_interval: first.sampling_interval,
            t0: first.t0,
        })
    }

    /// Apply `f` to every channel, keeping the time axis.
    ///
    /// `f` must return rows of equal, non-zero length.
    pub fn map_channels<F>(&self, f: F) -> Result<Self, SignalError>
    where
        F: FnMut(&[f64]) -> Vec<f64>,
    {
        let channels = self.channels().map(f).collect();
        Ok(Self::from_interval(channels, self.sampling_interval)?.with_t0(self.t0))
    }

    /// Check that `other` has the same length and sampling interval.
    pub fn ensure_aligned(&self, other: &TimeSeries) -> Result<(), SignalError> {
        if self.len() != other.len() {
            return Err(SignalError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        if !intervals_match(self.sampling_interval, other.sampling_interval) {
            return Err(SignalError::IntervalMismatch {
                left: self.sampling_interval,
                right: other.sampling_interval,
            });
        }
        Ok(())
    }

    /// Consume the series and return its channel rows.
    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }
}

/// Sampling intervals compare equal within a relative tolerance, so series
/// built from a rate and from the equivalent interval still line up.
fn intervals_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
}
