//! Error types for time-series construction and combination.

use thiserror::Error;

/// Errors raised while building or combining [`TimeSeries`](crate::TimeSeries) values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    /// No channels, or channels without samples.
    #[error("time series must contain at least one channel with at least one sample")]
    Empty,

    /// Channels of different lengths were supplied.
    #[error("channel {channel} has {found} samples, expected {expected}")]
    RaggedChannels {
        /// Index of the offending channel.
        channel: usize,
        /// Length of the first channel.
        expected: usize,
        /// Length of the offending channel.
        found: usize,
    },

    /// Sampling interval (or rate) is zero, negative, or not finite.
    #[error("sampling interval must be finite and positive, got {0}")]
    InvalidSamplingInterval(f64),

    /// Two series that must be aligned have different lengths.
    #[error("length mismatch: {left} vs {right} samples")]
    LengthMismatch {
        /// Length of the first series.
        left: usize,
        /// Length of the second series.
        right: usize,
    },

    /// Two series that must be aligned have different sampling intervals.
    #[error("sampling interval mismatch: {left} vs {right}")]
    IntervalMismatch {
        /// Interval of the first series.
        left: f64,
        /// Interval of the second series.
        right: f64,
    },

    /// A sample range that does not lie inside the series.
    #[error("sample range {start}..{end} out of bounds for {len} samples")]
    RangeOutOfBounds {
        /// First requested sample.
        start: usize,
        /// One past the last requested sample.
        end: usize,
        /// Number of samples in the series.
        len: usize,
    },

    /// A channel index past the last channel.
    #[error("channel {index} out of range for {channels} channels")]
    ChannelOutOfRange {
        /// Requested channel.
        index: usize,
        /// Number of channels available.
        channels: usize,
    },
}
