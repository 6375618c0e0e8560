//! neurotime core - the sampled-signal container shared by every analyzer.
//!
//! - [`TimeSeries`] - immutable multi-channel samples with a fixed sampling
//!   interval and start time
//! - [`SignalError`] - construction and alignment failures
//!
//! Analyzers in `neurotime-analysis` borrow a `TimeSeries` read-only and wrap
//! their derived outputs in new `TimeSeries` values, so results keep a time
//! axis that downstream code can align to real units.
//!
//! # Example
//!
//! ```rust
//! use neurotime_core::TimeSeries;
//!
//! let bold = TimeSeries::from_interval(vec![vec![0.1, 0.4, 0.2, -0.3]], 2.0).unwrap();
//! let events = TimeSeries::from_interval(vec![vec![0.0, 1.0, 0.0, 2.0]], 2.0).unwrap();
//! bold.ensure_aligned(&events).unwrap();
//!
//! let both = TimeSeries::stack(&[&bold, &events]).unwrap();
//! assert_eq!(both.n_channels(), 2);
//! assert_eq!(both.sampling_rate(), 0.5);
//! ```

pub mod error;
pub mod time_series;

pub use error::SignalError;
pub use time_series::TimeSeries;
