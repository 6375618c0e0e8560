//! Neurotime Analysis - relationships between sampled time series
//!
//! Five analyzers, each borrowing one or two [`TimeSeries`](neurotime_core::TimeSeries)
//! inputs and computing its outputs lazily, once, on first access:
//!
//! - [`CorrelationAnalyzer`] - Pearson correlation matrix and lagged cross-correlation
//! - [`EventRelatedAnalyzer`] - event-triggered average, standard error, single
//!   trials, FIR deconvolution, and the cross-correlation estimate
//! - [`CoherenceAnalyzer`] - Welch coherence, cross-spectral phase, and delay
//! - [`HilbertAnalyzer`] - analytic signal, envelope, and instantaneous phase
//! - [`FilterAnalyzer`] - brick-wall band limiting in the frequency domain
//!
//! Supporting modules:
//!
//! - [`fft`] - FFT wrapper with windowing functions
//! - [`xcorr`] - direct and FFT cross-correlation kernels
//! - [`spectrum`] - Welch cross-spectral density
//! - [`deconvolution`] - least-squares FIR kernels for overlapping responses
//! - [`stats`] - sample moments and z-scores
//!
//! ## Errors
//!
//! Construction never fails. Every accessor returns
//! `Result<&T, AnalysisError>`; a failed computation is cached like a
//! successful one, so repeated calls return the same error.
//!
//! ## Example
//!
//! ```rust
//! use neurotime_analysis::{CoherenceAnalyzer, CorrelationAnalyzer};
//! use neurotime_core::TimeSeries;
//!
//! let x: Vec<f64> = (0..256)
//!     .map(|i| (i as f64 * 0.2).sin() + 0.1 * ((i * 37) % 101) as f64 / 101.0)
//!     .collect();
//! let y: Vec<f64> = (0..256)
//!     .map(|i| (i as f64 * 0.2 - 0.5).sin() + 0.01 * (i % 7) as f64)
//!     .collect();
//! let ts = TimeSeries::new(vec![x, y], 50.0).unwrap();
//!
//! let corr = CorrelationAnalyzer::new(&ts);
//! assert_eq!(corr.correlation().unwrap().get(0, 0), 1.0);
//!
//! let coh = CoherenceAnalyzer::new(&ts);
//! assert!(coh.coherence().unwrap().pair(0, 1).iter().all(|c| (0.0..=1.0).contains(c)));
//! ```

pub mod coherence;
pub mod correlation;
pub mod deconvolution;
pub mod error;
pub mod event_related;
pub mod fft;
pub mod filter;
pub mod hilbert;
mod memo;
pub mod spectrum;
pub mod stats;
pub mod xcorr;

pub use coherence::{CoherenceAnalyzer, CoherenceParams, PairSpectrum};
pub use correlation::{CorrelationAnalyzer, CorrelationMatrix, CrossCorrelation};
pub use error::{AnalysisError, Result};
pub use event_related::{
    BoundaryPolicy, EventRelatedAnalyzer, EventRelatedParams, EventResponse, EventTrials, Scaling,
};
pub use fft::{Fft, Window};
pub use filter::{FilterAnalyzer, FilterParams, Passband};
pub use hilbert::{HilbertAnalyzer, HilbertTransform, unwrap_phase};
pub use spectrum::{CrossSpectrum, welch_csd};
pub use xcorr::{xcorr_direct, xcorr_fft};
