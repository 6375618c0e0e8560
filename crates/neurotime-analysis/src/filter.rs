//! Frequency-domain band limiting.
//!
//! [`FilterAnalyzer`] transforms each channel with a full-length FFT, zeroes
//! every bin whose absolute frequency lies outside the passband, and
//! transforms back. Positive and negative frequencies are treated alike, so
//! the spectrum stays conjugate-symmetric and the output is real.
//!
//! # Limitations
//!
//! This is an ideal brick-wall filter applied to a finite record. The FFT
//! treats the record as one period of a periodic signal, so discontinuities
//! at the ends and components that fall between bins leak across the cutoff,
//! and the sharp edge rings in the time domain. Energy outside the passband is
//! attenuated, not removed; two superposed components close in frequency are
//! not separated exactly.

use neurotime_core::TimeSeries;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::fft::{Fft, fft_frequencies, to_complex};
use crate::memo::Memo;

/// Cutoff frequencies in Hz. Either bound may be left open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterParams {
    /// Lower cutoff; frequencies below it are removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb: Option<f64>,
    /// Upper cutoff; frequencies above it are removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ub: Option<f64>,
}

impl FilterParams {
    /// Keep frequencies at or above `lb`.
    pub fn highpass(lb: f64) -> Self {
        Self {
            lb: Some(lb),
            ub: None,
        }
    }

    /// Keep frequencies at or below `ub`.
    pub fn lowpass(ub: f64) -> Self {
        Self {
            lb: None,
            ub: Some(ub),
        }
    }

    /// Keep frequencies in `[lb, ub]`.
    pub fn bandpass(lb: f64, ub: f64) -> Self {
        Self {
            lb: Some(lb),
            ub: Some(ub),
        }
    }

    /// Which kind of filter these bounds describe.
    pub fn passband(&self) -> Passband {
        match (self.lb, self.ub) {
            (None, None) => Passband::All,
            (Some(lb), None) => Passband::Highpass(lb),
            (None, Some(ub)) => Passband::Lowpass(ub),
            (Some(lb), Some(ub)) => Passband::Bandpass(lb, ub),
        }
    }
}

/// Frequencies kept by a filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Passband {
    /// No bound; the signal passes unchanged.
    All,
    /// `|f| >= lb`.
    Highpass(f64),
    /// `|f| <= ub`.
    Lowpass(f64),
    /// `lb <= |f| <= ub`.
    Bandpass(f64, f64),
}

impl Passband {
    /// Whether a bin at (signed) frequency `f` is kept.
    pub fn contains(&self, f: f64) -> bool {
        let f = f.abs();
        match *self {
            Passband::All => true,
            Passband::Highpass(lb) => f >= lb,
            Passband::Lowpass(ub) => f <= ub,
            Passband::Bandpass(lb, ub) => f >= lb && f <= ub,
        }
    }

    /// Check the bounds against the Nyquist frequency of the signal.
    pub fn validate(&self, nyquist: f64) -> Result<()> {
        let check = |name: &str, bound: f64| {
            if !bound.is_finite() || bound < 0.0 {
                return Err(AnalysisError::out_of_bounds(format!(
                    "{name} = {bound} must be a non-negative frequency"
                )));
            }
            if bound > nyquist {
                return Err(AnalysisError::out_of_bounds(format!(
                    "{name} = {bound} Hz exceeds the Nyquist frequency {nyquist} Hz"
                )));
            }
            Ok(())
        };

        match *self {
            Passband::All => Ok(()),
            Passband::Highpass(lb) => check("lb", lb),
            Passband::Lowpass(ub) => check("ub", ub),
            Passband::Bandpass(lb, ub) => {
                check("lb", lb)?;
                check("ub", ub)?;
                if lb > ub {
                    return Err(AnalysisError::out_of_bounds(format!(
                        "lower bound {lb} Hz is above upper bound {ub} Hz"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Brick-wall FFT filter over every channel of a series.
#[derive(Debug)]
pub struct FilterAnalyzer<'a> {
    input: &'a TimeSeries,
    params: FilterParams,
    filtered: Memo<TimeSeries>,
}

impl<'a> FilterAnalyzer<'a> {
    /// Wrap a series with the given cutoffs; bounds are checked on first use.
    pub fn new(input: &'a TimeSeries, params: FilterParams) -> Self {
        Self {
            input,
            params,
            filtered: Memo::new(),
        }
    }

    /// The configured cutoffs.
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Band-limited copy of the input, on the same time axis.
    pub fn filtered_fourier(&self) -> Result<&TimeSeries> {
        self.filtered.get_or_compute(|| {
            let passband = self.params.passband();
            passband.validate(self.input.nyquist())?;

            let n = self.input.len();
            let fft = Fft::new(n);
            let keep: Vec<bool> = fft_frequencies(n, self.input.sampling_rate())
                .into_iter()
                .map(|f| passband.contains(f))
                .collect();
            tracing::debug!(
                ?passband,
                bins = n,
                kept = keep.iter().filter(|&&k| k).count(),
                "fourier filter"
            );

            let filtered = self.input.map_channels(|samples| {
                let mut buffer = to_complex(samples);
                fft.forward_complex(&mut buffer);
                for (bin, &kept) in buffer.iter_mut().zip(&keep) {
                    if !kept {
                        *bin = Complex::new(0.0, 0.0);
                    }
                }
                fft.inverse_complex(&mut buffer);
                buffer.iter().map(|c| c.re).collect()
            })?;
            Ok(filtered)
        })
    }
}
