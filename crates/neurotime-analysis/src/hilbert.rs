//! Hilbert transform and analytic-signal decomposition.
//!
//! The analytic signal of a real signal x is z = x + i·H{x}, where H is the
//! Hilbert transform. Its magnitude is the instantaneous amplitude (envelope)
//! and its argument the instantaneous phase.
//!
//! # Algorithm
//!
//! The transform is computed on the full signal length, without padding:
//! 1. FFT of the real signal (N points)
//! 2. Keep DC (bin 0) unchanged
//! 3. Double the positive frequencies: bins 1..N/2 for even N,
//!    bins 1..=(N-1)/2 for odd N
//! 4. Keep the Nyquist bin (N/2, even N only) unchanged
//! 5. Zero the negative frequencies
//! 6. Inverse FFT; the imaginary part is H{x}
//!
//! The real part of the returned analytic signal is the input sample itself,
//! not the round-tripped value, so `real()` reproduces the input exactly.
//!
//! # Example
//!
//! ```rust
//! use neurotime_analysis::HilbertAnalyzer;
//! use neurotime_core::TimeSeries;
//! use std::f64::consts::PI;
//!
//! let signal: Vec<f64> = (0..512).map(|k| (k as f64 * PI / 256.0).sin()).collect();
//! let ts = TimeSeries::from_channel(signal.clone(), 100.0).unwrap();
//!
//! let hilbert = HilbertAnalyzer::new(&ts);
//! assert_eq!(hilbert.real().unwrap().channel(0), &signal[..]);
//!
//! let envelope = hilbert.magnitude().unwrap();
//! assert!(envelope.channel(0).iter().all(|a| (a - 1.0).abs() < 1e-9));
//! ```

use std::f64::consts::PI;

use neurotime_core::TimeSeries;
use rustfft::num_complex::Complex;

use crate::error::{AnalysisError, Result};
use crate::fft::{Fft, to_complex};
use crate::memo::Memo;

/// Hilbert transform processor for one signal length.
#[derive(Debug)]
pub struct HilbertTransform {
    fft: Fft,
    len: usize,
}

impl HilbertTransform {
    /// Create a processor for signals of `len` samples (any length, not only powers of 2).
    pub fn new(len: usize) -> Self {
        Self {
            fft: Fft::new(len),
            len,
        }
    }

    /// Signal length this processor was planned for.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the planned length is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Compute the analytic signal.
    ///
    /// Input longer than the planned length is truncated, shorter input is
    /// zero-padded; the result has `min(signal.len(), len)` samples.
    pub fn analytic_signal(&self, signal: &[f64]) -> Vec<Complex<f64>> {
        let n = signal.len().min(self.len);
        if n == 0 {
            return Vec::new();
        }

        let mut buffer = to_complex(&signal[..n]);
        buffer.resize(self.len, Complex::new(0.0, 0.0));
        self.fft.forward_complex(&mut buffer);

        // Last doubled bin: N/2 - 1 for even N (Nyquist stays), (N-1)/2 for odd N.
        let positive_end = self.len.div_ceil(2);
        for bin in buffer.iter_mut().take(positive_end).skip(1) {
            *bin *= 2.0;
        }
        let negative_start = self.len / 2 + 1;
        for bin in buffer.iter_mut().skip(negative_start) {
            *bin = Complex::new(0.0, 0.0);
        }

        self.fft.inverse_complex(&mut buffer);

        buffer.truncate(n);
        for (z, &x) in buffer.iter_mut().zip(signal) {
            z.re = x;
        }
        buffer
    }

    /// Instantaneous phase in radians, wrapped to (-π, π].
    pub fn instantaneous_phase(&self, signal: &[f64]) -> Vec<f64> {
        self.analytic_signal(signal).iter().map(wrapped_arg).collect()
    }

    /// Instantaneous amplitude (envelope).
    pub fn instantaneous_amplitude(&self, signal: &[f64]) -> Vec<f64> {
        self.analytic_signal(signal).iter().map(|z| z.norm()).collect()
    }

    /// Instantaneous frequency in Hz; one sample shorter than the input.
    pub fn instantaneous_frequency(&self, signal: &[f64], sampling_rate: f64) -> Vec<f64> {
        frequency_from_phase(&unwrap_phase(&self.instantaneous_phase(signal)), sampling_rate)
    }
}

/// Argument of `z` in (-π, π]; atan2's -π is folded onto π.
fn wrapped_arg(z: &Complex<f64>) -> f64 {
    let phase = z.arg();
    if phase <= -PI { PI } else { phase }
}

/// Unwrap a phase sequence by removing 2π jumps between neighbours.
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(phase.len());
    let mut offset = 0.0;
    let mut previous: Option<f64> = None;

    for &p in phase {
        if let Some(prev) = previous {
            let delta = p - prev;
            if delta > PI {
                offset -= 2.0 * PI;
            } else if delta < -PI {
                offset += 2.0 * PI;
            }
        }
        unwrapped.push(p + offset);
        previous = Some(p);
    }

    unwrapped
}

fn frequency_from_phase(unwrapped: &[f64], sampling_rate: f64) -> Vec<f64> {
    unwrapped
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) * sampling_rate / (2.0 * PI))
        .collect()
}

/// Analytic-signal views of every channel of a series.
///
/// Each output is computed on first access and cached.
#[derive(Debug)]
pub struct HilbertAnalyzer<'a> {
    input: &'a TimeSeries,
    analytic: Memo<Vec<Vec<Complex<f64>>>>,
    magnitude: Memo<TimeSeries>,
    phase: Memo<TimeSeries>,
    unwrapped_phase: Memo<TimeSeries>,
    frequency: Memo<TimeSeries>,
}

impl<'a> HilbertAnalyzer<'a> {
    /// Wrap a series.
    pub fn new(input: &'a TimeSeries) -> Self {
        Self {
            input,
            analytic: Memo::new(),
            magnitude: Memo::new(),
            phase: Memo::new(),
            unwrapped_phase: Memo::new(),
            frequency: Memo::new(),
        }
    }

    /// The analyzed series.
    pub fn input(&self) -> &TimeSeries {
        self.input
    }

    /// Complex analytic signal, one vector per channel.
    pub fn analytic(&self) -> Result<&[Vec<Complex<f64>>]> {
        self.analytic
            .get_or_compute(|| {
                let transform = HilbertTransform::new(self.input.len());
                tracing::debug!(
                    channels = self.input.n_channels(),
                    len = self.input.len(),
                    "analytic signal"
                );
                Ok(self
                    .input
                    .channels()
                    .map(|x| transform.analytic_signal(x))
                    .collect())
            })
            .map(Vec::as_slice)
    }

    /// Real part of the analytic signal; identical to the input.
    pub fn real(&self) -> Result<&TimeSeries> {
        Ok(self.input)
    }

    /// Instantaneous amplitude.
    pub fn magnitude(&self) -> Result<&TimeSeries> {
        self.magnitude
            .get_or_compute(|| self.map_analytic(|z| z.iter().map(|c| c.norm()).collect()))
    }

    /// Instantaneous phase wrapped to (-π, π].
    pub fn phase(&self) -> Result<&TimeSeries> {
        self.phase
            .get_or_compute(|| self.map_analytic(|z| z.iter().map(wrapped_arg).collect()))
    }

    /// Instantaneous phase with 2π discontinuities removed.
    pub fn unwrapped_phase(&self) -> Result<&TimeSeries> {
        self.unwrapped_phase.get_or_compute(|| {
            let phase = self.phase()?;
            Ok(phase.map_channels(unwrap_phase)?)
        })
    }

    /// Instantaneous frequency in Hz.
    ///
    /// Each value is the phase advance between two neighbouring samples, so
    /// the series has one sample fewer than the input and starts half a
    /// sampling interval later.
    pub fn instantaneous_frequency(&self) -> Result<&TimeSeries> {
        self.frequency.get_or_compute(|| {
            if self.input.len() < 2 {
                return Err(AnalysisError::invalid_input(
                    "instantaneous frequency needs at least 2 samples",
                ));
            }
            let unwrapped = self.unwrapped_phase()?;
            let rate = self.input.sampling_rate();
            let channels = unwrapped
                .channels()
                .map(|phase| frequency_from_phase(phase, rate))
                .collect();
            let dt = self.input.sampling_interval();
            Ok(TimeSeries::from_interval(channels, dt)?.with_t0(self.input.t0() + 0.5 * dt))
        })
    }

    fn map_analytic<F>(&self, view: F) -> Result<TimeSeries>
    where
        F: Fn(&[Complex<f64>]) -> Vec<f64>,
    {
        let channels = self.analytic()?.iter().map(|z| view(z)).collect();
        Ok(TimeSeries::from_interval(channels, self.input.sampling_interval())?
            .with_t0(self.input.t0()))
    }
}
