//! Welch cross-spectral density estimation.
//!
//! Every channel is cut into segments of `segment_len` samples stepping by
//! `segment_len - overlap`; each segment is windowed and transformed, and the
//! cross-periodograms `conj(X_i) · X_j` are averaged over segments. A signal
//! shorter than one segment is zero-padded into a single segment. Samples
//! after the last full segment are not used.
//!
//! The result is a one-sided density: interior bins are doubled and the whole
//! spectrum is scaled by `1 / (fs · Σ w²)`, so `Σ S_ii · df` approximates the
//! channel variance.

use rustfft::num_complex::Complex;

use crate::fft::{Fft, Window, rfft_frequencies, to_complex};

/// Averaged cross-spectral matrix over the one-sided frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSpectrum {
    n_channels: usize,
    segments: usize,
    frequencies: Vec<f64>,
    values: Vec<Complex<f64>>,
}

impl CrossSpectrum {
    /// Number of channels on each axis.
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Number of segments averaged.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Frequency of every bin (Hz).
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Number of frequency bins.
    pub fn n_bins(&self) -> usize {
        self.frequencies.len()
    }

    /// Cross-spectral density `S_ij(f)`; `S_ji` is its conjugate.
    pub fn pair(&self, i: usize, j: usize) -> &[Complex<f64>] {
        let start = (i * self.n_channels + j) * self.n_bins();
        &self.values[start..start + self.n_bins()]
    }

    /// Power spectral density of channel `i` (real part of `S_ii`).
    pub fn power(&self, i: usize) -> Vec<f64> {
        self.pair(i, i).iter().map(|c| c.re).collect()
    }
}

/// Segment start positions for a signal of `len` samples.
pub fn segment_starts(len: usize, segment_len: usize, overlap: usize) -> Vec<usize> {
    if len <= segment_len {
        return vec![0];
    }
    let step = segment_len - overlap;
    (0..=(len - segment_len) / step).map(|k| k * step).collect()
}

/// Welch estimate of every cross-spectral density of `input`.
///
/// `overlap` must be smaller than `segment_len`, and `segment_len` at least 2.
/// Channels are used as given; remove the mean beforehand if the DC bin
/// should not dominate.
pub fn welch_csd(
    channels: &[Vec<f64>],
    sampling_rate: f64,
    segment_len: usize,
    overlap: usize,
    window: Window,
) -> CrossSpectrum {
    let n_channels = channels.len();
    let len = channels.first().map_or(0, Vec::len);
    let n_bins = segment_len / 2 + 1;
    let fft = Fft::new(segment_len);
    let taper = window.coefficients(segment_len);
    let starts = segment_starts(len, segment_len, overlap);

    let mut values = vec![Complex::new(0.0, 0.0); n_channels * n_channels * n_bins];
    let mut spectra: Vec<Vec<Complex<f64>>> = Vec::with_capacity(n_channels);

    for &start in &starts {
        spectra.clear();
        for samples in channels {
            let end = (start + segment_len).min(samples.len());
            let mut buffer = to_complex(&samples[start..end]);
            buffer.resize(segment_len, Complex::new(0.0, 0.0));
            for (c, &w) in buffer.iter_mut().zip(&taper) {
                *c *= w;
            }
            fft.forward_complex(&mut buffer);
            buffer.truncate(n_bins);
            spectra.push(buffer);
        }

        for i in 0..n_channels {
            for j in i..n_channels {
                let offset = (i * n_channels + j) * n_bins;
                for (bin, acc) in values[offset..offset + n_bins].iter_mut().enumerate() {
                    *acc += spectra[i][bin].conj() * spectra[j][bin];
                }
            }
        }
    }

    let window_power: f64 = taper.iter().map(|w| w * w).sum();
    let scale = 1.0 / (sampling_rate * window_power * starts.len() as f64);
    let nyquist_bin = (segment_len % 2 == 0).then_some(segment_len / 2);

    for i in 0..n_channels {
        for j in i..n_channels {
            let offset = (i * n_channels + j) * n_bins;
            for (bin, v) in values[offset..offset + n_bins].iter_mut().enumerate() {
                let one_sided = if bin == 0 || Some(bin) == nyquist_bin {
                    1.0
                } else {
                    2.0
                };
                *v *= scale * one_sided;
            }
            if i != j {
                let mirror = (j * n_channels + i) * n_bins;
                for bin in 0..n_bins {
                    values[mirror + bin] = values[offset + bin].conj();
                }
            }
        }
    }

    tracing::debug!(
        channels = n_channels,
        segments = starts.len(),
        segment_len,
        "welch cross-spectral density"
    );

    CrossSpectrum {
        n_channels,
        segments: starts.len(),
        frequencies: rfft_frequencies(segment_len, sampling_rate),
        values,
    }
}
