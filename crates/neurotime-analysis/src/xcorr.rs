//! Cross-correlation kernels: time-domain (direct) and frequency-domain (FFT)
//! implementations.
//!
//! Cross-correlation measures the similarity between two signals as a function of the
//! time-shift (lag) applied to one of them. [`CorrelationAnalyzer`](crate::CorrelationAnalyzer)
//! and the cross-correlation event-triggered average are both built on these kernels.
//!
//! # Mathematical Definition
//!
//! The cross-correlation of signals x and y at lag τ is:
//!
//! ```text
//! R_xy(τ) = Σ_{n} x[n] · y[n + τ]
//! ```
//!
//! R_xy peaks at lag τ₀ when y is a delayed version of x by τ₀ samples,
//! i.e., y\[n\] = x\[n - τ₀\] → peak at τ = τ₀. Swapping the arguments mirrors
//! the lag axis: R_yx(τ) = R_xy(-τ).
//!
//! # FFT-based Computation
//!
//! For long signals the O(n · max_lag) direct sum is expensive. The FFT-based method
//! exploits the cross-correlation theorem:
//!
//! ```text
//! R_xy(τ) = IFFT( conj(X(f)) · Y(f) )
//! ```
//!
//! where X, Y are the DFTs of x and y zero-padded to at least `len(x) + len(y) - 1`
//! points, so the result is the linear correlation and never wraps around.
//!
//! # References
//!
//! - Oppenheim & Schafer, "Discrete-Time Signal Processing" (3rd ed.), section 2.8.
//! - Proakis & Manolakis, "Digital Signal Processing" (4th ed.), section 6.4.

use crate::fft::{Fft, to_complex};
use rustfft::num_complex::Complex;

/// Compute the direct time-domain cross-correlation.
///
/// Time complexity O(n · max_lag). For large signals or large max_lag, prefer
/// [`xcorr_fft`] which is O(n log n).
///
/// # Returns
///
/// `Vec<f64>` of length `2 * max_lag + 1`. Entry `i` contains R_xy at lag
/// `i - max_lag`, i.e. layout `[R(-max_lag), …, R(0), …, R(max_lag)]`.
pub fn xcorr_direct(x: &[f64], y: &[f64], max_lag: usize) -> Vec<f64> {
    let max_lag = max_lag as isize;

    (-max_lag..=max_lag)
        .map(|lag| {
            let mut sum = 0.0;
            for (n, &xv) in x.iter().enumerate() {
                let m = n as isize + lag;
                if m >= 0 && (m as usize) < y.len() {
                    sum += xv * y[m as usize];
                }
            }
            sum
        })
        .collect()
}

/// Compute FFT-based cross-correlation.
///
/// Uses the cross-correlation theorem R_xy = IFFT(conj(X) · Y) with zero-padding
/// to avoid circular wrap-around. Time complexity O(n log n). Lags that cannot
/// overlap the two signals are exactly zero.
///
/// # Returns
///
/// `Vec<f64>` of length `2 * max_lag + 1` arranged as
/// `[R(-max_lag), …, R(0), …, R(max_lag)]`.
pub fn xcorr_fft(x: &[f64], y: &[f64], max_lag: usize) -> Vec<f64> {
    let out_len = 2 * max_lag + 1;
    if x.is_empty() || y.is_empty() {
        return vec![0.0; out_len];
    }

    // Zero-pad to next power of 2 >= len(x) + len(y) - 1 to avoid circular aliasing.
    let fft_size = (x.len() + y.len() - 1).next_power_of_two().max(2);
    let fft = Fft::new(fft_size);

    let mut buf_x = to_complex(x);
    buf_x.resize(fft_size, Complex::new(0.0, 0.0));
    let mut buf_y = to_complex(y);
    buf_y.resize(fft_size, Complex::new(0.0, 0.0));

    fft.forward_complex(&mut buf_x);
    fft.forward_complex(&mut buf_y);

    for (cx, cy) in buf_x.iter_mut().zip(buf_y.iter()) {
        *cx = cx.conj() * cy;
    }

    fft.inverse_complex(&mut buf_x);

    // The circular result has:
    //   Positive lags τ = 0, 1, …  at indices 0, 1, …
    //   Negative lags τ = -1, -2, … at indices fft_size-1, fft_size-2, …
    let max_lag = max_lag as isize;
    (-max_lag..=max_lag)
        .map(|lag| {
            let reachable = lag < y.len() as isize && -lag < x.len() as isize;
            if !reachable {
                return 0.0;
            }
            let idx = if lag >= 0 {
                lag as usize
            } else {
                (fft_size as isize + lag) as usize
            };
            buf_x[idx].re
        })
        .collect()
}
