//! Finite impulse response (FIR) deconvolution of overlapping event responses.
//!
//! The observed signal is modelled as a sum of fixed-length kernels, one per
//! event type, started at every onset of that type:
//!
//! ```text
//! y[n] = Σ_types Σ_{onsets p} h_type[n - p - offset] + e[n]
//! ```
//!
//! With one unknown per (type, window sample) the design matrix X has a 1 in
//! row `p + offset + l`, column `(type, l)` for every onset p. Rows outside the
//! signal are left out, so onsets near the edges still contribute their
//! in-range samples.
//!
//! The least-squares estimate solves the normal equations `XᵀX β = Xᵀy`.
//! `XᵀX` holds overlap counts and is built straight from the onsets; it is
//! decomposed once with an SVD and reused for every channel. When no two
//! windows overlap, `XᵀX` is diagonal and the estimate is the plain average.
//!
//! A rank-deficient system (two kernel samples that the onsets cannot tell
//! apart, or a sample never observed) is rejected rather than regularised.
//!
//! Reference: Burock & Dale (2000), "Estimation and Detection of Event-Related
//! fMRI Signals with Temporally Correlated Noise", Human Brain Mapping 11.

use nalgebra::DMatrix;

use crate::error::{AnalysisError, Result};

/// Singular values below this fraction of the largest count as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Least-squares kernels for every event type.
///
/// `onsets[t]` lists the onset samples of type `t`. The result is indexed
/// `[type][channel][sample]`, each kernel `window_len` samples long.
pub fn fir_kernels(
    channels: &[&[f64]],
    onsets: &[Vec<usize>],
    window_len: usize,
    offset: isize,
) -> Result<Vec<Vec<Vec<f64>>>> {
    let len = channels.first().map_or(0, |c| c.len());
    let unknowns = onsets.len() * window_len;
    if unknowns == 0 {
        return Err(AnalysisError::invalid_input(
            "deconvolution needs at least one event type and a non-empty window",
        ));
    }

    let rows = active_columns(len, onsets, window_len, offset);

    let mut gram = DMatrix::<f64>::zeros(unknowns, unknowns);
    let mut moments = DMatrix::<f64>::zeros(unknowns, channels.len());
    for (row, columns) in rows.iter().enumerate() {
        for &a in columns {
            for &b in columns {
                gram[(a, b)] += 1.0;
            }
            for (ch, samples) in channels.iter().enumerate() {
                moments[(a, ch)] += samples[row];
            }
        }
    }

    let svd = gram.svd(true, true);
    let largest = svd.singular_values.max();
    let tolerance = RANK_TOLERANCE * largest;
    let rank = svd.rank(tolerance);
    tracing::debug!(unknowns, rank, largest, "fir normal equations");
    if rank < unknowns {
        return Err(AnalysisError::degenerate(format!(
            "FIR design has rank {rank} for {unknowns} unknowns; \
             the event timing cannot separate every response sample"
        )));
    }

    let beta = svd
        .solve(&moments, tolerance)
        .map_err(|reason| AnalysisError::degenerate(format!("FIR solve failed: {reason}")))?;

    Ok((0..onsets.len())
        .map(|t| {
            (0..channels.len())
                .map(|ch| (0..window_len).map(|l| beta[(t * window_len + l, ch)]).collect())
                .collect()
        })
        .collect())
}

/// For every signal sample, the design columns with a 1 in that row.
fn active_columns(
    len: usize,
    onsets: &[Vec<usize>],
    window_len: usize,
    offset: isize,
) -> Vec<Vec<usize>> {
    let mut rows = vec![Vec::new(); len];
    for (t, type_onsets) in onsets.iter().enumerate() {
        for &onset in type_onsets {
            let start = onset as isize + offset;
            for l in 0..window_len {
                let row = start + l as isize;
                if row >= 0 && (row as usize) < len {
                    rows[row as usize].push(t * window_len + l);
                }
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn superpose(
        len: usize,
        kernels: &[&[f64]],
        onsets: &[Vec<usize>],
        offset: isize,
    ) -> Vec<f64> {
        let mut y = vec![0.0; len];
        for (kernel, type_onsets) in kernels.iter().zip(onsets) {
            for &p in type_onsets {
                for (l, &h) in kernel.iter().enumerate() {
                    let n = p as isize + offset + l as isize;
                    if n >= 0 && (n as usize) < len {
                        y[n as usize] += h;
                    }
                }
            }
        }
        y
    }

    #[test]
    fn recovers_overlapping_kernels() {
        let h1 = [0.0, 1.0, 3.0, 2.0, 1.0, 0.5, 0.2, 0.1];
        let h2 = [0.5, -1.0, -2.0, -1.5, -0.5, 0.0, 0.3, 0.2];
        // Irregular spacing shorter than the kernel, so responses overlap.
        let mut onsets = vec![Vec::new(), Vec::new()];
        let mut state = 7u32;
        let mut p = 2;
        while p < 390 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            onsets[(state >> 16) as usize % 2].push(p);
            p += 3 + (state >> 20) as usize % 7;
        }
        let y = superpose(400, &[&h1[..], &h2[..]], &onsets, 0);

        let kernels = fir_kernels(&[y.as_slice()], &onsets, 8, 0).unwrap();
        for (l, (&a, &b)) in h1.iter().zip(&h2).enumerate() {
            assert!((kernels[0][0][l] - a).abs() < 1e-9, "type 1 sample {l}");
            assert!((kernels[1][0][l] - b).abs() < 1e-9, "type 2 sample {l}");
        }
    }

    #[test]
    fn negative_offset_and_edge_onsets() {
        let h = [1.0, -1.0, 2.0, 0.5, 0.25];
        let onsets = vec![vec![1, 4, 9, 12, 16, 19, 23, 28]];
        let y = superpose(30, &[&h[..]], &onsets, -2);
        let kernels = fir_kernels(&[y.as_slice(), y.as_slice()], &onsets, 5, -2).unwrap();
        for ch in 0..2 {
            for (l, &v) in h.iter().enumerate() {
                assert!((kernels[0][ch][l] - v).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn indistinguishable_columns_are_rejected() {
        // Type 2 always follows type 1 by one sample.
        let onsets = vec![vec![10, 40, 70], vec![11, 41, 71]];
        let y = vec![1.0; 100];
        assert!(matches!(
            fir_kernels(&[y.as_slice()], &onsets, 5, 0),
            Err(AnalysisError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn unobserved_sample_is_rejected() {
        // The window runs past the end, so the last samples are never seen.
        let onsets = vec![vec![18]];
        let y = vec![1.0; 20];
        assert!(matches!(
            fir_kernels(&[y.as_slice()], &onsets, 5, 0),
            Err(AnalysisError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn empty_design_is_invalid() {
        let y = vec![0.0; 10];
        assert!(matches!(
            fir_kernels(&[y.as_slice()], &[], 5, 0),
            Err(AnalysisError::InvalidInput(_))
        ));
    }
}
