//! Sample statistics shared by the analyzers.

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Copy of `samples` with the mean removed.
pub fn demean(samples: &[f64]) -> Vec<f64> {
    let mu = mean(samples);
    samples.iter().map(|&x| x - mu).collect()
}

/// Population variance (divisor `n`).
pub fn variance(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mu = mean(samples);
    samples.iter().map(|&x| (x - mu) * (x - mu)).sum::<f64>() / samples.len() as f64
}

/// Population standard deviation (divisor `n`).
pub fn std_dev(samples: &[f64]) -> f64 {
    variance(samples).sqrt()
}

/// Whether every sample has the same value (an empty slice counts as constant).
pub fn is_constant(samples: &[f64]) -> bool {
    samples.windows(2).all(|pair| pair[0] == pair[1])
}

/// Standard score of every sample, or `None` for a constant signal.
pub fn zscore(samples: &[f64]) -> Option<Vec<f64>> {
    if is_constant(samples) {
        return None;
    }
    let mu = mean(samples);
    let sigma = std_dev(samples);
    if sigma <= f64::MIN_POSITIVE {
        return None;
    }
    Some(samples.iter().map(|&x| (x - mu) / sigma).collect())
}
