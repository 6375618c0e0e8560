//! Event-related demo: overlapping responses, averaging versus deconvolution.
//!
//! Run with: cargo run -p neurotime-analysis --example event_related_demo

use neurotime_analysis::{EventRelatedAnalyzer, EventRelatedParams};
use neurotime_core::TimeSeries;

fn main() {
    let sampling_rate = 10.0;
    let len = 2000;
    let kernel = [0.0, 0.4, 1.0, 0.8, 0.5, 0.3, 0.15, 0.05, 0.0, -0.1, -0.05, 0.0];

    // --- Events every 4 to 9 samples, so consecutive responses overlap ---
    let mut codes = vec![0.0; len];
    let mut signal = vec![0.0; len];
    let mut state = 42u32;
    let mut onset = 5;
    while onset + kernel.len() < len {
        codes[onset] = 1.0;
        for (l, &h) in kernel.iter().enumerate() {
            signal[onset + l] += h;
        }
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        onset += 4 + (state >> 16) as usize % 6;
    }

    let target = TimeSeries::from_channel(signal, sampling_rate).unwrap();
    let events = TimeSeries::from_channel(codes, sampling_rate).unwrap();
    let analyzer =
        EventRelatedAnalyzer::new(&target, &events, EventRelatedParams::new(kernel.len()));

    let counts = analyzer.trial_counts().unwrap();
    println!("=== Event-Related Responses ({} trials) ===\n", counts[0].1);

    let eta = analyzer.eta().unwrap().get(1).unwrap();
    let fir = analyzer.fir().unwrap().get(1).unwrap();

    println!("{:>8}  {:>8}  {:>8}  {:>8}", "time (s)", "kernel", "average", "fir");
    for (k, &h) in kernel.iter().enumerate() {
        println!(
            "{:>8.2}  {:>8.3}  {:>8.3}  {:>8.3}",
            eta.time_at(k),
            h,
            eta.channel(0)[k],
            fir.channel(0)[k]
        );
    }

    println!("\nThe average absorbs neighbouring responses; the FIR estimate separates them.");
}
