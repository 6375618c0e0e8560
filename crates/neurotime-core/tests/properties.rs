//! Property-based tests for TimeSeries invariants.

use neurotime_core::TimeSeries;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Slicing keeps the samples and shifts t0 to the first kept sample.
    #[test]
    fn slice_matches_source(
        samples in prop::collection::vec(-1.0e3f64..1.0e3, 2..200),
        interval in 0.001f64..10.0,
        cut in 0usize..1000,
    ) {
        let ts = TimeSeries::from_interval(vec![samples.clone()], interval).unwrap();
        let start = cut % (samples.len() - 1);
        let part = ts.slice(start..samples.len()).unwrap();

        prop_assert_eq!(part.channel(0), &samples[start..]);
        prop_assert_eq!(part.t0(), ts.time_at(start));
        prop_assert_eq!(part.sampling_interval(), interval);
    }

    /// The time axis is strictly increasing with constant spacing.
    #[test]
    fn time_axis_is_uniform(n in 2usize..300, interval in 0.001f64..5.0, t0 in -100.0f64..100.0) {
        let ts = TimeSeries::from_interval(vec![vec![0.0; n]], interval).unwrap().with_t0(t0);
        let time = ts.time();
        for pair in time.windows(2) {
            prop_assert!(pair[1] > pair[0]);
            prop_assert!(((pair[1] - pair[0]) - interval).abs() < 1e-9 * (1.0 + t0.abs()));
        }
    }
}
