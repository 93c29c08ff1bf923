//! Property-based tests for values snapshots and the sliding window reservoir.
use proptest::prelude::*;

use latency_reservoir::reservoir::{
    ReservoirError, SlidingWindowTimeReservoir, TimeReservoir, TimeUnit, UniformTimeSnapshot,
    UniformTimeValuesSnapshot,
};

fn snapshot(values: &[u64]) -> UniformTimeValuesSnapshot {
    UniformTimeValuesSnapshot::new(values.iter().copied(), 60, TimeUnit::Seconds).unwrap()
}

proptest! {
    #[test]
    fn values_are_sorted(values in prop::collection::vec(any::<u64>(), 0..200)) {
        let sorted = snapshot(&values).values();
        prop_assert_eq!(sorted.len(), values.len());
        prop_assert!(sorted.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn quantile_bounds_are_min_and_max(values in prop::collection::vec(0u64..1_000_000, 1..200)) {
        let snapshot = snapshot(&values);
        prop_assert_eq!(snapshot.value(0.0).unwrap(), snapshot.min() as f64);
        prop_assert_eq!(snapshot.value(1.0).unwrap(), snapshot.max() as f64);
    }

    #[test]
    fn quantiles_are_monotonic(
        values in prop::collection::vec(0u64..1_000_000, 1..200),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
    ) {
        let snapshot = snapshot(&values);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(snapshot.value(low).unwrap() <= snapshot.value(high).unwrap());
    }

    #[test]
    fn quantiles_stay_within_the_values(
        values in prop::collection::vec(0u64..1_000_000, 1..200),
        q in 0.0f64..=1.0,
    ) {
        let snapshot = snapshot(&values);
        let value = snapshot.value(q).unwrap();
        prop_assert!(value >= snapshot.min() as f64);
        prop_assert!(value <= snapshot.max() as f64);
    }

    #[test]
    fn returned_values_do_not_alias(values in prop::collection::vec(any::<u64>(), 1..50)) {
        let snapshot = snapshot(&values);
        let (min, max, median) = (snapshot.min(), snapshot.max(), snapshot.median());

        let mut copy = snapshot.values();
        copy.iter_mut().for_each(|v| *v = v.wrapping_add(7));
        copy.reverse();

        prop_assert_eq!(snapshot.min(), min);
        prop_assert_eq!(snapshot.max(), max);
        prop_assert_eq!(snapshot.median(), median);
    }

    #[test]
    fn out_of_range_quantiles_are_rejected(q in prop_oneof![-1e9f64..-1e-9, 1.000_001f64..1e9]) {
        let result = snapshot(&[1, 2, 3]).value(q);
        prop_assert!(matches!(result, Err(ReservoirError::InvalidQuantile(_))));
    }

    #[test]
    fn rate_is_size_over_interval(size in 0usize..500, seconds in 1i64..3_600) {
        let values = vec![1u64; size];
        let snapshot =
            UniformTimeValuesSnapshot::new(values, seconds, TimeUnit::Seconds).unwrap();
        let expected = size as f64 / seconds as f64;
        prop_assert!((snapshot.rate(TimeUnit::Seconds) - expected).abs() < 1e-9);
    }

    #[test]
    fn reservoir_keeps_exactly_the_window(
        times in prop::collection::vec(0i64..10_000, 1..250),
        now in 5_000i64..10_000,
    ) {
        // 1 s window, times in milliseconds
        let reservoir =
            SlidingWindowTimeReservoir::new(1, TimeUnit::Seconds, 0, TimeUnit::Milliseconds)
                .unwrap();
        for &time in &times {
            reservoir.update(time as u64, time, TimeUnit::Milliseconds);
        }

        let greatest = times.iter().copied().max().unwrap_or(0).max(now);
        let expected = times
            .iter()
            .filter(|&&t| t >= greatest - 1_000 && t <= greatest)
            .count();
        let snapshot = reservoir.values_snapshot(now, TimeUnit::Milliseconds);
        prop_assert_eq!(snapshot.size() as usize, expected);
    }
}
