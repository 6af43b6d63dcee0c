use flow_estimate::stats::{cdf, histogram, normalize_percentile, quantile, stats_for_sequence};
use proptest::prelude::*;

#[test]
fn empty_sequence_yields_zeros() {
    let stats = stats_for_sequence(&[], &[50.0, 95.0]);
    assert_eq!(stats.mean, 0.0);
    assert_eq!(stats.median, 0.0);
    assert_eq!(stats.std_dev, 0.0);
    assert!(stats.percentiles.iter().all(|p| p.value == 0.0));
}

#[test]
fn single_sample_is_every_statistic() {
    let stats = stats_for_sequence(&[7.5], &[10.0, 90.0]);
    assert_eq!(stats.mean, 7.5);
    assert_eq!(stats.median, 7.5);
    assert_eq!(stats.std_dev, 0.0);
    assert_eq!(stats.percentile(10.0), Some(7.5));
    assert_eq!(stats.percentile(90.0), Some(7.5));
}

#[test]
fn standard_deviation_is_population() {
    let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    let stats = stats_for_sequence(&samples, &[]);
    assert!((stats.mean - 5.0).abs() < 1e-12);
    assert!((stats.std_dev - 2.0).abs() < 1e-12);
    assert!((stats.median - 4.5).abs() < 1e-12);
}

#[test]
fn percentages_and_fractions_agree() {
    let samples: Vec<f64> = (1..=100).map(f64::from).collect();
    let as_percent = stats_for_sequence(&samples, &[95.0]);
    let as_fraction = stats_for_sequence(&samples, &[0.95]);
    assert_eq!(as_percent.percentiles[0].value, as_fraction.percentiles[0].value);
    assert_eq!(as_percent.percentiles[0].percentile, 95.0);
    assert_eq!(as_fraction.percentiles[0].percentile, 95.0);
    assert_eq!(as_fraction.percentile(95.0), as_percent.percentile(0.95));
}

#[test]
fn normalize_percentile_divides_percentages() {
    assert_eq!(normalize_percentile(95.0), 0.95);
    assert_eq!(normalize_percentile(0.5), 0.5);
    assert_eq!(normalize_percentile(1.0), 1.0);
}

#[test]
fn input_order_does_not_matter() {
    let stats = stats_for_sequence(&[9.0, 1.0, 5.0, 3.0, 7.0], &[25.0]);
    assert_eq!(stats.median, 5.0);
    assert_eq!(stats.percentile(25.0), Some(3.0));
}

#[test]
fn histogram_of_constant_sequence_is_one_bin() {
    let bins = histogram(&[4.0; 20], 10);
    assert_eq!(bins.len(), 1);
    assert_eq!(bins[0].count, 20);
    assert_eq!(bins[0].density, 1.0);
}

#[test]
fn histogram_counts_every_sample() {
    let samples: Vec<f64> = (0..1000).map(|i| f64::from(i) / 10.0).collect();
    let bins = histogram(&samples, 25);
    assert_eq!(bins.len(), 25);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 1000);
    assert_eq!(bins.first().map(|b| b.lower), Some(0.0));
    assert_eq!(bins.last().map(|b| b.upper), Some(99.9));
}

#[test]
fn cdf_ends_at_one() {
    let samples: Vec<f64> = (0..50).map(f64::from).collect();
    let points = cdf(&samples, 5);
    assert_eq!(points.len(), 5);
    let last = points.last().map(|p| p.cumulative_fraction).unwrap_or_default();
    assert!((last - 1.0).abs() < 1e-9);
    assert!(points.windows(2).all(|w| w[0].cumulative_fraction <= w[1].cumulative_fraction));
}

proptest! {
    #[test]
    fn mean_and_percentiles_stay_within_range(
        samples in prop::collection::vec(-1.0e6f64..1.0e6, 1..200)
    ) {
        let stats = stats_for_sequence(&samples, &[5.0, 50.0, 95.0]);
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let tolerance = 1e-6 * (1.0 + max.abs().max(min.abs()));

        prop_assert!(stats.mean >= min - tolerance && stats.mean <= max + tolerance);
        prop_assert!(stats.std_dev >= 0.0);
        for p in &stats.percentiles {
            prop_assert!(p.value >= min - tolerance && p.value <= max + tolerance);
        }
        prop_assert!(stats.percentiles[0].value <= stats.percentiles[1].value + tolerance);
        prop_assert!(stats.percentiles[1].value <= stats.percentiles[2].value + tolerance);
    }

    #[test]
    fn quantile_is_monotonic(
        mut samples in prop::collection::vec(-1.0e3f64..1.0e3, 2..100),
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
    ) {
        samples.sort_by(|x, y| x.total_cmp(y));
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(quantile(&samples, lo) <= quantile(&samples, hi) + 1e-9);
    }
}
