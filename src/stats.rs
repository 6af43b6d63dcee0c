//! Aggregate statistics over Monte Carlo sample sequences.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A requested percentile (always expressed as a percentage) and the
/// empirical value computed for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregatedStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub percentiles: Vec<PercentileValue>,
}

impl AggregatedStatistics {
    /// Looks up a computed percentile. Accepts the same notations as
    /// [`stats_for_sequence`] (fraction or percentage).
    pub fn percentile(&self, requested: f64) -> Option<f64> {
        let wanted = as_percentage(requested);
        self.percentiles
            .iter()
            .find(|p| (p.percentile - wanted).abs() < 1e-9)
            .map(|p| p.value)
    }
}

/// Percentiles above 1 are percentages, the rest are fractions.
pub fn normalize_percentile(requested: f64) -> f64 {
    if requested > 1.0 {
        requested / 100.0
    } else {
        requested
    }
}

fn as_percentage(requested: f64) -> f64 {
    if requested > 1.0 {
        requested
    } else {
        requested * 100.0
    }
}

pub fn stats_for_sequence(samples: &[f64], percentiles: &[f64]) -> AggregatedStatistics {
    let mut sorted = samples.to_vec();
    sorted.par_sort_unstable_by(|a, b| a.total_cmp(b));

    let (mean, std_dev) = mean_std_dev(&sorted);
    let median = quantile(&sorted, 0.5);
    let percentiles = percentiles
        .iter()
        .map(|&requested| PercentileValue {
            percentile: as_percentage(requested),
            value: quantile(&sorted, normalize_percentile(requested)),
        })
        .collect();

    AggregatedStatistics {
        mean,
        median,
        std_dev,
        percentiles,
    }
}

/// Population mean and standard deviation.
fn mean_std_dev(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Empirical quantile of an already sorted sequence, linearly interpolated
/// between the two closest order statistics.
pub fn quantile(sorted: &[f64], fraction: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let p = fraction.clamp(0.0, 1.0);
            let h = (len - 1) as f64 * p;
            let lower = h.floor() as usize;
            let upper = h.ceil() as usize;
            let low_value = sorted[lower];
            if lower == upper {
                return low_value;
            }
            low_value + (h - lower as f64) * (sorted[upper] - low_value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    /// Fraction of all samples that fell in this bin.
    pub density: f64,
}

/// Equal-width histogram across the sample range. A constant sequence
/// collapses into a single bin.
pub fn histogram(samples: &[f64], bins: usize) -> Vec<HistogramBin> {
    if samples.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let total = samples.len() as f64;

    if max <= min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: samples.len(),
            density: 1.0,
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &sample in samples {
        let idx = (((sample - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| HistogramBin {
            lower: min + width * idx as f64,
            upper: if idx == bins - 1 {
                max
            } else {
                min + width * (idx + 1) as f64
            },
            count,
            density: count as f64 / total,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CdfPoint {
    pub value: f64,
    pub cumulative_fraction: f64,
}

/// Cumulative distribution evaluated at each histogram bin's upper edge.
pub fn cdf(samples: &[f64], bins: usize) -> Vec<CdfPoint> {
    let mut running = 0.0;
    histogram(samples, bins)
        .into_iter()
        .map(|bin| {
            running += bin.density;
            CdfPoint {
                value: bin.upper,
                cumulative_fraction: running.min(1.0),
            }
        })
        .collect()
}
