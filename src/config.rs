use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTOGRAM_BINS: usize = 100;

/// Knobs for a single evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Seed of the single random stream shared by every generator.
    #[serde(default)]
    pub seed: u64,
    /// Day the project starts; workday completion dates count from here.
    #[serde(default = "today")]
    pub start_date: NaiveDate,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn default_histogram_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start_date: today(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl EvaluationConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}
