//! Duration generators: the per-activity probability distributions and the
//! sampling/aggregation step that turns a predecessor's results into this
//! activity's results.

pub mod expression;
mod sampler;

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};
use crate::graph::NodeId;
use crate::stats::{AggregatedStatistics, stats_for_sequence};
use expression::parse_expression;
use sampler::Sampler;

/// Output of evaluating one node: its own samples and the running total
/// from the start of the graph, each with aggregated statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub raw_values: Vec<f64>,
    pub generator_stats: AggregatedStatistics,
    pub cumulative_values: Vec<f64>,
    pub cumulative_stats: AggregatedStatistics,
}

impl GenerationResult {
    /// Builds a result from raw samples, adding them element-wise onto the
    /// prior cumulative sequence.
    pub fn accumulate(raw_values: Vec<f64>, prior_cumulative: &[f64], percentiles: &[f64]) -> Self {
        let cumulative_values: Vec<f64> = raw_values
            .iter()
            .zip(prior_cumulative)
            .map(|(raw, prior)| prior + raw)
            .collect();
        Self::from_parts(raw_values, cumulative_values, percentiles)
    }

    pub fn from_parts(raw_values: Vec<f64>, cumulative_values: Vec<f64>, percentiles: &[f64]) -> Self {
        let generator_stats = stats_for_sequence(&raw_values, percentiles);
        let cumulative_stats = stats_for_sequence(&cumulative_values, percentiles);
        Self {
            raw_values,
            generator_stats,
            cumulative_values,
            cumulative_stats,
        }
    }

    /// Relabels the cumulative sequence as the raw one. Joins operate on
    /// elapsed totals, not on increments.
    pub fn promote_cumulative(&self) -> Self {
        Self {
            raw_values: self.cumulative_values.clone(),
            generator_stats: self.cumulative_stats.clone(),
            cumulative_values: self.cumulative_values.clone(),
            cumulative_stats: self.cumulative_stats.clone(),
        }
    }

    pub fn run_count(&self) -> usize {
        self.raw_values.len()
    }
}

/// Three-point estimate shared by the PERT and Triangle kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreePoint {
    pub min: f64,
    pub mode: f64,
    pub max: f64,
}

impl ThreePoint {
    pub fn single(mode: f64) -> Self {
        Self {
            min: mode,
            mode,
            max: mode,
        }
    }

    fn validate(&self, expression: &str) -> FlowResult<()> {
        if self.min > self.mode || self.mode > self.max {
            return Err(FlowError::validation(
                expression,
                format!(
                    "(min={:.2}, mode={:.2}, max={:.2}) must satisfy min <= mode <= max",
                    self.min, self.mode, self.max
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DurationGenerator {
    Fixed { value: f64 },
    Normal { mean: f64, std_dev: f64 },
    Beta { alpha: f64, beta: f64 },
    Bernoulli { probability: f64 },
    /// `max` is `f64::INFINITY` when no cap was given.
    Pareto { x_min: f64, alpha: f64, max: f64 },
    Pert(ThreePoint),
    Triangle(ThreePoint),
    Uniform { lower: f64, upper: f64 },
    /// Element-wise maximum of all predecessors; only created for join nodes.
    UpperBound,
}

type Constructor = fn(&str, &[f64]) -> FlowResult<DurationGenerator>;

const REGISTRY: &[(&str, Constructor)] = &[
    ("Fixed", DurationGenerator::fixed_from),
    ("Normal", DurationGenerator::normal_from),
    ("Beta", DurationGenerator::beta_from),
    ("Bernoulli", DurationGenerator::bernoulli_from),
    ("Pareto", DurationGenerator::pareto_from),
    ("PERT", DurationGenerator::pert_from),
    ("Triangle", DurationGenerator::triangle_from),
    ("Uniform", DurationGenerator::uniform_from),
];

fn arity_error(expression: &str, name: &str, expected: &str, found: usize) -> FlowError {
    FlowError::parse(
        expression,
        format!("{name} expects {expected} parameter(s), found {found}"),
    )
}

impl DurationGenerator {
    /// Names accepted by [`DurationGenerator::parse`].
    pub fn registered_names() -> Vec<&'static str> {
        REGISTRY.iter().map(|(name, _)| *name).collect()
    }

    /// Parses and validates a `Name(p1, p2, ...)` expression.
    pub fn parse(expression: &str) -> FlowResult<Self> {
        let parsed = parse_expression(expression)?;
        let constructor = REGISTRY
            .iter()
            .find(|(name, _)| *name == parsed.name)
            .map(|(_, ctor)| *ctor)
            .ok_or_else(|| {
                FlowError::parse(
                    expression,
                    format!(
                        "unsupported generator `{}`; supported types: {}",
                        parsed.name,
                        Self::registered_names().join(", ")
                    ),
                )
            })?;
        constructor(expression, &parsed.params)
    }

    fn fixed_from(expression: &str, params: &[f64]) -> FlowResult<Self> {
        match params {
            [value] => Ok(Self::Fixed { value: *value }),
            _ => Err(arity_error(expression, "Fixed", "1", params.len())),
        }
    }

    fn normal_from(expression: &str, params: &[f64]) -> FlowResult<Self> {
        let [mean, std_dev] = params else {
            return Err(arity_error(expression, "Normal", "2", params.len()));
        };
        if *std_dev < 0.0 {
            return Err(FlowError::validation(
                expression,
                format!("standard deviation {std_dev:.2} must not be negative"),
            ));
        }
        Ok(Self::Normal {
            mean: *mean,
            std_dev: *std_dev,
        })
    }

    fn beta_from(expression: &str, params: &[f64]) -> FlowResult<Self> {
        let [alpha, beta] = params else {
            return Err(arity_error(expression, "Beta", "2", params.len()));
        };
        if *alpha <= 0.0 || *beta <= 0.0 {
            return Err(FlowError::validation(
                expression,
                format!("shape parameters (α={alpha:.2}, β={beta:.2}) must be positive"),
            ));
        }
        Ok(Self::Beta {
            alpha: *alpha,
            beta: *beta,
        })
    }

    fn bernoulli_from(expression: &str, params: &[f64]) -> FlowResult<Self> {
        let [probability] = params else {
            return Err(arity_error(expression, "Bernoulli", "1", params.len()));
        };
        if !(0.0..=1.0).contains(probability) {
            return Err(FlowError::validation(
                expression,
                format!("probability {probability:.2} must be within [0, 1]"),
            ));
        }
        Ok(Self::Bernoulli {
            probability: *probability,
        })
    }

    fn pareto_from(expression: &str, params: &[f64]) -> FlowResult<Self> {
        let (x_min, alpha, max) = match params {
            [x_min, alpha] => (*x_min, *alpha, f64::INFINITY),
            [x_min, alpha, max] => (*x_min, *alpha, *max),
            _ => return Err(arity_error(expression, "Pareto", "2 or 3", params.len())),
        };
        if x_min <= 0.0 || alpha <= 0.0 {
            return Err(FlowError::validation(
                expression,
                format!("scale {x_min:.2} and shape {alpha:.2} must be positive"),
            ));
        }
        Ok(Self::Pareto { x_min, alpha, max })
    }

    fn three_point(expression: &str, name: &str, params: &[f64]) -> FlowResult<ThreePoint> {
        let estimate = match params {
            [mode] => ThreePoint::single(*mode),
            [min, mode, max] => ThreePoint {
                min: *min,
                mode: *mode,
                max: *max,
            },
            _ => return Err(arity_error(expression, name, "1 or 3", params.len())),
        };
        estimate.validate(expression)?;
        Ok(estimate)
    }

    fn pert_from(expression: &str, params: &[f64]) -> FlowResult<Self> {
        Self::three_point(expression, "PERT", params).map(Self::Pert)
    }

    fn triangle_from(expression: &str, params: &[f64]) -> FlowResult<Self> {
        Self::three_point(expression, "Triangle", params).map(Self::Triangle)
    }

    fn uniform_from(expression: &str, params: &[f64]) -> FlowResult<Self> {
        let [lower, upper] = params else {
            return Err(arity_error(expression, "Uniform", "2", params.len()));
        };
        if lower > upper {
            return Err(FlowError::validation(
                expression,
                format!("lower bound {lower:.2} exceeds upper bound {upper:.2}"),
            ));
        }
        Ok(Self::Uniform {
            lower: *lower,
            upper: *upper,
        })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "Fixed",
            Self::Normal { .. } => "Normal",
            Self::Beta { .. } => "Beta",
            Self::Bernoulli { .. } => "Bernoulli",
            Self::Pareto { .. } => "Pareto",
            Self::Pert(_) => "PERT",
            Self::Triangle(_) => "Triangle",
            Self::Uniform { .. } => "Uniform",
            Self::UpperBound => "UpperBound",
        }
    }

    /// Post-sample filter; only Pareto clamps.
    fn filter(&self, sample: f64) -> f64 {
        match self {
            Self::Pareto { max, .. } => sample.min(*max),
            _ => sample,
        }
    }

    /// Draws one sample per predecessor run and accumulates it onto the
    /// predecessor's cumulative values.
    ///
    /// `prior` must hold exactly one result, except for
    /// [`DurationGenerator::UpperBound`] which takes the element-wise maximum
    /// of the raw values of one or more results.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        node: NodeId,
        prior: &[&GenerationResult],
        percentiles: &[f64],
        rng: &mut R,
    ) -> FlowResult<GenerationResult> {
        if let Self::UpperBound = self {
            return Self::upper_bound(node, prior, percentiles);
        }

        let [predecessor] = prior else {
            return Err(FlowError::structural(
                node,
                format!(
                    "{} generator requires exactly one predecessor, found {}",
                    self.kind_name(),
                    prior.len()
                ),
            ));
        };

        let sampler = Sampler::for_generator(self)
            .map_err(|reason| FlowError::validation(&self.to_string(), reason))?;
        let samples: Vec<f64> = (0..predecessor.run_count())
            .map(|_| self.filter(sampler.sample(rng)))
            .collect();

        Ok(GenerationResult::accumulate(
            samples,
            &predecessor.cumulative_values,
            percentiles,
        ))
    }

    fn upper_bound(
        node: NodeId,
        prior: &[&GenerationResult],
        percentiles: &[f64],
    ) -> FlowResult<GenerationResult> {
        let Some((first, rest)) = prior.split_first() else {
            return Err(FlowError::structural(
                node,
                "upper bound requires at least one predecessor",
            ));
        };
        let run_count = first.run_count();
        let mut max_values = first.raw_values.clone();
        for other in rest {
            if other.run_count() != run_count {
                return Err(FlowError::structural(
                    node,
                    format!(
                        "predecessor sample counts differ ({} vs {})",
                        run_count,
                        other.run_count()
                    ),
                ));
            }
            for (current, candidate) in max_values.iter_mut().zip(&other.raw_values) {
                *current = current.max(*candidate);
            }
        }
        Ok(GenerationResult::from_parts(
            vec![0.0; run_count],
            max_values,
            percentiles,
        ))
    }
}

impl FromStr for DurationGenerator {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DurationGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { value } => write!(f, "Fixed({value:.2})"),
            Self::Normal { mean, std_dev } => write!(f, "Normal(μ={mean:.2}, σ={std_dev:.2})"),
            Self::Beta { alpha, beta } => write!(f, "Beta(α={alpha:.2}, β={beta:.2})"),
            Self::Bernoulli { probability } => write!(f, "Bernoulli(p={probability:.2})"),
            Self::Pareto { x_min, alpha, max } => {
                write!(f, "Pareto(xmin={x_min:.2}, α={alpha:.2}")?;
                if max.is_finite() {
                    write!(f, ", max={max:.2}")?;
                }
                write!(f, ")")
            }
            Self::Pert(p) => write!(f, "PERT({:.2}, {:.2}, {:.2})", p.min, p.mode, p.max),
            Self::Triangle(p) => write!(f, "Triangle({:.2}, {:.2}, {:.2})", p.min, p.mode, p.max),
            Self::Uniform { lower, upper } => write!(f, "Uniform({lower:.2}, {upper:.2})"),
            Self::UpperBound => write!(f, "UpperBound"),
        }
    }
}
