use rand::Rng;
use rand::distributions::{Bernoulli, Distribution};
use statrs::distribution::{Beta, Normal, Pareto, Triangular, Uniform};

use super::DurationGenerator;

/// Concrete distribution built from a [`DurationGenerator`]. Degenerate
/// parameterizations (zero spread) collapse to a constant.
pub(super) enum Sampler {
    Constant(f64),
    Normal(Normal),
    Beta(Beta),
    Bernoulli(Bernoulli),
    Pareto(Pareto),
    Triangular(Triangular),
    Uniform(Uniform),
}

impl Sampler {
    pub(super) fn for_generator(generator: &DurationGenerator) -> Result<Self, String> {
        let sampler = match generator {
            DurationGenerator::Fixed { value } => Self::Constant(*value),
            DurationGenerator::Normal { mean, std_dev } => {
                if *std_dev == 0.0 {
                    Self::Constant(*mean)
                } else {
                    Normal::new(*mean, *std_dev)
                        .map(Self::Normal)
                        .map_err(|_| format!("invalid normal parameters ({mean}, {std_dev})"))?
                }
            }
            DurationGenerator::Beta { alpha, beta } => Beta::new(*alpha, *beta)
                .map(Self::Beta)
                .map_err(|_| format!("invalid beta parameters ({alpha}, {beta})"))?,
            DurationGenerator::Bernoulli { probability } => Bernoulli::new(*probability)
                .map(Self::Bernoulli)
                .map_err(|_| format!("invalid bernoulli probability {probability}"))?,
            DurationGenerator::Pareto { x_min, alpha, .. } => Pareto::new(*x_min, *alpha)
                .map(Self::Pareto)
                .map_err(|_| format!("invalid pareto parameters ({x_min}, {alpha})"))?,
            DurationGenerator::Pert(p) | DurationGenerator::Triangle(p) => {
                if p.min == p.max {
                    Self::Constant(p.mode)
                } else {
                    Triangular::new(p.min, p.max, p.mode)
                        .map(Self::Triangular)
                        .map_err(|_| {
                            format!(
                                "invalid triangular parameters ({}, {}, {})",
                                p.min, p.mode, p.max
                            )
                        })?
                }
            }
            DurationGenerator::Uniform { lower, upper } => {
                if lower == upper {
                    Self::Constant(*lower)
                } else {
                    Uniform::new(*lower, *upper)
                        .map(Self::Uniform)
                        .map_err(|_| format!("invalid uniform bounds ({lower}, {upper})"))?
                }
            }
            DurationGenerator::UpperBound => {
                return Err("upper bound does not sample".to_string());
            }
        };
        Ok(sampler)
    }

    pub(super) fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Normal(dist) => dist.sample(rng),
            Self::Beta(dist) => dist.sample(rng),
            Self::Bernoulli(dist) => {
                if dist.sample(rng) {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Pareto(dist) => dist.sample(rng),
            Self::Triangular(dist) => dist.sample(rng),
            Self::Uniform(dist) => dist.sample(rng),
        }
    }
}
