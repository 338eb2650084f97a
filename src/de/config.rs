//! DE configuration.

use crate::error::{OptError, OptResult};

/// Configuration for Differential Evolution (DE/rand/1/bin).
///
/// # Examples
///
/// ```
/// use u_stochopt::de::DeConfig;
///
/// let config = DeConfig::default()
///     .with_population_size(40)
///     .with_scale_factor(0.5)
///     .with_crossover_probability(0.9)
///     .with_parallel(true)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeConfig {
    /// Number of candidates (NP). At least 4, since every trial draws three
    /// other candidates.
    pub population_size: usize,

    /// Differential weight F applied to `b - d`. Typical range: 0.4–1.0.
    pub scale_factor: f64,

    /// Probability CR that a dimension takes the mutant value (0.0–1.0).
    pub crossover_probability: f64,

    /// Whether to evaluate the generation on a worker pool.
    pub parallel: bool,

    /// Worker count for parallel mode. `0` uses one worker per logical CPU.
    pub num_threads: usize,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for DeConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            scale_factor: 0.7,
            crossover_probability: 0.9,
            parallel: false,
            num_threads: 0,
            seed: None,
        }
    }
}

impl DeConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_scale_factor(mut self, f: f64) -> Self {
        self.scale_factor = f;
        self
    }

    /// Sets CR, clamped into `[0, 1]`.
    pub fn with_crossover_probability(mut self, cr: f64) -> Self {
        self.crossover_probability = cr.clamp(0.0, 1.0);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OptResult<()> {
        if self.population_size < 4 {
            return Err(OptError::invalid_config(
                "population_size must be at least 4",
            ));
        }
        if !(self.scale_factor > 0.0 && self.scale_factor.is_finite()) {
            return Err(OptError::invalid_config(format!(
                "scale_factor must be positive and finite, got {}",
                self.scale_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(OptError::invalid_config(format!(
                "crossover_probability must be in [0, 1], got {}",
                self.crossover_probability
            )));
        }
        Ok(())
    }
}
