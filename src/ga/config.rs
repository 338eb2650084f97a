//! GA configuration.
//!
//! [`GaConfig`] holds the population size and how many candidates each stage
//! of a generation handles.

use crate::error::{OptError, OptResult};

/// A per-generation count, either fixed or relative to a base size.
///
/// Ratios are rounded to the nearest integer when resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Count {
    /// Fraction of the base size (0.0–1.0).
    Ratio(f64),
    /// Exact number of candidates.
    Absolute(usize),
}

impl Count {
    /// Resolves the count against `base`.
    pub fn resolve(self, base: usize) -> usize {
        match self {
            Count::Ratio(r) => (base as f64 * r).round() as usize,
            Count::Absolute(n) => n,
        }
    }

    /// The count expressed as a fraction of `base`.
    pub fn as_ratio(self, base: usize) -> f64 {
        match self {
            Count::Ratio(r) => r,
            Count::Absolute(_) if base == 0 => 0.0,
            Count::Absolute(n) => n as f64 / base as f64,
        }
    }

    fn validate(self, name: &str) -> OptResult<()> {
        match self {
            Count::Ratio(r) if !(0.0..=1.0).contains(&r) => Err(OptError::invalid_config(
                format!("{name} ratio must be in [0, 1], got {r}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Resolved per-generation counts for one population size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationPlan {
    pub size: usize,
    pub elites: usize,
    pub selection: usize,
    pub mutations: usize,
}

impl GenerationPlan {
    /// Crossover pairs needed to fill the population after elites and
    /// selected parents.
    pub fn pairs(&self) -> usize {
        self.size.saturating_sub(self.elites + self.selection) / 2
    }
}

/// Configuration for the Genetic Algorithm.
///
/// # Defaults
///
/// ```
/// use u_stochopt::ga::GaConfig;
///
/// let plan = GaConfig::default().plan();
/// assert_eq!(plan.size, 50);
/// assert_eq!(plan.elites, 5);
/// assert_eq!(plan.selection, 20);
/// assert_eq!(plan.mutations, 9);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_stochopt::ga::{Count, GaConfig};
///
/// let config = GaConfig::default()
///     .with_population_size(40)
///     .with_elitism(0.05)
///     .with_selection(Count::Absolute(16))
///     .with_mutation_rate(0.3)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaConfig {
    /// Number of candidates in the population.
    pub population_size: usize,

    /// Best candidates copied unchanged into the next generation.
    /// Ratios are taken of the population size.
    pub elites: Count,

    /// Parents chosen by the selection operator each generation.
    /// Ratios are taken of the population size.
    pub selection: Count,

    /// Selected or offspring candidates mutated each generation.
    /// Ratios are taken of the non-elite part of the population.
    pub mutations: Count,

    /// Whether to evaluate new candidates in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            elites: Count::Ratio(0.1),
            selection: Count::Ratio(0.4),
            mutations: Count::Ratio(0.2),
            parallel: false,
            seed: None,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the elite fraction.
    pub fn with_elitism(mut self, ratio: f64) -> Self {
        self.elites = Count::Ratio(ratio.clamp(0.0, 1.0));
        self
    }

    /// Sets the fraction of the population kept as parents.
    pub fn with_keep(mut self, ratio: f64) -> Self {
        self.selection = Count::Ratio(ratio.clamp(0.0, 1.0));
        self
    }

    /// Sets the fraction of non-elite candidates mutated.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutations = Count::Ratio(rate.clamp(0.0, 1.0));
        self
    }

    pub fn with_elites(mut self, elites: Count) -> Self {
        self.elites = elites;
        self
    }

    pub fn with_selection(mut self, selection: Count) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_mutations(mut self, mutations: Count) -> Self {
        self.mutations = mutations;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Resolves every count against the population size.
    pub fn plan(&self) -> GenerationPlan {
        let size = self.population_size;
        let elites = self.elites.resolve(size);
        GenerationPlan {
            size,
            elites,
            selection: self.selection.resolve(size),
            mutations: self.mutations.resolve(size.saturating_sub(elites)),
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error if:
    /// - `population_size < 2`
    /// - a ratio is outside [0, 1]
    /// - elites and selected parents together exceed the population
    pub fn validate(&self) -> OptResult<()> {
        if self.population_size < 2 {
            return Err(OptError::invalid_config(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            )));
        }
        self.elites.validate("elites")?;
        self.selection.validate("selection")?;
        self.mutations.validate("mutations")?;

        let plan = self.plan();
        if plan.elites + plan.selection > plan.size {
            return Err(OptError::invalid_config(format!(
                "{} elites and {} selected parents exceed population_size {}",
                plan.elites, plan.selection, plan.size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.elites, Count::Ratio(0.1));
        assert!(!config.parallel);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_plan_rounds_ratios() {
        let plan = GaConfig::default()
            .with_population_size(20)
            .with_elitism(0.1)
            .with_keep(0.4)
            .with_mutation_rate(0.25)
            .plan();
        assert_eq!(plan.elites, 2);
        assert_eq!(plan.selection, 8);
        // (20 - 2) * 0.25 = 4.5 rounds up
        assert_eq!(plan.mutations, 5);
        assert_eq!(plan.pairs(), 5);
    }

    #[test]
    fn test_plan_absolute_counts() {
        let plan = GaConfig::default()
            .with_population_size(11)
            .with_elites(Count::Absolute(1))
            .with_selection(Count::Absolute(3))
            .with_mutations(Count::Absolute(2))
            .plan();
        assert_eq!(plan.elites, 1);
        assert_eq!(plan.selection, 3);
        assert_eq!(plan.mutations, 2);
        assert_eq!(plan.pairs(), 3);
    }

    #[test]
    fn test_clamp_rates() {
        let config = GaConfig::default()
            .with_elitism(-0.5)
            .with_keep(2.0)
            .with_mutation_rate(1.5);
        assert_eq!(config.elites, Count::Ratio(0.0));
        assert_eq!(config.selection, Count::Ratio(1.0));
        assert_eq!(config.mutations, Count::Ratio(1.0));
    }

    #[test]
    fn test_validate_population_too_small() {
        let config = GaConfig::default().with_population_size(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_overfull_plan() {
        let config = GaConfig::default()
            .with_population_size(10)
            .with_elites(Count::Absolute(4))
            .with_selection(Count::Absolute(7));
        assert!(matches!(config.validate(), Err(OptError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_bad_ratio() {
        let config = GaConfig::default().with_mutations(Count::Ratio(1.5));
        assert!(config.validate().is_err());
        let config = GaConfig::default().with_elites(Count::Ratio(f64::NAN));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_as_ratio() {
        assert_eq!(Count::Absolute(5).as_ratio(20), 0.25);
        assert_eq!(Count::Ratio(0.3).as_ratio(20), 0.3);
        assert_eq!(Count::Absolute(5).as_ratio(0), 0.0);
    }
}
