//! Hyperparameter introspection and meta-optimization.
//!
//! Every algorithm exposes its own hyperparameters as a fixed-length vector.
//! Setting them takes values from the unit interval, each mapped onto the
//! parameter's natural range by a [`ParameterRange`]. Because the inputs are
//! plain unit vectors, one algorithm can tune another through
//! [`MetaEvaluator`].

use crate::algorithm::Algorithm;
use crate::error::{EvaluationError, OptError, OptResult};
use crate::evaluator::Evaluator;

/// Maps the unit interval onto `[low, high]`.
///
/// Integral parameters (population sizes) are floored after mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub name: &'static str,
    pub low: f64,
    pub high: f64,
    pub integral: bool,
}

impl ParameterRange {
    pub const fn real(name: &'static str, low: f64, high: f64) -> Self {
        Self {
            name,
            low,
            high,
            integral: false,
        }
    }

    pub const fn integer(name: &'static str, low: f64, high: f64) -> Self {
        Self {
            name,
            low,
            high,
            integral: true,
        }
    }

    /// Maps a unit value onto the range. Inputs outside `[0, 1]` are clamped;
    /// NaN maps to `low`.
    pub fn denormalize(&self, unit: f64) -> f64 {
        let unit = if unit.is_nan() { 0.0 } else { unit.clamp(0.0, 1.0) };
        let value = self.low + unit * (self.high - self.low);
        if self.integral {
            value.floor()
        } else {
            value
        }
    }

    /// Maps a natural value back onto the unit interval.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.high - self.low;
        if span == 0.0 {
            return 0.0;
        }
        ((value - self.low) / span).clamp(0.0, 1.0)
    }
}

/// Hyperparameters exposed for meta-optimization.
pub trait Tunable {
    /// The declared ranges, one per free parameter.
    fn parameter_ranges(&self) -> &'static [ParameterRange];

    fn number_of_free_parameters(&self) -> usize {
        self.parameter_ranges().len()
    }

    /// Current values in their natural units.
    fn free_parameters(&self) -> Vec<f64>;

    /// Applies unit-interval values.
    ///
    /// # Errors
    /// [`OptError::InvalidArgument`] if `unit` does not have exactly
    /// [`number_of_free_parameters`](Self::number_of_free_parameters) entries.
    fn set_free_parameters(&mut self, unit: &[f64]) -> OptResult<()>;

    /// Current values mapped back onto the unit interval.
    fn normalized_free_parameters(&self) -> Vec<f64> {
        self.parameter_ranges()
            .iter()
            .zip(self.free_parameters())
            .map(|(range, value)| range.normalize(value))
            .collect()
    }
}

/// Checks a unit vector's length and maps it through `ranges`.
pub(crate) fn denormalize_all(ranges: &[ParameterRange], unit: &[f64]) -> OptResult<Vec<f64>> {
    if unit.len() != ranges.len() {
        return Err(OptError::invalid_argument(format!(
            "expected {} free parameters, got {}",
            ranges.len(),
            unit.len()
        )));
    }
    Ok(ranges
        .iter()
        .zip(unit)
        .map(|(range, &u)| range.denormalize(u))
        .collect())
}

/// Scores a hyperparameter vector by running a freshly built algorithm.
///
/// The cost is the mean best cost over `repeats` runs of `generations`
/// iterations each.
///
/// ```
/// use u_stochopt::de::{DeConfig, DifferentialEvolution};
/// use u_stochopt::pso::{ParticleSwarm, PsoConfig};
/// use u_stochopt::{Algorithm, MetaEvaluator};
///
/// fn sphere(x: &Vec<f64>) -> f64 {
///     x.iter().map(|v| v * v).sum()
/// }
///
/// type SpherePso = ParticleSwarm<Vec<f64>, fn(&Vec<f64>) -> f64>;
///
/// // Score = mean best cost of two 20-generation PSO runs.
/// let meta = MetaEvaluator::new(
///     || SpherePso::new(PsoConfig::default(), 4, sphere).unwrap(),
///     20,
///     2,
/// );
/// let config = DeConfig::default().with_population_size(8).with_seed(1);
/// let mut tuner: DifferentialEvolution<Vec<f64>, _> =
///     DifferentialEvolution::new(config, meta.dimension(), meta).unwrap();
/// let tuned = tuner.run(2).unwrap();
/// assert_eq!(tuned.best.value().len(), 5);
/// ```
pub struct MetaEvaluator<F> {
    factory: F,
    generations: usize,
    repeats: usize,
}

impl<F, A> MetaEvaluator<F>
where
    F: Fn() -> A + Send + Sync,
    A: Algorithm + Tunable,
{
    pub fn new(factory: F, generations: usize, repeats: usize) -> Self {
        Self {
            factory,
            generations,
            repeats: repeats.max(1),
        }
    }

    /// Length of the parameter vectors this evaluator accepts.
    pub fn dimension(&self) -> usize {
        (self.factory)().number_of_free_parameters()
    }

    fn score(&self, unit: &[f64]) -> OptResult<f64> {
        let mut total = 0.0;
        for _ in 0..self.repeats {
            let mut algorithm = (self.factory)();
            algorithm.set_free_parameters(unit)?;
            algorithm.init()?;
            total += algorithm.run(self.generations)?.best_cost;
        }
        Ok(total / self.repeats as f64)
    }
}

impl<F, A> Evaluator<Vec<f64>> for MetaEvaluator<F>
where
    F: Fn() -> A + Send + Sync,
    A: Algorithm + Tunable,
{
    fn evaluate(&self, unit: &Vec<f64>) -> Result<f64, EvaluationError> {
        self.score(unit)
            .map_err(|err| EvaluationError::new(format!("meta-evaluation failed: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::de::{DeConfig, DifferentialEvolution};
    use crate::sa::{SaConfig, SimulatedAnnealing};

    fn sphere(x: &Vec<f64>) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    type SphereSa = SimulatedAnnealing<Vec<f64>, fn(&Vec<f64>) -> f64>;

    fn sa_factory() -> SphereSa {
        SphereSa::new(SaConfig::default().with_seed(11), 3, sphere).unwrap()
    }

    #[test]
    fn test_meta_evaluator_scores_parameters() {
        let meta = MetaEvaluator::new(sa_factory, 100, 2);
        assert_eq!(meta.dimension(), 2);

        let cost = meta.evaluate(&vec![0.5, 0.5]).unwrap();
        assert!(cost.is_finite() && cost >= 0.0);

        // Same seed inside the factory, same parameters: same score.
        assert_eq!(meta.evaluate(&vec![0.5, 0.5]).unwrap(), cost);
    }

    #[test]
    fn test_meta_evaluator_wrong_length_fails() {
        let meta = MetaEvaluator::new(sa_factory, 10, 1);
        let err = meta.evaluate(&vec![0.5]).unwrap_err();
        assert!(err.0.contains("expected 2 free parameters"), "got {err}");
    }

    #[test]
    fn test_one_algorithm_tunes_another() {
        let meta = MetaEvaluator::new(sa_factory, 50, 1);
        let config = DeConfig::default().with_population_size(6).with_seed(4);
        let mut tuner: DifferentialEvolution<Vec<f64>, _> =
            DifferentialEvolution::new(config, meta.dimension(), meta).unwrap();
        let result = tuner.run(3).unwrap();

        assert_eq!(result.best.value().len(), 2);
        assert!(result.best.value().iter().all(|x| (0.0..=1.0).contains(x)));
        for window in result.cost_history.windows(2) {
            assert!(window[1] <= window[0]);
        }
    }

    #[test]
    fn test_denormalize_maps_and_clamps() {
        let range = ParameterRange::real("f", 0.1, 2.0);
        assert!((range.denormalize(0.0) - 0.1).abs() < 1e-12);
        assert!((range.denormalize(1.0) - 2.0).abs() < 1e-12);
        assert!((range.denormalize(0.5) - 1.05).abs() < 1e-12);
        assert!((range.denormalize(-3.0) - 0.1).abs() < 1e-12);
        assert!((range.denormalize(7.0) - 2.0).abs() < 1e-12);
        assert!((range.denormalize(f64::NAN) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_integral_range_floors() {
        let range = ParameterRange::integer("size", 10.0, 60.0);
        assert_eq!(range.denormalize(0.5), 35.0);
        assert_eq!(range.denormalize(0.99), 59.0);
    }

    #[test]
    fn test_normalize_inverts_denormalize() {
        let range = ParameterRange::real("omega", 0.01, 1.0);
        for u in [0.0, 0.25, 0.5, 0.9, 1.0] {
            assert!((range.normalize(range.denormalize(u)) - u).abs() < 1e-12);
        }
    }

    #[test]
    fn test_denormalize_all_length_check() {
        let ranges = [ParameterRange::real("a", 0.0, 1.0)];
        assert!(denormalize_all(&ranges, &[0.5, 0.5]).is_err());
        assert_eq!(denormalize_all(&ranges, &[0.5]).unwrap(), vec![0.5]);
    }
}
