//! SA execution loop.

use super::config::SaConfig;
use crate::algorithm::{validate_seeds, Algorithm};
use crate::candidate::Candidate;
use crate::error::{OptError, OptResult};
use crate::evaluator::Evaluator;
use crate::genome::{neighbor, Genome};
use crate::incumbent::Incumbent;
use crate::random::rng_from_seed;
use crate::tuning::{denormalize_all, ParameterRange, Tunable};
use rand::rngs::StdRng;
use rand::Rng;

static SA_PARAMETERS: [ParameterRange; 2] = [
    ParameterRange::real("initial_temperature", 10.0, 1000.0),
    ParameterRange::real("alpha", 0.8, 0.995),
];

const MIN_STEP: f64 = 0.00001;
const MAX_STEP: f64 = 0.2;

/// Simulated Annealing over real genomes in the unit box.
///
/// One iteration proposes one neighbor of the current solution, applies the
/// Metropolis criterion and cools the temperature once.
///
/// ```
/// use u_stochopt::sa::{SaConfig, SimulatedAnnealing};
/// use u_stochopt::Algorithm;
///
/// fn sphere(x: &Vec<f64>) -> f64 {
///     x.iter().map(|v| v * v).sum()
/// }
///
/// let mut sa: SimulatedAnnealing<Vec<f64>, _> =
///     SimulatedAnnealing::new(SaConfig::default().with_seed(1), 3, sphere).unwrap();
/// sa.init_with_seeds(vec![vec![0.5, 0.5, 0.5]]).unwrap();
/// let result = sa.run(1000).unwrap();
/// assert!(result.best_cost <= 0.75);
/// ```
#[derive(Debug)]
pub struct SimulatedAnnealing<E, V> {
    config: SaConfig,
    dimension: usize,
    evaluator: V,
    rng: StdRng,
    current: Option<Candidate<E>>,
    incumbent: Option<Incumbent<E>>,
    temperature: f64,
    iterations: usize,
    accepted_moves: usize,
    improving_moves: usize,
}

impl<E, V> SimulatedAnnealing<E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    /// Creates an uninitialized annealer for `dimension`-gene solutions.
    pub fn new(config: SaConfig, dimension: usize, evaluator: V) -> OptResult<Self> {
        config.validate()?;
        if dimension == 0 {
            return Err(OptError::invalid_config("dimension must be at least 1"));
        }
        Ok(Self {
            rng: rng_from_seed(config.seed),
            temperature: config.initial_temperature,
            config,
            dimension,
            evaluator,
            current: None,
            incumbent: None,
            iterations: 0,
            accepted_moves: 0,
            improving_moves: 0,
        })
    }

    pub fn config(&self) -> &SaConfig {
        &self.config
    }

    /// Current temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// The walk's current position.
    pub fn current(&self) -> Option<&Candidate<E>> {
        self.current.as_ref()
    }

    /// Iterations since the last `init`.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Accepted moves (including improvements) since the last `init`.
    pub fn accepted_moves(&self) -> usize {
        self.accepted_moves
    }

    /// Strictly improving moves since the last `init`.
    pub fn improving_moves(&self) -> usize {
        self.improving_moves
    }
}

impl<E, V> Algorithm for SimulatedAnnealing<E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    type Value = E;

    fn name(&self) -> &str {
        "simulated annealing"
    }

    /// Starts the walk from the single seed, if given.
    fn init_with_seeds(&mut self, seeds: Vec<E>) -> OptResult<()> {
        validate_seeds(&seeds, 1, self.dimension)?;
        let start = match seeds.into_iter().next() {
            Some(seed) => seed,
            None => E::random(self.dimension, &mut self.rng),
        };
        let current = Candidate::evaluated(start, &self.evaluator)?;

        tracing::info!(
            algorithm = self.name(),
            temperature = self.config.initial_temperature,
            alpha = self.config.alpha,
            best_cost = current.cost(),
            "initialized"
        );
        self.incumbent = Some(Incumbent::new(current.clone()));
        self.current = Some(current);
        self.temperature = self.config.initial_temperature;
        self.iterations = 0;
        self.accepted_moves = 0;
        self.improving_moves = 0;
        Ok(())
    }

    fn iterate(&mut self) -> OptResult<Candidate<E>> {
        let (Some(current), Some(incumbent)) = (self.current.as_mut(), self.incumbent.as_ref())
        else {
            return Err(OptError::NotInitialized);
        };

        let magnitude = MAX_STEP - self.rng.random::<f64>() * (MAX_STEP - MIN_STEP);
        let sample = neighbor(current.value(), magnitude, &mut self.rng);
        let sample = Candidate::evaluated(sample, &self.evaluator)?;

        let delta = sample.cost() - current.cost();
        if delta < 0.0 {
            self.improving_moves += 1;
        }
        incumbent.offer(&sample)?;
        if metropolis_accept(delta, self.temperature, &mut self.rng) {
            *current = sample;
            self.accepted_moves += 1;
        }

        self.temperature *= self.config.alpha;
        self.iterations += 1;

        let best = incumbent.snapshot()?;
        tracing::debug!(
            algorithm = "sa",
            generation = self.iterations,
            temperature = self.temperature,
            current_cost = current.cost(),
            best_cost = best.cost(),
            "iteration finished"
        );
        Ok(best)
    }

    fn best(&self) -> Option<Candidate<E>> {
        self.incumbent.as_ref().map(Incumbent::peek)
    }
}

impl<E, V> Tunable for SimulatedAnnealing<E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    fn parameter_ranges(&self) -> &'static [ParameterRange] {
        &SA_PARAMETERS
    }

    fn free_parameters(&self) -> Vec<f64> {
        vec![self.config.initial_temperature, self.config.alpha]
    }

    /// A new starting temperature applies at the next `init`.
    fn set_free_parameters(&mut self, unit: &[f64]) -> OptResult<()> {
        let values = denormalize_all(&SA_PARAMETERS, unit)?;
        self.config.initial_temperature = values[0];
        self.config.alpha = values[1];
        Ok(())
    }
}

/// Metropolis acceptance criterion.
///
/// Strict improvements are always accepted without drawing a random number.
/// Otherwise the move is accepted with probability `exp(-delta / T)`; at a
/// non-positive temperature only improvements pass.
pub fn metropolis_accept<R: Rng>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta < 0.0 {
        true
    } else if temperature > 0.0 {
        let probability = (-delta / temperature).exp();
        rng.random::<f64>() < probability
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn sphere(x: &Vec<f64>) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    type SphereSa = SimulatedAnnealing<Vec<f64>, fn(&Vec<f64>) -> f64>;

    fn make_sa(config: SaConfig, dimension: usize) -> SphereSa {
        SphereSa::new(config, dimension, sphere).unwrap()
    }

    #[test]
    fn test_sa_sphere() {
        let config = SaConfig::default()
            .with_initial_temperature(100.0)
            .with_alpha(0.99)
            .with_seed(42);
        let mut sa = make_sa(config, 5);
        let result = sa.run(3000).unwrap();

        assert!(
            result.best_cost < 1e-2,
            "expected near-zero cost, got {}",
            result.best_cost
        );
        assert!(sa.improving_moves() > 0);
        assert!(sa.accepted_moves() > sa.improving_moves());
    }

    #[test]
    fn test_temperature_is_repeated_product() {
        let config = SaConfig::default()
            .with_initial_temperature(500.0)
            .with_alpha(0.97)
            .with_seed(3);
        let mut sa = make_sa(config, 2);
        sa.init().unwrap();

        let mut expected = 500.0;
        for k in 1..=200 {
            sa.iterate().unwrap();
            expected *= 0.97;
            assert_eq!(sa.temperature(), expected, "after {k} iterations");
        }
        assert_eq!(sa.iterations(), 200);
    }

    #[test]
    fn test_init_resets_temperature() {
        let mut sa = make_sa(SaConfig::default().with_seed(3), 2);
        sa.run(50).unwrap();
        assert!(sa.temperature() < 100.0);
        sa.init().unwrap();
        assert_eq!(sa.temperature(), 100.0);
        assert_eq!(sa.accepted_moves(), 0);
    }

    #[test]
    fn test_metropolis_frequency() {
        let mut rng = create_rng(42);
        let (delta, temperature) = (1.0, 2.0);
        let n = 100_000;
        let accepted = (0..n)
            .filter(|_| metropolis_accept(delta, temperature, &mut rng))
            .count();
        let frequency = accepted as f64 / n as f64;
        let expected = (-0.5f64).exp();
        assert!(
            (frequency - expected).abs() < 0.01,
            "expected acceptance near {expected}, got {frequency}"
        );
    }

    #[test]
    fn test_metropolis_improvement_draws_nothing() {
        let mut rng = create_rng(9);
        let mut reference = create_rng(9);
        assert!(metropolis_accept(-0.5, 1.0, &mut rng));
        assert_eq!(rng.random::<u64>(), reference.random::<u64>());
    }

    #[test]
    fn test_metropolis_edge_cases() {
        let mut rng = create_rng(1);
        // Equal cost: exp(0) = 1 always beats a draw in [0, 1).
        assert!(metropolis_accept(0.0, 1.0, &mut rng));
        assert!(!metropolis_accept(1.0, 0.0, &mut rng));
        assert!(metropolis_accept(-1.0, 0.0, &mut rng));
    }

    #[test]
    fn test_reported_cost_monotonic() {
        let mut sa = make_sa(SaConfig::default().with_seed(42), 4);
        let result = sa.run(500).unwrap();
        for window in result.cost_history.windows(2) {
            assert!(
                window[1] <= window[0],
                "best cost history should be non-increasing: {} > {}",
                window[1],
                window[0]
            );
        }
    }

    #[test]
    fn test_walk_stays_in_unit_box() {
        let mut sa = make_sa(SaConfig::default().with_seed(5), 3);
        sa.init().unwrap();
        for _ in 0..200 {
            sa.iterate().unwrap();
            let current = sa.current().unwrap();
            assert!(current.value().iter().all(|x| (0.0..=1.0).contains(x)));
        }
    }

    #[test]
    fn test_single_seed_starts_walk() {
        let mut sa = make_sa(SaConfig::default().with_seed(1), 3);
        sa.init_with_seeds(vec![vec![0.25; 3]]).unwrap();
        assert_eq!(sa.current().unwrap().value(), &vec![0.25; 3]);
        assert!((sa.best().unwrap().cost() - 0.1875).abs() < 1e-12);
    }

    #[test]
    fn test_more_than_one_seed_rejected() {
        let mut sa = make_sa(SaConfig::default().with_seed(1), 2);
        let result = sa.init_with_seeds(vec![vec![0.1; 2], vec![0.2; 2]]);
        assert!(matches!(result, Err(OptError::InvalidArgument(_))));
        assert!(sa.best().is_none());
    }

    #[test]
    fn test_iterate_before_init() {
        let mut sa = make_sa(SaConfig::default(), 2);
        assert_eq!(sa.iterate().unwrap_err(), OptError::NotInitialized);
    }

    #[test]
    fn test_cancellation() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        // Set cancel flag before running so cancellation is deterministic.
        let cancel = Arc::new(AtomicBool::new(true));
        let mut sa = make_sa(SaConfig::default().with_seed(42), 2);
        let result = sa.run_with_cancel(1000, Some(cancel)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.generations, 0);
        assert_eq!(result.cost_history.len(), 1);
    }

    #[test]
    fn test_free_parameters() {
        let mut sa = make_sa(SaConfig::default(), 2);
        assert_eq!(sa.number_of_free_parameters(), 2);
        sa.set_free_parameters(&[0.0, 1.0]).unwrap();
        assert!((sa.config().initial_temperature - 10.0).abs() < 1e-12);
        assert!((sa.config().alpha - 0.995).abs() < 1e-12);
        assert_eq!(sa.free_parameters().len(), 2);
        assert!(sa.set_free_parameters(&[0.0]).is_err());
    }
}
