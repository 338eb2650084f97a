//! The lifecycle shared by every optimizer.
//!
//! An [`Algorithm`] is set up once with [`init`](Algorithm::init) or
//! [`init_with_seeds`](Algorithm::init_with_seeds), then advanced one
//! generation at a time with [`iterate`](Algorithm::iterate). The reported
//! best never gets worse between calls.

use crate::candidate::{Candidate, Population};
use crate::error::{OptError, OptResult};
use crate::evaluator::Evaluator;
use crate::genome::Genome;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of driving an algorithm for a number of generations.
#[derive(Debug, Clone)]
pub struct RunResult<E> {
    /// The best candidate found during the run.
    pub best: Candidate<E>,

    /// Same as `best.cost()`.
    pub best_cost: f64,

    /// Number of generations executed.
    pub generations: usize,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Best cost after initialization, then after each generation.
    pub cost_history: Vec<f64>,
}

/// A stochastic minimizer with a generational lifecycle.
pub trait Algorithm {
    /// The solution representation.
    type Value: Clone;

    /// Human-readable algorithm name, used in log events.
    fn name(&self) -> &str;

    /// Builds a fully random initial state.
    fn init(&mut self) -> OptResult<()> {
        self.init_with_seeds(Vec::new())
    }

    /// Builds the initial state from `seeds`, filling the rest at random.
    ///
    /// # Errors
    /// [`OptError::InvalidArgument`] when there are more seeds than the
    /// population holds or a seed has the wrong dimension. The previous state
    /// is kept in that case.
    fn init_with_seeds(&mut self, seeds: Vec<Self::Value>) -> OptResult<()>;

    /// Advances one generation and returns a clone of the best candidate.
    ///
    /// # Errors
    /// [`OptError::NotInitialized`] before `init`; evaluator and worker
    /// failures abort the generation and are returned as-is.
    fn iterate(&mut self) -> OptResult<Candidate<Self::Value>>;

    /// The best candidate seen so far, if initialized.
    fn best(&self) -> Option<Candidate<Self::Value>>;

    /// Runs `generations` iterations.
    fn run(&mut self, generations: usize) -> OptResult<RunResult<Self::Value>> {
        self.run_with_cancel(generations, None)
    }

    /// Runs `generations` iterations, stopping early between generations once
    /// `cancel` is set. Initializes at random first if needed.
    fn run_with_cancel(
        &mut self,
        generations: usize,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptResult<RunResult<Self::Value>> {
        let mut best = match self.best() {
            Some(best) => best,
            None => {
                self.init()?;
                self.best().ok_or(OptError::NotInitialized)?
            }
        };

        let mut cost_history = Vec::with_capacity(generations + 1);
        cost_history.push(best.cost());
        let mut cancelled = false;

        for _ in 0..generations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            best = self.iterate()?;
            cost_history.push(best.cost());
        }

        let executed = cost_history.len() - 1;
        tracing::info!(
            algorithm = self.name(),
            generations = executed,
            best_cost = best.cost(),
            cancelled,
            "run finished"
        );

        Ok(RunResult {
            best_cost: best.cost(),
            best,
            generations: executed,
            cancelled,
            cost_history,
        })
    }
}

/// Checks seeds against the population size and dimension.
pub(crate) fn validate_seeds<E: Genome>(
    seeds: &[E],
    capacity: usize,
    dimension: usize,
) -> OptResult<()> {
    if seeds.len() > capacity {
        return Err(OptError::invalid_argument(format!(
            "{} seeds exceed the population size of {capacity}",
            seeds.len()
        )));
    }
    if let Some(bad) = seeds.iter().find(|s| s.dimension() != dimension) {
        return Err(OptError::invalid_argument(format!(
            "seed has dimension {}, expected {dimension}",
            bad.dimension()
        )));
    }
    Ok(())
}

/// Evaluates `seeds`, pads with random values up to `size` and returns the
/// population sorted by cost.
pub(crate) fn seeded_population<E, V, R>(
    seeds: Vec<E>,
    size: usize,
    dimension: usize,
    evaluator: &V,
    rng: &mut R,
) -> OptResult<Population<E>>
where
    E: Genome,
    V: Evaluator<E> + ?Sized,
    R: Rng,
{
    validate_seeds(&seeds, size, dimension)?;
    let padding = size - seeds.len();
    let values = seeds
        .into_iter()
        .chain((0..padding).map(|_| E::random(dimension, rng)).collect::<Vec<_>>());

    let candidates = values
        .map(|value| Candidate::evaluated(value, evaluator))
        .collect::<OptResult<Vec<_>>>()?;
    let mut population = Population::from_candidates(candidates, size)?;
    population.sort_by_cost();
    Ok(population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn sphere(x: &Vec<f64>) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    #[test]
    fn test_seeded_population_sorted_and_padded() {
        let mut rng = create_rng(42);
        let pop = seeded_population(vec![vec![0.0; 3]], 10, 3, &sphere, &mut rng).unwrap();
        assert_eq!(pop.len(), 10);
        assert_eq!(pop.get(0).unwrap().cost(), 0.0);
        for w in pop.as_slice().windows(2) {
            assert!(w[0].cost() <= w[1].cost());
        }
    }

    #[test]
    fn test_too_many_seeds() {
        let mut rng = create_rng(42);
        let seeds = vec![vec![0.5; 2]; 4];
        let result = seeded_population(seeds, 3, 2, &sphere, &mut rng);
        assert!(matches!(result, Err(OptError::InvalidArgument(_))));
    }

    #[test]
    fn test_wrong_seed_dimension() {
        let mut rng = create_rng(42);
        let result = seeded_population(vec![vec![0.5; 4]], 3, 2, &sphere, &mut rng);
        assert!(matches!(result, Err(OptError::InvalidArgument(_))));
    }
}
