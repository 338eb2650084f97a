//! DE generation loop.

use super::config::DeConfig;
use crate::algorithm::{seeded_population, Algorithm};
use crate::candidate::{Candidate, Population};
use crate::error::{OptError, OptResult};
use crate::evaluator::Evaluator;
use crate::genome::Genome;
use crate::incumbent::Incumbent;
use crate::parallel::WorkerPool;
use crate::random::{create_rng, rng_from_seed};
use crate::tuning::{denormalize_all, ParameterRange, Tunable};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::{Mutex, PoisonError};

static DE_PARAMETERS: [ParameterRange; 3] = [
    ParameterRange::integer("population_size", 10.0, 60.0),
    ParameterRange::real("scale_factor", 0.1, 2.0),
    ParameterRange::real("crossover_probability", 0.1, 1.0),
];

/// Differential Evolution over real genomes in the unit box.
///
/// # Usage
///
/// ```
/// use u_stochopt::de::{DeConfig, DifferentialEvolution};
/// use u_stochopt::Algorithm;
///
/// fn sphere(x: &Vec<f64>) -> f64 {
///     x.iter().map(|v| v * v).sum()
/// }
///
/// let config = DeConfig::default().with_population_size(20).with_seed(7);
/// let mut de: DifferentialEvolution<Vec<f64>, _> =
///     DifferentialEvolution::new(config, 3, sphere).unwrap();
/// de.init().unwrap();
/// let first = de.iterate().unwrap();
/// let second = de.iterate().unwrap();
/// assert!(second.cost() <= first.cost());
/// ```
#[derive(Debug)]
pub struct DifferentialEvolution<E, V> {
    config: DeConfig,
    dimension: usize,
    evaluator: V,
    rng: StdRng,
    pool: Option<WorkerPool>,
    population: Population<E>,
    incumbent: Option<Incumbent<E>>,
    generation: usize,
}

impl<E, V> DifferentialEvolution<E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    /// Creates an uninitialized optimizer for `dimension`-gene solutions.
    ///
    /// # Errors
    /// [`OptError::InvalidConfig`] if the configuration is invalid or the
    /// dimension is zero; [`OptError::Worker`] if the worker pool cannot be
    /// built.
    pub fn new(config: DeConfig, dimension: usize, evaluator: V) -> OptResult<Self> {
        config.validate()?;
        if dimension == 0 {
            return Err(OptError::invalid_config("dimension must be at least 1"));
        }
        let pool = if config.parallel {
            Some(WorkerPool::new(config.num_threads)?)
        } else {
            None
        };
        Ok(Self {
            rng: rng_from_seed(config.seed),
            population: Population::new(config.population_size),
            config,
            dimension,
            evaluator,
            pool,
            incumbent: None,
            generation: 0,
        })
    }

    pub fn config(&self) -> &DeConfig {
        &self.config
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The current population, in slot order.
    pub fn population(&self) -> &Population<E> {
        &self.population
    }

    /// Generations completed since the last `init`.
    pub fn generation(&self) -> usize {
        self.generation
    }
}

impl<E, V> Algorithm for DifferentialEvolution<E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    type Value = E;

    fn name(&self) -> &str {
        if self.pool.is_some() {
            "differential evolution (parallel)"
        } else {
            "differential evolution"
        }
    }

    fn init_with_seeds(&mut self, seeds: Vec<E>) -> OptResult<()> {
        let population = seeded_population(
            seeds,
            self.config.population_size,
            self.dimension,
            &self.evaluator,
            &mut self.rng,
        )?;
        let best = population.best().cloned().ok_or(OptError::NotInitialized)?;
        tracing::info!(
            algorithm = self.name(),
            population = population.len(),
            best_cost = best.cost(),
            "initialized"
        );
        self.population = population;
        self.incumbent = Some(Incumbent::new(best));
        self.generation = 0;
        Ok(())
    }

    fn iterate(&mut self) -> OptResult<Candidate<E>> {
        let incumbent = self.incumbent.as_ref().ok_or(OptError::NotInitialized)?;

        // One RNG stream per slot, drawn in slot order, so the sequential and
        // pooled paths consume randomness identically.
        let seeds: Vec<u64> = (0..self.population.len())
            .map(|_| self.rng.random())
            .collect();

        let capacity = self.population.capacity();
        let slots: Vec<Mutex<Candidate<E>>> =
            std::mem::replace(&mut self.population, Population::new(capacity))
                .into_vec()
                .into_iter()
                .map(Mutex::new)
                .collect();

        let step = TrialStep {
            scale_factor: self.config.scale_factor,
            crossover_probability: self.config.crossover_probability,
            evaluator: &self.evaluator,
            incumbent,
        };

        let outcome = match &self.pool {
            Some(pool) => {
                let tasks: Vec<_> = seeds
                    .iter()
                    .enumerate()
                    .map(|(slot, &seed)| {
                        let step = &step;
                        let slots = &slots;
                        move || step.evolve_slot(slot, slots, seed)
                    })
                    .collect();
                pool.fork_join(tasks)
                    .map(|improved| improved.into_iter().filter(|&i| i).count())
            }
            None => seeds
                .iter()
                .enumerate()
                .try_fold(0usize, |count, (slot, &seed)| -> OptResult<usize> {
                    Ok(count + step.evolve_slot(slot, &slots, seed)? as usize)
                }),
        };

        // Slots are restored even when the generation failed, so the
        // population keeps its size.
        let candidates = slots
            .into_iter()
            .map(|slot| slot.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect();
        self.population.replace_all(candidates)?;
        let improved = outcome?;

        self.generation += 1;
        let best = incumbent.snapshot()?;
        tracing::debug!(
            algorithm = "de",
            generation = self.generation,
            improved,
            best_cost = best.cost(),
            "generation finished"
        );
        Ok(best)
    }

    fn best(&self) -> Option<Candidate<E>> {
        self.incumbent.as_ref().map(Incumbent::peek)
    }
}

impl<E, V> Tunable for DifferentialEvolution<E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    fn parameter_ranges(&self) -> &'static [ParameterRange] {
        &DE_PARAMETERS
    }

    fn free_parameters(&self) -> Vec<f64> {
        vec![
            self.config.population_size as f64,
            self.config.scale_factor,
            self.config.crossover_probability,
        ]
    }

    /// Population size changes apply at the next `init`.
    fn set_free_parameters(&mut self, unit: &[f64]) -> OptResult<()> {
        let values = denormalize_all(&DE_PARAMETERS, unit)?;
        self.config.population_size = values[0] as usize;
        self.config.scale_factor = values[1];
        self.config.crossover_probability = values[2];
        Ok(())
    }
}

/// Shared, read-only inputs of one generation.
struct TrialStep<'a, E, V> {
    scale_factor: f64,
    crossover_probability: f64,
    evaluator: &'a V,
    incumbent: &'a Incumbent<E>,
}

impl<E, V> TrialStep<'_, E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    /// Builds, evaluates and possibly installs the trial for `slot`.
    ///
    /// Other slots may be replaced concurrently; their values are read
    /// either before or after replacement.
    fn evolve_slot(
        &self,
        slot: usize,
        slots: &[Mutex<Candidate<E>>],
        seed: u64,
    ) -> OptResult<bool> {
        let mut rng = create_rng(seed);
        let [a, b, d] = pick_three_others(slot, slots.len(), &mut rng);

        let target = slots[slot].lock()?.clone();
        let a = slots[a].lock()?.value().clone();
        let b = slots[b].lock()?.value().clone();
        let d = slots[d].lock()?.value().clone();

        let trial = build_trial(
            target.value().genes(),
            a.genes(),
            b.genes(),
            d.genes(),
            self.scale_factor,
            self.crossover_probability,
            &mut rng,
        );
        let trial = Candidate::evaluated(E::from_genes(trial), self.evaluator)?;

        if trial.cost() < target.cost() {
            self.incumbent.offer(&trial)?;
            *slots[slot].lock()? = trial;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Draws three distinct slots, none equal to `exclude`. Needs `n >= 4`.
fn pick_three_others<R: Rng>(exclude: usize, n: usize, rng: &mut R) -> [usize; 3] {
    let mut picked = [exclude; 3];
    for k in 0..3 {
        picked[k] = loop {
            let idx = rng.random_range(0..n);
            if idx != exclude && !picked[..k].contains(&idx) {
                break idx;
            }
        };
    }
    picked
}

/// Binomial crossover of `target` with the mutant `a + F·(b − d)`, clamped to
/// the unit box. One randomly chosen dimension always takes the mutant value.
pub(crate) fn build_trial<R: Rng>(
    target: &[f64],
    a: &[f64],
    b: &[f64],
    d: &[f64],
    scale_factor: f64,
    crossover_probability: f64,
    rng: &mut R,
) -> Vec<f64> {
    let forced = rng.random_range(0..target.len());
    target
        .iter()
        .enumerate()
        .map(|(j, &t)| {
            let value = if rng.random::<f64>() < crossover_probability || j == forced {
                a[j] + scale_factor * (b[j] - d[j])
            } else {
                t
            };
            value.clamp(0.0, 1.0)
        })
        .collect()
}
