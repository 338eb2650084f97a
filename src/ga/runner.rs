//! GA evolutionary loop execution.
//!
//! [`GeneticAlgorithm`] advances one generation per `iterate`:
//! sort → elites → selection → crossover → mutation → refill → evaluate.

use super::config::{GaConfig, GenerationPlan};
use super::operators::{CrossoverOperator, MutationOperator};
use super::selection::SelectionOperator;
use crate::algorithm::{validate_seeds, Algorithm};
use crate::candidate::{Candidate, Population};
use crate::error::{OptError, OptResult};
use crate::evaluator::Evaluator;
use crate::genome::Genome;
use crate::incumbent::Incumbent;
use crate::parallel::panic_message;
use crate::random::rng_from_seed;
use crate::tuning::{denormalize_all, ParameterRange, Tunable};
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};

static GA_PARAMETERS: [ParameterRange; 4] = [
    ParameterRange::integer("population_size", 10.0, 100.0),
    ParameterRange::real("elitism", 0.0, 0.2),
    ParameterRange::real("keep", 0.1, 0.6),
    ParameterRange::real("mutation_rate", 0.0, 0.5),
];

/// Genetic Algorithm with pluggable operators.
///
/// Each generation keeps the elites, selects parents, fills the free slots
/// with crossover offspring, mutates some of the parents and offspring and
/// tops the population up with random candidates. Only candidates whose
/// value changed are re-evaluated.
///
/// # Usage
///
/// ```
/// use u_stochopt::ga::{
///     GaConfig, GeneticAlgorithm, RandomResetMutation, SinglePointCrossover,
///     TournamentSelection,
/// };
/// use u_stochopt::Algorithm;
///
/// // Minimize the number of unset bits.
/// fn zeros(bits: &Vec<bool>) -> f64 {
///     bits.iter().filter(|&&b| !b).count() as f64
/// }
///
/// let mut ga: GeneticAlgorithm<Vec<bool>, _, _, _, _> = GeneticAlgorithm::new(
///     GaConfig::default().with_seed(42),
///     16,
///     zeros,
///     TournamentSelection::new(3),
///     SinglePointCrossover,
///     RandomResetMutation::new(1),
/// )
/// .unwrap();
/// let result = ga.run(50).unwrap();
/// assert!(result.best_cost <= 4.0);
/// ```
#[derive(Debug)]
pub struct GeneticAlgorithm<E, V, S, C, M> {
    config: GaConfig,
    plan: GenerationPlan,
    dimension: usize,
    evaluator: V,
    selection: S,
    crossover: C,
    mutation: M,
    rng: StdRng,
    population: Population<E>,
    incumbent: Option<Incumbent<E>>,
    generation: usize,
}

impl<E, V, S, C, M> GeneticAlgorithm<E, V, S, C, M>
where
    E: Genome,
    V: Evaluator<E>,
    S: SelectionOperator<E>,
    C: CrossoverOperator<E>,
    M: MutationOperator<E>,
{
    /// Creates an uninitialized GA for `dimension`-gene solutions.
    ///
    /// # Errors
    /// [`OptError::InvalidConfig`] if the configuration is invalid or the
    /// dimension is zero.
    pub fn new(
        config: GaConfig,
        dimension: usize,
        evaluator: V,
        selection: S,
        crossover: C,
        mutation: M,
    ) -> OptResult<Self> {
        config.validate()?;
        if dimension == 0 {
            return Err(OptError::invalid_config("dimension must be at least 1"));
        }
        let plan = config.plan();
        Ok(Self {
            rng: rng_from_seed(config.seed),
            population: Population::new(plan.size),
            config,
            plan,
            dimension,
            evaluator,
            selection,
            crossover,
            mutation,
            incumbent: None,
            generation: 0,
        })
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Counts in effect since the last `init`.
    pub fn plan(&self) -> GenerationPlan {
        self.plan
    }

    /// The current population, sorted by cost.
    pub fn population(&self) -> &Population<E> {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }
}

impl<E, V, S, C, M> Algorithm for GeneticAlgorithm<E, V, S, C, M>
where
    E: Genome,
    V: Evaluator<E>,
    S: SelectionOperator<E>,
    C: CrossoverOperator<E>,
    M: MutationOperator<E>,
{
    type Value = E;

    fn name(&self) -> &str {
        "genetic algorithm"
    }

    fn init_with_seeds(&mut self, seeds: Vec<E>) -> OptResult<()> {
        // Tuned parameters are only checked here.
        self.config.validate()?;
        let plan = self.config.plan();
        validate_seeds(&seeds, plan.size, self.dimension)?;

        let padding = plan.size - seeds.len();
        let mut candidates: Vec<Candidate<E>> = seeds
            .into_iter()
            .map(Candidate::unevaluated)
            .collect();
        for _ in 0..padding {
            candidates.push(Candidate::unevaluated(E::random(
                self.dimension,
                &mut self.rng,
            )));
        }
        evaluate_pending(&mut candidates, &self.evaluator, self.config.parallel)?;

        let mut population = Population::from_candidates(candidates, plan.size)?;
        population.sort_by_cost();
        let best = population.best().cloned().ok_or(OptError::NotInitialized)?;

        tracing::info!(
            algorithm = self.name(),
            population = population.len(),
            elites = plan.elites,
            selection = plan.selection,
            mutations = plan.mutations,
            best_cost = best.cost(),
            "initialized"
        );
        self.plan = plan;
        self.population = population;
        self.incumbent = Some(Incumbent::new(best));
        self.generation = 0;
        Ok(())
    }

    fn iterate(&mut self) -> OptResult<Candidate<E>> {
        let incumbent = self.incumbent.as_ref().ok_or(OptError::NotInitialized)?;
        let plan = self.plan;

        self.population.sort_by_cost();
        let elite_count = plan.elites.min(self.population.len());
        let mut next = self.population.as_slice()[..elite_count].to_vec();

        let mut brood = self
            .selection
            .select(&self.population, plan.selection, &mut self.rng);
        let offspring = self
            .crossover
            .offspring(&brood, plan.pairs(), &mut self.rng);
        brood.extend(offspring);
        self.mutation
            .mutate(&mut brood, plan.mutations, &mut self.rng);
        next.append(&mut brood);

        if next.len() > plan.size {
            return Err(OptError::invalid_argument(format!(
                "operators produced {} candidates for a population of {}",
                next.len(),
                plan.size
            )));
        }
        let padding = plan.size - next.len();
        for _ in 0..padding {
            next.push(Candidate::unevaluated(E::random(
                self.dimension,
                &mut self.rng,
            )));
        }

        let evaluated = evaluate_pending(&mut next, &self.evaluator, self.config.parallel)?;
        self.population.replace_all(next)?;
        self.population.sort_by_cost();
        if let Some(best) = self.population.best() {
            incumbent.offer(best)?;
        }

        self.generation += 1;
        let best = incumbent.snapshot()?;
        tracing::debug!(
            algorithm = "ga",
            generation = self.generation,
            evaluated,
            padding,
            best_cost = best.cost(),
            mean_cost = self.population.mean_cost(),
            "generation finished"
        );
        Ok(best)
    }

    fn best(&self) -> Option<Candidate<E>> {
        self.incumbent.as_ref().map(Incumbent::peek)
    }
}

impl<E, V, S, C, M> Tunable for GeneticAlgorithm<E, V, S, C, M>
where
    E: Genome,
    V: Evaluator<E>,
    S: SelectionOperator<E>,
    C: CrossoverOperator<E>,
    M: MutationOperator<E>,
{
    fn parameter_ranges(&self) -> &'static [ParameterRange] {
        &GA_PARAMETERS
    }

    fn free_parameters(&self) -> Vec<f64> {
        let plan = self.config.plan();
        vec![
            plan.size as f64,
            self.config.elites.as_ratio(plan.size),
            self.config.selection.as_ratio(plan.size),
            self.config.mutations.as_ratio(plan.size - plan.elites.min(plan.size)),
        ]
    }

    /// Sets size and ratios. Changes apply at the next `init`.
    fn set_free_parameters(&mut self, unit: &[f64]) -> OptResult<()> {
        let values = denormalize_all(&GA_PARAMETERS, unit)?;
        self.config = self
            .config
            .clone()
            .with_population_size(values[0] as usize)
            .with_elitism(values[1])
            .with_keep(values[2])
            .with_mutation_rate(values[3]);
        Ok(())
    }
}

/// Evaluates every candidate that has no cost yet. Returns how many were
/// evaluated.
fn evaluate_pending<E, V>(
    candidates: &mut [Candidate<E>],
    evaluator: &V,
    parallel: bool,
) -> OptResult<usize>
where
    E: Genome,
    V: Evaluator<E>,
{
    if parallel {
        // A panicking evaluator surfaces as a worker error, as on a WorkerPool.
        candidates
            .par_iter_mut()
            .filter(|c| !c.is_evaluated())
            .map(|c| {
                catch_unwind(AssertUnwindSafe(|| c.reevaluate(evaluator)))
                    .unwrap_or_else(|payload| Err(OptError::Worker(panic_message(&*payload))))
                    .map(|()| 1)
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    } else {
        let mut count = 0;
        for c in candidates.iter_mut().filter(|c| !c.is_evaluated()) {
            c.reevaluate(evaluator)?;
            count += 1;
        }
        Ok(count)
    }
}

// ============================================================================
// Tests
// ============================================================================
