//! PSO generation loop.

use super::config::PsoConfig;
use super::types::Particle;
use crate::algorithm::{seeded_population, Algorithm};
use crate::candidate::Candidate;
use crate::error::{OptError, OptResult};
use crate::evaluator::Evaluator;
use crate::genome::Genome;
use crate::incumbent::Incumbent;
use crate::parallel::WorkerPool;
use crate::random::{create_rng, rng_from_seed};
use crate::tuning::{denormalize_all, ParameterRange, Tunable};
use rand::rngs::StdRng;
use rand::Rng;

static PSO_PARAMETERS: [ParameterRange; 5] = [
    ParameterRange::integer("swarm_size", 10.0, 60.0),
    ParameterRange::real("inertia", 0.01, 1.0),
    ParameterRange::real("cognitive", 0.01, 2.0),
    ParameterRange::real("social", 0.01, 2.0),
    ParameterRange::real("max_velocity", 0.0001, 1.0),
];

/// Particle Swarm Optimization over real genomes in the unit box.
///
/// ```
/// use u_stochopt::pso::{ParticleSwarm, PsoConfig};
/// use u_stochopt::Algorithm;
///
/// fn sphere(x: &Vec<f64>) -> f64 {
///     x.iter().map(|v| v * v).sum()
/// }
///
/// let mut pso: ParticleSwarm<Vec<f64>, _> =
///     ParticleSwarm::new(PsoConfig::default().with_seed(3), 4, sphere).unwrap();
/// let result = pso.run(50).unwrap();
/// assert!(result.best_cost < 0.1);
/// ```
#[derive(Debug)]
pub struct ParticleSwarm<E, V> {
    config: PsoConfig,
    dimension: usize,
    evaluator: V,
    rng: StdRng,
    pool: Option<WorkerPool>,
    particles: Vec<Particle<E>>,
    incumbent: Option<Incumbent<E>>,
    generation: usize,
}

impl<E, V> ParticleSwarm<E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    /// Creates an uninitialized swarm for `dimension`-gene solutions.
    pub fn new(config: PsoConfig, dimension: usize, evaluator: V) -> OptResult<Self> {
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
            config,
            dimension,
            evaluator,
            pool,
            particles: Vec::new(),
            incumbent: None,
            generation: 0,
        })
    }

    pub fn config(&self) -> &PsoConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle<E>] {
        &self.particles
    }

    pub fn generation(&self) -> usize {
        self.generation
    }
}

impl<E, V> Algorithm for ParticleSwarm<E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    type Value = E;

    fn name(&self) -> &str {
        if self.pool.is_some() {
            "particle swarm (parallel)"
        } else {
            "particle swarm"
        }
    }

    fn init_with_seeds(&mut self, seeds: Vec<E>) -> OptResult<()> {
        let population = seeded_population(
            seeds,
            self.config.swarm_size,
            self.dimension,
            &self.evaluator,
            &mut self.rng,
        )?;
        let best = population.best().cloned().ok_or(OptError::NotInitialized)?;

        let max_velocity = self.config.max_velocity;
        let dimension = self.dimension;
        let rng = &mut self.rng;
        let particles = population
            .into_vec()
            .into_iter()
            .map(|position| {
                let velocity = (0..dimension)
                    .map(|_| rng.random_range(-max_velocity..=max_velocity))
                    .collect();
                Particle::new(position, velocity)
            })
            .collect::<Vec<_>>();

        tracing::info!(
            algorithm = self.name(),
            particles = particles.len(),
            best_cost = best.cost(),
            "initialized"
        );
        self.particles = particles;
        self.incumbent = Some(Incumbent::new(best));
        self.generation = 0;
        Ok(())
    }

    fn iterate(&mut self) -> OptResult<Candidate<E>> {
        let incumbent = self.incumbent.as_ref().ok_or(OptError::NotInitialized)?;
        let seeds: Vec<u64> = (0..self.particles.len())
            .map(|_| self.rng.random())
            .collect();

        let step = FlightStep {
            inertia: self.config.inertia,
            cognitive: self.config.cognitive,
            social: self.config.social,
            max_velocity: self.config.max_velocity,
            evaluator: &self.evaluator,
            incumbent,
        };

        // Each task owns exactly one particle.
        let improved = match &self.pool {
            Some(pool) => {
                let tasks: Vec<_> = self
                    .particles
                    .iter_mut()
                    .zip(seeds)
                    .map(|(particle, seed)| {
                        let step = &step;
                        move || step.fly(particle, seed)
                    })
                    .collect();
                pool.fork_join(tasks)?.into_iter().filter(|&i| i).count()
            }
            None => {
                let mut count = 0;
                for (particle, seed) in self.particles.iter_mut().zip(seeds) {
                    count += step.fly(particle, seed)? as usize;
                }
                count
            }
        };

        self.generation += 1;
        let best = incumbent.snapshot()?;
        tracing::debug!(
            algorithm = "pso",
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

impl<E, V> Tunable for ParticleSwarm<E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    fn parameter_ranges(&self) -> &'static [ParameterRange] {
        &PSO_PARAMETERS
    }

    fn free_parameters(&self) -> Vec<f64> {
        vec![
            self.config.swarm_size as f64,
            self.config.inertia,
            self.config.cognitive,
            self.config.social,
            self.config.max_velocity,
        ]
    }

    /// Swarm size changes apply at the next `init`.
    fn set_free_parameters(&mut self, unit: &[f64]) -> OptResult<()> {
        let values = denormalize_all(&PSO_PARAMETERS, unit)?;
        self.config.swarm_size = values[0] as usize;
        self.config.inertia = values[1];
        self.config.cognitive = values[2];
        self.config.social = values[3];
        self.config.max_velocity = values[4];
        Ok(())
    }
}

/// Shared, read-only inputs of one generation.
struct FlightStep<'a, E, V> {
    inertia: f64,
    cognitive: f64,
    social: f64,
    max_velocity: f64,
    evaluator: &'a V,
    incumbent: &'a Incumbent<E>,
}

impl<E, V> FlightStep<'_, E, V>
where
    E: Genome<Gene = f64>,
    V: Evaluator<E>,
{
    /// Moves one particle and re-evaluates it. Returns whether its personal
    /// best improved.
    ///
    /// The swarm best is read once up front and may already be outdated by
    /// the time the particle is evaluated.
    fn fly(&self, particle: &mut Particle<E>, seed: u64) -> OptResult<bool> {
        let mut rng = create_rng(seed);
        let global = self.incumbent.snapshot()?;

        let Particle {
            position,
            velocity,
            local_best,
        } = particle;

        let mut next = position.value().clone();
        let next_velocity = update_motion(
            next.genes_mut(),
            velocity,
            local_best.value().genes(),
            global.value().genes(),
            self,
            &mut rng,
        );
        // A failed evaluation leaves the particle exactly as it was.
        *position = Candidate::evaluated(next, self.evaluator)?;
        *velocity = next_velocity;

        if position.cost() < local_best.cost() {
            *local_best = position.clone();
            self.incumbent.offer(local_best)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Moves `position` in place and returns the velocity that moved it.
fn update_motion<E, V, R: Rng>(
    position: &mut [f64],
    velocity: &[f64],
    local_best: &[f64],
    global_best: &[f64],
    step: &FlightStep<'_, E, V>,
    rng: &mut R,
) -> Vec<f64> {
    position
        .iter_mut()
        .enumerate()
        .map(|(j, x)| {
            let p = *x;
            let r1: f64 = rng.random();
            let r2: f64 = rng.random();
            let v = step.inertia * velocity[j]
                + r1 * step.cognitive * (local_best[j] - p)
                + r2 * step.social * (global_best[j] - p);
            let v = v.clamp(-step.max_velocity, step.max_velocity);
            *x = (p + v).clamp(0.0, 1.0);
            v
        })
        .collect()
}
