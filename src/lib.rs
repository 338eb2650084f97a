//! Stochastic population-based minimization.
//!
//! Provides generic implementations of four black-box optimizers behind
//! one [`Algorithm`] lifecycle (`init` → `iterate` → `best`):
//!
//! - **Differential Evolution (DE)**: trial vectors from scaled differences
//!   of population members, one task per slot on a [`WorkerPool`].
//! - **Particle Swarm Optimization (PSO)**: particles steered by inertia,
//!   personal best and swarm best, one task per particle.
//! - **Genetic Algorithm (GA)**: elitism plus pluggable selection, crossover
//!   and mutation operators over any [`Genome`].
//! - **Simulated Annealing (SA)**: a single walk with Metropolis acceptance
//!   and geometric cooling.
//!
//! Every algorithm minimizes a user [`Evaluator`]. DE, PSO and SA search
//! the unit box `[0, 1]^d`; the caller maps it onto the problem's domain.
//!
//! # Meta-optimization
//!
//! Each algorithm is also [`Tunable`]: its hyperparameters are exposed as
//! a vector of unit-interval values. [`MetaEvaluator`] turns "run this
//! algorithm with these hyperparameters" into an ordinary cost function,
//! so any algorithm in the crate can tune any other.
//!
//! # Observability
//!
//! The crate emits [`tracing`] events (`info` at init and at the end of a
//! run, `debug` per generation, `warn` on worker failures) and never
//! installs a subscriber.

pub mod de;
pub mod ga;
pub mod pso;
pub mod random;
pub mod sa;

mod algorithm;
mod candidate;
mod error;
mod evaluator;
mod genome;
mod incumbent;
mod parallel;
mod tuning;

pub use algorithm::{Algorithm, RunResult};
pub use candidate::{Candidate, Population};
pub use error::{EvaluationError, OptError, OptResult};
pub use evaluator::Evaluator;
pub use genome::{clamp_to_unit_box, neighbor, Genome};
pub use incumbent::Incumbent;
pub use parallel::WorkerPool;
pub use random::create_rng;
pub use tuning::{MetaEvaluator, ParameterRange, Tunable};
