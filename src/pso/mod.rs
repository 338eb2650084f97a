//! Particle Swarm Optimization (PSO).
//!
//! Particles fly through the unit box, steered by inertia, their own best
//! position and the swarm's best position. Each particle is updated by a
//! single task, so a generation can run on a worker pool; the shared swarm
//! best is read once per particle update and only written through the
//! guarded [`Incumbent`](crate::Incumbent).
//!
//! # References
//!
//! - Kennedy & Eberhart (1995), "Particle Swarm Optimization"
//! - Clerc & Kennedy (2002), "The Particle Swarm - Explosion, Stability, and
//!   Convergence in a Multidimensional Complex Space"

mod config;
mod runner;
mod types;

pub use config::PsoConfig;
pub use runner::ParticleSwarm;
pub use types::Particle;
