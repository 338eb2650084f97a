//! Particle state.

use crate::candidate::Candidate;

/// A swarm member: its current position, velocity and personal best.
///
/// `local_best` is an owned clone, never a view of `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle<E> {
    pub(crate) position: Candidate<E>,
    pub(crate) velocity: Vec<f64>,
    pub(crate) local_best: Candidate<E>,
}

impl<E: Clone> Particle<E> {
    pub fn new(position: Candidate<E>, velocity: Vec<f64>) -> Self {
        Self {
            local_best: position.clone(),
            position,
            velocity,
        }
    }

    /// The current position and its cost.
    pub fn position(&self) -> &Candidate<E> {
        &self.position
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Best position this particle has visited.
    pub fn local_best(&self) -> &Candidate<E> {
        &self.local_best
    }
}
