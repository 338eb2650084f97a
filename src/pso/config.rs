//! PSO configuration.

use crate::error::{OptError, OptResult};

/// Configuration for Particle Swarm Optimization.
///
/// Defaults use the constriction-equivalent coefficients of Clerc & Kennedy
/// (`omega = 0.729`, `c1 = c2 = 1.49445`).
///
/// # Examples
///
/// ```
/// use u_stochopt::pso::PsoConfig;
///
/// let config = PsoConfig::default()
///     .with_swarm_size(40)
///     .with_inertia(0.6)
///     .with_max_velocity(0.1)
///     .with_seed(1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PsoConfig {
    /// Number of particles.
    pub swarm_size: usize,

    /// Inertia weight (omega) applied to the previous velocity.
    pub inertia: f64,

    /// Cognitive coefficient (c1): pull towards the particle's own best.
    pub cognitive: f64,

    /// Social coefficient (c2): pull towards the swarm's best.
    pub social: f64,

    /// Per-dimension velocity cap. Velocities stay in `[-max, max]`.
    pub max_velocity: f64,

    /// Whether to update particles on a worker pool.
    pub parallel: bool,

    /// Worker count for parallel mode. `0` uses one worker per logical CPU.
    pub num_threads: usize,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            swarm_size: 30,
            inertia: 0.729,
            cognitive: 1.49445,
            social: 1.49445,
            max_velocity: 0.26,
            parallel: false,
            num_threads: 0,
            seed: None,
        }
    }
}

impl PsoConfig {
    pub fn with_swarm_size(mut self, n: usize) -> Self {
        self.swarm_size = n;
        self
    }

    pub fn with_inertia(mut self, omega: f64) -> Self {
        self.inertia = omega;
        self
    }

    pub fn with_cognitive(mut self, c1: f64) -> Self {
        self.cognitive = c1;
        self
    }

    pub fn with_social(mut self, c2: f64) -> Self {
        self.social = c2;
        self
    }

    /// Sets the velocity cap. Negative values are taken by magnitude.
    pub fn with_max_velocity(mut self, max: f64) -> Self {
        self.max_velocity = max.abs();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OptResult<()> {
        if self.swarm_size == 0 {
            return Err(OptError::invalid_config("swarm_size must be at least 1"));
        }
        for (name, value) in [
            ("inertia", self.inertia),
            ("cognitive", self.cognitive),
            ("social", self.social),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OptError::invalid_config(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !(self.max_velocity > 0.0 && self.max_velocity.is_finite()) {
            return Err(OptError::invalid_config(format!(
                "max_velocity must be positive and finite, got {}",
                self.max_velocity
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
        let config = PsoConfig::default();
        assert_eq!(config.swarm_size, 30);
        assert!((config.inertia - 0.729).abs() < 1e-12);
        assert!((config.cognitive - 1.49445).abs() < 1e-12);
        assert!((config.social - 1.49445).abs() < 1e-12);
        assert!((config.max_velocity - 0.26).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(PsoConfig::default().with_swarm_size(0).validate().is_err());
        assert!(PsoConfig::default().with_inertia(-0.1).validate().is_err());
        assert!(PsoConfig::default()
            .with_social(f64::INFINITY)
            .validate()
            .is_err());
        assert!(PsoConfig::default().with_max_velocity(0.0).validate().is_err());
    }

    #[test]
    fn test_max_velocity_magnitude() {
        let config = PsoConfig::default().with_max_velocity(-0.3);
        assert!((config.max_velocity - 0.3).abs() < 1e-12);
    }
}
