//! Selection strategies for the GA.
//!
//! Selection determines which candidates are kept as parents for
//! crossover. Different strategies provide different selection pressure.
//! Every strategy returns clones, so the population itself is never
//! modified.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use crate::candidate::{Candidate, Population};
use rand::Rng;

/// Chooses parents from a population.
///
/// All strategies assume **minimization** (lower cost = better).
pub trait SelectionOperator<E>: std::fmt::Debug {
    /// Returns `count` clones picked from `population`, which is sorted by
    /// cost. An empty population yields no parents.
    fn select<R: Rng>(
        &self,
        population: &Population<E>,
        count: usize,
        rng: &mut R,
    ) -> Vec<Candidate<E>>;
}

/// Tournament selection: pick `size` candidates at random, keep the best.
///
/// Higher `size` = stronger selection pressure.
/// - 2: light pressure (good for diversity)
/// - 3-5: moderate pressure (typical default)
/// - >5: strong pressure (risk of premature convergence)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TournamentSelection {
    pub size: usize,
}

impl TournamentSelection {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self::new(3)
    }
}

impl<E: Clone> SelectionOperator<E> for TournamentSelection {
    fn select<R: Rng>(
        &self,
        population: &Population<E>,
        count: usize,
        rng: &mut R,
    ) -> Vec<Candidate<E>> {
        let slice = population.as_slice();
        if slice.is_empty() {
            return Vec::new();
        }
        (0..count)
            .map(|_| slice[tournament(slice, self.size, rng)].clone())
            .collect()
    }
}

/// Fitness-proportionate (roulette wheel) selection.
///
/// Since we minimize, weights are `max_cost - cost + epsilon`.
///
/// **Warning**: Susceptible to super-individual dominance when
/// cost variance is high.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouletteSelection;

impl<E: Clone> SelectionOperator<E> for RouletteSelection {
    fn select<R: Rng>(
        &self,
        population: &Population<E>,
        count: usize,
        rng: &mut R,
    ) -> Vec<Candidate<E>> {
        let slice = population.as_slice();
        if slice.is_empty() {
            return Vec::new();
        }
        let weights = inverse_cost_weights(slice);
        (0..count)
            .map(|_| slice[spin(&weights, rng)].clone())
            .collect()
    }
}

/// Rank-based selection.
///
/// Selection probability is proportional to rank position, not raw cost.
/// This avoids the scaling problems of roulette wheel selection.
///
/// Uses linear ranking: the best of `n` candidates has weight `n`, the
/// worst has weight `1`.
///
/// Reference: Baker (1985), "Adaptive Selection Methods for Genetic
/// Algorithms"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankSelection;

impl<E: Clone> SelectionOperator<E> for RankSelection {
    fn select<R: Rng>(
        &self,
        population: &Population<E>,
        count: usize,
        rng: &mut R,
    ) -> Vec<Candidate<E>> {
        let slice = population.as_slice();
        let n = slice.len();
        if n == 0 {
            return Vec::new();
        }

        // Ranks are taken from a cost ordering, so an unsorted population
        // still ranks correctly.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| slice[a].cmp_cost(&slice[b]));
        let weights: Vec<f64> = (0..n).map(|rank| (n - rank) as f64).collect();

        (0..count)
            .map(|_| slice[order[spin(&weights, rng)]].clone())
            .collect()
    }
}

/// Truncation selection: the best `count` candidates, in cost order.
///
/// Wraps around to the best again when `count` exceeds the population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TruncationSelection;

impl<E: Clone> SelectionOperator<E> for TruncationSelection {
    fn select<R: Rng>(
        &self,
        population: &Population<E>,
        count: usize,
        _rng: &mut R,
    ) -> Vec<Candidate<E>> {
        population.iter().cycle().take(count).cloned().collect()
    }
}

/// Tournament selection: pick k random candidates, return the best index.
fn tournament<E, R: Rng>(population: &[Candidate<E>], k: usize, rng: &mut R) -> usize {
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if population[idx].cost() < population[best_idx].cost() {
            best_idx = idx;
        }
    }
    best_idx
}

/// For minimization: weight_i = max_cost - cost_i + epsilon.
/// Non-finite costs get the minimum weight.
fn inverse_cost_weights<E>(population: &[Candidate<E>]) -> Vec<f64> {
    let epsilon = 1e-10;
    let max_cost = population
        .iter()
        .map(Candidate::cost)
        .filter(|c| c.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    population
        .iter()
        .map(|c| {
            let w = max_cost - c.cost() + epsilon;
            if w.is_finite() && w > 0.0 {
                w
            } else {
                epsilon
            }
        })
        .collect()
}

/// Samples an index with probability proportional to its weight.
fn spin<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let n = weights.len();
    if n == 1 {
        return 0;
    }

    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    n - 1 // floating-point fallback
}
