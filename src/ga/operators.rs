//! Crossover and mutation operators.
//!
//! Both operator kinds are stateless. Crossover builds new, unevaluated
//! candidates from parent pairs; mutation edits a number of distinct
//! candidates in place, which marks them for re-evaluation.
//!
//! # Crossover Operators
//!
//! - [`SinglePointCrossover`]: swap tails after one random cut
//! - [`UniformCrossover`]: swap each gene with probability 1/2
//!
//! # Mutation Operators
//!
//! - [`RandomResetMutation`]: redraw random genes, any [`Genome`]
//! - [`GaussianMutation`]: add normal noise to real genes, clamped to `[0, 1]`
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"
//! - Eiben & Smith (2015), *Introduction to Evolutionary Computing*, ch. 4

use crate::candidate::Candidate;
use crate::error::{OptError, OptResult};
use crate::genome::Genome;
use rand::seq::index;
use rand::Rng;
use rand_distr::{Distribution, Normal};

// ============================================================================
// Crossover operators
// ============================================================================

/// Recombines parent pairs into offspring.
pub trait CrossoverOperator<E>: std::fmt::Debug {
    /// Produces two children from two parents.
    fn cross<R: Rng>(&self, first: &E, second: &E, rng: &mut R) -> (E, E);

    /// Creates `2 * pairs` unevaluated offspring from randomly paired
    /// `parents`. Returns nothing when there are no parents.
    ///
    /// The two parents of a pair are distinct slots whenever there are at
    /// least two parents.
    fn offspring<R: Rng>(
        &self,
        parents: &[Candidate<E>],
        pairs: usize,
        rng: &mut R,
    ) -> Vec<Candidate<E>> {
        let n = parents.len();
        if n == 0 {
            return Vec::new();
        }
        let mut children = Vec::with_capacity(2 * pairs);
        for _ in 0..pairs {
            let (i, j) = if n == 1 {
                (0, 0)
            } else {
                let i = rng.random_range(0..n);
                let j = rng.random_range(0..n - 1);
                (i, if j >= i { j + 1 } else { j })
            };
            let (a, b) = self.cross(parents[i].value(), parents[j].value(), rng);
            children.push(Candidate::unevaluated(a));
            children.push(Candidate::unevaluated(b));
        }
        children
    }
}

/// Single-point crossover: genes after a random cut point are swapped.
///
/// The cut lies in `1..dimension`, so both children mix both parents when
/// the dimension is at least 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinglePointCrossover;

impl<E: Genome> CrossoverOperator<E> for SinglePointCrossover {
    fn cross<R: Rng>(&self, first: &E, second: &E, rng: &mut R) -> (E, E) {
        let a = first.genes();
        let b = second.genes();
        let n = a.len().min(b.len());
        if n < 2 {
            return (first.clone(), second.clone());
        }

        let point = rng.random_range(1..n);
        let mut c1 = a[..point].to_vec();
        c1.extend_from_slice(&b[point..n]);
        let mut c2 = b[..point].to_vec();
        c2.extend_from_slice(&a[point..n]);
        (E::from_genes(c1), E::from_genes(c2))
    }
}

/// Uniform crossover: each gene is swapped between the children with
/// probability `swap_probability`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformCrossover {
    swap_probability: f64,
}

impl UniformCrossover {
    /// Clamps `swap_probability` to `[0, 1]`; NaN means never swap.
    pub fn new(swap_probability: f64) -> Self {
        Self {
            swap_probability: unit_probability(swap_probability),
        }
    }

    pub fn swap_probability(&self) -> f64 {
        self.swap_probability
    }
}

impl Default for UniformCrossover {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl<E: Genome> CrossoverOperator<E> for UniformCrossover {
    fn cross<R: Rng>(&self, first: &E, second: &E, rng: &mut R) -> (E, E) {
        let (c1, c2): (Vec<E::Gene>, Vec<E::Gene>) = first
            .genes()
            .iter()
            .zip(second.genes())
            .map(|(&a, &b)| {
                if rng.random_bool(self.swap_probability) {
                    (b, a)
                } else {
                    (a, b)
                }
            })
            .unzip();
        (E::from_genes(c1), E::from_genes(c2))
    }
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Perturbs candidates in place.
pub trait MutationOperator<E>: std::fmt::Debug {
    /// Mutates a single solution.
    fn mutate_value<R: Rng>(&self, value: &mut E, rng: &mut R);

    /// Mutates `min(count, candidates.len())` distinct candidates. Mutated
    /// candidates are left unevaluated.
    fn mutate<R: Rng>(&self, candidates: &mut [Candidate<E>], count: usize, rng: &mut R) {
        let amount = count.min(candidates.len());
        for i in index::sample(rng, candidates.len(), amount) {
            self.mutate_value(candidates[i].value_mut(), rng);
        }
    }
}

/// Redraws `genes` distinct random genes with [`Genome::random_gene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomResetMutation {
    pub genes: usize,
}

impl RandomResetMutation {
    pub fn new(genes: usize) -> Self {
        Self { genes: genes.max(1) }
    }
}

impl Default for RandomResetMutation {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<E: Genome> MutationOperator<E> for RandomResetMutation {
    fn mutate_value<R: Rng>(&self, value: &mut E, rng: &mut R) {
        let genes = value.genes_mut();
        let amount = self.genes.min(genes.len());
        for i in index::sample(rng, genes.len(), amount) {
            genes[i] = E::random_gene(rng);
        }
    }
}

/// Adds `N(0, sigma)` noise to real genes and clamps them to `[0, 1]`.
///
/// Each gene is perturbed with probability `gene_probability`; one random
/// gene is always perturbed so every mutation changes the solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianMutation {
    normal: Normal<f64>,
    gene_probability: f64,
}

impl GaussianMutation {
    /// Perturbs every gene with standard deviation `sigma`.
    ///
    /// # Errors
    /// [`OptError::InvalidConfig`] if `sigma` is negative or not finite.
    pub fn new(sigma: f64) -> OptResult<Self> {
        if !sigma.is_finite() {
            return Err(OptError::invalid_config(format!(
                "sigma must be finite, got {sigma}"
            )));
        }
        let normal = Normal::new(0.0, sigma)
            .map_err(|err| OptError::invalid_config(format!("invalid sigma {sigma}: {err}")))?;
        Ok(Self {
            normal,
            gene_probability: 1.0,
        })
    }

    /// Clamps `p` to `[0, 1]`; NaN leaves only the forced gene.
    pub fn with_gene_probability(mut self, p: f64) -> Self {
        self.gene_probability = unit_probability(p);
        self
    }

    pub fn gene_probability(&self) -> f64 {
        self.gene_probability
    }

    pub fn sigma(&self) -> f64 {
        self.normal.std_dev()
    }
}

impl<E: Genome<Gene = f64>> MutationOperator<E> for GaussianMutation {
    fn mutate_value<R: Rng>(&self, value: &mut E, rng: &mut R) {
        let genes = value.genes_mut();
        if genes.is_empty() {
            return;
        }
        let forced = rng.random_range(0..genes.len());
        for (j, gene) in genes.iter_mut().enumerate() {
            if j == forced || rng.random_bool(self.gene_probability) {
                *gene = (*gene + self.normal.sample(rng)).clamp(0.0, 1.0);
            }
        }
    }
}

fn unit_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
