//! Solution representations.
//!
//! A [`Genome`] is a fixed-length sequence of genes. DE, PSO and SA work on
//! real-valued genomes inside the unit box `[0, 1]^d`; the GA accepts any
//! genome its operators understand (e.g. bit strings).

use rand::Rng;

/// A fixed-length solution representation.
///
/// # Implementing
///
/// ```ignore
/// #[derive(Clone, Debug)]
/// struct Weights(Vec<f64>);
///
/// impl Genome for Weights {
///     type Gene = f64;
///     fn random_gene<R: Rng>(rng: &mut R) -> f64 { rng.random() }
///     fn genes(&self) -> &[f64] { &self.0 }
///     fn genes_mut(&mut self) -> &mut [f64] { &mut self.0 }
///     fn from_genes(genes: Vec<f64>) -> Self { Weights(genes) }
/// }
/// ```
pub trait Genome: Clone + Send + Sync + std::fmt::Debug {
    /// The gene type.
    type Gene: Copy + Send + Sync + std::fmt::Debug + PartialEq;

    /// Draws one random gene.
    fn random_gene<R: Rng>(rng: &mut R) -> Self::Gene;

    fn genes(&self) -> &[Self::Gene];

    fn genes_mut(&mut self) -> &mut [Self::Gene];

    fn from_genes(genes: Vec<Self::Gene>) -> Self;

    /// Number of genes.
    fn dimension(&self) -> usize {
        self.genes().len()
    }

    /// Creates a random genome with `dimension` genes.
    fn random<R: Rng>(dimension: usize, rng: &mut R) -> Self {
        Self::from_genes((0..dimension).map(|_| Self::random_gene(rng)).collect())
    }
}

impl Genome for Vec<f64> {
    type Gene = f64;

    /// Uniform in `[0, 1)`.
    fn random_gene<R: Rng>(rng: &mut R) -> f64 {
        rng.random()
    }

    fn genes(&self) -> &[f64] {
        self
    }

    fn genes_mut(&mut self) -> &mut [f64] {
        self
    }

    fn from_genes(genes: Vec<f64>) -> Self {
        genes
    }
}

impl Genome for Vec<bool> {
    type Gene = bool;

    fn random_gene<R: Rng>(rng: &mut R) -> bool {
        rng.random_bool(0.5)
    }

    fn genes(&self) -> &[bool] {
        self
    }

    fn genes_mut(&mut self) -> &mut [bool] {
        self
    }

    fn from_genes(genes: Vec<bool>) -> Self {
        genes
    }
}

/// Clamps every gene into `[0, 1]`.
pub fn clamp_to_unit_box<G: Genome<Gene = f64>>(genome: &mut G) {
    for gene in genome.genes_mut() {
        *gene = gene.clamp(0.0, 1.0);
    }
}

/// Returns a neighbor of `genome`: every gene is shifted by a uniform draw
/// from `[-magnitude, magnitude]`, then the result is clamped to the unit box.
pub fn neighbor<G: Genome<Gene = f64>, R: Rng>(genome: &G, magnitude: f64, rng: &mut R) -> G {
    let magnitude = magnitude.abs();
    let genes = genome
        .genes()
        .iter()
        .map(|&g| (g + rng.random_range(-magnitude..=magnitude)).clamp(0.0, 1.0))
        .collect();
    G::from_genes(genes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;

    #[test]
    fn test_random_real_genome_in_unit_box() {
        let mut rng = create_rng(42);
        let g: Vec<f64> = Genome::random(50, &mut rng);
        assert_eq!(g.dimension(), 50);
        assert!(g.iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn test_random_bit_genome() {
        let mut rng = create_rng(42);
        let g: Vec<bool> = Genome::random(200, &mut rng);
        let ones = g.iter().filter(|&&b| b).count();
        assert!(ones > 50 && ones < 150, "expected roughly half set, got {ones}");
    }

    #[test]
    fn test_clamp() {
        let mut g = vec![-0.5, 0.25, 1.5];
        clamp_to_unit_box(&mut g);
        assert_eq!(g, vec![0.0, 0.25, 1.0]);
    }

    #[test]
    fn test_neighbor_zero_magnitude_is_identity() {
        let mut rng = create_rng(1);
        let g = vec![0.1, 0.5, 0.9];
        assert_eq!(neighbor(&g, 0.0, &mut rng), g);
    }

    proptest! {
        #[test]
        fn prop_neighbor_stays_close_and_in_box(
            genes in prop::collection::vec(0.0f64..=1.0, 1..20),
            magnitude in 0.0f64..0.5,
            seed in any::<u64>(),
        ) {
            let mut rng = create_rng(seed);
            let n = neighbor(&genes, magnitude, &mut rng);
            prop_assert_eq!(n.len(), genes.len());
            for (a, b) in genes.iter().zip(n.iter()) {
                prop_assert!((0.0..=1.0).contains(b));
                prop_assert!((a - b).abs() <= magnitude + 1e-12);
            }
        }

        #[test]
        fn prop_clamp_in_box(genes in prop::collection::vec(-10.0f64..10.0, 0..20)) {
            let mut g = genes.clone();
            clamp_to_unit_box(&mut g);
            prop_assert!(g.iter().all(|x| (0.0..=1.0).contains(x)));
        }
    }
}
