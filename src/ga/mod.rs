//! Genetic Algorithm framework.
//!
//! A generic GA over any [`Genome`](crate::Genome), driven by three
//! pluggable, stateless operators.
//!
//! # Core Traits
//!
//! - [`SelectionOperator`]: picks parents from the sorted population
//! - [`CrossoverOperator`]: turns parent pairs into two children each
//! - [`MutationOperator`]: edits a number of distinct candidates in place
//!
//! # Key Types
//!
//! - [`GaConfig`]: Population size and per-stage counts ([`Count`])
//! - [`GeneticAlgorithm`]: Executes the evolutionary loop
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - De Jong (2006), *Evolutionary Computation: A Unified Approach*

mod config;
mod operators;
mod runner;
mod selection;

pub use config::{Count, GaConfig, GenerationPlan};
pub use operators::{
    CrossoverOperator, GaussianMutation, MutationOperator, RandomResetMutation,
    SinglePointCrossover, UniformCrossover,
};
pub use runner::GeneticAlgorithm;
pub use selection::{
    RankSelection, RouletteSelection, SelectionOperator, TournamentSelection,
    TruncationSelection,
};
