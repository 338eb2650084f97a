//! Differential Evolution (DE).
//!
//! Each generation builds one trial vector per candidate from three other
//! candidates (`a + F·(b − d)` with binomial crossover), clamps it to the
//! unit box and keeps it if it beats the candidate in that slot. Slots can
//! be processed sequentially or as one task per slot on a [`WorkerPool`].
//!
//! [`WorkerPool`]: crate::WorkerPool
//!
//! # References
//!
//! - Storn & Price (1997), "Differential Evolution – A Simple and Efficient
//!   Heuristic for Global Optimization over Continuous Spaces"

mod config;
mod runner;

pub use config::DeConfig;
pub use runner::DifferentialEvolution;
