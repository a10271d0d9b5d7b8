//! Driver-facing surface: configuration, random-genome generation, and the
//! per-chromosome evolution loop.

mod config;
mod engine;
mod generate;

pub use config::SimulationConfig;
pub use engine::{evolve_chrom, evolve_variants, CancelToken};
pub use generate::{generate_genome, generate_sequences};
