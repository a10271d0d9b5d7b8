//! Stochastic building blocks: the PCG engine, seed fan-out, and the
//! discrete samplers used by the mutation machinery.

mod alias;
mod reservoir;
pub mod rng;

pub use alias::{AliasBaseSampler, AliasSampler};
pub use reservoir::sample_rate_range;
pub use rng::{engine_from_seeds, master_seed, worker_seeds, Engine};
