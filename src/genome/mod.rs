//! Genome containers: the immutable reference store and the variant
//! chromosomes layered on top of it.

mod reference;
mod variant;

pub use reference::{RefChrom, RefGenome};
pub use variant::{Mutation, MutationKind, VarChrom, VarGenome, VarSet};
