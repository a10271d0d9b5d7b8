//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use varevo::prelude::*;
//! use std::str::FromStr;
//!
//! let seq = Sequence::from_str("TCAG").unwrap();
//! assert_eq!(seq.len(), 4);
//! ```

pub use crate::base::{Nucleotide, Sequence};
pub use crate::errors;
pub use crate::evolution::{LocationSampler, MutationTypeSampler, Mutator, RateModel, SequenceGammas};
pub use crate::genome::{RefChrom, RefGenome, VarChrom, VarGenome, VarSet};
pub use crate::sampling::{AliasBaseSampler, AliasSampler, Engine};
pub use crate::simulation::{CancelToken, SimulationConfig};
