//! The mutation model: rates, site heterogeneity, and the samplers that
//! turn them into concrete events.

mod location;
mod mutator;
mod rates;
mod types;

pub use location::LocationSampler;
pub use mutator::Mutator;
pub use rates::{RateModel, SequenceGammas};
pub use types::{MutationInfo, MutationTypeSampler};
