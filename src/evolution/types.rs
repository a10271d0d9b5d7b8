//! Sampling the outcome of a mutation event, conditional on the incumbent
//! base.

use rand::Rng;

use super::rates::RateModel;
use crate::base::Nucleotide;
use crate::errors::ModelError;
use crate::sampling::AliasSampler;

/// The sampled outcome of one event: a zero-length substitution to `base`,
/// or an indel whose signed `length` says how many bases appear (+) or
/// vanish (-).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationInfo {
    pub length: i64,
    pub base: Option<Nucleotide>,
}

/// One alias table per incumbent base over the combined
/// substitution/insertion/deletion outcome vector.
#[derive(Debug, Clone)]
pub struct MutationTypeSampler {
    samplers: [AliasSampler; 4],
    event_lengths: Vec<i64>,
}

impl MutationTypeSampler {
    /// Build the per-base alias tables from the rate model's cached event
    /// probabilities.
    pub fn new(model: &RateModel) -> Result<Self, ModelError> {
        let samplers = [
            AliasSampler::new(model.event_probs(0))?,
            AliasSampler::new(model.event_probs(1))?,
            AliasSampler::new(model.event_probs(2))?,
            AliasSampler::new(model.event_probs(3))?,
        ];
        Ok(Self { samplers, event_lengths: model.event_lengths().to_vec() })
    }

    /// Sample an event outcome for a site currently holding `base`.
    pub fn sample<R: Rng + ?Sized>(&self, base: Nucleotide, eng: &mut R) -> MutationInfo {
        let k = self.samplers[base.to_index() as usize].sample(eng);
        if k < 4 {
            MutationInfo { length: 0, base: Some(Nucleotide::ALL[k]) }
        } else {
            MutationInfo { length: self.event_lengths[k], base: None }
        }
    }
}
