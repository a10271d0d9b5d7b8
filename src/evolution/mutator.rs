//! One-event orchestration: draw a site, draw an outcome, fold the edit
//! into the chromosome, and report the resulting rate change.

use rand::Rng;

use super::location::LocationSampler;
use super::rates::{RateModel, SequenceGammas};
use super::types::{MutationInfo, MutationTypeSampler};
use crate::base::Nucleotide;
use crate::errors::ModelError;
use crate::genome::VarChrom;
use crate::sampling::AliasBaseSampler;

/// Samples and applies single mutation events on one variant chromosome.
///
/// Holds the chromosome's location sampler (with its gamma partition), the
/// shared per-base event tables, and the equilibrium-frequency sampler that
/// materialises insertion bases.
#[derive(Debug, Clone)]
pub struct Mutator {
    location: LocationSampler,
    types: MutationTypeSampler,
    insert: AliasBaseSampler,
    q_tcag: [f64; 4],
}

impl Mutator {
    /// Build a mutator for one chromosome from the shared rate model and
    /// that chromosome's gamma runs.
    pub fn new(model: &RateModel, gammas: SequenceGammas) -> Result<Self, ModelError> {
        Ok(Self {
            location: LocationSampler::new(model, gammas),
            types: MutationTypeSampler::new(model)?,
            insert: AliasBaseSampler::new(model.pi())?,
            q_tcag: *model.q_tcag(),
        })
    }

    /// Restrict whole-chromosome location draws to a random window.
    pub fn with_chunk_size(mut self, chunk_size: Option<usize>) -> Self {
        self.location = self.location.with_chunk_size(chunk_size);
        self
    }

    /// Total mutation rate of the chromosome.
    pub fn total_rate(&self, vc: &VarChrom) -> f64 {
        self.location.total_rate(vc)
    }

    /// Total mutation rate over `start..=end`.
    pub fn total_rate_in(&self, vc: &VarChrom, start: usize, end: usize) -> f64 {
        self.location.total_rate_in(vc, start, end)
    }

    /// This chromosome's location sampler.
    pub fn location(&self) -> &LocationSampler {
        &self.location
    }

    /// Sample and apply one event anywhere on the chromosome. Returns the
    /// change in the chromosome's total mutation rate.
    pub fn mutate<R: Rng + ?Sized>(&mut self, vc: &mut VarChrom, eng: &mut R) -> f64 {
        if vc.size() == 0 {
            return 0.0;
        }
        let pos = self.location.sample(vc, eng);
        self.apply_event(vc, eng, pos)
    }

    /// Sample and apply one event within `start..=end`, adjusting `end` by
    /// the event's length so the caller's window tracks indels. A window
    /// with `*end < start` is empty and the call is a no-op.
    pub fn mutate_in<R: Rng + ?Sized>(
        &mut self,
        vc: &mut VarChrom,
        eng: &mut R,
        start: usize,
        end: &mut i64,
    ) -> f64 {
        if *end < start as i64 || vc.size() == 0 {
            return 0.0;
        }
        let pos = self.location.sample_in(vc, eng, start, *end as usize);
        let base = vc.base_at(pos);
        let info = self.types.sample(base, eng);
        *end += info.length;
        self.apply_info(vc, eng, pos, base, info)
    }

    fn apply_event<R: Rng + ?Sized>(
        &mut self,
        vc: &mut VarChrom,
        eng: &mut R,
        pos: usize,
    ) -> f64 {
        let base = vc.base_at(pos);
        let info = self.types.sample(base, eng);
        self.apply_info(vc, eng, pos, base, info)
    }

    fn apply_info<R: Rng + ?Sized>(
        &mut self,
        vc: &mut VarChrom,
        eng: &mut R,
        pos: usize,
        base: Nucleotide,
        info: MutationInfo,
    ) -> f64 {
        match info {
            MutationInfo { length: 0, base: Some(new_base) } => {
                let gamma = self.location.gammas().gamma_at(pos);
                let delta = (self.q_tcag[new_base.to_index() as usize]
                    - self.q_tcag[base.to_index() as usize])
                    * gamma;
                vc.apply_substitution(pos, new_base);
                delta
            }
            MutationInfo { length, .. } if length > 0 => {
                let k = length as usize;
                let lo = pos.saturating_sub(1);
                let old = self.location.total_rate_in(vc, lo, pos + 1);
                let mut bases = vec![Nucleotide::T; k];
                self.insert.fill(&mut bases, eng);
                vc.apply_insertion(pos, &bases);
                self.location.shift_gammas(pos, k as i64);
                let new = self.location.total_rate_in(vc, lo, pos + k + 1);
                new - old
            }
            MutationInfo { length, .. } => {
                // Clamp so the chromosome never empties entirely
                let mut k = (length.unsigned_abs() as usize).min(vc.size() - pos);
                if k == vc.size() {
                    k = vc.size() - 1;
                }
                if k == 0 {
                    return 0.0;
                }
                let lo = pos.saturating_sub(1);
                let old = self.location.total_rate_in(vc, lo, pos + k + 1);
                vc.apply_deletion(pos, k);
                self.location.shift_gammas(pos, -(k as i64));
                let new = self.location.total_rate_in(vc, lo, pos + 1);
                new - old
            }
        }
    }
}
