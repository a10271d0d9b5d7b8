//! The chromosome-level evolution loop and its cancellation plumbing.
//!
//! Events are laid down in continuous time: each step draws an exponential
//! waiting time from the chromosome's current total mutation rate and
//! applies one sampled event, until the requested branch length is used
//! up. Variants evolve independently, fork-join, each from its own seeded
//! engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use rayon::prelude::*;

use crate::errors::SimulationError;
use crate::evolution::{Mutator, RateModel, SequenceGammas};
use crate::genome::{VarChrom, VarSet};
use crate::sampling::rng::runif_01;
use crate::sampling::{engine_from_seeds, master_seed, worker_seeds};
use crate::simulation::SimulationConfig;

/// Monotone cancellation flag shared by all workers.
///
/// Once set it stays set; workers finish their current event and return at
/// the next poll point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Evolve one chromosome for `time` units of branch length.
///
/// Returns the number of events applied, or `Cancelled` if the token was
/// observed set at a poll point (at least every `cancel_poll_interval`
/// events).
pub fn evolve_chrom<R: Rng + ?Sized>(
    vc: &mut VarChrom,
    mutator: &mut Mutator,
    time: f64,
    eng: &mut R,
    cancel_poll_interval: u64,
    cancel: &CancelToken,
) -> Result<u64, SimulationError> {
    let poll = cancel_poll_interval.max(1);
    let mut elapsed = 0.0;
    let mut events = 0u64;
    loop {
        let rate = mutator.total_rate(vc);
        if rate <= 0.0 {
            break;
        }
        elapsed += -runif_01(eng).ln() / rate;
        if elapsed > time {
            break;
        }
        mutator.mutate(vc, eng);
        events += 1;
        if events % poll == 0 && cancel.is_cancelled() {
            return Err(SimulationError::Cancelled);
        }
    }
    Ok(events)
}

/// Evolve every variant in `vars` for `time` units of branch length.
///
/// Variants are processed fork-join; each gets its own engine from the
/// deterministic seed fan-out, so results are reproducible for a fixed
/// `(inputs, seed, workers)`. `gammas` supplies one partition per
/// reference chromosome; `None` means rate homogeneity. On cancellation
/// the partial results in `vars` should be discarded by the caller.
pub fn evolve_variants(
    vars: &mut VarSet,
    model: &RateModel,
    gammas: Option<&[SequenceGammas]>,
    time: f64,
    config: &SimulationConfig,
    cancel: &CancelToken,
) -> Result<u64, SimulationError> {
    let seeds = worker_seeds(master_seed(config.seed), vars.len());
    let event_counts: Result<Vec<u64>, SimulationError> = vars
        .variants_mut()
        .par_iter_mut()
        .enumerate()
        .map(|(v, genome)| {
            let mut eng = engine_from_seeds(seeds[v]);
            let mut total = 0u64;
            for (c, vc) in genome.chroms_mut().iter_mut().enumerate() {
                if cancel.is_cancelled() {
                    return Err(SimulationError::Cancelled);
                }
                let chrom_gammas = match gammas {
                    Some(all) => all[c].clone(),
                    None => SequenceGammas::constant(vc.size()),
                };
                let mut mutator =
                    Mutator::new(model, chrom_gammas)?.with_chunk_size(config.chunk_size);
                total += evolve_chrom(
                    vc,
                    &mut mutator,
                    time,
                    &mut eng,
                    config.cancel_poll_interval,
                    cancel,
                )?;
            }
            Ok(total)
        })
        .collect();
    Ok(event_counts?.into_iter().sum())
}
