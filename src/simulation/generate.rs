//! Parallel generation of random reference chromosomes under arbitrary
//! equilibrium base frequencies.

use rand_distr::Gamma;
use rayon::prelude::*;

use crate::base::Sequence;
use crate::errors::{ModelError, SimulationError};
use crate::genome::{RefChrom, RefGenome};
use crate::sampling::rng::sample_gamma_finite;
use crate::sampling::{engine_from_seeds, worker_seeds, AliasBaseSampler};

/// Generate `n_seqs` random sequences with bases drawn from `pi`.
///
/// When `len_sd > 0`, lengths are i.i.d. gamma draws with mean `len_mean`
/// and standard deviation `len_sd` (shape mean²/sd², scale sd²/mean),
/// floored to 1; otherwise every sequence has length `len_mean`. The index
/// range is statically partitioned over `workers` parallel tasks, each
/// with its own engine from the seed fan-out, so output is bit-identical
/// for fixed `(inputs, seed, workers)`.
pub fn generate_sequences(
    n_seqs: usize,
    len_mean: f64,
    len_sd: f64,
    pi: [f64; 4],
    workers: usize,
    seed: u64,
) -> Result<Vec<Sequence>, SimulationError> {
    if !len_mean.is_finite() || len_mean < 1.0 {
        return Err(ModelError::BadLength { name: "len_mean", value: len_mean }.into());
    }
    if !len_sd.is_finite() || len_sd < 0.0 {
        return Err(ModelError::BadLength { name: "len_sd", value: len_sd }.into());
    }
    let sampler = AliasBaseSampler::new(&pi)?;
    let workers = workers.max(1).min(n_seqs.max(1));
    let seeds = worker_seeds(seed, workers);

    let length_dist = if len_sd > 0.0 {
        let shape = (len_mean * len_mean) / (len_sd * len_sd);
        let scale = (len_sd * len_sd) / len_mean;
        Some(
            Gamma::new(shape, scale)
                .map_err(|_| ModelError::BadLength { name: "len_sd", value: len_sd })?,
        )
    } else {
        None
    };

    // Static partition of the sequence index range
    let per_worker = n_seqs.div_ceil(workers);
    let chunks: Result<Vec<Vec<Sequence>>, SimulationError> = (0..workers)
        .into_par_iter()
        .map(|w| {
            let mut eng = engine_from_seeds(seeds[w]);
            let lo = w * per_worker;
            let hi = ((w + 1) * per_worker).min(n_seqs);
            let mut out = Vec::with_capacity(hi.saturating_sub(lo));
            for _ in lo..hi {
                let len = match &length_dist {
                    Some(dist) => (sample_gamma_finite(dist, &mut eng)? as usize).max(1),
                    None => len_mean as usize,
                };
                let mut seq = Sequence::with_capacity(len);
                for _ in 0..len {
                    seq.push(sampler.sample_one(&mut eng));
                }
                out.push(seq);
            }
            Ok(out)
        })
        .collect();

    Ok(chunks?.into_iter().flatten().collect())
}

/// Generate a reference genome of random chromosomes named
/// `seq0, seq1, …`.
pub fn generate_genome(
    n_seqs: usize,
    len_mean: f64,
    len_sd: f64,
    pi: [f64; 4],
    workers: usize,
    seed: u64,
) -> Result<RefGenome, SimulationError> {
    let seqs = generate_sequences(n_seqs, len_mean, len_sd, pi, workers, seed)?;
    let chroms = seqs
        .into_iter()
        .enumerate()
        .map(|(i, seq)| RefChrom::new(format!("seq{i}"), seq))
        .collect();
    Ok(RefGenome::new(chroms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_length_generation() {
        let seqs = generate_sequences(20, 100.0, 0.0, [0.25; 4], 2, 42).unwrap();
        assert_eq!(seqs.len(), 20);
        for seq in &seqs {
            assert_eq!(seq.len(), 100);
        }
    }

    #[test]
    fn test_variable_length_generation() {
        let seqs = generate_sequences(50, 200.0, 50.0, [0.25; 4], 2, 42).unwrap();
        assert_eq!(seqs.len(), 50);
        for seq in &seqs {
            assert!(!seq.is_empty());
        }
        // Lengths should actually vary
        let first = seqs[0].len();
        assert!(seqs.iter().any(|s| s.len() != first));
    }

    #[test]
    fn test_base_frequencies_match_pi() {
        let pi = [0.1, 0.2, 0.3, 0.4];
        let seqs = generate_sequences(1000, 100.0, 0.0, pi, 4, 42).unwrap();
        let mut counts = [0usize; 4];
        let mut total = 0usize;
        for seq in &seqs {
            for &b in seq.as_slice() {
                counts[b.to_index() as usize] += 1;
                total += 1;
            }
        }
        for (i, &p) in pi.iter().enumerate() {
            let observed = counts[i] as f64 / total as f64;
            // 3 sigma for a binomial proportion at n = 100k
            let sigma = (p * (1.0 - p) / total as f64).sqrt();
            assert!(
                (observed - p).abs() < 3.0 * sigma + 1e-3,
                "base {i}: observed {observed}, expected {p}"
            );
        }
    }

    #[test]
    fn test_generation_deterministic() {
        let a = generate_sequences(30, 80.0, 20.0, [0.25; 4], 3, 7).unwrap();
        let b = generate_sequences(30, 80.0, 20.0, [0.25; 4], 3, 7).unwrap();
        assert_eq!(a, b);

        let c = generate_sequences(30, 80.0, 20.0, [0.25; 4], 3, 8).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_generate_genome_names_and_size() {
        let genome = generate_genome(5, 50.0, 0.0, [0.25; 4], 1, 42).unwrap();
        assert_eq!(genome.len(), 5);
        assert_eq!(genome.get(0).unwrap().name(), "seq0");
        assert_eq!(genome.get(4).unwrap().name(), "seq4");
        assert_eq!(genome.total_size(), 250);
    }

    #[test]
    fn test_generation_rejects_bad_params() {
        assert!(generate_sequences(5, 0.0, 0.0, [0.25; 4], 1, 42).is_err());
        assert!(generate_sequences(5, 100.0, -1.0, [0.25; 4], 1, 42).is_err());
        assert!(generate_sequences(5, 100.0, 0.0, [0.5, 0.5, 0.0, -1.0], 1, 42).is_err());
    }
}
