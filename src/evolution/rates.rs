//! The immutable rate model shared by every sampler, and the
//! piecewise-constant site-rate multipliers.

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Tolerance for the equilibrium-frequency sum and the diagonal/row-sum
/// identity of the substitution matrix.
const NORM_EPS: f64 = 1e-6;

/// Parameter bundle for the mutation process, immutable for the life of one
/// simulation.
///
/// Holds the substitution-rate matrix `Q` (rows are *from*, ordered
/// T, C, A, G), equilibrium frequencies `pi`, the overall indel rate `xi`,
/// the insertion/deletion ratio `psi`, and relative indel-length weights.
/// Construction validates the inputs and caches the derived per-base event
/// distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateModel {
    q: [[f64; 4]; 4],
    pi: [f64; 4],
    xi: f64,
    psi: f64,
    rel_insertion_rates: Vec<f64>,
    rel_deletion_rates: Vec<f64>,
    q_tcag: [f64; 4],
    event_probs: [Vec<f64>; 4],
    event_lengths: Vec<i64>,
}

impl RateModel {
    /// Validate the inputs and derive the cached event distributions.
    pub fn new(
        q: [[f64; 4]; 4],
        pi: [f64; 4],
        xi: f64,
        psi: f64,
        rel_insertion_rates: Vec<f64>,
        rel_deletion_rates: Vec<f64>,
    ) -> Result<Self, ModelError> {
        for &p in &pi {
            if p < 0.0 || !p.is_finite() {
                return Err(ModelError::NegativeRate { name: "pi", value: p });
            }
        }
        let pi_sum: f64 = pi.iter().sum();
        if (pi_sum - 1.0).abs() > NORM_EPS {
            return Err(ModelError::FrequenciesNotNormalised(pi_sum));
        }
        if xi < 0.0 || !xi.is_finite() {
            return Err(ModelError::NegativeRate { name: "xi", value: xi });
        }
        if psi <= 0.0 || !psi.is_finite() {
            return Err(ModelError::NonPositivePsi(psi));
        }
        for (row_idx, row) in q.iter().enumerate() {
            let mut off_diag_sum = 0.0;
            for (col_idx, &rate) in row.iter().enumerate() {
                if col_idx == row_idx {
                    continue;
                }
                if rate < 0.0 || !rate.is_finite() {
                    return Err(ModelError::NegativeRate { name: "Q", value: rate });
                }
                off_diag_sum += rate;
            }
            if (row[row_idx] + off_diag_sum).abs() > NORM_EPS {
                return Err(ModelError::BadDiagonal {
                    row: row_idx,
                    diagonal: row[row_idx],
                    row_sum: off_diag_sum,
                });
            }
        }
        let rel_insertion_rates = normalise_rel_rates(rel_insertion_rates, "rel_insertion_rates")?;
        let rel_deletion_rates = normalise_rel_rates(rel_deletion_rates, "rel_deletion_rates")?;

        // Split the overall indel rate by the insertion/deletion ratio
        let xi_ins = xi / (1.0 + 1.0 / psi);
        let xi_del = xi / (1.0 + psi);

        let n_ins = rel_insertion_rates.len();
        let n_del = rel_deletion_rates.len();
        let n_events = 4 + n_ins + n_del;

        let mut q_tcag = [0.0; 4];
        let mut event_probs: [Vec<f64>; 4] = Default::default();
        for b in 0..4 {
            let mut probs = Vec::with_capacity(n_events);
            probs.extend_from_slice(&q[b]);
            // The diagonal must be zero so a base never "mutates" to itself
            probs[b] = 0.0;
            // Indel probability is spread uniformly over the four incumbent
            // bases, hence the 0.25.
            for &r in &rel_insertion_rates {
                probs.push(r * xi_ins * 0.25);
            }
            for &r in &rel_deletion_rates {
                probs.push(r * xi_del * 0.25);
            }
            let total: f64 = probs.iter().sum();
            if total <= 0.0 {
                return Err(ModelError::DegenerateWeights("event probabilities"));
            }
            for p in &mut probs {
                *p /= total;
            }
            event_probs[b] = probs;
            q_tcag[b] = -q[b][b] + xi;
        }

        let mut event_lengths = vec![0i64; 4];
        event_lengths.extend((1..=n_ins).map(|k| k as i64));
        event_lengths.extend((1..=n_del).map(|k| -(k as i64)));

        Ok(Self {
            q,
            pi,
            xi,
            psi,
            rel_insertion_rates,
            rel_deletion_rates,
            q_tcag,
            event_probs,
            event_lengths,
        })
    }

    /// Per-base total mutation intensity before gamma scaling, ordered
    /// T, C, A, G.
    #[inline]
    pub fn q_tcag(&self) -> &[f64; 4] {
        &self.q_tcag
    }

    /// Equilibrium base frequencies.
    #[inline]
    pub fn pi(&self) -> &[f64; 4] {
        &self.pi
    }

    /// The substitution-rate matrix.
    #[inline]
    pub fn q(&self) -> &[[f64; 4]; 4] {
        &self.q
    }

    /// Overall indel rate per base.
    #[inline]
    pub fn xi(&self) -> f64 {
        self.xi
    }

    /// Insertion-to-deletion rate ratio.
    #[inline]
    pub fn psi(&self) -> f64 {
        self.psi
    }

    /// Event-outcome probabilities for incumbent base index `b`.
    #[inline]
    pub fn event_probs(&self, b: usize) -> &[f64] {
        &self.event_probs[b]
    }

    /// Signed length change per event outcome, parallel to `event_probs`.
    #[inline]
    pub fn event_lengths(&self) -> &[i64] {
        &self.event_lengths
    }
}

/// Check and rescale relative indel-length weights to sum to 1. Empty
/// vectors stay empty (no indels of that class).
fn normalise_rel_rates(mut rates: Vec<f64>, name: &'static str) -> Result<Vec<f64>, ModelError> {
    if rates.is_empty() {
        return Ok(rates);
    }
    for &r in &rates {
        if r < 0.0 || !r.is_finite() {
            return Err(ModelError::NegativeRate { name, value: r });
        }
    }
    let total: f64 = rates.iter().sum();
    if total <= 0.0 {
        return Err(ModelError::DegenerateWeights(name));
    }
    for r in &mut rates {
        *r /= total;
    }
    Ok(rates)
}

/// Piecewise-constant site-rate multipliers over one chromosome, stored as
/// `(end_position_inclusive, gamma)` runs in variant coordinates.
///
/// The partition tracks indels: after every length-changing edit the region
/// ends are shifted so the runs keep covering the current chromosome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceGammas {
    ends: Vec<usize>,
    gammas: Vec<f64>,
}

impl SequenceGammas {
    /// Build from `(end_position_inclusive, gamma)` rows. Ends must be
    /// strictly ascending, gammas non-negative, and the final end must
    /// cover the chromosome.
    pub fn new(regions: &[(usize, f64)], chrom_size: usize) -> Result<Self, ModelError> {
        if regions.is_empty() {
            return Err(ModelError::BadGammaPartition { index: 0, end: 0 });
        }
        let mut ends = Vec::with_capacity(regions.len());
        let mut gammas = Vec::with_capacity(regions.len());
        for (i, &(end, gamma)) in regions.iter().enumerate() {
            if let Some(&prev) = ends.last() {
                if end <= prev {
                    return Err(ModelError::BadGammaPartition { index: i, end });
                }
            }
            if gamma < 0.0 || !gamma.is_finite() {
                return Err(ModelError::NegativeGamma(gamma));
            }
            ends.push(end);
            gammas.push(gamma);
        }
        if chrom_size > 0 && *ends.last().expect("non-empty") < chrom_size - 1 {
            return Err(ModelError::BadGammaPartition {
                index: regions.len() - 1,
                end: *ends.last().expect("non-empty"),
            });
        }
        Ok(Self { ends, gammas })
    }

    /// A single run with multiplier 1 covering the whole chromosome.
    pub fn constant(chrom_size: usize) -> Self {
        Self { ends: vec![chrom_size.saturating_sub(1)], gammas: vec![1.0] }
    }

    /// Number of runs.
    #[inline]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Always false: construction rejects empty partitions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// The multiplier at variant position `pos`. Positions past the last
    /// run end (possible transiently at chromosome tails) use the final
    /// run's multiplier.
    #[inline]
    pub fn gamma_at(&self, pos: usize) -> f64 {
        let i = self.ends.partition_point(|&e| e < pos);
        self.gammas[i.min(self.gammas.len() - 1)]
    }

    /// Track an indel at variant position `pos` that changed the
    /// chromosome length by `size_change`: region ends at or after `pos`
    /// shift with it, and runs emptied by a deletion are dropped (the last
    /// run is always kept so the partition still covers the chromosome).
    pub fn shift(&mut self, pos: usize, size_change: i64) {
        if size_change == 0 {
            return;
        }
        if size_change > 0 {
            for e in &mut self.ends {
                if *e >= pos {
                    *e += size_change as usize;
                }
            }
            return;
        }
        let k = size_change.unsigned_abs() as usize;
        let mut kept_ends = Vec::with_capacity(self.ends.len());
        let mut kept_gammas = Vec::with_capacity(self.gammas.len());
        for (i, &e) in self.ends.iter().enumerate() {
            let shifted = if e < pos {
                e as i64
            } else if e < pos + k {
                pos as i64 - 1
            } else {
                (e - k) as i64
            };
            let last = i == self.ends.len() - 1;
            let empty = shifted < 0 || kept_ends.last().is_some_and(|&p: &usize| shifted <= p as i64);
            if empty && !last {
                continue;
            }
            if empty && last && !kept_ends.is_empty() {
                continue;
            }
            kept_ends.push(shifted.max(0) as usize);
            kept_gammas.push(self.gammas[i]);
        }
        self.ends = kept_ends;
        self.gammas = kept_gammas;
    }
}
