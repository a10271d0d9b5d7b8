//! Rate-proportional sampling of event sites on a variant chromosome.

use rand::Rng;

use super::rates::{RateModel, SequenceGammas};
use crate::genome::VarChrom;
use crate::sampling::rng::runif_01;
use crate::sampling::sample_rate_range;

/// Draws sites with probability proportional to their current mutation
/// rate, `q[base_at(p)] * gamma(p)`.
///
/// One sampler is attached to one evolving chromosome: it owns that
/// chromosome's gamma partition, which has to track indels.
#[derive(Debug, Clone)]
pub struct LocationSampler {
    q_tcag: [f64; 4],
    gammas: SequenceGammas,
    chunk_size: Option<usize>,
}

impl LocationSampler {
    /// Build from the shared rate model and this chromosome's gamma runs.
    pub fn new(model: &RateModel, gammas: SequenceGammas) -> Self {
        Self { q_tcag: *model.q_tcag(), gammas, chunk_size: None }
    }

    /// Restrict each whole-chromosome draw to a random window of
    /// `chunk_size` sites. `None` scans the full chromosome.
    pub fn with_chunk_size(mut self, chunk_size: Option<usize>) -> Self {
        self.chunk_size = chunk_size.filter(|&c| c > 0);
        self
    }

    /// The per-site rate at variant position `pos`.
    #[inline]
    pub fn rate_at(&self, vc: &VarChrom, pos: usize) -> f64 {
        self.q_tcag[vc.base_at(pos).to_index() as usize] * self.gammas.gamma_at(pos)
    }

    /// Sample a site over the whole chromosome (or a random chunk window
    /// when one is configured).
    pub fn sample<R: Rng + ?Sized>(&self, vc: &VarChrom, eng: &mut R) -> usize {
        let size = vc.size();
        if size <= 1 {
            return 0;
        }
        let (start, end) = match self.chunk_size {
            Some(chunk) if chunk < size => {
                let start = (runif_01(eng) * (size - chunk + 1) as f64) as usize;
                (start, start + chunk - 1)
            }
            _ => (0, size - 1),
        };
        self.sample_in(vc, eng, start, end)
    }

    /// Sample a site within `start..=end` (variant coordinates).
    pub fn sample_in<R: Rng + ?Sized>(
        &self,
        vc: &VarChrom,
        eng: &mut R,
        start: usize,
        end: usize,
    ) -> usize {
        sample_rate_range(start, end, |p| self.rate_at(vc, p), eng)
    }

    /// Sum of per-site rates over the whole chromosome.
    pub fn total_rate(&self, vc: &VarChrom) -> f64 {
        if vc.size() == 0 {
            return 0.0;
        }
        self.total_rate_in(vc, 0, vc.size() - 1)
    }

    /// Sum of per-site rates over `start..=end`.
    pub fn total_rate_in(&self, vc: &VarChrom, start: usize, end: usize) -> f64 {
        (start..=end.min(vc.size().saturating_sub(1)))
            .map(|p| self.rate_at(vc, p))
            .sum()
    }

    /// This chromosome's gamma partition.
    #[inline]
    pub fn gammas(&self) -> &SequenceGammas {
        &self.gammas
    }

    /// Track a length change at `pos` in the gamma partition.
    #[inline]
    pub fn shift_gammas(&mut self, pos: usize, size_change: i64) {
        self.gammas.shift(pos, size_change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{RefChrom, VarChrom};
    use crate::sampling::engine_from_seeds;
    use std::sync::Arc;

    fn jc69(mu: f64) -> [[f64; 4]; 4] {
        let r = mu / 3.0;
        let mut q = [[r; 4]; 4];
        for (i, row) in q.iter_mut().enumerate() {
            row[i] = -mu;
        }
        q
    }

    fn model(xi: f64) -> RateModel {
        RateModel::new(jc69(0.3), [0.25; 4], xi, 1.0, vec![1.0], vec![1.0]).unwrap()
    }

    fn var_chrom(bases: &str) -> VarChrom {
        VarChrom::new(Arc::new(RefChrom::new("chr", bases.parse().unwrap())))
    }

    #[test]
    fn test_total_rate_uniform_model() {
        let vc = var_chrom("TCAGTCAGTC");
        let m = model(0.1);
        let sampler = LocationSampler::new(&m, SequenceGammas::constant(vc.size()));
        // Every base has rate 0.3 + 0.1 = 0.4 under JC69
        assert!((sampler.total_rate(&vc) - 4.0).abs() < 1e-9);
        assert!((sampler.total_rate_in(&vc, 2, 6) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_rate_respects_gammas() {
        let vc = var_chrom("TCAGTCAGTC");
        let m = model(0.1);
        let gammas = SequenceGammas::new(&[(4, 0.0), (9, 2.0)], 10).unwrap();
        let sampler = LocationSampler::new(&m, gammas);
        // First five sites silenced, last five doubled
        assert!((sampler.total_rate(&vc) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_stays_in_range() {
        let vc = var_chrom("TCAGTCAGTCAGTCAG");
        let m = model(0.1);
        let sampler = LocationSampler::new(&m, SequenceGammas::constant(vc.size()));
        let mut eng = engine_from_seeds([11, 3]);
        for _ in 0..500 {
            assert!(sampler.sample(&vc, &mut eng) < vc.size());
            let p = sampler.sample_in(&vc, &mut eng, 4, 9);
            assert!((4..=9).contains(&p));
        }
    }

    #[test]
    fn test_sample_avoids_zero_gamma_region() {
        let vc = var_chrom("TCAGTCAGTC");
        let m = model(0.1);
        let gammas = SequenceGammas::new(&[(4, 0.0), (9, 1.0)], 10).unwrap();
        let sampler = LocationSampler::new(&m, gammas);
        let mut eng = engine_from_seeds([17, 5]);
        for _ in 0..1000 {
            let p = sampler.sample(&vc, &mut eng);
            assert!(p >= 5, "sampled silenced site {p}");
        }
    }

    #[test]
    fn test_sample_tracks_base_rates() {
        // With no indel rate, a GC-poor matrix row makes T sites much hotter
        // than the rest; sampling should strongly favour them.
        let mut q = [[0.0; 4]; 4];
        // T row: total 1.0, others: total 0.01
        q[0] = [-1.0, 0.4, 0.3, 0.3];
        for b in 1..4 {
            for j in 0..4 {
                q[b][j] = if j == b { -0.01 } else { 0.01 / 3.0 };
            }
        }
        let m = RateModel::new(q, [0.25; 4], 0.0, 1.0, vec![], vec![]).unwrap();
        let vc = var_chrom("TCAGCAGCAG");
        let sampler = LocationSampler::new(&m, SequenceGammas::constant(vc.size()));
        let mut eng = engine_from_seeds([23, 29]);
        let n = 5000;
        let hits_t = (0..n)
            .filter(|_| sampler.sample(&vc, &mut eng) == 0)
            .count();
        // Site 0 carries rate 1.0 of a 1.09 total
        assert!(hits_t as f64 / n as f64 > 0.85, "hits = {hits_t}");
    }

    #[test]
    fn test_chunked_sampling_in_bounds() {
        let vc = var_chrom(&"TCAG".repeat(25));
        let m = model(0.1);
        let sampler = LocationSampler::new(&m, SequenceGammas::constant(vc.size()))
            .with_chunk_size(Some(10));
        let mut eng = engine_from_seeds([31, 7]);
        for _ in 0..500 {
            assert!(sampler.sample(&vc, &mut eng) < vc.size());
        }
    }
}
