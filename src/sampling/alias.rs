//! Walker alias tables for O(1) categorical sampling.

use rand::Rng;

use super::rng::runif_01;
use crate::base::Nucleotide;
use crate::errors::ModelError;

/// O(1) categorical sampler over a fixed weight vector (alias method,
/// Vose's construction).
///
/// Weights are normalised internally; the table is immutable after
/// construction.
#[derive(Debug, Clone)]
pub struct AliasSampler {
    prob: Vec<f64>,
    alias: Vec<usize>,
}

impl AliasSampler {
    /// Build the alias table from non-negative weights.
    ///
    /// Errors when the vector is empty, contains a negative weight, or sums
    /// to zero.
    pub fn new(weights: &[f64]) -> Result<Self, ModelError> {
        if weights.is_empty() {
            return Err(ModelError::DegenerateWeights("alias sampler"));
        }
        for &w in weights {
            if w < 0.0 || !w.is_finite() {
                return Err(ModelError::NegativeRate { name: "alias weight", value: w });
            }
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(ModelError::DegenerateWeights("alias sampler"));
        }

        let n = weights.len();
        let mut scaled: Vec<f64> = weights.iter().map(|&w| w * n as f64 / total).collect();
        let mut prob = vec![0.0; n];
        let mut alias = vec![0usize; n];

        let mut small: Vec<usize> = Vec::with_capacity(n);
        let mut large: Vec<usize> = Vec::with_capacity(n);
        for (i, &s) in scaled.iter().enumerate() {
            if s < 1.0 {
                small.push(i);
            } else {
                large.push(i);
            }
        }

        while let (Some(&l), Some(&g)) = (small.last(), large.last()) {
            small.pop();
            large.pop();
            prob[l] = scaled[l];
            alias[l] = g;
            scaled[g] = (scaled[g] + scaled[l]) - 1.0;
            if scaled[g] < 1.0 {
                small.push(g);
            } else {
                large.push(g);
            }
        }
        // Leftovers are 1.0 up to rounding
        for i in large.into_iter().chain(small) {
            prob[i] = 1.0;
        }

        Ok(Self { prob, alias })
    }

    /// Number of categories.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.prob.len()
    }

    /// Always false: construction rejects empty weight vectors.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    /// Draw one category index in O(1).
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, eng: &mut R) -> usize {
        let i = eng.random_range(0..self.prob.len());
        if runif_01(eng) < self.prob[i] {
            i
        } else {
            self.alias[i]
        }
    }
}

/// Alias sampler over the four-base alphabet, used to materialise insertion
/// sequences and random reference chromosomes from equilibrium frequencies.
#[derive(Debug, Clone)]
pub struct AliasBaseSampler {
    inner: AliasSampler,
}

impl AliasBaseSampler {
    /// Build from base weights ordered T, C, A, G.
    pub fn new(pi: &[f64; 4]) -> Result<Self, ModelError> {
        Ok(Self { inner: AliasSampler::new(pi)? })
    }

    /// Draw one base.
    #[inline]
    pub fn sample_one<R: Rng + ?Sized>(&self, eng: &mut R) -> Nucleotide {
        Nucleotide::ALL[self.inner.sample(eng)]
    }

    /// Fill `buf` with independently drawn bases.
    pub fn fill<R: Rng + ?Sized>(&self, buf: &mut [Nucleotide], eng: &mut R) {
        for slot in buf {
            *slot = self.sample_one(eng);
        }
    }
}
