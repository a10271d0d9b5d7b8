use std::collections::HashSet;
use std::sync::Arc;

use crate::base::{Nucleotide, Sequence};
use crate::errors::GenomeError;

/// One immutable reference chromosome: a name plus a base string.
///
/// Loaded once per run and shared by reference across every variant built
/// on top of it.
#[derive(Debug, Clone)]
pub struct RefChrom {
    name: Arc<str>,
    seq: Sequence,
}

impl RefChrom {
    /// Create a reference chromosome from an owned sequence.
    pub fn new(name: impl Into<Arc<str>>, seq: Sequence) -> Self {
        Self { name: name.into(), seq }
    }

    /// Chromosome name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bases.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.seq.len()
    }

    /// The base at `pos`. Panics if out of range.
    #[inline(always)]
    pub fn base(&self, pos: usize) -> Nucleotide {
        self.seq[pos]
    }

    /// Borrow the full sequence.
    #[inline]
    pub fn seq(&self) -> &Sequence {
        &self.seq
    }
}

/// Ordered collection of reference chromosomes with a cached total size.
///
/// The reference is immutable, so `total_size` is computed once at load
/// time.
#[derive(Debug, Clone, Default)]
pub struct RefGenome {
    chroms: Vec<Arc<RefChrom>>,
    total_size: usize,
}

impl RefGenome {
    /// Assemble a genome from already-built chromosomes.
    pub fn new(chroms: Vec<RefChrom>) -> Self {
        let total_size = chroms.iter().map(|c| c.size()).sum();
        Self {
            chroms: chroms.into_iter().map(Arc::new).collect(),
            total_size,
        }
    }

    /// Ingest `(name, bases)` pairs. Names must be unique, bases uppercase
    /// T/C/A/G, and chromosomes non-empty.
    pub fn from_named_sequences<S: AsRef<str>>(
        items: &[(S, S)],
    ) -> Result<Self, GenomeError> {
        let mut seen = HashSet::new();
        let mut chroms = Vec::with_capacity(items.len());
        for (name, bases) in items {
            let name = name.as_ref();
            if !seen.insert(name.to_owned()) {
                return Err(GenomeError::DuplicateName(name.to_owned()));
            }
            if bases.as_ref().is_empty() {
                return Err(GenomeError::EmptyChrom(name.to_owned()));
            }
            let seq = Sequence::from_bytes(bases.as_ref().as_bytes()).map_err(|e| {
                GenomeError::InvalidBase { chrom: name.to_owned(), byte: e.0 }
            })?;
            chroms.push(RefChrom::new(name, seq));
        }
        Ok(Self::new(chroms))
    }

    /// Number of chromosomes.
    #[inline]
    pub fn len(&self) -> usize {
        self.chroms.len()
    }

    /// True if the genome holds no chromosomes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chroms.is_empty()
    }

    /// Shared handle to chromosome `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Arc<RefChrom>> {
        self.chroms.get(idx)
    }

    /// All chromosomes in order.
    #[inline]
    pub fn chroms(&self) -> &[Arc<RefChrom>] {
        &self.chroms
    }

    /// Sizes of all chromosomes, in order.
    pub fn chrom_sizes(&self) -> Vec<usize> {
        self.chroms.iter().map(|c| c.size()).collect()
    }

    /// Total number of bases across the genome.
    #[inline(always)]
    pub fn total_size(&self) -> usize {
        self.total_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_chrom_basics() {
        let chrom = RefChrom::new("chr1", "TCAG".parse().unwrap());
        assert_eq!(chrom.name(), "chr1");
        assert_eq!(chrom.size(), 4);
        assert_eq!(chrom.base(0), Nucleotide::T);
        assert_eq!(chrom.base(3), Nucleotide::G);
    }

    #[test]
    fn test_ref_genome_total_size() {
        let genome = RefGenome::from_named_sequences(&[
            ("chr1", "TCAG"),
            ("chr2", "AAAAAA"),
        ])
        .unwrap();
        assert_eq!(genome.len(), 2);
        assert_eq!(genome.total_size(), 10);
        assert_eq!(genome.chrom_sizes(), vec![4, 6]);
    }

    #[test]
    fn test_ref_genome_rejects_duplicate_names() {
        let err = RefGenome::from_named_sequences(&[("chr1", "TC"), ("chr1", "AG")])
            .unwrap_err();
        assert_eq!(err, GenomeError::DuplicateName("chr1".into()));
    }

    #[test]
    fn test_ref_genome_rejects_invalid_bases() {
        let err =
            RefGenome::from_named_sequences(&[("chr1", "TCNG")]).unwrap_err();
        assert_eq!(err, GenomeError::InvalidBase { chrom: "chr1".into(), byte: b'N' });
    }

    #[test]
    fn test_ref_genome_rejects_empty_chrom() {
        let err = RefGenome::from_named_sequences(&[("chr1", "")]).unwrap_err();
        assert_eq!(err, GenomeError::EmptyChrom("chr1".into()));
    }
}
