use std::fmt;
use std::sync::Arc;

use super::RefChrom;
use crate::base::{Nucleotide, Sequence};
use crate::genome::RefGenome;

/// The three event classes a log record can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Substitution,
    Insertion,
    Deletion,
}

/// One edit in a variant chromosome's log.
///
/// `old_pos` anchors the record in reference coordinates, `new_pos` in
/// variant coordinates. `bases` owns the nucleotides the record introduces:
/// one for a substitution, k for an insertion of length k, none for a
/// deletion. An insertion's bases occupy `new_pos..new_pos + k`, and the
/// reference base at `old_pos` is the one pushed right behind them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    size_modifier: i64,
    old_pos: usize,
    new_pos: usize,
    bases: Vec<Nucleotide>,
}

impl Mutation {
    fn substitution(old_pos: usize, new_pos: usize, base: Nucleotide) -> Self {
        Self { size_modifier: 0, old_pos, new_pos, bases: vec![base] }
    }

    fn insertion(old_pos: usize, new_pos: usize, bases: Vec<Nucleotide>) -> Self {
        Self { size_modifier: bases.len() as i64, old_pos, new_pos, bases }
    }

    fn deletion(old_pos: usize, new_pos: usize, len: usize) -> Self {
        Self { size_modifier: -(len as i64), old_pos, new_pos, bases: Vec::new() }
    }

    /// Net change to the chromosome length caused by this record.
    #[inline(always)]
    pub fn size_modifier(&self) -> i64 {
        self.size_modifier
    }

    /// Anchor position in reference coordinates.
    #[inline(always)]
    pub fn old_pos(&self) -> usize {
        self.old_pos
    }

    /// Anchor position in variant coordinates.
    #[inline(always)]
    pub fn new_pos(&self) -> usize {
        self.new_pos
    }

    /// The bases this record introduces (empty for deletions).
    #[inline]
    pub fn bases(&self) -> &[Nucleotide] {
        &self.bases
    }

    /// Classify the record by its size modifier.
    #[inline(always)]
    pub fn kind(&self) -> MutationKind {
        if self.size_modifier == 0 {
            MutationKind::Substitution
        } else if self.size_modifier > 0 {
            MutationKind::Insertion
        } else {
            MutationKind::Deletion
        }
    }

    /// Number of variant positions the record occupies.
    #[inline]
    fn len_in_variant(&self) -> usize {
        match self.kind() {
            MutationKind::Substitution => 1,
            MutationKind::Insertion => self.bases.len(),
            MutationKind::Deletion => 0,
        }
    }

    /// Number of reference positions the record consumes.
    #[inline]
    fn len_in_reference(&self) -> usize {
        match self.kind() {
            MutationKind::Substitution => 1,
            MutationKind::Insertion => 0,
            MutationKind::Deletion => self.size_modifier.unsigned_abs() as usize,
        }
    }
}

/// One variant chromosome: a shared reference chromosome plus an ordered
/// edit log.
///
/// The log is kept sorted by `new_pos`; lookups binary-search it, and the
/// three `apply_*` operations fold new events in while keeping every later
/// record's `new_pos` current.
#[derive(Debug, Clone)]
pub struct VarChrom {
    ref_chrom: Arc<RefChrom>,
    log: Vec<Mutation>,
    chrom_size: usize,
    name: String,
}

impl VarChrom {
    /// Start an unmutated variant of `ref_chrom`.
    pub fn new(ref_chrom: Arc<RefChrom>) -> Self {
        let chrom_size = ref_chrom.size();
        let name = ref_chrom.name().to_owned();
        Self { ref_chrom, log: Vec::new(), chrom_size, name }
    }

    /// Current length in variant coordinates.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.chrom_size
    }

    /// Display name (inherited from the reference chromosome).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying reference chromosome.
    #[inline]
    pub fn ref_chrom(&self) -> &RefChrom {
        &self.ref_chrom
    }

    /// The current edit log, ordered by `new_pos`.
    #[inline]
    pub fn log(&self) -> &[Mutation] {
        &self.log
    }

    /// Index of the last record with `new_pos <= pos`, if any.
    #[inline]
    fn mut_index(&self, pos: usize) -> Option<usize> {
        let i = self.log.partition_point(|m| m.new_pos <= pos);
        i.checked_sub(1)
    }

    /// Decode the base at variant position `pos` through record `i`.
    fn base_from(&self, i: usize, pos: usize) -> Nucleotide {
        let m = &self.log[i];
        let off = pos - m.new_pos;
        match m.kind() {
            MutationKind::Substitution => {
                if off == 0 {
                    m.bases[0]
                } else {
                    self.ref_chrom.base(m.old_pos + off)
                }
            }
            MutationKind::Insertion => {
                if off < m.bases.len() {
                    m.bases[off]
                } else {
                    self.ref_chrom.base(m.old_pos + off - m.bases.len())
                }
            }
            MutationKind::Deletion => self
                .ref_chrom
                .base(m.old_pos + m.size_modifier.unsigned_abs() as usize + off),
        }
    }

    /// The base at variant position `pos`.
    pub fn base_at(&self, pos: usize) -> Nucleotide {
        debug_assert!(pos < self.chrom_size);
        match self.mut_index(pos) {
            None => self.ref_chrom.base(pos),
            Some(i) => self.base_from(i, pos),
        }
    }

    /// Map variant position `pos` to the reference position it reads from,
    /// skipping insertion bytes. `pos == size()` maps to the position one
    /// past the last referenced base.
    pub fn ref_pos(&self, pos: usize) -> usize {
        match self.mut_index(pos) {
            None => pos,
            Some(i) => {
                let m = &self.log[i];
                let off = pos - m.new_pos;
                match m.kind() {
                    MutationKind::Substitution => m.old_pos + off,
                    MutationKind::Insertion => {
                        if off < m.bases.len() {
                            m.old_pos
                        } else {
                            m.old_pos + off - m.bases.len()
                        }
                    }
                    MutationKind::Deletion => {
                        m.old_pos + m.size_modifier.unsigned_abs() as usize + off
                    }
                }
            }
        }
    }

    /// Materialise the entire variant chromosome.
    pub fn to_sequence(&self) -> Sequence {
        let mut out = Sequence::with_capacity(self.chrom_size);
        let rseq = self.ref_chrom.seq().as_slice();
        let mut ref_i = 0usize;
        for m in &self.log {
            out.extend_from_slice(&rseq[ref_i..m.old_pos]);
            match m.kind() {
                MutationKind::Substitution => {
                    out.push(m.bases[0]);
                    ref_i = m.old_pos + 1;
                }
                MutationKind::Insertion => {
                    out.extend_from_slice(&m.bases);
                    ref_i = m.old_pos;
                }
                MutationKind::Deletion => {
                    ref_i = m.old_pos + m.size_modifier.unsigned_abs() as usize;
                }
            }
        }
        out.extend_from_slice(&rseq[ref_i..]);
        out
    }

    /// Fill `out` with `len` bases starting at variant position `start`,
    /// clamped to the chromosome end. One log walk, amortised
    /// O(len + log n).
    pub fn fill_chunk(&self, out: &mut Sequence, start: usize, len: usize) {
        out.clear();
        let end = (start + len).min(self.chrom_size);
        if start >= end {
            return;
        }
        // Records [0, idx) anchor at or before the cursor.
        let mut idx = self.log.partition_point(|m| m.new_pos <= start);
        for pos in start..end {
            while idx < self.log.len() && self.log[idx].new_pos <= pos {
                idx += 1;
            }
            let base = match idx.checked_sub(1) {
                None => self.ref_chrom.base(pos),
                Some(i) => self.base_from(i, pos),
            };
            out.push(base);
        }
    }

    /// Shift `new_pos` of every record from `from` onward by `delta`.
    fn shift_new_pos(&mut self, from: usize, delta: i64) {
        for m in &mut self.log[from..] {
            m.new_pos = (m.new_pos as i64 + delta) as usize;
        }
    }

    /// Substitute `base` at variant position `pos`.
    ///
    /// Hitting an insertion span or an existing substitution mutates the
    /// record in place; a substitution that restores the reference base
    /// collapses the record instead of recording a self-substitution.
    pub fn apply_substitution(&mut self, pos: usize, base: Nucleotide) {
        debug_assert!(pos < self.chrom_size);
        if let Some(i) = self.mut_index(pos) {
            let off = pos - self.log[i].new_pos;
            match self.log[i].kind() {
                MutationKind::Substitution if off == 0 => {
                    if base == self.ref_chrom.base(self.log[i].old_pos) {
                        self.log.remove(i);
                    } else {
                        self.log[i].bases[0] = base;
                    }
                    self.debug_validate();
                    return;
                }
                MutationKind::Insertion if off < self.log[i].bases.len() => {
                    self.log[i].bases[off] = base;
                    self.debug_validate();
                    return;
                }
                _ => {}
            }
        }
        // Plain reference territory
        let old_pos = self.ref_pos(pos);
        if base == self.ref_chrom.base(old_pos) {
            return;
        }
        let idx = self.log.partition_point(|m| m.new_pos <= pos);
        self.log.insert(idx, Mutation::substitution(old_pos, pos, base));
        self.debug_validate();
    }

    /// Insert `bases` so that they occupy `pos..pos + bases.len()`.
    pub fn apply_insertion(&mut self, pos: usize, bases: &[Nucleotide]) {
        debug_assert!(pos <= self.chrom_size);
        if bases.is_empty() {
            return;
        }
        let k = bases.len();
        let idx = self.log.partition_point(|m| m.new_pos < pos);

        // Landing inside (or right at the end of) an earlier insertion's
        // span splices into that record.
        if idx > 0 {
            let m = &mut self.log[idx - 1];
            if m.kind() == MutationKind::Insertion {
                let off = pos - m.new_pos;
                if off <= m.bases.len() {
                    m.bases.splice(off..off, bases.iter().copied());
                    m.size_modifier += k as i64;
                    self.shift_new_pos(idx, k as i64);
                    self.chrom_size += k;
                    self.debug_validate();
                    return;
                }
            }
        }

        if idx < self.log.len() && self.log[idx].new_pos == pos {
            match self.log[idx].kind() {
                MutationKind::Insertion => {
                    // Prepend into the record already anchored here.
                    let m = &mut self.log[idx];
                    m.bases.splice(0..0, bases.iter().copied());
                    m.size_modifier += k as i64;
                    self.shift_new_pos(idx + 1, k as i64);
                }
                MutationKind::Substitution | MutationKind::Deletion => {
                    // The new bases sort first, sharing the anchor's
                    // reference position; the displaced record shifts right.
                    let old_pos = self.log[idx].old_pos;
                    self.log.insert(idx, Mutation::insertion(old_pos, pos, bases.to_vec()));
                    self.shift_new_pos(idx + 1, k as i64);
                }
            }
        } else {
            let old_pos = self.ref_pos(pos);
            self.log.insert(idx, Mutation::insertion(old_pos, pos, bases.to_vec()));
            self.shift_new_pos(idx + 1, k as i64);
        }
        self.chrom_size += k;
        self.debug_validate();
    }

    /// Delete `len` variant positions starting at `pos`, reconciling the
    /// deletion against every overlapping record.
    ///
    /// Substitutions inside the range vanish, insertion bytes are absorbed
    /// (whole records removed, partial overlaps truncated), and deletions
    /// contiguous in reference coordinates merge into the one residual
    /// record that is finally written.
    pub fn apply_deletion(&mut self, pos: usize, len: usize) {
        debug_assert!(pos < self.chrom_size);
        let len = len.min(self.chrom_size - pos);
        if len == 0 {
            return;
        }
        let del_end = pos + len;
        let anchor = self.ref_pos(pos);
        let idx = self.log.partition_point(|m| m.new_pos < pos);

        let mut removed_ins_bytes = 0usize;

        // An earlier insertion spanning `pos` loses a tail (or middle) slice.
        let mut left: Option<usize> = None;
        if idx > 0 {
            let m = &mut self.log[idx - 1];
            if m.kind() == MutationKind::Insertion && m.new_pos + m.bases.len() > pos {
                let off = pos - m.new_pos;
                let take = (m.bases.len() - off).min(len);
                m.bases.drain(off..off + take);
                m.size_modifier -= take as i64;
                removed_ins_bytes += take;
                left = Some(idx - 1);
            }
        }

        // Walk records anchored in [pos, del_end].
        let mut merged_footprint = 0usize;
        let mut min_merged_old: Option<usize> = None;
        let mut survivor: Option<Mutation> = None;
        let mut i = idx;
        while i < self.log.len() {
            let (kind, new_pos, n_bases, sm_abs, old_pos) = {
                let m = &self.log[i];
                (
                    m.kind(),
                    m.new_pos,
                    m.bases.len(),
                    m.size_modifier.unsigned_abs() as usize,
                    m.old_pos,
                )
            };
            match kind {
                MutationKind::Deletion => {
                    // A deletion at or inside the range is contiguous in
                    // reference coordinates and merges.
                    if new_pos > del_end {
                        break;
                    }
                    merged_footprint += sm_abs;
                    min_merged_old =
                        Some(min_merged_old.map_or(old_pos, |v| v.min(old_pos)));
                    i += 1;
                    if new_pos == del_end {
                        break;
                    }
                }
                MutationKind::Substitution => {
                    if new_pos >= del_end {
                        break;
                    }
                    // Removed; its reference base stays in the footprint.
                    i += 1;
                }
                MutationKind::Insertion => {
                    if new_pos >= del_end {
                        break;
                    }
                    let take = n_bases.min(del_end - new_pos);
                    removed_ins_bytes += take;
                    i += 1;
                    if take < n_bases {
                        // Prefix-truncated suffix survives past the range.
                        let mut s = self.log[i - 1].clone();
                        s.bases.drain(0..take);
                        s.size_modifier -= take as i64;
                        survivor = Some(s);
                        break;
                    }
                }
            }
        }

        let ref_deleted = len - removed_ins_bytes;
        let footprint = ref_deleted + merged_footprint;
        let residual_old = min_merged_old.map_or(anchor, |v| v.min(anchor));

        let survivor_len = survivor.as_ref().map_or(0, |s| s.bases.len());
        let mut replacement: Vec<Mutation> = Vec::with_capacity(2);
        if let Some(mut s) = survivor {
            if let Some(li) = left {
                // The surviving bytes are adjacent to the left record's
                // bytes once the range is gone: fold them in.
                let n = s.bases.len() as i64;
                let m = &mut self.log[li];
                m.bases.append(&mut s.bases);
                m.size_modifier += n;
            } else {
                s.new_pos = pos;
                if footprint > 0 {
                    s.old_pos = residual_old;
                }
                replacement.push(s);
            }
        }
        if footprint > 0 {
            replacement.push(Mutation::deletion(residual_old, pos + survivor_len, footprint));
        }

        let n_replacement = replacement.len();
        self.log.splice(idx..i, replacement);
        self.shift_new_pos(idx + n_replacement, -(len as i64));
        self.chrom_size -= len;
        self.debug_validate();
    }

    /// Validate I1-I6 over the whole log. Debug builds run this after
    /// every applying operation; release builds compile it out.
    #[cfg(debug_assertions)]
    fn debug_validate(&self) {
        let total: i64 = self.log.iter().map(|m| m.size_modifier).sum();
        assert_eq!(
            self.chrom_size as i64,
            self.ref_chrom.size() as i64 + total,
            "chromosome size out of sync with the log"
        );
        let ref_size = self.ref_chrom.size();
        for m in &self.log {
            match m.kind() {
                MutationKind::Substitution => {
                    assert_eq!(m.bases.len(), 1);
                    assert!(m.old_pos < ref_size);
                    assert_ne!(
                        m.bases[0],
                        self.ref_chrom.base(m.old_pos),
                        "substitution to the incumbent base"
                    );
                }
                MutationKind::Insertion => {
                    assert_eq!(m.size_modifier as usize, m.bases.len());
                    assert!(m.old_pos <= ref_size);
                }
                MutationKind::Deletion => {
                    assert!(m.bases.is_empty());
                    assert!(m.old_pos + m.len_in_reference() <= ref_size);
                }
            }
            assert!(m.new_pos <= self.chrom_size);
        }
        for w in self.log.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            assert!(a.old_pos <= b.old_pos, "old_pos not monotone");
            if a.new_pos == b.new_pos {
                // Only a zero-width deletion may share its anchor with the
                // record that follows it.
                assert_eq!(a.kind(), MutationKind::Deletion, "invalid new_pos tie");
                assert_ne!(b.kind(), MutationKind::Deletion);
            } else {
                assert!(a.new_pos < b.new_pos, "new_pos not monotone");
            }
            assert!(
                a.old_pos + a.len_in_reference() <= b.old_pos,
                "overlapping reference footprints"
            );
            let lhs = b.new_pos as i64 - a.new_pos as i64;
            let rhs = a.len_in_variant() as i64
                + (b.old_pos as i64 - a.old_pos as i64 - a.len_in_reference() as i64);
            assert_eq!(lhs, rhs, "inter-record position arithmetic broken");
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn debug_validate(&self) {}
}

impl fmt::Display for VarChrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sequence())
    }
}

/// One variant haploid genome: a `VarChrom` per reference chromosome, in
/// reference order.
#[derive(Debug, Clone)]
pub struct VarGenome {
    name: String,
    chroms: Vec<VarChrom>,
}

impl VarGenome {
    /// Start an unmutated variant genome over `reference`.
    pub fn new(name: impl Into<String>, reference: &RefGenome) -> Self {
        let chroms = reference
            .chroms()
            .iter()
            .map(|rc| VarChrom::new(Arc::clone(rc)))
            .collect();
        Self { name: name.into(), chroms }
    }

    /// Display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of chromosomes.
    #[inline]
    pub fn len(&self) -> usize {
        self.chroms.len()
    }

    /// True when the genome holds no chromosomes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chroms.is_empty()
    }

    /// Chromosome `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&VarChrom> {
        self.chroms.get(idx)
    }

    /// Mutable chromosome `idx`.
    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut VarChrom> {
        self.chroms.get_mut(idx)
    }

    /// All chromosomes in order.
    #[inline]
    pub fn chroms(&self) -> &[VarChrom] {
        &self.chroms
    }

    /// All chromosomes, mutably.
    #[inline]
    pub fn chroms_mut(&mut self) -> &mut [VarChrom] {
        &mut self.chroms
    }

    /// Current sizes of all chromosomes.
    pub fn chrom_sizes(&self) -> Vec<usize> {
        self.chroms.iter().map(|c| c.size()).collect()
    }

    /// Current total size across chromosomes.
    pub fn total_size(&self) -> usize {
        self.chroms.iter().map(|c| c.size()).sum()
    }
}

/// A set of variant genomes evolved over one shared reference.
#[derive(Debug, Clone)]
pub struct VarSet {
    reference: RefGenome,
    variants: Vec<VarGenome>,
}

impl VarSet {
    /// Create `n_variants` unmutated variants named `var0, var1, …`.
    pub fn new(reference: RefGenome, n_variants: usize) -> Self {
        let variants = (0..n_variants)
            .map(|i| VarGenome::new(format!("var{i}"), &reference))
            .collect();
        Self { reference, variants }
    }

    /// Create variants with caller-supplied names.
    pub fn with_names<S: AsRef<str>>(reference: RefGenome, names: &[S]) -> Self {
        let variants = names
            .iter()
            .map(|n| VarGenome::new(n.as_ref(), &reference))
            .collect();
        Self { reference, variants }
    }

    /// The shared reference genome.
    #[inline]
    pub fn reference(&self) -> &RefGenome {
        &self.reference
    }

    /// Number of variants.
    #[inline]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// True when the set holds no variants.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Variant `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&VarGenome> {
        self.variants.get(idx)
    }

    /// Mutable variant `idx`.
    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut VarGenome> {
        self.variants.get_mut(idx)
    }

    /// All variants in order.
    #[inline]
    pub fn variants(&self) -> &[VarGenome] {
        &self.variants
    }

    /// All variants, mutably.
    #[inline]
    pub fn variants_mut(&mut self) -> &mut [VarGenome] {
        &mut self.variants
    }

    /// The smallest current size of chromosome `chrom_idx` across variants.
    pub fn min_chrom_size(&self, chrom_idx: usize) -> Option<usize> {
        self.variants
            .iter()
            .filter_map(|v| v.get(chrom_idx).map(|c| c.size()))
            .min()
    }
}
