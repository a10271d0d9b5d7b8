//! Base types: nucleotides and sequences.

mod nucleotide;
mod sequence;

pub use nucleotide::Nucleotide;
pub use sequence::Sequence;
