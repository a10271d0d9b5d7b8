use std::error;
use std::fmt;

/// Error returned when attempting to convert an invalid byte/character into
/// a `Nucleotide`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidNucleotide(pub u8);

impl fmt::Display for InvalidNucleotide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid nucleotide byte: {} ('{}')", self.0, self.0 as char)
    }
}

impl error::Error for InvalidNucleotide {}

/// Errors raised while ingesting reference genomes.
#[derive(Debug, Clone, PartialEq)]
pub enum GenomeError {
    /// A chromosome contained a byte outside the T/C/A/G alphabet.
    InvalidBase { chrom: String, byte: u8 },
    /// Two chromosomes shared the same name.
    DuplicateName(String),
    /// A chromosome had no bases.
    EmptyChrom(String),
}

impl fmt::Display for GenomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase { chrom, byte } => write!(
                f,
                "Invalid base {byte} ('{}') in chromosome '{chrom}'",
                *byte as char
            ),
            Self::DuplicateName(name) => write!(f, "Duplicate chromosome name '{name}'"),
            Self::EmptyChrom(name) => write!(f, "Chromosome '{name}' has no bases"),
        }
    }
}

impl error::Error for GenomeError {}

/// Errors raised while constructing the rate model or its samplers.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A rate or weight was negative.
    NegativeRate { name: &'static str, value: f64 },
    /// Equilibrium frequencies did not sum to 1 within tolerance.
    FrequenciesNotNormalised(f64),
    /// The insertion/deletion ratio must be strictly positive.
    NonPositivePsi(f64),
    /// The substitution matrix diagonal did not equal the negative row sum.
    BadDiagonal { row: usize, diagonal: f64, row_sum: f64 },
    /// A weight vector was empty or summed to zero.
    DegenerateWeights(&'static str),
    /// Gamma-partition end positions were not strictly ascending or failed
    /// to cover the chromosome.
    BadGammaPartition { index: usize, end: usize },
    /// A gamma multiplier was negative.
    NegativeGamma(f64),
    /// A sequence-length parameter was not usable.
    BadLength { name: &'static str, value: f64 },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeRate { name, value } => {
                write!(f, "Negative rate for {name}: {value}")
            }
            Self::FrequenciesNotNormalised(sum) => {
                write!(f, "Equilibrium frequencies sum to {sum}, expected 1")
            }
            Self::NonPositivePsi(psi) => {
                write!(f, "Insertion/deletion ratio must be > 0, got {psi}")
            }
            Self::BadDiagonal { row, diagonal, row_sum } => write!(
                f,
                "Matrix row {row}: diagonal {diagonal} does not equal negative row sum {row_sum}"
            ),
            Self::DegenerateWeights(name) => {
                write!(f, "Weight vector {name} is empty or sums to zero")
            }
            Self::BadGammaPartition { index, end } => write!(
                f,
                "Gamma partition entry {index} (end = {end}) is not strictly ascending or leaves the chromosome uncovered"
            ),
            Self::NegativeGamma(g) => write!(f, "Negative gamma multiplier: {g}"),
            Self::BadLength { name, value } => {
                write!(f, "Invalid length parameter {name}: {value}")
            }
        }
    }
}

impl error::Error for ModelError {}

/// Errors surfaced to the simulation driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The cancellation token was observed set.
    Cancelled,
    /// A gamma draw stayed non-finite after the bounded retries.
    NonFiniteDraw,
    /// An invalid model was supplied to the driver.
    Model(ModelError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "Simulation cancelled"),
            Self::NonFiniteDraw => {
                write!(f, "Gamma draw produced a non-finite value after 16 retries")
            }
            Self::Model(e) => write!(f, "Model error: {e}"),
        }
    }
}

impl error::Error for SimulationError {}

impl From<ModelError> for SimulationError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}
