//! One-pass weighted sampling over an index range.
//!
//! Implements the weighted-reservoir scheme of Efraimidis & Spirakis (2006,
//! Information Processing Letters 97:181-185): each index i conceptually
//! receives the key U^(1/w_i), and the largest key wins. The exponential
//! jump between adopted positions means only one heavyweight `powf` per
//! adoption rather than one per index.

use rand::Rng;

use super::rng::{runif_01, runif_ab};

/// Sample an index in `start..=end` with probability proportional to
/// `rates(i)`, in a single pass over the range.
///
/// Zero-weight indices are never returned. If every weight in the range is
/// zero, `start` is returned; callers are expected to check the total rate
/// first.
pub fn sample_rate_range<F, R>(start: usize, end: usize, mut rates: F, eng: &mut R) -> usize
where
    F: FnMut(usize) -> f64,
    R: Rng + ?Sized,
{
    debug_assert!(start <= end);

    // Seed the reservoir at the first positive-weight index; a zero weight
    // would pin the key at zero and stall the jump computation.
    let mut first = start;
    while first < end && rates(first) <= 0.0 {
        first += 1;
    }
    let mut largest_pos = first;
    let first_rate = rates(first);
    if first >= end {
        return if first_rate > 0.0 { first } else { start };
    }
    let mut largest_key = runif_01(eng).powf(1.0 / first_rate);

    let mut c = first;
    while c < end {
        let r = runif_01(eng);
        let x = r.ln() / largest_key.ln();

        let mut i = c + 1;
        let mut wt_sum0 = rates(c);
        let mut wt_sum1 = wt_sum0 + rates(i);
        while x > wt_sum1 && i < end {
            i += 1;
            wt_sum0 = wt_sum1;
            wt_sum1 += rates(i);
        }
        if x > wt_sum1 {
            break;
        }
        if wt_sum0 >= x {
            continue;
        }

        largest_pos = i;

        let w = rates(i);
        let t = largest_key.powf(w);
        largest_key = runif_ab(eng, t, 1.0).powf(1.0 / w);

        c = i;
    }

    largest_pos
}
