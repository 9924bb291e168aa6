/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Miscellaneous utilities.

use kahan::KahanSum;
use rayon::prelude::*;

mod granularity;
pub use granularity::*;

/// Minimum length of Rayon tasks on per-node slices of floats.
pub const RAYON_MIN_LEN: usize = 100_000;

/// Returns the dot product of two vectors.
///
/// # Panics
///
/// In debug mode, if the two vectors have different lengths.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Sums `f(i)` for `i` in `0..len` in parallel.
///
/// Indices are split into chunks of `chunk_len` consecutive values; each
/// chunk is summed with Kahan summation, and chunk sums are combined in chunk
/// order, so the result does not depend on the number of threads.
pub fn par_sum(len: usize, chunk_len: usize, f: impl Fn(usize) -> f64 + Sync) -> f64 {
    let chunk_len = chunk_len.max(1);
    let partials: Vec<f64> = (0..len.div_ceil(chunk_len))
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * chunk_len;
            (start..len.min(start + chunk_len))
                .fold(KahanSum::<f64>::new(), |sum, i| sum + f(i))
                .sum()
        })
        .collect();

    merge_partials(partials)
}

/// Combines partial sums in order with Kahan summation.
pub(crate) fn merge_partials(partials: impl IntoIterator<Item = f64>) -> f64 {
    partials
        .into_iter()
        .fold(KahanSum::<f64>::new(), |sum, partial| sum + partial)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_par_sum() {
        assert_eq!(par_sum(0, 10, |_| 1.0), 0.0);
        assert_eq!(par_sum(1000, 7, |i| i as f64), 499_500.0);
        assert_eq!(par_sum(5, 0, |_| 2.0), 10.0);
    }

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(dot(&[], &[]), 0.0);
    }
}
