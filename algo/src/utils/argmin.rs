/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Returns the index of the element of a slice minimizing a value, or
/// [`None`] if the slice is empty.
///
/// In case of ties, this method returns the index for which `tie_break` is
/// minimized. If the minimum appears several times with the same tie break,
/// this methods returns the position of the first instance.
///
/// # Arguments
/// * `slice`: the slice of elements.
///
/// * `value`: a closure returning the value to minimize.
///
/// * `tie_break`: a closure returning the secondary key used to break ties.
///
/// # Panics
///
/// If a comparison returns [`None`].
///
/// # Examples
/// ```
/// # use graphrec_algo::utils::math::argmin_by_tie;
/// use std::cmp::Reverse;
///
/// let v = [(3, 2.0), (1, 0.5), (7, 0.5), (2, 4.0)];
/// // Tie break wins
/// assert_eq!(argmin_by_tie(&v, |x| x.1, |x| Reverse(x.0)), Some(2));
/// assert_eq!(argmin_by_tie(&v, |x| x.1, |x| x.0), Some(1));
///
/// // Enumeration order wins
/// let v = [1.0, 0.0, 0.0];
/// assert_eq!(argmin_by_tie(&v, |&x| x, |_| 0), Some(1));
/// ```
pub fn argmin_by_tie<T, V: PartialOrd, N: PartialOrd>(
    slice: &[T],
    value: impl Fn(&T) -> V,
    tie_break: impl Fn(&T) -> N,
) -> Option<usize> {
    slice
        .iter()
        .map(|x| (value(x), tie_break(x)))
        .enumerate()
        .min_by(|(_, (value_a, tie_a)), (_, (value_b, tie_b))| {
            value_a
                .partial_cmp(value_b)
                .unwrap()
                .then(tie_a.partial_cmp(tie_b).unwrap())
        })
        .map(|m| m.0)
}
