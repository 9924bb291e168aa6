/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Bounded online selection of the best candidates.
//!
//! A [`TopK`] receives a stream of candidates, each with a [`ScoreTuple`], and
//! keeps the `k` candidates with the highest score seen so far. Once `k`
//! candidates are held, the _floor_ (the lowest held score) makes it possible
//! to reject in constant time every candidate that would not enter the set.
//!
//! Eviction is deterministic: among several held candidates with the lowest
//! score, the one with the greatest identifier is evicted.

use crate::Error;
use crate::error::ensure_param;
use crate::utils::math::argmin_by_tie;
use std::cmp::Reverse;

/// The score of a candidate.
///
/// `raw` is the unadjusted value (e.g., an observed rating or a dot product),
/// `score` is the value used for ranking (e.g., a prediction clamped to the
/// rating scale), and `aux` is an arbitrary payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTuple<A = ()> {
    pub raw: f64,
    pub score: f64,
    pub aux: A,
}

impl ScoreTuple {
    /// Creates a score tuple with no payload.
    pub fn new(raw: f64, score: f64) -> Self {
        Self {
            raw,
            score,
            aux: (),
        }
    }
}

impl<A> ScoreTuple<A> {
    /// Creates a score tuple with a payload.
    pub fn with_aux(raw: f64, score: f64, aux: A) -> Self {
        Self { raw, score, aux }
    }
}

/// Keeps the `k` candidates with the highest score.
///
/// # Examples
///
/// ```
/// use graphrec_algo::topk::{ScoreTuple, TopK};
///
/// let mut top = TopK::new(2);
/// assert!(top.offer(0, ScoreTuple::new(3.0, 3.0)));
/// assert!(top.offer(1, ScoreTuple::new(1.0, 1.0)));
/// assert_eq!(top.floor(), 1.0);
/// // Rejected in constant time
/// assert!(!top.offer(2, ScoreTuple::new(0.5, 0.5)));
/// // Evicts candidate 1
/// assert!(top.offer(3, ScoreTuple::new(4.0, 4.0)));
/// assert_eq!(top.floor(), 3.0);
///
/// let ids: Vec<_> = top.into_sorted_vec().into_iter().map(|(id, _)| id).collect();
/// assert_eq!(ids, [3, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct TopK<I, A = ()> {
    k: usize,
    held: Vec<(I, ScoreTuple<A>)>,
    floor: f64,
}

impl<I: Copy + Ord, A> TopK<I, A> {
    /// The default number of candidates.
    pub const DEFAULT_K: usize = 10;

    /// Creates an empty selection of at most `k` candidates.
    ///
    /// Use [`try_new`](Self::try_new) when `k` comes from user input.
    ///
    /// # Panics
    ///
    /// If `k` is zero.
    pub fn new(k: usize) -> Self {
        assert!(k > 0, "The number of candidates must be positive");
        Self {
            k,
            held: Vec::with_capacity(k),
            floor: f64::NEG_INFINITY,
        }
    }

    /// Creates an empty selection of at most `k` candidates, failing with
    /// [`Error::InvalidParameter`] if `k` is zero.
    pub fn try_new(k: usize) -> Result<Self, Error> {
        ensure_param!(k > 0, "k", k, "a positive integer");
        Ok(Self::new(k))
    }

    /// Offers a candidate, returning whether it was accepted.
    ///
    /// Candidates with a NaN score, candidates already held and, when the
    /// selection is full, candidates with a score not greater than the
    /// [floor](Self::floor) are rejected. Otherwise the candidate is
    /// inserted, evicting, if the selection is full, the held candidate with
    /// the lowest score (and, among those, the one with the greatest
    /// identifier).
    pub fn offer(&mut self, id: I, tuple: ScoreTuple<A>) -> bool {
        if tuple.score.is_nan() {
            return false;
        }
        let full = self.held.len() == self.k;
        if full && tuple.score <= self.floor {
            return false;
        }
        if self.contains(id) {
            return false;
        }

        if full {
            // The selection is not empty, and scores are not NaN
            if let Some(evict) =
                argmin_by_tie(&self.held, |(_, t)| t.score, |(held_id, _)| Reverse(*held_id))
            {
                self.held.swap_remove(evict);
            }
        }
        self.held.push((id, tuple));
        if self.held.len() == self.k {
            self.floor = self
                .held
                .iter()
                .map(|(_, t)| t.score)
                .fold(f64::INFINITY, f64::min);
        }
        true
    }

    /// Returns the held candidates, in no particular order.
    pub fn snapshot(&self) -> &[(I, ScoreTuple<A>)] {
        &self.held
    }

    /// Returns the lowest held score if the selection is full, and −∞
    /// otherwise.
    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Returns the maximum number of candidates.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the number of held candidates.
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Returns whether no candidate is held.
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Returns whether the candidate `id` is held.
    pub fn contains(&self, id: I) -> bool {
        self.held.iter().any(|(held_id, _)| *held_id == id)
    }

    /// Consumes the selection, returning the held candidates by decreasing
    /// score and, in case of ties, increasing identifier.
    pub fn into_sorted_vec(self) -> Vec<(I, ScoreTuple<A>)> {
        let mut held = self.held;
        held.sort_by(|(id_a, a), (id_b, b)| b.score.total_cmp(&a.score).then(id_a.cmp(id_b)));
        held
    }
}
