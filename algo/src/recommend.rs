/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Ranked recommendation lists.
//!
//! A [`Recommender`] combines a bipartite rating graph and the
//! [feature vectors](FeatureVectors) trained on it. For a left node (a user)
//! it selects with two [`TopK`] passes:
//!
//! 1. the items with the highest observed ratings;
//! 2. among the items the user did not rate, the items with the highest
//!    predicted rating, that is, the dot product of the vectors of the user
//!    and of the item clamped to the [rating scale](RatingBounds).

use crate::Error;
use crate::error::ensure_param;
use crate::factorization::{FeatureVectors, RatingBounds};
use crate::topk::{ScoreTuple, TopK};
use graphrec::traits::Graph;
use rayon::prelude::*;

/// The recommendations for a user.
///
/// Both lists are sorted by decreasing score and, in case of ties, by
/// increasing item.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// The rated items with the highest ratings.
    pub top_rated: Vec<(usize, ScoreTuple)>,
    /// The unrated items with the highest predicted ratings; the raw value of
    /// the score is the unclamped prediction.
    pub recommended: Vec<(usize, ScoreTuple)>,
}

/// Computes recommendations from trained feature vectors.
///
/// # Examples
///
/// ```
/// use graphrec::graphs::BidiCsrGraph;
/// use graphrec_algo::factorization::FeatureVectors;
/// use graphrec_algo::recommend::Recommender;
///
/// // User 0 rated item 1; items 2 and 3 are unrated
/// let (g, ratings) = BidiCsrGraph::from_labeled_arcs(4, [(0, 1, 4.0)]);
/// let is_left = [true, false, false, false];
/// let features = FeatureVectors::from_rows(1, vec![2.0, 2.0, 1.0, 2.5])?;
///
/// let mut recommender = Recommender::new(&g, &is_left, &ratings, &features)?;
/// recommender.k(1);
/// let rec = recommender.recommend(0)?;
/// assert_eq!(rec.top_rated[0].0, 1);
/// assert_eq!(rec.recommended[0].0, 3);
/// assert_eq!(rec.recommended[0].1.score, 5.0);
/// # Ok::<(), graphrec_algo::Error>(())
/// ```
pub struct Recommender<'a, G: Graph + Sync> {
    graph: &'a G,
    is_left: &'a [bool],
    weight: &'a [f64],
    features: &'a FeatureVectors,
    k: usize,
    bounds: RatingBounds,
}

impl<G: Graph + Sync> std::fmt::Debug for Recommender<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("k", &self.k)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl<'a, G: Graph + Sync> Recommender<'a, G> {
    /// Creates a recommender.
    ///
    /// Fails with [`Error::LengthMismatch`] if `is_left`, `weight` or
    /// `features` do not match the graph.
    pub fn new(
        graph: &'a G,
        is_left: &'a [bool],
        weight: &'a [f64],
        features: &'a FeatureVectors,
    ) -> Result<Self, Error> {
        let n = graph.num_nodes();
        for (what, expected, got) in [
            ("node sides", n, is_left.len()),
            ("arc ratings", graph.num_arcs(), weight.len()),
            ("feature vectors", n, features.num_nodes()),
        ] {
            if expected != got {
                return Err(Error::LengthMismatch {
                    what,
                    expected,
                    got,
                });
            }
        }
        Ok(Self {
            graph,
            is_left,
            weight,
            features,
            k: TopK::<usize>::DEFAULT_K,
            bounds: RatingBounds::default(),
        })
    }

    /// Sets the length of recommendation lists.
    ///
    /// The value is checked by [`recommend`](Self::recommend), which fails if
    /// it is zero.
    pub fn k(&mut self, k: usize) -> &mut Self {
        self.k = k;
        self
    }

    /// Sets the rating scale predictions are clamped to.
    pub fn rating_bounds(&mut self, bounds: RatingBounds) -> &mut Self {
        self.bounds = bounds;
        self
    }

    fn check_user(&self, user: usize) -> Result<(), Error> {
        ensure_param!(
            user < self.is_left.len() && self.is_left[user],
            "user",
            user,
            "a left node"
        );
        Ok(())
    }

    /// Returns the predicted rating of `item` by `user`.
    ///
    /// Fails with [`Error::InvalidParameter`] if `user` is not a left node or
    /// `item` is not a right node.
    pub fn predict(&self, user: usize, item: usize) -> Result<f64, Error> {
        self.check_user(user)?;
        ensure_param!(
            item < self.is_left.len() && !self.is_left[item],
            "item",
            item,
            "a right node"
        );
        Ok(self.features.predict(user, item, self.bounds))
    }

    /// Returns the recommendations for `user`.
    ///
    /// Fails with [`Error::InvalidParameter`] if `user` is not a left node or
    /// the length of lists is zero.
    pub fn recommend(&self, user: usize) -> Result<Recommendation, Error> {
        self.check_user(user)?;

        let mut top_rated = TopK::try_new(self.k)?;
        let mut rated = Vec::with_capacity(self.graph.outdegree(user));
        for (arc, item) in self.graph.successors(user) {
            let rating = self.weight[arc];
            top_rated.offer(item, ScoreTuple::new(rating, rating));
            rated.push(item);
        }
        rated.sort_unstable();

        let mut recommended = TopK::try_new(self.k)?;
        for item in (0..self.is_left.len()).filter(|&node| !self.is_left[node]) {
            if rated.binary_search(&item).is_ok() || top_rated.contains(item) {
                continue;
            }
            let raw = self.features.dot(user, item);
            recommended.offer(item, ScoreTuple::new(raw, self.bounds.clamp(raw)));
        }

        Ok(Recommendation {
            top_rated: top_rated.into_sorted_vec(),
            recommended: recommended.into_sorted_vec(),
        })
    }

    /// Returns the recommendations for several users, computed in parallel,
    /// in the order of `users`.
    pub fn recommend_all(&self, users: &[usize]) -> Result<Vec<Recommendation>, Error> {
        users.par_iter().map(|&user| self.recommend(user)).collect()
    }
}
