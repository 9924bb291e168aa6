/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Root-mean-square error of predictions.

use crate::Error;
use crate::factorization::{FeatureVectors, RatingBounds};
use graphrec::traits::{Graph, arcs};
use kahan::KahanSum;

/// Returns the root-mean-square error of pairs `(predicted, actual)`.
///
/// Fails with [`Error::DivisionByZero`] if there are no pairs.
///
/// # Examples
///
/// ```
/// use graphrec_algo::eval::rmse;
///
/// assert_eq!(rmse([(3.0, 3.0), (2.0, 2.0)])?, 0.0);
/// assert_eq!(rmse([(1.0, 2.0), (5.0, 4.0)])?, 1.0);
/// assert!(rmse([]).is_err());
/// # Ok::<(), graphrec_algo::Error>(())
/// ```
pub fn rmse(pairs: impl IntoIterator<Item = (f64, f64)>) -> Result<f64, Error> {
    let (count, sse) = pairs.into_iter().fold(
        (0usize, KahanSum::<f64>::new()),
        |(count, sse), (predicted, actual)| {
            let err = actual - predicted;
            (count + 1, sse + err * err)
        },
    );
    if count == 0 {
        return Err(Error::DivisionByZero("predictions"));
    }
    Ok((sse.sum() / count as f64).sqrt())
}

/// Returns the root-mean-square error of the predictions of `features` on
/// the arcs of a held-out graph.
///
/// The graph must use the same node identifiers as the graph `features` was
/// trained on; arcs with an endpoint outside the range of `features` are
/// skipped. Predictions are clamped to `bounds`.
///
/// Fails with [`Error::LengthMismatch`] if `weight` does not match the arcs
/// of the graph, and with [`Error::DivisionByZero`] if no arc can be
/// evaluated.
pub fn holdout_rmse<G: Graph>(
    features: &FeatureVectors,
    graph: &G,
    weight: &[f64],
    bounds: RatingBounds,
) -> Result<f64, Error> {
    if weight.len() != graph.num_arcs() {
        return Err(Error::LengthMismatch {
            what: "arc ratings",
            expected: graph.num_arcs(),
            got: weight.len(),
        });
    }
    let n = features.num_nodes();
    let mut skipped = 0;
    let result = rmse(arcs(graph).filter_map(|(arc, user, item)| {
        if user >= n || item >= n {
            log::debug!("Skipping arc {arc} ({user} -> {item}): unknown node");
            skipped += 1;
            return None;
        }
        Some((features.predict(user, item, bounds), weight[arc]))
    }));
    if skipped > 0 {
        log::info!("Skipped {skipped} arcs with unknown nodes");
    }
    result
}
