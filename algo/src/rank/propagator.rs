/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel Jacobi PageRank and ArticleRank.
//!
//! # The formulae
//!
//! Let *n* be the number of nodes, *d* the damping factor, and
//! *d*⁺(*w*) the outdegree of *w*. Starting from the uniform vector
//! **x**⁽⁰⁾ = **1**/*n*, the [PageRank](Mode::PageRank) update is
//!
//! > *x*⁽*ᵗ* ⁺ ¹⁾(*v*) = (1 − *d*) / *n* + *d* ∑_(*w* → *v*) *x*⁽*ᵗ*⁾(*w*) / *d*⁺(*w*) + *D*⁽*ᵗ*⁾,
//!
//! where the _dangling mass_ *D*⁽*ᵗ*⁾ is *d* / *n* times the sum of the ranks
//! of the nodes with outdegree zero if `normalize` is true, and zero
//! otherwise. Without normalization the rank of dangling nodes leaks out of
//! the system, and the resulting vector is not stochastic.
//!
//! The [ArticleRank](Mode::ArticleRank) update replaces the outdegree with the
//! outdegree smoothed by the average outdegree *a* = *m* / *n*:
//!
//! > *x*⁽*ᵗ* ⁺ ¹⁾(*v*) = (1 − *d*) + *d* *a* ∑_(*w* → *v*) *x*⁽*ᵗ*⁾(*w*) / (*a* + *d*⁺(*w*)).
//!
//! ArticleRank has no dangling term, and its values are not normalized.
//!
//! In both cases the coefficient by which the rank of a predecessor is
//! multiplied depends only on the predecessor, so it is computed once before
//! the first iteration. Since a predecessor has at least one arc, it never has
//! outdegree zero.
//!
//! # Parallelism
//!
//! Each iteration is a superstep on a
//! [`DoubleBuffer`](graphrec::props::DoubleBuffer): new values are computed
//! in parallel from the values of the previous iteration only (Jacobi
//! semantics), and become visible when the buffers are swapped. The ℓ₁ norm
//! of the difference between successive approximations is accumulated in
//! per-chunk partial sums that are merged in a fixed order, so the result of a
//! computation depends on the [granularity](RankPropagator::granularity), but
//! not on the number of threads.
//!
//! # Stopping criteria
//!
//! The [`run`](RankPropagator::run) method accepts a composable [`Predicate`]
//! that is evaluated after each iteration. The predicate receives the number
//! of iterations performed so far and the ℓ₁ norm of the difference between
//! the last two approximations. Reaching the maximum number of iterations is
//! not an error: the current approximation is returned.

pub mod preds {
    //! Predicates implementing stopping conditions.
    //!
    //! The implementation of [rank propagation](super::RankPropagator)
    //! requires a [predicate](Predicate) to stop the algorithm. This module
    //! provides a few such predicates: they evaluate to true if the
    //! computation should be stopped.
    //!
    //! You can combine the predicates using the `and` and `or` methods provided
    //! by the [`Predicate`] trait.
    //!
    //! # Examples
    //! ```
    //! # fn main() -> Result<(), Box<dyn std::error::Error>> {
    //! use predicates::prelude::*;
    //! use graphrec_algo::rank::preds::{MaxIter, Tolerance};
    //!
    //! let mut predicate = Tolerance::try_from(1E-6)?.boxed();
    //! predicate = predicate.or(MaxIter::try_from(100)?).boxed();
    //! #     Ok(())
    //! # }
    //! ```

    use crate::Error;
    use crate::error::ensure_param;
    use predicates::{Predicate, reflection::PredicateReflection};
    use std::fmt::Display;

    #[doc(hidden)]
    /// This structure is passed to stopping predicates to provide the
    /// information that is needed to evaluate them.
    #[derive(Debug)]
    pub struct PredParams {
        pub iteration: usize,
        pub diff: f64,
    }

    /// Stops after at most the provided number of iterations.
    #[derive(Debug, Clone)]
    pub struct MaxIter {
        max_iter: usize,
    }

    impl MaxIter {
        pub const DEFAULT_MAX_ITER: usize = 1000;
    }

    impl TryFrom<usize> for MaxIter {
        type Error = Error;
        fn try_from(max_iter: usize) -> Result<Self, Error> {
            ensure_param!(max_iter > 0, "max_iter", max_iter, "a positive integer");
            Ok(MaxIter { max_iter })
        }
    }

    impl Default for MaxIter {
        fn default() -> Self {
            MaxIter {
                max_iter: Self::DEFAULT_MAX_ITER,
            }
        }
    }

    impl Display for MaxIter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(max iter: {})", self.max_iter))
        }
    }

    impl PredicateReflection for MaxIter {}

    impl Predicate<PredParams> for MaxIter {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.iteration >= self.max_iter
        }
    }

    /// Stops when the ℓ₁ norm of the difference between successive
    /// approximations is at most a given threshold.
    #[derive(Debug, Clone)]
    pub struct Tolerance {
        threshold: f64,
    }

    impl Tolerance {
        pub const DEFAULT_THRESHOLD: f64 = 1E-3;
    }

    impl TryFrom<f64> for Tolerance {
        type Error = Error;
        fn try_from(threshold: f64) -> Result<Self, Error> {
            // NaN fails the comparison
            ensure_param!(
                threshold > 0.0,
                "tolerance",
                threshold,
                "a positive number"
            );
            Ok(Tolerance { threshold })
        }
    }

    impl Default for Tolerance {
        fn default() -> Self {
            Tolerance {
                threshold: Self::DEFAULT_THRESHOLD,
            }
        }
    }

    impl Display for Tolerance {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(tolerance: {})", self.threshold))
        }
    }

    impl PredicateReflection for Tolerance {}
    impl Predicate<PredParams> for Tolerance {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.diff <= self.threshold
        }
    }
}

/// Selects the propagation formula.
///
/// See the [module-level documentation](self) for the mathematical details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Classical PageRank; if `normalize` is true, the rank of dangling
    /// nodes is redistributed uniformly.
    PageRank { normalize: bool },
    /// PageRank with outdegrees smoothed by the average outdegree.
    ArticleRank,
}

impl Default for Mode {
    /// Returns normalized PageRank.
    fn default() -> Self {
        Mode::PageRank { normalize: true }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::PageRank { normalize: true } => f.write_str("PageRank (normalized)"),
            Mode::PageRank { normalize: false } => f.write_str("PageRank"),
            Mode::ArticleRank => f.write_str("ArticleRank"),
        }
    }
}

use crate::Error;
use crate::error::ensure_param;
use dsi_progress_logger::{ProgressLog, no_logging};
use graphrec::props::DoubleBuffer;
use graphrec::traits::Graph;
use graphrec::utils::{Granularity, RAYON_MIN_LEN, par_sum};
use kahan::KahanSum;
use predicates::Predicate;
use predicates::prelude::*;
use rayon::prelude::*;

/// Computes PageRank or ArticleRank using a parallel Jacobi iteration.
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run). After completion the rank vector is available via the
/// [`rank`](Self::rank) method.
///
/// # Examples
///
/// ```
/// use graphrec::graphs::BidiCsrGraph;
/// use graphrec_algo::rank::{RankPropagator, preds};
///
/// //   0 → 1, 0 → 2, 1 → 2, 2 → 0, 3 → 0, 4 → 3
/// let g = BidiCsrGraph::from_arcs(5, [(0, 1), (0, 2), (1, 2), (2, 0), (3, 0), (4, 3)]);
///
/// let mut pr = RankPropagator::new(&g);
/// pr.run(preds::Tolerance::try_from(1E-9).unwrap()).unwrap();
///
/// assert_eq!(pr.rank().len(), 5);
/// assert!((pr.rank().iter().sum::<f64>() - 1.0).abs() < 1E-6);
/// ```
///
/// ArticleRank with a bound on the number of iterations:
///
/// ```
/// use graphrec::graphs::BidiCsrGraph;
/// use graphrec_algo::rank::{Mode, RankPropagator, preds};
/// use predicates::prelude::*;
///
/// let g = BidiCsrGraph::from_arcs(5, [(0, 1), (0, 2), (1, 2), (2, 0), (3, 0), (4, 3)]);
///
/// let mut ar = RankPropagator::new(&g);
/// ar.damping(0.9).mode(Mode::ArticleRank);
/// ar.run(
///     preds::Tolerance::try_from(1E-9)
///         .unwrap()
///         .or(preds::MaxIter::try_from(10).unwrap()),
/// )
/// .unwrap();
///
/// assert!(ar.iterations() <= 10);
/// // Node 4 has no predecessors
/// assert!((ar.rank()[4] - 0.1).abs() < 1E-12);
/// ```
pub struct RankPropagator<'a, G: Graph + Sync> {
    graph: &'a G,
    damping: f64,
    mode: Mode,
    granularity: Granularity,
    diff: f64,

    rank: Box<[f64]>,
    iteration: usize,
}

impl<G: Graph + Sync> std::fmt::Debug for RankPropagator<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankPropagator")
            .field("damping", &self.damping)
            .field("mode", &self.mode)
            .field("granularity", &self.granularity)
            .field("diff", &self.diff)
            .field("iteration", &self.iteration)
            .finish_non_exhaustive()
    }
}

impl<'a, G: Graph + Sync> RankPropagator<'a, G> {
    /// The default damping factor.
    pub const DEFAULT_DAMPING: f64 = 0.85;

    /// Creates a new rank propagation on `graph`.
    pub fn new(graph: &'a G) -> Self {
        let n = graph.num_nodes();
        Self {
            graph,
            damping: Self::DEFAULT_DAMPING,
            mode: Mode::default(),
            granularity: Granularity::default(),
            diff: f64::INFINITY,
            rank: vec![0.0; n].into_boxed_slice(),
            iteration: 0,
        }
    }

    /// Sets the damping factor.
    ///
    /// The value is checked by [`run`](Self::run), which fails if it is not
    /// in the open interval (0 . . 1).
    pub fn damping(&mut self, damping: f64) -> &mut Self {
        self.damping = damping;
        self
    }

    /// Sets the propagation [mode](Mode).
    pub fn mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Sets the parallel task granularity.
    ///
    /// The granularity expresses how many
    /// [nodes](Granularity::node_granularity) will be passed to a Rayon task at
    /// a time.
    pub fn granularity(&mut self, granularity: Granularity) -> &mut Self {
        self.granularity = granularity;
        self
    }

    /// Returns the rank vector.
    ///
    /// After calling [`run`](Self::run), this contains the computed ranks.
    pub fn rank(&self) -> &[f64] {
        &self.rank
    }

    /// Consumes the computation, returning the rank vector.
    pub fn into_rank(self) -> Box<[f64]> {
        self.rank
    }

    /// Returns the number of iterations performed by the last call to
    /// [`run`](Self::run).
    pub fn iterations(&self) -> usize {
        self.iteration
    }

    /// Returns the ℓ₁ norm of the difference between the last two
    /// approximations.
    pub fn diff(&self) -> f64 {
        self.diff
    }

    /// Runs the computation until the given predicate is satisfied.
    ///
    /// The predicate is the only stopping criterion: a predicate that never
    /// holds, such as a [`Tolerance`](preds::Tolerance) that is never
    /// reached, makes this method loop forever. Combine it with a
    /// [`MaxIter`](preds::MaxIter) to bound the number of iterations:
    ///
    /// ```
    /// use graphrec::graphs::BidiCsrGraph;
    /// use graphrec_algo::rank::{RankPropagator, preds};
    /// use predicates::prelude::*;
    ///
    /// let g = BidiCsrGraph::from_arcs(3, [(0, 1), (1, 2), (2, 0)]);
    /// let mut pr = RankPropagator::new(&g);
    /// // The uniform vector is stationary, so the change is zero
    /// // after the first iteration and the tolerance is met
    /// pr.run(preds::Tolerance::try_from(1E-9)?.or(preds::MaxIter::try_from(50)?))?;
    /// assert_eq!(pr.iterations(), 1);
    /// # Ok::<(), graphrec_algo::Error>(())
    /// ```
    pub fn run(&mut self, predicate: impl Predicate<preds::PredParams>) -> Result<(), Error> {
        self.run_with_logging(predicate, no_logging![])
    }

    /// Runs the computation until the given predicate is satisfied, logging
    /// iterations on the given [`ProgressLog`].
    ///
    /// As with [`run`](Self::run), termination depends on the predicate
    /// only.
    ///
    /// The options of `pl` are preserved, making thus possible to customize
    /// the logs.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if the damping factor is not in
    /// (0 . . 1), and [`Error::EmptyGraph`] if the graph has no nodes. In both
    /// cases no work is performed.
    pub fn run_with_logging(
        &mut self,
        predicate: impl Predicate<preds::PredParams>,
        pl: &mut impl ProgressLog,
    ) -> Result<(), Error> {
        let damping = self.damping;
        ensure_param!(
            damping > 0.0 && damping < 1.0,
            "damping",
            damping,
            "a value in (0 . . 1)"
        );
        let n = self.graph.num_nodes();
        if n == 0 {
            return Err(Error::EmptyGraph);
        }

        log::info!("Mode: {}", self.mode);
        log::info!("Damping factor: {}", damping);
        log::info!("Stopping criterion: {}", predicate);

        let graph = self.graph;
        let mode = self.mode;
        let inv_n = 1.0 / n as f64;

        // Coefficient of the rank of a predecessor
        let coefficients = match mode {
            Mode::PageRank { .. } => Self::coefficients(graph, |d| 1.0 / d as f64),
            Mode::ArticleRank => {
                let avg = graph.avg_outdegree();
                log::info!("Average outdegree: {}", avg);
                if avg == 0.0 {
                    vec![0.0; n].into_boxed_slice()
                } else {
                    Self::coefficients(graph, |d| avg / (avg + d as f64))
                }
            }
        };

        let dangling = (0..n)
            .into_par_iter()
            .with_min_len(RAYON_MIN_LEN)
            .filter(|&node| graph.outdegree(node) == 0)
            .collect::<Vec<_>>();
        log::info!("{} dangling nodes", dangling.len());

        let node_granularity = self.granularity.node_granularity(n, graph.num_arcs());
        let (base, redistribute) = match mode {
            Mode::PageRank { normalize } => ((1.0 - damping) * inv_n, normalize),
            Mode::ArticleRank => (1.0 - damping, false),
        };

        let mut buffer = DoubleBuffer::new(n, 1);
        buffer.fill(inv_n);
        self.iteration = 0;
        self.diff = f64::INFINITY;

        pl.item_name("iteration");
        pl.expected_updates(None);
        pl.start(format!(
            "Computing {mode} (damping={damping}, granularity={node_granularity})..."
        ));

        loop {
            let dangling_mass = if redistribute {
                let current = buffer.rows();
                damping
                    * inv_n
                    * par_sum(dangling.len(), RAYON_MIN_LEN, |i| {
                        current.value(dangling[i])
                    })
            } else {
                0.0
            };

            self.diff = buffer.par_update(node_granularity, |node, current, next| {
                let mut sigma = KahanSum::<f64>::new();
                for (_, pred) in graph.predecessors(node) {
                    sigma += current.value(pred) * coefficients[pred];
                }
                next[0] = base + damping * sigma.sum() + dangling_mass;
                (next[0] - current.value(node)).abs()
            });
            buffer.swap();

            self.iteration += 1;
            log::info!("Iteration {}: diff = {}", self.iteration, self.diff);
            pl.update_and_display();

            if predicate.eval(&preds::PredParams {
                iteration: self.iteration,
                diff: self.diff,
            }) {
                break;
            }
        }

        pl.done();
        self.rank = buffer.into_current();
        Ok(())
    }

    /// Computes per-node coefficients from outdegrees; nodes with no
    /// successors get zero.
    fn coefficients(graph: &G, coefficient: impl Fn(usize) -> f64 + Sync) -> Box<[f64]> {
        (0..graph.num_nodes())
            .into_par_iter()
            .with_min_len(RAYON_MIN_LEN)
            .map(|node| match graph.outdegree(node) {
                0 => 0.0,
                d => coefficient(d),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice()
    }
}

/// Computes ranks with the given parameters, stopping when the ℓ₁ norm of
/// the difference between successive approximations is at most `tolerance`,
/// or after `max_iter` iterations.
///
/// # Errors
///
/// [`Error::InvalidParameter`] if `damping` is not in (0 . . 1), `tolerance`
/// is not positive or `max_iter` is zero; [`Error::EmptyGraph`] if the graph
/// has no nodes.
///
/// # Examples
///
/// ```
/// use graphrec::graphs::BidiCsrGraph;
/// use graphrec_algo::rank::{Mode, propagate};
///
/// let g = BidiCsrGraph::from_arcs(2, [(0, 1), (1, 0)]);
/// let rank = propagate(&g, 0.85, 1E-3, 1000, Mode::PageRank { normalize: false })?;
/// assert_eq!(rank[0], rank[1]);
/// # Ok::<(), graphrec_algo::Error>(())
/// ```
pub fn propagate<G: Graph + Sync>(
    graph: &G,
    damping: f64,
    tolerance: f64,
    max_iter: usize,
    mode: Mode,
) -> Result<Box<[f64]>, Error> {
    let predicate = preds::Tolerance::try_from(tolerance)?.or(preds::MaxIter::try_from(max_iter)?);
    let mut propagator = RankPropagator::new(graph);
    propagator.damping(damping).mode(mode);
    propagator.run(predicate)?;
    Ok(propagator.into_rank())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphrec::graphs::BidiCsrGraph;

    #[test]
    fn test_coefficients() {
        let g = BidiCsrGraph::from_arcs(3, [(0, 1), (0, 2), (1, 2)]);
        let c = RankPropagator::coefficients(&g, |d| 1.0 / d as f64);
        assert_eq!(&*c, &[0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Mode::default().to_string(), "PageRank (normalized)");
        assert_eq!(Mode::ArticleRank.to_string(), "ArticleRank");
        assert_eq!(preds::MaxIter::default().to_string(), "(max iter: 1000)");
    }
}
