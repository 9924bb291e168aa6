/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Latent-factor training on bipartite rating graphs.
//!
//! The nodes of a bipartite graph are divided into _left_ nodes (e.g.,
//! users) and _right_ nodes (e.g., items), and every arc goes from a left node
//! to a right node, carrying a rating. [`MatrixFactorization`] associates
//! with each node a vector of *L* latent factors so that the dot product of
//! the vectors of the endpoints of an arc, clamped to the [rating
//! scale](RatingBounds), approximates its rating.
//!
//! # The update rule
//!
//! Vectors are initialized with uniform values in [0 . . 1) drawn from a
//! seeded [`SmallRng`], in order of node. Then, at each step, every node *v*
//! computes, over all arcs incident to *v* (outgoing arcs for left nodes,
//! incoming arcs for right nodes) towards a node *o* with rating *r*, the
//! gradient
//!
//! > **z** = ∑ ( **f**(*o*) (*r* − *r̂*) − λ **f**(*v*) ),
//!
//! where *r̂* is the clamped prediction **f**(*v*) · **f**(*o*), and moves to
//! **f**(*v*) + η **z** / deg(*v*), where η is the learning rate of the step
//! and deg(*v*) the number of arcs incident to *v*. The factor two of the
//! derivative of the squared error is absorbed in the learning rate, and
//! λ = 0 disables regularization. The learning rate is multiplied by the
//! [decay](MatrixFactorization::decay) after each step.
//!
//! In other words, each node moves along the _average_ gradient of its
//! arcs, so the length of a step does not grow with the degree of the node.
//!
//! All nodes are updated in parallel from the vectors of the previous step
//! (Jacobi semantics), and arcs incident to a node are always visited in the
//! same order, so results depend on the
//! [granularity](MatrixFactorization::granularity), but not on the number
//! of threads.
//!
//! # The error
//!
//! Each arc is visited by both its endpoints, so after each step the training
//! root-mean-square error is computed as the square root of the sum of the
//! squared errors divided by twice the number of arcs.

use crate::Error;
use crate::error::ensure_param;
use dsi_progress_logger::{ProgressLog, no_logging};
use graphrec::props::DoubleBuffer;
use graphrec::traits::{Graph, arcs};
use graphrec::utils::{Granularity, dot};
use kahan::KahanSum;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A closed interval of admissible ratings.
///
/// Predictions are clamped to this interval both during training and when
/// [evaluating](crate::eval) or [recommending](crate::recommend).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingBounds {
    min: f64,
    max: f64,
}

impl RatingBounds {
    /// Creates a rating scale, failing with [`Error::InvalidParameter`]
    /// unless both bounds are finite and `min` < `max`.
    pub fn new(min: f64, max: f64) -> Result<Self, Error> {
        ensure_param!(min.is_finite(), "min", min, "a finite number");
        ensure_param!(
            max.is_finite() && min < max,
            "max",
            max,
            "a finite number greater than the minimum"
        );
        Ok(Self { min, max })
    }

    /// Returns the lower bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Returns the upper bound.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamps `x` to the interval.
    #[inline(always)]
    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }
}

impl Default for RatingBounds {
    /// Returns the interval [1 . . 5].
    fn default() -> Self {
        Self { min: 1.0, max: 5.0 }
    }
}

/// Latent-factor vectors of the same length, one per node.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVectors {
    vector_length: usize,
    data: Box<[f64]>,
}

impl FeatureVectors {
    /// Creates feature vectors from their concatenation.
    ///
    /// Fails with [`Error::InvalidParameter`] if `vector_length` is zero and
    /// with [`Error::LengthMismatch`] if the length of `data` is not a
    /// multiple of `vector_length`.
    pub fn from_rows(vector_length: usize, data: impl Into<Box<[f64]>>) -> Result<Self, Error> {
        ensure_param!(
            vector_length > 0,
            "vector_length",
            vector_length,
            "a positive integer"
        );
        let data = data.into();
        if data.len() % vector_length != 0 {
            return Err(Error::LengthMismatch {
                what: "feature values",
                expected: data.len().next_multiple_of(vector_length),
                got: data.len(),
            });
        }
        Ok(Self {
            vector_length,
            data,
        })
    }

    /// Returns the number of factors per node.
    pub fn vector_length(&self) -> usize {
        self.vector_length
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.data.len() / self.vector_length
    }

    /// Returns the vector of `node`.
    pub fn row(&self, node: usize) -> &[f64] {
        &self.data[node * self.vector_length..(node + 1) * self.vector_length]
    }

    /// Returns the dot product of the vectors of two nodes.
    pub fn dot(&self, a: usize, b: usize) -> f64 {
        dot(self.row(a), self.row(b))
    }

    /// Returns the dot product of the vectors of two nodes, clamped to the
    /// given rating scale.
    pub fn predict(&self, a: usize, b: usize, bounds: RatingBounds) -> f64 {
        bounds.clamp(self.dot(a, b))
    }

    /// Returns the concatenation of all vectors.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Trains latent-factor vectors by parallel gradient descent.
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run), which returns the training error. After completion
/// the vectors are available via the [`features`](Self::features) method.
///
/// # Examples
///
/// ```
/// use graphrec::graphs::BidiCsrGraph;
/// use graphrec_algo::factorization::MatrixFactorization;
///
/// // Users 0 and 1, items 2 and 3
/// let (g, ratings) =
///     BidiCsrGraph::from_labeled_arcs(4, [(0, 2, 4.0), (0, 3, 2.0), (1, 2, 5.0)]);
/// let is_left = [true, true, false, false];
///
/// let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
/// mf.vector_length(2).max_steps(10);
/// let rmse = mf.run()?;
///
/// assert_eq!(mf.rmse_history().len(), 10);
/// assert_eq!(mf.rmse_history().last(), Some(&rmse));
/// assert_eq!(mf.features().row(3).len(), 2);
/// # Ok::<(), graphrec_algo::Error>(())
/// ```
pub struct MatrixFactorization<'a, G: Graph + Sync> {
    graph: &'a G,
    is_left: &'a [bool],
    weight: &'a [f64],
    learning_rate: f64,
    decay: f64,
    lambda: f64,
    max_steps: usize,
    vector_length: usize,
    seed: u64,
    bounds: RatingBounds,
    granularity: Granularity,

    features: FeatureVectors,
    rmse_history: Vec<f64>,
}

impl<G: Graph + Sync> std::fmt::Debug for MatrixFactorization<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixFactorization")
            .field("learning_rate", &self.learning_rate)
            .field("decay", &self.decay)
            .field("lambda", &self.lambda)
            .field("max_steps", &self.max_steps)
            .field("vector_length", &self.vector_length)
            .field("seed", &self.seed)
            .field("bounds", &self.bounds)
            .field("granularity", &self.granularity)
            .finish_non_exhaustive()
    }
}

impl<'a, G: Graph + Sync> MatrixFactorization<'a, G> {
    pub const DEFAULT_LEARNING_RATE: f64 = 0.32;
    pub const DEFAULT_DECAY: f64 = 0.85;
    pub const DEFAULT_LAMBDA: f64 = 0.25;
    pub const DEFAULT_MAX_STEPS: usize = 100;
    pub const DEFAULT_VECTOR_LENGTH: usize = 20;

    /// Creates a new training on `graph`.
    ///
    /// `is_left` tells the side of each node, and `weight` contains the
    /// rating of each arc, indexed by arc identifier. Lengths are checked by
    /// [`run`](Self::run).
    pub fn new(graph: &'a G, is_left: &'a [bool], weight: &'a [f64]) -> Self {
        Self {
            graph,
            is_left,
            weight,
            learning_rate: Self::DEFAULT_LEARNING_RATE,
            decay: Self::DEFAULT_DECAY,
            lambda: Self::DEFAULT_LAMBDA,
            max_steps: Self::DEFAULT_MAX_STEPS,
            vector_length: Self::DEFAULT_VECTOR_LENGTH,
            seed: 0,
            bounds: RatingBounds::default(),
            granularity: Granularity::default(),
            features: FeatureVectors {
                vector_length: Self::DEFAULT_VECTOR_LENGTH,
                data: Box::default(),
            },
            rmse_history: Vec::new(),
        }
    }

    /// Sets the initial learning rate.
    ///
    /// The rate multiplies the gradient of a node divided by its degree, so
    /// it does not need to be scaled with the density of the graph.
    pub fn learning_rate(&mut self, learning_rate: f64) -> &mut Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the factor by which the learning rate is multiplied after each
    /// step.
    pub fn decay(&mut self, decay: f64) -> &mut Self {
        self.decay = decay;
        self
    }

    /// Sets the regularization parameter λ; zero disables regularization.
    pub fn lambda(&mut self, lambda: f64) -> &mut Self {
        self.lambda = lambda;
        self
    }

    /// Sets the number of steps.
    pub fn max_steps(&mut self, max_steps: usize) -> &mut Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the number of latent factors per node.
    pub fn vector_length(&mut self, vector_length: usize) -> &mut Self {
        self.vector_length = vector_length;
        self
    }

    /// Sets the seed of the generator used to initialize vectors.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    /// Sets the rating scale predictions are clamped to.
    pub fn rating_bounds(&mut self, bounds: RatingBounds) -> &mut Self {
        self.bounds = bounds;
        self
    }

    /// Sets the parallel task granularity.
    ///
    /// Since the cost of updating a node is proportional to its degree,
    /// [arc granularity](Granularity::Arcs) is usually more appropriate.
    pub fn granularity(&mut self, granularity: Granularity) -> &mut Self {
        self.granularity = granularity;
        self
    }

    /// Returns the feature vectors computed by the last call to
    /// [`run`](Self::run).
    pub fn features(&self) -> &FeatureVectors {
        &self.features
    }

    /// Consumes the training, returning the feature vectors.
    pub fn into_features(self) -> FeatureVectors {
        self.features
    }

    /// Returns the training error after each step of the last call to
    /// [`run`](Self::run).
    pub fn rmse_history(&self) -> &[f64] {
        &self.rmse_history
    }

    /// Trains the vectors, returning the training error of the last step.
    pub fn run(&mut self) -> Result<f64, Error> {
        self.run_with_logging(no_logging![])
    }

    /// Trains the vectors, logging steps on the given [`ProgressLog`], and
    /// returns the training error of the last step.
    ///
    /// # Errors
    ///
    /// All errors are detected before training starts:
    /// - [`Error::LengthMismatch`] if the sides or the ratings do not match
    ///   the graph;
    /// - [`Error::InvalidParameter`] if a parameter is out of range;
    /// - [`Error::DivisionByZero`] if the graph has no arcs;
    /// - [`Error::NotBipartite`] if an arc does not go from a left node to a
    ///   right node.
    pub fn run_with_logging(&mut self, pl: &mut impl ProgressLog) -> Result<f64, Error> {
        self.check()?;

        let graph = self.graph;
        let is_left = self.is_left;
        let weight = self.weight;
        let bounds = self.bounds;
        let lambda = self.lambda;
        let vector_length = self.vector_length;
        let n = graph.num_nodes();
        let m = graph.num_arcs();

        log::info!("Learning rate: {}", self.learning_rate);
        log::info!("Decay: {}", self.decay);
        log::info!("Lambda: {}", lambda);
        log::info!("Vector length: {}", vector_length);
        log::info!("Rating bounds: [{} . . {}]", bounds.min, bounds.max);

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut buffer = DoubleBuffer::new(n, vector_length);
        buffer.init_rows(|_, row| row.iter_mut().for_each(|x| *x = rng.random::<f64>()));

        let node_granularity = self.granularity.node_granularity(n, m);
        let mut rate = self.learning_rate;
        self.rmse_history.clear();

        pl.item_name("step");
        pl.expected_updates(Some(self.max_steps));
        pl.start(format!(
            "Training {n} vectors on {m} arcs (granularity={node_granularity})..."
        ));

        for step in 0..self.max_steps {
            let sse = buffer.par_update(node_granularity, |node, current, next| {
                let f_v = current.row(node);
                let mut sse = KahanSum::<f64>::new();
                // The gradient is accumulated in the next row
                next.fill(0.0);
                let mut visit = |arc: usize, other: usize| {
                    let f_o = current.row(other);
                    let err = weight[arc] - bounds.clamp(dot(f_v, f_o));
                    for ((z, &o), &v) in next.iter_mut().zip(f_o).zip(f_v) {
                        *z += o * err;
                        if lambda > 0.0 {
                            *z -= lambda * v;
                        }
                    }
                    sse += err * err;
                };
                let degree = if is_left[node] {
                    graph
                        .successors(node)
                        .for_each(|(arc, item)| visit(arc, item));
                    graph.outdegree(node)
                } else {
                    graph
                        .predecessors(node)
                        .for_each(|(arc, user)| visit(arc, user));
                    graph.indegree(node)
                };
                // Nodes without arcs have a zero gradient
                let step = rate / degree.max(1) as f64;
                for (x, &v) in next.iter_mut().zip(f_v) {
                    *x = v + step * *x;
                }
                sse.sum()
            });
            buffer.swap();

            let rmse = (sse / (2 * m) as f64).sqrt();
            self.rmse_history.push(rmse);
            log::info!("Step {}: RMSE = {}", step + 1, rmse);
            pl.update_and_display();
            rate *= self.decay;
        }

        pl.done();
        self.features = FeatureVectors {
            vector_length,
            data: buffer.into_current(),
        };
        // There is at least one step
        Ok(self.rmse_history.last().copied().unwrap_or(f64::NAN))
    }

    fn check(&self) -> Result<(), Error> {
        let n = self.graph.num_nodes();
        let m = self.graph.num_arcs();
        if self.is_left.len() != n {
            return Err(Error::LengthMismatch {
                what: "node sides",
                expected: n,
                got: self.is_left.len(),
            });
        }
        if self.weight.len() != m {
            return Err(Error::LengthMismatch {
                what: "arc ratings",
                expected: m,
                got: self.weight.len(),
            });
        }
        ensure_param!(
            self.learning_rate > 0.0 && self.learning_rate.is_finite(),
            "learning_rate",
            self.learning_rate,
            "a finite positive number"
        );
        ensure_param!(
            self.decay > 0.0 && self.decay.is_finite(),
            "decay",
            self.decay,
            "a finite positive number"
        );
        ensure_param!(
            self.lambda >= 0.0 && self.lambda.is_finite(),
            "lambda",
            self.lambda,
            "a finite nonnegative number"
        );
        ensure_param!(
            self.max_steps > 0,
            "max_steps",
            self.max_steps,
            "a positive integer"
        );
        ensure_param!(
            self.vector_length > 0,
            "vector_length",
            self.vector_length,
            "a positive integer"
        );
        if m == 0 {
            return Err(Error::DivisionByZero("arcs"));
        }
        if let Some((arc, from, to)) =
            arcs(self.graph).find(|&(_, from, to)| !self.is_left[from] || self.is_left[to])
        {
            return Err(Error::NotBipartite { arc, from, to });
        }
        Ok(())
    }
}
