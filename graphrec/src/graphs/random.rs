/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Seeded random graphs.

use super::BidiCsrGraph;
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Erdös-Rényi random directed graphs.
///
/// The model is parameterized by the number of nodes `n` and the probability
/// `p` of an arc between any two distinct nodes. Loops are never included.
/// Generation is quadratic in `n`.
#[derive(Debug, Clone)]
pub struct ErdosRenyi {
    n: usize,
    p: f64,
    seed: u64,
}

impl ErdosRenyi {
    /// Creates a new Erdös-Rényi random graph, given the number of nodes, the
    /// probability of an arc between any two nodes, and a seed for the
    /// [pseudorandom number generator](SmallRng).
    pub fn new(n: usize, p: f64, seed: u64) -> Self {
        assert!((0.0..=1.0).contains(&p), "p must be in [0..1]");
        Self { n, p, seed }
    }

    /// Generates the graph.
    pub fn graph(&self) -> BidiCsrGraph {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut arcs = Vec::new();
        for x in 0..self.n {
            for y in 0..self.n {
                if y != x && rng.random_bool(self.p) {
                    arcs.push((x, y));
                }
            }
        }
        BidiCsrGraph::from_arcs(self.n, arcs)
    }
}

/// Random bipartite graphs with arcs from left to right.
///
/// Left nodes are `0..left`, right nodes are `left..left + right`; each
/// left-right pair is connected with probability `p`.
#[derive(Debug, Clone)]
pub struct RandomBipartite {
    left: usize,
    right: usize,
    p: f64,
    seed: u64,
}

impl RandomBipartite {
    /// Creates a new random bipartite graph, given the size of the two sides,
    /// the probability of an arc, and a seed for the [pseudorandom number
    /// generator](SmallRng).
    pub fn new(left: usize, right: usize, p: f64, seed: u64) -> Self {
        assert!((0.0..=1.0).contains(&p), "p must be in [0..1]");
        Self {
            left,
            right,
            p,
            seed,
        }
    }

    /// Generates the graph, returning also the bipartition flags.
    pub fn graph(&self) -> (BidiCsrGraph, Box<[bool]>) {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let n = self.left + self.right;
        let mut arcs = Vec::new();
        for x in 0..self.left {
            for y in self.left..n {
                if rng.random_bool(self.p) {
                    arcs.push((x, y));
                }
            }
        }
        let is_left = (0..n).map(|x| x < self.left).collect();
        (BidiCsrGraph::from_arcs(n, arcs), is_left)
    }
}
