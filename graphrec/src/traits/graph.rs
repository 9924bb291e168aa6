/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Basic trait to access graphs in random-access fashion in both directions.

A [`Graph`] has nodes `0..n` and arcs `0..m`. Each arc has an _identifier_
that is stable for the lifetime of the graph, so that per-arc properties
(e.g., ratings) can be stored in a plain slice of length
[`num_arcs`](Graph::num_arcs) and indexed by the identifiers returned by
[`successors`](Graph::successors) and [`predecessors`](Graph::predecessors).

Iteration over the successors and the predecessors of a node always follows
the same order, so that sums accumulated over incident arcs are
reproducible.

*/

/// A graph providing random access to successors and predecessors.
///
/// Both [`successors`](Graph::successors) and
/// [`predecessors`](Graph::predecessors) return pairs `(arc, node)`, where
/// `arc` is the identifier of the arc and `node` is the other endpoint.
pub trait Graph {
    /// The type of the iterator over the successors of a node.
    type Successors<'a>: Iterator<Item = (usize, usize)>
    where
        Self: 'a;

    /// The type of the iterator over the predecessors of a node.
    type Predecessors<'a>: Iterator<Item = (usize, usize)>
    where
        Self: 'a;

    /// Returns the number of nodes.
    fn num_nodes(&self) -> usize;

    /// Returns the number of arcs.
    fn num_arcs(&self) -> usize;

    /// Returns the number of arcs leaving `node`.
    fn outdegree(&self, node: usize) -> usize;

    /// Returns the number of arcs entering `node`.
    fn indegree(&self, node: usize) -> usize;

    /// Returns the arcs leaving `node` as pairs `(arc, target)`.
    fn successors(&self, node: usize) -> Self::Successors<'_>;

    /// Returns the arcs entering `node` as pairs `(arc, source)`.
    fn predecessors(&self, node: usize) -> Self::Predecessors<'_>;

    /// Returns the average outdegree, or zero if the graph has no nodes.
    fn avg_outdegree(&self) -> f64 {
        let n = self.num_nodes();
        if n == 0 {
            0.0
        } else {
            self.num_arcs() as f64 / n as f64
        }
    }
}

impl<G: Graph + ?Sized> Graph for &G {
    type Successors<'a>
        = G::Successors<'a>
    where
        Self: 'a;

    type Predecessors<'a>
        = G::Predecessors<'a>
    where
        Self: 'a;

    #[inline(always)]
    fn num_nodes(&self) -> usize {
        (**self).num_nodes()
    }

    #[inline(always)]
    fn num_arcs(&self) -> usize {
        (**self).num_arcs()
    }

    #[inline(always)]
    fn outdegree(&self, node: usize) -> usize {
        (**self).outdegree(node)
    }

    #[inline(always)]
    fn indegree(&self, node: usize) -> usize {
        (**self).indegree(node)
    }

    #[inline(always)]
    fn successors(&self, node: usize) -> Self::Successors<'_> {
        (**self).successors(node)
    }

    #[inline(always)]
    fn predecessors(&self, node: usize) -> Self::Predecessors<'_> {
        (**self).predecessors(node)
    }
}

/// Returns an iterator over all arcs of a graph as triples
/// `(arc, source, target)`, in order of source.
pub fn arcs<G: Graph>(graph: &G) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
    (0..graph.num_nodes()).flat_map(move |source| {
        graph
            .successors(source)
            .map(move |(arc, target)| (arc, source, target))
    })
}
