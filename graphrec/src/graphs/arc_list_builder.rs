/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::BidiCsrGraph;
use std::collections::HashMap;
use std::hash::Hash;

/// Accumulates labeled arcs between nodes identified by external keys and
/// builds a [`BidiCsrGraph`].
///
/// Keys are mapped to dense node identifiers in order of first appearance;
/// [`node`](Self::node) makes it possible to register isolated nodes or to
/// fix the numbering in advance.
///
/// # Examples
///
/// ```
/// use graphrec::prelude::*;
///
/// let mut builder = ArcListBuilder::new();
/// builder.add_arc("alice", "dune", 4.0);
/// builder.add_arc("bob", "dune", 2.0);
/// let (g, ratings, keys) = builder.build();
///
/// assert_eq!(g.num_nodes(), 3);
/// assert_eq!(keys, vec!["alice", "dune", "bob"]);
/// assert_eq!(&*ratings, &[4.0, 2.0]);
/// ```
#[derive(Debug, Clone)]
pub struct ArcListBuilder<K, L> {
    ids: HashMap<K, usize>,
    keys: Vec<K>,
    arcs: Vec<(usize, usize, L)>,
}

impl<K: Hash + Eq + Clone, L> core::default::Default for ArcListBuilder<K, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, L> ArcListBuilder<K, L> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            keys: Vec::new(),
            arcs: Vec::new(),
        }
    }

    /// Returns the identifier of the node with the given key, adding the node
    /// if necessary.
    pub fn node(&mut self, key: K) -> usize {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.keys.len();
        self.ids.insert(key.clone(), id);
        self.keys.push(key);
        id
    }

    /// Returns the identifier of the node with the given key, if any.
    pub fn get(&self, key: &K) -> Option<usize> {
        self.ids.get(key).copied()
    }

    /// Adds a labeled arc, adding its endpoints if necessary.
    pub fn add_arc(&mut self, source: K, target: K, label: L) -> &mut Self {
        let u = self.node(source);
        let v = self.node(target);
        self.arcs.push((u, v, label));
        self
    }

    /// Returns the number of nodes added so far.
    pub fn num_nodes(&self) -> usize {
        self.keys.len()
    }

    /// Returns the number of arcs added so far.
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// Builds the graph, returning also the labels indexed by arc identifier
    /// and the keys indexed by node identifier.
    pub fn build(self) -> (BidiCsrGraph, Box<[L]>, Vec<K>) {
        log::debug!(
            "Building a graph with {} nodes and {} arcs",
            self.keys.len(),
            self.arcs.len()
        );
        let (graph, labels) = BidiCsrGraph::from_labeled_arcs(self.keys.len(), self.arcs);
        (graph, labels, self.keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Graph;

    #[test]
    fn test_node_numbering() {
        let mut builder = ArcListBuilder::<u64, f64>::new();
        assert_eq!(builder.node(10), 0);
        assert_eq!(builder.node(5), 1);
        assert_eq!(builder.node(10), 0);
        builder.add_arc(5, 7, 1.5).add_arc(10, 7, 2.5);
        assert_eq!(builder.get(&7), Some(2));
        assert_eq!(builder.get(&8), None);
        assert_eq!(builder.num_arcs(), 2);

        let (g, labels, keys) = builder.build();
        assert_eq!(keys, vec![10, 5, 7]);
        assert_eq!(g.num_nodes(), 3);
        // Arc identifiers follow the source order
        assert_eq!(&*labels, &[2.5, 1.5]);
        assert_eq!(g.indegree(2), 2);
    }
}
