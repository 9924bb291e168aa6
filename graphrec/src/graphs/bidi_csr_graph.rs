/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::Graph;
use std::iter::{Copied, Zip};
use std::ops::Range;
use std::slice::Iter;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// An immutable compressed sparse-row graph storing both directions.
///
/// The forward direction is a classical CSR: the degree-cumulative function
/// (DCF) `dcf` has `n` + 1 entries, and the targets of the arcs leaving node
/// `x` are `succ[dcf[x]..dcf[x + 1]]`. The position of an arc in `succ` is
/// its _identifier_.
///
/// The backward direction stores, for each node, the sources of the arcs
/// entering the node, together with their identifiers, in increasing order of
/// identifier (and thus of source).
///
/// Parallel arcs and loops are allowed, and they are counted in degrees.
pub struct BidiCsrGraph {
    dcf: Box<[usize]>,
    succ: Box<[usize]>,
    pred_dcf: Box<[usize]>,
    pred: Box<[usize]>,
    pred_arc: Box<[usize]>,
}

impl core::default::Default for BidiCsrGraph {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl BidiCsrGraph {
    /// Creates a graph with `n` nodes and no arcs.
    pub fn empty(n: usize) -> Self {
        Self {
            dcf: vec![0; n + 1].into(),
            succ: Box::default(),
            pred_dcf: vec![0; n + 1].into(),
            pred: Box::default(),
            pred_arc: Box::default(),
        }
    }

    /// Creates a graph with `n` nodes from an [`IntoIterator`] of pairs
    /// `(source, target)`.
    ///
    /// Arcs leaving the same node keep their relative order; hence, arc
    /// identifiers are assigned in order of source and then in order of
    /// appearance.
    ///
    /// # Panics
    ///
    /// If a node is greater than or equal to `n`.
    pub fn from_arcs(n: usize, arcs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self::from_labeled_arcs(n, arcs.into_iter().map(|(u, v)| (u, v, ()))).0
    }

    /// Creates a graph with `n` nodes from an [`IntoIterator`] of triples
    /// `(source, target, label)`, returning also the labels indexed by arc
    /// identifier.
    ///
    /// # Panics
    ///
    /// If a node is greater than or equal to `n`.
    pub fn from_labeled_arcs<L>(
        n: usize,
        arcs: impl IntoIterator<Item = (usize, usize, L)>,
    ) -> (Self, Box<[L]>) {
        let arcs = arcs.into_iter().collect::<Vec<_>>();
        let m = arcs.len();

        let mut dcf = vec![0; n + 1];
        let mut pred_dcf = vec![0; n + 1];
        for &(u, v, _) in &arcs {
            let max = u.max(v);
            if max >= n {
                panic!("Node {} does not exist (the graph has {} nodes)", max, n);
            }
            dcf[u + 1] += 1;
            pred_dcf[v + 1] += 1;
        }
        for x in 0..n {
            dcf[x + 1] += dcf[x];
            pred_dcf[x + 1] += pred_dcf[x];
        }

        // Stable counting sort by source
        let mut pos = dcf[..n].to_vec();
        let mut slots: Vec<Option<(usize, L)>> = (0..m).map(|_| None).collect();
        for (u, v, label) in arcs {
            slots[pos[u]] = Some((v, label));
            pos[u] += 1;
        }
        let mut succ = Vec::with_capacity(m);
        let mut labels = Vec::with_capacity(m);
        for (v, label) in slots.into_iter().flatten() {
            succ.push(v);
            labels.push(label);
        }

        // Arcs are scanned in identifier order, so predecessor lists come out
        // sorted by identifier.
        let mut pred_pos = pred_dcf[..n].to_vec();
        let mut pred = vec![0; m];
        let mut pred_arc = vec![0; m];
        for u in 0..n {
            for arc in dcf[u]..dcf[u + 1] {
                let v = succ[arc];
                pred[pred_pos[v]] = u;
                pred_arc[pred_pos[v]] = arc;
                pred_pos[v] += 1;
            }
        }

        (
            Self {
                dcf: dcf.into(),
                succ: succ.into(),
                pred_dcf: pred_dcf.into(),
                pred: pred.into(),
                pred_arc: pred_arc.into(),
            },
            labels.into(),
        )
    }

    /// Returns the source and the target of an arc.
    ///
    /// # Panics
    ///
    /// If `arc` is not smaller than the number of arcs.
    pub fn arc(&self, arc: usize) -> (usize, usize) {
        let target = self.succ[arc];
        // The first node whose DCF entry is greater than `arc`, minus one.
        let source = self.dcf.partition_point(|&d| d <= arc) - 1;
        (source, target)
    }

    /// Returns true if there is at least one arc from `source` to `target`.
    pub fn has_arc(&self, source: usize, target: usize) -> bool {
        self.succ[self.dcf[source]..self.dcf[source + 1]].contains(&target)
    }

    /// Returns the transpose of this graph.
    ///
    /// Arc identifiers are not preserved.
    pub fn transpose(&self) -> Self {
        Self::from_arcs(
            self.num_nodes(),
            crate::traits::arcs(self).map(|(_, u, v)| (v, u)),
        )
    }
}

impl Graph for BidiCsrGraph {
    type Successors<'a> = Zip<Range<usize>, Copied<Iter<'a, usize>>>;
    type Predecessors<'a> = Zip<Copied<Iter<'a, usize>>, Copied<Iter<'a, usize>>>;

    #[inline(always)]
    fn num_nodes(&self) -> usize {
        self.dcf.len() - 1
    }

    #[inline(always)]
    fn num_arcs(&self) -> usize {
        self.succ.len()
    }

    #[inline(always)]
    fn outdegree(&self, node: usize) -> usize {
        self.dcf[node + 1] - self.dcf[node]
    }

    #[inline(always)]
    fn indegree(&self, node: usize) -> usize {
        self.pred_dcf[node + 1] - self.pred_dcf[node]
    }

    #[inline(always)]
    fn successors(&self, node: usize) -> Self::Successors<'_> {
        let range = self.dcf[node]..self.dcf[node + 1];
        range.clone().zip(self.succ[range].iter().copied())
    }

    #[inline(always)]
    fn predecessors(&self, node: usize) -> Self::Predecessors<'_> {
        let range = self.pred_dcf[node]..self.pred_dcf[node + 1];
        self.pred_arc[range.clone()]
            .iter()
            .copied()
            .zip(self.pred[range].iter().copied())
    }
}
