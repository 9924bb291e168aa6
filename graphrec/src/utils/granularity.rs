/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Granularity of parallel tasks, specified transparently by nodes or arcs.
///
/// Supersteps (see [`DoubleBuffer::par_update`](crate::props::DoubleBuffer::par_update))
/// split the nodes of a graph into chunks of consecutive nodes, and each
/// chunk is a Rayon task. Some computations are naturally sized by nodes,
/// others (e.g., gradient accumulation over incident arcs) by arcs: this enum
/// makes it possible to specify the size of a task in both ways. Conversion
/// is done by [`node_granularity`](Self::node_granularity).
///
/// Since partial sums are merged in chunk order, results depend on the
/// granularity but not on the number of threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Node granularity: each task will be formed by the specified number of
    /// nodes.
    Nodes(usize),
    /// Arc granularity: each task will be formed by a number of nodes equal
    /// to the specified number of arcs divided by the average outdegree.
    Arcs(u64),
}

impl core::default::Default for Granularity {
    /// Returns a default granularity of 1000 nodes.
    fn default() -> Self {
        Self::Nodes(1000)
    }
}

impl Granularity {
    /// Returns a node granularity for a given number of nodes and arcs.
    ///
    /// For the variant [`Nodes`](Self::Nodes), the specified number of nodes is
    /// returned. For the variant [`Arcs`](Self::Arcs), the number of nodes is
    /// computed as the specified number of arcs divided by the average
    /// outdegree. The result is always at least one.
    pub fn node_granularity(&self, num_nodes: usize, num_arcs: usize) -> usize {
        match self {
            Self::Nodes(n) => (*n).max(1),
            Self::Arcs(n) => {
                let average_degree = num_arcs as f64 / num_nodes.max(1) as f64;
                if average_degree == 0.0 {
                    return num_nodes.max(1);
                }
                (*n as f64 / average_degree)
                    .min(usize::MAX as f64)
                    .ceil()
                    .max(1.0) as usize
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_granularity() {
        assert_eq!(Granularity::default().node_granularity(10, 0), 1000);
        assert_eq!(Granularity::Nodes(0).node_granularity(10, 10), 1);
        assert_eq!(Granularity::Arcs(100).node_granularity(10, 50), 20);
        assert_eq!(Granularity::Arcs(1).node_granularity(10, 50), 1);
        assert_eq!(Granularity::Arcs(100).node_granularity(10, 0), 10);
    }
}
