/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::utils::merge_partials;
use kahan::KahanSum;
use rayon::prelude::*;

/// A read-only view on the current values of a [`DoubleBuffer`].
///
/// Values are stored by row: each node has `width` consecutive values.
#[derive(Debug, Clone, Copy)]
pub struct Rows<'a> {
    width: usize,
    data: &'a [f64],
}

impl<'a> Rows<'a> {
    /// Returns the values of `node`.
    #[inline(always)]
    pub fn row(&self, node: usize) -> &'a [f64] {
        &self.data[node * self.width..(node + 1) * self.width]
    }

    /// Returns the (only) value of `node`.
    ///
    /// # Panics
    ///
    /// In debug mode, if the width is not one.
    #[inline(always)]
    pub fn value(&self, node: usize) -> f64 {
        debug_assert_eq!(self.width, 1);
        self.data[node]
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.data.len() / self.width
    }

    /// Returns the underlying flat slice.
    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }
}

/// A per-node property of fixed-width float rows with deferred writes.
///
/// The property has a _current_ buffer, which is readable, and a _next_
/// buffer, which is written by [`par_update`](Self::par_update). Writes
/// become visible only after [`swap`](Self::swap), so that during a superstep
/// every node sees the values of the previous superstep only (Jacobi
/// semantics).
///
/// # Examples
///
/// ```
/// use graphrec::props::DoubleBuffer;
///
/// let mut buffer = DoubleBuffer::new(4, 1);
/// buffer.fill(1.0);
/// // Each node takes the value of the previous node, plus one
/// let delta = buffer.par_update(2, |node, current, next| {
///     next[0] = current.value(node.saturating_sub(1)) + 1.0;
///     next[0] - current.value(node)
/// });
/// buffer.swap();
/// assert_eq!(delta, 4.0);
/// assert_eq!(buffer.current(), &[2.0, 2.0, 2.0, 2.0]);
/// ```
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    width: usize,
    current: Box<[f64]>,
    next: Box<[f64]>,
}

impl DoubleBuffer {
    /// Creates a zero-filled property with `num_nodes` rows of `width` values.
    ///
    /// # Panics
    ///
    /// If `width` is zero.
    pub fn new(num_nodes: usize, width: usize) -> Self {
        assert!(width > 0, "The width must be positive");
        Self {
            width,
            current: vec![0.0; num_nodes * width].into(),
            next: vec![0.0; num_nodes * width].into(),
        }
    }

    /// Returns the number of values per node.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.current.len() / self.width
    }

    /// Returns the current values as a flat slice.
    pub fn current(&self) -> &[f64] {
        &self.current
    }

    /// Returns a view on the current values.
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            width: self.width,
            data: &self.current,
        }
    }

    /// Returns the current values of `node`.
    pub fn row(&self, node: usize) -> &[f64] {
        &self.current[node * self.width..(node + 1) * self.width]
    }

    /// Sets all values in both buffers.
    pub fn fill(&mut self, value: f64) {
        self.current.fill(value);
        self.next.fill(value);
    }

    /// Initializes the rows of both buffers sequentially, in increasing order
    /// of node.
    pub fn init_rows(&mut self, mut init: impl FnMut(usize, &mut [f64])) {
        for (node, row) in self.current.chunks_mut(self.width).enumerate() {
            init(node, row);
        }
        self.next.copy_from_slice(&self.current);
    }

    /// Runs a superstep.
    ///
    /// Nodes are split into chunks of `node_granularity` consecutive nodes,
    /// and chunks are processed in parallel. For each node, `update` receives
    /// the node, a view on the current values and the row of the node in the
    /// next buffer, which it must fill; it returns a contribution to a
    /// reduction.
    ///
    /// Contributions are summed with Kahan summation within each chunk, and
    /// chunk sums are combined in chunk order: the result does not depend on
    /// the number of threads.
    ///
    /// The next buffer is not visible until [`swap`](Self::swap) is called.
    pub fn par_update<F>(&mut self, node_granularity: usize, update: F) -> f64
    where
        F: Fn(usize, Rows<'_>, &mut [f64]) -> f64 + Sync,
    {
        let width = self.width;
        let node_granularity = node_granularity.max(1);
        let rows = Rows {
            width,
            data: &self.current,
        };
        let partials: Vec<f64> = self
            .next
            .par_chunks_mut(node_granularity * width)
            .enumerate()
            .map(|(chunk, next)| {
                let first = chunk * node_granularity;
                let mut partial = KahanSum::<f64>::new();
                for (i, row) in next.chunks_mut(width).enumerate() {
                    partial += update(first + i, rows, row);
                }
                partial.sum()
            })
            .collect();

        merge_partials(partials)
    }

    /// Makes the values written by the last superstep current.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Consumes the property, returning the current values.
    pub fn into_current(self) -> Box<[f64]> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_rows() {
        let mut buffer = DoubleBuffer::new(3, 2);
        buffer.init_rows(|node, row| row.fill(node as f64));
        assert_eq!(buffer.num_nodes(), 3);
        assert_eq!(buffer.row(2), &[2.0, 2.0]);
        // The next buffer is a copy of the current one
        buffer.swap();
        assert_eq!(buffer.current(), &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_jacobi() {
        // A rotation: no node may see a value written in the same superstep
        let mut buffer = DoubleBuffer::new(5, 1);
        buffer.init_rows(|node, row| row[0] = node as f64);
        for _ in 0..5 {
            buffer.par_update(1, |node, current, next| {
                next[0] = current.value((node + 1) % 5);
                0.0
            });
            buffer.swap();
        }
        assert_eq!(buffer.current(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_thread_independence() {
        let n = 10_000;
        let values = (0..n).map(|x| 1.0 / (x as f64 + 1.0)).collect::<Vec<_>>();
        let run = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            let mut buffer = DoubleBuffer::new(n, 1);
            buffer.init_rows(|node, row| row[0] = values[node]);
            pool.install(|| {
                buffer.par_update(37, |node, current, next| {
                    next[0] = current.value(node) * 3.0;
                    next[0]
                })
            })
        };
        let reference = run(1);
        for threads in [2, 3, 8] {
            assert_eq!(run(threads).to_bits(), reference.to_bits());
        }
    }

    #[test]
    fn test_empty() {
        let mut buffer = DoubleBuffer::new(0, 3);
        assert_eq!(buffer.par_update(10, |_, _, _| 1.0), 0.0);
        assert!(buffer.into_current().is_empty());
    }
}
