/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod arc_list_builder;
pub use arc_list_builder::ArcListBuilder;

mod bidi_csr_graph;
pub use bidi_csr_graph::BidiCsrGraph;

pub mod random;

pub mod prelude {
    pub use super::ArcListBuilder;
    pub use super::BidiCsrGraph;
}
