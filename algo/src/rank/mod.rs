/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Damped fixed-point rank propagation.

pub mod propagator;
pub use propagator::{Mode, RankPropagator, preds, propagate};
