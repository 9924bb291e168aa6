/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Utilities.

mod argmin;

/// Module containing mathematical utilities.
pub mod math {
    pub use super::argmin::*;
}
