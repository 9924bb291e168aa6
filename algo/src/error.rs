/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use thiserror::Error;

/// Errors returned by the algorithms of this crate.
///
/// All errors are detected before any work begins, and none of them is
/// transient. Note that failing to converge within the maximum number of
/// iterations is _not_ an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The graph has no nodes.
    #[error("The graph has no nodes")]
    EmptyGraph,
    /// A mean over an empty set (e.g., of arcs) was requested.
    #[error("Division by zero: there are no {0}")]
    DivisionByZero(&'static str),
    /// A parameter is out of range.
    #[error("Invalid value for parameter {name}: got {value}, expected {expected}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// A property has a length that does not match the graph.
    #[error("The {what} have length {got}, but {expected} were expected")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// An arc does not go from the left side to the right side.
    #[error("Arc {arc} ({from} -> {to}) does not go from the left to the right side")]
    NotBipartite { arc: usize, from: usize, to: usize },
}

impl Error {
    pub(crate) fn invalid(
        name: &'static str,
        value: impl std::fmt::Display,
        expected: &'static str,
    ) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            expected,
        }
    }
}

/// Fails with [`Error::InvalidParameter`] unless the condition holds.
macro_rules! ensure_param {
    ($cond:expr, $name:literal, $value:expr, $expected:literal) => {
        if !($cond) {
            return Err($crate::Error::invalid($name, $value, $expected));
        }
    };
}
pub(crate) use ensure_param;
