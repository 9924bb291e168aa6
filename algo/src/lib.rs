/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

mod error;
pub use error::Error;

pub mod eval;
pub mod factorization;
pub mod rank;
pub mod recommend;
pub mod topk;
pub mod utils;

pub mod prelude {
    pub use crate::Error;
    pub use crate::eval::{holdout_rmse, rmse};
    pub use crate::factorization::{FeatureVectors, MatrixFactorization, RatingBounds};
    pub use crate::rank::{Mode, RankPropagator, preds, propagate};
    pub use crate::recommend::{Recommendation, Recommender};
    pub use crate::topk::{ScoreTuple, TopK};
}
