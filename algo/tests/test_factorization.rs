/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dsi_progress_logger::prelude::*;
use graphrec::graphs::BidiCsrGraph;
use graphrec::graphs::random::RandomBipartite;
use graphrec::traits::Graph;
use graphrec::utils::Granularity;
use graphrec_algo::Error;
use graphrec_algo::eval::holdout_rmse;
use graphrec_algo::factorization::{MatrixFactorization, RatingBounds};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Builds a complete bipartite graph whose ratings are the products of the
/// given left and right factors.
fn rank_one(left: &[f64], right: &[f64]) -> (BidiCsrGraph, Box<[f64]>, Box<[bool]>) {
    let l = left.len();
    let mut arcs = Vec::new();
    for (u, a) in left.iter().enumerate() {
        for (i, b) in right.iter().enumerate() {
            arcs.push((u, l + i, a * b));
        }
    }
    let (g, ratings) = BidiCsrGraph::from_labeled_arcs(l + right.len(), arcs);
    let is_left = (0..l + right.len()).map(|v| v < l).collect();
    (g, ratings, is_left)
}

#[test]
fn test_rank_one_convergence() -> Result<()> {
    let (g, ratings, is_left) = rank_one(&[1.2, 1.5, 2.0, 2.5], &[1.0, 1.2, 1.4, 1.6]);
    let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
    mf.vector_length(1)
        .learning_rate(0.08)
        .decay(1.0)
        .lambda(0.0)
        .max_steps(500);
    let rmse = mf.run()?;

    let history = mf.rmse_history();
    assert_eq!(history.len(), 500);
    assert!(rmse < 0.01, "RMSE {rmse}");
    assert!(rmse < history[0] / 10.0);
    // With a small constant rate the error never increases
    assert!(history.windows(2).all(|w| w[1] <= w[0] + 1e-12));
    // Each prediction is close to its rating
    assert!(holdout_rmse(mf.features(), &g, &ratings, RatingBounds::default())? < 0.01);
    Ok(())
}

#[test]
fn test_default_parameters_converge() -> Result<()> {
    for seed in 0..3 {
        let (g, is_left) = RandomBipartite::new(200, 100, 0.2, seed).graph();
        let mut rng = SmallRng::seed_from_u64(seed);
        let ratings = (0..g.num_arcs())
            .map(|_| rng.random_range(1..=5) as f64)
            .collect::<Vec<_>>();

        let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
        let rmse = mf.seed(seed).run()?;

        let history = mf.rmse_history();
        assert_eq!(
            history.len(),
            MatrixFactorization::<BidiCsrGraph>::DEFAULT_MAX_STEPS
        );
        assert!(rmse < history[0], "{} -> {rmse}", history[0]);
        // Uniform ratings in [1 . . 5] have standard deviation √2
        assert!(rmse < 1.5, "RMSE {rmse}");
        assert!(mf.features().as_slice().iter().all(|x| x.abs() < 10.0));
    }
    Ok(())
}

#[test]
fn test_regularization() -> Result<()> {
    let (g, ratings, is_left) = rank_one(&[1.2, 1.5, 2.0, 2.5], &[1.0, 1.2, 1.4, 1.6]);
    let train = |lambda: f64| -> Result<f64> {
        let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
        mf.vector_length(1)
            .learning_rate(0.08)
            .decay(1.0)
            .lambda(lambda)
            .max_steps(500);
        Ok(mf.run()?)
    };
    // Regularization trades training error for smaller vectors
    assert!(train(1.0)? > train(0.0)?);
    Ok(())
}

#[test]
fn test_untouched_nodes() -> Result<()> {
    // Node 2 is a right node with no arcs
    let (g, ratings) = BidiCsrGraph::from_labeled_arcs(3, [(0, 1, 3.0)]);
    let is_left = [true, false, false];

    let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
    mf.vector_length(4).max_steps(1);
    mf.run()?;
    let after = mf.features().row(2).to_vec();

    mf.max_steps(50);
    mf.run()?;
    assert_eq!(mf.features().row(2), after);
    assert!(after.iter().all(|x| (0.0..1.0).contains(x)));
    Ok(())
}

#[test]
fn test_determinism() -> Result<()> {
    let (g, is_left) = RandomBipartite::new(300, 200, 0.05, 0).graph();
    let mut rng = SmallRng::seed_from_u64(0);
    let ratings = (0..g.num_arcs())
        .map(|_| rng.random_range(1..=5) as f64)
        .collect::<Vec<_>>();

    let run = |threads: usize, seed: u64| -> Result<(Box<[f64]>, f64)> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?;
        pool.install(|| {
            let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
            mf.granularity(Granularity::Arcs(100))
                .seed(seed)
                .max_steps(20);
            let rmse = mf.run()?;
            Ok((mf.features().as_slice().into(), rmse))
        })
    };

    let (reference, rmse) = run(1, 0)?;
    assert!(rmse.is_finite());
    for threads in [2, 4, 7] {
        let (features, r) = run(threads, 0)?;
        assert_eq!(r.to_bits(), rmse.to_bits());
        assert_eq!(features, reference);
    }
    let (features, _) = run(4, 1)?;
    assert_ne!(features, reference);
    Ok(())
}

#[test]
fn test_errors() {
    let (g, ratings) = BidiCsrGraph::from_labeled_arcs(3, [(0, 1, 3.0), (0, 2, 4.0)]);
    let is_left = [true, false, false];

    let mut mf = MatrixFactorization::new(&g, &is_left[..2], &ratings);
    assert!(matches!(
        mf.run(),
        Err(Error::LengthMismatch {
            expected: 3,
            got: 2,
            ..
        })
    ));

    let mut mf = MatrixFactorization::new(&g, &is_left, &ratings[..1]);
    assert!(matches!(mf.run(), Err(Error::LengthMismatch { .. })));

    let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
    mf.vector_length(0);
    assert!(matches!(
        mf.run(),
        Err(Error::InvalidParameter {
            name: "vector_length",
            ..
        })
    ));

    let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
    mf.max_steps(0);
    assert!(matches!(mf.run(), Err(Error::InvalidParameter { .. })));

    let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
    mf.lambda(-1.0);
    assert!(matches!(mf.run(), Err(Error::InvalidParameter { .. })));

    // Node 1 is on the wrong side
    let is_left = [true, true, false];
    let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
    assert_eq!(
        mf.run(),
        Err(Error::NotBipartite {
            arc: 0,
            from: 0,
            to: 1
        })
    );

    let g = BidiCsrGraph::empty(2);
    let mut mf = MatrixFactorization::new(&g, &[true, false], &[]);
    assert_eq!(mf.run(), Err(Error::DivisionByZero("arcs")));
    assert!(mf.rmse_history().is_empty());
}

#[test]
fn test_with_logging() -> Result<()> {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Info)
        .try_init();
    let (g, ratings, is_left) = rank_one(&[1.0, 2.0], &[1.5, 2.0, 2.5]);
    let mut pl = progress_logger![item_name = "step"];
    let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
    mf.max_steps(5);
    let logged = mf.run_with_logging(&mut pl)?;
    assert_eq!(logged, mf.run()?);
    Ok(())
}

#[cfg_attr(feature = "slow_tests", test)]
#[cfg_attr(not(feature = "slow_tests"), allow(dead_code))]
fn test_large_thread_independence() -> Result<()> {
    let (g, is_left) = RandomBipartite::new(3000, 2000, 0.01, 7).graph();
    let ratings = (0..g.num_arcs())
        .map(|a| (a * 7 % 5 + 1) as f64)
        .collect::<Vec<_>>();
    let run = |threads: usize| -> Result<Box<[f64]>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?;
        pool.install(|| {
            let mut mf = MatrixFactorization::new(&g, &is_left, &ratings);
            mf.max_steps(30);
            mf.run()?;
            Ok(mf.into_features().as_slice().into())
        })
    };
    assert_eq!(run(1)?, run(16)?);
    Ok(())
}
