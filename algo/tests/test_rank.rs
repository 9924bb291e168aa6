/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dsi_progress_logger::prelude::*;
use graphrec::graphs::BidiCsrGraph;
use graphrec::graphs::random::ErdosRenyi;
use graphrec::traits::Graph;
use graphrec::utils::Granularity;
use graphrec_algo::Error;
use graphrec_algo::rank::{Mode, RankPropagator, preds, propagate};
use predicates::prelude::*;
use std::cell::RefCell;

/// Returns the 𝓁-∞ distance (maximum absolute difference) between two vectors.
fn l_inf_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Computes ranks by scattering contributions along successors for a fixed
/// number of iterations.
fn power_method(graph: &BidiCsrGraph, damping: f64, mode: Mode, iterations: usize) -> Vec<f64> {
    let n = graph.num_nodes();
    let inv_n = 1.0 / n as f64;
    let avg = graph.num_arcs() as f64 / n as f64;
    let mut rank = vec![inv_n; n];

    for _ in 0..iterations {
        let mut sigma = vec![0.0; n];
        let mut dangling_rank = 0.0;
        for j in 0..n {
            let d = graph.outdegree(j);
            if d == 0 {
                dangling_rank += rank[j];
                continue;
            }
            let contrib = match mode {
                Mode::PageRank { .. } => rank[j] / d as f64,
                Mode::ArticleRank => rank[j] * avg / (avg + d as f64),
            };
            for (_, i) in graph.successors(j) {
                sigma[i] += contrib;
            }
        }
        rank = sigma
            .into_iter()
            .map(|s| match mode {
                Mode::PageRank { normalize } => {
                    let dangling = if normalize {
                        damping * dangling_rank * inv_n
                    } else {
                        0.0
                    };
                    (1.0 - damping) * inv_n + damping * s + dangling
                }
                Mode::ArticleRank => (1.0 - damping) + damping * s,
            })
            .collect();
    }

    rank
}

#[test]
fn test_empty() {
    let g = BidiCsrGraph::empty(0);
    let mut pr = RankPropagator::new(&g);
    assert_eq!(pr.run(preds::Tolerance::default()), Err(Error::EmptyGraph));
    assert!(pr.rank().is_empty());
}

#[test]
fn test_invalid_parameters() {
    let g = BidiCsrGraph::from_arcs(2, [(0, 1)]);
    for damping in [0.0, 1.0, -0.5, f64::NAN] {
        let mut pr = RankPropagator::new(&g);
        pr.damping(damping);
        assert!(matches!(
            pr.run(preds::Tolerance::default()),
            Err(Error::InvalidParameter {
                name: "damping",
                ..
            })
        ));
        assert_eq!(pr.iterations(), 0);
    }
    assert!(preds::Tolerance::try_from(0.0).is_err());
    assert!(preds::Tolerance::try_from(f64::NAN).is_err());
    assert!(preds::MaxIter::try_from(0).is_err());
    assert!(matches!(
        propagate(&g, 0.85, -1.0, 10, Mode::ArticleRank),
        Err(Error::InvalidParameter {
            name: "tolerance",
            ..
        })
    ));
    assert!(matches!(
        propagate(&g, 0.85, 1E-3, 0, Mode::ArticleRank),
        Err(Error::InvalidParameter {
            name: "max_iter",
            ..
        })
    ));
}

#[test]
fn test_two_cycle() -> Result<()> {
    let g = BidiCsrGraph::from_arcs(2, [(0, 1), (1, 0)]);
    let rank = propagate(&g, 0.85, 1E-3, 1000, Mode::PageRank { normalize: false })?;
    assert_eq!(rank[0], rank[1]);
    assert!((rank[0] - 0.5).abs() < 1E-3);
    Ok(())
}

#[test]
fn test_single_isolated_node() -> Result<()> {
    let g = BidiCsrGraph::empty(1);
    let mut pr = RankPropagator::new(&g);
    pr.run(preds::Tolerance::try_from(1E-3)?)?;
    assert_eq!(pr.iterations(), 1);
    assert!((pr.rank()[0] - 1.0).abs() < 1E-12);
    assert!(pr.diff() < 1E-12);
    Ok(())
}

#[test]
fn test_isolated_node_without_normalization() -> Result<()> {
    // 0 → 1 → 2, and 3 is isolated
    let g = BidiCsrGraph::from_arcs(4, [(0, 1), (1, 2)]);
    let rank = propagate(&g, 0.85, 1E-12, 1000, Mode::PageRank { normalize: false })?;
    assert!((rank[3] - 0.15 / 4.0).abs() < 1E-15);
    assert!((rank[0] - 0.15 / 4.0).abs() < 1E-15);
    assert!((rank[1] - (0.15 / 4.0) * 1.85).abs() < 1E-12);
    // Rank leaks out of dangling nodes
    assert!(rank.iter().sum::<f64>() < 1.0);
    Ok(())
}

#[test]
fn test_max_iter() -> Result<()> {
    let g = ErdosRenyi::new(100, 0.05, 0).graph();
    let mut pr = RankPropagator::new(&g);
    pr.run(
        preds::Tolerance::try_from(1E-300)?
            .or(preds::MaxIter::try_from(3)?)
            .boxed(),
    )?;
    // Not converged, but not an error
    assert_eq!(pr.iterations(), 3);
    assert!(pr.diff() > 0.0);
    assert_eq!(pr.rank().len(), 100);
    Ok(())
}

#[test]
fn test_diff_does_not_increase() -> Result<()> {
    let g = ErdosRenyi::new(1000, 0.005, 3).graph();
    for normalize in [true, false] {
        let damping = 0.85;
        let diffs = RefCell::new(Vec::new());
        let mut pr = RankPropagator::new(&g);
        pr.damping(damping).mode(Mode::PageRank { normalize });
        pr.run(
            predicate::function(|params: &preds::PredParams| {
                diffs.borrow_mut().push(params.diff);
                false
            })
            .or(preds::MaxIter::try_from(60)?),
        )?;
        let diffs = diffs.into_inner();
        assert_eq!(diffs.len(), 60);
        assert_eq!(diffs.last(), Some(&pr.diff()));
        // The update is a contraction of factor `damping` in the ℓ₁ norm
        for w in diffs[1..].windows(2) {
            assert!(w[1] <= w[0] + 1E-12, "{normalize}: {} > {}", w[1], w[0]);
            assert!(w[1] <= damping * w[0] + 1E-12);
        }
    }
    Ok(())
}

#[test]
fn test_erdos_renyi_vs_power_method() -> Result<()> {
    for &(n, p, seed) in &[(10, 0.3, 0u64), (100, 0.05, 1), (1000, 0.005, 2)] {
        let g = ErdosRenyi::new(n, p, seed).graph();
        for mode in [
            Mode::PageRank { normalize: true },
            Mode::PageRank { normalize: false },
            Mode::ArticleRank,
        ] {
            for damping in [0.25, 0.5, 0.85] {
                let expected = power_method(&g, damping, mode, 500);
                let mut pr = RankPropagator::new(&g);
                pr.damping(damping).mode(mode);
                pr.run(
                    preds::Tolerance::try_from(1E-11)?.or(preds::MaxIter::try_from(10_000)?),
                )?;
                assert!(
                    l_inf_distance(&expected, pr.rank()) < 1E-9,
                    "{mode} n={n} damping={damping}: L∞={}",
                    l_inf_distance(&expected, pr.rank())
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_finite_and_nonnegative() -> Result<()> {
    for seed in 0..10 {
        let g = ErdosRenyi::new(200, 0.02, seed).graph();
        for mode in [Mode::PageRank { normalize: true }, Mode::ArticleRank] {
            let rank = propagate(&g, 0.85, 1E-6, 1000, mode)?;
            assert!(rank.iter().all(|&r| r.is_finite() && r >= 0.0));
        }
    }
    Ok(())
}

#[test]
fn test_normalized_is_stochastic() -> Result<()> {
    // Many dangling nodes
    let g = ErdosRenyi::new(500, 0.002, 3).graph();
    let rank = propagate(&g, 0.85, 1E-10, 1000, Mode::PageRank { normalize: true })?;
    assert!((rank.iter().sum::<f64>() - 1.0).abs() < 1E-9);
    Ok(())
}

#[test]
fn test_article_rank_without_arcs() -> Result<()> {
    let g = BidiCsrGraph::empty(3);
    let rank = propagate(&g, 0.85, 1E-3, 1000, Mode::ArticleRank)?;
    for r in rank.iter() {
        assert!((r - 0.15).abs() < 1E-12);
    }
    Ok(())
}

#[test]
fn test_thread_independence() -> Result<()> {
    let g = ErdosRenyi::new(2000, 0.005, 4).graph();
    for mode in [Mode::PageRank { normalize: true }, Mode::ArticleRank] {
        let run = |threads: usize| -> Result<(Box<[f64]>, usize)> {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?;
            pool.install(|| {
                let mut pr = RankPropagator::new(&g);
                pr.mode(mode).granularity(Granularity::Nodes(17));
                pr.run(preds::Tolerance::try_from(1E-9)?)?;
                let iterations = pr.iterations();
                Ok((pr.into_rank(), iterations))
            })
        };
        let (reference, iterations) = run(1)?;
        for threads in [2, 3, 8] {
            let (rank, i) = run(threads)?;
            assert_eq!(i, iterations);
            assert!(
                rank.iter()
                    .zip(reference.iter())
                    .all(|(a, b)| a.to_bits() == b.to_bits())
            );
        }
    }
    Ok(())
}

#[test]
fn test_with_logging() -> Result<()> {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Info)
        .try_init();
    let g = ErdosRenyi::new(100, 0.05, 5).graph();
    let mut pl = progress_logger![item_name = "iteration"];
    let mut pr = RankPropagator::new(&g);
    pr.run_with_logging(preds::Tolerance::default(), &mut pl)?;
    let rank = propagate(&g, 0.85, 1E-3, 1000, Mode::default())?;
    assert_eq!(pr.rank(), &*rank);
    Ok(())
}
