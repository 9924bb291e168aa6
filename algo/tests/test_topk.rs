/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use graphrec_algo::topk::{ScoreTuple, TopK};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

fn min_score<A>(top: &TopK<usize, A>) -> f64 {
    top.snapshot()
        .iter()
        .map(|(_, t)| t.score)
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn test_random_offers() {
    let mut rng = SmallRng::seed_from_u64(0);
    for k in [1, 2, 5, 20] {
        let mut top = TopK::new(k);
        // Id -> first score offered
        let mut first = HashMap::new();
        for _ in 0..2000 {
            let id = rng.random_range(0..300);
            // Few distinct scores, to have ties
            let score = rng.random_range(0..50) as f64 / 10.0;
            let floor = top.floor();
            let full = top.len() == k;
            let held = top.contains(id);
            let accepted = top.offer(id, ScoreTuple::new(score, score));
            first.entry(id).or_insert(score);

            assert!(top.len() <= k);
            if full && score <= floor {
                assert!(!accepted);
            }
            if held {
                assert!(!accepted);
            }
            if top.len() == k {
                assert_eq!(top.floor(), min_score(&top));
                // The floor never decreases
                assert!(top.floor() >= floor);
            } else {
                assert_eq!(top.floor(), f64::NEG_INFINITY);
            }
        }
        // Every candidate outside the selection is not better than the floor
        let floor = top.floor();
        for (id, score) in first {
            if !top.contains(id) {
                assert!(score <= floor || top.len() < k);
            }
        }
    }
}

#[test]
fn test_sorted() {
    let mut top = TopK::new(4);
    for (id, score) in [(4, 1.0), (1, 3.0), (3, 3.0), (2, 0.5), (0, 2.0)] {
        top.offer(id, ScoreTuple::with_aux(score, score, id * 10));
    }
    let sorted = top.into_sorted_vec();
    let ids: Vec<_> = sorted.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, [1, 3, 0, 4]);
    assert!(sorted.iter().all(|(id, t)| t.aux == id * 10));
}

#[test]
fn test_ties_at_the_floor() {
    let mut top = TopK::new(2);
    assert!(top.offer(7, ScoreTuple::new(1.0, 1.0)));
    assert!(top.offer(3, ScoreTuple::new(1.0, 1.0)));
    // Equal to the floor: rejected
    assert!(!top.offer(1, ScoreTuple::new(1.0, 1.0)));
    assert!(top.offer(5, ScoreTuple::new(1.5, 1.5)));
    assert!(top.contains(3));
    assert!(!top.contains(7));
}
