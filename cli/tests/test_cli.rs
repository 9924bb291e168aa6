/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
use graphrec_cli::recommend::{self, CliArgs};
use graphrec_cli::{FloatVectorFormat, GlobalArgs, cli_main};
use std::collections::HashMap;

#[test]
fn test_pagerank() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let arcs = dir.path().join("cycle.tsv");
    std::fs::write(&arcs, "# a directed 3-cycle\n0\t1\n1\t2\n2\t0\n")?;
    let output = dir.path().join("out").join("rank.json");

    cli_main([
        "graphrec",
        "rank",
        "pagerank",
        arcs.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--fmt",
        "json",
        "-j",
        "2",
    ])?;

    let rank: Vec<f64> = FloatVectorFormat::Json.load(&output)?;
    assert_eq!(rank.len(), 3);
    for r in rank {
        assert!((r - 1.0 / 3.0).abs() < 1E-9);
    }
    Ok(())
}

#[test]
fn test_articlerank_with_labels() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let arcs = dir.path().join("pair.csv");
    std::fs::write(&arcs, "source,target\nalice,bob\nbob,alice\n")?;
    let output = dir.path().join("rank.bin");

    cli_main([
        "graphrec",
        "rank",
        "ar",
        arcs.to_str().unwrap(),
        "--labels",
        "--separator",
        ",",
        "--lines-to-skip",
        "1",
        "-t",
        "1e-12",
        "-o",
        output.to_str().unwrap(),
        "--fmt",
        "java",
    ])?;

    // r = 0.15 + 0.85 · r / 2
    let rank: Vec<f64> = FloatVectorFormat::Java.load(&output)?;
    assert_eq!(rank.len(), 2);
    for r in rank {
        assert!((r - 0.15 / 0.575).abs() < 1E-9);
    }
    Ok(())
}

#[test]
fn test_recommend() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rows = Vec::new();
    for u in 0..20 {
        for i in 0..10 {
            if (u + i) % 3 != 0 {
                rows.push((format!("u{u}"), format!("i{i}"), (u * 3 + i * 7) % 5 + 1));
            }
        }
    }
    let mut content = String::from("user,item,rating,timestamp\n");
    for (ts, (user, item, rating)) in rows.iter().enumerate() {
        content.push_str(&format!("{user},{item},{rating},{ts}\n"));
    }
    let ratings = dir.path().join("ratings.csv");
    std::fs::write(&ratings, content)?;
    let features = dir.path().join("features.txt");

    let args = CliArgs::try_parse_from([
        "recommend",
        ratings.to_str().unwrap(),
        "-L",
        "4",
        "-k",
        "3",
        "-u",
        "u3",
        "-u",
        "nobody",
        "-f",
        features.to_str().unwrap(),
    ])?;
    let summary = recommend::run(GlobalArgs::default(), args)?;

    let num_train = (rows.len() as f64 * 0.8) as usize;
    assert_eq!(summary.num_train, num_train);
    assert!(summary.num_test > 0);
    assert!(summary.train_rmse.is_finite());
    assert!(summary.test_rmse.is_some_and(f64::is_finite));

    let stored: Vec<f64> = FloatVectorFormat::Ascii.load(&features)?;
    assert_eq!(stored.len(), summary.num_nodes * 4);

    // Only known users get recommendations
    assert_eq!(summary.recommendations.len(), 1);
    let rec = &summary.recommendations[0];
    assert_eq!(rec.user, "u3");
    let rated = rows[..num_train]
        .iter()
        .filter(|(u, _, _)| u == "u3")
        .map(|(_, i, r)| (i.as_str(), *r as f64))
        .collect::<HashMap<_, _>>();

    // The first list contains observed ratings
    assert_eq!(rec.top_rated.len(), 3);
    for (item, score) in &rec.top_rated {
        assert_eq!(rated.get(item.as_str()), Some(score));
    }
    let best = rated.values().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(rec.top_rated[0].1, best);
    assert!(rec.top_rated.windows(2).all(|w| w[0].1 >= w[1].1));

    // The second list contains predictions for unrated items only
    assert_eq!(rec.recommended.len(), 3);
    for (item, score) in &rec.recommended {
        assert!(!rated.contains_key(item.as_str()));
        assert!((1.0..=5.0).contains(score));
    }
    assert!(rec.recommended.windows(2).all(|w| w[0].1 >= w[1].1));
    Ok(())
}

#[test]
fn test_recommend_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ratings = dir.path().join("ratings.csv");
    std::fs::write(&ratings, "user,item,rating\n")?;
    let args = CliArgs::try_parse_from(["recommend", ratings.to_str().unwrap()])?;
    assert!(recommend::run(GlobalArgs::default(), args).is_err());

    std::fs::write(&ratings, "user,item,rating\na,b,3\n")?;
    let args = CliArgs::try_parse_from([
        "recommend",
        ratings.to_str().unwrap(),
        "--train-fraction",
        "1.5",
    ])?;
    assert!(recommend::run(GlobalArgs::default(), args).is_err());
    Ok(())
}
