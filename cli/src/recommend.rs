/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::{FloatVectorFormat, GlobalArgs, GranularityArgs, NumThreadsArg};
use anyhow::{Context, Result, ensure};
use clap::Parser;
use dsi_progress_logger::prelude::*;
use graphrec::graphs::{ArcListBuilder, BidiCsrGraph};
use graphrec::traits::Graph;
use graphrec_algo::eval::holdout_rmse;
use graphrec_algo::factorization::{MatrixFactorization, RatingBounds};
use graphrec_algo::recommend::{Recommendation, Recommender};
use graphrec_algo::topk::{ScoreTuple, TopK};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

type Mf<'a> = MatrixFactorization<'a, BidiCsrGraph>;

#[derive(Parser, Debug)]
#[command(
    name = "recommend",
    about = "Train latent feature vectors on a rating file and recommend items to users.",
    long_about = "Reads a file of ratings, one rating per line in the form user, item, rating and an optional timestamp, which is ignored. The first rows are used for training and the remaining ones for testing; test ratings of users or items that do not appear in the training rows are skipped."
)]
pub struct CliArgs {
    /// The rating file.
    pub ratings: PathBuf,

    #[arg(long, default_value_t = ',')]
    /// The column separator.
    pub separator: char,

    #[arg(long, default_value_t = 1)]
    /// How many lines to skip, ignoring comment lines.
    pub lines_to_skip: usize,

    #[arg(long, default_value_t = '#')]
    /// Ignore lines that start with this symbol.
    pub line_comment_symbol: char,

    #[arg(long, default_value_t = 0.8)]
    /// The fraction of rows, in file order, used for training.
    pub train_fraction: f64,

    #[arg(short = 'L', long, default_value_t = Mf::DEFAULT_VECTOR_LENGTH)]
    /// The length of the feature vectors.
    pub vector_length: usize,

    #[arg(short, long, default_value_t = Mf::DEFAULT_LEARNING_RATE)]
    /// The initial learning rate.
    pub learning_rate: f64,

    #[arg(long, default_value_t = Mf::DEFAULT_DECAY)]
    /// The factor multiplying the learning rate after each step.
    pub decay: f64,

    #[arg(long, default_value_t = Mf::DEFAULT_LAMBDA)]
    /// The regularization coefficient.
    pub lambda: f64,

    #[arg(short, long, default_value_t = Mf::DEFAULT_MAX_STEPS)]
    /// The number of gradient steps.
    pub steps: usize,

    #[arg(long, default_value_t = 0)]
    /// The seed of the initialization of the feature vectors.
    pub seed: u64,

    #[arg(long, default_value_t = 1.0)]
    /// The minimum rating; predictions are clamped to the rating scale.
    pub min_rating: f64,

    #[arg(long, default_value_t = 5.0)]
    /// The maximum rating.
    pub max_rating: f64,

    #[arg(short = 'k', long, default_value_t = TopK::<usize>::DEFAULT_K)]
    /// The length of recommendation lists.
    pub k: usize,

    #[arg(short, long)]
    /// A user to recommend items to (can be repeated).
    pub user: Vec<String>,

    #[arg(short, long)]
    /// Where to store the feature vectors, one vector after the other in
    /// node order.
    pub features: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FloatVectorFormat::Ascii)]
    /// The output format for the feature vectors.
    pub fmt: FloatVectorFormat,

    #[arg(long)]
    /// Decimal digits for text output formats.
    pub precision: Option<usize>,

    #[clap(flatten)]
    pub num_threads: NumThreadsArg,

    #[clap(flatten)]
    pub granularity: GranularityArgs,
}

/// A node of the rating graph: users and items live in different label
/// spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node {
    User(String),
    Item(String),
}

impl Node {
    fn label(&self) -> &str {
        match self {
            Node::User(label) | Node::Item(label) => label,
        }
    }
}

/// The outcome of a run.
#[derive(Debug)]
pub struct Summary {
    /// The number of nodes of the training graph.
    pub num_nodes: usize,
    /// The number of training ratings.
    pub num_train: usize,
    /// The number of test ratings that could be evaluated.
    pub num_test: usize,
    pub train_rmse: f64,
    /// The test RMSE, if at least one test rating could be evaluated.
    pub test_rmse: Option<f64>,
    /// The recommendations of the selected users.
    pub recommendations: Vec<UserSummary>,
}

/// The two lists computed for a user, with item labels.
#[derive(Debug)]
pub struct UserSummary {
    pub user: String,
    /// The items the user rated highest in the training ratings, with their
    /// observed ratings.
    pub top_rated: Vec<(String, f64)>,
    /// The unrated items with the highest predicted rating, with their
    /// clamped predictions.
    pub recommended: Vec<(String, f64)>,
}

/// Reads rows `(user, item, rating)`.
fn read_ratings(
    global_args: &GlobalArgs,
    args: &CliArgs,
    input: impl BufRead,
) -> Result<Vec<(String, String, f64)>> {
    let mut pl = ProgressLogger::default();
    pl.display_memory(true).item_name("lines");
    if let Some(duration) = global_args.log_interval {
        pl.log_interval(duration);
    }
    pl.start("Reading ratings");

    let mut rows = Vec::new();
    let mut to_skip = args.lines_to_skip;
    for (line_num, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("Could not read line {}", line_num + 1))?;
        if line.trim().is_empty() || line.trim().starts_with(args.line_comment_symbol) {
            continue;
        }
        if to_skip > 0 {
            to_skip -= 1;
            continue;
        }
        let vals = line.split(args.separator).collect::<Vec<_>>();
        if vals.len() < 3 {
            log::warn!(
                "Line {}: {:?} does not have enough columns: got {} columns but expected at least 3 columns separated by {:?}",
                line_num + 1,
                line,
                vals.len(),
                args.separator,
            );
            continue;
        }
        let rating = vals[2].trim().parse::<f64>().with_context(|| {
            format!(
                "Error parsing rating {:?} at line {}",
                vals[2],
                line_num + 1
            )
        })?;
        rows.push((vals[0].trim().to_owned(), vals[1].trim().to_owned(), rating));
        pl.light_update();
    }
    pl.done();
    Ok(rows)
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    let summary = run(global_args, args)?;
    for user in &summary.recommendations {
        println!("Top rated by {}:", user.user);
        print_items(&user.top_rated);
        println!("Recommendations for {}:", user.user);
        print_items(&user.recommended);
    }
    Ok(())
}

fn print_items(items: &[(String, f64)]) {
    for (position, (item, score)) in items.iter().enumerate() {
        println!("{:>4}. {item} ({score:.3})", position + 1);
    }
}

/// Splits the ratings, trains the feature vectors, evaluates them and
/// computes the recommendations of the selected users.
pub fn run(global_args: GlobalArgs, args: CliArgs) -> Result<Summary> {
    ensure!(
        args.train_fraction > 0.0 && args.train_fraction <= 1.0,
        "The training fraction must be in (0 . . 1], got {}",
        args.train_fraction
    );
    let bounds = RatingBounds::new(args.min_rating, args.max_rating)?;

    let file = std::fs::File::open(&args.ratings)
        .with_context(|| format!("Could not open {}", args.ratings.display()))?;
    let rows = read_ratings(&global_args, &args, BufReader::new(file))?;
    ensure!(
        !rows.is_empty(),
        "No ratings read from {}: check that the --separator={:?} value is correct",
        args.ratings.display(),
        args.separator
    );

    let (train, test) = rows.split_at((rows.len() as f64 * args.train_fraction) as usize);
    ensure!(!train.is_empty(), "No training ratings");

    let mut builder = ArcListBuilder::new();
    for (user, item, rating) in train {
        builder.add_arc(Node::User(user.clone()), Node::Item(item.clone()), *rating);
    }
    let mut test_arcs = Vec::with_capacity(test.len());
    for (user, item, rating) in test {
        match (
            builder.get(&Node::User(user.clone())),
            builder.get(&Node::Item(item.clone())),
        ) {
            (Some(u), Some(i)) => test_arcs.push((u, i, *rating)),
            _ => log::debug!("Skipping test rating of {user:?} for {item:?}: unknown node"),
        }
    }
    if test_arcs.len() < test.len() {
        log::info!(
            "Skipped {} test ratings with unknown users or items",
            test.len() - test_arcs.len()
        );
    }

    let (graph, ratings, nodes) = builder.build();
    let is_left = nodes
        .iter()
        .map(|node| matches!(node, Node::User(_)))
        .collect::<Vec<_>>();
    log::info!(
        "Training on {} ratings of {} users for {} items",
        graph.num_arcs(),
        is_left.iter().filter(|&&left| left).count(),
        is_left.iter().filter(|&&left| !left).count()
    );

    let thread_pool = args.num_threads.thread_pool()?;
    let mut pl = progress_logger![item_name = "step"];
    pl.display_memory(true);
    if let Some(log_interval) = global_args.log_interval {
        pl.log_interval(log_interval);
    }

    let mut mf = MatrixFactorization::new(&graph, &is_left, &ratings);
    mf.vector_length(args.vector_length)
        .learning_rate(args.learning_rate)
        .decay(args.decay)
        .lambda(args.lambda)
        .max_steps(args.steps)
        .seed(args.seed)
        .rating_bounds(bounds)
        .granularity(args.granularity.into_granularity());
    let train_rmse = thread_pool.install(|| mf.run_with_logging(&mut pl))?;
    log::info!("Training RMSE: {train_rmse}");

    let num_test = test_arcs.len();
    let test_rmse = if test_arcs.is_empty() {
        log::warn!("No test ratings to evaluate");
        None
    } else {
        let (test_graph, test_ratings) =
            BidiCsrGraph::from_labeled_arcs(graph.num_nodes(), test_arcs);
        let test_rmse = holdout_rmse(mf.features(), &test_graph, &test_ratings, bounds)?;
        log::info!("Test RMSE: {test_rmse}");
        Some(test_rmse)
    };

    if let Some(path) = &args.features {
        args.fmt
            .store(path, mf.features().as_slice(), args.precision)?;
    }

    let mut users = Vec::with_capacity(args.user.len());
    for label in &args.user {
        match nodes.iter().position(|node| *node == Node::User(label.clone())) {
            Some(user) => users.push(user),
            None => log::warn!("Unknown user {label:?}"),
        }
    }
    let mut recommender = Recommender::new(&graph, &is_left, &ratings, mf.features())?;
    recommender.k(args.k).rating_bounds(bounds);
    let recommendations: Vec<Recommendation> =
        thread_pool.install(|| recommender.recommend_all(&users))?;

    Ok(Summary {
        num_nodes: graph.num_nodes(),
        num_train: graph.num_arcs(),
        num_test,
        train_rmse,
        test_rmse,
        recommendations: users
            .iter()
            .zip(recommendations)
            .map(|(&user, rec)| {
                let with_labels = |items: Vec<(usize, ScoreTuple)>| -> Vec<(String, f64)> {
                    items
                        .into_iter()
                        .map(|(item, score)| (nodes[item].label().to_owned(), score.score))
                        .collect()
                };
                UserSummary {
                    user: nodes[user].label().to_owned(),
                    top_rated: with_labels(rec.top_rated),
                    recommended: with_labels(rec.recommended),
                }
            })
            .collect(),
    })
}
