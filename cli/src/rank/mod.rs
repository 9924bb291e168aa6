/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::{
    ArcList, ArcsArgs, FloatVectorFormat, GlobalArgs, GranularityArgs, NumThreadsArg,
    read_arcs,
};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dsi_progress_logger::prelude::*;
use graphrec::graphs::BidiCsrGraph;
use graphrec_algo::rank::preds::{MaxIter, Tolerance};
use graphrec_algo::rank::{Mode, RankPropagator};
use graphrec_algo::topk::{ScoreTuple, TopK};
use predicates::prelude::*;
use std::io::BufReader;
use std::path::PathBuf;

pub mod articlerank;
pub mod pagerank;

#[derive(Subcommand, Debug)]
#[command(name = "rank")]
/// Computes rank vectors by iterated propagation along arcs.
pub enum SubCommands {
    #[clap(name = "pagerank", visible_alias = "pr")]
    PageRank(pagerank::CliArgs),
    #[clap(name = "articlerank", visible_alias = "ar")]
    ArticleRank(articlerank::CliArgs),
}

pub fn main(global_args: GlobalArgs, subcommand: SubCommands) -> Result<()> {
    match subcommand {
        SubCommands::PageRank(args) => pagerank::main(global_args, args),
        SubCommands::ArticleRank(args) => articlerank::main(global_args, args),
    }
}

/// Arguments shared by all rank subcommands.
#[derive(Args, Debug)]
pub struct RankArgs {
    /// The arc list, one arc per line.
    pub arcs: PathBuf,

    #[clap(flatten)]
    pub arcs_args: ArcsArgs,

    #[arg(short, long)]
    /// Where to store the rank vector.
    pub output: Option<PathBuf>,

    #[arg(short, long, default_value_t = RankPropagator::<BidiCsrGraph>::DEFAULT_DAMPING)]
    /// The damping factor (must be in the interval (0 . . 1)).
    pub damping: f64,

    #[arg(long, default_value_t = MaxIter::DEFAULT_MAX_ITER)]
    /// Maximum number of iterations.
    pub max_iter: usize,

    #[arg(short, long, default_value_t = Tolerance::DEFAULT_THRESHOLD)]
    /// Stop when the L1 norm of the change is at most this amount.
    pub tolerance: f64,

    #[arg(long, value_enum, default_value_t = FloatVectorFormat::Ascii)]
    /// The output format for the rank vector.
    pub fmt: FloatVectorFormat,

    #[arg(long)]
    /// Decimal digits for text output formats.
    pub precision: Option<usize>,

    #[arg(short = 'k', long, default_value_t = 10)]
    /// How many top vertices to log.
    pub top: usize,

    #[clap(flatten)]
    pub num_threads: NumThreadsArg,

    #[clap(flatten)]
    pub granularity: GranularityArgs,
}

/// Reads the graph, propagates ranks in the given mode and stores them.
///
/// Returns the rank vector and the arc list it was computed on.
pub(crate) fn run(
    global_args: GlobalArgs,
    args: RankArgs,
    mode: Mode,
) -> Result<(Box<[f64]>, ArcList)> {
    let file = std::fs::File::open(&args.arcs)
        .with_context(|| format!("Could not open {}", args.arcs.display()))?;
    let arc_list = read_arcs(&global_args, &args.arcs_args, BufReader::new(file))?;

    let mut pl = progress_logger![item_name = "iteration"];
    pl.display_memory(true);
    if let Some(log_interval) = global_args.log_interval {
        pl.log_interval(log_interval);
    }

    let thread_pool = args.num_threads.thread_pool()?;

    let predicate = Tolerance::try_from(args.tolerance)?
        .boxed()
        .or(MaxIter::try_from(args.max_iter)?)
        .boxed();

    let mut propagator = RankPropagator::new(&arc_list.graph);
    propagator
        .damping(args.damping)
        .mode(mode)
        .granularity(args.granularity.into_granularity());

    thread_pool.install(|| propagator.run_with_logging(predicate, &mut pl))?;

    log::info!(
        "Completed after {} iteration(s), last change = {}",
        propagator.iterations(),
        propagator.diff()
    );

    let rank = propagator.into_rank();
    if let Some(output) = &args.output {
        args.fmt.store(output, &rank, args.precision)?;
    }
    if args.top > 0 {
        for (position, (node, score)) in top_vertices(&rank, args.top).into_iter().enumerate() {
            log::info!(
                "#{}: {} ({})",
                position + 1,
                arc_list.label(node),
                score.score
            );
        }
    }

    Ok((rank, arc_list))
}

/// Returns the `k` vertices with the highest rank, by decreasing rank.
pub fn top_vertices(rank: &[f64], k: usize) -> Vec<(usize, ScoreTuple)> {
    let mut top = TopK::new(k);
    for (node, &r) in rank.iter().enumerate() {
        top.offer(node, ScoreTuple::new(r, r));
    }
    top.into_sorted_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_vertices() {
        let top = top_vertices(&[0.1, 0.4, 0.2, 0.4], 3);
        let nodes = top.iter().map(|(node, _)| *node).collect::<Vec<_>>();
        assert_eq!(nodes, [1, 3, 2]);
        assert!(top_vertices(&[], 3).is_empty());
    }
}
