/*
 * SPDX-FileCopyrightText: 2026 The graphrec authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::RankArgs;
use crate::GlobalArgs;
use anyhow::Result;
use clap::Parser;
use graphrec_algo::rank::Mode;

#[derive(Parser, Debug)]
#[command(
    name = "pagerank",
    about = "Compute PageRank using parallel Jacobi iteration.",
    long_about = None
)]
pub struct CliArgs {
    #[clap(flatten)]
    pub rank: RankArgs,

    #[arg(long)]
    /// Do not redistribute the rank of dangling vertices, which is thus
    /// lost at each iteration.
    pub no_normalize: bool,
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    let mode = Mode::PageRank {
        normalize: !args.no_normalize,
    };
    super::run(global_args, args.rank, mode)?;
    Ok(())
}
