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
    name = "articlerank",
    about = "Compute ArticleRank, a PageRank variant that dampens the contribution of vertices with a large outdegree.",
    long_about = None
)]
pub struct CliArgs {
    #[clap(flatten)]
    pub rank: RankArgs,
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    super::run(global_args, args.rank, Mode::ArticleRank)?;
    Ok(())
}
