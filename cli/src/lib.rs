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
#![allow(clippy::type_complexity)]

use anyhow::{Context, Result, anyhow, bail, ensure};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dsi_progress_logger::prelude::*;
use graphrec::graphs::{ArcListBuilder, BidiCsrGraph};
use graphrec::traits::Graph;
use graphrec::utils::Granularity;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use std::time::SystemTime;

pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));

    pub fn version_string() -> String {
        format!(
            "{}
git info: {} {} {}
build info: {} build for {} with {}",
            PKG_VERSION,
            GIT_VERSION.unwrap_or(""),
            GIT_COMMIT_HASH.unwrap_or(""),
            match GIT_DIRTY {
                None => "",
                Some(true) => "(dirty)",
                Some(false) => "(clean)",
            },
            PROFILE,
            TARGET,
            RUSTC_VERSION
        )
    }
}

#[derive(Args, Debug)]
/// Shared CLI arguments for reading files containing arcs.
pub struct ArcsArgs {
    #[arg(long, default_value_t = '#')]
    /// Ignore lines that start with this symbol.
    pub line_comment_symbol: char,

    #[arg(long, default_value_t = 0)]
    /// How many lines to skip, ignoring comment lines.
    pub lines_to_skip: usize,

    #[arg(long)]
    /// How many lines to parse, after skipping the first lines_to_skip and
    /// ignoring comment lines.
    pub max_arcs: Option<usize>,

    #[arg(long, default_value_t = '\t')]
    /// The column separator.
    pub separator: char,

    #[arg(long, default_value_t = 0)]
    /// The index of the column containing the source node of an arc.
    pub source_column: usize,

    #[arg(long, default_value_t = 1)]
    /// The index of the column containing the target node of an arc.
    pub target_column: usize,

    #[arg(long, default_value_t = false)]
    /// Sources and destinations are not node identifiers starting from 0, but labels.
    pub labels: bool,

    #[arg(short, long)]
    /// The number of nodes of the graph; by default, one plus the largest
    /// node identifier. Ignored with --labels.
    pub num_nodes: Option<usize>,
}

/// A graph read from an arc list, with the labels of its nodes if the arc
/// list used labels.
#[derive(Debug)]
pub struct ArcList {
    pub graph: BidiCsrGraph,
    pub labels: Option<Vec<String>>,
}

impl ArcList {
    /// Returns the label of a node, or its identifier if the arc list did not
    /// use labels.
    pub fn label(&self, node: usize) -> String {
        match &self.labels {
            Some(labels) => labels[node].clone(),
            None => node.to_string(),
        }
    }
}

/// Reads an arc list, one arc per line, as specified by `args`.
///
/// Lines with too few columns are skipped with a warning; identifiers that
/// cannot be parsed are an error.
pub fn read_arcs(
    global_args: &GlobalArgs,
    args: &ArcsArgs,
    input: impl BufRead,
) -> Result<ArcList> {
    let mut pl = ProgressLogger::default();
    pl.display_memory(true)
        .item_name("lines")
        .expected_updates(args.max_arcs);
    if let Some(duration) = global_args.log_interval {
        pl.log_interval(duration);
    }
    pl.start("Reading arcs");

    let biggest_idx = args.source_column.max(args.target_column);
    let mut builder = ArcListBuilder::<String, ()>::new();
    let mut arcs = Vec::new();
    let mut num_nodes = 0;
    let mut to_skip = args.lines_to_skip;

    for (line_num, line) in input.lines().enumerate() {
        if args.max_arcs.is_some_and(|max_arcs| arcs.len() + builder.num_arcs() >= max_arcs) {
            break;
        }
        let line = line.with_context(|| format!("Could not read line {}", line_num + 1))?;
        if line.trim().starts_with(args.line_comment_symbol) {
            continue;
        }
        if to_skip > 0 {
            to_skip -= 1;
            continue;
        }

        let vals = line.split(args.separator).collect::<Vec<_>>();
        if vals.len() <= biggest_idx {
            log::warn!(
                "Line {}: {:?} does not have enough columns: got {} columns but expected at least {} columns separated by {:?} (you can change the separator using the --separator option)",
                line_num + 1,
                line,
                vals.len(),
                biggest_idx + 1,
                args.separator,
            );
            continue;
        }

        let src = vals[args.source_column].trim();
        let dst = vals[args.target_column].trim();
        if args.labels {
            builder.add_arc(src.to_owned(), dst.to_owned(), ());
        } else {
            let parse = |val: &str, what: &str| {
                val.parse::<usize>().with_context(|| {
                    format!(
                        "Error parsing as integer {} column value {:?} at line {}",
                        what,
                        val,
                        line_num + 1
                    )
                })
            };
            let (u, v) = (parse(src, "source")?, parse(dst, "target")?);
            num_nodes = num_nodes.max(u.max(v) + 1);
            arcs.push((u, v));
        }
        pl.light_update();
    }
    pl.done();

    if args.labels {
        let (graph, _, labels) = builder.build();
        log::info!(
            "Arcs read: {} Nodes: {}",
            graph.num_arcs(),
            labels.len()
        );
        return Ok(ArcList {
            graph,
            labels: Some(labels),
        });
    }

    if let Some(user_num_nodes) = args.num_nodes {
        ensure!(
            user_num_nodes >= num_nodes,
            "The number of nodes specified by --num-nodes={} is smaller than the number of nodes found in the arcs: {}",
            user_num_nodes,
            num_nodes
        );
        num_nodes = user_num_nodes;
    }
    log::info!("Arcs read: {} Nodes: {}", arcs.len(), num_nodes);
    Ok(ArcList {
        graph: BidiCsrGraph::from_arcs(num_nodes, arcs),
        labels: None,
    })
}

/// Parses the number of threads from a string.
///
/// This function is meant to be used with `#[arg(...,  value_parser =
/// num_threads_parser)]`.
pub fn num_threads_parser(arg: &str) -> Result<usize> {
    let num_threads = arg.parse::<usize>()?;
    ensure!(num_threads > 0, "Number of threads must be greater than 0");
    Ok(num_threads)
}

/// Shared CLI arguments for commands that specify a number of threads.
#[derive(Args, Debug)]
pub struct NumThreadsArg {
    #[arg(short = 'j', long, default_value_t = rayon::current_num_threads().max(1), value_parser = num_threads_parser)]
    /// The number of threads to use.
    pub num_threads: usize,
}

impl NumThreadsArg {
    /// Builds a [`ThreadPool`](rayon::ThreadPool) with the requested number
    /// of threads; algorithms run on it through
    /// [`install`](rayon::ThreadPool::install).
    pub fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .with_context(|| {
                format!("Could not create a pool of {} threads", self.num_threads)
            })?;
        log::info!("Using {} threads", thread_pool.current_num_threads());
        Ok(thread_pool)
    }
}

/// Shared CLI arguments for commands that specify a granularity.
#[derive(Args, Debug)]
pub struct GranularityArgs {
    #[arg(long, conflicts_with("node_granularity"))]
    /// The tentative number of arcs used to define the size of a parallel job
    /// (advanced option).
    pub arc_granularity: Option<u64>,

    #[arg(long, conflicts_with("arc_granularity"))]
    /// The tentative number of nodes used to define the size of a parallel job
    /// (advanced option).
    pub node_granularity: Option<usize>,
}

impl GranularityArgs {
    pub fn into_granularity(&self) -> Granularity {
        match (self.arc_granularity, self.node_granularity) {
            (Some(_), Some(_)) => unreachable!(),
            (Some(arc_granularity), None) => Granularity::Arcs(arc_granularity),
            (None, Some(node_granularity)) => Granularity::Nodes(node_granularity),
            (None, None) => Granularity::default(),
        }
    }
}

/// Floats that can be stored in the Java format.
pub trait BeFloat: Copy + core::fmt::Display + std::str::FromStr {
    /// The size in bytes of the big-endian representation.
    const BYTES: usize;
    /// Writes the big-endian representation.
    fn write_be(self, writer: &mut impl Write) -> std::io::Result<()>;
    /// Reads from a slice of exactly [`BYTES`](Self::BYTES) bytes.
    fn read_be(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_be_float {
    ($($ty:ty),*) => {$(
        impl BeFloat for $ty {
            const BYTES: usize = size_of::<$ty>();

            fn write_be(self, writer: &mut impl Write) -> std::io::Result<()> {
                writer.write_all(&self.to_be_bytes())
            }

            fn read_be(bytes: &[u8]) -> Option<Self> {
                bytes.try_into().ok().map(<$ty>::from_be_bytes)
            }
        }
    )*};
}

impl_be_float!(f32, f64);

#[derive(Debug, Clone, Copy, ValueEnum)]
/// Formats for storing and loading vectors of floats.
pub enum FloatVectorFormat {
    /// Java-compatible format: a sequence of big-endian floats (32 or 64 bits).
    Java,
    /// ASCII format, one float per line.
    Ascii,
    /// A JSON Array.
    Json,
}

impl FloatVectorFormat {
    /// Stores float values in the specified `path` using the format defined by
    /// `self`.
    ///
    /// If the result is a textual format, that is, ASCII or JSON, `precision`
    /// will be used to truncate the float values to the specified number of
    /// decimal digits. If `None`, the shortest representation that parses
    /// back to the same value is used.
    pub fn store<F: BeFloat>(
        &self,
        path: impl AsRef<Path>,
        values: &[F],
        precision: Option<usize>,
    ) -> Result<()> {
        create_parent_dir(&path)?;
        let path_display = path.as_ref().display();
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Could not create vector at {}", path_display))?;
        let mut file = BufWriter::new(file);
        let format = |word: &F| match precision {
            None => format!("{word}"),
            Some(precision) => format!("{word:.precision$}"),
        };

        match self {
            FloatVectorFormat::Java => {
                log::info!("Storing in Java format at {}", path_display);
                for word in values.iter() {
                    word.write_be(&mut file)
                        .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
            }
            FloatVectorFormat::Ascii => {
                log::info!("Storing in ASCII format at {}", path_display);
                for word in values.iter() {
                    writeln!(file, "{}", format(word))
                        .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
            }
            FloatVectorFormat::Json => {
                log::info!("Storing in JSON format at {}", path_display);
                let words = values.iter().map(format).collect::<Vec<_>>();
                write!(file, "[{}]", words.join(", "))
                    .with_context(|| format!("Could not write vector to {}", path_display))?;
            }
        }
        file.flush()
            .with_context(|| format!("Could not write vector to {}", path_display))?;

        Ok(())
    }

    /// Loads float values from the specified `path` using the format defined
    /// by `self`.
    pub fn load<F: BeFloat>(&self, path: impl AsRef<Path>) -> Result<Vec<F>>
    where
        <F as std::str::FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        let path = path.as_ref();
        let path_display = path.display();

        match self {
            FloatVectorFormat::Java => {
                log::info!("Loading Java format from {}", path_display);
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Could not read {}", path_display))?;
                ensure!(
                    bytes.len() % F::BYTES == 0,
                    "File size ({}) is not a multiple of {} bytes",
                    bytes.len(),
                    F::BYTES
                );
                bytes
                    .chunks_exact(F::BYTES)
                    .enumerate()
                    .map(|(i, chunk)| {
                        F::read_be(chunk).ok_or_else(|| {
                            anyhow!("Could not convert bytes at index {i} in {}", path_display)
                        })
                    })
                    .collect()
            }
            FloatVectorFormat::Ascii => {
                log::info!("Loading ASCII format from {}", path_display);
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Could not read {}", path_display))?;
                content
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| {
                        line.trim().parse::<F>().map_err(|e| {
                            anyhow!("Error parsing line {} of {}: {}", i + 1, path_display, e)
                        })
                    })
                    .collect()
            }
            FloatVectorFormat::Json => {
                log::info!("Loading JSON format from {}", path_display);
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Could not read {}", path_display))?;
                let Some(inner) = content
                    .trim()
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                else {
                    bail!("Expected a JSON array in {}", path_display);
                };
                if inner.trim().is_empty() {
                    return Ok(Vec::new());
                }
                inner
                    .split(',')
                    .enumerate()
                    .map(|(i, token)| {
                        token.trim().parse::<F>().map_err(|e| {
                            anyhow!("Error parsing element {} of {}: {}", i + 1, path_display, e)
                        })
                    })
                    .collect()
            }
        }
    }
}

/// Creates all parent directories of the given file path.
pub fn create_parent_dir(file_path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent_dir) = file_path.as_ref().parent() {
        std::fs::create_dir_all(parent_dir).with_context(|| {
            format!(
                "Failed to create the directory {:?}",
                parent_dir.to_string_lossy()
            )
        })?;
    }
    Ok(())
}

/// Parses a duration from a string.
///
/// If no suffix is given, the value is in milliseconds. Available suffixes
/// are `s` for seconds, `m` for minutes, `h` for hours and `d` for days.
///
/// Example: `1d2h3m4s567` is parsed as 1 day, 2 hours, 3 minutes, 4 seconds,
/// and 567 milliseconds.
fn parse_duration(value: &str) -> Result<Duration> {
    if value.is_empty() {
        bail!("Empty duration string, if you want every 0 milliseconds use `0`.");
    }
    let mut duration = Duration::from_secs(0);
    let mut acc = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            acc.push(c);
        } else if c.is_whitespace() {
            continue;
        } else {
            let dur = acc
                .parse::<u64>()
                .with_context(|| format!("Missing value before suffix {c:?}"))?;
            match c {
                's' => duration += Duration::from_secs(dur),
                'm' => duration += Duration::from_secs(dur * 60),
                'h' => duration += Duration::from_secs(dur * 60 * 60),
                'd' => duration += Duration::from_secs(dur * 60 * 60 * 24),
                _ => bail!("Invalid duration suffix: {}", c),
            }
            acc.clear();
        }
    }
    if !acc.is_empty() {
        let dur = acc.parse::<u64>()?;
        duration += Duration::from_millis(dur);
    }
    Ok(duration)
}

/// Initializes the `env_logger` logger with a custom format including
/// timestamps with elapsed time since initialization.
pub fn init_env_logger() -> Result<()> {
    use jiff::SpanRound;
    use jiff::fmt::friendly::{Designator, Spacing, SpanPrinter};

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let start = std::time::Instant::now();
    let printer = SpanPrinter::new()
        .spacing(Spacing::None)
        .designator(Designator::Compact);
    let span_round = SpanRound::new()
        .largest(jiff::Unit::Day)
        .smallest(jiff::Unit::Millisecond)
        .days_are_24_hours();

    builder.format(move |buf, record| {
        let Ok(ts) = jiff::Timestamp::try_from(SystemTime::now()) else {
            return Err(std::io::Error::other("Failed to get timestamp"));
        };
        let style = buf.default_level_style(record.level());
        let elapsed = start.elapsed();
        let span = jiff::Span::new()
            .seconds(elapsed.as_secs() as i64)
            .milliseconds(elapsed.subsec_millis() as i64);
        let span = span.round(span_round).map_err(std::io::Error::other)?;
        writeln!(
            buf,
            "{} {} {style}{}{style:#} [{:?}] {} - {}",
            ts.strftime("%F %T%.3f"),
            printer.span_to_string(&span),
            record.level(),
            std::thread::current().id(),
            record.target(),
            record.args()
        )
    });
    builder.try_init()?;
    Ok(())
}

#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    #[arg(long, value_parser = parse_duration, global=true, display_order = 1000)]
    /// How often to log progress. Default is 10s. You can use the suffixes "s"
    /// for seconds, "m" for minutes, "h" for hours, and "d" for days. If no
    /// suffix is provided it is assumed to be in milliseconds.
    /// Example: "1d2h3m4s567" is parsed as 1 day + 2 hours + 3 minutes + 4
    /// seconds + 567 milliseconds = 93784567 milliseconds.
    pub log_interval: Option<Duration>,
}

#[derive(Subcommand, Debug)]
pub enum SubCommands {
    #[command(subcommand)]
    Rank(rank::SubCommands),
    Recommend(recommend::CliArgs),
}

#[derive(Parser, Debug)]
#[command(name = "graphrec", version=build_info::version_string())]
/// Rank propagation and latent-factor recommendation on graphs.
///
/// Noteworthy environment variables:
///
/// - RUST_MIN_STACK: minimum thread stack size (in bytes).
///
/// - RUST_LOG: configuration for env_logger
///   <https://docs.rs/env_logger/latest/env_logger/>.
pub struct Cli {
    #[command(subcommand)]
    pub command: SubCommands,
    #[clap(flatten)]
    pub args: GlobalArgs,
}

pub mod rank;
pub mod recommend;

/// The entry point of the command-line interface.
pub fn cli_main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let start = std::time::Instant::now();
    let cli = Cli::parse_from(args);
    match cli.command {
        SubCommands::Rank(args) => {
            rank::main(cli.args, args)?;
        }
        SubCommands::Recommend(args) => {
            recommend::main(cli.args, args)?;
        }
    }

    log::info!(
        "The command took {}",
        pretty_print_elapsed(start.elapsed().as_secs_f64())
    );

    Ok(())
}

/// Pretty-prints seconds in a human-readable format.
fn pretty_print_elapsed(elapsed: f64) -> String {
    let mut result = String::new();
    let mut elapsed_seconds = elapsed as u64;
    let weeks = elapsed_seconds / (60 * 60 * 24 * 7);
    elapsed_seconds %= 60 * 60 * 24 * 7;
    let days = elapsed_seconds / (60 * 60 * 24);
    elapsed_seconds %= 60 * 60 * 24;
    let hours = elapsed_seconds / (60 * 60);
    elapsed_seconds %= 60 * 60;
    let minutes = elapsed_seconds / 60;

    for (value, unit) in [(weeks, "week"), (days, "day"), (hours, "hour"), (minutes, "minute")] {
        match value {
            0 => {}
            1 => result.push_str(&format!("1 {unit} ")),
            _ => result.push_str(&format!("{value} {unit}s ")),
        }
    }

    result.push_str(&format!("{:.3} seconds ({}s)", elapsed % 60.0, elapsed));
    result
}
