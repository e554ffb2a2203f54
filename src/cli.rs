//! Command line interface for the `fragmux` overhead benchmark.
//!
//! The same definition drives argument parsing and man page generation.

use std::num::NonZeroUsize;

use clap::{Parser, ValueEnum};

/// Command line arguments for the `fragmux` binary.
#[derive(Debug, Parser)]
#[command(
    name = "fragmux",
    version,
    about = "Measure the overhead of fragmenting point-to-point transfers"
)]
pub struct Cli {
    /// Elements per transfer.
    #[arg(short, long, default_value_t = 1 << 20)]
    pub count: usize,
    /// Elements per fragment. Overrides `FRAGMENT_SIZE` when given.
    #[arg(short, long)]
    pub fragment_size: Option<NonZeroUsize>,
    /// Round trips per measurement.
    #[arg(short, long, default_value_t = 100)]
    pub iterations: u32,
    /// Element type carried by each transfer.
    #[arg(short, long, value_enum, default_value_t = Element::F64)]
    pub element: Element,
    /// Print the collected metrics in Prometheus text format after the run.
    #[arg(long)]
    pub metrics: bool,
}

/// Element types the benchmark can transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Element {
    /// Unsigned bytes.
    U8,
    /// 64-bit floats.
    F64,
}
