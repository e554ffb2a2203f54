//! Benchmark binary measuring the overhead of fragmented transfers.
//!
//! Runs a two-rank ping-pong over an in-process fabric, first unfragmented
//! and then fragmented, and prints the mean round-trip time of each.

mod cli;
mod ping_pong;

use std::num::NonZeroUsize;

use clap::Parser;
use fragmux::{Datatype, FragmentPlan, FragmentationConfig};

use crate::{
    cli::{Cli, Element},
    ping_pong::PingPongError,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable structured logging for the benchmark run.
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let fragment_size = match cli.fragment_size {
        Some(size) => size,
        None => FragmentationConfig::from_env()?.fragment_size(),
    };
    let metrics = install_metrics(cli.metrics)?;

    match cli.element {
        Element::U8 => report::<u8>(&cli, fragment_size)?,
        Element::F64 => report::<f64>(&cli, fragment_size)?,
    }

    #[cfg(feature = "metrics")]
    if let Some(handle) = metrics {
        println!("{}", handle.render());
    }
    #[cfg(not(feature = "metrics"))]
    let () = metrics;
    Ok(())
}

fn report<T>(cli: &Cli, fragment_size: NonZeroUsize) -> Result<(), PingPongError>
where
    T: Datatype + Default + PartialEq + From<u8>,
{
    let payload = ping_pong::payload::<T>(cli.count);
    let plan = FragmentPlan::new(cli.count, fragment_size);

    let baseline = ping_pong::unfragmented(&payload, cli.iterations)?;
    let fragmented = ping_pong::fragmented(&payload, cli.iterations, fragment_size)?;

    println!(
        "{} x {} elements, {} round trips",
        cli.count,
        T::TAG,
        cli.iterations
    );
    println!("unfragmented: {:?} per round trip", baseline.per_round_trip());
    println!(
        "fragmented ({} fragments of {fragment_size}): {:?} per round trip",
        plan.len(),
        fragmented.per_round_trip()
    );
    let baseline_secs = baseline.elapsed.as_secs_f64();
    if baseline_secs > 0.0 {
        println!(
            "overhead ratio: {:.3}",
            fragmented.elapsed.as_secs_f64() / baseline_secs
        );
    }
    Ok(())
}

#[cfg(feature = "metrics")]
fn install_metrics(
    enabled: bool,
) -> Result<Option<metrics_exporter_prometheus::PrometheusHandle>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    Ok(Some(handle))
}

#[cfg(not(feature = "metrics"))]
fn install_metrics(enabled: bool) -> Result<(), Box<dyn std::error::Error>> {
    if enabled {
        tracing::warn!("built without the `metrics` feature; --metrics ignored");
    }
    Ok(())
}
