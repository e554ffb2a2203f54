//! Criterion benchmarks for fragmented versus unfragmented round trips.
//!
//! Each measurement runs a two-rank ping-pong over an in-process fabric so the
//! difference between the groups is the cost of planning, issuing and joining
//! fragments.

use std::num::NonZeroUsize;

use criterion::{BenchmarkId, Criterion, Throughput, black_box};

#[path = "../src/ping_pong.rs"]
#[allow(dead_code, reason = "shared with the fragmux binary")]
mod ping_pong;

const FRAGMENT_SIZE: NonZeroUsize = match NonZeroUsize::new(4096) {
    Some(size) => size,
    None => unreachable!(),
};

/// Payload sizes in elements: below, at, and well above one fragment.
const COUNTS: [usize; 3] = [1024, 4096, 1 << 18];

fn iterations(iters: u64) -> u32 { u32::try_from(iters).unwrap_or(u32::MAX) }

fn benchmark_round_trips(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragmentation_overhead");

    for count in COUNTS {
        let payload = ping_pong::payload::<f64>(count);
        group.throughput(Throughput::Bytes((count * size_of::<f64>()) as u64));

        group.bench_function(BenchmarkId::new("unfragmented", count), |b| {
            b.iter_custom(|iters| {
                match ping_pong::unfragmented(black_box(&payload), iterations(iters)) {
                    Ok(measurement) => measurement.elapsed,
                    Err(err) => panic!("unfragmented round trip failed: {err}"),
                }
            });
        });

        group.bench_function(BenchmarkId::new("fragmented", count), |b| {
            b.iter_custom(|iters| {
                match ping_pong::fragmented(black_box(&payload), iterations(iters), FRAGMENT_SIZE) {
                    Ok(measurement) => measurement.elapsed,
                    Err(err) => panic!("fragmented round trip failed: {err}"),
                }
            });
        });
    }

    group.finish();
}

/// Entrypoint for the fragmentation overhead benchmarks.
fn main() {
    let mut criterion = Criterion::default().configure_from_args();
    benchmark_round_trips(&mut criterion);
    criterion.final_summary();
}
