//! Two-rank ping-pong used to measure fragmentation overhead.
//!
//! Rank 0 sends a payload to rank 1, which echoes it back. Both the
//! unfragmented and the fragmented measurement run over a [`LocalFabric`] so
//! the difference is the cost of planning, issuing and joining fragments.

use std::{
    num::NonZeroUsize,
    panic,
    thread,
    time::{Duration, Instant},
};

use fragmux::{
    Communicator,
    Datatype,
    FabricError,
    FragmentationConfig,
    FragmentingComm,
    LocalComm,
    LocalFabric,
    Rank,
    Tag,
};
use thiserror::Error;

const PING: Rank = Rank::new(0);
const PONG: Rank = Rank::new(1);
const TAG: Tag = Tag::new(0);

/// Errors raised by a ping-pong run.
#[derive(Debug, Error)]
pub enum PingPongError {
    /// The fabric rejected a transfer.
    #[error("transfer failed: {0}")]
    Fabric(#[from] FabricError),
    /// The echoed payload differs from the original.
    #[error("echoed payload differs from the original")]
    Corrupted,
}

/// Timing of one ping-pong run.
#[derive(Clone, Copy, Debug)]
pub struct Measurement {
    /// Number of completed round trips.
    pub iterations: u32,
    /// Wall-clock time spent in the round trips.
    pub elapsed: Duration,
}

impl Measurement {
    /// Mean duration of one round trip.
    #[must_use]
    pub fn per_round_trip(&self) -> Duration { self.elapsed / self.iterations.max(1) }
}

/// Build a deterministic payload of `count` elements.
pub fn payload<T: Datatype + From<u8>>(count: usize) -> Vec<T> {
    (0..count)
        .map(|i| T::from(u8::try_from(i % 251).unwrap_or_default()))
        .collect()
}

/// Run `iterations` round trips without fragmentation.
///
/// # Errors
///
/// Returns [`PingPongError`] if a transfer fails or the echo is corrupted.
pub fn unfragmented<T>(payload: &[T], iterations: u32) -> Result<Measurement, PingPongError>
where
    T: Datatype + Default + PartialEq,
{
    let [ping, pong] = endpoints()?;
    run(&ping, &pong, payload, iterations)
}

/// Run `iterations` round trips with fragments of `fragment_size` elements.
///
/// # Errors
///
/// Returns [`PingPongError`] if a transfer fails or the echo is corrupted.
pub fn fragmented<T>(
    payload: &[T],
    iterations: u32,
    fragment_size: NonZeroUsize,
) -> Result<Measurement, PingPongError>
where
    T: Datatype + Default + PartialEq,
{
    let config = FragmentationConfig::new(fragment_size);
    let [ping, pong] = endpoints()?.map(|comm| FragmentingComm::new(comm, config));
    run(&ping, &pong, payload, iterations)
}

fn endpoints() -> Result<[LocalComm; 2], FabricError> {
    let fabric = LocalFabric::new(2);
    Ok([fabric.comm(PING)?, fabric.comm(PONG)?])
}

fn run<C, T>(ping: &C, pong: &C, payload: &[T], iterations: u32) -> Result<Measurement, PingPongError>
where
    C: Communicator<Error = FabricError> + Sync,
    T: Datatype + Default + PartialEq,
{
    thread::scope(|scope| {
        let echo = scope.spawn(|| -> Result<(), FabricError> {
            let mut buf = vec![T::default(); payload.len()];
            for _ in 0..iterations {
                pong.recv(&mut buf, PING, TAG)?;
                pong.send(&buf, PING, TAG)?;
            }
            Ok(())
        });

        let mut echoed = vec![T::default(); payload.len()];
        let started = Instant::now();
        for _ in 0..iterations {
            ping.send(payload, PONG, TAG)?;
            ping.recv(&mut echoed, PONG, TAG)?;
        }
        let elapsed = started.elapsed();

        match echo.join() {
            Ok(result) => result?,
            Err(panic) => panic::resume_unwind(panic),
        }
        if iterations > 0 && echoed != payload {
            return Err(PingPongError::Corrupted);
        }
        Ok(Measurement {
            iterations,
            elapsed,
        })
    })
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    #[test]
    fn both_measurements_echo_the_payload() {
        let payload = payload::<u8>(1000);
        let size = NonZeroUsize::new(64).expect("non-zero");

        let baseline = unfragmented(&payload, 3).expect("unfragmented run");
        let fragmented = fragmented(&payload, 3, size).expect("fragmented run");

        assert_eq!(baseline.iterations, 3);
        assert_eq!(fragmented.iterations, 3);
    }

    #[test]
    fn zero_iterations_measure_nothing() {
        let measurement = unfragmented(&payload::<f64>(16), 0).expect("empty run");
        assert_eq!(measurement.iterations, 0);
        assert_eq!(measurement.per_round_trip(), measurement.elapsed);
    }
}
