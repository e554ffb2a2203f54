//! Thread-per-rank drivers for in-process fabrics.

use std::{num::NonZeroUsize, panic, thread};

use fragmux::{FragmentationConfig, FragmentingComm, LocalComm, LocalFabric};

/// Build a configuration with `fragment_size` elements per fragment.
///
/// # Panics
///
/// Panics if `fragment_size` is zero.
#[must_use]
pub fn fragment_config(fragment_size: usize) -> FragmentationConfig {
    let size = NonZeroUsize::new(fragment_size).expect("fragment size must be positive");
    FragmentationConfig::new(size)
}

/// Run `body` once per rank of a fresh `world_size` fabric, each on its own
/// thread, and collect the results in rank order.
///
/// A panic on any rank is propagated to the caller.
pub fn run_ranks<R, F>(world_size: usize, body: F) -> Vec<R>
where
    R: Send,
    F: Fn(LocalComm) -> R + Sync,
{
    let fabric = LocalFabric::new(world_size);
    let body = &body;
    thread::scope(|scope| {
        let handles: Vec<_> = fabric
            .comms()
            .into_iter()
            .map(|comm| scope.spawn(move || body(comm)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|panic| panic::resume_unwind(panic)))
            .collect()
    })
}

/// Like [`run_ranks`], with every endpoint wrapped in a [`FragmentingComm`].
pub fn run_fragmenting_ranks<R, F>(
    world_size: usize,
    config: FragmentationConfig,
    body: F,
) -> Vec<R>
where
    R: Send,
    F: Fn(FragmentingComm<LocalComm>) -> R + Sync,
{
    run_ranks(world_size, |comm| body(FragmentingComm::new(comm, config)))
}
