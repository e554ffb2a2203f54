//! Fragment dispatch against a communicator.
//!
//! A [`Dispatcher`] turns one logical transfer into a [`FragmentPlan`] per
//! direction, issues one non-blocking operation per fragment and joins them
//! all at once. Every fragment is issued before any is joined. An issuance
//! failure ends the transfer with that failure; fragments issued before it are
//! still drained by the [`PendingSet`](crate::pending::PendingSet) owning them.

mod bidirectional;
mod unidirectional;

use tracing::trace;

use crate::{
    Datatype,
    comm::{Communicator, Rank, Tag},
    config::FragmentationConfig,
    fragment::{FragmentDescriptor, FragmentPlan},
    metrics::{self, Direction, TransferKind},
};

/// Outbound half of a transfer: the data and where it goes.
#[derive(Debug)]
pub struct Outbound<'buf, T> {
    /// Elements to send.
    pub buf: &'buf [T],
    /// Destination rank.
    pub peer: Rank,
    /// Tag the receiver matches on.
    pub tag: Tag,
}

impl<'buf, T> Outbound<'buf, T> {
    /// Describe a send of `buf` to `peer` on `tag`.
    #[must_use]
    pub const fn new(buf: &'buf [T], peer: Rank, tag: Tag) -> Self { Self { buf, peer, tag } }
}

/// Inbound half of a transfer: the destination buffer and its source.
#[derive(Debug)]
pub struct Inbound<'buf, T> {
    /// Buffer receiving the elements.
    pub buf: &'buf mut [T],
    /// Source rank.
    pub peer: Rank,
    /// Tag to match on.
    pub tag: Tag,
}

impl<'buf, T> Inbound<'buf, T> {
    /// Describe a receive into `buf` from `peer` on `tag`.
    #[must_use]
    pub fn new(buf: &'buf mut [T], peer: Rank, tag: Tag) -> Self { Self { buf, peer, tag } }
}

/// Issues fragmented transfers through a borrowed communicator.
#[derive(Debug)]
pub struct Dispatcher<'comm, C: ?Sized> {
    comm: &'comm C,
    config: FragmentationConfig,
}

impl<'comm, C: Communicator + ?Sized> Dispatcher<'comm, C> {
    /// Create a dispatcher issuing through `comm` with fragments sized by
    /// `config`.
    #[must_use]
    pub const fn new(comm: &'comm C, config: FragmentationConfig) -> Self { Self { comm, config } }

    /// Configuration the dispatcher plans with.
    #[must_use]
    pub const fn config(&self) -> FragmentationConfig { self.config }

    /// Plan a transfer of `total` elements.
    #[must_use]
    pub fn plan(&self, total: usize) -> FragmentPlan {
        FragmentPlan::new(total, self.config.fragment_size())
    }
}

/// Hands out disjoint, consecutive sub-slices of a receive buffer.
///
/// Fragments of one direction are issued in index order, so each fragment
/// starts where the previous one ended.
struct RecvCursor<'buf, T> {
    rest: &'buf mut [T],
    consumed: usize,
}

impl<'buf, T> RecvCursor<'buf, T> {
    fn new(buf: &'buf mut [T]) -> Self { Self { rest: buf, consumed: 0 } }

    fn take(&mut self, descriptor: FragmentDescriptor) -> &'buf mut [T] {
        debug_assert_eq!(
            descriptor.offset(),
            self.consumed,
            "inbound fragments must be taken in order"
        );
        let rest = std::mem::take(&mut self.rest);
        let (fragment, tail) = rest.split_at_mut(descriptor.count());
        self.rest = tail;
        self.consumed = descriptor.end();
        fragment
    }
}

fn trace_issue<T: Datatype>(direction: Direction, descriptor: FragmentDescriptor) {
    trace!(
        %direction,
        index = %descriptor.index(),
        offset = descriptor.offset(),
        byte_offset = descriptor.byte_offset(T::TAG.size_in_bytes()),
        count = descriptor.count(),
        datatype = %T::TAG,
        "issuing fragment"
    );
}

fn record_outcome<R, E>(kind: TransferKind, result: Result<R, E>) -> Result<R, E> {
    metrics::inc_transfers(kind);
    if result.is_err() {
        metrics::inc_transfer_errors();
    }
    result
}
