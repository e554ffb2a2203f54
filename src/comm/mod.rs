//! Point-to-point communicator capability.
//!
//! [`Communicator`] is the interface this crate both consumes and exposes:
//! non-blocking send and receive issuance, a single blocking join over a set
//! of issued requests, and blocking operations derived from them. Any
//! message-passing runtime implementing it can be wrapped by
//! [`FragmentingComm`](crate::FragmentingComm), which implements it in turn.

pub mod local;

use derive_more::{Display, From, Into};

use crate::{Datatype, metrics::Direction, pending::PendingSet};

pub use local::{FabricError, LocalComm, LocalFabric, LocalRequest};

/// Identity of a process within a communicator.
///
/// # Examples
///
/// ```
/// use fragmux::Rank;
/// let rank = Rank::new(3);
/// assert_eq!(rank.get(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct Rank(usize);

impl Rank {
    /// Construct a rank from its index.
    #[must_use]
    pub const fn new(value: usize) -> Self { Self(value) }

    /// Return the rank index.
    #[must_use]
    pub const fn get(self) -> usize { self.0 }
}

/// Message tag used to match sends with receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, From, Into)]
#[display("{_0}")]
pub struct Tag(u32);

impl Tag {
    /// Construct a tag.
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Return the numeric tag.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }
}

/// Completion record for a single request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    /// Peer the request exchanged data with.
    pub peer: Rank,
    /// Tag the request matched on.
    pub tag: Tag,
    /// Number of elements transferred.
    pub count: usize,
}

impl Status {
    /// Status describing a transfer of `count` elements with `peer` on `tag`.
    #[must_use]
    pub const fn new(peer: Rank, tag: Tag, count: usize) -> Self { Self { peer, tag, count } }
}

/// Non-blocking point-to-point messaging with a blocking join.
///
/// Requests borrow the buffer they were issued against for `'buf`, so a
/// buffer cannot be touched again until [`wait_all`](Self::wait_all) has
/// consumed every request referring to it.
pub trait Communicator {
    /// Error vocabulary of the runtime.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Handle for an issued, not yet joined operation.
    type Request<'buf>;

    /// Rank of the calling process.
    fn rank(&self) -> Rank;

    /// Number of processes reachable through this communicator.
    fn size(&self) -> usize;

    /// Issue a send of `buf` to `dest` without waiting for completion.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if the send cannot be issued.
    fn isend<'buf, T: Datatype>(
        &self,
        buf: &'buf [T],
        dest: Rank,
        tag: Tag,
    ) -> Result<Self::Request<'buf>, Self::Error>;

    /// Issue a receive into `buf` from `source` without waiting for
    /// completion.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if the receive cannot be issued.
    fn irecv<'buf, T: Datatype>(
        &self,
        buf: &'buf mut [T],
        source: Rank,
        tag: Tag,
    ) -> Result<Self::Request<'buf>, Self::Error>;

    /// Block until every request has completed.
    ///
    /// Returns one [`Status`] per request, in the order supplied.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if any request failed. Every request is
    /// still driven to completion before returning.
    fn wait_all<'buf>(
        &self,
        requests: Vec<Self::Request<'buf>>,
    ) -> Result<Vec<Status>, Self::Error>;

    /// Send `buf` to `dest` and block until the send has completed.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if issuing or completing the send fails.
    fn send<T: Datatype>(&self, buf: &[T], dest: Rank, tag: Tag) -> Result<(), Self::Error> {
        let request = self.isend(buf, dest, tag)?;
        self.wait_all(vec![request]).map(drop)
    }

    /// Receive into `buf` from `source` and block until it has arrived.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if issuing or completing the receive fails.
    fn recv<T: Datatype>(
        &self,
        buf: &mut [T],
        source: Rank,
        tag: Tag,
    ) -> Result<Status, Self::Error> {
        let request = self.irecv(buf, source, tag)?;
        let statuses = self.wait_all(vec![request])?;
        Ok(statuses
            .last()
            .copied()
            .unwrap_or(Status::new(source, tag, 0)))
    }

    /// Simultaneously send `send_buf` to `dest` and receive `recv_buf` from
    /// `source`, blocking until both have completed.
    ///
    /// Returns the status of the receive.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if either direction fails.
    fn sendrecv<'buf, T: Datatype, U: Datatype>(
        &self,
        send_buf: &'buf [T],
        dest: Rank,
        send_tag: Tag,
        recv_buf: &'buf mut [U],
        source: Rank,
        recv_tag: Tag,
    ) -> Result<Status, Self::Error> {
        let mut pending = PendingSet::with_capacity(self, 2);
        pending.push(Direction::Outbound, self.isend(send_buf, dest, send_tag)?);
        pending.push(Direction::Inbound, self.irecv(recv_buf, source, recv_tag)?);
        let joined = pending.join_all()?;
        Ok(joined.aggregate(Direction::Inbound, source, recv_tag))
    }
}
