#![cfg(any(test, feature = "test-helpers"))]
//! Test-only helpers for shared test utilities.
//!
//! [`RecordingComm`] is a [`Communicator`] that performs no transfers. It
//! records every issuance and join so tests can assert on issuance order,
//! per-fragment addressing and failure handling.

use std::{
    marker::PhantomData,
    sync::{Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

use crate::{
    Datatype,
    DatatypeTag,
    comm::{Communicator, Rank, Status, Tag},
    metrics::Direction,
};

/// Errors injected by [`RecordingComm`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RecordingError {
    /// The issuance at `position` was configured to fail.
    #[error("issuance {position} rejected")]
    Issue { position: usize },
    /// The join was configured to fail.
    #[error("join rejected")]
    Join,
}

/// One recorded issuance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Issued {
    /// Send or receive.
    pub direction: Direction,
    /// Address of the first element handed to the communicator.
    pub address: usize,
    /// Number of elements handed to the communicator.
    pub count: usize,
    /// Element type of the buffer.
    pub datatype: DatatypeTag,
    /// Peer rank.
    pub peer: Rank,
    /// Message tag.
    pub tag: Tag,
}

/// Request handle issued by [`RecordingComm`].
#[derive(Debug)]
pub struct RecordedRequest<'buf> {
    status: Status,
    _buf: PhantomData<&'buf mut ()>,
}

#[derive(Debug, Default)]
struct Journal {
    issued: Vec<Issued>,
    joins: usize,
    drained: usize,
    fail_issue_at: Option<usize>,
    fail_join: bool,
}

/// [`Communicator`] recording calls instead of moving data.
#[derive(Debug)]
pub struct RecordingComm {
    rank: Rank,
    size: usize,
    journal: Mutex<Journal>,
}

impl Default for RecordingComm {
    fn default() -> Self { Self::new() }
}

impl RecordingComm {
    /// Create a recorder acting as rank 0 of a two-rank group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rank: Rank::new(0),
            size: 2,
            journal: Mutex::new(Journal::default()),
        }
    }

    /// Reject the issuance at zero-based `position`.
    #[must_use]
    pub fn failing_issue_at(self, position: usize) -> Self {
        self.journal().fail_issue_at = Some(position);
        self
    }

    /// Reject every join after recording it.
    #[must_use]
    pub fn failing_join(self) -> Self {
        self.journal().fail_join = true;
        self
    }

    /// Issuances recorded so far, in order.
    #[must_use]
    pub fn issued(&self) -> Vec<Issued> { self.journal().issued.clone() }

    /// Number of joins performed.
    #[must_use]
    pub fn joins(&self) -> usize { self.journal().joins }

    /// Number of requests consumed by joins.
    #[must_use]
    pub fn drained(&self) -> usize { self.journal().drained }

    fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record<'buf, T: Datatype>(
        &self,
        direction: Direction,
        buf: &[T],
        peer: Rank,
        tag: Tag,
    ) -> Result<RecordedRequest<'buf>, RecordingError> {
        let mut journal = self.journal();
        let position = journal.issued.len();
        if journal.fail_issue_at == Some(position) {
            return Err(RecordingError::Issue { position });
        }
        journal.issued.push(Issued {
            direction,
            address: buf.as_ptr() as usize,
            count: buf.len(),
            datatype: T::TAG,
            peer,
            tag,
        });
        Ok(RecordedRequest {
            status: Status::new(peer, tag, buf.len()),
            _buf: PhantomData,
        })
    }
}

impl Communicator for RecordingComm {
    type Error = RecordingError;
    type Request<'buf> = RecordedRequest<'buf>;

    fn rank(&self) -> Rank { self.rank }

    fn size(&self) -> usize { self.size }

    fn isend<'buf, T: Datatype>(
        &self,
        buf: &'buf [T],
        dest: Rank,
        tag: Tag,
    ) -> Result<Self::Request<'buf>, Self::Error> {
        self.record(Direction::Outbound, buf, dest, tag)
    }

    fn irecv<'buf, T: Datatype>(
        &self,
        buf: &'buf mut [T],
        source: Rank,
        tag: Tag,
    ) -> Result<Self::Request<'buf>, Self::Error> {
        self.record(Direction::Inbound, buf, source, tag)
    }

    fn wait_all<'buf>(
        &self,
        requests: Vec<Self::Request<'buf>>,
    ) -> Result<Vec<Status>, Self::Error> {
        let mut journal = self.journal();
        journal.joins += 1;
        journal.drained += requests.len();
        if journal.fail_join {
            return Err(RecordingError::Join);
        }
        Ok(requests.into_iter().map(|request| request.status).collect())
    }
}
