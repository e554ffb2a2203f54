//! Outstanding operation sets.
//!
//! A [`PendingSet`] owns every request issued for one logical transfer. It is
//! consumed by [`PendingSet::join_all`], which performs the single blocking
//! join and reports the aggregate outcome. A set dropped without being joined,
//! for example when an issuance fails part way through a transfer, still
//! drains its requests so no operation outlives the call that issued it.

use std::mem;

use crate::{
    comm::{Communicator, Rank, Status, Tag},
    metrics::Direction,
};

/// Requests issued for a single transfer, awaiting one combined join.
pub struct PendingSet<'comm, 'buf, C: Communicator + ?Sized> {
    comm: &'comm C,
    requests: Vec<C::Request<'buf>>,
    directions: Vec<Direction>,
}

impl<'comm, 'buf, C: Communicator + ?Sized> PendingSet<'comm, 'buf, C> {
    /// Create an empty set joined through `comm`.
    #[must_use]
    pub fn new(comm: &'comm C) -> Self { Self::with_capacity(comm, 0) }

    /// Create an empty set with room for `capacity` requests.
    #[must_use]
    pub fn with_capacity(comm: &'comm C, capacity: usize) -> Self {
        Self {
            comm,
            requests: Vec::with_capacity(capacity),
            directions: Vec::with_capacity(capacity),
        }
    }

    /// Record an issued request travelling in `direction`.
    pub fn push(&mut self, direction: Direction, request: C::Request<'buf>) {
        self.requests.push(request);
        self.directions.push(direction);
    }

    /// Number of requests awaiting the join.
    #[must_use]
    pub fn len(&self) -> usize { self.requests.len() }

    /// Whether no request has been issued.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.requests.is_empty() }

    /// Block until every request has completed.
    ///
    /// An empty set completes immediately without consulting the
    /// communicator.
    ///
    /// # Errors
    ///
    /// Returns the communicator's error if the join fails.
    pub fn join_all(mut self) -> Result<JoinedSet, C::Error> {
        let requests = mem::take(&mut self.requests);
        let directions = mem::take(&mut self.directions);
        if requests.is_empty() {
            return Ok(JoinedSet::default());
        }
        let statuses = self.comm.wait_all(requests)?;
        Ok(JoinedSet {
            entries: directions.into_iter().zip(statuses).collect(),
        })
    }
}

impl<C: Communicator + ?Sized> Drop for PendingSet<'_, '_, C> {
    fn drop(&mut self) {
        if self.requests.is_empty() {
            return;
        }
        // The transfer has already failed; only the drain matters here.
        let requests = mem::take(&mut self.requests);
        let _ = self.comm.wait_all(requests);
    }
}

/// Completed requests of a joined [`PendingSet`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinedSet {
    entries: Vec<(Direction, Status)>,
}

impl JoinedSet {
    /// Number of completed requests.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether the set completed without issuing anything.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Per-request statuses in issuance order.
    pub fn statuses(&self) -> impl Iterator<Item = (Direction, Status)> + '_ {
        self.entries.iter().copied()
    }

    /// Fold every status travelling in `direction` into one.
    ///
    /// The element counts are summed; `peer` and `tag` describe the logical
    /// transfer and are reported even when nothing was issued.
    #[must_use]
    pub fn aggregate(&self, direction: Direction, peer: Rank, tag: Tag) -> Status {
        let count = self
            .entries
            .iter()
            .filter(|(entry_direction, _)| *entry_direction == direction)
            .map(|(_, status)| status.count)
            .sum();
        Status::new(peer, tag, count)
    }
}
