//! Single-direction fragmented transfers.

use tracing::debug;

use super::{Dispatcher, Inbound, Outbound, RecvCursor, record_outcome, trace_issue};
use crate::{
    Datatype,
    comm::Communicator,
    metrics::{self, Direction, TransferKind},
    pending::{JoinedSet, PendingSet},
};

impl<C: Communicator + ?Sized> Dispatcher<'_, C> {
    /// Send `outbound.buf` as a sequence of fragments and wait for all of
    /// them.
    ///
    /// # Errors
    ///
    /// Returns the communicator's error from the first failed issuance, or
    /// from the join.
    pub fn send<T: Datatype>(&self, outbound: Outbound<'_, T>) -> Result<JoinedSet, C::Error> {
        record_outcome(TransferKind::Send, self.issue_send(outbound))
    }

    /// Receive into `inbound.buf` as a sequence of fragments and wait for all
    /// of them.
    ///
    /// # Errors
    ///
    /// Returns the communicator's error from the first failed issuance, or
    /// from the join.
    pub fn recv<T: Datatype>(&self, inbound: Inbound<'_, T>) -> Result<JoinedSet, C::Error> {
        record_outcome(TransferKind::Recv, self.issue_recv(inbound))
    }

    fn issue_send<T: Datatype>(&self, outbound: Outbound<'_, T>) -> Result<JoinedSet, C::Error> {
        let Outbound { buf, peer, tag } = outbound;
        let plan = self.plan(buf.len());
        debug!(
            direction = %Direction::Outbound,
            count = buf.len(),
            fragments = plan.len(),
            %peer,
            %tag,
            "dispatching fragmented transfer"
        );

        let mut pending = PendingSet::with_capacity(self.comm, plan.len());
        for descriptor in &plan {
            trace_issue::<T>(Direction::Outbound, *descriptor);
            let request = self.comm.isend(&buf[descriptor.range()], peer, tag)?;
            metrics::inc_fragments(Direction::Outbound);
            pending.push(Direction::Outbound, request);
        }
        pending.join_all()
    }

    fn issue_recv<T: Datatype>(&self, inbound: Inbound<'_, T>) -> Result<JoinedSet, C::Error> {
        let Inbound { buf, peer, tag } = inbound;
        let plan = self.plan(buf.len());
        debug!(
            direction = %Direction::Inbound,
            count = buf.len(),
            fragments = plan.len(),
            %peer,
            %tag,
            "dispatching fragmented transfer"
        );

        let mut pending = PendingSet::with_capacity(self.comm, plan.len());
        let mut cursor = RecvCursor::new(buf);
        for descriptor in &plan {
            trace_issue::<T>(Direction::Inbound, *descriptor);
            let request = self.comm.irecv(cursor.take(*descriptor), peer, tag)?;
            metrics::inc_fragments(Direction::Inbound);
            pending.push(Direction::Inbound, request);
        }
        pending.join_all()
    }
}
