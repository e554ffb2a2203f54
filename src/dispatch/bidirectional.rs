//! Combined send-receive transfers.
//!
//! Both plans are issued through one [`Schedule`], so sends and receives
//! alternate instead of all sends preceding all receives. Two peers running
//! a symmetric exchange therefore post receives early even when the
//! runtime's buffering for unmatched sends is bounded.

use tracing::debug;

use super::{Dispatcher, Inbound, Outbound, RecvCursor, record_outcome, trace_issue};
use crate::{
    Datatype,
    comm::Communicator,
    fragment::{Schedule, Step},
    metrics::{self, TransferKind},
    pending::{JoinedSet, PendingSet},
};

impl<C: Communicator + ?Sized> Dispatcher<'_, C> {
    /// Send `outbound.buf` while receiving into `inbound.buf`, interleaving
    /// the fragments of both directions, then wait for all of them.
    ///
    /// # Errors
    ///
    /// Returns the communicator's error from the first failed issuance, or
    /// from the join.
    pub fn send_recv<'buf, T: Datatype, U: Datatype>(
        &self,
        outbound: Outbound<'buf, T>,
        inbound: Inbound<'buf, U>,
    ) -> Result<JoinedSet, C::Error> {
        record_outcome(TransferKind::SendRecv, self.issue_both(outbound, inbound))
    }

    fn issue_both<'buf, T: Datatype, U: Datatype>(
        &self,
        outbound: Outbound<'buf, T>,
        inbound: Inbound<'buf, U>,
    ) -> Result<JoinedSet, C::Error> {
        let outbound_plan = self.plan(outbound.buf.len());
        let inbound_plan = self.plan(inbound.buf.len());
        let schedule = Schedule::new(&outbound_plan, &inbound_plan);
        debug!(
            send_count = outbound.buf.len(),
            send_fragments = outbound_plan.len(),
            recv_count = inbound.buf.len(),
            recv_fragments = inbound_plan.len(),
            dest = %outbound.peer,
            source = %inbound.peer,
            "dispatching fragmented send-receive"
        );

        let mut pending = PendingSet::with_capacity(self.comm, schedule.len());
        let mut cursor = RecvCursor::new(inbound.buf);
        for step in schedule {
            let request = match step {
                Step::Outbound(descriptor) => {
                    trace_issue::<T>(step.direction(), descriptor);
                    self.comm.isend(
                        &outbound.buf[descriptor.range()],
                        outbound.peer,
                        outbound.tag,
                    )?
                }
                Step::Inbound(descriptor) => {
                    trace_issue::<U>(step.direction(), descriptor);
                    self.comm
                        .irecv(cursor.take(descriptor), inbound.peer, inbound.tag)?
                }
            };
            metrics::inc_fragments(step.direction());
            pending.push(step.direction(), request);
        }
        pending.join_all()
    }
}
