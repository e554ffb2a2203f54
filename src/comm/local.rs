//! In-process message-passing runtime.
//!
//! [`LocalFabric`] connects a fixed number of ranks living in one process,
//! typically one per thread. Messages are matched on `(source, destination,
//! tag)` and delivered in issuance order per key. Sends are eager: the payload
//! is copied when the send is issued, so a send request is already complete.
//! Receives complete while their request is joined.
//!
//! Mailboxes are created lazily by whichever side touches a key first.
//! Joining a receive blocks the calling thread, so [`LocalComm`] must not be
//! driven from inside an async runtime.

use std::{
    any::Any,
    sync::{Arc, Mutex, PoisonError},
};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;

use super::{Communicator, Rank, Status, Tag};
use crate::{Datatype, DatatypeTag};

/// Errors produced by [`LocalComm`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FabricError {
    /// The peer rank does not exist in the fabric.
    #[error("unknown peer {rank} in a fabric of {world_size} ranks")]
    UnknownPeer { rank: Rank, world_size: usize },
    /// The matched message holds more elements than the receive buffer.
    #[error("message of {incoming} elements truncated by a buffer of {capacity}")]
    Truncated { capacity: usize, incoming: usize },
    /// The matched message carries a different element type.
    #[error("datatype mismatch: expected {expected}, found {found}")]
    DatatypeMismatch {
        expected: DatatypeTag,
        found: DatatypeTag,
    },
    /// The mailbox for the peer was closed.
    #[error("peer {peer} disconnected")]
    Disconnected { peer: Rank },
}

/// Mailbox key: source rank, destination rank and tag.
type MailboxKey = (Rank, Rank, Tag);

struct Envelope {
    datatype: DatatypeTag,
    payload: Box<dyn Any + Send>,
}

struct Mailbox {
    tx: mpsc::UnboundedSender<Envelope>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Envelope>>>,
}

impl Mailbox {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

/// Shared matching state for a group of in-process ranks.
#[derive(Clone)]
pub struct LocalFabric {
    world_size: usize,
    mailboxes: Arc<DashMap<MailboxKey, Mailbox>>,
}

impl LocalFabric {
    /// Create a fabric connecting `world_size` ranks.
    #[must_use]
    pub fn new(world_size: usize) -> Self {
        Self {
            world_size,
            mailboxes: Arc::new(DashMap::new()),
        }
    }

    /// Number of ranks connected by the fabric.
    #[must_use]
    pub fn world_size(&self) -> usize { self.world_size }

    /// Return the communicator endpoint for `rank`.
    ///
    /// # Errors
    ///
    /// Returns [`FabricError::UnknownPeer`] if `rank` is outside the fabric.
    pub fn comm(&self, rank: Rank) -> Result<LocalComm, FabricError> {
        self.check_rank(rank)?;
        Ok(LocalComm {
            rank,
            fabric: self.clone(),
        })
    }

    /// Return one communicator endpoint per rank, in rank order.
    #[must_use]
    pub fn comms(&self) -> Vec<LocalComm> {
        (0..self.world_size)
            .map(|index| LocalComm {
                rank: Rank::new(index),
                fabric: self.clone(),
            })
            .collect()
    }

    fn check_rank(&self, rank: Rank) -> Result<(), FabricError> {
        if rank.get() < self.world_size {
            Ok(())
        } else {
            Err(FabricError::UnknownPeer {
                rank,
                world_size: self.world_size,
            })
        }
    }

    fn sender(&self, key: MailboxKey) -> mpsc::UnboundedSender<Envelope> {
        self.mailboxes
            .entry(key)
            .or_insert_with(Mailbox::new)
            .tx
            .clone()
    }

    fn receiver(&self, key: MailboxKey) -> Arc<Mutex<mpsc::UnboundedReceiver<Envelope>>> {
        Arc::clone(&self.mailboxes.entry(key).or_insert_with(Mailbox::new).rx)
    }
}

impl std::fmt::Debug for LocalFabric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFabric")
            .field("world_size", &self.world_size)
            .field("mailboxes", &self.mailboxes.len())
            .finish()
    }
}

/// One rank's endpoint on a [`LocalFabric`].
#[derive(Clone, Debug)]
pub struct LocalComm {
    rank: Rank,
    fabric: LocalFabric,
}

type Completion<'buf> = Box<dyn FnOnce() -> Result<Status, FabricError> + Send + 'buf>;

/// Request handle issued by [`LocalComm`].
pub struct LocalRequest<'buf> {
    state: RequestState<'buf>,
}

enum RequestState<'buf> {
    Complete(Status),
    Receiving(Completion<'buf>),
}

impl LocalRequest<'_> {
    fn complete(self) -> Result<Status, FabricError> {
        match self.state {
            RequestState::Complete(status) => Ok(status),
            RequestState::Receiving(completion) => completion(),
        }
    }
}

impl std::fmt::Debug for LocalRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            RequestState::Complete(_) => "complete",
            RequestState::Receiving(_) => "receiving",
        };
        f.debug_struct("LocalRequest").field("state", &state).finish()
    }
}

fn receive_into<T: Datatype>(
    mailbox: &Mutex<mpsc::UnboundedReceiver<Envelope>>,
    buf: &mut [T],
    source: Rank,
    tag: Tag,
) -> Result<Status, FabricError> {
    let envelope = mailbox
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .blocking_recv()
        .ok_or(FabricError::Disconnected { peer: source })?;
    let mismatch = FabricError::DatatypeMismatch {
        expected: T::TAG,
        found: envelope.datatype,
    };
    let payload = envelope
        .payload
        .downcast::<Vec<T>>()
        .map_err(|_| mismatch)?;
    let capacity = buf.len();
    let target = buf
        .get_mut(..payload.len())
        .ok_or(FabricError::Truncated {
            capacity,
            incoming: payload.len(),
        })?;
    target.copy_from_slice(&payload);
    Ok(Status::new(source, tag, payload.len()))
}

impl Communicator for LocalComm {
    type Error = FabricError;
    type Request<'buf> = LocalRequest<'buf>;

    fn rank(&self) -> Rank { self.rank }

    fn size(&self) -> usize { self.fabric.world_size }

    fn isend<'buf, T: Datatype>(
        &self,
        buf: &'buf [T],
        dest: Rank,
        tag: Tag,
    ) -> Result<Self::Request<'buf>, Self::Error> {
        self.fabric.check_rank(dest)?;
        let envelope = Envelope {
            datatype: T::TAG,
            payload: Box::new(buf.to_vec()),
        };
        self.fabric
            .sender((self.rank, dest, tag))
            .send(envelope)
            .map_err(|_| FabricError::Disconnected { peer: dest })?;
        Ok(LocalRequest {
            state: RequestState::Complete(Status::new(dest, tag, buf.len())),
        })
    }

    fn irecv<'buf, T: Datatype>(
        &self,
        buf: &'buf mut [T],
        source: Rank,
        tag: Tag,
    ) -> Result<Self::Request<'buf>, Self::Error> {
        self.fabric.check_rank(source)?;
        let mailbox = self.fabric.receiver((source, self.rank, tag));
        Ok(LocalRequest {
            state: RequestState::Receiving(Box::new(move || {
                receive_into(&mailbox, buf, source, tag)
            })),
        })
    }

    fn wait_all<'buf>(
        &self,
        requests: Vec<Self::Request<'buf>>,
    ) -> Result<Vec<Status>, Self::Error> {
        let mut statuses = Vec::with_capacity(requests.len());
        let mut first_error = None;
        for request in requests {
            match request.complete() {
                Ok(status) => statuses.push(status),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(statuses),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use rstest::rstest;

    use super::*;

    #[test]
    fn eager_send_is_received_after_the_sender_returns() {
        let fabric = LocalFabric::new(2);
        let comms = fabric.comms();
        comms[0]
            .send(&[1.5_f64, 2.5, 3.5], Rank::new(1), Tag::new(9))
            .expect("send");

        let mut buf = [0.0_f64; 3];
        let status = comms[1]
            .recv(&mut buf, Rank::new(0), Tag::new(9))
            .expect("recv");
        assert_eq!(buf, [1.5, 2.5, 3.5]);
        assert_eq!(status, Status::new(Rank::new(0), Tag::new(9), 3));
    }

    #[test]
    fn messages_on_one_key_arrive_in_issuance_order() {
        let fabric = LocalFabric::new(2);
        let comms = fabric.comms();
        for value in 0_u32..4 {
            comms[0]
                .send(&[value], Rank::new(1), Tag::new(0))
                .expect("send");
        }

        let received: Vec<u32> = (0..4)
            .map(|_| {
                let mut buf = [0_u32; 1];
                comms[1]
                    .recv(&mut buf, Rank::new(0), Tag::new(0))
                    .expect("recv");
                buf[0]
            })
            .collect();
        assert_eq!(received, vec![0, 1, 2, 3]);
    }

    #[test]
    fn tags_are_matched_independently() {
        let fabric = LocalFabric::new(2);
        let comms = fabric.comms();
        comms[0].send(&[1_u8], Rank::new(1), Tag::new(1)).expect("send");
        comms[0].send(&[2_u8], Rank::new(1), Tag::new(2)).expect("send");

        let mut second = [0_u8];
        let mut first = [0_u8];
        comms[1]
            .recv(&mut second, Rank::new(0), Tag::new(2))
            .expect("recv tag 2");
        comms[1]
            .recv(&mut first, Rank::new(0), Tag::new(1))
            .expect("recv tag 1");
        assert_eq!((first[0], second[0]), (1, 2));
    }

    #[test]
    fn receive_posted_before_send_completes_across_threads() {
        let fabric = LocalFabric::new(2);
        let mut comms = fabric.comms().into_iter();
        let sender = comms.next().expect("rank 0");
        let receiver = comms.next().expect("rank 1");

        let handle = thread::spawn(move || {
            let mut buf = vec![0_i64; 16];
            receiver
                .recv(&mut buf, Rank::new(0), Tag::new(3))
                .expect("recv");
            buf
        });
        let payload: Vec<i64> = (0..16).collect();
        sender
            .send(&payload, Rank::new(1), Tag::new(3))
            .expect("send");

        assert_eq!(handle.join().expect("receiver thread"), payload);
    }

    #[test]
    fn shorter_message_reports_its_own_count() {
        let fabric = LocalFabric::new(2);
        let comms = fabric.comms();
        comms[0]
            .send(&[4_u8, 5], Rank::new(1), Tag::new(0))
            .expect("send");

        let mut buf = [0_u8; 4];
        let status = comms[1]
            .recv(&mut buf, Rank::new(0), Tag::new(0))
            .expect("recv");
        assert_eq!(status.count, 2);
        assert_eq!(buf, [4, 5, 0, 0]);
    }

    #[test]
    fn longer_message_is_rejected_as_truncated() {
        let fabric = LocalFabric::new(2);
        let comms = fabric.comms();
        comms[0]
            .send(&[1_u8, 2, 3], Rank::new(1), Tag::new(0))
            .expect("send");

        let mut buf = [0_u8; 2];
        let err = comms[1]
            .recv(&mut buf, Rank::new(0), Tag::new(0))
            .expect_err("truncation");
        assert_eq!(
            err,
            FabricError::Truncated {
                capacity: 2,
                incoming: 3
            }
        );
    }

    #[test]
    fn mismatched_datatype_is_rejected() {
        let fabric = LocalFabric::new(2);
        let comms = fabric.comms();
        comms[0]
            .send(&[1_u32], Rank::new(1), Tag::new(0))
            .expect("send");

        let mut buf = [0.0_f32];
        let err = comms[1]
            .recv(&mut buf, Rank::new(0), Tag::new(0))
            .expect_err("datatype mismatch");
        assert_eq!(
            err,
            FabricError::DatatypeMismatch {
                expected: DatatypeTag::F32,
                found: DatatypeTag::U32,
            }
        );
    }

    #[rstest]
    #[case(2)]
    #[case(7)]
    fn unknown_peers_fail_at_issuance(#[case] peer: usize) {
        let fabric = LocalFabric::new(2);
        let comm = fabric.comm(Rank::new(0)).expect("rank 0");
        let err = comm
            .isend(&[0_u8], Rank::new(peer), Tag::new(0))
            .expect_err("unknown peer");
        assert_eq!(
            err,
            FabricError::UnknownPeer {
                rank: Rank::new(peer),
                world_size: 2
            }
        );
        assert!(fabric.comm(Rank::new(peer)).is_err());
    }
}
