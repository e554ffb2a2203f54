//! Fragmenting decorator for any [`Communicator`].
//!
//! [`FragmentingComm`] implements [`Communicator`] by wrapping another
//! implementation. Its blocking `send`, `recv` and `sendrecv` split each
//! transfer into fragments of the configured size, while the non-blocking
//! primitives pass straight through. Errors are the wrapped communicator's
//! own, so callers cannot tell a fragmented failure from an unfragmented one.

use crate::{
    Datatype,
    comm::{Communicator, Rank, Status, Tag},
    config::{ConfigError, FragmentationConfig},
    dispatch::{Dispatcher, Inbound, Outbound},
    metrics::Direction,
};

/// [`Communicator`] splitting blocking transfers into fragments.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use fragmux::{Communicator, FragmentationConfig, FragmentingComm, LocalFabric, Rank, Tag};
///
/// let fabric = LocalFabric::new(1);
/// let config = FragmentationConfig::new(NonZeroUsize::new(4).unwrap());
/// let comm = FragmentingComm::new(fabric.comm(Rank::new(0)).unwrap(), config);
///
/// let outbound: Vec<u32> = (0..10).collect();
/// let mut inbound = vec![0_u32; 10];
/// comm.send(&outbound, Rank::new(0), Tag::new(1)).unwrap();
/// let status = comm.recv(&mut inbound, Rank::new(0), Tag::new(1)).unwrap();
/// assert_eq!(status.count, 10);
/// assert_eq!(inbound, outbound);
/// ```
#[derive(Clone, Debug)]
pub struct FragmentingComm<C> {
    inner: C,
    config: FragmentationConfig,
}

impl<C: Communicator> FragmentingComm<C> {
    /// Wrap `inner`, fragmenting with `config`.
    #[must_use]
    pub const fn new(inner: C, config: FragmentationConfig) -> Self { Self { inner, config } }

    /// Wrap `inner`, reading the fragment size from the process environment.
    ///
    /// Call this once at start-up, before the first transfer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configured fragment size is invalid.
    pub fn init(inner: C) -> Result<Self, ConfigError> {
        Ok(Self::new(inner, FragmentationConfig::from_env()?))
    }

    /// Configuration used for every transfer.
    #[must_use]
    pub const fn config(&self) -> FragmentationConfig { self.config }

    /// Return the wrapped communicator.
    #[must_use]
    pub const fn inner(&self) -> &C { &self.inner }

    /// Consume the decorator, returning the wrapped communicator.
    #[must_use]
    pub fn into_inner(self) -> C { self.inner }

    fn dispatcher(&self) -> Dispatcher<'_, C> { Dispatcher::new(&self.inner, self.config) }
}

impl<C: Communicator> Communicator for FragmentingComm<C> {
    type Error = C::Error;
    type Request<'buf> = C::Request<'buf>;

    fn rank(&self) -> Rank { self.inner.rank() }

    fn size(&self) -> usize { self.inner.size() }

    fn isend<'buf, T: Datatype>(
        &self,
        buf: &'buf [T],
        dest: Rank,
        tag: Tag,
    ) -> Result<Self::Request<'buf>, Self::Error> {
        self.inner.isend(buf, dest, tag)
    }

    fn irecv<'buf, T: Datatype>(
        &self,
        buf: &'buf mut [T],
        source: Rank,
        tag: Tag,
    ) -> Result<Self::Request<'buf>, Self::Error> {
        self.inner.irecv(buf, source, tag)
    }

    fn wait_all<'buf>(
        &self,
        requests: Vec<Self::Request<'buf>>,
    ) -> Result<Vec<Status>, Self::Error> {
        self.inner.wait_all(requests)
    }

    fn send<T: Datatype>(&self, buf: &[T], dest: Rank, tag: Tag) -> Result<(), Self::Error> {
        self.dispatcher()
            .send(Outbound::new(buf, dest, tag))
            .map(drop)
    }

    fn recv<T: Datatype>(
        &self,
        buf: &mut [T],
        source: Rank,
        tag: Tag,
    ) -> Result<Status, Self::Error> {
        self.dispatcher()
            .recv(Inbound::new(buf, source, tag))
            .map(|joined| joined.aggregate(Direction::Inbound, source, tag))
    }

    fn sendrecv<'buf, T: Datatype, U: Datatype>(
        &self,
        send_buf: &'buf [T],
        dest: Rank,
        send_tag: Tag,
        recv_buf: &'buf mut [U],
        source: Rank,
        recv_tag: Tag,
    ) -> Result<Status, Self::Error> {
        self.dispatcher()
            .send_recv(
                Outbound::new(send_buf, dest, send_tag),
                Inbound::new(recv_buf, source, recv_tag),
            )
            .map(|joined| joined.aggregate(Direction::Inbound, source, recv_tag))
    }
}
