//! Metric helpers for `fragmux`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers compile to no-ops.

use derive_more::Display;

/// Name of the counter tracking issued fragments.
pub const FRAGMENTS_ISSUED: &str = "fragmux_fragments_issued_total";
/// Name of the counter tracking fragmented transfer calls.
pub const TRANSFERS_TOTAL: &str = "fragmux_transfers_total";
/// Name of the counter tracking failed fragmented transfer calls.
pub const TRANSFER_ERRORS: &str = "fragmux_transfer_errors_total";

/// Direction a fragment travels in.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Data received from a peer.
    #[display("inbound")]
    Inbound,
    /// Data sent to a peer.
    #[display("outbound")]
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Kind of fragmented transfer call.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum TransferKind {
    /// Blocking send.
    #[display("send")]
    Send,
    /// Blocking receive.
    #[display("recv")]
    Recv,
    /// Blocking combined send-receive.
    #[display("sendrecv")]
    SendRecv,
}

impl TransferKind {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            TransferKind::Send => "send",
            TransferKind::Recv => "recv",
            TransferKind::SendRecv => "sendrecv",
        }
    }
}

/// Record an issued fragment travelling in `direction`.
#[cfg(feature = "metrics")]
pub fn inc_fragments(direction: Direction) {
    metrics::counter!(FRAGMENTS_ISSUED, "direction" => direction.as_str()).increment(1);
}

/// Record a fragmented transfer call.
#[cfg(feature = "metrics")]
pub fn inc_transfers(kind: TransferKind) {
    metrics::counter!(TRANSFERS_TOTAL, "kind" => kind.as_str()).increment(1);
}

/// Record a failed fragmented transfer call.
#[cfg(feature = "metrics")]
pub fn inc_transfer_errors() { metrics::counter!(TRANSFER_ERRORS).increment(1); }

/// Record an issued fragment travelling in `direction`.
#[cfg(not(feature = "metrics"))]
pub fn inc_fragments(_direction: Direction) {}

/// Record a fragmented transfer call.
#[cfg(not(feature = "metrics"))]
pub fn inc_transfers(_kind: TransferKind) {}

/// Record a failed fragmented transfer call.
#[cfg(not(feature = "metrics"))]
pub fn inc_transfer_errors() {}
