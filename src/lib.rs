#![doc(html_root_url = "https://docs.rs/fragmux/latest")]
//! Public API for the `fragmux` library.
//!
//! This crate provides a transparent fragmentation layer for point-to-point
//! message passing. [`FragmentingComm`] wraps any [`Communicator`] and splits
//! each blocking transfer into fragments of a configured size, issues them as
//! overlapping non-blocking operations and joins them once, preserving the
//! all-or-nothing completion of an unfragmented transfer.

pub mod comm;
pub mod config;
pub mod datatype;
pub mod dispatch;
pub mod fragment;
pub mod fragmenting;
pub mod metrics;
pub mod pending;
pub mod test_helpers;

pub use comm::{Communicator, FabricError, LocalComm, LocalFabric, Rank, Status, Tag};
pub use config::{
    ConfigError,
    DEFAULT_FRAGMENT_SIZE,
    FRAGMENT_SIZE_ENV,
    FragmentationConfig,
    LEGACY_FRAGMENT_SIZE_ENV,
};
pub use datatype::{Datatype, DatatypeTag};
pub use dispatch::{Dispatcher, Inbound, Outbound};
pub use fragment::{FragmentDescriptor, FragmentIndex, FragmentPlan, Schedule, Step};
pub use fragmenting::FragmentingComm;
pub use metrics::{Direction, FRAGMENTS_ISSUED, TRANSFER_ERRORS, TRANSFERS_TOTAL, TransferKind};
pub use pending::{JoinedSet, PendingSet};
