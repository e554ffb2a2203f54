//! Utilities for exercising `fragmux` communicators in tests.
//!
//! [`run_ranks`] drives one closure per rank of an in-process fabric on its
//! own thread, so tests can write each side of an exchange as ordinary
//! blocking code. [`RecordingComm`] records issuances instead of moving data.
//!
//! ```rust
//! use fragmux::{Communicator, Rank, Tag};
//! use fragmux_testing::run_ranks;
//!
//! let results = run_ranks(2, |comm| {
//!     let peer = Rank::new(1 - comm.rank().get());
//!     let mut inbound = [0_u8; 3];
//!     comm.sendrecv(&[comm.rank().get() as u8; 3], peer, Tag::new(0), &mut inbound, peer, Tag::new(0))
//!         .unwrap();
//!     inbound
//! });
//! assert_eq!(results, vec![[1; 3], [0; 3]]);
//! ```

pub mod logging;
pub mod ranks;

pub use fragmux::test_helpers::{Issued, RecordedRequest, RecordingComm, RecordingError};
pub use logging::{LoggerHandle, logger};
pub use ranks::{fragment_config, run_fragmenting_ranks, run_ranks};
