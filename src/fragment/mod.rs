//! Fragment planning and interleaving.
//!
//! This module holds the pure parts of the fragmentation layer: the planner
//! partitioning an element count into fragments, and the schedule
//! interleaving an outbound and an inbound plan. Nothing here touches a
//! communicator.

pub mod index;
pub mod plan;
pub mod schedule;

pub use index::FragmentIndex;
pub use plan::{FragmentDescriptor, FragmentPlan};
pub use schedule::{Schedule, Step};

#[cfg(test)]
mod tests;
