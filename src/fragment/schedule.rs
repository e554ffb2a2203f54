//! Interleaving of outbound and inbound fragments.
//!
//! A combined send-receive issues both of its plans through a single
//! [`Schedule`]. Even steps prefer an outbound fragment, odd steps an inbound
//! one, and once either direction is exhausted the other drains in order.
//! Each [`Step`] carries the descriptor of its own direction, so fragment
//! addressing never depends on the step number.

use std::{iter::FusedIterator, slice};

use super::{FragmentDescriptor, FragmentPlan};
use crate::metrics::Direction;

/// One issuance in a combined schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Issue the described fragment of the outbound plan.
    Outbound(FragmentDescriptor),
    /// Issue the described fragment of the inbound plan.
    Inbound(FragmentDescriptor),
}

impl Step {
    /// Direction the step travels in.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Outbound(_) => Direction::Outbound,
            Self::Inbound(_) => Direction::Inbound,
        }
    }

    /// Fragment issued by the step.
    #[must_use]
    pub const fn descriptor(self) -> FragmentDescriptor {
        match self {
            Self::Outbound(descriptor) | Self::Inbound(descriptor) => descriptor,
        }
    }
}

/// Alternating issuance order over an outbound and an inbound plan.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use fragmux::{Direction, fragment::{FragmentPlan, Schedule}};
///
/// let size = NonZeroUsize::new(4).unwrap();
/// let outbound = FragmentPlan::new(12, size);
/// let inbound = FragmentPlan::new(4, size);
/// let order: Vec<Direction> = Schedule::new(&outbound, &inbound)
///     .map(|step| step.direction())
///     .collect();
/// assert_eq!(
///     order,
///     vec![Direction::Outbound, Direction::Inbound, Direction::Outbound, Direction::Outbound]
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Schedule<'plan> {
    outbound: slice::Iter<'plan, FragmentDescriptor>,
    inbound: slice::Iter<'plan, FragmentDescriptor>,
    step: usize,
}

impl<'plan> Schedule<'plan> {
    /// Interleave `outbound` with `inbound`.
    #[must_use]
    pub fn new(outbound: &'plan FragmentPlan, inbound: &'plan FragmentPlan) -> Self {
        Self {
            outbound: outbound.iter(),
            inbound: inbound.iter(),
            step: 0,
        }
    }
}

impl Iterator for Schedule<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Self::Item> {
        let prefer_outbound = self.step % 2 == 0 && !self.outbound.as_slice().is_empty();
        let next = if prefer_outbound {
            self.outbound.next().copied().map(Step::Outbound)
        } else if let Some(descriptor) = self.inbound.next() {
            Some(Step::Inbound(*descriptor))
        } else {
            self.outbound.next().copied().map(Step::Outbound)
        };
        if next.is_some() {
            self.step += 1;
        }
        next
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.outbound.len() + self.inbound.len();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Schedule<'_> {}

impl FusedIterator for Schedule<'_> {}
