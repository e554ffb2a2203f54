//! Partitioning of a transfer into fixed-size fragments.
//!
//! [`FragmentPlan`] splits `total` elements into `floor(total / size)`
//! fragments of `size` elements each, with the last fragment absorbing the
//! remainder. A non-empty transfer smaller than one fragment still yields a
//! single fragment carrying every element.

use std::{num::NonZeroUsize, ops::Range};

use super::FragmentIndex;

/// Position and extent of one fragment, in elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FragmentDescriptor {
    index: FragmentIndex,
    offset: usize,
    count: usize,
}

impl FragmentDescriptor {
    /// Construct a descriptor for `count` elements starting at `offset`.
    #[must_use]
    pub const fn new(index: FragmentIndex, offset: usize, count: usize) -> Self {
        Self {
            index,
            offset,
            count,
        }
    }

    /// Position of the fragment among the fragments of its transfer.
    #[must_use]
    pub const fn index(&self) -> FragmentIndex { self.index }

    /// Element offset of the fragment's first element.
    #[must_use]
    pub const fn offset(&self) -> usize { self.offset }

    /// Number of elements carried by the fragment.
    #[must_use]
    pub const fn count(&self) -> usize { self.count }

    /// Element offset one past the fragment's last element.
    #[must_use]
    pub const fn end(&self) -> usize { self.offset + self.count }

    /// Element range covered by the fragment.
    #[must_use]
    pub const fn range(&self) -> Range<usize> { self.offset..self.end() }

    /// Byte offset of the fragment for elements of `datatype_size` bytes.
    #[must_use]
    pub const fn byte_offset(&self, datatype_size: usize) -> usize { self.offset * datatype_size }
}

/// Ordered fragments covering a transfer exactly once.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use fragmux::fragment::FragmentPlan;
///
/// let plan = FragmentPlan::new(10_000, NonZeroUsize::new(4096).unwrap());
/// let counts: Vec<usize> = plan.iter().map(|f| f.count()).collect();
/// assert_eq!(counts, vec![4096, 5904]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentPlan {
    total: usize,
    fragment_size: NonZeroUsize,
    fragments: Vec<FragmentDescriptor>,
}

impl FragmentPlan {
    /// Plan a transfer of `total` elements in fragments of `fragment_size`.
    #[must_use]
    pub fn new(total: usize, fragment_size: NonZeroUsize) -> Self {
        let size = fragment_size.get();
        let fragment_count = fragment_count(total, size);
        let fragments = (0..fragment_count)
            .map(|position| {
                let offset = position * size;
                let count = if position + 1 == fragment_count {
                    total - offset
                } else {
                    size
                };
                FragmentDescriptor::new(FragmentIndex::new(position), offset, count)
            })
            .collect();
        Self {
            total,
            fragment_size,
            fragments,
        }
    }

    /// Total number of elements covered by the plan.
    #[must_use]
    pub const fn total(&self) -> usize { self.total }

    /// Fragment size the plan was built with.
    #[must_use]
    pub const fn fragment_size(&self) -> NonZeroUsize { self.fragment_size }

    /// Number of fragments in the plan.
    #[must_use]
    pub fn len(&self) -> usize { self.fragments.len() }

    /// Whether the plan is empty, which happens only for empty transfers.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.fragments.is_empty() }

    /// Whether the transfer needs more than one fragment.
    #[must_use]
    pub fn is_fragmented(&self) -> bool { self.len() > 1 }

    /// Return the fragments as a slice.
    #[must_use]
    pub fn fragments(&self) -> &[FragmentDescriptor] { self.fragments.as_slice() }

    /// Iterate over the fragments in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, FragmentDescriptor> { self.fragments.iter() }
}

impl<'plan> IntoIterator for &'plan FragmentPlan {
    type Item = &'plan FragmentDescriptor;
    type IntoIter = std::slice::Iter<'plan, FragmentDescriptor>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// Floor division clamped to one fragment for any non-empty transfer.
fn fragment_count(total: usize, size: usize) -> usize {
    if total == 0 { 0 } else { (total / size).max(1) }
}
