//! Zero-based fragment positioning within a transfer.
//!
//! Provides [`FragmentIndex`], the position of a fragment relative to the
//! other fragments travelling in the same direction.

use derive_more::{Display, From, Into};

/// Zero-based ordinal describing a fragment's position within its transfer.
///
/// # Examples
///
/// ```
/// use fragmux::fragment::FragmentIndex;
/// let index = FragmentIndex::new(3);
/// assert_eq!(index.get(), 3);
/// assert_eq!(index.next().get(), 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct FragmentIndex(usize);

impl FragmentIndex {
    /// Construct an index from a `usize` value.
    #[must_use]
    pub const fn new(value: usize) -> Self { Self(value) }

    /// Return the first valid fragment index.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> usize { self.0 }

    /// Return the index that follows this one.
    #[must_use]
    pub const fn next(self) -> Self { Self(self.0 + 1) }
}
