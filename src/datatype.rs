//! Element datatypes carried by point-to-point transfers.
//!
//! [`Datatype`] is a sealed trait mapping the Rust primitives a communicator
//! can move to a [`DatatypeTag`]. The tag doubles as the datatype-size query
//! used when translating element offsets into byte offsets.

use derive_more::Display;

mod sealed {
    pub trait Sealed {}
}

/// Runtime descriptor for a [`Datatype`].
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum DatatypeTag {
    /// 32-bit floating point.
    #[display("f32")]
    F32,
    /// 64-bit floating point.
    #[display("f64")]
    F64,
    /// 8-bit signed integer.
    #[display("i8")]
    I8,
    /// 16-bit signed integer.
    #[display("i16")]
    I16,
    /// 32-bit signed integer.
    #[display("i32")]
    I32,
    /// 64-bit signed integer.
    #[display("i64")]
    I64,
    /// 8-bit unsigned integer.
    #[display("u8")]
    U8,
    /// 16-bit unsigned integer.
    #[display("u16")]
    U16,
    /// 32-bit unsigned integer.
    #[display("u32")]
    U32,
    /// 64-bit unsigned integer.
    #[display("u64")]
    U64,
}

impl DatatypeTag {
    /// Size in bytes of a single element of this datatype.
    #[must_use]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F64 | Self::I64 | Self::U64 => 8,
        }
    }
}

/// Element types that may be transferred through a
/// [`Communicator`](crate::comm::Communicator).
///
/// This trait is sealed; it is implemented for `f32`, `f64`, `i8`, `i16`,
/// `i32`, `i64`, `u8`, `u16`, `u32` and `u64`.
///
/// # Examples
///
/// ```
/// use fragmux::{Datatype, DatatypeTag};
/// assert_eq!(f64::TAG, DatatypeTag::F64);
/// assert_eq!(<u32 as Datatype>::TAG.size_in_bytes(), 4);
/// ```
pub trait Datatype: sealed::Sealed + Copy + Send + Sync + 'static {
    /// Descriptor for this element type.
    const TAG: DatatypeTag;
}

macro_rules! impl_datatype {
    ($ty:ty, $tag:expr) => {
        impl sealed::Sealed for $ty {}
        impl Datatype for $ty {
            const TAG: DatatypeTag = $tag;
        }
    };
}

impl_datatype!(f32, DatatypeTag::F32);
impl_datatype!(f64, DatatypeTag::F64);
impl_datatype!(i8, DatatypeTag::I8);
impl_datatype!(i16, DatatypeTag::I16);
impl_datatype!(i32, DatatypeTag::I32);
impl_datatype!(i64, DatatypeTag::I64);
impl_datatype!(u8, DatatypeTag::U8);
impl_datatype!(u16, DatatypeTag::U16);
impl_datatype!(u32, DatatypeTag::U32);
impl_datatype!(u64, DatatypeTag::U64);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn tag_of<T: Datatype>() -> DatatypeTag { T::TAG }

    #[rstest]
    #[case(tag_of::<f32>(), size_of::<f32>())]
    #[case(tag_of::<f64>(), size_of::<f64>())]
    #[case(tag_of::<i8>(), size_of::<i8>())]
    #[case(tag_of::<i16>(), size_of::<i16>())]
    #[case(tag_of::<i32>(), size_of::<i32>())]
    #[case(tag_of::<i64>(), size_of::<i64>())]
    #[case(tag_of::<u8>(), size_of::<u8>())]
    #[case(tag_of::<u16>(), size_of::<u16>())]
    #[case(tag_of::<u32>(), size_of::<u32>())]
    #[case(tag_of::<u64>(), size_of::<u64>())]
    fn size_query_matches_in_memory_layout(#[case] tag: DatatypeTag, #[case] expected: usize) {
        assert_eq!(tag.size_in_bytes(), expected);
    }

    #[test]
    fn tags_display_as_rust_type_names() {
        assert_eq!(DatatypeTag::F64.to_string(), "f64");
        assert_eq!(DatatypeTag::U8.to_string(), "u8");
        assert_eq!(DatatypeTag::I16.to_string(), "i16");
    }
}
