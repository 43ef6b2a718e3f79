//! devalloc-core holds the pieces of devalloc that carry no allocation machinery: the
//! `DeviceCopy` marker, the memory-space tags and the tagged pointer family.
//!
//! It is `no_std` so that crates compiled for the device can share these types with the host.
//! See devalloc for the allocators themselves.

#![no_std]
#![warn(
    missing_docs,
    missing_debug_implementations,
    unused_import_braces,
    unused_results,
    unused_qualifications
)]
#![allow(unknown_lints)]

#[macro_use]
extern crate bitflags;

mod pointer;
mod space;

pub use crate::pointer::*;
pub use crate::space::*;

use core::marker::PhantomData;
use core::num::*;

/// Marker trait for types whose values may live in any memory space.
///
/// A value may be placed in device memory when it can be duplicated by copying its bytes and
/// holds no reference to memory the device cannot see. Allocators only hand out storage for
/// `DeviceCopy` element types, and tagged references move values in and out of a space by
/// copying bytes.
///
/// ## Implementing DeviceCopy
///
/// Prefer the derive, which refuses to compile unless every field is `DeviceCopy` too:
///
/// ```
/// use devalloc::memory::DeviceCopy;
///
/// #[derive(Clone, DeviceCopy)]
/// struct Node {
///     value: u64,
///     next: u32,
/// }
/// ```
///
/// Heap-owning fields are rejected:
///
/// ```compile_fail
/// use devalloc::memory::DeviceCopy;
///
/// #[derive(Clone, DeviceCopy)]
/// struct Node(Vec<u64>);
/// ```
///
/// A manual `unsafe impl` is also possible when the derive cannot see the invariant.
///
/// `DeviceCopy` does not imply `Copy`: large structures can be stored on the device without
/// being implicitly copied on every assignment. Types with a `Drop` impl must never be
/// `DeviceCopy`, because device storage is released without running destructors.
pub unsafe trait DeviceCopy {}

macro_rules! impl_device_copy {
    ($($t:ty)*) => {
        $(
            unsafe impl DeviceCopy for $t {}
        )*
    }
}

impl_device_copy!(
    usize u8 u16 u32 u64 u128
    isize i8 i16 i32 i64 i128
    f32 f64
    bool char

    NonZeroU8 NonZeroU16 NonZeroU32 NonZeroU64 NonZeroU128 NonZeroUsize
    NonZeroI8 NonZeroI16 NonZeroI32 NonZeroI64 NonZeroI128 NonZeroIsize
);
unsafe impl DeviceCopy for () {}
unsafe impl<T: DeviceCopy> DeviceCopy for Option<T> {}
unsafe impl<L: DeviceCopy, R: DeviceCopy> DeviceCopy for Result<L, R> {}
unsafe impl<T: ?Sized> DeviceCopy for PhantomData<T> {}
unsafe impl<T: DeviceCopy> DeviceCopy for Wrapping<T> {}
unsafe impl<T: DeviceCopy, const N: usize> DeviceCopy for [T; N] {}

macro_rules! impl_device_copy_tuple {
    ($($name:ident)+) => {
        unsafe impl<$($name: DeviceCopy),+> DeviceCopy for ($($name,)+) {}
    }
}

impl_device_copy_tuple!(A);
impl_device_copy_tuple!(A B);
impl_device_copy_tuple!(A B C);
impl_device_copy_tuple!(A B C D);
impl_device_copy_tuple!(A B C D E);
impl_device_copy_tuple!(A B C D E F);
impl_device_copy_tuple!(A B C D E F G);
impl_device_copy_tuple!(A B C D E F G H);
