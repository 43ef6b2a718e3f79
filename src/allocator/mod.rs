//! Allocators over tagged memory spaces.
//!
//! An allocator here is a capability, not a resource owner. It names a value type, a memory
//! space and a pointer family. Allocating through it hands out storage from a
//! [`MemoryResource`](../memory/trait.MemoryResource.html) that lives elsewhere, so allocator
//! values are free to create, copy and share between threads.
//!
//! The surface is split in two:
//!
//! * [`Allocator`] carries the type-level part: value, space, pointer and [`Rebind`]. It is
//!   available for every value type, including `c_void`.
//! * [`Allocate`] adds `allocate`, `deallocate`, `address` and `max_size` for element types that
//!   can actually be stored.
//!
//! Four allocators are provided:
//!
//! | allocator | storage | equality |
//! |---|---|---|
//! | [`TaggedAllocator`] | any space's default resource | equal when the spaces match |
//! | [`DeviceNewAllocator`] | `device_new` / `device_delete` | always equal |
//! | [`DeviceMallocAllocator`] | `device_malloc` / `device_free` | always equal |
//! | [`ResourceAllocator`] | an explicit resource | equal when the resources are |
//!
//! [`Rebind`]: trait.Allocator.html#associatedtype.Rebind

use crate::error::{AllocError, AllocResult};
use crate::memory::{MemorySpace, PointerTraits, SpaceMut, SpaceRef};
use log::error;
use std::alloc::{handle_alloc_error, Layout};
use std::mem;

mod device_malloc;
mod device_new;
mod rebind;
mod resource;
mod tagged;

pub use self::device_malloc::*;
pub use self::device_new::*;
pub use self::rebind::*;
pub use self::resource::*;
pub use self::tagged::*;

/// The largest element count for which allocating `T`s could conceivably succeed.
///
/// This is `usize::MAX / size_of::<T>()`, or `usize::MAX` for zero-sized types.
pub const fn max_size_of<T>() -> usize {
    match mem::size_of::<T>() {
        0 => usize::MAX,
        size => usize::MAX / size,
    }
}

pub(crate) fn check_count<T>(count: usize) -> AllocResult<()> {
    let max_size = max_size_of::<T>();
    if count > max_size {
        Err(AllocError::SizeExceeded {
            requested: count,
            max_size,
        })
    } else {
        Ok(())
    }
}

/// The type-level description of an allocator.
pub trait Allocator: Clone {
    /// The element type this allocator hands out storage for.
    type Value;

    /// The memory space the storage lives in.
    type Space: MemorySpace;

    /// Pointer to an allocated element.
    type Pointer: PointerTraits<Element = Self::Value, Space = Self::Space>;

    /// The equivalent allocator for element type `U`: same space, same pointer family.
    ///
    /// Containers use this to allocate internal node types with the user's allocator.
    type Rebind<U>: Allocator<Value = U, Space = Self::Space>;

    /// True when any two instances compare equal, so storage from one may be freed through any
    /// other.
    const IS_ALWAYS_EQUAL: bool;

    /// Returns the allocator for element type `U`.
    fn rebind<U>(&self) -> Self::Rebind<U>;
}

/// Allocation operations.
pub trait Allocate: Allocator {
    /// Returns the largest `n` for which `allocate(n)` might succeed.
    fn max_size(&self) -> usize {
        max_size_of::<Self::Value>()
    }

    /// Returns the address of the element `r` refers to.
    fn address(&self, r: &SpaceRef<'_, Self::Value, Self::Space>) -> Self::Pointer {
        <Self::Pointer as PointerTraits>::from_space_ptr(r.as_ptr())
    }

    /// Returns the address of the element `r` refers to.
    fn address_mut(&self, r: &SpaceMut<'_, Self::Value, Self::Space>) -> Self::Pointer {
        <Self::Pointer as PointerTraits>::from_space_ptr(r.as_ptr())
    }

    /// Allocates storage for `count` elements.
    ///
    /// The storage must be released with [`deallocate`](#tymethod.deallocate), through this
    /// allocator or one equal to it.
    ///
    /// # Errors:
    ///
    /// `SizeExceeded` if `count > self.max_size()`, checked before any memory is requested;
    /// `OutOfMemory` if the space cannot provide the storage.
    fn allocate(&self, count: usize) -> AllocResult<Self::Pointer>;

    /// Releases storage obtained from [`allocate`](#tymethod.allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate(count)` on this allocator or one equal to it, and must not
    /// have been released already.
    unsafe fn deallocate(&self, ptr: Self::Pointer, count: usize);

    /// Like [`allocate`](#tymethod.allocate), but treats failure as fatal.
    ///
    /// The error is logged and the process's allocation error handler is invoked, which aborts
    /// by default.
    fn allocate_or_abort(&self, count: usize) -> Self::Pointer {
        match self.allocate(count) {
            Ok(ptr) => ptr,
            Err(e) => {
                error!(
                    "{} allocation of {} elements failed: {}",
                    Self::Space::NAME,
                    count,
                    e
                );
                let layout = Layout::array::<Self::Value>(count)
                    .unwrap_or_else(|_| Layout::new::<Self::Value>());
                handle_alloc_error(layout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Host, SpacePointer};

    #[test]
    fn max_size_divides_by_element_size() {
        assert_eq!(max_size_of::<u8>(), usize::MAX);
        assert_eq!(max_size_of::<i32>(), usize::MAX / 4);
        assert_eq!(max_size_of::<[u64; 3]>(), usize::MAX / 24);
        assert_eq!(max_size_of::<()>(), usize::MAX);
    }

    #[test]
    fn check_count_rejects_only_above_max() {
        assert!(check_count::<u32>(max_size_of::<u32>()).is_ok());
        let err = check_count::<u32>(max_size_of::<u32>() + 1).unwrap_err();
        assert!(err.is_bad_alloc());
    }

    #[test]
    fn allocate_or_abort_returns_the_pointer() {
        let alloc = TaggedAllocator::<u32, Host>::new();
        let ptr = alloc.allocate_or_abort(6);
        assert!(!ptr.is_null());
        let raw = ptr.as_host_ptr().unwrap();
        unsafe {
            raw.add(5).write(9);
            assert_eq!(*raw.add(5), 9);
            alloc.deallocate(ptr, 6);
        }

        let empty = alloc.allocate_or_abort(0);
        assert_eq!(empty, SpacePointer::dangling());
        unsafe { alloc.deallocate(empty, 0) };
    }
}
