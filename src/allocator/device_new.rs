use super::{check_count, Allocate, Allocator};
use crate::error::AllocResult;
use crate::memory::{device_delete, device_new, Device, DeviceCopy, DevicePointer};
use log::debug;
use std::fmt;
use std::marker::PhantomData;

/// Allocates device memory through [`device_new`](../memory/fn.device_new.html) and releases it
/// through [`device_delete`](../memory/fn.device_delete.html).
///
/// Every element of a fresh allocation holds `T::default()`. Callers should still treat the
/// storage as uninitialized: other allocators with the same interface make no such promise.
///
/// The allocator is stateless, so all instances compare equal and storage allocated through one
/// may be released through any other. Allocation is a host operation.
///
/// ```
/// use devalloc::allocator::{Allocate, DeviceNewAllocator};
/// use devalloc::memory::SpaceMut;
///
/// let alloc = DeviceNewAllocator::<i32>::new();
/// assert_eq!(alloc.max_size(), usize::MAX / 4);
///
/// let ptr = alloc.allocate(10).unwrap();
/// for i in 0..10 {
///     let mut slot = unsafe { SpaceMut::from_ptr(ptr.add(i)) };
///     slot.write(i as i32 * 3).unwrap();
///     assert_eq!(slot.read().unwrap(), i as i32 * 3);
/// }
/// unsafe { alloc.deallocate(ptr, 10) };
/// ```
pub struct DeviceNewAllocator<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> DeviceNewAllocator<T> {
    /// Creates the allocator. This has no effect beyond producing the value.
    pub const fn new() -> Self {
        DeviceNewAllocator {
            marker: PhantomData,
        }
    }
}

impl<T> Clone for DeviceNewAllocator<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for DeviceNewAllocator<T> {}

impl<T> Default for DeviceNewAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DeviceNewAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceNewAllocator")
    }
}

impl<T, U> PartialEq<DeviceNewAllocator<U>> for DeviceNewAllocator<T> {
    fn eq(&self, _other: &DeviceNewAllocator<U>) -> bool {
        true
    }
}
impl<T> Eq for DeviceNewAllocator<T> {}

impl<T> Allocator for DeviceNewAllocator<T> {
    type Value = T;
    type Space = Device;
    type Pointer = DevicePointer<T>;
    type Rebind<U> = DeviceNewAllocator<U>;

    const IS_ALWAYS_EQUAL: bool = true;

    fn rebind<U>(&self) -> DeviceNewAllocator<U> {
        DeviceNewAllocator::new()
    }
}

impl<T: DeviceCopy + Default + Clone> Allocate for DeviceNewAllocator<T> {
    fn allocate(&self, count: usize) -> AllocResult<DevicePointer<T>> {
        check_count::<T>(count)?;
        let ptr = device_new::<T>(count)?;
        debug!("device new allocator: {} elements at {:?}", count, ptr);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: DevicePointer<T>, count: usize) {
        debug!("device new allocator: releasing {:?}", ptr);
        device_delete(ptr, count)
    }
}

#[cfg(all(test, not(feature = "cuda")))]
mod tests {
    use super::*;
    use crate::memory::{device_heap, SpaceRef};

    #[test]
    fn storage_starts_defaulted() {
        let alloc = DeviceNewAllocator::<u16>::new();
        let ptr = alloc.allocate(5).unwrap();
        for i in 0..5 {
            let r = unsafe { SpaceRef::from_ptr(ptr.add(i)) };
            assert_eq!(r.read().unwrap(), 0);
        }
        unsafe { alloc.deallocate(ptr, 5) };
        assert!(!device_heap().contains(ptr));
    }

    #[test]
    fn instances_are_interchangeable() {
        let a = DeviceNewAllocator::<u64>::new();
        let b = a;
        let ptr = a.allocate(3).unwrap();
        assert!(a == b);
        unsafe { b.deallocate(ptr, 3) };
        assert!(!device_heap().contains(ptr));
    }

    #[test]
    fn rebind_keeps_the_family() {
        let alloc = DeviceNewAllocator::<u8>::new();
        let wide: DeviceNewAllocator<u64> = alloc.rebind();
        assert!(alloc == wide);
        assert_eq!(wide.max_size(), usize::MAX / 8);
    }
}
