use super::{check_count, Allocate, Allocator};
use crate::error::AllocResult;
use crate::memory::{device_free, device_malloc, Device, DeviceCopy, DevicePointer};
use log::debug;
use std::fmt;
use std::marker::PhantomData;

/// Allocates uninitialized device memory through
/// [`device_malloc`](../memory/fn.device_malloc.html).
///
/// Identical to [`DeviceNewAllocator`](struct.DeviceNewAllocator.html) except that nothing is
/// written to fresh storage, so `T` needs no `Default`.
pub struct DeviceMallocAllocator<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> DeviceMallocAllocator<T> {
    /// Creates the allocator. This has no effect beyond producing the value.
    pub const fn new() -> Self {
        DeviceMallocAllocator {
            marker: PhantomData,
        }
    }
}

impl<T> Clone for DeviceMallocAllocator<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for DeviceMallocAllocator<T> {}

impl<T> Default for DeviceMallocAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DeviceMallocAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceMallocAllocator")
    }
}

impl<T, U> PartialEq<DeviceMallocAllocator<U>> for DeviceMallocAllocator<T> {
    fn eq(&self, _other: &DeviceMallocAllocator<U>) -> bool {
        true
    }
}
impl<T> Eq for DeviceMallocAllocator<T> {}

impl<T> Allocator for DeviceMallocAllocator<T> {
    type Value = T;
    type Space = Device;
    type Pointer = DevicePointer<T>;
    type Rebind<U> = DeviceMallocAllocator<U>;

    const IS_ALWAYS_EQUAL: bool = true;

    fn rebind<U>(&self) -> DeviceMallocAllocator<U> {
        DeviceMallocAllocator::new()
    }
}

impl<T: DeviceCopy> Allocate for DeviceMallocAllocator<T> {
    fn allocate(&self, count: usize) -> AllocResult<DevicePointer<T>> {
        check_count::<T>(count)?;
        let ptr = device_malloc::<T>(count)?;
        debug!("device malloc allocator: {} elements at {:?}", count, ptr);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: DevicePointer<T>, count: usize) {
        debug!("device malloc allocator: releasing {:?}", ptr);
        device_free(ptr, count)
    }
}

#[cfg(all(test, not(feature = "cuda")))]
mod tests {
    use super::*;
    use crate::error::AllocError;
    use crate::memory::{device_heap, SpaceMut, SpaceRef};

    #[test]
    fn allocate_write_read_release() {
        let alloc = DeviceMallocAllocator::<i32>::new();
        assert_eq!(alloc.max_size(), usize::MAX / 4);

        let ptr = alloc.allocate(10).unwrap();
        assert!(device_heap().contains(ptr));
        for i in 0..10 {
            let mut slot = unsafe { SpaceMut::from_ptr(ptr.add(i)) };
            slot.write(-(i as i32)).unwrap();
        }
        for i in 0..10 {
            let slot = unsafe { SpaceRef::from_ptr(ptr.add(i)) };
            assert_eq!(slot.read().unwrap(), -(i as i32));
        }
        unsafe { alloc.deallocate(ptr, 10) };
        assert!(!device_heap().contains(ptr));
    }

    #[test]
    fn accepts_types_without_default() {
        #[derive(Clone, Copy, Debug, PartialEq)]
        struct Handle(u32);
        unsafe impl DeviceCopy for Handle {}

        let alloc = DeviceMallocAllocator::<Handle>::new();
        let ptr = alloc.allocate(1).unwrap();
        let mut slot = unsafe { SpaceMut::from_ptr(ptr) };
        slot.write(Handle(3)).unwrap();
        assert_eq!(slot.read().unwrap(), Handle(3));
        unsafe { alloc.deallocate(ptr, 1) };
    }

    #[test]
    fn oversized_request_fails() {
        let alloc = DeviceMallocAllocator::<u16>::new();
        assert_eq!(
            alloc.allocate(alloc.max_size() + 1),
            Err(AllocError::SizeExceeded {
                requested: usize::MAX / 2 + 1,
                max_size: usize::MAX / 2,
            })
        );
    }

    #[test]
    fn rebind_and_equality() {
        let alloc = DeviceMallocAllocator::<u8>::new();
        let wide: DeviceMallocAllocator<u64> = alloc.rebind();
        assert!(alloc == wide);
        assert!(DeviceMallocAllocator::<u8>::IS_ALWAYS_EQUAL);
    }
}
