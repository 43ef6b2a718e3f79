use crate::error::AllocResult;
use crate::memory::{DeviceCopy, MemorySpace, MemorySystem, SpacePointer};
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;

/// A shared reference to a `T` stored in memory space `S`.
///
/// The value cannot be borrowed directly, because device memory is not addressable by the host.
/// Instead the reference reads by copying through the space's transfer primitive.
pub struct SpaceRef<'a, T, S> {
    ptr: SpacePointer<T, S>,
    marker: PhantomData<&'a T>,
}

/// An exclusive reference to a `T` stored in memory space `S`.
pub struct SpaceMut<'a, T, S> {
    ptr: SpacePointer<T, S>,
    marker: PhantomData<&'a mut T>,
}

impl<'a, T, S: MemorySpace> SpaceRef<'a, T, S> {
    /// Creates a reference to the element at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an allocated, initialized `T` in space `S` that stays allocated and is
    /// not written through another path for `'a`.
    pub unsafe fn from_ptr(ptr: SpacePointer<T, S>) -> Self {
        SpaceRef {
            ptr,
            marker: PhantomData,
        }
    }

    /// The address of the referenced element.
    pub fn as_ptr(&self) -> SpacePointer<T, S> {
        self.ptr
    }

    /// Returns true if both references refer to the same element.
    pub fn ptr_eq(&self, other: &SpaceRef<'_, T, S>) -> bool {
        self.ptr == other.ptr
    }
}

impl<'a, T: DeviceCopy, S: MemorySystem> SpaceRef<'a, T, S> {
    /// Copies the referenced value to the host.
    pub fn read(&self) -> AllocResult<T> {
        read(self.ptr)
    }
}

impl<'a, T, S: MemorySpace> SpaceMut<'a, T, S> {
    /// Creates an exclusive reference to the element at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an allocated `T` in space `S` that stays allocated and is not accessed
    /// through another path for `'a`.
    pub unsafe fn from_ptr(ptr: SpacePointer<T, S>) -> Self {
        SpaceMut {
            ptr,
            marker: PhantomData,
        }
    }

    /// The address of the referenced element.
    pub fn as_ptr(&self) -> SpacePointer<T, S> {
        self.ptr
    }

    /// Reborrows as a shared reference.
    pub fn as_ref(&self) -> SpaceRef<'_, T, S> {
        unsafe { SpaceRef::from_ptr(self.ptr) }
    }
}

impl<'a, T: DeviceCopy, S: MemorySystem> SpaceMut<'a, T, S> {
    /// Copies the referenced value to the host.
    pub fn read(&self) -> AllocResult<T> {
        read(self.ptr)
    }

    /// Overwrites the referenced value.
    pub fn write(&mut self, value: T) -> AllocResult<()> {
        unsafe { S::copy_from_host(&value, self.ptr, 1) }
    }
}

fn read<T: DeviceCopy, S: MemorySystem>(ptr: SpacePointer<T, S>) -> AllocResult<T> {
    let mut value = MaybeUninit::<T>::uninit();
    unsafe {
        S::copy_to_host(ptr, value.as_mut_ptr(), 1)?;
        Ok(value.assume_init())
    }
}

impl<'a, T, S> Clone for SpaceRef<'a, T, S> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, T, S> Copy for SpaceRef<'a, T, S> {}

impl<'a, T, S: MemorySpace> fmt::Debug for SpaceRef<'a, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SpaceRef").field(&self.ptr).finish()
    }
}

impl<'a, T, S: MemorySpace> fmt::Debug for SpaceMut<'a, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SpaceMut").field(&self.ptr).finish()
    }
}

#[cfg(all(test, not(feature = "cuda")))]
mod tests {
    use super::*;
    use crate::memory::{device_free, device_malloc, Host, HostPointer};

    #[test]
    fn write_then_read_device() {
        let ptr = device_malloc::<u64>(1).unwrap();
        let mut r = unsafe { SpaceMut::from_ptr(ptr) };
        r.write(0xDEAD_BEEF).unwrap();
        assert_eq!(r.read().unwrap(), 0xDEAD_BEEF);
        assert_eq!(r.as_ref().read().unwrap(), 0xDEAD_BEEF);
        unsafe { device_free(ptr, 1) };
    }

    #[test]
    fn host_reference_sees_host_writes() {
        let mut value = 3i16;
        let ptr: HostPointer<i16> = unsafe { SpacePointer::wrap(&mut value) };
        let r: SpaceRef<'_, i16, Host> = unsafe { SpaceRef::from_ptr(ptr) };
        assert_eq!(r.read().unwrap(), 3);
    }

    #[test]
    fn ptr_eq_compares_addresses() {
        let ptr = device_malloc::<u8>(2).unwrap();
        unsafe {
            let a = SpaceRef::from_ptr(ptr);
            let b = SpaceRef::from_ptr(ptr);
            let c = SpaceRef::from_ptr(ptr.add(1));
            assert!(a.ptr_eq(&b));
            assert!(!a.ptr_eq(&c));
            device_free(ptr, 2);
        }
    }
}
