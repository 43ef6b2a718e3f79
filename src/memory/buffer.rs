use crate::allocator::Allocate;
use crate::error::{AllocError, AllocResult};
use crate::memory::malloc::fill;
use crate::memory::{DeviceCopy, MemorySystem, PointerTraits, SpaceMut, SpacePointer, SpaceRef};
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr;
use std::slice;

/*
A buffer owns one allocation made through an allocator and hands it back on drop. It knows
nothing about the space beyond what the allocator's types say, so the same code serves host,
device and unified memory, and any resource an allocator draws from.
*/

/// Fixed-size buffer of `T` allocated through `A`.
///
/// The buffer keeps its allocator and returns the storage to it on drop. Elements are reached
/// through tagged references, or as a plain slice when the space is host-accessible.
///
/// A container storing something other than the user's element type rebinds the user's
/// allocator first:
///
/// ```
/// use devalloc::allocator::{Allocator, TaggedAllocator};
/// use devalloc::memory::{Device, DeviceCopy, SpaceBuffer};
///
/// #[derive(Clone, Copy, Debug, PartialEq, DeviceCopy)]
/// struct Node {
///     value: i32,
///     next: u32,
/// }
///
/// let user_alloc = TaggedAllocator::<i32, Device>::new();
/// let nodes = [Node { value: 1, next: 1 }, Node { value: 2, next: u32::MAX }];
/// let buffer = SpaceBuffer::from_slice_in(&nodes, user_alloc.rebind::<Node>()).unwrap();
/// assert_eq!(buffer.to_vec().unwrap(), nodes);
/// ```
pub struct SpaceBuffer<T, A: Allocate<Value = T>> {
    ptr: A::Pointer,
    len: usize,
    alloc: A,
}

impl<T: DeviceCopy, A: Allocate<Value = T>> SpaceBuffer<T, A>
where
    A::Space: MemorySystem,
{
    /// Allocates a buffer of `len` elements without initializing them.
    ///
    /// # Safety
    ///
    /// The caller must initialize every element before reading it.
    pub unsafe fn uninitialized_in(len: usize, alloc: A) -> AllocResult<Self> {
        let ptr = alloc.allocate(len)?;
        Ok(SpaceBuffer { ptr, len, alloc })
    }

    /// Allocates a buffer the size of `slice` and copies the slice into it.
    pub fn from_slice_in(slice: &[T], alloc: A) -> AllocResult<Self> {
        unsafe {
            let mut buffer = Self::uninitialized_in(slice.len(), alloc)?;
            buffer.copy_from(slice)?;
            Ok(buffer)
        }
    }

    /// Allocates a buffer of `len` elements, each a copy of `value`.
    pub fn filled_in(value: &T, len: usize, alloc: A) -> AllocResult<Self>
    where
        T: Clone,
    {
        unsafe {
            let buffer = Self::uninitialized_in(len, alloc)?;
            fill(buffer.space_ptr(), value, len)?;
            Ok(buffer)
        }
    }

    /// Returns a reference to the element at `index`, or `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<SpaceRef<'_, T, A::Space>> {
        if index < self.len {
            Some(unsafe { SpaceRef::from_ptr(self.space_ptr().add(index)) })
        } else {
            None
        }
    }

    /// Returns an exclusive reference to the element at `index`, or `None` if out of bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<SpaceMut<'_, T, A::Space>> {
        if index < self.len {
            Some(unsafe { SpaceMut::from_ptr(self.space_ptr().add(index)) })
        } else {
            None
        }
    }

    /// Copies `source` into the buffer. `source` must be the same length as the buffer.
    pub fn copy_from(&mut self, source: &[T]) -> AllocResult<()> {
        self.check_len(source.len())?;
        unsafe { A::Space::copy_from_host(source.as_ptr(), self.space_ptr(), self.len) }
    }

    /// Copies the buffer into `dest`. `dest` must be the same length as the buffer.
    pub fn copy_to(&self, dest: &mut [T]) -> AllocResult<()> {
        self.check_len(dest.len())?;
        unsafe { A::Space::copy_to_host(self.space_ptr(), dest.as_mut_ptr(), self.len) }
    }

    /// Copies the buffer into a new `Vec`.
    pub fn to_vec(&self) -> AllocResult<Vec<T>> {
        let mut host = Vec::with_capacity(self.len);
        unsafe {
            A::Space::copy_to_host(self.space_ptr(), host.as_mut_ptr(), self.len)?;
            host.set_len(self.len);
        }
        Ok(host)
    }

    /// Views the buffer as a slice, if its space is host-accessible.
    pub fn as_host_slice(&self) -> Option<&[T]> {
        self.space_ptr()
            .as_host_ptr()
            .map(|p| unsafe { slice::from_raw_parts(p as *const T, self.len) })
    }

    /// Views the buffer as a mutable slice, if its space is host-accessible.
    pub fn as_host_slice_mut(&mut self) -> Option<&mut [T]> {
        let len = self.len;
        self.space_ptr()
            .as_host_ptr()
            .map(|p| unsafe { slice::from_raw_parts_mut(p, len) })
    }

    fn check_len(&self, found: usize) -> AllocResult<()> {
        if found == self.len {
            Ok(())
        } else {
            Err(AllocError::LengthMismatch {
                expected: self.len,
                found,
            })
        }
    }
}

impl<T, A: Allocate<Value = T>> SpaceBuffer<T, A> {
    /// Creates a `SpaceBuffer` from the raw parts of another buffer.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by `alloc` (or an allocator equal to it) for exactly `len`
    /// elements, and ownership passes to the buffer.
    pub unsafe fn from_raw_parts_in(ptr: A::Pointer, len: usize, alloc: A) -> Self {
        SpaceBuffer { ptr, len, alloc }
    }

    /// Consumes the buffer without freeing it, returning the pointer, length and allocator.
    ///
    /// The caller becomes responsible for deallocating the storage, for example by rebuilding a
    /// buffer with [`from_raw_parts_in`](#method.from_raw_parts_in).
    pub fn into_raw_parts(self) -> (A::Pointer, usize, A) {
        let this = ManuallyDrop::new(self);
        let alloc = unsafe { ptr::read(&this.alloc) };
        (this.ptr, this.len, alloc)
    }

    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pointer to the first element.
    pub fn as_ptr(&self) -> A::Pointer {
        self.ptr
    }

    /// The allocator the buffer was allocated with.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    fn space_ptr(&self) -> SpacePointer<T, A::Space> {
        self.ptr.into_space_ptr()
    }
}

impl<T, A: Allocate<Value = T>> Drop for SpaceBuffer<T, A> {
    fn drop(&mut self) {
        unsafe { self.alloc.deallocate(self.ptr, self.len) };
        self.len = 0;
    }
}

impl<T, A: Allocate<Value = T> + fmt::Debug> fmt::Debug for SpaceBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceBuffer")
            .field("ptr", &self.space_ptr())
            .field("len", &self.len)
            .field("alloc", &self.alloc)
            .finish()
    }
}

#[cfg(all(test, not(feature = "cuda")))]
mod tests {
    use super::*;
    use crate::allocator::{Allocator, DeviceNewAllocator, ResourceAllocator, TaggedAllocator};
    use crate::memory::{Device, Host, SpaceHeap, Unified};

    #[test]
    fn round_trips_through_device() {
        let data: Vec<u32> = (0..100).collect();
        let buffer = SpaceBuffer::from_slice_in(&data, DeviceNewAllocator::new()).unwrap();
        assert_eq!(buffer.len(), 100);
        assert!(buffer.as_host_slice().is_none());
        assert_eq!(buffer.to_vec().unwrap(), data);
    }

    #[test]
    fn element_access() {
        let mut buffer =
            SpaceBuffer::filled_in(&7i64, 4, TaggedAllocator::<i64, Device>::new()).unwrap();
        buffer.get_mut(2).unwrap().write(-1).unwrap();
        assert_eq!(buffer.get(2).unwrap().read().unwrap(), -1);
        assert_eq!(buffer.get(3).unwrap().read().unwrap(), 7);
        assert!(buffer.get(4).is_none());

        let alloc = *buffer.allocator();
        let r = buffer.get(1).unwrap();
        assert_eq!(alloc.address(&r), unsafe { buffer.as_ptr().add(1) });
    }

    #[test]
    fn length_mismatch_is_reported() {
        let mut buffer =
            SpaceBuffer::filled_in(&0u8, 3, TaggedAllocator::<u8, Device>::new()).unwrap();
        assert_eq!(
            buffer.copy_from(&[1, 2]),
            Err(AllocError::LengthMismatch {
                expected: 3,
                found: 2
            })
        );
        let mut out = [0u8; 4];
        assert!(buffer.copy_to(&mut out).is_err());
    }

    #[test]
    fn host_accessible_spaces_expose_slices() {
        let mut buffer =
            SpaceBuffer::from_slice_in(&[1u16, 2, 3], TaggedAllocator::<u16, Unified>::new())
                .unwrap();
        buffer.as_host_slice_mut().unwrap()[0] = 10;
        assert_eq!(buffer.as_host_slice().unwrap(), &[10, 2, 3]);

        let host = SpaceBuffer::from_slice_in(&[4u16], TaggedAllocator::<u16, Host>::new()).unwrap();
        assert_eq!(host.as_host_slice().unwrap(), &[4]);
    }

    #[test]
    fn drop_returns_storage() {
        let heap: SpaceHeap<Device> = SpaceHeap::new();
        {
            let buffer =
                SpaceBuffer::from_slice_in(&[1.0f32; 8], ResourceAllocator::new(&heap)).unwrap();
            assert!(heap.contains(buffer.space_ptr()));
            assert_eq!(heap.stats().live_bytes, 32);
        }
        assert_eq!(heap.stats().live_blocks, 0);
    }

    #[test]
    fn raw_parts_round_trip() {
        let heap: SpaceHeap<Device> = SpaceHeap::new();
        let buffer = SpaceBuffer::from_slice_in(&[5u8; 5], ResourceAllocator::new(&heap)).unwrap();
        let (ptr, len, alloc) = buffer.into_raw_parts();
        assert_eq!(heap.stats().live_blocks, 1);

        let buffer = unsafe { SpaceBuffer::from_raw_parts_in(ptr, len, alloc) };
        assert_eq!(buffer.to_vec().unwrap(), vec![5u8; 5]);
        drop(buffer);
        assert_eq!(heap.stats().live_blocks, 0);
    }

    #[test]
    fn empty_buffers_allocate_nothing() {
        let heap: SpaceHeap<Device> = SpaceHeap::new();
        let buffer = SpaceBuffer::<u64, _>::from_slice_in(&[], ResourceAllocator::new(&heap)).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.to_vec().unwrap(), Vec::<u64>::new());
        assert_eq!(heap.stats().total_allocations, 0);
    }

    #[test]
    fn rebinding_for_internal_nodes() {
        let user: TaggedAllocator<u32, Device> = TaggedAllocator::new();
        let nodes = SpaceBuffer::filled_in(&(0u32, 0u64), 2, user.rebind::<(u32, u64)>()).unwrap();
        assert!(*nodes.allocator() == user);
    }
}
