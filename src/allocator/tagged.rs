use super::{check_count, Allocate, Allocator};
use crate::error::AllocResult;
use crate::memory::{
    space_free, space_malloc, DeviceCopy, MemorySpace, MemorySystem, PointerTraits, SpacePointer,
};
use log::debug;
use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;

/// An allocator whose pointer type comes from a pointer family `P` rather than being fixed.
///
/// `T` is the element type, `S` the memory space and `P` any pointer of the family, usually the
/// family's `c_void` pointer. The allocator's pointer is `P` rebound to `T`, so rebinding the
/// allocator to another element type keeps both the space and the family.
///
/// Tagged allocators are stateless: any two with the same space compare equal, whatever their
/// element types, and comparing allocators of different spaces does not compile.
///
/// ```
/// use devalloc::allocator::{Allocate, Allocator, TaggedAllocator};
/// use devalloc::memory::{Device, SpaceMut};
///
/// let alloc = TaggedAllocator::<f32, Device>::new();
/// let ptr = alloc.allocate(2).unwrap();
/// let mut slot = unsafe { SpaceMut::from_ptr(ptr) };
/// slot.write(1.5).unwrap();
/// assert_eq!(alloc.address_mut(&slot), ptr);
/// assert!(alloc == alloc.rebind::<u8>());
/// unsafe { alloc.deallocate(ptr, 2) };
/// ```
///
/// The `c_void` form only describes types and can be rebound, but cannot allocate:
///
/// ```compile_fail
/// use devalloc::allocator::{Allocate, TaggedAllocator};
/// use devalloc::memory::Device;
/// use std::ffi::c_void;
///
/// let alloc = TaggedAllocator::<c_void, Device>::new();
/// let _ = alloc.allocate(1);
/// ```
pub struct TaggedAllocator<T, S, P = SpacePointer<c_void, S>> {
    marker: PhantomData<fn() -> (T, S, P)>,
}

impl<T, S, P> TaggedAllocator<T, S, P> {
    /// Creates the allocator. This has no effect beyond producing the value.
    pub const fn new() -> Self {
        TaggedAllocator {
            marker: PhantomData,
        }
    }
}

impl<T, S, P> Clone for TaggedAllocator<T, S, P> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T, S, P> Copy for TaggedAllocator<T, S, P> {}

impl<T, S, P> Default for TaggedAllocator<T, S, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: MemorySpace, P> fmt::Debug for TaggedAllocator<T, S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaggedAllocator<{}>", S::NAME)
    }
}

impl<T, U, S, P, Q> PartialEq<TaggedAllocator<U, S, Q>> for TaggedAllocator<T, S, P> {
    fn eq(&self, _other: &TaggedAllocator<U, S, Q>) -> bool {
        true
    }
}
impl<T, S, P> Eq for TaggedAllocator<T, S, P> {}

impl<T, S: MemorySpace, P: PointerTraits<Space = S>> Allocator for TaggedAllocator<T, S, P> {
    type Value = T;
    type Space = S;
    type Pointer = P::Rebind<T>;
    type Rebind<U> = TaggedAllocator<U, S, P>;

    const IS_ALWAYS_EQUAL: bool = true;

    fn rebind<U>(&self) -> TaggedAllocator<U, S, P> {
        TaggedAllocator::new()
    }
}

impl<T: DeviceCopy, S: MemorySystem, P: PointerTraits<Space = S>> Allocate
    for TaggedAllocator<T, S, P>
{
    fn allocate(&self, count: usize) -> AllocResult<Self::Pointer> {
        check_count::<T>(count)?;
        let ptr = space_malloc::<T, S>(count)?;
        debug!("tagged {} allocator: {} elements at {:?}", S::NAME, count, ptr);
        Ok(<Self::Pointer as PointerTraits>::from_space_ptr(ptr))
    }

    unsafe fn deallocate(&self, ptr: Self::Pointer, count: usize) {
        let ptr = ptr.into_space_ptr();
        debug!("tagged {} allocator: releasing {:?}", S::NAME, ptr);
        space_free::<T, S>(ptr, count)
    }
}
