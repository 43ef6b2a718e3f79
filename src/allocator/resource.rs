use super::{check_count, Allocate, Allocator};
use crate::error::AllocResult;
use crate::memory::{space_free_in, space_malloc_in, DeviceCopy, MemoryResource, SpacePointer};
use log::debug;
use std::fmt;
use std::marker::PhantomData;

/// An allocator that draws from a specific [`MemoryResource`].
///
/// The resource owns the allocation state; the allocator is a borrowed handle to it and stays as
/// cheap to copy as the stateless allocators. Two resource allocators compare equal when their
/// resources do, regardless of element type.
///
/// [`MemoryResource`]: ../memory/trait.MemoryResource.html
pub struct ResourceAllocator<'r, T, R> {
    resource: &'r R,
    marker: PhantomData<fn() -> T>,
}

impl<'r, T, R> ResourceAllocator<'r, T, R> {
    /// Creates an allocator drawing from `resource`.
    pub fn new(resource: &'r R) -> Self {
        ResourceAllocator {
            resource,
            marker: PhantomData,
        }
    }

    /// The resource this allocator draws from.
    pub fn resource(&self) -> &'r R {
        self.resource
    }
}

impl<'r, T, R> Clone for ResourceAllocator<'r, T, R> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'r, T, R> Copy for ResourceAllocator<'r, T, R> {}

impl<'r, T, R> fmt::Debug for ResourceAllocator<'r, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceAllocator")
            .field(&(self.resource as *const R))
            .finish()
    }
}

impl<'r, 's, T, U, R: MemoryResource> PartialEq<ResourceAllocator<'s, U, R>>
    for ResourceAllocator<'r, T, R>
{
    fn eq(&self, other: &ResourceAllocator<'s, U, R>) -> bool {
        self.resource.is_equal(other.resource)
    }
}

impl<'r, T, R: MemoryResource> Allocator for ResourceAllocator<'r, T, R> {
    type Value = T;
    type Space = R::Space;
    type Pointer = SpacePointer<T, R::Space>;
    type Rebind<U> = ResourceAllocator<'r, U, R>;

    const IS_ALWAYS_EQUAL: bool = false;

    fn rebind<U>(&self) -> ResourceAllocator<'r, U, R> {
        ResourceAllocator::new(self.resource)
    }
}

impl<'r, T: DeviceCopy, R: MemoryResource> Allocate for ResourceAllocator<'r, T, R> {
    fn allocate(&self, count: usize) -> AllocResult<Self::Pointer> {
        check_count::<T>(count)?;
        let ptr = space_malloc_in::<T, R>(self.resource, count)?;
        debug!("resource allocator: {} elements at {:?}", count, ptr);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: Self::Pointer, count: usize) {
        debug!("resource allocator: releasing {:?}", ptr);
        space_free_in(self.resource, ptr, count)
    }
}
