use crate::error::{AllocError, AllocResult};
use crate::memory::{Host, MemorySpace};
use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

/// An object that owns the allocation state of one memory space.
///
/// Allocators are stateless values. Anything that has to remember which blocks are live (free
/// lists, arenas, bookkeeping) lives in a resource instead, and allocators only refer to it,
/// either implicitly through a space's [`MemorySystem::resource`] or explicitly through a
/// [`ResourceAllocator`](../allocator/struct.ResourceAllocator.html).
///
/// Resources must tolerate concurrent calls from many host threads as long as each block is
/// freed only once.
pub trait MemoryResource: Send + Sync {
    /// The space blocks from this resource belong to.
    type Space: MemorySpace;

    /// Allocates a block described by `layout`.
    ///
    /// Zero-sized layouts return a dangling, well-aligned pointer and consume nothing.
    ///
    /// # Errors:
    ///
    /// Returns `OutOfMemory` if the request cannot be satisfied.
    fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>>;

    /// Releases a block previously returned by [`allocate`](#tymethod.allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block obtained from this resource, and `layout` must be the layout
    /// it was requested with. Some resources identify the block by `ptr` alone and tolerate a
    /// wrong `layout`; callers must not rely on that.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Returns true if blocks allocated by `self` may be freed through `other`.
    fn is_equal(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

pub(crate) fn dangling(layout: Layout) -> NonNull<u8> {
    // Alignments are non-zero powers of two.
    unsafe { NonNull::new_unchecked(layout.align() as *mut u8) }
}

/// The process allocator, serving the [`Host`] space.
///
/// Unlike [`SpaceHeap`](struct.SpaceHeap.html) this keeps no record of live blocks, so
/// deallocation must be given the exact element count the block was allocated with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostMemory;

pub(crate) static HOST_MEMORY: HostMemory = HostMemory;

impl MemoryResource for HostMemory {
    type Space = Host;

    fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }
        NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(AllocError::OutOfMemory {
            space: Host::NAME,
            bytes: layout.size(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            alloc::dealloc(ptr.as_ptr(), layout);
        }
    }

    fn is_equal(&self, _other: &Self) -> bool {
        true
    }
}
