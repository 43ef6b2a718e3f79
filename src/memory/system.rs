use crate::error::AllocResult;
use crate::memory::resource::{HostMemory, MemoryResource, HOST_MEMORY};
use crate::memory::{Device, DeviceCopy, Host, MemorySpace, SpacePointer, Unified};
use std::mem;
use std::ptr;

#[cfg(not(feature = "cuda"))]
use crate::memory::heap::{device_heap, unified_heap, SpaceHeap};

#[cfg(feature = "cuda")]
use crate::memory::cuda::{self, CudaManagedMemory, CudaMemory, CUDA_MANAGED_MEMORY, CUDA_MEMORY};

/// A memory space together with the machinery to use it: its default resource and the
/// primitives that move bytes between it and the host.
///
/// This trait is sealed and implemented for [`Host`], [`Device`] and [`Unified`]. Without the
/// `cuda` feature, the device and unified spaces are emulated by tracking heaps in host memory,
/// which keeps their semantics (and their pointer types) while running anywhere.
pub trait MemorySystem: MemorySpace + crate::private::Sealed {
    /// The resource that allocations in this space go through by default.
    type Resource: MemoryResource<Space = Self> + 'static;

    /// The process-wide default resource for this space.
    fn resource() -> &'static Self::Resource;

    /// Copies `bytes` bytes from `src` in this space to host memory at `dst`.
    ///
    /// # Safety
    ///
    /// Both ranges must be valid for `bytes` bytes and must not overlap.
    unsafe fn copy_bytes_to_host(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()>;

    /// Copies `bytes` bytes from host memory at `src` into this space at `dst`.
    ///
    /// # Safety
    ///
    /// Both ranges must be valid for `bytes` bytes and must not overlap.
    unsafe fn copy_bytes_from_host(src: *const u8, dst: *mut u8, bytes: usize)
        -> AllocResult<()>;

    /// Copies `bytes` bytes between two locations in this space.
    ///
    /// # Safety
    ///
    /// Both ranges must be valid for `bytes` bytes.
    unsafe fn copy_bytes_within(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()>;

    /// Copies `count` elements from this space to the host.
    ///
    /// # Safety
    ///
    /// See [`copy_bytes_to_host`](#tymethod.copy_bytes_to_host).
    unsafe fn copy_to_host<T: DeviceCopy>(
        src: SpacePointer<T, Self>,
        dst: *mut T,
        count: usize,
    ) -> AllocResult<()> {
        match byte_len::<T>(count) {
            0 => Ok(()),
            bytes => Self::copy_bytes_to_host(src.as_raw() as *const u8, dst as *mut u8, bytes),
        }
    }

    /// Copies `count` elements from the host into this space.
    ///
    /// # Safety
    ///
    /// See [`copy_bytes_from_host`](#tymethod.copy_bytes_from_host).
    unsafe fn copy_from_host<T: DeviceCopy>(
        src: *const T,
        mut dst: SpacePointer<T, Self>,
        count: usize,
    ) -> AllocResult<()> {
        match byte_len::<T>(count) {
            0 => Ok(()),
            bytes => {
                Self::copy_bytes_from_host(src as *const u8, dst.as_raw_mut() as *mut u8, bytes)
            }
        }
    }

    /// Copies `count` elements between two locations in this space.
    ///
    /// # Safety
    ///
    /// See [`copy_bytes_within`](#tymethod.copy_bytes_within).
    unsafe fn copy_within<T: DeviceCopy>(
        src: SpacePointer<T, Self>,
        mut dst: SpacePointer<T, Self>,
        count: usize,
    ) -> AllocResult<()> {
        match byte_len::<T>(count) {
            0 => Ok(()),
            bytes => Self::copy_bytes_within(
                src.as_raw() as *const u8,
                dst.as_raw_mut() as *mut u8,
                bytes,
            ),
        }
    }
}

fn byte_len<T>(count: usize) -> usize {
    // Callers only pass counts of live allocations, which cannot overflow.
    count * mem::size_of::<T>()
}

unsafe fn host_copy(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
    ptr::copy_nonoverlapping(src, dst, bytes);
    Ok(())
}

unsafe fn host_move(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
    ptr::copy(src, dst, bytes);
    Ok(())
}

impl MemorySystem for Host {
    type Resource = HostMemory;

    fn resource() -> &'static HostMemory {
        &HOST_MEMORY
    }

    unsafe fn copy_bytes_to_host(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        host_copy(src, dst, bytes)
    }

    unsafe fn copy_bytes_from_host(
        src: *const u8,
        dst: *mut u8,
        bytes: usize,
    ) -> AllocResult<()> {
        host_copy(src, dst, bytes)
    }

    unsafe fn copy_bytes_within(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        host_move(src, dst, bytes)
    }
}

#[cfg(not(feature = "cuda"))]
impl MemorySystem for Device {
    type Resource = SpaceHeap<Device>;

    fn resource() -> &'static SpaceHeap<Device> {
        device_heap()
    }

    unsafe fn copy_bytes_to_host(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        host_copy(src, dst, bytes)
    }

    unsafe fn copy_bytes_from_host(
        src: *const u8,
        dst: *mut u8,
        bytes: usize,
    ) -> AllocResult<()> {
        host_copy(src, dst, bytes)
    }

    unsafe fn copy_bytes_within(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        host_move(src, dst, bytes)
    }
}

#[cfg(feature = "cuda")]
impl MemorySystem for Device {
    type Resource = CudaMemory;

    fn resource() -> &'static CudaMemory {
        &CUDA_MEMORY
    }

    unsafe fn copy_bytes_to_host(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        cuda::copy_device_to_host(src, dst, bytes)
    }

    unsafe fn copy_bytes_from_host(
        src: *const u8,
        dst: *mut u8,
        bytes: usize,
    ) -> AllocResult<()> {
        cuda::copy_host_to_device(src, dst, bytes)
    }

    unsafe fn copy_bytes_within(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        cuda::copy_device_to_device(src, dst, bytes)
    }
}

#[cfg(not(feature = "cuda"))]
impl MemorySystem for Unified {
    type Resource = SpaceHeap<Unified>;

    fn resource() -> &'static SpaceHeap<Unified> {
        unified_heap()
    }

    unsafe fn copy_bytes_to_host(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        host_copy(src, dst, bytes)
    }

    unsafe fn copy_bytes_from_host(
        src: *const u8,
        dst: *mut u8,
        bytes: usize,
    ) -> AllocResult<()> {
        host_copy(src, dst, bytes)
    }

    unsafe fn copy_bytes_within(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        host_move(src, dst, bytes)
    }
}

// Managed memory is host-addressable; plain copies are valid once the device is idle.
#[cfg(feature = "cuda")]
impl MemorySystem for Unified {
    type Resource = CudaManagedMemory;

    fn resource() -> &'static CudaManagedMemory {
        &CUDA_MANAGED_MEMORY
    }

    unsafe fn copy_bytes_to_host(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        host_copy(src, dst, bytes)
    }

    unsafe fn copy_bytes_from_host(
        src: *const u8,
        dst: *mut u8,
        bytes: usize,
    ) -> AllocResult<()> {
        host_copy(src, dst, bytes)
    }

    unsafe fn copy_bytes_within(src: *const u8, dst: *mut u8, bytes: usize) -> AllocResult<()> {
        host_move(src, dst, bytes)
    }
}
