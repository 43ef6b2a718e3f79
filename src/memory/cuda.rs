//! CUDA driver backed resources, enabled by the `cuda` feature.
//!
//! These call straight into the driver API. A CUDA context must be current on the calling thread
//! for every allocation, free and copy; creating one is outside the scope of this crate.

use crate::error::{AllocError, AllocResult, ToResult};
use crate::memory::resource::{dangling, MemoryResource};
use crate::memory::{Device, MemorySpace, Unified};
use cuda_driver_sys::{
    cuMemAllocManaged, cuMemAlloc_v2, cuMemFree_v2, cuMemcpyDtoD_v2, cuMemcpyDtoH_v2,
    cuMemcpyHtoD_v2, CUdeviceptr, CUmemAttach_flags_enum,
};
use log::error;
use std::alloc::Layout;
use std::os::raw::{c_uint, c_void};
use std::ptr::NonNull;

/// Device memory from `cuMemAlloc`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CudaMemory;

/// Managed memory from `cuMemAllocManaged`, attached globally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CudaManagedMemory;

pub(crate) static CUDA_MEMORY: CudaMemory = CudaMemory;
pub(crate) static CUDA_MANAGED_MEMORY: CudaManagedMemory = CudaManagedMemory;

fn with_size(err: AllocError, space: &'static str, bytes: usize) -> AllocError {
    match err {
        AllocError::OutOfMemory { .. } => AllocError::OutOfMemory { space, bytes },
        other => other,
    }
}

fn wrap_device_ptr(dptr: CUdeviceptr, space: &'static str, bytes: usize) -> AllocResult<NonNull<u8>> {
    NonNull::new(dptr as usize as *mut u8).ok_or(AllocError::OutOfMemory { space, bytes })
}

unsafe fn free_device_ptr(ptr: NonNull<u8>, space: &'static str) {
    if let Err(e) = cuMemFree_v2(ptr.as_ptr() as usize as CUdeviceptr).to_result() {
        // Frees are infallible by contract; the block is lost.
        error!("failed to free {} memory at {:p}: {}", space, ptr, e);
    }
}

impl MemoryResource for CudaMemory {
    type Space = Device;

    fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }
        let mut dptr: CUdeviceptr = 0;
        unsafe { cuMemAlloc_v2(&mut dptr, layout.size()) }
            .to_result()
            .map_err(|e| with_size(e, Device::NAME, layout.size()))?;
        wrap_device_ptr(dptr, Device::NAME, layout.size())
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            free_device_ptr(ptr, Device::NAME);
        }
    }

    fn is_equal(&self, _other: &Self) -> bool {
        true
    }
}

impl MemoryResource for CudaManagedMemory {
    type Space = Unified;

    fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }
        let mut dptr: CUdeviceptr = 0;
        unsafe {
            cuMemAllocManaged(
                &mut dptr,
                layout.size(),
                CUmemAttach_flags_enum::CU_MEM_ATTACH_GLOBAL as c_uint,
            )
        }
        .to_result()
        .map_err(|e| with_size(e, Unified::NAME, layout.size()))?;
        wrap_device_ptr(dptr, Unified::NAME, layout.size())
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            free_device_ptr(ptr, Unified::NAME);
        }
    }

    fn is_equal(&self, _other: &Self) -> bool {
        true
    }
}

pub(crate) unsafe fn copy_device_to_host(
    src: *const u8,
    dst: *mut u8,
    bytes: usize,
) -> AllocResult<()> {
    cuMemcpyDtoH_v2(dst as *mut c_void, src as usize as CUdeviceptr, bytes).to_result()
}

pub(crate) unsafe fn copy_host_to_device(
    src: *const u8,
    dst: *mut u8,
    bytes: usize,
) -> AllocResult<()> {
    cuMemcpyHtoD_v2(dst as usize as CUdeviceptr, src as *const c_void, bytes).to_result()
}

pub(crate) unsafe fn copy_device_to_device(
    src: *const u8,
    dst: *mut u8,
    bytes: usize,
) -> AllocResult<()> {
    cuMemcpyDtoD_v2(
        dst as usize as CUdeviceptr,
        src as usize as CUdeviceptr,
        bytes,
    )
    .to_result()
}
