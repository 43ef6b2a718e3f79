//! Memory spaces, resources and the allocation primitives allocators are built on.
//!
//! # Memory Spaces
//!
//! Every pointer in this crate is tagged with the memory space it points into. The tag is a
//! zero-sized type, so a [`SpacePointer`] is the same size and representation as `*mut T`, but a
//! device pointer and a host pointer are different types and cannot be mixed up by accident.
//!
//! * [`Host`] is ordinary process memory. Host pointers can be dereferenced directly.
//! * [`Device`] is memory that belongs to an accelerator. It cannot be dereferenced on the host;
//!   data is moved in and out with explicit copies, and elements are reached through
//!   [`SpaceRef`] and [`SpaceMut`] which perform those copies.
//! * [`Unified`] is memory that both sides can address. It is tagged like device memory but
//!   [`SpacePointer::as_host_ptr`] succeeds for it.
//!
//! # Resources
//!
//! A [`MemoryResource`] owns allocation state for one space. Each space has a default resource,
//! reached through [`MemorySystem::resource`]. Without the `cuda` feature the device and unified
//! spaces are backed by [`SpaceHeap`]s, tracking heaps in host memory that honour the same
//! rules as the real thing and can be inspected with [`SpaceHeap::stats`]. With the `cuda`
//! feature, they are backed by the CUDA driver instead.
//!
//! # Primitives
//!
//! [`space_malloc`] and [`space_free`] allocate raw storage in any space; [`device_malloc`],
//! [`device_free`], [`device_new`] and [`device_delete`] are the device-memory counterparts the
//! allocators in [`allocator`](../allocator/index.html) are built on. [`SpaceBuffer`] wraps an
//! allocation made through any allocator and frees it on drop.
//!
//! # FFI Information
//!
//! `SpacePointer<T, S>` is `#[repr(transparent)]` over `*mut T` and can be passed through an FFI
//! boundary to code expecting raw pointers (though device pointers still cannot be dereferenced
//! on the CPU). Other types here make no such promise.

mod buffer;
#[cfg(feature = "cuda")]
mod cuda;
mod heap;
mod malloc;
mod reference;
mod resource;
mod system;

pub use self::buffer::*;
#[cfg(feature = "cuda")]
pub use self::cuda::{CudaManagedMemory, CudaMemory};
pub use self::heap::*;
pub use self::malloc::*;
pub use self::reference::*;
pub use self::resource::{HostMemory, MemoryResource};
pub use self::system::MemorySystem;
pub use devalloc_core::{
    Access, Device, DeviceCopy, DevicePointer, Host, HostPointer, MemorySpace, PointerTraits,
    SpacePointer, Unified, UnifiedPointer,
};
pub use devalloc_derive::DeviceCopy;
