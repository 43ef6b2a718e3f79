//! This module re-exports a number of commonly-used types for working with devalloc.
//!
//! This allows the user to `use devalloc::prelude::*;` and have the most commonly-used types
//! available quickly.

pub use crate::allocator::{
    Allocate, Allocator, DeviceMallocAllocator, DeviceNewAllocator, Rebound, ResourceAllocator,
    TaggedAllocator,
};
pub use crate::error::{AllocError, AllocResult};
pub use crate::memory::{
    Device, DeviceCopy, DevicePointer, Host, MemoryResource, MemorySpace, MemorySystem,
    SpaceBuffer, SpaceMut, SpacePointer, SpaceRef, Unified, UnifiedPointer,
};
