//! This module is a dummy module. It contains doctests that should fail to compile. It's used for
//! testing the DeviceCopy custom-derive macro and the space tagging of allocators and pointers,
//! and should not contain any actual code.
//!
//! ```compile_fail
//! use devalloc::memory::DeviceCopy;
//!
//! #[derive(Clone, DeviceCopy)]
//! struct ShouldFailTuple(Vec<u64>);
//! ```
//!
//! ```compile_fail
//! use devalloc::memory::DeviceCopy;
//!
//! #[derive(Clone, DeviceCopy)]
//! struct ShouldFailStruct{v: Vec<u64>}
//! ```
//!
//! ```compile_fail
//! use devalloc::memory::DeviceCopy;
//!
//! #[derive(Clone, DeviceCopy)]
//! enum ShouldFailTupleEnum {
//!     Unit,
//!     Tuple(Vec<u64>),
//! }
//! ```
//!
//! ```compile_fail
//! use devalloc::memory::DeviceCopy;
//!
//! #[derive(Clone, DeviceCopy)]
//! enum ShouldFailStructEnum {
//!     Unit,
//!     Struct{v: Vec<u64>},
//! }
//! ```
//!
//! ```compile_fail
//! use devalloc::memory::DeviceCopy;
//!
//! #[derive(Copy, Clone, DeviceCopy)]
//! union ShouldFailUnion {
//!     u: &'static u64,
//!     o: &'static i64,
//! }
//! ```
//!
//! Allocators for different spaces are different types and cannot be compared:
//!
//! ```compile_fail
//! use devalloc::allocator::TaggedAllocator;
//! use devalloc::memory::{Device, Host};
//!
//! let host = TaggedAllocator::<i32, Host>::new();
//! let device = TaggedAllocator::<i32, Device>::new();
//! let _ = host == device;
//! ```
//!
//! Nor can their pointers:
//!
//! ```compile_fail
//! use devalloc::memory::{DevicePointer, HostPointer};
//!
//! let host: HostPointer<u8> = HostPointer::null();
//! let device: DevicePointer<u8> = host;
//! ```
//!
//! Device allocators need the element type to be copyable to the device:
//!
//! ```compile_fail
//! use devalloc::allocator::{Allocate, DeviceMallocAllocator};
//!
//! let alloc = DeviceMallocAllocator::<String>::new();
//! let _ = alloc.allocate(1);
//! ```
