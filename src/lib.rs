//! Allocators for memory spaces that the host cannot always see.
//!
//! A program that offloads work to an accelerator deals with at least two kinds of memory: the
//! host's and the device's. Pointers into them look the same to the compiler but are not
//! interchangeable, since dereferencing a device pointer on the host is undefined behavior. This
//! crate keeps them apart in the type system and provides allocators over each space that
//! generic containers can be written against.
//!
//! * [`memory`](memory/index.html) has the space tags (`Host`, `Device`, `Unified`), tagged
//!   pointers and references, memory resources and the raw allocation primitives.
//! * [`allocator`](allocator/index.html) has the `Allocator` and `Allocate` traits and the
//!   allocators built on them, including type-level rebinding.
//! * [`config`](config/index.html) controls the default resources' limits and fill behaviour.
//!
//! By default the device and unified spaces are emulated in host memory, so everything here works
//! (and can be tested) without a GPU. Enabling the `cuda` feature backs them with the CUDA driver
//! API instead.
//!
//! # Example
//!
//! ```
//! use devalloc::prelude::*;
//!
//! let alloc = TaggedAllocator::<f32, Device>::new();
//! let buffer = SpaceBuffer::from_slice_in(&[1.0, 2.0, 3.0], alloc).unwrap();
//! assert!(buffer.as_host_slice().is_none());
//! assert_eq!(buffer.to_vec().unwrap(), vec![1.0, 2.0, 3.0]);
//! ```
#![warn(
    missing_docs,
    missing_debug_implementations,
    unused_import_braces,
    unused_results,
    unused_qualifications
)]
// Allow clippy lints
#![allow(unknown_lints)]

// Lets the DeviceCopy derive's `::devalloc` paths resolve inside this crate.
extern crate self as devalloc;

pub mod allocator;
pub mod config;
pub mod error;
pub mod memory;
pub mod prelude;
pub(crate) mod private;

mod derive_compile_fail;
