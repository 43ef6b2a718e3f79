//! Type-level rebinding.
//!
//! Rebinding turns an allocator (or pointer) for one element type into the equivalent for
//! another, keeping the memory space and pointer family. It has no runtime behaviour; a
//! container uses it to allocate its internal node type with the allocator the user supplied
//! for the element type.
//!
//! ```
//! use devalloc::allocator::{Rebound, TaggedAllocator};
//! use devalloc::memory::Device;
//! use std::any::TypeId;
//!
//! type Nodes = Rebound<TaggedAllocator<u32, Device>, (u32, u32)>;
//! assert_eq!(
//!     TypeId::of::<Nodes>(),
//!     TypeId::of::<TaggedAllocator<(u32, u32), Device>>()
//! );
//! ```

use super::Allocator;
use crate::memory::PointerTraits;

/// The allocator `A` rebound to element type `U`.
pub type Rebound<A, U> = <A as Allocator>::Rebind<U>;

/// The pointer `P` rebound to element type `U`, in the same space and family.
pub type RebindPointer<P, U> = <P as PointerTraits>::Rebind<U>;
