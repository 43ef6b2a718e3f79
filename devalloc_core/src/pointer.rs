use crate::space::{Device, Host, MemorySpace, Unified};
use crate::DeviceCopy;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem;
use core::ptr;

/// A pointer into the memory space `S`.
///
/// The tag makes the pointer's provenance part of its type: a `SpacePointer<T, Device>` cannot
/// be passed where a host pointer is expected, and unless `S` is host-accessible it must never
/// be dereferenced by the CPU. The representation is guaranteed to be that of `*mut T`, so it
/// may be passed through an FFI boundary to code expecting a raw pointer.
#[repr(transparent)]
pub struct SpacePointer<T, S> {
    ptr: *mut T,
    space: PhantomData<S>,
}

/// A pointer to ordinary host memory.
pub type HostPointer<T> = SpacePointer<T, Host>;
/// A pointer to device memory.
pub type DevicePointer<T> = SpacePointer<T, Device>;
/// A pointer to unified (managed) memory.
pub type UnifiedPointer<T> = SpacePointer<T, Unified>;

unsafe impl<T: DeviceCopy, S: MemorySpace> DeviceCopy for SpacePointer<T, S> {}

// Dereferencing is unsafe either way; thread-safety follows the pointee.
unsafe impl<T: Send, S> Send for SpacePointer<T, S> {}
unsafe impl<T: Sync, S> Sync for SpacePointer<T, S> {}

impl<T, S: MemorySpace> SpacePointer<T, S> {
    /// Returns a null pointer.
    ///
    /// # Examples:
    ///
    /// ```
    /// use devalloc::memory::*;
    /// let ptr: DevicePointer<u64> = DevicePointer::null();
    /// assert!(ptr.is_null());
    /// ```
    pub fn null() -> Self {
        unsafe { Self::wrap(ptr::null_mut()) }
    }

    /// Returns a non-null pointer that is well aligned for `T` but refers to no allocation.
    ///
    /// Zero-byte allocations hand out this pointer.
    pub fn dangling() -> Self {
        unsafe { Self::wrap(ptr::NonNull::dangling().as_ptr()) }
    }

    /// Wrap the given raw pointer. The pointer is assumed to point into space `S`, or be null.
    ///
    /// # Safety
    ///
    /// The pointer must have been obtained from an allocation in space `S` (or be null or
    /// dangling). Tagging a host pointer as a device pointer, or the reverse, makes later copies
    /// through it undefined behavior.
    ///
    /// # Examples:
    ///
    /// ```
    /// use devalloc::memory::*;
    /// use std::ptr;
    /// unsafe {
    ///     let null: *mut u64 = ptr::null_mut();
    ///     assert!(DevicePointer::wrap(null).is_null());
    /// }
    /// ```
    pub unsafe fn wrap(ptr: *mut T) -> Self {
        SpacePointer {
            ptr,
            space: PhantomData,
        }
    }

    /// Returns the contained pointer as a raw pointer. Unless `S` is host-accessible the
    /// returned pointer is not valid on the CPU and must not be dereferenced.
    pub fn as_raw(&self) -> *const T {
        self.ptr
    }

    /// Returns the contained pointer as a mutable raw pointer. Unless `S` is host-accessible
    /// the returned pointer is not valid on the CPU and must not be dereferenced.
    pub fn as_raw_mut(&mut self) -> *mut T {
        self.ptr
    }

    /// Returns the raw pointer if host code may dereference it.
    ///
    /// # Examples:
    ///
    /// ```
    /// use devalloc::memory::*;
    /// let dev: DevicePointer<u32> = DevicePointer::dangling();
    /// assert!(dev.as_host_ptr().is_none());
    ///
    /// let unified: UnifiedPointer<u32> = UnifiedPointer::dangling();
    /// assert!(unified.as_host_ptr().is_some());
    /// ```
    pub fn as_host_ptr(&self) -> Option<*mut T> {
        if S::is_host_accessible() {
            Some(self.ptr)
        } else {
            None
        }
    }

    /// Returns true if the pointer is null.
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Reinterprets the pointer as pointing to a `U` in the same space.
    ///
    /// This is the value-level counterpart of [`PointerTraits::Rebind`].
    pub fn cast<U>(self) -> SpacePointer<U, S> {
        unsafe { SpacePointer::wrap(self.ptr as *mut U) }
    }

    /// Calculates the offset from a pointer.
    ///
    /// `count` is in units of T; eg. a `count` of 3 represents a pointer offset of
    /// `3 * size_of::<T>()` bytes.
    ///
    /// # Safety
    ///
    /// Both the starting and resulting pointer must be either in bounds or one byte past the end
    /// of *the same* allocated object, and the computed offset in bytes cannot overflow an
    /// `isize`. Use `wrapping_offset` if these constraints are difficult to satisfy.
    pub unsafe fn offset(self, count: isize) -> Self {
        Self::wrap(self.ptr.offset(count))
    }

    /// Calculates the offset from a pointer using wrapping arithmetic.
    ///
    /// The resulting pointer does not need to be in bounds, but it may not be used to access a
    /// different allocated object than the one `self` points to.
    pub fn wrapping_offset(self, count: isize) -> Self {
        unsafe { Self::wrap(self.ptr.wrapping_offset(count)) }
    }

    /// Calculates the offset from a pointer (convenience for `.offset(count as isize)`).
    ///
    /// # Safety
    ///
    /// Same requirements as [`offset`](#method.offset).
    ///
    /// # Examples
    ///
    /// ```
    /// use devalloc::memory::*;
    /// let ptr = device_malloc::<u64>(5).unwrap();
    /// unsafe {
    ///     let second = ptr.add(1); // Points to the 2nd u64 in the buffer
    ///     assert_eq!(second.offset_from(ptr), 1);
    ///     device_free(ptr, 5); // Must free the buffer using the original pointer
    /// }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub unsafe fn add(self, count: usize) -> Self {
        self.offset(count as isize)
    }

    /// Calculates the offset from a pointer (convenience for
    /// `.offset((count as isize).wrapping_neg())`).
    ///
    /// # Safety
    ///
    /// Same requirements as [`offset`](#method.offset).
    #[allow(clippy::should_implement_trait)]
    pub unsafe fn sub(self, count: usize) -> Self {
        self.offset((count as isize).wrapping_neg())
    }

    /// Calculates the offset from a pointer using wrapping arithmetic
    /// (convenience for `.wrapping_offset(count as isize)`).
    pub fn wrapping_add(self, count: usize) -> Self {
        self.wrapping_offset(count as isize)
    }

    /// Calculates the offset from a pointer using wrapping arithmetic
    /// (convenience for `.wrapping_offset((count as isize).wrapping_neg())`).
    pub fn wrapping_sub(self, count: usize) -> Self {
        self.wrapping_offset((count as isize).wrapping_neg())
    }

    /// Calculates the distance between two pointers, in units of T.
    ///
    /// # Safety
    ///
    /// Both pointers must be in bounds or one past the end of the same allocated object, and
    /// `T` must not be zero-sized.
    pub unsafe fn offset_from(self, origin: Self) -> isize {
        debug_assert!(mem::size_of::<T>() != 0);
        self.ptr.offset_from(origin.ptr)
    }
}

// Manual impls: derives would demand `T: Clone` etc. for what is only a pointer.
impl<T, S> Clone for SpacePointer<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T, S> Copy for SpacePointer<T, S> {}

impl<T, S> PartialEq for SpacePointer<T, S> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.ptr, other.ptr)
    }
}
impl<T, S> Eq for SpacePointer<T, S> {}

impl<T, S> PartialOrd for SpacePointer<T, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T, S> Ord for SpacePointer<T, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ptr.cmp(&other.ptr)
    }
}

impl<T, S> Hash for SpacePointer<T, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr.hash(state)
    }
}

impl<T, S: MemorySpace> fmt::Debug for SpacePointer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:p}", S::NAME, self.ptr)
    }
}

impl<T, S> fmt::Pointer for SpacePointer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.ptr, f)
    }
}

/// Describes a pointer family: what it points to, which space it points into, and how to obtain
/// the same family's pointer to another element type.
///
/// Allocators derive their pointer type from a family instead of hard-coding raw pointers, so a
/// user-facing allocator and the allocator it is rebound to for internal nodes agree on
/// addressing.
///
/// ```
/// use devalloc::memory::*;
///
/// fn same<A: 'static, B: 'static>() -> bool {
///     std::any::TypeId::of::<A>() == std::any::TypeId::of::<B>()
/// }
///
/// assert!(same::<<DevicePointer<u8> as PointerTraits>::Rebind<f32>, DevicePointer<f32>>());
/// assert!(same::<<*mut u8 as PointerTraits>::Rebind<f32>, *mut f32>());
/// ```
pub trait PointerTraits: Copy {
    /// The pointee type.
    type Element;

    /// The memory space the pointer refers to.
    type Space: MemorySpace;

    /// The pointer of this family for element type `U`, in the same space.
    type Rebind<U>: PointerTraits<Element = U, Space = Self::Space>;

    /// Converts a tagged pointer of the same space and element into this family.
    fn from_space_ptr(ptr: SpacePointer<Self::Element, Self::Space>) -> Self;

    /// Converts this pointer into the canonical tagged pointer.
    fn into_space_ptr(self) -> SpacePointer<Self::Element, Self::Space>;
}

impl<T, S: MemorySpace> PointerTraits for SpacePointer<T, S> {
    type Element = T;
    type Space = S;
    type Rebind<U> = SpacePointer<U, S>;

    fn from_space_ptr(ptr: SpacePointer<T, S>) -> Self {
        ptr
    }

    fn into_space_ptr(self) -> SpacePointer<T, S> {
        self
    }
}

impl<T> PointerTraits for *mut T {
    type Element = T;
    type Space = Host;
    type Rebind<U> = *mut U;

    fn from_space_ptr(mut ptr: SpacePointer<T, Host>) -> Self {
        ptr.as_raw_mut()
    }

    fn into_space_ptr(self) -> SpacePointer<T, Host> {
        unsafe { SpacePointer::wrap(self) }
    }
}
