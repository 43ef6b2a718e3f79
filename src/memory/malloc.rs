use crate::error::{AllocError, AllocResult};
use crate::memory::{Device, DeviceCopy, DevicePointer, MemoryResource, MemorySystem, SpacePointer};
use std::alloc::Layout;
use std::cmp;
use std::mem;
use std::ptr::NonNull;

/// Largest staging buffer used when filling device memory from the host.
const FILL_CHUNK_BYTES: usize = 64 * 1024;

/// Largest count of `T` whose byte size fits in an `isize`, the bound `Layout` enforces.
fn max_layout_count<T>() -> usize {
    match mem::size_of::<T>() {
        0 => usize::MAX,
        size => isize::MAX as usize / size,
    }
}

fn array_layout<T>(count: usize) -> AllocResult<Layout> {
    Layout::array::<T>(count).map_err(|_| AllocError::SizeExceeded {
        requested: count,
        max_size: max_layout_count::<T>(),
    })
}

/// Allocates storage for `count` values of `T` from `resource` and returns a pointer tagged
/// with the resource's space.
///
/// Note that `count` is in units of T; thus a `count` of 3 will allocate `3 * size_of::<T>()`
/// bytes of memory. The memory is not initialized. A zero-byte request returns a dangling
/// pointer without touching the resource.
///
/// Memory allocated using `space_malloc_in` must be freed using
/// [`space_free_in`](fn.space_free_in.html) with the same resource.
///
/// # Errors:
///
/// `SizeExceeded` if the byte count does not fit in an `isize`; whatever the resource reports
/// otherwise.
pub fn space_malloc_in<T: DeviceCopy, R: MemoryResource>(
    resource: &R,
    count: usize,
) -> AllocResult<SpacePointer<T, R::Space>> {
    let layout = array_layout::<T>(count)?;
    if layout.size() == 0 {
        return Ok(SpacePointer::dangling());
    }
    let block = resource.allocate(layout)?;
    Ok(unsafe { SpacePointer::wrap(block.as_ptr() as *mut T) })
}

/// Free memory allocated with [`space_malloc_in`](fn.space_malloc_in.html).
///
/// # Safety
///
/// `ptr` must have been returned by `space_malloc_in(resource, count)` and not freed since.
/// Null pointers are ignored.
pub unsafe fn space_free_in<T: DeviceCopy, R: MemoryResource>(
    resource: &R,
    mut ptr: SpacePointer<T, R::Space>,
    count: usize,
) {
    let layout = match Layout::array::<T>(count) {
        Ok(layout) if layout.size() != 0 => layout,
        // Zero-byte and impossible sizes never reached the resource.
        _ => return,
    };
    if let Some(block) = NonNull::new(ptr.as_raw_mut() as *mut u8) {
        resource.deallocate(block, layout);
    }
}

/// Allocates storage for `count` values of `T` in space `S`, from the space's default resource.
///
/// # Examples:
///
/// ```
/// use devalloc::memory::*;
/// let ptr = space_malloc::<u32, Unified>(4).unwrap();
/// unsafe { space_free(ptr, 4) };
/// ```
pub fn space_malloc<T: DeviceCopy, S: MemorySystem>(count: usize) -> AllocResult<SpacePointer<T, S>> {
    space_malloc_in(S::resource(), count)
}

/// Free memory allocated with [`space_malloc`](fn.space_malloc.html).
///
/// # Safety
///
/// `ptr` must have been returned by `space_malloc::<T, S>(count)` and not freed since.
pub unsafe fn space_free<T: DeviceCopy, S: MemorySystem>(ptr: SpacePointer<T, S>, count: usize) {
    space_free_in(S::resource(), ptr, count)
}

/// Allocates uninitialized device storage for `count` values of `T`.
///
/// Memory buffers allocated using `device_malloc` must be freed using
/// [`device_free`](fn.device_free.html).
pub fn device_malloc<T: DeviceCopy>(count: usize) -> AllocResult<DevicePointer<T>> {
    space_malloc::<T, Device>(count)
}

/// Free memory allocated with [`device_malloc`](fn.device_malloc.html).
///
/// # Safety
///
/// `ptr` must have been returned by `device_malloc::<T>(count)` and not freed since.
pub unsafe fn device_free<T: DeviceCopy>(ptr: DevicePointer<T>, count: usize) {
    space_free(ptr, count)
}

/// Allocates device storage for `count` values of `T`, each set to `T::default()`.
///
/// Objects created with `device_new` must be released with
/// [`device_delete`](fn.device_delete.html).
///
/// # Examples:
///
/// ```
/// use devalloc::memory::*;
/// let ptr = device_new::<i32>(3).unwrap();
/// let first = unsafe { SpaceRef::from_ptr(ptr) };
/// assert_eq!(first.read().unwrap(), 0);
/// unsafe { device_delete(ptr, 3) };
/// ```
pub fn device_new<T: DeviceCopy + Default + Clone>(count: usize) -> AllocResult<DevicePointer<T>> {
    device_new_with(&T::default(), count)
}

/// Allocates device storage for `count` values of `T`, each a copy of `exemplar`.
pub fn device_new_with<T: DeviceCopy + Clone>(
    exemplar: &T,
    count: usize,
) -> AllocResult<DevicePointer<T>> {
    let ptr = device_malloc::<T>(count)?;
    if let Err(e) = unsafe { fill(ptr, exemplar, count) } {
        unsafe { device_free(ptr, count) };
        return Err(e);
    }
    Ok(ptr)
}

/// Releases objects created with [`device_new`](fn.device_new.html) or
/// [`device_new_with`](fn.device_new_with.html).
///
/// `DeviceCopy` types have no destructors, so this only returns the storage.
///
/// # Safety
///
/// `ptr` must have been returned by `device_new` or `device_new_with` for `count` elements and
/// not freed since.
pub unsafe fn device_delete<T: DeviceCopy>(ptr: DevicePointer<T>, count: usize) {
    device_free(ptr, count)
}

/// Writes `count` copies of `value` starting at `dst`, staging through host memory.
pub(crate) unsafe fn fill<T: DeviceCopy + Clone, S: MemorySystem>(
    dst: SpacePointer<T, S>,
    value: &T,
    count: usize,
) -> AllocResult<()> {
    let size = mem::size_of::<T>();
    if size == 0 || count == 0 {
        return Ok(());
    }
    let chunk = cmp::min(count, cmp::max(1, FILL_CHUNK_BYTES / size));
    let staging = vec![value.clone(); chunk];

    let mut done = 0;
    while done < count {
        let n = cmp::min(chunk, count - done);
        S::copy_from_host(staging.as_ptr(), dst.add(done), n)?;
        done += n;
    }
    Ok(())
}
