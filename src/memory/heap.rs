use crate::config::HeapConfig;
use crate::error::{AllocError, AllocResult};
use crate::memory::resource::{dangling, MemoryResource};
use crate::memory::{MemorySpace, SpacePointer};
use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::alloc::{self, Layout};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

#[cfg(not(feature = "cuda"))]
use crate::memory::{Device, Unified};
#[cfg(not(feature = "cuda"))]
use once_cell::sync::Lazy;

/// Counters describing a [`SpaceHeap`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Blocks currently allocated.
    pub live_blocks: usize,
    /// Bytes currently allocated.
    pub live_bytes: usize,
    /// Highest value `live_bytes` has reached.
    pub peak_bytes: usize,
    /// Blocks allocated over the heap's lifetime.
    pub total_allocations: u64,
    /// Blocks freed over the heap's lifetime.
    pub total_deallocations: u64,
}

#[derive(Debug, Default)]
struct HeapState {
    blocks: HashMap<usize, Layout>,
    stats: HeapStats,
}

/// A tracking heap serving memory space `S` out of host memory.
///
/// Every live block is recorded with its layout, so blocks are released by pointer alone and
/// the heap can report what is outstanding. This is the default resource of the `Device` and
/// `Unified` spaces when the `cuda` feature is disabled, and it can be instantiated directly to
/// get an isolated heap, for example to check that a piece of code frees everything it
/// allocates:
///
/// ```
/// use devalloc::allocator::{Allocate, ResourceAllocator};
/// use devalloc::memory::{Device, SpaceHeap};
///
/// let heap: SpaceHeap<Device> = SpaceHeap::new();
/// let alloc = ResourceAllocator::<u32, _>::new(&heap);
///
/// let ptr = alloc.allocate(16).unwrap();
/// assert_eq!(heap.stats().live_bytes, 64);
/// unsafe { alloc.deallocate(ptr, 16) };
/// assert_eq!(heap.stats().live_blocks, 0);
/// ```
pub struct SpaceHeap<S: MemorySpace> {
    config: HeapConfig,
    state: Mutex<HeapState>,
    space: PhantomData<fn() -> S>,
}

impl<S: MemorySpace> SpaceHeap<S> {
    /// Creates an empty heap with the default configuration.
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Creates an empty heap with the given configuration.
    pub fn with_config(config: HeapConfig) -> Self {
        SpaceHeap {
            config,
            state: Mutex::new(HeapState::default()),
            space: PhantomData,
        }
    }

    /// The heap's configuration.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// A snapshot of the heap's counters.
    pub fn stats(&self) -> HeapStats {
        self.state.lock().stats
    }

    /// Returns true if `ptr` is the start of a block currently allocated from this heap.
    pub fn contains<T>(&self, ptr: SpacePointer<T, S>) -> bool {
        self.state
            .lock()
            .blocks
            .contains_key(&(ptr.as_raw() as usize))
    }
}

impl<S: MemorySpace> Default for SpaceHeap<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MemorySpace> fmt::Debug for SpaceHeap<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceHeap")
            .field("space", &S::NAME)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<S: MemorySpace> MemoryResource for SpaceHeap<S> {
    type Space = S;

    fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }
        let out_of_memory = AllocError::OutOfMemory {
            space: S::NAME,
            bytes: layout.size(),
        };

        let mut state = self.state.lock();
        if let Some(limit) = self.config.limit {
            if state.stats.live_bytes.saturating_add(layout.size()) > limit {
                debug!(
                    "{} heap: refusing {} bytes, {} of {} in use",
                    S::NAME,
                    layout.size(),
                    state.stats.live_bytes,
                    limit
                );
                return Err(out_of_memory);
            }
        }

        let block = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(out_of_memory)?;
        if let Some(byte) = self.config.init.fill_byte() {
            unsafe { ptr::write_bytes(block.as_ptr(), byte, layout.size()) };
        }

        let _ = state.blocks.insert(block.as_ptr() as usize, layout);
        let stats = &mut state.stats;
        stats.live_blocks += 1;
        stats.live_bytes += layout.size();
        stats.peak_bytes = stats.peak_bytes.max(stats.live_bytes);
        stats.total_allocations += 1;

        trace!("{} heap: allocated {} bytes at {:p}", S::NAME, layout.size(), block);
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let actual = {
            let mut state = self.state.lock();
            let actual = state.blocks.remove(&(ptr.as_ptr() as usize));
            if let Some(actual) = actual {
                state.stats.live_blocks -= 1;
                state.stats.live_bytes -= actual.size();
                state.stats.total_deallocations += 1;
            }
            actual
        };

        match actual {
            Some(actual) => {
                if actual.size() != layout.size() {
                    debug!(
                        "{} heap: block at {:p} freed as {} bytes, allocated as {}",
                        S::NAME,
                        ptr,
                        layout.size(),
                        actual.size()
                    );
                }
                if let Some(byte) = self.config.poison_on_free {
                    ptr::write_bytes(ptr.as_ptr(), byte, actual.size());
                }
                alloc::dealloc(ptr.as_ptr(), actual);
                trace!("{} heap: freed {} bytes at {:p}", S::NAME, actual.size(), ptr);
            }
            None if layout.size() == 0 => {}
            None => warn!(
                "{} heap: ignoring free of {:p}, which it did not allocate",
                S::NAME,
                ptr
            ),
        }
    }
}

impl<S: MemorySpace> Drop for SpaceHeap<S> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.blocks.is_empty() {
            warn!(
                "{} heap dropped with {} live blocks ({} bytes)",
                S::NAME,
                state.stats.live_blocks,
                state.stats.live_bytes
            );
        }
        for (addr, layout) in state.blocks.drain() {
            unsafe { alloc::dealloc(addr as *mut u8, layout) };
        }
    }
}

#[cfg(not(feature = "cuda"))]
static DEVICE_HEAP: Lazy<SpaceHeap<Device>> =
    Lazy::new(|| SpaceHeap::with_config(HeapConfig::from_env(Device::NAME)));

#[cfg(not(feature = "cuda"))]
static UNIFIED_HEAP: Lazy<SpaceHeap<Unified>> =
    Lazy::new(|| SpaceHeap::with_config(HeapConfig::from_env(Unified::NAME)));

/// The process-wide heap emulating device memory.
#[cfg(not(feature = "cuda"))]
pub fn device_heap() -> &'static SpaceHeap<Device> {
    Lazy::force(&DEVICE_HEAP)
}

/// The process-wide heap emulating unified memory.
#[cfg(not(feature = "cuda"))]
pub fn unified_heap() -> &'static SpaceHeap<Unified> {
    Lazy::force(&UNIFIED_HEAP)
}
