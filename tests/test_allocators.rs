#![cfg(not(feature = "cuda"))]

use devalloc::allocator::*;
use devalloc::config::HeapConfig;
use devalloc::error::AllocError;
use devalloc::memory::*;
use proptest::prelude::*;
use static_assertions::{assert_impl_all, assert_not_impl_any, assert_type_eq_all};
use std::ffi::c_void;

assert_type_eq_all!(Rebound<TaggedAllocator<i32, Device>, u8>, TaggedAllocator<u8, Device>);
assert_type_eq_all!(Rebound<TaggedAllocator<i32, Host>, f64>, TaggedAllocator<f64, Host>);
assert_type_eq_all!(
    Rebound<TaggedAllocator<c_void, Unified>, [u16; 4]>,
    TaggedAllocator<[u16; 4], Unified>
);
assert_type_eq_all!(Rebound<DeviceNewAllocator<i32>, u64>, DeviceNewAllocator<u64>);
assert_type_eq_all!(Rebound<DeviceMallocAllocator<u8>, c_void>, DeviceMallocAllocator<c_void>);
assert_type_eq_all!(
    Rebound<ResourceAllocator<'static, u8, SpaceHeap<Device>>, u32>,
    ResourceAllocator<'static, u32, SpaceHeap<Device>>
);

assert_type_eq_all!(
    <TaggedAllocator<i32, Device> as Allocator>::Pointer,
    DevicePointer<i32>
);
assert_type_eq_all!(<TaggedAllocator<i32, Host, *mut c_void> as Allocator>::Pointer, *mut i32);
assert_type_eq_all!(RebindPointer<DevicePointer<c_void>, i32>, DevicePointer<i32>);
assert_type_eq_all!(<DevicePointer<u8> as PointerTraits>::Space, Device);

assert_impl_all!(TaggedAllocator<i32, Device>: Allocate, Copy, Send, Sync, Eq);
assert_impl_all!(TaggedAllocator<c_void, Device>: Allocator);
assert_not_impl_any!(TaggedAllocator<c_void, Device>: Allocate);
assert_not_impl_any!(DeviceNewAllocator<c_void>: Allocate);
assert_impl_all!(DeviceNewAllocator<i32>: Allocate, Send, Sync);
assert_impl_all!(ResourceAllocator<'static, i32, SpaceHeap<Unified>>: Allocate, Send, Sync);
assert_impl_all!(SpaceHeap<Device>: MemoryResource, Send, Sync);

#[test]
fn device_allocators_always_compare_equal() {
    fn check<A: Allocator + Default + PartialEq>() {
        assert!(A::IS_ALWAYS_EQUAL);
        let a = A::default();
        let b = A::default();
        assert!(a == b);
        assert!(!(a != b));
        assert!(a == a.clone());
    }
    check::<TaggedAllocator<i32, Device>>();
    check::<TaggedAllocator<c_void, Unified>>();
    check::<TaggedAllocator<u8, Host>>();
    check::<DeviceNewAllocator<i32>>();
    check::<DeviceMallocAllocator<u64>>();

    assert!(TaggedAllocator::<i32, Device>::new() == TaggedAllocator::<u8, Device>::new());
    assert!(DeviceNewAllocator::<i32>::new() == DeviceNewAllocator::<i32>::new().rebind::<u16>());
}

#[test]
fn ten_ints_on_the_device() {
    let alloc = TaggedAllocator::<i32, Device>::new();
    assert_eq!(alloc.max_size(), usize::MAX / std::mem::size_of::<i32>());

    let ptr = alloc.allocate(10).unwrap();
    for i in 0..10 {
        let mut slot = unsafe { SpaceMut::from_ptr(ptr.add(i)) };
        slot.write(100 - i as i32).unwrap();
    }
    for i in 0..10 {
        let slot = unsafe { SpaceRef::from_ptr(ptr.add(i)) };
        assert_eq!(slot.read().unwrap(), 100 - i as i32);
    }
    unsafe { alloc.deallocate(ptr, 10) };
}

#[test]
fn ten_ints_through_device_new() {
    let alloc = DeviceNewAllocator::<i32>::new();
    assert_eq!(alloc.max_size(), usize::MAX / 4);

    let ptr = alloc.allocate(10).unwrap();
    let host: Vec<i32> = (0..10).collect();
    unsafe {
        Device::copy_from_host(host.as_ptr(), ptr, 10).unwrap();
        let mut back = vec![0; 10];
        Device::copy_to_host(ptr, back.as_mut_ptr(), 10).unwrap();
        assert_eq!(back, host);
        alloc.deallocate(ptr, 10);
    }
}

#[test]
fn over_max_size_allocates_nothing() {
    let heap: SpaceHeap<Device> = SpaceHeap::new();
    let alloc = ResourceAllocator::<u32, _>::new(&heap);

    let err = alloc.allocate(alloc.max_size() + 1).unwrap_err();
    assert_eq!(
        err,
        AllocError::SizeExceeded {
            requested: usize::MAX / 4 + 1,
            max_size: usize::MAX / 4,
        }
    );
    assert!(err.is_bad_alloc());
    assert_eq!(heap.stats(), HeapStats::default());

    let err = DeviceNewAllocator::<u64>::new()
        .allocate(usize::MAX)
        .unwrap_err();
    assert!(err.is_bad_alloc());
}

#[test]
fn exhausted_heap_is_bad_alloc() {
    let heap: SpaceHeap<Unified> = SpaceHeap::with_config(HeapConfig::default().with_limit(100));
    let alloc = ResourceAllocator::<u8, _>::new(&heap);

    let first = alloc.allocate(80).unwrap();
    let err = alloc.allocate(40).unwrap_err();
    assert!(err.is_bad_alloc());
    assert_eq!(heap.stats().live_bytes, 80);

    unsafe { alloc.deallocate(first, 80) };
    let second = alloc.allocate(100).unwrap();
    unsafe { alloc.deallocate(second, 100) };
}

#[test]
fn address_refers_back_to_the_element() {
    let alloc = TaggedAllocator::<u64, Unified>::new();
    let ptr = alloc.allocate(3).unwrap();
    unsafe {
        let mut slot = SpaceMut::from_ptr(ptr.add(1));
        slot.write(42).unwrap();

        let addr = alloc.address_mut(&slot);
        assert_eq!(addr, ptr.add(1));
        let again = SpaceRef::from_ptr(addr);
        assert!(again.ptr_eq(&slot.as_ref()));
        assert_eq!(again.read().unwrap(), 42);
        assert_eq!(*addr.as_host_ptr().unwrap(), 42);

        alloc.deallocate(ptr, 3);
    }
}

#[test]
fn storage_is_shared_by_equal_allocators() {
    let a = TaggedAllocator::<u16, Device>::new();
    let b: TaggedAllocator<u16, Device> = a.rebind::<u8>().rebind();
    let ptr = a.allocate(7).unwrap();
    assert!(device_heap().contains(ptr));
    unsafe { b.deallocate(ptr, 7) };
    assert!(!device_heap().contains(ptr));
}

proptest! {
    #[test]
    fn allocate_deallocate_round_trip(count in 0usize..4096, fill in any::<u32>()) {
        let heap: SpaceHeap<Device> = SpaceHeap::new();
        let alloc = ResourceAllocator::<u32, _>::new(&heap);

        let ptr = alloc.allocate(count).unwrap();
        prop_assert_eq!(heap.contains(ptr), count > 0);
        if count > 0 {
            let mut last = unsafe { SpaceMut::from_ptr(ptr.add(count - 1)) };
            last.write(fill).unwrap();
            prop_assert_eq!(last.read().unwrap(), fill);
        }
        unsafe { alloc.deallocate(ptr, count) };

        prop_assert!(!heap.contains(ptr));
        let stats = heap.stats();
        prop_assert_eq!(stats.live_blocks, 0);
        prop_assert_eq!(stats.live_bytes, 0);
        prop_assert_eq!(stats.total_allocations, stats.total_deallocations);
    }

    #[test]
    fn counts_beyond_max_size_always_fail(excess in 1usize..1024) {
        let alloc = TaggedAllocator::<[u8; 16], Device>::new();
        let count = alloc.max_size().saturating_add(excess);
        let err = alloc.allocate(count).unwrap_err();
        prop_assert!(err.is_bad_alloc());
    }

    #[test]
    fn buffers_preserve_contents(data in proptest::collection::vec(any::<i64>(), 0..512)) {
        let buffer = SpaceBuffer::from_slice_in(&data, DeviceNewAllocator::new()).unwrap();
        prop_assert_eq!(buffer.len(), data.len());
        prop_assert_eq!(buffer.to_vec().unwrap(), data);
    }
}
