#![allow(dead_code)]

use devalloc::allocator::{Allocate, TaggedAllocator};
use devalloc::memory::{Device, DeviceCopy, SpaceBuffer};

#[derive(Clone, DeviceCopy)]
struct ZeroSizedStruct;

#[derive(Clone, DeviceCopy)]
struct TupleStruct(u64, u64);

#[derive(Clone, DeviceCopy)]
struct NormalStruct {
    x: u64,
    y: u64,
}

#[derive(Clone, DeviceCopy)]
struct ContainerStruct {
    a: NormalStruct,
    b: TupleStruct,
}

#[derive(Clone, DeviceCopy)]
struct GenericStruct<T> {
    value: T,
}

#[derive(Clone, DeviceCopy)]
enum TestEnum {
    Unit,
    Tuple(u64),
    Struct { x: u64, y: u64 },
    Container { a: NormalStruct, b: TupleStruct },
}

#[derive(Clone, DeviceCopy)]
enum GenericEnum<T> {
    Unit,
    Generic { val: T },
}

#[derive(Copy, Clone, DeviceCopy)]
#[repr(C)]
union TestUnion {
    u: u64,
    i: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, DeviceCopy)]
struct Particle {
    position: [f32; 3],
    velocity: [f32; 3],
    alive: bool,
}

#[test]
fn test_hidden_functions() {
    __verify_ZeroSizedStruct_can_implement_DeviceCopy(&ZeroSizedStruct);
    __verify_TupleStruct_can_implement_DeviceCopy(&TupleStruct(0, 0));
    __verify_NormalStruct_can_implement_DeviceCopy(&NormalStruct { x: 0, y: 0 });
    __verify_ContainerStruct_can_implement_DeviceCopy(&ContainerStruct {
        a: NormalStruct { x: 0, y: 0 },
        b: TupleStruct(0, 0),
    });
    __verify_GenericStruct_can_implement_DeviceCopy(&GenericStruct { value: 0u64 });
    __verify_TestEnum_can_implement_DeviceCopy(&TestEnum::Unit);
    __verify_GenericEnum_can_implement_DeviceCopy::<u64>(&GenericEnum::Unit);
    __verify_TestUnion_can_implement_DeviceCopy(&TestUnion { u: 0u64 });
}

#[test]
fn derived_types_can_be_allocated() {
    let alloc = TaggedAllocator::<Particle, Device>::new();
    assert_eq!(alloc.max_size(), usize::MAX / std::mem::size_of::<Particle>());

    let particle = Particle {
        position: [1.0, 2.0, 3.0],
        velocity: [0.5, 0.0, -0.5],
        alive: true,
    };
    let buffer = SpaceBuffer::filled_in(&particle, 16, alloc).unwrap();
    assert!(buffer.to_vec().unwrap().iter().all(|p| *p == particle));
}
