//! Integration tests for the dynfn-internals crate functionality.
//!
//! This suite exercises the type-erased wrapper engine end to end:
//!
//! ## Call behavior
//! - `test_direct_call_equivalence`: A wrapped target and a direct call
//!   produce the same results for the same arguments
//! - `test_empty_wrapper_reports_no_target`: Invoking an empty wrapper is an
//!   error, not undefined behavior
//! - `test_mutable_only_target`: Stateful `FnMut` targets accumulate through
//!   the mutable path and reject the shared path
//! - `test_member_accessor`: Field projection through a `Member` payload
//!
//! ## State machine
//! - `test_take_drains_source`, `test_swap_is_an_involution`,
//!   `test_emptiness_laws`: The move/swap/emptiness laws
//! - `test_type_recovery_round_trip`: Checked downcasts recover exactly the
//!   stored target
//!
//! ## Memory management
//! - `test_allocator_byte_balance`: A counting pool returns to its baseline
//!   once every wrapper built from it is dropped
//! - `test_clone_independence_and_drop_count`: Clones own independent
//!   payloads and each payload drops exactly once
//! - `test_adopt_same_pool_moves_pointer`: Adoption within one pool performs
//!   no new allocation
//! - `test_adopt_rehomes_across_pools`: Adoption across pools of the same
//!   allocator type reallocates in the destination pool
//! - `test_foreign_allocator_family_is_rejected`: Cross-family adoption and
//!   cloning fail with `AllocatorMismatchError` and leave both sides intact

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use allocator_api2::alloc::{AllocError, Allocator, Global, Layout};
use core::ptr::NonNull;
use dynfn_internals::{
    Member, RawWrapper, StorageKind,
    allocator::StorageAllocator,
    errors::{AllocatorMismatchError, CallError},
    member,
};

/// An allocator that tracks the number of live bytes in its pool.
///
/// Two instances share a pool exactly when they share the counter.
#[derive(Clone)]
struct CountingAlloc {
    bytes: Arc<AtomicUsize>,
}

impl CountingAlloc {
    fn new() -> Self {
        CountingAlloc {
            bytes: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn live_bytes(&self) -> usize {
        self.bytes.load(Ordering::Relaxed)
    }
}

unsafe impl Allocator for CountingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = Global.allocate(layout)?;
        self.bytes.fetch_add(layout.size(), Ordering::Relaxed);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.bytes.fetch_sub(layout.size(), Ordering::Relaxed);
        unsafe { Global.deallocate(ptr, layout) }
    }
}

impl StorageAllocator for CountingAlloc {
    fn same_pool(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

/// A non-trivially-droppable value too large for inline storage.
struct Tracked {
    drops: Arc<AtomicUsize>,
    payload: [u64; 6],
}

impl Tracked {
    fn new(drops: &Arc<AtomicUsize>) -> Self {
        Tracked {
            drops: Arc::clone(drops),
            payload: [11; 6],
        }
    }

    // Closures read through this method so they capture the whole struct,
    // not just the `Copy` payload field.
    fn value(&self, i: usize) -> u64 {
        self.payload[i]
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Tracked {
            drops: Arc::clone(&self.drops),
            payload: self.payload,
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::Relaxed);
    }
}

fn add1(x: i32) -> i32 {
    x + 1
}

#[test]
fn test_direct_call_equivalence() {
    let wrapper = RawWrapper::<fn(i32) -> i32>::from_target(add1 as fn(i32) -> i32);
    for x in [-3, 0, 41, i32::MAX - 1] {
        assert_eq!(wrapper.try_call((x,)), Ok(add1(x)));
    }

    let concat = |a: String, b: String| format!("{a}{b}");
    let wrapper = RawWrapper::<fn(String, String) -> String>::from_target(concat);
    assert_eq!(
        wrapper.try_call(("foo".to_owned(), "bar".to_owned())),
        Ok("foobar".to_owned())
    );
}

#[test]
fn test_empty_wrapper_reports_no_target() {
    let mut wrapper = RawWrapper::<fn(i32) -> i32>::empty();
    assert!(wrapper.is_empty());
    assert_eq!(wrapper.try_call((1,)), Err(CallError::NoTarget));
    assert_eq!(wrapper.try_call_mut((1,)), Err(CallError::NoTarget));
}

#[test]
fn test_mutable_only_target() {
    let mut total = 0i64;
    let mut wrapper = RawWrapper::<fn(i64) -> i64>::from_target_mut(move |x: i64| {
        total += x;
        total
    });
    assert_eq!(wrapper.try_call((1,)), Err(CallError::RequiresMut));
    assert_eq!(wrapper.try_call_mut((1,)), Ok(1));
    assert_eq!(wrapper.try_call_mut((2,)), Ok(3));
    assert_eq!(wrapper.try_call_mut((3,)), Ok(6));
    // Mutable-only targets are move-only as well.
    assert!(!wrapper.is_cloneable());
    assert!(wrapper.try_clone().is_none());
}

#[test]
fn test_member_accessor() {
    struct S {
        m: i32,
    }

    let wrapper = RawWrapper::from_member(member(|s: &S| s.m));
    assert_eq!(wrapper.storage_kind(), StorageKind::Member);
    assert_eq!(wrapper.try_call((S { m: 42 },)), Ok(42));
    assert!(wrapper.holds::<Member<S, i32>>());

    let clone = wrapper.try_clone().expect("members are copyable");
    assert_eq!(clone.try_call((S { m: 7 },)), Ok(7));
}

#[test]
fn test_take_drains_source() {
    let mut wrapper = RawWrapper::<fn(i32) -> i32>::from_target(add1 as fn(i32) -> i32);
    let taken = wrapper.take();
    assert!(wrapper.is_empty());
    assert!(!taken.is_empty());
    assert_eq!(taken.try_call((1,)), Ok(2));

    // Taking from an already-empty wrapper yields another empty wrapper.
    let taken_again = wrapper.take();
    assert!(taken_again.is_empty());
}

#[test]
fn test_swap_is_an_involution() {
    let mut a = RawWrapper::<fn() -> u8>::from_target(|| 1u8);
    let mut b = RawWrapper::<fn() -> u8>::from_target(|| 2u8);
    a.swap(&mut b);
    assert_eq!(a.try_call(()), Ok(2));
    assert_eq!(b.try_call(()), Ok(1));
    a.swap(&mut b);
    assert_eq!(a.try_call(()), Ok(1));
    assert_eq!(b.try_call(()), Ok(2));
}

#[test]
fn test_emptiness_laws() {
    let empty = RawWrapper::<fn()>::empty();
    assert!(empty.is_empty());
    assert_eq!(empty.storage_kind(), StorageKind::Empty);
    assert_eq!(empty.target_type_id(), None);
    assert_eq!(empty.target_type_name(), None);

    let full = RawWrapper::<fn()>::from_target(|| ());
    assert!(!full.is_empty());
    assert!(full.target_type_id().is_some());
    assert!(full.target_type_name().is_some());
}

#[test]
fn test_type_recovery_round_trip() {
    let mut wrapper = RawWrapper::<fn(i32) -> i32>::from_target(add1 as fn(i32) -> i32);

    let recovered = wrapper
        .target_ref::<fn(i32) -> i32>()
        .expect("wrapper holds a fn pointer");
    assert_eq!(recovered(10), 11);

    // The wrong type is rejected without touching the payload.
    assert!(wrapper.target_ref::<fn(u32) -> u32>().is_none());
    assert!(wrapper.target_mut::<String>().is_none());
    assert_eq!(wrapper.try_call((0,)), Ok(1));
}

#[test]
fn test_allocator_byte_balance() {
    let pool = CountingAlloc::new();
    assert_eq!(pool.live_bytes(), 0);

    let drops = Arc::new(AtomicUsize::new(0));
    {
        let tracked = Tracked::new(&drops);
        let target = move |i: usize| tracked.value(i);
        assert_eq!(size_of_val(&target), size_of::<Tracked>());
        let wrapper = RawWrapper::<fn(usize) -> u64>::from_target_in(target, pool.clone());
        assert_eq!(wrapper.storage_kind(), StorageKind::Heap);
        assert!(pool.live_bytes() > 0);
        assert_eq!(wrapper.try_call((2,)), Ok(11));
        // The tracked value now lives inside the wrapper, so nothing has
        // dropped it yet.
        assert_eq!(drops.load(Ordering::Relaxed), 0);
    }
    assert_eq!(pool.live_bytes(), 0);
    assert_eq!(drops.load(Ordering::Relaxed), 1);
}

#[test]
fn test_clone_independence_and_drop_count() {
    let pool = CountingAlloc::new();
    let drops = Arc::new(AtomicUsize::new(0));

    let tracked = Tracked::new(&drops);
    let wrapper = RawWrapper::<fn() -> u64>::from_target_in(move || tracked.value(0), pool.clone());
    let baseline = pool.live_bytes();

    let clone = wrapper.try_clone().expect("target is copyable");
    assert_eq!(pool.live_bytes(), 2 * baseline);

    drop(wrapper);
    assert_eq!(pool.live_bytes(), baseline);
    assert_eq!(clone.try_call(()), Ok(11));

    drop(clone);
    assert_eq!(pool.live_bytes(), 0);
    assert_eq!(drops.load(Ordering::Relaxed), 2);
}

#[test]
fn test_adopt_same_pool_moves_pointer() {
    let pool = CountingAlloc::new();
    let mut source =
        RawWrapper::<fn(i32) -> i32>::from_target_in(add1 as fn(i32) -> i32, pool.clone());
    let baseline = pool.live_bytes();

    let mut dest = RawWrapper::<fn(i32) -> i32>::empty();
    dest.adopt_in(&mut source, &pool).unwrap();
    assert!(source.is_empty());
    assert_eq!(pool.live_bytes(), baseline);
    assert_eq!(dest.try_call((1,)), Ok(2));
}

#[test]
fn test_adopt_rehomes_across_pools() {
    let pool_a = CountingAlloc::new();
    let pool_b = CountingAlloc::new();
    assert!(!pool_a.same_pool(&pool_b));

    let drops = Arc::new(AtomicUsize::new(0));
    let tracked = Tracked::new(&drops);
    let mut source =
        RawWrapper::<fn() -> u64>::from_target_in(move || tracked.value(5), pool_a.clone());
    let node_bytes = pool_a.live_bytes();
    assert!(node_bytes > 0);

    let mut dest = RawWrapper::<fn() -> u64>::empty();
    dest.adopt_in(&mut source, &pool_b).unwrap();

    assert!(source.is_empty());
    assert_eq!(pool_a.live_bytes(), 0);
    assert_eq!(pool_b.live_bytes(), node_bytes);
    // The target moved without being dropped or cloned.
    assert_eq!(drops.load(Ordering::Relaxed), 0);
    assert_eq!(dest.try_call(()), Ok(11));

    drop(dest);
    assert_eq!(pool_b.live_bytes(), 0);
    assert_eq!(drops.load(Ordering::Relaxed), 1);
}

#[test]
fn test_foreign_allocator_family_is_rejected() {
    let pool = CountingAlloc::new();
    let mut source =
        RawWrapper::<fn(i32) -> i32>::from_target_in(add1 as fn(i32) -> i32, pool.clone());

    let mut dest = RawWrapper::<fn(i32) -> i32>::from_target(add1 as fn(i32) -> i32);
    assert_eq!(dest.adopt_in(&mut source, &Global), Err(AllocatorMismatchError));
    // Both sides are untouched by the failed adoption.
    assert_eq!(source.try_call((1,)), Ok(2));
    assert_eq!(dest.try_call((5,)), Ok(6));

    assert_eq!(source.try_clone_in(&Global).unwrap_err(), AllocatorMismatchError);
    assert_eq!(source.try_call((1,)), Ok(2));

    // Inline payloads are pool-independent and adopt into any pool.
    let mut inline_dest = RawWrapper::<fn(i32) -> i32>::empty();
    inline_dest.adopt_in(&mut dest, &pool).unwrap();
    assert_eq!(inline_dest.try_call((5,)), Ok(6));
    assert_eq!(inline_dest.storage_kind(), StorageKind::Local);
}

#[test]
fn test_wrapper_auto_traits() {
    use static_assertions::assert_not_impl_any;

    // The payload type is erased, so the wrapper cannot promise thread
    // safety for it.
    assert_not_impl_any!(RawWrapper<fn()>: Send, Sync);
}
