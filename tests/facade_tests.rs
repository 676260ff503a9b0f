//! Integration tests for the public container types.
//!
//! The suite covers the full facade surface:
//!
//! - `test_function_pointer_round_trip`, `test_closure_capture`: Wrapping and
//!   invoking plain callables through [`Function`]
//! - `test_member_projection`: Field access through a wrapped `Member`
//! - `test_clone_independence`, `test_unique_function_is_not_clone`: The
//!   copyable/move-only capability split
//! - `test_container_pool_accounting`, `test_container_adoption_policies`:
//!   Allocator-retaining containers with a counting pool
//! - `test_swap_involution`, `test_take_drains`, `test_default_is_empty`:
//!   The wrapper state machine at the facade level
//! - `test_debug_formatting`, `test_error_values`: Observability surfaces

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use allocator_api2::alloc::{AllocError, Allocator, Global, Layout};
use core::ptr::NonNull;
use dynfn::{
    Function, FunctionContainer, StorageAllocator, StorageKind, UniqueFunction,
    UniqueFunctionContainer,
    errors::{AllocatorMismatchError, CallError},
    member,
};

/// An allocator that tracks the number of live bytes in its pool.
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

fn add1(x: i32) -> i32 {
    x + 1
}

#[test]
fn test_function_pointer_round_trip() {
    let f: Function<fn(i32) -> i32> = Function::new(add1 as fn(i32) -> i32);
    assert!(f.has_target());
    assert_eq!(f.storage_kind(), StorageKind::Local);
    assert_eq!(f.call((41,)), 42);

    let recovered = f
        .target_ref::<fn(i32) -> i32>()
        .expect("function holds a fn pointer");
    assert_eq!(recovered(-1), 0);
    assert!(f.holds::<fn(i32) -> i32>());
    assert!(!f.holds::<fn(u8) -> u8>());
}

#[test]
fn test_closure_capture() {
    let greeting = String::from("hello");
    let f: Function<fn(String) -> String> =
        Function::new(move |name: String| format!("{greeting}, {name}"));
    assert_eq!(f.call(("world".to_owned(),)), "hello, world");
}

#[test]
fn test_member_projection() {
    struct S {
        m: i32,
    }

    let f = Function::from_member(member(|s: &S| s.m));
    assert_eq!(f.storage_kind(), StorageKind::Member);
    assert_eq!(f.call((S { m: 42 },)), 42);

    // Members are copyable like any other shared-callable target.
    let g = f.clone();
    assert_eq!(g.call((S { m: 7 },)), 7);
}

#[test]
fn test_clone_independence() {
    let mut f: Function<fn() -> i32> = Function::new(|| 1);
    let g = f.clone();
    f.assign(|| 2);
    assert_eq!(f.call(()), 2);
    assert_eq!(g.call(()), 1);
}

#[test]
fn test_unique_function_is_not_clone() {
    use static_assertions::assert_not_impl_any;

    assert_not_impl_any!(UniqueFunction<fn()>: Clone);
    assert_not_impl_any!(UniqueFunctionContainer<fn()>: Clone);
    // The payload type is erased, so no wrapper promises thread safety.
    assert_not_impl_any!(Function<fn()>: Send, Sync);
}

#[test]
fn test_unique_function_accumulates() {
    let mut history = Vec::new();
    let mut f: UniqueFunction<fn(i32) -> usize> = UniqueFunction::new(move |x: i32| {
        history.push(x);
        history.len()
    });
    assert_eq!(f.call_mut((10,)), 1);
    assert_eq!(f.call_mut((20,)), 2);
    assert_eq!(f.try_call((30,)), Err(CallError::RequiresMut));
}

#[test]
fn test_container_pool_accounting() {
    let pool = CountingAlloc::new();
    let drops = Arc::new(AtomicUsize::new(0));

    struct Tracked {
        drops: Arc<AtomicUsize>,
        payload: [u64; 8],
    }
    impl Clone for Tracked {
        fn clone(&self) -> Self {
            Tracked {
                drops: Arc::clone(&self.drops),
                payload: self.payload,
            }
        }
    }
    impl Tracked {
        // Closures read through this method so they capture the whole
        // struct, not just the `Copy` payload field.
        fn value(&self, i: usize) -> u64 {
            self.payload[i]
        }
    }
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    {
        let tracked = Tracked {
            drops: Arc::clone(&drops),
            payload: [5; 8],
        };
        let c = FunctionContainer::<fn(usize) -> u64, _>::with_target_in(
            move |i: usize| tracked.value(i),
            pool.clone(),
        );
        assert_eq!(c.storage_kind(), StorageKind::Heap);
        assert!(pool.live_bytes() > 0);
        assert_eq!(c.call((3,)), 5);

        let baseline = pool.live_bytes();
        let clone = c.clone();
        assert_eq!(pool.live_bytes(), 2 * baseline);
        drop(c);
        assert_eq!(clone.call((0,)), 5);
    }
    assert_eq!(pool.live_bytes(), 0);
    assert_eq!(drops.load(Ordering::Relaxed), 2);
}

#[test]
fn test_container_adoption_policies() {
    let pool_a = CountingAlloc::new();
    let pool_b = CountingAlloc::new();

    // Same allocator type, different pool: the value is re-homed.
    let mut source =
        FunctionContainer::<fn() -> i32, _>::with_target_in(|| 13, pool_a.clone());
    let node_bytes = pool_a.live_bytes();
    let mut dest = FunctionContainer::<fn() -> i32, _>::new_in(pool_b.clone());
    dest.adopt(&mut source).unwrap();
    assert!(!source.has_target());
    assert_eq!(pool_a.live_bytes(), 0);
    assert_eq!(pool_b.live_bytes(), node_bytes);
    assert_eq!(dest.call(()), 13);

    // Different allocator type: rejected, both sides untouched.
    let mut global = FunctionContainer::<fn() -> i32>::with_target_in(|| 1, Global);
    assert_eq!(dest.adopt(&mut global), Err(AllocatorMismatchError));
    assert_eq!(dest.call(()), 13);
    assert_eq!(global.call(()), 1);

    // Inline payloads are pool-independent and always adopt.
    let mut small: Function<fn() -> i32> = Function::new(|| 99);
    dest.adopt_function(&mut small).unwrap();
    assert_eq!(dest.storage_kind(), StorageKind::Local);
    assert_eq!(dest.call(()), 99);
}

#[test]
fn test_swap_involution() {
    let mut a: Function<fn() -> &'static str> = Function::new(|| "a");
    let mut b: Function<fn() -> &'static str> = Function::empty();
    a.swap(&mut b);
    assert!(!a.has_target());
    assert_eq!(b.call(()), "a");
    a.swap(&mut b);
    assert_eq!(a.call(()), "a");
    assert!(!b.has_target());
}

#[test]
fn test_take_drains() {
    let mut f: Function<fn() -> u8> = Function::new(|| 1u8);
    let taken = f.take();
    assert!(!f.has_target());
    assert_eq!(taken.call(()), 1);
    assert_eq!(f.try_call(()), Err(CallError::NoTarget));
}

#[test]
fn test_default_is_empty() {
    assert!(!Function::<fn()>::default().has_target());
    assert!(!UniqueFunction::<fn()>::default().has_target());
    assert!(!FunctionContainer::<fn()>::default().has_target());
    assert!(!UniqueFunctionContainer::<fn()>::default().has_target());
}

#[test]
fn test_debug_formatting() {
    let empty: Function<fn()> = Function::empty();
    assert!(format!("{empty:?}").contains("<empty>"));

    let full: Function<fn() -> i32> = Function::new(|| 0);
    assert!(!format!("{full:?}").contains("<empty>"));
}

#[test]
fn test_error_values() {
    let empty: Function<fn()> = Function::empty();
    let error = empty.try_call(()).unwrap_err();
    assert_eq!(error, CallError::NoTarget);
    assert!(error.to_string().contains("empty"));

    let recovery = empty.recover_ref::<i32>().unwrap_err();
    assert_eq!(recovery.found, None);
    assert!(recovery.to_string().contains("wrapper is empty"));
}

#[test]
fn test_widening_keeps_shared_path() {
    let f: Function<fn(i32) -> i32> = Function::new(add1 as fn(i32) -> i32);
    let mut unique = UniqueFunction::from(f);
    assert_eq!(unique.try_call((1,)), Ok(2));
    assert_eq!(unique.call_mut((2,)), 3);
}
