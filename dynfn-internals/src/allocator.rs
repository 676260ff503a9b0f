//! The allocator capability used by heap-backed storage.
//!
//! Heap-backed wrappers store the target in a node obtained from an
//! allocator, keeping the allocator instance inline next to the node
//! pointer. Moving or copying such a wrapper into a *different* pool means
//! re-homing the node, so the dispatch machinery needs to ask two questions
//! the plain [`Allocator`] trait cannot answer:
//!
//! 1. Are all instances of this allocator type interchangeable (so a raw
//!    pointer move is always safe)?
//! 2. Do these two specific instances draw from the same pool?
//!
//! [`StorageAllocator`] adds exactly those capabilities on top of the
//! [`allocator_api2`] allocation interface.

use allocator_api2::alloc::{Allocator, Global};

/// An allocator usable as the backing store of a heap-backed wrapper.
///
/// Beyond allocation, the trait requires `Clone` (containers retain their
/// allocator and hand copies to every re-materialized payload) and pool
/// identity comparison, the runtime counterpart of C++'s
/// `allocator_traits::is_always_equal` plus `operator==`.
pub trait StorageAllocator: Allocator + Clone + 'static {
    /// Whether every instance of this allocator draws from the same pool.
    ///
    /// When `true`, payloads can always be moved between wrappers as raw
    /// pointers and the dispatch table omits its relocation entry entirely.
    const ALWAYS_EQUAL: bool = false;

    /// Returns `true` when `self` and `other` draw from the same pool, i.e.
    /// memory allocated through one may be released through the other.
    fn same_pool(&self, other: &Self) -> bool;
}

impl StorageAllocator for Global {
    const ALWAYS_EQUAL: bool = true;

    #[inline]
    fn same_pool(&self, _other: &Self) -> bool {
        true
    }
}
