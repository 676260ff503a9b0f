//! Buffer and payload layouts for type-erased storage.
//!
//! This module encapsulates the fields of [`RawCell`], [`PayloadSlot`] and
//! [`HeapPayload`]. Since this is the only place raw payload bytes are read
//! or written, the payload type named by a cell's [`WrapperVtable`] is
//! guaranteed to always be in sync with the bytes actually stored in the
//! slot: the two are paired at construction and the API offers no way to
//! change one without the other.
//!
//! # Layout
//!
//! [`RawCell`] is `#[repr(C)]` with the vtable reference as its first field,
//! so the active table sits at offset zero regardless of which payload type
//! currently occupies the slot.

use core::{
    alloc::Layout,
    mem::MaybeUninit,
    ptr::NonNull,
};

use allocator_api2::alloc::{Allocator, handle_alloc_error};

use crate::{
    allocator::StorageAllocator,
    signature::Signature,
    wrapper::vtable::WrapperVtable,
};

/// Number of pointer-words in a payload slot.
const PAYLOAD_WORDS: usize = 3;

/// The raw payload area of a wrapper cell: three pointer-words of
/// uninitialized storage with pointer alignment.
///
/// The slot itself carries no type information. Which type (if any) currently
/// occupies it is tracked by the [`WrapperVtable`] stored next to it in the
/// [`RawCell`].
#[derive(Clone, Copy)]
#[repr(C)]
pub(super) struct PayloadSlot {
    /// The raw storage words.
    words: [MaybeUninit<*mut ()>; PAYLOAD_WORDS],
}

impl PayloadSlot {
    /// Creates an uninitialized slot.
    #[inline]
    pub(super) fn uninit() -> Self {
        PayloadSlot {
            words: [MaybeUninit::uninit(); PAYLOAD_WORDS],
        }
    }

    /// Returns a pointer to the first byte of the slot.
    #[inline]
    pub(super) fn as_ptr(&self) -> *const () {
        self.words.as_ptr().cast()
    }

    /// Returns a mutable pointer to the first byte of the slot.
    #[inline]
    pub(super) fn as_mut_ptr(&mut self) -> *mut () {
        self.words.as_mut_ptr().cast()
    }
}

/// Returns `true` when a value of type `P` can be stored directly in a
/// [`PayloadSlot`].
#[inline]
pub(super) const fn payload_fits<P>() -> bool {
    size_of::<P>() <= size_of::<PayloadSlot>() && align_of::<P>() <= align_of::<PayloadSlot>()
}

/// The complete wrapper cell: a vtable header followed by the payload slot.
///
/// # Safety Invariant
///
/// The payload slot always holds a live value of exactly the payload type the
/// vtable's thunks were instantiated with. The empty table pairs with a slot
/// whose bytes are dead.
#[repr(C)]
pub(super) struct RawCell<S: Signature> {
    /// The dispatch table for the payload currently in the slot.
    vtable: &'static WrapperVtable<S>,
    /// The payload storage.
    payload: PayloadSlot,
}

impl<S: Signature> RawCell<S> {
    /// Creates a cell holding `payload`, dispatched through `vtable`.
    ///
    /// The caller pairs the table with the payload type: every construction
    /// site in [`vtable`](crate::wrapper::vtable) and
    /// [`raw`](crate::wrapper::raw) passes a table instantiated for exactly
    /// the `P` it stores, which is what upholds this module's safety
    /// invariant.
    #[inline]
    pub(super) fn with_payload<P>(vtable: &'static WrapperVtable<S>, payload: P) -> Self {
        debug_assert!(payload_fits::<P>());
        let mut slot = PayloadSlot::uninit();
        // SAFETY: `P` fits the slot in size and alignment (asserted above;
        // every construction site is gated on `payload_fits`), and the slot
        // is freshly uninitialized storage valid for writes.
        unsafe {
            slot.as_mut_ptr().cast::<P>().write(payload);
        }
        RawCell {
            vtable,
            payload: slot,
        }
    }

    /// Creates a cell with no payload, headed by the empty table.
    #[inline]
    pub(super) fn new_empty() -> Self {
        RawCell {
            vtable: WrapperVtable::empty(),
            payload: PayloadSlot::uninit(),
        }
    }

    /// Returns the cell's dispatch table.
    #[inline]
    pub(super) fn vtable(&self) -> &'static WrapperVtable<S> {
        self.vtable
    }

    /// Repoints the header at the empty table, abandoning the slot bytes.
    ///
    /// The caller must already have dropped or moved out the payload.
    #[inline]
    pub(super) fn reset_empty(&mut self) {
        self.vtable = WrapperVtable::empty();
    }

    /// Moves the cell's bits out, leaving `self` empty.
    ///
    /// Every payload variant is trivially relocatable within its pool, so a
    /// plain bit copy transfers ownership; the source header is then
    /// repointed at the empty table so its stale bytes are never touched
    /// again.
    #[inline]
    pub(super) fn take_bits(&mut self) -> Self {
        let moved = RawCell {
            vtable: self.vtable,
            payload: self.payload,
        };
        self.reset_empty();
        moved
    }

    /// Borrows the payload as a `P`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The slot holds a live value of type `P`.
    #[inline]
    pub(super) unsafe fn payload_ref<P>(&self) -> &P {
        // SAFETY: The slot holds a live, properly aligned `P` as guaranteed
        // by the caller.
        unsafe { &*self.payload.as_ptr().cast::<P>() }
    }

    /// Mutably borrows the payload as a `P`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The slot holds a live value of type `P`.
    #[inline]
    pub(super) unsafe fn payload_mut<P>(&mut self) -> &mut P {
        // SAFETY: The slot holds a live, properly aligned `P` as guaranteed
        // by the caller.
        unsafe { &mut *self.payload.as_mut_ptr().cast::<P>() }
    }

    /// Reads the payload out of the slot by value.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The slot holds a live value of type `P`.
    /// 2. Ownership of the payload transfers to the returned value: the slot
    ///    bytes must not be used as a live `P` afterwards (typically the
    ///    caller resets or overwrites the header next).
    #[inline]
    pub(super) unsafe fn payload_read<P>(&self) -> P {
        // SAFETY: The slot holds a live, properly aligned `P` (caller
        // guarantee 1) and the caller takes ownership (caller guarantee 2).
        unsafe { self.payload.as_ptr().cast::<P>().read() }
    }
}

/// Payload layout of heap-backed storage: a pointer to the target in an
/// allocator node, together with the allocator it came from.
///
/// # Safety Invariant
///
/// `ptr` always points to a live `F` in a node obtained from `alloc` with
/// `Layout::new::<F>()`, from construction until the payload is consumed by
/// [`HeapPayload::dispose`] or [`HeapPayload::into_value`].
pub(super) struct HeapPayload<A: StorageAllocator, F> {
    /// The target, in a node owned by `alloc`.
    ptr: NonNull<F>,
    /// The allocator the node was obtained from.
    alloc: A,
}

impl<A: StorageAllocator, F> HeapPayload<A, F> {
    /// Allocates a node from `alloc` and moves `value` into it.
    ///
    /// Diverges via [`handle_alloc_error`] when the allocation fails, before
    /// any wrapper state is built.
    pub(super) fn new_in(value: F, alloc: A) -> Self {
        let layout = Layout::new::<F>();
        let ptr = match alloc.allocate(layout) {
            Ok(node) => node.cast::<F>(),
            Err(_) => handle_alloc_error(layout),
        };
        // SAFETY: The node was just allocated for `layout` (or is a dangling,
        // aligned pointer for a zero-sized `F`), so it is valid for a write
        // of one `F`.
        unsafe {
            ptr.as_ptr().write(value);
        }
        HeapPayload { ptr, alloc }
    }

    /// Drops the target and releases the node back to the allocator.
    pub(super) fn dispose(self) {
        let layout = Layout::new::<F>();
        // SAFETY: `ptr` points to a live `F` (type invariant) and this
        // method consumes the payload, so the value is dropped exactly once.
        unsafe {
            self.ptr.as_ptr().drop_in_place();
        }
        // SAFETY: The node was obtained from `self.alloc` with `layout`
        // (type invariant).
        unsafe {
            self.alloc.deallocate(self.ptr.cast(), layout);
        }
    }

    /// Moves the target out and releases the node back to the allocator.
    pub(super) fn into_value(self) -> F {
        let layout = Layout::new::<F>();
        // SAFETY: `ptr` points to a live `F` (type invariant) and this
        // method consumes the payload, so ownership transfers exactly once.
        let value = unsafe { self.ptr.as_ptr().read() };
        // SAFETY: The node was obtained from `self.alloc` with `layout`
        // (type invariant).
        unsafe {
            self.alloc.deallocate(self.ptr.cast(), layout);
        }
        value
    }

    /// Returns a reference to the target.
    #[inline]
    pub(super) fn target(&self) -> &F {
        // SAFETY: `ptr` points to a live `F` for as long as the payload
        // exists (type invariant).
        unsafe { self.ptr.as_ref() }
    }

    /// Returns a mutable reference to the target.
    #[inline]
    pub(super) fn target_mut(&mut self) -> &mut F {
        // SAFETY: `ptr` points to a live `F` for as long as the payload
        // exists (type invariant), and we hold exclusive access.
        unsafe { self.ptr.as_mut() }
    }

    /// Returns a reference to the allocator the node lives in.
    #[inline]
    pub(super) fn allocator(&self) -> &A {
        &self.alloc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_layout() {
        use core::mem::offset_of;

        assert_eq!(offset_of!(RawCell<fn()>, vtable), 0);
        assert_eq!(offset_of!(RawCell<fn(i32) -> i32>, vtable), 0);
        assert_eq!(
            offset_of!(RawCell<fn()>, payload),
            size_of::<&'static WrapperVtable<fn()>>()
        );
        assert_eq!(size_of::<RawCell<fn()>>(), 4 * size_of::<*mut ()>());
    }

    #[test]
    fn test_payload_fits() {
        assert!(payload_fits::<()>());
        assert!(payload_fits::<usize>());
        assert!(payload_fits::<[usize; 3]>());
        assert!(!payload_fits::<[usize; 4]>());

        #[repr(align(64))]
        struct Overaligned(#[allow(dead_code)] u8);
        assert!(!payload_fits::<Overaligned>());
    }

    #[test]
    fn test_heap_payload_round_trip() {
        use allocator_api2::alloc::Global;

        let payload = HeapPayload::new_in([7usize; 8], Global);
        assert_eq!(payload.target()[3], 7);
        let value = payload.into_value();
        assert_eq!(value, [7usize; 8]);
    }
}
