//! The owned, type-erased wrapper engine.
//!
//! This module encapsulates the cell field of [`RawWrapper`], ensuring it is
//! only visible within this module. This visibility restriction guarantees
//! the safety invariant: **the cell is always in a coherent state, with its
//! header pointing at the table that was paired with the payload currently
//! in its slot**.
//!
//! # Safety Invariant
//!
//! Since the cell can only be set through the constructors and operations
//! below (no `pub` or `pub(crate)` fields), each of which either builds a
//! table/payload pair through [`RawCell::with_payload`] or drains a source
//! to the empty state, no reachable state has a table without a
//! correspondingly constructed payload.

use core::{any::TypeId, fmt, mem, ptr::NonNull};

use allocator_api2::alloc::Global;

use crate::{
    allocator::StorageAllocator,
    errors::{AllocatorMismatchError, CallError},
    member::Member,
    signature::{Call, CallMut, Signature},
    wrapper::{
        data::{HeapPayload, RawCell, payload_fits},
        vtable::{StorageKind, WrapperVtable},
    },
};

/// An owned, type-erased callable value with the call signature `S`.
///
/// The wrapper is a fixed-size value of four pointer-words. Targets small
/// enough for the inline slot are stored directly; larger targets live in a
/// node obtained from an allocator, with the node pointer and the allocator
/// stored inline instead.
///
/// All operations dispatch through the table in the cell header. Moves
/// between wrappers always drain the source to the empty state.
pub struct RawWrapper<S: Signature> {
    /// The vtable header plus payload slot.
    cell: RawCell<S>,
}

impl<S: Signature> RawWrapper<S> {
    /// Creates a wrapper with no target.
    #[inline]
    pub fn empty() -> Self {
        RawWrapper {
            cell: RawCell::new_empty(),
        }
    }

    /// Creates a wrapper holding a copyable target.
    ///
    /// Targets that fit the inline slot are stored locally; larger targets
    /// are stored in a node allocated from [`Global`].
    pub fn from_target<F>(target: F) -> Self
    where
        F: Call<S> + Clone,
    {
        if payload_fits::<F>() {
            RawWrapper {
                cell: RawCell::with_payload(WrapperVtable::local::<F>(), target),
            }
        } else {
            Self::from_target_in(target, Global)
        }
    }

    /// Creates a wrapper holding a move-only, mutable-receiver target.
    ///
    /// Targets that fit the inline slot are stored locally; larger targets
    /// are stored in a node allocated from [`Global`].
    pub fn from_target_mut<F>(target: F) -> Self
    where
        F: CallMut<S>,
    {
        if payload_fits::<F>() {
            RawWrapper {
                cell: RawCell::with_payload(WrapperVtable::local_mut::<F>(), target),
            }
        } else {
            Self::from_target_mut_in(target, Global)
        }
    }

    /// Creates a wrapper holding a copyable target in a node allocated from
    /// `alloc`.
    ///
    /// The target is always heap-backed, regardless of its size: an explicit
    /// allocator expresses a placement decision, not just a fallback.
    pub fn from_target_in<F, A>(target: F, alloc: A) -> Self
    where
        F: Call<S> + Clone,
        A: StorageAllocator,
    {
        RawWrapper {
            cell: RawCell::with_payload(
                WrapperVtable::heap::<A, F>(),
                HeapPayload::new_in(target, alloc),
            ),
        }
    }

    /// Creates a wrapper holding a move-only, mutable-receiver target in a
    /// node allocated from `alloc`.
    pub fn from_target_mut_in<F, A>(target: F, alloc: A) -> Self
    where
        F: CallMut<S>,
        A: StorageAllocator,
    {
        RawWrapper {
            cell: RawCell::with_payload(
                WrapperVtable::heap_mut::<A, F>(),
                HeapPayload::new_in(target, alloc),
            ),
        }
    }

    /// Whether the wrapper holds no target.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.storage_kind(), StorageKind::Empty)
    }

    /// The storage strategy of the current payload.
    #[inline]
    pub fn storage_kind(&self) -> StorageKind {
        self.cell.vtable().kind()
    }

    /// The [`TypeId`] of the stored target, or `None` when empty.
    #[inline]
    pub fn target_type_id(&self) -> Option<TypeId> {
        self.cell.vtable().type_id()
    }

    /// The name of the stored target's type, or `None` when empty.
    #[inline]
    pub fn target_type_name(&self) -> Option<&'static str> {
        self.cell.vtable().type_name()
    }

    /// The [`TypeId`] of the allocator backing the target, or `None` when
    /// the payload is allocator-free.
    #[inline]
    pub fn allocator_type_id(&self) -> Option<TypeId> {
        self.cell.vtable().allocator_type_id()
    }

    /// Whether the stored target can be cloned. Empty wrappers report
    /// `false`, though [`RawWrapper::try_clone`] still succeeds for them.
    #[inline]
    pub fn is_cloneable(&self) -> bool {
        self.cell.vtable().is_cloneable()
    }

    /// Whether the stored target is of type `T`.
    #[inline]
    pub fn holds<T: 'static>(&self) -> bool {
        self.target_type_id() == Some(TypeId::of::<T>())
    }

    /// Borrows the stored target, when it is of type `T`.
    pub fn target_ref<T: 'static>(&self) -> Option<&T> {
        if !self.holds::<T>() {
            return None;
        }
        // SAFETY: The cell's table always matches its payload (type
        // invariant).
        let ptr = unsafe { self.cell.vtable().target_ptr(&self.cell) }?;
        // SAFETY: The table's target type is `T` (checked above), so the
        // pointer refers to a live `T` owned by `self`; the returned borrow
        // is tied to `&self`.
        Some(unsafe { &*ptr.cast::<T>().as_ptr() })
    }

    /// Mutably borrows the stored target, when it is of type `T`.
    pub fn target_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if !self.holds::<T>() {
            return None;
        }
        // SAFETY: The cell's table always matches its payload (type
        // invariant).
        let ptr = unsafe { self.cell.vtable().target_ptr_mut(&mut self.cell) }?;
        // SAFETY: The table's target type is `T` (checked above), so the
        // pointer refers to a live `T` owned by `self`; the returned borrow
        // is tied to `&mut self`, so access is exclusive.
        Some(unsafe { &mut *ptr.cast::<T>().as_ptr() })
    }

    /// Invokes the target through a shared receiver.
    ///
    /// Fails with [`CallError::NoTarget`] when empty and with
    /// [`CallError::RequiresMut`] when the target needs exclusive access.
    #[inline]
    pub fn try_call(&self, args: S::Args) -> Result<S::Output, CallError> {
        // SAFETY: The cell's table always matches its payload (type
        // invariant).
        unsafe { self.cell.vtable().call(&self.cell, args) }
    }

    /// Invokes the target through a mutable receiver.
    ///
    /// Fails with [`CallError::NoTarget`] when empty.
    #[inline]
    pub fn try_call_mut(&mut self, args: S::Args) -> Result<S::Output, CallError> {
        let vtable = self.cell.vtable();
        // SAFETY: The cell's table always matches its payload (type
        // invariant).
        unsafe { vtable.call_mut(&mut self.cell, args) }
    }

    /// Moves the payload into a new wrapper, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        RawWrapper {
            cell: self.cell.take_bits(),
        }
    }

    /// Drops the current payload, leaving `self` empty.
    #[inline]
    pub fn clear(&mut self) {
        drop(self.take());
    }

    /// Exchanges the payloads of two wrappers.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.cell, &mut other.cell);
    }

    /// Clones the wrapper, payload included.
    ///
    /// Returns `None` when the target is move-only. An empty wrapper clones
    /// to an empty wrapper.
    pub fn try_clone(&self) -> Option<Self> {
        if self.is_empty() {
            return Some(Self::empty());
        }
        let vtable = self.cell.vtable();
        // SAFETY: The cell's table always matches its payload (type
        // invariant); no destination allocator is passed.
        let cell = unsafe { vtable.clone_cell(&self.cell, None) }?;
        Some(RawWrapper { cell })
    }

    /// Clones the wrapper, placing heap-backed clones in the pool of
    /// `alloc`.
    ///
    /// Inline payloads are pool-independent and clone as-is. Fails when the
    /// source payload is backed by a different allocator *type*; returns
    /// `Ok(None)` when the target is move-only.
    pub fn try_clone_in<A: StorageAllocator>(
        &self,
        alloc: &A,
    ) -> Result<Option<Self>, AllocatorMismatchError> {
        if self.is_empty() {
            return Ok(Some(Self::empty()));
        }
        self.check_allocator_family::<A>()?;
        let vtable = self.cell.vtable();
        let dest = NonNull::from(alloc).cast::<()>();
        // SAFETY: The cell's table always matches its payload (type
        // invariant), and the destination pointer refers to a live allocator
        // of the table's allocator type (checked above; allocator-free
        // tables ignore it).
        let cell = unsafe { vtable.clone_cell(&self.cell, Some(dest)) };
        Ok(cell.map(|cell| RawWrapper { cell }))
    }

    /// Replaces the payload of `self` with the payload of `source`, re-homing
    /// heap-backed payloads into the pool of `alloc` when they live
    /// elsewhere. `source` is left empty; the previous payload of `self` is
    /// dropped.
    ///
    /// Inline payloads move in as-is. Fails, leaving both wrappers
    /// untouched, when the source payload is backed by a different allocator
    /// *type*.
    pub fn adopt_in<A: StorageAllocator>(
        &mut self,
        source: &mut Self,
        alloc: &A,
    ) -> Result<(), AllocatorMismatchError> {
        source.check_allocator_family::<A>()?;
        let vtable = source.cell.vtable();
        let dest = NonNull::from(alloc).cast::<()>();
        // SAFETY: The cell's table always matches its payload (type
        // invariant), and the destination pointer refers to a live allocator
        // of the table's allocator type (checked above; allocator-free
        // tables ignore it).
        let cell = unsafe { vtable.relocate_cell(&mut source.cell, Some(dest)) };
        self.clear();
        self.cell = cell;
        Ok(())
    }

    /// Fails when the payload is heap-backed by an allocator type other
    /// than `A`.
    fn check_allocator_family<A: StorageAllocator>(&self) -> Result<(), AllocatorMismatchError> {
        match self.allocator_type_id() {
            Some(family) if family != TypeId::of::<A>() => Err(AllocatorMismatchError),
            _ => Ok(()),
        }
    }
}

impl<Recv: 'static, Out: 'static> RawWrapper<fn(Recv) -> Out> {
    /// Creates a wrapper holding a [`Member`] field accessor. Calls bind
    /// their single argument as the receiver of the projection.
    pub fn from_member(member: Member<Recv, Out>) -> Self {
        RawWrapper {
            cell: RawCell::with_payload(WrapperVtable::member(), member),
        }
    }
}

impl<S: Signature> Drop for RawWrapper<S> {
    #[inline]
    fn drop(&mut self) {
        let vtable = self.cell.vtable();
        // SAFETY:
        // 1. The cell's table always matches its payload (type invariant).
        // 2. The payload is live per the same invariant and is not used
        //    again, as we are in the drop function.
        unsafe {
            vtable.drop_in(&mut self.cell);
        }
    }
}

impl<S: Signature> Default for RawWrapper<S> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Signature> fmt::Debug for RawWrapper<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawWrapper")
            .field("kind", &self.storage_kind())
            .field("target", &self.target_type_name().unwrap_or("<empty>"))
            .finish()
    }
}
