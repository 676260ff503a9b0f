//! Dispatch tables for type-erased wrapper operations.
//!
//! This module contains the [`WrapperVtable`], which enables dropping,
//! cloning, relocating and invoking a wrapper payload after its concrete type
//! has been erased. The table stores function pointers that dispatch to the
//! correct typed thunks.
//!
//! This module encapsulates the fields of [`WrapperVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **a table's thunks are always instantiated with exactly the
//! payload type stored in the [`RawCell`] it is paired with**.
//!
//! # Nullable entries
//!
//! Most entries are `Option`s, and an absent entry is itself meaningful:
//!
//! - `drop: None` — the payload is trivially destructible.
//! - `relocate: None` — a bitwise move transfers the payload into any
//!   destination pool.
//! - `clone: None` — the target is move-only.
//! - `call: None` — the payload cannot be invoked through a shared receiver
//!   (either because the wrapper is empty or because the target needs
//!   exclusive access); the absent entry is what surfaces the corresponding
//!   [`CallError`].
//!
//! # Safety Invariant
//!
//! This invariant is maintained because tables are created as `&'static`
//! references via the `const fn` constructors below, each of which pairs the
//! thunks with a specific payload type at compile time, and because
//! [`RawCell`] construction always pairs a slot with the table built for its
//! payload type.

use core::{
    any::{self, TypeId},
    ptr::NonNull,
};

use crate::{
    allocator::StorageAllocator,
    errors::CallError,
    member::Member,
    signature::{Call, CallMut, Signature},
    wrapper::data::{HeapPayload, RawCell, payload_fits},
};

/// The storage strategy a [`WrapperVtable`] was built for.
///
/// Together with the target [`TypeId`], the kind is how wrapper state is
/// identified: tables are const-promoted statics, so their addresses are not
/// guaranteed unique across codegen units and are never compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// The wrapper holds no target.
    Empty,
    /// The target is stored inline in the wrapper's buffer.
    Local,
    /// The payload is a [`Member`] field accessor.
    Member,
    /// The target lives in a node obtained from an allocator.
    Heap,
}

/// Marker type whose [`TypeId`] stands in for "no target" in the empty
/// table. The type is private, so no caller-supplied `TypeId` can ever match
/// it.
struct NoTarget;

/// Dispatch table for type-erased wrapper operations.
///
/// Contains function pointers for performing operations on a wrapper payload
/// without knowing its concrete type at compile time. One static table exists
/// per (storage strategy, payload type, signature) combination.
///
/// # Safety Invariant
///
/// All thunk fields are guaranteed to point to the functions defined below,
/// instantiated with the payload type that was used to create this
/// [`WrapperVtable`].
pub(super) struct WrapperVtable<S: Signature> {
    /// The storage strategy this table was built for.
    kind: StorageKind,
    /// Gets the [`TypeId`] of the target type this table was built for.
    type_id: fn() -> TypeId,
    /// Gets the name of the target type this table was built for.
    type_name: fn() -> &'static str,
    /// Gets the [`TypeId`] of the allocator type, for heap-backed tables.
    allocator_type_id: Option<fn() -> TypeId>,
    /// Drops the payload in place. Absent when the payload is trivially
    /// destructible.
    drop: Option<unsafe fn(&mut RawCell<S>)>,
    /// Moves the payload into a destination pool, given a type-erased pointer
    /// to the destination allocator (`None` meaning "same pool"). Absent when
    /// a bitwise move suffices for every destination.
    relocate: Option<unsafe fn(&mut RawCell<S>, Option<NonNull<()>>) -> RawCell<S>>,
    /// Clones the payload, optionally into a destination pool. Absent for
    /// move-only targets.
    clone: Option<unsafe fn(&RawCell<S>, Option<NonNull<()>>) -> RawCell<S>>,
    /// Returns the address of the live stored target.
    target_access: Option<unsafe fn(&RawCell<S>) -> NonNull<()>>,
    /// Returns the address of the live stored target through exclusive
    /// access.
    target_access_mut: Option<unsafe fn(&mut RawCell<S>) -> NonNull<()>>,
    /// Invokes the target through a shared receiver.
    call: Option<unsafe fn(&RawCell<S>, S::Args) -> S::Output>,
    /// Invokes the target through a mutable receiver.
    call_mut: Option<unsafe fn(&mut RawCell<S>, S::Args) -> S::Output>,
}

impl<S: Signature> WrapperVtable<S> {
    /// The table of the empty wrapper. Every entry is absent.
    pub(super) const fn empty() -> &'static Self {
        const {
            &Self {
                kind: StorageKind::Empty,
                type_id: TypeId::of::<NoTarget>,
                type_name: any::type_name::<NoTarget>,
                allocator_type_id: None,
                drop: None,
                relocate: None,
                clone: None,
                target_access: None,
                target_access_mut: None,
                call: None,
                call_mut: None,
            }
        }
    }

    /// Creates the table for a copyable target stored inline.
    pub(super) const fn local<F: Call<S> + Clone>() -> &'static Self {
        const {
            &Self {
                kind: StorageKind::Local,
                type_id: TypeId::of::<F>,
                type_name: any::type_name::<F>,
                allocator_type_id: None,
                drop: if core::mem::needs_drop::<F>() {
                    Some(drop_local::<S, F>)
                } else {
                    None
                },
                relocate: None,
                clone: Some(clone_local::<S, F>),
                target_access: Some(access_local::<S, F>),
                target_access_mut: Some(access_local_mut::<S, F>),
                call: Some(call_local::<S, F>),
                call_mut: Some(call_mut_local::<S, F>),
            }
        }
    }

    /// Creates the table for a move-only, mutable-receiver target stored
    /// inline. The `clone` and shared `call` entries are absent.
    pub(super) const fn local_mut<F: CallMut<S>>() -> &'static Self {
        const {
            &Self {
                kind: StorageKind::Local,
                type_id: TypeId::of::<F>,
                type_name: any::type_name::<F>,
                allocator_type_id: None,
                drop: if core::mem::needs_drop::<F>() {
                    Some(drop_local::<S, F>)
                } else {
                    None
                },
                relocate: None,
                clone: None,
                target_access: Some(access_local::<S, F>),
                target_access_mut: Some(access_local_mut::<S, F>),
                call: None,
                call_mut: Some(call_mut_local::<S, F>),
            }
        }
    }

    /// Creates the table for a copyable target stored in a node obtained
    /// from the allocator `A`.
    ///
    /// Fails to compile when the allocator state does not fit next to the
    /// node pointer in the wrapper's inline buffer.
    pub(super) const fn heap<A: StorageAllocator, F: Call<S> + Clone>() -> &'static Self {
        const {
            assert!(
                payload_fits::<HeapPayload<A, F>>(),
                "allocator state too large for the wrapper's inline buffer"
            );
            &Self {
                kind: StorageKind::Heap,
                type_id: TypeId::of::<F>,
                type_name: any::type_name::<F>,
                allocator_type_id: Some(TypeId::of::<A>),
                drop: Some(drop_heap::<S, A, F>),
                relocate: if A::ALWAYS_EQUAL {
                    None
                } else {
                    Some(relocate_heap::<S, A, F>)
                },
                clone: Some(clone_heap::<S, A, F>),
                target_access: Some(access_heap::<S, A, F>),
                target_access_mut: Some(access_heap_mut::<S, A, F>),
                call: Some(call_heap::<S, A, F>),
                call_mut: Some(call_mut_heap::<S, A, F>),
            }
        }
    }

    /// Creates the table for a move-only, mutable-receiver target stored in
    /// a node obtained from the allocator `A`. The `clone` and shared `call`
    /// entries are absent.
    ///
    /// Fails to compile when the allocator state does not fit next to the
    /// node pointer in the wrapper's inline buffer.
    pub(super) const fn heap_mut<A: StorageAllocator, F: CallMut<S>>() -> &'static Self {
        const {
            assert!(
                payload_fits::<HeapPayload<A, F>>(),
                "allocator state too large for the wrapper's inline buffer"
            );
            &Self {
                kind: StorageKind::Heap,
                type_id: TypeId::of::<F>,
                type_name: any::type_name::<F>,
                allocator_type_id: Some(TypeId::of::<A>),
                drop: Some(drop_heap::<S, A, F>),
                relocate: if A::ALWAYS_EQUAL {
                    None
                } else {
                    Some(relocate_heap::<S, A, F>)
                },
                clone: None,
                target_access: Some(access_heap::<S, A, F>),
                target_access_mut: Some(access_heap_mut::<S, A, F>),
                call: None,
                call_mut: Some(call_mut_heap::<S, A, F>),
            }
        }
    }

    /// The storage strategy this table was built for.
    #[inline]
    pub(super) fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Gets the [`TypeId`] of the target type this table was built for, or
    /// `None` for the empty table.
    #[inline]
    pub(super) fn type_id(&self) -> Option<TypeId> {
        match self.kind {
            StorageKind::Empty => None,
            _ => Some((self.type_id)()),
        }
    }

    /// Gets the name of the target type this table was built for, or `None`
    /// for the empty table.
    #[inline]
    pub(super) fn type_name(&self) -> Option<&'static str> {
        match self.kind {
            StorageKind::Empty => None,
            _ => Some((self.type_name)()),
        }
    }

    /// Gets the [`TypeId`] of the allocator type, for heap-backed tables.
    #[inline]
    pub(super) fn allocator_type_id(&self) -> Option<TypeId> {
        self.allocator_type_id.map(|f| f())
    }

    /// Whether this table carries a `clone` entry.
    #[inline]
    pub(super) fn is_cloneable(&self) -> bool {
        self.clone.is_some()
    }

    /// Drops the payload in the cell, if it needs dropping.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`WrapperVtable`] is the table paired with `cell`.
    /// 2. The payload is live and is not used again afterwards.
    #[inline]
    pub(super) unsafe fn drop_in(&self, cell: &mut RawCell<S>) {
        if let Some(drop) = self.drop {
            // SAFETY: `drop` points to a drop thunk instantiated with the
            // payload type stored in `cell` (1), the payload is live and
            // ownership transfers to the thunk (2).
            unsafe {
                drop(cell);
            }
        }
    }

    /// Moves the payload out of `cell` into a new cell, re-homing it in the
    /// destination pool when one is given. On return, `cell` is empty and
    /// its payload has not been dropped.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`WrapperVtable`] is the table paired with `cell`.
    /// 2. If `dest_alloc` is `Some`, it points to a live allocator of the
    ///    exact allocator type this table was built with.
    #[inline]
    pub(super) unsafe fn relocate_cell(
        &self,
        cell: &mut RawCell<S>,
        dest_alloc: Option<NonNull<()>>,
    ) -> RawCell<S> {
        match self.relocate {
            Some(relocate) => {
                // SAFETY: `relocate` points to a relocation thunk
                // instantiated with the payload and allocator types paired
                // with `cell` (1); the destination pointer type matches (2).
                let moved = unsafe { relocate(cell, dest_alloc) };
                cell.reset_empty();
                moved
            }
            // An absent entry means the payload is trivially relocatable
            // into any pool.
            None => cell.take_bits(),
        }
    }

    /// Clones the payload into a new cell, re-homing the clone in the
    /// destination pool when one is given. Returns `None` for move-only
    /// targets.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`WrapperVtable`] is the table paired with `cell`.
    /// 2. If `dest_alloc` is `Some`, it points to a live allocator of the
    ///    exact allocator type this table was built with.
    #[inline]
    pub(super) unsafe fn clone_cell(
        &self,
        cell: &RawCell<S>,
        dest_alloc: Option<NonNull<()>>,
    ) -> Option<RawCell<S>> {
        let clone = self.clone?;
        // SAFETY: `clone` points to a clone thunk instantiated with the
        // payload and allocator types paired with `cell` (1); the
        // destination pointer type matches (2).
        Some(unsafe { clone(cell, dest_alloc) })
    }

    /// Returns the address of the live stored target, or `None` for the
    /// empty table.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`WrapperVtable`] is the table paired with `cell`.
    #[inline]
    pub(super) unsafe fn target_ptr(&self, cell: &RawCell<S>) -> Option<NonNull<()>> {
        let access = self.target_access?;
        // SAFETY: `access` points to an access thunk instantiated with the
        // payload type stored in `cell`, as guaranteed by the caller.
        Some(unsafe { access(cell) })
    }

    /// Returns the address of the live stored target through exclusive
    /// access, or `None` for the empty table.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`WrapperVtable`] is the table paired with `cell`.
    #[inline]
    pub(super) unsafe fn target_ptr_mut(&self, cell: &mut RawCell<S>) -> Option<NonNull<()>> {
        let access = self.target_access_mut?;
        // SAFETY: `access` points to an access thunk instantiated with the
        // payload type stored in `cell`, as guaranteed by the caller.
        Some(unsafe { access(cell) })
    }

    /// Invokes the target through a shared receiver.
    ///
    /// An absent entry surfaces as the matching [`CallError`]:
    /// [`CallError::NoTarget`] on the empty table, [`CallError::RequiresMut`]
    /// on a table whose target needs exclusive access.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`WrapperVtable`] is the table paired with `cell`.
    #[inline]
    pub(super) unsafe fn call(
        &self,
        cell: &RawCell<S>,
        args: S::Args,
    ) -> Result<S::Output, CallError> {
        match self.call {
            // SAFETY: `call` points to a call thunk instantiated with the
            // payload type stored in `cell`, as guaranteed by the caller.
            Some(call) => Ok(unsafe { call(cell, args) }),
            None if matches!(self.kind, StorageKind::Empty) => Err(CallError::NoTarget),
            None => Err(CallError::RequiresMut),
        }
    }

    /// Invokes the target through a mutable receiver.
    ///
    /// The entry is absent only on the empty table, which surfaces as
    /// [`CallError::NoTarget`].
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`WrapperVtable`] is the table paired with `cell`.
    #[inline]
    pub(super) unsafe fn call_mut(
        &self,
        cell: &mut RawCell<S>,
        args: S::Args,
    ) -> Result<S::Output, CallError> {
        match self.call_mut {
            // SAFETY: `call_mut` points to a call thunk instantiated with
            // the payload type stored in `cell`, as guaranteed by the
            // caller.
            Some(call_mut) => Ok(unsafe { call_mut(cell, args) }),
            None => Err(CallError::NoTarget),
        }
    }
}

impl<Recv: 'static, Out: 'static> WrapperVtable<fn(Recv) -> Out> {
    /// Creates the table for a [`Member`] field accessor. The single call
    /// argument is bound as the receiver of the projection.
    pub(super) const fn member() -> &'static Self {
        const {
            &Self {
                kind: StorageKind::Member,
                type_id: TypeId::of::<Member<Recv, Out>>,
                type_name: any::type_name::<Member<Recv, Out>>,
                allocator_type_id: None,
                drop: None,
                relocate: None,
                clone: Some(clone_local::<fn(Recv) -> Out, Member<Recv, Out>>),
                target_access: Some(access_local::<fn(Recv) -> Out, Member<Recv, Out>>),
                target_access_mut: Some(access_local_mut::<fn(Recv) -> Out, Member<Recv, Out>>),
                call: Some(call_member::<Recv, Out>),
                call_mut: Some(call_mut_member::<Recv, Out>),
            }
        }
    }
}

/// Drops an inline payload in place.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `F`.
/// 2. Ownership transfers to this call: the slot bytes must not be used as a
///    live `F` afterwards.
unsafe fn drop_local<S: Signature, F>(cell: &mut RawCell<S>) {
    // SAFETY: The slot holds a live `F` (1) and ownership transfers here,
    // so the value is dropped exactly once (2).
    let target = unsafe { cell.payload_mut::<F>() };
    // SAFETY: `target` came from the slot and is not used again (2).
    unsafe {
        core::ptr::drop_in_place(target);
    }
}

/// Clones an inline payload into a new cell headed by the same table. The
/// destination allocator is ignored: inline payloads are pool-independent.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `F`.
unsafe fn clone_local<S: Signature, F: Clone + 'static>(
    cell: &RawCell<S>,
    _dest_alloc: Option<NonNull<()>>,
) -> RawCell<S> {
    // SAFETY: The slot holds a live `F`, as guaranteed by the caller.
    let target = unsafe { cell.payload_ref::<F>() };
    RawCell::with_payload(cell.vtable(), target.clone())
}

/// Returns the address of an inline payload.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `F`.
unsafe fn access_local<S: Signature, F>(cell: &RawCell<S>) -> NonNull<()> {
    // SAFETY: The slot holds a live `F`, as guaranteed by the caller.
    let target = unsafe { cell.payload_ref::<F>() };
    NonNull::from(target).cast()
}

/// Returns the address of an inline payload through exclusive access.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `F`.
unsafe fn access_local_mut<S: Signature, F>(cell: &mut RawCell<S>) -> NonNull<()> {
    // SAFETY: The slot holds a live `F`, as guaranteed by the caller.
    let target = unsafe { cell.payload_mut::<F>() };
    NonNull::from(target).cast()
}

/// Invokes an inline target through a shared receiver.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `F`.
unsafe fn call_local<S: Signature, F: Call<S>>(cell: &RawCell<S>, args: S::Args) -> S::Output {
    // SAFETY: The slot holds a live `F`, as guaranteed by the caller.
    let target = unsafe { cell.payload_ref::<F>() };
    target.call(args)
}

/// Invokes an inline target through a mutable receiver.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `F`.
unsafe fn call_mut_local<S: Signature, F: CallMut<S>>(
    cell: &mut RawCell<S>,
    args: S::Args,
) -> S::Output {
    // SAFETY: The slot holds a live `F`, as guaranteed by the caller.
    let target = unsafe { cell.payload_mut::<F>() };
    target.call_mut(args)
}

/// Invokes a [`Member`] accessor, binding the call argument as the receiver.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `Member<Recv, Out>`.
unsafe fn call_member<Recv: 'static, Out: 'static>(
    cell: &RawCell<fn(Recv) -> Out>,
    (recv,): (Recv,),
) -> Out {
    // SAFETY: The slot holds a live `Member<Recv, Out>`, as guaranteed by
    // the caller.
    let member = unsafe { cell.payload_ref::<Member<Recv, Out>>() };
    member.get(&recv)
}

/// Invokes a [`Member`] accessor through a mutable receiver.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `Member<Recv, Out>`.
unsafe fn call_mut_member<Recv: 'static, Out: 'static>(
    cell: &mut RawCell<fn(Recv) -> Out>,
    (recv,): (Recv,),
) -> Out {
    // SAFETY: The slot holds a live `Member<Recv, Out>`, as guaranteed by
    // the caller.
    let member = unsafe { cell.payload_ref::<Member<Recv, Out>>() };
    member.get(&recv)
}

/// Drops a heap-backed payload: the target and its allocator node.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `HeapPayload<A, F>`.
/// 2. Ownership transfers to this call: the slot bytes must not be used as a
///    live payload afterwards.
unsafe fn drop_heap<S: Signature, A: StorageAllocator, F>(cell: &mut RawCell<S>) {
    // SAFETY: The slot holds a live `HeapPayload<A, F>` (1) and ownership
    // transfers here (2).
    let payload = unsafe { cell.payload_read::<HeapPayload<A, F>>() };
    payload.dispose();
}

/// Moves a heap-backed payload into a destination pool.
///
/// When no destination allocator is given, or the destination draws from the
/// same pool as the source, the node pointer moves as-is. Otherwise a new
/// node is allocated from the destination pool, the target moves into it,
/// and the source node is released.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `HeapPayload<A, F>`.
/// 2. Ownership transfers to this call: the slot bytes must not be used as a
///    live payload afterwards.
/// 3. If `dest_alloc` is `Some`, it points to a live `A`.
unsafe fn relocate_heap<S: Signature, A: StorageAllocator, F>(
    cell: &mut RawCell<S>,
    dest_alloc: Option<NonNull<()>>,
) -> RawCell<S> {
    let vtable = cell.vtable();
    // SAFETY: The slot holds a live `HeapPayload<A, F>` (1) and ownership
    // transfers here (2).
    let payload = unsafe { cell.payload_read::<HeapPayload<A, F>>() };
    let dest = match dest_alloc {
        // SAFETY: The pointer refers to a live `A` (3), borrowed for the
        // duration of this call.
        Some(dest) => unsafe { dest.cast::<A>().as_ref() },
        None => return RawCell::with_payload(vtable, payload),
    };
    if payload.allocator().same_pool(dest) {
        RawCell::with_payload(vtable, payload)
    } else {
        let dest = dest.clone();
        let value = payload.into_value();
        RawCell::with_payload(vtable, HeapPayload::new_in(value, dest))
    }
}

/// Clones a heap-backed payload. The target value is cloned first, then a
/// node is allocated, so a panicking `Clone` propagates before any
/// destination state exists.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `HeapPayload<A, F>`.
/// 2. If `dest_alloc` is `Some`, it points to a live `A`.
unsafe fn clone_heap<S: Signature, A: StorageAllocator, F: Clone>(
    cell: &RawCell<S>,
    dest_alloc: Option<NonNull<()>>,
) -> RawCell<S> {
    // SAFETY: The slot holds a live `HeapPayload<A, F>`, as guaranteed by
    // the caller.
    let payload = unsafe { cell.payload_ref::<HeapPayload<A, F>>() };
    let alloc = match dest_alloc {
        // SAFETY: The pointer refers to a live `A` (2), borrowed for the
        // duration of this call.
        Some(dest) => unsafe { dest.cast::<A>().as_ref() }.clone(),
        None => payload.allocator().clone(),
    };
    let value = payload.target().clone();
    RawCell::with_payload(cell.vtable(), HeapPayload::new_in(value, alloc))
}

/// Returns the address of a heap-backed target.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `HeapPayload<A, F>`.
unsafe fn access_heap<S: Signature, A: StorageAllocator, F>(cell: &RawCell<S>) -> NonNull<()> {
    // SAFETY: The slot holds a live `HeapPayload<A, F>`, as guaranteed by
    // the caller.
    let payload = unsafe { cell.payload_ref::<HeapPayload<A, F>>() };
    NonNull::from(payload.target()).cast()
}

/// Returns the address of a heap-backed target through exclusive access.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `HeapPayload<A, F>`.
unsafe fn access_heap_mut<S: Signature, A: StorageAllocator, F>(
    cell: &mut RawCell<S>,
) -> NonNull<()> {
    // SAFETY: The slot holds a live `HeapPayload<A, F>`, as guaranteed by
    // the caller.
    let payload = unsafe { cell.payload_mut::<HeapPayload<A, F>>() };
    NonNull::from(payload.target_mut()).cast()
}

/// Invokes a heap-backed target through a shared receiver.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `HeapPayload<A, F>`.
unsafe fn call_heap<S: Signature, A: StorageAllocator, F: Call<S>>(
    cell: &RawCell<S>,
    args: S::Args,
) -> S::Output {
    // SAFETY: The slot holds a live `HeapPayload<A, F>`, as guaranteed by
    // the caller.
    let payload = unsafe { cell.payload_ref::<HeapPayload<A, F>>() };
    payload.target().call(args)
}

/// Invokes a heap-backed target through a mutable receiver.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The cell's slot holds a live `HeapPayload<A, F>`.
unsafe fn call_mut_heap<S: Signature, A: StorageAllocator, F: CallMut<S>>(
    cell: &mut RawCell<S>,
    args: S::Args,
) -> S::Output {
    // SAFETY: The slot holds a live `HeapPayload<A, F>`, as guaranteed by
    // the caller.
    let payload = unsafe { cell.payload_mut::<HeapPayload<A, F>>() };
    payload.target_mut().call_mut(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_entries() {
        let table = WrapperVtable::<fn(i32) -> i32>::empty();
        assert_eq!(table.kind(), StorageKind::Empty);
        assert_eq!(table.type_id(), None);
        assert_eq!(table.type_name(), None);
        assert_eq!(table.allocator_type_id(), None);
        assert!(!table.is_cloneable());
        assert!(table.call.is_none());
        assert!(table.call_mut.is_none());
        assert!(table.drop.is_none());
    }

    #[test]
    fn test_local_table_entries() {
        let table = WrapperVtable::<fn(i32) -> i32>::local::<fn(i32) -> i32>();
        assert_eq!(table.kind(), StorageKind::Local);
        assert_eq!(table.type_id(), Some(TypeId::of::<fn(i32) -> i32>()));
        assert_eq!(table.allocator_type_id(), None);
        assert!(table.is_cloneable());
        // Function pointers are trivially destructible.
        assert!(table.drop.is_none());
        assert!(table.call.is_some());
        assert!(table.call_mut.is_some());
    }

    #[test]
    fn test_always_equal_allocator_omits_relocation() {
        use allocator_api2::alloc::Global;

        let table = WrapperVtable::<fn() -> i32>::heap::<Global, fn() -> i32>();
        assert_eq!(table.kind(), StorageKind::Heap);
        assert_eq!(table.allocator_type_id(), Some(TypeId::of::<Global>()));
        assert!(table.relocate.is_none());
        assert!(table.drop.is_some());
    }

    #[test]
    fn test_member_table_entries() {
        let table = WrapperVtable::<fn(u32) -> u32>::member();
        assert_eq!(table.kind(), StorageKind::Member);
        assert_eq!(table.type_id(), Some(TypeId::of::<Member<u32, u32>>()));
        assert!(table.is_cloneable());
        assert!(table.drop.is_none());
        assert!(table.call.is_some());
    }
}
