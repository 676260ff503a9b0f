//! Allocator-retaining callable containers.
//!
//! The container types pair a wrapper with an allocator instance. Targets
//! assigned to a container are materialized in the container's own pool, and
//! payloads arriving from other wrappers are moved, re-homed or rejected
//! according to where they live:
//!
//! - same pool: the node pointer moves as-is,
//! - same allocator type, different pool: the value is reallocated in the
//!   container's pool,
//! - different allocator type: the operation fails with
//!   [`AllocatorMismatchError`],
//! - inline payloads are pool-independent and always move in as-is.

use core::{any::TypeId, fmt};

use allocator_api2::alloc::Global;
use dynfn_internals::{
    RawWrapper, StorageKind,
    allocator::StorageAllocator,
    errors::{AllocatorMismatchError, CallError, TypeRecoveryError},
    signature::{Call, CallMut, Signature},
};

use crate::{function::Function, unique::UniqueFunction};

/// A copyable, type-erased callable that retains its allocator.
///
/// Unlike [`Function`], which only reaches for an allocator when a target is
/// too large for the inline buffer, a `FunctionContainer` keeps an allocator
/// instance for the whole of its lifetime and stores every assigned target
/// in that pool. Cloning the container clones the target into the same pool.
///
/// # Examples
///
/// ```
/// use dynfn::FunctionContainer;
/// use allocator_api2::alloc::Global;
///
/// let mut c: FunctionContainer<fn(i32) -> i32> = FunctionContainer::new_in(Global);
/// assert!(!c.has_target());
///
/// c.assign(|x: i32| x * 2);
/// assert_eq!(c.call((21,)), 42);
/// ```
pub struct FunctionContainer<S: Signature, A: StorageAllocator = Global> {
    /// The type-erased storage and dispatch engine.
    raw: RawWrapper<S>,
    /// The pool every assigned target is materialized in.
    alloc: A,
}

impl<S: Signature, A: StorageAllocator> FunctionContainer<S, A> {
    /// Creates an empty container that will allocate from `alloc`.
    #[inline]
    pub fn new_in(alloc: A) -> Self {
        FunctionContainer {
            raw: RawWrapper::empty(),
            alloc,
        }
    }

    /// Creates a container holding `target` in a node allocated from
    /// `alloc`.
    #[inline]
    pub fn with_target_in<F>(target: F, alloc: A) -> Self
    where
        F: Call<S> + Clone,
    {
        FunctionContainer {
            raw: RawWrapper::from_target_in(target, alloc.clone()),
            alloc,
        }
    }

    /// Returns a reference to the container's allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Replaces the stored target, materializing the new one in the
    /// container's pool. The previous target is dropped.
    #[inline]
    pub fn assign<F>(&mut self, target: F)
    where
        F: Call<S> + Clone,
    {
        self.raw.clear();
        self.raw = RawWrapper::from_target_in(target, self.alloc.clone());
    }

    /// Moves the payload of another container into this one, re-homing it
    /// in this container's pool when necessary. The source is left empty;
    /// the previous target of `self` is dropped.
    ///
    /// Fails, leaving both containers untouched, when the source payload is
    /// backed by a different allocator type.
    pub fn adopt<B: StorageAllocator>(
        &mut self,
        source: &mut FunctionContainer<S, B>,
    ) -> Result<(), AllocatorMismatchError> {
        self.raw.adopt_in(&mut source.raw, &self.alloc)
    }

    /// Moves the payload of a plain [`Function`] into this container,
    /// re-homing it in this container's pool when necessary. The source is
    /// left empty; the previous target of `self` is dropped.
    ///
    /// Fails, leaving both wrappers untouched, when the source payload is
    /// backed by a different allocator type.
    pub fn adopt_function(
        &mut self,
        source: &mut Function<S>,
    ) -> Result<(), AllocatorMismatchError> {
        self.raw.adopt_in(source.raw_mut(), &self.alloc)
    }

    /// Invokes the target.
    ///
    /// # Panics
    ///
    /// Panics when the container holds no target. Use
    /// [`FunctionContainer::try_call`] for a non-panicking variant.
    #[inline]
    pub fn call(&self, args: S::Args) -> S::Output {
        match self.raw.try_call(args) {
            Ok(output) => output,
            Err(error) => panic!("{error}"),
        }
    }

    /// Invokes the target, failing with [`CallError::NoTarget`] when the
    /// container is empty.
    #[inline]
    pub fn try_call(&self, args: S::Args) -> Result<S::Output, CallError> {
        self.raw.try_call(args)
    }

    /// Drops the stored target, leaving the container empty. The allocator
    /// is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Moves the stored target into a new container sharing the same
    /// allocator, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        FunctionContainer {
            raw: self.raw.take(),
            alloc: self.alloc.clone(),
        }
    }

    /// Exchanges the stored targets of two containers. Each payload keeps
    /// the pool it was allocated in; the containers' own allocators stay
    /// put.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
    }

    /// Whether the container holds a target.
    #[inline]
    pub fn has_target(&self) -> bool {
        !self.raw.is_empty()
    }

    /// Whether the stored target is of type `T`.
    #[inline]
    pub fn holds<T: 'static>(&self) -> bool {
        self.raw.holds::<T>()
    }

    /// Borrows the stored target, when it is of type `T`.
    #[inline]
    pub fn target_ref<T: 'static>(&self) -> Option<&T> {
        self.raw.target_ref::<T>()
    }

    /// Mutably borrows the stored target, when it is of type `T`.
    #[inline]
    pub fn target_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.raw.target_mut::<T>()
    }

    /// Borrows the stored target as a `T`, reporting the stored type on
    /// mismatch.
    pub fn recover_ref<T: 'static>(&self) -> Result<&T, TypeRecoveryError> {
        self.raw.target_ref::<T>().ok_or(TypeRecoveryError {
            expected: core::any::type_name::<T>(),
            found: self.raw.target_type_name(),
        })
    }

    /// The [`TypeId`] of the stored target, or `None` when empty.
    #[inline]
    pub fn target_type_id(&self) -> Option<TypeId> {
        self.raw.target_type_id()
    }

    /// The name of the stored target's type, or `None` when empty.
    #[inline]
    pub fn target_type_name(&self) -> Option<&'static str> {
        self.raw.target_type_name()
    }

    /// The storage strategy of the stored target.
    #[inline]
    pub fn storage_kind(&self) -> StorageKind {
        self.raw.storage_kind()
    }
}

impl<S: Signature, A: StorageAllocator> Clone for FunctionContainer<S, A> {
    /// Clones the container, materializing the cloned target in the same
    /// pool as the original.
    fn clone(&self) -> Self {
        let raw = match self.raw.try_clone_in(&self.alloc) {
            Ok(Some(raw)) => raw,
            // The container only ever stores cloneable targets whose pool
            // belongs to its own allocator family.
            _ => unreachable!("every stored target is cloneable in the container's own pool"),
        };
        FunctionContainer {
            raw,
            alloc: self.alloc.clone(),
        }
    }
}

impl<S: Signature, A: StorageAllocator + Default> Default for FunctionContainer<S, A> {
    #[inline]
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<S: Signature, A: StorageAllocator> fmt::Debug for FunctionContainer<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionContainer")
            .field("target", &self.target_type_name().unwrap_or("<empty>"))
            .finish()
    }
}

/// A move-only, type-erased callable that retains its allocator.
///
/// The pairing of [`UniqueFunction`] and [`FunctionContainer`]: accepts any
/// [`CallMut<S>`] target, materializes it in the container's pool, and
/// cannot be cloned.
pub struct UniqueFunctionContainer<S: Signature, A: StorageAllocator = Global> {
    /// The type-erased storage and dispatch engine.
    raw: RawWrapper<S>,
    /// The pool every assigned target is materialized in.
    alloc: A,
}

impl<S: Signature, A: StorageAllocator> UniqueFunctionContainer<S, A> {
    /// Creates an empty container that will allocate from `alloc`.
    #[inline]
    pub fn new_in(alloc: A) -> Self {
        UniqueFunctionContainer {
            raw: RawWrapper::empty(),
            alloc,
        }
    }

    /// Creates a container holding `target` in a node allocated from
    /// `alloc`.
    #[inline]
    pub fn with_target_in<F>(target: F, alloc: A) -> Self
    where
        F: CallMut<S>,
    {
        UniqueFunctionContainer {
            raw: RawWrapper::from_target_mut_in(target, alloc.clone()),
            alloc,
        }
    }

    /// Returns a reference to the container's allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Replaces the stored target, materializing the new one in the
    /// container's pool. The previous target is dropped.
    #[inline]
    pub fn assign<F>(&mut self, target: F)
    where
        F: CallMut<S>,
    {
        self.raw.clear();
        self.raw = RawWrapper::from_target_mut_in(target, self.alloc.clone());
    }

    /// Moves the payload of another unique container into this one,
    /// re-homing it in this container's pool when necessary. The source is
    /// left empty; the previous target of `self` is dropped.
    ///
    /// Fails, leaving both containers untouched, when the source payload is
    /// backed by a different allocator type.
    pub fn adopt<B: StorageAllocator>(
        &mut self,
        source: &mut UniqueFunctionContainer<S, B>,
    ) -> Result<(), AllocatorMismatchError> {
        self.raw.adopt_in(&mut source.raw, &self.alloc)
    }

    /// Moves the payload of a plain [`UniqueFunction`] into this container,
    /// re-homing it in this container's pool when necessary. The source is
    /// left empty; the previous target of `self` is dropped.
    ///
    /// Fails, leaving both wrappers untouched, when the source payload is
    /// backed by a different allocator type.
    pub fn adopt_function(
        &mut self,
        source: &mut UniqueFunction<S>,
    ) -> Result<(), AllocatorMismatchError> {
        self.raw.adopt_in(source.raw_mut(), &self.alloc)
    }

    /// Invokes the target through a mutable receiver.
    ///
    /// # Panics
    ///
    /// Panics when the container holds no target. Use
    /// [`UniqueFunctionContainer::try_call_mut`] for a non-panicking
    /// variant.
    #[inline]
    pub fn call_mut(&mut self, args: S::Args) -> S::Output {
        match self.raw.try_call_mut(args) {
            Ok(output) => output,
            Err(error) => panic!("{error}"),
        }
    }

    /// Invokes the target through a mutable receiver, failing with
    /// [`CallError::NoTarget`] when the container is empty.
    #[inline]
    pub fn try_call_mut(&mut self, args: S::Args) -> Result<S::Output, CallError> {
        self.raw.try_call_mut(args)
    }

    /// Invokes the target through a shared receiver, when it supports one.
    #[inline]
    pub fn try_call(&self, args: S::Args) -> Result<S::Output, CallError> {
        self.raw.try_call(args)
    }

    /// Drops the stored target, leaving the container empty. The allocator
    /// is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Moves the stored target into a new container sharing the same
    /// allocator, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        UniqueFunctionContainer {
            raw: self.raw.take(),
            alloc: self.alloc.clone(),
        }
    }

    /// Exchanges the stored targets of two containers. Each payload keeps
    /// the pool it was allocated in; the containers' own allocators stay
    /// put.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
    }

    /// Whether the container holds a target.
    #[inline]
    pub fn has_target(&self) -> bool {
        !self.raw.is_empty()
    }

    /// Whether the stored target is of type `T`.
    #[inline]
    pub fn holds<T: 'static>(&self) -> bool {
        self.raw.holds::<T>()
    }

    /// Borrows the stored target, when it is of type `T`.
    #[inline]
    pub fn target_ref<T: 'static>(&self) -> Option<&T> {
        self.raw.target_ref::<T>()
    }

    /// Mutably borrows the stored target, when it is of type `T`.
    #[inline]
    pub fn target_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.raw.target_mut::<T>()
    }

    /// Borrows the stored target as a `T`, reporting the stored type on
    /// mismatch.
    pub fn recover_ref<T: 'static>(&self) -> Result<&T, TypeRecoveryError> {
        self.raw.target_ref::<T>().ok_or(TypeRecoveryError {
            expected: core::any::type_name::<T>(),
            found: self.raw.target_type_name(),
        })
    }

    /// The [`TypeId`] of the stored target, or `None` when empty.
    #[inline]
    pub fn target_type_id(&self) -> Option<TypeId> {
        self.raw.target_type_id()
    }

    /// The name of the stored target's type, or `None` when empty.
    #[inline]
    pub fn target_type_name(&self) -> Option<&'static str> {
        self.raw.target_type_name()
    }

    /// The storage strategy of the stored target.
    #[inline]
    pub fn storage_kind(&self) -> StorageKind {
        self.raw.storage_kind()
    }
}

impl<S: Signature, A: StorageAllocator> From<FunctionContainer<S, A>>
    for UniqueFunctionContainer<S, A>
{
    /// Widens a copyable container into a move-only one. The stored target,
    /// its pool and the retained allocator are reused as-is.
    fn from(container: FunctionContainer<S, A>) -> Self {
        UniqueFunctionContainer {
            raw: container.raw,
            alloc: container.alloc,
        }
    }
}

impl<S: Signature, A: StorageAllocator + Default> Default for UniqueFunctionContainer<S, A> {
    #[inline]
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<S: Signature, A: StorageAllocator> fmt::Debug for UniqueFunctionContainer<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueFunctionContainer")
            .field("target", &self.target_type_name().unwrap_or("<empty>"))
            .finish()
    }
}
