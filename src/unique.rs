//! The move-only callable container.

use core::{any::TypeId, fmt};

use dynfn_internals::{
    RawWrapper, StorageKind,
    allocator::StorageAllocator,
    errors::{CallError, TypeRecoveryError},
    signature::{CallMut, Signature},
};

use crate::function::Function;

/// A move-only, type-erased callable with the call signature `S`.
///
/// `UniqueFunction` accepts any target implementing [`CallMut<S>`]: every
/// `FnMut` closure qualifies, including mutating and move-only ones. In
/// exchange, the container itself cannot be cloned — copying one is a
/// compile error rather than a runtime failure.
///
/// A [`Function`] converts into a `UniqueFunction` losslessly via [`From`]:
/// shared-callable targets remain invocable through the shared path after
/// the conversion.
///
/// # Examples
///
/// ```
/// use dynfn::UniqueFunction;
///
/// let mut total = 0;
/// let mut f: UniqueFunction<fn(i32) -> i32> = UniqueFunction::new(move |x: i32| {
///     total += x;
///     total
/// });
/// assert_eq!(f.call_mut((2,)), 2);
/// assert_eq!(f.call_mut((3,)), 5);
/// ```
pub struct UniqueFunction<S: Signature> {
    /// The type-erased storage and dispatch engine.
    raw: RawWrapper<S>,
}

impl<S: Signature> UniqueFunction<S> {
    /// Creates a function holding no target.
    #[inline]
    pub fn empty() -> Self {
        UniqueFunction {
            raw: RawWrapper::empty(),
        }
    }

    /// Creates a function holding `target`.
    ///
    /// Targets that fit the inline buffer are stored locally; larger targets
    /// are stored in a node allocated from the global allocator.
    #[inline]
    pub fn new<F>(target: F) -> Self
    where
        F: CallMut<S>,
    {
        UniqueFunction {
            raw: RawWrapper::from_target_mut(target),
        }
    }

    /// Creates a function holding `target` in a node allocated from `alloc`.
    ///
    /// The target is always heap-backed, regardless of its size.
    #[inline]
    pub fn new_in<F, A>(target: F, alloc: A) -> Self
    where
        F: CallMut<S>,
        A: StorageAllocator,
    {
        UniqueFunction {
            raw: RawWrapper::from_target_mut_in(target, alloc),
        }
    }

    /// Invokes the target through a mutable receiver.
    ///
    /// # Panics
    ///
    /// Panics when the function holds no target. Use
    /// [`UniqueFunction::try_call_mut`] for a non-panicking variant.
    #[inline]
    pub fn call_mut(&mut self, args: S::Args) -> S::Output {
        match self.raw.try_call_mut(args) {
            Ok(output) => output,
            Err(error) => panic!("{error}"),
        }
    }

    /// Invokes the target through a mutable receiver, failing with
    /// [`CallError::NoTarget`] when the function is empty.
    #[inline]
    pub fn try_call_mut(&mut self, args: S::Args) -> Result<S::Output, CallError> {
        self.raw.try_call_mut(args)
    }

    /// Invokes the target through a shared receiver, when it supports one.
    ///
    /// Targets adopted from a [`Function`] keep their shared path; targets
    /// built through [`UniqueFunction::new`] fail with
    /// [`CallError::RequiresMut`].
    #[inline]
    pub fn try_call(&self, args: S::Args) -> Result<S::Output, CallError> {
        self.raw.try_call(args)
    }

    /// Replaces the stored target, dropping the previous one.
    #[inline]
    pub fn assign<F>(&mut self, target: F)
    where
        F: CallMut<S>,
    {
        *self = Self::new(target);
    }

    /// Drops the stored target, leaving the function empty.
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Moves the stored target into a new function, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        UniqueFunction {
            raw: self.raw.take(),
        }
    }

    /// Exchanges the stored targets of two functions.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
    }

    /// Whether the function holds a target.
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

    /// Mutably borrows the underlying engine.
    #[inline]
    pub(crate) fn raw_mut(&mut self) -> &mut RawWrapper<S> {
        &mut self.raw
    }
}

impl<S: Signature> From<Function<S>> for UniqueFunction<S> {
    /// Widens a copyable function into a move-only one. The stored target
    /// and its storage are reused as-is.
    #[inline]
    fn from(function: Function<S>) -> Self {
        UniqueFunction {
            raw: function.into_raw(),
        }
    }
}

impl<S: Signature> Default for UniqueFunction<S> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Signature> fmt::Debug for UniqueFunction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueFunction")
            .field("target", &self.target_type_name().unwrap_or("<empty>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};

    use super::*;

    #[test]
    fn test_stateful_target() {
        let mut seen: Vec<String> = Vec::new();
        let mut f: UniqueFunction<fn(String) -> usize> = UniqueFunction::new(move |s: String| {
            seen.push(s);
            seen.len()
        });
        assert_eq!(f.call_mut((String::from("a"),)), 1);
        assert_eq!(f.call_mut((String::from("b"),)), 2);
    }

    #[test]
    fn test_mut_only_target_rejects_shared_call() {
        let mut count = 0u32;
        let f: UniqueFunction<fn() -> u32> = UniqueFunction::new(move || {
            count += 1;
            count
        });
        assert_eq!(f.try_call(()), Err(CallError::RequiresMut));
    }

    #[test]
    fn test_widening_keeps_shared_path() {
        let shared: Function<fn() -> i32> = Function::new(|| 5);
        let widened = UniqueFunction::from(shared);
        assert_eq!(widened.try_call(()), Ok(5));
    }

    #[test]
    fn test_take_drains() {
        let mut f: UniqueFunction<fn() -> i32> = UniqueFunction::new(|| 1);
        let mut taken = f.take();
        assert!(!f.has_target());
        assert_eq!(taken.call_mut(()), 1);
    }
}
