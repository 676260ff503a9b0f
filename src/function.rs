//! The copyable callable container.

use core::{any::TypeId, fmt};

use dynfn_internals::{
    Member, RawWrapper, StorageKind,
    allocator::StorageAllocator,
    errors::{CallError, TypeRecoveryError},
    signature::{Call, Signature},
};

/// A copyable, type-erased callable with the call signature `S`.
///
/// `Function` accepts any target implementing [`Call<S>`] and [`Clone`]:
/// function pointers, non-mutating closures, or [`Member`] field accessors.
/// Targets small enough for the inline buffer are stored without touching an
/// allocator; larger targets are placed in an allocator node.
///
/// Cloning a `Function` clones the stored target. For move-only or mutating
/// targets, see [`UniqueFunction`](crate::UniqueFunction).
///
/// # Examples
///
/// ```
/// use dynfn::Function;
///
/// fn add1(x: i32) -> i32 {
///     x + 1
/// }
///
/// let f: Function<fn(i32) -> i32> = Function::new(add1 as fn(i32) -> i32);
/// assert_eq!(f.call((41,)), 42);
/// assert_eq!(f.try_call((0,)), Ok(1));
/// ```
pub struct Function<S: Signature> {
    /// The type-erased storage and dispatch engine.
    raw: RawWrapper<S>,
}

impl<S: Signature> Function<S> {
    /// Creates a function holding no target.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynfn::Function;
    ///
    /// let f: Function<fn()> = Function::empty();
    /// assert!(!f.has_target());
    /// ```
    #[inline]
    pub fn empty() -> Self {
        Function {
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
        F: Call<S> + Clone,
    {
        Function {
            raw: RawWrapper::from_target(target),
        }
    }

    /// Creates a function holding `target` in a node allocated from `alloc`.
    ///
    /// The target is always heap-backed, regardless of its size.
    #[inline]
    pub fn new_in<F, A>(target: F, alloc: A) -> Self
    where
        F: Call<S> + Clone,
        A: StorageAllocator,
    {
        Function {
            raw: RawWrapper::from_target_in(target, alloc),
        }
    }

    /// Invokes the target.
    ///
    /// # Panics
    ///
    /// Panics when the function holds no target. Use [`Function::try_call`]
    /// for a non-panicking variant.
    #[inline]
    pub fn call(&self, args: S::Args) -> S::Output {
        match self.raw.try_call(args) {
            Ok(output) => output,
            Err(error) => panic!("{error}"),
        }
    }

    /// Invokes the target, failing with [`CallError::NoTarget`] when the
    /// function is empty.
    #[inline]
    pub fn try_call(&self, args: S::Args) -> Result<S::Output, CallError> {
        self.raw.try_call(args)
    }

    /// Replaces the stored target, dropping the previous one.
    #[inline]
    pub fn assign<F>(&mut self, target: F)
    where
        F: Call<S> + Clone,
    {
        *self = Self::new(target);
    }

    /// Drops the stored target, leaving the function empty.
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Moves the stored target into a new function, leaving `self` empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynfn::Function;
    ///
    /// let mut f: Function<fn() -> u8> = Function::new(|| 7u8);
    /// let taken = f.take();
    /// assert!(!f.has_target());
    /// assert_eq!(taken.call(()), 7);
    /// ```
    #[inline]
    pub fn take(&mut self) -> Self {
        Function {
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
    ///
    /// # Examples
    ///
    /// ```
    /// use dynfn::Function;
    ///
    /// let f: Function<fn() -> u8> = Function::new(|| 7u8);
    /// let error = f.recover_ref::<String>().unwrap_err();
    /// assert!(error.found.is_some());
    /// ```
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

    /// Consumes the function and returns the underlying engine.
    #[inline]
    pub(crate) fn into_raw(self) -> RawWrapper<S> {
        self.raw
    }

    /// Mutably borrows the underlying engine.
    #[inline]
    pub(crate) fn raw_mut(&mut self) -> &mut RawWrapper<S> {
        &mut self.raw
    }
}

impl<Recv: 'static, Out: 'static> Function<fn(Recv) -> Out> {
    /// Creates a function holding a [`Member`] field accessor. Calls bind
    /// their single argument as the receiver of the projection.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynfn::{Function, member};
    ///
    /// struct Point {
    ///     x: i32,
    /// }
    ///
    /// let f = Function::from_member(member(|p: &Point| p.x));
    /// assert_eq!(f.call((Point { x: 3 },)), 3);
    /// ```
    #[inline]
    pub fn from_member(member: Member<Recv, Out>) -> Self {
        Function {
            raw: RawWrapper::from_member(member),
        }
    }
}

impl<S: Signature> Clone for Function<S> {
    fn clone(&self) -> Self {
        match self.raw.try_clone() {
            Some(raw) => Function { raw },
            // Every construction path requires `Clone` targets, so the
            // entry is always present.
            None => unreachable!("every stored target is cloneable"),
        }
    }
}

impl<S: Signature> Default for Function<S> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Signature> fmt::Debug for Function<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("target", &self.target_type_name().unwrap_or("<empty>"))
            .finish()
    }
}
