//! Field-accessor targets.
//!
//! A [`Member`] adapts a field projection `fn(&Recv) -> Out` into a callable
//! that takes its receiver by value, mirroring how pointers to data members
//! become callables in other languages. Members get their own erasure path
//! in the wrapper machinery, so they deliberately do not implement the
//! general call traits.

use core::fmt;

/// A projection from a receiver value to one of its fields (or any other
/// derived value), callable through a wrapper with signature
/// `fn(Recv) -> Out`.
pub struct Member<Recv, Out> {
    /// The projection applied to the receiver.
    get: fn(&Recv) -> Out,
}

impl<Recv, Out> Member<Recv, Out> {
    /// Creates a member accessor from a projection function.
    #[inline]
    pub fn new(get: fn(&Recv) -> Out) -> Self {
        Member { get }
    }

    /// Applies the projection to a receiver.
    #[inline]
    pub fn get(&self, recv: &Recv) -> Out {
        (self.get)(recv)
    }
}

impl<Recv, Out> Clone for Member<Recv, Out> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Recv, Out> Copy for Member<Recv, Out> {}

impl<Recv, Out> fmt::Debug for Member<Recv, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member").finish_non_exhaustive()
    }
}

/// Creates a [`Member`] from a projection function.
#[inline]
pub fn member<Recv, Out>(get: fn(&Recv) -> Out) -> Member<Recv, Out> {
    Member::new(get)
}
